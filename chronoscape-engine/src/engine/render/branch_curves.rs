//! Glowing tubes tracing each branch through its visible commits.
//!
//! Everything is regenerated whenever the visible window moves. The previous
//! generation is removed from the scene before the next one is inserted.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use bevy::color::LinearRgba;
use bevy::log::debug;
use bevy::math::Vec3;
use indexmap::IndexMap;

use constants::render_settings::{
    CORE_DRAW_ORDER, CORE_INTENSITY, CORE_OPACITY, CORE_TUBE_RADIAL_SEGMENTS, CORE_TUBE_RADIUS,
    CURVE_MAX_SAMPLES, CURVE_MIN_SAMPLES, CURVE_SAMPLES_PER_COMMIT, FILAMENT_DRAW_ORDER,
    FILAMENT_OPACITY, FILAMENT_WHITE_MIX, GLOW_DRAW_ORDER, GLOW_LIGHTNESS_OFFSET, GLOW_OPACITY,
    GLOW_SATURATION_OFFSET, GLOW_TUBE_RADIAL_SEGMENTS, GLOW_TUBE_RADIUS,
};

use super::catmull_rom::CatmullRomCurve;
use super::tube::tube_mesh;
use crate::engine::host::{
    FrameState, NodeId, NodeKind, Polyline, RenderHost, Scene, SceneNode, Subscription,
    SurfaceMaterial,
};
use crate::engine::timeline::VisibilityCursor;
use crate::layout::palette::{mix_towards_white, offset_hsl, scaled_linear};
use crate::layout::PreparedHistory;

pub fn sample_count(commits: usize) -> usize {
    (commits * CURVE_SAMPLES_PER_COMMIT).clamp(CURVE_MIN_SAMPLES, CURVE_MAX_SAMPLES)
}

/// Glow, core and filament nodes for every branch with two or more of the
/// first `visible` commits.
pub fn build_branch_curves(history: &PreparedHistory, visible: usize) -> Vec<SceneNode> {
    let visible = visible.min(history.len());
    if visible < 2 {
        return Vec::new();
    }

    let mut by_branch: IndexMap<&str, (Vec<Vec3>, usize)> = IndexMap::new();
    for (index, prepared) in history.commits[..visible].iter().enumerate() {
        by_branch
            .entry(prepared.branch.as_str())
            .or_insert_with(|| (Vec::new(), index))
            .0
            .push(prepared.position);
    }

    let mut nodes = Vec::new();
    for (branch, (points, first_index)) in by_branch {
        let samples = sample_count(points.len());
        let Some(curve) = CatmullRomCurve::new(points) else {
            continue;
        };
        let color = history.commits[first_index].branch_color;

        nodes.push(SceneNode::new(
            format!("branch-glow-{branch}"),
            NodeKind::Tube(tube_mesh(
                &curve,
                samples,
                GLOW_TUBE_RADIUS,
                GLOW_TUBE_RADIAL_SEGMENTS,
            )),
            SurfaceMaterial::glow(
                LinearRgba::from(offset_hsl(color, GLOW_SATURATION_OFFSET, GLOW_LIGHTNESS_OFFSET)),
                GLOW_OPACITY,
                GLOW_DRAW_ORDER,
            ),
        ));
        nodes.push(SceneNode::new(
            format!("branch-core-{branch}"),
            NodeKind::Tube(tube_mesh(
                &curve,
                samples,
                CORE_TUBE_RADIUS,
                CORE_TUBE_RADIAL_SEGMENTS,
            )),
            SurfaceMaterial::glow(scaled_linear(color, CORE_INTENSITY), CORE_OPACITY, CORE_DRAW_ORDER),
        ));
        nodes.push(SceneNode::new(
            format!("branch-filament-{branch}"),
            NodeKind::Line(Polyline {
                points: curve.sample_points(samples),
            }),
            SurfaceMaterial::glow(
                mix_towards_white(color, FILAMENT_WHITE_MIX),
                FILAMENT_OPACITY,
                FILAMENT_DRAW_ORDER,
            ),
        ));
    }
    nodes
}

#[derive(Default)]
struct BranchCurveState {
    history: Option<Arc<PreparedHistory>>,
    built_for: Option<Arc<PreparedHistory>>,
    built_visible: Option<usize>,
    nodes: Vec<NodeId>,
    cursor: VisibilityCursor,
}

impl BranchCurveState {
    fn visible(&self) -> usize {
        self.history
            .as_ref()
            .map_or(0, |history| self.cursor.get().min(history.len()))
    }

    fn is_current(&self) -> bool {
        let same_history = match (&self.history, &self.built_for) {
            (Some(wanted), Some(built)) => Arc::ptr_eq(wanted, built),
            (None, None) => true,
            _ => false,
        };
        same_history && self.built_visible == Some(self.visible())
    }

    fn clear(&mut self, scene: &mut Scene) {
        for node in self.nodes.drain(..) {
            scene.remove(node);
        }
    }

    fn rebuild(&mut self, scene: &mut Scene) {
        self.clear(scene);
        let visible = self.visible();
        self.built_for = self.history.clone();
        self.built_visible = Some(visible);

        let Some(history) = self.history.clone() else {
            return;
        };
        self.nodes = build_branch_curves(&history, visible)
            .into_iter()
            .map(|node| scene.insert(node))
            .collect();
        debug!(
            "Rebuilt {} branch curve nodes for {visible} visible commits",
            self.nodes.len()
        );
    }

    fn on_frame(&mut self, frame: &mut FrameState<'_>) {
        if !self.is_current() {
            self.rebuild(frame.scene);
        }
    }
}

pub struct BranchCurveRenderer {
    state: Rc<RefCell<BranchCurveState>>,
    subscription: Subscription,
}

impl BranchCurveRenderer {
    pub fn mount(host: &RenderHost, cursor: VisibilityCursor) -> Self {
        let state = Rc::new(RefCell::new(BranchCurveState {
            cursor,
            ..BranchCurveState::default()
        }));
        let subscription = host.on_frame({
            let state = Rc::clone(&state);
            move |frame| state.borrow_mut().on_frame(frame)
        });
        Self {
            state,
            subscription,
        }
    }

    pub fn set_history(&self, history: Arc<PreparedHistory>) {
        self.state.borrow_mut().history = Some(history);
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.state.borrow().nodes.clone()
    }

    pub fn unmount(self, host: &mut RenderHost) {
        self.subscription.dispose();
        self.state.borrow_mut().clear(host.scene_mut());
    }
}
