//! One instanced batch of stars, one per commit.
//!
//! The batch is rebuilt only when the commit set itself changes. Scrubbing
//! moves the active count, and every frame re-tints the active instances.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use bevy::color::LinearRgba;
use bevy::log::{debug, info};
use constants::render_settings::{
    SELECTED_PULSE_AMPLITUDE, SELECTED_PULSE_BASE, SELECTED_PULSE_FREQUENCY, STAR_COLOUR_GAIN,
    STAR_COLOUR_OFFSET, STAR_GEOMETRY_RADIUS, STAR_OPACITY, TWINKLE_BASE,
    TWINKLE_PHASE_INDEX_STEP, TWINKLE_PHASE_X_STEP, TWINKLE_PHASE_Z_STEP,
    TWINKLE_PRIMARY_AMPLITUDE, TWINKLE_PRIMARY_FREQUENCY, TWINKLE_SECONDARY_AMPLITUDE,
    TWINKLE_SECONDARY_FREQUENCY, TWINKLE_SECONDARY_PHASE_MULTIPLIER,
};

use crate::engine::host::{
    FrameState, InstancedBatch, NodeId, NodeKind, PointerEvent, PointerState, RenderHost, Scene,
    SceneNode, Subscription, SurfaceMaterial,
};
use crate::engine::timeline::VisibilityCursor;
use crate::layout::palette::scaled_linear;
use crate::layout::{PreparedCommit, PreparedHistory};

pub const COMMIT_STARS_LABEL: &str = "commit-stars";

pub type SelectCallback = Box<dyn FnMut(&PreparedCommit, &PointerEvent)>;

/// Brightness multiplier for a non-selected star.
pub fn twinkle(elapsed: f32, phase: f32) -> f32 {
    TWINKLE_BASE
        + (elapsed * TWINKLE_PRIMARY_FREQUENCY + phase).sin() * TWINKLE_PRIMARY_AMPLITUDE
        + (elapsed * TWINKLE_SECONDARY_FREQUENCY + phase * TWINKLE_SECONDARY_PHASE_MULTIPLIER)
            .sin()
            * TWINKLE_SECONDARY_AMPLITUDE
}

pub fn selected_pulse(elapsed: f32) -> f32 {
    SELECTED_PULSE_BASE + (elapsed * SELECTED_PULSE_FREQUENCY).sin() * SELECTED_PULSE_AMPLITUDE
}

#[derive(Default)]
struct CommitPointState {
    history: Option<Arc<PreparedHistory>>,
    built_for: Option<Arc<PreparedHistory>>,
    node: Option<NodeId>,
    base_colors: Vec<LinearRgba>,
    phases: Vec<f32>,
    index_by_hash: HashMap<String, usize>,
    selected: Option<usize>,
    selected_hash: Option<String>,
    cursor: VisibilityCursor,
    on_select: Option<SelectCallback>,
}

impl CommitPointState {
    fn is_current(&self) -> bool {
        match (&self.history, &self.built_for) {
            (Some(wanted), Some(built)) => Arc::ptr_eq(wanted, built),
            (None, None) => true,
            _ => false,
        }
    }

    fn rebuild(&mut self, scene: &mut Scene) {
        if let Some(node) = self.node.take() {
            scene.remove(node);
        }
        self.base_colors.clear();
        self.phases.clear();
        self.index_by_hash.clear();
        self.built_for = self.history.clone();

        let Some(history) = self.history.clone() else {
            return;
        };
        if history.is_empty() {
            return;
        }

        let mut batch = InstancedBatch::new(history.len(), STAR_GEOMETRY_RADIUS);
        for (index, star) in history.commits.iter().enumerate() {
            batch.set_instance(index, star.position, star.scale);
            let color = scaled_linear(
                star.contributor_color,
                STAR_COLOUR_OFFSET + star.brightness * STAR_COLOUR_GAIN,
            );
            batch.set_color(index, color);
            self.base_colors.push(color);
            self.phases.push(
                (index + 1) as f32 * TWINKLE_PHASE_INDEX_STEP
                    + star.position.x * TWINKLE_PHASE_X_STEP
                    + star.position.z * TWINKLE_PHASE_Z_STEP,
            );
            self.index_by_hash.insert(star.commit.hash.clone(), index);
        }
        batch.set_count(self.cursor.get());

        self.node = Some(scene.insert(SceneNode::new(
            COMMIT_STARS_LABEL,
            NodeKind::Instances(batch),
            SurfaceMaterial::glow(LinearRgba::WHITE, STAR_OPACITY, 0),
        )));
        self.resolve_selection();
        info!("Built commit star batch with {} instances", history.len());
    }

    fn resolve_selection(&mut self) {
        self.selected = self
            .selected_hash
            .as_ref()
            .and_then(|hash| self.index_by_hash.get(hash).copied());
    }

    fn animate(&mut self, scene: &mut Scene, elapsed: f32) {
        let Some(batch) = self
            .node
            .and_then(|node| scene.get_mut(node))
            .and_then(SceneNode::instances_mut)
        else {
            return;
        };

        batch.set_count(self.cursor.get());
        for index in 0..batch.count() {
            let factor = if self.selected == Some(index) {
                selected_pulse(elapsed)
            } else {
                twinkle(elapsed, self.phases[index])
            };
            let base = self.base_colors[index];
            batch.set_color(
                index,
                LinearRgba::rgb(base.red * factor, base.green * factor, base.blue * factor),
            );
        }
    }

    fn on_frame(&mut self, frame: &mut FrameState<'_>) {
        if !self.is_current() {
            self.rebuild(frame.scene);
        }
        self.animate(frame.scene, frame.elapsed);
    }

    /// Index of the nearest revealed star under the pointer.
    fn pick(&self, pointer: &PointerState<'_>) -> Option<usize> {
        let cursor = self.cursor.get();
        if cursor == 0 {
            return None;
        }
        let batch = self
            .node
            .and_then(|node| pointer.scene.get(node))
            .and_then(SceneNode::instances)?;
        let (index, _) = batch.pick(&pointer.ray)?;
        (index < cursor).then_some(index)
    }
}

pub struct CommitPointRenderer {
    state: Rc<RefCell<CommitPointState>>,
    subscriptions: Vec<Subscription>,
}

impl CommitPointRenderer {
    pub fn mount(host: &RenderHost, cursor: VisibilityCursor) -> Self {
        let state = Rc::new(RefCell::new(CommitPointState {
            cursor,
            ..CommitPointState::default()
        }));

        let frame = host.on_frame({
            let state = Rc::clone(&state);
            move |frame| state.borrow_mut().on_frame(frame)
        });
        let pointer = host.on_pointer({
            let state = Rc::clone(&state);
            move |pointer| handle_pointer(&state, pointer)
        });

        Self {
            state,
            subscriptions: vec![frame, pointer],
        }
    }

    /// Swap the commit set. The batch is rebuilt on the next frame.
    pub fn set_history(&self, history: Arc<PreparedHistory>) {
        self.state.borrow_mut().history = Some(history);
    }

    pub fn set_on_select(&self, callback: impl FnMut(&PreparedCommit, &PointerEvent) + 'static) {
        self.state.borrow_mut().on_select = Some(Box::new(callback));
    }

    /// Select by hash, or clear with `None`. Unknown hashes clear the highlight.
    pub fn set_selected_hash(&self, hash: Option<&str>) {
        let mut state = self.state.borrow_mut();
        state.selected_hash = hash.map(str::to_owned);
        state.resolve_selection();
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.borrow().selected
    }

    pub fn node(&self) -> Option<NodeId> {
        self.state.borrow().node
    }

    pub fn unmount(self, host: &mut RenderHost) {
        drop(self.subscriptions);
        if let Some(node) = self.state.borrow_mut().node.take() {
            host.scene_mut().remove(node);
        }
    }
}

fn handle_pointer(state: &Rc<RefCell<CommitPointState>>, pointer: &PointerState<'_>) {
    let (commit, callback) = {
        let mut state = state.borrow_mut();
        let Some(index) = state.pick(pointer) else {
            return;
        };
        let Some(commit) = state
            .built_for
            .as_ref()
            .and_then(|history| history.commits.get(index))
            .cloned()
        else {
            return;
        };
        state.selected = Some(index);
        state.selected_hash = Some(commit.commit.hash.clone());
        debug!("Picked commit {} at instance {index}", commit.commit.short_hash());
        (commit, state.on_select.take())
    };

    // The callback runs unborrowed so it may call back into the renderer.
    if let Some(mut callback) = callback {
        callback(&commit, &pointer.event);
        let mut state = state.borrow_mut();
        if state.on_select.is_none() {
            state.on_select = Some(callback);
        }
    }
}
