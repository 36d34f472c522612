//! The galaxy as one main-thread object: host, timeline and renderers.
//!
//! Bevy holds it as a non-send resource. Systems forward input into it and
//! drive one host frame per app update.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;

use crate::engine::core::config::GalaxyConfig;
use crate::engine::host::{DrawTarget, HostConfig, PointerEvent, RenderHost};
use crate::engine::render::background_stars::{StarfieldConfig, StarfieldRenderer};
use crate::engine::render::bloom::{bloom_settings, install_bloom};
use crate::engine::render::branch_curves::BranchCurveRenderer;
use crate::engine::render::commit_points::CommitPointRenderer;
use crate::engine::render::scene_sync::BevyDrawTarget;
use crate::engine::timeline::{TimelineController, timeline_labels};
use crate::layout::{PreparedCommit, PreparedHistory};

struct Renderers {
    commit_points: CommitPointRenderer,
    branch_curves: BranchCurveRenderer,
    starfield: StarfieldRenderer,
}

pub struct GalaxyRuntime {
    host: RenderHost,
    renderers: Option<Renderers>,
    timeline: TimelineController,
    history: Arc<PreparedHistory>,
    picked: Rc<RefCell<Vec<PreparedCommit>>>,
}

impl GalaxyRuntime {
    pub fn mount(host_config: HostConfig, bloom: bool) -> Self {
        let mut host = RenderHost::mount(host_config);
        let timeline = TimelineController::new();

        let commit_points = CommitPointRenderer::mount(&host, timeline.cursor());
        let branch_curves = BranchCurveRenderer::mount(&host, timeline.cursor());
        let starfield = StarfieldRenderer::mount(&host, StarfieldConfig::default());

        let picked: Rc<RefCell<Vec<PreparedCommit>>> = Rc::default();
        commit_points.set_on_select({
            let picked = Rc::clone(&picked);
            move |commit, _event| picked.borrow_mut().push(commit.clone())
        });

        if bloom {
            install_bloom(&mut host, bloom_settings());
        }

        Self {
            host,
            renderers: Some(Renderers {
                commit_points,
                branch_curves,
                starfield,
            }),
            timeline,
            history: Arc::default(),
            picked,
        }
    }

    pub fn from_config(config: &GalaxyConfig) -> Self {
        let host_config = HostConfig {
            camera: config.host_camera(),
            ..HostConfig::default()
        };
        Self::mount(host_config, config.bloom_enabled())
    }

    pub fn is_mounted(&self) -> bool {
        self.host.is_mounted()
    }

    /// The host while mounted.
    pub fn host(&self) -> Option<&RenderHost> {
        self.host.is_mounted().then_some(&self.host)
    }

    pub fn host_mut(&mut self) -> Option<&mut RenderHost> {
        if self.host.is_mounted() {
            Some(&mut self.host)
        } else {
            None
        }
    }

    pub fn timeline(&self) -> &TimelineController {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut TimelineController {
        &mut self.timeline
    }

    pub fn history(&self) -> &Arc<PreparedHistory> {
        &self.history
    }

    /// Show a new history. The timeline snaps back to fully revealed.
    pub fn set_history(&mut self, history: Arc<PreparedHistory>) {
        if let Some(renderers) = &self.renderers {
            renderers.commit_points.set_history(Arc::clone(&history));
            renderers.branch_curves.set_history(Arc::clone(&history));
            renderers.commit_points.set_selected_hash(None);
        }
        self.picked.borrow_mut().clear();
        self.timeline.reset();
        info!(
            "Showing {} commits across {} branches",
            history.len(),
            history.branches.len()
        );
        let checkpoints: Vec<String> = timeline_labels(&history)
            .into_iter()
            .map(|checkpoint| checkpoint.label)
            .collect();
        debug!("Timeline checkpoints: {}", checkpoints.join(" | "));
        self.history = history;
    }

    pub fn tick_timeline(&mut self, elapsed_secs: f64) -> usize {
        self.timeline.tick(elapsed_secs, &self.history)
    }

    pub fn frame(&mut self, now: Duration, target: &mut dyn DrawTarget) {
        self.host.frame(now, target);
    }

    pub fn pointer_down(&mut self, event: PointerEvent) {
        self.host.pointer_down(event);
    }

    pub fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.host.resize(width, height, pixel_ratio);
    }

    /// Commits picked since the last call, oldest first.
    pub fn take_picked(&self) -> Vec<PreparedCommit> {
        std::mem::take(&mut *self.picked.borrow_mut())
    }

    pub fn select_hash(&self, hash: Option<&str>) {
        if let Some(renderers) = &self.renderers {
            renderers.commit_points.set_selected_hash(hash);
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.renderers
            .as_ref()
            .and_then(|renderers| renderers.commit_points.selected_index())
    }

    /// Unsubscribe every renderer and release all scene nodes.
    pub fn unmount(&mut self, target: &mut dyn DrawTarget) {
        if let Some(renderers) = self.renderers.take() {
            renderers.commit_points.unmount(&mut self.host);
            renderers.branch_curves.unmount(&mut self.host);
            renderers.starfield.unmount(&mut self.host);
        }
        self.host.unmount(target);
    }
}

pub fn tick_timeline(mut runtime: NonSendMut<GalaxyRuntime>, time: Res<Time>) {
    runtime.tick_timeline(time.delta_secs_f64());
}

pub fn run_host_frame(
    mut runtime: NonSendMut<GalaxyRuntime>,
    mut target: BevyDrawTarget,
    time: Res<Time>,
) {
    runtime.frame(time.elapsed(), &mut target);
}

pub fn unmount_on_exit(
    mut exits: EventReader<AppExit>,
    mut runtime: NonSendMut<GalaxyRuntime>,
    mut target: BevyDrawTarget,
) {
    if exits.read().next().is_some() && runtime.is_mounted() {
        runtime.unmount(&mut target);
    }
}
