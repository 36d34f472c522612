use bevy::prelude::*;

use crate::engine::loading::history_loader::HistoryLoaded;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Running,
}

/// Status line overlay on native builds.
#[derive(Component)]
pub struct HudText;

// Running once the first history is on screen
pub fn transition_to_running(
    mut loaded: EventReader<HistoryLoaded>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if let Some(history) = loaded.read().last() {
        info!(
            "→ {} commits ready, transitioning to Running state",
            history.commits
        );
        next_state.set(AppState::Running);
    }
}
