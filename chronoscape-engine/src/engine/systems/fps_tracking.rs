use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

use crate::engine::core::app_state::HudText;
use crate::engine::runtime::GalaxyRuntime;
use crate::engine::timeline::{TimelineController, effective_timestamp, format_timestamp_label};
use crate::layout::PreparedHistory;

const FPS_LOG_INTERVAL_SECS: f32 = 10.0;

pub fn fps_log_system(
    diagnostics: Res<DiagnosticsStore>,
    mut last_log_time: Local<f32>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();
    if current_time - *last_log_time < FPS_LOG_INTERVAL_SECS {
        return;
    }

    if let Some(value) = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
    {
        debug!("FPS: {value:.1}");
        *last_log_time = current_time;
    }
}

/// One-line summary of the timeline position.
pub fn status_line(history: &PreparedHistory, timeline: &TimelineController) -> String {
    if history.is_empty() {
        return "Loading history…".to_string();
    }
    let progress = timeline.animated_progress();
    let date = format_timestamp_label(effective_timestamp(history, progress));
    let state = if timeline.is_playing() { "playing" } else { "paused" };
    format!(
        "{date} · {:.0}% · {}/{} commits · {state}",
        progress * 100.0,
        timeline.cursor().get(),
        history.len()
    )
}

pub fn hud_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    runtime: NonSend<GalaxyRuntime>,
    mut query: Query<&mut Text, With<HudText>>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
        .unwrap_or_default();
    let status = status_line(runtime.history(), runtime.timeline());

    for mut text in &mut query {
        text.0 = format!("{status} · FPS: {fps:.1}");
    }
}
