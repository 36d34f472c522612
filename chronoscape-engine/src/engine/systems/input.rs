use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::render_settings::MAX_PIXEL_RATIO;
use constants::timeline::SCRUB_STEP;

use crate::engine::host::{PointerButton, PointerEvent};
use crate::engine::runtime::GalaxyRuntime;
use crate::engine::timeline::TimelineController;

/// Keep the host surface matched to the primary window.
pub fn forward_window_size(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut runtime: NonSendMut<GalaxyRuntime>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(host) = runtime.host() else {
        return;
    };

    let surface = host.surface();
    let (width, height, ratio) = (window.width(), window.height(), window.scale_factor());
    let wanted_ratio = ratio.min(MAX_PIXEL_RATIO);
    if surface.width == width.max(1.0)
        && surface.height == height.max(1.0)
        && surface.pixel_ratio == wanted_ratio
    {
        return;
    }
    runtime.resize(width, height, ratio);
}

pub fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
        _ => PointerButton::Other,
    }
}

/// Every press inside the window becomes a host pointer event.
pub fn forward_pointer_presses(
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut runtime: NonSendMut<GalaxyRuntime>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    for button in mouse_button.get_just_pressed() {
        runtime.pointer_down(PointerEvent {
            client: cursor,
            button: pointer_button(*button),
        });
    }
}

/// Apply one timeline shortcut. Returns whether the key is bound.
pub fn apply_timeline_key(timeline: &mut TimelineController, key: KeyCode) -> bool {
    match key {
        KeyCode::Space => timeline.toggle_play(),
        KeyCode::ArrowLeft => timeline.scrub_by(-SCRUB_STEP),
        KeyCode::ArrowRight => timeline.scrub_by(SCRUB_STEP),
        KeyCode::Home => timeline.scrub(0.0),
        KeyCode::End => timeline.scrub(1.0),
        _ => return false,
    }
    true
}

pub fn timeline_keyboard(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut runtime: NonSendMut<GalaxyRuntime>,
) {
    for key in keyboard.get_just_pressed() {
        if apply_timeline_key(runtime.timeline_mut(), *key) {
            let timeline = runtime.timeline();
            debug!(
                "Timeline {:?}: target {:.3}, playing {}",
                key,
                timeline.target_progress(),
                timeline.is_playing()
            );
        }
    }
}
