//! Bloom as a render override: draw the scene, then ask for bloom.

use bevy::log::info;
use constants::render_settings::{BLOOM_INTENSITY, BLOOM_SMOOTHING, BLOOM_THRESHOLD};

use crate::engine::host::{BloomSettings, RenderHost};

pub fn bloom_settings() -> BloomSettings {
    BloomSettings {
        intensity: BLOOM_INTENSITY,
        threshold: BLOOM_THRESHOLD,
        smoothing: BLOOM_SMOOTHING,
    }
}

/// Replace whatever override is installed with the bloom pass.
pub fn install_bloom(host: &mut RenderHost, settings: BloomSettings) {
    let replaced = host.set_render_override(move |context| {
        context.draw_default();
        context.target().apply_bloom(&settings);
    });
    if replaced.is_some() {
        info!("Bloom replaced an existing render override");
    }
    info!(
        "Bloom enabled (intensity {}, threshold {})",
        settings.intensity, settings.threshold
    );
}

/// Remove the override so the host falls back to the default draw.
pub fn uninstall_bloom(host: &mut RenderHost) {
    if host.clear_render_override().is_some() {
        info!("Bloom disabled");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::host::draw_target::RecordingTarget;
    use crate::engine::host::HostConfig;

    #[test]
    fn test_bloom_settings_from_constants() {
        let settings = bloom_settings();
        assert_eq!(settings.intensity, 2.1);
        assert_eq!(settings.threshold, 0.016);
        assert_eq!(settings.smoothing, 0.9);
    }

    #[test]
    fn test_bloom_draws_scene_then_applies_bloom() {
        let mut host = RenderHost::mount(HostConfig::default());
        let mut target = RecordingTarget::default();
        install_bloom(&mut host, bloom_settings());

        host.frame(Duration::ZERO, &mut target);
        host.frame(Duration::from_millis(16), &mut target);

        assert_eq!(target.draws, 2);
        assert_eq!(target.blooms, vec![bloom_settings(); 2]);
        assert_eq!(target.finished, 2);
    }

    #[test]
    fn test_uninstall_restores_default_draw() {
        let mut host = RenderHost::mount(HostConfig::default());
        let mut target = RecordingTarget::default();
        install_bloom(&mut host, bloom_settings());
        uninstall_bloom(&mut host);

        host.frame(Duration::ZERO, &mut target);

        assert!(!host.has_render_override());
        assert_eq!(target.draws, 1);
        assert!(target.blooms.is_empty());
    }

    #[test]
    fn test_reinstalling_keeps_a_single_override() {
        let mut host = RenderHost::mount(HostConfig::default());
        let mut target = RecordingTarget::default();
        install_bloom(&mut host, bloom_settings());
        let dimmer = BloomSettings {
            intensity: 0.5,
            ..bloom_settings()
        };
        install_bloom(&mut host, dimmer);

        host.frame(Duration::ZERO, &mut target);

        assert_eq!(target.draws, 1);
        assert_eq!(target.blooms, vec![dimmer]);
    }
}
