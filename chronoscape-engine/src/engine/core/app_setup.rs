use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::LogPlugin;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::render_settings::{BACKGROUND_SRGB, FOG_DENSITY, FOG_SRGB};

// Crate engine modules
use crate::engine::camera::orbit_camera::{GalaxyCamera, OrbitCamera, orbit_camera_controller};
use crate::engine::core::app_state::{AppState, HudText, transition_to_running};
use crate::engine::core::config::GalaxyConfig;
use crate::engine::core::window_config::create_window_config;
use crate::engine::host::HostCamera;
use crate::engine::loading::file_import::{PendingImport, handle_file_drop, poll_history_import};
use crate::engine::loading::history_loader::{
    HistoryDocument, HistoryLoaded, HistoryLoader, apply_history_document,
    report_history_load_failures, start_loading,
};
use crate::engine::render::instanced_render_plugin::InstancedStarRenderPlugin;
use crate::engine::render::scene_sync::SceneMirror;
use crate::engine::runtime::{GalaxyRuntime, run_host_frame, tick_timeline, unmount_on_exit};
use crate::engine::systems::fps_tracking::fps_log_system;
use crate::engine::systems::input::{
    forward_pointer_presses, forward_window_size, timeline_keyboard,
};
use crate::engine::systems::selection::{
    SelectedCommit, clear_selection_on_escape, clear_selection_on_new_history, report_selection,
};

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::fps_tracking::hud_text_update_system;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GalaxySet {
    Loading,
    Frame,
}

pub fn create_app(config: GalaxyConfig) -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins(&config))
        .init_state::<AppState>()
        .add_plugins(InstancedStarRenderPlugin)
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Raw exporter JSON, normalised after load
        .add_plugins(JsonAssetPlugin::<HistoryDocument>::new(&["json"]))
        .insert_resource(ClearColor(Color::srgb_from_array(BACKGROUND_SRGB)));

    // The runtime holds Rc state and stays on the main thread
    app.insert_non_send_resource(GalaxyRuntime::from_config(&config))
        .insert_resource(OrbitCamera::from_host(&config.host_camera()))
        .insert_resource(config)
        .init_resource::<HistoryLoader>()
        .init_resource::<PendingImport>()
        .init_resource::<SceneMirror>()
        .init_resource::<SelectedCommit>()
        .add_event::<HistoryLoaded>();

    app.configure_sets(Update, (GalaxySet::Loading, GalaxySet::Frame).chain());

    app.add_systems(Startup, (setup, start_loading).chain())
        .add_systems(
            Update,
            (
                handle_file_drop,
                poll_history_import,
                apply_history_document,
                report_history_load_failures,
            )
                .chain()
                .in_set(GalaxySet::Loading),
        )
        .add_systems(
            Update,
            (transition_to_running, clear_selection_on_new_history)
                .after(GalaxySet::Loading)
                .before(GalaxySet::Frame),
        )
        .add_systems(
            Update,
            (
                forward_window_size,
                forward_pointer_presses,
                timeline_keyboard.run_if(in_state(AppState::Running)),
                orbit_camera_controller,
                tick_timeline,
                run_host_frame,
                report_selection,
                clear_selection_on_escape,
            )
                .chain()
                .in_set(GalaxySet::Frame),
        )
        .add_systems(Update, fps_log_system)
        .add_systems(Last, unmount_on_exit);

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(Update, hud_text_update_system.after(GalaxySet::Frame));
    }

    app
}

fn setup(mut commands: Commands, config: Res<GalaxyConfig>) {
    spawn_galaxy_camera(&mut commands, &config.host_camera());

    #[cfg(not(target_arch = "wasm32"))]
    {
        create_native_overlays(&mut commands);
    }
}

fn spawn_galaxy_camera(commands: &mut Commands, camera: &HostCamera) {
    commands.spawn((
        Camera3d::default(),
        // Bloom needs an HDR target
        Camera {
            hdr: true,
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_degrees.to_radians(),
            near: camera.near,
            far: camera.far,
            ..default()
        }),
        Transform::from_translation(camera.position).looking_at(camera.target, camera.up),
        DistanceFog {
            color: Color::srgb_from_array(FOG_SRGB),
            falloff: FogFalloff::Exponential {
                density: FOG_DENSITY,
            },
            ..default()
        },
        GalaxyCamera,
    ));
}

#[cfg(not(target_arch = "wasm32"))]
fn create_native_overlays(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("Loading history…"),
                TextFont {
                    font_size: 15.0,
                    ..default()
                },
                TextColor(Color::srgba(0.78, 0.84, 1.0, 0.85)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                HudText,
            ));
        });
}

fn create_default_plugins(config: &GalaxyConfig) -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: config.log_filter.clone(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
