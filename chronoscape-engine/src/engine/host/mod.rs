//! Render host: surface, camera, clock, scene arena and subscriber registries.

pub mod camera;
pub mod draw_target;
pub mod registry;
pub mod render_host;
pub mod scene;

pub use camera::HostCamera;
pub use draw_target::{BloomSettings, DrawContext, DrawTarget};
pub use registry::{Registry, Subscription};
pub use render_host::{
    FrameState, HostConfig, PointerButton, PointerEvent, PointerState, RenderHost, SurfaceSize,
};
pub use scene::{
    InstancedBatch, NodeId, NodeKind, Polyline, Scene, SceneNode, SurfaceMaterial, TubeMesh,
};
