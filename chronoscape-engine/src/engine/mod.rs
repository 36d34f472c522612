pub mod camera;
pub mod core;
pub mod host;
pub mod loading;
pub mod render;
pub mod runtime;
pub mod systems;
pub mod timeline;
