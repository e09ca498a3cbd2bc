//! # Showroom
//!
//! **An animated car showroom rendered with wgpu.**
//!
//! A car and its platform load in the background and spin on the spot, a
//! grid of point lights bobs above them, and clicking the red button
//! recolours every light. The camera orbits with damping.
//!
//! ## Quick Start
//!
//! ```no_run
//! use showroom::{AppConfig, ShowroomConfig};
//!
//! fn main() -> Result<(), showroom::AppError> {
//!     showroom::run(
//!         AppConfig::new().title("Showroom").size(1280, 720),
//!         ShowroomConfig::new().asset_dir("assets"),
//!     )
//! }
//! ```
//!
//! ## Layout
//!
//! - [`scene`]: the node hierarchy, materials and lights, GPU-free
//! - [`showroom`]: scene construction, per-frame animation, clicks and loads
//! - [`render`]: the wgpu forward renderer behind [`SceneRenderer`]
//!
//! Everything except [`run`] and [`render`] works without a window, which
//! is how the integration tests drive whole sessions.

mod app;
mod camera;
mod color;
mod config;
mod geometry;
mod input;
mod loader;
mod mesh;
mod orbit_controls;
mod picking;
pub mod render;
pub mod scene;
pub mod showroom;

pub use app::{AppError, run};
pub use camera::PerspectiveCamera;
pub use color::Color;
pub use config::{
    AnimationConfig, AppConfig, AssetPaths, LightGridConfig, LightPalette, ModelPlacement,
    ShowroomConfig,
};
pub use geometry::{AssetLoadError, BoxFace, RawGeometry};
pub use input::Input;
pub use loader::{
    LoadEvent, MeshPart, ModelAsset, ModelLoader, ModelNode, ModelNodeKind, ModelRequest,
};
pub use mesh::{Transform, Vertex3d};
pub use orbit_controls::{CameraControls, OrbitControls};
pub use picking::{Collider, Ray, RayHit, pointer_to_ndc};
pub use render::{RenderError, SceneRenderer};
pub use showroom::{
    Clock, FrameLoop, LightUnit, LoadHandler, ModelSlot, PickHandler, PickOutcome, SceneState,
    Showroom, SlotId, SystemClock, ToggleState, model_requests,
};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, UVec2, Vec2, Vec3};
