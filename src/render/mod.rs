//! Drawing a [`Scene`] to the window.
//!
//! The showroom core only talks to [`SceneRenderer`]. [`ForwardRenderer`] is
//! the wgpu implementation; tests plug in their own.

mod forward;
mod gpu;
mod mesh;
mod texture;

pub use forward::ForwardRenderer;
pub use gpu::{GpuContext, GpuInitError};
pub use mesh::GpuMesh;
pub use texture::Texture;

use crate::camera::PerspectiveCamera;
use crate::scene::Scene;

/// Draws the scene graph from a camera.
pub trait SceneRenderer {
    /// Renders one frame.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError>;

    /// Matches the output to a new viewport size in physical pixels.
    fn resize(&mut self, width: u32, height: u32);
}

/// A frame could not be drawn.
#[derive(Debug)]
pub enum RenderError {
    /// The surface refused to hand out a frame.
    Surface(wgpu::SurfaceError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Surface(e) => write!(f, "surface error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Surface(e) => Some(e),
        }
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(e: wgpu::SurfaceError) -> Self {
        RenderError::Surface(e)
    }
}
