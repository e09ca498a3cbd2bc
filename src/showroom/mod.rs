//! The showroom itself: scene state, per-frame animation, clicks and loads.
//!
//! [`Showroom`] is the single context object every callback receives. The
//! app owns one and hands it, in turn, to:
//!
//! - [`FrameLoop::tick`] on every redraw
//! - [`PickHandler::on_click`] on every left click
//! - [`LoadHandler::handle`] for every event drained from the loader
//! - [`Showroom::resize`] when the window changes size
//!
//! None of these need a window or a GPU, so the whole flow can be driven by
//! a test renderer.

mod frame;
mod load;
mod pick;
mod setup;
mod state;

pub use frame::{Clock, FrameLoop, SystemClock};
pub use load::{LoadHandler, model_requests};
pub use pick::{PickHandler, PickOutcome};
pub use state::{LightUnit, ModelSlot, SceneState, SlotId, ToggleState};

use glam::{UVec2, Vec2};

use crate::camera::PerspectiveCamera;
use crate::orbit_controls::{CameraControls, OrbitControls};
use crate::render::SceneRenderer;
use crate::scene::Scene;

/// Scene graph, state, camera and controls, threaded through every callback.
pub struct Showroom<K = OrbitControls> {
    pub scene: Scene,
    pub state: SceneState,
    pub camera: PerspectiveCamera,
    pub controls: K,
    viewport: UVec2,
}

impl<K> Showroom<K> {
    /// Swaps in different camera controls, keeping everything else.
    pub fn with_controls<K2: CameraControls>(self, controls: K2) -> Showroom<K2> {
        Showroom {
            scene: self.scene,
            state: self.state,
            camera: self.camera,
            controls,
            viewport: self.viewport,
        }
    }

    /// Current viewport size in pixels.
    pub fn viewport(&self) -> Vec2 {
        self.viewport.as_vec2()
    }

    /// Follows a window resize. Zero-sized viewports are ignored.
    pub fn resize<R: SceneRenderer + ?Sized>(&mut self, width: u32, height: u32, renderer: &mut R) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = UVec2::new(width, height);
        self.camera.set_viewport(width, height);
        renderer.resize(width, height);
    }
}
