use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;

use super::Showroom;
use super::state::{LightUnit, SlotId};
use crate::config::AnimationConfig;
use crate::orbit_controls::CameraControls;
use crate::render::{RenderError, SceneRenderer};
use crate::scene::Scene;

/// A source of wall-clock time in seconds.
pub trait Clock {
    fn now_secs(&self) -> f64;
}

/// Seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl<F: Fn() -> f64> Clock for F {
    fn now_secs(&self) -> f64 {
        self()
    }
}

/// Advances the showroom by one frame and renders it.
///
/// Light heights are a function of absolute time, while model rotation
/// advances by a fixed step per call, so spin speed follows the frame rate.
pub struct FrameLoop<C = SystemClock> {
    clock: C,
    animation: AnimationConfig,
    frames: u64,
}

impl FrameLoop<SystemClock> {
    pub fn new(animation: AnimationConfig) -> Self {
        Self::with_clock(SystemClock, animation)
    }
}

impl<C: Clock> FrameLoop<C> {
    pub fn with_clock(clock: C, animation: AnimationConfig) -> Self {
        Self {
            clock,
            animation,
            frames: 0,
        }
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame: lights, models, controls, then the render.
    ///
    /// A render error ends the frame and is returned to the caller.
    pub fn tick<K, R>(
        &mut self,
        showroom: &mut Showroom<K>,
        renderer: &mut R,
    ) -> Result<(), RenderError>
    where
        K: CameraControls,
        R: SceneRenderer + ?Sized,
    {
        let now = self.clock.now_secs();
        animate_lights(&showroom.scene, showroom.state.lights(), now, self.animation.amplitude);

        if let Some(car) = showroom.state.slot(SlotId::Car).entity()
            && let Some(mut t) = showroom.scene.transform_mut(car)
        {
            t.rotate_local(Vec3::Y, self.animation.car_yaw_step);
        }
        if let Some(platform) = showroom.state.slot(SlotId::Platform).entity()
            && let Some(mut t) = showroom.scene.transform_mut(platform)
        {
            t.rotate_local(Vec3::Z, self.animation.platform_roll_step);
        }

        showroom.controls.update(&mut showroom.camera);
        renderer.render(&showroom.scene, &showroom.camera)?;

        self.frames += 1;
        if self.frames % 3600 == 0 {
            log::debug!("{} frames rendered", self.frames);
        }
        Ok(())
    }
}

fn animate_lights(scene: &Scene, lights: &[LightUnit], now_secs: f64, amplitude: f32) {
    for unit in lights {
        let Some(mut light) = scene.transform_mut(unit.light) else {
            continue;
        };
        light.position.y = unit.height_at(now_secs, amplitude);
        let position = light.position;
        drop(light);

        if let Some(mut marker) = scene.transform_mut(unit.marker) {
            marker.position = position;
        }
    }
}
