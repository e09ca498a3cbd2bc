use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use winit::event::MouseButton;

use crate::camera::PerspectiveCamera;
use crate::input::Input;

/// Something that steers the camera once per frame.
pub trait CameraControls {
    /// Turns this frame's input into pending camera motion.
    fn handle_input(&mut self, _input: &Input, _camera: &PerspectiveCamera, _viewport: Vec2) {}

    /// Applies one step of pending motion to the camera.
    fn update(&mut self, camera: &mut PerspectiveCamera);
}

/// Orbits the camera around a target with optional damping.
///
/// Left drag rotates, right drag pans, the wheel zooms. Input accumulates
/// into pending deltas that [`CameraControls::update`] applies, so with
/// damping enabled motion eases out over several frames.
///
/// # Example
/// ```
/// use showroom::{CameraControls, OrbitControls, PerspectiveCamera, Vec3};
///
/// let mut camera = PerspectiveCamera::new().at(Vec3::new(0.0, 6.0, 15.0));
/// let mut controls = OrbitControls::new()
///     .damping(0.05)
///     .distance_limits(5.0, 50.0)
///     .max_polar_angle(std::f32::consts::FRAC_PI_2);
///
/// controls.rotate_left(0.5);
/// controls.update(&mut camera);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    pub enable_damping: bool,
    /// Fraction of the pending motion applied each update.
    pub damping_factor: f32,
    /// Pan along the camera's up vector rather than across the ground plane.
    pub screen_space_panning: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,

    // Pending (theta, phi) rotation
    rotate_delta: Vec2,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            screen_space_panning: true,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            rotate_delta: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables damping with the given factor.
    pub fn damping(mut self, factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn screen_space_panning(mut self, enabled: bool) -> Self {
        self.screen_space_panning = enabled;
        self
    }

    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn max_polar_angle(mut self, angle: f32) -> Self {
        self.max_polar_angle = angle;
        self
    }

    /// Queues a rotation around the vertical axis.
    pub fn rotate_left(&mut self, angle: f32) {
        self.rotate_delta.x -= angle;
    }

    /// Queues a rotation toward the pole.
    pub fn rotate_up(&mut self, angle: f32) {
        self.rotate_delta.y -= angle;
    }

    /// Queues a pan by a pointer movement of `delta` pixels.
    pub fn pan(&mut self, delta: Vec2, camera: &PerspectiveCamera, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        // World units per pixel at the target's depth
        let target_distance = (camera.position - self.target).length() * (camera.fov_y * 0.5).tan();
        let scale = 2.0 * target_distance / viewport_height * self.pan_speed;

        let right = camera.right();
        let up = if self.screen_space_panning {
            right.cross(camera.forward())
        } else {
            Vec3::Y.cross(right)
        };

        self.pan_offset += right * (-delta.x * scale) + up * (delta.y * scale);
    }

    /// Queues a zoom by `steps` wheel notches. Positive steps move closer.
    pub fn dolly(&mut self, steps: f32) {
        self.scale *= self.zoom_scale().powf(steps);
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Pending rotation as `(theta, phi)`, for diagnostics.
    pub fn pending_rotation(&self) -> Vec2 {
        self.rotate_delta
    }
}

impl CameraControls for OrbitControls {
    fn handle_input(&mut self, input: &Input, camera: &PerspectiveCamera, viewport: Vec2) {
        if viewport.y <= 0.0 {
            return;
        }
        let delta = input.mouse_delta();

        if input.mouse_down(MouseButton::Left) && delta != Vec2::ZERO {
            self.rotate_left(TAU * delta.x / viewport.y * self.rotate_speed);
            self.rotate_up(TAU * delta.y / viewport.y * self.rotate_speed);
        }
        if input.mouse_down(MouseButton::Right) && delta != Vec2::ZERO {
            self.pan(delta, camera, viewport.y);
        }

        let scroll = input.scroll_delta().y;
        if scroll != 0.0 {
            self.dolly(scroll);
        }
    }

    fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - self.target;
        let radius = offset.length();

        // Spherical coordinates with Y up, theta measured from +Z
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > f32::EPSILON {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        theta += self.rotate_delta.x * step;
        phi += self.rotate_delta.y * step;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(1e-6, PI - 1e-6);

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        let (sin_phi, cos_phi) = phi.sin_cos();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * cos_phi,
            radius * sin_phi * theta.cos(),
        );

        camera.position = self.target + offset;
        camera.target = self.target;

        if self.enable_damping {
            self.rotate_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.rotate_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn showroom_rig() -> (OrbitControls, PerspectiveCamera) {
        let controls = OrbitControls::new()
            .damping(0.05)
            .screen_space_panning(false)
            .distance_limits(5.0, 50.0)
            .max_polar_angle(FRAC_PI_2);
        let camera = PerspectiveCamera::new()
            .at(Vec3::new(0.0, 6.0, 15.0))
            .looking_at(Vec3::ZERO);
        (controls, camera)
    }

    #[test]
    fn distance_stays_within_limits() {
        let (mut controls, mut camera) = showroom_rig();
        controls.dolly(1000.0);
        controls.update(&mut camera);
        assert!((camera.position.length() - 5.0).abs() < 1e-3);

        controls.dolly(-1000.0);
        controls.update(&mut camera);
        assert!((camera.position.length() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn camera_never_dips_below_the_target() {
        let (mut controls, mut camera) = showroom_rig();
        controls.rotate_up(-100.0);
        for _ in 0..200 {
            controls.update(&mut camera);
            assert!(camera.position.y >= -1e-3);
        }
    }

    #[test]
    fn damping_decays_pending_rotation() {
        let (mut controls, mut camera) = showroom_rig();
        controls.rotate_left(1.0);
        controls.update(&mut camera);
        assert!((controls.pending_rotation().x + 0.95).abs() < 1e-6);

        let theta = camera.position.x.atan2(camera.position.z);
        assert!((theta + 0.05).abs() < 1e-4);

        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!(controls.pending_rotation().length() < 1e-6);
    }

    #[test]
    fn undamped_motion_applies_at_once() {
        let mut controls = OrbitControls::new();
        let mut camera = PerspectiveCamera::new().at(Vec3::new(0.0, 0.0, 10.0));
        controls.rotate_left(-FRAC_PI_2);
        controls.update(&mut camera);
        assert!(camera.position.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
        assert_eq!(controls.pending_rotation(), Vec2::ZERO);
    }

    #[test]
    fn ground_pan_keeps_target_height() {
        let (mut controls, mut camera) = showroom_rig();
        controls.pan(Vec2::new(40.0, 25.0), &camera, 600.0);
        for _ in 0..300 {
            controls.update(&mut camera);
        }
        assert!(controls.target.y.abs() < 1e-5);
        assert!(controls.target.length() > 0.1);
        assert_eq!(camera.target, controls.target);
    }
}
