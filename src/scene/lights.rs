use glam::Vec3;

use crate::color::Color;

/// Uniform light reaching every lit surface equally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 0.0,
        }
    }
}

/// Parallel light shining from `position` toward `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadows: bool,
}

impl DirectionalLight {
    /// Unit vector the light travels along.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }
}

/// A cone of light from `position` toward `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    /// Half-angle of the outer cone, in radians.
    pub angle: f32,
    /// Fraction of the cone over which light fades to the edge, `0..=1`.
    pub penumbra: f32,
    pub decay: f32,
    /// Distance at which the light fades to zero. Zero means unlimited.
    pub distance: f32,
    pub cast_shadows: bool,
}

impl SpotLight {
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }

    /// Cosines of the outer and inner cone half-angles.
    pub fn cone_cosines(&self) -> (f32, f32) {
        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra.clamp(0.0, 1.0))).cos();
        (outer, inner)
    }
}

/// Exponential-squared distance fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub density: f32,
}

impl Fog {
    /// How much of the fog colour covers a surface at `distance`, `0..=1`.
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        1.0 - (-d * d).exp()
    }
}
