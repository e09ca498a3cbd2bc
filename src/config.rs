//! Window and scene configuration.
//!
//! Both structs follow the same builder pattern: start from `default()` and
//! override what you need.
//!
//! ```
//! use showroom::{AppConfig, ShowroomConfig};
//!
//! let app = AppConfig::new().title("Showroom").size(1280, 720);
//! let scene = ShowroomConfig::default().asset_dir("assets");
//! assert_eq!(scene.grid.rows * scene.grid.cols, 20);
//! ```

use std::ops::Range;
use std::path::{Path, PathBuf};

use glam::{Quat, Vec3};

use crate::color::Color;
use crate::scene::Shadows;

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Showroom".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Files the showroom loads at startup.
#[derive(Clone, Debug)]
pub struct AssetPaths {
    pub car: PathBuf,
    pub platform: PathBuf,
    pub skybox: PathBuf,
    pub skybox_floor: PathBuf,
    pub button_metal: PathBuf,
}

impl AssetPaths {
    /// The standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            car: dir.join("sportsCar.stl"),
            platform: dir.join("platform.stl"),
            skybox: dir.join("skybox.jpg"),
            skybox_floor: dir.join("skybox_floor.jpg"),
            button_metal: dir.join("button_metal.jpg"),
        }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::in_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))
    }
}

/// Layout of the floating point-light grid.
#[derive(Clone, Debug)]
pub struct LightGridConfig {
    pub rows: usize,
    pub cols: usize,
    /// Distance between neighbouring lights on X and Z.
    pub spacing: f32,
    /// Resting height of every light.
    pub height: f32,
    pub intensity: f32,
    pub range: f32,
    pub marker_radius: f32,
    /// Range the per-light oscillation speed is drawn from.
    pub phase_speed: Range<f32>,
}

impl Default for LightGridConfig {
    fn default() -> Self {
        Self {
            rows: 5,
            cols: 4,
            spacing: 6.0,
            height: 7.0,
            intensity: 2.0,
            range: 10.0,
            marker_radius: 0.3,
            phase_speed: 0.01..0.03,
        }
    }
}

impl LightGridConfig {
    /// Resting positions, row by row, centred on the origin.
    pub fn positions(&self) -> Vec<Vec3> {
        let x0 = (self.cols as f32 - 1.0) * self.spacing * 0.5;
        let z0 = (self.rows as f32 - 1.0) * self.spacing * 0.5;
        (0..self.rows)
            .flat_map(|row| {
                (0..self.cols).map(move |col| {
                    Vec3::new(
                        col as f32 * self.spacing - x0,
                        self.height,
                        row as f32 * self.spacing - z0,
                    )
                })
            })
            .collect()
    }
}

/// Per-frame animation constants.
#[derive(Clone, Copy, Debug)]
pub struct AnimationConfig {
    /// Peak vertical displacement of each light.
    pub amplitude: f32,
    /// Car yaw added every frame, in radians.
    pub car_yaw_step: f32,
    /// Platform roll added every frame, in radians.
    pub platform_roll_step: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.05,
            car_yaw_step: 0.02,
            platform_roll_step: 0.01,
        }
    }
}

/// The two colours the light grid switches between.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightPalette {
    pub off: Color,
    pub on: Color,
}

impl Default for LightPalette {
    fn default() -> Self {
        Self {
            off: Color::WHITE,
            on: Color::from_hex(0x4E97D1),
        }
    }
}

impl LightPalette {
    pub fn color_for(&self, toggled_on: bool) -> Color {
        if toggled_on { self.on } else { self.off }
    }
}

/// Where a loaded model goes and how its meshes are set up.
#[derive(Clone, Copy, Debug)]
pub struct ModelPlacement {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub color: Color,
    pub shadows: Shadows,
    pub fog: bool,
}

impl ModelPlacement {
    pub fn car() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 2.0,
            color: Color::from_hex(0xC8102E),
            shadows: Shadows::CAST_AND_RECEIVE,
            fog: false,
        }
    }

    pub fn platform() -> Self {
        Self {
            position: Vec3::new(0.0, -6.0, 0.0),
            rotation: Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            scale: 1.0,
            color: Color::from_hex(0x8A8D91),
            shadows: Shadows::RECEIVE,
            fog: false,
        }
    }
}

/// Everything that shapes the showroom scene.
#[derive(Clone, Debug)]
pub struct ShowroomConfig {
    pub assets: AssetPaths,
    pub grid: LightGridConfig,
    pub animation: AnimationConfig,
    pub palette: LightPalette,
    pub car: ModelPlacement,
    pub platform: ModelPlacement,
}

impl Default for ShowroomConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            grid: LightGridConfig::default(),
            animation: AnimationConfig::default(),
            palette: LightPalette::default(),
            car: ModelPlacement::car(),
            platform: ModelPlacement::platform(),
        }
    }
}

impl ShowroomConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks for every asset in `dir` instead of the crate's `assets/`.
    pub fn asset_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.assets = AssetPaths::in_dir(dir);
        self
    }

    pub fn grid(mut self, grid: LightGridConfig) -> Self {
        self.grid = grid;
        self
    }

    pub fn animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }

    pub fn palette(mut self, palette: LightPalette) -> Self {
        self.palette = palette;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RawGeometry;

    #[test]
    fn grid_is_centred() {
        let positions = LightGridConfig::default().positions();
        assert_eq!(positions.len(), 20);
        let sum: Vec3 = positions.iter().copied().sum();
        assert!(sum.abs_diff_eq(Vec3::new(0.0, 7.0 * 20.0, 0.0), 1e-4));
        assert_eq!(positions[0], Vec3::new(-9.0, 7.0, -12.0));
        assert_eq!(positions[19], Vec3::new(9.0, 7.0, 12.0));
    }

    #[test]
    fn palette_picks_by_toggle() {
        let palette = LightPalette::default();
        assert_eq!(palette.color_for(false).to_hex(), 0xFFFFFF);
        assert_eq!(palette.color_for(true).to_hex(), 0x4E97D1);
    }

    #[test]
    fn default_models_ship_with_the_crate() {
        let assets = AssetPaths::default();
        let car = RawGeometry::from_file(&assets.car).unwrap();
        let platform = RawGeometry::from_file(&assets.platform).unwrap();
        assert!(car.triangle_count() > 0);

        // The platform is modelled flat in XY and tipped onto the floor
        let (min, max) = platform.bounds();
        assert!(max.z - min.z < max.x - min.x);
    }
}
