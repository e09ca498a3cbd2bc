/// An RGBA color with sRGB-encoded components in `[0, 1]`.
///
/// Colors are usually written the way artists write them, as `0xRRGGBB`
/// hex values, and converted to linear space only when they reach the GPU.
///
/// ```
/// use showroom::Color;
///
/// let blue = Color::from_hex(0x4E97D1);
/// assert_eq!(blue.to_hex(), 0x4E97D1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Builds an opaque color from a `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::from_hex(0xFF0000);

    /// Packs the RGB channels back into `0xRRGGBB`, ignoring alpha.
    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// RGB converted from sRGB to linear space, as lighting math expects.
    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }

    /// Linear RGB scaled by an intensity, packed with a trailing `w`.
    pub fn to_linear_scaled(self, intensity: f32, w: f32) -> [f32; 4] {
        let [r, g, b] = self.to_linear();
        [r * intensity, g * intensity, b * intensity, w]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_survives_conversion() {
        for hex in [0xFFFFFF, 0x4E97D1, 0xAAAAAA, 0x000000, 0xFF0000] {
            assert_eq!(Color::from_hex(hex).to_hex(), hex);
        }
    }

    #[test]
    fn linear_endpoints_are_fixed() {
        assert_eq!(Color::WHITE.to_linear(), [1.0, 1.0, 1.0]);
        assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let mid = Color::rgb(0.5, 0.5, 0.5).to_linear()[0];
        assert!((mid - 0.214).abs() < 1e-3);
    }
}
