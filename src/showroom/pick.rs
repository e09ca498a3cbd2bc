use glam::Vec2;

use super::Showroom;
use crate::config::LightPalette;
use crate::picking::pointer_to_ndc;

/// Result of a click.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PickOutcome {
    /// The button was hit and the toggle flipped to `toggled_on`.
    Hit { distance: f32, toggled_on: bool },
    Miss,
}

/// Turns clicks on the button into light colour changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct PickHandler {
    palette: LightPalette,
}

impl PickHandler {
    pub fn new(palette: LightPalette) -> Self {
        Self { palette }
    }

    /// Handles a click at `pointer` pixels inside a `viewport` of pixels.
    ///
    /// Only the button is tested. On a hit the toggle flips and every light
    /// and marker takes the palette colour for the new state.
    pub fn on_click<K>(&self, showroom: &mut Showroom<K>, pointer: Vec2, viewport: Vec2) -> PickOutcome {
        let Some(ndc) = pointer_to_ndc(pointer, viewport) else {
            return PickOutcome::Miss;
        };
        let ray = showroom.camera.ray_through(ndc);
        let Some(hit) = showroom.scene.raycast(showroom.state.button(), &ray) else {
            return PickOutcome::Miss;
        };

        let toggled_on = showroom.state.toggle_mut().flip();
        let color = self.palette.color_for(toggled_on);
        for unit in showroom.state.lights() {
            showroom.scene.set_color(unit.light, color);
            showroom.scene.set_color(unit.marker, color);
        }
        log::debug!(
            "Button hit at {:.2}, lights now #{:06X}",
            hit.distance,
            color.to_hex()
        );

        PickOutcome::Hit {
            distance: hit.distance,
            toggled_on,
        }
    }
}
