//! Components attached to scene graph entities.
//!
//! Every node carries a [`Name`], a [`Transform`](crate::Transform) and a
//! [`NodeKind`]. Mesh nodes add a [`Renderable`] and [`Shadows`]; point
//! lights add a [`PointLight`]; pickable nodes add a
//! [`Collider`](crate::Collider).

use hecs::Entity;

use super::assets::{MeshId, TextureId};
use crate::color::Color;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name(pub String);

/// The node this one is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Children(pub Vec<Entity>);

/// Whether a node draws anything, fixed when the node is spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Mesh,
}

/// Surface appearance of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Base colour, multiplied with the texture if there is one.
    pub color: Color,
    pub texture: Option<TextureId>,
    /// Lit materials respond to scene lights; unlit ones show their colour as is.
    pub lit: bool,
    /// Whether scene fog tints this surface.
    pub fog: bool,
}

impl Material {
    /// Unlit, flat colour.
    pub fn basic(color: Color) -> Self {
        Self {
            color,
            texture: None,
            lit: false,
            fog: true,
        }
    }

    /// Lit by ambient, directional, spot and point lights.
    pub fn standard(color: Color) -> Self {
        Self {
            lit: true,
            ..Self::basic(color)
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn without_fog(mut self) -> Self {
        self.fog = false;
        self
    }
}

/// A mesh plus the material it is drawn with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Renderable {
    pub mesh: MeshId,
    pub material: Material,
}

/// Shadow participation flags. Stored for scene configuration; the forward
/// renderer does not draw shadow maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Shadows {
    pub cast: bool,
    pub receive: bool,
}

impl Shadows {
    pub const NONE: Shadows = Shadows {
        cast: false,
        receive: false,
    };
    pub const CAST_AND_RECEIVE: Shadows = Shadows {
        cast: true,
        receive: true,
    };
    pub const RECEIVE: Shadows = Shadows {
        cast: false,
        receive: true,
    };
}

/// An omnidirectional light at the node's world position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    /// Distance at which the light fades to zero. Zero means unlimited.
    pub range: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32, range: f32) -> Self {
        Self {
            color,
            intensity,
            range,
            decay: 2.0,
        }
    }
}
