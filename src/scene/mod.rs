//! Scene graph: nodes, materials and lights.
//!
//! A [`Scene`] keeps its nodes as entities in a hecs world. Meshes and
//! texture paths sit in [`SceneAssets`] and are referenced from components by
//! [`MeshId`] and [`TextureId`], so the whole graph can be built, animated
//! and ray-cast without a GPU.
//!
//! # Example
//!
//! ```
//! use showroom::scene::{Material, PointLight, Scene};
//! use showroom::{Color, RawGeometry, Transform, Vec3};
//!
//! let mut scene = Scene::new();
//! let sphere = scene.add_mesh(RawGeometry::sphere(0.3, 16, 16));
//! let marker = scene.spawn_mesh(
//!     "marker",
//!     sphere,
//!     Material::basic(Color::WHITE),
//!     Transform::from_position(Vec3::new(0.0, 7.0, 0.0)),
//! );
//! let light = scene.spawn_point_light(
//!     "light",
//!     PointLight::new(Color::WHITE, 2.0, 10.0),
//!     Transform::from_position(Vec3::new(0.0, 7.0, 0.0)),
//! );
//! assert_eq!(scene.world_position(marker), scene.world_position(light));
//! ```

mod assets;
mod components;
mod graph;
mod lights;

pub use assets::{MeshId, SceneAssets, TextureId};
pub use components::{Children, Material, Name, NodeKind, Parent, PointLight, Renderable, Shadows};
pub use graph::{DrawItem, PointLightInstance, Scene, SceneError};
pub use lights::{AmbientLight, DirectionalLight, Fog, SpotLight};
