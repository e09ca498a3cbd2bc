use glam::{Mat4, Vec3};
use hecs::{Entity, RefMut, World};

use super::assets::{MeshId, SceneAssets};
use super::components::{Children, Material, Name, NodeKind, Parent, PointLight, Renderable, Shadows};
use super::lights::{AmbientLight, DirectionalLight, Fog, SpotLight};
use crate::color::Color;
use crate::geometry::RawGeometry;
use crate::loader::{ModelNode, ModelNodeKind};
use crate::mesh::Transform;
use crate::picking::{Collider, Ray, RayHit};

/// Errors from editing the node hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The entity does not exist in this scene.
    NoSuchEntity(Entity),
    /// Attaching would make a node its own ancestor.
    Cycle { child: Entity, parent: Entity },
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::NoSuchEntity(e) => write!(f, "no such entity: {:?}", e),
            SceneError::Cycle { child, parent } => {
                write!(f, "cannot attach {:?} under its descendant {:?}", child, parent)
            }
        }
    }
}

impl std::error::Error for SceneError {}

/// One mesh to draw this frame.
#[derive(Clone, Copy, Debug)]
pub struct DrawItem {
    pub entity: Entity,
    pub mesh: MeshId,
    pub material: Material,
    /// Model-to-world matrix including every ancestor.
    pub model: Mat4,
}

/// A point light resolved to world space.
#[derive(Clone, Copy, Debug)]
pub struct PointLightInstance {
    pub position: Vec3,
    pub light: PointLight,
}

/// A node hierarchy in a hecs [`World`] plus scene-wide lighting.
///
/// Nodes are plain entities. Hierarchy lives in [`Parent`] and [`Children`]
/// components, and world matrices are composed on demand by walking parents.
pub struct Scene {
    pub world: World,
    pub assets: SceneAssets,
    pub ambient: AmbientLight,
    pub directional: Option<DirectionalLight>,
    pub spot: Option<SpotLight>,
    pub fog: Option<Fog>,
    /// Clear colour behind everything.
    pub background: Color,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            world: World::new(),
            assets: SceneAssets::default(),
            ambient: AmbientLight::default(),
            directional: None,
            spot: None,
            fog: None,
            background: Color::BLACK,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, geometry: RawGeometry) -> MeshId {
        self.assets.add_mesh(geometry)
    }

    /// Spawns an empty node that only groups its children.
    pub fn spawn_group(&mut self, name: impl Into<String>, transform: Transform) -> Entity {
        self.world
            .spawn((Name(name.into()), transform, NodeKind::Group))
    }

    pub fn spawn_mesh(
        &mut self,
        name: impl Into<String>,
        mesh: MeshId,
        material: Material,
        transform: Transform,
    ) -> Entity {
        self.world.spawn((
            Name(name.into()),
            transform,
            NodeKind::Mesh,
            Renderable { mesh, material },
            Shadows::NONE,
        ))
    }

    pub fn spawn_point_light(
        &mut self,
        name: impl Into<String>,
        light: PointLight,
        transform: Transform,
    ) -> Entity {
        self.world
            .spawn((Name(name.into()), transform, NodeKind::Group, light))
    }

    /// Attaches `child` under `parent`, detaching it from any previous parent.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), SceneError> {
        for e in [child, parent] {
            if !self.world.contains(e) {
                return Err(SceneError::NoSuchEntity(e));
            }
        }
        if self.descendants(child).contains(&parent) {
            return Err(SceneError::Cycle { child, parent });
        }

        let previous = self.world.get::<&Parent>(child).ok().map(|p| p.0);
        if let Some(old) = previous
            && let Ok(mut children) = self.world.get::<&mut Children>(old)
        {
            children.0.retain(|&c| c != child);
        }

        self.attach(child, parent);
        Ok(())
    }

    // Both entities must exist.
    fn attach(&mut self, child: Entity, parent: Entity) {
        let pushed = self
            .world
            .get::<&mut Children>(parent)
            .map(|mut children| children.0.push(child))
            .is_ok();
        if !pushed {
            let _ = self.world.insert_one(parent, Children(vec![child]));
        }
        let _ = self.world.insert_one(child, Parent(parent));
    }

    /// Adds a loaded model under `parent` and returns its root node.
    ///
    /// Mesh nodes get a lit material in the colour the model was loaded with.
    pub fn instantiate(&mut self, node: ModelNode, parent: Option<Entity>) -> Entity {
        let ModelNode {
            name,
            kind,
            children,
        } = node;

        let entity = match kind {
            ModelNodeKind::Group => self.spawn_group(name, Transform::default()),
            ModelNodeKind::Mesh(part) => {
                let mesh = self.add_mesh(part.geometry);
                self.spawn_mesh(name, mesh, Material::standard(part.color), Transform::default())
            }
        };
        if let Some(parent) = parent {
            self.attach(entity, parent);
        }

        for child in children {
            self.instantiate(child, Some(entity));
        }
        entity
    }

    /// `root` and every node below it, depth first.
    pub fn descendants(&self, root: Entity) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(e) = stack.pop() {
            if !self.world.contains(e) {
                continue;
            }
            out.push(e);
            if let Ok(children) = self.world.get::<&Children>(e) {
                stack.extend(children.0.iter().rev().copied());
            }
        }
        out
    }

    /// Applies shadow flags to every mesh under `root`. With `fog` false the
    /// meshes also stop taking scene fog.
    pub fn configure_meshes(&mut self, root: Entity, shadows: Shadows, fog: bool) {
        for e in self.descendants(root) {
            if self.node_kind(e) != Some(NodeKind::Mesh) {
                continue;
            }
            if let Ok(mut flags) = self.world.get::<&mut Shadows>(e) {
                *flags = shadows;
            }
            if !fog && let Ok(mut renderable) = self.world.get::<&mut Renderable>(e) {
                renderable.material = renderable.material.without_fog();
            }
        }
    }

    pub fn node_kind(&self, entity: Entity) -> Option<NodeKind> {
        self.world.get::<&NodeKind>(entity).ok().map(|k| *k)
    }

    pub fn find(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<&Name>()
            .iter()
            .find(|(_, n)| n.0 == name)
            .map(|(e, _)| e)
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    pub fn transform_mut(&self, entity: Entity) -> Option<RefMut<'_, Transform>> {
        self.world.get::<&mut Transform>(entity).ok()
    }

    /// Model-to-world matrix, composed through every ancestor.
    pub fn world_matrix(&self, entity: Entity) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(entity);
        while let Some(e) = current {
            if let Ok(t) = self.world.get::<&Transform>(e) {
                matrix = t.matrix() * matrix;
            }
            current = self.world.get::<&Parent>(e).ok().map(|p| p.0);
        }
        matrix
    }

    pub fn world_position(&self, entity: Entity) -> Vec3 {
        self.world_matrix(entity).transform_point3(Vec3::ZERO)
    }

    /// Recolours a mesh's material and a light's emission, whichever exist.
    ///
    /// Returns false if the entity has neither.
    pub fn set_color(&mut self, entity: Entity, color: Color) -> bool {
        let mut changed = false;
        if let Ok(mut renderable) = self.world.get::<&mut Renderable>(entity) {
            renderable.material.color = color;
            changed = true;
        }
        if let Ok(mut light) = self.world.get::<&mut PointLight>(entity) {
            light.color = color;
            changed = true;
        }
        changed
    }

    /// Material colour of a mesh, or emission colour of a light.
    pub fn color_of(&self, entity: Entity) -> Option<Color> {
        if let Ok(renderable) = self.world.get::<&Renderable>(entity) {
            return Some(renderable.material.color);
        }
        self.world.get::<&PointLight>(entity).ok().map(|l| l.color)
    }

    /// Tests `ray` against one entity's collider only.
    pub fn raycast(&self, entity: Entity, ray: &Ray) -> Option<RayHit> {
        let collider = *self.world.get::<&Collider>(entity).ok()?;
        let distance = collider.intersect_world(ray, self.world_matrix(entity))?;
        Some(RayHit {
            entity,
            distance,
            point: ray.point_at(distance),
        })
    }

    /// Every mesh with its resolved world matrix.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        self.world
            .query::<&Renderable>()
            .iter()
            .map(|(entity, renderable)| DrawItem {
                entity,
                mesh: renderable.mesh,
                material: renderable.material,
                model: self.world_matrix(entity),
            })
            .collect()
    }

    pub fn point_lights(&self) -> Vec<PointLightInstance> {
        self.world
            .query::<&PointLight>()
            .iter()
            .map(|(entity, light)| PointLightInstance {
                position: self.world_position(entity),
                light: *light,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MeshPart;

    fn cube_scene() -> (Scene, Entity) {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(RawGeometry::cuboid(Vec3::ONE));
        let cube = scene.spawn_mesh(
            "cube",
            mesh,
            Material::standard(Color::RED),
            Transform::from_position(Vec3::X),
        );
        (scene, cube)
    }

    #[test]
    fn child_matrix_includes_parent() {
        let (mut scene, cube) = cube_scene();
        let root = scene.spawn_group(
            "root",
            Transform::from_position(Vec3::new(0.0, -6.0, 0.0)).uniform_scale(2.0),
        );
        scene.set_parent(cube, root).unwrap();

        assert!(scene.world_position(cube).abs_diff_eq(Vec3::new(2.0, -6.0, 0.0), 1e-6));
        assert_eq!(scene.descendants(root), vec![root, cube]);
    }

    #[test]
    fn reparenting_moves_child_and_rejects_cycles() {
        let (mut scene, cube) = cube_scene();
        let a = scene.spawn_group("a", Transform::default());
        let b = scene.spawn_group("b", Transform::default());
        scene.set_parent(cube, a).unwrap();
        scene.set_parent(cube, b).unwrap();
        assert_eq!(scene.descendants(a), vec![a]);
        assert_eq!(scene.descendants(b), vec![b, cube]);

        scene.set_parent(b, a).unwrap();
        assert_eq!(
            scene.set_parent(a, cube),
            Err(SceneError::Cycle { child: a, parent: cube })
        );
    }

    #[test]
    fn instantiated_model_keeps_node_kinds() {
        let mut scene = Scene::new();
        let part = MeshPart {
            geometry: RawGeometry::cuboid(Vec3::ONE),
            color: Color::from_hex(0x336699),
        };
        let model = ModelNode::group("car", vec![ModelNode::mesh("car_mesh", part)]);

        let root = scene.instantiate(model, None);
        let mesh = scene.find("car_mesh").unwrap();
        assert_eq!(scene.node_kind(root), Some(NodeKind::Group));
        assert_eq!(scene.node_kind(mesh), Some(NodeKind::Mesh));
        assert_eq!(scene.color_of(mesh), Some(Color::from_hex(0x336699)));

        scene.configure_meshes(root, Shadows::CAST_AND_RECEIVE, false);
        let shadows = *scene.world.get::<&Shadows>(mesh).unwrap();
        assert_eq!(shadows, Shadows::CAST_AND_RECEIVE);
        assert!(!scene.draw_list()[0].material.fog);
    }

    #[test]
    fn fogless_meshes_keep_their_material() {
        let (mut scene, cube) = cube_scene();
        let root = scene.spawn_group("root", Transform::default());
        scene.set_parent(cube, root).unwrap();

        scene.configure_meshes(root, Shadows::default(), true);
        assert!(scene.draw_list()[0].material.fog);

        scene.configure_meshes(root, Shadows::default(), false);
        let material = scene.draw_list()[0].material;
        assert_eq!(material, Material::standard(Color::RED).without_fog());
        assert!(material.lit);
    }

    #[test]
    fn raycast_follows_parent_transform() {
        let (mut scene, cube) = cube_scene();
        scene.world.insert_one(cube, Collider::box_collider(Vec3::ONE)).unwrap();
        let root = scene.spawn_group("root", Transform::from_position(Vec3::new(0.0, 0.0, -5.0)));
        scene.set_parent(cube, root).unwrap();

        let hit = scene
            .raycast(cube, &Ray::new(Vec3::new(1.0, 0.0, 5.0), Vec3::NEG_Z))
            .unwrap();
        assert!((hit.distance - 9.5).abs() < 1e-4);
        assert!(scene.raycast(cube, &Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z)).is_none());
    }

    #[test]
    fn set_color_reaches_lights_and_meshes() {
        let (mut scene, cube) = cube_scene();
        let light = scene.spawn_point_light(
            "light",
            PointLight::new(Color::WHITE, 2.0, 10.0),
            Transform::from_position(Vec3::Y * 7.0),
        );
        let group = scene.spawn_group("empty", Transform::default());

        let blue = Color::from_hex(0x4E97D1);
        assert!(scene.set_color(cube, blue));
        assert!(scene.set_color(light, blue));
        assert!(!scene.set_color(group, blue));
        assert_eq!(scene.color_of(light), Some(blue));
        assert_eq!(scene.point_lights()[0].light.color, blue);
        assert!(scene.point_lights()[0].position.abs_diff_eq(Vec3::Y * 7.0, 1e-6));
    }
}
