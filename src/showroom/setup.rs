use std::f32::consts::{FRAC_PI_2, FRAC_PI_6};

use glam::{UVec2, Vec3};
use rand::Rng;

use super::Showroom;
use super::state::{LightUnit, SceneState};
use crate::camera::PerspectiveCamera;
use crate::color::Color;
use crate::config::ShowroomConfig;
use crate::geometry::{BoxFace, RawGeometry};
use crate::mesh::Transform;
use crate::orbit_controls::OrbitControls;
use crate::picking::Collider;
use crate::scene::{
    AmbientLight, DirectionalLight, Fog, Material, PointLight, Scene, Shadows, SpotLight,
};

const SKYBOX_SIZE: f32 = 80.0;
const SKYBOX_CENTER: Vec3 = Vec3::new(0.0, 38.5, 0.0);
const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 6.0, 15.0);
const BUTTON_RADIUS: f32 = 0.5;
const BUTTON_HEIGHT: f32 = 0.2;
const BUTTON_POSITION: Vec3 = Vec3::new(0.0, -1.1, 7.0);
const BASE_POSITION: Vec3 = Vec3::new(0.0, -1.3, 7.0);

impl Showroom<OrbitControls> {
    /// Builds the whole scene except the two models, which arrive later
    /// through [`LoadHandler`](super::LoadHandler).
    ///
    /// `viewport` is the initial window size in pixels. Light phase speeds
    /// are drawn from `rng`.
    pub fn build(config: &ShowroomConfig, viewport: (u32, u32), rng: &mut impl Rng) -> Self {
        let mut scene = Scene::new();
        add_environment(&mut scene, config);
        let lights = add_light_grid(&mut scene, config, rng);
        let button = add_button(&mut scene, config);

        let mut camera = PerspectiveCamera::new()
            .at(CAMERA_POSITION)
            .looking_at(Vec3::ZERO)
            .with_fov(75.0)
            .with_clip(0.1, 1000.0);
        camera.set_viewport(viewport.0, viewport.1);

        let controls = OrbitControls::new()
            .damping(0.05)
            .screen_space_panning(false)
            .distance_limits(5.0, 50.0)
            .max_polar_angle(FRAC_PI_2);

        log::info!(
            "Showroom ready: {} lights, {} meshes",
            lights.len(),
            scene.assets.mesh_count()
        );

        Self {
            scene,
            state: SceneState::new(lights, button),
            camera,
            controls,
            viewport: UVec2::new(viewport.0, viewport.1),
        }
    }
}

fn add_environment(scene: &mut Scene, config: &ShowroomConfig) {
    scene.fog = Some(Fog {
        color: Color::from_hex(0xAAAAAA),
        density: 0.02,
    });
    scene.ambient = AmbientLight {
        color: Color::WHITE,
        intensity: 0.2,
    };
    scene.directional = Some(DirectionalLight {
        color: Color::WHITE,
        intensity: 1.0,
        position: Vec3::new(5.0, 10.0, 5.0),
        target: Vec3::ZERO,
        cast_shadows: true,
    });
    scene.spot = Some(SpotLight {
        color: Color::WHITE,
        intensity: 20.0,
        position: Vec3::new(0.0, 10.0, 0.0),
        target: Vec3::new(0.0, -6.0, 0.0),
        angle: FRAC_PI_6,
        penumbra: 0.5,
        decay: 2.0,
        distance: 50.0,
        cast_shadows: true,
    });

    // Inward-facing box; the floor face gets its own texture
    let size = Vec3::splat(SKYBOX_SIZE);
    let sides = [
        BoxFace::PosX,
        BoxFace::NegX,
        BoxFace::PosY,
        BoxFace::PosZ,
        BoxFace::NegZ,
    ];
    let walls_mesh = scene.add_mesh(RawGeometry::cuboid_faces(size, &sides).inverted());
    let floor_mesh = scene.add_mesh(RawGeometry::cuboid_faces(size, &[BoxFace::NegY]).inverted());
    let walls_tex = scene.assets.add_texture(&config.assets.skybox);
    let floor_tex = scene.assets.add_texture(&config.assets.skybox_floor);

    let skybox = scene.spawn_group("skybox", Transform::from_position(SKYBOX_CENTER));
    let walls = scene.spawn_mesh(
        "skybox_walls",
        walls_mesh,
        Material::basic(Color::WHITE).with_texture(walls_tex),
        Transform::default(),
    );
    let floor = scene.spawn_mesh(
        "skybox_floor",
        floor_mesh,
        Material::basic(Color::WHITE).with_texture(floor_tex),
        Transform::default(),
    );
    for face in [walls, floor] {
        if let Err(e) = scene.set_parent(face, skybox) {
            log::warn!("Skybox face not attached: {}", e);
        }
    }
}

fn add_light_grid(scene: &mut Scene, config: &ShowroomConfig, rng: &mut impl Rng) -> Vec<LightUnit> {
    let grid = &config.grid;
    let sphere = scene.add_mesh(RawGeometry::sphere(grid.marker_radius, 16, 16));

    grid.positions()
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            let light = scene.spawn_point_light(
                format!("grid_light_{}", i),
                PointLight::new(config.palette.off, grid.intensity, grid.range),
                Transform::from_position(position),
            );
            let marker = scene.spawn_mesh(
                format!("grid_marker_{}", i),
                sphere,
                Material::basic(config.palette.off),
                Transform::from_position(position),
            );
            LightUnit {
                light,
                marker,
                phase_speed: rng.gen_range(grid.phase_speed.clone()),
                baseline_y: position.y,
            }
        })
        .collect()
}

fn add_button(scene: &mut Scene, config: &ShowroomConfig) -> hecs::Entity {
    let cylinder = scene.add_mesh(RawGeometry::cylinder(BUTTON_RADIUS, BUTTON_HEIGHT, 32));
    let button = scene.spawn_mesh(
        "button",
        cylinder,
        Material::standard(Color::RED),
        Transform::from_position(BUTTON_POSITION),
    );
    // A freshly spawned entity always accepts components
    let _ = scene.world.insert(
        button,
        (
            Collider::cylinder(BUTTON_RADIUS, BUTTON_HEIGHT),
            Shadows::CAST_AND_RECEIVE,
        ),
    );

    let base_mesh = scene.add_mesh(RawGeometry::cuboid(Vec3::new(1.0, 0.2, 1.0)));
    let metal = scene.assets.add_texture(&config.assets.button_metal);
    scene.spawn_mesh(
        "button_base",
        base_mesh,
        Material::basic(Color::WHITE).with_texture(metal),
        Transform::from_position(BASE_POSITION).uniform_scale(1.5),
    );

    button
}
