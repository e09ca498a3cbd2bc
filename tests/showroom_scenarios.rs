use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use showroom::scene::{Name, Scene};
use showroom::{
    AnimationConfig, AssetLoadError, CameraControls, Color, FrameLoop, LoadEvent, LoadHandler,
    MeshPart, ModelAsset, ModelLoader, ModelNode, PerspectiveCamera, PickHandler, PickOutcome,
    Quat, RawGeometry, RenderError, SceneRenderer, Showroom, ShowroomConfig, SlotId, Vec2, Vec3,
    model_requests,
};

const EPSILON: f32 = 1e-5;
const LIGHT_ON: Color = Color::from_hex(0x4E97D1);

#[derive(Default)]
struct RecordingRenderer {
    renders: usize,
    resizes: Vec<(u32, u32)>,
    aspects: Vec<f32>,
    fail: bool,
}

impl SceneRenderer for RecordingRenderer {
    fn render(&mut self, _scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        if self.fail {
            return Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory));
        }
        self.renders += 1;
        self.aspects.push(camera.aspect);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }
}

/// Counts updates without moving the camera.
#[derive(Default)]
struct StillControls {
    updates: usize,
}

impl CameraControls for StillControls {
    fn update(&mut self, _camera: &mut PerspectiveCamera) {
        self.updates += 1;
    }
}

fn config() -> ShowroomConfig {
    ShowroomConfig::new().asset_dir(std::env::temp_dir().join("showroom-missing-assets"))
}

fn showroom(width: u32, height: u32) -> Showroom {
    let mut rng = SmallRng::seed_from_u64(7);
    Showroom::build(&config(), (width, height), &mut rng)
}

fn model(name: &str, color: Color) -> ModelAsset {
    let part = MeshPart {
        geometry: RawGeometry::cuboid(Vec3::ONE),
        color,
    };
    ModelAsset {
        root: ModelNode::group(name, vec![ModelNode::mesh(format!("{}_mesh", name), part)]),
    }
}

/// Pixel position of a world point on screen.
fn to_pixels(camera: &PerspectiveCamera, point: Vec3, viewport: Vec2) -> Vec2 {
    let ndc = camera.project(point);
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.x,
        (1.0 - ndc.y) * 0.5 * viewport.y,
    )
}

fn click_button(showroom: &mut Showroom, picker: &PickHandler) -> PickOutcome {
    let button = showroom.scene.world_position(showroom.state.button());
    let viewport = showroom.viewport();
    let pointer = to_pixels(&showroom.camera, button, viewport);
    picker.on_click(showroom, pointer, viewport)
}

fn named(scene: &Scene, name: &str) -> usize {
    scene
        .world
        .query::<&Name>()
        .iter()
        .filter(|(_, n)| n.0 == name)
        .count()
}

#[test]
fn clicking_button_turns_every_light_blue() {
    let mut showroom = showroom(800, 600);
    let picker = PickHandler::new(config().palette);

    let outcome = click_button(&mut showroom, &picker);
    assert!(matches!(outcome, PickOutcome::Hit { toggled_on: true, .. }));
    assert!(showroom.state.toggle().is_on());

    assert_eq!(showroom.state.lights().len(), 20);
    for unit in showroom.state.lights() {
        assert_eq!(showroom.scene.color_of(unit.light), Some(LIGHT_ON));
        assert_eq!(showroom.scene.color_of(unit.marker), Some(LIGHT_ON));
    }
}

#[test]
fn clicking_empty_space_changes_nothing() {
    let mut showroom = showroom(800, 600);
    let picker = PickHandler::new(config().palette);
    let viewport = showroom.viewport();

    for pointer in [Vec2::ZERO, Vec2::new(viewport.x, 0.0), Vec2::new(-50.0, -50.0)] {
        assert_eq!(picker.on_click(&mut showroom, pointer, viewport), PickOutcome::Miss);
    }

    assert!(!showroom.state.toggle().is_on());
    for unit in showroom.state.lights() {
        assert_eq!(showroom.scene.color_of(unit.light), Some(Color::WHITE));
        assert_eq!(showroom.scene.color_of(unit.marker), Some(Color::WHITE));
    }
}

#[test]
fn second_click_restores_white() {
    let mut showroom = showroom(800, 600);
    let picker = PickHandler::new(config().palette);

    click_button(&mut showroom, &picker);
    let outcome = click_button(&mut showroom, &picker);

    assert!(matches!(outcome, PickOutcome::Hit { toggled_on: false, .. }));
    assert!(!showroom.state.toggle().is_on());
    for unit in showroom.state.lights() {
        assert_eq!(showroom.scene.color_of(unit.light), Some(Color::WHITE));
        assert_eq!(showroom.scene.color_of(unit.marker), Some(Color::WHITE));
    }
}

#[test]
fn failed_car_never_rotates_while_platform_spins() {
    let config = config();
    let mut showroom = showroom(800, 600);
    let loads = LoadHandler::new(&config);

    let error = AssetLoadError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
    assert!(loads
        .handle(&mut showroom, LoadEvent::Failed { slot: SlotId::Car, error })
        .is_none());
    let platform = loads
        .handle(
            &mut showroom,
            LoadEvent::Loaded {
                slot: SlotId::Platform,
                asset: model("platform", config.platform.color),
            },
        )
        .expect("platform placed");
    let initial = showroom.scene.transform(platform).unwrap().rotation;

    let mut renderer = RecordingRenderer::default();
    let mut frames = FrameLoop::with_clock(|| 100.0, config.animation);
    for _ in 0..50 {
        frames.tick(&mut showroom, &mut renderer).unwrap();
    }

    assert!(!showroom.state.slot(SlotId::Car).is_loaded());
    assert_eq!(named(&showroom.scene, "car"), 0);

    let rotation = showroom.scene.transform(platform).unwrap().rotation;
    let expected = initial * Quat::from_rotation_z(50.0 * config.animation.platform_roll_step);
    assert!(rotation.abs_diff_eq(expected, 1e-4));
    assert_eq!(renderer.renders, 50);
}

#[test]
fn loaded_car_spins_about_its_own_axis() {
    let config = config();
    let mut showroom = showroom(800, 600);
    let loads = LoadHandler::new(&config);

    let car = loads
        .handle(
            &mut showroom,
            LoadEvent::Loaded {
                slot: SlotId::Car,
                asset: model("car", config.car.color),
            },
        )
        .expect("car placed");
    let placed = showroom.scene.transform(car).unwrap();
    assert_eq!(placed.scale, Vec3::splat(2.0));

    let mut renderer = RecordingRenderer::default();
    let mut frames = FrameLoop::with_clock(|| 0.0, config.animation);
    for _ in 0..10 {
        frames.tick(&mut showroom, &mut renderer).unwrap();
    }

    let spun = showroom.scene.transform(car).unwrap();
    let expected = Quat::from_rotation_y(10.0 * config.animation.car_yaw_step);
    assert!(spun.rotation.abs_diff_eq(expected, 1e-4));
    assert_eq!(spun.position, placed.position);

    let mesh = showroom.scene.find("car_mesh").unwrap();
    assert_eq!(showroom.scene.color_of(mesh), Some(config.car.color));
}

#[test]
fn second_model_for_a_filled_slot_is_ignored() {
    let config = config();
    let mut showroom = showroom(800, 600);
    let loads = LoadHandler::new(&config);

    let first = loads.handle(
        &mut showroom,
        LoadEvent::Loaded {
            slot: SlotId::Car,
            asset: model("car", config.car.color),
        },
    );
    let second = loads.handle(
        &mut showroom,
        LoadEvent::Loaded {
            slot: SlotId::Car,
            asset: model("car", config.car.color),
        },
    );

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(showroom.state.slot(SlotId::Car).entity(), first);
    assert_eq!(named(&showroom.scene, "car"), 1);
}

#[test]
fn resize_updates_aspect_and_renderer() {
    let mut showroom = showroom(800, 600);
    let mut renderer = RecordingRenderer::default();
    let lights_before = showroom.state.lights().to_vec();
    assert!((showroom.camera.aspect - 800.0 / 600.0).abs() < EPSILON);

    showroom.resize(1920, 1080, &mut renderer);

    assert!((showroom.camera.aspect - 1920.0 / 1080.0).abs() < EPSILON);
    assert_eq!(showroom.viewport(), Vec2::new(1920.0, 1080.0));
    assert_eq!(renderer.resizes, vec![(1920, 1080)]);
    assert_eq!(showroom.state.lights(), lights_before.as_slice());
    assert!(!showroom.state.toggle().is_on());

    let mut frames = FrameLoop::with_clock(|| 0.0, AnimationConfig::default());
    frames.tick(&mut showroom, &mut renderer).unwrap();
    assert!((renderer.aspects[0] - 1920.0 / 1080.0).abs() < EPSILON);
}

#[test]
fn minimised_window_is_ignored() {
    let mut showroom = showroom(800, 600);
    let mut renderer = RecordingRenderer::default();

    showroom.resize(0, 0, &mut renderer);

    assert!(renderer.resizes.is_empty());
    assert_eq!(showroom.viewport(), Vec2::new(800.0, 600.0));
    assert!((showroom.camera.aspect - 800.0 / 600.0).abs() < EPSILON);
}

#[test]
fn markers_track_their_lights() {
    let config = config();
    let mut showroom = showroom(800, 600);
    let mut renderer = RecordingRenderer::default();

    let time = Rc::new(Cell::new(0.0));
    let clock = {
        let time = Rc::clone(&time);
        move || time.get()
    };
    let mut frames = FrameLoop::with_clock(clock, config.animation);

    for frame in 0..120 {
        time.set(frame as f64 * 7.3);
        frames.tick(&mut showroom, &mut renderer).unwrap();

        for unit in showroom.state.lights() {
            let light = showroom.scene.world_position(unit.light);
            let marker = showroom.scene.world_position(unit.marker);
            assert_eq!(light, marker);
            assert!((light.y - unit.baseline_y).abs() <= config.animation.amplitude + EPSILON);
        }
    }
    assert_eq!(frames.frames(), 120);
}

#[test]
fn light_height_follows_the_clock() {
    let config = config();
    let mut showroom = showroom(800, 600);
    let mut renderer = RecordingRenderer::default();
    let now = 1_700_000_000.0;

    let mut frames = FrameLoop::with_clock(move || now, config.animation);
    frames.tick(&mut showroom, &mut renderer).unwrap();
    frames.tick(&mut showroom, &mut renderer).unwrap();

    // Same clock reading, same height: no drift between frames
    for unit in showroom.state.lights() {
        let y = showroom.scene.world_position(unit.light).y;
        assert_eq!(y, unit.height_at(now, config.animation.amplitude));
    }
}

#[test]
fn phase_speeds_stay_in_range() {
    let speeds = config().grid.phase_speed;
    for seed in 0..8 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let showroom = Showroom::build(&config(), (800, 600), &mut rng);
        for unit in showroom.state.lights() {
            assert!(speeds.contains(&unit.phase_speed));
        }
    }
}

#[test]
fn render_failure_ends_the_frame() {
    let mut showroom = showroom(800, 600).with_controls(StillControls::default());
    let mut renderer = RecordingRenderer {
        fail: true,
        ..Default::default()
    };

    let mut frames = FrameLoop::with_clock(|| 0.0, AnimationConfig::default());
    let result = frames.tick(&mut showroom, &mut renderer);

    assert!(matches!(result, Err(RenderError::Surface(_))));
    assert_eq!(frames.frames(), 0);
    assert_eq!(showroom.controls.updates, 1);
}

#[test]
fn controls_update_once_per_frame() {
    let mut showroom = showroom(800, 600).with_controls(StillControls::default());
    let mut renderer = RecordingRenderer::default();
    let camera_before = showroom.camera.position;

    let mut frames = FrameLoop::with_clock(|| 0.0, AnimationConfig::default());
    for _ in 0..5 {
        frames.tick(&mut showroom, &mut renderer).unwrap();
    }

    assert_eq!(showroom.controls.updates, 5);
    assert_eq!(showroom.camera.position, camera_before);
}

fn write_triangle_stl(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let stl = "solid car
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
endsolid car
";
    std::fs::write(dir.join("sportsCar.stl"), stl).unwrap();
}

#[test]
fn background_loads_fill_slots_they_can() {
    let dir = std::env::temp_dir().join(format!("showroom-loads-{}", std::process::id()));
    write_triangle_stl(&dir);
    let config = ShowroomConfig::new().asset_dir(&dir);
    let mut rng = SmallRng::seed_from_u64(1);
    let mut showroom = Showroom::build(&config, (800, 600), &mut rng);
    let loads = LoadHandler::new(&config);

    let loader = ModelLoader::new();
    for request in model_requests(&config) {
        loader.load(request);
    }

    let mut finished = 0;
    while finished < 2 {
        let event = loader
            .wait_event(Duration::from_secs(5))
            .expect("loader reported in time");
        if !matches!(event, LoadEvent::Progress { .. }) {
            finished += 1;
        }
        loads.handle(&mut showroom, event);
    }

    assert!(showroom.state.slot(SlotId::Car).is_loaded());
    assert!(!showroom.state.slot(SlotId::Platform).is_loaded());
    assert!(showroom.scene.find("car_mesh").is_some());

    let _ = std::fs::remove_dir_all(&dir);
}
