//! Window, event loop and the glue between winit and the [`Showroom`].

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::{AppConfig, ShowroomConfig};
use crate::input::Input;
use crate::loader::ModelLoader;
use crate::orbit_controls::CameraControls;
use crate::render::{ForwardRenderer, GpuContext, GpuInitError, RenderError};
use crate::showroom::{FrameLoop, LoadHandler, PickHandler, Showroom, SlotId, model_requests};

/// Fatal errors from starting or running the app.
#[derive(Debug)]
pub enum AppError {
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
    Gpu(GpuInitError),
    Render(RenderError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "event loop error: {}", e),
            AppError::Window(e) => write!(f, "failed to create window: {}", e),
            AppError::Gpu(e) => write!(f, "GPU initialisation failed: {}", e),
            AppError::Render(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Gpu(e) => Some(e),
            AppError::Render(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(e: winit::error::OsError) -> Self {
        AppError::Window(e)
    }
}

impl From<GpuInitError> for AppError {
    fn from(e: GpuInitError) -> Self {
        AppError::Gpu(e)
    }
}

/// Opens the window and runs the showroom until it is closed.
///
/// # Example
/// ```no_run
/// use showroom::{AppConfig, ShowroomConfig};
///
/// showroom::run(AppConfig::new().title("Showroom"), ShowroomConfig::new())?;
/// # Ok::<(), showroom::AppError>(())
/// ```
pub fn run(config: AppConfig, showroom: ShowroomConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ShowroomApp::Pending { config, showroom };
    event_loop.run_app(&mut app)?;

    match app {
        ShowroomApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    renderer: ForwardRenderer,
    showroom: Showroom,
    frame_loop: FrameLoop,
    picker: PickHandler,
    loads: LoadHandler,
    loader: ModelLoader<SlotId>,
    input: Input,
}

enum ShowroomApp {
    Pending {
        config: AppConfig,
        showroom: ShowroomConfig,
    },
    Running(Box<Running>),
    Failed(AppError),
}

impl ShowroomApp {
    fn start(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        showroom_config: &ShowroomConfig,
    ) -> Result<Running, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let viewport = (gpu.width(), gpu.height());
        let renderer = ForwardRenderer::new(gpu);

        let mut rng = SmallRng::from_entropy();
        let showroom = Showroom::build(showroom_config, viewport, &mut rng);

        let loader = ModelLoader::new();
        for request in model_requests(showroom_config) {
            loader.load(request);
        }

        Ok(Running {
            window,
            renderer,
            showroom,
            frame_loop: FrameLoop::new(showroom_config.animation),
            picker: PickHandler::new(showroom_config.palette),
            loads: LoadHandler::new(showroom_config),
            loader,
            input: Input::new(),
        })
    }
}

impl ApplicationHandler for ShowroomApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let ShowroomApp::Pending { config, showroom } = self else {
            return;
        };

        *self = match Self::start(event_loop, config, showroom) {
            Ok(running) => {
                running.window.request_redraw();
                ShowroomApp::Running(Box::new(running))
            }
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                ShowroomApp::Failed(e)
            }
        };
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ShowroomApp::Running(app) = self else {
            return;
        };
        let Running {
            window,
            renderer,
            showroom,
            frame_loop,
            picker,
            loads,
            loader,
            input,
        } = app.as_mut();

        input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                showroom.resize(size.width, size.height, renderer);
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                let viewport = showroom.viewport();
                picker.on_click(showroom, input.mouse_position(), viewport);
            }
            WindowEvent::RedrawRequested => {
                if input.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }

                for load in loader.drain() {
                    loads.handle(showroom, load);
                }

                let viewport = showroom.viewport();
                showroom
                    .controls
                    .handle_input(input, &showroom.camera, viewport);

                if let Err(e) = frame_loop.tick(showroom, renderer) {
                    log::error!("Render failed: {}", e);
                    event_loop.exit();
                    *self = ShowroomApp::Failed(AppError::Render(e));
                    return;
                }

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
