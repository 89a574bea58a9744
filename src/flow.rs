//! Application flow: window, GPU initialisation and the event loop.
//!
//! [`run`] opens a window, assembles the scene and hands both to winit's
//! event loop. Everything the handlers touch lives in one [`AppState`]:
//! the GPU [`Context`], the [`Scene`], the [`OrbitControls`] and the
//! [`FrameDriver`]. Nothing is reached through globals.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and initialises the GPU (blocking on
//!    native, through a user event on wasm)
//! 2. the surface is sized to the window and the frame driver is started
//! 3. every `RedrawRequested` re-arms the driver, applies the controls and
//!    draws the scene
//! 4. `Resized` reconfigures the surface and draws one frame right away

use std::sync::Arc;

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    assembly::{AssembledScene, SceneConfig, assemble_scene},
    camera::CameraSettings,
    context::{Context, RendererSettings},
    controls::OrbitControls,
    data_structures::scene_graph::{MeshNode, Scene},
    frame::FrameDriver,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything [`run`] can be configured with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AppConfig {
    pub renderer: RendererSettings,
    pub camera: CameraSettings,
    pub scene: SceneConfig,
    /// Stop the loop and exit after this many frames.
    pub frame_limit: Option<u64>,
}

/// Application state bundle: GPU context, scene, controls and frame driver.
pub struct AppState {
    pub(crate) ctx: Context,
    pub scene: Scene,
    /// Built with the scene but never attached to it.
    pub detached: MeshNode,
    controls: OrbitControls,
    driver: FrameDriver,
}

impl AppState {
    async fn new(window: Arc<Window>, config: AppConfig) -> anyhow::Result<Self> {
        let AssembledScene {
            mut scene,
            detached,
        } = assemble_scene(&config.scene)?;
        scene.update_world_transforms();

        let mut ctx = Context::new(window, &config.renderer, &config.camera, scene.light())
            .await
            .context("App initialization failed. Cannot create the main context")?;

        let mut controls = OrbitControls::new(ctx.camera.camera.target);
        controls.update(&mut ctx.camera.camera);
        ctx.write_camera();
        scene.write_to_buffers(&ctx);

        Ok(Self {
            ctx,
            scene,
            detached,
            controls,
            driver: FrameDriver::new(),
        })
    }
}

/// Applies pending input to the camera, uploads the uniforms and draws one frame.
fn draw(
    ctx: &mut Context,
    scene: &mut Scene,
    controls: &mut OrbitControls,
) -> Result<(), wgpu::SurfaceError> {
    if controls.update(&mut ctx.camera.camera) {
        log::trace!("camera at {:?}", ctx.camera.camera.position);
    }
    ctx.write_camera();
    scene.update_world_transforms();
    ctx.write_light(scene.light());
    scene.write_to_buffers(ctx);
    ctx.render(scene)
}

/// Resizes to `size` and draws one frame right away. Returns `None` if the
/// size was rejected and nothing was drawn.
fn resize_and_draw(
    ctx: &mut Context,
    scene: &mut Scene,
    controls: &mut OrbitControls,
    size: winit::dpi::PhysicalSize<u32>,
) -> Option<Result<(), wgpu::SurfaceError>> {
    ctx.resize(size.width, size.height)
        .then(|| draw(ctx, scene, controls))
}

fn handle_draw_result(ctx: &mut Context, result: Result<(), wgpu::SurfaceError>) {
    match result {
        Ok(()) => (),
        // Reconfigure the surface if it's lost or outdated
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            let size = ctx.window.inner_size();
            ctx.resize(size.width, size.height);
        }
        Err(e) => {
            log::error!("Unable to render {}", e);
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    config: AppConfig,
    state: Option<AppState>,
    initializing: bool,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: AppConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime =
            tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            state: None,
            initializing: false,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn on_initialized(&mut self, mut state: AppState) {
        let size = state.ctx.window.inner_size();
        state.ctx.resize(size.width, size.height);
        state.driver.start(state.ctx.window.as_ref());
        self.state = Some(state);
        self.initializing = false;
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    #[allow(dead_code)]
    Failed(anyhow::Error),
}

impl std::fmt::Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.initializing {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("shape-garden");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.initializing = true;
        let init_future = AppState::new(window, self.config);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(state) => self.on_initialized(state),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(state) => FlowEvent::Initialized(Box::new(state)),
                    Err(e) => FlowEvent::Failed(e),
                };
                assert!(proxy.send_event(event).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            FlowEvent::Initialized(state) => self.on_initialized(*state),
            FlowEvent::Failed(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        let AppState {
            ctx,
            scene,
            controls,
            driver,
            ..
        } = state;

        controls.handle_window_events(&event, &ctx.camera.camera, &ctx.viewport);

        match event {
            WindowEvent::CloseRequested => {
                driver.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(result) = resize_and_draw(ctx, scene, controls, size) {
                    handle_draw_result(ctx, result);
                }
            }
            WindowEvent::RedrawRequested => {
                let window = ctx.window.clone();
                let result = driver.on_frame(window.as_ref(), |_dt| draw(ctx, scene, controls));
                handle_draw_result(ctx, result.map(|_| ()));

                if self
                    .config
                    .frame_limit
                    .is_some_and(|limit| driver.frames() >= limit)
                {
                    log::info!("frame limit of {} reached", driver.frames());
                    driver.stop();
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

fn build_event_loop() -> anyhow::Result<EventLoop<FlowEvent>> {
    #[allow(unused_mut)]
    let mut builder = EventLoop::with_user_event();

    // Test harnesses drive the loop off the main thread
    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        builder.with_any_thread(true);
    }
    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    {
        use winit::platform::windows::EventLoopBuilderExtWindows;
        builder.with_any_thread(true);
    }

    Ok(builder.build()?)
}

/// Opens the window and runs the scene until the window is closed or the
/// frame limit is reached.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop = build_event_loop()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(all(test, feature = "integration-tests"))]
mod tests {
    use winit::dpi::PhysicalSize;

    use super::*;

    /// Runs the real app and resizes it as soon as it is initialised.
    struct ResizeOnStart {
        app: App,
        drew_after_resize: bool,
        drew_after_zero_resize: bool,
        configured: (u32, u32),
    }

    impl ApplicationHandler<FlowEvent> for ResizeOnStart {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            self.app.resumed(event_loop);
            let Some(state) = &mut self.app.state else {
                return;
            };
            let AppState {
                ctx,
                scene,
                controls,
                driver,
                ..
            } = state;

            let resized = resize_and_draw(ctx, scene, controls, PhysicalSize::new(320, 240));
            self.drew_after_resize = resized.is_some();
            let rejected = resize_and_draw(ctx, scene, controls, PhysicalSize::new(0, 240));
            self.drew_after_zero_resize = rejected.is_some();
            self.configured = (ctx.config.width, ctx.config.height);

            driver.stop();
            event_loop.exit();
        }

        fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
            self.app.user_event(event_loop, event);
        }

        fn window_event(
            &mut self,
            event_loop: &ActiveEventLoop,
            window_id: winit::window::WindowId,
            event: WindowEvent,
        ) {
            self.app.window_event(event_loop, window_id, event);
        }
    }

    #[test]
    fn resize_draws_immediately_and_ignores_zero_sizes() {
        let _ = env_logger::try_init();
        let config = AppConfig {
            scene: SceneConfig {
                seed: Some(7),
                ..Default::default()
            },
            ..Default::default()
        };
        let event_loop = build_event_loop().unwrap();
        let mut handler = ResizeOnStart {
            app: App::new(&event_loop, config).unwrap(),
            drew_after_resize: false,
            drew_after_zero_resize: false,
            configured: (0, 0),
        };
        event_loop.run_app(&mut handler).unwrap();

        assert!(handler.app.error.is_none(), "{:?}", handler.app.error);
        assert!(handler.drew_after_resize);
        assert!(!handler.drew_after_zero_resize);
        assert_eq!(handler.configured, (320, 240));
    }
}
