use std::time::Duration;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::render::RenderCtx;
use crate::time::{FixedTimestep, FpsCounter, FrameClock, FrameTime, Session, SessionSummary};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: PhysicalSize<u32>,
    pub resizable: bool,

    /// Simulation step handed to `App::update`.
    pub fixed_step: Duration,

    /// Window over which the frame rate is sampled.
    pub fps_interval: Duration,
}

impl RuntimeConfig {
    pub const DEFAULT_FIXED_STEP: Duration = Duration::from_millis(10);
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "swarm".to_string(),
            initial_size: PhysicalSize::new(1280, 720),
            resizable: true,
            fixed_step: Self::DEFAULT_FIXED_STEP,
            fps_interval: FpsCounter::MEASUREMENT_INTERVAL,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and runs the loop until the app or the user closes it.
    ///
    /// Returns the statistics of the run, which are also logged at info level.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<SessionSummary>
    where
        A: CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.session.log_summary();

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(state.session.summary()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,

    clock: FrameClock,
    fixed: FixedTimestep,
    session: Session,

    /// Timing of the latest loop iteration, reported with the next presented frame.
    last_tick: Option<FrameTime>,

    render_enabled: bool,
    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        let clock = FrameClock::new();
        let fixed = FixedTimestep::new(config.fixed_step);
        let session = Session::with_fps_interval(config.fps_interval);

        Self {
            config,
            gpu_init,
            app,
            window: None,
            clock,
            fixed,
            session,
            last_tick: None,
            render_enabled: true,
            exit_requested: false,
            fatal: None,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn fail(&mut self, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        self.request_exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init)).context("GPU initialization failed")
            },
        }
        .try_build()?;

        let app = &mut self.app;
        entry
            .with_gpu(|gpu| {
                let rctx = RenderCtx::from_gpu(gpu);
                app.on_gpu_ready(&rctx)
            })
            .context("application failed to initialize GPU resources")?;

        let size = entry.borrow_gpu().size();
        log::info!("window created: {}x{}", size.width, size.height);
        self.set_render_enabled(size.width > 0 && size.height > 0);

        self.window = Some(entry);
        Ok(())
    }

    /// Advances the simulation by the time elapsed since the previous iteration.
    fn step_simulation(&mut self) {
        let tick = self.clock.tick();
        self.fixed.accumulate(tick.dt);

        let (app, session) = (&mut self.app, &mut self.session);
        self.fixed.drain(|step| {
            session.update(step);
            app.update(step);
        });

        self.last_tick = Some(tick);
    }

    fn set_render_enabled(&mut self, enabled: bool) {
        if self.render_enabled != enabled {
            log::debug!("rendering {}", if enabled { "resumed" } else { "paused" });
        }
        self.render_enabled = enabled;
    }

    fn redraw(&mut self) {
        if !self.render_enabled {
            return;
        }
        let Some(tick) = self.last_tick else { return };
        let Some(entry) = self.window.as_mut() else { return };

        let (app, session) = (&mut self.app, &self.session);
        let step = self.fixed.step();
        let alpha = self.fixed.alpha();

        let (control, presented) = entry.with_mut(|fields| {
            let mut ctx = FrameCtx::new(fields.window, fields.gpu, session, tick, step, alpha);
            let control = app.render(&mut ctx);
            (control, ctx.presented())
        });

        if presented {
            self.session.render(tick.dt);
        }
        if control == AppControl::Exit {
            self.request_exit();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(e);
            event_loop.exit();
            return;
        }

        // Setup time is not simulated.
        self.clock.reset();
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        if self.window.is_none() {
            return;
        }

        self.step_simulation();

        if self.render_enabled {
            if let Some(entry) = self.window.as_ref() {
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit();
            event_loop.exit();
            return;
        }

        // Runtime-managed window lifecycle / resize / redraw handling.
        match &event {
            WindowEvent::CloseRequested => {
                self.request_exit();
            }

            WindowEvent::Resized(new_size) => {
                let visible = new_size.width > 0 && new_size.height > 0;
                if let Some(entry) = self.window.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                }
                self.set_render_enabled(visible);
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                }
            }

            WindowEvent::Occluded(occluded) => {
                self.set_render_enabled(!occluded);
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Drop the surface before the event loop tears down the window system.
        self.window = None;
    }
}
