use std::time::Duration;

use winit::window::Window;

use crate::coords::ColorRgba;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::{FrameTime, Session};

use super::app::AppControl;

/// Window handle exposed to the application.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    /// Inner size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Per-frame context passed to `core::App::render`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub session: &'a Session,
    pub time: FrameTime,

    /// Simulation step length.
    pub step: Duration,

    /// Fraction of a step left in the accumulator, in `[0, 1)`.
    pub alpha: f64,

    presented: bool,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    pub(crate) fn new(
        window: &'a Window,
        gpu: &'a mut Gpu<'w>,
        session: &'a Session,
        time: FrameTime,
        step: Duration,
        alpha: f64,
    ) -> Self {
        Self {
            window: WindowCtx { window },
            gpu,
            session,
            time,
            step,
            alpha,
            presented: false,
        }
    }

    /// Whether a frame was submitted to the surface during this callback.
    #[inline]
    pub fn presented(&self) -> bool {
        self.presented
    }

    /// Clears the surface with `clear`, calls `draw` with a ready [`RenderCtx`] and
    /// [`RenderTarget`], then presents the frame.
    ///
    /// Surface errors skip the frame; only unrecoverable ones return `Exit`.
    pub fn render<F>(&mut self, clear: ColorRgba, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        // Borrows frame.encoder; dropped before submit() takes frame.
        {
            let rctx = RenderCtx::from_gpu(self.gpu);
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            drop(target.begin_pass("swarm clear", Some(clear)));
            draw(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);
        self.presented = true;

        AppControl::Continue
    }
}
