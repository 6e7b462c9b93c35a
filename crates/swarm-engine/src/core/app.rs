use std::time::Duration;

use anyhow::Result;
use winit::event::WindowEvent;

use crate::render::RenderCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called once the window and GPU exist, before the first frame.
    ///
    /// Upload textures and static geometry here. An error stops the runtime.
    fn on_gpu_ready(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called for window events.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Advances the simulation by exactly one fixed `step`.
    fn update(&mut self, step: Duration);

    /// Called once per redraw while rendering is enabled.
    fn render(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
