use std::time::Duration;

use anyhow::{ensure, Result};
use swarm_engine::coords::{ColorRgba, Mat4};
use swarm_engine::core::{App, AppControl, FrameCtx};
use swarm_engine::render::{RenderCtx, SpriteRenderer, SpriteVertex, Texture};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::assets::DecodedImage;
use crate::world::World;

/// The sprite swarm: simulation state plus everything needed to draw it.
pub struct SwarmApp<'a> {
    world: World<'a>,
    quads: &'a [SpriteVertex],

    /// Decoded pixels, dropped once uploaded.
    images: Vec<DecodedImage>,
    textures: Vec<Texture>,
    renderer: SpriteRenderer,

    active_texture: usize,
    clear_color: ColorRgba,
    projection: Mat4,

    /// FPS measurement shown in the title bar.
    shown_fps_cycle: u64,
}

impl<'a> SwarmApp<'a> {
    pub fn new(
        world: World<'a>,
        quads: &'a [SpriteVertex],
        images: Vec<DecodedImage>,
        active_texture: usize,
        clear_color: ColorRgba,
    ) -> Self {
        Self {
            world,
            quads,
            images,
            textures: Vec::new(),
            renderer: SpriteRenderer::new(),
            active_texture,
            clear_color,
            projection: Mat4::orthographic(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0),
            shown_fps_cycle: 0,
        }
    }
}

impl App for SwarmApp<'_> {
    fn on_gpu_ready(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        ensure!(
            self.active_texture < self.images.len(),
            "active texture {} out of range ({} loaded)",
            self.active_texture,
            self.images.len()
        );

        self.textures = self
            .images
            .drain(..)
            .map(|image| {
                Texture::from_rgba8(
                    ctx,
                    &image.name,
                    image.width(),
                    image.height(),
                    image.pixels.as_raw(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        self.renderer.upload_quads(ctx, self.quads);
        self.renderer.set_texture(&self.textures[self.active_texture]);

        log::info!(
            "{} textures uploaded; drawing {} sprites with texture {}",
            self.textures.len(),
            self.world.len(),
            self.active_texture
        );
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn update(&mut self, _step: Duration) {
        self.world.step();
    }

    fn render(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let fps = ctx.session.fps();
        if fps.cycles() != self.shown_fps_cycle {
            self.shown_fps_cycle = fps.cycles();
            ctx.window
                .set_title(&format!("FPS: {:.1}", fps.last_measurement()));
        }

        let renderer = &mut self.renderer;
        let instances = self.world.instances();
        let quad = self.active_texture as u32;
        let projection = &self.projection;

        ctx.render(self.clear_color, |rctx, target| {
            renderer.render(rctx, target, instances, quad, projection);
        })
    }
}
