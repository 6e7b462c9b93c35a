//! Swarm demo: half a million textured sprites drifting under a fixed-step
//! simulation, drawn with a single instanced indirect draw per frame.

mod app;
mod assets;
mod config;
mod world;

use std::path::Path;

use anyhow::{Context, Result};
use swarm_engine::logging::{init_logging, LoggingConfig};
use swarm_engine::memory::{Memory, MemoryStorage};
use swarm_engine::window::Runtime;

use crate::app::SwarmApp;
use crate::config::DemoConfig;
use crate::world::World;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::default();

    let mut storage =
        MemoryStorage::allocate(&config.memory()).context("failed to allocate arenas")?;
    let Memory {
        mut persistent,
        mut temporary,
    } = storage.memory();

    let images = assets::load_images(Path::new(config.assets_dir), config.assets, &mut temporary);
    let quads = assets::build_quads(
        &mut persistent,
        &images,
        config.resolution.aspect_ratio(),
        config.sprite_scale,
    )
    .context("failed to reserve sprite quads")?;

    let world = World::spawn(&mut persistent, config.entity_count, &mut rand::rng())
        .context("failed to reserve entities")?;

    log::info!(
        "persistent arena: {} of {} bytes in use",
        persistent.allocated(),
        persistent.capacity()
    );

    let app = SwarmApp::new(
        world,
        quads,
        images,
        config.active_texture,
        config.clear_color,
    );

    Runtime::run(config.runtime(), config.gpu(), app)?;
    Ok(())
}
