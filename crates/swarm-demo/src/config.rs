use std::time::Duration;

use swarm_engine::coords::ColorRgba;
use swarm_engine::device::GpuInit;
use swarm_engine::memory::{mib, MemoryConfig};
use swarm_engine::window::RuntimeConfig;
use winit::dpi::PhysicalSize;

/// Window size in physical pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

pub const RESOLUTIONS: [Resolution; 4] = [
    Resolution::new(640, 360),
    Resolution::new(1024, 576),
    Resolution::new(1366, 768),
    Resolution::new(1920, 1080),
];

/// Images drawn by the demo, relative to [`DemoConfig::assets_dir`].
pub const ASSETS: [&str; 5] = ["athano.bmp", "azen.png", "azen2.png", "azen3.png", "pepe.png"];

/// Compile-time tunables of the demo.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub resolution: Resolution,
    pub entity_count: usize,
    pub fixed_step: Duration,
    pub fps_interval: Duration,

    pub persistent_bytes: usize,
    pub temporary_bytes: usize,

    pub assets_dir: &'static str,
    pub assets: &'static [&'static str],

    /// Index into `assets` of the texture every sprite is drawn with.
    pub active_texture: usize,

    /// Sprite height in normalized device units.
    pub sprite_scale: f32,

    pub clear_color: ColorRgba,

    /// Cap presentation at the display refresh rate.
    pub vsync: bool,
}

impl DemoConfig {
    pub const DEFAULT: DemoConfig = DemoConfig {
        resolution: RESOLUTIONS[0],
        entity_count: 500_000,
        fixed_step: Duration::from_millis(10),
        fps_interval: Duration::from_millis(300),
        persistent_bytes: mib(10),
        temporary_bytes: mib(10),
        assets_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/assets"),
        assets: &ASSETS,
        active_texture: 2,
        sprite_scale: 0.4,
        clear_color: ColorRgba::gray(0.2),
        vsync: true,
    };

    pub fn memory(&self) -> MemoryConfig {
        MemoryConfig {
            persistent_bytes: self.persistent_bytes,
            temporary_bytes: self.temporary_bytes,
        }
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: "FPS: 0".to_string(),
            initial_size: PhysicalSize::new(self.resolution.width, self.resolution.height),
            // Quads are aspect-corrected for the configured resolution.
            resizable: false,
            fixed_step: self.fixed_step,
            fps_interval: self.fps_interval,
            ..RuntimeConfig::default()
        }
    }

    pub fn gpu(&self) -> GpuInit {
        GpuInit::default().with_vsync(self.vsync)
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;

    #[test]
    fn first_resolution_is_selected() {
        assert_eq!(DemoConfig::DEFAULT.resolution, Resolution::new(640, 360));
        assert!((RESOLUTIONS[3].aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn entities_fit_in_persistent_arena() {
        let config = DemoConfig::default();
        let quads = config.assets.len() * 4 * std::mem::size_of::<swarm_engine::render::SpriteVertex>();
        assert!(World::bytes_for(config.entity_count) + quads <= config.persistent_bytes);
    }

    #[test]
    fn active_texture_is_an_asset() {
        let config = DemoConfig::default();
        assert!(config.active_texture < config.assets.len());
    }

    #[test]
    fn runtime_config_carries_timing() {
        let runtime = DemoConfig::default().runtime();
        assert_eq!(runtime.fixed_step, Duration::from_millis(10));
        assert_eq!(runtime.fps_interval, Duration::from_millis(300));
        assert_eq!(runtime.initial_size, PhysicalSize::new(640, 360));
    }

    #[test]
    fn vsync_flag_reaches_the_gpu() {
        let config = DemoConfig {
            vsync: false,
            ..DemoConfig::default()
        };
        assert!(!config.gpu().vsync);
        assert!(DemoConfig::default().gpu().vsync);
    }
}
