/// How the GPU layer is brought up for the sprite window.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Wait for vertical blank before presenting.
    ///
    /// Off lets the FPS readout show raw throughput instead of the refresh rate.
    pub vsync: bool,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    pub power_preference: wgpu::PowerPreference,

    /// Indexed indirect draws need no optional features.
    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Frames the CPU may queue ahead of the GPU (a hint).
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Present mode requested from the surface; wgpu resolves the `Auto*`
    /// modes to the best supported one.
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            vsync: true,
            prefer_srgb: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
