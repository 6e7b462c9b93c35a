use crate::coords::{ColorRgba, Viewport};
use crate::device::Gpu;

/// GPU handles a renderer needs while recording a frame.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,

    /// Format pipelines must target; a change forces a pipeline rebuild.
    pub surface_format: wgpu::TextureFormat,

    /// Drawable size in physical pixels.
    pub viewport: Viewport,
}

impl<'a> RenderCtx<'a> {
    /// Borrows the handles of a live GPU context.
    #[inline]
    pub fn from_gpu(gpu: &'a Gpu<'_>) -> Self {
        Self {
            device: gpu.device(),
            queue: gpu.queue(),
            surface_format: gpu.surface_format(),
            viewport: gpu.viewport(),
        }
    }
}

/// Surface texture of the current frame plus the encoder recording into it.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }

    /// Opens a pass over the color view. `clear` wipes it first; `None` keeps
    /// what earlier passes drew.
    pub fn begin_pass(&mut self, label: &str, clear: Option<ColorRgba>) -> wgpu::RenderPass<'_> {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.color_view,
                resolve_target: None,
                ops: color_ops(clear),
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

fn color_ops(clear: Option<ColorRgba>) -> wgpu::Operations<wgpu::Color> {
    wgpu::Operations {
        load: match clear {
            Some(color) => wgpu::LoadOp::Clear(color.to_wgpu()),
            None => wgpu::LoadOp::Load,
        },
        store: wgpu::StoreOp::Store,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_color_wipes_the_target() {
        let ops = color_ops(Some(ColorRgba::new(0.25, 0.5, 0.75, 1.0)));
        assert_eq!(
            ops.load,
            wgpu::LoadOp::Clear(wgpu::Color { r: 0.25, g: 0.5, b: 0.75, a: 1.0 })
        );
        assert_eq!(ops.store, wgpu::StoreOp::Store);
    }

    #[test]
    fn no_clear_keeps_earlier_passes() {
        let ops = color_ops(None);
        assert_eq!(ops.load, wgpu::LoadOp::Load);
        assert_eq!(ops.store, wgpu::StoreOp::Store);
    }
}
