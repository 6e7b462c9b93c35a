use anyhow::{ensure, Result};

use super::RenderCtx;

/// Sampled 2D texture uploaded from RGBA8 pixels.
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Texture {
    /// Uploads tightly packed RGBA8 (sRGB) pixels, row-major from the top-left.
    pub fn from_rgba8(
        ctx: &RenderCtx<'_>,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self> {
        ensure!(width > 0 && height > 0, "texture `{label}` has zero size");
        let expected = rgba8_len(width, height);
        ensure!(
            pixels.len() == expected,
            "texture `{label}`: expected {expected} bytes of RGBA8, got {}",
            pixels.len()
        );

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("texture `{label}` uploaded: {width}x{height}");

        Ok(Self {
            texture,
            view,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn raw(&self) -> &wgpu::Texture {
        &self.texture
    }
}

fn rgba8_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}
