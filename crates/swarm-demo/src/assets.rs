use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use swarm_engine::file::File;
use swarm_engine::memory::{Buffer, MemoryError};
use swarm_engine::render::SpriteVertex;

/// Edge length of the stand-in texture used when an asset cannot be read.
const PLACEHOLDER_SIZE: u32 = 64;

/// An image decoded to RGBA8, ready for upload.
pub struct DecodedImage {
    pub name: String,
    pub pixels: RgbaImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }
}

/// Reads `path` into a scratch scope of `temporary` and decodes it.
///
/// The raw file bytes are released as soon as decoding finishes.
pub fn load_image(path: &Path, temporary: &mut Buffer<'_>) -> Result<DecodedImage> {
    let mut scratch = temporary.scratch();
    let file = File::load(path, &mut scratch)?;

    let pixels = image::load_from_memory(file.data())
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgba8();

    log::debug!(
        "decoded {} ({}x{})",
        file.name(),
        pixels.width(),
        pixels.height()
    );

    Ok(DecodedImage {
        name: file.name().to_owned(),
        pixels,
    })
}

/// Loads every asset in `names` from `dir`.
///
/// Assets that fail to load are replaced by a placeholder so indices stay stable.
pub fn load_images(dir: &Path, names: &[&str], temporary: &mut Buffer<'_>) -> Vec<DecodedImage> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let path = dir.join(name);
            load_image(&path, temporary).unwrap_or_else(|e| {
                log::warn!("{e:#}; using placeholder");
                placeholder(name, index)
            })
        })
        .collect()
}

/// Checkerboard tinted per `index`.
pub fn placeholder(name: &str, index: usize) -> DecodedImage {
    const TINTS: [[u8; 3]; 5] = [
        [230, 80, 80],
        [80, 200, 120],
        [90, 140, 240],
        [240, 200, 70],
        [190, 110, 220],
    ];
    let [r, g, b] = TINTS[index % TINTS.len()];

    let pixels = RgbaImage::from_fn(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgba([r, g, b, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });

    DecodedImage {
        name: format!("{name} (placeholder)"),
        pixels,
    }
}

/// Reserves one aspect-corrected quad per image from `buffer`.
pub fn build_quads<'a>(
    buffer: &mut Buffer<'a>,
    images: &[DecodedImage],
    viewport_aspect: f32,
    scale: f32,
) -> Result<&'a [SpriteVertex], MemoryError> {
    let vertices = buffer.reserve::<SpriteVertex>(images.len() * 4)?;

    for (quad, image) in vertices.chunks_exact_mut(4).zip(images) {
        quad.copy_from_slice(&SpriteVertex::quad(
            image.aspect_ratio(),
            viewport_aspect,
            scale,
        ));
    }

    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_engine::memory::Arena;
    use tempfile::tempdir;

    #[test]
    fn load_image_decodes_and_releases_file_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut arena = Arena::allocate(4096).unwrap();
        let mut temporary = arena.buffer();
        let image = load_image(&path, &mut temporary).unwrap();

        assert_eq!((image.width(), image.height()), (4, 2));
        assert_eq!(image.pixels.get_pixel(3, 1), &Rgba([10, 20, 30, 255]));
        assert_eq!(temporary.allocated(), 0);
    }

    #[test]
    fn missing_assets_become_placeholders() {
        let dir = tempdir().unwrap();
        let mut arena = Arena::allocate(1024).unwrap();
        let mut temporary = arena.buffer();

        let images = load_images(dir.path(), &["a.png", "b.png"], &mut temporary);

        assert_eq!(images.len(), 2);
        assert!(images[1].name.starts_with("b.png"));
        assert_eq!(images[0].width(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn undecodable_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"not an image").unwrap();

        let mut arena = Arena::allocate(1024).unwrap();
        let mut temporary = arena.buffer();

        assert!(load_image(&path, &mut temporary).is_err());
    }

    #[test]
    fn quads_are_built_per_image() {
        let images = [
            placeholder("square", 0),
            DecodedImage {
                name: "wide".into(),
                pixels: RgbaImage::new(20, 10),
            },
        ];

        let mut arena = Arena::allocate(1024).unwrap();
        let mut persistent = arena.buffer();
        let quads = build_quads(&mut persistent, &images, 16.0 / 9.0, 0.4).unwrap();

        assert_eq!(quads.len(), 8);
        assert_eq!(&quads[..4], &SpriteVertex::quad(1.0, 16.0 / 9.0, 0.4));
        assert_eq!(&quads[4..], &SpriteVertex::quad(2.0, 16.0 / 9.0, 0.4));
    }
}
