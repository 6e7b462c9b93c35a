//! GPU rendering subsystem.
//!
//! Each renderer owns its GPU resources (pipelines, buffers) and creates them
//! lazily on first use.
//!
//! Convention:
//! - sprite geometry is in normalized device units, +Y up
//! - the vertex shader applies a projection uniform

mod ctx;
mod sprites;
mod texture;

pub use ctx::{RenderCtx, RenderTarget};
pub use sprites::{SpriteInstance, SpriteRenderer, SpriteVertex, QUAD_INDICES};
pub use texture::Texture;
