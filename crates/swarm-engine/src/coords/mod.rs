//! Coordinate and geometry types shared by the renderer and simulation code.
//!
//! Sprite space is normalized device units:
//! - `[-1, 1]` on both axes spans the viewport
//! - +X right, +Y up
//!
//! The projection uniform maps this space to clip space.

mod color;
mod mat4;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use mat4::Mat4;
pub use vec2::Vec2;
pub use viewport::Viewport;
