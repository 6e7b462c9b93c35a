//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer and
//! drives the fixed-step simulation.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
