//! Swarm engine crate.
//!
//! Arena memory, fixed-step timing and file loading, plus the platform + GPU
//! runtime used to draw large numbers of instanced sprites.

pub mod coords;
pub mod core;
pub mod device;
pub mod file;
pub mod logging;
pub mod memory;
pub mod render;
pub mod time;
pub mod window;
