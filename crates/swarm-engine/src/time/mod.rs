//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per render loop; `tick()` once per loop iteration
//! - a `FixedTimestep` fed with each tick, drained in whole simulation steps
//! - a `Session` counting ticks and frames and sampling FPS

mod fixed_step;
mod frame_clock;
mod session;
mod timer;

pub use fixed_step::FixedTimestep;
pub use frame_clock::{FrameClock, FrameTime};
pub use session::{FpsCounter, Session, SessionSummary};
pub use timer::Timer;
