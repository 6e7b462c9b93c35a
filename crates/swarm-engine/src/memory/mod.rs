//! Arena memory.
//!
//! All long-lived dynamic data in the engine is carved out of a small number of
//! top-level blocks requested from the system allocator once, at startup.
//!
//! - [`Arena`] owns one block.
//! - [`Buffer`] is a bump allocator over a borrowed byte region. Claims are
//!   append-only and live as long as the region itself.
//! - [`Buffer::slice`] nests a bounded sub-allocator inside a parent buffer.
//! - [`Buffer::scratch`] opens a scope whose claims are released when it ends.
//! - [`MemoryStorage`] / [`Memory`] bundle the persistent and temporary arenas.

mod buffer;
mod error;
mod storage;

pub use buffer::{Buffer, SliceHeader, SLICE_HEADER_SIZE};
pub use error::MemoryError;
pub use storage::{Arena, Memory, MemoryConfig, MemoryStorage};

/// Bytes in `kibibytes` KiB.
#[inline]
pub const fn kib(kibibytes: usize) -> usize {
    kibibytes * 1024
}

/// Bytes in `mebibytes` MiB.
#[inline]
pub const fn mib(mebibytes: usize) -> usize {
    mebibytes * kib(1024)
}

/// Bytes in `gibibytes` GiB.
#[inline]
pub const fn gib(gibibytes: usize) -> usize {
    gibibytes * mib(1024)
}
