//! Whole-file loading into arena memory.
//!
//! Files are read in one go into a slice of a caller-provided [`Buffer`], so the
//! bytes share the lifetime of that buffer and no heap allocation is made for them.
//!
//! [`Buffer`]: crate::memory::Buffer

mod error;
mod handle;

pub use error::FileError;
pub use handle::{write_to_file, File, MAX_FILENAME_LENGTH};
