use thiserror::Error;

/// Failure modes of arena allocation.
///
/// Every failing operation leaves the buffer it was called on unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// A request for zero elements or zero bytes.
    #[error("attempt to allocate zero bytes for {what}")]
    ZeroSized { what: &'static str },

    /// The request does not fit in the bytes left in the buffer.
    #[error("not enough capacity: requested {requested} bytes, {remaining} remaining")]
    OutOfCapacity { requested: usize, remaining: usize },

    /// `count * size_of::<T>()` does not fit in `usize`.
    #[error("{count} elements of {element_size} bytes overflow the address space")]
    SizeOverflow { count: usize, element_size: usize },

    /// The system allocator refused the top-level block.
    #[error("system allocator could not provide {bytes} bytes")]
    SystemAllocation { bytes: usize },

    /// Claimed bytes could not be viewed as the requested type.
    #[error("claimed bytes could not be viewed as the requested type")]
    Cast,
}
