use super::{mib, Buffer, MemoryError};

/// One top-level block obtained from the system allocator.
///
/// The block is requested once and released when the arena is dropped.
pub struct Arena {
    block: Box<[u8]>,
}

impl Arena {
    /// Requests a block of `bytes` bytes from the system allocator.
    ///
    /// Fails when `bytes == 0` or when the allocator cannot satisfy the request.
    pub fn allocate(bytes: usize) -> Result<Self, MemoryError> {
        if bytes == 0 {
            let err = MemoryError::ZeroSized { what: "arena" };
            log::error!("Arena::allocate: {err}");
            return Err(err);
        }

        let mut block = Vec::new();
        if block.try_reserve_exact(bytes).is_err() {
            let err = MemoryError::SystemAllocation { bytes };
            log::error!("Arena::allocate: {err}");
            return Err(err);
        }
        block.resize(bytes, 0u8);

        log::debug!("arena allocated: {bytes} bytes");
        Ok(Self {
            block: block.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    /// Returns an empty bump allocator over the whole block.
    ///
    /// Each call starts again from offset zero; the borrow checker guarantees
    /// that everything claimed through a previous buffer is gone by then.
    pub fn buffer(&mut self) -> Buffer<'_> {
        Buffer::new(&mut self.block)
    }
}

/// Sizes of the two process-wide arenas.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Data that lives until shutdown (entity arrays, vertex data).
    pub persistent_bytes: usize,

    /// Short-lived data such as raw file contents.
    pub temporary_bytes: usize,
}

impl MemoryConfig {
    pub const DEFAULT_PERSISTENT_BYTES: usize = mib(10);
    pub const DEFAULT_TEMPORARY_BYTES: usize = mib(10);
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            persistent_bytes: Self::DEFAULT_PERSISTENT_BYTES,
            temporary_bytes: Self::DEFAULT_TEMPORARY_BYTES,
        }
    }
}

/// Owner of the persistent and temporary arenas.
///
/// Create it early in `main`, hand out [`Memory`] by `&mut`, and let it drop at
/// the end of `main`.
pub struct MemoryStorage {
    persistent: Arena,
    temporary: Arena,
}

impl MemoryStorage {
    pub fn allocate(config: &MemoryConfig) -> Result<Self, MemoryError> {
        Ok(Self {
            persistent: Arena::allocate(config.persistent_bytes)?,
            temporary: Arena::allocate(config.temporary_bytes)?,
        })
    }

    /// Borrows both arenas as bump allocators.
    pub fn memory(&mut self) -> Memory<'_> {
        Memory {
            persistent: self.persistent.buffer(),
            temporary: self.temporary.buffer(),
        }
    }
}

/// Allocation context passed to everything that needs arena memory.
#[derive(Debug)]
pub struct Memory<'a> {
    pub persistent: Buffer<'a>,
    pub temporary: Buffer<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_zero_bytes_fails() {
        assert!(matches!(
            Arena::allocate(0),
            Err(MemoryError::ZeroSized { what: "arena" })
        ));
    }

    #[test]
    fn fresh_buffer_is_empty() {
        let mut arena = Arena::allocate(128).unwrap();
        let buf = arena.buffer();
        assert_eq!(buf.capacity(), 128);
        assert_eq!(buf.allocated(), 0);
        assert_eq!(buf.bytes_remaining(), 128);
    }

    #[test]
    fn rebuffering_starts_from_zero() {
        let mut arena = Arena::allocate(32).unwrap();
        {
            let mut buf = arena.buffer();
            buf.reserve_bytes(32).unwrap();
            assert_eq!(buf.bytes_remaining(), 0);
        }
        assert_eq!(arena.buffer().bytes_remaining(), 32);
    }

    #[test]
    fn default_config_is_ten_mib_each() {
        let config = MemoryConfig::default();
        assert_eq!(config.persistent_bytes, 10 * 1024 * 1024);
        assert_eq!(config.temporary_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn storage_exposes_both_arenas() {
        let config = MemoryConfig {
            persistent_bytes: 64,
            temporary_bytes: 32,
        };
        let mut storage = MemoryStorage::allocate(&config).unwrap();
        let mut memory = storage.memory();

        assert_eq!(memory.persistent.capacity(), 64);
        assert_eq!(memory.temporary.capacity(), 32);

        memory.persistent.reserve_bytes(10).unwrap();
        assert_eq!(memory.temporary.allocated(), 0);
    }

    #[test]
    fn storage_rejects_zero_sized_arena() {
        let config = MemoryConfig {
            persistent_bytes: 64,
            temporary_bytes: 0,
        };
        assert!(MemoryStorage::allocate(&config).is_err());
    }
}
