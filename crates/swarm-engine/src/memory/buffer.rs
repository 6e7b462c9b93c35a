use std::fmt;
use std::mem::{align_of, size_of};

use bytemuck::{Pod, Zeroable};

use super::MemoryError;

/// Control record of a sliced buffer.
///
/// The record is stored inside the parent's bytes, directly in front of the
/// slice's data, and is the slice's source of truth for its offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SliceHeader {
    pub capacity: u64,
    pub allocated: u64,
}

/// Bytes a slice's control record takes from its parent (alignment padding excluded).
pub const SLICE_HEADER_SIZE: usize = size_of::<SliceHeader>();

enum Header<'a> {
    /// Top-level buffers and scratch scopes keep their record inline.
    Inline(SliceHeader),
    /// Slices keep theirs in the parent's memory.
    Nested(&'a mut SliceHeader),
}

impl Header<'_> {
    #[inline]
    fn get(&self) -> &SliceHeader {
        match self {
            Header::Inline(h) => h,
            Header::Nested(h) => h,
        }
    }

    #[inline]
    fn get_mut(&mut self) -> &mut SliceHeader {
        match self {
            Header::Inline(h) => h,
            Header::Nested(h) => h,
        }
    }
}

/// Bump allocator over a borrowed byte region.
///
/// Every successful reservation claims the next contiguous range of the
/// region and hands it out for the full lifetime `'a`. Claims never overlap
/// and are never reclaimed; `allocated` only grows.
///
/// Invariant: `allocated() + bytes_remaining() == capacity()`.
pub struct Buffer<'a> {
    header: Header<'a>,

    /// Unclaimed tail of the region.
    free: &'a mut [u8],
}

impl<'a> Buffer<'a> {
    /// Wraps `bytes` as an empty buffer.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self {
            header: Header::Inline(SliceHeader {
                capacity: bytes.len() as u64,
                allocated: 0,
            }),
            free: bytes,
        }
    }

    /// Total bytes managed by this buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.header.get().capacity as usize
    }

    /// Bytes already claimed, alignment padding included.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.header.get().allocated as usize
    }

    #[inline]
    pub fn bytes_remaining(&self) -> usize {
        debug_assert_eq!(self.capacity() - self.allocated(), self.free.len());
        self.capacity() - self.allocated()
    }

    /// Claims room for `count` values of `T`.
    ///
    /// The returned slice is aligned for `T`; padding needed to get there is
    /// charged to `allocated`. Its contents are unspecified.
    ///
    /// Fails on `count == 0` or when the request does not fit. On failure the
    /// buffer is unchanged.
    pub fn reserve<T: Pod>(&mut self, count: usize) -> Result<&'a mut [T], MemoryError> {
        let (padding, size) = self
            .plan(count, size_of::<T>(), align_of::<T>())
            .inspect_err(|e| log::error!("Buffer::reserve: {e}"))?;

        let bytes = self.claim(padding, size);
        bytemuck::try_cast_slice_mut(bytes).map_err(|_| MemoryError::Cast)
    }

    /// Claims room for a single `T`.
    pub fn reserve_one<T: Pod>(&mut self) -> Result<&'a mut T, MemoryError> {
        let (padding, size) = self
            .plan(1, size_of::<T>(), align_of::<T>())
            .inspect_err(|e| log::error!("Buffer::reserve_one: {e}"))?;

        let bytes = self.claim(padding, size);
        bytemuck::try_from_bytes_mut(bytes).map_err(|_| MemoryError::Cast)
    }

    /// Claims `count` raw bytes.
    #[inline]
    pub fn reserve_bytes(&mut self, count: usize) -> Result<&'a mut [u8], MemoryError> {
        self.reserve::<u8>(count)
    }

    /// Carves a nested buffer of `capacity` bytes out of this one.
    ///
    /// The parent is charged for the slice's [`SliceHeader`] (plus alignment
    /// padding) and for `capacity` data bytes. The slice then allocates from
    /// its own data independently, starting at offset zero.
    ///
    /// The whole request is checked up front: a failed slice claims nothing.
    pub fn slice(&mut self, capacity: usize) -> Result<Buffer<'a>, MemoryError> {
        let (padding, needed) = self
            .plan_slice(capacity)
            .inspect_err(|e| log::error!("Buffer::slice: {e}"))?;

        let header_bytes = self.claim(padding, SLICE_HEADER_SIZE);
        let header: &'a mut SliceHeader =
            bytemuck::try_from_bytes_mut(header_bytes).map_err(|_| MemoryError::Cast)?;
        *header = SliceHeader {
            capacity: capacity as u64,
            allocated: 0,
        };

        let data = self.claim(0, needed - padding - SLICE_HEADER_SIZE);

        Ok(Buffer {
            header: Header::Nested(header),
            free: data,
        })
    }

    /// Opens a scratch scope over the unclaimed bytes of this buffer.
    ///
    /// Claims made through the scope are valid only while it is alive. When it
    /// is dropped, this buffer's offset is exactly what it was before, and the
    /// same bytes can be handed out again.
    pub fn scratch(&mut self) -> Buffer<'_> {
        Buffer::new(&mut *self.free)
    }

    fn plan(
        &self,
        count: usize,
        element_size: usize,
        align: usize,
    ) -> Result<(usize, usize), MemoryError> {
        if count == 0 || element_size == 0 {
            return Err(MemoryError::ZeroSized { what: "reservation" });
        }

        let size = count
            .checked_mul(element_size)
            .ok_or(MemoryError::SizeOverflow { count, element_size })?;

        let padding = self.padding_for(align);
        let remaining = self.bytes_remaining();

        match padding.checked_add(size) {
            Some(needed) if needed <= remaining => Ok((padding, size)),
            _ => Err(MemoryError::OutOfCapacity { requested: size, remaining }),
        }
    }

    /// Returns `(header padding, total bytes the parent is charged)`.
    fn plan_slice(&self, capacity: usize) -> Result<(usize, usize), MemoryError> {
        if capacity == 0 {
            return Err(MemoryError::ZeroSized { what: "slice" });
        }

        let padding = self.padding_for(align_of::<SliceHeader>());
        let remaining = self.bytes_remaining();
        let requested = capacity.saturating_add(SLICE_HEADER_SIZE);

        match padding.checked_add(requested) {
            Some(needed) if needed <= remaining => Ok((padding, needed)),
            _ => Err(MemoryError::OutOfCapacity { requested, remaining }),
        }
    }

    #[inline]
    fn padding_for(&self, align: usize) -> usize {
        debug_assert!(align.is_power_of_two());
        let addr = self.free.as_ptr() as usize;
        addr.wrapping_neg() & (align - 1)
    }

    /// Splits `padding + size` bytes off the front of the free region.
    /// Callers must have checked the request against `bytes_remaining`.
    fn claim(&mut self, padding: usize, size: usize) -> &'a mut [u8] {
        let free = std::mem::take(&mut self.free);
        let (_, rest) = free.split_at_mut(padding);
        let (claimed, rest) = rest.split_at_mut(size);
        self.free = rest;
        self.header.get_mut().allocated += (padding + size) as u64;
        claimed
    }
}

impl fmt::Debug for Buffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Arena;

    fn span<T>(s: &[T]) -> (usize, usize) {
        let start = s.as_ptr() as usize;
        (start, start + std::mem::size_of_val(s))
    }

    fn disjoint(a: (usize, usize), b: (usize, usize)) -> bool {
        a.1 <= b.0 || b.1 <= a.0
    }

    // ── reserve ───────────────────────────────────────────────────────────

    #[test]
    fn reserve_until_exhausted() {
        let mut arena = Arena::allocate(100).unwrap();
        let mut buf = arena.buffer();

        assert!(buf.reserve_bytes(40).is_ok());
        assert!(buf.reserve_bytes(40).is_ok());
        assert_eq!(buf.allocated(), 80);

        let err = buf.reserve_bytes(40).unwrap_err();
        assert_eq!(err, MemoryError::OutOfCapacity { requested: 40, remaining: 20 });
        assert_eq!(buf.allocated(), 80);
        assert_eq!(buf.bytes_remaining(), 20);
    }

    #[test]
    fn reserve_sequence_sums_and_never_overlaps() {
        let mut arena = Arena::allocate(256).unwrap();
        let mut buf = arena.buffer();

        let sizes = [1usize, 7, 32, 3, 64, 13];
        let mut spans = Vec::new();
        for &n in &sizes {
            let s = buf.reserve_bytes(n).unwrap();
            assert_eq!(s.len(), n);
            spans.push(span(s));
        }

        assert_eq!(buf.allocated(), sizes.iter().sum::<usize>());
        for (i, a) in spans.iter().enumerate() {
            for b in &spans[i + 1..] {
                assert!(disjoint(*a, *b));
            }
        }
    }

    #[test]
    fn claims_are_writable_and_independent() {
        let mut arena = Arena::allocate(64).unwrap();
        let mut buf = arena.buffer();

        let a = buf.reserve::<u32>(4).unwrap();
        let b = buf.reserve::<u32>(4).unwrap();
        a.fill(0xAAAA_AAAA);
        b.fill(0x5555_5555);

        assert!(a.iter().all(|&v| v == 0xAAAA_AAAA));
        assert!(b.iter().all(|&v| v == 0x5555_5555));
    }

    #[test]
    fn reserve_zero_count_fails_without_change() {
        let mut arena = Arena::allocate(16).unwrap();
        let mut buf = arena.buffer();
        buf.reserve_bytes(4).unwrap();

        assert!(matches!(buf.reserve::<u64>(0), Err(MemoryError::ZeroSized { .. })));
        assert_eq!(buf.allocated(), 4);
    }

    #[test]
    fn reserve_over_capacity_does_not_advance() {
        let mut arena = Arena::allocate(32).unwrap();
        let mut buf = arena.buffer();

        assert!(buf.reserve_bytes(33).is_err());
        assert_eq!(buf.allocated(), 0);
        assert_eq!(buf.bytes_remaining(), 32);

        // The full capacity is still available afterwards.
        assert_eq!(buf.reserve_bytes(32).unwrap().len(), 32);
    }

    #[test]
    fn reserve_size_overflow_is_rejected() {
        let mut arena = Arena::allocate(16).unwrap();
        let mut buf = arena.buffer();

        let err = buf.reserve::<u64>(usize::MAX).unwrap_err();
        assert!(matches!(err, MemoryError::SizeOverflow { .. }));
        assert_eq!(buf.allocated(), 0);
    }

    #[test]
    fn typed_reserve_is_aligned() {
        let mut arena = Arena::allocate(64).unwrap();
        let mut buf = arena.buffer();

        buf.reserve_bytes(1).unwrap();
        let words = buf.reserve::<u64>(2).unwrap();

        assert_eq!(words.as_ptr() as usize % std::mem::align_of::<u64>(), 0);
        assert!(buf.allocated() >= 1 + 16);
        assert_eq!(buf.allocated() + buf.bytes_remaining(), buf.capacity());
    }

    #[test]
    fn reserve_one_returns_single_value() {
        let mut arena = Arena::allocate(32).unwrap();
        let mut buf = arena.buffer();

        let v: &mut u32 = buf.reserve_one().unwrap();
        *v = 7;
        assert_eq!(*v, 7);
        assert!(buf.allocated() >= 4);
    }

    // ── slice ─────────────────────────────────────────────────────────────

    #[test]
    fn slice_charges_parent_for_header_and_data() {
        let mut arena = Arena::allocate(256).unwrap();
        let mut parent = arena.buffer();
        let before = parent.bytes_remaining();

        let child = parent.slice(100).unwrap();

        assert_eq!(child.capacity(), 100);
        assert_eq!(child.allocated(), 0);
        assert!(before - parent.bytes_remaining() >= 100 + SLICE_HEADER_SIZE);
    }

    #[test]
    fn slice_allocates_independently_of_parent() {
        let mut arena = Arena::allocate(256).unwrap();
        let mut parent = arena.buffer();

        let mut child = parent.slice(64).unwrap();
        let parent_allocated = parent.allocated();

        child.reserve_bytes(10).unwrap();
        child.reserve_bytes(20).unwrap();

        assert_eq!(child.allocated(), 30);
        assert_eq!(child.bytes_remaining(), 34);
        assert_eq!(parent.allocated(), parent_allocated);
        assert!(child.reserve_bytes(35).is_err());
    }

    #[test]
    fn slice_memory_lies_within_parent_claim() {
        let mut arena = Arena::allocate(128).unwrap();
        let mut parent = arena.buffer();
        let first = span(parent.reserve_bytes(8).unwrap());

        let mut child = parent.slice(32).unwrap();
        let inner = span(child.reserve_bytes(32).unwrap());
        let after = span(parent.reserve_bytes(8).unwrap());

        assert!(first.1 <= inner.0);
        assert!(inner.1 <= after.0);
    }

    #[test]
    fn failed_slice_leaves_parent_untouched() {
        let mut arena = Arena::allocate(64).unwrap();
        let mut parent = arena.buffer();

        // Enough room for the data alone but not for data plus header.
        let err = parent.slice(60).unwrap_err();
        assert!(matches!(err, MemoryError::OutOfCapacity { .. }));
        assert_eq!(parent.allocated(), 0);

        assert!(matches!(parent.slice(0), Err(MemoryError::ZeroSized { .. })));
        assert_eq!(parent.allocated(), 0);
    }

    #[test]
    fn slices_nest() {
        let mut arena = Arena::allocate(512).unwrap();
        let mut root = arena.buffer();

        let mut outer = root.slice(200).unwrap();
        let mut inner = outer.slice(50).unwrap();

        assert!(outer.allocated() >= 50 + SLICE_HEADER_SIZE);
        assert_eq!(inner.capacity(), 50);
        inner.reserve_bytes(50).unwrap();
        assert_eq!(inner.bytes_remaining(), 0);
    }

    // ── scratch ───────────────────────────────────────────────────────────

    #[test]
    fn scratch_claims_are_released_on_drop() {
        let mut arena = Arena::allocate(64).unwrap();
        let mut buf = arena.buffer();
        buf.reserve_bytes(16).unwrap();

        let first = {
            let mut scratch = buf.scratch();
            assert_eq!(scratch.capacity(), 48);
            let s = scratch.reserve_bytes(32).unwrap();
            assert_eq!(scratch.allocated(), 32);
            s.as_ptr() as usize
        };

        assert_eq!(buf.allocated(), 16);

        let again = buf.reserve_bytes(32).unwrap();
        assert_eq!(again.as_ptr() as usize, first);
    }

    #[test]
    fn debug_shows_offsets() {
        let mut arena = Arena::allocate(10).unwrap();
        let mut buf = arena.buffer();
        buf.reserve_bytes(3).unwrap();
        assert_eq!(format!("{buf:?}"), "Buffer { capacity: 10, allocated: 3 }");
    }
}
