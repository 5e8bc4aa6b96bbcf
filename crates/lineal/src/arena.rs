//! The fixed-capacity bump allocator.

use std::mem;

use bytemuck::Pod;

use crate::block::optimal_block_size;
use crate::error::ArenaError;
use crate::handle::{BlockHandle, SliceHandle, ValueHandle};
use crate::raw::{RawStorage, MAX_ALIGN};

/// A fixed-capacity bump-pointer arena.
///
/// One contiguous reservation, made at construction and sized by
/// [`optimal_block_size`], from which allocations are carved by advancing
/// a cursor. Individual allocations are never freed; [`reset`] reclaims
/// the whole arena at once. The buffer never moves or resizes, so issued
/// offsets stay stable until the arena is dropped.
///
/// Allocations come back as generation-tagged handles rather than
/// references, and every access re-validates the generation: using a
/// handle issued before the most recent [`reset`] reports
/// [`ArenaError::StaleHandle`] instead of reading reused memory.
///
/// Typed allocations require [`Pod`] elements. `Pod` implies `Copy`,
/// which forbids `Drop` impls, so nothing stored in the arena can need
/// cleanup — dropping or resetting the arena runs no per-object logic,
/// and the type system rejects anything for which that would be wrong.
///
/// All mutation goes through `&mut self`; the arena is single-owner,
/// single-writer by construction.
///
/// [`reset`]: LinearArena::reset
pub struct LinearArena {
    /// Backing reservation. Fixed for the arena's lifetime.
    storage: RawStorage,
    /// Bump pointer: next free byte. `0 ≤ cursor ≤ capacity`, monotone
    /// between resets.
    cursor: usize,
    /// Bumped on every reset; issued handles are valid only while their
    /// generation matches.
    generation: u64,
}

impl LinearArena {
    /// Create an arena holding at least `requested` bytes.
    ///
    /// The actual capacity is `optimal_block_size(requested)`; a request
    /// of zero yields the 32-byte minimum block. The reservation is made
    /// exactly once, here.
    ///
    /// # Errors
    ///
    /// [`ArenaError::OutOfMemory`] if the system allocator cannot supply
    /// the rounded capacity. This is the only failure mode.
    pub fn new(requested: usize) -> Result<Self, ArenaError> {
        let storage = RawStorage::new(optimal_block_size(requested))?;
        Ok(Self {
            storage,
            cursor: 0,
            generation: 0,
        })
    }

    /// Allocate `size` bytes at the current cursor.
    ///
    /// Byte granularity only: no alignment guarantee beyond the storage
    /// base. The returned bytes are NOT zeroed and may hold residue from
    /// allocations made before a [`reset`](LinearArena::reset); use
    /// [`calloc_array`](LinearArena::calloc_array) when zeroing matters.
    ///
    /// # Errors
    ///
    /// [`ArenaError::Exhausted`] if fewer than `size` bytes remain. The
    /// cursor is unchanged on that path.
    pub fn alloc(&mut self, size: usize) -> Result<BlockHandle, ArenaError> {
        let offset = self.bump(size, 1)?;
        Ok(BlockHandle::new(self.generation, offset, size))
    }

    /// Allocate an array of `count` elements of `T`, aligned for `T`.
    ///
    /// The cursor is first rounded up to `align_of::<T>()`; the padding
    /// counts as used bytes. Contents are not zeroed.
    ///
    /// # Errors
    ///
    /// [`ArenaError::SizeOverflow`] if `count * size_of::<T>()` overflows,
    /// [`ArenaError::Exhausted`] if the arena cannot fit the array.
    pub fn alloc_array<T: Pod>(&mut self, count: usize) -> Result<SliceHandle<T>, ArenaError> {
        let bytes = array_bytes::<T>(count)?;
        let offset = self.bump(bytes, mem::align_of::<T>())?;
        Ok(SliceHandle::new(self.generation, offset, count))
    }

    /// Allocate a zero-initialised array of `count` elements of `T`.
    ///
    /// Identical to [`alloc_array`](LinearArena::alloc_array) except the
    /// returned bytes are guaranteed zero. On failure no memory is
    /// touched and the cursor is unchanged.
    ///
    /// # Errors
    ///
    /// As [`alloc_array`](LinearArena::alloc_array).
    pub fn calloc_array<T: Pod>(&mut self, count: usize) -> Result<SliceHandle<T>, ArenaError> {
        let bytes = array_bytes::<T>(count)?;
        let offset = self.bump(bytes, mem::align_of::<T>())?;
        self.storage.as_mut_slice()[offset..offset + bytes].fill(0);
        Ok(SliceHandle::new(self.generation, offset, count))
    }

    /// Allocate space for one `T` and initialise it to `value`.
    ///
    /// # Errors
    ///
    /// [`ArenaError::Exhausted`] if the arena cannot fit the value.
    pub fn store<T: Pod>(&mut self, value: T) -> Result<ValueHandle<T>, ArenaError> {
        let size = array_bytes::<T>(1)?;
        let offset = self.bump(size, mem::align_of::<T>())?;
        self.storage.as_mut_slice()[offset..offset + mem::size_of::<T>()]
            .copy_from_slice(bytemuck::bytes_of(&value));
        Ok(ValueHandle::new(self.generation, offset))
    }

    /// Resolve a byte allocation.
    ///
    /// # Errors
    ///
    /// [`ArenaError::StaleHandle`] if the arena has been reset since the
    /// handle was issued.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by a different arena whose
    /// geometry exceeds this one's capacity.
    pub fn bytes(&self, handle: BlockHandle) -> Result<&[u8], ArenaError> {
        self.check_generation(handle.generation)?;
        Ok(&self.storage.as_slice()[handle.offset..handle.offset + handle.len])
    }

    /// Resolve a byte allocation mutably.
    ///
    /// # Errors
    ///
    /// [`ArenaError::StaleHandle`] as for [`bytes`](LinearArena::bytes).
    pub fn bytes_mut(&mut self, handle: BlockHandle) -> Result<&mut [u8], ArenaError> {
        self.check_generation(handle.generation)?;
        Ok(&mut self.storage.as_mut_slice()[handle.offset..handle.offset + handle.len])
    }

    /// Resolve a typed array allocation.
    ///
    /// # Errors
    ///
    /// [`ArenaError::StaleHandle`] if the arena has been reset since the
    /// handle was issued.
    pub fn slice<T: Pod>(&self, handle: SliceHandle<T>) -> Result<&[T], ArenaError> {
        self.check_generation(handle.generation)?;
        let bytes = handle.len * mem::size_of::<T>();
        Ok(bytemuck::cast_slice(
            &self.storage.as_slice()[handle.offset..handle.offset + bytes],
        ))
    }

    /// Resolve a typed array allocation mutably.
    ///
    /// # Errors
    ///
    /// [`ArenaError::StaleHandle`] as for [`slice`](LinearArena::slice).
    pub fn slice_mut<T: Pod>(&mut self, handle: SliceHandle<T>) -> Result<&mut [T], ArenaError> {
        self.check_generation(handle.generation)?;
        let bytes = handle.len * mem::size_of::<T>();
        Ok(bytemuck::cast_slice_mut(
            &mut self.storage.as_mut_slice()[handle.offset..handle.offset + bytes],
        ))
    }

    /// Resolve a single-value allocation.
    ///
    /// # Errors
    ///
    /// [`ArenaError::StaleHandle`] if the arena has been reset since the
    /// handle was issued.
    pub fn get<T: Pod>(&self, handle: ValueHandle<T>) -> Result<&T, ArenaError> {
        self.check_generation(handle.generation)?;
        let bytes = mem::size_of::<T>();
        Ok(bytemuck::from_bytes(
            &self.storage.as_slice()[handle.offset..handle.offset + bytes],
        ))
    }

    /// Resolve a single-value allocation mutably.
    ///
    /// # Errors
    ///
    /// [`ArenaError::StaleHandle`] as for [`get`](LinearArena::get).
    pub fn get_mut<T: Pod>(&mut self, handle: ValueHandle<T>) -> Result<&mut T, ArenaError> {
        self.check_generation(handle.generation)?;
        let bytes = mem::size_of::<T>();
        Ok(bytemuck::from_bytes_mut(
            &mut self.storage.as_mut_slice()[handle.offset..handle.offset + bytes],
        ))
    }

    /// Reset the arena, making its whole capacity available again.
    ///
    /// Sets the cursor back to zero and bumps the generation, so every
    /// outstanding handle becomes stale (and is reported as such on its
    /// next use). Storage contents are NOT zeroed — the next
    /// [`alloc`](LinearArena::alloc) over the same bytes sees the residue.
    /// Infallible.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.generation += 1;
    }

    /// Total capacity in bytes, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Bytes allocated since the last reset, including alignment padding.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// The current generation. Starts at 0 and increments on every
    /// [`reset`](LinearArena::reset).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Memory usage of the backing reservation in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.storage.len()
    }

    /// Advance the cursor past `size` bytes at alignment `align`.
    ///
    /// Returns the aligned start offset. The cursor only moves on
    /// success; every failure path leaves the arena untouched.
    fn bump(&mut self, size: usize, align: usize) -> Result<usize, ArenaError> {
        debug_assert!(align.is_power_of_two() && align <= MAX_ALIGN);
        let exhausted = ArenaError::Exhausted {
            requested: size,
            remaining: self.remaining(),
        };
        let start = self
            .cursor
            .checked_next_multiple_of(align)
            .ok_or(exhausted)?;
        let end = start.checked_add(size).ok_or(exhausted)?;
        if end > self.capacity() {
            return Err(exhausted);
        }
        self.cursor = end;
        Ok(start)
    }

    fn check_generation(&self, handle_generation: u64) -> Result<(), ArenaError> {
        if handle_generation != self.generation {
            return Err(ArenaError::StaleHandle {
                handle_generation,
                arena_generation: self.generation,
            });
        }
        Ok(())
    }
}

/// Byte size of a `count`-element array of `T`, with overflow checked.
fn array_bytes<T: Pod>(count: usize) -> Result<usize, ArenaError> {
    // Rejected at monomorphisation: the storage base is only MAX_ALIGN
    // aligned, so cursor alignment cannot satisfy anything stricter.
    const {
        assert!(
            mem::align_of::<T>() <= MAX_ALIGN,
            "element alignment exceeds the arena's maximum"
        );
    }
    count
        .checked_mul(mem::size_of::<T>())
        .ok_or(ArenaError::SizeOverflow {
            count,
            elem_size: mem::size_of::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MIN_BLOCK_BYTES;

    #[test]
    fn capacity_matches_the_rounder() {
        let arena = LinearArena::new(100).unwrap();
        assert_eq!(arena.capacity(), optimal_block_size(100));
        assert_eq!(arena.capacity(), 128);
    }

    #[test]
    fn zero_request_is_legal() {
        let arena = LinearArena::new(0).unwrap();
        assert_eq!(arena.capacity(), MIN_BLOCK_BYTES);
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn first_allocation_starts_at_offset_zero() {
        let mut arena = LinearArena::new(100).unwrap();
        let h = arena.alloc(100).unwrap();
        assert_eq!(h.offset, 0);
        assert_eq!(h.len(), 100);
        assert_eq!(arena.used(), 100);
        // The first block spans the front of the buffer.
        let base = arena.capacity();
        let bytes = arena.bytes(h).unwrap();
        assert_eq!(bytes.len(), 100);
        assert_eq!(arena.remaining(), base - 100);
    }

    #[test]
    fn exhausting_exact_capacity_then_one_more_byte_fails() {
        let mut arena = LinearArena::new(100).unwrap();
        let cap = arena.capacity();
        arena.alloc(cap).unwrap();
        assert_eq!(arena.remaining(), 0);
        let err = arena.alloc(1).unwrap_err();
        assert_eq!(
            err,
            ArenaError::Exhausted {
                requested: 1,
                remaining: 0
            }
        );
        // Failure leaves the cursor where it was.
        assert_eq!(arena.used(), cap);
    }

    #[test]
    fn failed_allocation_does_not_move_the_cursor() {
        let mut arena = LinearArena::new(64).unwrap();
        let cap = arena.capacity();
        arena.alloc(cap - 14).unwrap();
        assert!(arena.alloc(100).is_err());
        assert_eq!(arena.used(), cap - 14);
        // A fitting request still succeeds afterwards.
        arena.alloc(14).unwrap();
        assert_eq!(arena.remaining(), 0);
    }

    #[test]
    fn sequential_allocations_partition_a_prefix() {
        let mut arena = LinearArena::new(256).unwrap();
        let sizes = [13usize, 1, 0, 40, 7];
        let mut expected_offset = 0;
        for &size in &sizes {
            let h = arena.alloc(size).unwrap();
            assert_eq!(h.offset, expected_offset);
            expected_offset += size;
        }
        assert_eq!(arena.used(), sizes.iter().sum::<usize>());
    }

    #[test]
    fn reset_reclaims_a_fully_exhausted_arena() {
        let mut arena = LinearArena::new(64).unwrap();
        let cap = arena.capacity();
        arena.alloc(cap).unwrap();
        assert!(arena.alloc(1).is_err());

        arena.reset();
        assert_eq!(arena.used(), 0);
        let h = arena.alloc(cap).unwrap();
        assert_eq!(h.offset, 0);
        assert_eq!(h.len(), cap);
    }

    #[test]
    fn reset_makes_outstanding_handles_stale() {
        let mut arena = LinearArena::new(64).unwrap();
        let h = arena.alloc(8).unwrap();
        assert!(arena.bytes(h).is_ok());

        arena.reset();
        let err = arena.bytes(h).unwrap_err();
        assert_eq!(
            err,
            ArenaError::StaleHandle {
                handle_generation: 0,
                arena_generation: 1
            }
        );
        assert_eq!(arena.generation(), 1);
    }

    #[test]
    fn alloc_does_not_zero_residue_after_reset() {
        let mut arena = LinearArena::new(64).unwrap();
        let h = arena.alloc(16).unwrap();
        arena.bytes_mut(h).unwrap().fill(0xAB);

        arena.reset();
        let h2 = arena.alloc(16).unwrap();
        // Same bytes, still carrying the previous generation's writes.
        assert!(arena.bytes(h2).unwrap().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn calloc_zeroes_residue_after_reset() {
        let mut arena = LinearArena::new(64).unwrap();
        let h = arena.alloc(32).unwrap();
        arena.bytes_mut(h).unwrap().fill(0xFF);

        arena.reset();
        let h2 = arena.calloc_array::<u32>(8).unwrap();
        assert!(arena.slice(h2).unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn calloc_zeroes_for_various_element_sizes() {
        let mut arena = LinearArena::new(4096).unwrap();
        let taint = arena.alloc(1024).unwrap();
        arena.bytes_mut(taint).unwrap().fill(0x5A);
        arena.reset();

        let bytes = arena.calloc_array::<u8>(100).unwrap();
        assert!(arena.slice(bytes).unwrap().iter().all(|&v| v == 0));
        let words = arena.calloc_array::<u16>(50).unwrap();
        assert!(arena.slice(words).unwrap().iter().all(|&v| v == 0));
        let doubles = arena.calloc_array::<f64>(20).unwrap();
        assert!(arena.slice(doubles).unwrap().iter().all(|&v| v == 0.0));
        let empty = arena.calloc_array::<u64>(0).unwrap();
        assert!(arena.slice(empty).unwrap().is_empty());
    }

    #[test]
    fn calloc_failure_touches_nothing() {
        let mut arena = LinearArena::new(64).unwrap();
        let h = arena.alloc(64).unwrap();
        arena.bytes_mut(h).unwrap().fill(0xEE);

        assert!(arena.calloc_array::<u8>(1).is_err());
        assert_eq!(arena.used(), 64);
        assert!(arena.bytes(h).unwrap().iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn typed_allocations_are_aligned() {
        let mut arena = LinearArena::new(256).unwrap();
        arena.alloc(1).unwrap();
        let h = arena.alloc_array::<u64>(4).unwrap();
        assert_eq!(h.offset % mem::align_of::<u64>(), 0);
        // Resolving would panic inside bytemuck if alignment were wrong.
        let slice = arena.slice_mut(h).unwrap();
        slice[3] = u64::MAX;
        assert_eq!(arena.slice(h).unwrap()[3], u64::MAX);
    }

    #[test]
    fn alignment_padding_counts_as_used() {
        let mut arena = LinearArena::new(256).unwrap();
        arena.alloc(3).unwrap();
        arena.alloc_array::<u32>(1).unwrap();
        // 3 bytes, 1 byte of padding, 4 bytes of u32.
        assert_eq!(arena.used(), 8);
    }

    #[test]
    fn array_size_overflow_is_rejected() {
        let mut arena = LinearArena::new(64).unwrap();
        let err = arena.alloc_array::<u64>(usize::MAX / 4).unwrap_err();
        assert_eq!(
            err,
            ArenaError::SizeOverflow {
                count: usize::MAX / 4,
                elem_size: 8
            }
        );
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn store_and_get_round_trip() {
        #[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
        #[repr(C)]
        struct Sample {
            a: u32,
            b: f32,
        }

        let mut arena = LinearArena::new(64).unwrap();
        let h = arena.store(Sample { a: 7, b: 2.5 }).unwrap();
        assert_eq!(*arena.get(h).unwrap(), Sample { a: 7, b: 2.5 });

        arena.get_mut(h).unwrap().a = 9;
        assert_eq!(arena.get(h).unwrap().a, 9);

        arena.reset();
        assert!(arena.get(h).is_err());
    }

    #[test]
    fn generation_survives_many_resets() {
        let mut arena = LinearArena::new(0).unwrap();
        for _ in 0..1000 {
            arena.alloc(1).unwrap();
            arena.reset();
        }
        assert_eq!(arena.generation(), 1000);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn successful_allocs_never_overlap(
                sizes in proptest::collection::vec(0usize..64, 1..32),
            ) {
                // Requesting 100 bytes yields a 128-byte arena, small
                // enough for the size vectors to exhaust it.
                let mut arena = LinearArena::new(100).unwrap();
                let mut next_free = 0usize;
                for &size in &sizes {
                    match arena.alloc(size) {
                        Ok(h) => {
                            // Each block begins exactly where the previous
                            // one ended: a gapless prefix of the buffer.
                            prop_assert_eq!(h.offset, next_free);
                            next_free += size;
                        }
                        Err(_) => {
                            prop_assert!(next_free + size > arena.capacity());
                            prop_assert_eq!(arena.used(), next_free);
                        }
                    }
                }
            }

            #[test]
            fn used_plus_remaining_is_capacity(
                sizes in proptest::collection::vec(0usize..128, 0..16),
            ) {
                let mut arena = LinearArena::new(512).unwrap();
                for &size in &sizes {
                    let _ = arena.alloc(size);
                    prop_assert_eq!(arena.used() + arena.remaining(), arena.capacity());
                }
            }
        }
    }
}
