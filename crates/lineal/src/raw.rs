//! Low-level storage and platform primitives.
//!
//! The only module in the crate that contains `unsafe` code: the owned,
//! aligned backing buffer and the platform page-size query. Every `unsafe`
//! block carries a `// SAFETY:` comment; everything above this module is
//! safe code over `&[u8]` / `&mut [u8]` views.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::slice;

use crate::error::ArenaError;

/// Alignment of every [`RawStorage`] base pointer, in bytes.
///
/// Typed allocations align the cursor to `align_of::<T>()`; that only
/// yields an aligned address if the base itself is at least as aligned,
/// so types with alignment above this constant are rejected at compile
/// time by the typed allocation paths.
pub(crate) const MAX_ALIGN: usize = 16;

/// One contiguous, exclusively-owned reservation from the system allocator.
///
/// Reserved once at construction, released exactly once on drop. The
/// buffer never moves or resizes, which is what keeps issued offsets
/// stable for the lifetime of the arena.
pub(crate) struct RawStorage {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl RawStorage {
    /// Reserve `capacity` zeroed bytes aligned to [`MAX_ALIGN`].
    ///
    /// `capacity` must be a non-zero multiple of [`MAX_ALIGN`], which the
    /// block-size rounder guarantees (every size class is a multiple of 32,
    /// a page multiple, or a 512 KiB multiple).
    pub(crate) fn new(capacity: usize) -> Result<Self, ArenaError> {
        debug_assert!(capacity > 0 && capacity % MAX_ALIGN == 0);
        let layout = Layout::from_size_align(capacity, MAX_ALIGN)
            .map_err(|_| ArenaError::OutOfMemory {
                requested: capacity,
            })?;
        // SAFETY: `layout` has non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(ArenaError::OutOfMemory {
            requested: capacity,
        })?;
        Ok(Self { ptr, layout })
    }

    /// Size of the reservation in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    /// The whole reservation as a shared byte slice.
    pub(crate) fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` points to `layout.size()` initialised bytes
        // (zeroed at reservation, written only through `as_mut_slice`),
        // owned by `self` and live for the borrow of `&self`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// The whole reservation as an exclusive byte slice.
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as `as_slice`, plus `&mut self` guarantees no other
        // reference into the buffer exists for the borrow's duration.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for RawStorage {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc_zeroed` with exactly this
        // layout, and `RawStorage` is neither `Clone` nor `Copy`, so the
        // reservation is released exactly once.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

// SAFETY: the buffer is exclusively owned; no aliasing pointers escape
// the `&self` / `&mut self` borrows above, so moving the owner between
// threads is sound.
unsafe impl Send for RawStorage {}

// SAFETY: shared access only exposes `&[u8]` reads.
unsafe impl Sync for RawStorage {}

/// Query the platform memory-page size.
///
/// # Panics
///
/// Panics if the platform reports a non-positive page size. A machine
/// that cannot report its own page size is misconfigured beyond what
/// this crate can recover from.
#[cfg(unix)]
pub(crate) fn query_page_size() -> usize {
    // SAFETY: `sysconf` is thread-safe and has no preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) };
    assert!(raw > 0, "platform reported page size {raw}");
    raw as usize
}

/// Fallback for targets without `sysconf`: the common 4 KiB page.
#[cfg(not(unix))]
pub(crate) fn query_page_size() -> usize {
    4096
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_is_zeroed() {
        let storage = RawStorage::new(64).unwrap();
        assert_eq!(storage.len(), 64);
        assert!(storage.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn base_pointer_is_max_aligned() {
        let storage = RawStorage::new(32).unwrap();
        assert_eq!(storage.as_slice().as_ptr() as usize % MAX_ALIGN, 0);
    }

    #[test]
    fn writes_persist() {
        let mut storage = RawStorage::new(32).unwrap();
        storage.as_mut_slice()[7] = 0xAB;
        assert_eq!(storage.as_slice()[7], 0xAB);
    }

    #[test]
    fn page_size_is_a_positive_power_of_two() {
        let page = query_page_size();
        assert!(page.is_power_of_two());
    }
}
