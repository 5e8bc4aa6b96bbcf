//! Block-size rounding toward allocator-friendly capacities.
//!
//! The arena makes exactly one reservation from the system allocator, so
//! the only waste worth fighting is at that boundary: a request of 4097
//! bytes backed by a 4097-byte reservation still costs the allocator two
//! pages. [`optimal_block_size`] rounds a requested byte count up to the
//! granularity a size-class allocator would use anyway:
//!
//! - small requests land on the power-of-two classes 32..=4096,
//! - mid-range requests round up to a whole number of memory pages,
//! - requests of 1 MiB and above round up in 512 KiB steps.

use std::sync::OnceLock;

use crate::raw;

/// Smallest capacity ever returned, in bytes (`2^5`).
///
/// A requested size of zero still reserves this much.
pub const MIN_BLOCK_BYTES: usize = 1 << 5;

/// Requests at or above this many bytes (1 MiB) round in
/// [`LARGE_STEP_BYTES`] increments instead of page multiples.
pub const LARGE_THRESHOLD_BYTES: usize = 1 << 20;

/// Step size of the large-request classes: 512 KiB.
pub const LARGE_STEP_BYTES: usize = 512 * 1024;

/// Round `requested` up to the nearest allocator-friendly block size.
///
/// The returned capacity is always `>= requested`, `>= MIN_BLOCK_BYTES`,
/// and a multiple of 16 (every class is a multiple of 32, a page multiple,
/// or a 512 KiB multiple), which the arena's storage layout relies on.
///
/// Class selection, in order:
///
/// 1. The smallest power of two in 32..=4096 that is strictly greater
///    than `requested`. Requests of 4096 bytes and up fall through.
/// 2. For `requested >= 1 MiB`: 1 MiB plus however many whole 512 KiB
///    steps cover the remainder. Exactly 1 MiB rounds to itself.
/// 3. Otherwise: the next multiple of the platform page size.
pub fn optimal_block_size(requested: usize) -> usize {
    // Small requests use malloc-style power-of-two classes, 2^5..=2^12.
    for exp in 5..13 {
        let class = 1usize << exp;
        if requested < class {
            return class;
        }
    }
    if requested >= LARGE_THRESHOLD_BYTES {
        let over = requested - LARGE_THRESHOLD_BYTES;
        return LARGE_THRESHOLD_BYTES + over.div_ceil(LARGE_STEP_BYTES) * LARGE_STEP_BYTES;
    }
    let page = page_size();
    requested.div_ceil(page) * page
}

/// The platform memory-page size, queried once and cached process-wide.
pub fn page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(raw::query_page_size)
}
