//! Shared fixtures for the lineal benchmarks.
//!
//! Sized after the upstream reference workload: one million 40-byte
//! allocations per measurement pass, arena capacity chosen so a full
//! pass fits without a reset.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use lineal::LinearArena;

/// Bytes per allocation in the reference workload.
pub const BLOCK_SIZE: usize = 40;

/// Allocations per measurement pass.
pub const PASS_ALLOCS: usize = 1_000_000;

/// Build an arena large enough for one full benchmark pass.
pub fn pass_arena() -> LinearArena {
    LinearArena::new(PASS_ALLOCS * BLOCK_SIZE).expect("benchmark arena reservation failed")
}
