//! Fixed-capacity bump-pointer arena allocation.
//!
//! A [`LinearArena`] owns one contiguous byte reservation, made once at
//! construction, and carves allocations out of it by advancing a cursor.
//! Nothing is ever freed individually; [`LinearArena::reset`] reclaims
//! the whole arena in one step. This trades generality for the fastest
//! possible allocation path: no metadata, no locking, no fragmentation
//! bookkeeping. The intended workloads allocate at a high rate, keep the
//! results briefly, and discard them together.
//!
//! # Architecture
//!
//! ```text
//! LinearArena (bump allocator, generation-checked handles)
//! ├── RawStorage (one aligned reservation, raw.rs — the only unsafe)
//! ├── optimal_block_size (size-class rounding, block.rs)
//! └── {Block,Slice,Value}Handle (generation-tagged coordinates, handle.rs)
//! ```
//!
//! # Handles, not pointers
//!
//! Allocations come back as [`BlockHandle`] / [`SliceHandle`] /
//! [`ValueHandle`] values carrying the arena generation at issue time.
//! Resolving a handle after a reset reports [`ArenaError::StaleHandle`]
//! rather than silently reading reused memory. The check is a single
//! integer compare per access.
//!
//! # Trivially-destructible data only
//!
//! Typed allocations require [`bytemuck::Pod`] elements. `Pod` implies
//! `Copy`, so nothing placed in the arena can have a `Drop` impl —
//! teardown and reset never need to run per-object cleanup, and the
//! compiler rejects types for which skipping cleanup would be wrong.
//!
//! # Example
//!
//! ```
//! use lineal::LinearArena;
//!
//! let mut arena = LinearArena::new(4096)?;
//! let samples = arena.calloc_array::<f32>(256)?;
//! arena.slice_mut(samples)?[0] = 1.5;
//! assert_eq!(arena.slice(samples)?[0], 1.5);
//!
//! arena.reset();
//! assert!(arena.slice(samples).is_err()); // stale after reset
//! # Ok::<(), lineal::ArenaError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod block;
pub mod error;
pub mod handle;
mod raw;

// Public re-exports for the primary API surface.
pub use arena::LinearArena;
pub use block::{optimal_block_size, page_size};
pub use error::ArenaError;
pub use handle::{BlockHandle, SliceHandle, ValueHandle};
