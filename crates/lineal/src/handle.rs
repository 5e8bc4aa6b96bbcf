//! Generation-tagged allocation handles.
//!
//! The arena never hands out references that outlive the call that made
//! them; allocations are identified by handles carrying the arena
//! generation at issue time. [`reset`](crate::LinearArena::reset) bumps
//! the generation, so every access through an old handle is an O(1)
//! staleness check away from a reported error instead of a silent read
//! of reused memory.

use std::fmt;
use std::marker::PhantomData;

/// An untyped byte allocation: `len` bytes at `offset` within the arena.
///
/// Resolved through [`bytes`](crate::LinearArena::bytes) /
/// [`bytes_mut`](crate::LinearArena::bytes_mut) on the arena that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct BlockHandle {
    /// Arena generation when this allocation was made.
    pub(crate) generation: u64,
    /// Byte offset within the arena's storage.
    pub(crate) offset: usize,
    /// Length of the allocation in bytes.
    pub(crate) len: usize,
}

impl BlockHandle {
    pub(crate) fn new(generation: u64, offset: usize, len: usize) -> Self {
        Self {
            generation,
            offset,
            len,
        }
    }

    /// The generation this handle belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Length of the allocation in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlockHandle(gen={}, off={}, len={})",
            self.generation, self.offset, self.len
        )
    }
}

/// A typed array allocation: `len` elements of `T`, aligned for `T`.
///
/// Resolved through [`slice`](crate::LinearArena::slice) /
/// [`slice_mut`](crate::LinearArena::slice_mut).
#[must_use]
pub struct SliceHandle<T> {
    pub(crate) generation: u64,
    /// Byte offset of the first element; a multiple of `align_of::<T>()`.
    pub(crate) offset: usize,
    /// Length in elements, not bytes.
    pub(crate) len: usize,
    pub(crate) _marker: PhantomData<fn() -> T>,
}

impl<T> SliceHandle<T> {
    pub(crate) fn new(generation: u64, offset: usize, len: usize) -> Self {
        Self {
            generation,
            offset,
            len,
            _marker: PhantomData,
        }
    }

    /// The generation this handle belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Length of the allocation in elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// Manual impls: handles are plain coordinates and should be Copy for any
// `T`, without a derive-imposed `T: Copy` bound.
impl<T> Clone for SliceHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SliceHandle<T> {}

impl<T> PartialEq for SliceHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
            && self.offset == other.offset
            && self.len == other.len
    }
}

impl<T> Eq for SliceHandle<T> {}

impl<T> fmt::Debug for SliceHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceHandle")
            .field("generation", &self.generation)
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

/// A single-value allocation of `T`, aligned for `T`.
///
/// Resolved through [`get`](crate::LinearArena::get) /
/// [`get_mut`](crate::LinearArena::get_mut).
#[must_use]
pub struct ValueHandle<T> {
    pub(crate) generation: u64,
    pub(crate) offset: usize,
    pub(crate) _marker: PhantomData<fn() -> T>,
}

impl<T> ValueHandle<T> {
    pub(crate) fn new(generation: u64, offset: usize) -> Self {
        Self {
            generation,
            offset,
            _marker: PhantomData,
        }
    }

    /// The generation this handle belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> Clone for ValueHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ValueHandle<T> {}

impl<T> PartialEq for ValueHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation && self.offset == other.offset
    }
}

impl<T> Eq for ValueHandle<T> {}

impl<T> fmt::Debug for ValueHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueHandle")
            .field("generation", &self.generation)
            .field("offset", &self.offset)
            .finish()
    }
}
