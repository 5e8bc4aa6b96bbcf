//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The system allocator could not supply the rounded capacity at
    /// construction time. Propagated to the caller, who may retry with
    /// a smaller size.
    OutOfMemory {
        /// Capacity that could not be reserved, in bytes.
        requested: usize,
    },
    /// An allocation would exceed the arena's remaining capacity.
    ///
    /// Recoverable: the arena is unchanged, and the caller decides how
    /// to react (create a fresh arena, fail the request, ...).
    Exhausted {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes still available in the arena.
        remaining: usize,
    },
    /// `count * size_of::<T>()` overflowed `usize` in a typed allocation.
    SizeOverflow {
        /// Element count requested.
        count: usize,
        /// Size of a single element in bytes.
        elem_size: usize,
    },
    /// A handle from before the most recent [`reset`](crate::LinearArena::reset).
    ///
    /// Handles are generation-scoped: `reset` bumps the arena generation,
    /// so any access through an older handle is reported here instead of
    /// silently reading reused memory.
    StaleHandle {
        /// The generation encoded in the handle.
        handle_generation: u64,
        /// The arena's current generation.
        arena_generation: u64,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "failed to reserve {requested} bytes of arena storage")
            }
            Self::Exhausted {
                requested,
                remaining,
            } => {
                write!(
                    f,
                    "arena exhausted: requested {requested} bytes, {remaining} bytes remaining"
                )
            }
            Self::SizeOverflow { count, elem_size } => {
                write!(
                    f,
                    "allocation size overflow: {count} elements of {elem_size} bytes"
                )
            }
            Self::StaleHandle {
                handle_generation,
                arena_generation,
            } => {
                write!(
                    f,
                    "stale handle: generation {handle_generation}, arena is at {arena_generation}"
                )
            }
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_byte_counts() {
        let err = ArenaError::Exhausted {
            requested: 64,
            remaining: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("64"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn stale_handle_reports_both_generations() {
        let err = ArenaError::StaleHandle {
            handle_generation: 3,
            arena_generation: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("generation 3"));
        assert!(msg.contains("at 5"));
    }
}
