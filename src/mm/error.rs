//! Allocator error type.

use thiserror::Error;

/// Errors surfaced by the physical page allocator.
///
/// Only `OutOfMemory` comes from the allocation path itself; the others
/// report misuse of the kernel-lifetime singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PmmError {
    /// The free-page stack is empty.
    #[error("out of physical memory")]
    OutOfMemory,
    /// The paging transition was requested a second time.
    #[error("paging is already active")]
    AlreadyActive,
    /// `init` was called on an allocator that is already running.
    #[error("physical memory manager already initialized")]
    AlreadyInitialized,
    /// The allocator was used before `init`.
    #[error("physical memory manager not initialized")]
    NotInitialized,
}
