//! Mapping Protection Flags
//!
//! The protection bits the allocator passes along when it asks the VMM
//! to map a page. The encoding matches the low bits of a 32-bit x86 page
//! table entry; the VMM translates them for whatever hardware it drives.

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Protection requested for a single page mapping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapFlags: u32 {
        /// The mapping is valid.
        const PRESENT = 1 << 0;
        /// The page may be written.
        const WRITABLE = 1 << 1;
        /// The page is reachable from user mode.
        const USER = 1 << 2;

        /// Kernel data: present, writable, supervisor only.
        const KERNEL_RW = Self::PRESENT.bits() | Self::WRITABLE.bits();
    }
}

impl MapFlags {
    /// Whether these flags keep the page out of user mode's reach.
    #[inline]
    pub const fn is_kernel_only(self) -> bool {
        !self.contains(Self::USER)
    }
}

/// Error type for page mapping operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The virtual address is already mapped.
    #[error("virtual address already mapped")]
    AlreadyMapped,
    /// No physical frames available for page tables.
    #[error("out of memory for page tables")]
    OutOfMemory,
    /// The address is not properly aligned.
    #[error("address not properly aligned")]
    MisalignedAddress,
    /// Attempted to map a kernel-only region with user flags.
    #[error("invalid permission combination")]
    InvalidPermissions,
}
