//! Memory management module for PantherOS
//!
//! Provides:
//! - Physical and virtual address types
//! - The early bump allocator used before paging is up
//! - The self-hosting free-page stack used afterwards
//! - The phase-switching allocator and its locked kernel instance
//!
//! # Principles
//! - Unsafe code is limited to the stack's slot accesses
//! - Freeing never fails; only allocation reports an error
//! - The VMM is reached through the `PageMapper` trait only

mod address;
mod bump;
mod error;
mod flags;
mod locked;
mod mapper;
mod pmm;
mod stack;

#[cfg(test)]
mod testing;

pub use address::{
    PhysAddr, VirtAddr, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE, PMM_STACK_BASE, SLOT_SIZE,
};
pub use bump::BumpAllocator;
pub use error::PmmError;
pub use flags::{MapFlags, MappingError};
pub use locked::{LockedPmm, PageGuard};
pub use mapper::{map_kernel_page, map_kernel_page_with, PageMapper};
pub use pmm::{Phase, PhysicalMemoryManager, PmmConfig, PmmState};
pub use stack::{FreePageStack, PushOutcome};
