//! PantherOS Physical Page Allocator
//!
//! Tracks which 4 KiB physical pages are in use and hands single pages
//! out to the rest of the kernel, most importantly to the virtual memory
//! manager (VMM), which needs pages before it can map anything itself.
//!
//! # Two phases
//! - **Bootstrap**: a bump allocator walks upwards from the end of the
//!   kernel image. Nothing allocated here can ever be freed.
//! - **Active**: once the VMM has flipped the allocator into active mode,
//!   freed pages are kept on a LIFO stack living at a fixed high virtual
//!   address. The stack grows by mapping the page being freed as its own
//!   backing storage, so no memory is set aside for it up front.
//!
//! # Usage
//! ```ignore
//! static PMM: LockedPmm<KernelMapper> = LockedPmm::new();
//!
//! // SAFETY: PMM_STACK_BASE is reserved for the free-page stack.
//! unsafe { PMM.init(kernel_end, PmmConfig::default(), KernelMapper::new())? };
//! let table = PMM.allocate_page()?;
//! // ... VMM sets up its tables, then:
//! PMM.activate_paging()?;
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod mm;

pub use mm::{
    LockedPmm, MapFlags, MappingError, PageGuard, PageMapper, PhysAddr, PhysicalMemoryManager,
    PmmConfig, PmmError, PmmState, VirtAddr, PAGE_SIZE,
};
