//! Early Bump Allocator
//!
//! Hands out physical pages before virtual memory is up by advancing a
//! single cursor. It cannot free: everything allocated here is considered
//! reserved for the lifetime of the kernel (page tables, the stack's own
//! first mappings, early kernel structures).

use log::trace;

use super::address::{PhysAddr, PAGE_SIZE};

/// Bump allocator over the physical memory above the kernel image.
#[derive(Debug, Clone)]
pub struct BumpAllocator {
    /// First page this allocator handed (or will hand) out.
    start: PhysAddr,
    /// Next page to hand out. Page aligned, never decreases.
    cursor: PhysAddr,
}

impl BumpAllocator {
    /// Create a bump allocator starting at the first page boundary above `start`.
    ///
    /// `start` is usually the end of the kernel image, so the page it falls
    /// into is skipped even when `start` itself is aligned.
    pub const fn new(start: PhysAddr) -> Self {
        let first = start.next_page_above();
        Self {
            start: first,
            cursor: first,
        }
    }

    /// Allocate the next page.
    ///
    /// There is no capacity check: running past the end of RAM is not
    /// detectable here and is accepted for the short bootstrap window.
    pub fn alloc(&mut self) -> PhysAddr {
        let page = self.cursor;
        self.cursor = self.cursor.add(PAGE_SIZE);
        trace!("[PMM] bump alloc {}", page);
        page
    }

    /// Freeing is not possible in this phase; the page stays reserved.
    #[inline]
    pub fn free(&mut self, page: PhysAddr) {
        trace!("[PMM] bump free of {} ignored", page);
    }

    /// The next page `alloc` would return.
    #[inline]
    pub const fn cursor(&self) -> PhysAddr {
        self.cursor
    }

    /// The first page this allocator manages.
    #[inline]
    pub const fn start(&self) -> PhysAddr {
        self.start
    }

    /// Number of pages handed out so far.
    #[inline]
    pub const fn pages_allocated(&self) -> usize {
        (self.cursor.as_usize() - self.start.as_usize()) / PAGE_SIZE
    }

    /// Physical range `[start, cursor)` consumed by bootstrap allocations.
    #[inline]
    pub const fn used_range(&self) -> (PhysAddr, PhysAddr) {
        (self.start, self.cursor)
    }
}
