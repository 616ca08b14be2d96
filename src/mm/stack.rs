//! Self-Hosting Free-Page Stack
//!
//! A LIFO of free physical page addresses stored at a fixed virtual
//! address. There is no memory set aside for the stack itself: whenever a
//! push finds the mapped backing storage full, the page being freed is
//! mapped at the end of the stack instead of being recorded, and becomes
//! room for the next `PAGE_SIZE / SLOT_SIZE` entries.
//!
//! ```text
//!  base                    top              limit
//!   | addr | addr | addr |  ...free slots...  |  unmapped
//!   '------------- backing pages ------------'
//! ```
//!
//! Backing pages are never handed back out; the stack only grows.

use log::{error, trace};

use super::address::{PhysAddr, VirtAddr, PAGE_SIZE, SLOT_SIZE};
use super::error::PmmError;
use super::flags::MappingError;
use super::mapper::{map_kernel_page, PageMapper};

/// What a push did with the page it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The page was recorded and can be popped again.
    Stored,
    /// The page was mapped as new backing storage for the stack itself.
    ConsumedAsBacking,
    /// The page lies below the bootstrap boundary and was left alone.
    Reserved,
}

/// Free-page stack state.
#[derive(Debug)]
pub struct FreePageStack {
    /// Fixed virtual address of the first slot.
    base: VirtAddr,
    /// Next slot to write. Equals `base` when empty.
    top: VirtAddr,
    /// End of the mapped backing storage.
    limit: VirtAddr,
    /// Pages below this address were handed out during bootstrap and
    /// may hold page tables; they are never recorded.
    floor: PhysAddr,
}

impl FreePageStack {
    /// Create an empty stack with no backing storage.
    ///
    /// # Safety
    /// `base` must be page aligned, and the virtual range starting at
    /// `base` must be reserved for this stack alone: every page the stack
    /// maps there through its mapper must become writable memory that
    /// nothing else aliases.
    pub const unsafe fn new(base: VirtAddr, floor: PhysAddr) -> Self {
        Self {
            base,
            top: base,
            limit: base,
            floor,
        }
    }

    /// Record a free page, or grow the stack with it.
    ///
    /// On a mapping error nothing changes and the page is not recorded.
    pub fn push<M: PageMapper + ?Sized>(
        &mut self,
        page: PhysAddr,
        mapper: &mut M,
    ) -> Result<PushOutcome, MappingError> {
        if page < self.floor {
            trace!("[PMM] {} is below the bootstrap floor, not recorded", page);
            return Ok(PushOutcome::Reserved);
        }

        if self.limit <= self.top {
            if let Err(err) = map_kernel_page(mapper, self.limit, page) {
                error!("[PMM] cannot map {} at {} to grow the free stack: {}", page, self.limit, err);
                return Err(err);
            }
            trace!("[PMM] free stack grown to {} using {}", self.limit.add(PAGE_SIZE), page);
            self.limit = self.limit.add(PAGE_SIZE);
            return Ok(PushOutcome::ConsumedAsBacking);
        }

        // SAFETY: `top < limit` and every page in `[base, limit)` was mapped
        // writable by the growth branch above. `top` stays slot aligned
        // since `base` is page aligned and moves in `SLOT_SIZE` steps.
        unsafe {
            self.top.as_mut_ptr::<usize>().write(page.as_usize());
        }
        self.top = self.top.add(SLOT_SIZE);
        trace!("[PMM] push {} ({} free)", page, self.len());
        Ok(PushOutcome::Stored)
    }

    /// Take the most recently recorded page.
    ///
    /// Returns `OutOfMemory` without touching any state if the stack is empty.
    pub fn pop(&mut self) -> Result<PhysAddr, PmmError> {
        if self.top == self.base {
            return Err(PmmError::OutOfMemory);
        }

        self.top = self.top.sub(SLOT_SIZE);
        // SAFETY: the slot lies in `[base, top_before)`, which is mapped
        // and was written by a previous push.
        let page = unsafe { self.top.as_mut_ptr::<usize>().read() };
        let page = PhysAddr::new(page);
        trace!("[PMM] pop {} ({} free)", page, self.len());
        Ok(page)
    }

    /// Number of pages that can be popped.
    #[inline]
    pub const fn len(&self) -> usize {
        self.top.offset_from(self.base) / SLOT_SIZE
    }

    /// Whether a pop would fail.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top == self.base
    }

    /// Number of pages consumed as backing storage.
    #[inline]
    pub const fn backing_pages(&self) -> usize {
        self.limit.offset_from(self.base) / PAGE_SIZE
    }

    /// Number of entries the current backing storage can hold.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.limit.offset_from(self.base) / SLOT_SIZE
    }

    /// Virtual address of the first slot.
    #[inline]
    pub const fn base(&self) -> VirtAddr {
        self.base
    }

    /// Virtual address of the next slot to write.
    #[inline]
    pub const fn top(&self) -> VirtAddr {
        self.top
    }

    /// End of the mapped backing storage.
    #[inline]
    pub const fn limit(&self) -> VirtAddr {
        self.limit
    }

    /// Lowest physical address the stack will record.
    #[inline]
    pub const fn floor(&self) -> PhysAddr {
        self.floor
    }
}
