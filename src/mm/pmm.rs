//! Physical Memory Manager
//!
//! Routes page allocation and freeing to the bump allocator or the
//! free-page stack, depending on whether the VMM has finished bootstrapping.
//!
//! # State machine
//! - `Bootstrap` (initial): allocations bump, frees are ignored.
//! - `Active` (terminal): allocations pop, frees push. Entered exactly once
//!   through [`PhysicalMemoryManager::activate_paging`], which the VMM calls
//!   when its own mappings are live. Everything the bump allocator handed
//!   out up to that point stays reserved for good.

use log::{debug, error, warn};

use super::address::{PhysAddr, VirtAddr, PMM_STACK_BASE};
use super::bump::BumpAllocator;
use super::error::PmmError;
use super::mapper::PageMapper;
use super::stack::{FreePageStack, PushOutcome};

/// Allocator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmmConfig {
    /// Virtual address where the free-page stack begins.
    pub stack_base: VirtAddr,
}

impl PmmConfig {
    /// Use a different stack location.
    pub const fn with_stack_base(mut self, stack_base: VirtAddr) -> Self {
        self.stack_base = stack_base;
        self
    }
}

impl Default for PmmConfig {
    fn default() -> Self {
        Self {
            stack_base: VirtAddr::new(PMM_STACK_BASE),
        }
    }
}

/// Lifecycle phase of the allocator.
#[derive(Debug)]
pub enum Phase {
    /// Virtual memory is not up yet.
    Bootstrap,
    /// Virtual memory is up; freed pages go onto the stack.
    Active(FreePageStack),
}

/// Snapshot of the allocator's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmmState {
    /// Next page the bump allocator would hand out.
    pub bump_cursor: PhysAddr,
    /// Whether the VMM has switched the allocator to the stack.
    pub paging_active: bool,
    /// Next free slot of the stack.
    pub stack_top: VirtAddr,
    /// End of the stack's mapped backing storage.
    pub stack_backing_limit: VirtAddr,
    /// Fixed start of the stack.
    pub stack_base: VirtAddr,
}

/// The physical page allocator.
pub struct PhysicalMemoryManager<M> {
    bump: BumpAllocator,
    phase: Phase,
    config: PmmConfig,
    mapper: M,
}

impl<M: PageMapper> PhysicalMemoryManager<M> {
    /// Bootstrap the allocator above `start`, typically the end of the kernel image.
    ///
    /// # Safety
    /// The virtual range starting at `config.stack_base` must be reserved
    /// for the free-page stack: once paging is active, pages mapped there
    /// through `mapper` are written to directly.
    ///
    /// # Panics
    /// Panics if `config.stack_base` is not page aligned.
    pub unsafe fn new(start: PhysAddr, config: PmmConfig, mapper: M) -> Self {
        assert!(
            config.stack_base.is_aligned(),
            "free stack base {} is not page aligned",
            config.stack_base
        );

        let bump = BumpAllocator::new(start);
        debug!(
            "[PMM] bootstrap allocator at {}, free stack at {}",
            bump.cursor(),
            config.stack_base
        );

        Self {
            bump,
            phase: Phase::Bootstrap,
            config,
            mapper,
        }
    }

    /// Allocate one physical page.
    ///
    /// Never fails during bootstrap. Once active, fails with `OutOfMemory`
    /// when no freed page is available; the allocator is unchanged then.
    pub fn allocate_page(&mut self) -> Result<PhysAddr, PmmError> {
        match &mut self.phase {
            Phase::Bootstrap => Ok(self.bump.alloc()),
            Phase::Active(stack) => stack.pop().map_err(|err| {
                error!("[PMM] no free physical pages left");
                err
            }),
        }
    }

    /// Return a physical page to the allocator.
    ///
    /// Never fails: frees during bootstrap and frees of bootstrap pages are
    /// ignored, and a page the VMM cannot map as stack storage is dropped.
    pub fn free_page(&mut self, page: PhysAddr) {
        let _ = self.free_page_outcome(page);
    }

    /// Like [`free_page`](Self::free_page), but reports what happened to the page.
    ///
    /// `None` means the page was not taken: the allocator is still
    /// bootstrapping, or the page could not be mapped as stack storage.
    pub fn free_page_outcome(&mut self, page: PhysAddr) -> Option<PushOutcome> {
        let page = if page.is_aligned() {
            page
        } else {
            warn!("[PMM] freeing unaligned address {}", page);
            page.align_down()
        };

        match &mut self.phase {
            Phase::Bootstrap => {
                self.bump.free(page);
                None
            }
            Phase::Active(stack) => match stack.push(page, &mut self.mapper) {
                Ok(outcome) => Some(outcome),
                Err(_) => {
                    warn!("[PMM] page {} dropped", page);
                    None
                }
            },
        }
    }

    /// Switch to the free-page stack. Called once by the VMM.
    ///
    /// Freezes the bump cursor as the floor below which pages are never
    /// recorded; the mapper must be usable from this point on.
    pub fn activate_paging(&mut self) -> Result<(), PmmError> {
        if let Phase::Active(_) = self.phase {
            warn!("[PMM] paging activated twice");
            return Err(PmmError::AlreadyActive);
        }

        let floor = self.bump.cursor();
        // SAFETY: `stack_base` was checked for alignment in `new`, and the
        // caller of `new` reserved the range for the stack.
        let stack = unsafe { FreePageStack::new(self.config.stack_base, floor) };
        self.phase = Phase::Active(stack);

        debug!(
            "[PMM] paging active, {} bootstrap pages reserved below {}",
            self.bump.pages_allocated(),
            floor
        );
        Ok(())
    }
}

impl<M> PhysicalMemoryManager<M> {
    /// Whether the allocator serves pages from the free-page stack.
    #[inline]
    pub fn is_paging_active(&self) -> bool {
        matches!(self.phase, Phase::Active(_))
    }

    /// Current lifecycle phase.
    #[inline]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The bootstrap allocator.
    #[inline]
    pub fn bump(&self) -> &BumpAllocator {
        &self.bump
    }

    /// Allocator configuration.
    #[inline]
    pub fn config(&self) -> &PmmConfig {
        &self.config
    }

    /// The VMM collaborator.
    #[inline]
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Mutable access to the VMM collaborator.
    #[inline]
    pub fn mapper_mut(&mut self) -> &mut M {
        &mut self.mapper
    }

    /// Snapshot the allocator state.
    pub fn state(&self) -> PmmState {
        let base = self.config.stack_base;
        let (paging_active, stack_top, stack_backing_limit) = match &self.phase {
            Phase::Bootstrap => (false, base, base),
            Phase::Active(stack) => (true, stack.top(), stack.limit()),
        };

        PmmState {
            bump_cursor: self.bump.cursor(),
            paging_active,
            stack_top,
            stack_backing_limit,
            stack_base: base,
        }
    }
}
