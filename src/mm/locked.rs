//! Kernel-Lifetime Allocator Instance
//!
//! Wraps the allocator in a spinlock so it can live in a `static` and be
//! reached from both early kernel init and the VMM. A single lock guards
//! every operation; push and pop are multi-step updates of the stack top.
//!
//! ```ignore
//! static PMM: LockedPmm<KernelMapper> = LockedPmm::new();
//! ```

use log::warn;
use spin::Mutex;

use super::address::PhysAddr;
use super::error::PmmError;
use super::mapper::PageMapper;
use super::pmm::{PhysicalMemoryManager, PmmConfig, PmmState};

/// A lazily initialized, lock-protected allocator.
pub struct LockedPmm<M> {
    inner: Mutex<Option<PhysicalMemoryManager<M>>>,
}

impl<M> LockedPmm<M> {
    /// Create an uninitialized allocator.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }
}

impl<M: PageMapper> LockedPmm<M> {
    /// Bootstrap the allocator above `start`.
    ///
    /// # Safety
    /// Same contract as [`PhysicalMemoryManager::new`].
    pub unsafe fn init(&self, start: PhysAddr, config: PmmConfig, mapper: M) -> Result<(), PmmError> {
        let mut inner = self.inner.lock();
        if inner.is_some() {
            return Err(PmmError::AlreadyInitialized);
        }
        // SAFETY: forwarded to the caller.
        *inner = Some(unsafe { PhysicalMemoryManager::new(start, config, mapper) });
        Ok(())
    }

    /// Allocate one physical page.
    pub fn allocate_page(&self) -> Result<PhysAddr, PmmError> {
        self.inner.lock().as_mut().ok_or(PmmError::NotInitialized)?.allocate_page()
    }

    /// Return a physical page. Ignored, with a warning, before `init`.
    pub fn free_page(&self, page: PhysAddr) {
        match self.inner.lock().as_mut() {
            Some(pmm) => pmm.free_page(page),
            None => warn!("[PMM] free of {} before init", page),
        }
    }

    /// Switch to the free-page stack. Called once by the VMM.
    pub fn activate_paging(&self) -> Result<(), PmmError> {
        self.inner.lock().as_mut().ok_or(PmmError::NotInitialized)?.activate_paging()
    }

    /// Allocate a page that is freed again when the guard is dropped.
    pub fn allocate_guarded(&self) -> Result<PageGuard<'_, M>, PmmError> {
        self.allocate_page().map(|addr| PageGuard { pmm: self, addr })
    }
}

impl<M> LockedPmm<M> {
    /// Whether the allocator serves pages from the free-page stack.
    pub fn is_paging_active(&self) -> bool {
        self.inner
            .lock()
            .as_ref()
            .is_some_and(PhysicalMemoryManager::is_paging_active)
    }

    /// Snapshot the allocator state, if initialized.
    pub fn state(&self) -> Option<PmmState> {
        self.inner.lock().as_ref().map(PhysicalMemoryManager::state)
    }

    /// Run `f` with exclusive access to the allocator.
    pub fn with<R>(&self, f: impl FnOnce(&mut PhysicalMemoryManager<M>) -> R) -> Result<R, PmmError> {
        self.inner.lock().as_mut().map(f).ok_or(PmmError::NotInitialized)
    }
}

impl<M> Default for LockedPmm<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// A physical page that is handed back to its allocator on drop.
///
/// Useful on error paths that allocate several pages before committing.
pub struct PageGuard<'a, M: PageMapper> {
    pmm: &'a LockedPmm<M>,
    addr: PhysAddr,
}

impl<M: PageMapper> PageGuard<'_, M> {
    /// Get the physical address of this page.
    #[inline]
    pub fn addr(&self) -> PhysAddr {
        self.addr
    }

    /// Keep the page; it will not be freed.
    ///
    /// Use this when transferring ownership to a page table.
    #[inline]
    pub fn into_addr(self) -> PhysAddr {
        let addr = self.addr;
        core::mem::forget(self);
        addr
    }
}

impl<M: PageMapper> Drop for PageGuard<'_, M> {
    fn drop(&mut self) {
        self.pmm.free_page(self.addr);
    }
}
