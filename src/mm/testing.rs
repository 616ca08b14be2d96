//! Host-side fixtures for allocator tests.
//!
//! The free-page stack writes through the virtual addresses it maps, so
//! tests point `stack_base` at a page-aligned heap region and use a mapper
//! that only records requests. Physical addresses are never touched.

use std::alloc::{alloc_zeroed, dealloc, Layout};

use super::address::{PhysAddr, VirtAddr, PAGE_SIZE};
use super::flags::{MapFlags, MappingError};
use super::mapper::PageMapper;

/// Page-aligned host memory standing in for the stack's virtual window.
pub struct StackRegion {
    ptr: *mut u8,
    layout: Layout,
}

impl StackRegion {
    pub fn new(pages: usize) -> Self {
        let layout = Layout::from_size_align(pages * PAGE_SIZE, PAGE_SIZE).unwrap();
        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        assert!(!ptr.is_null());
        Self { ptr, layout }
    }

    pub fn base(&self) -> VirtAddr {
        VirtAddr::new(self.ptr as usize)
    }

    pub fn end(&self) -> VirtAddr {
        self.base().add(self.layout.size())
    }
}

impl Drop for StackRegion {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with the same layout.
        unsafe { dealloc(self.ptr, self.layout) }
    }
}

/// Records every map request; refuses anything outside its window.
#[derive(Debug, Default)]
pub struct RecordingMapper {
    pub calls: Vec<(VirtAddr, PhysAddr, MapFlags)>,
    window: Option<(VirtAddr, VirtAddr)>,
}

impl RecordingMapper {
    pub fn within(region: &StackRegion) -> Self {
        Self {
            calls: Vec::new(),
            window: Some((region.base(), region.end())),
        }
    }

    pub fn mapped_phys(&self) -> Vec<PhysAddr> {
        self.calls.iter().map(|&(_, phys, _)| phys).collect()
    }
}

impl PageMapper for RecordingMapper {
    fn map_page(
        &mut self,
        virt: VirtAddr,
        phys: PhysAddr,
        flags: MapFlags,
    ) -> Result<(), MappingError> {
        if let Some((start, end)) = self.window {
            assert!(
                virt >= start && virt < end,
                "stack grew past the host test region: {virt:?}"
            );
        }
        self.calls.push((virt, phys, flags));
        Ok(())
    }
}

/// A VMM that cannot map anything.
#[derive(Debug, Default)]
pub struct FailingMapper {
    pub attempts: usize,
}

impl PageMapper for FailingMapper {
    fn map_page(
        &mut self,
        _virt: VirtAddr,
        _phys: PhysAddr,
        _flags: MapFlags,
    ) -> Result<(), MappingError> {
        self.attempts += 1;
        Err(MappingError::OutOfMemory)
    }
}
