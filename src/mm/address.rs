//! Physical and Virtual Address Types
//!
//! Type-safe wrappers that keep physical page addresses (the allocator's
//! currency) apart from the virtual addresses the free-page stack lives at.
//!
//! # Properties
//! - Physical addresses are plain numbers and are never dereferenced
//! - Virtual addresses require an explicit unsafe conversion to pointers

use core::fmt;

/// Page size (4 KiB)
pub const PAGE_SIZE: usize = 4096;
/// Page size mask
pub const PAGE_MASK: usize = PAGE_SIZE - 1;
/// Bits to shift for page number
pub const PAGE_SHIFT: usize = 12;

/// Width of one free-page stack slot: one pointer-sized page address.
pub const SLOT_SIZE: usize = core::mem::size_of::<usize>();

/// Virtual address where the free-page stack begins.
///
/// Sits at the top of the kernel half, well away from the kernel image
/// and the direct map.
#[cfg(target_pointer_width = "64")]
pub const PMM_STACK_BASE: usize = 0xFFFF_FF00_0000_0000;

/// Virtual address where the free-page stack begins.
#[cfg(not(target_pointer_width = "64"))]
pub const PMM_STACK_BASE: usize = 0xFF00_0000;

/// A physical memory address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct PhysAddr(usize);

impl PhysAddr {
    /// Create a new physical address.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Check if the address is page-aligned.
    #[inline]
    pub const fn is_aligned(self) -> bool {
        self.0 & PAGE_MASK == 0
    }

    /// Align the address down to the nearest page boundary.
    #[inline]
    pub const fn align_down(self) -> Self {
        Self(self.0 & !PAGE_MASK)
    }

    /// Align the address up to the nearest page boundary.
    #[inline]
    pub const fn align_up(self) -> Self {
        Self((self.0 + PAGE_MASK) & !PAGE_MASK)
    }

    /// The first page boundary strictly above this address.
    ///
    /// An already aligned address still moves up a full page, so the page
    /// containing `self` is never part of the result.
    #[inline]
    pub const fn next_page_above(self) -> Self {
        Self((self.0 + PAGE_SIZE) & !PAGE_MASK)
    }

    /// Get the page frame number.
    #[inline]
    pub const fn page_frame_number(self) -> usize {
        self.0 >> PAGE_SHIFT
    }

    /// Add an offset to this address.
    #[inline]
    pub const fn add(self, offset: usize) -> Self {
        Self(self.0 + offset)
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#010x})", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A virtual memory address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct VirtAddr(usize);

impl VirtAddr {
    /// Create a new virtual address.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Check if the address is page-aligned.
    #[inline]
    pub const fn is_aligned(self) -> bool {
        self.0 & PAGE_MASK == 0
    }

    /// Add an offset to this address.
    #[inline]
    pub const fn add(self, offset: usize) -> Self {
        Self(self.0 + offset)
    }

    /// Subtract an offset from this address.
    #[inline]
    pub const fn sub(self, offset: usize) -> Self {
        Self(self.0 - offset)
    }

    /// Distance in bytes from `base` up to this address.
    #[inline]
    pub const fn offset_from(self, base: Self) -> usize {
        self.0 - base.0
    }

    /// Convert to a mutable raw pointer.
    ///
    /// # Safety
    /// The caller must ensure the address is valid, properly mapped,
    /// and that mutable access is safe.
    #[inline]
    pub const unsafe fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#010x})", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_alignment() {
        let addr = PhysAddr::new(0x4008_1234);
        assert!(!addr.is_aligned());
        assert_eq!(addr.align_down().as_usize(), 0x4008_1000);
        assert_eq!(addr.align_up().as_usize(), 0x4008_2000);
        assert_eq!(addr.page_frame_number(), 0x40081);
    }

    #[test]
    fn test_next_page_above_skips_containing_page() {
        assert_eq!(PhysAddr::new(0x10_0000).next_page_above(), PhysAddr::new(0x10_1000));
        assert_eq!(PhysAddr::new(0x10_0123).next_page_above(), PhysAddr::new(0x10_1000));
        assert_eq!(PhysAddr::new(0x10_0fff).next_page_above(), PhysAddr::new(0x10_1000));
    }

    #[test]
    fn test_virt_offsets() {
        let base = VirtAddr::new(PMM_STACK_BASE);
        assert!(base.is_aligned());
        let top = base.add(3 * SLOT_SIZE);
        assert_eq!(top.offset_from(base), 3 * SLOT_SIZE);
        assert_eq!(top.sub(SLOT_SIZE), base.add(2 * SLOT_SIZE));
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(format!("{}", PhysAddr::new(0x1000)), "0x00001000");
        assert_eq!(format!("{:?}", VirtAddr::new(0x2000)), "VirtAddr(0x00002000)");
    }
}
