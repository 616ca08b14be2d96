//! VMM Mapping Interface
//!
//! The single capability the allocator needs from the virtual memory
//! manager: install one 4 KiB mapping in the kernel address space.
//!
//! # Contract for implementors
//! - The call is synchronous and must not call back into the allocator's
//!   active-mode paths. Any page table it needs has to come from memory
//!   the VMM reserved during bootstrap.
//! - On error the address space must be left untouched.

use super::address::{PhysAddr, VirtAddr};
use super::flags::{MapFlags, MappingError};

/// Establishes virtual-to-physical mappings on behalf of the allocator.
pub trait PageMapper {
    /// Map the page at `virt` to the physical page at `phys`.
    fn map_page(
        &mut self,
        virt: VirtAddr,
        phys: PhysAddr,
        flags: MapFlags,
    ) -> Result<(), MappingError>;
}

impl<M: PageMapper + ?Sized> PageMapper for &mut M {
    #[inline]
    fn map_page(
        &mut self,
        virt: VirtAddr,
        phys: PhysAddr,
        flags: MapFlags,
    ) -> Result<(), MappingError> {
        (**self).map_page(virt, phys, flags)
    }
}

/// Map a single page in the kernel address space, read/write, supervisor only.
///
/// # Returns
/// `Err(MisalignedAddress)` if either address is not page aligned, otherwise
/// whatever the mapper reports.
pub fn map_kernel_page<M: PageMapper + ?Sized>(
    mapper: &mut M,
    virt: VirtAddr,
    phys: PhysAddr,
) -> Result<(), MappingError> {
    map_kernel_page_with(mapper, virt, phys, MapFlags::KERNEL_RW)
}

/// Like [`map_kernel_page`] with explicit flags, which must not allow user access.
pub fn map_kernel_page_with<M: PageMapper + ?Sized>(
    mapper: &mut M,
    virt: VirtAddr,
    phys: PhysAddr,
    flags: MapFlags,
) -> Result<(), MappingError> {
    if !flags.is_kernel_only() {
        return Err(MappingError::InvalidPermissions);
    }

    if !virt.is_aligned() || !phys.is_aligned() {
        return Err(MappingError::MisalignedAddress);
    }

    mapper.map_page(virt, phys, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::testing::RecordingMapper;

    #[test]
    fn test_map_kernel_page_forwards_kernel_rw() {
        let mut mapper = RecordingMapper::default();
        map_kernel_page(&mut mapper, VirtAddr::new(0x2000), PhysAddr::new(0x5000)).unwrap();

        assert_eq!(
            mapper.calls,
            [(VirtAddr::new(0x2000), PhysAddr::new(0x5000), MapFlags::KERNEL_RW)]
        );
    }

    #[test]
    fn test_map_kernel_page_rejects_misaligned() {
        let mut mapper = RecordingMapper::default();

        let virt = map_kernel_page(&mut mapper, VirtAddr::new(0x2008), PhysAddr::new(0x5000));
        let phys = map_kernel_page(&mut mapper, VirtAddr::new(0x2000), PhysAddr::new(0x5010));

        assert_eq!(virt, Err(MappingError::MisalignedAddress));
        assert_eq!(phys, Err(MappingError::MisalignedAddress));
        assert!(mapper.calls.is_empty());
    }

    #[test]
    fn test_map_kernel_page_rejects_user_flags() {
        let mut mapper = RecordingMapper::default();
        let result = map_kernel_page_with(
            &mut mapper,
            VirtAddr::new(0x2000),
            PhysAddr::new(0x5000),
            MapFlags::KERNEL_RW | MapFlags::USER,
        );

        assert_eq!(result, Err(MappingError::InvalidPermissions));
        assert!(mapper.calls.is_empty());
    }
}
