/// Shared staging buffer for device-local uploads and read-backs
///
/// Owned by `VulkanDevice` and only reachable through `VulkanDevice::with_staging`,
/// which holds the lock for the whole transfer.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, Allocator};
use std::sync::Mutex;
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::engine_error;

use crate::vulkan_check::vk_check;
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_memory::allocate_buffer_memory;

/// Capacity of the shared staging buffer (128 MiB)
pub const STAGING_BUFFER_SIZE: u64 = 128 * 1024 * 1024;

/// Reject transfers that would run past the end of the staging buffer
pub fn check_staging_fits(capacity: u64, offset: u64, len: u64) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(Error::InvalidResource(format!(
            "staging transfer of {} bytes at offset {} exceeds the {} byte staging buffer",
            len, offset, capacity
        ))),
    }
}

/// Host-visible, coherent transfer buffer
pub struct StagingBuffer {
    pub buffer: vk::Buffer,
    allocation: Option<Allocation>,
    pub size: u64,
}

impl StagingBuffer {
    pub(crate) fn new(device: &VulkanDevice, size: u64) -> Result<Self> {
        let families = device.sharing_families();
        let mut create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST);
        create_info = if families.len() > 1 {
            create_info
                .sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&families)
        } else {
            create_info.sharing_mode(vk::SharingMode::EXCLUSIVE)
        };

        let buffer = unsafe { device.device().create_buffer(&create_info, None) }
            .map_err(|e| vk_check("vkCreateBuffer", e))?;

        let allocation = match allocate_buffer_memory(
            device,
            buffer,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            "staging buffer",
        ) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.device().destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        Ok(Self {
            buffer,
            allocation: Some(allocation),
            size,
        })
    }

    fn mapped_ptr(&self) -> Result<*mut u8> {
        self.allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .map(|ptr| ptr.as_ptr() as *mut u8)
            .ok_or_else(|| {
                engine_error!("vkforge::vulkan", "Staging buffer is not host mapped");
                Error::ResourceNotReady("staging buffer is not host mapped".to_string())
            })
    }

    /// Copy `data` into the staging buffer at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_staging_fits(self.size, offset, data.len() as u64)?;
        let ptr = self.mapped_ptr()?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(offset as usize), data.len());
        }
        Ok(())
    }

    /// Copy `len` bytes out of the staging buffer starting at `offset`
    pub fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        check_staging_fits(self.size, offset, len as u64)?;
        let ptr = self.mapped_ptr()?;
        let mut out = vec![0u8; len];
        unsafe {
            std::ptr::copy_nonoverlapping(ptr.add(offset as usize), out.as_mut_ptr(), len);
        }
        Ok(out)
    }

    pub(crate) unsafe fn destroy(&mut self, device: &ash::Device, allocator: &Mutex<Allocator>) {
        if let Some(allocation) = self.allocation.take() {
            if let Ok(mut allocator) = allocator.lock() {
                allocator.free(allocation).ok();
            }
        }
        device.destroy_buffer(self.buffer, None);
        self.buffer = vk::Buffer::null();
    }
}

#[cfg(test)]
#[path = "vulkan_staging_tests.rs"]
mod tests;
