/// VulkanBuffer - vertex, index and constant buffers
///
/// Static buffers live in device-local memory and are filled through the
/// device's staging buffer. Dynamic buffers are host-visible and coherent and
/// are written through their persistent mapping.

use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::{AccessHint, BufferBinding, BufferDesc, BufferUsage};
use vkforge_engine::{engine_bail, engine_err, engine_error, engine_trace};

use crate::vulkan_check::vk_check;
use crate::vulkan_device::{QueueKind, VulkanDevice};
use crate::vulkan_memory::{allocate_buffer_memory, free_memory};

/// Usage flags for a buffer descriptor
pub fn buffer_usage_flags(desc: &BufferDesc) -> vk::BufferUsageFlags {
    let mut flags = match desc.binding {
        BufferBinding::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferBinding::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        BufferBinding::Constant => vk::BufferUsageFlags::UNIFORM_BUFFER,
    };
    if desc.access_hint.contains(AccessHint::GPU_UNORDERED) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if desc.usage == BufferUsage::Static {
        // Filled and read back through staging
        flags |= vk::BufferUsageFlags::TRANSFER_DST | vk::BufferUsageFlags::TRANSFER_SRC;
    }
    flags
}

/// Memory properties for a buffer usage class
pub fn buffer_memory_properties(usage: BufferUsage) -> vk::MemoryPropertyFlags {
    match usage {
        BufferUsage::Static => vk::MemoryPropertyFlags::DEVICE_LOCAL,
        BufferUsage::Dynamic => vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    }
}

/// Validate a copy range against a buffer size
pub fn check_range(size: u64, offset: u64, len: u64) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::InvalidResource(format!(
            "range {}..{} exceeds buffer of {} bytes",
            offset,
            offset.saturating_add(len),
            size
        ))),
    }
}

/// Vulkan buffer
pub struct VulkanBuffer {
    device: Arc<VulkanDevice>,
    desc: BufferDesc,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    /// Held by a live `MappedBuffer`
    map_lock: Mutex<()>,
}

impl VulkanBuffer {
    /// Describe a buffer. No Vulkan object exists until `create_hw_resource`.
    pub fn new(device: Arc<VulkanDevice>, desc: BufferDesc) -> Self {
        Self {
            device,
            desc,
            buffer: vk::Buffer::null(),
            allocation: None,
            map_lock: Mutex::new(()),
        }
    }

    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    pub fn size(&self) -> u64 {
        self.desc.size_in_bytes as u64
    }

    pub fn usage(&self) -> BufferUsage {
        self.desc.usage
    }

    pub fn access_hint(&self) -> AccessHint {
        self.desc.access_hint
    }

    pub fn structure_byte_stride(&self) -> u32 {
        self.desc.structure_byte_stride
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn hw_resource_ready(&self) -> bool {
        self.allocation.is_some()
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.hw_resource_ready() {
            Ok(())
        } else {
            Err(Error::ResourceNotReady("buffer has no hardware resource".to_string()))
        }
    }

    /// Create the buffer, its memory and upload `init_data`
    ///
    /// The buffer reports ready only when every step succeeded.
    pub fn create_hw_resource(&mut self, init_data: Option<&[u8]>) -> Result<()> {
        if self.hw_resource_ready() {
            self.delete_hw_resource();
        }

        let size = self.size();
        if size == 0 {
            engine_bail!("vkforge::vulkan", "Cannot create a zero-sized buffer");
        }
        if let Some(data) = init_data {
            if data.len() as u64 > size {
                engine_bail!("vkforge::vulkan", "Init data ({} bytes) larger than buffer ({} bytes)", data.len(), size);
            }
        }

        let families = self.device.sharing_families();
        let mut create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(buffer_usage_flags(&self.desc));
        create_info = if self.desc.usage == BufferUsage::Static && families.len() > 1 {
            create_info
                .sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&families)
        } else {
            create_info.sharing_mode(vk::SharingMode::EXCLUSIVE)
        };

        let buffer = unsafe { self.device.device().create_buffer(&create_info, None) }
            .map_err(|e| vk_check("vkCreateBuffer", e))?;

        let allocation = match allocate_buffer_memory(
            &self.device,
            buffer,
            buffer_memory_properties(self.desc.usage),
            "buffer",
        ) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { self.device.device().destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        self.buffer = buffer;

        if let Some(data) = init_data {
            let uploaded = match self.desc.usage {
                BufferUsage::Static => self.upload_staged(0, data),
                BufferUsage::Dynamic => write_mapped(&allocation, 0, data),
            };
            if let Err(e) = uploaded {
                free_memory(&self.device, allocation);
                unsafe { self.device.device().destroy_buffer(buffer, None) };
                self.buffer = vk::Buffer::null();
                return Err(e);
            }
        }

        self.allocation = Some(allocation);

        engine_trace!(
            "vkforge::vulkan",
            "Created {:?} {:?} buffer of {} bytes",
            self.desc.usage, self.desc.binding, size
        );
        Ok(())
    }

    /// Destroy the buffer and its memory. Safe to call repeatedly.
    pub fn delete_hw_resource(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            free_memory(&self.device, allocation);
        }
        if self.buffer != vk::Buffer::null() {
            unsafe { self.device.device().destroy_buffer(self.buffer, None) };
            self.buffer = vk::Buffer::null();
        }
    }

    fn upload_staged(&self, offset: u64, data: &[u8]) -> Result<()> {
        let dst = self.buffer;
        self.device.with_staging(|staging| {
            staging.write(0, data)?;
            let region = vk::BufferCopy {
                src_offset: 0,
                dst_offset: offset,
                size: data.len() as u64,
            };
            self.device.single_time_command(QueueKind::Transfer, |device, cmd| unsafe {
                device.cmd_copy_buffer(cmd, staging.buffer, dst, &[region]);
            })
        })
    }

    /// Write `data` at `offset`
    ///
    /// Dynamic buffers are written through the mapping, static ones through staging.
    pub fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        check_range(self.size(), offset, data.len() as u64)?;
        if data.is_empty() {
            return Ok(());
        }

        match self.desc.usage {
            BufferUsage::Static => self.upload_staged(offset, data),
            BufferUsage::Dynamic => {
                let _mapping = self.lock_mapping()?;
                match self.allocation.as_ref() {
                    Some(allocation) => write_mapped(allocation, offset, data),
                    None => Err(Error::ResourceNotReady("buffer has no hardware resource".to_string())),
                }
            }
        }
    }

    /// Copy `size` bytes into `target` on the transfer queue and wait for completion
    pub fn copy_to_sub_buffer(&self, target: &VulkanBuffer, dst_offset: u64, src_offset: u64, size: u64) -> Result<()> {
        self.ensure_ready()?;
        target.ensure_ready()?;
        check_range(self.size(), src_offset, size)?;
        check_range(target.size(), dst_offset, size)?;

        let region = vk::BufferCopy { src_offset, dst_offset, size };
        let (src, dst) = (self.buffer, target.buffer);
        self.device.single_time_command(QueueKind::Transfer, |device, cmd| unsafe {
            device.cmd_copy_buffer(cmd, src, dst, &[region]);
        })
    }

    /// Copy the whole buffer into `target`
    pub fn copy_to_buffer(&self, target: &VulkanBuffer) -> Result<()> {
        self.copy_to_sub_buffer(target, 0, 0, self.size().min(target.size()))
    }

    /// Map the whole buffer for host access
    ///
    /// Only dynamic buffers are host visible. The mapping is released when the
    /// returned guard drops. The GPU must not be using the buffer meanwhile.
    pub fn map(&self) -> Result<MappedBuffer<'_>> {
        self.ensure_ready()?;
        if self.desc.usage == BufferUsage::Static {
            return Err(engine_err!("vkforge::vulkan", "Static buffers are device local and cannot be mapped"));
        }

        let guard = self.lock_mapping()?;
        let ptr = self.allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .map(|ptr| ptr.as_ptr() as *mut u8)
            .ok_or_else(|| engine_err!("vkforge::vulkan", "Buffer is not CPU-accessible"))?;

        Ok(MappedBuffer {
            _guard: guard,
            ptr,
            len: self.desc.size_in_bytes as usize,
        })
    }

    /// Download the whole buffer content
    pub fn read_back(&self) -> Result<Vec<u8>> {
        self.ensure_ready()?;
        match self.desc.usage {
            BufferUsage::Dynamic => Ok(self.map()?.to_vec()),
            BufferUsage::Static => {
                let size = self.size();
                let src = self.buffer;
                self.device.with_staging(|staging| {
                    let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size };
                    self.device.single_time_command(QueueKind::Transfer, |device, cmd| unsafe {
                        device.cmd_copy_buffer(cmd, src, staging.buffer, &[region]);
                    })?;
                    staging.read(0, size as usize)
                })
            }
        }
    }

    fn lock_mapping(&self) -> Result<MutexGuard<'_, ()>> {
        self.map_lock
            .lock()
            .map_err(|_| engine_err!("vkforge::vulkan", "Buffer mapping lock poisoned"))
    }
}

fn write_mapped(allocation: &Allocation, offset: u64, data: &[u8]) -> Result<()> {
    let ptr = allocation
        .mapped_ptr()
        .ok_or_else(|| {
            engine_error!("vkforge::vulkan", "Buffer update failed: memory is not host mapped");
            Error::BackendError("Buffer is not CPU-accessible".to_string())
        })?
        .as_ptr() as *mut u8;

    unsafe {
        std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(offset as usize), data.len());
    }
    Ok(())
}

/// Host view of a mapped dynamic buffer, unmapped on drop
pub struct MappedBuffer<'a> {
    _guard: MutexGuard<'a, ()>,
    ptr: *mut u8,
    len: usize,
}

impl Deref for MappedBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl DerefMut for MappedBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        self.delete_hw_resource();
    }
}

#[cfg(test)]
#[path = "vulkan_buffer_tests.rs"]
mod tests;
