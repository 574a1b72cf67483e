/// VulkanDevice - physical/logical device, queues, command pools and shared GPU state
///
/// One `VulkanDevice` exists per render factory and is shared (via `Arc`) by every
/// resource created from it:
/// - Queue families for graphics, compute and transfer (aliased when not dedicated)
/// - One command pool per distinct family
/// - The GPU memory allocator
/// - The shared staging buffer for host <-> device-local copies
///
/// Dropping the last reference tears everything down, instance included.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};
use vkforge_engine::vkforge::{Error, Result};
use vkforge_engine::vkforge::render::Config;
use vkforge_engine::{engine_debug, engine_err, engine_error, engine_info};

use crate::vulkan_check::vk_check;
use crate::vulkan_instance::VulkanInstance;
use crate::vulkan_staging::{StagingBuffer, STAGING_BUFFER_SIZE};

// ============================================================================
// Pure selection logic
// ============================================================================

/// Queue a command goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Graphics,
    Compute,
    Transfer,
}

/// True iff every required extension is in `supported`
pub fn is_device_suitable<R: AsRef<str>, S: AsRef<str>>(required: &[R], supported: &[S]) -> bool {
    required
        .iter()
        .all(|req| supported.iter().any(|sup| sup.as_ref() == req.as_ref()))
}

/// Index of the queue family to use for `flag`
///
/// Compute prefers a family without graphics, transfer prefers a family with
/// neither graphics nor compute. Otherwise the first family carrying the bit wins.
pub fn select_queue_family_index(families: &[vk::QueueFamilyProperties], flag: vk::QueueFlags) -> Result<u32> {
    let find = |accept: &dyn Fn(vk::QueueFlags) -> bool| {
        families
            .iter()
            .position(|family| accept(family.queue_flags))
            .map(|i| i as u32)
    };

    if flag.contains(vk::QueueFlags::COMPUTE) {
        if let Some(index) = find(&|f| f.contains(flag) && !f.contains(vk::QueueFlags::GRAPHICS)) {
            return Ok(index);
        }
    }

    if flag.contains(vk::QueueFlags::TRANSFER) {
        if let Some(index) = find(&|f| {
            f.contains(flag) && !f.contains(vk::QueueFlags::GRAPHICS) && !f.contains(vk::QueueFlags::COMPUTE)
        }) {
            return Ok(index);
        }
    }

    find(&|f| f.contains(flag))
        .ok_or_else(|| Error::NoSuitableQueueFamily(format!("no queue family supports {:?}", flag)))
}

/// Resolved queue family indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: u32,
    pub compute: u32,
    pub transfer: u32,
}

impl QueueFamilyIndices {
    pub fn resolve(families: &[vk::QueueFamilyProperties]) -> Result<Self> {
        Ok(Self {
            graphics: select_queue_family_index(families, vk::QueueFlags::GRAPHICS)?,
            compute: select_queue_family_index(families, vk::QueueFlags::COMPUTE)?,
            transfer: select_queue_family_index(families, vk::QueueFlags::TRANSFER)?,
        })
    }

    pub fn get(&self, kind: QueueKind) -> u32 {
        match kind {
            QueueKind::Graphics => self.graphics,
            QueueKind::Compute => self.compute,
            QueueKind::Transfer => self.transfer,
        }
    }

    /// Distinct family indices, graphics first. One queue and one pool each.
    pub fn unique(&self) -> Vec<u32> {
        let mut families = vec![self.graphics];
        for family in [self.compute, self.transfer] {
            if !families.contains(&family) {
                families.push(family);
            }
        }
        families
    }
}

/// First memory type allowed by `type_bits` whose flags contain `properties`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    properties: vk::MemoryPropertyFlags,
) -> Result<u32> {
    (0..memory_properties.memory_type_count)
        .find(|&i| {
            (type_bits & (1 << i)) != 0
                && memory_properties.memory_types[i as usize].property_flags.contains(properties)
        })
        .ok_or(Error::NoSuitableMemoryType {
            type_bits,
            properties: properties.as_raw(),
        })
}

/// True iff the tiling's feature set is a superset of `features`
pub fn format_features_supported(
    format_properties: &vk::FormatProperties,
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> bool {
    match tiling {
        vk::ImageTiling::LINEAR => format_properties.linear_tiling_features.contains(features),
        vk::ImageTiling::OPTIMAL => format_properties.optimal_tiling_features.contains(features),
        _ => false,
    }
}

// ============================================================================
// VulkanDevice
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Queues {
    graphics: vk::Queue,
    compute: vk::Queue,
    transfer: vk::Queue,
}

#[derive(Debug, Clone, Copy)]
struct CommandPools {
    graphics: vk::CommandPool,
    compute: vk::CommandPool,
    transfer: vk::CommandPool,
}

impl CommandPools {
    fn get(&self, kind: QueueKind) -> vk::CommandPool {
        match kind {
            QueueKind::Graphics => self.graphics,
            QueueKind::Compute => self.compute,
            QueueKind::Transfer => self.transfer,
        }
    }
}

/// Device shared by every Vulkan resource
pub struct VulkanDevice {
    instance: VulkanInstance,
    /// Selected physical device
    pub physical_device: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub features: vk::PhysicalDeviceFeatures,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Device extensions reported by the physical device
    pub supported_extensions: Vec<String>,
    /// Logical device
    device: ash::Device,
    pub queue_families: QueueFamilyIndices,
    queues: Queues,
    /// Command pools, also serializing one-shot command use
    command_pools: Mutex<CommandPools>,
    /// Queue submissions are externally synchronized through this lock
    queue_lock: Mutex<()>,
    swapchain_loader: ash::khr::swapchain::Device,
    /// Dropped explicitly before the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,
    /// Lazily created, shared by every staged copy
    staging: Mutex<Option<StagingBuffer>>,
}

impl VulkanDevice {
    /// Create instance, pick a physical device and create the logical device
    pub fn new(config: &Config) -> Result<Self> {
        let mut instance = VulkanInstance::new(config)?;

        let mut required: Vec<String> = vec![ash::khr::swapchain::NAME.to_string_lossy().into_owned()];
        for ext in &config.required_device_extensions {
            if !required.contains(ext) {
                required.push(ext.clone());
            }
        }

        match Self::create(&instance, &required) {
            Ok(parts) => Ok(Self::assemble(instance, parts)),
            Err(e) => {
                unsafe { instance.destroy() };
                Err(e)
            }
        }
    }

    fn create(instance: &VulkanInstance, required: &[String]) -> Result<DeviceParts> {
        unsafe {
            let physical_devices = instance.instance
                .enumerate_physical_devices()
                .map_err(|e| {
                    engine_error!("vkforge::vulkan", "Failed to enumerate physical devices: {:?}", e);
                    Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
                })?;

            let mut selected = None;
            for physical_device in physical_devices {
                let extensions = instance.instance
                    .enumerate_device_extension_properties(physical_device)
                    .map_err(|e| vk_check("vkEnumerateDeviceExtensionProperties", e))?;
                let supported: Vec<String> = extensions
                    .iter()
                    .filter_map(|ext| ext.extension_name_as_c_str().ok())
                    .map(|name| name.to_string_lossy().into_owned())
                    .collect();

                if is_device_suitable(required, &supported) {
                    selected = Some((physical_device, supported));
                    break;
                }
            }

            let (physical_device, supported_extensions) = selected.ok_or_else(|| {
                engine_error!("vkforge::vulkan", "No GPU exposes the required extensions {:?}", required);
                Error::InitializationFailed("No suitable Vulkan device found".to_string())
            })?;

            let properties = instance.instance.get_physical_device_properties(physical_device);
            let features = instance.instance.get_physical_device_features(physical_device);
            let memory_properties = instance.instance.get_physical_device_memory_properties(physical_device);
            let families = instance.instance.get_physical_device_queue_family_properties(physical_device);

            let queue_families = QueueFamilyIndices::resolve(&families).map_err(|e| {
                engine_error!("vkforge::vulkan", "Queue family selection failed: {}", e);
                e
            })?;

            let queue_priorities = [1.0f32];
            let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queue_families
                .unique()
                .into_iter()
                .map(|family| {
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(family)
                        .queue_priorities(&queue_priorities)
                })
                .collect();

            let extension_cstrings: Vec<CString> = required
                .iter()
                .filter_map(|name| CString::new(name.as_str()).ok())
                .collect();
            let extension_names: Vec<*const std::os::raw::c_char> =
                extension_cstrings.iter().map(|name| name.as_ptr()).collect();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&extension_names)
                .enabled_features(&features);

            let device = instance.instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("vkforge::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(queue_families.graphics, 0);
            let compute_queue = if queue_families.compute == queue_families.graphics {
                graphics_queue
            } else {
                device.get_device_queue(queue_families.compute, 0)
            };
            let transfer_queue = if queue_families.transfer == queue_families.graphics {
                graphics_queue
            } else if queue_families.transfer == queue_families.compute {
                compute_queue
            } else {
                device.get_device_queue(queue_families.transfer, 0)
            };

            let command_pools = match Self::create_command_pools(&device, &queue_families) {
                Ok(pools) => pools,
                Err(e) => {
                    device.destroy_device(None);
                    return Err(e);
                }
            };

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            });
            let allocator = match allocator {
                Ok(allocator) => allocator,
                Err(e) => {
                    Self::destroy_command_pools(&device, &queue_families, &command_pools);
                    device.destroy_device(None);
                    engine_error!("vkforge::vulkan", "Failed to create GPU allocator: {:?}", e);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance.instance, &device);

            let device_name = properties
                .device_name_as_c_str()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            engine_info!(
                "vkforge::vulkan",
                "Using device '{}' (graphics family {}, compute family {}, transfer family {})",
                device_name, queue_families.graphics, queue_families.compute, queue_families.transfer
            );

            Ok(DeviceParts {
                physical_device,
                properties,
                features,
                memory_properties,
                supported_extensions,
                device,
                queue_families,
                queues: Queues {
                    graphics: graphics_queue,
                    compute: compute_queue,
                    transfer: transfer_queue,
                },
                command_pools,
                swapchain_loader,
                allocator,
            })
        }
    }

    fn assemble(instance: VulkanInstance, parts: DeviceParts) -> Self {
        Self {
            instance,
            physical_device: parts.physical_device,
            properties: parts.properties,
            features: parts.features,
            memory_properties: parts.memory_properties,
            supported_extensions: parts.supported_extensions,
            device: parts.device,
            queue_families: parts.queue_families,
            queues: parts.queues,
            command_pools: Mutex::new(parts.command_pools),
            queue_lock: Mutex::new(()),
            swapchain_loader: parts.swapchain_loader,
            allocator: ManuallyDrop::new(Mutex::new(parts.allocator)),
            staging: Mutex::new(None),
        }
    }

    /// One pool per distinct family, aliased families share the handle
    fn create_command_pools(device: &ash::Device, families: &QueueFamilyIndices) -> Result<CommandPools> {
        let mut created: Vec<(u32, vk::CommandPool)> = Vec::new();
        for family in families.unique() {
            let create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            match unsafe { device.create_command_pool(&create_info, None) } {
                Ok(pool) => created.push((family, pool)),
                Err(e) => {
                    for (_, pool) in created {
                        unsafe { device.destroy_command_pool(pool, None) };
                    }
                    return Err(vk_check("vkCreateCommandPool", e));
                }
            }
        }

        let pool_for = |family: u32| {
            created
                .iter()
                .find(|(f, _)| *f == family)
                .map(|(_, pool)| *pool)
                .unwrap_or(vk::CommandPool::null())
        };

        Ok(CommandPools {
            graphics: pool_for(families.graphics),
            compute: pool_for(families.compute),
            transfer: pool_for(families.transfer),
        })
    }

    unsafe fn destroy_command_pools(device: &ash::Device, families: &QueueFamilyIndices, pools: &CommandPools) {
        let mut destroyed = Vec::new();
        for kind in [QueueKind::Graphics, QueueKind::Compute, QueueKind::Transfer] {
            let family = families.get(kind);
            if !destroyed.contains(&family) {
                device.destroy_command_pool(pools.get(kind), None);
                destroyed.push(family);
            }
        }
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn instance(&self) -> &VulkanInstance {
        &self.instance
    }

    pub fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    pub fn queue(&self, kind: QueueKind) -> vk::Queue {
        match kind {
            QueueKind::Graphics => self.queues.graphics,
            QueueKind::Compute => self.queues.compute,
            QueueKind::Transfer => self.queues.transfer,
        }
    }

    pub fn queue_family(&self, kind: QueueKind) -> u32 {
        self.queue_families.get(kind)
    }

    /// True when graphics and transfer run on different families
    pub fn has_dedicated_transfer(&self) -> bool {
        self.queue_families.transfer != self.queue_families.graphics
    }

    pub(crate) fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!("vkforge::vulkan", "GPU allocator lock poisoned"))
    }

    pub fn find_memory_type(&self, type_bits: u32, properties: vk::MemoryPropertyFlags) -> Result<u32> {
        find_memory_type(&self.memory_properties, type_bits, properties).map_err(|e| {
            engine_error!("vkforge::vulkan", "{}", e);
            e
        })
    }

    pub fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
        unsafe {
            self.instance.instance.get_physical_device_format_properties(self.physical_device, format)
        }
    }

    pub fn is_format_supported(&self, format: vk::Format, tiling: vk::ImageTiling, features: vk::FormatFeatureFlags) -> bool {
        format_features_supported(&self.format_properties(format), tiling, features)
    }

    /// Supported sample counts for color attachments
    pub fn max_color_sample_count(&self) -> u32 {
        let counts = self.properties.limits.framebuffer_color_sample_counts;
        [64, 32, 16, 8, 4, 2]
            .into_iter()
            .find(|&n| counts.contains(crate::vulkan_mapping::sample_count_flags(n)))
            .unwrap_or(1)
    }

    pub fn wait_idle(&self) -> Result<()> {
        let _queue = self.queue_lock.lock()
            .map_err(|_| engine_err!("vkforge::vulkan", "Queue lock poisoned"))?;
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| vk_check("vkDeviceWaitIdle", e))
    }

    // ===== COMMAND BUFFERS =====

    /// Allocate primary command buffers from the pool of `kind`
    pub fn allocate_command_buffers(&self, kind: QueueKind, count: u32) -> Result<Vec<vk::CommandBuffer>> {
        let pools = self.command_pools.lock()
            .map_err(|_| engine_err!("vkforge::vulkan", "Command pool lock poisoned"))?;
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pools.get(kind))
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);
        unsafe { self.device.allocate_command_buffers(&allocate_info) }
            .map_err(|e| vk_check("vkAllocateCommandBuffers", e))
    }

    pub fn free_command_buffers(&self, kind: QueueKind, command_buffers: &[vk::CommandBuffer]) {
        if command_buffers.is_empty() {
            return;
        }
        if let Ok(pools) = self.command_pools.lock() {
            unsafe { self.device.free_command_buffers(pools.get(kind), command_buffers) };
        }
    }

    /// Submit under the queue lock
    pub fn submit(&self, kind: QueueKind, submits: &[vk::SubmitInfo<'_>], fence: vk::Fence) -> Result<()> {
        let _queue = self.queue_lock.lock()
            .map_err(|_| engine_err!("vkforge::vulkan", "Queue lock poisoned"))?;
        unsafe { self.device.queue_submit(self.queue(kind), submits, fence) }
            .map_err(|e| vk_check("vkQueueSubmit", e))
    }

    /// Present under the queue lock. Returns true when the swapchain is suboptimal.
    pub fn present(&self, present_info: &vk::PresentInfoKHR<'_>) -> std::result::Result<bool, vk::Result> {
        let Ok(_queue) = self.queue_lock.lock() else {
            return Err(vk::Result::ERROR_UNKNOWN);
        };
        unsafe { self.swapchain_loader.queue_present(self.queues.graphics, present_info) }
    }

    /// Allocate and begin a one-time-submit command buffer
    pub fn begin_single_time_command(&self, kind: QueueKind) -> Result<vk::CommandBuffer> {
        let command_buffer = self.allocate_command_buffers(kind, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!("vkforge::vulkan", "Driver returned no command buffer"))?;

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        if let Err(e) = unsafe { self.device.begin_command_buffer(command_buffer, &begin_info) } {
            self.free_command_buffers(kind, &[command_buffer]);
            return Err(vk_check("vkBeginCommandBuffer", e));
        }

        Ok(command_buffer)
    }

    /// End, submit, wait for the queue to idle and free the command buffer
    pub fn end_single_time_command(&self, kind: QueueKind, command_buffer: vk::CommandBuffer) -> Result<()> {
        let result = self.finish_single_time_command(kind, command_buffer);
        self.free_command_buffers(kind, &[command_buffer]);
        result
    }

    fn finish_single_time_command(&self, kind: QueueKind, command_buffer: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.device.end_command_buffer(command_buffer)
                .map_err(|e| vk_check("vkEndCommandBuffer", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let _queue = self.queue_lock.lock()
                .map_err(|_| engine_err!("vkforge::vulkan", "Queue lock poisoned"))?;
            let queue = self.queue(kind);
            self.device.queue_submit(queue, &[submit_info], vk::Fence::null())
                .map_err(|e| vk_check("vkQueueSubmit", e))?;
            self.device.queue_wait_idle(queue)
                .map_err(|e| vk_check("vkQueueWaitIdle", e))
        }
    }

    /// Record into a one-shot command buffer and wait for it to complete
    pub fn single_time_command<F>(&self, kind: QueueKind, record: F) -> Result<()>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let command_buffer = self.begin_single_time_command(kind)?;
        record(&self.device, command_buffer);
        self.end_single_time_command(kind, command_buffer)
    }

    // ===== STAGING =====

    /// Run `f` with exclusive access to the shared staging buffer
    ///
    /// The staging buffer is created on first use. Holding it for the whole
    /// closure serializes every staged transfer.
    pub fn with_staging<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&StagingBuffer) -> Result<T>,
    {
        let mut guard = self.staging.lock()
            .map_err(|_| engine_err!("vkforge::vulkan", "Staging buffer lock poisoned"))?;

        if guard.is_none() {
            engine_debug!("vkforge::vulkan", "Creating {} MiB staging buffer", STAGING_BUFFER_SIZE / (1024 * 1024));
            *guard = Some(StagingBuffer::new(self, STAGING_BUFFER_SIZE)?);
        }

        match guard.as_ref() {
            Some(staging) => f(staging),
            None => Err(engine_err!("vkforge::vulkan", "Staging buffer unavailable")),
        }
    }

    /// Families a resource shared between graphics and transfer must list
    pub fn sharing_families(&self) -> Vec<u32> {
        let mut families = vec![self.queue_families.graphics];
        if self.queue_families.transfer != self.queue_families.graphics {
            families.push(self.queue_families.transfer);
        }
        families
    }

    /// Device extension name list (tests / diagnostics)
    pub fn has_extension(&self, name: &CStr) -> bool {
        let name = name.to_string_lossy();
        self.supported_extensions.iter().any(|ext| *ext == name)
    }
}

/// Everything `create` builds before the struct is assembled
struct DeviceParts {
    physical_device: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    supported_extensions: Vec<String>,
    device: ash::Device,
    queue_families: QueueFamilyIndices,
    queues: Queues,
    command_pools: CommandPools,
    swapchain_loader: ash::khr::swapchain::Device,
    allocator: Allocator,
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            if let Ok(mut staging) = self.staging.lock() {
                if let Some(mut buffer) = staging.take() {
                    buffer.destroy(&self.device, &self.allocator);
                }
            }

            if let Ok(pools) = self.command_pools.lock() {
                Self::destroy_command_pools(&self.device, &self.queue_families, &pools);
            }

            // Allocator must go before the device
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
            self.instance.destroy();
        }

        engine_info!("vkforge::vulkan", "Vulkan device destroyed");
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
