//! Buffers and device-memory helpers
//!
//! Static data goes through [`TransferContext::upload_buffer`]: a host-visible
//! staging buffer is filled, copied into a device-local buffer by a one-time
//! command buffer, and dropped before the call returns.

use std::marker::PhantomData;
use std::mem;

use ash::{vk, Device};
use bytemuck::Pod;

use crate::render::vulkan::commands::CommandPool;
use crate::render::vulkan::context::{VulkanError, VulkanResult};

/// Index of the first memory type allowed by `type_filter` that has all of `properties`
pub fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    properties: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    (0..memory_properties.memory_type_count)
        .find(|&i| {
            type_filter & (1 << i) != 0
                && memory_properties.memory_types[i as usize].property_flags.contains(properties)
        })
        .ok_or_else(|| {
            log::error!("Failed to find suitable memory type.");
            VulkanError::NoSuitableMemoryType
        })
}

/// Buffer wrapper with its own memory allocation
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory to it
    pub fn new(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device.create_buffer(&buffer_info, None).map_err(|e| {
                log::error!("Failed to create buffer ({:?}).", usage);
                VulkanError::Api(e)
            })?
        };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory = find_memory_type(memory_properties, requirements.memory_type_bits, properties).and_then(|index| {
            let alloc_info = vk::MemoryAllocateInfo::builder()
                .allocation_size(requirements.size)
                .memory_type_index(index);
            unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::Api) }
        });
        let memory = match memory {
            Ok(memory) => memory,
            Err(e) => {
                log::error!("Failed to allocate buffer memory.");
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let this = Self {
            device: device.clone(),
            buffer,
            memory,
            size,
        };
        unsafe {
            device.bind_buffer_memory(buffer, memory, 0).map_err(VulkanError::Api)?;
        }
        Ok(this)
    }

    /// Copy `data` to the start of the buffer: map, copy, unmap.
    pub fn write<T: Pod>(&self, data: &[T]) -> VulkanResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() as vk::DeviceSize > self.size {
            return Err(VulkanError::InitializationFailed(format!(
                "Write of {} bytes into a {} byte buffer",
                bytes.len(),
                self.size
            )));
        }

        unsafe {
            let dst = self
                .device
                .map_memory(self.memory, 0, bytes.len() as vk::DeviceSize, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst as *mut u8, bytes.len());
            self.device.unmap_memory(self.memory);
        }
        Ok(())
    }

    /// Raw buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Allocated size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Host-visible buffer holding one `T`, rewritten every frame
pub struct UniformBuffer<T> {
    buffer: Buffer,
    _phantom: PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    /// Create a host-visible buffer sized for one `T`
    pub fn new(device: &Device, memory_properties: &vk::PhysicalDeviceMemoryProperties) -> VulkanResult<Self> {
        let buffer = Buffer::new(
            device,
            memory_properties,
            mem::size_of::<T>() as vk::DeviceSize,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        Ok(Self {
            buffer,
            _phantom: PhantomData,
        })
    }

    /// Replace the buffer contents with `value`
    pub fn update(&self, value: &T) -> VulkanResult<()> {
        self.buffer.write(std::slice::from_ref(value))
    }

    /// Raw buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Descriptor range covering the whole block
    pub fn range(&self) -> vk::DeviceSize {
        mem::size_of::<T>() as vk::DeviceSize
    }
}

/// What a one-time transfer needs: device, memory types, pool and queue
pub struct TransferContext<'a> {
    /// Logical device
    pub device: &'a Device,
    /// Memory types used to place buffers
    pub memory_properties: &'a vk::PhysicalDeviceMemoryProperties,
    /// Pool for one-time transfer commands
    pub pool: &'a CommandPool,
    /// Queue the copies are submitted to
    pub queue: vk::Queue,
}

impl<'a> TransferContext<'a> {
    /// Host-visible transfer source filled with `data`
    pub fn staging_buffer<T: Pod>(&self, data: &[T]) -> VulkanResult<Buffer> {
        let size = mem::size_of_val(data) as vk::DeviceSize;
        let staging = Buffer::new(
            self.device,
            self.memory_properties,
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        staging.write(data)?;
        Ok(staging)
    }

    /// Device-local buffer with `usage`, filled with `data` through a staging copy
    pub fn upload_buffer<T: Pod>(&self, data: &[T], usage: vk::BufferUsageFlags) -> VulkanResult<Buffer> {
        let staging = self.staging_buffer(data)?;
        let buffer = Buffer::new(
            self.device,
            self.memory_properties,
            staging.size(),
            usage | vk::BufferUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;
        self.copy_buffer(&staging, &buffer)?;
        log::debug!("Uploaded {} bytes ({:?})", buffer.size(), usage);
        Ok(buffer)
    }

    /// Copy all of `src` into `dst` and wait for it
    pub fn copy_buffer(&self, src: &Buffer, dst: &Buffer) -> VulkanResult<()> {
        let commands = self.pool.begin_single_time()?;
        let region = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: src.size(),
        };
        unsafe {
            self.device
                .cmd_copy_buffer(commands.handle(), src.handle(), dst.handle(), &[region]);
        }
        commands.submit_and_wait(self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_properties(flags: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut props = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: flags.len() as u32,
            ..Default::default()
        };
        for (i, &f) in flags.iter().enumerate() {
            props.memory_types[i].property_flags = f;
        }
        props
    }

    #[test]
    fn test_find_memory_type() {
        let props = memory_properties(&[
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
            vk::MemoryPropertyFlags::HOST_VISIBLE,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        ]);
        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;

        assert_eq!(find_memory_type(&props, 0b111, host).unwrap(), 2);
        assert_eq!(find_memory_type(&props, 0b111, vk::MemoryPropertyFlags::HOST_VISIBLE).unwrap(), 1);
        assert_eq!(find_memory_type(&props, 0b001, vk::MemoryPropertyFlags::DEVICE_LOCAL).unwrap(), 0);
    }

    #[test]
    fn test_type_filter_excludes() {
        let props = memory_properties(&[vk::MemoryPropertyFlags::DEVICE_LOCAL, vk::MemoryPropertyFlags::DEVICE_LOCAL]);
        assert_eq!(find_memory_type(&props, 0b10, vk::MemoryPropertyFlags::DEVICE_LOCAL).unwrap(), 1);
        assert!(matches!(
            find_memory_type(&props, 0b00, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            Err(VulkanError::NoSuitableMemoryType)
        ));
    }
}
