//! Command pools and command buffer recording

use ash::{vk, Device};

use crate::render::vulkan::context::{VulkanError, VulkanResult};

/// Command pool wrapper with RAII cleanup
pub struct CommandPool {
    device: Device,
    command_pool: vk::CommandPool,
}

impl CommandPool {
    /// Create a pool for `queue_family_index`; buffers are never reset individually
    pub fn new(device: &Device, queue_family_index: u32) -> VulkanResult<Self> {
        let pool_create_info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::empty())
            .queue_family_index(queue_family_index);

        let command_pool = unsafe {
            device.create_command_pool(&pool_create_info, None).map_err(|e| {
                log::error!("Failed to create command pool.");
                VulkanError::Api(e)
            })?
        };

        Ok(Self {
            device: device.clone(),
            command_pool,
        })
    }

    /// Allocate `count` primary command buffers
    pub fn allocate_command_buffers(&self, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe { self.device.allocate_command_buffers(&alloc_info).map_err(VulkanError::Api) }
    }

    /// Raw pool handle
    pub fn handle(&self) -> vk::CommandPool {
        self.command_pool
    }

    /// Allocate a buffer and begin recording it for a single submission
    pub fn begin_single_time(&self) -> VulkanResult<SingleTimeCommands<'_>> {
        let command_buffer = self
            .allocate_command_buffers(1)?
            .into_iter()
            .next()
            .ok_or(VulkanError::Api(vk::Result::ERROR_UNKNOWN))?;
        let commands = SingleTimeCommands {
            pool: self,
            command_buffer,
        };

        let begin_info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }
        Ok(commands)
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.command_pool, None);
        }
        log::debug!("Destroyed command pool");
    }
}

/// A one-shot command buffer, freed when dropped whether or not it was submitted
pub struct SingleTimeCommands<'a> {
    pool: &'a CommandPool,
    command_buffer: vk::CommandBuffer,
}

impl<'a> SingleTimeCommands<'a> {
    /// Command buffer being recorded
    pub fn handle(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// End recording, submit to `queue` and block until the queue is idle
    pub fn submit_and_wait(self, queue: vk::Queue) -> VulkanResult<()> {
        let device = &self.pool.device;
        let command_buffers = [self.command_buffer];
        let submit_info = vk::SubmitInfo::builder().command_buffers(&command_buffers).build();

        unsafe {
            device.end_command_buffer(self.command_buffer).map_err(VulkanError::Api)?;
            device
                .queue_submit(queue, &[submit_info], vk::Fence::null())
                .map_err(VulkanError::Api)?;
            device.queue_wait_idle(queue).map_err(VulkanError::Api)?;
        }
        Ok(())
    }
}

impl<'a> Drop for SingleTimeCommands<'a> {
    fn drop(&mut self) {
        unsafe {
            self.pool
                .device
                .free_command_buffers(self.pool.command_pool, &[self.command_buffer]);
        }
    }
}

/// Records a reusable command buffer
pub struct CommandRecorder<'a> {
    device: &'a Device,
    command_buffer: vk::CommandBuffer,
}

impl<'a> CommandRecorder<'a> {
    /// Begin recording with `flags`
    pub fn begin(
        device: &'a Device,
        command_buffer: vk::CommandBuffer,
        flags: vk::CommandBufferUsageFlags,
    ) -> VulkanResult<Self> {
        let begin_info = vk::CommandBufferBeginInfo::builder().flags(flags);
        unsafe {
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }
        Ok(Self { device, command_buffer })
    }

    /// Begin an inline render pass; it ends when the returned guard drops
    pub fn begin_render_pass(
        &mut self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        render_area: vk::Rect2D,
        clear_values: &[vk::ClearValue],
    ) -> ActiveRenderPass<'_, 'a> {
        let render_pass_begin = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(clear_values);

        unsafe {
            self.device
                .cmd_begin_render_pass(self.command_buffer, &render_pass_begin, vk::SubpassContents::INLINE);
        }
        ActiveRenderPass { recorder: self }
    }

    /// Finish recording
    pub fn end(self) -> VulkanResult<vk::CommandBuffer> {
        unsafe {
            self.device.end_command_buffer(self.command_buffer).map_err(|e| {
                log::error!("Failed to record command buffer.");
                VulkanError::Api(e)
            })?;
        }
        Ok(self.command_buffer)
    }
}

/// Commands valid inside a render pass
pub struct ActiveRenderPass<'r, 'a> {
    recorder: &'r mut CommandRecorder<'a>,
}

impl<'r, 'a> ActiveRenderPass<'r, 'a> {
    /// Bind a graphics pipeline
    pub fn bind_pipeline(&mut self, pipeline: vk::Pipeline) {
        unsafe {
            self.recorder.device.cmd_bind_pipeline(
                self.recorder.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline,
            );
        }
    }

    /// Bind `buffer` at vertex binding 0
    pub fn bind_vertex_buffer(&mut self, buffer: vk::Buffer) {
        unsafe {
            self.recorder
                .device
                .cmd_bind_vertex_buffers(self.recorder.command_buffer, 0, &[buffer], &[0]);
        }
    }

    /// Bind the index buffer
    pub fn bind_index_buffer(&mut self, buffer: vk::Buffer, index_type: vk::IndexType) {
        unsafe {
            self.recorder
                .device
                .cmd_bind_index_buffer(self.recorder.command_buffer, buffer, 0, index_type);
        }
    }

    /// Bind `set` as set 0 of `layout`
    pub fn bind_descriptor_set(&mut self, layout: vk::PipelineLayout, set: vk::DescriptorSet) {
        unsafe {
            self.recorder.device.cmd_bind_descriptor_sets(
                self.recorder.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                0,
                &[set],
                &[],
            );
        }
    }

    /// Draw one instance of `index_count` indices
    pub fn draw_indexed(&mut self, index_count: u32) {
        unsafe {
            self.recorder
                .device
                .cmd_draw_indexed(self.recorder.command_buffer, index_count, 1, 0, 0, 0);
        }
    }
}

impl<'r, 'a> Drop for ActiveRenderPass<'r, 'a> {
    fn drop(&mut self) {
        unsafe {
            self.recorder.device.cmd_end_render_pass(self.recorder.command_buffer);
        }
    }
}

/// Command buffers recorded once at startup, one per swapchain image
pub struct FrameCommands {
    device: Device,
    pool: vk::CommandPool,
    buffers: Vec<vk::CommandBuffer>,
}

impl FrameCommands {
    /// Take ownership of `buffers` allocated from `pool`
    pub fn new(device: &Device, pool: &CommandPool, buffers: Vec<vk::CommandBuffer>) -> Self {
        Self {
            device: device.clone(),
            pool: pool.handle(),
            buffers,
        }
    }

    /// Command buffer for swapchain image `index`
    pub fn get(&self, index: u32) -> Option<vk::CommandBuffer> {
        self.buffers.get(index as usize).copied()
    }
}

impl Drop for FrameCommands {
    fn drop(&mut self) {
        if !self.buffers.is_empty() {
            unsafe {
                self.device.free_command_buffers(self.pool, &self.buffers);
            }
        }
    }
}
