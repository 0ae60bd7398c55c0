//! Device context: every GPU object the cube needs, built in one pass
//!
//! [`DeviceContext::initialize`] fills an empty context step by step and stops at the
//! first failure without undoing anything. [`DeviceContext::teardown`] releases
//! whatever exists, newest first, so it is safe after a partial initialization and
//! safe to call twice.

use ash::vk;

use crate::assets::SearchPaths;
use crate::core::config::RendererConfig;
use crate::render::vulkan::buffer::{Buffer, TransferContext, UniformBuffer};
use crate::render::vulkan::commands::{CommandPool, CommandRecorder, FrameCommands};
use crate::render::vulkan::context::{VulkanError, VulkanInstance, VulkanResult, WindowSurface};
use crate::render::vulkan::descriptor_set::{
    cube_layout, write_cube_set, CubeBindings, DescriptorPool, DescriptorSetLayout,
};
use crate::render::vulkan::device::{LogicalDevice, PhysicalDeviceInfo};
use crate::render::vulkan::framebuffer::{create_framebuffers, Framebuffer};
use crate::render::vulkan::image::{create_depth_image, pick_depth_format, Image};
use crate::render::vulkan::render_pass::RenderPass;
use crate::render::vulkan::shader::{GraphicsPipeline, ShaderModule};
use crate::render::vulkan::swapchain::Swapchain;
use crate::render::vulkan::sync::FrameSync;
use crate::render::vulkan::texture::{load_texture, Sampler, TextureArray};
use crate::render::vulkan::window::Window;
use crate::render::FrameTarget;
use crate::scene::geometry::{CUBE_INDICES, CUBE_VERTICES};
use crate::scene::{MvpMatrices, SceneAttributes};

/// Color the frame is cleared to
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
/// Depth the frame is cleared to
pub const CLEAR_DEPTH: f32 = 1.0;

fn require<'a, T>(resource: &'a Option<T>, what: &str) -> VulkanResult<&'a T> {
    resource
        .as_ref()
        .ok_or_else(|| VulkanError::InitializationFailed(format!("{} has not been created", what)))
}

/// All Vulkan state for drawing the cube
#[derive(Default)]
pub struct DeviceContext {
    instance: Option<VulkanInstance>,
    surface: Option<WindowSurface>,
    physical: Option<PhysicalDeviceInfo>,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    device: Option<LogicalDevice>,
    swapchain: Option<Swapchain>,
    render_pass: Option<RenderPass>,
    descriptor_layout: Option<DescriptorSetLayout>,
    pipeline: Option<GraphicsPipeline>,
    command_pool: Option<CommandPool>,
    depth: Option<Image>,
    framebuffers: Vec<Framebuffer>,
    texture: Option<TextureArray>,
    sampler: Option<Sampler>,
    vertex_buffer: Option<Buffer>,
    index_buffer: Option<Buffer>,
    mvp_buffer: Option<UniformBuffer<MvpMatrices>>,
    scene_buffer: Option<UniformBuffer<SceneAttributes>>,
    descriptor_pool: Option<DescriptorPool>,
    descriptor_set: vk::DescriptorSet,
    frame_commands: Option<FrameCommands>,
    sync: Option<FrameSync>,
}

impl DeviceContext {
    /// Empty context; nothing is created until `initialize`
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every resource for `window`; on error the context holds what was built so far
    pub fn initialize(&mut self, window: &mut Window, config: &RendererConfig, vsync: bool) -> VulkanResult<()> {
        log::info!("Initializing Vulkan (vsync: {})", vsync);

        self.instance = Some(VulkanInstance::new(
            window,
            &config.application_name,
            config.validation_enabled(),
        )?);
        let instance = require(&self.instance, "instance")?;

        self.surface = Some(WindowSurface::new(instance, window)?);
        let surface = require(&self.surface, "surface")?;

        let physical = PhysicalDeviceInfo::select(&instance.instance, surface)?;
        self.memory_properties = physical.memory_properties(&instance.instance);
        self.physical = Some(physical);
        let physical = require(&self.physical, "physical device")?;

        self.device = Some(LogicalDevice::new(&instance.instance, physical)?);
        let device = require(&self.device, "logical device")?;

        self.swapchain = Some(Swapchain::new(
            device,
            physical,
            surface,
            window.framebuffer_size(),
            vsync,
        )?);
        let swapchain = require(&self.swapchain, "swapchain")?;

        let depth_format = pick_depth_format(|format| unsafe {
            instance
                .instance
                .get_physical_device_format_properties(physical.device, format)
        })?;
        self.render_pass = Some(RenderPass::new_forward_pass(
            &device.device,
            swapchain.format(),
            depth_format,
        )?);
        let render_pass = require(&self.render_pass, "render pass")?;

        self.descriptor_layout = Some(cube_layout().build(&device.device)?);
        let descriptor_layout = require(&self.descriptor_layout, "descriptor set layout")?;

        let shader_paths = SearchPaths::shaders(config);
        let vertex_shader = ShaderModule::from_search(&device.device, &shader_paths, &config.vertex_shader)?;
        let fragment_shader = ShaderModule::from_search(&device.device, &shader_paths, &config.fragment_shader)?;
        self.pipeline = Some(GraphicsPipeline::new(
            &device.device,
            render_pass.handle(),
            &vertex_shader,
            &fragment_shader,
            descriptor_layout.handle(),
            swapchain.extent(),
        )?);
        let pipeline = require(&self.pipeline, "pipeline")?;

        self.command_pool = Some(CommandPool::new(&device.device, device.queue_family)?);
        let command_pool = require(&self.command_pool, "command pool")?;

        let transfer = TransferContext {
            device: &device.device,
            memory_properties: &self.memory_properties,
            pool: command_pool,
            queue: device.graphics_queue,
        };

        self.depth = Some(create_depth_image(&transfer, swapchain.extent(), depth_format)?);
        let depth = require(&self.depth, "depth buffer")?;

        self.framebuffers = create_framebuffers(
            &device.device,
            render_pass.handle(),
            swapchain.image_views(),
            depth.view(),
            swapchain.extent(),
        )?;

        let texture_paths = SearchPaths::textures(config);
        let diffuse = load_texture(&texture_paths, &config.diffuse_texture)?;
        let normal = load_texture(&texture_paths, &config.normal_texture)?;
        self.texture = Some(TextureArray::new(&transfer, &diffuse, &normal)?);
        let texture = require(&self.texture, "texture")?;

        self.sampler = Some(Sampler::new(&device.device, device.anisotropy_enabled)?);
        let sampler = require(&self.sampler, "sampler")?;

        self.vertex_buffer = Some(transfer.upload_buffer(&CUBE_VERTICES, vk::BufferUsageFlags::VERTEX_BUFFER)?);
        self.index_buffer = Some(transfer.upload_buffer(&CUBE_INDICES, vk::BufferUsageFlags::INDEX_BUFFER)?);
        let vertex_buffer = require(&self.vertex_buffer, "vertex buffer")?;
        let index_buffer = require(&self.index_buffer, "index buffer")?;

        self.mvp_buffer = Some(UniformBuffer::new(&device.device, &self.memory_properties)?);
        self.scene_buffer = Some(UniformBuffer::new(&device.device, &self.memory_properties)?);
        let mvp_buffer = require(&self.mvp_buffer, "transform buffer")?;
        let scene_buffer = require(&self.scene_buffer, "lighting buffer")?;

        self.descriptor_pool = Some(DescriptorPool::new(
            &device.device,
            descriptor_layout.pool_sizes(),
            1,
        )?);
        let descriptor_pool = require(&self.descriptor_pool, "descriptor pool")?;

        self.descriptor_set = descriptor_pool.allocate(descriptor_layout)?;
        write_cube_set(
            &device.device,
            self.descriptor_set,
            &CubeBindings {
                mvp: vk::DescriptorBufferInfo {
                    buffer: mvp_buffer.handle(),
                    offset: 0,
                    range: mvp_buffer.range(),
                },
                texture: vk::DescriptorImageInfo {
                    sampler: sampler.handle(),
                    image_view: texture.view(),
                    image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                },
                scene: vk::DescriptorBufferInfo {
                    buffer: scene_buffer.handle(),
                    offset: 0,
                    range: scene_buffer.range(),
                },
            },
        );

        let buffers = command_pool.allocate_command_buffers(self.framebuffers.len() as u32)?;
        let frame_commands = FrameCommands::new(&device.device, command_pool, buffers);
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: swapchain.extent(),
        };
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue { float32: CLEAR_COLOR },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: CLEAR_DEPTH,
                    stencil: 0,
                },
            },
        ];
        for (index, framebuffer) in self.framebuffers.iter().enumerate() {
            let command_buffer = frame_commands
                .get(index as u32)
                .ok_or_else(|| VulkanError::InitializationFailed("Missing command buffer".to_string()))?;
            let mut recorder = CommandRecorder::begin(
                &device.device,
                command_buffer,
                vk::CommandBufferUsageFlags::SIMULTANEOUS_USE,
            )?;
            {
                let mut pass =
                    recorder.begin_render_pass(render_pass.handle(), framebuffer.handle(), render_area, &clear_values);
                pass.bind_pipeline(pipeline.handle());
                pass.bind_vertex_buffer(vertex_buffer.handle());
                pass.bind_index_buffer(index_buffer.handle(), vk::IndexType::UINT16);
                pass.bind_descriptor_set(pipeline.layout(), self.descriptor_set);
                pass.draw_indexed(CUBE_INDICES.len() as u32);
            }
            recorder.end()?;
        }
        self.frame_commands = Some(frame_commands);
        log::debug!("Recorded {} command buffers", self.framebuffers.len());

        self.sync = Some(FrameSync::new(&device.device)?);

        log::info!(
            "Vulkan ready on {} ({}x{})",
            physical.name,
            swapchain.extent().width,
            swapchain.extent().height
        );
        Ok(())
    }

    /// Release every resource that exists, newest first. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.instance.is_none() {
            return;
        }
        self.wait_device_idle();

        self.sync.take();
        self.frame_commands.take();
        self.descriptor_set = vk::DescriptorSet::null();
        self.descriptor_pool.take();
        self.scene_buffer.take();
        self.mvp_buffer.take();
        self.index_buffer.take();
        self.vertex_buffer.take();
        self.sampler.take();
        self.texture.take();
        self.framebuffers.clear();
        self.depth.take();
        self.command_pool.take();
        self.pipeline.take();
        self.descriptor_layout.take();
        self.render_pass.take();
        self.swapchain.take();
        self.device.take();
        self.physical.take();
        self.surface.take();
        self.instance.take();
        log::info!("Vulkan torn down");
    }

    /// Wait for all GPU work to finish
    pub fn wait_device_idle(&self) {
        if let Some(device) = &self.device {
            if let Err(e) = unsafe { device.device.device_wait_idle() } {
                log::warn!("vkDeviceWaitIdle failed: {:?}", e);
            }
        }
    }
}

impl FrameTarget for DeviceContext {
    type Error = VulkanError;

    fn acquire(&mut self) -> VulkanResult<u32> {
        let swapchain = require(&self.swapchain, "swapchain")?;
        let sync = require(&self.sync, "semaphores")?;
        let (index, _suboptimal) = unsafe {
            swapchain
                .loader()
                .acquire_next_image(
                    swapchain.handle(),
                    u64::MAX,
                    sync.image_available.handle(),
                    vk::Fence::null(),
                )
                .map_err(VulkanError::Api)?
        };
        Ok(index)
    }

    fn upload(&mut self, mvp: &MvpMatrices, attributes: &SceneAttributes) -> VulkanResult<()> {
        require(&self.mvp_buffer, "transform buffer")?.update(mvp)?;
        require(&self.scene_buffer, "lighting buffer")?.update(attributes)
    }

    fn submit(&mut self, image_index: u32) -> VulkanResult<()> {
        let device = require(&self.device, "logical device")?;
        let sync = require(&self.sync, "semaphores")?;
        let command_buffer = require(&self.frame_commands, "command buffers")?
            .get(image_index)
            .ok_or_else(|| VulkanError::InitializationFailed(format!("No command buffer for image {}", image_index)))?;

        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [sync.render_finished.handle()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe {
            device
                .device
                .queue_submit(device.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| {
                    log::error!("Failed to submit draw command buffer.");
                    VulkanError::Api(e)
                })
        }
    }

    fn present(&mut self, image_index: u32) -> VulkanResult<()> {
        let device = require(&self.device, "logical device")?;
        let swapchain = require(&self.swapchain, "swapchain")?;
        let sync = require(&self.sync, "semaphores")?;

        let wait_semaphores = [sync.render_finished.handle()];
        let swapchains = [swapchain.handle()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            swapchain
                .loader()
                .queue_present(device.present_queue, &present_info)
                .map(|_suboptimal| ())
                .map_err(VulkanError::Api)
        }
    }

    fn wait_idle(&mut self) -> VulkanResult<()> {
        let device = require(&self.device, "logical device")?;
        unsafe { device.device.queue_wait_idle(device.present_queue).map_err(VulkanError::Api) }
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{draw_frame, FrameStatus};
    use crate::scene::{SceneState, SharedScene};
    use crate::input::InputSnapshot;

    #[test]
    fn test_empty_context_tears_down_twice() {
        let mut context = DeviceContext::new();
        context.teardown();
        context.teardown();
        assert!(context.swapchain.is_none());
        assert!(context.instance.is_none());
    }

    #[test]
    fn test_uninitialized_context_drops_frames() {
        let mut context = DeviceContext::new();
        let scene = SharedScene::new(SceneState::new(640, 480));
        let report = draw_frame(&mut context, &scene, &InputSnapshot::default());
        assert_eq!(report.status, FrameStatus::Dropped);
    }
}
