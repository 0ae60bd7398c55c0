//! Framebuffer management

use ash::{vk, Device};

use crate::render::vulkan::context::{VulkanError, VulkanResult};

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a single-layer framebuffer for `render_pass`
    pub fn new(
        device: &Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let framebuffer_create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            device.create_framebuffer(&framebuffer_create_info, None).map_err(|e| {
                log::error!("Failed to create framebuffer.");
                VulkanError::Api(e)
            })?
        };

        Ok(Self {
            device: device.clone(),
            framebuffer,
        })
    }

    /// Raw framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// One framebuffer per swapchain view, each sharing `depth_view`
pub fn create_framebuffers(
    device: &Device,
    render_pass: vk::RenderPass,
    color_views: &[vk::ImageView],
    depth_view: vk::ImageView,
    extent: vk::Extent2D,
) -> VulkanResult<Vec<Framebuffer>> {
    color_views
        .iter()
        .map(|&view| Framebuffer::new(device, render_pass, &[view, depth_view], extent))
        .collect()
}
