//! Semaphores for the single frame in flight

use ash::{vk, Device};

use crate::render::vulkan::context::{VulkanError, VulkanResult};

/// Semaphore wrapper with RAII cleanup
pub struct Semaphore {
    device: Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create an unsignaled binary semaphore
    pub fn new(device: &Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe {
            device.create_semaphore(&create_info, None).map_err(|e| {
                log::error!("Failed to create semaphores.");
                VulkanError::Api(e)
            })?
        };

        Ok(Self {
            device: device.clone(),
            semaphore,
        })
    }

    /// Raw semaphore handle
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// The acquire and present semaphores shared by every frame
pub struct FrameSync {
    /// Signalled when the acquired image may be rendered to
    pub image_available: Semaphore,
    /// Signalled when rendering finished and the image may be presented
    pub render_finished: Semaphore,
}

impl FrameSync {
    /// Create both semaphores
    pub fn new(device: &Device) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device)?,
            render_finished: Semaphore::new(device)?,
        })
    }
}
