//! Swapchain configuration and ownership
//!
//! The `choose_*` functions hold every decision about the swapchain and need no
//! device, so they are tested directly.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::vk;

use crate::render::vulkan::context::{VulkanError, VulkanResult, WindowSurface};
use crate::render::vulkan::device::{LogicalDevice, PhysicalDeviceInfo};
use crate::render::vulkan::image::create_image_view;

/// Preferred color format when the surface offers a choice
pub const PREFERRED_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Pick the surface format.
///
/// A lone `UNDEFINED` entry means the surface takes anything, so the preferred
/// format is used; otherwise the preferred format if listed, else the first one.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    match formats {
        [] => None,
        [only] if only.format == vk::Format::UNDEFINED => Some(PREFERRED_FORMAT),
        _ => formats
            .iter()
            .find(|f| f.format == PREFERRED_FORMAT.format && f.color_space == PREFERRED_FORMAT.color_space)
            .or_else(|| formats.first())
            .copied(),
    }
}

/// FIFO with vsync; otherwise mailbox when offered, else immediate
pub fn choose_present_mode(modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::IMMEDIATE
    }
}

/// Use the surface's extent when it dictates one, else clamp the window size
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: width.min(capabilities.max_image_extent.width).max(capabilities.min_image_extent.width),
        height: height
            .min(capabilities.max_image_extent.height)
            .max(capabilities.min_image_extent.height),
    }
}

/// One more than the minimum, capped by a nonzero maximum
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        count
    }
}

/// Swapchain plus one color view per image
pub struct Swapchain {
    device: ash::Device,
    loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    image_views: Vec<vk::ImageView>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create the swapchain for a `width` x `height` window
    pub fn new(
        device: &LogicalDevice,
        physical: &PhysicalDeviceInfo,
        surface: &WindowSurface,
        (width, height): (u32, u32),
        vsync: bool,
    ) -> VulkanResult<Self> {
        let capabilities = surface.capabilities(physical.device)?;
        let formats = surface.formats(physical.device)?;
        let modes = surface.present_modes(physical.device)?;

        let format = choose_surface_format(&formats)
            .ok_or_else(|| VulkanError::InitializationFailed("Surface reports no formats".to_string()))?;
        let present_mode = choose_present_mode(&modes, vsync);
        let extent = choose_extent(&capabilities, width, height);
        let image_count = choose_image_count(&capabilities);
        log::debug!(
            "Swapchain: {:?} {:?}, {:?}, {}x{}, {} images",
            format.format,
            format.color_space,
            present_mode,
            extent.width,
            extent.height,
            image_count
        );

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let loader = device.swapchain_loader.clone();
        let swapchain = unsafe {
            loader.create_swapchain(&create_info, None).map_err(|e| {
                log::error!("Failed to create swap chain.");
                VulkanError::Api(e)
            })?
        };

        let mut this = Self {
            device: device.device.clone(),
            loader,
            swapchain,
            image_views: Vec::new(),
            format,
            extent,
        };

        // Views created so far are released by Drop if a later one fails
        let images = unsafe { this.loader.get_swapchain_images(swapchain).map_err(VulkanError::Api)? };
        for image in images {
            let view = create_image_view(&this.device, image, format.format, vk::ImageAspectFlags::COLOR, 1)?;
            this.image_views.push(view);
        }

        log::info!("Created swapchain with {} images", this.image_views.len());
        Ok(this)
    }

    /// Raw swapchain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Swapchain extension functions
    pub fn loader(&self) -> &SwapchainLoader {
        &self.loader
    }

    /// One color view per swapchain image
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    /// Color format of the images
    pub fn format(&self) -> vk::Format {
        self.format.format
    }

    /// Image size in pixels
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
        log::debug!("Destroyed swapchain");
    }
}
