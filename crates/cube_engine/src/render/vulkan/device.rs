//! Physical device selection and the logical device
//!
//! Selection is split into a pure part ([`DeviceCandidate`], [`score_device`],
//! [`select_device`]) and the queries that fill candidates in from the driver.

use std::ffi::CStr;

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device, Instance};

use crate::render::vulkan::context::{VulkanError, VulkanResult, WindowSurface};

/// Score bonus for discrete GPUs
pub const DISCRETE_GPU_BONUS: u32 = 1000;

/// Everything device selection looks at, gathered up front
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCandidate {
    /// Device name as reported by the driver
    pub name: String,
    /// Discrete, integrated, virtual or CPU
    pub device_type: vk::PhysicalDeviceType,
    /// Largest supported 2D image side
    pub max_image_dimension_2d: u32,
    /// Geometry shader feature
    pub geometry_shader: bool,
    /// `VK_KHR_swapchain` is available
    pub swapchain_extension: bool,
    /// Surface formats offered for the window
    pub surface_format_count: usize,
    /// Present modes offered for the window
    pub present_mode_count: usize,
    /// First queue family that can both draw and present
    pub queue_family: Option<u32>,
}

/// Rate a candidate; zero means unusable.
pub fn score_device(candidate: &DeviceCandidate) -> u32 {
    if !candidate.geometry_shader
        || candidate.surface_format_count == 0
        || candidate.present_mode_count == 0
        || !candidate.swapchain_extension
        || candidate.queue_family.is_none()
    {
        return 0;
    }

    let mut score = 0;
    if candidate.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
        score += DISCRETE_GPU_BONUS;
    }
    score + candidate.max_image_dimension_2d
}

/// Index of the best-scoring candidate.
///
/// Ties go to the earlier candidate. Fails with [`VulkanError::NoGpu`] on an empty
/// list and [`VulkanError::NoSuitableDevice`] when every score is zero.
pub fn select_device(candidates: &[DeviceCandidate]) -> VulkanResult<usize> {
    if candidates.is_empty() {
        return Err(VulkanError::NoGpu);
    }

    let mut best = None;
    let mut max_score = 0;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = score_device(candidate);
        log::debug!("GPU {} '{}' scored {}", index, candidate.name, score);
        if score > max_score {
            best = Some(index);
            max_score = score;
        }
    }
    best.ok_or(VulkanError::NoSuitableDevice)
}

/// The physical device chosen for rendering
#[derive(Debug, Clone)]
pub struct PhysicalDeviceInfo {
    /// Raw physical device
    pub device: vk::PhysicalDevice,
    /// Device name as reported by the driver
    pub name: String,
    /// Limits and device type
    pub properties: vk::PhysicalDeviceProperties,
    /// Supported features, checked before enabling anisotropy
    pub features: vk::PhysicalDeviceFeatures,
    /// Queue family used for both graphics and presentation
    pub queue_family: u32,
}

impl PhysicalDeviceInfo {
    /// Enumerate devices and keep the best one for `surface`
    pub fn select(instance: &Instance, surface: &WindowSurface) -> VulkanResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices().map_err(VulkanError::Api)? };

        let candidates = devices
            .iter()
            .map(|&device| Self::describe(instance, device, surface))
            .collect::<Vec<_>>();

        let index = select_device(&candidates).map_err(|e| {
            log::error!("{}", e);
            e
        })?;
        let candidate = &candidates[index];
        let queue_family = candidate.queue_family.ok_or(VulkanError::NoSuitableDevice)?;
        let device = devices[index];

        log::info!("Selected GPU: {}", candidate.name);
        Ok(Self {
            device,
            name: candidate.name.clone(),
            properties: unsafe { instance.get_physical_device_properties(device) },
            features: unsafe { instance.get_physical_device_features(device) },
            queue_family,
        })
    }

    fn describe(instance: &Instance, device: vk::PhysicalDevice, surface: &WindowSurface) -> DeviceCandidate {
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let features = unsafe { instance.get_physical_device_features(device) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        DeviceCandidate {
            name,
            device_type: properties.device_type,
            max_image_dimension_2d: properties.limits.max_image_dimension2_d,
            geometry_shader: features.geometry_shader == vk::TRUE,
            swapchain_extension: Self::supports_swapchain(instance, device),
            surface_format_count: surface.formats(device).map(|f| f.len()).unwrap_or(0),
            present_mode_count: surface.present_modes(device).map(|m| m.len()).unwrap_or(0),
            queue_family: Self::find_queue_family(instance, device, surface),
        }
    }

    fn supports_swapchain(instance: &Instance, device: vk::PhysicalDevice) -> bool {
        let extensions = match unsafe { instance.enumerate_device_extension_properties(device) } {
            Ok(extensions) => extensions,
            Err(_) => return false,
        };
        extensions.iter().any(|available| {
            let name = unsafe { CStr::from_ptr(available.extension_name.as_ptr()) };
            name == SwapchainLoader::name()
        })
    }

    fn find_queue_family(instance: &Instance, device: vk::PhysicalDevice, surface: &WindowSurface) -> Option<u32> {
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
        families
            .iter()
            .enumerate()
            .find(|(index, family)| {
                family.queue_count > 0
                    && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                    && surface.supports_present(device, *index as u32)
            })
            .map(|(index, _)| index as u32)
    }

    /// Whether the sampler may use anisotropic filtering
    pub fn supports_anisotropy(&self) -> bool {
        self.features.sampler_anisotropy == vk::TRUE
    }

    /// Memory heaps and types of the device
    pub fn memory_properties(&self, instance: &Instance) -> vk::PhysicalDeviceMemoryProperties {
        unsafe { instance.get_physical_device_memory_properties(self.device) }
    }
}

/// Logical device with its single graphics/present queue
pub struct LogicalDevice {
    /// Logical device functions
    pub device: Device,
    /// Queue for draw and transfer submits
    pub graphics_queue: vk::Queue,
    /// Queue for presentation
    pub present_queue: vk::Queue,
    /// Family serving both graphics and present
    pub queue_family: u32,
    /// Swapchain extension functions
    pub swapchain_loader: SwapchainLoader,
    /// Sampler anisotropy was enabled at creation
    pub anisotropy_enabled: bool,
}

impl LogicalDevice {
    /// Create the device with one queue and the swapchain extension
    pub fn new(instance: &Instance, physical: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let priorities = [1.0];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(physical.queue_family)
            .queue_priorities(&priorities)
            .build()];

        let required_extensions = [SwapchainLoader::name().as_ptr()];

        let anisotropy_enabled = physical.supports_anisotropy();
        if !anisotropy_enabled {
            log::warn!("Anisotropic filtering not supported by {}", physical.name);
        }
        let device_features = vk::PhysicalDeviceFeatures::builder()
            .geometry_shader(true)
            .sampler_anisotropy(anisotropy_enabled)
            .build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe {
            instance.create_device(physical.device, &create_info, None).map_err(|e| {
                log::error!("Could not create logical device.");
                VulkanError::Api(e)
            })?
        };

        // One family serves both roles, so both handles name the same queue
        let graphics_queue = unsafe { device.get_device_queue(physical.queue_family, 0) };
        let present_queue = unsafe { device.get_device_queue(physical.queue_family, 0) };
        let swapchain_loader = SwapchainLoader::new(instance, &device);

        log::debug!("Created logical device on queue family {}", physical.queue_family);
        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            queue_family: physical.queue_family,
            swapchain_loader,
            anisotropy_enabled,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
        log::debug!("Destroyed logical device");
    }
}
