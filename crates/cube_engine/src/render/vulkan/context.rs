//! Vulkan instance and surface
//!
//! Also home of [`VulkanError`], the error type every setup step returns.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::Surface;
use ash::{vk, Entry, Instance};
use thiserror::Error;

use crate::assets::TextureError;
use crate::render::vulkan::window::{Window, WindowError};

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";
const ENGINE_NAME: &str = "No Engine";

/// Vulkan setup and rendering errors
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// The Vulkan loader could not be opened
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// Instance reports no physical devices
    #[error("No GPUs with Vulkan support found.")]
    NoGpu,

    /// Every device scored zero
    #[error("Failed to find a suitable GPU.")]
    NoSuitableDevice,

    /// No candidate format has the required features
    #[error("Failed to find a supported format among {0:?}.")]
    UnsupportedFormat(Vec<vk::Format>),

    /// Layout pair without known access masks
    #[error("Unsupported layout transition: {old:?} -> {new:?}")]
    UnsupportedLayoutTransition {
        /// Current layout
        old: vk::ImageLayout,
        /// Requested layout
        new: vk::ImageLayout,
    },

    /// No memory type matches the requirements
    #[error("Failed to find suitable memory type.")]
    NoSuitableMemoryType,

    /// A setup step failed for a reason other than an API result
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No search path held the file
    #[error("Failed to locate file: {0}")]
    AssetNotFound(String),

    /// Texture file error
    #[error(transparent)]
    Texture(#[from] TextureError),

    /// Windowing error
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

fn c_string(s: &str) -> VulkanResult<CString> {
    CString::new(s).map_err(|e| VulkanError::InitializationFailed(format!("Invalid name {:?}: {}", s, e)))
}

/// Vulkan instance with an optional validation messenger
pub struct VulkanInstance {
    /// Loaded Vulkan entry points
    pub entry: Entry,
    /// Instance-level functions
    pub instance: Instance,
    debug: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    /// Create an API 1.0 instance with the extensions the window system needs.
    ///
    /// Validation is skipped with a warning if the layer is not installed.
    pub fn new(window: &Window, app_name: &str, enable_validation: bool) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| VulkanError::Loading(e.to_string()))?;

        let app_name = c_string(app_name)?;
        let engine_name = c_string(ENGINE_NAME)?;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);

        let required = window.required_instance_extensions()?;
        let mut extension_names = required
            .iter()
            .map(|ext| c_string(ext))
            .collect::<VulkanResult<Vec<_>>>()?;

        let validation = enable_validation && Self::validation_layer_available(&entry);
        if enable_validation && !validation {
            log::warn!("{} requested but not available; continuing without it", VALIDATION_LAYER);
        }
        if validation {
            extension_names.push(DebugUtils::name().to_owned());
        }
        let extensions: Vec<*const c_char> = extension_names.iter().map(|ext| ext.as_ptr()).collect();

        let layer_names = if validation {
            vec![c_string(VALIDATION_LAYER)?]
        } else {
            Vec::new()
        };
        let layers: Vec<*const c_char> = layer_names.iter().map(|name| name.as_ptr()).collect();

        log::debug!("Instance extensions: {:?}", extension_names);
        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);

        let instance = unsafe {
            entry.create_instance(&create_info, None).map_err(|e| {
                log::error!("Could not create Vulkan instance.");
                VulkanError::Api(e)
            })?
        };

        let debug = if validation {
            let debug_utils = DebugUtils::new(&entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => Some((debug_utils, messenger)),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        log::info!("Created Vulkan instance (validation: {})", validation);
        Ok(Self { entry, instance, debug })
    }

    fn validation_layer_available(entry: &Entry) -> bool {
        let layers = match entry.enumerate_instance_layer_properties() {
            Ok(layers) => layers,
            Err(_) => return false,
        };
        layers.iter().any(|layer| {
            let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
            name.to_str() == Ok(VALIDATION_LAYER)
        })
    }

    fn setup_debug_messenger(debug_utils: &DebugUtils) -> VulkanResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::Api)
        }
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        log::debug!("Destroyed Vulkan instance");
    }
}

/// Forwards validation messages into the log
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        log::error!("[Vulkan] {:?} - {}", message_type, message);
    } else if message_severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        log::warn!("[Vulkan] {:?} - {}", message_type, message);
    } else {
        log::debug!("[Vulkan] {:?} - {}", message_type, message);
    }

    vk::FALSE
}

/// Presentation surface for the window
pub struct WindowSurface {
    loader: Surface,
    surface: vk::SurfaceKHR,
}

impl WindowSurface {
    /// Create a surface through GLFW
    pub fn new(instance: &VulkanInstance, window: &mut Window) -> VulkanResult<Self> {
        let loader = Surface::new(&instance.entry, &instance.instance);
        let surface = window.create_vulkan_surface(instance.instance.handle()).map_err(|e| {
            log::error!("Could not create Vulkan surface.");
            VulkanError::Window(e)
        })?;
        log::debug!("Created window surface");
        Ok(Self { loader, surface })
    }

    /// Raw surface handle
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Surface extension functions
    pub fn loader(&self) -> &Surface {
        &self.loader
    }

    /// Surface capabilities for `physical_device`
    pub fn capabilities(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map_err(VulkanError::Api)
        }
    }

    /// Surface formats supported by `physical_device`
    pub fn formats(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_formats(physical_device, self.surface)
                .map_err(VulkanError::Api)
        }
    }

    /// Present modes supported by `physical_device`
    pub fn present_modes(&self, physical_device: vk::PhysicalDevice) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
                .map_err(VulkanError::Api)
        }
    }

    /// Whether queue family `index` of `physical_device` can present here
    pub fn supports_present(&self, physical_device: vk::PhysicalDevice, index: u32) -> bool {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, index, self.surface)
                .unwrap_or(false)
        }
    }
}

impl Drop for WindowSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
        log::debug!("Destroyed window surface");
    }
}
