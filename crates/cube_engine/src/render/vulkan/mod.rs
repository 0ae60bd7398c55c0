//! Vulkan backend
//!
//! RAII wrappers over ash, one per kind of Vulkan object, assembled by
//! [`DeviceContext`].

pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptor_set;
pub mod device;
pub mod framebuffer;
pub mod image;
pub mod render_pass;
pub mod renderer;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex_layout;
pub mod window;

pub use buffer::{Buffer, UniformBuffer};
pub use commands::CommandPool;
pub use context::{VulkanError, VulkanInstance, VulkanResult, WindowSurface};
pub use device::{select_device, DeviceCandidate, LogicalDevice, PhysicalDeviceInfo};
pub use renderer::DeviceContext;
pub use swapchain::Swapchain;
pub use window::{Window, WindowError, WindowResult, WindowSettings};
