use ash::vk;
use cube_engine::render::vulkan::device::{score_device, select_device, DeviceCandidate, DISCRETE_GPU_BONUS};
use cube_engine::render::vulkan::VulkanError;

fn gpu(name: &str, device_type: vk::PhysicalDeviceType) -> DeviceCandidate {
    DeviceCandidate {
        name: name.to_string(),
        device_type,
        max_image_dimension_2d: 8192,
        geometry_shader: true,
        swapchain_extension: true,
        surface_format_count: 1,
        present_mode_count: 1,
        queue_family: Some(0),
    }
}

#[test]
fn integrated_beats_disqualified_discrete() {
    let no_geometry = DeviceCandidate {
        geometry_shader: false,
        ..gpu("discrete", vk::PhysicalDeviceType::DISCRETE_GPU)
    };
    let integrated = gpu("integrated", vk::PhysicalDeviceType::INTEGRATED_GPU);

    assert_eq!(score_device(&no_geometry), 0);
    assert!(score_device(&integrated) > 0);
    assert_eq!(select_device(&[no_geometry, integrated]).unwrap(), 1);
}

#[test]
fn discrete_preferred_over_larger_integrated() {
    let discrete = gpu("discrete", vk::PhysicalDeviceType::DISCRETE_GPU);
    let integrated = DeviceCandidate {
        max_image_dimension_2d: 8192 + DISCRETE_GPU_BONUS - 1,
        ..gpu("integrated", vk::PhysicalDeviceType::INTEGRATED_GPU)
    };
    assert_eq!(select_device(&[integrated, discrete]).unwrap(), 1);
}

#[test]
fn all_disqualified_is_no_suitable_device() {
    let candidates = [
        DeviceCandidate {
            queue_family: None,
            ..gpu("a", vk::PhysicalDeviceType::DISCRETE_GPU)
        },
        DeviceCandidate {
            swapchain_extension: false,
            ..gpu("b", vk::PhysicalDeviceType::INTEGRATED_GPU)
        },
    ];
    let result = select_device(&candidates);
    assert!(matches!(result, Err(VulkanError::NoSuitableDevice)));
    assert_eq!(result.unwrap_err().to_string(), "Failed to find a suitable GPU.");
}
