//! Images, image views and layout transitions

use ash::{vk, Device};

use crate::render::vulkan::buffer::{find_memory_type, Buffer, TransferContext};
use crate::render::vulkan::context::{VulkanError, VulkanResult};

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// First of `candidates` whose `tiling` features include all of `features`
pub fn find_supported_format(
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
    format_properties: impl Fn(vk::Format) -> vk::FormatProperties,
) -> VulkanResult<vk::Format> {
    candidates
        .iter()
        .copied()
        .find(|&format| {
            let props = format_properties(format);
            match tiling {
                vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
                vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
                _ => false,
            }
        })
        .ok_or_else(|| {
            log::error!("Failed to find a supported format.");
            VulkanError::UnsupportedFormat(candidates.to_vec())
        })
}

/// Best depth format usable as an optimally tiled depth attachment
pub fn pick_depth_format(format_properties: impl Fn(vk::Format) -> vk::FormatProperties) -> VulkanResult<vk::Format> {
    find_supported_format(
        &DEPTH_FORMAT_CANDIDATES,
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        format_properties,
    )
}

/// Whether `format` carries a stencil component
pub fn has_stencil(format: vk::Format) -> bool {
    format == vk::Format::D32_SFLOAT_S8_UINT || format == vk::Format::D24_UNORM_S8_UINT
}

/// Access masks and stages for one supported layout transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionMasks {
    /// Access before the barrier
    pub src_access: vk::AccessFlags,
    /// Access after the barrier
    pub dst_access: vk::AccessFlags,
    /// Stages to wait on
    pub src_stage: vk::PipelineStageFlags,
    /// Stages that wait
    pub dst_stage: vk::PipelineStageFlags,
}

/// Barrier masks for `old` -> `new`; any pair not listed is an error.
pub fn transition_masks(old: vk::ImageLayout, new: vk::ImageLayout) -> VulkanResult<TransitionMasks> {
    use vk::AccessFlags as A;
    use vk::ImageLayout as L;
    use vk::PipelineStageFlags as S;

    let (src_access, dst_access, src_stage, dst_stage) = match (old, new) {
        (L::PREINITIALIZED, L::TRANSFER_SRC_OPTIMAL) => (A::HOST_WRITE, A::TRANSFER_READ, S::HOST, S::TRANSFER),
        (L::PREINITIALIZED, L::TRANSFER_DST_OPTIMAL) => (A::HOST_WRITE, A::TRANSFER_WRITE, S::HOST, S::TRANSFER),
        (L::UNDEFINED, L::TRANSFER_DST_OPTIMAL) => (A::empty(), A::TRANSFER_WRITE, S::TOP_OF_PIPE, S::TRANSFER),
        (L::TRANSFER_DST_OPTIMAL, L::SHADER_READ_ONLY_OPTIMAL) => {
            (A::TRANSFER_WRITE, A::SHADER_READ, S::TRANSFER, S::FRAGMENT_SHADER)
        }
        (L::UNDEFINED, L::DEPTH_STENCIL_ATTACHMENT_OPTIMAL) => (
            A::empty(),
            A::DEPTH_STENCIL_ATTACHMENT_READ | A::DEPTH_STENCIL_ATTACHMENT_WRITE,
            S::TOP_OF_PIPE,
            S::EARLY_FRAGMENT_TESTS,
        ),
        _ => {
            log::error!("Unsupported layout transition.");
            return Err(VulkanError::UnsupportedLayoutTransition { old, new });
        }
    };

    Ok(TransitionMasks {
        src_access,
        dst_access,
        src_stage,
        dst_stage,
    })
}

/// Aspect a barrier into `new` has to name for an image of `format`
pub fn transition_aspect(new: vk::ImageLayout, format: vk::Format) -> vk::ImageAspectFlags {
    if new == vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL {
        if has_stencil(format) {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        } else {
            vk::ImageAspectFlags::DEPTH
        }
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// One copy region per array layer, each layer `width * height * 4` bytes after the last
pub fn layer_copy_regions(width: u32, height: u32, layers: u32) -> Vec<vk::BufferImageCopy> {
    let layer_size = width as vk::DeviceSize * height as vk::DeviceSize * 4;
    (0..layers)
        .map(|layer| vk::BufferImageCopy {
            buffer_offset: layer as vk::DeviceSize * layer_size,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: layer,
                layer_count: 1,
            },
            image_offset: vk::Offset3D::default(),
            image_extent: vk::Extent3D { width, height, depth: 1 },
        })
        .collect()
}

/// Create a view over `layer_count` layers; more than one layer gives an array view
pub fn create_image_view(
    device: &Device,
    image: vk::Image,
    format: vk::Format,
    aspect_mask: vk::ImageAspectFlags,
    layer_count: u32,
) -> VulkanResult<vk::ImageView> {
    let view_type = if layer_count > 1 {
        vk::ImageViewType::TYPE_2D_ARRAY
    } else {
        vk::ImageViewType::TYPE_2D
    };
    let create_info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(view_type)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count,
        });

    unsafe {
        device.create_image_view(&create_info, None).map_err(|e| {
            log::error!("Failed to create image view.");
            VulkanError::Api(e)
        })
    }
}

/// Settings for [`Image::new`]
#[derive(Debug, Clone, Copy)]
pub struct ImageDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Array layer count
    pub layers: u32,
    /// Texel format
    pub format: vk::Format,
    /// Usage flags
    pub usage: vk::ImageUsageFlags,
    /// `UNDEFINED` or `PREINITIALIZED`
    pub initial_layout: vk::ImageLayout,
}

/// Device-local 2D image with its memory and, once created, a view
pub struct Image {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    desc: ImageDesc,
}

impl Image {
    /// Create an optimally tiled single-mip image in device-local memory
    pub fn new(
        device: &Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        desc: ImageDesc,
    ) -> VulkanResult<Self> {
        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: desc.width,
                height: desc.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(desc.layers)
            .format(desc.format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(desc.initial_layout)
            .usage(desc.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe {
            device.create_image(&image_info, None).map_err(|e| {
                log::error!("Failed to create image.");
                VulkanError::Api(e)
            })?
        };

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory = find_memory_type(
            memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )
        .and_then(|index| {
            let alloc_info = vk::MemoryAllocateInfo::builder()
                .allocation_size(requirements.size)
                .memory_type_index(index);
            unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::Api) }
        });
        let memory = match memory {
            Ok(memory) => memory,
            Err(e) => {
                log::error!("Failed to allocate image memory.");
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        let this = Self {
            device: device.clone(),
            image,
            memory,
            view: vk::ImageView::null(),
            desc,
        };
        unsafe {
            device.bind_image_memory(image, memory, 0).map_err(VulkanError::Api)?;
        }
        Ok(this)
    }

    /// Create the view covering every layer
    pub fn create_view(&mut self, aspect_mask: vk::ImageAspectFlags) -> VulkanResult<()> {
        self.view = create_image_view(&self.device, self.image, self.desc.format, aspect_mask, self.desc.layers)?;
        Ok(())
    }

    /// Record and run a barrier moving every layer from `old` to `new`
    pub fn transition_layout(
        &self,
        transfer: &TransferContext<'_>,
        old: vk::ImageLayout,
        new: vk::ImageLayout,
    ) -> VulkanResult<()> {
        let masks = transition_masks(old, new)?;
        log::debug!("Transitioning image {:?} -> {:?}", old, new);

        let barrier = vk::ImageMemoryBarrier::builder()
            .old_layout(old)
            .new_layout(new)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: transition_aspect(new, self.desc.format),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: self.desc.layers,
            })
            .src_access_mask(masks.src_access)
            .dst_access_mask(masks.dst_access)
            .build();

        let commands = transfer.pool.begin_single_time()?;
        unsafe {
            transfer.device.cmd_pipeline_barrier(
                commands.handle(),
                masks.src_stage,
                masks.dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
        commands.submit_and_wait(transfer.queue)
    }

    /// Copy tightly packed RGBA layers from `buffer`; the image must be in `TRANSFER_DST_OPTIMAL`
    pub fn copy_from_buffer(&self, transfer: &TransferContext<'_>, buffer: &Buffer) -> VulkanResult<()> {
        let regions = layer_copy_regions(self.desc.width, self.desc.height, self.desc.layers);
        let commands = transfer.pool.begin_single_time()?;
        unsafe {
            transfer.device.cmd_copy_buffer_to_image(
                commands.handle(),
                buffer.handle(),
                self.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &regions,
            );
        }
        commands.submit_and_wait(transfer.queue)
    }

    /// View created by [`Image::create_view`], null before that
    pub fn view(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.device.destroy_image_view(self.view, None);
            }
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Depth attachment sized to the swapchain, already in its attachment layout
pub fn create_depth_image(transfer: &TransferContext<'_>, extent: vk::Extent2D, format: vk::Format) -> VulkanResult<Image> {
    let mut image = Image::new(
        transfer.device,
        transfer.memory_properties,
        ImageDesc {
            width: extent.width,
            height: extent.height,
            layers: 1,
            format,
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            initial_layout: vk::ImageLayout::UNDEFINED,
        },
    )?;
    image.create_view(vk::ImageAspectFlags::DEPTH)?;
    image.transition_layout(
        transfer,
        vk::ImageLayout::UNDEFINED,
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    )?;
    log::debug!("Created {:?} depth buffer {}x{}", format, extent.width, extent.height);
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth_support(supported: &'static [vk::Format]) -> impl Fn(vk::Format) -> vk::FormatProperties {
        move |format| {
            let mut props = vk::FormatProperties::default();
            if supported.contains(&format) {
                props.optimal_tiling_features = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
            }
            props
        }
    }

    #[test]
    fn test_depth_format_prefers_precision() {
        let all = depth_support(&[vk::Format::D24_UNORM_S8_UINT, vk::Format::D32_SFLOAT_S8_UINT, vk::Format::D32_SFLOAT]);
        assert_eq!(pick_depth_format(all).unwrap(), vk::Format::D32_SFLOAT);

        let stencil_only = depth_support(&[vk::Format::D24_UNORM_S8_UINT]);
        assert_eq!(pick_depth_format(stencil_only).unwrap(), vk::Format::D24_UNORM_S8_UINT);
    }

    #[test]
    fn test_depth_format_needs_optimal_tiling() {
        let linear_only = |_| vk::FormatProperties {
            linear_tiling_features: vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            ..Default::default()
        };
        assert!(matches!(pick_depth_format(linear_only), Err(VulkanError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_stencil_formats() {
        assert!(!has_stencil(vk::Format::D32_SFLOAT));
        assert!(has_stencil(vk::Format::D32_SFLOAT_S8_UINT));
        assert!(has_stencil(vk::Format::D24_UNORM_S8_UINT));

        assert_eq!(
            transition_aspect(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL, vk::Format::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(
            transition_aspect(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::Format::R8G8B8A8_UNORM),
            vk::ImageAspectFlags::COLOR
        );
    }

    #[test]
    fn test_texture_upload_transitions() {
        let to_dst = transition_masks(vk::ImageLayout::PREINITIALIZED, vk::ImageLayout::TRANSFER_DST_OPTIMAL).unwrap();
        assert_eq!(to_dst.src_access, vk::AccessFlags::HOST_WRITE);
        assert_eq!(to_dst.dst_access, vk::AccessFlags::TRANSFER_WRITE);

        let undefined = transition_masks(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL).unwrap();
        assert_eq!(undefined.src_access, vk::AccessFlags::empty());

        let to_read =
            transition_masks(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL).unwrap();
        assert_eq!(to_read.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(to_read.dst_access, vk::AccessFlags::SHADER_READ);
    }

    #[test]
    fn test_unsupported_transition() {
        let result = transition_masks(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        assert!(matches!(
            result,
            Err(VulkanError::UnsupportedLayoutTransition {
                old: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                new: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            })
        ));
    }

    #[test]
    fn test_layer_copy_regions() {
        let regions = layer_copy_regions(4, 2, 2);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].buffer_offset, 0);
        assert_eq!(regions[1].buffer_offset, 32);
        assert_eq!(regions[1].image_subresource.base_array_layer, 1);
        assert_eq!(regions[1].image_subresource.layer_count, 1);
        assert_eq!(regions[0].image_extent.width, 4);
        assert_eq!(regions[0].image_extent.height, 2);
    }
}
