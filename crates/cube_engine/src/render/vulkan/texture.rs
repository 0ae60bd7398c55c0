//! The diffuse/normal texture array and its sampler

use ash::{vk, Device};

use crate::assets::texture::check_compatible;
use crate::assets::{SearchPaths, TextureData};
use crate::render::vulkan::buffer::TransferContext;
use crate::render::vulkan::context::{VulkanError, VulkanResult};
use crate::render::vulkan::image::{Image, ImageDesc};

/// Format of every texture layer
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;
/// Anisotropy used when the device supports it
pub const MAX_ANISOTROPY: f32 = 16.0;

/// Find and parse a `.tex` file through `paths`
pub fn load_texture(paths: &SearchPaths, name: &str) -> VulkanResult<TextureData> {
    let path = paths
        .find(name)
        .ok_or_else(|| VulkanError::AssetNotFound(name.to_string()))?;
    Ok(TextureData::load(path)?)
}

/// Concatenate same-sized layers into one staging blob, layer 0 first
pub fn pack_layers(layers: &[&TextureData]) -> Vec<u8> {
    let total = layers.iter().map(|layer| layer.size_bytes()).sum();
    let mut packed = Vec::with_capacity(total);
    for layer in layers {
        packed.extend_from_slice(&layer.pixels);
    }
    packed
}

/// Two-layer RGBA image: layer 0 diffuse, layer 1 normal map
pub struct TextureArray {
    image: Image,
}

impl TextureArray {
    /// Upload `diffuse` and `normal` through one staging buffer
    pub fn new(transfer: &TransferContext<'_>, diffuse: &TextureData, normal: &TextureData) -> VulkanResult<Self> {
        check_compatible(diffuse, normal)?;
        let layers = [diffuse, normal];

        let staging = transfer.staging_buffer(&pack_layers(&layers))?;
        let mut image = Image::new(
            transfer.device,
            transfer.memory_properties,
            ImageDesc {
                width: diffuse.width(),
                height: diffuse.height(),
                layers: layers.len() as u32,
                format: TEXTURE_FORMAT,
                usage: vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
                initial_layout: vk::ImageLayout::PREINITIALIZED,
            },
        )?;

        image.transition_layout(
            transfer,
            vk::ImageLayout::PREINITIALIZED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )?;
        image.copy_from_buffer(transfer, &staging)?;
        image.transition_layout(
            transfer,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )?;
        image.create_view(vk::ImageAspectFlags::COLOR)?;

        log::info!(
            "Uploaded {}x{} texture array with {} layers",
            diffuse.width(),
            diffuse.height(),
            layers.len()
        );
        Ok(Self { image })
    }

    /// View over both layers
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }
}

/// Sampler wrapper with RAII cleanup
pub struct Sampler {
    device: Device,
    sampler: vk::Sampler,
}

impl Sampler {
    /// Linear, repeating sampler; anisotropic only if the device feature was enabled
    pub fn new(device: &Device, anisotropy_enabled: bool) -> VulkanResult<Self> {
        let create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(anisotropy_enabled)
            .max_anisotropy(if anisotropy_enabled { MAX_ANISOTROPY } else { 1.0 })
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(0.0);

        let sampler = unsafe {
            device.create_sampler(&create_info, None).map_err(|e| {
                log::error!("Failed to create texture sampler.");
                VulkanError::Api(e)
            })?
        };

        Ok(Self {
            device: device.clone(),
            sampler,
        })
    }

    /// Raw sampler handle
    pub fn handle(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::texture::{TextureHeader, PIXEL_FORMAT_RGBA, PIXEL_TYPE_UNSIGNED_BYTE};

    fn solid(width: u32, height: u32, value: u8) -> TextureData {
        TextureData {
            header: TextureHeader {
                width,
                height,
                format: PIXEL_FORMAT_RGBA,
                pixel_type: PIXEL_TYPE_UNSIGNED_BYTE,
            },
            pixels: vec![value; (width * height * 4) as usize],
        }
    }

    #[test]
    fn test_layers_packed_in_order() {
        let diffuse = solid(2, 2, 1);
        let normal = solid(2, 2, 2);
        let packed = pack_layers(&[&diffuse, &normal]);

        assert_eq!(packed.len(), 32);
        assert!(packed[..16].iter().all(|&b| b == 1));
        assert!(packed[16..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_missing_texture() {
        let paths = SearchPaths::new(vec!["/nonexistent-texture-dir/".to_string()]);
        let result = load_texture(&paths, "brick.tex");
        assert!(matches!(result, Err(VulkanError::AssetNotFound(name)) if name == "brick.tex"));
    }
}
