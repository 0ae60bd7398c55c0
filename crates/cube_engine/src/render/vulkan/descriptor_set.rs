//! Descriptor set layout, pool and the cube's single descriptor set
//!
//! | binding | contents                    | stages   |
//! |---------|-----------------------------|----------|
//! | 0       | model/view/projection UBO   | vertex   |
//! | 1       | diffuse + normal array      | fragment |
//! | 2       | lighting UBO                | both     |

use ash::{vk, Device};

use crate::render::vulkan::context::{VulkanError, VulkanResult};

/// Transform block
pub const MVP_BINDING: u32 = 0;
/// Diffuse/normal array sampler
pub const TEXTURE_BINDING: u32 = 1;
/// Lighting block
pub const SCENE_BINDING: u32 = 2;

/// Collects bindings for a descriptor set layout
#[derive(Default)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single uniform buffer at `binding`
    pub fn add_uniform_buffer(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add(binding, vk::DescriptorType::UNIFORM_BUFFER, stage_flags)
    }

    /// Add a single combined image sampler at `binding`
    pub fn add_combined_image_sampler(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add(binding, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, stage_flags)
    }

    fn add(mut self, binding: u32, ty: vk::DescriptorType, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(ty)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Pool sizes holding exactly one set of this layout
    pub fn pool_sizes(&self) -> Vec<vk::DescriptorPoolSize> {
        let mut sizes: Vec<vk::DescriptorPoolSize> = Vec::new();
        for binding in &self.bindings {
            match sizes.iter_mut().find(|size| size.ty == binding.descriptor_type) {
                Some(size) => size.descriptor_count += binding.descriptor_count,
                None => sizes.push(vk::DescriptorPoolSize {
                    ty: binding.descriptor_type,
                    descriptor_count: binding.descriptor_count,
                }),
            }
        }
        sizes
    }

    /// Bindings added so far
    pub fn bindings(&self) -> &[vk::DescriptorSetLayoutBinding] {
        &self.bindings
    }

    /// Create the layout; the pool sizes travel with it
    pub fn build(self, device: &Device) -> VulkanResult<DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);

        let layout = unsafe {
            device.create_descriptor_set_layout(&layout_info, None).map_err(|e| {
                log::error!("Failed to create descriptor set layout.");
                VulkanError::Api(e)
            })?
        };

        Ok(DescriptorSetLayout {
            layout,
            device: device.clone(),
            pool_sizes: self.pool_sizes(),
        })
    }
}

/// Layout of the cube's descriptor set
pub fn cube_layout() -> DescriptorSetLayoutBuilder {
    DescriptorSetLayoutBuilder::new()
        .add_uniform_buffer(MVP_BINDING, vk::ShaderStageFlags::VERTEX)
        .add_combined_image_sampler(TEXTURE_BINDING, vk::ShaderStageFlags::FRAGMENT)
        .add_uniform_buffer(SCENE_BINDING, vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
}

/// Descriptor set layout wrapper with RAII cleanup
pub struct DescriptorSetLayout {
    layout: vk::DescriptorSetLayout,
    device: Device,
    pool_sizes: Vec<vk::DescriptorPoolSize>,
}

impl DescriptorSetLayout {
    /// Raw layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    /// Descriptor counts a pool needs for one set of this layout
    pub fn pool_sizes(&self) -> &[vk::DescriptorPoolSize] {
        &self.pool_sizes
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Descriptor pool; its sets are released with it
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    device: Device,
}

impl DescriptorPool {
    /// Pool with room for `max_sets` sets drawn from `pool_sizes`
    pub fn new(device: &Device, pool_sizes: &[vk::DescriptorPoolSize], max_sets: u32) -> VulkanResult<Self> {
        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe {
            device.create_descriptor_pool(&pool_info, None).map_err(|e| {
                log::error!("Failed to create descriptor pool.");
                VulkanError::Api(e)
            })?
        };

        Ok(Self {
            pool,
            device: device.clone(),
        })
    }

    /// Allocate one set of `layout`
    pub fn allocate(&self, layout: &DescriptorSetLayout) -> VulkanResult<vk::DescriptorSet> {
        let layouts = [layout.handle()];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);

        let sets = unsafe {
            self.device.allocate_descriptor_sets(&alloc_info).map_err(|e| {
                log::error!("Failed to allocate descriptor set.");
                VulkanError::Api(e)
            })?
        };
        sets.into_iter().next().ok_or_else(|| {
            log::error!("Failed to allocate descriptor set.");
            VulkanError::InitializationFailed("Descriptor pool returned no sets".to_string())
        })
    }

    /// Raw pool handle
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Resources bound into the cube's descriptor set
pub struct CubeBindings {
    /// Transform block buffer
    pub mvp: vk::DescriptorBufferInfo,
    /// Sampler and texture view
    pub texture: vk::DescriptorImageInfo,
    /// Lighting block buffer
    pub scene: vk::DescriptorBufferInfo,
}

/// Point every binding of `set` at its resource
pub fn write_cube_set(device: &Device, set: vk::DescriptorSet, bindings: &CubeBindings) {
    let mvp = [bindings.mvp];
    let texture = [bindings.texture];
    let scene = [bindings.scene];

    let writes = [
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(MVP_BINDING)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&mvp)
            .build(),
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(TEXTURE_BINDING)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&texture)
            .build(),
        vk::WriteDescriptorSet::builder()
            .dst_set(set)
            .dst_binding(SCENE_BINDING)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&scene)
            .build(),
    ];

    unsafe {
        device.update_descriptor_sets(&writes, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_pool_sizes() {
        let sizes = cube_layout().pool_sizes();
        let count = |ty| {
            sizes
                .iter()
                .find(|size| size.ty == ty)
                .map(|size| size.descriptor_count)
        };
        assert_eq!(sizes.len(), 2);
        assert_eq!(count(vk::DescriptorType::UNIFORM_BUFFER), Some(2));
        assert_eq!(count(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), Some(1));
    }

    #[test]
    fn test_cube_bindings() {
        let layout = cube_layout();
        let bindings = layout.bindings();
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].binding, MVP_BINDING);
        assert_eq!(bindings[0].stage_flags, vk::ShaderStageFlags::VERTEX);
        assert_eq!(bindings[1].descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(bindings[2].binding, SCENE_BINDING);
    }
}
