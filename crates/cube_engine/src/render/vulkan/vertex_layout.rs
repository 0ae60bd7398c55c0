//! Vertex input layout for the cube [`Vertex`]

use std::mem;

use ash::vk;

use crate::scene::geometry::Vertex;

/// Vertex input description for the engine's [`Vertex`] type
pub struct VulkanVertexLayout;

impl VulkanVertexLayout {
    /// One per-vertex binding at index 0
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Position, tangent, bitangent and normal at locations 0-3, texture coordinate at 4
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 5] {
        const VEC3: usize = mem::size_of::<[f32; 3]>();
        let vec3 = |location: u32, offset: usize| vk::VertexInputAttributeDescription {
            binding: 0,
            location,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: offset as u32,
        };
        [
            vec3(0, 0),
            vec3(1, VEC3),
            vec3(2, 2 * VEC3),
            vec3(3, 3 * VEC3),
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 4,
                format: vk::Format::R32G32_SFLOAT,
                offset: (4 * VEC3) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_and_offsets() {
        let binding = VulkanVertexLayout::binding_description();
        assert_eq!(binding.stride, 56);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);

        let offsets: Vec<u32> = VulkanVertexLayout::attribute_descriptions()
            .iter()
            .map(|a| a.offset)
            .collect();
        assert_eq!(offsets, vec![0, 12, 24, 36, 48]);
    }

    #[test]
    fn test_locations_and_formats() {
        let attributes = VulkanVertexLayout::attribute_descriptions();
        for (i, attribute) in attributes.iter().enumerate() {
            assert_eq!(attribute.location, i as u32);
            assert_eq!(attribute.binding, 0);
        }
        assert_eq!(attributes[3].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attributes[4].format, vk::Format::R32G32_SFLOAT);
    }
}
