//! Static cube mesh
//!
//! 24 vertices with a full tangent frame per face and 36 indices drawn as a
//! triangle list with counter-clockwise front faces.

/// Vertex with position, tangent frame and texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in model space
    pub pos: [f32; 3],
    /// Tangent (texture u direction)
    pub tangent: [f32; 3],
    /// Bitangent (texture v direction)
    pub bitangent: [f32; 3],
    /// Surface normal
    pub normal: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    const fn new(
        pos: [f32; 3],
        tangent: [f32; 3],
        bitangent: [f32; 3],
        normal: [f32; 3],
        tex_coord: [f32; 2],
    ) -> Self {
        Self {
            pos,
            tangent,
            bitangent,
            normal,
            tex_coord,
        }
    }
}

/// Cube vertices
pub const CUBE_VERTICES: [Vertex; 24] = [
    Vertex::new([0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [1.0, 0.0]),
    Vertex::new([-0.5, -0.5, -0.5], [0.0, 0.0, 1.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 1.0]),
    Vertex::new([0.5, -0.5, -0.5], [0.0, 0.0, 1.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0]),
    Vertex::new([-0.5, 0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
    Vertex::new([0.5, 0.5, 0.5], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 1.0]),
    Vertex::new([0.5, 0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
    Vertex::new([0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 0.0]),
    Vertex::new([0.5, -0.5, 0.5], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0]),
    Vertex::new([0.5, -0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
    Vertex::new([0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
    Vertex::new([-0.5, -0.5, 0.5], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
    Vertex::new([0.5, -0.5, 0.5], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
    Vertex::new([-0.5, -0.5, 0.5], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 0.0]),
    Vertex::new([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [1.0, 1.0]),
    Vertex::new([-0.5, -0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    Vertex::new([0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0]),
    Vertex::new([-0.5, 0.5, -0.5], [0.0, -1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0]),
    Vertex::new([0.5, 0.5, -0.5], [0.0, -1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
    Vertex::new([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [1.0, 1.0]),
    Vertex::new([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 1.0]),
    Vertex::new([0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0]),
    Vertex::new([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
    Vertex::new([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    Vertex::new([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
];

/// Cube indices, two triangles per face
pub const CUBE_INDICES: [u16; 36] = [
    0, 1, 2, //
    3, 4, 5, //
    6, 7, 8, //
    9, 10, 11, //
    12, 13, 14, //
    15, 16, 17, //
    0, 18, 1, //
    3, 19, 4, //
    6, 20, 7, //
    9, 21, 10, //
    12, 22, 13, //
    15, 23, 16,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    #[test]
    fn test_vertex_stride() {
        assert_eq!(std::mem::size_of::<Vertex>(), 14 * 4);
    }

    #[test]
    fn test_indices_in_range() {
        assert!(CUBE_INDICES.iter().all(|&i| (i as usize) < CUBE_VERTICES.len()));
    }

    #[test]
    fn test_tangent_frames_are_orthonormal() {
        for v in &CUBE_VERTICES {
            assert_eq!(dot(v.tangent, v.normal), 0.0);
            assert_eq!(dot(v.bitangent, v.normal), 0.0);
            assert_eq!(dot(v.tangent, v.bitangent), 0.0);
            assert_eq!(dot(v.normal, v.normal), 1.0);
        }
    }

    #[test]
    fn test_faces_lie_on_normal_plane() {
        for tri in CUBE_INDICES.chunks(3) {
            let n = CUBE_VERTICES[tri[0] as usize].normal;
            let plane = dot(CUBE_VERTICES[tri[0] as usize].pos, n);
            assert_eq!(plane, 0.5);
            for &i in tri {
                assert_eq!(CUBE_VERTICES[i as usize].normal, n);
                assert_eq!(dot(CUBE_VERTICES[i as usize].pos, n), plane);
            }
        }
    }
}
