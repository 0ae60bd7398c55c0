//! Math utilities and types
//!
//! `Mat4` is a flat, column-major 4x4 matrix: element `(row r, column c)` lives at
//! index `c * 4 + r`, which is the layout the shaders read from the uniform buffers.
//! All angles at this interface are in degrees.

use std::ops::{Index, IndexMut, Mul};

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Column-major 4x4 matrix stored as 16 contiguous floats
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4(pub [f32; 16]);

// SAFETY: `Mat4` is a transparent wrapper around `[f32; 16]`.
unsafe impl bytemuck::Pod for Mat4 {}
unsafe impl bytemuck::Zeroable for Mat4 {}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    /// Identity matrix
    pub const fn identity() -> Self {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Self(m)
    }

    /// Row `r` as `[m(r,0), m(r,1), m(r,2), m(r,3)]`.
    pub fn row(&self, r: usize) -> [f32; 4] {
        [self.0[r], self.0[4 + r], self.0[8 + r], self.0[12 + r]]
    }

    /// Column `c` as four contiguous elements.
    pub fn column(&self, c: usize) -> [f32; 4] {
        let start = c * 4;
        [self.0[start], self.0[start + 1], self.0[start + 2], self.0[start + 3]]
    }

    /// First three components of row `r`.
    pub fn row3(&self, r: usize) -> Vec3 {
        let row = self.row(r);
        Vec3::new(row[0], row[1], row[2])
    }

    /// Flat product: element `i * 4 + j` of the result is
    /// `sum_k self[i * 4 + k] * rhs[k * 4 + j]`.
    ///
    /// The result is accumulated into a fresh array, so `m = m.multiply(&m)` is safe.
    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        let mut tmp = [0.0f32; 16];
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    tmp[i * 4 + j] += self.0[i * 4 + k] * rhs.0[k * 4 + j];
                }
            }
        }
        Mat4(tmp)
    }

    /// Post-multiply by a translation of `(x, y, z)`.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        for r in 0..4 {
            self.0[12 + r] += self.0[r] * x + self.0[4 + r] * y + self.0[8 + r] * z;
        }
    }

    /// Compose with a rotation of `angle` degrees about `axis`.
    ///
    /// A zero-length axis leaves the matrix untouched.
    pub fn rotate(&mut self, angle: f32, axis: Vec3) {
        let mag = axis.norm();
        if mag <= 0.0 {
            return;
        }
        let (x, y, z) = (axis.x / mag, axis.y / mag, axis.z / mag);

        let (s, c) = utils::deg_to_rad(angle).sin_cos();
        let omc = 1.0 - c;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, yz, zx) = (x * y, y * z, z * x);
        let (xs, ys, zs) = (x * s, y * s, z * s);

        let mut rot = [0.0f32; 16];
        rot[0] = omc * xx + c;
        rot[1] = omc * xy - zs;
        rot[2] = omc * zx + ys;
        rot[4] = omc * xy + zs;
        rot[5] = omc * yy + c;
        rot[6] = omc * yz - xs;
        rot[8] = omc * zx - ys;
        rot[9] = omc * yz + xs;
        rot[10] = omc * zz + c;
        rot[15] = 1.0;

        *self = self.multiply(&Mat4(rot));
    }

    /// Scale the first three columns by `sx`, `sy` and `sz`.
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        for (c, factor) in [sx, sy, sz].into_iter().enumerate() {
            for value in &mut self.0[c * 4..c * 4 + 4] {
                *value *= factor;
            }
        }
    }

    /// Compose with a symmetric perspective frustum.
    ///
    /// Non-positive `near`/`far` or a degenerate frustum leave the matrix exactly as it was.
    pub fn perspective(&mut self, fov: f32, aspect: f32, near: f32, far: f32) {
        let top = (utils::deg_to_rad(fov) / 2.0).tan() * near;
        let right = top * aspect;
        let bottom = -top;
        let left = bottom * aspect;

        let dx = right - left;
        let dy = top - bottom;
        let dz = far - near;

        // Written as negated comparisons so NaN deltas are rejected too
        if !(near > 0.0 && far > 0.0 && dx > 0.0 && dy > 0.0 && dz > 0.0) {
            return;
        }

        let mut frust = [0.0f32; 16];
        frust[0] = 2.0 * near / dx;
        frust[5] = -2.0 * near / dy;
        frust[8] = (right + left) / dx;
        frust[9] = (top + bottom) / dy;
        frust[10] = -(near + far) / dz;
        frust[11] = -1.0;
        frust[14] = -2.0 * near * far / dz;

        *self = self.multiply(&Mat4(frust));
    }

    /// Right-handed view matrix looking from `eye` towards `center`.
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
        let forward = (center - eye).normalize();
        let side = forward.cross(&up).normalize();
        let new_up = side.cross(&forward);

        let mut m = Mat4::identity();
        m.set_basis(side, new_up, -forward);
        m.translate(-eye.x, -eye.y, -eye.z);
        m
    }

    /// View matrix built directly from a pitch/yaw orientation at `eye`.
    pub fn euler_view(eye: Vec3, pitch: f32, yaw: f32) -> Mat4 {
        let (sp, cp) = utils::deg_to_rad(pitch).sin_cos();
        let (sy, cy) = utils::deg_to_rad(yaw).sin_cos();

        let x_axis = Vec3::new(-cy, 0.0, sy);
        let y_axis = Vec3::new(sy * sp, -cp, cy * sp);
        let z_axis = Vec3::new(sy * cp, sp, cp * cy);

        let mut m = Mat4::identity();
        m.set_basis(x_axis, y_axis, z_axis);
        m.translate(-eye.x, -eye.y, -eye.z);
        m
    }

    /// Write `x`, `y`, `z` into rows 0..3 of the upper 3x3 block and reset
    /// everything else to identity.
    fn set_basis(&mut self, x: Vec3, y: Vec3, z: Vec3) {
        *self = Mat4([
            x.x, y.x, z.x, 0.0, //
            x.y, y.y, z.y, 0.0, //
            x.z, y.z, z.z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
    }
}

impl Index<usize> for Mat4 {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

impl IndexMut<usize> for Mat4 {
    fn index_mut(&mut self, index: usize) -> &mut f32 {
        &mut self.0[index]
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Mat4 {
        let mut m = [0.0f32; 16];
        for (i, v) in m.iter_mut().enumerate() {
            *v = (i as f32) * 0.5 - 3.0;
        }
        Mat4(m)
    }

    fn assert_mat_eq(a: &Mat4, b: &Mat4, eps: f32) {
        for i in 0..16 {
            assert_relative_eq!(a[i], b[i], epsilon = eps);
        }
    }

    #[test]
    fn test_identity_is_neutral() {
        let m = sample();
        assert_eq!(Mat4::identity().multiply(&m), m);
        assert_eq!(m.multiply(&Mat4::identity()), m);
    }

    #[test]
    fn test_multiply_matches_row_major_reading() {
        let a = sample();
        let mut b = sample();
        b.rotate(30.0, Vec3::new(1.0, 2.0, 3.0));

        let na = nalgebra::Matrix4::from_row_slice(&a.0);
        let nb = nalgebra::Matrix4::from_row_slice(&b.0);
        let expected = na * nb;

        let product = a * b;
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(product[i * 4 + j], expected[(i, j)], epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_rotate_then_inverse_restores() {
        let axes = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-3.0, 0.5, 2.0),
        ];
        for axis in axes {
            for angle in [-170.0f32, -45.0, 12.5, 90.0, 300.0] {
                let original = sample();
                let mut m = original;
                m.rotate(angle, axis);
                m.rotate(-angle, axis);
                assert_mat_eq(&m, &original, 1e-4);
            }
        }
    }

    #[test]
    fn test_rotate_zero_axis_is_noop() {
        let mut m = sample();
        m.rotate(45.0, Vec3::zeros());
        assert_eq!(m, sample());
    }

    #[test]
    fn test_rotate_about_z_matches_nalgebra() {
        let mut m = Mat4::identity();
        m.rotate(90.0, Vec3::new(0.0, 0.0, 1.0));

        // Stored row-major rotation of the same angle
        let rot = nalgebra::Rotation3::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2);
        let expected = rot.matrix().transpose();
        for r in 0..3 {
            for c in 0..3 {
                assert_relative_eq!(m.row(r)[c], expected[(r, c)], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_perspective_degenerate_is_noop() {
        let cases = [(0.1, 0.0), (0.0, 100.0), (5.0, 5.0), (-1.0, 10.0)];
        for (near, far) in cases {
            let original = sample();
            let mut m = original;
            m.perspective(45.0, 4.0 / 3.0, near, far);
            assert_eq!(bytemuck::bytes_of(&m), bytemuck::bytes_of(&original));
        }
    }

    #[test]
    fn test_perspective_from_identity() {
        let mut m = Mat4::identity();
        m.perspective(90.0, 1.0, 1.0, 3.0);
        assert_relative_eq!(m[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(m[5], -1.0, epsilon = 1e-6);
        assert_relative_eq!(m[10], -2.0, epsilon = 1e-6);
        assert_relative_eq!(m[11], -1.0);
        assert_relative_eq!(m[14], -3.0, epsilon = 1e-6);
        assert_eq!(m[15], 0.0);
    }

    #[test]
    fn test_scale_columns() {
        let mut m = Mat4::identity();
        m.scale(2.0, 3.0, 4.0);
        assert_eq!(m.row(0), [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(m.row(1), [0.0, 3.0, 0.0, 0.0]);
        assert_eq!(m.row(2), [0.0, 0.0, 4.0, 0.0]);
        assert_eq!(m.row(3), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_translate_identity() {
        let mut m = Mat4::identity();
        m.translate(1.0, -2.0, 3.0);
        assert_eq!(m.column(3), [1.0, -2.0, 3.0, 1.0]);

        m.translate(1.0, 1.0, 1.0);
        assert_eq!(m.column(3), [2.0, -1.0, 4.0, 1.0]);
    }

    #[test]
    fn test_euler_view_startup_default() {
        let view = Mat4::euler_view(Vec3::zeros(), 0.0, 90.0);
        let expected = Mat4([
            0.0, 0.0, 1.0, 0.0, //
            0.0, -1.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        assert_mat_eq(&view, &expected, 1e-6);
    }

    #[test]
    fn test_euler_view_translates_eye() {
        let view = Mat4::euler_view(Vec3::new(2.5, 0.0, 0.0), 0.0, 90.0);
        // World x is the camera's backward axis at yaw 90
        assert_relative_eq!(view[12], 0.0, epsilon = 1e-6);
        assert_relative_eq!(view[13], 0.0, epsilon = 1e-6);
        assert_relative_eq!(view[14], -2.5, epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_matches_nalgebra() {
        let eye = Vec3::new(2.0, 1.0, 3.0);
        let center = Vec3::zeros();
        let up = Vec3::new(0.0, 1.0, 0.0);
        let view = Mat4::look_at(eye, center, up);

        let expected = nalgebra::Matrix4::look_at_rh(
            &nalgebra::Point3::from(eye),
            &nalgebra::Point3::from(center),
            &up,
        );
        for r in 0..4 {
            for c in 0..4 {
                assert_relative_eq!(view.row(r)[c], expected[(r, c)], epsilon = 1e-5);
            }
        }
    }
}
