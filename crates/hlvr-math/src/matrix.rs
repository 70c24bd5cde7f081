//! Column-major 4x4 matrix.
//!
//! Storage follows the OpenGL convention: element `(row, col)` lives at
//! index `col * 4 + row`, so the translation of an affine transform is
//! `m[12], m[13], m[14]` and `m[15]` is the homogeneous scale.
//!
//! All operations take and return values; nothing mutates a matrix through a
//! shared reference.
//!
//! # Example
//!
//! ```rust
//! use hlvr_math::{Matrix4, Vector4};
//!
//! // A quarter turn around +Y sends +X to -Z.
//! let r = Matrix4::yaw(90.0);
//! let v = r * Vector4::new(1.0, 0.0, 0.0, 0.0);
//! assert!(v.x.abs() < 1e-5);
//! assert!((v.z + 1.0).abs() < 1e-5);
//! ```

use std::ops::{Index, Mul};

use serde::{Deserialize, Serialize};

use crate::vector::{Vector3, Vector4};

/// Determinants at or below this magnitude are treated as singular.
const SINGULAR_EPSILON: f32 = 0.00001;

/// A 4x4 matrix stored column-major.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix4 {
    m: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Build from 16 values already in column-major order.
    pub const fn from_cols_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.m
    }

    /// Element at `(row, col)`.
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.m[col * 4 + row]
    }

    /// Copy of `self` with one raw slot replaced.
    pub fn with(mut self, index: usize, value: f32) -> Self {
        self.m[index] = value;
        self
    }

    /// Rotation of `degrees` around +Y.  Positive angles turn +Z towards +X.
    pub fn yaw(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_cols_array([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Diagonal scale matrix.
    pub fn scaling(v: Vector3) -> Self {
        Self::IDENTITY.with(0, v.x).with(5, v.y).with(10, v.z)
    }

    /// Pure translation matrix.
    pub fn translation(v: Vector3) -> Self {
        Self::IDENTITY.with(12, v.x).with(13, v.y).with(14, v.z)
    }

    /// `Ry(degrees) * self`: rotate the whole transform around the world
    /// +Y axis, translation included.
    pub fn rotated_y(self, degrees: f32) -> Self {
        Self::yaw(degrees) * self
    }

    /// Scale the first three rows (basis and translation) by `s`.
    pub fn scaled_uniform(mut self, s: f32) -> Self {
        for col in 0..4 {
            for row in 0..3 {
                self.m[col * 4 + row] *= s;
            }
        }
        self
    }

    /// Translation column `(m[12], m[13], m[14])`.
    pub fn position(&self) -> Vector3 {
        Vector3::new(self.m[12], self.m[13], self.m[14])
    }

    /// Copy of `self` with the translation column replaced.
    pub fn with_position(self, p: Vector3) -> Self {
        self.with(12, p.x).with(13, p.y).with(14, p.z)
    }

    /// Multiply the upper 3x3 block with `v`, ignoring translation.
    pub fn transform_direction(&self, v: Vector3) -> Vector3 {
        let m = &self.m;
        Vector3::new(
            m[0] * v.x + m[4] * v.y + m[8] * v.z,
            m[1] * v.x + m[5] * v.y + m[9] * v.z,
            m[2] * v.x + m[6] * v.y + m[10] * v.z,
        )
    }

    pub fn determinant(&self) -> f32 {
        let inv = self.cofactors();
        let m = &self.m;
        m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12]
    }

    /// General inverse.  A singular matrix yields the identity.
    pub fn inverse(&self) -> Self {
        let inv = self.cofactors();
        let m = &self.m;
        let det = m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12];
        if det.abs() <= SINGULAR_EPSILON {
            return Self::IDENTITY;
        }
        let inv_det = 1.0 / det;
        let mut out = [0.0f32; 16];
        for (o, c) in out.iter_mut().zip(inv.iter()) {
            *o = c * inv_det;
        }
        Self::from_cols_array(out)
    }

    // Adjugate (transposed cofactor matrix) in the same storage order.
    fn cofactors(&self) -> [f32; 16] {
        let m = &self.m;
        let mut inv = [0.0f32; 16];

        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14]
            + m[13] * m[6] * m[11]
            - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14]
            - m[12] * m[6] * m[11]
            + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13]
            + m[12] * m[5] * m[11]
            - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13]
            - m[12] * m[5] * m[10]
            + m[12] * m[6] * m[9];
        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14]
            - m[13] * m[2] * m[11]
            + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14]
            + m[12] * m[2] * m[11]
            - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13]
            - m[12] * m[1] * m[11]
            + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13]
            + m[12] * m[1] * m[10]
            - m[12] * m[2] * m[9];
        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14]
            + m[13] * m[2] * m[7]
            - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14]
            - m[12] * m[2] * m[7]
            + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13]
            + m[12] * m[1] * m[7]
            - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13]
            - m[12] * m[1] * m[6]
            + m[12] * m[2] * m[5];
        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10]
            - m[9] * m[2] * m[7]
            + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10]
            + m[8] * m[2] * m[7]
            - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9]
            - m[8] * m[1] * m[7]
            + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9]
            + m[8] * m[1] * m[6]
            - m[8] * m[2] * m[5];

        inv
    }
}

impl Index<usize> for Matrix4 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.m[i]
    }
}

impl Mul for Matrix4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4)
                    .map(|k| self.m[k * 4 + row] * rhs.m[col * 4 + k])
                    .sum();
            }
        }
        Self::from_cols_array(out)
    }
}

impl Mul<Vector4> for Matrix4 {
    type Output = Vector4;
    fn mul(self, v: Vector4) -> Vector4 {
        let m = &self.m;
        Vector4::new(
            m[0] * v.x + m[4] * v.y + m[8] * v.z + m[12] * v.w,
            m[1] * v.x + m[5] * v.y + m[9] * v.z + m[13] * v.w,
            m[2] * v.x + m[6] * v.y + m[10] * v.z + m[14] * v.w,
            m[3] * v.x + m[7] * v.y + m[11] * v.z + m[15] * v.w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Matrix4, b: &Matrix4) {
        for i in 0..16 {
            assert!(
                (a[i] - b[i]).abs() < 1e-4,
                "slot {i}: {} vs {}",
                a[i],
                b[i]
            );
        }
    }

    #[test]
    fn identity_is_neutral() {
        let t = Matrix4::translation(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(Matrix4::IDENTITY * t, t);
        assert_eq!(t * Matrix4::IDENTITY, t);
    }

    #[test]
    fn yaw_rotates_z_towards_x() {
        let v = Matrix4::yaw(90.0) * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!((v.x - 1.0).abs() < 1e-5);
        assert!(v.z.abs() < 1e-5);
    }

    #[test]
    fn rotated_y_moves_translation() {
        let t = Matrix4::translation(Vector3::new(1.0, 5.0, 0.0)).rotated_y(180.0);
        let p = t.position();
        assert!((p.x + 1.0).abs() < 1e-5);
        assert!((p.y - 5.0).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
    }

    #[test]
    fn scaled_uniform_leaves_last_row() {
        let m = Matrix4::translation(Vector3::new(1.0, 2.0, 3.0)).scaled_uniform(10.0);
        assert_eq!(m.position(), Vector3::new(10.0, 20.0, 30.0));
        assert_eq!(m[15], 1.0);
        assert_eq!(m[0], 10.0);
    }

    #[test]
    fn inverse_of_rigid_transform_round_trips() {
        let m = Matrix4::translation(Vector3::new(0.3, 1.7, -2.0)).rotated_y(37.0);
        assert_close(&(m * m.inverse()), &Matrix4::IDENTITY);
    }

    #[test]
    fn inverse_handles_non_unit_homogeneous_slot() {
        let m = Matrix4::translation(Vector3::new(0.5, 1.0, 0.0)).with(15, 0.1);
        let inv = m.inverse();
        assert_close(&(m * inv), &Matrix4::IDENTITY);
        assert!((inv[15] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn singular_matrix_inverts_to_identity() {
        let m = Matrix4::scaling(Vector3::new(0.0, 1.0, 1.0));
        assert_eq!(m.inverse(), Matrix4::IDENTITY);
    }

    #[test]
    fn transform_direction_ignores_translation() {
        let m = Matrix4::translation(Vector3::new(9.0, 9.0, 9.0));
        let v = m.transform_direction(Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(v, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn determinant_of_scaling() {
        let m = Matrix4::scaling(Vector3::new(2.0, 3.0, 4.0));
        assert!((m.determinant() - 24.0).abs() < 1e-4);
    }
}
