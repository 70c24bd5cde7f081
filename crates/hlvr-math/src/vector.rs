//! 3- and 4-component vectors.
//!
//! # Example
//!
//! ```rust
//! use hlvr_math::Vector3;
//!
//! let v = Vector3::new(3.0, 4.0, 0.0);
//! assert!((v.length() - 5.0).abs() < 1e-5);
//! assert!((v.normalized().x - 0.6).abs() < 1e-5);
//! ```

use std::ops::{Add, AddAssign, Index, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero by [`Vector3::normalized`] and
/// [`Vector4::normalized`].
pub const NORMALIZE_EPSILON: f32 = 1e-6;

// ────────────────────────────────────────────────────────────────────────────
// Vector3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-component vector.  Used for both tracking-space meters and
/// game-space units; the owning type decides which.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Return the unit vector pointing the same way.
    ///
    /// Vectors shorter than [`NORMALIZE_EPSILON`] come back unchanged, so a
    /// degenerate basis never turns into NaN further down the pipeline.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < NORMALIZE_EPSILON {
            return self;
        }
        Self::new(self.x / len, self.y / len, self.z / len)
    }

    /// Component-wise product.
    pub fn scaled(self, factors: Self) -> Self {
        Self::new(self.x * factors.x, self.y * factors.y, self.z * factors.z)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Add for Vector3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vector3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Vector3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Index<usize> for Vector3 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vector3 index {i} out of range"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vector4
// ────────────────────────────────────────────────────────────────────────────

/// A homogeneous 4-component vector.  `w = 0` for directions, `w = 1` for
/// points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vector4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const fn direction(v: Vector3) -> Self {
        Self::new(v.x, v.y, v.z, 0.0)
    }

    pub const fn point(v: Vector3) -> Self {
        Self::new(v.x, v.y, v.z, 1.0)
    }

    pub fn xyz(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Four-component normalisation with the same epsilon guard as
    /// [`Vector3::normalized`].
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < NORMALIZE_EPSILON {
            return self;
        }
        Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_has_unit_length() {
        let v = Vector3::new(1.0, 2.0, 2.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-5);
        assert!((v.x - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn normalizing_zero_vector_does_not_produce_nan() {
        let v = Vector3::ZERO.normalized();
        assert!(!v.x.is_nan() && !v.y.is_nan() && !v.z.is_nan());
        assert!(v.is_zero());

        let tiny = Vector4::new(1e-9, 0.0, 0.0, 0.0).normalized();
        assert!(!tiny.x.is_nan());
    }

    #[test]
    fn arithmetic_operators() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(0.5, -1.0, 2.0);
        assert_eq!(a + b, Vector3::new(1.5, 1.0, 5.0));
        assert_eq!(a - b, Vector3::new(0.5, 3.0, 1.0));
        assert_eq!(-a, Vector3::new(-1.0, -2.0, -3.0));
        assert_eq!(a * 2.0, Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(a.scaled(b), Vector3::new(0.5, -2.0, 6.0));
        assert!((a.dot(b) - 4.5).abs() < 1e-6);
    }

    #[test]
    fn serializes_as_plain_struct() {
        let json = serde_json::to_string(&Vector3::new(1.0, 0.0, -1.0)).unwrap();
        assert_eq!(json, r#"{"x":1.0,"y":0.0,"z":-1.0}"#);
    }
}
