//! Runtime matrix conversion and angle extraction.
//!
//! The runtime hands out row-major 3x4 / 4x4 matrices; the engine wants
//! column-major [`Matrix4`]s.  A converted 3x4 pose carries
//! [`HOMOGENEOUS_SCALE`] in its homogeneous slot instead of `1.0`, which the
//! crouch clamp and every inverse downstream depend on.
//!
//! Two angle extractors exist and must not be mixed up:
//!
//! - [`view_angles`] reads a *model-view* matrix (world to eye) and yields
//!   camera angles;
//! - [`object_angles`] reads an *absolute tracking* matrix (device to world)
//!   and yields entity angles.

use hlvr_math::angles::{angles_from_vectors, vector_angles};
use hlvr_math::{Matrix4, Vector3, Vector4};
use hlvr_types::{HmdMatrix34, HmdMatrix44};

/// Value written to `m[15]` of every converted 3x4 pose.
pub const HOMOGENEOUS_SCALE: f32 = 0.1;

/// Convert a row-major 3x4 pose into a column-major 4x4 matrix.
///
/// Column `j` becomes `(m[0][j], m[1][j], m[2][j], 0)`, except the last
/// column whose fourth entry is [`HOMOGENEOUS_SCALE`].
pub fn from_tracking_34(mat: &HmdMatrix34) -> Matrix4 {
    let m = &mat.m;
    Matrix4::from_cols_array([
        m[0][0], m[1][0], m[2][0], 0.0, //
        m[0][1], m[1][1], m[2][1], 0.0, //
        m[0][2], m[1][2], m[2][2], 0.0, //
        m[0][3], m[1][3], m[2][3], HOMOGENEOUS_SCALE,
    ])
}

/// Convert a row-major 4x4 matrix (projection) column by column.
pub fn from_tracking_44(mat: &HmdMatrix44) -> Matrix4 {
    let m = &mat.m;
    Matrix4::from_cols_array([
        m[0][0], m[1][0], m[2][0], m[3][0], //
        m[0][1], m[1][1], m[2][1], m[3][1], //
        m[0][2], m[1][2], m[2][2], m[3][2], //
        m[0][3], m[1][3], m[2][3], m[3][3],
    ])
}

/// Camera angles from a model-view matrix.
///
/// The eye's forward axis in world space is the negated third row; the
/// resulting pitch is flipped because view pitch points down.
pub fn view_angles(model_view: &Matrix4) -> Vector3 {
    let v1 = (*model_view * Vector4::new(1.0, 0.0, 0.0, 0.0)).normalized();
    let v2 = (*model_view * Vector4::new(0.0, 1.0, 0.0, 0.0)).normalized();
    let v3 = (*model_view * Vector4::new(0.0, 0.0, 1.0, 0.0)).normalized();

    let mut angles = vector_angles(Vector3::new(-v1.z, -v2.z, -v3.z));
    angles.x = 360.0 - angles.x;
    angles
}

/// Entity angles from an absolute tracking matrix.
pub fn object_angles(absolute: &Matrix4) -> Vector3 {
    let forward = to_game_axes(*absolute * Vector4::new(0.0, 0.0, -1.0, 0.0));
    let right = to_game_axes(*absolute * Vector4::new(1.0, 0.0, 0.0, 0.0));
    let up = to_game_axes(*absolute * Vector4::new(0.0, 1.0, 0.0, 0.0));

    let mut angles = angles_from_vectors(forward, right, up);
    angles.x = 360.0 - angles.x;
    angles
}

/// `(x, y, z) -> (x, -z, y)`, normalised.
fn to_game_axes(v: Vector4) -> Vector3 {
    Vector3::new(v.x, -v.z, v.y).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn sample_34() -> HmdMatrix34 {
        HmdMatrix34 {
            m: [
                [1.0, 2.0, 3.0, 4.0],
                [5.0, 6.0, 7.0, 8.0],
                [9.0, 10.0, 11.0, 12.0],
            ],
        }
    }

    #[test]
    fn converts_34_column_major_with_homogeneous_slot() {
        let m = from_tracking_34(&sample_34());
        assert_eq!(m.at(0, 1), 2.0);
        assert_eq!(m.at(2, 0), 9.0);
        assert_eq!(m.position(), Vector3::new(4.0, 8.0, 12.0));
        assert_eq!(m[3], 0.0);
        assert_eq!(m[7], 0.0);
        assert_eq!(m[11], 0.0);
        assert_eq!(m[15], HOMOGENEOUS_SCALE);
    }

    #[test]
    fn converts_44_without_substitution() {
        let mut raw = HmdMatrix44::default();
        raw.m[3][2] = -1.0;
        raw.m[2][3] = -0.02;
        raw.m[3][3] = 0.0;
        let m = from_tracking_44(&raw);
        assert_eq!(m.at(3, 2), -1.0);
        assert_eq!(m.at(2, 3), -0.02);
        assert_eq!(m[15], 0.0);
    }

    #[test]
    fn object_angles_of_identity_face_game_plus_y() {
        let a = object_angles(&from_tracking_34(&HmdMatrix34::IDENTITY));
        assert!(close(a.y, 90.0), "yaw {}", a.y);
        assert!(close(a.x, 360.0), "pitch {}", a.x);
        assert!(close(a.z, 0.0), "roll {}", a.z);
    }

    #[test]
    fn object_angles_follow_tracking_yaw() {
        // Turning the device 90 degrees left in tracking space points its
        // forward axis at tracking -X, which is game -X.
        let m = Matrix4::yaw(90.0) * from_tracking_34(&HmdMatrix34::IDENTITY);
        let a = object_angles(&m);
        let yaw = hlvr_math::angles::normalize_degrees(a.y + 1.0) - 1.0;
        assert!(close(yaw, 180.0), "yaw {}", a.y);
    }

    #[test]
    fn view_angles_of_axis_swap_face_game_plus_y() {
        let swap = Matrix4::IDENTITY.with(5, 0.0).with(6, -1.0).with(9, 1.0).with(10, 0.0);
        let a = view_angles(&swap);
        assert!(close(a.y, 90.0), "yaw {}", a.y);
        assert!(close(a.x, 360.0), "pitch {}", a.x);
        assert_eq!(a.z, 0.0);
    }

    #[test]
    fn degenerate_matrix_yields_finite_angles() {
        let zero = Matrix4::from_cols_array([0.0; 16]);
        for a in [view_angles(&zero), object_angles(&zero)] {
            assert!(a.x.is_finite() && a.y.is_finite() && a.z.is_finite());
        }
    }
}
