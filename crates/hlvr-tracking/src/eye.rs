//! Per-eye projection and model-view matrices.
//!
//! The model-view pipeline is
//!
//! ```text
//! eye_pose · headset⁻¹ · scale(hl_to_vr) · swap_yz · translate(-ground)
//! ```
//!
//! followed by a uniform `scale(10)` that cancels the homogeneous slot the
//! converted poses carry.  The result maps game-space points to eye space.

use hlvr_math::{Matrix4, Vector3};
use hlvr_types::{Eye, HmdMatrix34, HmdMatrix44};
use serde::{Deserialize, Serialize};

use crate::adapter::{from_tracking_34, from_tracking_44, view_angles};
use crate::scale::ConversionVectors;

/// Near clip plane handed to the runtime's projection query.
pub const NEAR_Z: f32 = 0.01;
/// Far clip plane handed to the runtime's projection query.
pub const FAR_Z: f32 = 8192.0;

/// Maps game axes (+Z up) onto tracking axes (+Y up).
const SWAP_YZ: Matrix4 = Matrix4::from_cols_array([
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, -1.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

pub fn projection(raw: &HmdMatrix44) -> Matrix4 {
    from_tracking_44(raw)
}

/// Head-to-eye transform from the runtime's eye-to-head pose.
pub fn eye_pose(eye_to_head: &HmdMatrix34) -> Matrix4 {
    from_tracking_34(eye_to_head).inverse()
}

/// Model-view matrix for an inverted absolute tracking matrix, with the
/// game-space `translate` applied first.
pub fn model_view(
    inverse_absolute: &Matrix4,
    translate: Vector3,
    conversion: &ConversionVectors,
) -> Matrix4 {
    let m = *inverse_absolute
        * Matrix4::scaling(conversion.hl_to_vr)
        * SWAP_YZ
        * Matrix4::translation(translate);
    m.scaled_uniform(10.0)
}

/// Final view matrix for one eye.
pub fn eye_view(
    eye_to_head: &HmdMatrix34,
    headset: &Matrix4,
    ground: Vector3,
    conversion: &ConversionVectors,
) -> Matrix4 {
    eye_pose(eye_to_head) * model_view(&headset.inverse(), -ground, conversion)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EyeMatrices {
    pub projection: Matrix4,
    pub model_view: Matrix4,
}

/// Both eyes' matrices for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewMatrices {
    pub left: EyeMatrices,
    pub right: EyeMatrices,
}

impl ViewMatrices {
    pub fn eye(&self, eye: Eye) -> &EyeMatrices {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }

    /// Camera angles for `eye`.
    pub fn view_angles(&self, eye: Eye) -> Vector3 {
        view_angles(&self.eye(eye).model_view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlvr_math::Vector4;
    use hlvr_math::angles::normalize_degrees;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn same_angle(a: f32, b: f32) -> bool {
        (normalize_degrees(a - b + 180.0) - 180.0).abs() < 1e-3
    }

    fn headset_at(position: Vector3) -> Matrix4 {
        from_tracking_34(&HmdMatrix34::from_position(position))
    }

    #[test]
    fn model_view_maps_head_to_eye_origin() {
        let conversion = ConversionVectors::derive(1.0, 1.0);
        let head = headset_at(Vector3::new(0.0, 1.7, 0.0));
        let ground = Vector3::new(100.0, 200.0, 0.0);
        let view = eye_view(&HmdMatrix34::IDENTITY, &head, ground, &conversion);

        let head_in_game = ground + conversion.to_game(Vector3::new(0.0, 1.7, 0.0));
        let eye = view * Vector4::point(head_in_game);
        assert!(close(eye.x, 0.0), "{eye:?}");
        assert!(close(eye.y, 0.0), "{eye:?}");
        assert!(close(eye.z, 0.0), "{eye:?}");
    }

    #[test]
    fn unrotated_headset_looks_along_game_plus_y() {
        let conversion = ConversionVectors::derive(1.0, 1.0);
        let view = eye_view(
            &HmdMatrix34::IDENTITY,
            &headset_at(Vector3::new(0.0, 1.7, 0.0)),
            Vector3::ZERO,
            &conversion,
        );
        let a = view_angles(&view);
        assert!(same_angle(a.y, 90.0), "{a:?}");
        assert!(same_angle(a.x, 0.0), "{a:?}");
    }

    #[test]
    fn yawed_headset_turns_the_view() {
        let conversion = ConversionVectors::derive(2.0, 1.5);
        let head = headset_at(Vector3::new(0.3, 1.6, 0.2)).rotated_y(90.0);
        let view = eye_view(&HmdMatrix34::IDENTITY, &head, Vector3::ZERO, &conversion);
        let a = view_angles(&view);
        assert!(same_angle(a.y, 180.0), "{a:?}");
        assert!(same_angle(a.x, 0.0), "{a:?}");
    }

    #[test]
    fn eye_offset_is_inverted() {
        let to_head = HmdMatrix34::from_position(Vector3::new(-0.032, 0.0, 0.0));
        let pose = eye_pose(&to_head);
        let back = from_tracking_34(&to_head) * pose;
        for i in 0..16 {
            assert!(close(back[i], Matrix4::IDENTITY[i]), "slot {i}");
        }
    }

    #[test]
    fn view_matrices_pick_the_requested_eye() {
        let mut views = ViewMatrices::default();
        views.right.model_view = SWAP_YZ;
        assert_eq!(views.eye(Eye::Left).model_view, Matrix4::IDENTITY);
        assert!(close(views.view_angles(Eye::Right).y, 90.0));
    }
}
