//! Engine Euler-angle routines.
//!
//! Angles are `(pitch, yaw, roll)` in degrees, packed into a [`Vector3`] as
//! `x = pitch`, `y = yaw`, `z = roll`.  Game space is right-handed with +Z
//! up; yaw turns +X towards +Y and a positive pitch looks *down*.

use crate::vector::Vector3;

/// Below this the component is treated as zero when recovering pitch.
const BASIS_EPSILON: f32 = 0.001;

/// Wrap `degrees` into `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let mut r = degrees % 360.0;
    if r < 0.0 {
        r += 360.0;
    }
    // -1e-6 + 360.0 rounds to 360.0 in f32.
    if r >= 360.0 {
        r = 0.0;
    }
    r
}

/// Pitch and yaw of a direction vector; roll is always zero.
///
/// Pitch comes back in `[0, 360)` with the *angle* convention (positive
/// looks up); callers feeding a view need to invert it.
pub fn vector_angles(forward: Vector3) -> Vector3 {
    let (pitch, yaw) = if forward.x == 0.0 && forward.y == 0.0 {
        (if forward.z > 0.0 { 90.0 } else { 270.0 }, 0.0)
    } else {
        let mut yaw = forward.y.atan2(forward.x).to_degrees();
        if yaw < 0.0 {
            yaw += 360.0;
        }
        let horizontal = (forward.x * forward.x + forward.y * forward.y).sqrt();
        let mut pitch = forward.z.atan2(horizontal).to_degrees();
        if pitch < 0.0 {
            pitch += 360.0;
        }
        (pitch, yaw)
    };
    Vector3::new(pitch, yaw, 0.0)
}

/// Forward, right and up basis vectors for `angles`.
pub fn angle_vectors(angles: Vector3) -> (Vector3, Vector3, Vector3) {
    let (sp, cp) = angles.x.to_radians().sin_cos();
    let (sy, cy) = angles.y.to_radians().sin_cos();
    let (sr, cr) = angles.z.to_radians().sin_cos();

    let forward = Vector3::new(cp * cy, cp * sy, -sp);
    let right = Vector3::new(
        -sr * sp * cy + cr * sy,
        -sr * sp * sy - cr * cy,
        -sr * cp,
    );
    let up = Vector3::new(cr * sp * cy + sr * sy, cr * sp * sy - sr * cy, cr * cp);
    (forward, right, up)
}

/// Recover `(pitch, yaw, roll)` from an orthonormal basis; the inverse of
/// [`angle_vectors`].
pub fn angles_from_vectors(forward: Vector3, right: Vector3, up: Vector3) -> Vector3 {
    let sp = -forward.z;

    let cp_cy = forward.x;
    let cp_sy = forward.y;
    let cp_sr = -right.z;
    let cp_cr = up.z;

    let yaw = cp_sy.atan2(cp_cy);
    let roll = cp_sr.atan2(cp_cr);

    let (sy, cy) = yaw.sin_cos();
    let (sr, cr) = roll.sin_cos();

    let cp = if cy.abs() > BASIS_EPSILON {
        cp_cy / cy
    } else if sy.abs() > BASIS_EPSILON {
        cp_sy / sy
    } else if sr.abs() > BASIS_EPSILON {
        cp_sr / sr
    } else if cr.abs() > BASIS_EPSILON {
        cp_cr / cr
    } else {
        sp.clamp(-1.0, 1.0).asin().cos()
    };

    let pitch = sp.atan2(cp);
    Vector3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}
