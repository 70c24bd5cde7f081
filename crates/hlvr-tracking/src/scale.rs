//! Unit and axis conversion between tracking space and game space.
//!
//! Tracking space is meters with +Y up and -Z forward; game space is engine
//! units with +Z up.  The mapping is a per-axis scale plus the swap
//! `(x, y, z) -> (x, -z, y)`.
//!
//! # Example
//!
//! ```rust
//! use hlvr_tracking::scale::ConversionVectors;
//!
//! let c = ConversionVectors::derive(1.0, 1.0);
//! assert!((c.hl_to_vr.x - 0.266_666).abs() < 1e-5);
//! assert!((c.vr_to_hl.x - 37.5).abs() < 1e-3);
//! ```

use hlvr_math::Vector3;
use serde::{Deserialize, Serialize};

/// Lower bound for both scale parameters.
pub const MIN_SCALE: f32 = 0.1;
/// Upper bound for both scale parameters.
pub const MAX_SCALE: f32 = 100.0;

/// Game units per meter divisor for the forward direction.
const HL_TO_VR_DIVISOR: f32 = 3.75;
/// Numerator of the inverse direction.  Deliberately not `1.0`: the inverse
/// is `10 / forward`, so the two vectors are not reciprocal.
const VR_TO_HL_NUMERATOR: f32 = 10.0;

/// Clamp a user-supplied scale into `[MIN_SCALE, MAX_SCALE]`.
///
/// NaN falls back to `1.0`.
pub fn clamp_scale(value: f32) -> f32 {
    if value.is_nan() {
        return 1.0;
    }
    value.clamp(MIN_SCALE, MAX_SCALE)
}

/// The two per-axis scale vectors for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionVectors {
    /// Game units to tracking meters, indexed by *tracking* axis.
    pub hl_to_vr: Vector3,
    /// Tracking meters to game units, indexed by *tracking* axis.
    pub vr_to_hl: Vector3,
    /// The clamped world scale the vectors were derived from.
    pub world_scale: f32,
}

impl ConversionVectors {
    /// Derive both vectors from the two (unclamped) user parameters.
    pub fn derive(world_scale: f32, world_z_stretch: f32) -> Self {
        let world_scale = clamp_scale(world_scale);
        let z_stretch = clamp_scale(world_z_stretch);

        let base = world_scale / HL_TO_VR_DIVISOR;
        let hl_to_vr = Vector3::new(base, base * z_stretch, base);
        let vr_to_hl = Vector3::new(
            VR_TO_HL_NUMERATOR / hl_to_vr.x,
            VR_TO_HL_NUMERATOR / hl_to_vr.y,
            VR_TO_HL_NUMERATOR / hl_to_vr.z,
        );

        Self {
            hl_to_vr,
            vr_to_hl,
            world_scale,
        }
    }

    /// Map a tracking-space vector (offset, velocity, delta) into game space.
    pub fn to_game(&self, v: Vector3) -> Vector3 {
        Vector3::new(
            v.x * self.vr_to_hl.x,
            -v.z * self.vr_to_hl.z,
            v.y * self.vr_to_hl.y,
        )
    }

    /// Render scale for the view model: `1 / clamped world scale`.
    pub fn view_model_scale(&self) -> f32 {
        1.0 / self.world_scale
    }
}

impl Default for ConversionVectors {
    fn default() -> Self {
        Self::derive(1.0, 1.0)
    }
}
