//! Absolute transforms for the headset and controllers.
//!
//! [`PoseResolver`] applies, in order, the crouch clamp and the virtual yaw
//! to the raw runtime poses.  The headset is rotated around the tracking
//! origin; controllers are then pivoted around the *headset*, so turning in
//! place keeps the hands where they are relative to the head.
//!
//! The headset must be resolved first in every frame: it records the duck
//! height delta the controllers reuse and the yaw offset delta sent to the
//! simulation.

use hlvr_math::{Matrix4, Vector3, Vector4};
use hlvr_types::{HmdMatrix34, ResolvedTransform, TrackedPose};

use crate::adapter::{from_tracking_34, object_angles};
use crate::scale::ConversionVectors;
use crate::yaw::YawTracker;

/// Height of the crouched player hull in game units.
pub const DUCK_SIZE: f32 = 36.0;

/// Per-frame settings the resolver reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveContext {
    pub conversion: ConversionVectors,
    pub ducking: bool,
    pub turn_enabled: bool,
}

/// Holds the crouch clamp shared between the headset and controllers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseResolver {
    duck_height_delta: f32,
}

impl PoseResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracking-space height removed from the headset while crouching.
    pub fn duck_height_delta(&self) -> f32 {
        self.duck_height_delta
    }

    /// Absolute headset transform with crouch and yaw applied.
    ///
    /// Writes the yaw offset delta into `yaw` while the tracker owes one:
    /// the translation the yaw change caused (game space), or zero when yaw
    /// did not change.  Once the delta has been cleared, later calls for the
    /// same update leave it at zero.
    pub fn resolve_headset(
        &mut self,
        raw: &HmdMatrix34,
        yaw: &mut YawTracker,
        ctx: &ResolveContext,
    ) -> Matrix4 {
        let mut pose = from_tracking_34(raw);

        if ctx.ducking {
            let duck_height = (DUCK_SIZE - 1.0) * ctx.conversion.hl_to_vr.y * pose[15];
            let height = pose[13];
            let clamped = height.min(duck_height);
            pose = pose.with(13, clamped);
            self.duck_height_delta = height - clamped;
        }

        let current = yaw.current();
        if !ctx.turn_enabled || current == 0.0 {
            return pose;
        }

        if yaw.owes_offset_delta() {
            let previous = yaw.previous();
            let delta = if previous != current {
                let moved =
                    pose.rotated_y(current).position() - pose.rotated_y(previous).position();
                ctx.conversion.to_game(moved)
            } else {
                Vector3::ZERO
            };
            yaw.set_offset_delta(delta);
        }

        pose.rotated_y(current)
    }

    /// Absolute controller transform pivoted around the headset.
    ///
    /// `raw_headset` is the unmodified headset pose of this frame and
    /// `headset` the transform [`PoseResolver::resolve_headset`] returned for
    /// it.
    pub fn resolve_controller(
        &self,
        raw: &HmdMatrix34,
        raw_headset: &HmdMatrix34,
        headset: &Matrix4,
        yaw: &YawTracker,
        ctx: &ResolveContext,
    ) -> Matrix4 {
        let mut pose = from_tracking_34(raw);

        if ctx.ducking {
            pose = pose.with(13, pose[13] - self.duck_height_delta);
        }

        let current = yaw.current();
        if !ctx.turn_enabled || current == 0.0 {
            return pose;
        }

        let raw_head = raw_headset.position();
        let yawed_head = headset.position();

        let mut local = pose.position();
        local.x -= raw_head.x;
        local.z -= raw_head.z;
        let rotated = Matrix4::yaw(current) * Vector4::point(local);

        let position = Vector3::new(
            rotated.x + yawed_head.x,
            local.y,
            rotated.z + yawed_head.z,
        );
        pose.rotated_y(current).with_position(position)
    }

    /// Game-space velocity for a controller.
    pub fn controller_velocity(
        velocity: Vector3,
        yaw: &YawTracker,
        ctx: &ResolveContext,
    ) -> Vector3 {
        let velocity = if ctx.turn_enabled {
            Matrix4::yaw(yaw.current()).transform_direction(velocity)
        } else {
            velocity
        };
        ctx.conversion.to_game(velocity)
    }

    /// Resolve a connected controller into offset, angles and velocity.
    pub fn resolve_hand(
        &self,
        pose: &TrackedPose,
        raw_headset: &HmdMatrix34,
        headset: &Matrix4,
        yaw: &YawTracker,
        ctx: &ResolveContext,
    ) -> (Matrix4, ResolvedTransform) {
        let absolute = self.resolve_controller(
            &pose.device_to_absolute,
            raw_headset,
            headset,
            yaw,
            ctx,
        );
        let resolved = ResolvedTransform {
            offset: offset_in_game(&absolute, &ctx.conversion),
            angles: object_angles(&absolute),
            velocity: Self::controller_velocity(pose.velocity, yaw, ctx),
            valid: true,
        };
        (absolute, resolved)
    }
}

/// Offset of an absolute transform from the player's feet, in game space.
pub fn offset_in_game(absolute: &Matrix4, conversion: &ConversionVectors) -> Vector3 {
    let origin = *absolute * Vector4::new(0.0, 0.0, 0.0, 1.0);
    conversion.to_game(origin.xyz())
}
