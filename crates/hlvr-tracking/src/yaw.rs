//! Virtual yaw tracking.
//!
//! The player can turn in-game (stick input, riding a rotating platform)
//! without turning physically.  [`YawTracker`] integrates those turns into a
//! *current* yaw, remembers the *previous* one, and holds the one-shot
//! positional correction the pose resolver derives from the difference.
//!
//! Two external signals can arrive between frames: a *restore* (save game or
//! level change carries both yaws over) and a *spawn* (face a given
//! direction).  Each sits in a pending slot until the next [`YawTracker::update`]
//! consumes it.  A pending restore takes precedence over everything else that
//! frame.
//!
//! # Example
//!
//! ```rust
//! use hlvr_tracking::yaw::{YawInputs, YawTracker};
//!
//! let mut yaw = YawTracker::new();
//! let mut inputs = YawInputs { turn_enabled: true, ..YawInputs::default() };
//!
//! yaw.update(0.0, &inputs); // first frame only records the time
//! inputs.rotate_left = true;
//! yaw.update(0.5, &inputs);
//! assert!((yaw.current() - 105.0).abs() < 1e-3);
//! assert_eq!(yaw.previous(), 0.0);
//! ```

use hlvr_math::Vector3;
use hlvr_math::angles::normalize_degrees;
use hlvr_types::GroundEntity;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default turn rate in degrees per second.
pub const DEFAULT_YAW_SPEED: f32 = 210.0;

/// Everything [`YawTracker::update`] reads from the outside world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawInputs {
    pub turn_enabled: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    /// Degrees per second.
    pub yaw_speed: f32,
    pub rotate_with_platform: bool,
    pub ground_entity: Option<GroundEntity>,
    /// Yaw of the current headset view; only read when a spawn signal is
    /// pending.
    pub view_yaw: f32,
}

impl Default for YawInputs {
    fn default() -> Self {
        Self {
            turn_enabled: false,
            rotate_left: false,
            rotate_right: false,
            yaw_speed: DEFAULT_YAW_SPEED,
            rotate_with_platform: true,
            ground_entity: None,
            view_yaw: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct PendingSignals {
    restore: Option<(f32, f32)>,
    spawn: Option<f32>,
}

/// Last sample of the entity the player stands on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct GroundSample {
    entity: i32,
    yaw: f32,
}

/// Virtual yaw state.  See the module docs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YawTracker {
    previous: f32,
    current: f32,
    /// `None` until the first enabled update of a session.
    last_update: Option<f32>,
    offset_delta: Vector3,
    /// Set by an update that moved the yaw, cleared once the correction
    /// has been sent.
    delta_owed: bool,
    ground: Option<GroundSample>,
    pending: PendingSignals,
}

impl YawTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yaw before this frame's change (degrees).
    pub fn previous(&self) -> f32 {
        self.previous
    }

    /// Yaw after this frame's change, in `[0, 360)`.
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn last_update(&self) -> Option<f32> {
        self.last_update
    }

    /// Game-space correction for the current frame; zero when yaw did not
    /// change.
    pub fn offset_delta(&self) -> Vector3 {
        self.offset_delta
    }

    /// Whether the pose resolver still has to derive a correction for the
    /// last yaw change.
    pub fn owes_offset_delta(&self) -> bool {
        self.delta_owed
    }

    pub(crate) fn set_offset_delta(&mut self, delta: Vector3) {
        self.offset_delta = delta;
    }

    /// Zero the correction once it has been sent.  Until the next real
    /// update nothing new is owed.
    pub fn clear_offset_delta(&mut self) {
        self.offset_delta = Vector3::ZERO;
        self.delta_owed = false;
    }

    /// Queue a restore of both yaws; consumed by the next update.
    pub fn signal_restore(&mut self, previous: f32, current: f32) {
        self.pending.restore = Some((previous, current));
    }

    /// Queue a spawn facing `target_yaw`; consumed by the next update that
    /// has no restore pending.
    pub fn signal_spawn(&mut self, target_yaw: f32) {
        self.pending.spawn = Some(target_yaw);
    }

    pub fn has_pending_signal(&self) -> bool {
        self.pending.restore.is_some() || self.pending.spawn.is_some()
    }

    /// Advance the tracker to time `now` (seconds).
    ///
    /// A restore also records `now`, so turning resumes from the restore
    /// frame rather than from the last frame before it.
    pub fn update(&mut self, now: f32, inputs: &YawInputs) {
        if !inputs.turn_enabled {
            self.reset();
            self.last_update = None;
            return;
        }

        let last = match self.last_update {
            Some(last) if last == now => return,
            Some(last) if last < now => last,
            _ => {
                // First frame of a session, or the clock went backwards
                // (new game, level load).
                debug!(now, "yaw tracker starting fresh");
                self.reset();
                self.last_update = Some(now);
                return;
            }
        };

        if let Some((previous, current)) = self.pending.restore.take() {
            self.previous = normalize_degrees(previous);
            self.current = normalize_degrees(current);
            self.last_update = Some(now);
            self.delta_owed = true;
            debug!(
                previous = self.previous,
                current = self.current,
                "yaw restored"
            );
            return;
        }

        if let Some(target) = self.pending.spawn.take() {
            self.current = normalize_degrees(self.current + target - inputs.view_yaw);
            debug!(target, current = self.current, "yaw aligned to spawn");
        }

        let dt = now - last;
        self.previous = self.current;
        if inputs.rotate_left {
            self.current += dt * inputs.yaw_speed;
        } else if inputs.rotate_right {
            self.current -= dt * inputs.yaw_speed;
        }

        self.follow_ground(inputs);

        self.current = normalize_degrees(self.current);
        self.last_update = Some(now);
        self.delta_owed = true;
    }

    fn follow_ground(&mut self, inputs: &YawInputs) {
        let Some(entity) = inputs.ground_entity else {
            self.ground = None;
            return;
        };

        let sampled = self
            .ground
            .filter(|sample| sample.entity == entity.id)
            .map(|sample| sample.yaw);
        if inputs.rotate_with_platform {
            if let Some(sampled) = sampled {
                self.current += entity.yaw - sampled;
            }
        }
        self.ground = Some(GroundSample {
            entity: entity.id,
            yaw: entity.yaw,
        });
    }

    fn reset(&mut self) {
        self.previous = 0.0;
        self.current = 0.0;
        self.offset_delta = Vector3::ZERO;
        self.delta_owed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn enabled() -> YawInputs {
        YawInputs {
            turn_enabled: true,
            ..YawInputs::default()
        }
    }

    /// Tracker that has already seen its first frame at `t = 1`.
    fn active() -> YawTracker {
        let mut yaw = YawTracker::new();
        yaw.update(1.0, &enabled());
        yaw
    }

    #[test]
    fn disabled_keeps_everything_zero() {
        let mut yaw = YawTracker::new();
        let inputs = YawInputs {
            rotate_left: true,
            ..YawInputs::default()
        };
        for t in [0.0, 0.5, 1.0, 2.0] {
            yaw.update(t, &inputs);
            assert_eq!(yaw.previous(), 0.0);
            assert_eq!(yaw.current(), 0.0);
            assert!(yaw.offset_delta().is_zero());
            assert_eq!(yaw.last_update(), None);
        }
    }

    #[test]
    fn disabling_resets_an_active_tracker() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_left = true;
        yaw.update(1.5, &inputs);
        yaw.set_offset_delta(Vector3::new(1.0, 0.0, 0.0));
        assert!(yaw.current() > 0.0);

        yaw.update(2.0, &YawInputs::default());
        assert_eq!(yaw.current(), 0.0);
        assert_eq!(yaw.previous(), 0.0);
        assert!(yaw.offset_delta().is_zero());
        assert_eq!(yaw.last_update(), None);
    }

    #[test]
    fn first_frame_only_records_time() {
        let mut yaw = YawTracker::new();
        let mut inputs = enabled();
        inputs.rotate_left = true;
        yaw.update(3.0, &inputs);
        assert_eq!(yaw.current(), 0.0);
        assert_eq!(yaw.last_update(), Some(3.0));
    }

    #[test]
    fn clock_going_backwards_starts_fresh() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_left = true;
        yaw.update(2.0, &inputs);
        assert!(yaw.current() > 0.0);

        yaw.update(0.5, &inputs);
        assert_eq!(yaw.current(), 0.0);
        assert_eq!(yaw.previous(), 0.0);
        assert_eq!(yaw.last_update(), Some(0.5));
    }

    #[test]
    fn same_timestamp_is_a_no_op() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_left = true;
        yaw.update(1.5, &inputs);
        yaw.set_offset_delta(Vector3::new(2.0, -1.0, 0.0));
        let snapshot = yaw.clone();

        yaw.signal_restore(10.0, 20.0);
        yaw.update(1.5, &inputs);
        assert_eq!(yaw.current(), snapshot.current());
        assert_eq!(yaw.previous(), snapshot.previous());
        assert_eq!(yaw.last_update(), snapshot.last_update());
        assert_eq!(yaw.offset_delta(), snapshot.offset_delta());
        assert_eq!(yaw.owes_offset_delta(), snapshot.owes_offset_delta());
        // The signal stays queued for the next real frame.
        assert!(yaw.has_pending_signal());
    }

    #[test]
    fn cleared_delta_is_not_owed_again_at_the_same_time() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_left = true;
        yaw.update(1.5, &inputs);
        assert!(yaw.owes_offset_delta());

        yaw.clear_offset_delta();
        yaw.update(1.5, &inputs);
        assert!(!yaw.owes_offset_delta());

        yaw.update(1.6, &inputs);
        assert!(yaw.owes_offset_delta());
    }

    #[test]
    fn rotate_left_and_right_integrate_speed() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_left = true;
        yaw.update(1.1, &inputs);
        assert!(close(yaw.current(), 21.0));
        assert_eq!(yaw.previous(), 0.0);

        inputs.rotate_left = false;
        inputs.rotate_right = true;
        inputs.yaw_speed = 100.0;
        yaw.update(1.6, &inputs);
        assert!(close(yaw.previous(), 21.0));
        assert!(close(yaw.current(), 331.0));
    }

    #[test]
    fn left_wins_when_both_held() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_left = true;
        inputs.rotate_right = true;
        yaw.update(2.0, &inputs);
        assert!(close(yaw.current(), 210.0));
    }

    #[test]
    fn yaws_stay_in_range() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_right = true;
        inputs.yaw_speed = 1000.0;
        let mut t = 1.0;
        for _ in 0..50 {
            t += 0.37;
            yaw.update(t, &inputs);
            assert!((0.0..360.0).contains(&yaw.current()), "{}", yaw.current());
            assert!((0.0..360.0).contains(&yaw.previous()), "{}", yaw.previous());
        }
    }

    #[test]
    fn restore_normalises_and_is_consumed_once() {
        let mut yaw = active();
        yaw.signal_restore(370.0, -10.0);
        yaw.update(2.0, &enabled());
        assert!(close(yaw.previous(), 10.0));
        assert!(close(yaw.current(), 350.0));
        assert!(!yaw.has_pending_signal());

        yaw.update(3.0, &enabled());
        assert!(close(yaw.previous(), 350.0));
        assert!(close(yaw.current(), 350.0));
    }

    #[test]
    fn restore_beats_rotate_input() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_left = true;
        yaw.signal_restore(5.0, 45.0);
        yaw.update(2.0, &inputs);
        assert!(close(yaw.previous(), 5.0));
        assert!(close(yaw.current(), 45.0));
    }

    #[test]
    fn restore_also_wins_over_pending_spawn() {
        let mut yaw = active();
        yaw.signal_spawn(90.0);
        yaw.signal_restore(0.0, 30.0);
        yaw.update(2.0, &enabled());
        assert!(close(yaw.current(), 30.0));

        // The spawn is applied on the following frame.
        let mut inputs = enabled();
        inputs.view_yaw = 30.0;
        yaw.update(3.0, &inputs);
        assert!(close(yaw.current(), 90.0));
        assert!(!yaw.has_pending_signal());
    }

    #[test]
    fn spawn_aligns_view_with_target() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.view_yaw = 100.0;
        yaw.signal_spawn(40.0);
        yaw.update(2.0, &inputs);
        assert!(close(yaw.current(), 300.0));
        // Spawn alignment is part of the previous yaw, so no delta is owed.
        assert!(close(yaw.previous(), 300.0));
    }

    #[test]
    fn follows_rotating_platform() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.ground_entity = Some(GroundEntity { id: 7, yaw: 10.0 });
        yaw.update(2.0, &inputs);
        // First contact only samples.
        assert_eq!(yaw.current(), 0.0);

        inputs.ground_entity = Some(GroundEntity { id: 7, yaw: 25.0 });
        yaw.update(3.0, &inputs);
        assert!(close(yaw.current(), 15.0));

        // A different entity restarts sampling.
        inputs.ground_entity = Some(GroundEntity { id: 8, yaw: 200.0 });
        yaw.update(4.0, &inputs);
        assert!(close(yaw.current(), 15.0));

        // Leaving the ground clears the sample.
        inputs.ground_entity = None;
        yaw.update(5.0, &inputs);
        inputs.ground_entity = Some(GroundEntity { id: 8, yaw: 260.0 });
        yaw.update(6.0, &inputs);
        assert!(close(yaw.current(), 15.0));
    }

    #[test]
    fn platform_rotation_can_be_switched_off_but_keeps_sampling() {
        let mut yaw = active();
        let mut inputs = enabled();
        inputs.rotate_with_platform = false;
        inputs.ground_entity = Some(GroundEntity { id: 1, yaw: 0.0 });
        yaw.update(2.0, &inputs);
        inputs.ground_entity = Some(GroundEntity { id: 1, yaw: 90.0 });
        yaw.update(3.0, &inputs);
        assert_eq!(yaw.current(), 0.0);

        inputs.rotate_with_platform = true;
        inputs.ground_entity = Some(GroundEntity { id: 1, yaw: 100.0 });
        yaw.update(4.0, &inputs);
        assert!(close(yaw.current(), 10.0));
    }
}
