//! [`FrameSynchronizer`] – the once-per-frame pose pipeline.
//!
//! Each call to [`FrameSynchronizer::update_positions`]:
//!
//! 1. **Refresh** – re-derive the [`ConversionVectors`] from the live
//!    settings and advance the [`YawTracker`].
//! 2. **Wait** – set the tracking universe and block on the runtime for the
//!    poses of this frame.
//! 3. **Resolve** – when the headset is tracked: the headset transform,
//!    both eyes' projection and model-view matrices, and the right hand.
//! 4. **Drive** – place the view-model entity on the right hand, or park it
//!    at the player origin when the hand is missing.
//! 5. **Emit** – send `vrupd_hmd`, `vrupd_lft` and `vrupd_rt` with a shared
//!    timestamp, then advance the timestamp.
//!
//! A frame without a tracked headset stops after step 2 and returns
//! [`FrameOutcome::NoHeadsetPose`]; nothing is emitted and the timestamp
//! stays put.
//!
//! # Example
//!
//! ```rust
//! use hlvr_hal::VrSettings;
//! use hlvr_hal::sim::{CommandLog, ManualClock, SimInput, SimRuntime, SimWorld};
//! use hlvr_math::Vector3;
//! use hlvr_runtime::frame::{FrameOutcome, FrameSynchronizer, Host};
//!
//! let mut runtime = SimRuntime::builder()
//!     .with_headset(Vector3::new(0.0, 1.7, 0.0))
//!     .build();
//! let settings = VrSettings::default();
//! let input = SimInput::default();
//! let clock = ManualClock::new(1.0);
//! let mut world = SimWorld::standing_at(Vector3::ZERO);
//! let mut commands = CommandLog::default();
//!
//! let mut sync = FrameSynchronizer::new();
//! let mut host = Host {
//!     runtime: &mut runtime,
//!     settings: &settings,
//!     input: &input,
//!     clock: &clock,
//!     world: &mut world,
//!     commands: &mut commands,
//! };
//! assert_eq!(sync.update_positions(&mut host), FrameOutcome::Resolved { timestamp: 0 });
//! assert_eq!(commands.commands.len(), 3);
//! ```

use hlvr_hal::{
    Clock, CommandSink, GameWorld, InputSource, SettingsSource, TrackingRuntime, VrSettings,
};
use hlvr_math::{Matrix4, Vector3};
use hlvr_tracking::eye::{self, EyeMatrices, FAR_Z, NEAR_Z, ViewMatrices};
use hlvr_tracking::pose::offset_in_game;
use hlvr_tracking::{ConversionVectors, PoseResolver, ResolveContext, YawInputs, YawTracker};
use hlvr_types::{
    DeviceIndex, Eye, EyeTextures, HMD_DEVICE_INDEX, Hand, HmdMatrix34, PlayerSnapshot, PoseSet,
    ResolvedTransform, TrackedPose, TrackingUniverse, VrError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::protocol::{HandUpdate, HeadsetUpdate};

// ────────────────────────────────────────────────────────────────────────────
// Collaborators and results
// ────────────────────────────────────────────────────────────────────────────

/// Borrowed view of everything the synchronizer talks to in one frame.
pub struct Host<'a> {
    pub runtime: &'a mut dyn TrackingRuntime,
    pub settings: &'a dyn SettingsSource,
    pub input: &'a dyn InputSource,
    pub clock: &'a dyn Clock,
    pub world: &'a mut dyn GameWorld,
    pub commands: &'a mut dyn CommandSink,
}

/// Result of [`FrameSynchronizer::update_positions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameOutcome {
    /// Poses were resolved and the protocol sent with `timestamp`.
    Resolved { timestamp: u32 },
    /// The headset was not tracked (or the wait failed); nothing was sent.
    NoHeadsetPose,
}

/// Result of [`FrameSynchronizer::poll_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Running,
    /// The runtime asked the application to quit.  The runtime has already
    /// been shut down; the caller should exit normally.
    ShutdownRequested,
}

/// Last known state of one controller, kept for the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HandCache {
    pub valid: bool,
    /// Absolute game-space position.
    pub position: Vector3,
    pub angles: Vector3,
    pub velocity: Vector3,
}

/// The headset as resolved in the most recent successful frame.
#[derive(Debug, Clone, Copy)]
struct HeadsetFrame {
    raw: HmdMatrix34,
    absolute: Matrix4,
}

// ────────────────────────────────────────────────────────────────────────────
// FrameSynchronizer
// ────────────────────────────────────────────────────────────────────────────

/// Owns all per-session pose state.  See the module docs for the pipeline.
#[derive(Debug, Default)]
pub struct FrameSynchronizer {
    conversion: ConversionVectors,
    yaw: YawTracker,
    resolver: PoseResolver,
    views: ViewMatrices,
    headset: Option<HeadsetFrame>,
    view_origin: Vector3,
    left: HandCache,
    right: HandCache,
    timestamp: u32,
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Signals ─────────────────────────────────────────────────────────────

    /// A save game or level change restored both yaws.
    pub fn signal_restore(&mut self, previous_yaw: f32, current_yaw: f32) {
        debug!(previous_yaw, current_yaw, "restore yaw queued");
        self.yaw.signal_restore(previous_yaw, current_yaw);
    }

    /// The player spawned facing `target_yaw`.
    pub fn signal_spawn(&mut self, target_yaw: f32) {
        debug!(target_yaw, "spawn yaw queued");
        self.yaw.signal_spawn(target_yaw);
    }

    // ── Per-frame entry points ──────────────────────────────────────────────

    /// Drain runtime events.  Also refreshes conversion and yaw, which is a
    /// no-op when [`update_positions`](Self::update_positions) already ran at
    /// the same client time.
    pub fn poll_events(&mut self, host: &mut Host<'_>) -> SessionStatus {
        let settings = host.settings.settings();
        self.refresh(&settings, host);

        while let Some(event) = host.runtime.poll_event() {
            if event.is_quit() {
                info!(?event, "runtime requested shutdown");
                host.runtime.shutdown();
                return SessionStatus::ShutdownRequested;
            }
            trace!(?event, "ignoring runtime event");
        }
        SessionStatus::Running
    }

    /// Run the pose pipeline for one frame.
    #[instrument(name = "frame", skip_all, fields(timestamp = self.timestamp))]
    pub fn update_positions(&mut self, host: &mut Host<'_>) -> FrameOutcome {
        let settings = host.settings.settings();
        self.refresh(&settings, host);

        host.runtime.set_tracking_universe(if settings.room_scale {
            TrackingUniverse::Standing
        } else {
            TrackingUniverse::Seated
        });

        let poses = match host.runtime.wait_get_poses() {
            Ok(poses) => poses,
            Err(e) => {
                warn!(error = %e, "pose wait failed");
                return FrameOutcome::NoHeadsetPose;
            }
        };

        let Some(hmd) = poses.hmd().filter(|p| p.is_nominal()).copied() else {
            debug!("headset not tracked this frame");
            return FrameOutcome::NoHeadsetPose;
        };

        let ctx = ResolveContext {
            conversion: self.conversion,
            ducking: host.input.is_ducking(),
            turn_enabled: settings.player_turn_enabled,
        };

        let absolute = self
            .resolver
            .resolve_headset(&hmd.device_to_absolute, &mut self.yaw, &ctx);
        let headset = HeadsetFrame {
            raw: hmd.device_to_absolute,
            absolute,
        };
        self.headset = Some(headset);

        let player = host.world.local_player();
        let ground = player.ground_position();
        self.view_origin = ground + offset_in_game(&absolute, &self.conversion);
        self.views = ViewMatrices {
            left: self.eye_matrices(Eye::Left, &headset, ground, &*host.runtime),
            right: self.eye_matrices(Eye::Right, &headset, ground, &*host.runtime),
        };

        self.update_view_model(host, &poses, &headset, &ctx, &player);
        let timestamp = self.send_position_update(host, &poses, &headset, &ctx, &player);
        FrameOutcome::Resolved { timestamp }
    }

    /// Hand both eye textures to the compositor and release the frame.
    ///
    /// # Errors
    ///
    /// Propagates the first [`VrError::Compositor`] from the runtime.
    pub fn submit_frame(
        &self,
        runtime: &mut dyn TrackingRuntime,
        textures: EyeTextures,
    ) -> Result<(), VrError> {
        runtime.submit(Eye::Left, textures.left)?;
        runtime.submit(Eye::Right, textures.right)?;
        runtime.post_present_handoff();
        Ok(())
    }

    // ── Renderer queries ────────────────────────────────────────────────────

    pub fn view_matrices(&self) -> &ViewMatrices {
        &self.views
    }

    pub fn eye(&self, eye: Eye) -> &EyeMatrices {
        self.views.eye(eye)
    }

    /// Camera angles for `eye` from the latest model-view matrix.
    pub fn view_angles(&self, eye: Eye) -> Vector3 {
        self.views.view_angles(eye)
    }

    /// Game-space position of the headset in the latest frame.
    pub fn view_origin(&self) -> Vector3 {
        self.view_origin
    }

    /// Absolute headset transform of the latest resolved frame.
    pub fn headset_transform(&self) -> Option<Matrix4> {
        self.headset.map(|h| h.absolute)
    }

    pub fn is_left_controller_valid(&self) -> bool {
        self.left.valid
    }

    pub fn is_right_controller_valid(&self) -> bool {
        self.right.valid
    }

    pub fn left_hand_position(&self) -> Vector3 {
        self.left.position
    }

    pub fn left_hand_angles(&self) -> Vector3 {
        self.left.angles
    }

    pub fn left_hand_velocity(&self) -> Vector3 {
        self.left.velocity
    }

    pub fn right_hand_position(&self) -> Vector3 {
        self.right.position
    }

    pub fn right_hand_angles(&self) -> Vector3 {
        self.right.angles
    }

    pub fn right_hand_velocity(&self) -> Vector3 {
        self.right.velocity
    }

    pub fn conversion(&self) -> &ConversionVectors {
        &self.conversion
    }

    pub fn yaw(&self) -> &YawTracker {
        &self.yaw
    }

    /// Timestamp the next emitted frame will carry.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn refresh(&mut self, settings: &VrSettings, host: &Host<'_>) {
        self.conversion = ConversionVectors::derive(settings.world_scale, settings.world_z_stretch);

        let inputs = YawInputs {
            turn_enabled: settings.player_turn_enabled,
            rotate_left: host.input.rotate_left(),
            rotate_right: host.input.rotate_right(),
            yaw_speed: settings.yaw_speed,
            rotate_with_platform: settings.rotate_with_trains,
            ground_entity: host.world.local_player().ground_entity,
            view_yaw: self.views.view_angles(Eye::Left).y,
        };
        self.yaw.update(host.clock.now(), &inputs);
    }

    fn eye_matrices(
        &self,
        eye: Eye,
        headset: &HeadsetFrame,
        ground: Vector3,
        runtime: &dyn TrackingRuntime,
    ) -> EyeMatrices {
        EyeMatrices {
            projection: eye::projection(&runtime.projection_matrix(eye, NEAR_Z, FAR_Z)),
            model_view: eye::eye_view(
                &runtime.eye_to_head(eye),
                &headset.absolute,
                ground,
                &self.conversion,
            ),
        }
    }

    /// Device index and pose of `hand` when it is usable this frame.
    fn hand_pose(
        hand: Hand,
        poses: &PoseSet,
        runtime: &dyn TrackingRuntime,
    ) -> Option<(DeviceIndex, TrackedPose)> {
        let index = runtime.controller_index(hand)?;
        if index == HMD_DEVICE_INDEX {
            return None;
        }
        let pose = poses.get(index)?;
        pose.is_usable().then_some((index, *pose))
    }

    fn resolve_hand(
        &self,
        pose: &TrackedPose,
        headset: &HeadsetFrame,
        ctx: &ResolveContext,
    ) -> ResolvedTransform {
        let (_, resolved) =
            self.resolver
                .resolve_hand(pose, &headset.raw, &headset.absolute, &self.yaw, ctx);
        resolved
    }

    fn update_view_model(
        &mut self,
        host: &mut Host<'_>,
        poses: &PoseSet,
        headset: &HeadsetFrame,
        ctx: &ResolveContext,
        player: &PlayerSnapshot,
    ) {
        let right = Self::hand_pose(Hand::Right, poses, &*host.runtime)
            .map(|(_, pose)| self.resolve_hand(&pose, headset, ctx));
        let scale = self.conversion.view_model_scale();

        let Some(view_model) = host.world.view_model_mut() else {
            return;
        };

        match right {
            Some(hand) => {
                let position = player.ground_position() + hand.offset;
                view_model.origin = position;
                view_model.prev_origin = position;
                view_model.angles = hand.angles;
                view_model.prev_angles = hand.angles;
                view_model.velocity = hand.velocity;
                self.right = HandCache {
                    valid: true,
                    position,
                    angles: hand.angles,
                    velocity: hand.velocity,
                };
            }
            None => {
                // Keep the model around at the player so the left hand still
                // renders; the renderer skips it while the flag is down.
                view_model.origin = player.origin;
                view_model.prev_origin = player.origin;
                self.right.valid = false;
            }
        }
        view_model.scale = scale;
    }

    fn send_position_update(
        &mut self,
        host: &mut Host<'_>,
        poses: &PoseSet,
        headset: &HeadsetFrame,
        ctx: &ResolveContext,
        player: &PlayerSnapshot,
    ) -> u32 {
        let timestamp = self.timestamp;

        let mut hmd_offset = offset_in_game(&headset.absolute, &self.conversion);
        hmd_offset.z += player.mins_z;

        let left = match Self::hand_pose(Hand::Left, poses, &*host.runtime) {
            Some((index, pose)) => {
                let hand = self.resolve_hand(&pose, headset, ctx);
                self.left = HandCache {
                    valid: true,
                    position: player.ground_position() + hand.offset,
                    angles: hand.angles,
                    velocity: hand.velocity,
                };
                let mut offset = hand.offset;
                offset.z += player.mins_z;
                HandUpdate {
                    hand: Hand::Left,
                    timestamp,
                    valid: true,
                    offset,
                    angles: hand.angles,
                    velocity: hand.velocity,
                    drag_on: host.input.is_drag_on(index),
                }
            }
            None => {
                self.left.valid = false;
                HandUpdate::invalid(Hand::Left, timestamp)
            }
        };

        let right_index = Self::hand_pose(Hand::Right, poses, &*host.runtime).map(|(i, _)| i);
        let mut right = HandUpdate::invalid(Hand::Right, timestamp);
        if let Some(index) = right_index {
            right.valid = true;
            if let Some(view_model) = host.world.view_model_mut() {
                right.offset = view_model.origin - player.origin;
                right.angles = view_model.angles;
                right.velocity = view_model.velocity;
                right.drag_on = host.input.is_drag_on(index);
            }
        }

        let hmd = HeadsetUpdate {
            timestamp,
            offset: hmd_offset,
            yaw_offset_delta: self.yaw.offset_delta(),
            previous_yaw: self.yaw.previous(),
            current_yaw: self.yaw.current(),
        };
        self.yaw.clear_offset_delta();

        host.commands.client_cmd(&hmd.to_string());
        host.commands.client_cmd(&left.to_string());
        host.commands.client_cmd(&right.to_string());
        trace!(
            timestamp,
            left = left.valid,
            right = right.valid,
            "position update sent"
        );

        self.timestamp = self.timestamp.wrapping_add(1);
        timestamp
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
