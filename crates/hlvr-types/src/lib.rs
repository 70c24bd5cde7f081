//! `hlvr-types` – data shared between the tracking core, the collaborator
//! traits and the frame synchronizer.
//!
//! Tracking-space values (meters, +Y up) come straight from the VR runtime;
//! game-space values (engine units, +Z up) are produced by `hlvr-tracking`.
//! Field docs say which space a value lives in.

use hlvr_math::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a tracked device in the runtime's pose array.
pub type DeviceIndex = u32;

/// The headset always occupies slot 0.
pub const HMD_DEVICE_INDEX: DeviceIndex = 0;

/// Size of the pose array delivered every frame.
pub const MAX_TRACKED_DEVICES: usize = 64;

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eye {
    Left,
    Right,
}

/// Controller role as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

/// Origin the runtime reports poses against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingUniverse {
    /// Origin at the calibrated seated head position.
    Seated,
    /// Origin on the floor at the centre of the play area.
    Standing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingResult {
    Uninitialized,
    CalibratingInProgress,
    CalibratingOutOfRange,
    RunningOk,
    RunningOutOfRange,
}

/// Events drained from the runtime once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeEvent {
    Quit,
    ProcessQuit,
    QuitAbortedUserPrompt,
    QuitAcknowledged,
    DriverRequestedQuit,
    /// Anything this crate does not act on, carrying the runtime's raw code.
    Other(u32),
}

impl RuntimeEvent {
    /// `true` for every event that ends the session.
    pub fn is_quit(&self) -> bool {
        !matches!(self, RuntimeEvent::Other(_))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Raw runtime matrices
// ────────────────────────────────────────────────────────────────────────────

/// Row-major 3x4 affine transform as delivered by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HmdMatrix34 {
    pub m: [[f32; 4]; 3],
}

impl HmdMatrix34 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Identity rotation placed at `position` (tracking-space meters).
    pub fn from_position(position: Vector3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][3] = position.x;
        out.m[1][3] = position.y;
        out.m[2][3] = position.z;
        out
    }

    pub fn position(&self) -> Vector3 {
        Vector3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }
}

impl Default for HmdMatrix34 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Row-major 4x4 matrix as delivered by the runtime (projections).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HmdMatrix44 {
    pub m: [[f32; 4]; 4],
}

impl Default for HmdMatrix44 {
    fn default() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Poses
// ────────────────────────────────────────────────────────────────────────────

/// One device's pose for the current frame.  Read-only inside the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedPose {
    /// Device-to-absolute-tracking transform (tracking space).
    pub device_to_absolute: HmdMatrix34,
    /// Linear velocity in tracking space (m/s).
    pub velocity: Vector3,
    pub tracking_result: TrackingResult,
    pub pose_is_valid: bool,
    pub device_is_connected: bool,
}

impl TrackedPose {
    /// A connected, valid, nominally tracked device at `transform`.
    pub fn tracked(transform: HmdMatrix34) -> Self {
        Self {
            device_to_absolute: transform,
            velocity: Vector3::ZERO,
            tracking_result: TrackingResult::RunningOk,
            pose_is_valid: true,
            device_is_connected: true,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            device_to_absolute: HmdMatrix34::IDENTITY,
            velocity: Vector3::ZERO,
            tracking_result: TrackingResult::Uninitialized,
            pose_is_valid: false,
            device_is_connected: false,
        }
    }

    /// Connected and valid; enough for a controller.
    pub fn is_usable(&self) -> bool {
        self.device_is_connected && self.pose_is_valid
    }

    /// Usable and running OK; required for the headset.
    pub fn is_nominal(&self) -> bool {
        self.is_usable() && self.tracking_result == TrackingResult::RunningOk
    }
}

impl Default for TrackedPose {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// The full pose array for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSet {
    poses: Vec<TrackedPose>,
}

impl PoseSet {
    pub fn new(poses: Vec<TrackedPose>) -> Self {
        Self { poses }
    }

    pub fn get(&self, index: DeviceIndex) -> Option<&TrackedPose> {
        self.poses.get(index as usize)
    }

    pub fn hmd(&self) -> Option<&TrackedPose> {
        self.get(HMD_DEVICE_INDEX)
    }

    pub fn set(&mut self, index: DeviceIndex, pose: TrackedPose) {
        let i = index as usize;
        if i >= self.poses.len() {
            self.poses.resize(i + 1, TrackedPose::disconnected());
        }
        self.poses[i] = pose;
    }
}

impl Default for PoseSet {
    fn default() -> Self {
        Self::new(vec![TrackedPose::disconnected(); MAX_TRACKED_DEVICES])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulation-side state
// ────────────────────────────────────────────────────────────────────────────

/// Entity the player is standing on (platform, train, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundEntity {
    pub id: i32,
    /// Current yaw of the entity (degrees).
    pub yaw: f32,
}

/// What the core needs to know about the local player each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player origin (game space).
    pub origin: Vector3,
    /// Bottom of the player's bounding box relative to `origin`.
    pub mins_z: f32,
    pub ground_entity: Option<GroundEntity>,
}

impl PlayerSnapshot {
    /// The point between the player's feet (game space).
    pub fn ground_position(&self) -> Vector3 {
        Vector3::new(self.origin.x, self.origin.y, self.origin.z + self.mins_z)
    }
}

/// The first-person weapon model, driven by the right controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewModelEntity {
    pub origin: Vector3,
    /// Latched origin used for interpolation.
    pub prev_origin: Vector3,
    pub angles: Vector3,
    pub prev_angles: Vector3,
    pub velocity: Vector3,
    pub scale: f32,
}

impl Default for ViewModelEntity {
    fn default() -> Self {
        Self {
            origin: Vector3::ZERO,
            prev_origin: Vector3::ZERO,
            angles: Vector3::ZERO,
            prev_angles: Vector3::ZERO,
            velocity: Vector3::ZERO,
            scale: 1.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resolved output
// ────────────────────────────────────────────────────────────────────────────

/// A device resolved into game space for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTransform {
    /// Offset from the player's feet.
    pub offset: Vector3,
    /// `(pitch, yaw, roll)` in degrees.
    pub angles: Vector3,
    pub velocity: Vector3,
    pub valid: bool,
}

/// Opaque platform texture handle.  Owned by the renderer; the core only
/// passes it through to the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeTextures {
    pub left: TextureHandle,
    pub right: TextureHandle,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Failures surfaced by the VR subsystem.
///
/// Setup variants are terminal: the binary prints the message and exits.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VrError {
    #[error(
        "Software mode not supported. Please start this game with the OpenGL renderer."
    )]
    SoftwareRenderer,

    #[error("Failed to load necessary graphics functions: {0}")]
    GraphicsUnavailable(String),

    #[error(
        "Failed to initialize VR environment: {0}. Make sure your headset is properly connected and the VR runtime is running."
    )]
    RuntimeUnavailable(String),

    #[error("Failed to initialize {0} for the VR environment. Make sure you have a graphics card that can handle VR and up-to-date drivers.")]
    RenderTargetUnavailable(String),

    #[error("Compositor error: {0}")]
    Compositor(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_events_are_recognised() {
        assert!(RuntimeEvent::Quit.is_quit());
        assert!(RuntimeEvent::DriverRequestedQuit.is_quit());
        assert!(RuntimeEvent::QuitAcknowledged.is_quit());
        assert!(!RuntimeEvent::Other(200).is_quit());
    }

    #[test]
    fn pose_usability_rules() {
        let mut pose = TrackedPose::tracked(HmdMatrix34::IDENTITY);
        assert!(pose.is_usable());
        assert!(pose.is_nominal());

        pose.tracking_result = TrackingResult::RunningOutOfRange;
        assert!(pose.is_usable());
        assert!(!pose.is_nominal());

        pose.pose_is_valid = false;
        assert!(!pose.is_usable());
        assert!(!TrackedPose::disconnected().is_usable());
    }

    #[test]
    fn pose_set_grows_on_set() {
        let mut set = PoseSet::new(Vec::new());
        assert!(set.hmd().is_none());
        set.set(3, TrackedPose::tracked(HmdMatrix34::IDENTITY));
        assert!(set.get(3).unwrap().is_usable());
        assert!(!set.get(0).unwrap().is_usable());
        assert_eq!(PoseSet::default().get(63).copied(), Some(TrackedPose::disconnected()));
    }

    #[test]
    fn ground_position_adds_mins() {
        let player = PlayerSnapshot {
            origin: Vector3::new(10.0, 20.0, 36.0),
            mins_z: -36.0,
            ground_entity: None,
        };
        assert_eq!(player.ground_position(), Vector3::new(10.0, 20.0, 0.0));
    }

    #[test]
    fn hmd_matrix_position_round_trip() {
        let m = HmdMatrix34::from_position(Vector3::new(0.1, 1.6, -0.3));
        assert_eq!(m.position(), Vector3::new(0.1, 1.6, -0.3));
        assert_eq!(m.m[0][0], 1.0);
    }

    #[test]
    fn tracked_pose_serialization_roundtrip() {
        let pose = TrackedPose::tracked(HmdMatrix34::from_position(Vector3::new(0.0, 1.7, 0.0)));
        let json = serde_json::to_string(&pose).unwrap();
        let back: TrackedPose = serde_json::from_str(&json).unwrap();
        assert_eq!(pose, back);
    }

    #[test]
    fn vr_error_display() {
        let err = VrError::RuntimeUnavailable("no HMD".to_string());
        assert!(err.to_string().contains("no HMD"));
        let err = VrError::RenderTargetUnavailable("eye textures".to_string());
        assert!(err.to_string().contains("eye textures"));
    }
}
