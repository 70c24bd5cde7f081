//! In-process stubs for headless tests and CI.
//!
//! Every trait in this crate has a stub here that records what it was asked
//! to do and returns scripted data.  The frame loop can then run end to end
//! without a headset, a GPU or a game engine.
//!
//! | Stub | Behaviour |
//! |---|---|
//! | [`SimRuntime`] | Serves a scripted [`PoseSet`], a fixed IPD and a queue of events; records universe, submissions and handoffs. |
//! | [`SimInput`] | Plain flags. |
//! | [`ManualClock`] | Returns whatever time it was last set to. |
//! | [`SimWorld`] | A player snapshot and an optional view-model entity. |
//! | [`CommandLog`] | Appends every command to a `Vec<String>`. |
//! | [`SimGraphics`] | Hands out increasing handles; each capability can be switched off. |
//!
//! # Example
//!
//! ```rust
//! use hlvr_hal::TrackingRuntime;
//! use hlvr_hal::sim::SimRuntime;
//! use hlvr_math::Vector3;
//! use hlvr_types::Hand;
//!
//! let mut runtime = SimRuntime::builder()
//!     .with_headset(Vector3::new(0.0, 1.7, 0.0))
//!     .with_controller(Hand::Right, 1, Vector3::new(0.3, 1.2, -0.3))
//!     .build();
//!
//! runtime.init().unwrap();
//! let poses = runtime.wait_get_poses().unwrap();
//! assert!(poses.hmd().unwrap().is_nominal());
//! assert_eq!(runtime.controller_index(Hand::Right), Some(1));
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use hlvr_math::Vector3;
use hlvr_types::{
    DeviceIndex, Eye, HMD_DEVICE_INDEX, Hand, HmdMatrix34, HmdMatrix44, PlayerSnapshot, PoseSet,
    RuntimeEvent, TextureHandle, TrackedPose, TrackingUniverse, ViewModelEntity, VrError,
};
use tracing::debug;

use crate::graphics::{FramebufferHandle, RenderBackend};
use crate::host::{Clock, CommandSink, GameWorld, InputSource};
use crate::runtime::TrackingRuntime;

/// Interpupillary distance used unless the builder overrides it (meters).
pub const DEFAULT_IPD: f32 = 0.064;

/// Horizontal and vertical field of view of the simulated lenses (degrees).
const SIM_FOV_DEGREES: f32 = 100.0;

// ────────────────────────────────────────────────────────────────────────────
// SimRuntime
// ────────────────────────────────────────────────────────────────────────────

/// Scripted [`TrackingRuntime`].
#[derive(Debug, Clone)]
pub struct SimRuntime {
    poses: PoseSet,
    controllers: HashMap<Hand, DeviceIndex>,
    events: VecDeque<RuntimeEvent>,
    ipd: f32,
    render_target: (u32, u32),
    init_error: Option<String>,
    wait_error: Option<String>,
    universe: Option<TrackingUniverse>,
    submitted: Vec<(Eye, TextureHandle)>,
    handoffs: u32,
    waits: u32,
    shut_down: bool,
}

impl SimRuntime {
    pub fn builder() -> SimRuntimeBuilder {
        SimRuntimeBuilder::default()
    }

    pub fn set_pose(&mut self, index: DeviceIndex, pose: TrackedPose) {
        self.poses.set(index, pose);
    }

    /// Replace the headset transform, keeping its flags.
    pub fn set_headset(&mut self, transform: HmdMatrix34) {
        let mut pose = self
            .poses
            .hmd()
            .copied()
            .unwrap_or_else(|| TrackedPose::tracked(transform));
        pose.device_to_absolute = transform;
        self.poses.set(HMD_DEVICE_INDEX, pose);
    }

    pub fn push_event(&mut self, event: RuntimeEvent) {
        self.events.push_back(event);
    }

    /// Make every following [`TrackingRuntime::wait_get_poses`] fail (or
    /// succeed again with `None`).
    pub fn set_wait_error(&mut self, error: Option<String>) {
        self.wait_error = error;
    }

    /// Universe set by the most recent call, if any.
    pub fn tracking_universe(&self) -> Option<TrackingUniverse> {
        self.universe
    }

    pub fn submitted(&self) -> &[(Eye, TextureHandle)] {
        &self.submitted
    }

    pub fn handoffs(&self) -> u32 {
        self.handoffs
    }

    pub fn wait_count(&self) -> u32 {
        self.waits
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl TrackingRuntime for SimRuntime {
    fn init(&mut self) -> Result<(), VrError> {
        match &self.init_error {
            Some(reason) => Err(VrError::RuntimeUnavailable(reason.clone())),
            None => {
                self.shut_down = false;
                Ok(())
            }
        }
    }

    fn set_tracking_universe(&mut self, universe: TrackingUniverse) {
        self.universe = Some(universe);
    }

    fn wait_get_poses(&mut self) -> Result<PoseSet, VrError> {
        self.waits += 1;
        if let Some(reason) = &self.wait_error {
            return Err(VrError::Compositor(reason.clone()));
        }
        Ok(self.poses.clone())
    }

    fn controller_index(&self, hand: Hand) -> Option<DeviceIndex> {
        self.controllers.get(&hand).copied()
    }

    fn projection_matrix(&self, _eye: Eye, near_z: f32, far_z: f32) -> HmdMatrix44 {
        let f = 1.0 / (SIM_FOV_DEGREES.to_radians() * 0.5).tan();
        let depth = far_z - near_z;
        HmdMatrix44 {
            m: [
                [f, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, -far_z / depth, -far_z * near_z / depth],
                [0.0, 0.0, -1.0, 0.0],
            ],
        }
    }

    fn eye_to_head(&self, eye: Eye) -> HmdMatrix34 {
        let half = self.ipd * 0.5;
        let x = match eye {
            Eye::Left => -half,
            Eye::Right => half,
        };
        HmdMatrix34::from_position(Vector3::new(x, 0.0, 0.0))
    }

    fn recommended_render_target_size(&self) -> (u32, u32) {
        self.render_target
    }

    fn poll_event(&mut self) -> Option<RuntimeEvent> {
        self.events.pop_front()
    }

    fn submit(&mut self, eye: Eye, texture: TextureHandle) -> Result<(), VrError> {
        self.submitted.push((eye, texture));
        Ok(())
    }

    fn post_present_handoff(&mut self) {
        self.handoffs += 1;
    }

    fn shutdown(&mut self) {
        debug!("sim runtime shut down");
        self.shut_down = true;
    }
}

/// Builder for [`SimRuntime`].
#[derive(Debug)]
pub struct SimRuntimeBuilder {
    poses: PoseSet,
    controllers: HashMap<Hand, DeviceIndex>,
    events: VecDeque<RuntimeEvent>,
    ipd: f32,
    render_target: (u32, u32),
    init_error: Option<String>,
}

impl Default for SimRuntimeBuilder {
    fn default() -> Self {
        Self {
            poses: PoseSet::default(),
            controllers: HashMap::new(),
            events: VecDeque::new(),
            ipd: DEFAULT_IPD,
            render_target: (1512, 1680),
            init_error: None,
        }
    }
}

impl SimRuntimeBuilder {
    /// Tracked headset at `position` (tracking meters), facing -Z.
    pub fn with_headset(mut self, position: Vector3) -> Self {
        self.poses.set(
            HMD_DEVICE_INDEX,
            TrackedPose::tracked(HmdMatrix34::from_position(position)),
        );
        self
    }

    /// Tracked controller for `hand` in slot `index`.
    pub fn with_controller(mut self, hand: Hand, index: DeviceIndex, position: Vector3) -> Self {
        self.poses
            .set(index, TrackedPose::tracked(HmdMatrix34::from_position(position)));
        self.controllers.insert(hand, index);
        self
    }

    /// Arbitrary pose in slot `index`, without assigning a role.
    pub fn with_pose(mut self, index: DeviceIndex, pose: TrackedPose) -> Self {
        self.poses.set(index, pose);
        self
    }

    /// Assign a role to a slot without touching its pose.
    pub fn with_role(mut self, hand: Hand, index: DeviceIndex) -> Self {
        self.controllers.insert(hand, index);
        self
    }

    pub fn with_event(mut self, event: RuntimeEvent) -> Self {
        self.events.push_back(event);
        self
    }

    pub fn with_ipd(mut self, ipd: f32) -> Self {
        self.ipd = ipd;
        self
    }

    pub fn with_render_target(mut self, width: u32, height: u32) -> Self {
        self.render_target = (width, height);
        self
    }

    /// Make [`TrackingRuntime::init`] fail with `reason`.
    pub fn failing_init(mut self, reason: impl Into<String>) -> Self {
        self.init_error = Some(reason.into());
        self
    }

    pub fn build(self) -> SimRuntime {
        SimRuntime {
            poses: self.poses,
            controllers: self.controllers,
            events: self.events,
            ipd: self.ipd,
            render_target: self.render_target,
            init_error: self.init_error,
            wait_error: None,
            universe: None,
            submitted: Vec::new(),
            handoffs: 0,
            waits: 0,
            shut_down: false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Host stubs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SimInput {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub ducking: bool,
    pub dragging: HashSet<DeviceIndex>,
}

impl InputSource for SimInput {
    fn rotate_left(&self) -> bool {
        self.rotate_left
    }

    fn rotate_right(&self) -> bool {
        self.rotate_right
    }

    fn is_ducking(&self) -> bool {
        self.ducking
    }

    fn is_drag_on(&self, device: DeviceIndex) -> bool {
        self.dragging.contains(&device)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualClock {
    now: f32,
}

impl ManualClock {
    pub fn new(now: f32) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: f32) {
        self.now = now;
    }

    pub fn advance(&mut self, seconds: f32) {
        self.now += seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f32 {
        self.now
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    pub player: PlayerSnapshot,
    pub view_model: Option<ViewModelEntity>,
}

impl SimWorld {
    /// Player standing at `origin` with the default hull (`mins.z = -36`)
    /// and a view model.
    pub fn standing_at(origin: Vector3) -> Self {
        Self {
            player: PlayerSnapshot {
                origin,
                mins_z: -36.0,
                ground_entity: None,
            },
            view_model: Some(ViewModelEntity::default()),
        }
    }
}

impl GameWorld for SimWorld {
    fn local_player(&self) -> PlayerSnapshot {
        self.player
    }

    fn view_model_mut(&mut self) -> Option<&mut ViewModelEntity> {
        self.view_model.as_mut()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandLog {
    pub commands: Vec<String>,
}

impl CommandSink for CommandLog {
    fn client_cmd(&mut self, command: &str) {
        self.commands.push(command.to_string());
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimGraphics
// ────────────────────────────────────────────────────────────────────────────

/// Stub [`RenderBackend`].  Everything works unless switched off.
#[derive(Debug, Clone)]
pub struct SimGraphics {
    pub hardware: bool,
    pub functions_available: bool,
    pub matrix_override_available: bool,
    pub textures_available: bool,
    pub framebuffers_available: bool,
    pub viewport: (u32, u32),
    next_handle: u64,
    created_textures: Vec<(TextureHandle, u32, u32)>,
}

impl Default for SimGraphics {
    fn default() -> Self {
        Self {
            hardware: true,
            functions_available: true,
            matrix_override_available: true,
            textures_available: true,
            framebuffers_available: true,
            viewport: (1280, 720),
            next_handle: 1,
            created_textures: Vec::new(),
        }
    }
}

impl SimGraphics {
    /// Report a software renderer when `false`.
    pub fn with_hardware(mut self, hardware: bool) -> Self {
        self.hardware = hardware;
        self
    }

    pub fn with_functions(mut self, available: bool) -> Self {
        self.functions_available = available;
        self
    }

    pub fn with_matrix_override(mut self, available: bool) -> Self {
        self.matrix_override_available = available;
        self
    }

    /// Make every [`RenderBackend::create_texture`] fail when `false`.
    pub fn with_textures(mut self, available: bool) -> Self {
        self.textures_available = available;
        self
    }

    pub fn with_framebuffers(mut self, available: bool) -> Self {
        self.framebuffers_available = available;
        self
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn created_textures(&self) -> &[(TextureHandle, u32, u32)] {
        &self.created_textures
    }

    fn next(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl RenderBackend for SimGraphics {
    fn is_hardware(&self) -> bool {
        self.hardware
    }

    fn load_functions(&mut self) -> Result<(), String> {
        if self.functions_available {
            Ok(())
        } else {
            Err("glBindFramebuffer".to_string())
        }
    }

    fn install_matrix_override(&mut self) -> Result<(), String> {
        if self.matrix_override_available {
            Ok(())
        } else {
            Err("matrix override hook not present".to_string())
        }
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Option<TextureHandle> {
        if !self.textures_available {
            return None;
        }
        let handle = TextureHandle(self.next());
        self.created_textures.push((handle, width, height));
        Some(handle)
    }

    fn create_framebuffer(
        &mut self,
        _texture: TextureHandle,
        _width: u32,
        _height: u32,
    ) -> Option<FramebufferHandle> {
        if !self.framebuffers_available {
            return None;
        }
        Some(FramebufferHandle(self.next()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_runtime_serves_scripted_poses() {
        let mut runtime = SimRuntime::builder()
            .with_headset(Vector3::new(0.0, 1.7, 0.0))
            .with_controller(Hand::Left, 2, Vector3::new(-0.3, 1.1, 0.0))
            .build();

        let poses = runtime.wait_get_poses().unwrap();
        assert_eq!(poses.hmd().unwrap().device_to_absolute.position().y, 1.7);
        assert!(poses.get(2).unwrap().is_usable());
        assert!(!poses.get(1).unwrap().is_usable());
        assert_eq!(runtime.controller_index(Hand::Left), Some(2));
        assert_eq!(runtime.controller_index(Hand::Right), None);
        assert_eq!(runtime.wait_count(), 1);
    }

    #[test]
    fn sim_runtime_init_failure() {
        let mut runtime = SimRuntime::builder().failing_init("no headset").build();
        assert_eq!(
            runtime.init(),
            Err(VrError::RuntimeUnavailable("no headset".to_string()))
        );
    }

    #[test]
    fn sim_runtime_wait_failure_is_reported() {
        let mut runtime = SimRuntime::builder().build();
        runtime.set_wait_error(Some("not focused".to_string()));
        assert!(matches!(runtime.wait_get_poses(), Err(VrError::Compositor(_))));
        runtime.set_wait_error(None);
        assert!(runtime.wait_get_poses().is_ok());
    }

    #[test]
    fn sim_runtime_events_are_fifo() {
        let mut runtime = SimRuntime::builder()
            .with_event(RuntimeEvent::Other(1))
            .with_event(RuntimeEvent::Quit)
            .build();
        assert_eq!(runtime.poll_event(), Some(RuntimeEvent::Other(1)));
        assert_eq!(runtime.poll_event(), Some(RuntimeEvent::Quit));
        assert_eq!(runtime.poll_event(), None);
    }

    #[test]
    fn sim_runtime_eyes_are_ipd_apart() {
        let runtime = SimRuntime::builder().with_ipd(0.07).build();
        let left = runtime.eye_to_head(Eye::Left).position();
        let right = runtime.eye_to_head(Eye::Right).position();
        assert!((right.x - left.x - 0.07).abs() < 1e-6);
    }

    #[test]
    fn sim_runtime_records_submissions() {
        let mut runtime = SimRuntime::builder().build();
        runtime.submit(Eye::Left, TextureHandle(4)).unwrap();
        runtime.submit(Eye::Right, TextureHandle(5)).unwrap();
        runtime.post_present_handoff();
        runtime.set_tracking_universe(TrackingUniverse::Seated);
        assert_eq!(runtime.submitted().len(), 2);
        assert_eq!(runtime.handoffs(), 1);
        assert_eq!(runtime.tracking_universe(), Some(TrackingUniverse::Seated));
    }

    #[test]
    fn set_headset_keeps_flags() {
        let mut runtime = SimRuntime::builder().build();
        let mut lost = TrackedPose::tracked(HmdMatrix34::IDENTITY);
        lost.pose_is_valid = false;
        runtime.set_pose(HMD_DEVICE_INDEX, lost);
        runtime.set_headset(HmdMatrix34::from_position(Vector3::new(1.0, 2.0, 3.0)));
        let poses = runtime.wait_get_poses().unwrap();
        let hmd = poses.hmd().unwrap();
        assert!(!hmd.pose_is_valid);
        assert_eq!(hmd.device_to_absolute.position(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn sim_graphics_hands_out_distinct_handles() {
        let mut graphics = SimGraphics::default();
        let a = graphics.create_texture(10, 10).unwrap();
        let b = graphics.create_texture(10, 10).unwrap();
        let fb = graphics.create_framebuffer(a, 10, 10).unwrap();
        assert_ne!(a, b);
        assert_ne!(fb.0, b.0);
        assert_eq!(graphics.created_textures().len(), 2);

        graphics.textures_available = false;
        assert!(graphics.create_texture(1, 1).is_none());
    }

    #[test]
    fn sim_graphics_setters_switch_capabilities() {
        let mut graphics = SimGraphics::default()
            .with_hardware(false)
            .with_functions(false)
            .with_matrix_override(false)
            .with_framebuffers(false)
            .with_viewport(640, 480);
        assert!(!graphics.is_hardware());
        assert!(graphics.load_functions().is_err());
        assert!(graphics.install_matrix_override().is_err());
        assert_eq!(graphics.viewport_size(), (640, 480));

        let texture = graphics.create_texture(8, 8).unwrap();
        assert!(graphics.create_framebuffer(texture, 8, 8).is_none());

        let mut graphics = SimGraphics::default().with_textures(false);
        assert!(graphics.create_texture(8, 8).is_none());
    }

    #[test]
    fn host_stubs() {
        let mut input = SimInput::default();
        input.dragging.insert(3);
        assert!(input.is_drag_on(3));
        assert!(!input.is_drag_on(1));

        let mut clock = ManualClock::new(1.0);
        clock.advance(0.5);
        assert_eq!(clock.now(), 1.5);

        let mut world = SimWorld::standing_at(Vector3::new(0.0, 0.0, 36.0));
        assert_eq!(world.local_player().ground_position().z, 0.0);
        assert!(world.view_model_mut().is_some());

        let mut log = CommandLog::default();
        log.client_cmd("vrupd_hmd 0");
        assert_eq!(log.commands, vec!["vrupd_hmd 0".to_string()]);
    }
}
