//! The VR runtime as seen by the frame loop.
//!
//! Only the calls the pose pipeline actually makes are part of the trait.
//! Device discovery, compositor configuration and everything else the
//! runtime can do stays behind the implementation.

use hlvr_types::{
    DeviceIndex, Eye, Hand, HmdMatrix34, HmdMatrix44, PoseSet, RuntimeEvent, TextureHandle,
    TrackingUniverse, VrError,
};

/// A connected VR runtime.
pub trait TrackingRuntime {
    /// Connect to the runtime and its compositor.
    ///
    /// # Errors
    ///
    /// Returns [`VrError::RuntimeUnavailable`] when no runtime or headset is
    /// reachable.
    fn init(&mut self) -> Result<(), VrError>;

    fn set_tracking_universe(&mut self, universe: TrackingUniverse);

    /// Block until the compositor hands out the poses for the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`VrError::Compositor`] when the compositor rejects the call
    /// (e.g. the scene application lost focus).
    fn wait_get_poses(&mut self) -> Result<PoseSet, VrError>;

    /// Device index currently assigned to `hand`, if any.
    fn controller_index(&self, hand: Hand) -> Option<DeviceIndex>;

    fn projection_matrix(&self, eye: Eye, near_z: f32, far_z: f32) -> HmdMatrix44;

    fn eye_to_head(&self, eye: Eye) -> HmdMatrix34;

    /// Render target size the runtime recommends per eye, in pixels.
    fn recommended_render_target_size(&self) -> (u32, u32);

    /// Next pending runtime event, or `None` when the queue is drained.
    fn poll_event(&mut self) -> Option<RuntimeEvent>;

    /// Hand one eye's rendered texture to the compositor.
    ///
    /// # Errors
    ///
    /// Returns [`VrError::Compositor`] when the texture is rejected.
    fn submit(&mut self, eye: Eye, texture: TextureHandle) -> Result<(), VrError>;

    fn post_present_handoff(&mut self);

    fn shutdown(&mut self);
}
