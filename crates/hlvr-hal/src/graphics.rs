//! Startup capabilities of the rendering backend.
//!
//! Per-frame rendering is out of reach of this crate; the backend only has
//! to answer the questions asked once while the VR session is being set up.

use hlvr_types::TextureHandle;
use serde::{Deserialize, Serialize};

/// Opaque framebuffer handle owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FramebufferHandle(pub u64);

pub trait RenderBackend {
    /// `false` for a software renderer, which cannot drive a headset.
    fn is_hardware(&self) -> bool;

    /// Resolve the driver entry points the VR path needs.
    ///
    /// # Errors
    ///
    /// The name of the first missing entry point.
    fn load_functions(&mut self) -> Result<(), String>;

    /// Install the hook that lets the engine's matrices be replaced by ours.
    ///
    /// # Errors
    ///
    /// A description of why the hook is unavailable.
    fn install_matrix_override(&mut self) -> Result<(), String>;

    /// Size of the desktop viewport in pixels.
    fn viewport_size(&self) -> (u32, u32);

    fn create_texture(&mut self, width: u32, height: u32) -> Option<TextureHandle>;

    fn create_framebuffer(
        &mut self,
        texture: TextureHandle,
        width: u32,
        height: u32,
    ) -> Option<FramebufferHandle>;
}
