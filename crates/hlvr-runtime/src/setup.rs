//! VR session bring-up.
//!
//! [`initialise`] runs the startup checks in a fixed order and stops at the
//! first failure:
//!
//! | Step | Failure |
//! |---|---|
//! | Hardware renderer present | [`VrError::SoftwareRenderer`] |
//! | Driver entry points resolved | [`VrError::GraphicsUnavailable`] |
//! | Matrix override hook installed | [`VrError::GraphicsUnavailable`] |
//! | Tracking runtime started | [`VrError::RuntimeUnavailable`] |
//! | Eye, menu and HUD textures created | [`VrError::RenderTargetUnavailable`] |
//! | Eye framebuffers created | [`VrError::RenderTargetUnavailable`] |
//!
//! Once the runtime has started, any later failure shuts it down again
//! before the error is returned.  The caller is expected to report the
//! error and exit with status `1`.

use hlvr_hal::{FramebufferHandle, RenderBackend, TrackingRuntime};
use hlvr_types::{EyeTextures, TextureHandle, VrError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Exit status for a failed bring-up.
pub const SETUP_FAILURE_EXIT_CODE: i32 = 1;

/// Render resources owned by a running VR session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrSession {
    /// Per-eye render target size recommended by the runtime.
    pub render_size: (u32, u32),
    pub eye_textures: EyeTextures,
    /// Menu and HUD are rendered at desktop viewport size.
    pub menu_texture: TextureHandle,
    pub hud_texture: TextureHandle,
    pub framebuffers: EyeFramebuffers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeFramebuffers {
    pub left: FramebufferHandle,
    pub right: FramebufferHandle,
}

/// Bring up graphics and tracking for a VR session.
///
/// # Errors
///
/// The first failing step, see the module docs.
pub fn initialise(
    graphics: &mut dyn RenderBackend,
    runtime: &mut dyn TrackingRuntime,
) -> Result<VrSession, VrError> {
    if !graphics.is_hardware() {
        error!("software renderer active");
        return Err(VrError::SoftwareRenderer);
    }

    graphics
        .load_functions()
        .map_err(VrError::GraphicsUnavailable)?;
    graphics
        .install_matrix_override()
        .map_err(VrError::GraphicsUnavailable)?;

    runtime.init()?;
    info!("tracking runtime started");

    match create_targets(graphics, runtime) {
        Ok(session) => {
            info!(
                width = session.render_size.0,
                height = session.render_size.1,
                "vr session ready"
            );
            Ok(session)
        }
        Err(e) => {
            error!(error = %e, "render target setup failed");
            runtime.shutdown();
            Err(e)
        }
    }
}

fn create_targets(
    graphics: &mut dyn RenderBackend,
    runtime: &dyn TrackingRuntime,
) -> Result<VrSession, VrError> {
    let (width, height) = runtime.recommended_render_target_size();
    let (view_width, view_height) = graphics.viewport_size();

    let left = graphics.create_texture(width, height);
    let right = graphics.create_texture(width, height);
    let menu = graphics.create_texture(view_width, view_height);
    let hud = graphics.create_texture(view_width, view_height);
    let (Some(left), Some(right), Some(menu), Some(hud)) = (left, right, menu, hud) else {
        return Err(VrError::RenderTargetUnavailable("textures".to_string()));
    };

    let left_fb = graphics.create_framebuffer(left, width, height);
    let right_fb = graphics.create_framebuffer(right, width, height);
    let (Some(left_fb), Some(right_fb)) = (left_fb, right_fb) else {
        return Err(VrError::RenderTargetUnavailable("framebuffers".to_string()));
    };

    Ok(VrSession {
        render_size: (width, height),
        eye_textures: EyeTextures { left, right },
        menu_texture: menu,
        hud_texture: hud,
        framebuffers: EyeFramebuffers {
            left: left_fb,
            right: right_fb,
        },
    })
}
