//! `hlvr-tracking` – turns tracking-space poses into game-space transforms.
//!
//! Everything in here is pure computation over values handed in by the
//! caller; the frame loop that drives it lives in `hlvr-runtime`.
//!
//! # Modules
//!
//! - [`scale`] – [`ConversionVectors`][scale::ConversionVectors]: per-axis
//!   scale factors between tracking meters and game units.
//! - [`adapter`] – conversion of runtime matrices into [`Matrix4`] and
//!   extraction of view / object angles.
//! - [`yaw`] – [`YawTracker`][yaw::YawTracker]: virtual yaw that evolves
//!   independently of the headset's physical heading.
//! - [`pose`] – [`PoseResolver`][pose::PoseResolver]: crouch clamping and
//!   yaw pivoting for the headset and both controllers.
//! - [`eye`] – per-eye projection and model-view matrices for the renderer.
//!
//! [`Matrix4`]: hlvr_math::Matrix4

pub mod adapter;
pub mod eye;
pub mod pose;
pub mod scale;
pub mod yaw;

pub use pose::{PoseResolver, ResolveContext};
pub use scale::ConversionVectors;
pub use yaw::{YawInputs, YawTracker};
