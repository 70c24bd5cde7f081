//! `hlvr-hal` – the seams between the pose pipeline and its host.
//!
//! The core never talks to a VR runtime, a graphics driver or the game
//! engine directly.  It talks to the traits in this crate, so the same frame
//! loop runs against real drivers in the game and against the in-process
//! stubs in [`sim`] in tests and CI.
//!
//! # Modules
//!
//! - [`runtime`] – [`TrackingRuntime`][runtime::TrackingRuntime]: poses,
//!   per-eye matrices, events and frame submission.
//! - [`host`] – settings, input, clock, game world and command sink.
//! - [`graphics`] – [`RenderBackend`][graphics::RenderBackend]: the
//!   capability checks and allocations done once at startup.
//! - [`sim`] – stub implementations of every trait above.

pub mod graphics;
pub mod host;
pub mod runtime;
pub mod sim;

pub use graphics::{FramebufferHandle, RenderBackend};
pub use host::{Clock, CommandSink, GameWorld, InputSource, SettingsSource, VrSettings};
pub use runtime::TrackingRuntime;
