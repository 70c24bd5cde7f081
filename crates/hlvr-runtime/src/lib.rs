//! `hlvr-runtime` – the per-frame VR loop.
//!
//! Wires the conversion, yaw and pose logic from `hlvr-tracking` to the host
//! seams in `hlvr-hal`, and speaks the position protocol to the simulation.
//!
//! # Modules
//!
//! - [`setup`] – [`initialise`][setup::initialise]: ordered startup checks
//!   and render target allocation, returning a [`VrSession`][setup::VrSession].
//! - [`frame`] – [`FrameSynchronizer`][frame::FrameSynchronizer]: drains
//!   runtime events, resolves poses, drives the view model and emits the
//!   three position commands once per frame.
//! - [`protocol`] – [`HeadsetUpdate`][protocol::HeadsetUpdate] and
//!   [`HandUpdate`][protocol::HandUpdate]: the `vrupd_*` command format, with
//!   a parser for the receiving side.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: global
//!   `tracing` subscriber with optional OTLP span export.  Set
//!   `OTEL_EXPORTER_OTLP_ENDPOINT` to send each frame as a trace.
//!
//! # Frame order
//!
//! A host calls, once per rendered frame:
//!
//! 1. [`FrameSynchronizer::poll_events`][frame::FrameSynchronizer::poll_events]
//!    and exits when it reports a shutdown.
//! 2. [`FrameSynchronizer::update_positions`][frame::FrameSynchronizer::update_positions].
//! 3. Renders both eyes with the view matrices, then
//!    [`FrameSynchronizer::submit_frame`][frame::FrameSynchronizer::submit_frame].

pub mod frame;
pub mod protocol;
pub mod setup;
pub mod telemetry;

pub use frame::{FrameOutcome, FrameSynchronizer, HandCache, Host, SessionStatus};
pub use protocol::{HandUpdate, HeadsetUpdate, ProtocolError, ProtocolMessage};
pub use setup::{EyeFramebuffers, SETUP_FAILURE_EXIT_CODE, VrSession, initialise};
pub use telemetry::{TracerProviderGuard, init_tracing};
