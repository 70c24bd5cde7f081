//! `hlvr` – run the VR pose pipeline against a simulated headset.
//!
//! The binary:
//!
//! 1. Initialises tracing (`RUST_LOG`, `HLVR_LOG_FORMAT`,
//!    `OTEL_EXPORTER_OTLP_ENDPOINT`).
//! 2. Loads `~/.hlvr/config.toml`, writing the defaults on first run.
//! 3. Brings up a VR session on the in-process runtime and graphics stubs;
//!    setup failures print the diagnostic and exit with status 1.
//! 4. Runs the frame loop, printing every `vrupd_*` command, until the
//!    configured frame count is reached, the runtime asks to quit, or
//!    **Ctrl-C** is pressed.

mod config;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use tracing::{info, warn};

use hlvr_hal::{CommandSink, TrackingRuntime};
use hlvr_hal::sim::{ManualClock, SimGraphics, SimInput, SimRuntime, SimWorld};
use hlvr_math::Vector3;
use hlvr_runtime::{
    FrameOutcome, FrameSynchronizer, Host, SETUP_FAILURE_EXIT_CODE, SessionStatus, init_tracing,
    initialise,
};
use hlvr_types::{Hand, HmdMatrix34, RuntimeEvent, TrackedPose};

/// Standing eye height of the simulated player (tracking meters).
const EYE_HEIGHT: f32 = 1.7;
const LEFT_CONTROLLER: u32 = 1;
const RIGHT_CONTROLLER: u32 = 2;

/// Prints each protocol command as it is sent.
struct ConsoleSink;

impl CommandSink for ConsoleSink {
    fn client_cmd(&mut self, command: &str) {
        println!("  {}", command.dimmed());
    }
}

fn main() {
    let _guard = init_tracing("hlvr");
    print_banner();

    let cfg = match config::load() {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "{} {}",
                    "Wrote default config to".dimmed(),
                    config::config_path().display()
                ),
                Err(e) => warn!(error = %e, "could not write default config"),
            }
            cfg
        }
        Err(e) => {
            eprintln!("{} {e}", "✗".red().bold());
            std::process::exit(SETUP_FAILURE_EXIT_CODE);
        }
    };
    info!(?cfg, "configuration loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let mut runtime = SimRuntime::builder()
        .with_headset(Vector3::new(0.0, EYE_HEIGHT, 0.0))
        .with_controller(Hand::Left, LEFT_CONTROLLER, Vector3::new(-0.25, 1.1, -0.3))
        .with_controller(Hand::Right, RIGHT_CONTROLLER, Vector3::new(0.25, 1.1, -0.35))
        .build();
    let mut graphics = SimGraphics::default();

    let session = match initialise(&mut graphics, &mut runtime) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} {e}", "✗".red().bold());
            std::process::exit(SETUP_FAILURE_EXIT_CODE);
        }
    };
    println!(
        "{} {}x{} per eye",
        "✓ VR session ready:".green().bold(),
        session.render_size.0,
        session.render_size.1
    );

    let input = SimInput::default();
    let mut clock = ManualClock::new(1.0);
    let mut world = SimWorld::standing_at(Vector3::new(0.0, 0.0, 36.0));
    let mut sink = ConsoleSink;
    let mut sync = FrameSynchronizer::new();
    let interval = Duration::from_millis(cfg.simulation.frame_interval_ms);

    let mut frame = 0u32;
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        if frame == cfg.simulation.frames {
            runtime.push_event(RuntimeEvent::Quit);
        }

        animate(&mut runtime, frame, interval);

        let mut host = Host {
            runtime: &mut runtime,
            settings: &cfg.vr,
            input: &input,
            clock: &clock,
            world: &mut world,
            commands: &mut sink,
        };
        if sync.poll_events(&mut host) == SessionStatus::ShutdownRequested {
            break;
        }
        if let FrameOutcome::Resolved { timestamp } = sync.update_positions(&mut host) {
            println!("{} {timestamp}", "frame".cyan());
        }
        if let Err(e) = sync.submit_frame(&mut runtime, session.eye_textures) {
            warn!(error = %e, "frame submission failed");
        }

        frame += 1;
        clock.advance(interval.as_secs_f32());
        std::thread::sleep(interval);
    }

    if !runtime.is_shut_down() {
        runtime.shutdown();
    }
    println!("{}", "✓ Exiting hlvr.".green());
}

/// Sway the head and swing the right hand so consecutive frames differ.
fn animate(runtime: &mut SimRuntime, frame: u32, interval: Duration) {
    let t = frame as f32 * interval.as_secs_f32();
    let head = Vector3::new(0.05 * t.sin(), EYE_HEIGHT + 0.01 * (2.0 * t).sin(), 0.0);
    runtime.set_headset(HmdMatrix34::from_position(head));

    let hand = Vector3::new(0.25 + 0.1 * t.cos(), 1.1, -0.35 - 0.1 * t.sin());
    let mut pose = TrackedPose::tracked(HmdMatrix34::from_position(hand));
    pose.velocity = Vector3::new(-0.1 * t.sin(), 0.0, -0.1 * t.cos());
    runtime.set_pose(RIGHT_CONTROLLER, pose);
}

fn print_banner() {
    println!("{}", "hlvr – Half-Life VR pose pipeline".bold());
    println!("{}", "simulated headset, Ctrl-C to stop".dimmed());
    println!();
}
