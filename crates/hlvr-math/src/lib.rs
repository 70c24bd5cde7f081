//! `hlvr-math` – vector, matrix and angle primitives.
//!
//! The tracking runtime speaks row-major 3x4 / 4x4 matrices in meters with
//! +Y up; the game engine speaks column-major 4x4 matrices and Euler angles in
//! degrees with +Z up.  This crate holds the value types both sides meet on.
//!
//! # Modules
//!
//! - [`vector`] – [`Vector3`] / [`Vector4`] value types with the usual
//!   arithmetic and an epsilon-guarded normalisation.
//! - [`matrix`] – [`Matrix4`]: column-major 4x4 matrix with yaw rotation,
//!   uniform scaling and a general inverse.
//! - [`angles`] – the engine's angle routines: [`angles::vector_angles`],
//!   [`angles::angle_vectors`], [`angles::angles_from_vectors`] and
//!   [`angles::normalize_degrees`].

pub mod angles;
pub mod matrix;
pub mod vector;

pub use matrix::Matrix4;
pub use vector::{Vector3, Vector4};
