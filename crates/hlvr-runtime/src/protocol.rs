//! The per-frame position protocol.
//!
//! Three console commands go to the simulation every frame, all sharing one
//! timestamp:
//!
//! ```text
//! vrupd_hmd <ts> <offX> <offY> <offZ> <yawDX> <yawDY> <yawDZ> <prevYaw> <curYaw>
//! vrupd_lft <ts> <valid> <offX> <offY> <offZ> <angX> <angY> <angZ> <velX> <velY> <velZ> <drag>
//! vrupd_rt  <ts> <valid> <offX> <offY> <offZ> <angX> <angY> <angZ> <velX> <velY> <velZ> <drag>
//! ```
//!
//! Floats carry two decimals, flags are `0` / `1`.  Offsets are relative to
//! the player origin.
//!
//! # Example
//!
//! ```rust
//! use hlvr_math::Vector3;
//! use hlvr_runtime::protocol::HeadsetUpdate;
//!
//! let hmd = HeadsetUpdate {
//!     timestamp: 7,
//!     offset: Vector3::new(1.0, -2.5, 28.0),
//!     yaw_offset_delta: Vector3::ZERO,
//!     previous_yaw: 0.0,
//!     current_yaw: 90.0,
//! };
//! assert_eq!(
//!     hmd.to_string(),
//!     "vrupd_hmd 7 1.00 -2.50 28.00 0.00 0.00 0.00 0.00 90.00"
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use hlvr_math::Vector3;
use hlvr_types::Hand;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HMD_COMMAND: &str = "vrupd_hmd";
pub const LEFT_COMMAND: &str = "vrupd_lft";
pub const RIGHT_COMMAND: &str = "vrupd_rt";

/// Fields after the command name in a headset message.
const HMD_FIELDS: usize = 9;
/// Fields after the command name in a controller message.
const HAND_FIELDS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("{command} expects {expected} fields, got {found}")]
    FieldCount {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("field {index} ('{value}') is not a valid number")]
    InvalidField { index: usize, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadsetUpdate {
    pub timestamp: u32,
    pub offset: Vector3,
    /// One-shot correction for a virtual yaw change.
    pub yaw_offset_delta: Vector3,
    pub previous_yaw: f32,
    pub current_yaw: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandUpdate {
    pub hand: Hand,
    pub timestamp: u32,
    pub valid: bool,
    pub offset: Vector3,
    pub angles: Vector3,
    pub velocity: Vector3,
    pub drag_on: bool,
}

impl HandUpdate {
    /// Message for a controller that is not tracked this frame.
    pub fn invalid(hand: Hand, timestamp: u32) -> Self {
        Self {
            hand,
            timestamp,
            valid: false,
            offset: Vector3::ZERO,
            angles: Vector3::ZERO,
            velocity: Vector3::ZERO,
            drag_on: false,
        }
    }

    pub fn command(&self) -> &'static str {
        match self.hand {
            Hand::Left => LEFT_COMMAND,
            Hand::Right => RIGHT_COMMAND,
        }
    }
}

impl fmt::Display for HeadsetUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{HMD_COMMAND} {} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
            self.timestamp,
            self.offset.x,
            self.offset.y,
            self.offset.z,
            self.yaw_offset_delta.x,
            self.yaw_offset_delta.y,
            self.yaw_offset_delta.z,
            self.previous_yaw,
            self.current_yaw,
        )
    }
}

impl fmt::Display for HandUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {}",
            self.command(),
            self.timestamp,
            u8::from(self.valid),
            self.offset.x,
            self.offset.y,
            self.offset.z,
            self.angles.x,
            self.angles.y,
            self.angles.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            u8::from(self.drag_on),
        )
    }
}

/// Any one protocol command, as received by the simulation side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProtocolMessage {
    Headset(HeadsetUpdate),
    Hand(HandUpdate),
}

impl fmt::Display for ProtocolMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolMessage::Headset(m) => fmt::Display::fmt(m, f),
            ProtocolMessage::Hand(m) => fmt::Display::fmt(m, f),
        }
    }
}

impl FromStr for ProtocolMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let fields: Vec<&str> = parts.collect();

        match command {
            HMD_COMMAND => {
                let f = Fields::new(HMD_COMMAND, &fields, HMD_FIELDS)?;
                Ok(ProtocolMessage::Headset(HeadsetUpdate {
                    timestamp: f.int(0)?,
                    offset: f.vector(1)?,
                    yaw_offset_delta: f.vector(4)?,
                    previous_yaw: f.float(7)?,
                    current_yaw: f.float(8)?,
                }))
            }
            LEFT_COMMAND | RIGHT_COMMAND => {
                let (name, hand) = if command == LEFT_COMMAND {
                    (LEFT_COMMAND, Hand::Left)
                } else {
                    (RIGHT_COMMAND, Hand::Right)
                };
                let f = Fields::new(name, &fields, HAND_FIELDS)?;
                Ok(ProtocolMessage::Hand(HandUpdate {
                    hand,
                    timestamp: f.int(0)?,
                    valid: f.flag(1)?,
                    offset: f.vector(2)?,
                    angles: f.vector(5)?,
                    velocity: f.vector(8)?,
                    drag_on: f.flag(11)?,
                }))
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

struct Fields<'a> {
    raw: &'a [&'a str],
}

impl<'a> Fields<'a> {
    fn new(
        command: &'static str,
        raw: &'a [&'a str],
        expected: usize,
    ) -> Result<Self, ProtocolError> {
        if raw.len() != expected {
            return Err(ProtocolError::FieldCount {
                command,
                expected,
                found: raw.len(),
            });
        }
        Ok(Self { raw })
    }

    fn parse<T: FromStr>(&self, index: usize) -> Result<T, ProtocolError> {
        self.raw[index]
            .parse()
            .map_err(|_| ProtocolError::InvalidField {
                index,
                value: self.raw[index].to_string(),
            })
    }

    fn int(&self, index: usize) -> Result<u32, ProtocolError> {
        self.parse(index)
    }

    fn float(&self, index: usize) -> Result<f32, ProtocolError> {
        self.parse(index)
    }

    fn flag(&self, index: usize) -> Result<bool, ProtocolError> {
        Ok(self.parse::<u8>(index)? != 0)
    }

    fn vector(&self, index: usize) -> Result<Vector3, ProtocolError> {
        Ok(Vector3::new(
            self.float(index)?,
            self.float(index + 1)?,
            self.float(index + 2)?,
        ))
    }
}
