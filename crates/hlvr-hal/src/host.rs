//! Traits for everything the host game provides to the frame loop.
//!
//! | Trait | Provides |
//! |---|---|
//! | [`SettingsSource`] | The live [`VrSettings`], read once per frame. |
//! | [`InputSource`] | Turn buttons, crouch state and per-device drag flags. |
//! | [`Clock`] | Client time in seconds. |
//! | [`GameWorld`] | The local player and the view-model entity. |
//! | [`CommandSink`] | Console commands forwarded to the simulation. |

use hlvr_types::{DeviceIndex, PlayerSnapshot, ViewModelEntity};
use serde::{Deserialize, Serialize};

/// User-tunable settings that affect pose conversion.
///
/// Values are stored as entered; range clamping happens where they are
/// consumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrSettings {
    /// Scales the world relative to the player.
    pub world_scale: f32,
    /// Extra vertical stretch on top of `world_scale`.
    pub world_z_stretch: f32,
    /// Enables virtual turning (stick input, platforms).
    pub player_turn_enabled: bool,
    /// Turn rate in degrees per second.
    pub yaw_speed: f32,
    /// Turn with rotating platforms the player stands on.
    pub rotate_with_trains: bool,
    /// Standing tracking universe instead of seated.
    pub room_scale: bool,
}

impl Default for VrSettings {
    fn default() -> Self {
        Self {
            world_scale: 1.0,
            world_z_stretch: 1.0,
            player_turn_enabled: false,
            yaw_speed: 210.0,
            rotate_with_trains: true,
            room_scale: true,
        }
    }
}

pub trait SettingsSource {
    fn settings(&self) -> VrSettings;
}

impl SettingsSource for VrSettings {
    fn settings(&self) -> VrSettings {
        *self
    }
}

pub trait InputSource {
    fn rotate_left(&self) -> bool;
    fn rotate_right(&self) -> bool;
    fn is_ducking(&self) -> bool;
    /// Whether the drag gesture is held on `device`.
    fn is_drag_on(&self, device: DeviceIndex) -> bool;
}

pub trait Clock {
    /// Client time in seconds.  May jump backwards on a new game or level.
    fn now(&self) -> f32;
}

pub trait GameWorld {
    fn local_player(&self) -> PlayerSnapshot;
    /// The view-model entity, or `None` while the engine has none.
    fn view_model_mut(&mut self) -> Option<&mut ViewModelEntity>;
}

pub trait CommandSink {
    /// Forward one console command to the simulation.
    fn client_cmd(&mut self, command: &str);
}
