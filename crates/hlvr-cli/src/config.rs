//! Configuration vault – reads/writes `~/.hlvr/config.toml`.
//!
//! ```toml
//! [vr]
//! world_scale = 1.0
//! world_z_stretch = 1.0
//! player_turn_enabled = false
//! yaw_speed = 210.0
//! rotate_with_trains = true
//! room_scale = true
//!
//! [simulation]
//! frames = 90
//! frame_interval_ms = 11
//! ```

use hlvr_hal::VrSettings;
use hlvr_types::VrError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Variable that replaces the default config path.
pub const CONFIG_PATH_ENV: &str = "HLVR_CONFIG";

/// Knobs for the simulated session the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Frames to run before asking the runtime to quit.
    pub frames: u32,
    /// Client time between frames.
    pub frame_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frames: 90,
            frame_interval_ms: 11,
        }
    }
}

/// Persisted user configuration stored in `~/.hlvr/config.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vr: VrSettings,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Return the config path: `$HLVR_CONFIG`, else `~/.hlvr/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".hlvr").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, VrError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, VrError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        VrError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| VrError::Config(format!("failed to parse {}: {e}", path.display())))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `HLVR_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `HLVR_WORLD_SCALE` | `vr.world_scale` |
/// | `HLVR_WORLD_Z_STRETCH` | `vr.world_z_stretch` |
/// | `HLVR_PLAYER_TURN` | `vr.player_turn_enabled` |
/// | `HLVR_YAW_SPEED` | `vr.yaw_speed` |
/// | `HLVR_ROTATE_WITH_TRAINS` | `vr.rotate_with_trains` |
/// | `HLVR_ROOM_SCALE` | `vr.room_scale` |
/// | `HLVR_FRAMES` | `simulation.frames` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    override_with("HLVR_WORLD_SCALE", &mut cfg.vr.world_scale, parse_number);
    override_with("HLVR_WORLD_Z_STRETCH", &mut cfg.vr.world_z_stretch, parse_number);
    override_with("HLVR_PLAYER_TURN", &mut cfg.vr.player_turn_enabled, parse_flag);
    override_with("HLVR_YAW_SPEED", &mut cfg.vr.yaw_speed, parse_number);
    override_with("HLVR_ROTATE_WITH_TRAINS", &mut cfg.vr.rotate_with_trains, parse_flag);
    override_with("HLVR_ROOM_SCALE", &mut cfg.vr.room_scale, parse_flag);
    override_with("HLVR_FRAMES", &mut cfg.simulation.frames, parse_number);
}

fn override_with<T>(var: &str, field: &mut T, parse: fn(&str) -> Option<T>) {
    if let Ok(v) = std::env::var(var)
        && let Some(value) = parse(v.trim())
    {
        *field = value;
    }
}

fn parse_number<T: std::str::FromStr>(v: &str) -> Option<T> {
    v.parse().ok()
}

/// Console-variable style flags: `1`/`0` as well as `true`/`false`.
fn parse_flag(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Save the config to disk, creating the parent directory if necessary.
pub fn save(cfg: &Config) -> Result<(), VrError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), VrError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            VrError::Config(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| VrError::Config(format!("failed to serialize config: {e}")))?;
    let write_error =
        |e: std::io::Error| VrError::Config(format!("failed to write {}: {e}", path.display()));

    // Owner-only read/write (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_error)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.vr, VrSettings::default());
        assert_eq!(loaded.simulation.frames, 90);
        assert_eq!(loaded.simulation.frame_interval_ms, 11);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[vr]\nworld_scale = 1.5\nplayer_turn_enabled = true\n").unwrap();

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.vr.world_scale, 1.5);
        assert!(cfg.vr.player_turn_enabled);
        assert_eq!(cfg.vr.world_z_stretch, 1.0);
        assert_eq!(cfg.vr.yaw_speed, 210.0);
        assert!(cfg.vr.rotate_with_trains);
        assert!(cfg.vr.room_scale);
        assert_eq!(cfg.simulation, SimulationConfig::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[vr\nworld_scale = ").unwrap();
        assert!(matches!(load_from(&path), Err(VrError::Config(_))));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn config_path_points_to_hlvr_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".hlvr"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn flags_accept_console_style_values() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn apply_env_overrides_changes_world_scale() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("HLVR_WORLD_SCALE", "1.25") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.vr.world_scale, 1.25);
        unsafe { std::env::remove_var("HLVR_WORLD_SCALE") };
    }

    #[test]
    fn apply_env_overrides_changes_turning() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("HLVR_PLAYER_TURN", "1") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert!(cfg.vr.player_turn_enabled);
        unsafe { std::env::remove_var("HLVR_PLAYER_TURN") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_frames() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("HLVR_FRAMES", "lots") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.simulation.frames, 90);
        unsafe { std::env::remove_var("HLVR_FRAMES") };
    }
}
