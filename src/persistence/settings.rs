use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::board_utils::board::BoardOptions;
use crate::board_utils::interaction::InteractionConfig;

const APP_DIR: &str = "Bubble-Board";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // If None, tasks live in the OS state directory
    pub storage_override: Option<PathBuf>,
    // If None, snapshots go to the OS temporary directory
    pub snapshot_override: Option<PathBuf>,
    pub pop_hold_delay_ms: f64,
    pub edit_cancel_delay_ms: f64,
    pub cancel_movement_buffer: f32,
    pub sounds_enabled: bool,
    /// Word hints for touch screens.
    pub touch_hints: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        let interaction = InteractionConfig::default();
        Self {
            storage_override: None,
            snapshot_override: None,
            pop_hold_delay_ms: interaction.pop_hold_delay_ms,
            edit_cancel_delay_ms: interaction.edit_cancel_delay_ms,
            cancel_movement_buffer: interaction.cancel_movement_buffer,
            sounds_enabled: true,
            touch_hints: false,
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Bubble-Board
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join(APP_DIR);
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Bubble-Board
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join(APP_DIR);
            }
            return PathBuf::from(APP_DIR);
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Bubble-Board or ~/.config/Bubble-Board
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join(APP_DIR);
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join(APP_DIR);
        }
    }

    fn storage_default_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            return Self::config_dir().join("Storage");
        }
        #[cfg(target_os = "windows")]
        {
            // %LOCALAPPDATA%\Bubble-Board\Storage else the config dir
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                return PathBuf::from(local).join(APP_DIR).join("Storage");
            }
            return Self::config_dir().join("Storage");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_STATE_HOME/bubble-board or ~/.local/state/bubble-board
            if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
                return PathBuf::from(xdg).join("bubble-board");
            }
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(".local").join("state").join("bubble-board");
            }
            return PathBuf::from("/tmp").join(APP_DIR);
        }
    }

    /// Missing file gives defaults; a malformed one is reported and replaced by defaults.
    pub fn load() -> Self {
        let path = Self::config_dir().join("settings.json");
        match Self::load_from(&path) {
            Ok(Some(settings)) => settings,
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("ignoring settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let mut f = fs::File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        let v: Self = serde_json::from_str(&s)?;
        Ok(Some(v))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_dir().join("settings.json"))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Return the directory where the settings file (settings.json) is stored.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    pub fn storage_dir(&self) -> PathBuf {
        if let Some(p) = &self.storage_override { return p.clone(); }
        Self::storage_default_dir()
    }

    /// Default snapshot directory when no override is set.
    /// Example: {temp_dir}/Bubble-Board/snapshots
    pub fn snapshot_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(APP_DIR);
        p.push("snapshots");
        p
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        if let Some(p) = &self.snapshot_override { return p.clone(); }
        Self::snapshot_default_dir()
    }

    pub fn interaction_config(&self) -> InteractionConfig {
        let defaults = InteractionConfig::default();
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        InteractionConfig {
            pop_hold_delay_ms: positive(self.pop_hold_delay_ms, defaults.pop_hold_delay_ms),
            edit_cancel_delay_ms: positive(self.edit_cancel_delay_ms, defaults.edit_cancel_delay_ms),
            cancel_movement_buffer: if self.cancel_movement_buffer.is_finite() && self.cancel_movement_buffer > 0.0 {
                self.cancel_movement_buffer
            } else {
                defaults.cancel_movement_buffer
            },
        }
    }

    pub fn board_options(&self) -> BoardOptions {
        BoardOptions {
            interaction: self.interaction_config(),
            touch_hints: self.touch_hints,
            ..BoardOptions::default()
        }
    }
}
