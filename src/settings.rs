//! Game settings
//!
//! Loaded from a JSON file; any missing field takes its default. Simulation
//! step constants are deliberately not here (see [`crate::consts`]).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{
    GRAVITY, MIN_VIEWPORT_HEIGHT, MIN_VIEWPORT_WIDTH, SOLO_SESSION, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH,
};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// Visible world width (world units)
    pub viewport_width: f32,
    /// Visible world height (world units)
    pub viewport_height: f32,
    /// World gravity
    pub gravity: Vec2,

    // === Sessions ===
    /// Name of the single-player snapshot
    pub session_name: String,
    /// Directory holding session snapshots
    pub save_dir: PathBuf,
    /// Poll granularity while waiting for an in-flight save (ms)
    pub busy_poll_ms: u64,

    // === Gameplay ===
    /// Starting (and maximum) player health
    pub player_health: u32,
    /// Score that wins the run
    pub winning_score: u64,
    /// Obstacle layout seed; `None` picks one per run
    pub obstacle_seed: Option<u64>,

    // === Audio ===
    pub intro_track: String,
    pub gameplay_track: String,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Development ===
    /// Draw the physics wireframe until the first reset
    pub debug_overlay: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            gravity: GRAVITY,

            session_name: SOLO_SESSION.to_string(),
            save_dir: PathBuf::from("files"),
            busy_poll_ms: 100,

            player_health: 3,
            winning_score: 25,
            obstacle_seed: None,

            intro_track: "intro8-Bit.mp3".to_string(),
            gameplay_track: "angryJoe.mp3".to_string(),
            music_volume: 0.7,

            debug_overlay: true,
        }
    }
}

impl Settings {
    /// Busy-wait poll interval
    pub fn busy_poll_interval(&self) -> Duration {
        Duration::from_millis(self.busy_poll_ms.max(1))
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::clamped)
    }

    /// Raise a viewport too small to play in to the minimum size
    pub fn clamped(mut self) -> Self {
        if !self.viewport_width.is_finite() || self.viewport_width < MIN_VIEWPORT_WIDTH {
            log::warn!(
                "Viewport width {} too small, using {}",
                self.viewport_width,
                MIN_VIEWPORT_WIDTH
            );
            self.viewport_width = MIN_VIEWPORT_WIDTH;
        }
        if !self.viewport_height.is_finite() || self.viewport_height < MIN_VIEWPORT_HEIGHT {
            log::warn!(
                "Viewport height {} too small, using {}",
                self.viewport_height,
                MIN_VIEWPORT_HEIGHT
            );
            self.viewport_height = MIN_VIEWPORT_HEIGHT;
        }
        self
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Cannot read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings to `path` as pretty JSON
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
