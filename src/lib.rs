//! Cthulhu Saucer - run-time coordinator of a 2D physics arcade game
//!
//! Core modules:
//! - `sim`: Fixed-step physics, entity registry, game/net state enums
//! - `entities`: Background, obstacles, player saucer, Cthulhu, HUD
//! - `persistence`: Asynchronous session snapshots (save/load/delete)
//! - `net`: Peer session for two-player games
//! - `platform`: Render target, input and camera collaborators
//! - `game`: The coordinator that ties everything together

pub mod audio;
pub mod entities;
pub mod game;
pub mod net;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use game::{Collaborators, Game, GameError};
pub use settings::Settings;
pub use sim::{GameState, NetState};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz)
    pub const STEP_TIME: f64 = 1.0 / 60.0;
    /// Largest wall-clock delta accepted per frame, bounds catch-up bursts
    pub const MAX_FRAME_TIME: f64 = 0.25;
    /// Solver iterations per step. Part of the reproducibility contract.
    pub const VELOCITY_ITERATIONS: u32 = 6;
    pub const POSITION_ITERATIONS: u32 = 2;

    /// Viewport dimensions in world units
    pub const VIEWPORT_WIDTH: f32 = 80.0;
    pub const VIEWPORT_HEIGHT: f32 = 48.0;
    /// Smallest viewport that fits an obstacle gap with pillars on both sides
    pub const MIN_VIEWPORT_HEIGHT: f32 = 24.0;
    pub const MIN_VIEWPORT_WIDTH: f32 = 8.0;

    /// World gravity (units/s²)
    pub const GRAVITY: Vec2 = Vec2::new(0.0, -10.0);

    /// Name of the single-player session snapshot
    pub const SOLO_SESSION: &str = "local";
}

/// Center of a viewport of the given size
#[inline]
pub fn viewport_center(width: f32, height: f32) -> Vec2 {
    Vec2::new(width / 2.0, height / 2.0)
}
