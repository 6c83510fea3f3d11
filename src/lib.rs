//! Pixel Survivors - An open-arena auto-battler survival game
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (entities, combat, abilities, progression)
//! - `tuning`: Data-driven game balance
//! - `records`: Best time, lifetime kills, run leaderboard and achievements
//! - `settings`: Player preferences
//! - `platform`: Frame clock, input intent and the browser host
//! - `audio`: Procedural sound cues (Web Audio on wasm)

pub mod audio;
pub mod platform;
pub mod records;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use records::Records;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest simulation step accepted from the host (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default logical viewport used for spawn placement and camera follow
    pub const VIEWPORT_WIDTH: f32 = 1280.0;
    pub const VIEWPORT_HEIGHT: f32 = 720.0;

    /// Player collision radius (32px sprite)
    pub const PLAYER_RADIUS: f32 = 16.0;

    /// Distances below this are treated as zero when normalizing directions
    pub const DIRECTION_EPSILON: f32 = 1e-4;
}

/// Unit vector pointing from `from` to `to`, or zero when the points coincide
///
/// Zero-distance pairs come up constantly (pickups sitting on the player,
/// enemies spawned on top of each other) and must never produce NaN.
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    let len = delta.length();
    if len < consts::DIRECTION_EPSILON {
        Vec2::ZERO
    } else {
        delta / len
    }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Format seconds as `MM:SS`
pub fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0) as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}
