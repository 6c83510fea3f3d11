//! Read-only views of the state for presentation layers
//!
//! A renderer or UI never touches `GameState` directly; it receives one of
//! these per frame (serialized to JSON on the web host).

use glam::Vec2;
use serde::Serialize;

use super::abilities::{AbilityKind, Behavior, all_orbit_positions};
use super::progression::{OfferCard, offer_cards};
use super::state::{Enemy, FloatingText, GamePhase, GameState, Particle, Pickup, Player, Projectile};
use crate::format_time;

/// A damage field drawn around the player
#[derive(Debug, Clone, Serialize)]
pub struct AreaView {
    pub kind: AbilityKind,
    pub radius: f32,
}

/// Everything needed to draw one frame
#[derive(Debug, Serialize)]
pub struct FrameSnapshot<'a> {
    pub phase: GamePhase,
    pub camera: Vec2,
    pub player: &'a Player,
    pub enemies: &'a [Enemy],
    pub projectiles: &'a [Projectile],
    pub pickups: &'a [Pickup],
    pub particles: &'a [Particle],
    pub floating_texts: &'a [FloatingText],
    pub orbs: Vec<Vec2>,
    pub areas: Vec<AreaView>,
    pub offer: Vec<OfferCard>,
    pub hud: HudSnapshot,
}

impl<'a> FrameSnapshot<'a> {
    pub fn capture(state: &'a GameState) -> Self {
        let areas = state
            .player
            .abilities
            .iter()
            .filter(|a| matches!(a.behavior, Behavior::AreaPulse { .. }))
            .map(|a| AreaView {
                kind: a.kind,
                radius: a.effective_radius(),
            })
            .collect();
        Self {
            phase: state.phase,
            camera: state.camera,
            player: &state.player,
            enemies: &state.enemies,
            projectiles: &state.projectiles,
            pickups: &state.pickups,
            particles: &state.particles,
            floating_texts: &state.floating_texts,
            orbs: all_orbit_positions(state),
            areas,
            offer: offer_cards(state),
            hud: HudSnapshot::capture(state),
        }
    }
}

/// Heads-up display values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub health: f32,
    pub max_health: f32,
    pub xp: u32,
    pub xp_to_level: u32,
    /// XP bar fill in 0..=1
    pub xp_fraction: f32,
    pub level: u32,
    pub survival_time: f32,
    pub time_label: String,
    pub kills: u32,
    pub gold: u32,
    pub combo: u32,
}

impl HudSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let player = &state.player;
        Self {
            health: player.health,
            max_health: player.stats.max_health,
            xp: player.xp,
            xp_to_level: player.xp_to_level,
            xp_fraction: xp_fraction(player.xp, player.xp_to_level),
            level: player.level,
            survival_time: state.survival_time,
            time_label: format_time(state.survival_time),
            kills: state.kills,
            gold: state.gold,
            combo: state.combo,
        }
    }
}

fn xp_fraction(xp: u32, xp_to_level: u32) -> f32 {
    if xp_to_level == 0 {
        0.0
    } else {
        (xp as f32 / xp_to_level as f32).min(1.0)
    }
}
