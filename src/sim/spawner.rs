//! Enemy spawning
//!
//! Cadence, batch size, archetype choice and stat scaling are all functions of
//! survival time. Enemies always appear outside the visible viewport.

use glam::Vec2;
use rand::Rng;

use super::state::{Enemy, GameState};
use crate::tuning::{Archetype, SpawnTuning};

/// Stat multiplier for enemies spawned at survival time `t`
pub fn difficulty(t: f32, spawn: &SpawnTuning) -> f32 {
    1.0 + t / spawn.difficulty_period
}

/// Seconds between spawn batches (shrinks linearly down to a floor)
pub fn spawn_interval(t: f32, spawn: &SpawnTuning) -> f32 {
    (spawn.interval_base - t / spawn.interval_decay).max(spawn.interval_min)
}

/// Enemies per batch (grows stepwise, never shrinks)
pub fn spawn_count(t: f32, spawn: &SpawnTuning) -> u32 {
    1 + (t.max(0.0) / spawn.count_step).floor() as u32
}

/// Pick the first archetype whose gate passes for this roll
///
/// Ungated archetypes always pass; if nothing passes the last archetype is used.
pub fn choose_archetype(archetypes: &[Archetype], t: f32, roll: f32) -> Option<&Archetype> {
    archetypes
        .iter()
        .find(|a| match a.gate {
            Some(gate) => t > gate.unlock_after && roll < gate.roll_below,
            None => true,
        })
        .or_else(|| archetypes.last())
}

/// Random point on one side of the viewport box around `center`, pushed out by `margin`
pub fn spawn_position<R: Rng + ?Sized>(
    center: Vec2,
    viewport: Vec2,
    margin: f32,
    rng: &mut R,
) -> Vec2 {
    let half = viewport / 2.0;
    let along_x = if half.x > 0.0 {
        rng.random_range(-half.x..half.x)
    } else {
        0.0
    };
    let along_y = if half.y > 0.0 {
        rng.random_range(-half.y..half.y)
    } else {
        0.0
    };
    let offset = match rng.random_range(0..4) {
        0 => Vec2::new(along_x, -half.y - margin),
        1 => Vec2::new(along_x, half.y + margin),
        2 => Vec2::new(-half.x - margin, along_y),
        _ => Vec2::new(half.x + margin, along_y),
    };
    center + offset
}

/// Build an enemy from an archetype scaled by difficulty
pub fn scaled_enemy(
    id: u32,
    archetype: &Archetype,
    pos: Vec2,
    d: f32,
    spawn: &SpawnTuning,
) -> Enemy {
    let health = archetype.health * d;
    Enemy {
        id,
        kind: archetype.kind,
        pos,
        radius: archetype.radius,
        speed: archetype.speed * (1.0 + d * spawn.speed_scale),
        health,
        max_health: health,
        damage: archetype.damage * (1.0 + d * spawn.damage_scale),
        xp: (archetype.xp as f32 * d).floor() as u32,
        hit_timer: 0.0,
        contact_cooldown: 0.0,
        boss: archetype.boss,
        facing_right: true,
    }
}

/// Spawn one enemy for the current survival time; returns its id
pub fn spawn_enemy(state: &mut GameState) -> Option<u32> {
    let t = state.survival_time;
    let roll = state.rng.random::<f32>();
    let archetype = choose_archetype(&state.tuning.archetypes, t, roll)?.clone();
    let pos = spawn_position(
        state.player.pos,
        state.tuning.viewport,
        state.tuning.spawn.margin,
        &mut state.rng,
    );
    let d = difficulty(t, &state.tuning.spawn);
    let id = state.next_entity_id();
    let enemy = scaled_enemy(id, &archetype, pos, d, &state.tuning.spawn);
    if enemy.boss {
        log::info!("Boss spawned at {:.1}s ({:.0} hp)", t, enemy.health);
    } else {
        log::debug!("Spawned {:?} #{} at {:?}", enemy.kind, id, pos);
    }
    state.enemies.push(enemy);
    Some(id)
}

/// Advance the spawn timer and emit a batch when it runs out
pub fn update_spawner(state: &mut GameState, dt: f32) {
    state.spawn_timer -= dt;
    if state.spawn_timer > 0.0 {
        return;
    }
    let t = state.survival_time;
    state.spawn_timer = spawn_interval(t, &state.tuning.spawn);
    for _ in 0..spawn_count(t, &state.tuning.spawn) {
        spawn_enemy(state);
    }
}
