//! Per-frame simulation step
//!
//! Systems run in a fixed order every frame:
//! spawner, player, abilities, enemies, projectiles, pickups, cosmetics,
//! then end-of-frame removal and achievement checks.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::abilities::{AbilityKind, update_abilities};
use super::achievements::check_achievements;
use super::combat::{self, damage_player, decay_combo, finish_run, reap_enemies};
use super::progression::gain_xp;
use super::spawner::update_spawner;
use super::state::{GameEvent, GamePhase, GameState, PickupKind, SoundCue, palette};
use crate::direction_to;

/// Input for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Desired movement direction; longer vectors are clamped to length 1
    pub move_intent: Vec2,
    /// Toggle manual pause
    pub pause: bool,
}

/// Advance the game state by one frame of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, state.tuning.max_frame_dt)
    } else {
        0.0
    };

    if input.pause {
        match state.phase {
            GamePhase::Running => state.phase = GamePhase::Paused,
            GamePhase::Paused => state.phase = GamePhase::Running,
            _ => {}
        }
    }
    if !state.is_running() {
        return;
    }

    state.survival_time += dt;

    update_spawner(state, dt);
    update_player(state, input.move_intent, dt);
    update_abilities(state, dt);
    update_enemies(state, dt);
    if state.phase != GamePhase::GameOver {
        update_projectiles(state, dt);
        update_pickups(state, dt);
    }
    update_cosmetics(state, dt);
    prune(state);
    check_achievements(state);

    if state.phase == GamePhase::GameOver {
        finish_run(state);
    }
}

fn update_player(state: &mut GameState, intent: Vec2, dt: f32) {
    let intent = if intent.is_finite() {
        intent.clamp_length_max(1.0)
    } else {
        Vec2::ZERO
    };
    let player = &mut state.player;
    player.intent = intent;
    player.pos += intent * player.stats.speed * dt;
    if intent.x != 0.0 {
        player.facing_right = intent.x > 0.0;
    }

    if player.invincible {
        player.invincible_timer -= dt;
        if player.invincible_timer <= 0.0 {
            player.invincible = false;
            player.invincible_timer = 0.0;
        }
    }

    if player.stats.regen > 0.0 {
        player.regen_timer += dt;
        if player.regen_timer >= 1.0 {
            player.regen_timer -= 1.0;
            player.health = (player.health + player.stats.regen).min(player.stats.max_health);
        }
    }

    state.update_camera();
}

fn update_enemies(state: &mut GameState, dt: f32) {
    let target = state.player.pos;
    let player_radius = state.player.radius;
    let despawn = state.tuning.despawn_distance();

    for i in 0..state.enemies.len() {
        let enemy = &mut state.enemies[i];
        if enemy.is_dead() {
            continue;
        }
        let dir = direction_to(enemy.pos, target);
        enemy.pos += dir * enemy.speed * dt;
        if dir.x != 0.0 {
            enemy.facing_right = dir.x > 0.0;
        }
        enemy.hit_timer = (enemy.hit_timer - dt).max(0.0);
        enemy.contact_cooldown = (enemy.contact_cooldown - dt).max(0.0);

        let dist = enemy.pos.distance(target);
        if dist > despawn {
            let id = enemy.id;
            state.pending.enemies.insert(id);
            continue;
        }
        if dist < enemy.radius + player_radius {
            let damage = enemy.damage;
            damage_player(state, damage);
        }
    }
}

fn update_projectiles(state: &mut GameState, dt: f32) {
    for p in 0..state.projectiles.len() {
        let projectile = &mut state.projectiles[p];
        projectile.pos += projectile.vel * dt;
        projectile.life -= dt;
        if projectile.life <= 0.0 || state.pending.projectiles.contains(&projectile.id) {
            continue;
        }
        let (pos, source) = (projectile.pos, projectile.source);
        if source == AbilityKind::Fireball && state.rng.random::<f32>() < 0.3 {
            state.spawn_particles(pos, palette::FIRE, 1);
        }

        for e in 0..state.enemies.len() {
            let projectile = &state.projectiles[p];
            let enemy = &state.enemies[e];
            if enemy.is_dead() || projectile.hit.contains(&enemy.id) {
                continue;
            }
            if projectile.pos.distance(enemy.pos) >= projectile.size / 2.0 + enemy.radius {
                continue;
            }
            let (damage, enemy_id) = (projectile.damage, enemy.id);
            combat::damage_enemy(state, e, damage);

            let projectile = &mut state.projectiles[p];
            projectile.hit.push(enemy_id);
            if projectile.pierce == 0 {
                let id = projectile.id;
                state.pending.projectiles.insert(id);
                break;
            }
            projectile.pierce -= 1;
        }
    }
}

/// Attraction speed of a pickup at distance `d` (zero outside `range`)
pub fn magnet_speed(d: f32, range: f32, base: f32, pull: f32) -> f32 {
    if d >= range || range <= 0.0 {
        0.0
    } else {
        pull * (1.0 - d / range) + base
    }
}

fn update_pickups(state: &mut GameState, dt: f32) {
    let target = state.player.pos;
    let range = state.player.stats.pickup_range;
    let tuning = state.tuning.pickups.clone();

    for i in 0..state.pickups.len() {
        // A level-up earlier in this loop freezes the remaining orbs
        let running = state.phase == GamePhase::Running;
        let pickup = &mut state.pickups[i];
        if pickup.collected || (pickup.kind == PickupKind::Xp && !running) {
            continue;
        }
        let range = match pickup.kind {
            PickupKind::Xp => range,
            PickupKind::Gold => range * tuning.coin_range_factor,
        };
        let d = pickup.pos.distance(target);
        let speed = magnet_speed(d, range, tuning.base_speed, tuning.pull_speed);
        if speed > 0.0 {
            pickup.pos += direction_to(pickup.pos, target) * (speed * dt).min(d);
        }
        if pickup.pos.distance(target) >= tuning.collect_radius {
            continue;
        }

        pickup.collected = true;
        let (kind, value) = (pickup.kind, pickup.value);
        match kind {
            PickupKind::Xp => {
                state.emit(GameEvent::Sound(SoundCue::Xp));
                gain_xp(state, value);
            }
            PickupKind::Gold => {
                state.gold = state.gold.saturating_add(value);
                state.emit(GameEvent::Sound(SoundCue::Coin));
            }
        }
    }
}

fn update_cosmetics(state: &mut GameState, dt: f32) {
    // 5% shrink per 60 Hz frame
    let shrink = 0.95f32.powf(dt * 60.0);
    for particle in &mut state.particles {
        particle.pos += particle.vel * dt;
        particle.life -= dt * 2.0;
        particle.size *= shrink;
    }
    for text in &mut state.floating_texts {
        text.pos.y += text.vel_y * dt;
        text.vel_y += 100.0 * dt;
        text.life -= dt * 1.5;
    }
    decay_combo(state, dt);
}

/// End-of-frame removal of everything flagged this frame
fn prune(state: &mut GameState) {
    reap_enemies(state);
    let pending = &state.pending.projectiles;
    state
        .projectiles
        .retain(|p| p.life > 0.0 && !pending.contains(&p.id));
    state.pickups.retain(|p| !p.collected);
    state.particles.retain(|p| p.life > 0.0 && p.size > 0.5);
    state.floating_texts.retain(|t| t.life > 0.0);
    state.pending.clear();
}
