//! Damage resolution and hit feedback
//!
//! Enemy hits roll for crits and always produce feedback (flash, floating
//! number, particles, combo). Player hits respect invincibility frames and
//! armor. Dead enemies are reaped here at the end of the frame.

use glam::Vec2;
use rand::Rng;

use super::state::{Enemy, GameEvent, GamePhase, GameState, PickupKind, SoundCue, palette};

/// Hit an enemy for `base_damage`, rolling for a critical hit
///
/// Returns the damage actually applied (0 for an invalid index).
pub fn damage_enemy(state: &mut GameState, index: usize, base_damage: f32) -> f32 {
    if index >= state.enemies.len() {
        return 0.0;
    }
    let stats = &state.player.stats;
    let crit_chance = stats.crit_chance * stats.luck;
    let crit_multiplier = stats.crit_multiplier;
    let crit = state.rng.random::<f32>() < crit_chance;
    let applied = if crit {
        base_damage * crit_multiplier
    } else {
        base_damage
    };

    let flash = state.tuning.combat.hit_flash_secs;
    let enemy = &mut state.enemies[index];
    enemy.health -= applied;
    enemy.hit_timer = flash;
    let pos = enemy.pos;
    let label_pos = Vec2::new(pos.x, pos.y - enemy.radius);

    state.show_damage(label_pos, applied, crit);
    let particles = state.tuning.combat.hit_particles;
    state.spawn_particles(pos, palette::HIT, particles);
    state.emit(GameEvent::Sound(SoundCue::Hit));
    register_hit(state);
    applied
}

/// Damage-over-time tick: no crit and no feedback
pub fn apply_tick_damage(enemy: &mut Enemy, amount: f32) {
    enemy.health -= amount.max(0.0);
}

/// Bump the combo and refresh its decay window
pub fn register_hit(state: &mut GameState) {
    state.combo += 1;
    state.combo_timer = state.tuning.combat.combo_window;
    state.best_combo = state.best_combo.max(state.combo);
}

/// Count down the combo window; the streak resets when it runs out
pub fn decay_combo(state: &mut GameState, dt: f32) {
    if state.combo == 0 {
        return;
    }
    state.combo_timer -= dt;
    if state.combo_timer <= 0.0 {
        state.combo = 0;
        state.combo_timer = 0.0;
    }
}

/// Hit the player; ignored while invincible
pub fn damage_player(state: &mut GameState, raw_damage: f32) {
    if state.player.invincible || state.phase == GamePhase::GameOver {
        return;
    }

    let final_damage = (raw_damage - state.player.stats.armor).max(1.0);
    let player = &mut state.player;
    player.health = (player.health - final_damage).max(0.0);
    player.invincible = true;
    player.invincible_timer = state.tuning.player.invincibility_secs;
    let pos = player.pos;

    state.emit(GameEvent::Sound(SoundCue::Hurt));
    state.emit(GameEvent::ScreenShake);
    let particles = state.tuning.combat.hurt_particles;
    state.spawn_particles(pos, palette::BLOOD, particles);

    if state.player.is_dead() {
        state.phase = GamePhase::GameOver;
        log::info!(
            "Player died at {:.1}s (level {}, {} kills)",
            state.survival_time,
            state.player.level,
            state.kills
        );
    }
}

/// Emit the final run report once the run has ended
pub fn finish_run(state: &mut GameState) {
    let summary = state.summary();
    state.emit(GameEvent::Sound(SoundCue::GameOver));
    state.emit(GameEvent::GameOver(summary));
}

/// Remove dead and out-of-range enemies; each dead enemy is rewarded exactly once
pub fn reap_enemies(state: &mut GameState) {
    let enemies = std::mem::take(&mut state.enemies);
    let mut survivors = Vec::with_capacity(enemies.len());
    for enemy in enemies {
        if enemy.is_dead() {
            on_enemy_killed(state, &enemy);
        } else if !state.pending.enemies.contains(&enemy.id) {
            survivors.push(enemy);
        }
    }
    state.enemies = survivors;
}

fn on_enemy_killed(state: &mut GameState, enemy: &Enemy) {
    state.kills += 1;
    if enemy.boss {
        state.bosses_killed += 1;
        log::info!("Boss defeated at {:.1}s", state.survival_time);
    }
    spawn_xp(state, enemy.pos, enemy.xp);
    spawn_coin(state, enemy.pos);
    let particles = state.tuning.combat.death_particles;
    state.spawn_particles(enemy.pos, palette::BLOOD, particles);
    state.emit(GameEvent::Sound(SoundCue::Kill));
    state.emit(GameEvent::EnemyKilled {
        id: enemy.id,
        kind: enemy.kind,
        boss: enemy.boss,
    });
}

/// Split an XP reward across up to `max_orbs` orbs
///
/// Each orb carries `ceil(xp / count)`, so the batch may exceed the reward by
/// less than one orb's worth.
pub fn spawn_xp(state: &mut GameState, pos: Vec2, xp: u32) {
    let per_orb = state.tuning.pickups.xp_per_orb.max(1);
    let count = xp.div_ceil(per_orb).min(state.tuning.pickups.max_orbs);
    if count == 0 {
        return;
    }
    let value = xp.div_ceil(count);
    let scatter = state.tuning.pickups.orb_scatter;
    for _ in 0..count {
        let offset = if scatter > 0.0 {
            Vec2::new(
                state.rng.random_range(-scatter..scatter),
                state.rng.random_range(-scatter..scatter),
            )
        } else {
            Vec2::ZERO
        };
        state.spawn_pickup(PickupKind::Xp, pos + offset, value);
    }
}

/// Maybe drop a gold coin (chance and value scale with luck)
pub fn spawn_coin(state: &mut GameState, pos: Vec2) {
    let luck = state.player.stats.luck;
    let tuning = &state.tuning.pickups;
    let (chance, min, max) = (tuning.coin_chance, tuning.coin_min, tuning.coin_max);
    if state.rng.random::<f32>() >= chance * luck {
        return;
    }
    let roll = if max > min {
        state.rng.random_range(min..max)
    } else {
        min
    };
    let value = ((roll * luck).floor() as u32).max(1);
    let offset = Vec2::new(
        state.rng.random_range(-10.0..10.0),
        state.rng.random_range(-10.0..10.0),
    );
    state.spawn_pickup(PickupKind::Gold, pos + offset, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::EnemyKind;

    fn add_enemy(state: &mut GameState, health: f32, xp: u32) -> usize {
        let id = state.next_entity_id();
        state.enemies.push(Enemy {
            id,
            kind: EnemyKind::Zombie,
            pos: Vec2::new(100.0, 0.0),
            radius: 14.0,
            speed: 40.0,
            health,
            max_health: health,
            damage: 10.0,
            xp,
            hit_timer: 0.0,
            contact_cooldown: 0.0,
            boss: false,
            facing_right: true,
        });
        state.enemies.len() - 1
    }

    #[test]
    fn test_damage_enemy_no_crit() {
        let mut state = GameState::new(1);
        state.player.stats.crit_chance = 0.0;
        let i = add_enemy(&mut state, 50.0, 5);
        let applied = damage_enemy(&mut state, i, 10.0);
        assert_eq!(applied, 10.0);
        assert_eq!(state.enemies[i].health, 40.0);
        assert!(state.enemies[i].hit_timer > 0.0);
        assert_eq!(state.floating_texts.len(), 1);
        assert!(!state.floating_texts[0].crit);
        assert_eq!(state.floating_texts[0].amount, 10);
        assert!(!state.particles.is_empty());
        assert_eq!(state.combo, 1);
    }

    #[test]
    fn test_damage_enemy_always_crit() {
        let mut state = GameState::new(1);
        state.player.stats.crit_chance = 1.0;
        state.player.stats.crit_multiplier = 2.5;
        let i = add_enemy(&mut state, 50.0, 5);
        let applied = damage_enemy(&mut state, i, 10.0);
        assert_eq!(applied, 25.0);
        assert_eq!(state.enemies[i].health, 25.0);
        assert!(state.floating_texts[0].crit);
    }

    #[test]
    fn test_damage_enemy_invalid_index() {
        let mut state = GameState::new(1);
        assert_eq!(damage_enemy(&mut state, 3, 10.0), 0.0);
        assert_eq!(state.combo, 0);
    }

    #[test]
    fn test_combo_decays_after_window() {
        let mut state = GameState::new(1);
        register_hit(&mut state);
        register_hit(&mut state);
        assert_eq!(state.combo, 2);
        decay_combo(&mut state, 1.0);
        assert_eq!(state.combo, 2);
        register_hit(&mut state);
        decay_combo(&mut state, 1.5);
        assert_eq!(state.combo, 3, "refresh restarts the window");
        decay_combo(&mut state, 0.6);
        assert_eq!(state.combo, 0);
        assert_eq!(state.best_combo, 3);
    }

    #[test]
    fn test_damage_player_armor_and_minimum() {
        let mut state = GameState::new(1);
        state.player.stats.armor = 3.0;
        damage_player(&mut state, 10.0);
        assert_eq!(state.player.health, 93.0);

        state.player.invincible = false;
        state.player.stats.armor = 50.0;
        damage_player(&mut state, 10.0);
        assert_eq!(state.player.health, 92.0, "at least 1 damage");
    }

    #[test]
    fn test_invincibility_is_exclusive() {
        let mut state = GameState::new(1);
        damage_player(&mut state, 10.0);
        damage_player(&mut state, 10.0);
        damage_player(&mut state, 30.0);
        assert_eq!(state.player.health, 90.0);
        assert!(state.player.invincible);
        assert_eq!(
            state
                .events
                .iter()
                .filter(|e| **e == GameEvent::Sound(SoundCue::Hurt))
                .count(),
            1
        );
    }

    #[test]
    fn test_lethal_damage_ends_run() {
        let mut state = GameState::new(1);
        state.player.health = 5.0;
        damage_player(&mut state, 50.0);
        assert_eq!(state.player.health, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_reap_rewards_once() {
        let mut state = GameState::new(1);
        state.tuning.pickups.coin_chance = 0.0;
        let i = add_enemy(&mut state, 10.0, 23);
        add_enemy(&mut state, 10.0, 5);
        state.enemies[i].health = -4.0;

        reap_enemies(&mut state);
        reap_enemies(&mut state);

        assert_eq!(state.kills, 1);
        assert_eq!(state.enemies.len(), 1);
        // 23 xp -> 5 orbs of 5
        let xp: Vec<u32> = state.pickups.iter().map(|p| p.value).collect();
        assert_eq!(xp.len(), 5);
        let total: u32 = xp.iter().sum();
        assert!(total >= 23 && total - 23 < xp.len() as u32);
    }

    #[test]
    fn test_reap_drops_despawned_without_kill() {
        let mut state = GameState::new(1);
        let i = add_enemy(&mut state, 10.0, 5);
        let id = state.enemies[i].id;
        state.pending.enemies.insert(id);
        reap_enemies(&mut state);
        assert!(state.enemies.is_empty());
        assert_eq!(state.kills, 0);
        assert!(state.pickups.is_empty());
    }

    #[test]
    fn test_xp_orb_cap() {
        let mut state = GameState::new(1);
        spawn_xp(&mut state, Vec2::ZERO, 100);
        assert_eq!(state.pickups.len(), 10);
        assert!(state.pickups.iter().all(|p| p.value == 10));
        spawn_xp(&mut state, Vec2::ZERO, 0);
        assert_eq!(state.pickups.len(), 10);
    }

    #[test]
    fn test_coin_always_drops_with_full_chance() {
        let mut state = GameState::new(1);
        state.tuning.pickups.coin_chance = 1.0;
        spawn_coin(&mut state, Vec2::ZERO);
        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.pickups[0].kind, PickupKind::Gold);
        assert!((1..=5).contains(&state.pickups[0].value));
    }
}
