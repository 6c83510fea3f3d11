//! Weapons and abilities owned by the player
//!
//! Every ability has one of four behaviour shapes:
//! - `TimedProjectile`: countdown, then fires projectiles at the nearest enemy
//! - `ChainStrike`: countdown, then instantly hits the N closest enemies
//! - `OrbitingBody`: bodies circling the player, hitting on contact
//! - `AreaPulse`: damage-over-time field around the player
//!
//! Timed shapes reset to `cooldown * cooldown_reduction` after each firing.
//! Continuous shapes run every frame.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::combat;
use super::state::{GameEvent, GameState, Projectile, SoundCue, palette};
use crate::tuning::WeaponTuning;
use crate::{direction_to, polar_to_cartesian};

/// Ability identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    Knife,
    Fireball,
    Orb,
    Lightning,
    Aura,
    Garlic,
}

impl AbilityKind {
    pub fn name(self) -> &'static str {
        match self {
            AbilityKind::Knife => "Throwing Knife",
            AbilityKind::Fireball => "Fireball",
            AbilityKind::Orb => "Magic Orb",
            AbilityKind::Lightning => "Lightning",
            AbilityKind::Aura => "Holy Aura",
            AbilityKind::Garlic => "Garlic",
        }
    }
}

/// Behaviour shape with the magnitude fields it needs
///
/// Count-like values (projectiles, orbs, chain targets, pierce) are stored as
/// level-1 bases and derived from the level; multiplicative magnitudes
/// (damage, cooldown, area radius) are rescaled in place on level-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Behavior {
    TimedProjectile {
        damage: f32,
        cooldown: f32,
        timer: f32,
        projectiles: u32,
        speed: f32,
        spread: f32,
        pierce: u32,
        size: f32,
        size_per_level: f32,
        lifetime: f32,
    },
    OrbitingBody {
        damage: f32,
        count: u32,
        angular_speed: f32,
        radius: f32,
        radius_per_level: f32,
        hit_radius: f32,
    },
    AreaPulse {
        dps: f32,
        radius: f32,
        radius_per_level: f32,
        knockback: f32,
    },
    ChainStrike {
        damage: f32,
        cooldown: f32,
        timer: f32,
        chains: u32,
    },
}

/// An ability instance owned by the player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ability {
    pub kind: AbilityKind,
    pub level: u32,
    pub behavior: Behavior,
}

impl Ability {
    /// Fresh level-1 instance; timed abilities are ready to fire immediately
    pub fn new(kind: AbilityKind, weapons: &WeaponTuning) -> Self {
        let behavior = match kind {
            AbilityKind::Knife | AbilityKind::Fireball => {
                let w = if kind == AbilityKind::Knife {
                    &weapons.knife
                } else {
                    &weapons.fireball
                };
                Behavior::TimedProjectile {
                    damage: w.damage,
                    cooldown: w.cooldown,
                    timer: 0.0,
                    projectiles: w.projectiles,
                    speed: w.speed,
                    spread: w.spread,
                    pierce: w.pierce,
                    size: w.size,
                    size_per_level: w.size_per_level,
                    lifetime: w.lifetime,
                }
            }
            AbilityKind::Orb => Behavior::OrbitingBody {
                damage: weapons.orb.damage,
                count: weapons.orb.count,
                angular_speed: weapons.orb.angular_speed,
                radius: weapons.orb.radius,
                radius_per_level: weapons.orb.radius_per_level,
                hit_radius: weapons.orb.hit_radius,
            },
            AbilityKind::Lightning => Behavior::ChainStrike {
                damage: weapons.lightning.damage,
                cooldown: weapons.lightning.cooldown,
                timer: 0.0,
                chains: weapons.lightning.chains,
            },
            AbilityKind::Aura | AbilityKind::Garlic => {
                let w = if kind == AbilityKind::Aura {
                    &weapons.aura
                } else {
                    &weapons.garlic
                };
                Behavior::AreaPulse {
                    dps: w.dps,
                    radius: w.radius,
                    radius_per_level: w.radius_per_level,
                    knockback: w.knockback,
                }
            }
        };
        Self {
            kind,
            level: 1,
            behavior,
        }
    }

    /// Increment the level and rescale magnitude fields
    pub fn level_up(&mut self, weapons: &WeaponTuning) {
        self.level += 1;
        match &mut self.behavior {
            Behavior::TimedProjectile {
                damage, cooldown, ..
            }
            | Behavior::ChainStrike {
                damage, cooldown, ..
            } => {
                *damage *= weapons.level_damage_growth;
                *cooldown *= weapons.level_cooldown_factor;
            }
            Behavior::OrbitingBody { damage, .. } => {
                *damage *= weapons.level_damage_growth;
            }
            Behavior::AreaPulse { dps, radius, .. } => {
                *dps *= weapons.level_damage_growth;
                *radius *= weapons.level_radius_growth;
            }
        }
    }

    /// Count down a timed ability; returns true when it fires this frame
    ///
    /// Continuous shapes never "fire" and always return false.
    pub fn advance_timer(&mut self, dt: f32, cooldown_reduction: f32) -> bool {
        match &mut self.behavior {
            Behavior::TimedProjectile {
                cooldown, timer, ..
            }
            | Behavior::ChainStrike {
                cooldown, timer, ..
            } => {
                *timer -= dt;
                if *timer <= 0.0 {
                    *timer = *cooldown * cooldown_reduction;
                    true
                } else {
                    false
                }
            }
            Behavior::OrbitingBody { .. } | Behavior::AreaPulse { .. } => false,
        }
    }

    /// Number of projectiles per volley, or bodies in orbit
    pub fn body_count(&self) -> u32 {
        match self.behavior {
            Behavior::TimedProjectile { projectiles, .. } => projectiles + self.level - 1,
            Behavior::OrbitingBody { count, .. } => count + self.level - 1,
            Behavior::ChainStrike { chains, .. } => chains + self.level,
            Behavior::AreaPulse { .. } => 0,
        }
    }

    /// Orbit distance or field radius at the current level
    pub fn effective_radius(&self) -> f32 {
        match self.behavior {
            Behavior::OrbitingBody {
                radius,
                radius_per_level,
                ..
            }
            | Behavior::AreaPulse {
                radius,
                radius_per_level,
                ..
            } => radius + radius_per_level * self.level as f32,
            _ => 0.0,
        }
    }
}

/// Index of the closest live enemy to `from` (first encountered wins ties)
pub fn nearest_enemy(state: &GameState, from: Vec2) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, enemy) in state.enemies.iter().enumerate() {
        if enemy.is_dead() {
            continue;
        }
        let d = from.distance(enemy.pos);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Positions of `count` bodies orbiting `center`
pub fn orbit_positions(
    center: Vec2,
    elapsed: f32,
    angular_speed: f32,
    radius: f32,
    count: u32,
) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let theta = elapsed * angular_speed + i as f32 * TAU / count as f32;
            center + polar_to_cartesian(radius, theta)
        })
        .collect()
}

/// World positions of every orbiting body the player owns (for rendering)
pub fn all_orbit_positions(state: &GameState) -> Vec<Vec2> {
    state
        .player
        .abilities
        .iter()
        .filter_map(|ability| match ability.behavior {
            Behavior::OrbitingBody { angular_speed, .. } => Some(orbit_positions(
                state.player.pos,
                state.survival_time,
                angular_speed,
                ability.effective_radius(),
                ability.body_count(),
            )),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Run every owned ability for one frame
pub fn update_abilities(state: &mut GameState, dt: f32) {
    let cooldown_reduction = state.player.stats.cooldown_reduction;
    for i in 0..state.player.abilities.len() {
        let fired = state.player.abilities[i].advance_timer(dt, cooldown_reduction);
        let ability = state.player.abilities[i].clone();
        match ability.behavior {
            Behavior::TimedProjectile { .. } if fired => fire_projectiles(state, &ability),
            Behavior::ChainStrike { .. } if fired => chain_strike(state, &ability),
            Behavior::OrbitingBody { .. } => update_orbit(state, &ability),
            Behavior::AreaPulse { .. } => update_area(state, &ability, dt),
            _ => {}
        }
    }
}

fn fire_projectiles(state: &mut GameState, ability: &Ability) {
    let Behavior::TimedProjectile {
        damage,
        speed,
        spread,
        pierce,
        size,
        size_per_level,
        lifetime,
        ..
    } = ability.behavior
    else {
        return;
    };
    let origin = state.player.pos;
    let Some(target) = nearest_enemy(state, origin) else {
        return;
    };

    let base_angle = {
        let dir = direction_to(origin, state.enemies[target].pos);
        if dir == Vec2::ZERO { 0.0 } else { dir.y.atan2(dir.x) }
    };
    let count = ability.body_count();
    let damage = damage * state.player.damage_factor(state.tuning.player.base_damage);
    let size = size + size_per_level * ability.level as f32;
    let pierce = pierce + ability.level - 1;

    state.emit(GameEvent::Sound(SoundCue::Shoot));
    for i in 0..count {
        let angle = base_angle + (i as f32 - (count - 1) as f32 / 2.0) * spread;
        let id = state.next_entity_id();
        state.projectiles.push(Projectile {
            id,
            pos: origin,
            vel: polar_to_cartesian(speed, angle),
            damage,
            size,
            pierce,
            life: lifetime,
            source: ability.kind,
            hit: Vec::new(),
        });
    }
}

fn chain_strike(state: &mut GameState, ability: &Ability) {
    let Behavior::ChainStrike { damage, .. } = ability.behavior else {
        return;
    };
    let origin = state.player.pos;
    let mut targets: Vec<(usize, f32)> = state
        .enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.is_dead())
        .map(|(i, e)| (i, origin.distance(e.pos)))
        .collect();
    if targets.is_empty() {
        return;
    }
    // Stable sort keeps iteration order for equal distances
    targets.sort_by(|a, b| a.1.total_cmp(&b.1));
    targets.truncate(ability.body_count() as usize);

    let damage = damage * state.player.damage_factor(state.tuning.player.base_damage);
    state.emit(GameEvent::Sound(SoundCue::Shoot));
    for (index, _) in targets {
        combat::damage_enemy(state, index, damage);
        let pos = state.enemies[index].pos;
        state.spawn_particles(pos, palette::LIGHTNING, 8);
    }
}

fn update_orbit(state: &mut GameState, ability: &Ability) {
    let Behavior::OrbitingBody {
        damage,
        angular_speed,
        hit_radius,
        ..
    } = ability.behavior
    else {
        return;
    };
    let bodies = orbit_positions(
        state.player.pos,
        state.survival_time,
        angular_speed,
        ability.effective_radius(),
        ability.body_count(),
    );
    let damage = damage * state.player.damage_factor(state.tuning.player.base_damage);
    let hit_cooldown = state.tuning.combat.orbit_hit_cooldown;

    for body in bodies {
        for i in 0..state.enemies.len() {
            let enemy = &state.enemies[i];
            if enemy.is_dead() || enemy.contact_cooldown > 0.0 {
                continue;
            }
            if body.distance(enemy.pos) < enemy.radius + hit_radius {
                combat::damage_enemy(state, i, damage);
                state.enemies[i].contact_cooldown = hit_cooldown;
            }
        }
    }
}

fn update_area(state: &mut GameState, ability: &Ability, dt: f32) {
    let Behavior::AreaPulse { dps, knockback, .. } = ability.behavior else {
        return;
    };
    let center = state.player.pos;
    let radius = ability.effective_radius();
    // True per-second damage, not a contact pulse
    let amount = dps * state.player.damage_factor(state.tuning.player.base_damage) * dt;

    for i in 0..state.enemies.len() {
        let enemy = &mut state.enemies[i];
        if enemy.is_dead() || center.distance(enemy.pos) >= radius + enemy.radius {
            continue;
        }
        combat::apply_tick_damage(enemy, amount);
        if knockback > 0.0 {
            enemy.pos += direction_to(center, enemy.pos) * knockback * dt;
        }
        if ability.kind == AbilityKind::Aura && state.rng.random::<f32>() < 0.05 {
            let pos = state.enemies[i].pos;
            state.spawn_particles(pos, palette::AURA, 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Enemy;
    use crate::tuning::EnemyKind;

    fn enemy_at(state: &mut GameState, pos: Vec2, health: f32) -> usize {
        let id = state.next_entity_id();
        state.enemies.push(Enemy {
            id,
            kind: EnemyKind::Zombie,
            pos,
            radius: 14.0,
            speed: 0.0,
            health,
            max_health: health,
            damage: 10.0,
            xp: 5,
            hit_timer: 0.0,
            contact_cooldown: 0.0,
            boss: false,
            facing_right: true,
        });
        state.enemies.len() - 1
    }

    fn no_crit(state: &mut GameState) {
        state.player.stats.crit_chance = 0.0;
    }

    #[test]
    fn test_nearest_enemy_ties_first() {
        let mut state = GameState::new(1);
        enemy_at(&mut state, Vec2::new(50.0, 0.0), 10.0);
        enemy_at(&mut state, Vec2::new(0.0, 50.0), 10.0);
        enemy_at(&mut state, Vec2::new(80.0, 0.0), 10.0);
        assert_eq!(nearest_enemy(&state, Vec2::ZERO), Some(0));
    }

    #[test]
    fn test_nearest_enemy_skips_dead() {
        let mut state = GameState::new(1);
        let dead = enemy_at(&mut state, Vec2::new(10.0, 0.0), 10.0);
        state.enemies[dead].health = 0.0;
        enemy_at(&mut state, Vec2::new(90.0, 0.0), 10.0);
        assert_eq!(nearest_enemy(&state, Vec2::ZERO), Some(1));
        assert_eq!(nearest_enemy(&GameState::new(1), Vec2::ZERO), None);
    }

    #[test]
    fn test_orbit_positions_deterministic() {
        let a = orbit_positions(Vec2::ZERO, 1.5, 2.0, 70.0, 3);
        let b = orbit_positions(Vec2::ZERO, 1.5, 2.0, 70.0, 3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        for p in &a {
            assert!((p.length() - 70.0).abs() < 1e-3);
        }
        // Evenly spaced: first body at elapsed * speed
        let expected = polar_to_cartesian(70.0, 3.0);
        assert!((a[0] - expected).length() < 1e-3);
    }

    #[test]
    fn test_timed_fire_resets_with_cooldown_reduction() {
        let weapons = WeaponTuning::default();
        let mut knife = Ability::new(AbilityKind::Knife, &weapons);
        assert!(knife.advance_timer(0.016, 0.5));
        let Behavior::TimedProjectile { timer, .. } = knife.behavior else {
            panic!("knife is a timed projectile");
        };
        assert!((timer - 0.5).abs() < 1e-6);
        assert!(!knife.advance_timer(0.1, 0.5));
    }

    #[test]
    fn test_level_up_scaling() {
        let weapons = WeaponTuning::default();
        let mut knife = Ability::new(AbilityKind::Knife, &weapons);
        knife.level_up(&weapons);
        assert_eq!(knife.level, 2);
        assert_eq!(knife.body_count(), 2);
        let Behavior::TimedProjectile {
            damage, cooldown, ..
        } = knife.behavior
        else {
            panic!("knife is a timed projectile");
        };
        assert!((damage - 12.0).abs() < 1e-4);
        assert!((cooldown - 0.9).abs() < 1e-4);

        let mut aura = Ability::new(AbilityKind::Aura, &weapons);
        assert!((aura.effective_radius() - 95.0).abs() < 1e-4);
        aura.level_up(&weapons);
        assert!((aura.effective_radius() - (80.0 * 1.15 + 30.0)).abs() < 1e-3);

        let lightning = Ability::new(AbilityKind::Lightning, &weapons);
        assert_eq!(lightning.body_count(), 4);
    }

    #[test]
    fn test_knife_fires_at_nearest() {
        let mut state = GameState::new(7);
        no_crit(&mut state);
        enemy_at(&mut state, Vec2::new(0.0, 200.0), 50.0);
        update_abilities(&mut state, 0.016);
        assert_eq!(state.projectiles.len(), 1);
        let p = &state.projectiles[0];
        assert!(p.vel.x.abs() < 1e-3);
        assert!(p.vel.y > 0.0);
        assert_eq!(p.source, AbilityKind::Knife);
        assert!(state.events.contains(&GameEvent::Sound(SoundCue::Shoot)));
    }

    #[test]
    fn test_knife_without_target_still_resets() {
        let mut state = GameState::new(7);
        update_abilities(&mut state, 0.016);
        assert!(state.projectiles.is_empty());
        let Behavior::TimedProjectile { timer, .. } = state.player.abilities[0].behavior else {
            panic!("knife is a timed projectile");
        };
        assert!(timer > 0.9);
    }

    #[test]
    fn test_chain_strike_hits_closest_n() {
        let mut state = GameState::new(3);
        no_crit(&mut state);
        state.player.abilities.clear();
        state
            .player
            .abilities
            .push(Ability::new(AbilityKind::Lightning, &state.tuning.weapons));
        for d in [500.0, 100.0, 300.0, 200.0, 400.0, 50.0] {
            enemy_at(&mut state, Vec2::new(d, 0.0), 100.0);
        }
        update_abilities(&mut state, 0.016);
        // chains 3 + level 1 = 4 closest: 50, 100, 200, 300
        let damaged: Vec<f32> = state
            .enemies
            .iter()
            .filter(|e| e.health < 100.0)
            .map(|e| e.pos.x)
            .collect();
        assert_eq!(damaged.len(), 4);
        assert!(!damaged.contains(&500.0));
        assert!(!damaged.contains(&400.0));
        assert!(state.enemies.iter().all(|e| e.health == 100.0 || e.health == 85.0));
    }

    #[test]
    fn test_orbit_hits_are_throttled() {
        let mut state = GameState::new(3);
        no_crit(&mut state);
        state.player.abilities.clear();
        state
            .player
            .abilities
            .push(Ability::new(AbilityKind::Orb, &state.tuning.weapons));
        // Orb 0 sits at radius 80 along +x at t = 0
        enemy_at(&mut state, Vec2::new(80.0, 0.0), 100.0);
        update_abilities(&mut state, 0.016);
        assert!((state.enemies[0].health - 92.0).abs() < 1e-4);
        update_abilities(&mut state, 0.016);
        assert!((state.enemies[0].health - 92.0).abs() < 1e-4);
        assert!(state.enemies[0].contact_cooldown > 0.0);
    }

    #[test]
    fn test_area_pulse_scales_with_dt() {
        let mut state = GameState::new(3);
        state.player.abilities.clear();
        state
            .player
            .abilities
            .push(Ability::new(AbilityKind::Garlic, &state.tuning.weapons));
        let i = enemy_at(&mut state, Vec2::new(30.0, 0.0), 100.0);
        let far = enemy_at(&mut state, Vec2::new(300.0, 0.0), 100.0);
        update_abilities(&mut state, 0.5);
        // 3 dps * 0.5 s, no crit, no floating text
        assert!((state.enemies[i].health - 98.5).abs() < 1e-4);
        assert!(state.enemies[i].pos.x > 30.0, "garlic knocks back");
        assert_eq!(state.enemies[far].health, 100.0);
        assert!(state.floating_texts.is_empty());
    }
}
