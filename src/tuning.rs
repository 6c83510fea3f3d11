//! Data-driven game balance
//!
//! Every number that shapes a run lives here so balance passes never touch
//! simulation code. `Tuning::default()` is the shipped balance; hosts may load
//! overrides from JSON (missing fields fall back to defaults).

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_FRAME_DT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};

/// Errors produced while loading a tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning needs at least one ungated enemy archetype as spawn fallback")]
    NoFallbackArchetype,
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Enemy archetype identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Zombie,
    Bat,
    Skeleton,
    Ghost,
    Demon,
    Boss,
}

/// Time/roll condition under which an archetype may be picked
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpawnGate {
    /// Survival time (seconds) that must be exceeded
    pub unlock_after: f32,
    /// The spawn roll in [0, 1) must be below this
    pub roll_below: f32,
}

/// Named enemy template before difficulty scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archetype {
    pub kind: EnemyKind,
    pub radius: f32,
    pub speed: f32,
    pub health: f32,
    pub damage: f32,
    pub xp: u32,
    #[serde(default)]
    pub boss: bool,
    /// `None` marks a fallback archetype
    #[serde(default)]
    pub gate: Option<SpawnGate>,
}

impl Archetype {
    fn new(kind: EnemyKind, radius: f32, speed: f32, health: f32, damage: f32, xp: u32) -> Self {
        Self {
            kind,
            radius,
            speed,
            health,
            damage,
            xp,
            boss: false,
            gate: None,
        }
    }

    fn gated(mut self, unlock_after: f32, roll_below: f32) -> Self {
        self.gate = Some(SpawnGate {
            unlock_after,
            roll_below,
        });
        self
    }
}

/// Default archetype table, checked in order (rarest first, fallback last)
fn default_archetypes() -> Vec<Archetype> {
    let mut boss = Archetype::new(EnemyKind::Boss, 24.0, 25.0, 300.0, 30.0, 100).gated(300.0, 0.03);
    boss.boss = true;
    vec![
        boss,
        Archetype::new(EnemyKind::Demon, 14.0, 35.0, 60.0, 20.0, 15).gated(180.0, 0.15),
        Archetype::new(EnemyKind::Skeleton, 14.0, 50.0, 30.0, 12.0, 8).gated(120.0, 0.25),
        Archetype::new(EnemyKind::Ghost, 14.0, 60.0, 15.0, 8.0, 6).gated(60.0, 0.35),
        Archetype::new(EnemyKind::Bat, 14.0, 80.0, 10.0, 5.0, 3).gated(0.0, 0.4),
        Archetype::new(EnemyKind::Zombie, 14.0, 40.0, 20.0, 10.0, 5),
    ]
}

/// Starting player stats and leveling curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_health: f32,
    pub speed: f32,
    /// Damage stat; weapon damage is scaled by `damage / base_damage`
    pub damage: f32,
    pub base_damage: f32,
    pub armor: f32,
    pub regen: f32,
    pub pickup_range: f32,
    pub luck: f32,
    pub cooldown_reduction: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub invincibility_secs: f32,
    pub xp_to_first_level: u32,
    pub xp_growth: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            speed: 120.0,
            damage: 10.0,
            base_damage: 10.0,
            armor: 0.0,
            regen: 0.0,
            pickup_range: 60.0,
            luck: 1.0,
            cooldown_reduction: 1.0,
            crit_chance: 0.1,
            crit_multiplier: 2.0,
            invincibility_secs: 1.0,
            xp_to_first_level: 50,
            xp_growth: 1.2,
        }
    }
}

/// Spawn cadence and difficulty scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub interval_base: f32,
    pub interval_min: f32,
    /// Seconds of survival per second of interval reduction
    pub interval_decay: f32,
    /// Seconds of survival per extra enemy in each spawn batch
    pub count_step: f32,
    /// Seconds of survival per +1 difficulty
    pub difficulty_period: f32,
    /// Distance outside the viewport edge
    pub margin: f32,
    pub despawn_distance: f32,
    pub speed_scale: f32,
    pub damage_scale: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            interval_base: 1.5,
            interval_min: 0.2,
            interval_decay: 120.0,
            count_step: 30.0,
            difficulty_period: 60.0,
            margin: 100.0,
            despawn_distance: 1500.0,
            speed_scale: 0.05,
            damage_scale: 0.03,
        }
    }
}

/// Hit feedback and combo timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub hit_flash_secs: f32,
    pub combo_window: f32,
    pub orbit_hit_cooldown: f32,
    pub hit_particles: u32,
    pub death_particles: u32,
    pub hurt_particles: u32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            hit_flash_secs: 0.1,
            combo_window: 2.0,
            orbit_hit_cooldown: 0.3,
            hit_particles: 3,
            death_particles: 15,
            hurt_particles: 10,
        }
    }
}

/// XP orb and gold coin behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    /// Seek speed at the edge of the magnet range
    pub base_speed: f32,
    /// Extra seek speed gained as the pickup closes in
    pub pull_speed: f32,
    pub collect_radius: f32,
    /// Coins use a reduced magnet range
    pub coin_range_factor: f32,
    pub xp_per_orb: u32,
    pub max_orbs: u32,
    pub orb_scatter: f32,
    pub coin_chance: f32,
    pub coin_min: f32,
    pub coin_max: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            base_speed: 100.0,
            pull_speed: 300.0,
            collect_radius: 20.0,
            coin_range_factor: 0.8,
            xp_per_orb: 5,
            max_orbs: 10,
            orb_scatter: 20.0,
            coin_chance: 0.2,
            coin_min: 1.0,
            coin_max: 5.0,
        }
    }
}

/// Projectile emitter (knife, fireball)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileWeapon {
    pub damage: f32,
    pub cooldown: f32,
    pub projectiles: u32,
    pub speed: f32,
    /// Angle between adjacent projectiles (radians)
    pub spread: f32,
    pub pierce: u32,
    pub size: f32,
    pub size_per_level: f32,
    pub lifetime: f32,
}

/// Orbiting bodies (magic orb)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitWeapon {
    pub damage: f32,
    pub count: u32,
    /// Radians per second
    pub angular_speed: f32,
    pub radius: f32,
    pub radius_per_level: f32,
    pub hit_radius: f32,
}

/// Multi-target strike (lightning)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainWeapon {
    pub damage: f32,
    pub cooldown: f32,
    pub chains: u32,
}

/// Damage field around the player (aura, garlic)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaWeapon {
    pub dps: f32,
    pub radius: f32,
    pub radius_per_level: f32,
    pub knockback: f32,
}

/// Base stats for every weapon plus per-level growth
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub knife: ProjectileWeapon,
    pub fireball: ProjectileWeapon,
    pub orb: OrbitWeapon,
    pub lightning: ChainWeapon,
    pub aura: AreaWeapon,
    pub garlic: AreaWeapon,
    pub level_damage_growth: f32,
    pub level_cooldown_factor: f32,
    pub level_radius_growth: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            knife: ProjectileWeapon {
                damage: 10.0,
                cooldown: 1.0,
                projectiles: 1,
                speed: 300.0,
                spread: 0.2,
                pierce: 0,
                size: 8.0,
                size_per_level: 0.0,
                lifetime: 3.0,
            },
            fireball: ProjectileWeapon {
                damage: 20.0,
                cooldown: 1.5,
                projectiles: 1,
                speed: 200.0,
                spread: 0.3,
                pierce: 0,
                size: 12.0,
                size_per_level: 2.0,
                lifetime: 4.0,
            },
            orb: OrbitWeapon {
                damage: 8.0,
                count: 2,
                angular_speed: 2.0,
                radius: 70.0,
                radius_per_level: 10.0,
                hit_radius: 15.0,
            },
            lightning: ChainWeapon {
                damage: 15.0,
                cooldown: 2.0,
                chains: 3,
            },
            aura: AreaWeapon {
                dps: 5.0,
                radius: 80.0,
                radius_per_level: 15.0,
                knockback: 0.0,
            },
            garlic: AreaWeapon {
                dps: 3.0,
                radius: 60.0,
                radius_per_level: 10.0,
                knockback: 50.0,
            },
            level_damage_growth: 1.2,
            level_cooldown_factor: 0.9,
            level_radius_growth: 1.15,
        }
    }
}

/// Sampling weight per rarity tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityWeights {
    pub common: f32,
    pub uncommon: f32,
    pub rare: f32,
    pub epic: f32,
    pub legendary: f32,
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            common: 10.0,
            uncommon: 6.0,
            rare: 3.0,
            epic: 1.0,
            legendary: 0.5,
        }
    }
}

/// Cull distance kept beyond the farthest spawn point
pub const DESPAWN_SLACK: f32 = 200.0;

/// Complete balance table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Upper bound on a single simulation step (seconds)
    pub max_frame_dt: f32,
    /// Logical viewport size (world units)
    pub viewport: Vec2,
    pub player: PlayerTuning,
    pub spawn: SpawnTuning,
    pub archetypes: Vec<Archetype>,
    pub combat: CombatTuning,
    pub pickups: PickupTuning,
    pub weapons: WeaponTuning,
    pub rarity: RarityWeights,
    /// Number of upgrade cards offered per level-up
    pub offer_size: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_frame_dt: MAX_FRAME_DT,
            viewport: Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            player: PlayerTuning::default(),
            spawn: SpawnTuning::default(),
            archetypes: default_archetypes(),
            combat: CombatTuning::default(),
            pickups: PickupTuning::default(),
            weapons: WeaponTuning::default(),
            rarity: RarityWeights::default(),
            offer_size: 3,
        }
    }
}

impl Tuning {
    /// Parse a tuning table from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Distance from the player to the farthest spawn point (a viewport
    /// corner pushed out by the spawn margin)
    pub fn farthest_spawn_distance(&self) -> f32 {
        (self.viewport / 2.0 + Vec2::splat(self.spawn.margin)).length()
    }

    /// Cull radius in effect for the current viewport. Grows with large
    /// viewports so fresh spawns are never culled on arrival.
    pub fn despawn_distance(&self) -> f32 {
        self.spawn
            .despawn_distance
            .max(self.farthest_spawn_distance() + DESPAWN_SLACK)
    }

    /// Reject tables the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if !self.archetypes.iter().any(|a| a.gate.is_none()) {
            return Err(TuningError::NoFallbackArchetype);
        }
        if !(self.max_frame_dt > 0.0) {
            return Err(TuningError::Invalid {
                field: "max_frame_dt",
                reason: "must be positive",
            });
        }
        if !(self.player.xp_growth > 1.0) {
            return Err(TuningError::Invalid {
                field: "player.xp_growth",
                reason: "must be greater than 1",
            });
        }
        if self.player.xp_to_first_level == 0 {
            return Err(TuningError::Invalid {
                field: "player.xp_to_first_level",
                reason: "must be at least 1",
            });
        }
        if !(self.spawn.interval_min > 0.0) {
            return Err(TuningError::Invalid {
                field: "spawn.interval_min",
                reason: "must be positive",
            });
        }
        if !(self.player.max_health > 0.0) {
            return Err(TuningError::Invalid {
                field: "player.max_health",
                reason: "must be positive",
            });
        }
        if !(self.spawn.despawn_distance > self.farthest_spawn_distance()) {
            return Err(TuningError::Invalid {
                field: "spawn.despawn_distance",
                reason: "must lie beyond the farthest spawn point",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "max_frame_dt": 0.05, "player": { "speed": 200.0 } }"#)
            .expect("valid tuning");
        assert_eq!(tuning.max_frame_dt, 0.05);
        assert_eq!(tuning.player.speed, 200.0);
        assert_eq!(tuning.player.max_health, 100.0);
        assert_eq!(tuning.archetypes.len(), 6);
    }

    #[test]
    fn test_rejects_missing_fallback() {
        let json = r#"{ "archetypes": [
            { "kind": "bat", "radius": 14.0, "speed": 80.0, "health": 10.0, "damage": 5.0, "xp": 3,
              "gate": { "unlock_after": 0.0, "roll_below": 0.4 } }
        ] }"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(TuningError::NoFallbackArchetype)
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_rejects_flat_xp_curve() {
        let err = Tuning::from_json(r#"{ "player": { "xp_growth": 1.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "player.xp_growth",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_despawn_inside_spawn_ring() {
        let err = Tuning::from_json(r#"{ "spawn": { "despawn_distance": 500.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "spawn.despawn_distance",
                ..
            }
        ));
    }

    #[test]
    fn test_despawn_distance_follows_viewport() {
        let mut tuning = Tuning::default();
        assert_eq!(tuning.despawn_distance(), tuning.spawn.despawn_distance);
        tuning.viewport = Vec2::new(3840.0, 2160.0);
        assert!(tuning.despawn_distance() >= tuning.farthest_spawn_distance() + DESPAWN_SLACK);
        assert!(tuning.despawn_distance() > tuning.spawn.despawn_distance);
    }
}
