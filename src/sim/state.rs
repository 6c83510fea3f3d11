//! Game state and core simulation types
//!
//! Every entity collection is owned by `GameState`; systems borrow it mutably
//! only for their phase of the frame.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::abilities::{Ability, AbilityKind};
use super::achievements::Achievement;
use super::progression::UpgradeId;
use crate::tuning::{EnemyKind, PlayerTuning, Tuning};

/// Particle colors (0xRRGGBB)
pub mod palette {
    pub const HIT: u32 = 0xffffff;
    pub const BLOOD: u32 = 0xe74c3c;
    pub const GOLD: u32 = 0xf1c40f;
    pub const LIGHTNING: u32 = 0xf1c40f;
    pub const AURA: u32 = 0xf39c12;
    pub const FIRE: u32 = 0xe74c3c;
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Frozen while the player picks one of the offered upgrades
    LevelUp,
    /// Frozen by the player or host (tab hidden, window blur)
    Paused,
    /// Run ended
    GameOver,
}

/// Sound cues for the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Shoot,
    Hit,
    Kill,
    Xp,
    Coin,
    LevelUp,
    Hurt,
    GameOver,
}

/// Final stats of a finished run, handed to the records layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub survival_time: f32,
    pub kills: u32,
    pub level: u32,
    pub gold: u32,
    pub best_combo: u32,
    pub achievements: Vec<Achievement>,
}

/// Things that happened during a frame, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    Sound(SoundCue),
    ScreenShake,
    EnemyKilled { id: u32, kind: EnemyKind, boss: bool },
    UpgradeOffered { level: u32, choices: Vec<UpgradeId> },
    UpgradeApplied { id: UpgradeId },
    AchievementUnlocked(Achievement),
    GameOver(RunSummary),
}

/// Mutable player stats (targets of stat upgrades)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub max_health: f32,
    pub speed: f32,
    pub damage: f32,
    pub armor: f32,
    /// Health restored per second
    pub regen: f32,
    pub pickup_range: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// Multiplier applied to every ability cooldown (lower is faster)
    pub cooldown_reduction: f32,
    pub luck: f32,
}

impl PlayerStats {
    pub fn from_tuning(tuning: &PlayerTuning) -> Self {
        Self {
            max_health: tuning.max_health,
            speed: tuning.speed,
            damage: tuning.damage,
            armor: tuning.armor,
            regen: tuning.regen,
            pickup_range: tuning.pickup_range,
            crit_chance: tuning.crit_chance,
            crit_multiplier: tuning.crit_multiplier,
            cooldown_reduction: tuning.cooldown_reduction,
            luck: tuning.luck,
        }
    }
}

/// The player character
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub pos: Vec2,
    /// Movement intent for the current frame (length <= 1)
    pub intent: Vec2,
    pub radius: f32,
    pub health: f32,
    pub xp: u32,
    pub xp_to_level: u32,
    pub level: u32,
    pub stats: PlayerStats,
    pub invincible: bool,
    pub invincible_timer: f32,
    pub regen_timer: f32,
    pub facing_right: bool,
    pub abilities: Vec<Ability>,
}

impl Player {
    pub fn new(tuning: &PlayerTuning) -> Self {
        Self {
            pos: Vec2::ZERO,
            intent: Vec2::ZERO,
            radius: crate::consts::PLAYER_RADIUS,
            health: tuning.max_health,
            xp: 0,
            xp_to_level: tuning.xp_to_first_level,
            level: 1,
            stats: PlayerStats::from_tuning(tuning),
            invincible: false,
            invincible_timer: 0.0,
            regen_timer: 0.0,
            facing_right: true,
            abilities: Vec::new(),
        }
    }

    pub fn ability(&self, kind: AbilityKind) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.kind == kind)
    }

    pub fn ability_mut(&mut self, kind: AbilityKind) -> Option<&mut Ability> {
        self.abilities.iter_mut().find(|a| a.kind == kind)
    }

    /// Scale applied to raw weapon damage
    pub fn damage_factor(&self, base_damage: f32) -> f32 {
        if base_damage > 0.0 {
            self.stats.damage / base_damage
        } else {
            1.0
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// An enemy entity
#[derive(Debug, Clone, Serialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    /// Contact damage
    pub damage: f32,
    pub xp: u32,
    /// Hit-flash timer (visual)
    pub hit_timer: f32,
    /// Throttle for orbiting-body hits
    pub contact_cooldown: f32,
    pub boss: bool,
    pub facing_right: bool,
}

impl Enemy {
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// A projectile fired by a weapon
#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub size: f32,
    /// Enemies this projectile may still pass through
    pub pierce: u32,
    /// Seconds until expiry
    pub life: f32,
    pub source: AbilityKind,
    /// Enemies already struck (each enemy is hit at most once)
    #[serde(skip)]
    pub hit: Vec<u32>,
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Xp,
    Gold,
}

/// An XP orb or gold coin on the ground
#[derive(Debug, Clone, Serialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub value: u32,
    pub collected: bool,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    /// 0-1, decreases over time
    pub life: f32,
    pub size: f32,
}

/// Floating damage number
#[derive(Debug, Clone, Serialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub amount: u32,
    pub vel_y: f32,
    pub life: f32,
    pub crit: bool,
}

/// Entities scheduled for removal at the end of the frame
#[derive(Debug, Clone, Default)]
pub struct PendingRemoval {
    /// Enemies leaving without a kill (out of range)
    pub enemies: BTreeSet<u32>,
    pub projectiles: BTreeSet<u32>,
}

impl PendingRemoval {
    pub fn clear(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
    }
}

/// Default particle cap (see `QualityPreset::max_particles`)
pub const MAX_PARTICLES: usize = 500;

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Seconds survived (only advances while Running)
    pub survival_time: f32,
    pub player: Player,
    /// Top-left corner of the viewport in world space
    pub camera: Vec2,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    pub particles: Vec<Particle>,
    pub floating_texts: Vec<FloatingText>,
    /// Seconds until the next spawn batch
    pub spawn_timer: f32,
    pub kills: u32,
    pub bosses_killed: u32,
    pub gold: u32,
    pub combo: u32,
    pub combo_timer: f32,
    pub best_combo: u32,
    /// Upgrade ids on offer while in `LevelUp`
    pub offer: Option<Vec<UpgradeId>>,
    /// Achievements unlocked so far (including ones from earlier runs)
    pub unlocked: BTreeSet<Achievement>,
    /// Achievements unlocked during this run
    pub run_achievements: Vec<Achievement>,
    pub events: Vec<GameEvent>,
    pub particle_cap: usize,
    pub pending: PendingRemoval,
    next_id: u32,
}

impl GameState {
    /// Create a new run with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Create a new run with the given balance table
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: Player::new(&tuning.player),
            tuning,
            phase: GamePhase::Running,
            survival_time: 0.0,
            camera: Vec2::ZERO,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            particles: Vec::new(),
            floating_texts: Vec::new(),
            spawn_timer: 0.0,
            kills: 0,
            bosses_killed: 0,
            gold: 0,
            combo: 0,
            combo_timer: 0.0,
            best_combo: 0,
            offer: None,
            unlocked: BTreeSet::new(),
            run_achievements: Vec::new(),
            events: Vec::new(),
            particle_cap: MAX_PARTICLES,
            pending: PendingRemoval::default(),
            next_id: 1,
        };
        state.start_loadout();
        state
    }

    /// Return to a fresh run, keeping tuning, particle cap and unlocked achievements
    pub fn reset(&mut self, seed: u64) {
        let tuning = std::mem::take(&mut self.tuning);
        let unlocked = std::mem::take(&mut self.unlocked);
        let particle_cap = self.particle_cap;
        *self = Self::with_tuning(seed, tuning);
        self.unlocked = unlocked;
        self.particle_cap = particle_cap;
        log::info!("Run reset with seed {}", seed);
    }

    fn start_loadout(&mut self) {
        self.player
            .abilities
            .push(Ability::new(AbilityKind::Knife, &self.tuning.weapons));
        self.update_camera();
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Center the viewport on the player
    pub fn update_camera(&mut self) {
        self.camera = self.player.pos - self.tuning.viewport / 2.0;
    }

    /// Burst of cosmetic particles, bounded by the particle cap
    pub fn spawn_particles(&mut self, pos: Vec2, color: u32, count: u32) {
        for _ in 0..count {
            if self.particles.len() >= self.particle_cap {
                break;
            }
            let vel = Vec2::new(
                self.rng.random_range(-100.0..100.0),
                self.rng.random_range(-100.0..100.0),
            );
            let size = self.rng.random_range(2.0..6.0);
            self.particles.push(Particle {
                pos,
                vel,
                color,
                life: 1.0,
                size,
            });
        }
    }

    /// Floating damage number above a hit
    pub fn show_damage(&mut self, pos: Vec2, amount: f32, crit: bool) {
        let jitter = self.rng.random_range(-10.0..10.0);
        self.floating_texts.push(FloatingText {
            pos: Vec2::new(pos.x + jitter, pos.y),
            amount: amount.round().max(0.0) as u32,
            vel_y: -80.0,
            life: 1.0,
            crit,
        });
    }

    /// Spawn a pickup at `pos`
    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2, value: u32) -> u32 {
        let id = self.next_entity_id();
        self.pickups.push(Pickup {
            id,
            kind,
            pos,
            value,
            collected: false,
        });
        id
    }

    /// Stats reported to the records layer
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            survival_time: self.survival_time,
            kills: self.kills,
            level: self.player.level,
            gold: self.gold,
            best_combo: self.best_combo,
            achievements: self.run_achievements.clone(),
        }
    }
}
