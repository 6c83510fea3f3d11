//! Experience, level-ups and upgrade selection
//!
//! Crossing the XP threshold levels the player up immediately, resets XP and
//! freezes the run in `GamePhase::LevelUp` with a set of upgrade cards drawn by
//! weighted sampling without replacement. The run resumes once one of the
//! offered cards is selected.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::abilities::{Ability, AbilityKind};
use super::state::{GameEvent, GamePhase, GameState, Player, SoundCue, palette};
use crate::tuning::{RarityWeights, WeaponTuning};

/// Upgrade identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    Knife,
    Fireball,
    Orb,
    Lightning,
    Aura,
    Garlic,
    MaxHealth,
    Armor,
    Speed,
    Might,
    Recovery,
    Magnet,
    Cooldown,
    Luck,
    Critical,
    Brutality,
}

/// Rarity tiers (higher tiers are drawn less often)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn weight(self, weights: &RarityWeights) -> f32 {
        match self {
            Rarity::Common => weights.common,
            Rarity::Uncommon => weights.uncommon,
            Rarity::Rare => weights.rare,
            Rarity::Epic => weights.epic,
            Rarity::Legendary => weights.legendary,
        }
    }
}

/// Player stat targeted by a stat upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    MaxHealth,
    Armor,
    Speed,
    Damage,
    Regen,
    PickupRange,
    CooldownReduction,
    Luck,
    CritChance,
    CritMultiplier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatOp {
    Add,
    Multiply,
}

/// `stat = stat (op) amount`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatMutation {
    pub stat: Stat,
    pub op: StatOp,
    pub amount: f32,
}

/// What selecting an upgrade does
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Install the ability, or level it up if already owned
    Ability { kind: AbilityKind },
    Stat(StatMutation),
}

/// Static upgrade card definition
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub effect: UpgradeEffect,
}

const fn weapon(
    id: UpgradeId,
    kind: AbilityKind,
    name: &'static str,
    description: &'static str,
    rarity: Rarity,
) -> UpgradeDef {
    UpgradeDef {
        id,
        name,
        description,
        rarity,
        effect: UpgradeEffect::Ability { kind },
    }
}

const fn stat(
    id: UpgradeId,
    name: &'static str,
    description: &'static str,
    rarity: Rarity,
    stat: Stat,
    op: StatOp,
    amount: f32,
) -> UpgradeDef {
    UpgradeDef {
        id,
        name,
        description,
        rarity,
        effect: UpgradeEffect::Stat(StatMutation { stat, op, amount }),
    }
}

/// The upgrade catalog
#[rustfmt::skip]
pub static CATALOG: [UpgradeDef; 16] = [
    weapon(UpgradeId::Knife, AbilityKind::Knife, "Throwing Knife", "Throws knives at enemies", Rarity::Common),
    weapon(UpgradeId::Fireball, AbilityKind::Fireball, "Fireball", "Launches fireballs", Rarity::Uncommon),
    weapon(UpgradeId::Orb, AbilityKind::Orb, "Magic Orb", "Orbiting projectiles", Rarity::Rare),
    weapon(UpgradeId::Lightning, AbilityKind::Lightning, "Lightning", "Chain lightning attack", Rarity::Epic),
    weapon(UpgradeId::Aura, AbilityKind::Aura, "Holy Aura", "Damages nearby enemies", Rarity::Rare),
    weapon(UpgradeId::Garlic, AbilityKind::Garlic, "Garlic", "Repels and damages enemies", Rarity::Common),
    stat(UpgradeId::MaxHealth, "Max Health", "+20 Max HP", Rarity::Common, Stat::MaxHealth, StatOp::Add, 20.0),
    stat(UpgradeId::Armor, "Armor", "+3 Armor", Rarity::Common, Stat::Armor, StatOp::Add, 3.0),
    stat(UpgradeId::Speed, "Speed", "+15% Move Speed", Rarity::Common, Stat::Speed, StatOp::Multiply, 1.15),
    stat(UpgradeId::Might, "Might", "+15% Damage", Rarity::Uncommon, Stat::Damage, StatOp::Multiply, 1.15),
    stat(UpgradeId::Recovery, "Recovery", "+1 HP/sec", Rarity::Uncommon, Stat::Regen, StatOp::Add, 1.0),
    stat(UpgradeId::Magnet, "Magnet", "+30% Pickup Range", Rarity::Common, Stat::PickupRange, StatOp::Multiply, 1.3),
    stat(UpgradeId::Cooldown, "Cooldown", "-10% Cooldowns", Rarity::Rare, Stat::CooldownReduction, StatOp::Multiply, 0.9),
    stat(UpgradeId::Luck, "Luck", "+20% Luck", Rarity::Uncommon, Stat::Luck, StatOp::Multiply, 1.2),
    stat(UpgradeId::Critical, "Critical", "+5% Crit Chance", Rarity::Rare, Stat::CritChance, StatOp::Add, 0.05),
    stat(UpgradeId::Brutality, "Brutality", "+50% Crit Damage", Rarity::Epic, Stat::CritMultiplier, StatOp::Add, 0.5),
];

pub fn catalog() -> &'static [UpgradeDef] {
    &CATALOG
}

pub fn find_upgrade(id: UpgradeId) -> Option<&'static UpgradeDef> {
    CATALOG.iter().find(|def| def.id == id)
}

/// Errors from the upgrade-selection boundary
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpgradeError {
    #[error("no upgrade offer is pending")]
    NoOffer,
    #[error("upgrade {0:?} was not part of the offer")]
    NotOffered(UpgradeId),
}

/// Draw up to `count` distinct indices, each with probability proportional to its weight
///
/// Classic roulette wheel: sum the remaining weights, draw uniformly in
/// `[0, total)`, scan the cumulative sum, remove the winner, repeat.
pub fn weighted_sample<R: Rng + ?Sized>(weights: &[f32], count: usize, rng: &mut R) -> Vec<usize> {
    let mut pool: Vec<(usize, f32)> = weights
        .iter()
        .map(|w| w.max(0.0))
        .enumerate()
        .collect();
    let mut picked = Vec::with_capacity(count.min(pool.len()));

    while picked.len() < count && !pool.is_empty() {
        let total: f32 = pool.iter().map(|(_, w)| w).sum();
        let slot = if total > 0.0 {
            let target = rng.random::<f32>() * total;
            let mut cumulative = 0.0;
            pool.iter()
                .position(|(_, w)| {
                    cumulative += w;
                    target < cumulative
                })
                .unwrap_or(pool.len() - 1)
        } else {
            0
        };
        picked.push(pool.remove(slot).0);
    }
    picked
}

/// Draw an upgrade offer from the catalog
pub fn draw_upgrades<R: Rng + ?Sized>(
    catalog: &[UpgradeDef],
    luck: f32,
    weights: &RarityWeights,
    count: usize,
    rng: &mut R,
) -> Vec<UpgradeId> {
    let weights: Vec<f32> = catalog
        .iter()
        .map(|def| def.rarity.weight(weights) * luck)
        .collect();
    weighted_sample(&weights, count, rng)
        .into_iter()
        .map(|i| catalog[i].id)
        .collect()
}

/// Add experience; returns true if this crossed the threshold
///
/// Only one level-up can happen per call, however large the overshoot.
pub fn gain_xp(state: &mut GameState, amount: u32) -> bool {
    if !state.is_running() {
        return false;
    }
    state.player.xp = state.player.xp.saturating_add(amount);
    if state.player.xp >= state.player.xp_to_level {
        level_up(state);
        true
    } else {
        false
    }
}

/// Level up, rescale the threshold and offer upgrades
pub fn level_up(state: &mut GameState) {
    let player = &mut state.player;
    player.level += 1;
    player.xp = 0;
    let scaled = (player.xp_to_level as f32 * state.tuning.player.xp_growth).floor() as u32;
    player.xp_to_level = scaled.max(player.xp_to_level + 1);
    let level = player.level;
    let luck = player.stats.luck;

    let choices = draw_upgrades(
        catalog(),
        luck,
        &state.tuning.rarity,
        state.tuning.offer_size,
        &mut state.rng,
    );
    log::info!("Level {} reached, offering {:?}", level, choices);
    state.emit(GameEvent::Sound(SoundCue::LevelUp));
    if choices.is_empty() {
        return;
    }
    state.phase = GamePhase::LevelUp;
    state.offer = Some(choices.clone());
    state.emit(GameEvent::UpgradeOffered { level, choices });
}

/// Apply one of the offered upgrades and resume the run
pub fn select_upgrade(state: &mut GameState, id: UpgradeId) -> Result<(), UpgradeError> {
    if state.phase != GamePhase::LevelUp {
        return Err(UpgradeError::NoOffer);
    }
    let offered = state.offer.as_ref().ok_or(UpgradeError::NoOffer)?;
    if !offered.contains(&id) {
        return Err(UpgradeError::NotOffered(id));
    }
    let def = find_upgrade(id).ok_or(UpgradeError::NotOffered(id))?;

    apply_effect(&mut state.player, &def.effect, &state.tuning.weapons);
    log::debug!("Applied upgrade {:?}", id);

    state.offer = None;
    state.phase = GamePhase::Running;
    state.emit(GameEvent::UpgradeApplied { id });
    let pos = state.player.pos;
    state.spawn_particles(pos, palette::GOLD, 20);
    Ok(())
}

/// Interpret an upgrade effect against the player
pub fn apply_effect(player: &mut Player, effect: &UpgradeEffect, weapons: &WeaponTuning) {
    match effect {
        UpgradeEffect::Ability { kind } => match player.ability_mut(*kind) {
            Some(ability) => ability.level_up(weapons),
            None => player.abilities.push(Ability::new(*kind, weapons)),
        },
        UpgradeEffect::Stat(mutation) => apply_stat_mutation(player, mutation),
    }
}

/// The single interpreter for stat descriptors
pub fn apply_stat_mutation(player: &mut Player, mutation: &StatMutation) {
    let stats = &mut player.stats;
    let field = match mutation.stat {
        Stat::MaxHealth => &mut stats.max_health,
        Stat::Armor => &mut stats.armor,
        Stat::Speed => &mut stats.speed,
        Stat::Damage => &mut stats.damage,
        Stat::Regen => &mut stats.regen,
        Stat::PickupRange => &mut stats.pickup_range,
        Stat::CooldownReduction => &mut stats.cooldown_reduction,
        Stat::Luck => &mut stats.luck,
        Stat::CritChance => &mut stats.crit_chance,
        Stat::CritMultiplier => &mut stats.crit_multiplier,
    };
    let before = *field;
    *field = match mutation.op {
        StatOp::Add => before + mutation.amount,
        StatOp::Multiply => before * mutation.amount,
    };

    match mutation.stat {
        // Raising max health heals by the same amount
        Stat::MaxHealth => {
            let gained = (stats.max_health - before).max(0.0);
            stats.max_health = stats.max_health.max(1.0);
            player.health = (player.health + gained).min(player.stats.max_health);
        }
        Stat::CritChance => stats.crit_chance = stats.crit_chance.clamp(0.0, 1.0),
        _ => {}
    }
}

/// Card data for the selection UI
#[derive(Debug, Clone, Serialize)]
pub struct OfferCard {
    pub id: UpgradeId,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    /// Level the ability would reach, for abilities already owned
    pub next_level: Option<u32>,
}

/// Cards for the pending offer (empty when none)
pub fn offer_cards(state: &GameState) -> Vec<OfferCard> {
    let Some(offer) = &state.offer else {
        return Vec::new();
    };
    offer
        .iter()
        .filter_map(|id| find_upgrade(*id))
        .map(|def| OfferCard {
            id: def.id,
            name: def.name,
            description: def.description,
            rarity: def.rarity,
            next_level: match def.effect {
                UpgradeEffect::Ability { kind } => state.player.ability(kind).map(|a| a.level + 1),
                UpgradeEffect::Stat(_) => None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let ids: HashSet<_> = catalog().iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn test_sampling_first_draw_matches_weights() {
        let weights = [10.0, 6.0, 3.0, 1.0];
        let total: f32 = weights.iter().sum();
        let mut rng = Pcg32::seed_from_u64(2024);
        let trials = 40_000;
        let mut first = [0usize; 4];
        for _ in 0..trials {
            let picked = weighted_sample(&weights, 3, &mut rng);
            first[picked[0]] += 1;
        }
        for (i, w) in weights.iter().enumerate() {
            let observed = first[i] as f32 / trials as f32;
            let expected = w / total;
            assert!(
                (observed - expected).abs() < 0.015,
                "index {i}: observed {observed}, expected {expected}"
            );
        }
    }

    /// Probability of drawing exactly the set `subset` in `subset.len()` draws
    fn subset_probability(weights: &[f32], subset: &[usize]) -> f32 {
        fn walk(weights: &[f32], remaining: &[usize], pool_total: f32) -> f32 {
            if remaining.is_empty() {
                return 1.0;
            }
            remaining
                .iter()
                .map(|&pick| {
                    let rest: Vec<usize> =
                        remaining.iter().copied().filter(|&i| i != pick).collect();
                    weights[pick] / pool_total * walk(weights, &rest, pool_total - weights[pick])
                })
                .sum()
        }
        walk(weights, subset, weights.iter().sum())
    }

    #[test]
    fn test_three_subset_frequency_matches_theory() {
        let weights = [10.0, 6.0, 3.0, 1.0, 0.5];
        let mut rng = Pcg32::seed_from_u64(7);
        let trials = 40_000;
        let target = [0usize, 1, 3];
        let mut hits = 0;
        for _ in 0..trials {
            let mut picked = weighted_sample(&weights, 3, &mut rng);
            picked.sort_unstable();
            if picked == target {
                hits += 1;
            }
        }
        let expected = subset_probability(&weights, &target);
        let observed = hits as f32 / trials as f32;
        assert!(
            (observed - expected).abs() < 0.015,
            "observed {observed}, expected {expected}"
        );
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..1000 {
            let picked = weighted_sample(&[1.0, 0.0, 1.0], 2, &mut rng);
            assert!(!picked.contains(&1));
        }
    }

    proptest! {
        #[test]
        fn prop_offer_has_no_duplicates(
            seed in any::<u64>(),
            luck in 0.1f32..5.0,
            count in 0usize..20,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let offer = draw_upgrades(catalog(), luck, &RarityWeights::default(), count, &mut rng);
            prop_assert_eq!(offer.len(), count.min(catalog().len()));
            let unique: HashSet<_> = offer.iter().collect();
            prop_assert_eq!(unique.len(), offer.len());
        }
    }

    #[test]
    fn test_overshoot_levels_once() {
        let mut state = GameState::new(5);
        assert!(gain_xp(&mut state, 10_000));
        assert_eq!(state.player.level, 2);
        assert_eq!(state.player.xp, 0);
        assert_eq!(state.player.xp_to_level, 60);
        assert_eq!(state.phase, GamePhase::LevelUp);
        assert_eq!(state.offer.as_ref().map(Vec::len), Some(3));
        let offers = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::UpgradeOffered { .. }))
            .count();
        assert_eq!(offers, 1);
        // Frozen until a selection arrives
        assert!(!gain_xp(&mut state, 10_000));
        assert_eq!(state.player.level, 2);
    }

    #[test]
    fn test_threshold_floors() {
        let mut state = GameState::new(5);
        state.player.xp_to_level = 61;
        level_up(&mut state);
        assert_eq!(state.player.xp_to_level, 73);
    }

    #[test]
    fn test_select_rejects_unoffered() {
        let mut state = GameState::new(5);
        assert_eq!(
            select_upgrade(&mut state, UpgradeId::Armor),
            Err(UpgradeError::NoOffer)
        );
        state.phase = GamePhase::LevelUp;
        state.offer = Some(vec![UpgradeId::Knife, UpgradeId::Speed, UpgradeId::Luck]);
        assert_eq!(
            select_upgrade(&mut state, UpgradeId::Armor),
            Err(UpgradeError::NotOffered(UpgradeId::Armor))
        );
        assert_eq!(state.phase, GamePhase::LevelUp);
    }

    #[test]
    fn test_select_levels_owned_ability() {
        let mut state = GameState::new(5);
        state.phase = GamePhase::LevelUp;
        state.offer = Some(vec![UpgradeId::Knife, UpgradeId::Orb, UpgradeId::Luck]);
        let cards = offer_cards(&state);
        assert_eq!(cards[0].next_level, Some(2));
        assert_eq!(cards[1].next_level, None);

        select_upgrade(&mut state, UpgradeId::Knife).expect("knife was offered");
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.offer.is_none());
        assert_eq!(state.player.abilities.len(), 1);
        assert_eq!(state.player.abilities[0].level, 2);
    }

    #[test]
    fn test_select_installs_new_ability() {
        let mut state = GameState::new(5);
        state.phase = GamePhase::LevelUp;
        state.offer = Some(vec![UpgradeId::Orb]);
        select_upgrade(&mut state, UpgradeId::Orb).expect("orb was offered");
        let orb = state.player.ability(AbilityKind::Orb).expect("orb installed");
        assert_eq!(orb.level, 1);
    }

    #[test]
    fn test_stat_mutations() {
        let mut state = GameState::new(5);
        let player = &mut state.player;
        player.health = 50.0;
        apply_stat_mutation(
            player,
            &StatMutation {
                stat: Stat::MaxHealth,
                op: StatOp::Add,
                amount: 20.0,
            },
        );
        assert_eq!(player.stats.max_health, 120.0);
        assert_eq!(player.health, 70.0);

        apply_stat_mutation(
            player,
            &StatMutation {
                stat: Stat::CooldownReduction,
                op: StatOp::Multiply,
                amount: 0.9,
            },
        );
        assert!((player.stats.cooldown_reduction - 0.9).abs() < 1e-6);

        apply_stat_mutation(
            player,
            &StatMutation {
                stat: Stat::CritChance,
                op: StatOp::Add,
                amount: 5.0,
            },
        );
        assert_eq!(player.stats.crit_chance, 1.0);
    }

    #[test]
    fn test_effect_descriptor_round_trips_through_json() {
        let effect = find_upgrade(UpgradeId::Magnet).map(|d| d.effect);
        let json = serde_json::to_string(&effect).expect("serialize");
        let back: Option<UpgradeEffect> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, effect);
    }
}
