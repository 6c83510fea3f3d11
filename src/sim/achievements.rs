//! Persistent achievements
//!
//! Conditions are checked once per frame against the live run. An achievement
//! unlocks at most once across all runs; `GameState::unlocked` is seeded from
//! the stored records by the host.

use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstBlood,
    Centurion,
    Slayer,
    Survivor,
    Veteran,
    ComboMaster,
    BossSlayer,
    Hoarder,
}

impl Achievement {
    pub const ALL: [Achievement; 8] = [
        Achievement::FirstBlood,
        Achievement::Centurion,
        Achievement::Slayer,
        Achievement::Survivor,
        Achievement::Veteran,
        Achievement::ComboMaster,
        Achievement::BossSlayer,
        Achievement::Hoarder,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstBlood => "First Blood",
            Achievement::Centurion => "Centurion",
            Achievement::Slayer => "Slayer",
            Achievement::Survivor => "Survivor",
            Achievement::Veteran => "Veteran",
            Achievement::ComboMaster => "Combo Master",
            Achievement::BossSlayer => "Boss Slayer",
            Achievement::Hoarder => "Hoarder",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstBlood => "Kill your first enemy",
            Achievement::Centurion => "Kill 100 enemies",
            Achievement::Slayer => "Kill 500 enemies",
            Achievement::Survivor => "Survive 5 minutes",
            Achievement::Veteran => "Reach level 10",
            Achievement::ComboMaster => "Get a 50 hit combo",
            Achievement::BossSlayer => "Defeat a boss",
            Achievement::Hoarder => "Collect 100 gold",
        }
    }

    /// Whether the run has met this achievement's condition
    pub fn is_met(self, state: &GameState) -> bool {
        match self {
            Achievement::FirstBlood => state.kills >= 1,
            Achievement::Centurion => state.kills >= 100,
            Achievement::Slayer => state.kills >= 500,
            Achievement::Survivor => state.survival_time >= 300.0,
            Achievement::Veteran => state.player.level >= 10,
            Achievement::ComboMaster => state.best_combo >= 50,
            Achievement::BossSlayer => state.bosses_killed >= 1,
            Achievement::Hoarder => state.gold >= 100,
        }
    }
}

/// Unlock every newly met achievement; returns how many unlocked this call
pub fn check_achievements(state: &mut GameState) -> usize {
    let view: &GameState = state;
    let fresh: Vec<Achievement> = Achievement::ALL
        .into_iter()
        .filter(|a| !view.unlocked.contains(a) && a.is_met(view))
        .collect();
    for achievement in &fresh {
        state.unlocked.insert(*achievement);
        state.run_achievements.push(*achievement);
        log::info!("Achievement unlocked: {}", achievement.title());
        state.emit(GameEvent::AchievementUnlocked(*achievement));
    }
    fresh.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocks_once() {
        let mut state = GameState::new(1);
        assert_eq!(check_achievements(&mut state), 0);
        state.kills = 1;
        assert_eq!(check_achievements(&mut state), 1);
        assert_eq!(check_achievements(&mut state), 0);
        assert_eq!(state.run_achievements, vec![Achievement::FirstBlood]);
        assert!(
            state
                .events
                .contains(&GameEvent::AchievementUnlocked(Achievement::FirstBlood))
        );
    }

    #[test]
    fn test_previously_unlocked_not_reported() {
        let mut state = GameState::new(1);
        state.unlocked.insert(Achievement::FirstBlood);
        state.kills = 120;
        check_achievements(&mut state);
        assert_eq!(state.run_achievements, vec![Achievement::Centurion]);
    }

    #[test]
    fn test_conditions() {
        let mut state = GameState::new(1);
        state.survival_time = 300.0;
        state.player.level = 10;
        state.best_combo = 50;
        state.bosses_killed = 1;
        state.gold = 100;
        let met: Vec<_> = Achievement::ALL
            .into_iter()
            .filter(|a| a.is_met(&state))
            .collect();
        assert_eq!(
            met,
            vec![
                Achievement::Survivor,
                Achievement::Veteran,
                Achievement::ComboMaster,
                Achievement::BossSlayer,
                Achievement::Hoarder,
            ]
        );
    }
}
