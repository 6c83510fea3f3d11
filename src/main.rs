//! Pixel Survivors entry point
//!
//! On the web the page drives `platform::web::WebGame`. Natively this runs a
//! headless autopilot: it kites enemies, vacuums pickups and always takes the
//! first offered upgrade, then prints the run summary.
//!
//! Usage: `pixel-survivors [seed] [max_seconds]`

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::Vec2;
    use pixel_survivors::Records;
    use pixel_survivors::format_time;
    use pixel_survivors::sim::{
        GameEvent, GamePhase, GameState, RunSummary, TickInput, select_upgrade, tick,
    };

    /// Enemies closer than this are fled from
    const DANGER_RADIUS: f32 = 200.0;
    const DT: f32 = 1.0 / 60.0;

    /// Steering for one frame
    pub fn steer(state: &GameState) -> Vec2 {
        let me = state.player.pos;
        let threat: Vec2 = state
            .enemies
            .iter()
            .filter(|e| !e.is_dead())
            .map(|e| (me - e.pos, me.distance(e.pos)))
            .filter(|(_, d)| *d < DANGER_RADIUS)
            .map(|(away, d)| away.normalize_or_zero() * (1.0 - d / DANGER_RADIUS))
            .sum();
        if threat != Vec2::ZERO {
            return threat.normalize_or_zero();
        }
        state
            .pickups
            .iter()
            .min_by(|a, b| me.distance(a.pos).total_cmp(&me.distance(b.pos)))
            .map(|p| (p.pos - me).normalize_or_zero())
            .unwrap_or(Vec2::ZERO)
    }

    /// Play one run to completion or until `max_seconds` of survival time
    pub fn run(seed: u64, max_seconds: f32) -> RunSummary {
        let mut state = GameState::new(seed);
        let mut levels = 0;
        loop {
            let input = TickInput {
                move_intent: steer(&state),
                pause: false,
            };
            tick(&mut state, &input, DT);

            for event in state.drain_events() {
                match event {
                    GameEvent::UpgradeOffered { level, choices } => {
                        levels += 1;
                        if let Some(first) = choices.first() {
                            log::info!("Level {}: taking {:?}", level, first);
                            if let Err(e) = select_upgrade(&mut state, *first) {
                                log::warn!("Upgrade rejected: {}", e);
                            }
                        }
                    }
                    GameEvent::GameOver(summary) => return summary,
                    _ => {}
                }
            }

            if state.phase == GamePhase::Running && state.survival_time >= max_seconds {
                log::info!("Time limit reached after {} level-ups", levels);
                return state.summary();
            }
        }
    }

    pub fn main() {
        env_logger::init();
        let mut args = std::env::args().skip(1);
        let seed = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0x5eed_u64);
        let max_seconds = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(600.0_f32);

        log::info!("Pixel Survivors (native autopilot) seed {} for up to {}s", seed, max_seconds);
        let summary = run(seed, max_seconds);

        let mut records = Records::load();
        let rank = records.merge(&summary, 0.0);
        records.save();

        println!("Survived {}", format_time(summary.survival_time));
        println!("Kills:      {}", summary.kills);
        println!("Level:      {}", summary.level);
        println!("Gold:       {}", summary.gold);
        println!("Best combo: {}", summary.best_combo);
        for achievement in &summary.achievements {
            println!("Achievement: {}", achievement.title());
        }
        if let Some(rank) = rank {
            println!("Leaderboard rank: #{}", rank);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    autopilot::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is `WebGame`, this is just to satisfy the compiler
}
