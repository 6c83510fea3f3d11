//! Simulation module
//!
//! All gameplay logic lives here. The simulation is driven by the host's
//! variable frame delta but is otherwise deterministic:
//! - Seeded RNG only (one `Pcg32` per run)
//! - Stable iteration order (collections keep insertion order)
//! - Removals deferred to the end of the frame
//! - No rendering, audio or platform dependencies

pub mod abilities;
pub mod achievements;
pub mod combat;
pub mod progression;
pub mod snapshot;
pub mod spawner;
pub mod state;
pub mod tick;

pub use abilities::{Ability, AbilityKind, Behavior};
pub use achievements::Achievement;
pub use progression::{OfferCard, Rarity, UpgradeError, UpgradeId, select_upgrade};
pub use snapshot::{FrameSnapshot, HudSnapshot};
pub use state::{
    Enemy, GameEvent, GamePhase, GameState, Pickup, PickupKind, Player, Projectile, RunSummary,
    SoundCue,
};
pub use tick::{TickInput, tick};
