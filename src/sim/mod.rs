//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Clamped timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod combat;
pub mod director;
pub mod motion;
pub mod particles;
pub mod state;
pub mod tick;

pub use aabb::Aabb;
pub use director::Director;
pub use state::{
    ActionState, ActiveEffects, Actor, ArenaConfig, Collectible, CollectibleKind, Facing,
    GamePhase, LaneLayout, Opponent, OpponentAction, OpponentKind, Particle, Projectile, SimState,
};
pub use tick::{TickInput, advance_wave, restart, start, tick};
