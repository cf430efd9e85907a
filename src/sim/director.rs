//! Spawn/wave director
//!
//! Time-based generator for opponents and collectibles. Each wave carries a
//! fixed spawn budget; the interval between spawns shrinks with wave number
//! and run distance, subject to a population cap. Wave completion requires
//! the budget to be exhausted AND every spawned opponent to have reached
//! its terminal dead state - stragglers keep the wave alive.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Collectible, CollectibleKind, Opponent, OpponentAction, OpponentKind, SimState};

/// Per-wave spawn bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Director {
    /// Opponents this wave will create in total
    pub target_count: u32,
    /// Opponents created so far this wave
    pub spawned: u32,
    /// Accumulates toward the next opponent spawn
    pub spawn_timer: f32,
    /// Accumulates toward the next collectible spawn
    pub collectible_timer: f32,
}

impl Director {
    /// Reset counters for a new wave
    pub fn seed_wave(&mut self, target_count: u32) {
        self.target_count = target_count;
        self.spawned = 0;
        self.spawn_timer = 0.0;
        self.collectible_timer = 0.0;
    }

    pub fn budget_exhausted(&self) -> bool {
        self.spawned >= self.target_count
    }
}

/// Seed the director for the current wave index
pub fn seed_wave(state: &mut SimState) {
    let count = state.tuning.wave_count(state.wave_index);
    state.director.seed_wave(count);
    log::info!("Wave {} seeded: {} opponents", state.wave_index, count);
}

/// Advance spawn timers and create entities when due
pub fn run(state: &mut SimState, dt: f32) {
    state.director.spawn_timer += dt;
    state.director.collectible_timer += dt;

    let interval = state
        .tuning
        .spawn_interval(state.wave_index, state.distance);
    if state.director.spawn_timer >= interval
        && !state.director.budget_exhausted()
        && state.live_opponents() < state.tuning.max_live_opponents
    {
        state.director.spawn_timer = 0.0;
        spawn_opponent(state);
    }

    if state.director.collectible_timer >= state.tuning.collectible_interval {
        state.director.collectible_timer = 0.0;
        spawn_collectible(state);
    }
}

/// Budget exhausted and no live stragglers left
pub fn wave_complete(state: &SimState) -> bool {
    state.director.budget_exhausted() && state.live_opponents() == 0
}

/// Weighted random kind selection from the per-wave menu
fn pick_opponent_kind(state: &mut SimState) -> OpponentKind {
    let weights = state.tuning.spawn_weights(state.wave_index);
    let total: u32 = weights.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return OpponentKind::Grunt;
    }
    let mut roll = state.rng.random_range(0..total);
    for (kind, weight) in weights {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    OpponentKind::Grunt
}

fn spawn_opponent(state: &mut SimState) {
    let kind = pick_opponent_kind(state);
    let stats = *state.tuning.stats(kind);

    // Lane mode: drop into a random lane from above the arena.
    // Free mode: enter at a side edge at ground height, whichever side
    // is farther from the actor.
    let pos = if let Some(lanes) = state.arena.lanes {
        let lane = state.rng.random_range(0..lanes.count);
        Vec2::new(lanes.lane_x(lane), -stats.size.y / 2.0)
    } else {
        let from_left = state.actor.pos.x > state.arena.width / 2.0;
        let x = if from_left {
            -stats.size.x / 2.0
        } else {
            state.arena.width + stats.size.x / 2.0
        };
        Vec2::new(x, state.arena.ground_y() - stats.size.y / 2.0)
    };

    let opponent = Opponent {
        id: state.next_entity_id(),
        kind,
        pos,
        vel: Vec2::ZERO,
        size: stats.size,
        health: stats.max_health,
        max_health: stats.max_health,
        action: OpponentAction::Advancing,
        attack_cooldown: stats.attack_cooldown,
        hit_by_attack: 0,
    };
    log::debug!(
        "Spawn {:?} #{} at ({:.0},{:.0})",
        kind,
        opponent.id,
        pos.x,
        pos.y
    );
    state.opponents.push(opponent);
    state.director.spawned += 1;
}

fn spawn_collectible(state: &mut SimState) {
    let kinds = CollectibleKind::ALL;
    let kind = kinds[state.rng.random_range(0..kinds.len())];
    let x = state.rng.random_range(40.0..(state.arena.width - 40.0).max(41.0));
    let collectible = Collectible {
        id: state.next_entity_id(),
        kind,
        pos: Vec2::new(x, -12.0),
        vel: Vec2::new(0.0, 70.0),
    };
    log::debug!("Spawn collectible {:?} #{}", kind, collectible.id);
    state.collectibles.push(collectible);
}
