//! Simulation tick and phase state machine
//!
//! One tick runs the subsystems in a fixed order - movement, then
//! spawn/despawn, then combat, then particles, then the terminal-condition
//! check - so combat always sees fully updated positions and an opponent
//! spawned this tick is resolved against the current actor position.
//! Terminal phases freeze everything; only the explicit lifecycle
//! operations ([`start`], [`advance_wave`], [`restart`]) leave them.

use glam::Vec2;

use super::state::{ActionState, Facing, GamePhase, OpponentAction, Projectile, SimState};
use super::{combat, director, motion, particles};
use crate::consts::*;
use crate::smoothing_weight;

/// Input for a single tick. Directional flags are level-triggered (held),
/// action and lane flags are edge-triggered (one tick per press).
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub attack: bool,
    pub jump: bool,
    pub cast: bool,
    pub dash: bool,
    pub lane_left: bool,
    pub lane_right: bool,
}

/// Advance the simulation by one clamped timestep
pub fn tick(state: &mut SimState, input: &TickInput, dt: f32) {
    // Terminal and idle phases are frozen; repeated ticks change nothing
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;
    state.distance += DISTANCE_PER_SEC * dt;

    decay_timers(state, dt);
    apply_input(state, input);

    // --- Movement ---
    move_actor(state, input, dt);
    move_opponents(state, dt);
    for c in state.collectibles.iter_mut() {
        c.pos += c.vel * dt;
    }

    // --- Spawn / despawn ---
    director::run(state, dt);
    despawn(state, dt);

    // --- Combat ---
    combat::resolve_melee(state);
    combat::resolve_projectiles(state, dt);
    combat::collect_pickups(state);
    if combat::resolve_incoming(state, dt) {
        log::info!(
            "Game over at wave {} with score {}",
            state.wave_index,
            state.score
        );
        state.phase = GamePhase::GameOver;
        state.normalize_order();
        // Terminal: skip the rest of this tick's processing
        return;
    }

    // --- Particles ---
    particles::update(&mut state.particles, dt);

    // --- Wave completion (emitted exactly once: we are still Playing) ---
    if director::wave_complete(state) {
        log::info!("Wave {} cleared, score {}", state.wave_index, state.score);
        let ticks = state.time_ticks;
        let center = state.actor.pos;
        particles::spawn_burst(&mut state.particles, ticks, center, combat::colors::KILL, 32);
        state.phase = GamePhase::WaveCleared;
    }

    state.normalize_order();
}

/// Idle -> Playing: seed the first wave
pub fn start(state: &mut SimState) {
    if state.phase != GamePhase::Idle {
        return;
    }
    director::seed_wave(state);
    state.phase = GamePhase::Playing;
    log::info!("Match started (seed {})", state.seed);
}

/// WaveCleared -> Playing: next wave, partial actor restore
pub fn advance_wave(state: &mut SimState) {
    if state.phase != GamePhase::WaveCleared {
        return;
    }
    state.wave_index += 1;
    // Clean the arena of leftovers before the next batch
    state.opponents.clear();
    state.projectiles.clear();
    director::seed_wave(state);
    // Partial restore: 30% of max health back, fury refilled
    let restore = state.actor.max_health * 0.30;
    state.actor.heal(restore);
    state.actor.fury = state.actor.max_fury;
    state.phase = GamePhase::Playing;
}

/// GameOver -> Playing: full reset of all entity stores and counters.
/// A fresh run seed is derived so replays differ; persisted best score
/// lives outside the sim and survives untouched.
pub fn restart(state: &mut SimState) {
    if state.phase != GamePhase::GameOver {
        return;
    }
    let next_seed = state.seed.wrapping_add(1);
    *state = SimState::new(next_seed, state.arena, state.tuning.clone());
    director::seed_wave(state);
    state.phase = GamePhase::Playing;
    log::info!("Restarted (seed {})", next_seed);
}

fn decay_timers(state: &mut SimState, dt: f32) {
    let actor = &mut state.actor;
    actor.invuln_secs = (actor.invuln_secs - dt).max(0.0);
    actor.effects.speed_boost_secs = (actor.effects.speed_boost_secs - dt).max(0.0);
    actor.effects.shield_secs = (actor.effects.shield_secs - dt).max(0.0);
    actor.gain_fury(FURY_REGEN_PER_SEC * dt);

    if actor.action.is_busy() {
        actor.action_timer -= dt;
        if actor.action_timer <= 0.0 {
            actor.action_timer = 0.0;
            actor.action = ActionState::Idle;
        }
    }
}

/// Action triggers: a new timer-gated action is refused while one is
/// still counting down, and abilities are refused below their fury cost
fn apply_input(state: &mut SimState, input: &TickInput) {
    if input.left && !input.right {
        state.actor.facing = Facing::Left;
    } else if input.right && !input.left {
        state.actor.facing = Facing::Right;
    }

    let busy = state.actor.action.is_busy();

    if input.attack && !busy {
        state.actor.action = ActionState::Attacking;
        state.actor.action_timer = MELEE_DURATION;
        state.actor.attack_id = state.actor.attack_id.wrapping_add(1).max(1);
    } else if input.cast && !busy {
        if state.actor.spend_fury(state.tuning.cast_cost) {
            state.actor.action = ActionState::Casting;
            state.actor.action_timer = CAST_DURATION;
            let id = state.next_entity_id();
            let dir = state.actor.facing.dir_x();
            state.projectiles.push(Projectile {
                id,
                pos: state.actor.pos + Vec2::new(dir * state.actor.size.x, 0.0),
                vel: Vec2::new(dir * PROJECTILE_SPEED, 0.0),
                damage: PROJECTILE_DAMAGE,
                ttl_secs: PROJECTILE_TTL,
            });
        }
    } else if input.dash && !busy {
        if state.actor.spend_fury(state.tuning.dash_cost) {
            state.actor.action = ActionState::Dashing;
            state.actor.action_timer = DASH_DURATION;
        }
    }

    if input.jump && !state.actor.airborne {
        state.actor.vel.y = JUMP_IMPULSE;
        state.actor.airborne = true;
    }
}

fn move_actor(state: &mut SimState, input: &TickInput, dt: f32) {
    let speed_mult = if state.actor.effects.speed_boost_secs > 0.0 {
        state.tuning.speed_boost_mult
    } else {
        1.0
    };

    if state.actor.action == ActionState::Dashing {
        state.actor.vel.x = state.actor.facing.dir_x() * DASH_SPEED;
    } else if let Some(lanes) = state.arena.lanes {
        // Lane mode: discrete lane steps, smooth x interpolation
        if input.lane_left {
            state.actor.lane = lanes.clamp_lane(state.actor.lane - 1);
        }
        if input.lane_right {
            state.actor.lane = lanes.clamp_lane(state.actor.lane + 1);
        }
        let target_x = lanes.lane_x(state.actor.lane);
        state.actor.pos.x = motion::step_lane(state.actor.pos.x, target_x, LANE_SMOOTHING, dt);
        state.actor.vel.x = 0.0;
    } else {
        // Free mode: accelerate from held directional flags
        let mut accel = Vec2::ZERO;
        if input.left {
            accel.x -= 1.0;
        }
        if input.right {
            accel.x += 1.0;
        }
        if input.up {
            accel.y -= 1.0;
        }
        if input.down {
            accel.y += 1.0;
        }
        state.actor.vel += accel * ACTOR_ACCEL * dt;
    }

    // Ballistic vertical motion while airborne
    if state.actor.airborne {
        let ground = state.arena.ground_y() - state.actor.size.y / 2.0;
        let mut y = state.actor.pos.y;
        let mut vy = state.actor.vel.y;
        if motion::integrate_ballistic(&mut y, &mut vy, GRAVITY, ground, dt) {
            state.actor.airborne = false;
        }
        state.actor.pos.y = y;
        state.actor.vel.y = vy;
        // Horizontal component still integrates freely
        let mut x_pos = Vec2::new(state.actor.pos.x, 0.0);
        let mut x_vel = Vec2::new(state.actor.vel.x, 0.0);
        motion::integrate_free(
            &mut x_pos,
            &mut x_vel,
            ACTOR_FRICTION,
            ACTOR_MAX_SPEED * speed_mult,
            dt,
        );
        state.actor.pos.x = x_pos.x;
        state.actor.vel.x = x_vel.x;
    } else if state.arena.lanes.is_none() {
        let max = if state.actor.action == ActionState::Dashing {
            DASH_SPEED
        } else {
            ACTOR_MAX_SPEED * speed_mult
        };
        let mut pos = state.actor.pos;
        let mut vel = state.actor.vel;
        motion::integrate_free(&mut pos, &mut vel, ACTOR_FRICTION, max, dt);
        state.actor.pos = pos;
        state.actor.vel = vel;
    }

    let bounds = state.arena.bounds();
    let size = state.actor.size;
    motion::clamp_to_bounds(&mut state.actor.pos, &mut state.actor.vel, size, &bounds);

    if !state.actor.action.is_busy() && state.actor.action != ActionState::Dead {
        state.actor.action = if state.actor.vel.length() > 5.0 {
            ActionState::Moving
        } else {
            ActionState::Idle
        };
    }
}

fn move_opponents(state: &mut SimState, dt: f32) {
    let actor_pos = state.actor.pos;
    let lane_mode = state.arena.lanes.is_some();

    for opp in state.opponents.iter_mut() {
        let stats = state.tuning.stats(opp.kind);
        match opp.action {
            OpponentAction::Advancing => {
                if lane_mode {
                    // Obstacles run down their lane
                    opp.vel = Vec2::new(0.0, stats.speed);
                } else {
                    // Close on the actor, settling back onto the ground
                    // line after knockback displaced it
                    let to_actor = actor_pos - opp.pos;
                    let dir_x = if to_actor.x.abs() > 1.0 {
                        to_actor.x.signum()
                    } else {
                        0.0
                    };
                    opp.vel.x = dir_x * stats.speed;
                    opp.vel.y = 0.0;
                    let ground = state.arena.ground_y() - opp.size.y / 2.0;
                    opp.pos.y = motion::step_lane(opp.pos.y, ground, 0.001, dt);
                }
                opp.pos += opp.vel * dt;
            }
            OpponentAction::HitStun { timer } => {
                // Knockback decays; no steering while stunned
                let mut pos = opp.pos;
                let mut vel = opp.vel;
                motion::integrate_free(&mut pos, &mut vel, 0.002, MELEE_KNOCKBACK, dt);
                opp.pos = pos;
                opp.vel = vel;
                let remaining = timer - dt;
                opp.action = if remaining <= 0.0 {
                    OpponentAction::Advancing
                } else {
                    OpponentAction::HitStun { timer: remaining }
                };
            }
            OpponentAction::Dying { .. } => {
                // Drift with residual knockback until removal
                opp.pos += opp.vel * dt;
                opp.vel *= 1.0 - smoothing_weight(0.01, dt);
            }
        }
    }
}

/// Remove expired dying opponents, anything far out of bounds, and
/// collectibles that left the arena
fn despawn(state: &mut SimState, dt: f32) {
    let bounds = state.arena.bounds();
    let margin = DESPAWN_MARGIN;

    for opp in state.opponents.iter_mut() {
        if let OpponentAction::Dying { timer } = &mut opp.action {
            *timer -= dt;
        }
    }
    state.opponents.retain(|opp| {
        if let OpponentAction::Dying { timer } = opp.action {
            if timer <= 0.0 {
                return false;
            }
        }
        opp.pos.x > bounds.min.x - margin
            && opp.pos.x < bounds.max.x + margin
            && opp.pos.y > bounds.min.y - margin
            && opp.pos.y < bounds.max.y + margin
    });

    state
        .collectibles
        .retain(|c| c.pos.y < bounds.max.y + 40.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{ArenaConfig, Opponent, OpponentKind};
    use crate::tuning::Tuning;

    fn started(seed: u64) -> SimState {
        let mut state = SimState::new(seed, ArenaConfig::default(), Tuning::default());
        start(&mut state);
        state
    }

    fn add_opponent(state: &mut SimState, kind: OpponentKind, pos: Vec2) {
        let stats = *state.tuning.stats(kind);
        let id = state.next_entity_id();
        state.opponents.push(Opponent {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            size: stats.size,
            health: stats.max_health,
            max_health: stats.max_health,
            action: OpponentAction::Advancing,
            attack_cooldown: stats.attack_cooldown,
            hit_by_attack: 0,
        });
    }

    #[test]
    fn test_idle_is_frozen_until_start() {
        let mut state = SimState::new(1, ArenaConfig::default(), Tuning::default());
        let input = TickInput {
            attack: true,
            right: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.actor.action, ActionState::Idle);

        start(&mut state);
        assert_eq!(state.phase, GamePhase::Playing);
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_action_refused_while_timer_running() {
        let mut state = started(1);
        let attack = TickInput {
            attack: true,
            ..Default::default()
        };
        tick(&mut state, &attack, SIM_DT);
        assert_eq!(state.actor.action, ActionState::Attacking);
        let first_id = state.actor.attack_id;

        // A second attack press while the swing runs is a no-op
        tick(&mut state, &attack, SIM_DT);
        assert_eq!(state.actor.attack_id, first_id);

        // After the swing finishes, a new one can start
        for _ in 0..((MELEE_DURATION / SIM_DT) as usize + 2) {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        tick(&mut state, &attack, SIM_DT);
        assert_eq!(state.actor.attack_id, first_id + 1);
    }

    #[test]
    fn test_cast_gated_by_fury() {
        let mut state = started(1);
        state.actor.fury = state.tuning.cast_cost - 1.0;
        let cast = TickInput {
            cast: true,
            ..Default::default()
        };
        tick(&mut state, &cast, SIM_DT);
        assert!(state.projectiles.is_empty(), "refused below cost");
        assert_eq!(state.actor.action, ActionState::Idle);

        state.actor.fury = state.tuning.cast_cost + 10.0;
        let fury_before = state.actor.fury;
        tick(&mut state, &cast, SIM_DT);
        assert_eq!(state.projectiles.len(), 1);
        // Cost deducted exactly once (regen adds a sliver back this tick)
        let expected = fury_before - state.tuning.cast_cost + FURY_REGEN_PER_SEC * SIM_DT;
        assert!((state.actor.fury - expected).abs() < 0.01);
        assert!(state.actor.fury >= 0.0);
    }

    #[test]
    fn test_wave_clears_only_when_empty() {
        let mut state = started(1);
        state.director.seed_wave(3);
        state.director.spawned = 3;
        add_opponent(&mut state, OpponentKind::Grunt, Vec2::new(700.0, 100.0));

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing, "live straggler");

        state.opponents[0].kill();
        // Let the death linger expire and the straggler despawn
        for _ in 0..((DEATH_LINGER_SECS / SIM_DT) as usize + 2) {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::WaveCleared);
    }

    #[test]
    fn test_terminal_phases_are_idempotent() {
        let mut state = started(1);
        state.director.seed_wave(0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::WaveCleared);

        let ticks = state.time_ticks;
        let score = state.score;
        let opponents = state.opponents.len();
        for _ in 0..100 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::WaveCleared);
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(state.score, score);
        assert_eq!(state.opponents.len(), opponents);
    }

    #[test]
    fn test_game_over_same_tick_and_frozen() {
        let mut state = started(1);
        state.director.seed_wave(10);
        state.actor.health = 5.0;
        state.actor.invuln_secs = 0.0;
        let pos = state.actor.pos + Vec2::new(30.0, 0.0);
        add_opponent(&mut state, OpponentKind::Brute, pos);
        state.opponents[0].attack_cooldown = 0.0;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.actor.health, 0.0, "clamped, not negative");

        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_invulnerability_window_then_normal_hit() {
        let mut state = started(1);
        state.director.seed_wave(10);
        let pos = state.actor.pos + Vec2::new(20.0, 0.0);
        add_opponent(&mut state, OpponentKind::Grunt, pos);
        state.opponents[0].attack_cooldown = 0.0;

        tick(&mut state, &TickInput::default(), SIM_DT);
        let after_first = state.actor.health;
        assert!(after_first < ACTOR_MAX_HEALTH);

        // Attacks inside the grace window are ignored
        state.opponents[0].attack_cooldown = 0.0;
        state.opponents[0].pos = state.actor.pos + Vec2::new(20.0, 0.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.actor.health, after_first);

        // Past the window a hit applies normally
        state.actor.invuln_secs = 0.0;
        state.opponents[0].attack_cooldown = 0.0;
        state.opponents[0].pos = state.actor.pos + Vec2::new(20.0, 0.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.actor.health < after_first);
    }

    #[test]
    fn test_advance_wave_partial_restore() {
        let mut state = started(1);
        state.phase = GamePhase::WaveCleared;
        state.actor.health = 40.0;
        state.actor.fury = 10.0;
        let wave = state.wave_index;

        advance_wave(&mut state);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.wave_index, wave + 1);
        assert_eq!(state.actor.health, 40.0 + state.actor.max_health * 0.30);
        assert_eq!(state.actor.fury, state.actor.max_fury);
        assert!(state.opponents.is_empty());
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut state = started(1);
        state.score = 500;
        state.wave_index = 3;
        state.actor.health = 1.0;
        state.phase = GamePhase::GameOver;

        restart(&mut state);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.wave_index, 0);
        assert_eq!(state.actor.health, state.actor.max_health);
        assert!(state.opponents.is_empty());
    }

    #[test]
    fn test_lifecycle_ops_noop_in_wrong_phase() {
        let mut state = started(1);
        advance_wave(&mut state);
        restart(&mut state);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.wave_index, 0);
    }

    #[test]
    fn test_determinism() {
        let mut a = started(99999);
        let mut b = started(99999);
        let inputs = [
            TickInput { right: true, ..Default::default() },
            TickInput { right: true, attack: true, ..Default::default() },
            TickInput { jump: true, ..Default::default() },
            TickInput::default(),
        ];
        for step in 0..(20 * 120) {
            let input = &inputs[step % inputs.len()];
            tick(&mut a, input, SIM_DT);
            tick(&mut b, input, SIM_DT);
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.score, b.score);
        assert_eq!(a.opponents.len(), b.opponents.len());
        assert_eq!(a.actor.pos, b.actor.pos);
    }

    #[test]
    fn test_health_and_fury_bounds_hold_over_a_run() {
        let mut state = started(7);
        let inputs = [
            TickInput { right: true, attack: true, ..Default::default() },
            TickInput { left: true, cast: true, ..Default::default() },
            TickInput { dash: true, ..Default::default() },
        ];
        for step in 0..(60 * 120) {
            if state.phase == GamePhase::WaveCleared {
                advance_wave(&mut state);
            }
            if state.phase == GamePhase::GameOver {
                break;
            }
            tick(&mut state, &inputs[step % inputs.len()], SIM_DT);

            let a = &state.actor;
            assert!((0.0..=a.max_health).contains(&a.health));
            assert!((0.0..=a.max_fury).contains(&a.fury));
            for opp in &state.opponents {
                assert!((0.0..=opp.max_health).contains(&opp.health));
            }
        }
    }

    #[test]
    fn test_jump_is_ballistic_and_lands() {
        let mut state = started(1);
        let ground_y = state.actor.pos.y;
        tick(&mut state, &TickInput { jump: true, ..Default::default() }, SIM_DT);
        assert!(state.actor.airborne);
        assert!(state.actor.pos.y < ground_y);

        for _ in 0..(3 * 120) {
            tick(&mut state, &TickInput::default(), SIM_DT);
            if !state.actor.airborne {
                break;
            }
        }
        assert!(!state.actor.airborne);
        assert!((state.actor.pos.y - ground_y).abs() < 0.5);
    }
}
