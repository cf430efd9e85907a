//! Combat resolution
//!
//! Melee swings, projectile flight, incoming opponent attacks, and the
//! combo/fury economy. Runs after movement so every hit test sees fully
//! updated positions. A single swing damages each opponent at most once:
//! every swing gets a fresh `attack_id` and opponents record the last id
//! that struck them.

use glam::Vec2;
use rand::Rng;

use super::particles;
use super::state::{ActionState, Actor, CollectibleKind, OpponentAction, SimState};
use crate::consts::*;

/// Particle palette indices used by combat effects
pub mod colors {
    pub const MELEE_HIT: u32 = 1;
    pub const KILL: u32 = 2;
    pub const PROJECTILE_HIT: u32 = 3;
    pub const ACTOR_HURT: u32 = 4;
    pub const PICKUP: u32 = 5;
}

/// True while the swing is inside its lethal sub-window (the first
/// `MELEE_ACTIVE_FRACTION` of the animation)
pub fn melee_active(actor: &Actor) -> bool {
    actor.action == ActionState::Attacking
        && actor.action_timer >= MELEE_DURATION * (1.0 - MELEE_ACTIVE_FRACTION)
}

/// Resolve the actor's melee swing against all overlapping opponents
pub fn resolve_melee(state: &mut SimState) {
    if !melee_active(&state.actor) {
        return;
    }

    let zone = state.actor.melee_zone();
    let attack_id = state.actor.attack_id;
    let actor_x = state.actor.pos.x;
    let combo = state.actor.combo;

    let mut hits = 0u32;
    let mut fury_gain = 0.0;
    let mut score_gain = 0u64;
    let mut bursts: Vec<(Vec2, u32, usize)> = Vec::new();

    for opp in state.opponents.iter_mut() {
        if !opp.is_live() || opp.hit_by_attack == attack_id {
            continue;
        }
        if !zone.overlaps(&opp.hitbox()) {
            continue;
        }
        opp.hit_by_attack = attack_id;

        let crit = state.rng.random::<f32>() < state.tuning.crit_chance;
        let mut damage = MELEE_BASE_DAMAGE + combo as f32 * MELEE_COMBO_SCALING;
        if crit {
            damage *= state.tuning.crit_multiplier;
        }

        // Knockback away from the actor, with a slight pop upward
        let push_x = if opp.pos.x >= actor_x { 1.0 } else { -1.0 };
        opp.vel = Vec2::new(push_x * MELEE_KNOCKBACK, -120.0);

        let died = opp.apply_damage(damage);
        if died {
            score_gain += state.tuning.stats(opp.kind).score_value;
            bursts.push((opp.pos, colors::KILL, 18));
        } else {
            opp.action = OpponentAction::HitStun { timer: HIT_STUN_SECS };
            bursts.push((opp.pos, colors::MELEE_HIT, if crit { 12 } else { 6 }));
        }

        hits += 1;
        fury_gain += FURY_PER_HIT;
    }

    if hits > 0 {
        state.actor.combo += hits;
        state.actor.gain_fury(fury_gain);
        state.score += score_gain;
    }
    let ticks = state.time_ticks;
    for (pos, color, count) in bursts {
        particles::spawn_burst(&mut state.particles, ticks, pos, color, count);
    }
}

/// Advance projectiles and apply their damage on first overlap
pub fn resolve_projectiles(state: &mut SimState, dt: f32) {
    let bounds = state.arena.bounds();
    let ticks = state.time_ticks;
    let mut score_gain = 0u64;
    let mut bursts: Vec<(Vec2, u32, usize)> = Vec::new();

    let tuning = state.tuning.clone();
    let opponents = &mut state.opponents;
    state.projectiles.retain_mut(|proj| {
        proj.pos += proj.vel * dt;
        proj.ttl_secs -= dt;

        if proj.ttl_secs <= 0.0 || !bounds.overlaps(&proj.hitbox()) {
            return false;
        }

        // First live opponent in list order takes the damage
        for opp in opponents.iter_mut() {
            if !opp.is_live() {
                continue;
            }
            if proj.hitbox().overlaps(&opp.hitbox()) {
                let died = opp.apply_damage(proj.damage);
                if died {
                    score_gain += tuning.stats(opp.kind).score_value;
                    bursts.push((opp.pos, colors::KILL, 18));
                } else {
                    opp.action = OpponentAction::HitStun { timer: HIT_STUN_SECS };
                    bursts.push((opp.pos, colors::PROJECTILE_HIT, 8));
                }
                return false;
            }
        }
        true
    });

    state.score += score_gain;
    for (pos, color, count) in bursts {
        particles::spawn_burst(&mut state.particles, ticks, pos, color, count);
    }
}

/// Opponent attacks against the actor.
///
/// Returns true when the actor's health reaches 0 this tick; the caller
/// short-circuits the rest of the update into GameOver.
pub fn resolve_incoming(state: &mut SimState, dt: f32) -> bool {
    let actor_pos = state.actor.pos;
    let invulnerable = state.actor.is_invulnerable();

    let mut damage_taken = 0.0;
    let mut hit_positions: Vec<Vec2> = Vec::new();

    for opp in state.opponents.iter_mut() {
        if !opp.is_live() {
            continue;
        }
        opp.attack_cooldown = (opp.attack_cooldown - dt).max(0.0);
        if opp.attack_cooldown > 0.0 {
            continue;
        }
        let stats = state.tuning.stats(opp.kind);
        if opp.pos.distance(actor_pos) > stats.attack_range {
            continue;
        }
        // The swing happens either way; the cooldown restarts even when
        // the actor is invulnerable
        opp.attack_cooldown = stats.attack_cooldown;
        if invulnerable {
            continue;
        }
        damage_taken += stats.damage;
        hit_positions.push(opp.pos);
    }

    if damage_taken > 0.0 {
        state.actor.health = (state.actor.health - damage_taken).max(0.0);
        // Any damage taken breaks the combo streak
        state.actor.combo = 0;
        state.actor.invuln_secs = HIT_GRACE_SECS;
        let ticks = state.time_ticks;
        for pos in hit_positions {
            particles::spawn_burst(&mut state.particles, ticks, pos, colors::ACTOR_HURT, 10);
        }
        if state.actor.health <= 0.0 {
            state.actor.action = ActionState::Dead;
            return true;
        }
    }
    false
}

/// Collect pickups overlapping the actor and apply their effects
pub fn collect_pickups(state: &mut SimState) {
    let actor_box = state.actor.hitbox();
    let ticks = state.time_ticks;
    let mut collected: Vec<(CollectibleKind, Vec2)> = Vec::new();

    state.collectibles.retain(|c| {
        if actor_box.overlaps(&c.hitbox()) {
            collected.push((c.kind, c.pos));
            false
        } else {
            true
        }
    });

    for (kind, pos) in collected {
        match kind {
            CollectibleKind::Heal => state.actor.heal(state.tuning.heal_amount),
            CollectibleKind::Refill => state.actor.gain_fury(state.tuning.refill_amount),
            CollectibleKind::ScoreGem => {}
            CollectibleKind::SpeedBoost => {
                state.actor.effects.speed_boost_secs = state.tuning.speed_boost_secs;
            }
            CollectibleKind::Shield => {
                state.actor.effects.shield_secs = state.tuning.shield_secs;
            }
        }
        state.score += state.tuning.collectible_score(kind);
        log::debug!("Collected {:?}", kind);
        particles::spawn_burst(&mut state.particles, ticks, pos, colors::PICKUP, 8);
    }
}
