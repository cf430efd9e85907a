//! Arena Rush - a generic real-time combat/runner simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, spawning, combat, game state)
//! - `engine`: Frame driver, external interface, snapshot broadcast
//! - `highscores`: Best-score persistence behind a storage trait
//! - `tuning`: Data-driven game balance
//!
//! Rendering, input device binding, and page wiring are external
//! collaborators; they talk to the core only through [`engine::Engine`]
//! and the per-tick [`engine::Snapshot`].

pub mod engine;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use engine::{ActionKind, Clock, DirInput, Engine, ManualClock, Snapshot};
pub use highscores::{HighScores, MemoryStore, ScoreStore};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Maximum raw frame delta fed into the accumulator (backgrounded tabs
    /// can report multi-second deltas; anything above this is clamped)
    pub const DELTA_MAX: f32 = 0.25;

    /// Arena defaults (pixels, origin top-left, y grows downward)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 450.0;

    /// Actor defaults
    pub const ACTOR_MAX_HEALTH: f32 = 100.0;
    pub const ACTOR_MAX_FURY: f32 = 100.0;
    /// Fury regained per second just by staying alive
    pub const FURY_REGEN_PER_SEC: f32 = 4.0;
    /// Fury gained per landed melee hit
    pub const FURY_PER_HIT: f32 = 8.0;
    pub const ACTOR_ACCEL: f32 = 1800.0;
    pub const ACTOR_MAX_SPEED: f32 = 320.0;
    /// Per-second residual for free-motion friction (see `smoothing_weight`)
    pub const ACTOR_FRICTION: f32 = 0.0008;
    /// Upward jump impulse (negative y is up)
    pub const JUMP_IMPULSE: f32 = -620.0;
    pub const GRAVITY: f32 = 1500.0;
    /// Lane interpolation residual per second
    pub const LANE_SMOOTHING: f32 = 0.0001;

    /// Melee swing timing
    pub const MELEE_DURATION: f32 = 0.30;
    /// Lethal portion of the swing: only the first fraction can deal damage
    pub const MELEE_ACTIVE_FRACTION: f32 = 0.40;
    pub const MELEE_RANGE: f32 = 70.0;
    pub const MELEE_HEIGHT: f32 = 60.0;
    pub const MELEE_BASE_DAMAGE: f32 = 12.0;
    /// Extra damage per point of combo streak
    pub const MELEE_COMBO_SCALING: f32 = 0.6;
    pub const MELEE_KNOCKBACK: f32 = 420.0;

    /// Cast (projectile) timing
    pub const CAST_DURATION: f32 = 0.35;
    pub const PROJECTILE_SPEED: f32 = 640.0;
    pub const PROJECTILE_TTL: f32 = 1.2;
    pub const PROJECTILE_DAMAGE: f32 = 18.0;

    /// Dash
    pub const DASH_DURATION: f32 = 0.18;
    pub const DASH_SPEED: f32 = 900.0;

    /// Stun applied to an opponent that just took a melee hit
    pub const HIT_STUN_SECS: f32 = 0.25;
    /// Post-hit invulnerability granted to the actor
    pub const HIT_GRACE_SECS: f32 = 0.8;
    /// How long a dead opponent lingers for its death visual
    pub const DEATH_LINGER_SECS: f32 = 0.4;

    /// Particle cap (oldest evicted first)
    pub const MAX_PARTICLES: usize = 256;

    /// Run progress accumulated per second while playing; feeds the
    /// director's spawn-interval shrink
    pub const DISTANCE_PER_SEC: f32 = 60.0;
    /// Opponents this far outside the arena are despawned
    pub const DESPAWN_MARGIN: f32 = 120.0;
}

/// Clamp a raw frame delta to `[0, DELTA_MAX]`
#[inline]
pub fn clamp_delta(raw: f32) -> f32 {
    if !raw.is_finite() {
        return 0.0;
    }
    raw.clamp(0.0, consts::DELTA_MAX)
}

/// Frame-rate independent exponential smoothing factor.
///
/// `base` is the per-second residual (e.g. 0.001 keeps 0.1% of the gap
/// after one second); returns the blend weight for a step of `dt`.
#[inline]
pub fn smoothing_weight(base: f32, dt: f32) -> f32 {
    1.0 - base.powf(dt)
}

/// Clamp a vector's magnitude to `max_len`
#[inline]
pub fn clamp_length(v: Vec2, max_len: f32) -> Vec2 {
    let len = v.length();
    if len > max_len && len > 0.0 {
        v * (max_len / len)
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_delta_bounds() {
        assert_eq!(clamp_delta(-1.0), 0.0);
        assert_eq!(clamp_delta(0.016), 0.016);
        assert_eq!(clamp_delta(5.0), consts::DELTA_MAX);
        assert_eq!(clamp_delta(f32::NAN), 0.0);
        assert_eq!(clamp_delta(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_clamp_length() {
        let v = clamp_length(Vec2::new(300.0, 400.0), 100.0);
        assert!((v.length() - 100.0).abs() < 0.001);
        let v = clamp_length(Vec2::new(3.0, 4.0), 100.0);
        assert!((v.length() - 5.0).abs() < 0.001);
    }

    proptest::proptest! {
        #[test]
        fn prop_clamp_delta_in_range(raw in proptest::num::f32::ANY) {
            let d = clamp_delta(raw);
            proptest::prop_assert!((0.0..=consts::DELTA_MAX).contains(&d));
        }
    }
}
