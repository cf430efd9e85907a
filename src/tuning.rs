//! Data-driven game balance
//!
//! Per-kind stat presets and economy numbers, loadable from JSON so the
//! embedding game can reskin the core without recompiling. A failed parse
//! falls back to defaults; balance data is never a hard error.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::state::{CollectibleKind, OpponentKind};

/// Stat preset for one opponent kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OpponentStats {
    pub max_health: f32,
    /// Approach speed, pixels/sec
    pub speed: f32,
    /// Damage dealt to the actor per landed attack
    pub damage: f32,
    /// Distance (center to center) within which it can attack
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Fixed score reward on kill
    pub score_value: u64,
    pub size: Vec2,
}

/// Complete balance table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub grunt: OpponentStats,
    pub stalker: OpponentStats,
    pub brute: OpponentStats,

    // === Collectible effects ===
    pub heal_amount: f32,
    pub refill_amount: f32,
    pub gem_score: u64,
    pub speed_boost_secs: f32,
    pub speed_boost_mult: f32,
    pub shield_secs: f32,

    // === Ability costs ===
    pub cast_cost: f32,
    pub dash_cost: f32,

    // === Critical hits ===
    /// Probability in [0, 1] that a melee hit crits
    pub crit_chance: f32,
    pub crit_multiplier: f32,

    // === Wave/spawn pacing ===
    /// Opponents in wave 0; later waves add `wave_count_growth` each
    pub base_wave_count: u32,
    pub wave_count_growth: u32,
    /// Seconds between spawns at wave 0, before difficulty shrink
    pub spawn_interval_base: f32,
    pub spawn_interval_min: f32,
    /// Population cap on live opponents
    pub max_live_opponents: usize,
    /// Seconds between collectible spawns
    pub collectible_interval: f32,
}

impl Default for OpponentStats {
    fn default() -> Self {
        Self {
            max_health: 30.0,
            speed: 110.0,
            damage: 8.0,
            attack_range: 48.0,
            attack_cooldown: 1.0,
            score_value: 10,
            size: Vec2::new(32.0, 44.0),
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grunt: OpponentStats::default(),
            stalker: OpponentStats {
                max_health: 18.0,
                speed: 190.0,
                damage: 5.0,
                attack_range: 42.0,
                attack_cooldown: 0.7,
                score_value: 15,
                size: Vec2::new(26.0, 38.0),
            },
            brute: OpponentStats {
                max_health: 80.0,
                speed: 60.0,
                damage: 18.0,
                attack_range: 56.0,
                attack_cooldown: 1.6,
                score_value: 40,
                size: Vec2::new(48.0, 56.0),
            },
            heal_amount: 25.0,
            refill_amount: 40.0,
            gem_score: 50,
            speed_boost_secs: 5.0,
            speed_boost_mult: 1.5,
            shield_secs: 4.0,
            cast_cost: 25.0,
            dash_cost: 15.0,
            crit_chance: 0.15,
            crit_multiplier: 2.0,
            base_wave_count: 5,
            wave_count_growth: 3,
            spawn_interval_base: 2.2,
            spawn_interval_min: 0.5,
            max_live_opponents: 8,
            collectible_interval: 7.0,
        }
    }
}

impl Tuning {
    /// Parse from JSON, falling back to defaults on any error
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("Invalid tuning JSON, using defaults: {err}");
                Self::default()
            }
        }
    }

    pub fn stats(&self, kind: OpponentKind) -> &OpponentStats {
        match kind {
            OpponentKind::Grunt => &self.grunt,
            OpponentKind::Stalker => &self.stalker,
            OpponentKind::Brute => &self.brute,
        }
    }

    /// Weighted spawn menu for a wave. Grunts dominate early; stalkers
    /// enter at wave 1 and brutes at wave 2, both gaining weight with
    /// the wave number.
    pub fn spawn_weights(&self, wave: u32) -> [(OpponentKind, u32); 3] {
        let stalker = if wave >= 1 { 3 + wave } else { 0 };
        let brute = if wave >= 2 { 1 + wave / 2 } else { 0 };
        [
            (OpponentKind::Grunt, 10),
            (OpponentKind::Stalker, stalker),
            (OpponentKind::Brute, brute),
        ]
    }

    /// Spawn budget for a wave
    pub fn wave_count(&self, wave: u32) -> u32 {
        self.base_wave_count + wave * self.wave_count_growth
    }

    /// Seconds between spawns, shrinking with wave number and distance
    pub fn spawn_interval(&self, wave: u32, distance: f32) -> f32 {
        let wave_shrink = 0.15 * wave as f32;
        let distance_shrink = distance / 4000.0;
        (self.spawn_interval_base - wave_shrink - distance_shrink).max(self.spawn_interval_min)
    }

    /// Score awarded for picking up a collectible (only gems score)
    pub fn collectible_score(&self, kind: CollectibleKind) -> u64 {
        match kind {
            CollectibleKind::ScoreGem => self.gem_score,
            _ => 0,
        }
    }
}
