//! Game state and core simulation types
//!
//! Everything the simulation mutates lives here as plain records with
//! `kind` tags selecting stat presets; there is no entity hierarchy.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::director::Director;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Pre-match, simulation frozen
    Idle,
    /// Active gameplay
    Playing,
    /// Wave cleared, frozen until an advance input arrives
    WaveCleared,
    /// Run ended, frozen until restart
    GameOver,
}

/// Horizontal facing for the actor and its melee zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn dir_x(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Actor action state. At most one timer-gated action (attack/cast/dash)
/// is active at a time; `action_timer` on [`Actor`] counts it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    Idle,
    Moving,
    Attacking,
    Casting,
    Dashing,
    Dead,
}

impl ActionState {
    /// States that block starting a new timer-gated action
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            ActionState::Attacking | ActionState::Casting | ActionState::Dashing
        )
    }
}

/// Timed status effects granted by collectibles
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    /// Seconds of movement speed boost remaining
    pub speed_boost_secs: f32,
    /// Seconds of shield (full invulnerability) remaining
    pub shield_secs: f32,
}

/// The player-controlled entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: Facing,
    /// Full hitbox size
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
    /// Bounded resource gauge spent on cast/dash
    pub fury: f32,
    pub max_fury: f32,
    pub action: ActionState,
    /// Remaining duration of the current timer-gated action
    pub action_timer: f32,
    /// Post-hit grace window remaining
    pub invuln_secs: f32,
    /// Consecutive hits landed without taking damage
    pub combo: u32,
    /// Monotonic id of the current swing, for one-hit-per-window dedup
    pub attack_id: u32,
    /// Lane index when the arena runs in lane mode
    pub lane: i32,
    pub effects: ActiveEffects,
    /// True while airborne (ballistic vertical motion active)
    pub airborne: bool,
}

impl Actor {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            pos: spawn,
            vel: Vec2::ZERO,
            facing: Facing::Right,
            size: Vec2::new(36.0, 48.0),
            health: ACTOR_MAX_HEALTH,
            max_health: ACTOR_MAX_HEALTH,
            fury: 0.0,
            max_fury: ACTOR_MAX_FURY,
            action: ActionState::Idle,
            action_timer: 0.0,
            invuln_secs: 0.0,
            combo: 0,
            attack_id: 0,
            lane: 0,
            effects: ActiveEffects::default(),
            airborne: false,
        }
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }

    /// Rectangular melee zone anchored ahead of the facing direction
    pub fn melee_zone(&self) -> Aabb {
        let center = self.pos
            + Vec2::new(
                self.facing.dir_x() * (self.size.x / 2.0 + MELEE_RANGE / 2.0),
                0.0,
            );
        Aabb::from_center(center, Vec2::new(MELEE_RANGE, MELEE_HEIGHT))
    }

    /// Invulnerable via post-hit grace, shield pickup, or an active dash
    pub fn is_invulnerable(&self) -> bool {
        self.invuln_secs > 0.0
            || self.effects.shield_secs > 0.0
            || self.action == ActionState::Dashing
    }

    /// Spend `cost` fury; refused (false) when the gauge is short
    pub fn spend_fury(&mut self, cost: f32) -> bool {
        if self.fury < cost {
            return false;
        }
        self.fury = (self.fury - cost).max(0.0);
        true
    }

    pub fn gain_fury(&mut self, amount: f32) {
        self.fury = (self.fury + amount).clamp(0.0, self.max_fury);
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, self.max_health);
    }
}

/// Opponent stat-preset tag. Stats live in [`Tuning::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpponentKind {
    /// Rank-and-file chaser
    Grunt,
    /// Fast, fragile flanker
    Stalker,
    /// Slow, heavy hitter
    Brute,
}

/// Opponent action state, mirroring the actor's but simpler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OpponentAction {
    /// Closing on the actor
    Advancing,
    /// Briefly stunned after taking a melee hit
    HitStun { timer: f32 },
    /// Terminal: health reached 0, lingering for the death visual
    Dying { timer: f32 },
}

/// An enemy/obstacle created by the spawn director
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opponent {
    pub id: u32,
    pub kind: OpponentKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub action: OpponentAction,
    /// Seconds until this opponent may attack again
    pub attack_cooldown: f32,
    /// Id of the actor swing that last struck this opponent (0 = none)
    pub hit_by_attack: u32,
}

impl Opponent {
    /// Live opponents participate in collision and block wave completion
    pub fn is_live(&self) -> bool {
        !matches!(self.action, OpponentAction::Dying { .. })
    }

    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }

    /// Transition to the terminal dying state. Idempotent: an opponent
    /// already dying keeps its original timer.
    pub fn kill(&mut self) {
        if self.is_live() {
            self.health = 0.0;
            self.action = OpponentAction::Dying { timer: DEATH_LINGER_SECS };
        }
    }

    /// Apply damage, clamping health at 0. Returns true on the tick the
    /// opponent dies (exactly once).
    pub fn apply_damage(&mut self, damage: f32) -> bool {
        if !self.is_live() {
            return false;
        }
        self.health = (self.health - damage).max(0.0);
        if self.health <= 0.0 {
            self.kill();
            return true;
        }
        false
    }
}

/// Collectible effect tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    Heal,
    Refill,
    ScoreGem,
    SpeedBoost,
    Shield,
}

impl CollectibleKind {
    pub const ALL: [CollectibleKind; 5] = [
        CollectibleKind::Heal,
        CollectibleKind::Refill,
        CollectibleKind::ScoreGem,
        CollectibleKind::SpeedBoost,
        CollectibleKind::Shield,
    ];
}

/// A pickup drifting through the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u32,
    pub kind: CollectibleKind,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Collectible {
    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(24.0))
    }
}

/// A spell projectile fired by the actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    /// Remaining lifetime in seconds
    pub ttl_secs: f32,
}

impl Projectile {
    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(12.0))
    }
}

/// A particle for visual effects (no gameplay interaction)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life in seconds
    pub life: f32,
    /// Initial life, kept for alpha fade on the render side
    pub max_life: f32,
    /// Palette index for the renderer
    pub color: u32,
    pub size: f32,
}

/// Lane geometry for lane-based games (endless runners)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneLayout {
    pub count: i32,
    /// X of lane 0's center
    pub origin_x: f32,
    pub spacing: f32,
}

impl LaneLayout {
    pub fn lane_x(&self, lane: i32) -> f32 {
        self.origin_x + lane as f32 * self.spacing
    }

    pub fn clamp_lane(&self, lane: i32) -> i32 {
        lane.clamp(0, self.count - 1)
    }
}

/// Arena dimensions, supplied by the embedding page at start and on resize
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    /// Lane geometry, when the game runs in lane mode
    pub lanes: Option<LaneLayout>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            lanes: None,
        }
    }
}

impl ArenaConfig {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    /// Y coordinate of the ground line the ballistic integrator clamps to
    pub fn ground_y(&self) -> f32 {
        self.height - 40.0
    }

    /// Actor spawn point for a fresh match
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.width * 0.25, self.ground_y() - 24.0)
    }
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Single randomness source for spawns and crit rolls
    pub rng: Pcg32,
    /// Current wave index (0-based)
    pub wave_index: u32,
    pub score: u64,
    /// Distance progressed this run (drives spawn interval shrink)
    pub distance: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub arena: ArenaConfig,
    pub tuning: Tuning,
    pub actor: Actor,
    /// Live and dying opponents (sorted by id for determinism)
    pub opponents: Vec<Opponent>,
    pub collectibles: Vec<Collectible>,
    pub projectiles: Vec<Projectile>,
    /// Visual particles (not gameplay-affecting, not persisted)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    pub director: Director,
    next_id: u32,
}

impl SimState {
    /// Create a fresh state in the Idle phase
    pub fn new(seed: u64, arena: ArenaConfig, tuning: Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            wave_index: 0,
            score: 0,
            distance: 0.0,
            time_ticks: 0,
            phase: GamePhase::Idle,
            actor: Actor::new(arena.spawn_point()),
            arena,
            tuning,
            opponents: Vec::new(),
            collectibles: Vec::new(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            director: Director::default(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Ensure entity lists are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.opponents.sort_by_key(|o| o.id);
        self.collectibles.sort_by_key(|c| c.id);
        self.projectiles.sort_by_key(|p| p.id);
    }

    /// Opponents still blocking wave completion
    pub fn live_opponents(&self) -> usize {
        self.opponents.iter().filter(|o| o.is_live()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_fury_gating() {
        let mut actor = Actor::new(Vec2::new(100.0, 100.0));
        actor.fury = 10.0;
        assert!(!actor.spend_fury(25.0));
        assert_eq!(actor.fury, 10.0);
        assert!(actor.spend_fury(10.0));
        assert_eq!(actor.fury, 0.0);
    }

    #[test]
    fn test_fury_clamped_to_max() {
        let mut actor = Actor::new(Vec2::ZERO);
        actor.gain_fury(1e6);
        assert_eq!(actor.fury, actor.max_fury);
    }

    #[test]
    fn test_opponent_dies_exactly_once() {
        let mut opp = Opponent {
            id: 1,
            kind: OpponentKind::Grunt,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            size: Vec2::splat(32.0),
            health: 10.0,
            max_health: 10.0,
            action: OpponentAction::Advancing,
            attack_cooldown: 0.0,
            hit_by_attack: 0,
        };
        assert!(opp.apply_damage(15.0));
        assert_eq!(opp.health, 0.0);
        assert!(!opp.is_live());
        // Further damage is ignored and does not re-trigger the death
        assert!(!opp.apply_damage(15.0));
    }

    #[test]
    fn test_melee_zone_faces_forward() {
        let mut actor = Actor::new(Vec2::new(100.0, 100.0));
        actor.facing = Facing::Right;
        assert!(actor.melee_zone().center().x > actor.pos.x);
        actor.facing = Facing::Left;
        assert!(actor.melee_zone().center().x < actor.pos.x);
    }

    #[test]
    fn test_lane_layout() {
        let lanes = LaneLayout {
            count: 3,
            origin_x: 100.0,
            spacing: 80.0,
        };
        assert_eq!(lanes.lane_x(0), 100.0);
        assert_eq!(lanes.lane_x(2), 260.0);
        assert_eq!(lanes.clamp_lane(-1), 0);
        assert_eq!(lanes.clamp_lane(5), 2);
    }
}
