//! Engine: the core's boundary with its collaborators
//!
//! Owns the simulation state, converts wall-clock frames into clamped
//! fixed timesteps, validates external input against the current phase,
//! and hands every frame's result to snapshot listeners. Rendering and UI
//! never touch [`SimState`] directly; the [`Snapshot`] is their only view.
//!
//! Scheduling is cooperative and single-threaded: the embedding page calls
//! [`Engine::frame`] once per display frame, and [`Engine::destroy`]
//! idempotently stops all further processing.

use std::cell::Cell;
use std::rc::Rc;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::highscores::{HighScores, ScoreStore};
use crate::sim::state::{
    Actor, ArenaConfig, Collectible, GamePhase, Opponent, Particle, Projectile, SimState,
};
use crate::sim::tick::TickInput;
use crate::sim::{self, tick};
use crate::tuning::Tuning;
use crate::clamp_delta;

/// Monotonic time source for frame deltas
pub trait Clock {
    fn now_secs(&self) -> f64;
}

/// Hand-driven clock for tests and headless harnesses
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `secs`
    pub fn advance(&self, secs: f64) {
        self.time.set(self.time.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        self.time.get()
    }
}

/// Held directional input flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// One-shot action requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Attack,
    Jump,
    Cast,
    Dash,
}

/// Immutable per-frame view of the simulation for rendering/UI
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub best_score: u64,
    pub wave: u32,
    pub distance: f32,
    pub actor: Actor,
    pub opponents: Vec<Opponent>,
    pub collectibles: Vec<Collectible>,
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
}

impl Snapshot {
    fn capture(state: &SimState, best_score: u64) -> Self {
        Self {
            phase: state.phase,
            score: state.score,
            best_score,
            wave: state.wave_index,
            distance: state.distance,
            actor: state.actor.clone(),
            opponents: state.opponents.clone(),
            collectibles: state.collectibles.clone(),
            projectiles: state.projectiles.clone(),
            particles: state.particles.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PendingActions {
    attack: bool,
    jump: bool,
    cast: bool,
    dash: bool,
    lane_left: bool,
    lane_right: bool,
}

/// The simulation core behind a callback-based boundary
pub struct Engine {
    state: SimState,
    clock: Box<dyn Clock>,
    store: Box<dyn ScoreStore>,
    scores: HighScores,
    listeners: Vec<Box<dyn FnMut(&Snapshot)>>,
    dir: DirInput,
    pending: PendingActions,
    accumulator: f32,
    last_time: Option<f64>,
    running: bool,
    game_over_recorded: bool,
}

impl Engine {
    pub fn new(
        seed: u64,
        arena: ArenaConfig,
        tuning: Tuning,
        clock: Box<dyn Clock>,
        store: Box<dyn ScoreStore>,
    ) -> Self {
        let scores = HighScores::load(store.as_ref());
        Self {
            state: SimState::new(seed, arena, tuning),
            clock,
            store,
            scores,
            listeners: Vec::new(),
            dir: DirInput::default(),
            pending: PendingActions::default(),
            accumulator: 0.0,
            last_time: None,
            running: true,
            game_over_recorded: false,
        }
    }

    /// Register a per-frame snapshot listener. This is the sole channel
    /// to rendering and UI.
    pub fn on_snapshot(&mut self, callback: impl FnMut(&Snapshot) + 'static) {
        self.listeners.push(Box::new(callback));
    }

    /// Reset all entity stores and counters, seed the first wave, and
    /// transition Idle -> Playing
    pub fn start(&mut self) {
        if !self.running {
            return;
        }
        if self.state.phase != GamePhase::Idle {
            let seed = self.state.seed;
            self.state = SimState::new(seed, self.state.arena, self.state.tuning.clone());
        }
        tick::start(&mut self.state);
        self.game_over_recorded = false;
        self.clear_input();
        // Reset frame timing so the pre-match idle time is not simulated
        self.last_time = Some(self.clock.now_secs());
        self.accumulator = 0.0;
    }

    /// WaveCleared -> Playing (no-op in any other phase)
    pub fn advance_wave(&mut self) {
        if self.running {
            sim::advance_wave(&mut self.state);
            self.clear_input();
        }
    }

    /// GameOver -> Playing, preserving only the persisted best score
    pub fn restart(&mut self) {
        if self.running {
            sim::restart(&mut self.state);
            self.game_over_recorded = false;
            self.clear_input();
        }
    }

    /// Directional updates are dropped while not playing, so a key
    /// released during a frozen phase would otherwise stay latched
    fn clear_input(&mut self) {
        self.dir = DirInput::default();
        self.pending = PendingActions::default();
    }

    /// Update held directional flags; ignored while not playing.
    /// Press edges are latched here so a lane step is never lost to a
    /// frame that runs zero substeps.
    pub fn set_directional_input(&mut self, dir: DirInput) {
        if self.running && self.state.phase == GamePhase::Playing {
            self.pending.lane_left |= dir.left && !self.dir.left;
            self.pending.lane_right |= dir.right && !self.dir.right;
            self.dir = dir;
        }
    }

    /// Request a one-shot action for the next tick; ignored while not
    /// playing (routine user behavior, not a fault)
    pub fn trigger_action(&mut self, kind: ActionKind) {
        if !self.running || self.state.phase != GamePhase::Playing {
            return;
        }
        match kind {
            ActionKind::Attack => self.pending.attack = true,
            ActionKind::Jump => self.pending.jump = true,
            ActionKind::Cast => self.pending.cast = true,
            ActionKind::Dash => self.pending.dash = true,
        }
    }

    /// New arena dimensions (page resize)
    pub fn set_arena(&mut self, arena: ArenaConfig) {
        self.state.arena = arena;
    }

    /// Advance the simulation to the clock's current time and broadcast
    /// a snapshot. Call once per display frame; never re-entrant.
    pub fn frame(&mut self) {
        if !self.running {
            return;
        }
        let now = self.clock.now_secs();
        let raw = match self.last_time {
            Some(last) => (now - last) as f32,
            None => 0.0,
        };
        self.last_time = Some(now);
        self.accumulator += clamp_delta(raw);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.build_input(substeps == 0);
            tick::tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Spiral-of-death guard: drop time we could not simulate
        if self.accumulator >= SIM_DT {
            self.accumulator = 0.0;
        }

        if self.state.phase == GamePhase::GameOver && !self.game_over_recorded {
            self.game_over_recorded = true;
            self.record_score();
        }

        let snapshot = Snapshot::capture(&self.state, self.scores.best());
        for listener in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }

    /// Stop all further frame processing. Idempotent; safe to call from
    /// teardown paths that may run more than once.
    pub fn destroy(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.listeners.clear();
        log::info!("Engine destroyed");
    }

    pub fn best_score(&self) -> u64 {
        self.scores.best()
    }

    /// Current state view without advancing the simulation
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, self.scores.best())
    }

    /// One-shot actions and lane edges fire on the first substep only
    fn build_input(&mut self, first_substep: bool) -> TickInput {
        let mut input = TickInput {
            left: self.dir.left,
            right: self.dir.right,
            up: self.dir.up,
            down: self.dir.down,
            ..Default::default()
        };
        if first_substep {
            input.attack = self.pending.attack;
            input.jump = self.pending.jump;
            input.cast = self.pending.cast;
            input.dash = self.pending.dash;
            input.lane_left = self.pending.lane_left;
            input.lane_right = self.pending.lane_right;
            self.pending = PendingActions::default();
        }
        input
    }

    fn record_score(&mut self) {
        if let Some(rank) = self
            .scores
            .add_score(self.state.score, self.state.wave_index)
        {
            log::info!("New high score rank {rank}: {}", self.state.score);
            self.scores.save(self.store.as_mut());
        }
    }
}
