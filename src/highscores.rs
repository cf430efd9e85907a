//! High score leaderboard
//!
//! Persisted as JSON through a [`ScoreStore`] the embedding page supplies
//! (LocalStorage, a file, a test buffer). Storage failures are swallowed:
//! a missing or corrupt record falls back to an empty board, never an
//! error - score persistence is a non-essential enhancement.

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Backing storage for the serialized leaderboard.
///
/// Implementations may fail internally (quota, I/O); they signal that by
/// returning `None` from `read` and silently dropping `write`.
pub trait ScoreStore {
    fn read(&self) -> Option<String>;
    fn write(&mut self, json: &str);
}

/// In-memory store, the default for tests and headless use
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Option<String>,
}

impl ScoreStore for MemoryStore {
    fn read(&self) -> Option<String> {
        self.slot.clone()
    }

    fn write(&mut self, json: &str) {
        self.slot = Some(json.to_string());
    }
}

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Wave reached
    pub wave: u32,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a new score (if it qualifies).
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn add_score(&mut self, score: u64, wave: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry { score, wave };
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best score so far, 0 when the board is empty or absent
    pub fn best(&self) -> u64 {
        self.entries.first().map(|e| e.score).unwrap_or(0)
    }

    /// Load from a store; absence or corruption yields a fresh board
    pub fn load(store: &dyn ScoreStore) -> Self {
        match store.read() {
            Some(json) => match serde_json::from_str::<HighScores>(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    scores
                }
                Err(err) => {
                    log::warn!("Corrupt high score record, starting fresh: {err}");
                    Self::new()
                }
            },
            None => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
        }
    }

    /// Save to a store; serialization failure is swallowed
    pub fn save(&self, store: &mut dyn ScoreStore) {
        if let Ok(json) = serde_json::to_string(self) {
            store.write(&json);
            log::debug!("High scores saved ({} entries)", self.entries.len());
        }
    }
}
