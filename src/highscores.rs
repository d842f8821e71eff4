//! High score leaderboard system
//!
//! Persisted as JSON, tracks the top 10 runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::storage::{self, StorageError};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's score
    pub score: u64,
    /// Level reached (0-based)
    pub level: usize,
    /// Whether the run cleared the final boss
    pub won: bool,
    /// Unix timestamp (ms) when achieved
    pub timestamp: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
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
        // Check if score beats the lowest entry
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a finished run to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64, level: usize, won: bool, timestamp: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            level,
            won,
            timestamp,
        };

        // Find insertion point (sorted descending by score)
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

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores, starting fresh if there are none
    pub fn load(path: &Path) -> Self {
        match storage::read_json::<HighScores>(path) {
            Ok(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(StorageError::Io { .. }) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("{}; starting fresh", e);
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        storage::write_json(path, self)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}
