//! Bounded history of rated episodes

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hilq_core::{Peg, Reward};

/// One completed, rated episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// 1-based episode index
    pub episode: u64,
    pub attempt: Vec<Peg>,
    pub rating: Reward,
    pub guessed: bool,
    /// Identifier handed to downstream feedback consumers
    pub feedback_id: String,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the engine started
    pub elapsed_secs: u64,
    /// Exploration probability after the update
    pub epsilon: f64,
}

/// Episode history keeping only the most recent `capacity` records
pub struct EpisodeHistory {
    buffer: VecDeque<EpisodeRecord>,
    capacity: usize,
}

impl EpisodeHistory {
    /// Create a new history with given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a record, evicting the oldest when full
    pub fn push(&mut self, record: EpisodeRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn last(&self) -> Option<&EpisodeRecord> {
        self.buffer.back()
    }

    /// Up to `n` most recent records, oldest first
    pub fn recent(&self, n: usize) -> Vec<EpisodeRecord> {
        let skip = self.buffer.len().saturating_sub(n);
        self.buffer.iter().skip(skip).cloned().collect()
    }

    /// Mean rating over the `n` most recent records
    pub fn mean_recent_rating(&self, n: usize) -> Option<f64> {
        let recent = self.recent(n);
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().map(|r| r.rating).sum::<f64>() / recent.len() as f64)
    }

    pub fn all(&self) -> Vec<EpisodeRecord> {
        self.buffer.iter().cloned().collect()
    }
}

impl Default for EpisodeHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}
