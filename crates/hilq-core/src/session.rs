//! Session documents handed to the external store
//!
//! A session covers one run against one secret: the configuration snapshot,
//! the learned result and every rating the human gave along the way.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AgentParams, AgentVariant, Peg, Reward};
use crate::util::timestamp_id;

/// One row of an exported Q-table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Canonical state key, e.g. `{1, 2, 2}`
    pub state: String,
    pub pegs: Vec<Peg>,
    pub qvalues: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub td_errors: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub td_errors_variations: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visits: Option<u64>,
}

/// Q-table export in state enumeration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableExport {
    pub variant: Option<AgentVariant>,
    pub no_actions: usize,
    pub entries: Vec<TableEntry>,
}

impl TableExport {
    /// Find a row by its canonical key
    pub fn get(&self, key: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.state == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Configuration snapshot stored with a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub secret: Vec<Peg>,
    pub no_pegs: usize,
    pub code_len: usize,
    pub variant: AgentVariant,
    #[serde(flatten)]
    pub params: AgentParams,
}

/// Outcome of a session; fields stay empty until the session is closed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub guessed: Option<bool>,
    pub optimal: Option<Vec<Peg>>,
    pub qmatrix: Option<TableExport>,
    pub td_history: Option<Vec<f64>>,
    pub attempts: Option<u64>,
    pub time: Option<String>,
}

/// A single human rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub evaluation: Reward,
    pub attempt: Vec<Peg>,
    /// Elapsed session time as `mm:ss`
    pub time: String,
    pub timestamp: DateTime<Utc>,
}

/// Stored session document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub config: SessionConfig,
    pub result: SessionResult,
    pub feedback: BTreeMap<String, FeedbackRecord>,
}

impl Session {
    pub fn new(prefix: &str, config: SessionConfig) -> Self {
        let started_at = Utc::now();
        Self {
            session_id: timestamp_id(prefix, started_at),
            started_at,
            config,
            result: SessionResult::default(),
            feedback: BTreeMap::new(),
        }
    }

    pub fn record_feedback(&mut self, feedback_id: impl Into<String>, record: FeedbackRecord) {
        self.feedback.insert(feedback_id.into(), record);
    }

    pub fn finish(&mut self, result: SessionResult) {
        self.result = result;
    }

    pub fn is_finished(&self) -> bool {
        self.result.guessed.is_some()
    }
}
