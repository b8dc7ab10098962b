//! Pre-populated Q-table keyed by multiset states

use std::collections::HashMap;

use ndarray::Array1;

use hilq_core::{AgentVariant, HilqError, Result, TableEntry, TableExport};

use crate::state::State;

/// Per-state value record stored in a [`QTable`]
pub trait QRecord: Clone + Send {
    /// Zero-initialised record for `no_actions` actions
    fn zeroed(no_actions: usize) -> Self;

    fn qvalues(&self) -> &Array1<f64>;

    fn to_entry(&self, state: &State) -> TableEntry;
}

/// Per-action Q-values only
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleRecord {
    pub qvalues: Array1<f64>,
}

impl QRecord for SimpleRecord {
    fn zeroed(no_actions: usize) -> Self {
        Self {
            qvalues: Array1::zeros(no_actions),
        }
    }

    fn qvalues(&self) -> &Array1<f64> {
        &self.qvalues
    }

    fn to_entry(&self, state: &State) -> TableEntry {
        TableEntry {
            state: state.key(),
            pegs: state.pegs().to_vec(),
            qvalues: self.qvalues.to_vec(),
            td_errors: None,
            td_errors_variations: None,
            visits: None,
        }
    }
}

/// Q-values plus TD-error tracking and a visit counter
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedRecord {
    pub qvalues: Array1<f64>,
    /// Absolute TD error of the latest update per action
    pub td_errors: Array1<f64>,
    /// Magnitude of the change of `td_errors` at the latest update
    pub td_errors_variations: Array1<f64>,
    pub visits: u64,
}

impl ExtendedRecord {
    /// Add `td` to the value of `action` and track the error
    pub fn apply_td(&mut self, action: usize, td: f64) {
        self.qvalues[action] += td;
        let abs_td = td.abs();
        self.td_errors_variations[action] = (abs_td - self.td_errors[action]).abs();
        self.td_errors[action] = abs_td;
    }
}

impl QRecord for ExtendedRecord {
    fn zeroed(no_actions: usize) -> Self {
        Self {
            qvalues: Array1::zeros(no_actions),
            td_errors: Array1::zeros(no_actions),
            td_errors_variations: Array1::zeros(no_actions),
            visits: 0,
        }
    }

    fn qvalues(&self) -> &Array1<f64> {
        &self.qvalues
    }

    fn to_entry(&self, state: &State) -> TableEntry {
        TableEntry {
            state: state.key(),
            pegs: state.pegs().to_vec(),
            qvalues: self.qvalues.to_vec(),
            td_errors: Some(self.td_errors.to_vec()),
            td_errors_variations: Some(self.td_errors_variations.to_vec()),
            visits: Some(self.visits),
        }
    }
}

/// Mapping from every state to its record, in enumeration order
#[derive(Debug, Clone)]
pub struct QTable<R> {
    states: Vec<State>,
    index: HashMap<State, usize>,
    records: Vec<R>,
    no_actions: usize,
}

impl<R: QRecord> QTable<R> {
    /// Build a zeroed table over `states`
    pub fn new(states: Vec<State>, no_actions: usize) -> Self {
        let index = states
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let records = vec![R::zeroed(no_actions); states.len()];
        Self {
            states,
            index,
            records,
            no_actions,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn no_actions(&self) -> usize {
        self.no_actions
    }

    pub fn contains(&self, state: &State) -> bool {
        self.index.contains_key(state)
    }

    fn position(&self, state: &State) -> Result<usize> {
        self.index
            .get(state)
            .copied()
            .ok_or_else(|| HilqError::InvalidState(state.key()))
    }

    pub fn get(&self, state: &State) -> Result<&R> {
        let i = self.position(state)?;
        Ok(&self.records[i])
    }

    pub fn get_mut(&mut self, state: &State) -> Result<&mut R> {
        let i = self.position(state)?;
        Ok(&mut self.records[i])
    }

    /// `max_a Q[state][a]`
    pub fn max_qvalue(&self, state: &State) -> Result<f64> {
        Ok(max_value(self.get(state)?.qvalues()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&State, &R)> {
        self.states.iter().zip(self.records.iter())
    }

    pub fn export(&self, variant: AgentVariant) -> TableExport {
        TableExport {
            variant: Some(variant),
            no_actions: self.no_actions,
            entries: self.iter().map(|(s, r)| r.to_entry(s)).collect(),
        }
    }
}

/// Largest element of a row; negative infinity for an empty row
pub fn max_value(row: &Array1<f64>) -> f64 {
    row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Index of the first largest element
pub fn argmax(row: &Array1<f64>) -> usize {
    let mut best = 0;
    for (i, &value) in row.iter().enumerate() {
        if value > row[best] {
            best = i;
        }
    }
    best
}
