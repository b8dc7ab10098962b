//! Epsilon-greedy exploration shared by both agent variants

use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use hilq_core::{AgentParams, ExplorationMode, Result};

use crate::qtable::max_value;

/// Learning rates and exploration schedule
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonPolicy {
    alpha: f64,
    gamma: f64,
    epsilon: f64,
    mode: ExplorationMode,
    epsilon_decay: f64,
    epsilon_low: f64,
}

impl EpsilonPolicy {
    pub fn from_params(params: &AgentParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            alpha: params.alpha,
            gamma: params.gamma,
            epsilon: params.epsilon,
            mode: params.epsilon_mode,
            epsilon_decay: params.epsilon_decay,
            epsilon_low: params.epsilon_low,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn mode(&self) -> ExplorationMode {
        self.mode
    }

    pub fn epsilon_decay(&self) -> f64 {
        self.epsilon_decay
    }

    pub fn epsilon_low(&self) -> f64 {
        self.epsilon_low
    }

    /// Random action with probability epsilon, otherwise a greedy one
    pub fn select<R: Rng>(&self, rng: &mut R, row: &Array1<f64>) -> usize {
        if rng.gen::<f64>() < self.epsilon {
            return rng.gen_range(0..row.len());
        }
        greedy_ties(row).choose(rng).copied().unwrap_or(0)
    }

    /// Called once per completed episode
    pub fn decay(&mut self) {
        if self.mode == ExplorationMode::EDecaying {
            self.epsilon = self.epsilon_low.max(self.epsilon * self.epsilon_decay);
            debug!("Epsilon decayed to {:.4}", self.epsilon);
        }
    }
}

/// Every action whose value equals the row maximum
pub fn greedy_ties(row: &Array1<f64>) -> Vec<usize> {
    let max = max_value(row);
    row.iter()
        .enumerate()
        .filter(|&(_, &q)| q == max)
        .map(|(a, _)| a)
        .collect()
}
