//! Common types used throughout HILQ

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HilqError, Result};

/// Scalar feedback value supplied by the human rater
pub type Reward = f64;

/// A peg choice; doubles as the action index
pub type Peg = usize;

/// Policy for varying the exploration probability over episodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationMode {
    /// Fixed epsilon
    EGreedy,
    /// Epsilon decays multiplicatively after each episode, down to a floor
    EDecaying,
}

impl ExplorationMode {
    pub const SUPPORTED: &'static [&'static str] = &["e_greedy", "e_decaying"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExplorationMode::EGreedy => "e_greedy",
            ExplorationMode::EDecaying => "e_decaying",
        }
    }
}

impl std::fmt::Display for ExplorationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExplorationMode {
    type Err = HilqError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "e_greedy" => Ok(ExplorationMode::EGreedy),
            "e_decaying" => Ok(ExplorationMode::EDecaying),
            other => Err(HilqError::InvalidEpsilonMode {
                mode: other.to_string(),
                supported: Self::SUPPORTED,
            }),
        }
    }
}

/// Which Q-table update algorithm the agent runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentVariant {
    /// Plain Q-values with a one-step backup over the coverage
    Simple,
    /// TD-error tracking, reward shaping and generalisation to similar endings
    Extended,
}

impl AgentVariant {
    pub const SUPPORTED: &'static [&'static str] = &["simple", "extended"];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentVariant::Simple => "simple",
            AgentVariant::Extended => "extended",
        }
    }
}

impl std::fmt::Display for AgentVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentVariant {
    type Err = HilqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(AgentVariant::Simple),
            "extended" => Ok(AgentVariant::Extended),
            _ => Err(HilqError::InvalidVariant {
                variant: s.to_string(),
                supported: Self::SUPPORTED,
            }),
        }
    }
}

/// Learning and exploration parameters of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub epsilon_mode: ExplorationMode,
    pub epsilon_decay: f64,
    pub epsilon_low: f64,
    /// Visit penalty scale, extended variant only
    pub beta: f64,
    /// Seed for the agent's random generator; entropy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            gamma: 0.9,
            epsilon: 0.999,
            epsilon_mode: ExplorationMode::EDecaying,
            epsilon_decay: 0.95,
            epsilon_low: 0.1,
            beta: 2.0,
            seed: None,
        }
    }
}

impl AgentParams {
    /// Check the parameters shared by every variant
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(HilqError::InvalidAlpha(self.alpha));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(HilqError::InvalidGamma(self.gamma));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(HilqError::InvalidEpsilon(self.epsilon));
        }
        if !(0.0..=1.0).contains(&self.epsilon_low) {
            return Err(HilqError::InvalidEpsilon(self.epsilon_low));
        }
        Ok(())
    }

    /// Check the shared parameters plus `beta`
    pub fn validate_extended(&self) -> Result<()> {
        self.validate()?;
        // NaN fails this comparison as well
        if !(self.beta > 0.0) {
            return Err(HilqError::InvalidBeta(self.beta));
        }
        Ok(())
    }
}

/// Closed range of ratings a human may give
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: Reward,
    pub max: Reward,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self {
            min: -1.0,
            max: 3.0,
        }
    }
}

impl RatingScale {
    pub fn new(min: Reward, max: Reward) -> Result<Self> {
        if !(min <= max) {
            return Err(HilqError::Config(format!(
                "rating scale minimum {min} exceeds maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, rating: Reward) -> bool {
        (self.min..=self.max).contains(&rating)
    }

    /// Return the rating if it lies on the scale
    pub fn check(&self, rating: Reward) -> Result<Reward> {
        if self.contains(rating) {
            Ok(rating)
        } else {
            Err(HilqError::InvalidRating {
                rating,
                min: self.min,
                max: self.max,
            })
        }
    }
}
