//! Configuration loading for the HILQ CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use rand::Rng;
use serde::{Deserialize, Serialize};

use hilq_core::{AgentParams, AgentVariant, ExplorationMode, HilqError, Peg, RatingScale};
use hilq_rl::EngineConfig;

/// Configuration for a learning session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub agent: AgentConfig,
    pub feedback: FeedbackConfig,
    pub session: SessionConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub no_pegs: usize,
    pub code_len: usize,
    /// Fixed secret; a random one of `code_len` pegs is drawn when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<Vec<Peg>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            no_pegs: 6,
            code_len: 4,
            secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub variant: String,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub epsilon_mode: String,
    pub epsilon_decay: f64,
    pub epsilon_low: f64,
    pub beta: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let params = AgentParams::default();
        Self {
            variant: AgentVariant::Extended.as_str().to_string(),
            alpha: params.alpha,
            gamma: params.gamma,
            epsilon: params.epsilon,
            epsilon_mode: params.epsilon_mode.as_str().to_string(),
            epsilon_decay: params.epsilon_decay,
            epsilon_low: params.epsilon_low,
            beta: params.beta,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub min_rating: f64,
    pub max_rating: f64,
    /// Rate a guessed attempt with `max_rating` without asking
    pub reward_on_guess: bool,
    pub history_capacity: usize,
    pub id_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_episodes: Option<u64>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        let scale = RatingScale::default();
        Self {
            min_rating: scale.min,
            max_rating: scale.max,
            reward_on_guess: true,
            history_capacity: 1000,
            id_prefix: "feedback_".to_string(),
            max_episodes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file sessions are appended to
    pub path: PathBuf,
    pub id_prefix: String,
    pub save: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|d| d.join("hilq").join("sessions.json"))
            .unwrap_or_else(|| PathBuf::from("hilq_sessions.json"));
        Self {
            path,
            id_prefix: "rl_session_".to_string(),
            save: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from the first config file found and environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };
        Self::load_from(path.as_deref())
    }

    /// Load configuration from `path` (if any) layered under `HILQ__` variables
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = path {
            tracing::debug!("Loading config from: {:?}", path);
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }

        // HILQ__AGENT__ALPHA=0.5 overrides agent.alpha
        builder = builder.add_source(
            Environment::with_prefix("HILQ")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Find the configuration file
    pub fn find_config_file() -> Option<PathBuf> {
        // Check in order: HILQ_CONFIG env, ./hilq.toml, ~/.config/hilq/hilq.toml
        if let Ok(path) = std::env::var("HILQ_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("hilq.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("hilq").join("hilq.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    pub fn variant(&self) -> hilq_core::Result<AgentVariant> {
        self.agent.variant.parse()
    }

    /// Checked agent parameters for the configured variant
    pub fn agent_params(&self) -> hilq_core::Result<AgentParams> {
        let epsilon_mode: ExplorationMode = self.agent.epsilon_mode.parse()?;
        let params = AgentParams {
            alpha: self.agent.alpha,
            gamma: self.agent.gamma,
            epsilon: self.agent.epsilon,
            epsilon_mode,
            epsilon_decay: self.agent.epsilon_decay,
            epsilon_low: self.agent.epsilon_low,
            beta: self.agent.beta,
            seed: self.agent.seed,
        };
        match self.variant()? {
            AgentVariant::Simple => params.validate()?,
            AgentVariant::Extended => params.validate_extended()?,
        }
        Ok(params)
    }

    pub fn rating_scale(&self) -> hilq_core::Result<RatingScale> {
        RatingScale::new(self.feedback.min_rating, self.feedback.max_rating)
    }

    pub fn engine_config(&self) -> hilq_core::Result<EngineConfig> {
        Ok(EngineConfig {
            scale: self.rating_scale()?,
            reward_on_guess: self.feedback.reward_on_guess,
            history_capacity: self.feedback.history_capacity,
            feedback_prefix: self.feedback.id_prefix.clone(),
        })
    }

    /// The configured secret, or a random one drawn with `rng`
    pub fn secret<R: Rng>(&self, rng: &mut R) -> hilq_core::Result<Vec<Peg>> {
        match &self.game.secret {
            Some(secret) => {
                if secret.len() != self.game.code_len {
                    return Err(HilqError::Config(format!(
                        "secret {:?} does not have code_len {} pegs",
                        secret, self.game.code_len
                    )));
                }
                Ok(secret.clone())
            }
            None => Ok((0..self.game.code_len)
                .map(|_| rng.gen_range(0..self.game.no_pegs))
                .collect()),
        }
    }

    /// Check every section without building anything
    pub fn validate(&self) -> hilq_core::Result<()> {
        if self.game.no_pegs == 0 {
            return Err(HilqError::InvalidPegCount(0));
        }
        if self.game.code_len == 0 {
            return Err(HilqError::InvalidSecret);
        }
        if let Some(secret) = &self.game.secret {
            if let Some(&peg) = secret.iter().find(|&&p| p >= self.game.no_pegs) {
                return Err(HilqError::InvalidAction(peg));
            }
            if secret.len() != self.game.code_len {
                return Err(HilqError::Config(format!(
                    "secret {:?} does not have code_len {} pegs",
                    secret, self.game.code_len
                )));
            }
        }
        self.agent_params()?;
        self.rating_scale()?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
