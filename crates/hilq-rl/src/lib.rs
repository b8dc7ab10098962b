//! HILQ RL - Mastermind environment and human-rated tabular Q-learning
//!
//! This crate provides the combination-guessing environment, the two agent
//! variants and the episode engine that gates learning on human ratings.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]

pub mod agent;
pub mod algorithm;
pub mod engine;
pub mod environment;
pub mod history;
pub mod policy;
pub mod qtable;
pub mod state;

pub use agent::{ExtendedAgent, SimpleAgent};
pub use algorithm::{build_learner, Learner};
pub use engine::{
    ChannelFeedback, Engine, EngineConfig, EngineStats, FeedbackHandle, FeedbackSource, Phase,
    RatingRequest, StepOutcome,
};
pub use environment::{MastermindEnv, Successor};
pub use history::{EpisodeHistory, EpisodeRecord};
pub use policy::EpsilonPolicy;
pub use qtable::{ExtendedRecord, QRecord, QTable, SimpleRecord};
pub use state::State;
