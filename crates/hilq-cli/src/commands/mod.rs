//! CLI command modules

pub mod config;
pub mod play;
pub mod sessions;
pub mod simulate;
pub mod states;

use anyhow::{Context, Result};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

use hilq_core::util::format_elapsed;
use hilq_core::{FeedbackRecord, Peg, Session, SessionConfig};
use hilq_rl::{build_learner, Engine, EngineStats, MastermindEnv};

use crate::config::Config;
use crate::store::{JsonFileStore, SessionStore};

/// Game and agent overrides shared by `play` and `simulate`
#[derive(Args, Debug, Clone, Default)]
pub struct GameArgs {
    /// Number of distinct peg values
    #[arg(long)]
    pub no_pegs: Option<usize>,

    /// Secret combination, e.g. `1,2,3`; random when omitted
    #[arg(long, value_delimiter = ',')]
    pub secret: Option<Vec<Peg>>,

    /// Agent variant (simple, extended)
    #[arg(long)]
    pub variant: Option<String>,

    /// Seed for the agent and the random secret
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many rated episodes
    #[arg(long)]
    pub max_episodes: Option<u64>,

    /// Do not store the session
    #[arg(long)]
    pub no_save: bool,
}

impl GameArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(no_pegs) = self.no_pegs {
            config.game.no_pegs = no_pegs;
        }
        if let Some(secret) = &self.secret {
            config.game.code_len = secret.len();
            config.game.secret = Some(secret.clone());
        }
        if let Some(variant) = &self.variant {
            config.agent.variant.clone_from(variant);
        }
        if self.seed.is_some() {
            config.agent.seed = self.seed;
        }
        if self.max_episodes.is_some() {
            config.feedback.max_episodes = self.max_episodes;
        }
        if self.no_save {
            config.session.save = false;
        }
    }
}

/// Engine and empty session document built from a validated config
pub fn prepare(config: &Config) -> Result<(Engine, Session)> {
    config.validate().context("Invalid configuration")?;

    let mut rng = match config.agent.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let secret = config.secret(&mut rng)?;
    let variant = config.variant()?;
    let params = config.agent_params()?;

    let env = MastermindEnv::new(config.game.no_pegs, secret.clone())?;
    let learner = build_learner(variant, env, &params)?;
    let engine = Engine::new(learner, config.engine_config()?);

    let session = Session::new(
        &config.session.id_prefix,
        SessionConfig {
            secret,
            no_pegs: config.game.no_pegs,
            code_len: config.game.code_len,
            variant,
            params,
        },
    );
    tracing::info!(
        "Session {} started: {} agent, {} pegs, code length {}",
        session.session_id,
        variant,
        config.game.no_pegs,
        config.game.code_len
    );

    Ok((engine, session))
}

/// Copy ratings and results from the engine into the session and store it
pub fn finish_session(config: &Config, engine: &Engine, mut session: Session) -> Result<Session> {
    for record in engine.history().all() {
        // ratings the engine gave itself are not human feedback
        if record.guessed && config.feedback.reward_on_guess {
            continue;
        }
        session.record_feedback(
            record.feedback_id,
            FeedbackRecord {
                evaluation: record.rating,
                attempt: record.attempt,
                time: format_elapsed(record.elapsed_secs),
                timestamp: record.timestamp,
            },
        );
    }
    session.finish(engine.session_result()?);

    if config.session.save {
        let store = JsonFileStore::new(&config.session.path);
        store
            .insert(&session)
            .with_context(|| format!("Failed to store session in {}", store.path().display()))?;
    }
    Ok(session)
}

pub fn print_summary(session: &Session, stats: &EngineStats) {
    println!("\nSession {}", session.session_id);
    println!("==========================");
    println!("  Secret:         {:?}", session.config.secret);
    println!("  Agent:          {}", stats.algorithm);
    println!("  Episodes:       {}", stats.episodes);
    println!("  Average rating: {:.3}", stats.average_reward);
    println!("  Final epsilon:  {:.4}", stats.epsilon);
    println!("  Guessed:        {}", if stats.solved { "yes" } else { "no" });
    if let Some(optimal) = &session.result.optimal {
        println!("  Optimal:        {optimal:?}");
    }
    if let Some(time) = &session.result.time {
        println!("  Time:           {time}");
    }
}
