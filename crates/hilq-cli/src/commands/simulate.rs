//! Scripted session: a rater scoring peg overlap with the secret stands in for the human

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use hilq_core::{RatingScale, Reward};
use hilq_rl::{FeedbackSource, RatingRequest, State};

use super::{finish_session, prepare, print_summary, GameArgs};
use crate::config::Config;

/// Episode cap when neither the command line nor the config sets one
const DEFAULT_SIMULATED_EPISODES: u64 = 500;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub game: GameArgs,

    /// Print the session document as JSON
    #[arg(long)]
    pub json: bool,
}

/// Rates an attempt by the share of secret pegs it contains, mapped onto the scale
pub struct OverlapRater {
    secret: State,
    scale: RatingScale,
}

impl OverlapRater {
    pub fn new(secret: &[usize], scale: RatingScale) -> Self {
        Self {
            secret: State::from_pegs(secret.iter().copied()),
            scale,
        }
    }

    pub fn rate(&self, attempt: &State) -> Reward {
        let share = attempt.common_with(&self.secret) as f64 / self.secret.len().max(1) as f64;
        self.scale.min + share * (self.scale.max - self.scale.min)
    }
}

impl FeedbackSource for OverlapRater {
    fn await_rating(&mut self, request: &RatingRequest) -> hilq_core::Result<Reward> {
        Ok(self.rate(&request.attempt))
    }
}

pub async fn run(args: SimulateArgs, mut config: Config) -> Result<()> {
    args.game.apply(&mut config);
    let max_episodes = config
        .feedback
        .max_episodes
        .unwrap_or(DEFAULT_SIMULATED_EPISODES);

    let (mut engine, session) = prepare(&config)?;
    let mut rater = OverlapRater::new(&session.config.secret, config.rating_scale()?);

    let (engine, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = engine.run(&mut rater, Some(max_episodes));
        (engine, outcome)
    })
    .await
    .context("Engine task panicked")?;
    let stats = outcome?;
    info!(
        "Simulation finished after {} episodes, mean of last 10 ratings {:?}",
        stats.episodes,
        engine.history().mean_recent_rating(10)
    );

    let session = finish_session(&config, &engine, session)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_summary(&session, &stats);
    }
    Ok(())
}
