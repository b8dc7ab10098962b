//! Interactive session: the agent guesses, the human rates each attempt

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use hilq_core::{HilqError, RatingScale};
use hilq_rl::{ChannelFeedback, RatingRequest};

use super::{finish_session, prepare, print_summary, GameArgs};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PlayArgs {
    #[command(flatten)]
    pub game: GameArgs,
}

/// What the rater typed
#[derive(Debug, PartialEq)]
enum Input {
    Rating(f64),
    Quit,
    Invalid(String),
}

fn parse_input(line: &str, scale: &RatingScale) -> Input {
    let line = line.trim();
    if matches!(line, "q" | "quit" | "exit") {
        return Input::Quit;
    }
    match line.parse::<f64>() {
        Ok(rating) if scale.contains(rating) => Input::Rating(rating),
        Ok(rating) => Input::Invalid(format!(
            "{rating} is off the scale [{}, {}]",
            scale.min, scale.max
        )),
        Err(_) => Input::Invalid(format!("'{line}' is not a number")),
    }
}

fn prompt(request: &RatingRequest, scale: &RatingScale) {
    println!(
        "\nAttempt #{}: {:?}",
        request.episode,
        request.attempt.pegs()
    );
    println!("Rate it from {} to {} (q to stop):", scale.min, scale.max);
}

pub async fn run(args: PlayArgs, mut config: Config) -> Result<()> {
    args.game.apply(&mut config);
    let scale = config.rating_scale()?;
    let max_episodes = config.feedback.max_episodes;

    let (mut engine, session) = prepare(&config)?;
    let (mut feedback, mut handle) = ChannelFeedback::channel(1);

    println!(
        "Secret drawn with {} pegs of {} values. The agent starts guessing.",
        config.game.code_len, config.game.no_pegs
    );

    let engine_task = tokio::task::spawn_blocking(move || {
        let outcome = engine.run(&mut feedback, max_episodes);
        (engine, outcome)
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    'requests: while let Some(request) = handle.requests.recv().await {
        prompt(&request, &scale);
        loop {
            let Some(line) = lines.next_line().await? else {
                break 'requests;
            };
            match parse_input(&line, &scale) {
                Input::Rating(rating) => {
                    handle.ratings.send(rating).await.ok();
                    continue 'requests;
                }
                Input::Quit => break 'requests,
                Input::Invalid(reason) => println!("{reason}, try again:"),
            }
        }
    }
    drop(handle);

    let (engine, outcome) = engine_task.await.context("Engine task panicked")?;
    match outcome {
        Ok(_) => {}
        Err(HilqError::FeedbackClosed(reason)) => {
            info!("Session stopped by the rater: {}", reason);
        }
        Err(e) => return Err(e.into()),
    }

    if engine.stats().solved {
        println!("\nThe agent guessed the secret!");
    } else {
        warn!("Session ended before the secret was guessed");
    }

    let session = finish_session(&config, &engine, session)?;
    print_summary(&session, &engine.stats());
    Ok(())
}
