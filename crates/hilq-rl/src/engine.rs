//! Episode engine - drives a learner and gates it on human feedback
//!
//! The engine is an explicit state machine. While a rating is pending it
//! blocks inside [`FeedbackSource::await_rating`], so at most one
//! choose/step/update sequence is ever in flight.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info};

use hilq_core::util::{format_elapsed, timestamp_id};
use hilq_core::{HilqError, Peg, RatingScale, Result, Reward, SessionResult};

use crate::algorithm::Learner;
use crate::history::{EpisodeHistory, EpisodeRecord};
use crate::state::State;

/// What the engine asks the rater about
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRequest {
    pub episode: u64,
    pub attempt: State,
    pub guessed: bool,
}

/// Synchronous source of human ratings
pub trait FeedbackSource {
    /// Block until a rating for `request` is available
    fn await_rating(&mut self, request: &RatingRequest) -> Result<Reward>;
}

impl<F> FeedbackSource for F
where
    F: FnMut(&RatingRequest) -> Result<Reward>,
{
    fn await_rating(&mut self, request: &RatingRequest) -> Result<Reward> {
        self(request)
    }
}

/// Feedback source backed by a pair of bounded channels.
///
/// `await_rating` uses blocking channel operations and must run outside the
/// async runtime, e.g. inside `tokio::task::spawn_blocking`.
pub struct ChannelFeedback {
    requests: mpsc::Sender<RatingRequest>,
    ratings: mpsc::Receiver<Reward>,
}

/// Rater side of a [`ChannelFeedback`]
pub struct FeedbackHandle {
    pub requests: mpsc::Receiver<RatingRequest>,
    pub ratings: mpsc::Sender<Reward>,
}

impl ChannelFeedback {
    pub fn channel(capacity: usize) -> (ChannelFeedback, FeedbackHandle) {
        let (request_tx, request_rx) = mpsc::channel(capacity.max(1));
        let (rating_tx, rating_rx) = mpsc::channel(capacity.max(1));
        (
            ChannelFeedback {
                requests: request_tx,
                ratings: rating_rx,
            },
            FeedbackHandle {
                requests: request_rx,
                ratings: rating_tx,
            },
        )
    }
}

impl FeedbackSource for ChannelFeedback {
    fn await_rating(&mut self, request: &RatingRequest) -> Result<Reward> {
        self.requests
            .blocking_send(request.clone())
            .map_err(|_| HilqError::FeedbackClosed("rating request dropped".to_string()))?;
        self.ratings
            .blocking_recv()
            .ok_or_else(|| HilqError::FeedbackClosed("no rating received".to_string()))
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scale: RatingScale,
    /// Rate a guessed attempt with the scale maximum and finish the session
    pub reward_on_guess: bool,
    pub history_capacity: usize,
    pub feedback_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scale: RatingScale::default(),
            reward_on_guess: true,
            history_capacity: 1000,
            feedback_prefix: "feedback_".to_string(),
        }
    }
}

/// Where the engine is within an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Acting,
    AwaitingRating,
    Finished,
}

/// Result of a single [`Engine::step`]
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Acted { action: Peg, state: State, done: bool },
    Rated(EpisodeRecord),
    Finished,
}

/// Drives a learner episode by episode
pub struct Engine {
    learner: Box<dyn Learner>,
    config: EngineConfig,
    phase: Phase,
    episodes: u64,
    total_rewards: f64,
    solved: bool,
    history: EpisodeHistory,
    started_at: DateTime<Utc>,
}

impl Engine {
    pub fn new(learner: Box<dyn Learner>, config: EngineConfig) -> Self {
        info!(
            "Engine started with algorithm {} over {} states",
            learner.name(),
            learner.env().state_count()
        );
        let history = EpisodeHistory::new(config.history_capacity);
        Self {
            learner,
            config,
            phase: Phase::Acting,
            episodes: 0,
            total_rewards: 0.0,
            solved: false,
            history,
            started_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn learner(&self) -> &dyn Learner {
        self.learner.as_ref()
    }

    pub fn history(&self) -> &EpisodeHistory {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn elapsed_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Perform exactly one transition.
    ///
    /// A rejected rating leaves the engine waiting for a new one.
    pub fn step(&mut self, feedback: &mut dyn FeedbackSource) -> Result<StepOutcome> {
        match self.phase {
            Phase::Finished => Ok(StepOutcome::Finished),
            Phase::Acting => {
                let action = self.learner.select_action()?;
                let done = self.learner.take_action(action)?;
                let state = self.learner.current_state().clone();
                debug!("Action {} -> {}", action, state);
                if done {
                    self.phase = Phase::AwaitingRating;
                }
                Ok(StepOutcome::Acted { action, state, done })
            }
            Phase::AwaitingRating => self.rate(feedback).map(StepOutcome::Rated),
        }
    }

    fn rate(&mut self, feedback: &mut dyn FeedbackSource) -> Result<EpisodeRecord> {
        let attempt = self.learner.current_state().clone();
        let guessed = self.learner.env().is_guessed();
        let episode = self.episodes + 1;

        let auto = guessed && self.config.reward_on_guess;
        let rating = if auto {
            self.config.scale.max
        } else {
            let request = RatingRequest {
                episode,
                attempt: attempt.clone(),
                guessed,
            };
            let rating = feedback.await_rating(&request)?;
            self.config.scale.check(rating)?
        };

        self.learner.update(rating)?;

        self.episodes = episode;
        self.total_rewards += rating;
        self.solved |= guessed;

        let timestamp = Utc::now();
        let feedback_id = format!(
            "{}_{}",
            timestamp_id(&self.config.feedback_prefix, timestamp),
            episode
        );
        let record = EpisodeRecord {
            episode,
            attempt: attempt.into_pegs(),
            rating,
            guessed,
            feedback_id,
            timestamp,
            elapsed_secs: self.elapsed_secs(),
            epsilon: self.learner.epsilon(),
        };

        info!(
            feedback_id = %record.feedback_id,
            timestamp = %record.timestamp.to_rfc3339(),
            episode,
            rating,
            guessed,
            "feedback_recorded"
        );

        self.history.push(record.clone());
        self.phase = if auto { Phase::Finished } else { Phase::Acting };
        Ok(record)
    }

    /// Step until the running episode has been rated
    pub fn run_episode(&mut self, feedback: &mut dyn FeedbackSource) -> Result<Option<EpisodeRecord>> {
        loop {
            match self.step(feedback)? {
                StepOutcome::Acted { .. } => {}
                StepOutcome::Rated(record) => return Ok(Some(record)),
                StepOutcome::Finished => return Ok(None),
            }
        }
    }

    /// Run episodes until the secret is guessed or `max_episodes` were rated
    pub fn run(
        &mut self,
        feedback: &mut dyn FeedbackSource,
        max_episodes: Option<u64>,
    ) -> Result<EngineStats> {
        while !self.is_finished() {
            if max_episodes.is_some_and(|max| self.episodes >= max) {
                break;
            }
            self.run_episode(feedback)?;
        }
        Ok(self.stats())
    }

    /// Drop the running attempt; the table and counters are untouched
    pub fn abort_episode(&mut self) {
        if self.phase != Phase::Finished {
            let state = self.learner.reset_episode();
            self.phase = Phase::Acting;
            debug!("Episode aborted, back at {}", state);
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            episodes: self.episodes,
            total_rewards: self.total_rewards,
            average_reward: if self.episodes > 0 {
                self.total_rewards / self.episodes as f64
            } else {
                0.0
            },
            solved: self.solved,
            epsilon: self.learner.epsilon(),
            history_size: self.history.len(),
            algorithm: self.learner.name().to_string(),
        }
    }

    /// Result section of the session document
    pub fn session_result(&self) -> Result<SessionResult> {
        Ok(SessionResult {
            guessed: Some(self.solved),
            optimal: Some(self.learner.optimal()?.into_pegs()),
            qmatrix: Some(self.learner.export_table()),
            td_history: Some(self.learner.td_history().to_vec()),
            attempts: Some(self.episodes),
            time: Some(format_elapsed(self.elapsed_secs())),
        })
    }
}

/// Engine statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineStats {
    pub episodes: u64,
    pub total_rewards: f64,
    pub average_reward: f64,
    pub solved: bool,
    pub epsilon: f64,
    pub history_size: usize,
    pub algorithm: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::build_learner;
    use crate::environment::MastermindEnv;
    use hilq_core::{AgentParams, AgentVariant, ExplorationMode};

    fn engine(variant: AgentVariant, config: EngineConfig) -> Engine {
        let env = MastermindEnv::new(3, vec![1, 2]).unwrap();
        let params = AgentParams {
            epsilon: 1.0,
            epsilon_mode: ExplorationMode::EGreedy,
            seed: Some(21),
            ..AgentParams::default()
        };
        Engine::new(build_learner(variant, env, &params).unwrap(), config)
    }

    fn manual() -> EngineConfig {
        EngineConfig {
            reward_on_guess: false,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_step_transitions() {
        let mut engine = engine(AgentVariant::Simple, manual());
        let mut rater = |_: &RatingRequest| -> Result<Reward> { Ok(1.0) };

        assert_eq!(engine.phase(), Phase::Acting);
        let first = engine.step(&mut rater).unwrap();
        assert!(matches!(first, StepOutcome::Acted { done: false, .. }));
        let second = engine.step(&mut rater).unwrap();
        assert!(matches!(second, StepOutcome::Acted { done: true, .. }));
        assert_eq!(engine.phase(), Phase::AwaitingRating);

        let record = match engine.step(&mut rater).unwrap() {
            StepOutcome::Rated(record) => record,
            other => panic!("expected a rating, got {other:?}"),
        };
        assert_eq!(record.episode, 1);
        assert_eq!(record.attempt.len(), 2);
        assert!(record.feedback_id.starts_with("feedback_"));
        assert_eq!(engine.phase(), Phase::Acting);
        assert!(engine.learner().current_state().is_empty());
    }

    #[test]
    fn test_rejected_rating_keeps_waiting() {
        let mut engine = engine(AgentVariant::Extended, manual());
        let mut bad = |_: &RatingRequest| -> Result<Reward> { Ok(10.0) };
        engine.step(&mut bad).unwrap();
        engine.step(&mut bad).unwrap();

        let err = engine.step(&mut bad).unwrap_err();
        assert!(matches!(err, HilqError::InvalidRating { .. }));
        assert_eq!(engine.phase(), Phase::AwaitingRating);
        assert_eq!(engine.stats().episodes, 0);

        let mut good = |_: &RatingRequest| -> Result<Reward> { Ok(0.0) };
        assert!(matches!(engine.step(&mut good).unwrap(), StepOutcome::Rated(_)));
        assert_eq!(engine.stats().episodes, 1);
    }

    #[test]
    fn test_guess_is_rated_automatically() {
        let mut engine = engine(AgentVariant::Simple, EngineConfig::default());
        let mut asked = 0;
        let mut rater = |request: &RatingRequest| -> Result<Reward> {
            asked += 1;
            assert!(!request.guessed);
            Ok(-1.0)
        };
        let stats = engine.run(&mut rater, Some(500)).unwrap();
        assert!(matches!(
            engine.step(&mut rater).unwrap(),
            StepOutcome::Finished
        ));

        assert!(engine.is_finished());
        assert!(stats.solved);
        let last = engine.history().last().unwrap();
        assert!(last.guessed);
        assert_eq!(last.rating, 3.0);
        assert_eq!(stats.episodes, asked + 1);
    }

    #[test]
    fn test_run_respects_episode_limit() {
        let mut engine = engine(AgentVariant::Extended, manual());
        let mut rater = |_: &RatingRequest| -> Result<Reward> { Ok(0.5) };
        let stats = engine.run(&mut rater, Some(4)).unwrap();
        assert_eq!(stats.episodes, 4);
        assert_eq!(stats.total_rewards, 2.0);
        assert_eq!(stats.average_reward, 0.5);
        assert_eq!(stats.history_size, 4);
        assert_eq!(stats.algorithm, "extended_q");
        assert!(!engine.is_finished());
    }

    #[test]
    fn test_abort_episode() {
        let mut engine = engine(AgentVariant::Simple, manual());
        let mut rater = |_: &RatingRequest| -> Result<Reward> { Ok(1.0) };
        engine.step(&mut rater).unwrap();
        engine.step(&mut rater).unwrap();
        engine.abort_episode();
        assert_eq!(engine.phase(), Phase::Acting);
        assert!(engine.learner().current_state().is_empty());
        assert_eq!(engine.stats().episodes, 0);
    }

    #[test]
    fn test_feedback_errors_propagate() {
        let mut engine = engine(AgentVariant::Simple, manual());
        let mut closed = |_: &RatingRequest| -> Result<Reward> {
            Err(HilqError::FeedbackClosed("rater gone".to_string()))
        };
        let err = engine.run_episode(&mut closed).unwrap_err();
        assert!(matches!(err, HilqError::FeedbackClosed(_)));
    }

    #[test]
    fn test_session_result() {
        let mut engine = engine(AgentVariant::Extended, manual());
        let mut rater = |_: &RatingRequest| -> Result<Reward> { Ok(2.0) };
        engine.run(&mut rater, Some(2)).unwrap();

        let result = engine.session_result().unwrap();
        assert_eq!(result.attempts, Some(2));
        assert_eq!(result.optimal.as_ref().unwrap().len(), 2);
        assert_eq!(result.qmatrix.as_ref().unwrap().len(), 10);
        assert_eq!(result.td_history.as_ref().unwrap().len(), 2);
        assert!(result.time.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_channel_feedback_round_trip() {
        let (mut feedback, mut handle) = ChannelFeedback::channel(1);

        let engine_side = tokio::task::spawn_blocking(move || {
            let request = RatingRequest {
                episode: 1,
                attempt: State::from_pegs([0, 1]),
                guessed: false,
            };
            feedback.await_rating(&request)
        });

        let request = handle.requests.recv().await.unwrap();
        assert_eq!(request.attempt, State::from_pegs([1, 0]));
        handle.ratings.send(2.5).await.unwrap();

        let rating = engine_side.await.unwrap().unwrap();
        assert_eq!(rating, 2.5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_channel_feedback_closed() {
        let (mut feedback, handle) = ChannelFeedback::channel(1);
        drop(handle);

        let result = tokio::task::spawn_blocking(move || {
            feedback.await_rating(&RatingRequest {
                episode: 1,
                attempt: State::empty(),
                guessed: false,
            })
        })
        .await
        .unwrap();
        assert!(matches!(result, Err(HilqError::FeedbackClosed(_))));
    }
}
