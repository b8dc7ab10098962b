//! Integration tests for the Mastermind environment, agents and engine
//!
//! These tests drive the public API the way the command line driver does.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]

use std::collections::HashSet;

use hilq_core::{AgentParams, AgentVariant, ExplorationMode, HilqError, Result, Reward};
use hilq_rl::{
    build_learner, Engine, EngineConfig, EpsilonPolicy, MastermindEnv, RatingRequest,
    SimpleAgent, State,
};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn binomial(n: usize, k: usize) -> usize {
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

fn exploring(seed: u64) -> AgentParams {
    AgentParams {
        epsilon: 1.0,
        epsilon_mode: ExplorationMode::EGreedy,
        seed: Some(seed),
        ..AgentParams::default()
    }
}

/// Test the size and shape of the enumerated state space
#[test]
fn test_state_space_size() {
    for (no_pegs, code_len) in [(2, 1), (3, 2), (4, 3), (6, 4)] {
        let env = MastermindEnv::new(no_pegs, vec![0; code_len]).unwrap();
        let states = env.get_states();

        assert_eq!(states.len(), binomial(no_pegs + code_len, code_len));
        assert_eq!(states.len(), env.state_count());
        assert_eq!(states[0], State::empty());

        let unique: HashSet<&State> = states.iter().collect();
        assert_eq!(unique.len(), states.len(), "duplicates for {no_pegs}/{code_len}");
        assert!(states.windows(2).all(|w| w[0].len() <= w[1].len()));
    }
}

/// Test coverage and reachability properties on every state
#[test]
fn test_coverage_and_successors() {
    let env = MastermindEnv::new(4, vec![1, 2, 3]).unwrap();

    for state in env.get_states() {
        let coverage = env.get_coverage(&state).unwrap();
        assert!(coverage.contains(&state));
        assert!(coverage.contains(&State::empty()));
        assert!(coverage.iter().all(|c| c.len() <= state.len()));

        let successors = env.get_next_reachable_states(&state).unwrap();
        if env.is_terminal_state(&state).unwrap() {
            assert!(successors.is_empty());
        } else {
            assert_eq!(successors.len(), 4);
            for successor in successors {
                assert_eq!(successor.state.len(), state.len() + 1);
                assert_eq!(successor.state.count(successor.action), state.count(successor.action) + 1);
            }
        }
    }
}

/// Test a complete attempt at the secret
#[test]
fn test_guessing_the_secret() {
    let mut env = MastermindEnv::new(4, vec![1, 2, 3]).unwrap();
    assert!(!env.step(3).unwrap().1);
    assert!(!env.step(1).unwrap().1);
    let (state, done) = env.step(2).unwrap();

    assert!(done);
    assert!(env.is_guessed());
    assert_eq!(state.key(), "{1, 2, 3}");
    assert_eq!(env.get_coverage(&state).unwrap().len(), 8);

    assert!(env.reset().is_empty());
    assert!(!env.is_guessed());
}

/// Test invalid input is reported, not panicked on
#[test]
fn test_invalid_inputs() {
    assert!(matches!(
        MastermindEnv::new(4, vec![4]),
        Err(HilqError::InvalidAction(4))
    ));

    let mut env = MastermindEnv::new(4, vec![1, 2, 3]).unwrap();
    assert!(matches!(env.step(9), Err(HilqError::InvalidAction(9))));
    assert!(matches!(
        env.get_coverage(&State::from_pegs([0, 0, 0, 0])),
        Err(HilqError::InvalidState(_))
    ));
    assert!(matches!(env.render(), Err(HilqError::UnsupportedOperation(_))));
}

/// Test greedy ties are broken uniformly
#[test]
fn test_tie_breaking_is_fair() {
    let policy = EpsilonPolicy::from_params(&AgentParams {
        epsilon: 0.0,
        epsilon_mode: ExplorationMode::EGreedy,
        ..AgentParams::default()
    })
    .unwrap();
    let row = Array1::<f64>::zeros(4);
    let mut rng = StdRng::seed_from_u64(99);

    let mut counts = [0usize; 4];
    for _ in 0..4000 {
        counts[policy.select(&mut rng, &row)] += 1;
    }
    for (action, &count) in counts.iter().enumerate() {
        assert!(
            (800..=1200).contains(&count),
            "action {action} chosen {count} times"
        );
    }
}

/// Test a non-positive rating never touches states above the terminal one
#[test]
fn test_simple_negative_rating_stays_local() {
    let env = MastermindEnv::new(4, vec![1, 2, 3]).unwrap();
    let mut agent = SimpleAgent::new(env, &exploring(7)).unwrap();

    for action in [0, 0, 3] {
        agent.take_action(action).unwrap();
    }
    agent.update_qmatrix(-1.0).unwrap();

    let terminal = State::from_pegs([0, 0, 3]);
    for (state, record) in agent.qmatrix().iter() {
        let expected = if *state == terminal { -0.7 } else { 0.0 };
        assert!(
            record.qvalues.iter().all(|&q| (q - expected).abs() < 1e-12),
            "{state}"
        );
    }
}

/// Test both variants solve a small game when every guess is rated by hand
#[test]
fn test_engine_solves_small_game() {
    for variant in [AgentVariant::Simple, AgentVariant::Extended] {
        let env = MastermindEnv::new(3, vec![2, 0]).unwrap();
        let learner = build_learner(variant, env, &exploring(11)).unwrap();
        let mut engine = Engine::new(learner, EngineConfig::default());

        let secret = State::from_pegs([0, 2]);
        let mut rater = |request: &RatingRequest| -> Result<Reward> {
            Ok(request.attempt.common_with(&secret) as f64 - 1.0)
        };
        let stats = engine.run(&mut rater, Some(1000)).unwrap();

        assert!(stats.solved, "{variant:?} never guessed the secret");
        assert!(engine.is_finished());
        assert_eq!(stats.history_size as u64, stats.episodes);

        let result = engine.session_result().unwrap();
        assert_eq!(result.guessed, Some(true));
        let export = result.qmatrix.unwrap();
        assert_eq!(export.len(), 10);
        assert_eq!(export.variant, Some(variant));
        assert_eq!(
            result.td_history.unwrap().len() as u64,
            if variant == AgentVariant::Extended { stats.episodes } else { 0 }
        );
    }
}

/// Test the table export survives a JSON round trip
#[test]
fn test_exported_table_serializes() {
    let env = MastermindEnv::new(3, vec![1, 1]).unwrap();
    let mut learner = build_learner(AgentVariant::Extended, env, &exploring(3)).unwrap();
    learner.take_action(1).unwrap();
    learner.take_action(2).unwrap();
    learner.update(-1.0).unwrap();

    let export = learner.export_table();
    let json = serde_json::to_string(&export).unwrap();
    let parsed: hilq_core::TableExport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.len(), export.len());
    assert_eq!(parsed.no_actions, 3);

    let entry = parsed.get("{1, 2}").unwrap();
    assert_eq!(entry.visits, Some(1));
    assert!(entry.qvalues.iter().all(|&q| q < 0.0));
}
