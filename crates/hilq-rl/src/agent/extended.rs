//! Extended variant: shaped rewards, TD-error tracking and generalisation
//!
//! Human ratings are scarce and noisy. This agent amplifies negative
//! ratings, penalises endings it keeps revisiting and spreads a fraction of
//! each rating to untried endings that share pegs with the rated one.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use tracing::debug;

use hilq_core::{AgentParams, Peg, Result, Reward};

use super::{deepest_first, seeded_rng};
use crate::environment::MastermindEnv;
use crate::policy::EpsilonPolicy;
use crate::qtable::{argmax, ExtendedRecord, QTable};
use crate::state::State;

/// Multiplier applied to negative ratings
pub const NEGATIVE_REWARD_FACTOR: f64 = 3.0;

/// Shared peg counts for which a rating generalises to another ending
pub const GENERALIZATION_OVERLAP: RangeInclusive<usize> = 1..=2;

/// Agent with per-action TD-error tracking and visit counting
pub struct ExtendedAgent {
    env: MastermindEnv,
    policy: EpsilonPolicy,
    beta: f64,
    qmatrix: QTable<ExtendedRecord>,
    curr_state: State,
    td_history: Vec<f64>,
    rng: StdRng,
}

impl ExtendedAgent {
    pub fn new(mut env: MastermindEnv, params: &AgentParams) -> Result<Self> {
        params.validate_extended()?;
        let policy = EpsilonPolicy::from_params(params)?;
        let curr_state = env.reset();
        let qmatrix = QTable::new(env.get_states(), env.no_pegs());

        debug!(
            "Extended agent initialised with {} states, beta {}",
            qmatrix.len(),
            params.beta
        );

        Ok(Self {
            env,
            policy,
            beta: params.beta,
            qmatrix,
            curr_state,
            td_history: Vec::new(),
            rng: seeded_rng(params.seed),
        })
    }

    pub fn env(&self) -> &MastermindEnv {
        &self.env
    }

    pub fn policy(&self) -> &EpsilonPolicy {
        &self.policy
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn qmatrix(&self) -> &QTable<ExtendedRecord> {
        &self.qmatrix
    }

    pub fn current_state(&self) -> &State {
        &self.curr_state
    }

    /// Table-wide sum of TD errors after each rated episode
    pub fn td_history(&self) -> &[f64] {
        &self.td_history
    }

    pub fn visits(&self, state: &State) -> Result<u64> {
        Ok(self.qmatrix.get(state)?.visits)
    }

    pub fn get_action(&mut self) -> Result<Peg> {
        let row = &self.qmatrix.get(&self.curr_state)?.qvalues;
        Ok(self.policy.select(&mut self.rng, row))
    }

    pub fn take_action(&mut self, action: Peg) -> Result<bool> {
        let (state, done) = self.env.step(action)?;
        self.curr_state = state;
        Ok(done)
    }

    /// Amplify negative ratings and optionally subtract the visit penalty
    pub fn shape_reward(&self, state: &State, reward: Reward, apply_penalty: bool) -> Result<Reward> {
        let mut shaped = reward;
        if shaped < 0.0 {
            shaped *= NEGATIVE_REWARD_FACTOR;
        }
        if apply_penalty {
            let visits = self.qmatrix.get(state)?.visits as f64;
            shaped -= visits.sqrt() / self.beta;
        }
        Ok(shaped)
    }

    /// Learn from the rating of the current terminal state.
    ///
    /// Visit counters of the current coverage are bumped on every call.
    pub fn update_qmatrix(&mut self, reward: Reward) -> Result<()> {
        let state = self.curr_state.clone();
        let terminal = self.env.is_terminal_state(&state)?;

        if terminal {
            let baseline = self.shape_reward(&state, reward, false)?;
            let code_len = self.env.code_len();

            let similar: Vec<(State, usize)> = self
                .qmatrix
                .iter()
                .filter(|(s, r)| s.len() == code_len && *s != &state && r.visits == 0)
                .filter_map(|(s, _)| {
                    let common = s.common_with(&state);
                    GENERALIZATION_OVERLAP
                        .contains(&common)
                        .then(|| (s.clone(), common))
                })
                .collect();

            for (other, common) in &similar {
                self.update(other, baseline * *common as f64 / code_len as f64)?;
            }

            let shaped = self.shape_reward(&state, reward, true)?;
            self.update(&state, shaped)?;

            debug!(
                "Rating {} shaped to {:.4} at {}, generalised to {} endings",
                reward,
                shaped,
                state,
                similar.len()
            );

            self.policy.decay();
            self.td_history.push(self.total_td_error());
        }

        for covered in self.env.get_coverage(&state)? {
            self.qmatrix.get_mut(&covered)?.visits += 1;
        }

        if terminal {
            self.curr_state = self.env.reset();
        }
        Ok(())
    }

    /// Propagate `reward` over the coverage of `state`, deepest first
    fn update(&mut self, state: &State, reward: Reward) -> Result<()> {
        let alpha = self.policy.alpha();
        let gamma = self.policy.gamma();

        let mut coverage = self.env.get_coverage(state)?;
        deepest_first(&mut coverage);
        let covered: HashSet<State> = coverage.iter().cloned().collect();

        for s in &coverage {
            if self.env.is_terminal_state(s)? {
                let record = self.qmatrix.get_mut(s)?;
                let td = alpha * reward - record.qvalues[0];
                for action in 0..record.qvalues.len() {
                    record.apply_td(action, td);
                }
                continue;
            }

            for successor in self.env.get_next_reachable_states(s)? {
                if !covered.contains(&successor.state) {
                    continue;
                }
                let max_next = self.qmatrix.max_qvalue(&successor.state)?;
                let record = self.qmatrix.get_mut(s)?;
                let td = alpha * gamma * max_next - record.qvalues[successor.action];
                record.apply_td(successor.action, td);
            }
        }
        Ok(())
    }

    fn total_td_error(&self) -> f64 {
        self.qmatrix.iter().map(|(_, r)| r.td_errors.sum()).sum()
    }

    /// First-index argmax of the row at `state`
    pub fn get_argmax_action(&self, state: &State) -> Result<Peg> {
        Ok(argmax(&self.qmatrix.get(state)?.qvalues))
    }

    pub fn get_optimal(&self) -> Result<State> {
        let mut optimal = self.env.get_init_state();
        while !self.env.is_terminal_state(&optimal)? {
            optimal = optimal.with(self.get_argmax_action(&optimal)?);
        }
        Ok(optimal)
    }

    pub(crate) fn reset_episode(&mut self) -> State {
        self.curr_state = self.env.reset();
        self.curr_state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hilq_core::{ExplorationMode, HilqError};

    fn params() -> AgentParams {
        AgentParams {
            alpha: 0.5,
            gamma: 0.9,
            epsilon: 0.0,
            epsilon_mode: ExplorationMode::EGreedy,
            beta: 2.0,
            seed: Some(11),
            ..AgentParams::default()
        }
    }

    fn agent(no_pegs: usize, secret: Vec<Peg>) -> ExtendedAgent {
        let env = MastermindEnv::new(no_pegs, secret).unwrap();
        ExtendedAgent::new(env, &params()).unwrap()
    }

    fn play(agent: &mut ExtendedAgent, actions: &[Peg]) {
        for &action in actions {
            agent.take_action(action).unwrap();
        }
    }

    fn q(agent: &ExtendedAgent, pegs: &[Peg]) -> Vec<f64> {
        agent
            .qmatrix()
            .get(&State::from_pegs(pegs.iter().copied()))
            .unwrap()
            .qvalues
            .to_vec()
    }

    #[test]
    fn test_rejects_non_positive_beta() {
        let env = MastermindEnv::new(4, vec![1, 2, 3]).unwrap();
        let result = ExtendedAgent::new(
            env,
            &AgentParams {
                beta: 0.0,
                ..params()
            },
        );
        assert!(matches!(result, Err(HilqError::InvalidBeta(_))));
    }

    #[test]
    fn test_shape_reward_amplifies_negative() {
        let agent = agent(4, vec![1, 2, 3]);
        let s = State::from_pegs([1, 2, 3]);
        assert_eq!(agent.shape_reward(&s, -1.0, false).unwrap(), -3.0);
        assert_eq!(agent.shape_reward(&s, 2.0, false).unwrap(), 2.0);
    }

    #[test]
    fn test_shape_reward_visit_penalty() {
        let mut agent = agent(4, vec![1, 2, 3]);
        let s = State::from_pegs([1, 2, 3]);
        agent.qmatrix.get_mut(&s).unwrap().visits = 4;
        assert_eq!(agent.shape_reward(&s, 2.0, true).unwrap(), 1.0);
        assert_eq!(agent.shape_reward(&s, -1.0, true).unwrap(), -4.0);
    }

    #[test]
    fn test_shape_reward_invalid_state() {
        let agent = agent(4, vec![1, 2, 3]);
        let bad = State::from_pegs([7]);
        assert!(matches!(
            agent.shape_reward(&bad, 1.0, true),
            Err(HilqError::InvalidState(_))
        ));
    }

    #[test]
    fn test_terminal_update_and_error_tracking() {
        let mut agent = agent(3, vec![0, 1]);
        play(&mut agent, &[0, 1]);
        agent.update_qmatrix(2.0).unwrap();

        // first visit: no penalty, terminal row becomes alpha * reward
        assert_eq!(q(&agent, &[0, 1]), vec![1.0, 1.0, 1.0]);
        let record = agent.qmatrix().get(&State::from_pegs([0, 1])).unwrap();
        assert_eq!(record.td_errors.to_vec(), vec![1.0, 1.0, 1.0]);
        assert_eq!(record.td_errors_variations.to_vec(), vec![1.0, 1.0, 1.0]);

        // parents inside the coverage take alpha * gamma * max of the child
        assert!((q(&agent, &[0])[1] - 0.45).abs() < 1e-12);
        assert!((q(&agent, &[1])[0] - 0.45).abs() < 1e-12);
        assert!((q(&agent, &[])[0] - 0.2025).abs() < 1e-12);
        assert!((q(&agent, &[])[1] - 0.2025).abs() < 1e-12);
        // only reached through the generalised ending {0, 2}
        assert!((q(&agent, &[])[2] - 0.10125).abs() < 1e-12);
        assert!(agent.current_state().is_empty());
    }

    #[test]
    fn test_generalisation_to_unvisited_similar_endings() {
        let mut agent = agent(3, vec![0, 1]);
        play(&mut agent, &[0, 1]);
        agent.update_qmatrix(2.0).unwrap();

        // {0, 0} shares one peg with {0, 1}: 0.5 * (2 * 1 / 2)
        assert_eq!(q(&agent, &[0, 0]), vec![0.5, 0.5, 0.5]);
        assert_eq!(q(&agent, &[1, 2]), vec![0.5, 0.5, 0.5]);
        // {2, 2} shares nothing
        assert_eq!(q(&agent, &[2, 2]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_visits_counted_over_coverage() {
        let mut agent = agent(3, vec![0, 1]);
        play(&mut agent, &[0, 1]);
        agent.update_qmatrix(1.0).unwrap();

        assert_eq!(agent.visits(&State::from_pegs([0, 1])).unwrap(), 1);
        assert_eq!(agent.visits(&State::from_pegs([0])).unwrap(), 1);
        assert_eq!(agent.visits(&State::empty()).unwrap(), 1);
        assert_eq!(agent.visits(&State::from_pegs([2])).unwrap(), 0);

        // counted even when the current state is not terminal
        agent.take_action(2).unwrap();
        agent.update_qmatrix(1.0).unwrap();
        assert_eq!(agent.visits(&State::from_pegs([2])).unwrap(), 1);
        assert_eq!(agent.visits(&State::empty()).unwrap(), 2);
        assert_eq!(agent.current_state(), &State::from_pegs([2]));
        assert_eq!(agent.td_history().len(), 1);
    }

    #[test]
    fn test_repeated_rating_is_penalised() {
        let mut agent = agent(3, vec![0, 1]);
        play(&mut agent, &[0, 1]);
        agent.update_qmatrix(2.0).unwrap();
        play(&mut agent, &[1, 0]);
        agent.update_qmatrix(2.0).unwrap();

        // second rating shaped to 2 - sqrt(1) / 2
        assert_eq!(q(&agent, &[0, 1]), vec![0.75, 0.75, 0.75]);
        let record = agent.qmatrix().get(&State::from_pegs([0, 1])).unwrap();
        assert!((record.td_errors[0] - 0.25).abs() < 1e-12);
        assert!((record.td_errors_variations[0] - 0.75).abs() < 1e-12);
        assert_eq!(agent.td_history().len(), 2);
    }

    #[test]
    fn test_optimal_and_argmax() {
        let mut agent = agent(3, vec![1, 2]);
        play(&mut agent, &[2, 1]);
        agent.update_qmatrix(3.0).unwrap();
        assert_eq!(agent.get_argmax_action(&State::from_pegs([2])).unwrap(), 1);
        assert_eq!(agent.get_optimal().unwrap(), State::from_pegs([1, 2]));
    }
}
