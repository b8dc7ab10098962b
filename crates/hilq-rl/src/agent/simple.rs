//! Simple variant: textbook tabular backups seeded by one rating per episode

use rand::rngs::StdRng;
use tracing::debug;

use hilq_core::{AgentParams, Peg, Result, Reward};

use super::{deepest_first, seeded_rng};
use crate::environment::{MastermindEnv, Successor};
use crate::policy::EpsilonPolicy;
use crate::qtable::{argmax, QTable, SimpleRecord};
use crate::state::State;

/// Agent storing a plain Q-value per state and action
pub struct SimpleAgent {
    env: MastermindEnv,
    policy: EpsilonPolicy,
    qmatrix: QTable<SimpleRecord>,
    curr_state: State,
    rng: StdRng,
}

impl SimpleAgent {
    /// Bind an agent to `env`, resetting it and building the full table
    pub fn new(mut env: MastermindEnv, params: &AgentParams) -> Result<Self> {
        let policy = EpsilonPolicy::from_params(params)?;
        let curr_state = env.reset();
        let qmatrix = QTable::new(env.get_states(), env.no_pegs());

        debug!("Simple agent initialised with {} states", qmatrix.len());

        Ok(Self {
            env,
            policy,
            qmatrix,
            curr_state,
            rng: seeded_rng(params.seed),
        })
    }

    pub fn env(&self) -> &MastermindEnv {
        &self.env
    }

    pub fn policy(&self) -> &EpsilonPolicy {
        &self.policy
    }

    pub fn qmatrix(&self) -> &QTable<SimpleRecord> {
        &self.qmatrix
    }

    pub fn current_state(&self) -> &State {
        &self.curr_state
    }

    /// Epsilon-greedy choice at the current state, ties broken at random
    pub fn get_action_from_qmatrix(&mut self) -> Result<Peg> {
        let row = &self.qmatrix.get(&self.curr_state)?.qvalues;
        Ok(self.policy.select(&mut self.rng, row))
    }

    pub fn take_action(&mut self, action: Peg) -> Result<bool> {
        let (state, done) = self.env.step(action)?;
        self.curr_state = state;
        Ok(done)
    }

    /// Propagate `reward` backwards from the current terminal state.
    ///
    /// Does nothing while the episode is still running.
    pub fn update_qmatrix(&mut self, reward: Reward) -> Result<()> {
        if !self.env.is_terminal_state(&self.curr_state)? {
            return Ok(());
        }

        let alpha = self.policy.alpha();
        let gamma = self.policy.gamma();
        let terminal = self.curr_state.clone();

        // every slot of the terminal row moves towards the rating
        self.qmatrix
            .get_mut(&terminal)?
            .qvalues
            .mapv_inplace(|q| q + alpha * (reward - q));

        let mut coverage = self.env.get_coverage(&terminal)?;
        deepest_first(&mut coverage);

        for covered in &coverage {
            for best in self.get_best_next_reachable_states(covered)? {
                let target = gamma * self.qmatrix.max_qvalue(&best.state)?;
                let q = &mut self.qmatrix.get_mut(covered)?.qvalues[best.action];
                *q += alpha * (target - *q);
            }
        }

        debug!(
            "Rating {} propagated from {} over {} states",
            reward,
            terminal,
            coverage.len()
        );

        self.policy.decay();
        self.curr_state = self.env.reset();
        Ok(())
    }

    pub fn get_max_qvalue(&self, state: &State) -> Result<f64> {
        self.qmatrix.max_qvalue(state)
    }

    /// Successors of `state` tied for the highest value
    pub fn get_best_next_reachable_states(&self, state: &State) -> Result<Vec<Successor>> {
        let mut best: Vec<Successor> = Vec::new();
        let mut best_value = f64::NEG_INFINITY;

        for successor in self.env.get_next_reachable_states(state)? {
            let value = self.qmatrix.max_qvalue(&successor.state)?;
            if best.is_empty() || value > best_value {
                best.clear();
                best_value = value;
                best.push(successor);
            } else if value == best_value {
                best.push(successor);
            }
        }
        Ok(best)
    }

    /// Greedy roll-out from the initial state
    pub fn get_optimal(&self) -> Result<State> {
        let mut optimal = self.env.get_init_state();
        while !self.env.is_terminal_state(&optimal)? {
            let action = argmax(&self.qmatrix.get(&optimal)?.qvalues);
            optimal = optimal.with(action);
        }
        Ok(optimal)
    }

    pub(crate) fn reset_episode(&mut self) -> State {
        self.curr_state = self.env.reset();
        self.curr_state.clone()
    }
}
