//! Mastermind environment
//!
//! A deterministic transition function over multisets of pegs. The
//! environment knows nothing about learning; it only enumerates states,
//! tells which states lead where and whether the secret was found.

use tracing::debug;

use hilq_core::{HilqError, Peg, Result};

use crate::state::State;

/// One-step successor of a state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Successor {
    pub action: Peg,
    pub state: State,
}

/// Mastermind game environment
#[derive(Debug, Clone)]
pub struct MastermindEnv {
    no_pegs: usize,
    secret: Vec<Peg>,
    attempt: State,
}

impl MastermindEnv {
    /// Create an environment for `secret` over `no_pegs` peg values
    pub fn new(no_pegs: usize, secret: Vec<Peg>) -> Result<Self> {
        if no_pegs == 0 {
            return Err(HilqError::InvalidPegCount(no_pegs));
        }
        if secret.is_empty() {
            return Err(HilqError::InvalidSecret);
        }
        if let Some(&peg) = secret.iter().find(|&&peg| peg >= no_pegs) {
            return Err(HilqError::InvalidAction(peg));
        }

        debug!(
            "Mastermind environment created: {} pegs, code length {}",
            no_pegs,
            secret.len()
        );

        Ok(Self {
            no_pegs,
            secret,
            attempt: State::empty(),
        })
    }

    /// Size of the action space
    pub fn no_pegs(&self) -> usize {
        self.no_pegs
    }

    pub fn code_len(&self) -> usize {
        self.secret.len()
    }

    pub fn secret(&self) -> &[Peg] {
        &self.secret
    }

    /// Current state
    pub fn attempt(&self) -> &State {
        &self.attempt
    }

    /// Append `action` to the current attempt
    pub fn step(&mut self, action: Peg) -> Result<(State, bool)> {
        if action >= self.no_pegs {
            return Err(HilqError::InvalidAction(action));
        }
        self.attempt = self.attempt.with(action);
        Ok((self.attempt.clone(), self.is_done()))
    }

    /// Back to the empty attempt
    pub fn reset(&mut self) -> State {
        self.attempt = State::empty();
        self.attempt.clone()
    }

    pub fn render(&self) -> Result<()> {
        Err(HilqError::UnsupportedOperation("render"))
    }

    /// Every state of size 0 to `code_len`, as combinations with replacement.
    ///
    /// Sizes ascend; within a size states are in lexicographic order.
    pub fn get_states(&self) -> Vec<State> {
        let mut states = Vec::new();
        for k in 0..=self.code_len() {
            let mut combo = vec![0; k];
            loop {
                states.push(State::from_pegs(combo.iter().copied()));

                // rightmost position that can still be incremented
                let Some(i) = combo.iter().rposition(|&p| p + 1 < self.no_pegs) else {
                    break;
                };
                let next = combo[i] + 1;
                for slot in &mut combo[i..] {
                    *slot = next;
                }
            }
        }
        states
    }

    /// Number of states `get_states` enumerates, `C(no_pegs + code_len, code_len)`
    pub fn state_count(&self) -> usize {
        let (n, k) = (self.no_pegs + self.code_len(), self.code_len());
        (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
    }

    /// Whether `state` belongs to the enumerated state space
    pub fn is_valid_state(&self, state: &State) -> bool {
        state.len() <= self.code_len() && state.pegs().iter().all(|&p| p < self.no_pegs)
    }

    fn check_state(&self, state: &State) -> Result<()> {
        if self.is_valid_state(state) {
            Ok(())
        } else {
            Err(HilqError::InvalidState(state.key()))
        }
    }

    /// `state` together with every state on some path from the initial state to it
    pub fn get_coverage(&self, state: &State) -> Result<Vec<State>> {
        self.check_state(state)?;
        Ok(state.sub_multisets())
    }

    /// States reachable from `state` with a single action; empty when terminal
    pub fn get_next_reachable_states(&self, state: &State) -> Result<Vec<Successor>> {
        if self.is_terminal_state(state)? {
            return Ok(Vec::new());
        }
        Ok((0..self.no_pegs)
            .map(|action| Successor {
                action,
                state: state.with(action),
            })
            .collect())
    }

    pub fn get_init_state(&self) -> State {
        State::empty()
    }

    pub fn is_terminal_state(&self, state: &State) -> Result<bool> {
        self.check_state(state)?;
        Ok(state.len() == self.code_len())
    }

    pub fn is_done(&self) -> bool {
        self.attempt.len() == self.code_len()
    }

    /// Whether the attempt holds exactly the secret's pegs, in any order
    pub fn is_guessed(&self) -> bool {
        let mut secret = self.secret.clone();
        secret.sort_unstable();
        self.attempt.pegs() == secret.as_slice()
    }
}
