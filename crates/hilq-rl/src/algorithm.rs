//! Learner trait and its implementations for both agent variants

use hilq_core::{AgentParams, AgentVariant, Peg, Result, Reward, TableExport};

use crate::agent::{ExtendedAgent, SimpleAgent};
use crate::environment::MastermindEnv;
use crate::state::State;

/// Common interface of the agents, used by the episode engine
pub trait Learner: Send {
    /// Algorithm name
    fn name(&self) -> &str;

    fn variant(&self) -> AgentVariant;

    fn env(&self) -> &MastermindEnv;

    fn current_state(&self) -> &State;

    fn epsilon(&self) -> f64;

    /// Choose the next action at the current state
    fn select_action(&mut self) -> Result<Peg>;

    /// Play `action`; true when the attempt is complete
    fn take_action(&mut self, action: Peg) -> Result<bool>;

    /// Learn from the rating of the current terminal state
    fn update(&mut self, reward: Reward) -> Result<()>;

    /// Abandon the running episode
    fn reset_episode(&mut self) -> State;

    /// Greedy attempt under the learned values
    fn optimal(&self) -> Result<State>;

    fn export_table(&self) -> TableExport;

    /// TD-error diagnostics; empty for variants that do not track them
    fn td_history(&self) -> &[f64] {
        &[]
    }

    /// Get algorithm parameters as JSON
    fn get_params(&self) -> serde_json::Value;
}

impl Learner for SimpleAgent {
    fn name(&self) -> &str {
        "simple_q"
    }

    fn variant(&self) -> AgentVariant {
        AgentVariant::Simple
    }

    fn env(&self) -> &MastermindEnv {
        SimpleAgent::env(self)
    }

    fn current_state(&self) -> &State {
        SimpleAgent::current_state(self)
    }

    fn epsilon(&self) -> f64 {
        self.policy().epsilon()
    }

    fn select_action(&mut self) -> Result<Peg> {
        self.get_action_from_qmatrix()
    }

    fn take_action(&mut self, action: Peg) -> Result<bool> {
        SimpleAgent::take_action(self, action)
    }

    fn update(&mut self, reward: Reward) -> Result<()> {
        self.update_qmatrix(reward)
    }

    fn reset_episode(&mut self) -> State {
        SimpleAgent::reset_episode(self)
    }

    fn optimal(&self) -> Result<State> {
        self.get_optimal()
    }

    fn export_table(&self) -> TableExport {
        self.qmatrix().export(AgentVariant::Simple)
    }

    fn get_params(&self) -> serde_json::Value {
        let policy = self.policy();
        serde_json::json!({
            "alpha": policy.alpha(),
            "gamma": policy.gamma(),
            "epsilon": policy.epsilon(),
            "epsilon_mode": policy.mode().as_str(),
            "epsilon_decay": policy.epsilon_decay(),
            "epsilon_low": policy.epsilon_low(),
            "q_table_size": self.qmatrix().len()
        })
    }
}

impl Learner for ExtendedAgent {
    fn name(&self) -> &str {
        "extended_q"
    }

    fn variant(&self) -> AgentVariant {
        AgentVariant::Extended
    }

    fn env(&self) -> &MastermindEnv {
        ExtendedAgent::env(self)
    }

    fn current_state(&self) -> &State {
        ExtendedAgent::current_state(self)
    }

    fn epsilon(&self) -> f64 {
        self.policy().epsilon()
    }

    fn select_action(&mut self) -> Result<Peg> {
        self.get_action()
    }

    fn take_action(&mut self, action: Peg) -> Result<bool> {
        ExtendedAgent::take_action(self, action)
    }

    fn update(&mut self, reward: Reward) -> Result<()> {
        self.update_qmatrix(reward)
    }

    fn reset_episode(&mut self) -> State {
        ExtendedAgent::reset_episode(self)
    }

    fn optimal(&self) -> Result<State> {
        self.get_optimal()
    }

    fn export_table(&self) -> TableExport {
        self.qmatrix().export(AgentVariant::Extended)
    }

    fn td_history(&self) -> &[f64] {
        ExtendedAgent::td_history(self)
    }

    fn get_params(&self) -> serde_json::Value {
        let policy = self.policy();
        serde_json::json!({
            "alpha": policy.alpha(),
            "gamma": policy.gamma(),
            "epsilon": policy.epsilon(),
            "epsilon_mode": policy.mode().as_str(),
            "epsilon_decay": policy.epsilon_decay(),
            "epsilon_low": policy.epsilon_low(),
            "beta": self.beta(),
            "q_table_size": self.qmatrix().len()
        })
    }
}

/// Build the agent for `variant` bound to `env`
pub fn build_learner(
    variant: AgentVariant,
    env: MastermindEnv,
    params: &AgentParams,
) -> Result<Box<dyn Learner>> {
    Ok(match variant {
        AgentVariant::Simple => Box::new(SimpleAgent::new(env, params)?),
        AgentVariant::Extended => Box::new(ExtendedAgent::new(env, params)?),
    })
}
