//! State space inspection

use anyhow::Result;
use clap::Args;

use hilq_core::Peg;
use hilq_rl::{MastermindEnv, State};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatesArgs {
    /// Number of distinct peg values
    #[arg(long)]
    pub no_pegs: Option<usize>,

    /// Code length
    #[arg(long)]
    pub code_len: Option<usize>,

    /// Show the coverage and successors of this state, e.g. `1,2`
    #[arg(long, value_delimiter = ',')]
    pub state: Option<Vec<Peg>>,

    /// Only print the number of states
    #[arg(long)]
    pub count: bool,
}

pub async fn run(args: StatesArgs, config: Config) -> Result<()> {
    let no_pegs = args.no_pegs.unwrap_or(config.game.no_pegs);
    let code_len = args.code_len.unwrap_or(config.game.code_len);

    // the secret does not influence the state space
    let env = MastermindEnv::new(no_pegs, vec![0; code_len.max(1)])?;

    if let Some(pegs) = args.state {
        let state = State::from_pegs(pegs);
        let coverage = env.get_coverage(&state)?;
        println!("State {} (terminal: {})", state, env.is_terminal_state(&state)?);
        println!("\nCoverage ({}):", coverage.len());
        for covered in &coverage {
            println!("  {covered}");
        }
        let successors = env.get_next_reachable_states(&state)?;
        println!("\nSuccessors ({}):", successors.len());
        for successor in successors {
            println!("  {} -> {}", successor.action, successor.state);
        }
        return Ok(());
    }

    println!(
        "{} states for {} pegs and code length {}",
        env.state_count(),
        no_pegs,
        env.code_len()
    );
    if !args.count {
        for state in env.get_states() {
            println!("  {state}");
        }
    }
    Ok(())
}
