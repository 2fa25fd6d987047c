//! duel_sim - Run duels between two rosters from the command line
//!
//! A single duel prints its log; `--batch N` runs N seeded duels in parallel
//! and prints win rates instead.

mod simulation;

use clap::Parser;
use duel_core::{load_ruleset, Duel, DuelConfig, Roster, RngDice, Ruleset, TieRule};
use simulation::{run_batch, SimError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Tabletop duel simulator
#[derive(Parser, Debug)]
#[command(name = "duel_sim")]
#[command(about = "Resolve duels between two rosters, once or in bulk")]
struct Args {
    /// Roster file for Side A (TOML or JSON)
    #[arg(long)]
    side_a: PathBuf,

    /// Roster file for Side B (TOML or JSON)
    #[arg(long)]
    side_b: PathBuf,

    /// Weapon mode: live or blunted
    #[arg(long, default_value = "live")]
    weapons: String,

    /// Duel type: melee, ranged or mixed
    #[arg(long, default_value = "melee")]
    duel: String,

    /// Round cap before the duel is called a draw
    #[arg(long, default_value_t = duel_core::duel::DEFAULT_MAX_ROUNDS)]
    rounds: u32,

    /// How equal initiative is handled: stalemate or speed-then-side
    #[arg(long, default_value = "stalemate")]
    ties: String,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Ruleset file overriding the built-in rules
    #[arg(long)]
    ruleset: Option<PathBuf>,

    /// Run this many duels and print statistics
    #[arg(long)]
    batch: Option<u64>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("duel_sim=info,duel_core=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let ruleset = match &args.ruleset {
        Some(path) => load_ruleset(path)?,
        None => Ruleset::default(),
    };
    let side_a = Roster::load(&args.side_a)?;
    let side_b = Roster::load(&args.side_b)?;

    let tie_rule = args
        .ties
        .parse::<TieRule>()
        .map_err(|other| SimError::InvalidArgument(format!("unknown tie rule '{other}'")))?;
    let config = DuelConfig::parse(&args.weapons, &args.duel)?
        .with_max_rounds(args.rounds)
        .with_tie_rule(tie_rule);

    let duel = Duel::from_records(&side_a.combatants, &side_b.combatants, config, ruleset)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, "rosters loaded");

    match args.batch {
        Some(0) => Err(SimError::InvalidArgument(
            "batch size must be at least 1".to_string(),
        )),
        Some(runs) => {
            let summary = run_batch(&duel, runs, seed);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
            Ok(())
        }
        None => {
            let report = duel.run(&mut RngDice::seeded(seed));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in &report.lines {
                    println!("{line}");
                }
            }
            Ok(())
        }
    }
}
