use std::path::PathBuf;

use clap::Parser;

use septica_sim::config::{ResolvedOutputs, SimConfig};
use septica_sim::logging::init_logging;
use septica_sim::runner::SimulationRunner;

/// Batch simulator for Septica policies.
#[derive(Debug, Parser)]
#[command(
    name = "septica-sim",
    author,
    version,
    about = "Deterministic Septica self-play harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "sim/sim.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for shuffles and policies.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the table size (2, 3 or 4).
    #[arg(long, value_name = "COUNT")]
    players: Option<u8>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = SimConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(players) = cli.players {
        config.games.players = players;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let players = config.games.players;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({games} games, {players} players)",
        if agent_count == 1 { "" } else { "s" }
    );

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = SimulationRunner::new(config, outputs)?;
    let summary = runner.run()?;

    println!(
        "Simulation complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    for agent in &summary.report.agents {
        println!(
            "  {:<12} avg {:.2} points, {} wins, {} ties over {} seats",
            agent.name, agent.avg_points, agent.wins, agent.ties, agent.seats
        );
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
