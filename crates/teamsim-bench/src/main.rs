use std::path::PathBuf;

use clap::Parser;

mod logging;
mod scenario;

/// Scripted-battle harness for the opponent team inference engine.
#[derive(Debug, Parser)]
#[command(
    name = "teamsim-bench",
    author,
    version,
    about = "Deterministic opponent-team inference harness"
)]
struct Cli {
    /// Number of hypothesis teams to maintain.
    #[arg(long, value_name = "COUNT", default_value_t = 64)]
    particles: usize,

    /// RNG seed for hypothesis construction and sampling.
    #[arg(long, value_name = "SEED", default_value_t = 7)]
    seed: u64,

    /// Directory for the structured JSON log; logging is disabled when absent.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logging_guard = logging::init_logging(cli.log_dir.as_deref())?;

    let summary = scenario::run(cli.particles, cli.seed)?;
    println!("{summary}");
    Ok(())
}
