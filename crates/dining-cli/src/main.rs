//! Dining CLI - run philosophers against the dining monitor

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dining_table::{Dinner, TableConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dining")]
#[command(about = "Dining philosophers with bounded starvation and a talk privilege")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a dinner and print the report
    Run {
        /// Configuration file path (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of philosophers
        #[arg(short, long)]
        philosophers: Option<usize>,
        /// Rounds per philosopher
        #[arg(short, long)]
        rounds: Option<usize>,
        /// Denials tolerated before a philosopher is starving
        #[arg(long)]
        starve_limit: Option<u32>,
        /// Seed for pauses and talk decisions
        #[arg(long)]
        seed: Option<u64>,
        /// Interrupt everyone after this many milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check configuration validity
    Check {
        /// Configuration file path (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the default configuration
    Config,
}

fn load(path: Option<&PathBuf>) -> anyhow::Result<TableConfig> {
    match path {
        Some(path) => TableConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(TableConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Some(Commands::Run {
            config,
            philosophers,
            rounds,
            starve_limit,
            seed,
            deadline_ms,
            json,
        }) => {
            let mut table = load(config.as_ref())?;
            if let Some(n) = philosophers {
                table.philosophers = n;
            }
            if let Some(r) = rounds {
                table.dinner.rounds = r;
            }
            if let Some(limit) = starve_limit {
                table.monitor = table.monitor.with_starve_limit(limit);
            }
            if seed.is_some() {
                table.dinner.seed = seed;
            }
            if deadline_ms.is_some() {
                table.dinner.deadline_ms = deadline_ms;
            }

            let report = Dinner::new(table)?.run()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            if let Err(violation) = report.final_status.check() {
                anyhow::bail!("monitor left in an invalid state: {violation}");
            }
        }
        Some(Commands::Check { config }) => {
            let table = load(Some(&config))?;
            println!(
                "Config OK: {} philosophers, {} rounds, starve limit {}",
                table.philosophers, table.dinner.rounds, table.monitor.starve_limit
            );
        }
        Some(Commands::Config) => {
            println!("{}", TableConfig::default().to_json()?);
        }
        None => {
            println!("dining v{} - Use --help for commands", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
