//! Deathgame CLI - run, watch and batch arena games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Deathgame - leagues of bytecode units fighting over a grid
#[derive(Parser, Debug)]
#[command(name = "deathgame")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single game without a display
    Run {
        /// Configuration file
        #[arg(required = true)]
        config: PathBuf,

        /// Additional configuration files overlaid in order
        #[arg(short = 'o', long = "override")]
        overrides: Vec<PathBuf>,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Delay between moves in milliseconds (default: 0)
        #[arg(short, long, default_value = "0")]
        delay: u64,

        /// Maximum moves (default: from configuration)
        #[arg(short, long)]
        max_moves: Option<u64>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Interactive TUI to watch a game in real-time
    Watch {
        /// Configuration file
        #[arg(required = true)]
        config: PathBuf,

        /// Additional configuration files overlaid in order
        #[arg(short = 'o', long = "override")]
        overrides: Vec<PathBuf>,

        /// Delay between moves in milliseconds (default: from configuration)
        #[arg(short, long)]
        delay: Option<u64>,
    },

    /// Assemble programs and report syntax errors
    Validate {
        /// Program files
        #[arg(required = true)]
        programs: Vec<PathBuf>,

        /// Print the disassembly of each valid program
        #[arg(short, long)]
        listing: bool,
    },

    /// Run many headless games in parallel and aggregate statistics
    Tournament {
        /// Configuration file
        #[arg(required = true)]
        config: PathBuf,

        /// Number of games to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum moves per game (default: from configuration)
        #[arg(short, long)]
        max_moves: Option<u64>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let args = Args::parse();

    // The viewer owns the terminal, so it stays quiet unless asked.
    let default_directive = match args.command {
        Commands::Watch { .. } => "off",
        Commands::Tournament { .. } => "deathgame=warn",
        _ => "deathgame=info",
    };
    init_tracing(default_directive);

    let result = match args.command {
        Commands::Run {
            config,
            overrides,
            seed,
            delay,
            max_moves,
            format,
        } => cli::run::execute(&config, &overrides, seed, delay, max_moves, format),

        Commands::Watch {
            config,
            overrides,
            delay,
        } => cli::watch::execute(&config, &overrides, delay),

        Commands::Validate { programs, listing } => cli::validate::execute(&programs, listing),

        Commands::Tournament {
            config,
            games,
            seed,
            threads,
            max_moves,
            format,
            progress,
        } => cli::tournament::execute(&config, games, seed, threads, max_moves, format, progress),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
