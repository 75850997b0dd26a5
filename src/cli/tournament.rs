//! Tournament command implementation.

use super::output::{
    format_tournament_csv, format_tournament_text, JsonTournamentResult, TournamentStats,
};
use super::{CliError, TournamentFormat, load_config};
use deathgame::config::Config;
use deathgame::display::{NullSink, SpriteSheet};
use deathgame::loader::FsLoader;
use deathgame::sim::{self, build_world_with_rng, Shutdown, SimConfig};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::warn;

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the configuration or a program fails to load.
#[allow(clippy::too_many_arguments, clippy::cast_precision_loss)]
pub(crate) fn execute(
    config_path: &Path,
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    max_moves: Option<u64>,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    let config = load_config(config_path, &[])?;
    let loader = FsLoader::new();

    // Fail fast on bad programs; later loads hit the cache.
    build_world_with_rng(
        &config,
        &loader,
        &mut SpriteSheet::new(),
        Box::new(NullSink),
        SmallRng::seed_from_u64(0),
    )?;

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed.unwrap_or_else(rand::random);

    let sim_config = SimConfig {
        move_delay: Duration::ZERO,
        max_moves: max_moves.unwrap_or(config.max_moves),
    };

    let pb = if progress {
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})",
            )
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        Some(ProgressBar::new(games).with_style(style))
    } else {
        None
    };

    let start = Instant::now();
    let num_leagues = config.leagues.len();

    // Each thread accumulates into its own TournamentStats, merged at the end
    let stats = (0..games)
        .into_par_iter()
        .fold(
            || TournamentStats::new(num_leagues),
            |mut local_stats, i| {
                let game_seed = base_seed.wrapping_add(i);
                play_game(&config, &loader, &sim_config, game_seed, &mut local_stats);
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local_stats
            },
        )
        .reduce(
            || TournamentStats::new(num_leagues),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    let names: Vec<String> = config.leagues.iter().map(|l| l.name.clone()).collect();
    match format {
        TournamentFormat::Text => {
            println!();
            println!("Seed: {base_seed}");
            print!("{}", format_tournament_text(&stats, &names));
            println!();
            println!(
                "Duration: {:.2}s ({:.0} games/sec)",
                duration.as_secs_f64(),
                games_per_sec
            );
        }
        TournamentFormat::Json => {
            let json_result = JsonTournamentResult::from_stats(&stats, &names);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats, &names));
        }
    }

    Ok(())
}

/// Build and run one headless game, recording its result in `stats`.
fn play_game(
    config: &Config,
    loader: &FsLoader,
    sim_config: &SimConfig,
    seed: u64,
    stats: &mut TournamentStats,
) {
    let world = build_world_with_rng(
        config,
        loader,
        &mut SpriteSheet::new(),
        Box::new(NullSink),
        SmallRng::seed_from_u64(seed),
    );
    match world {
        Ok(mut world) => {
            let result = sim::run(&mut world, sim_config, &Shutdown::new());
            stats.add_result(&result);
        }
        Err(e) => {
            warn!(seed, error = %e, "game setup failed");
            stats.add_failure();
        }
    }
}
