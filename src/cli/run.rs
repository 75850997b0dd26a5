//! Run command implementation.

use super::output::{format_text, render_board};
use super::{load_config, CliError, OutputFormat};
use deathgame::display::{NullSink, SpriteSheet};
use deathgame::loader::FsLoader;
use deathgame::sim::{self, build_world_with_rng, Shutdown, SimConfig, SimResult};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// JSON-serializable run result.
#[derive(Debug, Serialize)]
struct JsonRunResult<'a> {
    /// Seed the world was built with, if one was given.
    seed: Option<u64>,
    #[serde(flatten)]
    result: &'a SimResult,
    /// Final board, one string per row.
    board: Vec<String>,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the configuration or a program fails to load.
pub(crate) fn execute(
    config_path: &Path,
    overrides: &[PathBuf],
    seed: Option<u64>,
    delay: u64,
    max_moves: Option<u64>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let config = load_config(config_path, overrides)?;

    let rng = seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
    let mut sprites = SpriteSheet::new();
    let mut world = build_world_with_rng(
        &config,
        &FsLoader::new(),
        &mut sprites,
        Box::new(NullSink),
        rng,
    )?;

    let sim_config = SimConfig {
        move_delay: Duration::from_millis(delay),
        max_moves: max_moves.unwrap_or(config.max_moves),
    };
    let result = sim::run(&mut world, &sim_config, &Shutdown::new());

    match format {
        OutputFormat::Text => {
            print!("{}", format_text(&result, &world));
        }
        OutputFormat::Json => {
            let json_result = JsonRunResult {
                seed,
                result: &result,
                board: render_board(&world).lines().map(str::to_string).collect(),
            };
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
