//! Building a world from configuration.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::config::Config;
use crate::display::{PresentationSink, SpriteSheet};
use crate::error::{ConfigError, SetupError};
use crate::game::{Board, Rules, UnitKind, World};
use crate::loader::ProgramLoader;

/// Build a world from `config` with an OS-seeded random generator.
///
/// Loads every kind's program through `loader`, registers sprites in
/// `sprites`, and places each league's initial units on random free cells.
///
/// # Errors
///
/// Returns an error if a program fails to load or the board cannot hold
/// the requested units.
pub fn build_world(
    config: &Config,
    loader: &dyn ProgramLoader,
    sprites: &mut SpriteSheet,
    sink: Box<dyn PresentationSink>,
) -> Result<World, SetupError> {
    build_world_with_rng(config, loader, sprites, sink, SmallRng::from_os_rng())
}

/// Like [`build_world`], with an explicit random generator.
///
/// # Errors
///
/// See [`build_world`].
pub fn build_world_with_rng(
    config: &Config,
    loader: &dyn ProgramLoader,
    sprites: &mut SpriteSheet,
    sink: Box<dyn PresentationSink>,
    rng: SmallRng,
) -> Result<World, SetupError> {
    let board = Board::new(config.columns, config.rows).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "board must be at least 1x1, got {}x{}",
            config.columns, config.rows
        ))
    })?;
    if config.initial_units() > board.area() {
        return Err(ConfigError::Invalid("too many units requested".into()).into());
    }

    let rules = Rules {
        newborn_weight: config.newborn_weight,
    };
    let mut world = World::with_rng(board, rules, sink, rng);

    let mut leagues = Vec::with_capacity(config.leagues.len());
    for league in &config.leagues {
        let start = league.start_kind_index().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "league `{}`: start kind `{}` is not among its unit kinds",
                league.name, league.start_kind
            ))
        })?;

        let mut kinds = Vec::with_capacity(league.kinds.len());
        for kind in &league.kinds {
            let program = loader
                .load(&kind.exec)
                .map_err(|source| SetupError::Program {
                    league: league.name.clone(),
                    kind: kind.name.clone(),
                    source,
                })?;
            debug!(
                league = %league.name,
                kind = %kind.name,
                words = program.len(),
                "program loaded"
            );
            kinds.push(UnitKind {
                name: kind.name.clone(),
                sprite: sprites.register(kind.sprite.clone()),
                program,
            });
        }

        leagues.push((world.add_league(league.name.clone(), kinds, start), start));
    }

    for (&(league, start), league_config) in leagues.iter().zip(&config.leagues) {
        for _ in 0..config.units_per_league {
            let coord = world
                .random_free_cell()
                .ok_or_else(|| ConfigError::Invalid("too many units requested".into()))?;
            let direction = world.random_direction();
            world
                .spawn_unit(league, start, coord, direction, config.unit_weight)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "cannot place units of league `{}` with weight {}",
                        league_config.name, config.unit_weight
                    ))
                })?;
        }
    }
    world.randomize_cursor();

    info!(
        leagues = config.leagues.len(),
        units = config.initial_units(),
        width = config.columns,
        height = config.rows,
        "world ready"
    );
    Ok(world)
}
