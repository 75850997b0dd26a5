//! Simulation runner.
//!
//! Drives the world turn loop until one league is left, the move ceiling is
//! reached, or a stop is requested. The loop runs on its own thread while a
//! presenter reads the shared screen buffer on another.

mod setup;

pub use setup::{build_world, build_world_with_rng};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::display::Status;
use crate::game::{assert_invariants, StepOutcome, World};

/// Moves between status updates when there is no delay to pace the game.
const STATUS_INTERVAL: u64 = 256;

/// Pacing and limits for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Pause after each move.
    pub move_delay: Duration,
    /// Stop after this many moves.
    pub max_moves: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            move_delay: Duration::from_millis(250),
            max_moves: 1_000_000,
        }
    }
}

impl From<&Config> for SimConfig {
    fn from(config: &Config) -> Self {
        Self {
            move_delay: config.move_delay,
            max_moves: config.max_moves,
        }
    }
}

/// Cooperative shutdown flags shared by the simulation and the presenter.
#[derive(Debug, Default)]
pub struct Shutdown {
    finished: AtomicBool,
    stop_requested: AtomicBool,
}

impl Shutdown {
    /// Fresh flags, both clear.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Ask the simulation to stop at its next move boundary.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Mark the simulation as done.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    /// Whether the simulation has reached a terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Exactly one league has living units.
    LastLeague,
    /// No league has living units.
    Extinction,
    /// The move ceiling was reached.
    MoveLimit,
    /// A stop was requested.
    Interrupted,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Outcome::LastLeague => "last league standing",
            Outcome::Extinction => "extinction",
            Outcome::MoveLimit => "move limit reached",
            Outcome::Interrupted => "interrupted",
        })
    }
}

/// Final result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SimResult {
    /// Why the run ended.
    pub outcome: Outcome,
    /// Moves made.
    pub moves: u64,
    /// The surviving league, when exactly one is left.
    pub winner: Option<String>,
    /// League names in retirement order.
    pub retired: Vec<String>,
    /// Final per-league status.
    pub status: Status,
}

impl SimResult {
    /// Names of leagues that still have living units.
    #[must_use]
    pub fn survivors(&self) -> Vec<&str> {
        self.status
            .leagues
            .iter()
            .filter(|l| l.population > 0)
            .map(|l| l.name.as_str())
            .collect()
    }
}

/// Run `world` to a terminal state.
///
/// Polls `shutdown` between moves and sets its `finished` flag on return.
pub fn run(world: &mut World, config: &SimConfig, shutdown: &Shutdown) -> SimResult {
    world.publish_status();

    let outcome = loop {
        if shutdown.is_stop_requested() {
            break Outcome::Interrupted;
        }
        if world.moves() >= config.max_moves {
            break Outcome::MoveLimit;
        }

        match world.step() {
            StepOutcome::Finished => {
                let alive = world
                    .leagues()
                    .iter()
                    .any(|l| l.population(world.arena()) > 0);
                break if alive {
                    Outcome::LastLeague
                } else {
                    Outcome::Extinction
                };
            }
            StepOutcome::Moved { .. } => {
                let paced = !config.move_delay.is_zero();
                if paced || world.moves() % STATUS_INTERVAL == 0 {
                    world.publish_status();
                }
                if paced && world.moves() < config.max_moves {
                    thread::sleep(config.move_delay);
                }
            }
        }
    };

    assert_invariants(world);
    world.publish_status();
    let status = world.status();
    let winner = match outcome {
        Outcome::LastLeague => world.leagues().first().map(|l| l.name().to_string()),
        _ => None,
    };
    let result = SimResult {
        outcome,
        moves: world.moves(),
        winner,
        retired: world.retired().iter().map(|l| l.name().to_string()).collect(),
        status,
    };

    info!(
        outcome = %result.outcome,
        moves = result.moves,
        winner = result.winner.as_deref().unwrap_or("-"),
        "game over"
    );
    shutdown.finish();
    result
}

/// Run `world` on a dedicated thread named `simulation`.
///
/// The thread hands the world back with the result when it finishes.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn(
    mut world: World,
    config: SimConfig,
    shutdown: Arc<Shutdown>,
) -> std::io::Result<JoinHandle<(World, SimResult)>> {
    thread::Builder::new()
        .name("simulation".into())
        .spawn(move || {
            let result = run(&mut world, &config, &shutdown);
            (world, result)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{world_with, Placement};
    use crate::game::{check_invariants, Direction};

    fn fast(max_moves: u64) -> SimConfig {
        SimConfig {
            move_delay: Duration::ZERO,
            max_moves,
        }
    }

    #[test]
    fn test_last_league_standing() {
        // A striker next to a weak, idle enemy.
        let (mut world, _) = world_with(
            4,
            4,
            &[
                ("str", &[Placement::new(1, 1, Direction::North, 30)]),
                ("left\nj 0", &[Placement::new(1, 0, Direction::North, 3)]),
            ],
        );
        let shutdown = Shutdown::new();
        let result = run(&mut world, &fast(1_000), &shutdown);

        assert_eq!(result.outcome, Outcome::LastLeague);
        assert_eq!(result.winner.as_deref(), Some("league0"));
        assert_eq!(result.retired, vec!["league1".to_string()]);
        assert_eq!(result.survivors(), vec!["league0"]);
        assert!(shutdown.is_finished());
        assert!(check_invariants(&world).is_empty());
    }

    #[test]
    fn test_extinction() {
        // Both leagues burn weight on runaway loops until nobody is left.
        let (mut world, _) = world_with(
            4,
            4,
            &[
                ("j 0", &[Placement::new(0, 0, Direction::North, 5)]),
                ("j 0", &[Placement::new(3, 3, Direction::North, 5)]),
            ],
        );
        let result = run(&mut world, &fast(1_000), &Shutdown::new());
        assert_eq!(result.outcome, Outcome::Extinction);
        assert_eq!(result.winner, None);
        assert!(result.survivors().is_empty());
    }

    #[test]
    fn test_move_limit() {
        let (mut world, _) = world_with(
            4,
            4,
            &[
                ("eat", &[Placement::new(0, 0, Direction::North, 5)]),
                ("eat", &[Placement::new(3, 3, Direction::North, 5)]),
            ],
        );
        let result = run(&mut world, &fast(10), &Shutdown::new());
        assert_eq!(result.outcome, Outcome::MoveLimit);
        assert_eq!(result.moves, 10);
        assert_eq!(result.status.moves, 10);
        assert_eq!(result.survivors().len(), 2);
    }

    #[test]
    fn test_stop_request_interrupts() {
        let (world, _) = world_with(
            4,
            4,
            &[
                ("eat", &[Placement::new(0, 0, Direction::North, 5)]),
                ("eat", &[Placement::new(3, 3, Direction::North, 5)]),
            ],
        );
        let shutdown = Shutdown::new();
        let config = SimConfig {
            move_delay: Duration::from_millis(1),
            max_moves: u64::MAX,
        };
        let handle = spawn(world, config, Arc::clone(&shutdown)).unwrap();
        thread::sleep(Duration::from_millis(20));
        shutdown.request_stop();

        let (world, result) = handle.join().unwrap();
        assert_eq!(result.outcome, Outcome::Interrupted);
        assert!(shutdown.is_finished());
        assert_eq!(world.moves(), result.moves);
    }

    #[test]
    fn test_single_league_finishes_at_once() {
        let (mut world, _) = world_with(
            3,
            3,
            &[("eat", &[Placement::new(0, 0, Direction::North, 5)])],
        );
        let result = run(&mut world, &fast(100), &Shutdown::new());
        assert_eq!(result.outcome, Outcome::LastLeague);
        assert_eq!(result.moves, 0);
    }
}
