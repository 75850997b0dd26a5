// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Deathgame: leagues of units running tiny bytecode programs on a grid.
//!
//! Each unit executes a program written in a 12-instruction language: eat,
//! move, clone, strike, rotate and branch. Leagues take turns one unit at a
//! time until only one league has living units.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CLI / terminal viewer / batch     │
//! ├─────────────────────────────────────┤
//! │   Runner (sim) + setup (config)     │
//! ├─────────────────────────────────────┤
//! │   World: board, leagues, units      │
//! ├─────────────────────────────────────┤
//! │   Bytecode + assembler (isa)        │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod game;
pub mod isa;
pub mod loader;
pub mod sim;

pub use config::Config;
pub use error::{ConfigError, LoadError, SetupError, SyntaxError};

// Re-export key game types at crate root for convenience
pub use game::{Coord, Direction, League, LeagueId, Unit, UnitId, World};
pub use isa::{assemble, Program};
pub use sim::{Outcome, Shutdown, SimConfig, SimResult};
