//! Simulation core.
//!
//! Implements the rules of the arena:
//! - Board geometry and the occupancy index
//! - Units and their per-turn instruction state machine
//! - Leagues with round-robin scheduling and lazy compaction
//! - The world turn loop that retires exhausted leagues

mod combat;
mod invariants;
mod league;
mod map;
mod state;
mod unit;

pub use combat::{find_enemy, roll_damage, MIN_DAMAGE};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use league::{League, LeagueId, UnitKind};
pub use map::{Board, Coord, Direction};
pub use state::{Rules, StepOutcome, World};
pub use unit::{
    advance, PendingRepeat, RepeatAction, Turn, Unit, UnitId, CHAIN_LIMIT, CLONE_COST,
    CLONE_GIFT, MOVE_COST, RUNAWAY_PENALTY, STRIKE_COST,
};
