//! The presentation boundary the simulation core reports to.

use serde::Serialize;

use crate::display::SpriteId;
use crate::game::{Coord, LeagueId};

/// Per-league summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueStatus {
    /// League identifier.
    pub id: LeagueId,
    /// League name.
    pub name: String,
    /// Living units.
    pub population: usize,
    /// Sum of living weights.
    pub biomass: i64,
    /// Whether the league has been retired.
    pub retired: bool,
}

/// Snapshot of the game for status displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Moves made so far.
    pub moves: u64,
    /// Every league, ordered by id.
    pub leagues: Vec<LeagueStatus>,
}

/// Receiver of visual updates.
///
/// The core calls it once per changed cell and never reads anything back.
pub trait PresentationSink: Send {
    /// A cell now shows `sprite` ([`SpriteId::BACKGROUND`] when emptied).
    fn on_cell_changed(&mut self, coord: Coord, sprite: SpriteId);

    /// Aggregate status changed.
    fn on_status(&mut self, _status: &Status) {}
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn on_cell_changed(&mut self, _coord: Coord, _sprite: SpriteId) {}
}
