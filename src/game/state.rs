//! World state: the board, the unit arena and the league scheduler.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand::rngs::SmallRng;
use slotmap::SlotMap;
use tracing::{debug, info, trace};

use crate::display::{LeagueStatus, PresentationSink, SpriteId, Status};
use crate::game::{
    advance, Board, Coord, Direction, League, LeagueId, Turn, Unit, UnitId, UnitKind,
};

/// Tunable rules that are not fixed by the instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Weight of units spawned by `clon`.
    pub newborn_weight: i64,
}

impl Default for Rules {
    fn default() -> Self {
        Self { newborn_weight: 10 }
    }
}

/// Result of one scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A unit took its turn.
    Moved {
        /// The unit that moved.
        unit: UnitId,
        /// What it did.
        turn: Turn,
    },
    /// Fewer than two leagues remain.
    Finished,
}

/// Complete simulation state.
///
/// Every living unit is recorded on the board at its position, and every
/// occupied cell holds a living unit. Dead units stay in the arena until
/// their league's scheduler drains them.
pub struct World {
    board: Board,
    units: SlotMap<UnitId, Unit>,
    /// Leagues still in play, in scheduling order.
    leagues: Vec<League>,
    /// Leagues whose scheduler ran dry, in retirement order.
    retired: Vec<League>,
    cursor: usize,
    moves: u64,
    rules: Rules,
    rng: SmallRng,
    sink: Box<dyn PresentationSink>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("width", &self.board.width())
            .field("height", &self.board.height())
            .field("units", &self.units.len())
            .field("leagues", &self.leagues.len())
            .field("retired", &self.retired.len())
            .field("moves", &self.moves)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Create an empty world with an OS-seeded random generator.
    #[must_use]
    pub fn new(board: Board, rules: Rules, sink: Box<dyn PresentationSink>) -> Self {
        Self::with_rng(board, rules, sink, SmallRng::from_os_rng())
    }

    /// Create an empty world with the given random generator.
    #[must_use]
    pub fn with_rng(
        board: Board,
        rules: Rules,
        sink: Box<dyn PresentationSink>,
        rng: SmallRng,
    ) -> Self {
        Self {
            board,
            units: SlotMap::with_key(),
            leagues: Vec::new(),
            retired: Vec::new(),
            cursor: 0,
            moves: 0,
            rules,
            rng,
            sink,
        }
    }

    /// Create an empty world seeded for reproducible tests and benchmarks.
    #[must_use]
    pub fn seeded(
        board: Board,
        rules: Rules,
        sink: Box<dyn PresentationSink>,
        seed: u64,
    ) -> Self {
        Self::with_rng(board, rules, sink, SmallRng::seed_from_u64(seed))
    }

    /// Register a league with no units. Returns its identifier.
    pub fn add_league(
        &mut self,
        name: impl Into<String>,
        kinds: Vec<UnitKind>,
        start_kind: usize,
    ) -> LeagueId {
        #[allow(clippy::cast_possible_truncation)]
        let id = (self.leagues.len() + self.retired.len()) as LeagueId;
        self.leagues.push(League::new(id, name, kinds, start_kind));
        id
    }

    /// Create a unit of `kind` in `league` on a free cell.
    ///
    /// Returns `None` if the cell is taken or out of bounds, the league is
    /// not in play, the kind is unknown, or `weight` is not positive.
    pub fn spawn_unit(
        &mut self,
        league: LeagueId,
        kind: usize,
        position: Coord,
        direction: Direction,
        weight: i64,
    ) -> Option<UnitId> {
        if weight <= 0 || !self.board.is_free(position) {
            return None;
        }

        let owner = self.leagues.iter_mut().find(|l| l.id() == league)?;
        let unit = Unit::new(league, kind, owner.kind(kind)?, position, direction, weight);
        let id = self.units.insert(unit);
        owner.push(id);
        self.place_unit(id);

        debug!(?id, league, x = position.x, y = position.y, weight, "unit spawned");
        Some(id)
    }

    /// Record a unit on the board at its position and draw it.
    ///
    /// Returns `false` if the unit is unknown or its position is out of bounds.
    pub fn place_unit(&mut self, id: UnitId) -> bool {
        let Some(unit) = self.units.get(id) else {
            return false;
        };
        let (position, sprite) = (unit.position, unit.sprite);
        if !self.board.set(position, Some(id)) {
            return false;
        }
        self.sink.on_cell_changed(position, sprite);
        true
    }

    /// Clear a unit's cell and draw the background there.
    pub fn remove_unit(&mut self, id: UnitId) {
        let Some(unit) = self.units.get(id) else {
            return;
        };
        let position = unit.position;
        if self.board.occupant(position) == Some(id) {
            self.board.set(position, None);
            self.sink.on_cell_changed(position, SpriteId::BACKGROUND);
        }
    }

    /// True iff `coord` is on the board and empty.
    #[must_use]
    pub fn is_free(&self, coord: Coord) -> bool {
        self.board.is_free(coord)
    }

    /// The unit standing on `coord`, if any.
    #[must_use]
    pub fn occupant(&self, coord: Coord) -> Option<UnitId> {
        self.board.occupant(coord)
    }

    /// The occupancy index.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Look up a unit, living or not yet drained.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Iterate over every unit in the arena.
    pub fn units(&self) -> impl Iterator<Item = (UnitId, &Unit)> {
        self.units.iter()
    }

    /// The unit arena, for league aggregates.
    #[must_use]
    pub const fn arena(&self) -> &SlotMap<UnitId, Unit> {
        &self.units
    }

    /// Leagues still in play.
    #[must_use]
    pub fn leagues(&self) -> &[League] {
        &self.leagues
    }

    /// Leagues that have been retired, oldest first.
    #[must_use]
    pub fn retired(&self) -> &[League] {
        &self.retired
    }

    /// Look up a league, in play or retired.
    #[must_use]
    pub fn league(&self, id: LeagueId) -> Option<&League> {
        self.leagues
            .iter()
            .chain(&self.retired)
            .find(|l| l.id() == id)
    }

    /// Number of moves made so far.
    #[must_use]
    pub const fn moves(&self) -> u64 {
        self.moves
    }

    /// The rules in effect.
    #[must_use]
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Whether fewer than two leagues remain in play.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.leagues.len() < 2
    }

    /// Start scheduling at a uniformly random league.
    pub fn randomize_cursor(&mut self) {
        if !self.leagues.is_empty() {
            self.cursor = self.rng.random_range(0..self.leagues.len());
        }
    }

    /// Give the next living unit of the league at the cursor one turn.
    ///
    /// A league with no living unit is retired without counting a move, and
    /// the league that takes its place at the cursor is asked instead.
    pub fn step(&mut self) -> StepOutcome {
        loop {
            if self.is_over() {
                return StepOutcome::Finished;
            }
            if self.cursor >= self.leagues.len() {
                self.cursor = 0;
            }

            let league = &mut self.leagues[self.cursor];
            if let Some(id) = league.next_living_unit(&mut self.units) {
                let turn = advance(self, id);
                self.moves += 1;
                trace!(moves = self.moves, ?id, ?turn, "move");
                self.cursor = (self.cursor + 1) % self.leagues.len();
                return StepOutcome::Moved { unit: id, turn };
            }

            let league = self.leagues.remove(self.cursor);
            info!(
                league = league.name(),
                moves = self.moves,
                remaining = self.leagues.len(),
                "league retired"
            );
            self.retired.push(league);
        }
    }

    /// Population and biomass of every league, ordered by league id.
    #[must_use]
    pub fn status(&self) -> Status {
        let mut leagues: Vec<LeagueStatus> = self
            .leagues
            .iter()
            .map(|l| (l, false))
            .chain(self.retired.iter().map(|l| (l, true)))
            .map(|(league, retired)| LeagueStatus {
                id: league.id(),
                name: league.name().to_string(),
                population: league.population(&self.units),
                biomass: league.biomass(&self.units),
                retired,
            })
            .collect();
        leagues.sort_by_key(|l| l.id);

        Status {
            moves: self.moves,
            leagues,
        }
    }

    /// Send the current [`Status`] to the presentation sink.
    pub fn publish_status(&mut self) {
        let status = self.status();
        self.sink.on_status(&status);
    }

    /// A uniformly random free cell, or `None` if the board is full.
    pub fn random_free_cell(&mut self) -> Option<Coord> {
        self.board.random_free_cell(&mut self.rng)
    }

    /// A uniformly random direction.
    pub fn random_direction(&mut self) -> Direction {
        Direction::random(&mut self.rng)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    pub(crate) fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Subtract weight. Returns `true` if the unit is dead afterwards; a unit
    /// that dies here leaves the board at once.
    pub(crate) fn damage(&mut self, id: UnitId, amount: i64) -> bool {
        let Some(unit) = self.units.get_mut(id) else {
            return true;
        };
        if !unit.is_alive() {
            return true;
        }

        unit.weight -= amount;
        if unit.is_alive() {
            return false;
        }

        debug!(?id, league = unit.league, "unit died");
        self.remove_unit(id);
        true
    }

    /// Add weight to a living unit.
    pub(crate) fn feed(&mut self, id: UnitId, amount: i64) {
        if let Some(unit) = self.units.get_mut(id).filter(|u| u.is_alive()) {
            unit.weight += amount;
        }
    }

    /// Move a living unit to a free cell. Returns `false` if the move is not
    /// possible.
    pub(crate) fn move_unit(&mut self, id: UnitId, to: Coord) -> bool {
        if !self.board.is_free(to) {
            return false;
        }
        let Some(unit) = self.units.get_mut(id).filter(|u| u.is_alive()) else {
            return false;
        };

        let from = unit.position;
        unit.position = to;
        let sprite = unit.sprite;

        self.board.set(from, None);
        self.sink.on_cell_changed(from, SpriteId::BACKGROUND);
        self.board.set(to, Some(id));
        self.sink.on_cell_changed(to, sprite);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullSink;
    use crate::game::testing::{world_with, Placement};
    use crate::game::check_invariants;

    #[test]
    fn test_empty_world_is_over() {
        let mut world = World::seeded(
            Board::new(4, 4).unwrap(),
            Rules::default(),
            Box::new(NullSink),
            1,
        );
        assert!(world.is_over());
        assert_eq!(world.step(), StepOutcome::Finished);
        assert_eq!(world.moves(), 0);
    }

    #[test]
    fn test_spawn_rejects_taken_cell_and_bad_weight() {
        let (mut world, ids) = world_with(
            4,
            4,
            &[("eat", &[Placement::new(1, 1, Direction::North, 10)])],
        );
        let league = world.unit(ids[0][0]).unwrap().league;
        assert!(world.spawn_unit(league, 0, Coord::new(1, 1), Direction::North, 10).is_none());
        assert!(world.spawn_unit(league, 0, Coord::new(4, 1), Direction::North, 10).is_none());
        assert!(world.spawn_unit(league, 0, Coord::new(2, 1), Direction::North, 0).is_none());
        assert!(world.spawn_unit(league, 3, Coord::new(2, 1), Direction::North, 5).is_none());
        assert!(world.spawn_unit(99, 0, Coord::new(2, 1), Direction::North, 5).is_none());
        assert!(world.spawn_unit(league, 0, Coord::new(2, 1), Direction::North, 5).is_some());
    }

    #[test]
    fn test_round_robin_across_leagues() {
        let (mut world, ids) = world_with(
            6,
            6,
            &[
                (
                    "eat",
                    &[
                        Placement::new(0, 0, Direction::North, 10),
                        Placement::new(1, 0, Direction::North, 10),
                    ],
                ),
                ("eat", &[Placement::new(5, 5, Direction::North, 10)]),
            ],
        );

        let order: Vec<_> = (0..4)
            .map(|_| match world.step() {
                StepOutcome::Moved { unit, .. } => unit,
                StepOutcome::Finished => panic!("finished early"),
            })
            .collect();
        assert_eq!(order, vec![ids[0][0], ids[1][0], ids[0][1], ids[1][0]]);
        assert_eq!(world.moves(), 4);
    }

    #[test]
    fn test_exhausted_league_ends_game() {
        let (mut world, ids) = world_with(
            4,
            4,
            &[
                ("eat", &[Placement::new(0, 0, Direction::North, 10)]),
                ("eat", &[Placement::new(3, 3, Direction::North, 1)]),
            ],
        );
        world.damage(ids[1][0], 1);

        assert!(matches!(world.step(), StepOutcome::Moved { .. }));
        assert_eq!(world.step(), StepOutcome::Finished);
        assert_eq!(world.moves(), 1);
        assert_eq!(world.leagues().len(), 1);
        assert_eq!(world.retired().len(), 1);
        assert!(check_invariants(&world).is_empty());
    }

    #[test]
    fn test_retirement_moves_on_to_next_league() {
        let (mut world, ids) = world_with(
            6,
            6,
            &[
                ("eat", &[Placement::new(0, 0, Direction::North, 1)]),
                ("eat", &[Placement::new(2, 2, Direction::North, 10)]),
                ("eat", &[Placement::new(4, 4, Direction::North, 10)]),
            ],
        );
        world.damage(ids[0][0], 5);

        // League 0 is at the cursor and has nobody left: the step falls
        // through to league 1 and counts a single move.
        assert_eq!(
            world.step(),
            StepOutcome::Moved {
                unit: ids[1][0],
                turn: Turn::Executed(crate::isa::Opcode::Eat)
            }
        );
        assert_eq!(world.moves(), 1);
        assert_eq!(world.retired()[0].name(), "league0");
        assert!(!world.is_over());
    }

    #[test]
    fn test_status_reports_all_leagues() {
        let (mut world, ids) = world_with(
            4,
            4,
            &[
                ("eat", &[Placement::new(0, 0, Direction::North, 4)]),
                (
                    "eat",
                    &[
                        Placement::new(3, 3, Direction::North, 6),
                        Placement::new(2, 3, Direction::North, 7),
                    ],
                ),
            ],
        );
        world.damage(ids[0][0], 10);
        world.step();

        let status = world.status();
        assert_eq!(status.moves, 1);
        assert_eq!(status.leagues.len(), 2);
        assert!(status.leagues[0].retired);
        assert_eq!(status.leagues[0].population, 0);
        assert_eq!(status.leagues[1].population, 2);
        assert_eq!(status.leagues[1].biomass, 6 + 7 + 1);
    }

    #[test]
    fn test_damage_and_move_keep_board_consistent() {
        let (mut world, ids) = world_with(
            4,
            4,
            &[("eat", &[Placement::new(1, 1, Direction::North, 3)])],
        );
        let id = ids[0][0];
        assert!(world.move_unit(id, Coord::new(2, 1)));
        assert!(!world.move_unit(id, Coord::new(4, 1)));
        assert_eq!(world.occupant(Coord::new(2, 1)), Some(id));
        assert!(world.is_free(Coord::new(1, 1)));

        assert!(!world.damage(id, 2));
        assert!(world.damage(id, 1));
        assert!(world.is_free(Coord::new(2, 1)));
        assert!(!world.move_unit(id, Coord::new(3, 3)));
        assert!(check_invariants(&world).is_empty());
    }
}
