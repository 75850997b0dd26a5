//! Leagues and round-robin scheduling of their units.

use slotmap::SlotMap;

use crate::display::SpriteId;
use crate::game::{Unit, UnitId};
use crate::isa::Program;

/// Unique identifier for a league.
pub type LeagueId = u16;

/// One entry of a league's kind table.
#[derive(Debug, Clone)]
pub struct UnitKind {
    /// Kind name from the configuration.
    pub name: String,
    /// Sprite for units of this kind.
    pub sprite: SpriteId,
    /// Program shared by every unit of this kind.
    pub program: Program,
}

/// A faction of units sharing a kind table.
#[derive(Debug, Clone)]
pub struct League {
    id: LeagueId,
    name: String,
    kinds: Vec<UnitKind>,
    start_kind: usize,
    /// Unit handles in scheduling order; may contain dead units until the
    /// scheduler drains them.
    units: Vec<UnitId>,
    cursor: usize,
}

impl League {
    /// Create a league with no units.
    ///
    /// `start_kind` indexes `kinds` and names the kind of initial units.
    #[must_use]
    pub fn new(
        id: LeagueId,
        name: impl Into<String>,
        kinds: Vec<UnitKind>,
        start_kind: usize,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kinds,
            start_kind,
            units: Vec::new(),
            cursor: 0,
        }
    }

    /// League identifier.
    #[must_use]
    pub const fn id(&self) -> LeagueId {
        self.id
    }

    /// League name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind table.
    #[must_use]
    pub fn kinds(&self) -> &[UnitKind] {
        &self.kinds
    }

    /// Look up a kind by index.
    #[must_use]
    pub fn kind(&self, index: usize) -> Option<&UnitKind> {
        self.kinds.get(index)
    }

    /// Index of the kind initial units are created with.
    #[must_use]
    pub const fn start_kind(&self) -> usize {
        self.start_kind
    }

    /// Unit handles, living and not yet drained.
    #[must_use]
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    /// Number of handles held, including dead units not yet drained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True if the league holds no unit handles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Append a unit to the end of the schedule.
    pub fn push(&mut self, id: UnitId) {
        self.units.push(id);
    }

    /// The next living unit in round-robin order.
    ///
    /// Runs of dead units found at the cursor are removed from the league and
    /// freed from `arena`. Returns `None` once the league holds no units.
    pub fn next_living_unit(&mut self, arena: &mut SlotMap<UnitId, Unit>) -> Option<UnitId> {
        let alive = |arena: &SlotMap<UnitId, Unit>, id: UnitId| {
            arena.get(id).is_some_and(Unit::is_alive)
        };

        loop {
            if self.cursor >= self.units.len() {
                self.cursor = 0;
            }
            let &id = self.units.get(self.cursor)?;

            if alive(arena, id) {
                self.cursor += 1;
                return Some(id);
            }

            let end = self.units[self.cursor..]
                .iter()
                .position(|&id| alive(arena, id))
                .map_or(self.units.len(), |n| self.cursor + n);
            for dead in self.units.drain(self.cursor..end) {
                arena.remove(dead);
            }
        }
    }

    /// Number of living units.
    #[must_use]
    pub fn population(&self, arena: &SlotMap<UnitId, Unit>) -> usize {
        self.living(arena).count()
    }

    /// Sum of the weights of living units.
    #[must_use]
    pub fn biomass(&self, arena: &SlotMap<UnitId, Unit>) -> i64 {
        self.living(arena).map(|u| u.weight).sum()
    }

    fn living<'a>(
        &'a self,
        arena: &'a SlotMap<UnitId, Unit>,
    ) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units
            .iter()
            .filter_map(|&id| arena.get(id))
            .filter(|u| u.is_alive())
    }
}
