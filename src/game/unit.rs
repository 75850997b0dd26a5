//! Units and the per-turn instruction state machine.
//!
//! A call to [`advance`] gives one unit one turn. Rotations and control flow
//! are free and chain into the next instruction; `eat`, `go`, `str` and `clon`
//! end the turn. A repeatable instruction with a count of one acts at once;
//! a larger count is only staged, and each later turn performs one repetition.

use tracing::debug;

use crate::display::SpriteId;
use crate::game::combat::{find_enemy, roll_damage};
use crate::game::{Coord, Direction, LeagueId, UnitKind, World};
use crate::isa::{Count, Instruction, Opcode, Program};

slotmap::new_key_type! {
    /// Handle of a unit in the world's arena.
    pub struct UnitId;
}

/// Most instructions a unit may execute in one turn.
pub const CHAIN_LIMIT: usize = 31;
/// Weight lost by a unit that hits [`CHAIN_LIMIT`].
pub const RUNAWAY_PENALTY: i64 = 5;
/// Weight spent per `go` attempt.
pub const MOVE_COST: i64 = 1;
/// Weight spent per `str` activation.
pub const STRIKE_COST: i64 = 1;
/// Weight spent per `clon`.
pub const CLONE_COST: i64 = 10;
/// Weight given to the occupant of a blocked `clon`.
pub const CLONE_GIFT: i64 = 2;

/// An action that can be staged for repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatAction {
    /// Gain one weight.
    Eat,
    /// Step forward.
    Go,
    /// Strike the first adjacent unit.
    Str,
}

impl RepeatAction {
    /// The opcode that stages this action.
    #[must_use]
    pub const fn opcode(self) -> Opcode {
        match self {
            RepeatAction::Eat => Opcode::Eat,
            RepeatAction::Go => Opcode::Go,
            RepeatAction::Str => Opcode::Str,
        }
    }
}

/// Repetitions still owed by an earlier `eat`, `go` or `str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRepeat {
    /// What to repeat.
    pub action: RepeatAction,
    /// How many repetitions are left.
    pub remaining: u32,
}

/// What a unit did with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// Performed one staged repetition.
    Repeat(RepeatAction),
    /// Executed a turn-ending instruction.
    Executed(Opcode),
    /// Chained [`CHAIN_LIMIT`] free instructions and paid the penalty.
    Runaway,
    /// The unit was dead or unknown.
    Skipped,
}

/// A single unit on the board.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Owning league.
    pub league: LeagueId,
    /// Index into the league's kind table.
    pub kind: usize,
    /// Sprite drawn on the unit's cell.
    pub sprite: SpriteId,
    /// Shared bytecode of the unit's kind.
    pub program: Program,
    /// Current cell.
    pub position: Coord,
    /// Current facing.
    pub direction: Direction,
    /// Energy. A unit with weight <= 0 is dead.
    pub weight: i64,
    /// Word offset of the next instruction.
    pub pc: usize,
    /// Staged repetitions, if any.
    pub pending: Option<PendingRepeat>,
}

impl Unit {
    /// Create a unit of `kind` at the start of its program.
    #[must_use]
    pub fn new(
        league: LeagueId,
        kind_index: usize,
        kind: &UnitKind,
        position: Coord,
        direction: Direction,
        weight: i64,
    ) -> Self {
        Self {
            league,
            kind: kind_index,
            sprite: kind.sprite,
            program: kind.program.clone(),
            position,
            direction,
            weight,
            pc: 0,
            pending: None,
        }
    }

    /// Whether the unit is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.weight > 0
    }
}

/// Give unit `id` one turn.
///
/// Never fails. May move units, change weights, kill units (which leaves
/// the board at once) and append a newborn to the unit's league.
pub fn advance(world: &mut World, id: UnitId) -> Turn {
    let program = {
        let Some(unit) = world.unit_mut(id).filter(|u| u.is_alive()) else {
            return Turn::Skipped;
        };

        if let Some(pending) = unit.pending.as_mut()
            && pending.remaining > 0
        {
            pending.remaining -= 1;
            let action = pending.action;
            if pending.remaining == 0 {
                unit.pending = None;
            }
            perform(world, id, action);
            return Turn::Repeat(action);
        }

        unit.pending = None;
        unit.program.clone()
    };

    for _ in 0..CHAIN_LIMIT {
        let Some(unit) = world.unit_mut(id) else {
            return Turn::Skipped;
        };

        let pc = unit.pc;
        let Ok(instruction) = program.fetch(pc) else {
            // Only reachable with a pc that is not an instruction boundary.
            debug!(?id, pc, "bad program counter, restarting program");
            unit.pc = 0;
            return Turn::Skipped;
        };

        let next = pc + instruction.word_len() as usize;
        unit.pc = if next >= program.len() { 0 } else { next };

        match instruction {
            Instruction::Eat(count) => {
                return repeat(world, id, RepeatAction::Eat, count);
            }
            Instruction::Go(count) => {
                return repeat(world, id, RepeatAction::Go, count);
            }
            Instruction::Str(count) => {
                return repeat(world, id, RepeatAction::Str, count);
            }
            Instruction::Clon => {
                clone_ahead(world, id);
                return Turn::Executed(Opcode::Clon);
            }
            Instruction::Left => unit.direction = unit.direction.left(),
            Instruction::Right => unit.direction = unit.direction.right(),
            Instruction::Back => unit.direction = unit.direction.back(),
            Instruction::Turn => {
                let direction = world.random_direction();
                if let Some(unit) = world.unit_mut(id) {
                    unit.direction = direction;
                }
            }
            Instruction::Jg { threshold, target } => {
                if unit.weight > i64::from(threshold) {
                    unit.pc = target as usize;
                }
            }
            Instruction::Jl { threshold, target } => {
                if unit.weight < i64::from(threshold) {
                    unit.pc = target as usize;
                }
            }
            Instruction::J { target } => unit.pc = target as usize,
            Instruction::Je { target } => {
                if find_enemy(world, id).is_some()
                    && let Some(unit) = world.unit_mut(id)
                {
                    unit.pc = target as usize;
                }
            }
        }
    }

    debug!(?id, penalty = RUNAWAY_PENALTY, "runaway program");
    world.damage(id, RUNAWAY_PENALTY);
    Turn::Runaway
}

/// Perform a single repetition now, or stage all of them for later turns.
///
/// Staging still ends the turn.
fn repeat(world: &mut World, id: UnitId, action: RepeatAction, count: Count) -> Turn {
    let weight = world.unit(id).map_or(0, |u| u.weight);
    match count.resolve(weight) {
        0 => {}
        1 => perform(world, id, action),
        n => {
            if let Some(unit) = world.unit_mut(id) {
                unit.pending = Some(PendingRepeat {
                    action,
                    remaining: n,
                });
            }
        }
    }
    Turn::Executed(action.opcode())
}

/// One repetition of a repeatable action.
fn perform(world: &mut World, id: UnitId, action: RepeatAction) {
    match action {
        RepeatAction::Eat => world.feed(id, 1),
        RepeatAction::Go => step_forward(world, id),
        RepeatAction::Str => strike(world, id),
    }
}

fn step_forward(world: &mut World, id: UnitId) {
    if world.damage(id, MOVE_COST) {
        return;
    }
    let Some(unit) = world.unit(id) else {
        return;
    };
    if let Some(to) = world.board().ahead(unit.position, unit.direction)
        && world.is_free(to)
    {
        world.move_unit(id, to);
    }
}

fn strike(world: &mut World, id: UnitId) {
    if world.damage(id, STRIKE_COST) {
        return;
    }
    let Some(enemy) = find_enemy(world, id) else {
        return;
    };
    let weight = world.unit(id).map_or(0, |u| u.weight);
    let amount = roll_damage(world.rng(), weight);
    world.damage(enemy, amount);
}

fn clone_ahead(world: &mut World, id: UnitId) {
    if world.damage(id, CLONE_COST) {
        return;
    }
    let Some(unit) = world.unit(id) else {
        return;
    };
    let (league, kind) = (unit.league, unit.kind);
    let Some(ahead) = world.board().ahead(unit.position, unit.direction) else {
        return;
    };

    match world.occupant(ahead) {
        Some(occupant) => world.feed(occupant, CLONE_GIFT),
        None => {
            let direction = world.random_direction();
            let weight = world.rules().newborn_weight;
            world.spawn_unit(league, kind, ahead, direction, weight);
        }
    }
}
