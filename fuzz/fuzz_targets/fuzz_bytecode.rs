#![no_main]

//! Bytecode and turn-loop fuzzer.
//!
//! Builds two leagues from fuzzer-chosen words. Whatever passes verification
//! is run for a bounded number of moves with invariant checks after each.

use arbitrary::Arbitrary;
use deathgame::display::{NullSink, SpriteId};
use deathgame::game::{check_invariants, Board, Rules, StepOutcome, UnitKind, World};
use deathgame::isa::Program;
use libfuzzer_sys::fuzz_target;

/// Structured input for a short game.
#[derive(Arbitrary, Debug)]
struct GameInput {
    /// Raw program words per league.
    programs: [Vec<u8>; 2],
    /// Board side length.
    size: u8,
    /// Units per league.
    units: u8,
    /// Starting weight.
    weight: u8,
    /// Newborn weight.
    newborn: u8,
    /// RNG seed.
    seed: u64,
    /// Moves to simulate.
    moves: u16,
}

fuzz_target!(|input: GameInput| {
    let size = u16::from(input.size % 12).max(1);
    let Some(board) = Board::new(size, size) else {
        return;
    };
    let rules = Rules {
        newborn_weight: i64::from(input.newborn).max(1),
    };
    let mut world = World::seeded(board, rules, Box::new(NullSink), input.seed);

    let mut leagues = Vec::new();
    for (i, bytes) in input.programs.iter().enumerate() {
        // Small word values keep most inputs near valid opcodes and targets.
        let words = bytes.iter().take(64).map(|&b| u32::from(b % 32)).collect();
        let Ok(program) = Program::from_words(words) else {
            return;
        };
        let kind = UnitKind {
            name: "start".into(),
            sprite: SpriteId::new(u32::try_from(i).unwrap_or(0) + 1),
            program,
        };
        leagues.push(world.add_league(format!("league{i}"), vec![kind], 0));
    }

    for &league in &leagues {
        for _ in 0..(input.units % 8).max(1) {
            let Some(cell) = world.random_free_cell() else {
                break;
            };
            let direction = world.random_direction();
            world.spawn_unit(league, 0, cell, direction, i64::from(input.weight).max(1));
        }
    }
    world.randomize_cursor();

    for _ in 0..(input.moves % 2000) {
        let outcome = world.step();
        let violations = check_invariants(&world);
        assert!(violations.is_empty(), "{violations:?}");
        if outcome == StepOutcome::Finished {
            break;
        }
    }
});
