//! Property-based tests for the world and the assembler.
//!
//! Random programs run on random boards; the board and the league tables
//! must agree after every single move.
//! Run with: cargo test --release prop_world

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use deathgame::display::{NullSink, SpriteId};
use deathgame::game::{check_invariants, Board, Rules, StepOutcome, UnitKind, World};
use deathgame::isa::{assemble, assemble_str, Program};

/// One source line of a program with `lines` lines.
fn line_strategy(lines: usize) -> impl Strategy<Value = String> {
    let count = prop_oneof![
        Just(String::new()),
        Just(" r".to_string()),
        (2u32..=99).prop_map(|n| format!(" {n}")),
    ];
    let target = 0..lines;
    prop_oneof![
        (0..3usize, count).prop_map(|(op, c)| format!("{}{c}", ["eat", "go", "str"][op])),
        (0..5usize).prop_map(|op| ["clon", "left", "right", "back", "turn"][op].to_string()),
        (0u32..80, target.clone(), any::<bool>())
            .prop_map(|(w, t, greater)| format!("{} {w} {t}", if greater { "jg" } else { "jl" })),
        (target, any::<bool>())
            .prop_map(|(t, enemy)| format!("{} {t}", if enemy { "je" } else { "j" })),
    ]
}

fn program_strategy() -> impl Strategy<Value = Vec<String>> {
    (1usize..10).prop_flat_map(|n| prop::collection::vec(line_strategy(n), n))
}

fn kind(program: Program, sprite: u32) -> UnitKind {
    UnitKind {
        name: "start".into(),
        sprite: SpriteId::new(sprite),
        program,
    }
}

/// Build a world with one league per program and `units` units each.
fn world(programs: &[Vec<String>], size: u16, units: usize, weight: i64, seed: u64) -> World {
    let board = Board::new(size, size).unwrap();
    let rules = Rules { newborn_weight: 8 };
    let mut world = World::seeded(board, rules, Box::new(NullSink), seed);

    let mut leagues = Vec::new();
    for (i, lines) in programs.iter().enumerate() {
        let program = assemble(lines).unwrap();
        let sprite = u32::try_from(i).unwrap() + 1;
        leagues.push(world.add_league(format!("league{i}"), vec![kind(program, sprite)], 0));
    }
    for &league in &leagues {
        for _ in 0..units {
            let Some(cell) = world.random_free_cell() else {
                break;
            };
            let direction = world.random_direction();
            world.spawn_unit(league, 0, cell, direction, weight).unwrap();
        }
    }
    world.randomize_cursor();
    world
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every generated program assembles and decodes back to its line count.
    #[test]
    fn prop_generated_programs_assemble(lines in program_strategy()) {
        let program = assemble(&lines).unwrap();
        prop_assert_eq!(program.instructions().count(), lines.len());
        prop_assert!(program.instructions().all(|(offset, _)| program.fetch(offset).is_ok()));
    }

    /// The assembler never panics on arbitrary text.
    #[test]
    fn prop_assembler_total(source in "[a-z0-9 \n]{0,64}") {
        let _ = assemble_str(&source);
    }

    /// Occupancy and scheduling stay consistent after every move.
    #[test]
    fn prop_invariants_hold_every_step(
        programs in prop::collection::vec(program_strategy(), 2..4),
        size in 3u16..10,
        units in 1usize..5,
        weight in 1i64..40,
        seed in any::<u64>(),
    ) {
        let mut world = world(&programs, size, units, weight, seed);

        for _ in 0..300 {
            let outcome = world.step();

            let violations = check_invariants(&world);
            prop_assert!(violations.is_empty(), "{:?}", violations);

            for (coord, occupant) in world.board().iter() {
                if let Some(id) = occupant {
                    let unit = world.unit(id).unwrap();
                    prop_assert!(unit.weight > 0);
                    prop_assert_eq!(unit.position, coord);
                }
            }
            for (id, unit) in world.units() {
                let on_board = world.board().occupant(unit.position) == Some(id);
                prop_assert_eq!(unit.is_alive(), on_board);
            }

            if outcome == StepOutcome::Finished {
                prop_assert!(world.is_over());
                break;
            }
        }
    }

    /// Moves are counted only for turns that ran.
    #[test]
    fn prop_moves_count_turns(
        programs in prop::collection::vec(program_strategy(), 2..3),
        seed in any::<u64>(),
    ) {
        let mut world = world(&programs, 6, 3, 20, seed);
        let mut moved = 0u64;
        for _ in 0..200 {
            match world.step() {
                StepOutcome::Moved { .. } => moved += 1,
                StepOutcome::Finished => break,
            }
        }
        prop_assert_eq!(world.moves(), moved);
    }

    /// Units never leave the board.
    #[test]
    fn prop_positions_in_bounds(
        lines in program_strategy(),
        seed in any::<u64>(),
    ) {
        let programs = vec![lines, vec!["eat".to_string()]];
        let mut world = world(&programs, 5, 4, 30, seed);
        for _ in 0..200 {
            if world.step() == StepOutcome::Finished {
                break;
            }
            for (_, unit) in world.units() {
                prop_assert!(world.board().in_bounds(unit.position));
            }
        }
    }
}
