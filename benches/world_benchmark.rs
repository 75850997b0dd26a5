//! Benchmarks for the world turn loop and the assembler.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use deathgame::display::{NullSink, SpriteId};
use deathgame::game::{Board, Rules, UnitKind, World};
use deathgame::isa::{assemble_str, Program};
use deathgame::sim::{self, Shutdown, SimConfig};

const HUNTER: &str = "je 5\nturn\ngo 3\njg 40 7\nj 0\nstr 2\nj 0\nclon\nj 0";
const GRAZER: &str = "eat 5\nturn\ngo\njl 20 0\nclon\nright\nj 0";

fn world(size: u16, units: usize, seed: u64) -> World {
    let board = Board::new(size, size).unwrap();
    let mut world = World::seeded(board, Rules::default(), Box::new(NullSink), seed);
    for (i, source) in [HUNTER, GRAZER].into_iter().enumerate() {
        let kind = UnitKind {
            name: "start".into(),
            sprite: SpriteId::new(u32::try_from(i).unwrap() + 1),
            program: assemble_str(source).unwrap(),
        };
        let league = world.add_league(format!("league{i}"), vec![kind], 0);
        for _ in 0..units {
            let cell = world.random_free_cell().unwrap();
            let direction = world.random_direction();
            world.spawn_unit(league, 0, cell, direction, 30);
        }
    }
    world.randomize_cursor();
    world
}

fn bench_steps(c: &mut Criterion) {
    c.bench_function("steps_10k_20x20", |b| {
        b.iter_batched(
            || world(20, 10, 42),
            |mut world| {
                for _ in 0..10_000 {
                    black_box(world.step());
                }
                world
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_full_game(c: &mut Criterion) {
    let config = SimConfig {
        move_delay: Duration::ZERO,
        max_moves: 100_000,
    };

    c.bench_function("full_game_40x40", |b| {
        b.iter_batched(
            || world(40, 25, 7),
            |mut world| black_box(sim::run(&mut world, &config, &Shutdown::new())),
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_assemble(c: &mut Criterion) {
    let source = [HUNTER, GRAZER].join("\n");

    c.bench_function("assemble_16_lines", |b| {
        b.iter(|| {
            let program: Program = assemble_str(black_box(&source)).unwrap();
            black_box(program)
        });
    });
}

criterion_group!(benches, bench_steps, bench_full_game, bench_assemble);
criterion_main!(benches);
