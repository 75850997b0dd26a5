#![no_main]

//! Assembler fuzzer.
//!
//! Feeds arbitrary text to the assembler. Accepted programs must decode
//! cleanly, survive a trip through `Program::from_words`, and disassemble
//! to a listing with one line per source line.

use deathgame::isa::{assemble_str, Program};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|source: &str| {
    let Ok(program) = assemble_str(source) else {
        return;
    };

    let lines = source.lines().count();
    assert_eq!(program.instructions().count(), lines);
    assert_eq!(program.listing().lines().count(), lines);

    let rebuilt = Program::from_words(program.words().to_vec())
        .expect("assembled words must pass verification");
    assert_eq!(rebuilt.words(), program.words());
});
