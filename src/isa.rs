//! Unit instruction set: opcodes, bytecode programs and the assembler.

mod assembler;
mod instruction;
mod program;

pub use assembler::{assemble, assemble_str};
pub use instruction::{
    decode, Count, Instruction, Opcode, Word, COUNT_ONCE, COUNT_WEIGHT, MAX_EXPLICIT_COUNT,
    MIN_EXPLICIT_COUNT,
};
pub use program::{Instructions, Program};
