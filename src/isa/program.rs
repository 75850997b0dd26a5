//! Immutable, shareable bytecode.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::DecodeError;
use crate::isa::instruction::{decode, Instruction, Word};

/// Compiled bytecode for one unit kind.
///
/// Cloning is cheap: every unit of a kind shares the same word buffer.
/// Every jump target is an instruction boundary inside the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    words: Arc<[Word]>,
}

impl Program {
    /// Build a program from raw words, checking every instruction and jump target.
    ///
    /// # Errors
    ///
    /// Returns an error if the words are empty, contain an unknown opcode, end
    /// in the middle of an instruction, or jump outside the program.
    pub fn from_words(words: Vec<Word>) -> Result<Self, DecodeError> {
        if words.is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut starts = vec![false; words.len()];
        let mut jumps = Vec::new();
        let mut pc = 0;
        while pc < words.len() {
            let instruction = decode(&words, pc)?;
            starts[pc] = true;
            if let Some(target) = instruction.target() {
                jumps.push((pc, target));
            }
            pc += instruction.word_len() as usize;
        }

        for (offset, target) in jumps {
            let valid = usize::try_from(target)
                .ok()
                .and_then(|t| starts.get(t).copied())
                .unwrap_or(false);
            if !valid {
                return Err(DecodeError::JumpOutOfRange { target, offset });
            }
        }

        Ok(Self::from_verified(words))
    }

    /// Wrap words the assembler has already verified.
    pub(crate) fn from_verified(words: Vec<Word>) -> Self {
        Self {
            words: words.into(),
        }
    }

    /// The raw words.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Number of words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True for a program with no words (never produced by the assembler).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Decode the instruction at `pc`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pc` is not an instruction boundary of a valid program.
    pub fn fetch(&self, pc: usize) -> Result<Instruction, DecodeError> {
        decode(&self.words, pc)
    }

    /// Whether two programs share the same word buffer.
    #[must_use]
    pub fn shares_code_with(&self, other: &Program) -> bool {
        Arc::ptr_eq(&self.words, &other.words)
    }

    /// Iterate over `(offset, instruction)` pairs in program order.
    #[must_use]
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            words: &self.words,
            pc: 0,
        }
    }

    /// Disassembly listing, one instruction per line, prefixed with its offset.
    #[must_use]
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (offset, instruction) in self.instructions() {
            let _ = writeln!(out, "{offset:4}: {instruction}");
        }
        out
    }
}

/// Iterator over the decoded instructions of a [`Program`].
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    words: &'a [Word],
    pc: usize,
}

impl Iterator for Instructions<'_> {
    type Item = (usize, Instruction);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.pc;
        let instruction = decode(self.words, offset).ok()?;
        self.pc += instruction.word_len() as usize;
        Some((offset, instruction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::instruction::{Count, Opcode};

    #[test]
    fn test_from_words_accepts_valid_program() {
        // eat r; j 0
        let words = vec![Opcode::Eat.word(), 0, Opcode::J.word(), 0];
        let program = Program::from_words(words).unwrap();
        assert_eq!(program.len(), 4);

        let decoded: Vec<_> = program.instructions().collect();
        assert_eq!(
            decoded,
            vec![
                (0, Instruction::Eat(Count::Weight)),
                (2, Instruction::J { target: 0 })
            ]
        );
    }

    #[test]
    fn test_from_words_rejects_empty() {
        assert_eq!(Program::from_words(vec![]), Err(DecodeError::Empty));
    }

    #[test]
    fn test_from_words_rejects_jump_into_operand() {
        // eat 5; j 1  (offset 1 is the operand of eat)
        let words = vec![Opcode::Eat.word(), 5, Opcode::J.word(), 1];
        assert_eq!(
            Program::from_words(words),
            Err(DecodeError::JumpOutOfRange { target: 1, offset: 2 })
        );
    }

    #[test]
    fn test_from_words_rejects_jump_past_end() {
        let words = vec![Opcode::Je.word(), 9];
        assert!(matches!(
            Program::from_words(words),
            Err(DecodeError::JumpOutOfRange { target: 9, .. })
        ));
    }

    #[test]
    fn test_clones_share_code() {
        let program = Program::from_words(vec![Opcode::Clon.word()]).unwrap();
        let copy = program.clone();
        assert!(program.shares_code_with(&copy));
    }

    #[test]
    fn test_listing() {
        let words = vec![Opcode::Left.word(), Opcode::Go.word(), 3];
        let program = Program::from_words(words).unwrap();
        assert_eq!(program.listing(), "   0: left\n   1: go 3\n");
    }
}
