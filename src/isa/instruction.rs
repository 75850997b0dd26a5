//! Opcode table and decoded instruction representation.
//!
//! Every instruction starts with an opcode word followed by a fixed number of
//! operand words, so the encoded length is known from the opcode alone:
//!
//! | opcode | operands            | words |
//! |--------|---------------------|-------|
//! | eat    | count               | 2     |
//! | go     | count               | 2     |
//! | clon   | -                   | 1     |
//! | str    | count               | 2     |
//! | left   | -                   | 1     |
//! | right  | -                   | 1     |
//! | back   | -                   | 1     |
//! | turn   | -                   | 1     |
//! | jg     | threshold, target   | 3     |
//! | jl     | threshold, target   | 3     |
//! | j      | target              | 2     |
//! | je     | target              | 2     |
//!
//! A count word of `0` means "repeat as many times as the unit's current
//! weight" (`r` in source), `1` means the operand was omitted, and explicit
//! counts are 2..=99.

use std::fmt;

use crate::error::DecodeError;

/// One word of bytecode.
pub type Word = u32;

/// Count word meaning "use the unit's weight" (`r` in source).
pub const COUNT_WEIGHT: Word = 0;
/// Count word for an omitted operand.
pub const COUNT_ONCE: Word = 1;
/// Smallest explicit count accepted in source.
pub const MIN_EXPLICIT_COUNT: Word = 2;
/// Largest explicit count accepted in source.
pub const MAX_EXPLICIT_COUNT: Word = 99;

/// Instruction opcodes, numbered in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Opcode {
    /// Gain weight.
    Eat = 0,
    /// Step forward.
    Go = 1,
    /// Spawn a newborn ahead.
    Clon = 2,
    /// Strike an adjacent enemy.
    Str = 3,
    /// Rotate counterclockwise.
    Left = 4,
    /// Rotate clockwise.
    Right = 5,
    /// Rotate 180 degrees.
    Back = 6,
    /// Face a random direction.
    Turn = 7,
    /// Jump if weight is greater than a threshold.
    Jg = 8,
    /// Jump if weight is less than a threshold.
    Jl = 9,
    /// Unconditional jump.
    J = 10,
    /// Jump if an enemy is adjacent.
    Je = 11,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Opcode; 12] = [
        Opcode::Eat,
        Opcode::Go,
        Opcode::Clon,
        Opcode::Str,
        Opcode::Left,
        Opcode::Right,
        Opcode::Back,
        Opcode::Turn,
        Opcode::Jg,
        Opcode::Jl,
        Opcode::J,
        Opcode::Je,
    ];

    /// Decode an opcode word.
    #[must_use]
    pub fn from_word(word: Word) -> Option<Self> {
        usize::try_from(word)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// The encoded opcode word.
    #[must_use]
    pub const fn word(self) -> Word {
        self as Word
    }

    /// Look up an opcode by its source mnemonic.
    #[must_use]
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.mnemonic() == mnemonic)
    }

    /// Source mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Eat => "eat",
            Opcode::Go => "go",
            Opcode::Clon => "clon",
            Opcode::Str => "str",
            Opcode::Left => "left",
            Opcode::Right => "right",
            Opcode::Back => "back",
            Opcode::Turn => "turn",
            Opcode::Jg => "jg",
            Opcode::Jl => "jl",
            Opcode::J => "j",
            Opcode::Je => "je",
        }
    }

    /// Encoded length in words, including the opcode word.
    #[must_use]
    pub const fn word_len(self) -> u32 {
        match self {
            Opcode::Clon | Opcode::Left | Opcode::Right | Opcode::Back | Opcode::Turn => 1,
            Opcode::Eat | Opcode::Go | Opcode::Str | Opcode::J | Opcode::Je => 2,
            Opcode::Jg | Opcode::Jl => 3,
        }
    }
}

/// Repeat count of `eat`, `go` and `str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// A fixed number of repetitions.
    Fixed(u32),
    /// As many repetitions as the unit's weight when the instruction runs.
    Weight,
}

impl Count {
    /// Decode a count word.
    #[must_use]
    pub const fn from_word(word: Word) -> Self {
        if word == COUNT_WEIGHT {
            Count::Weight
        } else {
            Count::Fixed(word)
        }
    }

    /// Encode this count.
    #[must_use]
    pub const fn word(self) -> Word {
        match self {
            Count::Fixed(n) => n,
            Count::Weight => COUNT_WEIGHT,
        }
    }

    /// Resolve to a repetition count for a unit of the given weight.
    ///
    /// Non-positive weights resolve `r` to zero repetitions.
    #[must_use]
    pub fn resolve(self, weight: i64) -> u32 {
        match self {
            Count::Fixed(n) => n,
            Count::Weight => u32::try_from(weight.max(0)).unwrap_or(u32::MAX),
        }
    }
}

/// A decoded instruction.
///
/// Jump targets are absolute word offsets once assembled. Inside the
/// assembler's first pass they temporarily hold source line indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Gain one weight per repetition.
    Eat(Count),
    /// Step forward one cell per repetition.
    Go(Count),
    /// Spawn a newborn ahead, or feed whoever is there.
    Clon,
    /// Strike the nearest enemy once per repetition.
    Str(Count),
    /// Rotate counterclockwise.
    Left,
    /// Rotate clockwise.
    Right,
    /// Rotate 180 degrees.
    Back,
    /// Face a random direction.
    Turn,
    /// Jump to `target` if weight > `threshold`.
    Jg {
        /// Weight to compare against.
        threshold: u32,
        /// Jump destination.
        target: u32,
    },
    /// Jump to `target` if weight < `threshold`.
    Jl {
        /// Weight to compare against.
        threshold: u32,
        /// Jump destination.
        target: u32,
    },
    /// Jump to `target`.
    J {
        /// Jump destination.
        target: u32,
    },
    /// Jump to `target` if an enemy is adjacent.
    Je {
        /// Jump destination.
        target: u32,
    },
}

impl Instruction {
    /// The opcode of this instruction.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Instruction::Eat(_) => Opcode::Eat,
            Instruction::Go(_) => Opcode::Go,
            Instruction::Clon => Opcode::Clon,
            Instruction::Str(_) => Opcode::Str,
            Instruction::Left => Opcode::Left,
            Instruction::Right => Opcode::Right,
            Instruction::Back => Opcode::Back,
            Instruction::Turn => Opcode::Turn,
            Instruction::Jg { .. } => Opcode::Jg,
            Instruction::Jl { .. } => Opcode::Jl,
            Instruction::J { .. } => Opcode::J,
            Instruction::Je { .. } => Opcode::Je,
        }
    }

    /// Encoded length in words.
    #[must_use]
    pub const fn word_len(&self) -> u32 {
        self.opcode().word_len()
    }

    /// Whether this instruction executes without ending the unit's turn.
    ///
    /// Rotations and control flow are free; `eat`, `go`, `str` and `clon`
    /// cost the turn.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        !matches!(
            self,
            Instruction::Eat(_) | Instruction::Go(_) | Instruction::Str(_) | Instruction::Clon
        )
    }

    /// The jump target, for control-flow instructions.
    #[must_use]
    pub const fn target(&self) -> Option<u32> {
        match self {
            Instruction::Jg { target, .. }
            | Instruction::Jl { target, .. }
            | Instruction::J { target }
            | Instruction::Je { target } => Some(*target),
            _ => None,
        }
    }

    /// Replace the jump target; no-op for other instructions.
    #[must_use]
    pub(crate) const fn with_target(self, new_target: u32) -> Self {
        match self {
            Instruction::Jg { threshold, .. } => Instruction::Jg {
                threshold,
                target: new_target,
            },
            Instruction::Jl { threshold, .. } => Instruction::Jl {
                threshold,
                target: new_target,
            },
            Instruction::J { .. } => Instruction::J { target: new_target },
            Instruction::Je { .. } => Instruction::Je { target: new_target },
            other => other,
        }
    }

    /// Append the encoded words to `out`.
    pub fn encode(&self, out: &mut Vec<Word>) {
        out.push(self.opcode().word());
        match *self {
            Instruction::Eat(count) | Instruction::Go(count) | Instruction::Str(count) => {
                out.push(count.word());
            }
            Instruction::Jg { threshold, target } | Instruction::Jl { threshold, target } => {
                out.push(threshold);
                out.push(target);
            }
            Instruction::J { target } | Instruction::Je { target } => out.push(target),
            Instruction::Clon
            | Instruction::Left
            | Instruction::Right
            | Instruction::Back
            | Instruction::Turn => {}
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().mnemonic();
        match *self {
            Instruction::Eat(count) | Instruction::Go(count) | Instruction::Str(count) => {
                match count {
                    Count::Fixed(1) => write!(f, "{mnemonic}"),
                    Count::Fixed(n) => write!(f, "{mnemonic} {n}"),
                    Count::Weight => write!(f, "{mnemonic} r"),
                }
            }
            Instruction::Jg { threshold, target } | Instruction::Jl { threshold, target } => {
                write!(f, "{mnemonic} {threshold} {target}")
            }
            Instruction::J { target } | Instruction::Je { target } => {
                write!(f, "{mnemonic} {target}")
            }
            Instruction::Clon
            | Instruction::Left
            | Instruction::Right
            | Instruction::Back
            | Instruction::Turn => write!(f, "{mnemonic}"),
        }
    }
}

/// Decode the instruction starting at word offset `pc`.
///
/// Jump targets are returned as stored; range checks happen when a
/// [`Program`](crate::isa::Program) is built.
///
/// # Errors
///
/// Returns an error if the opcode is unknown or the operands run past the
/// end of `words`.
pub fn decode(words: &[Word], pc: usize) -> Result<Instruction, DecodeError> {
    let Some(&word) = words.get(pc) else {
        return Err(DecodeError::Truncated(pc));
    };
    let opcode = Opcode::from_word(word).ok_or(DecodeError::InvalidOpcode { word, offset: pc })?;
    let operand = |n: usize| {
        words
            .get(pc + n)
            .copied()
            .ok_or(DecodeError::Truncated(pc))
    };

    let instruction = match opcode {
        Opcode::Eat => Instruction::Eat(Count::from_word(operand(1)?)),
        Opcode::Go => Instruction::Go(Count::from_word(operand(1)?)),
        Opcode::Clon => Instruction::Clon,
        Opcode::Str => Instruction::Str(Count::from_word(operand(1)?)),
        Opcode::Left => Instruction::Left,
        Opcode::Right => Instruction::Right,
        Opcode::Back => Instruction::Back,
        Opcode::Turn => Instruction::Turn,
        Opcode::Jg => Instruction::Jg {
            threshold: operand(1)?,
            target: operand(2)?,
        },
        Opcode::Jl => Instruction::Jl {
            threshold: operand(1)?,
            target: operand(2)?,
        },
        Opcode::J => Instruction::J {
            target: operand(1)?,
        },
        Opcode::Je => Instruction::Je {
            target: operand(1)?,
        },
    };

    Ok(instruction)
}
