//! Two-pass assembler from program text to bytecode.
//!
//! Source is one instruction per line, tokens separated by spaces or tabs.
//! Jump operands name a 0-based source line; the first pass records the word
//! offset every line will occupy, the second pass swaps line indices for
//! those offsets while emitting words.

use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::isa::instruction::{
    Count, Instruction, Opcode, Word, MAX_EXPLICIT_COUNT, MIN_EXPLICIT_COUNT,
};
use crate::isa::Program;

/// Assemble source lines into a [`Program`].
///
/// # Errors
///
/// Returns a [`SyntaxError`] with the 1-based line number of the first bad
/// line, or line 0 if there are no lines at all.
pub fn assemble<I, S>(lines: I) -> Result<Program, SyntaxError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // Pass 1: parse every line and lay out word offsets.
    let mut parsed = Vec::new();
    let mut offsets: Vec<u32> = Vec::new();
    let mut next_offset: u32 = 0;

    for (idx, line) in lines.into_iter().enumerate() {
        let instruction =
            parse_line(line.as_ref()).map_err(|kind| SyntaxError::new(idx + 1, kind))?;
        offsets.push(next_offset);
        next_offset += instruction.word_len();
        parsed.push(instruction);
    }

    if parsed.is_empty() {
        return Err(SyntaxError::new(0, SyntaxErrorKind::EmptyProgram));
    }

    // Pass 2: resolve line targets and emit.
    let mut words: Vec<Word> = Vec::with_capacity(next_offset as usize);
    for (idx, instruction) in parsed.into_iter().enumerate() {
        let resolved = match instruction.target() {
            Some(line) => {
                let offset = usize::try_from(line)
                    .ok()
                    .and_then(|l| offsets.get(l).copied())
                    .ok_or_else(|| {
                        SyntaxError::new(
                            idx + 1,
                            SyntaxErrorKind::JumpOutOfRange {
                                target: line,
                                lines: offsets.len(),
                            },
                        )
                    })?;
                instruction.with_target(offset)
            }
            None => instruction,
        };
        resolved.encode(&mut words);
    }

    Ok(Program::from_verified(words))
}

/// Assemble a whole source text.
///
/// # Errors
///
/// See [`assemble`].
pub fn assemble_str(source: &str) -> Result<Program, SyntaxError> {
    assemble(source.lines())
}

/// Parse one line. Jump operands stay as line indices.
fn parse_line(line: &str) -> Result<Instruction, SyntaxErrorKind> {
    let mut tokens = line
        .trim_end_matches('\r')
        .split([' ', '\t'])
        .filter(|t| !t.is_empty());

    let mnemonic = tokens.next().ok_or(SyntaxErrorKind::EmptyLine)?;
    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| SyntaxErrorKind::UnknownMnemonic(mnemonic.to_string()))?;
    let operands: Vec<&str> = tokens.collect();

    let arity = |expected: &'static str| SyntaxErrorKind::Arity {
        mnemonic: opcode.mnemonic(),
        expected,
        found: operands.len(),
    };

    let instruction = match opcode {
        Opcode::Eat | Opcode::Go | Opcode::Str => {
            let count = match operands.as_slice() {
                [] => Count::Fixed(1),
                [operand] => parse_count(operand)?,
                _ => return Err(arity("0 or 1")),
            };
            match opcode {
                Opcode::Eat => Instruction::Eat(count),
                Opcode::Go => Instruction::Go(count),
                _ => Instruction::Str(count),
            }
        }
        Opcode::Clon | Opcode::Left | Opcode::Right | Opcode::Back | Opcode::Turn => {
            if !operands.is_empty() {
                return Err(arity("0"));
            }
            match opcode {
                Opcode::Clon => Instruction::Clon,
                Opcode::Left => Instruction::Left,
                Opcode::Right => Instruction::Right,
                Opcode::Back => Instruction::Back,
                _ => Instruction::Turn,
            }
        }
        Opcode::Jg | Opcode::Jl => {
            let [threshold, target] = operands.as_slice() else {
                return Err(arity("2"));
            };
            let threshold = parse_threshold(threshold)?;
            let target = parse_number(target)?;
            if opcode == Opcode::Jg {
                Instruction::Jg { threshold, target }
            } else {
                Instruction::Jl { threshold, target }
            }
        }
        Opcode::J | Opcode::Je => {
            let [target] = operands.as_slice() else {
                return Err(arity("1"));
            };
            let target = parse_number(target)?;
            if opcode == Opcode::J {
                Instruction::J { target }
            } else {
                Instruction::Je { target }
            }
        }
    };

    Ok(instruction)
}

fn parse_count(token: &str) -> Result<Count, SyntaxErrorKind> {
    if token == "r" {
        return Ok(Count::Weight);
    }
    let n = parse_number(token)?;
    if (MIN_EXPLICIT_COUNT..=MAX_EXPLICIT_COUNT).contains(&n) {
        Ok(Count::Fixed(n))
    } else {
        Err(SyntaxErrorKind::CountOutOfRange(n))
    }
}

fn parse_number(token: &str) -> Result<u32, SyntaxErrorKind> {
    token
        .parse()
        .map_err(|_| SyntaxErrorKind::InvalidOperand(token.to_string()))
}

/// Weight thresholds may be negative; `-n` wraps to `2^32 - n`.
fn parse_threshold(token: &str) -> Result<u32, SyntaxErrorKind> {
    match token.strip_prefix('-') {
        Some(magnitude) if !magnitude.starts_with(['-', '+']) => parse_number(magnitude)
            .map(u32::wrapping_neg)
            .map_err(|_| SyntaxErrorKind::InvalidOperand(token.to_string())),
        _ => parse_number(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(source: &str) -> (usize, SyntaxErrorKind) {
        let err = assemble_str(source).unwrap_err();
        (err.line, err.kind)
    }

    #[test]
    fn test_unknown_mnemonic_reports_line_one() {
        assert_eq!(
            kind_of("walk"),
            (1, SyntaxErrorKind::UnknownMnemonic("walk".into()))
        );
    }

    #[test]
    fn test_self_jump_resolves_to_offset_zero() {
        let program = assemble_str("jg 5 0").unwrap();
        assert_eq!(program.words(), &[Opcode::Jg.word(), 5, 0]);
    }

    #[test]
    fn test_forward_jump_resolves_to_word_offset() {
        // line 0: eat (2 words), line 1: left (1), line 2: jl 10 0 (3), line 3: go r
        let program = assemble_str("eat\nleft\njl 10 3\ngo r\nj 1").unwrap();
        let listing: Vec<_> = program.instructions().collect();
        assert_eq!(
            listing,
            vec![
                (0, Instruction::Eat(Count::Fixed(1))),
                (2, Instruction::Left),
                (3, Instruction::Jl {
                    threshold: 10,
                    target: 6
                }),
                (6, Instruction::Go(Count::Weight)),
                (8, Instruction::J { target: 2 }),
            ]
        );
    }

    #[test]
    fn test_repeat_operand_encoding() {
        let program = assemble_str("eat\nstr r\ngo 42").unwrap();
        assert_eq!(
            program.words(),
            &[
                Opcode::Eat.word(),
                1,
                Opcode::Str.word(),
                0,
                Opcode::Go.word(),
                42
            ]
        );
    }

    #[test]
    fn test_count_range() {
        assert_eq!(kind_of("eat 1"), (1, SyntaxErrorKind::CountOutOfRange(1)));
        assert_eq!(kind_of("eat\ngo 100"), (2, SyntaxErrorKind::CountOutOfRange(100)));
        assert_eq!(kind_of("str 0"), (1, SyntaxErrorKind::CountOutOfRange(0)));
        assert!(assemble_str("go 2\ngo 99").is_ok());
    }

    #[test]
    fn test_jump_target_out_of_range() {
        assert_eq!(
            kind_of("eat\nj 2"),
            (2, SyntaxErrorKind::JumpOutOfRange { target: 2, lines: 2 })
        );
    }

    #[test]
    fn test_arity_errors() {
        assert!(matches!(
            kind_of("clon now"),
            (1, SyntaxErrorKind::Arity { mnemonic: "clon", found: 1, .. })
        ));
        assert!(matches!(
            kind_of("jg 5"),
            (1, SyntaxErrorKind::Arity { mnemonic: "jg", found: 1, .. })
        ));
        assert!(matches!(
            kind_of("eat 2 3"),
            (1, SyntaxErrorKind::Arity { mnemonic: "eat", found: 2, .. })
        ));
        assert!(matches!(
            kind_of("left 2"),
            (1, SyntaxErrorKind::Arity { mnemonic: "left", .. })
        ));
    }

    #[test]
    fn test_register_marker_only_for_counts() {
        assert_eq!(
            kind_of("j r"),
            (1, SyntaxErrorKind::InvalidOperand("r".into()))
        );
        assert_eq!(
            kind_of("go x"),
            (1, SyntaxErrorKind::InvalidOperand("x".into()))
        );
    }

    #[test]
    fn test_negative_threshold_wraps() {
        let program = assemble_str("jg -1 1\njl -0 0").unwrap();
        assert_eq!(
            program.words(),
            &[Opcode::Jg.word(), u32::MAX, 3, Opcode::Jl.word(), 0, 0]
        );
        assert_eq!(
            kind_of("jg --1 0"),
            (1, SyntaxErrorKind::InvalidOperand("--1".into()))
        );
        assert_eq!(
            kind_of("jl - 0"),
            (1, SyntaxErrorKind::InvalidOperand("-".into()))
        );
        // Only thresholds wrap; jump targets stay non-negative.
        assert_eq!(
            kind_of("jg 5 -1"),
            (1, SyntaxErrorKind::InvalidOperand("-1".into()))
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(kind_of(""), (0, SyntaxErrorKind::EmptyProgram));
        assert_eq!(kind_of("eat\n\ngo"), (2, SyntaxErrorKind::EmptyLine));
    }

    #[test]
    fn test_whitespace_tolerance() {
        let program = assemble_str("  go\t3  \r\njg  1   0\r").unwrap();
        assert_eq!(
            program.words(),
            &[Opcode::Go.word(), 3, Opcode::Jg.word(), 1, 0]
        );
    }
}
