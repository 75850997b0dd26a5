//! Error types for program assembly, loading and world setup.
//!
//! Runtime failures inside the arena (blocked moves, deaths, extinct leagues)
//! are ordinary state transitions and never show up here.

use std::path::PathBuf;

use thiserror::Error;

/// Why a source line failed to assemble.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// The program has no lines at all.
    #[error("program is empty")]
    EmptyProgram,
    /// The line has no mnemonic.
    #[error("empty line")]
    EmptyLine,
    /// The mnemonic is not part of the instruction set.
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    /// Wrong number of operands for the mnemonic.
    #[error("`{mnemonic}` takes {expected} operand(s), found {found}")]
    Arity {
        /// The mnemonic on the line.
        mnemonic: &'static str,
        /// Human readable operand shape, e.g. "0 or 1".
        expected: &'static str,
        /// Operands actually present.
        found: usize,
    },
    /// An operand is not a number (or `r` where allowed).
    #[error("invalid operand `{0}`")]
    InvalidOperand(String),
    /// An explicit repeat count outside [2, 99].
    #[error("repeat count {0} out of range 2..=99")]
    CountOutOfRange(u32),
    /// A jump names a source line that does not exist.
    #[error("jump target line {target} out of range (program has {lines} lines)")]
    JumpOutOfRange {
        /// The 0-based line index named by the jump.
        target: u32,
        /// Number of lines in the program.
        lines: usize,
    },
}

/// An assembly failure pinned to a 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}: syntax error: {kind}")]
pub struct SyntaxError {
    /// 1-based line number (0 for whole-program errors).
    pub line: usize,
    /// What went wrong.
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    /// Create a new syntax error at `line`.
    #[must_use]
    pub fn new(line: usize, kind: SyntaxErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Raw words that do not form a valid program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Unknown opcode word at the given offset.
    #[error("invalid opcode {word} at offset {offset}")]
    InvalidOpcode {
        /// Offending word.
        word: u32,
        /// Word offset of the opcode.
        offset: usize,
    },
    /// The instruction's operands run past the end of the program.
    #[error("truncated instruction at offset {0}")]
    Truncated(usize),
    /// A jump target is not an offset inside the program.
    #[error("jump target {target} out of range at offset {offset}")]
    JumpOutOfRange {
        /// The offending target.
        target: u32,
        /// Word offset of the jump instruction.
        offset: usize,
    },
    /// The program has no words.
    #[error("program is empty")]
    Empty,
}

/// Failure to load a program file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file does not assemble.
    #[error("{}:{}", path.display(), source)]
    Syntax {
        /// File that failed to assemble.
        path: PathBuf,
        /// Assembly error with the line number.
        #[source]
        source: SyntaxError,
    },
}

impl LoadError {
    /// The path of the program that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Syntax { path, .. } => path,
        }
    }

    /// The 1-based line of a syntax error, if that is what failed.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Io { .. } => None,
            Self::Syntax { source, .. } => Some(source.line),
        }
    }
}

/// Malformed or inconsistent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The JSON is malformed or has unknown/mistyped members.
    #[error("{}: {source}", path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The configuration parsed but is not usable.
    #[error("{0}")]
    Invalid(String),
}

/// Failure while building a world from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A unit kind's program failed to load.
    #[error("league `{league}`, kind `{kind}`: {source}")]
    Program {
        /// League that owns the kind.
        league: String,
        /// Unit kind whose program failed.
        kind: String,
        /// The load failure.
        #[source]
        source: LoadError,
    },
}
