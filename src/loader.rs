//! Program loading: path to bytecode.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::LoadError;
use crate::isa::{assemble, Program};

/// Turns a program path into bytecode.
pub trait ProgramLoader {
    /// Load the program at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be read or does not assemble.
    fn load(&self, path: &Path) -> Result<Program, LoadError>;
}

/// Reads and assembles program files from disk.
///
/// Each path is assembled once; later loads of the same path share the
/// compiled program.
#[derive(Debug, Default)]
pub struct FsLoader {
    cache: Mutex<HashMap<PathBuf, Program>>,
}

impl FsLoader {
    /// Create a loader with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgramLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<Program, LoadError> {
        if let Some(program) = self.cache.lock().ok().and_then(|c| c.get(path).cloned()) {
            return Ok(program);
        }

        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let program = assemble(source.lines()).map_err(|source| LoadError::Syntax {
            path: path.to_path_buf(),
            source,
        })?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(path.to_path_buf(), program.clone());
        }
        Ok(program)
    }
}
