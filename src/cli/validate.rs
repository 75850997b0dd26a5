//! Program validation command implementation.

use super::CliError;
use deathgame::loader::{FsLoader, ProgramLoader};
use std::path::PathBuf;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if any program fails to load or assemble.
pub(crate) fn execute(programs: &[PathBuf], listing: bool) -> Result<(), CliError> {
    let loader = FsLoader::new();
    let mut failed = 0usize;

    for path in programs {
        match loader.load(path) {
            Ok(program) => {
                let instructions = program.instructions().count();
                println!(
                    "  ✓ {}: OK ({instructions} instructions, {} words)",
                    path.display(),
                    program.len()
                );
                if listing {
                    for line in program.listing().lines() {
                        println!("      {line}");
                    }
                }
            }
            Err(e) => {
                failed += 1;
                println!("  ✗ {e}");
            }
        }
    }

    println!();
    if failed > 0 {
        return Err(CliError::new(format!(
            "{failed} of {} programs failed to assemble",
            programs.len()
        )));
    }

    println!("Validation successful!");
    Ok(())
}
