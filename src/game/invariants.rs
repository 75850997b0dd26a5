//! World invariants - consistency checks that detect bugs.
//!
//! These should never trigger. A violation means the board, the unit arena
//! and the league schedules disagree about who is where.

use std::collections::HashMap;

use crate::game::{LeagueId, UnitId, World};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all world invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(world: &World) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut violate = |message: String| violations.push(InvariantViolation { message });

    // Occupied cells hold living units recorded at that cell.
    for (coord, occupant) in world.board().iter() {
        let Some(id) = occupant else { continue };
        match world.unit(id) {
            None => violate(format!("cell {coord:?} holds unknown unit {id:?}")),
            Some(unit) if !unit.is_alive() => violate(format!(
                "cell {coord:?} holds dead unit {id:?} (weight {})",
                unit.weight
            )),
            Some(unit) if unit.position != coord => violate(format!(
                "cell {coord:?} holds unit {id:?} recorded at {:?}",
                unit.position
            )),
            Some(_) => {}
        }
    }

    // Living units are on the board at their position.
    for (id, unit) in world.units() {
        if unit.is_alive() && world.occupant(unit.position) != Some(id) {
            violate(format!(
                "living unit {id:?} at {:?} is missing from the board",
                unit.position
            ));
        }
    }

    // Every arena unit is scheduled by exactly one league, the one it belongs to.
    let mut owners: HashMap<UnitId, Vec<LeagueId>> = HashMap::new();
    for league in world.leagues().iter().chain(world.retired()) {
        for &id in league.units() {
            owners.entry(id).or_default().push(league.id());
            if world.unit(id).is_none() {
                violate(format!(
                    "league {} schedules freed unit {id:?}",
                    league.name()
                ));
            }
        }
    }
    for (id, unit) in world.units() {
        match owners.get(&id).map(Vec::as_slice) {
            Some([league]) if *league == unit.league => {}
            Some(leagues) => violate(format!(
                "unit {id:?} of league {} is scheduled by leagues {leagues:?}",
                unit.league
            )),
            None => violate(format!("unit {id:?} is not scheduled by any league")),
        }
    }

    violations
}

/// Assert all world invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(world: &World) {
    let violations = check_invariants(world);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("World invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_world: &World) {}
