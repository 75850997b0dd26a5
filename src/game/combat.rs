//! Enemy search and damage rolls.
//!
//! A unit looks for a target in its 8-neighbourhood, clockwise from the cell
//! ahead. The first occupant found is the target, whatever its league.

use rand::Rng;

use crate::game::{UnitId, World};

/// Smallest damage a strike deals.
pub const MIN_DAMAGE: i64 = 3;

/// The first occupied neighbour, searching clockwise from ahead.
#[must_use]
pub fn find_enemy(world: &World, id: UnitId) -> Option<UnitId> {
    let unit = world.unit(id)?;
    world
        .board()
        .ring(unit.position, unit.direction)
        .find_map(|coord| world.occupant(coord))
}

/// Damage dealt by an attacker of the given weight: uniform in
/// `[MIN_DAMAGE, MIN_DAMAGE + weight / 2]`.
pub fn roll_damage<R: Rng + ?Sized>(rng: &mut R, attacker_weight: i64) -> i64 {
    let max = MIN_DAMAGE + attacker_weight.max(0) / 2;
    rng.random_range(MIN_DAMAGE..=max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{world_with, Placement};
    use crate::game::{Coord, Direction};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_damage_bounds() {
        let mut rng = SmallRng::seed_from_u64(1);
        for weight in [0, 1, 2, 7, 30, 1000] {
            for _ in 0..200 {
                let dmg = roll_damage(&mut rng, weight);
                assert!(dmg >= MIN_DAMAGE);
                assert!(dmg <= MIN_DAMAGE + weight / 2);
            }
        }
        assert_eq!(roll_damage(&mut rng, -4), MIN_DAMAGE);
    }

    #[test]
    fn test_no_enemy_when_alone() {
        let (world, ids) = world_with(
            3,
            3,
            &[("eat", &[Placement::new(1, 1, Direction::North, 10)])],
        );
        assert_eq!(find_enemy(&world, ids[0][0]), None);
    }

    #[test]
    fn test_search_order_is_clockwise_from_ahead() {
        // Attacker faces east at (2,2). Enemies behind-left (1,1) and right (2,3).
        // Right comes before behind-left in the clockwise probe.
        let (world, ids) = world_with(
            5,
            5,
            &[
                ("eat", &[Placement::new(2, 2, Direction::East, 10)]),
                (
                    "eat",
                    &[
                        Placement::new(1, 1, Direction::North, 10),
                        Placement::new(2, 3, Direction::North, 10),
                    ],
                ),
            ],
        );
        assert_eq!(find_enemy(&world, ids[0][0]), Some(ids[1][1]));
    }

    #[test]
    fn test_friend_ahead_is_the_target() {
        let (world, ids) = world_with(
            5,
            5,
            &[
                (
                    "eat",
                    &[
                        Placement::new(2, 2, Direction::North, 10),
                        Placement::new(2, 1, Direction::North, 10),
                    ],
                ),
                ("eat", &[Placement::new(1, 3, Direction::North, 10)]),
            ],
        );
        assert_eq!(find_enemy(&world, ids[0][0]), Some(ids[0][1]));
    }

    #[test]
    fn test_first_occupant_wins_whatever_league() {
        // Facing south at (2,2): ahead is (2,3), then (1,3) clockwise.
        // A friend at (1,3) comes before an enemy at (3,2).
        let (world, ids) = world_with(
            5,
            5,
            &[
                (
                    "eat",
                    &[
                        Placement::new(2, 2, Direction::South, 10),
                        Placement::new(1, 3, Direction::North, 10),
                    ],
                ),
                ("eat", &[Placement::new(3, 2, Direction::North, 10)]),
            ],
        );
        assert_eq!(find_enemy(&world, ids[0][0]), Some(ids[0][1]));
        assert_eq!(find_enemy(&world, ids[1][0]), Some(ids[0][0]));
        assert_eq!(
            world.unit(ids[0][1]).map(|u| u.position),
            Some(Coord::new(1, 3))
        );
    }

    #[test]
    fn test_search_at_corner() {
        let (world, ids) = world_with(
            4,
            4,
            &[
                ("eat", &[Placement::new(0, 0, Direction::North, 10)]),
                ("eat", &[Placement::new(1, 1, Direction::North, 10)]),
            ],
        );
        assert_eq!(find_enemy(&world, ids[0][0]), Some(ids[1][0]));
        assert_eq!(find_enemy(&world, ids[1][0]), Some(ids[0][0]));
    }
}
