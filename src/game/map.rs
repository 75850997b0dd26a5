//! Grid geometry and the occupancy index.

use rand::Rng;

use crate::game::UnitId;

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// The cell displaced by `(dx, dy)`, if it lies inside a `width` x `height` grid.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32, width: u16, height: u16) -> Option<Coord> {
        let x = i32::from(self.x) + dx;
        let y = i32::from(self.y) + dy;
        let x = u16::try_from(x).ok().filter(|&x| x < width)?;
        let y = u16::try_from(y).ok().filter(|&y| y < height)?;
        Some(Coord::new(x, y))
    }
}

/// Facing of a unit. Rotation is cyclic in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Towards row 0.
    North = 0,
    /// Towards the last column.
    East = 1,
    /// Towards the last row.
    South = 2,
    /// Towards column 0.
    West = 3,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    const fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            _ => Direction::West,
        }
    }

    /// Rotate 90 degrees clockwise.
    #[must_use]
    pub const fn right(self) -> Self {
        Self::from_index(self as u8 + 1)
    }

    /// Rotate 90 degrees counterclockwise.
    #[must_use]
    pub const fn left(self) -> Self {
        Self::from_index(self as u8 + 3)
    }

    /// Rotate 180 degrees.
    #[must_use]
    pub const fn back(self) -> Self {
        Self::from_index(self as u8 + 2)
    }

    /// A uniformly random direction.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_index(rng.random_range(0..4u8))
    }

    /// Unit step `(dx, dy)` for this facing; y grows southwards.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// Map a north-relative offset into this facing's frame.
    ///
    /// `(dx, dy)` is expressed as if the unit faced north.
    #[must_use]
    pub const fn rotate(self, dx: i32, dy: i32) -> (i32, i32) {
        match self {
            Direction::North => (dx, dy),
            Direction::East => (-dy, dx),
            Direction::South => (-dx, -dy),
            Direction::West => (dy, -dx),
        }
    }
}

/// North-relative offsets of the 8-neighbourhood, clockwise from straight ahead.
const RING: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Occupancy index: which unit, if any, stands on each cell.
#[derive(Debug, Clone)]
pub struct Board {
    /// Width of the board in cells.
    width: u16,
    /// Height of the board in cells.
    height: u16,
    /// Occupants stored in row-major order.
    cells: Vec<Option<UnitId>>,
}

impl Board {
    /// Create an empty board.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let size = usize::from(width) * usize::from(height);
        Some(Self {
            width,
            height,
            cells: vec![None; size],
        })
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Check if a coordinate is within the board.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x))
        } else {
            None
        }
    }

    /// The unit standing on `coord`, if any.
    #[must_use]
    pub fn occupant(&self, coord: Coord) -> Option<UnitId> {
        self.index(coord).and_then(|idx| self.cells[idx])
    }

    /// True iff `coord` is in bounds and nobody stands there.
    #[must_use]
    pub fn is_free(&self, coord: Coord) -> bool {
        self.index(coord).is_some_and(|idx| self.cells[idx].is_none())
    }

    /// Record `occupant` on `coord`. Returns `false` if out of bounds.
    pub fn set(&mut self, coord: Coord, occupant: Option<UnitId>) -> bool {
        if let Some(idx) = self.index(coord) {
            self.cells[idx] = occupant;
            true
        } else {
            false
        }
    }

    /// The cell one step ahead of `from` when facing `direction`.
    #[must_use]
    pub fn ahead(&self, from: Coord, direction: Direction) -> Option<Coord> {
        let (dx, dy) = direction.delta();
        from.offset(dx, dy, self.width, self.height)
    }

    /// In-bounds cells of the 8-neighbourhood of `center`, clockwise from
    /// the cell ahead of `facing`.
    pub fn ring(&self, center: Coord, facing: Direction) -> impl Iterator<Item = Coord> + '_ {
        RING.iter().filter_map(move |&(dx, dy)| {
            let (dx, dy) = facing.rotate(dx, dy);
            center.offset(dx, dy, self.width, self.height)
        })
    }

    /// Iterate over every cell and its occupant in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Option<UnitId>)> + '_ {
        let width = usize::from(self.width);
        self.cells.iter().enumerate().map(move |(idx, cell)| {
            #[allow(clippy::cast_possible_truncation)]
            let coord = Coord::new((idx % width) as u16, (idx / width) as u16);
            (coord, *cell)
        })
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// A uniformly random free cell, or `None` if the board is full.
    pub fn random_free_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Coord> {
        let free = self.area() - self.occupied();
        if free == 0 {
            return None;
        }
        let nth = rng.random_range(0..free);
        self.iter()
            .filter(|(_, cell)| cell.is_none())
            .nth(nth)
            .map(|(coord, _)| coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use slotmap::SlotMap;

    #[test]
    fn test_board_creation() {
        let board = Board::new(10, 8).unwrap();
        assert_eq!(board.width(), 10);
        assert_eq!(board.height(), 8);
        assert_eq!(board.area(), 80);
        assert_eq!(board.occupied(), 0);
    }

    #[test]
    fn test_board_zero_size() {
        assert!(Board::new(0, 10).is_none());
        assert!(Board::new(10, 0).is_none());
    }

    #[test]
    fn test_bounds() {
        let board = Board::new(10, 10).unwrap();
        assert!(board.in_bounds(Coord::new(0, 0)));
        assert!(board.in_bounds(Coord::new(9, 9)));
        assert!(!board.in_bounds(Coord::new(10, 0)));
        assert!(!board.in_bounds(Coord::new(0, 10)));
        assert!(!board.is_free(Coord::new(10, 3)));
    }

    #[test]
    fn test_set_and_occupant() {
        let mut ids: SlotMap<UnitId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        let mut board = Board::new(4, 4).unwrap();
        let coord = Coord::new(2, 1);

        assert!(board.is_free(coord));
        assert!(board.set(coord, Some(id)));
        assert_eq!(board.occupant(coord), Some(id));
        assert!(!board.is_free(coord));
        assert_eq!(board.occupied(), 1);

        assert!(!board.set(Coord::new(4, 0), Some(id)));
        board.set(coord, None);
        assert!(board.is_free(coord));
    }

    #[test]
    fn test_rotation_cycle() {
        assert_eq!(Direction::North.right(), Direction::East);
        assert_eq!(Direction::West.right(), Direction::North);
        assert_eq!(Direction::North.left(), Direction::West);
        assert_eq!(Direction::East.back(), Direction::West);
        for dir in Direction::ALL {
            assert_eq!(dir.right().left(), dir);
            assert_eq!(dir.back().back(), dir);
        }
    }

    #[test]
    fn test_ahead_respects_edges() {
        let board = Board::new(5, 5).unwrap();
        let corner = Coord::new(0, 0);
        assert_eq!(board.ahead(corner, Direction::North), None);
        assert_eq!(board.ahead(corner, Direction::West), None);
        assert_eq!(board.ahead(corner, Direction::East), Some(Coord::new(1, 0)));
        assert_eq!(board.ahead(corner, Direction::South), Some(Coord::new(0, 1)));
    }

    #[test]
    fn test_ring_starts_ahead_and_goes_clockwise() {
        let board = Board::new(5, 5).unwrap();
        let center = Coord::new(2, 2);

        let east: Vec<_> = board.ring(center, Direction::East).collect();
        assert_eq!(
            east,
            vec![
                Coord::new(3, 2), // ahead
                Coord::new(3, 3), // ahead-right
                Coord::new(2, 3), // right
                Coord::new(1, 3),
                Coord::new(1, 2), // behind
                Coord::new(1, 1),
                Coord::new(2, 1), // left
                Coord::new(3, 1),
            ]
        );

        let north: Vec<_> = board.ring(center, Direction::North).collect();
        assert_eq!(north[0], Coord::new(2, 1));
        assert_eq!(north[1], Coord::new(3, 1));
        assert_eq!(north[2], Coord::new(3, 2));
    }

    #[test]
    fn test_ring_skips_out_of_bounds() {
        let board = Board::new(5, 5).unwrap();
        let ring: Vec<_> = board.ring(Coord::new(0, 0), Direction::South).collect();
        assert_eq!(ring.len(), 3);
        assert_eq!(ring[0], Coord::new(0, 1));
    }

    #[test]
    fn test_random_free_cell_fills_board() {
        let mut ids: SlotMap<UnitId, ()> = SlotMap::with_key();
        let mut board = Board::new(3, 3).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..9 {
            let coord = board.random_free_cell(&mut rng).unwrap();
            assert!(board.is_free(coord));
            board.set(coord, Some(ids.insert(())));
        }
        assert_eq!(board.random_free_cell(&mut rng), None);
    }
}
