use rand::distr::{Distribution, StandardUniform};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A board cell. `row` grows southwards, `col` grows eastwards.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    #[inline(always)]
    pub fn new(row: usize, col: usize) -> Self { Self { row, col } }

    #[inline(always)]
    pub fn index(self, cols: usize) -> usize { self.row * cols + self.col }

    #[inline(always)]
    pub fn from_index(idx: usize, cols: usize) -> Self { Self::new(idx / cols, idx % cols) }

    #[inline(always)]
    pub fn in_bounds(self, rows: usize, cols: usize) -> bool { self.row < rows && self.col < cols }

    /// The neighbouring cell in `direction`, or `None` when it lies off a `rows` x `cols` board.
    pub fn step(self, direction: Direction, rows: usize, cols: usize) -> Option<Position> {
        let (dr, dc) = direction.offset();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        let next = Position::new(row, col);
        next.in_bounds(rows, cols).then_some(next)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::North, Direction::South, Direction::East, Direction::West];

    /// (row, col) delta of a single step.
    #[inline(always)]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }

    #[inline(always)]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }
}

impl Distribution<Direction> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        Direction::ALL[rng.random_range(0..Direction::ALL.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn step_stays_on_board() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.step(Direction::North, 2, 2), None);
        assert_eq!(corner.step(Direction::West, 2, 2), None);
        assert_eq!(corner.step(Direction::East, 2, 2), Some(Position::new(0, 1)));
        assert_eq!(corner.step(Direction::South, 2, 2), Some(Position::new(1, 0)));

        let far = Position::new(1, 1);
        assert_eq!(far.step(Direction::South, 2, 2), None);
        assert_eq!(far.step(Direction::East, 2, 2), None);
    }

    #[test]
    fn index_round_trips_through_row_major_layout() {
        let p = Position::new(3, 5);
        assert_eq!(p.index(7), 26);
        assert_eq!(Position::from_index(26, 7), p);
    }

    #[test]
    fn random_directions_cover_all_four() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let d: Direction = rng.random();
            seen[Direction::ALL.iter().position(|&x| x == d).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
