//! Spatial operations on the dispatch grid.
//!
//! This module provides:
//!
//! - **Location**: an integer `(x, y)` cell on the grid
//! - **GridBounds**: the `[0, max)` bound every location must respect
//! - **Distance calculations**: Euclidean and Manhattan distance between cells
//! - **Stepping**: one-cell movement toward a target with axis priority
//!
//! The default grid is 100 x 100 (coordinates `0..=99`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exclusive upper bound for both coordinates on the default grid.
pub const GRID_MAX: i32 = 100;

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance. Used for ranking so comparisons stay exact.
    pub fn distance_squared(self, other: Location) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    pub fn euclidean_distance(self, other: Location) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// Number of 4-neighbour grid steps between two cells.
    pub fn manhattan_distance(self, other: Location) -> i64 {
        (i64::from(self.x) - i64::from(other.x)).abs()
            + (i64::from(self.y) - i64::from(other.y)).abs()
    }

    /// Moves one cell toward `target`.
    ///
    /// The axis with the larger remaining delta moves first; on a tie x moves.
    /// Returns `self` unchanged when already at the target.
    pub fn step_toward(self, target: Location) -> Location {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        if dx == 0 && dy == 0 {
            return self;
        }
        if dx.abs() >= dy.abs() {
            Location::new(self.x + dx.signum(), self.y)
        } else {
            Location::new(self.x, self.y + dy.signum())
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Grid bound shared by registration and ride requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    max: i32,
}

impl GridBounds {
    /// Bound of `[0, max)` on both axes. A non-positive `max` yields an empty grid.
    pub fn new(max: i32) -> Self {
        Self { max: max.max(0) }
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, location: Location) -> bool {
        (0..self.max).contains(&location.x) && (0..self.max).contains(&location.y)
    }
}

impl Default for GridBounds {
    fn default() -> Self {
        Self::new(GRID_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_prefers_larger_axis_delta() {
        let start = Location::new(2, 5);
        assert_eq!(start.step_toward(Location::new(5, 6)), Location::new(3, 5));
        assert_eq!(start.step_toward(Location::new(3, 9)), Location::new(2, 6));
        assert_eq!(start.step_toward(Location::new(0, 3)), Location::new(1, 5));
    }

    #[test]
    fn step_never_overshoots() {
        let target = Location::new(4, 4);
        let mut current = Location::new(0, 9);
        let mut steps = 0;
        while current != target {
            let next = current.step_toward(target);
            assert_eq!(next.manhattan_distance(target) + 1, current.manhattan_distance(target));
            current = next;
            steps += 1;
        }
        assert_eq!(steps, 9);
        assert_eq!(target.step_toward(target), target);
    }

    #[test]
    fn bounds_are_half_open() {
        let bounds = GridBounds::default();
        assert!(bounds.contains(Location::new(0, 0)));
        assert!(bounds.contains(Location::new(99, 99)));
        assert!(!bounds.contains(Location::new(100, 0)));
        assert!(!bounds.contains(Location::new(0, -1)));
        assert!(!GridBounds::new(-3).contains(Location::new(0, 0)));
    }

    #[test]
    fn euclidean_and_manhattan_agree_on_axis() {
        let a = Location::new(1, 1);
        let b = Location::new(1, 4);
        assert_eq!(a.euclidean_distance(b), 3.0);
        assert_eq!(a.manhattan_distance(b), 3);
        assert_eq!(Location::new(0, 0).distance_squared(Location::new(3, 4)), 25);
    }
}
