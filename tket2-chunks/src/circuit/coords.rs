//! Planar qubit coordinates.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A position in the plane.
///
/// Coordinates are totally ordered (x first, then y) so they can key ordered
/// maps. `-0.0` and `0.0` compare equal.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Coord {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Coord {
    /// Create a new coordinate.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The components with negative zeros normalised.
    #[inline]
    fn canonical(self) -> (f64, f64) {
        (self.x + 0.0, self.y + 0.0)
    }

    /// The mean of a set of coordinates, or `None` if the set is empty.
    pub fn mean(coords: impl IntoIterator<Item = Coord>) -> Option<Coord> {
        let (n, sx, sy) = coords
            .into_iter()
            .fold((0usize, 0.0, 0.0), |(n, sx, sy), c| (n + 1, sx + c.x, sy + c.y));
        (n > 0).then(|| Coord::new(sx / n as f64, sy / n as f64))
    }

    /// The coordinate as annotation arguments.
    pub fn to_vec(self) -> Vec<f64> {
        vec![self.x, self.y]
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coord {}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        let (ax, ay) = self.canonical();
        let (bx, by) = other.canonical();
        ax.total_cmp(&bx).then_with(|| ay.total_cmp(&by))
    }
}

impl Hash for Coord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let (x, y) = self.canonical();
        x.to_bits().hash(state);
        y.to_bits().hash(state);
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
