//! Integer block positions and neighbourhood offsets.
//!
//! Every registry in the engine is keyed by [`BlockPos`]. Positions are plain
//! values: copied freely, compared and hashed by coordinate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer (x, y, z) block coordinate. `y` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// Create a new block position
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position shifted by the given deltas. Wraps at the `i32` edges.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(
            self.x.wrapping_add(dx),
            self.y.wrapping_add(dy),
            self.z.wrapping_add(dz),
        )
    }

    /// Position `levels` blocks straight below this one
    pub const fn below(self, levels: i32) -> Self {
        self.offset(0, -levels, 0)
    }

    /// Position `levels` blocks straight above this one
    pub const fn above(self, levels: i32) -> Self {
        self.offset(0, levels, 0)
    }

    /// Euclidean distance in the horizontal (x, z) plane
    pub fn horizontal_distance(self, other: Self) -> f32 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dz = f64::from(self.z) - f64::from(other.z);
        (dx * dx + dz * dz).sqrt() as f32
    }

    /// All 26 face, edge and corner neighbours in a fixed order
    pub fn neighbors(self) -> impl Iterator<Item = BlockPos> {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(dx, dy, dz)| self.offset(dx, dy, dz))
    }

    /// The 8 horizontal neighbours on the same row, in a fixed order
    pub fn horizontal_neighbors(self) -> impl Iterator<Item = BlockPos> {
        HORIZONTAL_OFFSETS
            .iter()
            .map(move |&(dx, dz)| self.offset(dx, 0, dz))
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Offsets of the 26-connected neighbourhood, ordered by (dx, dy, dz)
pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 26] = build_neighbor_offsets();

/// Offsets of the 8-connected horizontal ring, ordered by (dx, dz)
pub const HORIZONTAL_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const fn build_neighbor_offsets() -> [(i32, i32, i32); 26] {
    let mut out = [(0, 0, 0); 26];
    let mut i = 0;
    let mut dx = -1;
    while dx <= 1 {
        let mut dy = -1;
        while dy <= 1 {
            let mut dz = -1;
            while dz <= 1 {
                if dx != 0 || dy != 0 || dz != 0 {
                    out[i] = (dx, dy, dz);
                    i += 1;
                }
                dz += 1;
            }
            dy += 1;
        }
        dx += 1;
    }
    out
}
