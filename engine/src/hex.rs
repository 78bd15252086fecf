// ═══════════════════════════════════════════════════════════════════════
// Axial hex coordinate math — pure functions, no game state.
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// The six axial direction offsets, clockwise from east.
pub const DIRECTIONS: [HexCoord; 6] = [
    HexCoord { q: 1, r: 0 },
    HexCoord { q: 1, r: -1 },
    HexCoord { q: 0, r: -1 },
    HexCoord { q: -1, r: 0 },
    HexCoord { q: -1, r: 1 },
    HexCoord { q: 0, r: 1 },
];

/// An axial coordinate on the hex grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> HexCoord {
        HexCoord { q, r }
    }

    /// The 6 adjacent coordinates.
    pub fn neighbors(self) -> [HexCoord; 6] {
        [
            self + DIRECTIONS[0],
            self + DIRECTIONS[1],
            self + DIRECTIONS[2],
            self + DIRECTIONS[3],
            self + DIRECTIONS[4],
            self + DIRECTIONS[5],
        ]
    }

    /// Hex distance: `(|dq| + |dq+dr| + |dr|) / 2`.
    pub fn distance(self, other: HexCoord) -> u32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        ((dq.abs() + (dq + dr).abs() + dr.abs()) / 2) as u32
    }

    /// Stable key for hash-map lookups.
    pub fn key(self) -> (i32, i32) {
        (self.q, self.r)
    }

    /// Whether this coordinate lies on a hexagonal board of the given radius.
    pub fn in_radius(self, size: i32) -> bool {
        self.q.abs() <= size && self.r.abs() <= size && (self.q + self.r).abs() <= size
    }
}

impl Add<HexCoord> for HexCoord {
    type Output = HexCoord;
    fn add(self, rhs: HexCoord) -> HexCoord {
        HexCoord { q: self.q + rhs.q, r: self.r + rhs.r }
    }
}

impl Sub<HexCoord> for HexCoord {
    type Output = HexCoord;
    fn sub(self, rhs: HexCoord) -> HexCoord {
        HexCoord { q: self.q - rhs.q, r: self.r - rhs.r }
    }
}
