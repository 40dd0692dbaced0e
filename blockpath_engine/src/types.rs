// Core spatial types shared across the engine.
//
// Defines integer block coordinates (`BlockPos`), continuous positions
// (`Vec3`), axis-aligned boxes (`Aabb`) and the six face `Direction`s. All
// types are plain `Copy` values; `BlockPos` and `Vec3` derive `Serialize`
// and `Deserialize` so they can appear in scenario files and debug dumps.
//
// The coordinate system matches the block world it navigates:
// - X: east  (positive) / west  (negative)
// - Y: up    (positive) / down  (negative)
// - Z: south (positive) / north (negative)
//
// See also: `node.rs` which keys its coordinate cache on `BlockPos::as_long`,
// `world.rs` for the `BlockView` query trait that consumes these types.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Block coordinates
// ---------------------------------------------------------------------------

/// A cell in the block grid. Each component is in block units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

const PACKED_XZ_BITS: u32 = 26;
const PACKED_Y_BITS: u32 = 12;
const PACKED_XZ_MASK: i64 = (1 << PACKED_XZ_BITS) - 1;
const PACKED_Y_MASK: i64 = (1 << PACKED_Y_BITS) - 1;
const PACKED_Z_SHIFT: u32 = PACKED_Y_BITS;
const PACKED_X_SHIFT: u32 = PACKED_Y_BITS + PACKED_XZ_BITS;

impl BlockPos {
    pub const ZERO: Self = Self::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell containing a continuous position.
    pub fn containing(x: f64, y: f64, z: f64) -> Self {
        Self::new(x.floor() as i32, y.floor() as i32, z.floor() as i32)
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    pub const fn relative(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.step();
        self.offset(dx, dy, dz)
    }

    /// Manhattan distance between two cells.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }

    /// Straight-line distance between two cells.
    pub fn distance_to(self, other: Self) -> f32 {
        self.distance_sqr(other).sqrt()
    }

    pub fn distance_sqr(self, other: Self) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        let dz = (other.z - self.z) as f32;
        dx * dx + dy * dy + dz * dz
    }

    /// Chebyshev distance: the step count of an unobstructed 8-connected walk
    /// (horizontal) plus the vertical difference handled in the same steps.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
            .max((self.z - other.z).unsigned_abs())
    }

    /// Pack into a single `i64`: 26 bits of X, 26 bits of Z, 12 bits of Y.
    ///
    /// Unique for |x|, |z| < 2^25 and |y| < 2^11, which covers any world the
    /// engine searches. Used as the key of every per-search coordinate cache.
    pub fn as_long(self) -> i64 {
        ((self.x as i64 & PACKED_XZ_MASK) << PACKED_X_SHIFT)
            | (self.y as i64 & PACKED_Y_MASK)
            | ((self.z as i64 & PACKED_XZ_MASK) << PACKED_Z_SHIFT)
    }

    /// Centre of the bottom face of this cell.
    pub fn bottom_center(self) -> Vec3 {
        Vec3::new(self.x as f64 + 0.5, self.y as f64, self.z as f64 + 0.5)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Continuous positions and boxes
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(x0: f64, y0: f64, z0: f64, x1: f64, y1: f64, z1: f64) -> Self {
        Self {
            min: Vec3::new(x0.min(x1), y0.min(y1), z0.min(z1)),
            max: Vec3::new(x0.max(x1), y0.max(y1), z0.max(z1)),
        }
    }

    /// Box of the given footprint standing with its bottom centre at `feet`.
    pub fn standing_at(feet: Vec3, width: f64, height: f64) -> Self {
        let half = width / 2.0;
        Self::new(
            feet.x - half,
            feet.y,
            feet.z - half,
            feet.x + half,
            feet.y + height,
            feet.z + half,
        )
    }

    pub fn moved(self, delta: Vec3) -> Self {
        Self {
            min: Vec3::new(self.min.x + delta.x, self.min.y + delta.y, self.min.z + delta.z),
            max: Vec3::new(self.max.x + delta.x, self.max.y + delta.y, self.max.z + delta.z),
        }
    }

    /// Mean edge length.
    pub fn size(&self) -> f64 {
        ((self.max.x - self.min.x) + (self.max.y - self.min.y) + (self.max.z - self.min.z)) / 3.0
    }

    /// Strict overlap test: boxes that only touch along a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Bit pattern of all six bounds, for exact-match caching.
    pub fn cache_key(&self) -> [u64; 6] {
        [
            self.min.x.to_bits(),
            self.min.y.to_bits(),
            self.min.z.to_bits(),
            self.max.x.to_bits(),
            self.max.y.to_bits(),
            self.max.z.to_bits(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

/// One of the six face directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// All six directions, vertical first.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The four horizontal directions in clockwise order starting north.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const fn step(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    pub const fn step_x(self) -> i32 {
        self.step().0
    }

    pub const fn step_z(self) -> i32 {
        self.step().2
    }

    /// Index into `Direction::ALL`.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rotate a horizontal direction 90 degrees clockwise (seen from above).
    /// Vertical directions are returned unchanged.
    pub const fn clockwise(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
            other => other,
        }
    }
}
