// Read access to the block world, plus a dense grid implementation.
//
// The engine only ever reads the world, through the `BlockView` trait.
// Hosts implement `block()`, the vertical build limits and the sea level;
// everything else (fluid lookup, box collision, floor level, raw path type)
// is provided on top of those.
//
// `BlockGrid` is a dense in-memory implementation stored as a flat
// `Vec<Block>` indexed by `x + z * size_x + y * size_x * size_z`.
// Out-of-bounds reads return `Air`; out-of-bounds writes are no-ops. Grids
// can be built from ASCII layers (bottom layer first, rows along Z,
// characters along X) using the glyphs in `block.rs`. Tests, benches and
// scenario files all describe worlds that way.
//
// See also: `path_type.rs` for how cells are classified, `scenario.rs`
// which builds grids from JSON.

use crate::block::{Block, Fluid};
use crate::path_type::{self, PathType};
use crate::types::{Aabb, BlockPos};
use std::fmt;

/// Read-only view of a block world.
///
/// Valid cells have `min_y() <= y < max_y()`. A view may answer for cells
/// outside that range; the search simply never starts there.
pub trait BlockView {
    fn block(&self, pos: BlockPos) -> Block;

    /// Lowest buildable Y (inclusive).
    fn min_y(&self) -> i32;

    /// Build height (exclusive).
    fn max_y(&self) -> i32;

    fn sea_level(&self) -> i32;

    fn is_empty(&self, pos: BlockPos) -> bool {
        self.block(pos).is_air()
    }

    fn is_solid(&self, pos: BlockPos) -> bool {
        self.block(pos).is_full_cube()
    }

    fn fluid(&self, pos: BlockPos) -> Fluid {
        self.block(pos).fluid()
    }

    /// Y of the topmost block with a collision shape in the column at
    /// (`x`, `z`), if any.
    fn highest_solid_y(&self, x: i32, z: i32) -> Option<i32> {
        (self.min_y()..self.max_y())
            .rev()
            .find(|&y| self.block(BlockPos::new(x, y, z)).collision_height() > 0.0)
    }

    /// Classification of a single block, ignoring its surroundings.
    fn raw_path_type(&self, pos: BlockPos) -> PathType {
        path_type::raw_path_type(self.block(pos))
    }

    /// Height an agent standing in `pos` has its feet at: the top of the
    /// collision shape of the block below.
    fn floor_level(&self, pos: BlockPos) -> f64 {
        let below = pos.below();
        below.y as f64 + self.block(below).collision_height()
    }

    /// Whether any block's collision box overlaps `bb`.
    fn collides(&self, bb: &Aabb) -> bool {
        let x0 = bb.min.x.floor() as i32;
        let x1 = bb.max.x.ceil() as i32;
        let z0 = bb.min.z.floor() as i32;
        let z1 = bb.max.z.ceil() as i32;
        // Fences reach half a block into the cell above them.
        let y0 = bb.min.y.floor() as i32 - 1;
        let y1 = bb.max.y.ceil() as i32;
        for y in y0..y1 {
            for z in z0..z1 {
                for x in x0..x1 {
                    let height = self.block(BlockPos::new(x, y, z)).collision_height();
                    if height <= 0.0 {
                        continue;
                    }
                    let shape = Aabb::new(
                        x as f64,
                        y as f64,
                        z as f64,
                        x as f64 + 1.0,
                        y as f64 + height,
                        z as f64 + 1.0,
                    );
                    if shape.intersects(bb) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Dense grid
// ---------------------------------------------------------------------------

/// Failure to build a grid from glyph layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    UnknownGlyph { glyph: char, layer: usize, row: usize },
    RaggedLayer { layer: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::UnknownGlyph { glyph, layer, row } => {
                write!(f, "unknown block glyph {glyph:?} in layer {layer}, row {row}")
            }
            GridError::RaggedLayer { layer } => {
                write!(f, "layer {layer} does not match the size of layer 0")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Dense 3D block grid with its origin at (0, 0, 0).
#[derive(Clone, Debug, Default)]
pub struct BlockGrid {
    /// Flat storage: index = x + z * size_x + y * size_x * size_z.
    blocks: Vec<Block>,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
    pub sea_level: i32,
}

impl BlockGrid {
    /// Create a grid filled with `Air`.
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = (size_x as usize) * (size_y as usize) * (size_z as usize);
        Self {
            blocks: vec![Block::Air; total],
            size_x,
            size_y,
            size_z,
            sea_level: 0,
        }
    }

    /// Build a grid from glyph layers, bottom layer first. Each layer is a
    /// list of rows (Z), each row a string of glyphs (X). Every layer must
    /// have the same shape as the first.
    pub fn from_layers<L, R>(layers: &[L]) -> Result<Self, GridError>
    where
        L: AsRef<[R]>,
        R: AsRef<str>,
    {
        let size_z = layers.first().map_or(0, |l| l.as_ref().len());
        let size_x = layers
            .first()
            .and_then(|l| l.as_ref().first())
            .map_or(0, |row| row.as_ref().chars().count());
        let mut grid = Self::new(size_x as u32, layers.len() as u32, size_z as u32);
        for (y, layer) in layers.iter().enumerate() {
            let rows = layer.as_ref();
            if rows.len() != size_z {
                return Err(GridError::RaggedLayer { layer: y });
            }
            for (z, row) in rows.iter().enumerate() {
                let row = row.as_ref();
                if row.chars().count() != size_x {
                    return Err(GridError::RaggedLayer { layer: y });
                }
                for (x, glyph) in row.chars().enumerate() {
                    let block = Block::from_glyph(glyph).ok_or(GridError::UnknownGlyph {
                        glyph,
                        layer: y,
                        row: z,
                    })?;
                    grid.set(BlockPos::new(x as i32, y as i32, z as i32), block);
                }
            }
        }
        Ok(grid)
    }

    pub fn with_sea_level(mut self, sea_level: i32) -> Self {
        self.sea_level = sea_level;
        self
    }

    pub fn in_bounds(&self, pos: BlockPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && (pos.x as u32) < self.size_x
            && (pos.y as u32) < self.size_y
            && (pos.z as u32) < self.size_z
    }

    fn index(&self, pos: BlockPos) -> Option<usize> {
        if self.in_bounds(pos) {
            let sx = self.size_x as usize;
            let sz = self.size_z as usize;
            Some(pos.x as usize + pos.z as usize * sx + pos.y as usize * sx * sz)
        } else {
            None
        }
    }

    /// Read a block. Returns `Air` for out-of-bounds coordinates.
    pub fn get(&self, pos: BlockPos) -> Block {
        self.index(pos).map_or(Block::Air, |i| self.blocks[i])
    }

    /// Write a block. No-op for out-of-bounds coordinates.
    pub fn set(&mut self, pos: BlockPos, block: Block) {
        if let Some(i) = self.index(pos) {
            self.blocks[i] = block;
        }
    }

    /// Set every cell in the inclusive box spanned by `a` and `b`.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, block: Block) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    self.set(BlockPos::new(x, y, z), block);
                }
            }
        }
    }

    /// Render one Y layer back to glyph rows.
    pub fn layer_glyphs(&self, y: i32) -> Vec<String> {
        (0..self.size_z as i32)
            .map(|z| {
                (0..self.size_x as i32)
                    .map(|x| self.get(BlockPos::new(x, y, z)).glyph())
                    .collect()
            })
            .collect()
    }
}

impl BlockView for BlockGrid {
    fn block(&self, pos: BlockPos) -> Block {
        self.get(pos)
    }

    fn min_y(&self) -> i32 {
        0
    }

    fn max_y(&self) -> i32 {
        self.size_y as i32
    }

    fn sea_level(&self) -> i32 {
        self.sea_level
    }
}
