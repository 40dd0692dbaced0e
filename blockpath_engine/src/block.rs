// Block vocabulary of the world the engine navigates.
//
// The engine never stores the world; it reads it through `BlockView`
// (see `world.rs`). What it reads is a `Block`, and everything the search
// needs to know about a block is derived here: whether it is air, which
// fluid it holds, how tall its collision shape is, whether it can be
// travelled through for a given mode of movement, and whether it burns.
//
// Collision shapes are modelled as full-width boxes of `collision_height()`
// starting at the block's bottom face. That is coarse for doors and cocoa,
// exact for everything else the engine cares about (floor level of the
// block below, step-up clearance, fence tops at 1.5).
//
// Every block has a one-character glyph so test worlds, benches and
// scenario files can be written as ASCII layers.

use serde::{Deserialize, Serialize};

/// Door hinge material. Wooden doors can be opened by agents; iron ones
/// cannot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorMaterial {
    Wood,
    Iron,
}

/// Fluid held in a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Fluid {
    #[default]
    Empty,
    Water,
    Lava,
}

/// How an agent means to pass through a cell: on foot or swimming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassMode {
    Land,
    Water,
}

/// The material occupying one cell of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Block {
    #[default]
    Air,
    /// Any full opaque cube (stone, dirt, planks).
    Solid,
    /// Bottom half slab.
    Slab,
    Water,
    /// Waterlogged plant: holds water but is not itself a fluid block.
    Seagrass,
    Lava,
    /// Non-colliding plant.
    TallGrass,
    Fence,
    Wall,
    FenceGate { open: bool },
    Door { material: DoorMaterial, open: bool },
    Trapdoor,
    LilyPad,
    Rail,
    Leaves,
    Cactus,
    BerryBush,
    Honey,
    PowderSnow,
    Fire,
    Magma,
    Cocoa,
}

impl Block {
    pub fn is_air(self) -> bool {
        self == Block::Air
    }

    pub fn fluid(self) -> Fluid {
        match self {
            Block::Water | Block::Seagrass => Fluid::Water,
            Block::Lava => Fluid::Lava,
            _ => Fluid::Empty,
        }
    }

    /// Height of the collision box above the block's bottom face. Zero means
    /// the block has no collision shape.
    pub fn collision_height(self) -> f64 {
        match self {
            Block::Solid | Block::Leaves | Block::Magma => 1.0,
            Block::Slab => 0.5,
            Block::Fence | Block::Wall => 1.5,
            Block::FenceGate { open } => {
                if open {
                    0.0
                } else {
                    1.5
                }
            }
            Block::Door { open, .. } => {
                if open {
                    0.0
                } else {
                    1.0
                }
            }
            Block::Trapdoor => 0.1875,
            Block::LilyPad => 0.09375,
            Block::Cactus | Block::Honey => 0.9375,
            Block::Cocoa => 0.75,
            Block::Air
            | Block::Water
            | Block::Seagrass
            | Block::Lava
            | Block::TallGrass
            | Block::Rail
            | Block::BerryBush
            | Block::PowderSnow
            | Block::Fire => 0.0,
        }
    }

    /// A full opaque cube: nothing passes through it in any mode.
    pub fn is_full_cube(self) -> bool {
        matches!(self, Block::Solid | Block::Leaves | Block::Magma)
    }

    /// Whether an agent moving in `mode` may occupy this cell.
    pub fn is_passable(self, mode: PassMode) -> bool {
        match self {
            Block::Door { open, .. } | Block::FenceGate { open } => match mode {
                PassMode::Water => false,
                PassMode::Land => open,
            },
            Block::Trapdoor | Block::Fence | Block::Wall | Block::Slab => false,
            Block::Water | Block::Seagrass => true,
            Block::Lava => false,
            _ => match mode {
                PassMode::Water => self.fluid() == Fluid::Water,
                PassMode::Land => !self.is_full_cube(),
            },
        }
    }

    /// Blocks that set a standing agent on fire.
    pub fn is_burning(self) -> bool {
        matches!(self, Block::Fire | Block::Lava | Block::Magma)
    }

    pub fn is_rail(self) -> bool {
        self == Block::Rail
    }

    /// Parse a layer glyph.
    pub fn from_glyph(ch: char) -> Option<Self> {
        let block = match ch {
            '.' | ' ' => Block::Air,
            '#' => Block::Solid,
            '_' => Block::Slab,
            '~' => Block::Water,
            '%' => Block::Seagrass,
            'L' => Block::Lava,
            '"' => Block::TallGrass,
            'F' => Block::Fence,
            'W' => Block::Wall,
            'g' => Block::FenceGate { open: false },
            'G' => Block::FenceGate { open: true },
            'd' => Block::Door { material: DoorMaterial::Wood, open: false },
            'D' => Block::Door { material: DoorMaterial::Wood, open: true },
            'i' => Block::Door { material: DoorMaterial::Iron, open: false },
            'I' => Block::Door { material: DoorMaterial::Iron, open: true },
            't' => Block::Trapdoor,
            'p' => Block::LilyPad,
            '=' => Block::Rail,
            '*' => Block::Leaves,
            'C' => Block::Cactus,
            'b' => Block::BerryBush,
            'h' => Block::Honey,
            's' => Block::PowderSnow,
            '^' => Block::Fire,
            'm' => Block::Magma,
            'c' => Block::Cocoa,
            _ => return None,
        };
        Some(block)
    }

    /// The glyph `from_glyph` maps back to this block.
    pub fn glyph(self) -> char {
        match self {
            Block::Air => '.',
            Block::Solid => '#',
            Block::Slab => '_',
            Block::Water => '~',
            Block::Seagrass => '%',
            Block::Lava => 'L',
            Block::TallGrass => '"',
            Block::Fence => 'F',
            Block::Wall => 'W',
            Block::FenceGate { open: false } => 'g',
            Block::FenceGate { open: true } => 'G',
            Block::Door { material: DoorMaterial::Wood, open: false } => 'd',
            Block::Door { material: DoorMaterial::Wood, open: true } => 'D',
            Block::Door { material: DoorMaterial::Iron, open: false } => 'i',
            Block::Door { material: DoorMaterial::Iron, open: true } => 'I',
            Block::Trapdoor => 't',
            Block::LilyPad => 'p',
            Block::Rail => '=',
            Block::Leaves => '*',
            Block::Cactus => 'C',
            Block::BerryBush => 'b',
            Block::Honey => 'h',
            Block::PowderSnow => 's',
            Block::Fire => '^',
            Block::Magma => 'm',
            Block::Cocoa => 'c',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_glyph_maps_back() {
        for ch in "#_~%L\"FWgGdDiItp=*Cbhs^mc.".chars() {
            let block = Block::from_glyph(ch).unwrap();
            assert_eq!(block.glyph(), ch, "glyph {ch:?}");
        }
        assert_eq!(Block::from_glyph('?'), None);
    }

    #[test]
    fn seagrass_holds_water_but_is_not_air() {
        assert_eq!(Block::Seagrass.fluid(), Fluid::Water);
        assert!(!Block::Seagrass.is_air());
        assert!(Block::Seagrass.is_passable(PassMode::Water));
    }

    #[test]
    fn doors_pass_only_when_open() {
        let closed = Block::Door { material: DoorMaterial::Wood, open: false };
        let open = Block::Door { material: DoorMaterial::Wood, open: true };
        assert!(!closed.is_passable(PassMode::Land));
        assert!(open.is_passable(PassMode::Land));
        assert!(!open.is_passable(PassMode::Water));
    }

    #[test]
    fn fences_are_taller_than_a_block() {
        assert_eq!(Block::Fence.collision_height(), 1.5);
        assert!(!Block::Fence.is_passable(PassMode::Land));
        assert_eq!(Block::FenceGate { open: true }.collision_height(), 0.0);
    }

    #[test]
    fn lava_is_never_passable() {
        for mode in [PassMode::Land, PassMode::Water] {
            assert!(!Block::Lava.is_passable(mode));
        }
        assert!(Block::Lava.is_burning());
    }
}
