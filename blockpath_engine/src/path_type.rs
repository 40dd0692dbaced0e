// Terrain classification.
//
// Every cell a search touches is reduced to a `PathType`, and every
// `PathType` has a default cost malus. Agents may override the malus per
// type (see `agent.rs`); a negative malus always means "never enter".
//
// Classification happens in layers:
// 1. `raw_path_type` looks at a single block in isolation.
// 2. `land_path_type` asks what it is like to *stand* in a cell: an open
//    cell over something solid is WALKABLE, fire or cactus underneath
//    propagate up, and a WALKABLE cell next to hazards is downgraded to the
//    matching DANGER type by `neighbour_danger`.
// 3. `evaluate_for_agent` applies door / rail / leaves rules that depend on
//    the agent's abilities.
// 4. The evaluator folds the per-cell types of the agent's whole footprint
//    into one with `aggregate` (see `evaluator/mod.rs`).
//
// The order of `PathType::ALL` is significant: when two footprint cells
// have the same malus, the later type wins the aggregation tie-break.

use crate::block::{Block, Fluid, PassMode};
use crate::types::BlockPos;
use crate::world::BlockView;
use serde::{Deserialize, Serialize};

/// Traversal category of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PathType {
    #[default]
    Blocked,
    Open,
    Walkable,
    WalkableDoor,
    Trapdoor,
    PowderSnow,
    DangerPowderSnow,
    Fence,
    Lava,
    Water,
    WaterBorder,
    Rail,
    UnpassableRail,
    DangerFire,
    DamageFire,
    DangerOther,
    DamageOther,
    DoorOpen,
    DoorWoodClosed,
    DoorIronClosed,
    Breach,
    Leaves,
    StickyHoney,
    Cocoa,
}

impl PathType {
    pub const COUNT: usize = 24;

    pub const ALL: [PathType; PathType::COUNT] = [
        PathType::Blocked,
        PathType::Open,
        PathType::Walkable,
        PathType::WalkableDoor,
        PathType::Trapdoor,
        PathType::PowderSnow,
        PathType::DangerPowderSnow,
        PathType::Fence,
        PathType::Lava,
        PathType::Water,
        PathType::WaterBorder,
        PathType::Rail,
        PathType::UnpassableRail,
        PathType::DangerFire,
        PathType::DamageFire,
        PathType::DangerOther,
        PathType::DamageOther,
        PathType::DoorOpen,
        PathType::DoorWoodClosed,
        PathType::DoorIronClosed,
        PathType::Breach,
        PathType::Leaves,
        PathType::StickyHoney,
        PathType::Cocoa,
    ];

    /// Malus used when the agent has no override for this type.
    pub fn default_malus(self) -> f32 {
        match self {
            PathType::Blocked
            | PathType::PowderSnow
            | PathType::Fence
            | PathType::Lava
            | PathType::UnpassableRail
            | PathType::DamageOther
            | PathType::DoorWoodClosed
            | PathType::DoorIronClosed
            | PathType::Leaves => -1.0,
            PathType::Open
            | PathType::Walkable
            | PathType::WalkableDoor
            | PathType::Trapdoor
            | PathType::DangerPowderSnow
            | PathType::Rail
            | PathType::DoorOpen
            | PathType::Cocoa => 0.0,
            PathType::Breach => 4.0,
            PathType::Water
            | PathType::WaterBorder
            | PathType::DangerFire
            | PathType::DangerOther
            | PathType::StickyHoney => 8.0,
            PathType::DamageFire => 16.0,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Types whose collision shape only partly fills the cell. Agents
    /// approaching from one of these must prove their box fits.
    pub fn has_partial_collision(self) -> bool {
        matches!(
            self,
            PathType::Fence | PathType::DoorWoodClosed | PathType::DoorIronClosed
        )
    }
}

// ---------------------------------------------------------------------------
// Type sets
// ---------------------------------------------------------------------------

/// Small set of `PathType`s, iterated in declaration order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathTypeSet(u32);

impl PathTypeSet {
    pub fn insert(&mut self, t: PathType) {
        self.0 |= 1 << t.index();
    }

    pub fn contains(self, t: PathType) -> bool {
        self.0 & (1 << t.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = PathType> {
        PathType::ALL.into_iter().filter(move |&t| self.contains(t))
    }
}

// ---------------------------------------------------------------------------
// Single-cell classification
// ---------------------------------------------------------------------------

/// Classify one block on its own, ignoring what surrounds it.
pub fn raw_path_type(block: Block) -> PathType {
    match block {
        Block::Air => PathType::Open,
        Block::Trapdoor | Block::LilyPad => PathType::Trapdoor,
        Block::PowderSnow => PathType::PowderSnow,
        Block::Cactus | Block::BerryBush => PathType::DamageOther,
        Block::Honey => PathType::StickyHoney,
        Block::Cocoa => PathType::Cocoa,
        _ if block.fluid() == Fluid::Lava => PathType::Lava,
        _ if block.is_burning() => PathType::DamageFire,
        Block::Door { open: true, .. } => PathType::DoorOpen,
        Block::Door { material, open: false } => match material {
            crate::block::DoorMaterial::Wood => PathType::DoorWoodClosed,
            crate::block::DoorMaterial::Iron => PathType::DoorIronClosed,
        },
        Block::Rail => PathType::Rail,
        Block::Leaves => PathType::Leaves,
        Block::Fence | Block::Wall | Block::FenceGate { open: false } => PathType::Fence,
        _ if !block.is_passable(PassMode::Land) => PathType::Blocked,
        _ if block.fluid() == Fluid::Water => PathType::Water,
        _ => PathType::Open,
    }
}

/// Classify a cell as a place to stand on land.
pub fn land_path_type<W: BlockView + ?Sized>(world: &W, pos: BlockPos) -> PathType {
    let mut t = world.raw_path_type(pos);
    if t == PathType::Open && pos.y > world.min_y() {
        let below = world.raw_path_type(pos.below());
        t = match below {
            PathType::Walkable | PathType::Open | PathType::Water | PathType::Lava => PathType::Open,
            PathType::DamageFire => PathType::DamageFire,
            PathType::DamageOther => PathType::DamageOther,
            PathType::StickyHoney => PathType::StickyHoney,
            PathType::PowderSnow => PathType::DangerPowderSnow,
            _ => PathType::Walkable,
        };
    }
    if t == PathType::Walkable {
        t = neighbour_danger(world, pos, t);
    }
    t
}

/// Downgrade `fallback` to a DANGER type when any of the 26 surrounding
/// cells burns, hurts, or holds water.
pub fn neighbour_danger<W: BlockView + ?Sized>(
    world: &W,
    pos: BlockPos,
    fallback: PathType,
) -> PathType {
    for dx in -1..=1 {
        for dy in -1..=1 {
            for dz in -1..=1 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                let block = world.block(pos.offset(dx, dy, dz));
                match block {
                    Block::Cactus | Block::BerryBush => return PathType::DangerOther,
                    _ if block.is_burning() => return PathType::DangerFire,
                    _ if block.fluid() == Fluid::Water => return PathType::WaterBorder,
                    _ => {}
                }
            }
        }
    }
    fallback
}

/// Door, rail and leaves rules that depend on who is asking.
///
/// `agent_cell` is the cell the agent currently occupies: rails only count
/// as rails for an agent that is itself on one.
pub fn evaluate_for_agent<W: BlockView + ?Sized>(
    world: &W,
    t: PathType,
    can_open_doors: bool,
    can_pass_doors: bool,
    agent_cell: BlockPos,
) -> PathType {
    match t {
        PathType::DoorWoodClosed if can_open_doors && can_pass_doors => PathType::WalkableDoor,
        PathType::DoorOpen if !can_pass_doors => PathType::Blocked,
        PathType::Rail
            if !world.block(agent_cell).is_rail() && !world.block(agent_cell.below()).is_rail() =>
        {
            PathType::UnpassableRail
        }
        PathType::Leaves => PathType::Blocked,
        other => other,
    }
}
