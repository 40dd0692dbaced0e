// Free 3D movement for flying agents.
//
// A flyer can move to any of the 26 cells around its node. The six face
// neighbours only have to be enterable; every diagonal additionally needs
// the face (and, for the eight corners, edge) neighbours it cuts past to
// have a non-negative malus, so a flyer never slips through the gap
// between two solid blocks that only touch at an edge or a corner.
//
// Flight classification differs from the ground one: open air is fine to
// be in, but a cell directly over something solid counts as WALKABLE and
// costs one extra so that flyers keep off the ground when they can. Fire
// or lava under an open cell makes it DAMAGE_FIRE.
//
// There is no step height or fall distance; vertical moves are ordinary
// neighbours.

use super::{Aggregation, Neighbors, NodeEvaluator, Session, footprint_type, valid_start_height};
use crate::block::Fluid;
use crate::node::NodeId;
use crate::path_type::{self, PathType};
use crate::types::BlockPos;
use crate::world::BlockView;

#[derive(Clone, Debug, Default)]
pub struct FlyEvaluator;

impl FlyEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn classify<W: BlockView + ?Sized>(&self, s: &Session<'_, W>, pos: BlockPos) -> PathType {
        let agent_cell = s.agent.block_pos();
        footprint_type(s, pos, Aggregation::Air, |world, cell| {
            cell_type(world, cell, agent_cell)
        })
    }

    fn cached<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> PathType {
        s.cached_type(pos, |s, pos| self.classify(s, pos))
    }

    fn can_start_at<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> bool {
        let t = self.classify(s, pos);
        s.malus(t) >= 0.0
    }

    /// Cells to try when the agent's own cell is not a legal start. Large
    /// agents try the corners of their box; small ones every cell of their
    /// box grown to just over a block.
    fn start_candidates<W: BlockView + ?Sized>(&self, s: &Session<'_, W>) -> Vec<BlockPos> {
        let bb = s.agent.bounding_box();
        let y = s.agent.block_pos().y;
        if bb.size() >= 1.0 {
            return vec![
                BlockPos::containing(bb.min.x, y as f64, bb.min.z),
                BlockPos::containing(bb.min.x, y as f64, bb.max.z),
                BlockPos::containing(bb.max.x, y as f64, bb.min.z),
                BlockPos::containing(bb.max.x, y as f64, bb.max.z),
            ];
        }
        let grow = |extent: f64| ((1.1 - extent) / 2.0).max(0.0);
        let gx = grow(bb.max.x - bb.min.x);
        let gy = grow(bb.max.y - bb.min.y);
        let gz = grow(bb.max.z - bb.min.z);
        let min = BlockPos::containing(bb.min.x - gx, bb.min.y - gy, bb.min.z - gz);
        let max = BlockPos::containing(bb.max.x + gx, bb.max.y + gy, bb.max.z + gz);
        let mut cells = Vec::new();
        for cy in min.y..=max.y {
            for cz in min.z..=max.z {
                for cx in min.x..=max.x {
                    cells.push(BlockPos::new(cx, cy, cz));
                }
            }
        }
        cells
    }

    fn start_at<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> NodeId {
        let t = self.classify(s, pos);
        s.start_node(pos, t)
    }

    fn find_accepted<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> Option<NodeId> {
        let t = self.cached(s, pos);
        let malus = s.malus(t);
        if malus < 0.0 {
            return None;
        }
        let id = s.node(pos);
        let bump = if t == PathType::Walkable { 1.0 } else { 0.0 };
        s.update_cost_to_max(id, t, malus + bump);
        Some(id)
    }
}

/// Flight view of a single cell. A fence below only makes a cell a fence
/// when the agent is not already in it; the agent's own cell stays open.
pub(crate) fn cell_type<W: BlockView + ?Sized>(world: &W, pos: BlockPos, agent_cell: BlockPos) -> PathType {
    let mut t = world.raw_path_type(pos);
    if t == PathType::Open && pos.y > world.min_y() {
        let below = world.raw_path_type(pos.below());
        t = match below {
            PathType::DamageFire | PathType::Lava => PathType::DamageFire,
            PathType::DamageOther => PathType::DamageOther,
            PathType::Cocoa => PathType::Cocoa,
            PathType::Fence if pos != agent_cell => PathType::Fence,
            PathType::Fence => PathType::Open,
            PathType::Walkable | PathType::Open | PathType::Water => PathType::Open,
            _ => PathType::Walkable,
        };
    }
    if t == PathType::Walkable || t == PathType::Open {
        t = path_type::neighbour_danger(world, pos, t);
    }
    t
}

fn is_open<W: BlockView + ?Sized>(s: &Session<'_, W>, n: Option<NodeId>) -> bool {
    n.is_some_and(|id| !s.nodes[id].closed)
}

fn has_malus<W: BlockView + ?Sized>(s: &Session<'_, W>, n: Option<NodeId>) -> bool {
    n.is_some_and(|id| s.nodes[id].cost_malus >= 0.0)
}

impl NodeEvaluator for FlyEvaluator {
    fn name(&self) -> &'static str {
        "fly"
    }

    fn start<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>) -> Option<NodeId> {
        let agent = s.agent;
        let p = agent.position;
        if !p.is_finite() {
            return None;
        }
        let cell = agent.block_pos();
        let y = if s.can_float && agent.in_water {
            // Surface: the first cell above the water column.
            let mut y = cell.y;
            while y < s.world.max_y() && s.world.fluid(BlockPos::new(cell.x, y, cell.z)) == Fluid::Water {
                y += 1;
            }
            y
        } else {
            (p.y + 0.5).floor() as i32
        };
        if !valid_start_height(s.world, y) {
            return None;
        }
        let base = BlockPos::new(cell.x, y, cell.z);
        if !self.can_start_at(s, base) {
            for candidate in self.start_candidates(s) {
                if self.can_start_at(s, candidate) {
                    return Some(self.start_at(s, candidate));
                }
            }
        }
        Some(self.start_at(s, base))
    }

    fn neighbors<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, id: NodeId, out: &mut Neighbors) {
        let p = s.nodes[id].pos;
        let mut at = |dx: i32, dy: i32, dz: i32| self.find_accepted(s, p.offset(dx, dy, dz));

        // Faces.
        let south = at(0, 0, 1);
        let west = at(-1, 0, 0);
        let east = at(1, 0, 0);
        let north = at(0, 0, -1);
        let up = at(0, 1, 0);
        let down = at(0, -1, 0);
        // Vertical edges.
        let south_up = at(0, 1, 1);
        let west_up = at(-1, 1, 0);
        let east_up = at(1, 1, 0);
        let north_up = at(0, 1, -1);
        let south_down = at(0, -1, 1);
        let west_down = at(-1, -1, 0);
        let east_down = at(1, -1, 0);
        let north_down = at(0, -1, -1);
        // Horizontal edges.
        let north_east = at(1, 0, -1);
        let south_east = at(1, 0, 1);
        let north_west = at(-1, 0, -1);
        let south_west = at(-1, 0, 1);
        // Corners.
        let north_east_up = at(1, 1, -1);
        let south_east_up = at(1, 1, 1);
        let north_west_up = at(-1, 1, -1);
        let south_west_up = at(-1, 1, 1);
        let north_east_down = at(1, -1, -1);
        let south_east_down = at(1, -1, 1);
        let north_west_down = at(-1, -1, -1);
        let south_west_down = at(-1, -1, 1);

        let s = &*s;
        let candidates: [(Option<NodeId>, &[Option<NodeId>]); 26] = [
            (south, &[]),
            (west, &[]),
            (east, &[]),
            (north, &[]),
            (up, &[]),
            (down, &[]),
            (south_up, &[south, up]),
            (west_up, &[west, up]),
            (east_up, &[east, up]),
            (north_up, &[north, up]),
            (south_down, &[south, down]),
            (west_down, &[west, down]),
            (east_down, &[east, down]),
            (north_down, &[north, down]),
            (north_east, &[north, east]),
            (south_east, &[south, east]),
            (north_west, &[north, west]),
            (south_west, &[south, west]),
            (north_east_up, &[north_east, north, east, up, north_up, east_up]),
            (south_east_up, &[south_east, south, east, up, south_up, east_up]),
            (north_west_up, &[north_west, north, west, up, north_up, west_up]),
            (south_west_up, &[south_west, south, west, up, south_up, west_up]),
            (north_east_down, &[north_east, north, east, down, north_down, east_down]),
            (south_east_down, &[south_east, south, east, down, south_down, east_down]),
            (north_west_down, &[north_west, north, west, down, north_down, west_down]),
            (south_west_down, &[south_west, south, west, down, south_down, west_down]),
        ];
        for (candidate, cut_past) in candidates {
            if is_open(s, candidate) && cut_past.iter().all(|&n| has_malus(s, n)) {
                out.extend(candidate);
            }
        }
    }

    fn path_type<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> PathType {
        self.classify(s, pos)
    }
}
