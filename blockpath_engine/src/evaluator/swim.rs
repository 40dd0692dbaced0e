// Movement through water only.
//
// A swimmer's footprint must be entirely water to count as WATER. Air
// directly above water is BREACH: agents whose profile allows breaching may
// move into it, paying `surfacing_malus` on top of the BREACH malus. Every
// other cell is BLOCKED.
//
// Neighbours are the six faces plus the four horizontal diagonals; a
// diagonal is looked at only when both faces it cuts past carry a
// non-negative malus.

use super::{Neighbors, NodeEvaluator, Session, valid_start_height};
use crate::block::{Fluid, PassMode};
use crate::config::NavConfig;
use crate::node::NodeId;
use crate::path_type::PathType;
use crate::types::{BlockPos, Direction};
use crate::world::BlockView;

#[derive(Clone, Debug)]
pub struct SwimEvaluator {
    surfacing_malus: f32,
}

impl SwimEvaluator {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            surfacing_malus: config.surfacing_malus,
        }
    }

    fn classify<W: BlockView + ?Sized>(&self, s: &Session<'_, W>, pos: BlockPos) -> PathType {
        let world = s.world;
        for i in 0..s.width {
            for j in 0..s.height {
                for k in 0..s.depth {
                    let cell = pos.offset(i, j, k);
                    let fluid = world.fluid(cell);
                    if fluid == Fluid::Empty
                        && world.block(cell).is_air()
                        && world.fluid(cell.below()) == Fluid::Water
                    {
                        return PathType::Breach;
                    }
                    if fluid != Fluid::Water {
                        return PathType::Blocked;
                    }
                }
            }
        }
        if world.block(pos).is_passable(PassMode::Water) {
            PathType::Water
        } else {
            PathType::Blocked
        }
    }

    fn cached<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> PathType {
        s.cached_type(pos, |s, pos| self.classify(s, pos))
    }

    fn find_accepted<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> Option<NodeId> {
        let t = self.cached(s, pos);
        let enterable = t == PathType::Water || (t == PathType::Breach && s.agent.profile.allow_breaching);
        if !enterable {
            return None;
        }
        let malus = s.malus(t);
        if malus < 0.0 {
            return None;
        }
        let surfacing = if s.world.fluid(pos) == Fluid::Empty {
            self.surfacing_malus
        } else {
            0.0
        };
        let id = s.node(pos);
        s.update_cost_to_max(id, t, malus + surfacing);
        Some(id)
    }
}

fn is_valid<W: BlockView + ?Sized>(s: &Session<'_, W>, n: Option<NodeId>) -> bool {
    n.is_some_and(|id| !s.nodes[id].closed)
}

fn has_malus<W: BlockView + ?Sized>(s: &Session<'_, W>, n: Option<NodeId>) -> bool {
    n.is_some_and(|id| s.nodes[id].cost_malus >= 0.0)
}

impl NodeEvaluator for SwimEvaluator {
    fn name(&self) -> &'static str {
        "swim"
    }

    fn start<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>) -> Option<NodeId> {
        let bb = s.agent.bounding_box();
        if !bb.min.is_finite() {
            return None;
        }
        let pos = BlockPos::containing(bb.min.x, bb.min.y + 0.5, bb.min.z);
        if !valid_start_height(s.world, pos.y) {
            return None;
        }
        let t = self.classify(s, pos);
        Some(s.start_node(pos, t))
    }

    fn neighbors<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, id: NodeId, out: &mut Neighbors) {
        let pos = s.nodes[id].pos;
        let mut faces = [None; 6];
        for dir in Direction::ALL {
            let n = self.find_accepted(s, pos.relative(dir));
            faces[dir.index()] = n;
            if is_valid(s, n) {
                out.extend(n);
            }
        }
        for dir in Direction::HORIZONTAL {
            let side = dir.clockwise();
            if !has_malus(s, faces[dir.index()]) || !has_malus(s, faces[side.index()]) {
                continue;
            }
            let corner = pos.offset(dir.step_x() + side.step_x(), 0, dir.step_z() + side.step_z());
            let n = self.find_accepted(s, corner);
            if is_valid(s, n) {
                out.extend(n);
            }
        }
    }

    fn path_type<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> PathType {
        self.classify(s, pos)
    }
}
