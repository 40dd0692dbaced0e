// Ground movement.
//
// A walking agent moves to the four cardinal neighbours and the four
// horizontal diagonals of its node. For each candidate column,
// `find_accepted` decides where in that column the agent would actually end
// up:
// - a WALKABLE cell is taken as is;
// - a blocked cell is stepped onto if the step allowance permits, by
//   retrying one cell higher (`try_jump_on`);
// - an OPEN cell is fallen through until ground, up to the agent's maximum
//   fall distance (`first_ground_below`); a longer drop yields a blocked
//   node;
// - a sinking agent in water goes to the first non-water cell below;
// - fences and closed doors become closed nodes the search never expands.
//
// A candidate whose floor is higher than the agent can jump from the
// current floor is dropped outright. Diagonals are only taken when both
// orthogonal neighbours forming the corner are passable (or lower than the
// current node), with a squeeze exception for narrow agents between fences.
//
// Per-cell types come from `land_path_type` (or the amphibious variant when
// this evaluator backs `AmphibiousEvaluator`) folded over the agent's
// footprint, and are cached per search. Box collision tests go through the
// session's collision cache.

use super::{Aggregation, Neighbors, NodeEvaluator, Session, footprint_type, valid_start_height};
use crate::block::{Fluid, PassMode};
use crate::config::NavConfig;
use crate::node::NodeId;
use crate::path_type::{self, PathType};
use crate::types::{Aabb, BlockPos, Direction, Vec3};
use crate::world::BlockView;

#[derive(Clone, Debug)]
pub struct WalkEvaluator {
    amphibious: bool,
    max_jump_height: f64,
    fence_squeeze_width: f64,
}

impl WalkEvaluator {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            amphibious: false,
            max_jump_height: config.max_jump_height,
            fence_squeeze_width: config.fence_squeeze_width,
        }
    }

    /// Ground movement for an agent that also swims. Water cells are
    /// accepted like walkable ones and never sunk through.
    pub(crate) fn amphibious(config: &NavConfig) -> Self {
        Self {
            amphibious: true,
            ..Self::new(config)
        }
    }

    fn cell_type<W: BlockView + ?Sized>(&self, world: &W, pos: BlockPos) -> PathType {
        if self.amphibious {
            super::amphibious::cell_type(world, pos)
        } else {
            path_type::land_path_type(world, pos)
        }
    }

    fn classify<W: BlockView + ?Sized>(&self, s: &Session<'_, W>, pos: BlockPos) -> PathType {
        footprint_type(s, pos, Aggregation::Ground, |world, cell| self.cell_type(world, cell))
    }

    pub(crate) fn cached<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> PathType {
        s.cached_type(pos, |s, pos| self.classify(s, pos))
    }

    fn jump_height<W: BlockView + ?Sized>(&self, s: &Session<'_, W>) -> f64 {
        self.max_jump_height.max(s.agent.profile.max_up_step)
    }

    /// How many blocks the agent may climb from `pos`.
    pub(crate) fn step_allowance<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> i32 {
        let above = self.cached(s, pos.above());
        let here = self.cached(s, pos);
        if s.malus(above) >= 0.0 && here != PathType::StickyHoney {
            s.agent.profile.max_up_step.max(1.0).floor() as i32
        } else {
            0
        }
    }

    /// Height of the agent's feet when standing in `pos`. Floating agents
    /// sit half a block into water.
    pub(crate) fn floor_level<W: BlockView + ?Sized>(&self, s: &Session<'_, W>, pos: BlockPos) -> f64 {
        if (s.can_float || self.amphibious) && s.world.fluid(pos) == Fluid::Water {
            pos.y as f64 + 0.5
        } else {
            s.world.floor_level(pos)
        }
    }

    fn can_start_at<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> bool {
        let t = self.classify(s, pos);
        t != PathType::Open && s.malus(t) >= 0.0
    }

    fn start_at<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> NodeId {
        let t = self.classify(s, pos);
        s.start_node(pos, t)
    }

    /// Start node for an agent whose feet are at height `y`, trying the
    /// corners of its box when the centre column is unusable.
    pub(crate) fn start_with_height<W: BlockView + ?Sized>(
        &self,
        s: &mut Session<'_, W>,
        y: i32,
    ) -> Option<NodeId> {
        if !valid_start_height(s.world, y) {
            return None;
        }
        let agent_cell = s.agent.block_pos();
        let base = BlockPos::new(agent_cell.x, y, agent_cell.z);
        if !self.can_start_at(s, base) {
            let bb = s.agent.bounding_box();
            let corners = [
                (bb.min.x, bb.min.z),
                (bb.min.x, bb.max.z),
                (bb.max.x, bb.min.z),
                (bb.max.x, bb.max.z),
            ];
            for (x, z) in corners {
                let corner = BlockPos::containing(x, y as f64, z);
                if self.can_start_at(s, corner) {
                    return Some(self.start_at(s, corner));
                }
            }
        }
        Some(self.start_at(s, base))
    }

    pub(crate) fn is_neighbor_valid<W: BlockView + ?Sized>(
        &self,
        s: &Session<'_, W>,
        neighbor: Option<NodeId>,
        from: NodeId,
    ) -> bool {
        neighbor.is_some_and(|id| {
            let n = &s.nodes[id];
            !n.closed && (n.cost_malus >= 0.0 || s.nodes[from].cost_malus < 0.0)
        })
    }

    fn is_diagonal_valid<W: BlockView + ?Sized>(
        &self,
        s: &Session<'_, W>,
        root: NodeId,
        a: Option<NodeId>,
        b: Option<NodeId>,
        diagonal: Option<NodeId>,
    ) -> bool {
        let (Some(a), Some(b), Some(diagonal)) = (a, b, diagonal) else {
            return false;
        };
        let (root, a, b, diagonal) = (&s.nodes[root], &s.nodes[a], &s.nodes[b], &s.nodes[diagonal]);
        if diagonal.closed || a.pos.y > root.pos.y || b.pos.y > root.pos.y {
            return false;
        }
        if [a, b, diagonal].iter().any(|n| n.path_type == PathType::WalkableDoor) {
            return false;
        }
        let squeeze = a.path_type == PathType::Fence
            && b.path_type == PathType::Fence
            && s.agent.profile.width < self.fence_squeeze_width;
        diagonal.cost_malus >= 0.0
            && (b.pos.y < root.pos.y || b.cost_malus >= 0.0 || squeeze)
            && (a.pos.y < root.pos.y || a.cost_malus >= 0.0 || squeeze)
    }

    /// Where the agent ends up when moving into the column at `pos` from a
    /// node whose floor is at `node_floor` and whose type is `node_type`.
    pub(crate) fn find_accepted<W: BlockView + ?Sized>(
        &self,
        s: &mut Session<'_, W>,
        pos: BlockPos,
        step_limit: i32,
        node_floor: f64,
        dir: Direction,
        node_type: PathType,
    ) -> Option<NodeId> {
        if self.floor_level(s, pos) - node_floor > self.jump_height(s) {
            return None;
        }
        let t = self.cached(s, pos);
        let malus = s.malus(t);
        let mut node = None;
        if malus >= 0.0 {
            let id = s.node(pos);
            s.update_cost_to_max(id, t, malus);
            node = Some(id);
        }
        if node_type.has_partial_collision()
            && node.is_some_and(|id| s.nodes[id].cost_malus >= 0.0)
            && node.is_some_and(|id| !self.can_reach_without_collision(s, id))
        {
            node = None;
        }
        if t == PathType::Walkable || (self.amphibious && t == PathType::Water) {
            return node;
        }

        let unusable = node.is_none_or(|id| s.nodes[id].cost_malus < 0.0);
        let climbable = !matches!(
            t,
            PathType::Fence | PathType::UnpassableRail | PathType::Trapdoor | PathType::PowderSnow
        );
        if unusable && step_limit > 0 && climbable {
            self.try_jump_on(s, pos, step_limit, node_floor, dir, node_type)
        } else if !self.amphibious && t == PathType::Water && !s.can_float {
            self.first_non_water_below(s, pos, node)
        } else if t == PathType::Open {
            Some(self.first_ground_below(s, pos))
        } else if t.has_partial_collision() && node.is_none() {
            Some(closed_node(s, pos, t))
        } else {
            node
        }
    }

    fn try_jump_on<W: BlockView + ?Sized>(
        &self,
        s: &mut Session<'_, W>,
        pos: BlockPos,
        step_limit: i32,
        node_floor: f64,
        dir: Direction,
        node_type: PathType,
    ) -> Option<NodeId> {
        let id = self.find_accepted(s, pos.above(), step_limit - 1, node_floor, dir, node_type)?;
        let width = s.agent.profile.width;
        if width >= 1.0 {
            return Some(id);
        }
        let landed = &s.nodes[id];
        if landed.path_type != PathType::Open && landed.path_type != PathType::Walkable {
            return Some(id);
        }
        let landed_pos = landed.pos;
        // Box sweeping up from the cell the agent steps off.
        let cx = (pos.x - dir.step_x()) as f64 + 0.5;
        let cz = (pos.z - dir.step_z()) as f64 + 0.5;
        let half = width / 2.0;
        let from = BlockPos::containing(cx, (pos.y + 1) as f64, cz);
        let bb = Aabb::new(
            cx - half,
            s.world.floor_level(from) + 0.001,
            cz - half,
            cx + half,
            s.agent.profile.height + s.world.floor_level(landed_pos) - 0.002,
            cz + half,
        );
        if s.has_collisions(&bb) { None } else { Some(id) }
    }

    fn first_non_water_below<W: BlockView + ?Sized>(
        &self,
        s: &mut Session<'_, W>,
        pos: BlockPos,
        mut node: Option<NodeId>,
    ) -> Option<NodeId> {
        let mut cell = pos.below();
        while cell.y > s.world.min_y() {
            let t = self.cached(s, cell);
            if t != PathType::Water {
                return node;
            }
            let id = s.node(cell);
            let malus = s.malus(t);
            s.update_cost_to_max(id, t, malus);
            node = Some(id);
            cell = cell.below();
        }
        node
    }

    fn first_ground_below<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> NodeId {
        let max_fall = s.agent.profile.max_fall_distance;
        let mut cell = pos.below();
        while cell.y >= s.world.min_y() {
            if pos.y - cell.y > max_fall {
                return blocked_node(s, cell);
            }
            let t = self.cached(s, cell);
            if t != PathType::Open {
                let malus = s.malus(t);
                if malus >= 0.0 {
                    let id = s.node(cell);
                    s.update_cost_to_max(id, t, malus);
                    return id;
                }
                return blocked_node(s, cell);
            }
            cell = cell.below();
        }
        blocked_node(s, pos)
    }

    /// Sweep the agent's box from where it stands to node `id` and report
    /// whether it stays clear of every block.
    fn can_reach_without_collision<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, id: NodeId) -> bool {
        let mut bb = s.agent.bounding_box();
        let at = s.agent.position;
        let target = s.nodes[id].pos;
        let delta = Vec3::new(
            target.x as f64 - at.x + (bb.max.x - bb.min.x) / 2.0,
            target.y as f64 - at.y + (bb.max.y - bb.min.y) / 2.0,
            target.z as f64 - at.z + (bb.max.z - bb.min.z) / 2.0,
        );
        let steps = (delta.length() / bb.size()).ceil() as i32;
        if steps <= 0 {
            return true;
        }
        let step = delta.scale(1.0 / steps as f64);
        for _ in 0..steps {
            bb = bb.moved(step);
            if s.has_collisions(&bb) {
                return false;
            }
        }
        true
    }
}

fn blocked_node<W: BlockView + ?Sized>(s: &mut Session<'_, W>, pos: BlockPos) -> NodeId {
    let id = s.node(pos);
    let node = &mut s.nodes[id];
    node.path_type = PathType::Blocked;
    node.cost_malus = -1.0;
    id
}

fn closed_node<W: BlockView + ?Sized>(s: &mut Session<'_, W>, pos: BlockPos, t: PathType) -> NodeId {
    let id = s.node(pos);
    let node = &mut s.nodes[id];
    node.closed = true;
    node.path_type = t;
    node.cost_malus = t.default_malus();
    id
}

impl NodeEvaluator for WalkEvaluator {
    fn name(&self) -> &'static str {
        "walk"
    }

    fn start<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>) -> Option<NodeId> {
        let agent = s.agent;
        let p = agent.position;
        if !p.is_finite() {
            return None;
        }
        let world = s.world;
        let cell = agent.block_pos();
        let y = if s.can_float && agent.in_water {
            // Rise to the topmost water cell of the column.
            let mut y = cell.y;
            while y < world.max_y() && world.fluid(BlockPos::new(cell.x, y, cell.z)) == Fluid::Water {
                y += 1;
            }
            y - 1
        } else if agent.on_ground {
            (p.y + 0.5).floor() as i32
        } else {
            let mut below = cell;
            while (world.is_empty(below) || world.block(below).is_passable(PassMode::Land))
                && below.y > world.min_y()
            {
                below = below.below();
            }
            below.y + 1
        };
        self.start_with_height(s, y)
    }

    fn neighbors<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, id: NodeId, out: &mut Neighbors) {
        let pos = s.nodes[id].pos;
        let step = self.step_allowance(s, pos);
        let here = self.cached(s, pos);
        let floor = self.floor_level(s, pos);

        let south = self.find_accepted(s, pos.offset(0, 0, 1), step, floor, Direction::South, here);
        let west = self.find_accepted(s, pos.offset(-1, 0, 0), step, floor, Direction::West, here);
        let east = self.find_accepted(s, pos.offset(1, 0, 0), step, floor, Direction::East, here);
        let north = self.find_accepted(s, pos.offset(0, 0, -1), step, floor, Direction::North, here);
        for n in [south, west, east, north] {
            if self.is_neighbor_valid(s, n, id) {
                out.extend(n);
            }
        }

        let diagonals = [
            ((-1, -1), Direction::North, west, north),
            ((1, -1), Direction::North, east, north),
            ((-1, 1), Direction::South, west, south),
            ((1, 1), Direction::South, east, south),
        ];
        for ((dx, dz), dir, a, b) in diagonals {
            let diagonal = self.find_accepted(s, pos.offset(dx, 0, dz), step, floor, dir, here);
            if self.is_diagonal_valid(s, id, a, b, diagonal) {
                out.extend(diagonal);
            }
        }
    }

    fn path_type<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> PathType {
        self.classify(s, pos)
    }
}
