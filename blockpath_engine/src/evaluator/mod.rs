// Node evaluators: how an agent moves between cells.
//
// A search asks its evaluator four things: where the agent starts
// (`start`), which cell a target coordinate means (`goal`), what a cell is
// like for this agent (`path_type`), and where it can go from a node
// (`neighbors`). The four locomotion modes answer differently:
// - `walk.rs`:       ground movement with step-ups, falls and door rules.
// - `fly.rs`:        free 3D movement over 26 neighbours.
// - `amphibious.rs`: ground movement that treats water as home.
// - `swim.rs`:       movement through water only, optionally breaching.
//
// Everything a single search caches lives in a `Session`: the node arena
// with its coordinate cache, the per-cell type cache, and the collision
// cache. `prepare` opens a session against a world snapshot and an agent;
// `done` ends it and drops every node at once. Sessions are never shared,
// so separate searches may run on separate threads against the same world.
//
// The agent's malus table is read through the session. Evaluators that
// need different values for one search list them in `malus_overrides`; the
// search driver applies them with `Agent::override_malus` for exactly the
// lifetime of the session.
//
// See also: `path_type.rs` for per-cell classification, `pathfinder.rs`
// for the search that drives an evaluator.

pub mod amphibious;
pub mod fly;
pub mod swim;
pub mod walk;

use crate::agent::Agent;
use crate::node::{NodeArena, NodeId, Target};
use crate::path_type::{self, PathType, PathTypeSet};
use crate::types::{Aabb, BlockPos};
use crate::world::BlockView;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub use amphibious::AmphibiousEvaluator;
pub use fly::FlyEvaluator;
pub use swim::SwimEvaluator;
pub use walk::WalkEvaluator;

/// Successors of one node. No evaluator produces more than 26.
pub type Neighbors = SmallVec<[NodeId; 32]>;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-search state shared by all evaluators.
pub struct Session<'a, W: BlockView + ?Sized> {
    pub world: &'a W,
    pub agent: &'a Agent,
    pub nodes: NodeArena,
    /// Footprint in cells along X, Y and Z.
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub can_open_doors: bool,
    pub can_pass_doors: bool,
    pub can_float: bool,
    type_cache: FxHashMap<i64, PathType>,
    collision_cache: FxHashMap<[u64; 6], bool>,
}

impl<'a, W: BlockView + ?Sized> Session<'a, W> {
    pub fn new(world: &'a W, agent: &'a Agent) -> Self {
        let (width, height, depth) = agent.footprint();
        Self {
            world,
            agent,
            nodes: NodeArena::new(),
            width,
            height,
            depth,
            can_open_doors: agent.profile.can_open_doors,
            can_pass_doors: agent.profile.can_pass_doors,
            can_float: agent.profile.can_float,
            type_cache: FxHashMap::default(),
            collision_cache: FxHashMap::default(),
        }
    }

    pub fn node(&mut self, pos: BlockPos) -> NodeId {
        self.nodes.get_or_create(pos)
    }

    pub fn malus(&self, t: PathType) -> f32 {
        self.agent.pathfinding_malus(t)
    }

    /// Type of `pos` for this agent, computed once per search.
    pub fn cached_type(
        &mut self,
        pos: BlockPos,
        classify: impl FnOnce(&Self, BlockPos) -> PathType,
    ) -> PathType {
        let key = pos.as_long();
        if let Some(&t) = self.type_cache.get(&key) {
            return t;
        }
        let t = classify(self, pos);
        self.type_cache.insert(key, t);
        t
    }

    /// Whether any block collides with `bb`, computed once per box.
    pub fn has_collisions(&mut self, bb: &Aabb) -> bool {
        let world = self.world;
        *self
            .collision_cache
            .entry(bb.cache_key())
            .or_insert_with(|| world.collides(bb))
    }

    /// Give `id` the type `t` and raise its malus to at least `malus`.
    pub fn update_cost_to_max(&mut self, id: NodeId, t: PathType, malus: f32) {
        let node = &mut self.nodes[id];
        node.path_type = t;
        node.cost_malus = node.cost_malus.max(malus);
    }

    /// Start node at `pos`, classified with `t`.
    pub fn start_node(&mut self, pos: BlockPos, t: PathType) -> NodeId {
        let id = self.node(pos);
        let malus = self.malus(t);
        let node = &mut self.nodes[id];
        node.path_type = t;
        node.cost_malus = malus;
        id
    }
}

// ---------------------------------------------------------------------------
// Evaluator contract
// ---------------------------------------------------------------------------

/// One locomotion mode.
pub trait NodeEvaluator {
    fn name(&self) -> &'static str;

    /// Malus values in force while this evaluator searches.
    fn malus_overrides(&self) -> &[(PathType, f32)] {
        &[]
    }

    /// Open a search session.
    fn prepare<'a, W: BlockView + ?Sized>(&self, world: &'a W, agent: &'a Agent) -> Session<'a, W> {
        Session::new(world, agent)
    }

    /// The node the agent is standing in, or `None` if its position cannot
    /// be resolved to a cell.
    fn start<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>) -> Option<NodeId>;

    /// The target cell for a requested position.
    fn goal<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> Target {
        s.node(pos);
        Target::new(pos)
    }

    /// Push the successors of `id` onto `out`.
    fn neighbors<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, id: NodeId, out: &mut Neighbors);

    /// What the cell at `pos` is for this agent, over its whole footprint.
    fn path_type<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> PathType;

    /// End the session. All its nodes are released.
    fn done<W: BlockView + ?Sized>(&self, s: Session<'_, W>) {
        drop(s);
    }
}

/// Whether `y` lies inside the world's build limits.
pub(crate) fn valid_start_height<W: BlockView + ?Sized>(world: &W, y: i32) -> bool {
    y >= world.min_y() && y < world.max_y()
}

// ---------------------------------------------------------------------------
// Footprint aggregation
// ---------------------------------------------------------------------------

/// How per-cell types of a footprint fold into one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Aggregation {
    /// Rails dominate like fences; a wide agent never counts as in the
    /// open.
    Ground,
    Air,
}

/// Classify every cell of the footprint at `pos` with `cell_type`, apply the
/// agent's door and rail rules, and fold the results.
pub(crate) fn footprint_type<W, F>(
    s: &Session<'_, W>,
    pos: BlockPos,
    rules: Aggregation,
    cell_type: F,
) -> PathType
where
    W: BlockView + ?Sized,
    F: Fn(&W, BlockPos) -> PathType,
{
    let agent_cell = s.agent.block_pos();
    let mut set = PathTypeSet::default();
    let mut origin = PathType::Blocked;
    for i in 0..s.width {
        for j in 0..s.height {
            for k in 0..s.depth {
                let cell = pos.offset(i, j, k);
                let t = path_type::evaluate_for_agent(
                    s.world,
                    cell_type(s.world, cell),
                    s.can_open_doors,
                    s.can_pass_doors,
                    agent_cell,
                );
                if i == 0 && j == 0 && k == 0 {
                    origin = t;
                }
                set.insert(t);
            }
        }
    }
    aggregate(s, set, origin, rules)
}

fn aggregate<W: BlockView + ?Sized>(
    s: &Session<'_, W>,
    set: PathTypeSet,
    origin: PathType,
    rules: Aggregation,
) -> PathType {
    if set.contains(PathType::Fence) {
        return PathType::Fence;
    }
    if rules == Aggregation::Ground && set.contains(PathType::UnpassableRail) {
        return PathType::UnpassableRail;
    }
    let mut best = PathType::Blocked;
    for t in set.iter() {
        let malus = s.malus(t);
        if malus < 0.0 {
            return t;
        }
        if malus >= s.malus(best) {
            best = t;
        }
    }
    let narrow = rules == Aggregation::Air || s.width <= 1;
    if origin == PathType::Open && s.malus(best) == 0.0 && narrow {
        PathType::Open
    } else {
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentProfile;
    use crate::block::Block;
    use crate::types::Vec3;
    use crate::world::BlockGrid;

    fn floor_world() -> BlockGrid {
        let mut world = BlockGrid::new(6, 4, 6);
        world.fill(BlockPos::new(0, 0, 0), BlockPos::new(5, 0, 5), Block::Solid);
        world
    }

    #[test]
    fn fence_in_footprint_dominates() {
        let mut world = floor_world();
        world.set(BlockPos::new(2, 1, 1), Block::Fence);
        let mut profile = AgentProfile::walker();
        profile.width = 1.4;
        let agent = Agent::new(profile, Vec3::new(0.5, 1.0, 0.5));
        let s = Session::new(&world, &agent);
        let t = footprint_type(&s, BlockPos::new(1, 1, 1), Aggregation::Ground, path_type::land_path_type);
        assert_eq!(t, PathType::Fence);
    }

    #[test]
    fn negative_cell_beats_costly_cell() {
        let mut world = floor_world();
        world.set(BlockPos::new(1, 2, 1), Block::Lava);
        let agent = Agent::new(AgentProfile::walker(), Vec3::new(0.5, 1.0, 0.5));
        let s = Session::new(&world, &agent);
        let t = footprint_type(&s, BlockPos::new(1, 1, 1), Aggregation::Ground, path_type::land_path_type);
        assert_eq!(t, PathType::Lava);
    }

    #[test]
    fn open_origin_stays_open_for_narrow_agents() {
        let world = floor_world();
        let agent = Agent::new(AgentProfile::walker(), Vec3::new(0.5, 1.0, 0.5));
        let s = Session::new(&world, &agent);
        let t = footprint_type(&s, BlockPos::new(1, 2, 1), Aggregation::Ground, path_type::land_path_type);
        assert_eq!(t, PathType::Open);
        let t = footprint_type(&s, BlockPos::new(1, 1, 1), Aggregation::Ground, path_type::land_path_type);
        assert_eq!(t, PathType::Walkable);
    }

    #[test]
    fn costlier_type_wins_and_ties_go_to_later_types() {
        let mut world = floor_world();
        world.set(BlockPos::new(3, 1, 3), Block::Water);
        let mut profile = AgentProfile::walker();
        profile.width = 1.4;
        let agent = Agent::new(profile, Vec3::new(0.5, 1.0, 0.5));
        let s = Session::new(&world, &agent);
        // Open (0), water (8) and water border (8) under one 2x2 footprint.
        let t = footprint_type(&s, BlockPos::new(2, 1, 3), Aggregation::Ground, path_type::land_path_type);
        assert_eq!(t, PathType::WaterBorder);
    }

    #[test]
    fn caches_answer_repeated_queries() {
        let world = floor_world();
        let agent = Agent::new(AgentProfile::walker(), Vec3::new(0.5, 1.0, 0.5));
        let mut s = Session::new(&world, &agent);
        let pos = BlockPos::new(2, 1, 2);
        let first = s.cached_type(pos, |_, _| PathType::Walkable);
        let second = s.cached_type(pos, |_, _| PathType::Lava);
        assert_eq!(first, second);
        let bb = Aabb::standing_at(Vec3::new(2.5, 0.5, 2.5), 0.6, 1.0);
        assert!(s.has_collisions(&bb));
        assert!(s.has_collisions(&bb));
    }
}
