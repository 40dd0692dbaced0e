// Per-agent route requests.
//
// A `Navigator` is what an agent controller talks to. It resolves the
// agent's locomotion mode to a concrete `PathFinder` once, at
// construction, and derives the node budget from the agent's follow range
// (`NavConfig::max_visited_nodes`). It keeps the route the agent is
// currently following, so asking again for a target the current route
// already leads to returns that route instead of searching.
//
// `plan_batch` plans for many agents at once on the rayon pool. Every
// request gets its own navigator and therefore its own node arena and open
// set; the world is shared read-only.
//
// See also: `pathfinder.rs` for the search itself, `config.rs` for the
// budget rule.

use crate::agent::{Agent, AgentProfile, Locomotion};
use crate::config::NavConfig;
use crate::evaluator::{AmphibiousEvaluator, FlyEvaluator, NodeEvaluator, SwimEvaluator, WalkEvaluator};
use crate::path::Path;
use crate::pathfinder::PathFinder;
use crate::types::BlockPos;
use crate::world::BlockView;
use rayon::prelude::*;

/// The search driver for one locomotion mode.
#[derive(Clone, Debug)]
pub enum Strategy {
    Walk(PathFinder<WalkEvaluator>),
    Fly(PathFinder<FlyEvaluator>),
    Amphibious(PathFinder<AmphibiousEvaluator>),
    Swim(PathFinder<SwimEvaluator>),
}

impl Strategy {
    pub fn for_profile(profile: &AgentProfile, config: &NavConfig) -> Self {
        let budget = config.max_visited_nodes(profile.follow_range);
        let weight = config.heuristic_weight;
        match profile.locomotion {
            Locomotion::Walk => Strategy::Walk(PathFinder::new(WalkEvaluator::new(config), budget, weight)),
            Locomotion::Fly => Strategy::Fly(PathFinder::new(FlyEvaluator::new(), budget, weight)),
            Locomotion::Amphibious => {
                Strategy::Amphibious(PathFinder::new(AmphibiousEvaluator::new(config), budget, weight))
            }
            Locomotion::Swim => Strategy::Swim(PathFinder::new(SwimEvaluator::new(config), budget, weight)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Walk(f) => f.evaluator().name(),
            Strategy::Fly(f) => f.evaluator().name(),
            Strategy::Amphibious(f) => f.evaluator().name(),
            Strategy::Swim(f) => f.evaluator().name(),
        }
    }

    pub fn max_visited_nodes(&self) -> usize {
        match self {
            Strategy::Walk(f) => f.max_visited_nodes(),
            Strategy::Fly(f) => f.max_visited_nodes(),
            Strategy::Amphibious(f) => f.max_visited_nodes(),
            Strategy::Swim(f) => f.max_visited_nodes(),
        }
    }

    pub fn set_capture_debug(&mut self, capture: bool) {
        match self {
            Strategy::Walk(f) => f.set_capture_debug(capture),
            Strategy::Fly(f) => f.set_capture_debug(capture),
            Strategy::Amphibious(f) => f.set_capture_debug(capture),
            Strategy::Swim(f) => f.set_capture_debug(capture),
        }
    }

    pub fn find_path<W: BlockView + ?Sized>(
        &mut self,
        world: &W,
        agent: &mut Agent,
        targets: &[BlockPos],
        max_range: f32,
        accuracy: i32,
        depth_multiplier: f32,
    ) -> Option<Path> {
        match self {
            Strategy::Walk(f) => f.find_path(world, agent, targets, max_range, accuracy, depth_multiplier),
            Strategy::Fly(f) => f.find_path(world, agent, targets, max_range, accuracy, depth_multiplier),
            Strategy::Amphibious(f) => {
                f.find_path(world, agent, targets, max_range, accuracy, depth_multiplier)
            }
            Strategy::Swim(f) => f.find_path(world, agent, targets, max_range, accuracy, depth_multiplier),
        }
    }
}

/// Route bookkeeping for one agent.
#[derive(Clone, Debug)]
pub struct Navigator {
    strategy: Strategy,
    path: Option<Path>,
    max_visited_nodes_multiplier: f32,
}

impl Navigator {
    pub fn new(profile: &AgentProfile, config: &NavConfig) -> Self {
        Self {
            strategy: Strategy::for_profile(profile, config),
            path: None,
            max_visited_nodes_multiplier: 1.0,
        }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut Strategy {
        &mut self.strategy
    }

    /// Scale the node budget of later searches.
    pub fn set_max_visited_nodes_multiplier(&mut self, multiplier: f32) {
        self.max_visited_nodes_multiplier = multiplier;
    }

    /// A route to the nearest of `targets`. When the route being followed
    /// is unfinished and leads to one of `targets` it is returned as is.
    /// The new route is not followed until it is passed to `adopt`.
    pub fn create_path<W: BlockView + ?Sized>(
        &mut self,
        world: &W,
        agent: &mut Agent,
        targets: &[BlockPos],
        accuracy: i32,
    ) -> Option<Path> {
        let current = self.path.as_ref().filter(|p| !p.is_done() && targets.contains(&p.target()));
        if let Some(path) = current {
            return Some(path.clone());
        }
        let range = agent.profile.follow_range;
        self.strategy.find_path(
            world,
            agent,
            targets,
            range,
            accuracy,
            self.max_visited_nodes_multiplier,
        )
    }

    pub fn create_path_to<W: BlockView + ?Sized>(
        &mut self,
        world: &W,
        agent: &mut Agent,
        pos: BlockPos,
        accuracy: i32,
    ) -> Option<Path> {
        self.create_path(world, agent, &[pos], accuracy)
    }

    /// Start following `path`. A route with the same cells as an unfinished
    /// current one leaves the current route and its cursor in place. Returns
    /// whether there is anything left to follow.
    pub fn adopt(&mut self, path: Path) -> bool {
        let keep = self.path.as_ref().is_some_and(|current| !current.is_done() && current.same_as(&path));
        if !keep {
            self.path = Some(path);
        }
        !self.is_done()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn path_mut(&mut self) -> Option<&mut Path> {
        self.path.as_mut()
    }

    /// Target of the route being followed.
    pub fn target_pos(&self) -> Option<BlockPos> {
        self.path.as_ref().map(Path::target)
    }

    pub fn is_done(&self) -> bool {
        self.path.as_ref().is_none_or(Path::is_done)
    }

    pub fn stop(&mut self) {
        self.path = None;
    }
}

// ---------------------------------------------------------------------------
// Batch planning
// ---------------------------------------------------------------------------

/// One agent's route request in a batch.
#[derive(Clone, Debug)]
pub struct PlanRequest {
    pub agent: Agent,
    pub targets: Vec<BlockPos>,
    pub accuracy: i32,
}

/// Plan routes for every request in parallel against one world snapshot.
/// Results come back in request order.
pub fn plan_batch<W>(world: &W, config: &NavConfig, requests: &mut [PlanRequest]) -> Vec<Option<Path>>
where
    W: BlockView + Sync + ?Sized,
{
    requests
        .par_iter_mut()
        .map(|req| {
            let mut nav = Navigator::new(&req.agent.profile, config);
            nav.create_path(world, &mut req.agent, &req.targets, req.accuracy)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::types::Vec3;
    use crate::world::BlockGrid;

    fn field() -> BlockGrid {
        let mut world = BlockGrid::new(16, 4, 16);
        world.fill(BlockPos::new(0, 0, 0), BlockPos::new(15, 0, 15), Block::Solid);
        world
    }

    #[test]
    fn strategy_follows_locomotion() {
        let config = NavConfig::default();
        let walker = Navigator::new(&AgentProfile::walker(), &config);
        assert!(matches!(walker.strategy(), Strategy::Walk(_)));
        assert_eq!(walker.strategy().max_visited_nodes(), 256);
        let flyer = Navigator::new(&AgentProfile::flyer(), &config);
        assert!(matches!(flyer.strategy(), Strategy::Fly(_)));
        assert_eq!(flyer.strategy().max_visited_nodes(), 768);
        let swimmer = Navigator::new(&AgentProfile::swimmer(), &config);
        assert!(matches!(swimmer.strategy(), Strategy::Swim(_)));
        let amphibian = Navigator::new(&AgentProfile::amphibian(), &config);
        assert!(matches!(amphibian.strategy(), Strategy::Amphibious(_)));
    }

    #[test]
    fn unfinished_route_is_reused_for_the_same_target() {
        let world = field();
        let mut agent = Agent::placed(AgentProfile::walker(), Vec3::new(1.5, 1.0, 1.5), &world);
        let mut nav = Navigator::new(&agent.profile, &NavConfig::default());
        let target = BlockPos::new(6, 1, 1);
        let path = nav.create_path_to(&world, &mut agent, target, 0).unwrap();
        assert_eq!(nav.target_pos(), None);
        assert!(nav.adopt(path));
        assert_eq!(nav.target_pos(), Some(target));
        nav.path_mut().unwrap().advance();

        // Reused: the cursor of the followed route survives.
        let again = nav.create_path(&world, &mut agent, &[BlockPos::new(0, 1, 9), target], 0).unwrap();
        assert_eq!(again.next_node_index(), 1);

        // An identical fresh route does not reset the cursor either.
        nav.stop();
        assert!(nav.is_done());
        let fresh = nav.create_path_to(&world, &mut agent, target, 0).unwrap();
        let copy = fresh.clone();
        nav.adopt(fresh);
        nav.path_mut().unwrap().advance();
        nav.adopt(copy);
        assert_eq!(nav.path().map(Path::next_node_index), Some(1));
    }

    #[test]
    fn budget_multiplier_limits_the_search() {
        let world = field();
        let mut agent = Agent::placed(AgentProfile::walker(), Vec3::new(0.5, 1.0, 0.5), &world);
        let mut nav = Navigator::new(&agent.profile, &NavConfig::default());
        nav.set_max_visited_nodes_multiplier(0.0);
        let path = nav.create_path_to(&world, &mut agent, BlockPos::new(9, 1, 9), 0).unwrap();
        assert!(!path.can_reach());
        assert_eq!(path.node_count(), 1);
    }

    #[test]
    fn batch_results_keep_request_order() {
        let world = field();
        let mut requests: Vec<PlanRequest> = (0..6)
            .map(|i| PlanRequest {
                agent: Agent::placed(AgentProfile::walker(), Vec3::new(0.5, 1.0, i as f64 * 2.0 + 0.5), &world),
                targets: vec![BlockPos::new(8, 1, i * 2)],
                accuracy: 0,
            })
            .collect();
        let paths = plan_batch(&world, &NavConfig::default(), &mut requests);
        assert_eq!(paths.len(), 6);
        for (i, path) in paths.iter().enumerate() {
            let path = path.as_ref().unwrap();
            assert!(path.can_reach());
            assert_eq!(path.target(), BlockPos::new(8, 1, i as i32 * 2));
        }
    }
}
