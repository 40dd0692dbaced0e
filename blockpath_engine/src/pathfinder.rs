// Weighted A* search over the cells a node evaluator offers.
//
// `PathFinder` owns one evaluator and a reusable open set. A call to
// `find_path` opens an evaluator session against the world and agent,
// seeds the open set with the start node and runs A* until a target is
// within `accuracy` (Manhattan) of the popped node, the open set is empty,
// or the node budget is spent. Nodes further than `max_range` (straight
// line) from the start are closed without being expanded, and successors
// whose walked distance would reach `max_range` are ignored.
//
// The heuristic is the Euclidean distance to the nearest target times
// `heuristic_weight` (1.5 by default). That overestimates, so routes are
// found faster but are not guaranteed shortest.
//
// Unreachable targets are not an error: every target remembers the node
// closest to it, and when nothing is reached the search returns the route
// to whichever target it got closest to, with `reached == false`. The only
// `None` results are an empty target list and an agent with no valid
// start cell.
//
// See also: `evaluator/mod.rs` for the evaluator contract, `heap.rs` for
// the open set, `navigator.rs` which picks the evaluator and budget per
// agent.
//
// **Determinism.** The search reads only the world snapshot and the agent;
// node ids are handed out in discovery order and ties in the heap break the
// same way every run, so identical inputs give identical routes.

use crate::agent::Agent;
use crate::evaluator::{Neighbors, NodeEvaluator, Session};
use crate::heap::OpenSet;
use crate::node::{Node, NodeId, Target};
use crate::path::{DebugNode, Path, PathDebug};
use crate::types::BlockPos;
use crate::world::BlockView;

/// A* search driver for one locomotion mode.
#[derive(Clone, Debug)]
pub struct PathFinder<E: NodeEvaluator> {
    evaluator: E,
    max_visited_nodes: usize,
    heuristic_weight: f32,
    open_set: OpenSet,
    capture_debug: bool,
}

impl<E: NodeEvaluator> PathFinder<E> {
    pub fn new(evaluator: E, max_visited_nodes: usize, heuristic_weight: f32) -> Self {
        Self {
            evaluator,
            max_visited_nodes,
            heuristic_weight,
            open_set: OpenSet::new(),
            capture_debug: false,
        }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn max_visited_nodes(&self) -> usize {
        self.max_visited_nodes
    }

    /// Attach a `PathDebug` snapshot to every route found from now on.
    pub fn set_capture_debug(&mut self, capture: bool) {
        self.capture_debug = capture;
    }

    /// Search for a route from the agent to the nearest of `targets`.
    ///
    /// The node budget is `max_visited_nodes * depth_multiplier`. A negative
    /// `accuracy` never counts a target as reached, so the search runs
    /// until it exhausts the open set or the budget.
    pub fn find_path<W: BlockView + ?Sized>(
        &mut self,
        world: &W,
        agent: &mut Agent,
        targets: &[BlockPos],
        max_range: f32,
        accuracy: i32,
        depth_multiplier: f32,
    ) -> Option<Path> {
        if targets.is_empty() {
            return None;
        }
        let guard = agent.override_malus(self.evaluator.malus_overrides());
        let mut s = self.evaluator.prepare(world, &guard);
        let path = self.search(&mut s, targets, max_range, accuracy, depth_multiplier);
        self.evaluator.done(s);
        path
    }

    fn search<W: BlockView + ?Sized>(
        &mut self,
        s: &mut Session<'_, W>,
        requested: &[BlockPos],
        max_range: f32,
        accuracy: i32,
        depth_multiplier: f32,
    ) -> Option<Path> {
        let start = self.evaluator.start(s)?;
        let start_pos = s.nodes[start].pos;

        let mut targets: Vec<Target> = Vec::with_capacity(requested.len());
        for (i, &pos) in requested.iter().enumerate() {
            if !requested[..i].contains(&pos) {
                targets.push(self.evaluator.goal(s, pos));
            }
        }

        let h = best_h(start_pos, start, &mut targets);
        let node = &mut s.nodes[start];
        node.g = 0.0;
        node.h = h;
        node.f = h;
        self.open_set.clear();
        self.open_set.insert(&mut s.nodes, start);

        let budget = (self.max_visited_nodes as f32 * depth_multiplier).floor().max(0.0) as usize;
        let mut visited = 0;
        let mut reached_any = false;
        let mut neighbors = Neighbors::new();

        while visited < budget {
            let Some(current) = self.open_set.pop(&mut s.nodes) else {
                break;
            };
            visited += 1;
            s.nodes[current].closed = true;
            let pos = s.nodes[current].pos;

            if accuracy >= 0 {
                for target in targets.iter_mut() {
                    if pos.manhattan_distance(target.pos) <= accuracy as u32 {
                        log::trace!("{}: reached target {} at {}", self.evaluator.name(), target.pos, pos);
                        target.set_reached();
                        reached_any = true;
                    }
                }
            }
            if reached_any {
                break;
            }
            if pos.distance_to(start_pos) >= max_range {
                continue;
            }

            neighbors.clear();
            self.evaluator.neighbors(s, current, &mut neighbors);
            let (current_g, current_walked) = (s.nodes[current].g, s.nodes[current].walked_distance);
            for &next in &neighbors {
                let next_pos = s.nodes[next].pos;
                let step = pos.distance_to(next_pos);
                let walked = current_walked + step;
                let g = current_g + step + s.nodes[next].cost_malus;
                let in_open = s.nodes[next].in_open_set();
                if walked >= max_range || (in_open && g >= s.nodes[next].g) {
                    continue;
                }
                let h = best_h(next_pos, next, &mut targets) * self.heuristic_weight;
                let node = &mut s.nodes[next];
                node.came_from = Some(current);
                node.g = g;
                node.h = h;
                node.walked_distance = walked;
                if in_open {
                    self.open_set.change_cost(&mut s.nodes, next, g + h);
                } else {
                    node.f = g + h;
                    self.open_set.insert(&mut s.nodes, next);
                }
            }
        }

        let path = if reached_any {
            targets
                .iter()
                .filter(|t| t.reached)
                .filter_map(|t| route_to(s, t, true))
                .min_by_key(Path::node_count)
        } else {
            targets.iter().filter_map(|t| route_to(s, t, false)).min_by(|a, b| {
                a.dist_to_target()
                    .total_cmp(&b.dist_to_target())
                    .then(a.node_count().cmp(&b.node_count()))
            })
        };

        log::debug!(
            "{} search from {}: {} nodes visited, {} created, reached = {}, route of {} nodes",
            self.evaluator.name(),
            start_pos,
            visited,
            s.nodes.len(),
            reached_any,
            path.as_ref().map_or(0, Path::node_count),
        );

        if self.capture_debug {
            let debug = self.snapshot(s, &targets);
            path.map(|p| p.with_debug(debug))
        } else {
            path
        }
    }

    fn snapshot<W: BlockView + ?Sized>(&self, s: &Session<'_, W>, targets: &[Target]) -> PathDebug {
        PathDebug {
            open_set: self
                .open_set
                .ids()
                .iter()
                .map(|&id| DebugNode::from(&s.nodes[id]))
                .collect(),
            closed_set: s.nodes.iter().filter(|n| n.closed).map(DebugNode::from).collect(),
            targets: targets
                .iter()
                .map(|t| DebugNode {
                    h: t.best_heuristic,
                    ..DebugNode::from(&Node::new(t.pos))
                })
                .collect(),
        }
    }
}

/// Distance from `pos` to the nearest target, recording `id` as the best
/// node of every target it is closest to so far.
fn best_h(pos: BlockPos, id: NodeId, targets: &mut [Target]) -> f32 {
    let mut best = f32::MAX;
    for target in targets.iter_mut() {
        let h = pos.distance_to(target.pos);
        target.update_best(h, id);
        best = best.min(h);
    }
    best
}

fn route_to<W: BlockView + ?Sized>(s: &Session<'_, W>, target: &Target, reached: bool) -> Option<Path> {
    let end = target.best_node?;
    Some(Path::new(s.nodes.chain_to(end), target.pos, reached))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentProfile;
    use crate::block::Block;
    use crate::config::NavConfig;
    use crate::evaluator::{AmphibiousEvaluator, WalkEvaluator};
    use crate::path_type::PathType;
    use crate::types::Vec3;
    use crate::world::BlockGrid;

    fn field() -> BlockGrid {
        let mut world = BlockGrid::new(12, 5, 12);
        world.fill(BlockPos::new(0, 0, 0), BlockPos::new(11, 0, 11), Block::Solid);
        world
    }

    fn walker_at(world: &BlockGrid, x: i32, z: i32) -> Agent {
        let pos = Vec3::new(x as f64 + 0.5, 1.0, z as f64 + 0.5);
        Agent::placed(AgentProfile::walker(), pos, world)
    }

    fn finder(budget: usize) -> PathFinder<WalkEvaluator> {
        PathFinder::new(WalkEvaluator::new(&NavConfig::default()), budget, 1.5)
    }

    #[test]
    fn no_targets_no_route() {
        let world = field();
        let mut agent = walker_at(&world, 1, 1);
        assert!(finder(100).find_path(&world, &mut agent, &[], 32.0, 0, 1.0).is_none());
    }

    #[test]
    fn target_at_start_is_reached_immediately() {
        let world = field();
        let mut agent = walker_at(&world, 3, 3);
        let path = finder(100)
            .find_path(&world, &mut agent, &[BlockPos::new(3, 1, 3)], 32.0, 0, 1.0)
            .unwrap();
        assert!(path.can_reach());
        assert_eq!(path.node_count(), 1);
        assert_eq!(path.dist_to_target(), 0.0);
    }

    #[test]
    fn straight_line_route() {
        let world = field();
        let mut agent = walker_at(&world, 1, 1);
        let target = BlockPos::new(7, 1, 1);
        let path = finder(400)
            .find_path(&world, &mut agent, &[target], 32.0, 0, 1.0)
            .unwrap();
        assert!(path.can_reach());
        assert_eq!(path.node_count(), 7);
        assert_eq!(path.end_node().map(|n| n.pos), Some(target));
        let g: Vec<f32> = path.nodes().iter().map(|n| n.g).collect();
        assert!(g.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn nearest_of_several_targets_wins() {
        let world = field();
        let mut agent = walker_at(&world, 5, 5);
        let near = BlockPos::new(7, 1, 5);
        let far = BlockPos::new(5, 1, 11);
        let path = finder(400)
            .find_path(&world, &mut agent, &[far, near, far], 32.0, 0, 1.0)
            .unwrap();
        assert_eq!(path.target(), near);
        assert!(path.can_reach());
    }

    #[test]
    fn walled_off_target_gives_closest_partial_route() {
        let mut world = field();
        world.fill(BlockPos::new(8, 1, 0), BlockPos::new(8, 4, 11), Block::Solid);
        let mut agent = walker_at(&world, 2, 5);
        let target = BlockPos::new(10, 1, 5);
        let path = finder(1000)
            .find_path(&world, &mut agent, &[target], 32.0, 0, 1.0)
            .unwrap();
        assert!(!path.can_reach());
        assert_eq!(path.end_node().map(|n| n.pos), Some(BlockPos::new(7, 1, 5)));
        assert_eq!(path.dist_to_target(), 3.0);
    }

    #[test]
    fn negative_accuracy_never_reaches() {
        let world = field();
        let mut agent = walker_at(&world, 3, 3);
        let path = finder(50)
            .find_path(&world, &mut agent, &[BlockPos::new(3, 1, 3)], 32.0, -1, 1.0)
            .unwrap();
        assert!(!path.can_reach());
        assert_eq!(path.node_count(), 1);
    }

    #[test]
    fn zero_budget_returns_start_only() {
        let world = field();
        let mut agent = walker_at(&world, 1, 1);
        let path = finder(100)
            .find_path(&world, &mut agent, &[BlockPos::new(9, 1, 9)], 32.0, 0, 0.0)
            .unwrap();
        assert!(!path.can_reach());
        assert_eq!(path.node_count(), 1);
    }

    #[test]
    fn follow_range_bounds_the_route() {
        let world = field();
        let mut agent = walker_at(&world, 0, 0);
        let path = finder(1000)
            .find_path(&world, &mut agent, &[BlockPos::new(11, 1, 0)], 4.0, 0, 1.0)
            .unwrap();
        assert!(!path.can_reach());
        let end = path.end_node().map(|n| n.pos).unwrap();
        assert!(end.x < 4);
    }

    #[test]
    fn malus_overrides_are_restored_after_search() {
        let world = field();
        let mut agent = Agent::placed(AgentProfile::amphibian(), Vec3::new(1.5, 1.0, 1.5), &world);
        let mut finder = PathFinder::new(AmphibiousEvaluator::new(&NavConfig::default()), 200, 1.5);
        let path = finder.find_path(&world, &mut agent, &[BlockPos::new(4, 1, 1)], 32.0, 0, 1.0);
        assert!(path.is_some_and(|p| p.can_reach()));
        assert_eq!(agent.pathfinding_malus(PathType::Water), 8.0);
        assert_eq!(agent.pathfinding_malus(PathType::Walkable), 0.0);
    }

    #[test]
    fn debug_snapshot_lists_search_state() {
        let world = field();
        let mut agent = walker_at(&world, 1, 1);
        let mut finder = finder(400);
        finder.set_capture_debug(true);
        let path = finder
            .find_path(&world, &mut agent, &[BlockPos::new(5, 1, 1)], 32.0, 0, 1.0)
            .unwrap();
        let debug = path.debug().unwrap();
        assert!(!debug.closed_set.is_empty());
        assert!(debug.closed_set.iter().all(|n| n.closed));
        assert!(debug.open_set.iter().all(|n| !n.closed));
        assert_eq!(debug.targets.len(), 1);
        assert_eq!(debug.targets[0].pos, BlockPos::new(5, 1, 1));
        assert_eq!(debug.targets[0].h, 0.0);
    }
}
