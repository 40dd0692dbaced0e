// Ground movement for agents that are equally at home in water.
//
// Builds on `WalkEvaluator` with its amphibious flag set, so water cells
// are accepted directly instead of being sunk through or stepped over. On
// top of the walking neighbours it adds straight up and straight down
// moves, which are only taken through water.
//
// For the duration of a search the agent's malus table makes water free
// and dry ground expensive (see `malus_overrides`), so routes prefer to
// stay wet when that is cheaper. Agents that prefer shallow water also pay
// extra for water cells deeper than `deep_water_depth` below sea level.

use super::{Neighbors, NodeEvaluator, Session, WalkEvaluator};
use crate::config::NavConfig;
use crate::node::NodeId;
use crate::path_type::{self, PathType};
use crate::types::{BlockPos, Direction};
use crate::world::BlockView;

#[derive(Clone, Debug)]
pub struct AmphibiousEvaluator {
    walk: WalkEvaluator,
    overrides: [(PathType, f32); 3],
    deep_water_depth: i32,
}

impl AmphibiousEvaluator {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            walk: WalkEvaluator::amphibious(config),
            overrides: [
                (PathType::Water, 0.0),
                (PathType::Walkable, config.amphibious_walkable_malus),
                (PathType::WaterBorder, config.amphibious_water_border_malus),
            ],
            deep_water_depth: config.deep_water_depth,
        }
    }

    fn is_vertical_neighbor_valid<W: BlockView + ?Sized>(
        &self,
        s: &Session<'_, W>,
        neighbor: Option<NodeId>,
        from: NodeId,
    ) -> bool {
        self.walk.is_neighbor_valid(s, neighbor, from)
            && neighbor.is_some_and(|id| s.nodes[id].path_type == PathType::Water)
    }
}

/// Amphibious view of a single cell: water touching a solid face counts as
/// the border of the water body.
pub(crate) fn cell_type<W: BlockView + ?Sized>(world: &W, pos: BlockPos) -> PathType {
    if world.raw_path_type(pos) != PathType::Water {
        return path_type::land_path_type(world, pos);
    }
    let touches_blocked = Direction::ALL
        .iter()
        .any(|&dir| world.raw_path_type(pos.relative(dir)) == PathType::Blocked);
    if touches_blocked {
        PathType::WaterBorder
    } else {
        PathType::Water
    }
}

impl NodeEvaluator for AmphibiousEvaluator {
    fn name(&self) -> &'static str {
        "amphibious"
    }

    fn malus_overrides(&self) -> &[(PathType, f32)] {
        &self.overrides
    }

    fn start<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>) -> Option<NodeId> {
        if !s.agent.in_water {
            return self.walk.start(s);
        }
        let bb = s.agent.bounding_box();
        if !bb.min.is_finite() {
            return None;
        }
        let pos = BlockPos::containing(bb.min.x, bb.min.y + 0.5, bb.min.z);
        if !super::valid_start_height(s.world, pos.y) {
            return None;
        }
        let t = self.walk.path_type(s, pos);
        Some(s.start_node(pos, t))
    }

    fn neighbors<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, id: NodeId, out: &mut Neighbors) {
        let first = out.len();
        self.walk.neighbors(s, id, out);

        let pos = s.nodes[id].pos;
        let step = self.walk.step_allowance(s, pos);
        let here = self.walk.cached(s, pos);
        let floor = self.walk.floor_level(s, pos);
        let up = self
            .walk
            .find_accepted(s, pos.above(), (step - 1).max(0), floor, Direction::Up, here);
        let down = self
            .walk
            .find_accepted(s, pos.below(), step, floor, Direction::Down, here);
        if self.is_vertical_neighbor_valid(s, up, id) {
            out.extend(up);
        }
        if self.is_vertical_neighbor_valid(s, down, id) && here != PathType::Trapdoor {
            out.extend(down);
        }

        if s.agent.profile.prefers_shallow_swimming {
            let deep_below = s.world.sea_level() - self.deep_water_depth;
            let deep_malus = s.malus(PathType::Water) + 1.0;
            for &n in &out[first..] {
                let node = &mut s.nodes[n];
                if node.path_type == PathType::Water && node.pos.y < deep_below {
                    node.cost_malus = node.cost_malus.max(deep_malus);
                }
            }
        }
    }

    fn path_type<W: BlockView + ?Sized>(&self, s: &mut Session<'_, W>, pos: BlockPos) -> PathType {
        self.walk.path_type(s, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentProfile};
    use crate::block::Block;
    use crate::types::Vec3;
    use crate::world::BlockGrid;

    /// A pool three deep in the middle of a stone floor.
    fn pool() -> BlockGrid {
        let mut world = BlockGrid::new(7, 8, 7).with_sea_level(5);
        world.fill(BlockPos::new(0, 0, 0), BlockPos::new(6, 4, 6), Block::Solid);
        world.fill(BlockPos::new(2, 2, 2), BlockPos::new(4, 4, 4), Block::Water);
        world
    }

    #[test]
    fn water_next_to_stone_is_a_border() {
        let world = pool();
        assert_eq!(cell_type(&world, BlockPos::new(2, 3, 3)), PathType::WaterBorder);
        assert_eq!(cell_type(&world, BlockPos::new(3, 3, 3)), PathType::Water);
        assert_eq!(cell_type(&world, BlockPos::new(3, 4, 3)), PathType::Water);
    }

    #[test]
    fn overrides_only_last_for_the_search() {
        let eval = AmphibiousEvaluator::new(&NavConfig::default());
        let mut agent = Agent::new(AgentProfile::amphibian(), Vec3::new(3.5, 3.0, 3.5));
        {
            let guard = agent.override_malus(eval.malus_overrides());
            assert_eq!(guard.pathfinding_malus(PathType::Water), 0.0);
            assert_eq!(guard.pathfinding_malus(PathType::Walkable), 6.0);
            assert_eq!(guard.pathfinding_malus(PathType::WaterBorder), 4.0);
        }
        assert_eq!(agent.pathfinding_malus(PathType::Water), 8.0);
        assert_eq!(agent.pathfinding_malus(PathType::Walkable), 0.0);
    }

    #[test]
    fn swims_straight_down_through_water() {
        let world = pool();
        let eval = AmphibiousEvaluator::new(&NavConfig::default());
        let mut agent = Agent::placed(AgentProfile::amphibian(), Vec3::new(3.5, 4.2, 3.5), &world);
        assert!(agent.in_water);
        let guard = agent.override_malus(eval.malus_overrides());
        let mut s = eval.prepare(&world, &guard);
        let start = eval.start(&mut s).unwrap();
        assert_eq!(s.nodes[start].pos, BlockPos::new(3, 4, 3));
        let mut out = Neighbors::new();
        eval.neighbors(&mut s, start, &mut out);
        let found: Vec<BlockPos> = out.iter().map(|&id| s.nodes[id].pos).collect();
        assert!(found.contains(&BlockPos::new(3, 3, 3)));
    }
}
