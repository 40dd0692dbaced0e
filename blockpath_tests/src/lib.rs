// Test-only helpers for end-to-end route finding tests.
//
// Builds small worlds (flat floors, glyph layers), places agents at cell
// centres and runs searches through the same `Navigator` / `PathFinder`
// entry points a host would use. Everything here is thin sugar over the
// engine's public API; no search logic is duplicated.
//
// See also: `tests/` for the scenarios, `scenarios/` for JSON fixtures.

use blockpath_engine::agent::{Agent, AgentProfile};
use blockpath_engine::block::Block;
use blockpath_engine::config::NavConfig;
use blockpath_engine::navigator::Navigator;
use blockpath_engine::path::Path;
use blockpath_engine::types::{BlockPos, Vec3};
use blockpath_engine::world::{BlockGrid, BlockView};

/// Height of the worlds `flat_world` builds.
pub const FLAT_WORLD_HEIGHT: u32 = 6;

/// A `size_x` x `size_z` world with a stone floor at y = 0 and air above.
pub fn flat_world(size_x: u32, size_z: u32) -> BlockGrid {
    let mut world = BlockGrid::new(size_x, FLAT_WORLD_HEIGHT, size_z);
    world.fill(
        BlockPos::new(0, 0, 0),
        BlockPos::new(size_x as i32 - 1, 0, size_z as i32 - 1),
        Block::Solid,
    );
    world
}

/// A world from glyph layers, bottom first. Panics on bad glyphs.
pub fn layered_world(layers: &[&[&str]]) -> BlockGrid {
    BlockGrid::from_layers(layers).expect("test world layers are malformed")
}

/// An agent standing at the bottom centre of `cell`, with its contact
/// flags computed against `world`.
pub fn agent_at(profile: AgentProfile, world: &BlockGrid, cell: BlockPos) -> Agent {
    let feet = Vec3::new(cell.x as f64 + 0.5, cell.y as f64, cell.z as f64 + 0.5);
    Agent::placed(profile, feet, world)
}

/// Plan one route with the default configuration.
pub fn plan(world: &BlockGrid, agent: &mut Agent, targets: &[BlockPos], accuracy: i32) -> Path {
    let mut nav = Navigator::new(&agent.profile, &NavConfig::default());
    nav.create_path(world, agent, targets, accuracy)
        .expect("agent has no valid start cell")
}

/// The cells of a route, start first.
pub fn cells(path: &Path) -> Vec<BlockPos> {
    path.nodes().iter().map(|n| n.pos).collect()
}

/// Panics unless every step of the route moves at most one cell along
/// each horizontal axis.
pub fn assert_steps_adjacent(path: &Path) {
    for pair in path.nodes().windows(2) {
        let (a, b) = (pair[0].pos, pair[1].pos);
        assert!(
            (a.x - b.x).abs() <= 1 && (a.z - b.z).abs() <= 1,
            "route jumps from {a} to {b}"
        );
    }
}

/// Panics if any node after the start carries a negative malus.
pub fn assert_no_impassable_steps(path: &Path) {
    for node in path.nodes().iter().skip(1) {
        assert!(
            node.cost_malus >= 0.0,
            "route enters {} ({:?}) with malus {}",
            node.pos,
            node.path_type,
            node.cost_malus
        );
    }
}

/// Whether the block at `pos` holds water.
pub fn is_water(world: &BlockGrid, pos: BlockPos) -> bool {
    world.fluid(pos) == blockpath_engine::block::Fluid::Water
}
