// End-to-end route finding for flying agents.
//
// Flyers move freely in 3D, but never squeeze between blocks that only
// touch along an edge or at a corner, keep out of water, and start from the
// water surface when they are floating in it.

use blockpath_engine::agent::AgentProfile;
use blockpath_engine::block::Block;
use blockpath_engine::path_type::PathType;
use blockpath_engine::types::BlockPos;
use blockpath_tests::{agent_at, assert_no_impassable_steps, cells, flat_world, is_water, plan};

#[test]
fn flies_over_a_wall_walkers_cannot_cross() {
    let mut world = flat_world(12, 8);
    world.fill(BlockPos::new(6, 1, 0), BlockPos::new(6, 3, 7), Block::Solid);
    let start = BlockPos::new(2, 1, 4);
    let target = BlockPos::new(10, 1, 4);

    let mut flyer = agent_at(AgentProfile::flyer(), &world, start);
    let path = plan(&world, &mut flyer, &[target], 0);
    assert!(path.can_reach());
    assert_no_impassable_steps(&path);
    assert!(cells(&path).iter().any(|p| p.y >= 4));
    for pair in path.nodes().windows(2) {
        let (a, b) = (pair[0].pos, pair[1].pos);
        assert!(a.chebyshev_distance(b) == 1, "{a} -> {b}");
    }

    let mut walker = agent_at(AgentProfile::walker(), &world, start);
    assert!(!plan(&world, &mut walker, &[target], 0).can_reach());
}

#[test]
fn corner_gap_in_a_cage_is_not_an_exit() {
    // Solid on all 26 cells around (4, 4, 4) except the upper north-east
    // corner, which only touches the centre at a point.
    let mut world = flat_world(10, 10);
    let centre = BlockPos::new(4, 4, 4);
    world.fill(centre.offset(-1, -1, -1), centre.offset(1, 1, 1), Block::Solid);
    world.set(centre, Block::Air);
    world.set(centre.offset(1, 1, -1), Block::Air);

    let mut flyer = agent_at(AgentProfile::flyer(), &world, centre);
    let path = plan(&world, &mut flyer, &[BlockPos::new(7, 7, 1)], 0);
    assert!(!path.can_reach());
    assert_eq!(cells(&path), vec![centre]);
}

#[test]
fn edge_gap_in_a_cage_is_not_an_exit_either() {
    let mut world = flat_world(10, 10);
    let centre = BlockPos::new(4, 4, 4);
    world.fill(centre.offset(-1, -1, -1), centre.offset(1, 1, 1), Block::Solid);
    world.set(centre, Block::Air);
    // The north-east vertical edge column.
    world.fill(centre.offset(1, -1, -1), centre.offset(1, 1, -1), Block::Air);

    let mut flyer = agent_at(AgentProfile::flyer(), &world, centre);
    let path = plan(&world, &mut flyer, &[BlockPos::new(8, 4, 0)], 0);
    assert!(!path.can_reach());

    // Opening one face next to the edge makes the edge reachable.
    world.set(centre.offset(1, 0, 0), Block::Air);
    let mut flyer = agent_at(AgentProfile::flyer(), &world, centre);
    let path = plan(&world, &mut flyer, &[centre.offset(1, 0, -1)], 0);
    assert!(path.can_reach());
}

#[test]
fn keeps_out_of_water() {
    let mut world = flat_world(12, 7);
    // A pond three deep across the whole field, filled to the brim.
    world.fill(BlockPos::new(4, 0, 0), BlockPos::new(7, 0, 6), Block::Water);
    world.fill(BlockPos::new(4, 1, 0), BlockPos::new(7, 2, 6), Block::Water);
    let mut flyer = agent_at(AgentProfile::flyer(), &world, BlockPos::new(1, 1, 3));
    let path = plan(&world, &mut flyer, &[BlockPos::new(10, 1, 3)], 0);
    assert!(path.can_reach());
    assert_no_impassable_steps(&path);
    for node in path.nodes() {
        assert!(!is_water(&world, node.pos), "route dives into water at {}", node.pos);
        assert!(node.path_type != PathType::Water);
    }
}

#[test]
fn floating_flyer_starts_at_the_surface() {
    let mut world = flat_world(8, 8);
    world.fill(BlockPos::new(2, 1, 2), BlockPos::new(5, 2, 5), Block::Water);
    let mut flyer = agent_at(AgentProfile::flyer(), &world, BlockPos::new(3, 1, 3));
    assert!(flyer.in_water);
    let path = plan(&world, &mut flyer, &[BlockPos::new(3, 5, 3)], 0);
    assert_eq!(path.node(0).pos, BlockPos::new(3, 3, 3));
    assert!(path.can_reach());
}
