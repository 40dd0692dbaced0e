// blockpath_engine: route finding for agents in a 3D block world.
//
// This crate finds routes for agents of different shapes and locomotion
// modes through a grid of blocks: weighted A* over cells, with per-terrain
// cost penalties ("malus") and a pluggable node evaluator per locomotion
// mode. It reads the world only through the `BlockView` trait and never
// writes shared state, so many agents can plan at once against one world
// snapshot.
//
// Module overview:
// - `types.rs`:      BlockPos, Vec3, Aabb, Direction.
// - `block.rs`:      Block vocabulary and per-block physical properties.
// - `world.rs`:      BlockView query trait + BlockGrid, a dense in-memory world.
// - `path_type.rs`:  PathType terrain classification and default malus values.
// - `agent.rs`:      AgentProfile (data-driven), Agent, MalusTable + scoped overrides.
// - `config.rs`:     NavConfig, every tunable, with named profile presets.
// - `node.rs`:       Node, NodeArena (per-search arena + coordinate cache), Target.
// - `heap.rs`:       OpenSet, the binary min-heap ordered by `f`.
// - `path.rs`:       Path (the route and its cursor) + PathDebug snapshots.
// - `evaluator/`:    NodeEvaluator trait, Session, and walk/fly/amphibious/swim.
// - `pathfinder.rs`: PathFinder, the A* search driver.
// - `navigator.rs`:  Navigator (per-agent requests) + plan_batch (parallel).
// - `scenario.rs`:   JSON scenario files used by `route_probe` and tests.
//
// The `route_probe` binary (`main.rs`) runs a scenario file from the
// command line.
//
// **Critical constraint: determinism.** A search is a pure function of the
// world snapshot, the agent and the request. Hash maps are only used for
// lookups and never iterated, so identical inputs always give identical
// routes.

pub mod agent;
pub mod block;
pub mod config;
pub mod evaluator;
pub mod heap;
pub mod navigator;
pub mod node;
pub mod path;
pub mod path_type;
pub mod pathfinder;
pub mod scenario;
pub mod types;
pub mod world;
