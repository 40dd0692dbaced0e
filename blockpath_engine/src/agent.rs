// The moving entity a route is planned for.
//
// An `Agent` is a profile (size, step height, abilities, locomotion mode,
// per-type malus overrides) placed at a continuous position, plus the two
// contact flags the start-node logic needs (`on_ground`, `in_water`) and
// the effective malus table the evaluators read during a search.
//
// All behavioural differences between kinds of agents are data in
// `AgentProfile`. Named presets (`walker`, `flyer`, `amphibian`,
// `swimmer`) cover the common shapes; `NavConfig` (see `config.rs`) keeps
// a table of them keyed by name so scenario files can refer to a preset.
//
// Evaluators that need different malus values for the duration of one
// search (the amphibious evaluator does) use `Agent::override_malus`, which
// hands back a guard that restores the previous table when dropped.

use crate::path_type::PathType;
use crate::types::{Aabb, BlockPos, Vec3};
use crate::world::BlockView;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Which evaluator plans this agent's routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locomotion {
    #[default]
    Walk,
    Fly,
    Amphibious,
    Swim,
}

/// Data-driven description of an agent's body and abilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    /// Horizontal extent of the bounding box, in blocks.
    pub width: f64,
    pub height: f64,
    /// Height the agent can step up without jumping.
    pub max_up_step: f64,
    /// Blocks the agent is willing to drop in one move.
    pub max_fall_distance: i32,
    pub can_open_doors: bool,
    pub can_pass_doors: bool,
    /// Stays at the surface of water instead of sinking.
    pub can_float: bool,
    pub locomotion: Locomotion,
    /// Range the agent tracks targets over. Sizes the search budget.
    pub follow_range: f32,
    /// Amphibious agents only: penalise water deeper than the shallow band
    /// below sea level.
    pub prefers_shallow_swimming: bool,
    /// Swimming agents only: allow surfacing into the air cell above water.
    pub allow_breaching: bool,
    /// Per-type malus overrides on top of `PathType::default_malus`.
    pub malus: BTreeMap<PathType, f32>,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self::walker()
    }
}

impl AgentProfile {
    /// A human-sized land agent that walks through open doors.
    pub fn walker() -> Self {
        Self {
            width: 0.6,
            height: 1.95,
            max_up_step: 0.6,
            max_fall_distance: 3,
            can_open_doors: false,
            can_pass_doors: true,
            can_float: false,
            locomotion: Locomotion::Walk,
            follow_range: 16.0,
            prefers_shallow_swimming: false,
            allow_breaching: false,
            malus: BTreeMap::new(),
        }
    }

    /// A small flying agent that avoids water and fire.
    pub fn flyer() -> Self {
        let mut malus = BTreeMap::new();
        malus.insert(PathType::Water, -1.0);
        malus.insert(PathType::WaterBorder, 16.0);
        malus.insert(PathType::DangerFire, -1.0);
        Self {
            width: 0.7,
            height: 0.6,
            max_up_step: 0.6,
            max_fall_distance: 3,
            can_open_doors: false,
            can_pass_doors: true,
            can_float: true,
            locomotion: Locomotion::Fly,
            follow_range: 48.0,
            prefers_shallow_swimming: false,
            allow_breaching: false,
            malus,
        }
    }

    /// A small agent equally at home on shore and under water.
    pub fn amphibian() -> Self {
        Self {
            width: 0.75,
            height: 0.42,
            max_up_step: 1.0,
            max_fall_distance: 3,
            can_open_doors: false,
            can_pass_doors: true,
            can_float: true,
            locomotion: Locomotion::Amphibious,
            follow_range: 16.0,
            prefers_shallow_swimming: true,
            allow_breaching: false,
            malus: BTreeMap::new(),
        }
    }

    /// A water-only agent that can breach the surface.
    pub fn swimmer() -> Self {
        let mut malus = BTreeMap::new();
        malus.insert(PathType::Water, 0.0);
        Self {
            width: 0.9,
            height: 0.6,
            max_up_step: 0.6,
            max_fall_distance: 3,
            can_open_doors: false,
            can_pass_doors: false,
            can_float: false,
            locomotion: Locomotion::Swim,
            follow_range: 16.0,
            prefers_shallow_swimming: false,
            allow_breaching: true,
            malus,
        }
    }
}

// ---------------------------------------------------------------------------
// Malus table
// ---------------------------------------------------------------------------

/// Effective malus for every `PathType`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MalusTable([f32; PathType::COUNT]);

impl Default for MalusTable {
    fn default() -> Self {
        Self(PathType::ALL.map(PathType::default_malus))
    }
}

impl MalusTable {
    /// Defaults with `overrides` applied.
    pub fn with_overrides(overrides: &BTreeMap<PathType, f32>) -> Self {
        let mut table = Self::default();
        for (&t, &malus) in overrides {
            table.set(t, malus);
        }
        table
    }

    pub fn get(&self, t: PathType) -> f32 {
        self.0[t.index()]
    }

    pub fn set(&mut self, t: PathType, malus: f32) {
        self.0[t.index()] = malus;
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Agent {
    pub profile: AgentProfile,
    /// Bottom centre of the bounding box.
    pub position: Vec3,
    pub on_ground: bool,
    pub in_water: bool,
    malus: MalusTable,
}

impl Agent {
    pub fn new(profile: AgentProfile, position: Vec3) -> Self {
        let malus = MalusTable::with_overrides(&profile.malus);
        Self {
            profile,
            position,
            on_ground: false,
            in_water: false,
            malus,
        }
    }

    /// Place the agent at `position` and refresh its contact flags.
    pub fn placed<W: BlockView + ?Sized>(profile: AgentProfile, position: Vec3, world: &W) -> Self {
        let mut agent = Self::new(profile, position);
        agent.update_contacts(world);
        agent
    }

    pub fn block_pos(&self) -> BlockPos {
        BlockPos::containing(self.position.x, self.position.y, self.position.z)
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::standing_at(self.position, self.profile.width, self.profile.height)
    }

    pub fn pathfinding_malus(&self, t: PathType) -> f32 {
        self.malus.get(t)
    }

    pub fn set_pathfinding_malus(&mut self, t: PathType, malus: f32) {
        self.malus.set(t, malus);
    }

    pub fn malus(&self) -> &MalusTable {
        &self.malus
    }

    /// Cells the agent's box spans when standing in a node: width, height,
    /// depth.
    pub fn footprint(&self) -> (i32, i32, i32) {
        let w = (self.profile.width + 1.0).floor() as i32;
        let h = (self.profile.height + 1.0).floor() as i32;
        (w, h, w)
    }

    /// Recompute `on_ground` and `in_water` from the world around the
    /// current position.
    pub fn update_contacts<W: BlockView + ?Sized>(&mut self, world: &W) {
        let bb = self.bounding_box();
        self.on_ground = world.collides(&bb.moved(Vec3::new(0.0, -0.01, 0.0)));
        self.in_water = touches_water(world, &bb);
    }

    /// Apply temporary malus values. The previous table comes back when the
    /// returned guard is dropped.
    pub fn override_malus(&mut self, overrides: &[(PathType, f32)]) -> MalusOverride<'_> {
        let saved = self.malus;
        for &(t, malus) in overrides {
            self.malus.set(t, malus);
        }
        MalusOverride { agent: self, saved }
    }
}

fn touches_water<W: BlockView + ?Sized>(world: &W, bb: &Aabb) -> bool {
    let min = BlockPos::containing(bb.min.x, bb.min.y, bb.min.z);
    let max = BlockPos::containing(bb.max.x, bb.max.y, bb.max.z);
    for y in min.y..=max.y {
        for z in min.z..=max.z {
            for x in min.x..=max.x {
                if world.fluid(BlockPos::new(x, y, z)) == crate::block::Fluid::Water {
                    return true;
                }
            }
        }
    }
    false
}

/// Borrow of an agent with a temporary malus table in effect.
pub struct MalusOverride<'a> {
    agent: &'a mut Agent,
    saved: MalusTable,
}

impl Deref for MalusOverride<'_> {
    type Target = Agent;

    fn deref(&self) -> &Agent {
        self.agent
    }
}

impl DerefMut for MalusOverride<'_> {
    fn deref_mut(&mut self) -> &mut Agent {
        self.agent
    }
}

impl Drop for MalusOverride<'_> {
    fn drop(&mut self) {
        self.agent.malus = self.saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::world::BlockGrid;

    #[test]
    fn profile_overrides_reach_the_table() {
        let agent = Agent::new(AgentProfile::flyer(), Vec3::default());
        assert_eq!(agent.pathfinding_malus(PathType::Water), -1.0);
        assert_eq!(agent.pathfinding_malus(PathType::WaterBorder), 16.0);
        assert_eq!(agent.pathfinding_malus(PathType::Breach), 4.0);
    }

    #[test]
    fn override_guard_restores_previous_table() {
        let mut agent = Agent::new(AgentProfile::walker(), Vec3::default());
        agent.set_pathfinding_malus(PathType::Rail, 3.0);
        {
            let mut guard = agent.override_malus(&[(PathType::Water, 0.0)]);
            assert_eq!(guard.pathfinding_malus(PathType::Water), 0.0);
            guard.set_pathfinding_malus(PathType::Rail, 9.0);
        }
        assert_eq!(agent.pathfinding_malus(PathType::Water), 8.0);
        assert_eq!(agent.pathfinding_malus(PathType::Rail), 3.0);
    }

    #[test]
    fn footprint_rounds_up_partial_blocks() {
        let walker = Agent::new(AgentProfile::walker(), Vec3::default());
        assert_eq!(walker.footprint(), (1, 2, 1));
        let mut wide = AgentProfile::walker();
        wide.width = 1.4;
        wide.height = 2.9;
        assert_eq!(Agent::new(wide, Vec3::default()).footprint(), (2, 3, 2));
    }

    #[test]
    fn contacts_detect_floor_and_water() {
        let mut world = BlockGrid::new(4, 4, 4);
        world.set(BlockPos::new(1, 0, 1), Block::Solid);
        world.set(BlockPos::new(2, 1, 2), Block::Water);

        let standing = Agent::placed(AgentProfile::walker(), Vec3::new(1.5, 1.0, 1.5), &world);
        assert!(standing.on_ground);
        assert!(!standing.in_water);

        let swimming = Agent::placed(AgentProfile::swimmer(), Vec3::new(2.5, 1.2, 2.5), &world);
        assert!(!swimming.on_ground);
        assert!(swimming.in_water);
    }

    #[test]
    fn profile_json_fills_missing_fields_from_walker() {
        let profile: AgentProfile =
            serde_json::from_str(r#"{"width": 1.2, "malus": {"Water": 2.0}}"#).unwrap();
        assert_eq!(profile.width, 1.2);
        assert_eq!(profile.height, 1.95);
        assert_eq!(profile.malus[&PathType::Water], 2.0);
    }
}
