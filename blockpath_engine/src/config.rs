// Data-driven navigation configuration.
//
// Every tunable the search reads lives in `NavConfig`: the heuristic
// weight, how the search budget scales with follow range, the jump and
// squeeze thresholds of the land evaluator, the water constants of the
// amphibious and swimming evaluators, and a table of named agent profiles.
// Loaded from JSON by hosts and by `route_probe`; `Default` carries the
// values the engine was tuned with.
//
// See also: `agent.rs` for `AgentProfile` and its presets, `navigator.rs`
// which applies the budget rules, `evaluator/` which reads the rest.

use crate::agent::AgentProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level navigation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Multiplier on the heuristic. Values above 1 trade optimality for
    /// fewer expanded nodes.
    pub heuristic_weight: f32,

    /// Search budget per block of follow range: `max_visited_nodes =
    /// floor(follow_range * visited_nodes_per_follow_block)`.
    pub visited_nodes_per_follow_block: f32,

    /// Minimum clearance a land agent can jump, in blocks. The effective
    /// jump height is `max(max_jump_height, profile.max_up_step)`.
    pub max_jump_height: f64,

    /// Agents narrower than this may cut diagonally past a fence corner.
    pub fence_squeeze_width: f64,

    /// Depth below sea level (in blocks) where an amphibian that prefers
    /// shallow water starts paying extra.
    pub deep_water_depth: i32,

    /// Extra malus a swimming agent pays for surfacing into air.
    pub surfacing_malus: f32,

    /// Malus an amphibian pays for dry walkable ground.
    pub amphibious_walkable_malus: f32,

    /// Malus an amphibian pays for the cells next to water.
    pub amphibious_water_border_malus: f32,

    /// Named agent profiles. Scenario files refer to these by key.
    pub profiles: BTreeMap<String, AgentProfile>,
}

impl Default for NavConfig {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert("walker".to_string(), AgentProfile::walker());
        profiles.insert("flyer".to_string(), AgentProfile::flyer());
        profiles.insert("amphibian".to_string(), AgentProfile::amphibian());
        profiles.insert("swimmer".to_string(), AgentProfile::swimmer());

        Self {
            heuristic_weight: 1.5,
            visited_nodes_per_follow_block: 16.0,
            max_jump_height: 1.125,
            fence_squeeze_width: 0.5,
            deep_water_depth: 10,
            surfacing_malus: 8.0,
            amphibious_walkable_malus: 6.0,
            amphibious_water_border_malus: 4.0,
            profiles,
        }
    }
}

impl NavConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn profile(&self, name: &str) -> Option<&AgentProfile> {
        self.profiles.get(name)
    }

    /// Search budget for an agent tracking targets over `follow_range`.
    pub fn max_visited_nodes(&self, follow_range: f32) -> usize {
        (follow_range * self.visited_nodes_per_follow_block).floor().max(0.0) as usize
    }
}
