// JSON scenario files: a small world, one agent and its targets.
//
// A scenario bundles everything a single search needs so it can be kept
// on disk, replayed by `route_probe`, and used as a fixture in tests. The
// world is given as glyph layers (bottom layer first, see
// `BlockGrid::from_layers` and `Block::from_glyph`); the agent's profile is
// either the name of a preset in `NavConfig::profiles` or a full inline
// `AgentProfile`.
//
// ```json
// {
//   "layers": [["###", "###"], ["...", "..."]],
//   "agent": { "profile": "walker", "position": { "x": 0.5, "y": 1.0, "z": 0.5 } },
//   "targets": [{ "x": 2, "y": 1, "z": 1 }],
//   "accuracy": 0
// }
// ```

use crate::agent::{Agent, AgentProfile};
use crate::config::NavConfig;
use crate::navigator::Navigator;
use crate::path::Path;
use crate::types::{BlockPos, Vec3};
use crate::world::{BlockGrid, GridError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    /// Glyph layers, bottom first. Each layer is a list of Z rows.
    pub layers: Vec<Vec<String>>,
    #[serde(default)]
    pub sea_level: i32,
    pub agent: ScenarioAgent,
    pub targets: Vec<BlockPos>,
    #[serde(default)]
    pub accuracy: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioAgent {
    pub profile: ProfileRef,
    /// Bottom centre of the agent's box.
    pub position: Vec3,
}

/// A preset name or a profile spelled out in full.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileRef {
    Preset(String),
    Inline(AgentProfile),
}

#[derive(Debug)]
pub enum ScenarioError {
    Json(serde_json::Error),
    Grid(GridError),
    UnknownProfile(String),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Json(e) => write!(f, "invalid scenario JSON: {e}"),
            ScenarioError::Grid(e) => write!(f, "invalid scenario world: {e}"),
            ScenarioError::UnknownProfile(name) => write!(f, "no agent profile named {name:?}"),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScenarioError::Json(e) => Some(e),
            ScenarioError::Grid(e) => Some(e),
            ScenarioError::UnknownProfile(_) => None,
        }
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(e: serde_json::Error) -> Self {
        ScenarioError::Json(e)
    }
}

impl From<GridError> for ScenarioError {
    fn from(e: GridError) -> Self {
        ScenarioError::Grid(e)
    }
}

/// What running a scenario produced.
#[derive(Clone, Debug)]
pub struct ScenarioRun {
    pub world: BlockGrid,
    pub strategy: &'static str,
    pub path: Option<Path>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn world(&self) -> Result<BlockGrid, ScenarioError> {
        Ok(BlockGrid::from_layers(&self.layers)?.with_sea_level(self.sea_level))
    }

    pub fn profile(&self, config: &NavConfig) -> Result<AgentProfile, ScenarioError> {
        match &self.agent.profile {
            ProfileRef::Preset(name) => config
                .profile(name)
                .cloned()
                .ok_or_else(|| ScenarioError::UnknownProfile(name.clone())),
            ProfileRef::Inline(profile) => Ok(profile.clone()),
        }
    }

    /// Build the world and agent and search once.
    pub fn run(&self, config: &NavConfig, capture_debug: bool) -> Result<ScenarioRun, ScenarioError> {
        let world = self.world()?;
        let profile = self.profile(config)?;
        let mut agent = Agent::placed(profile, self.agent.position, &world);
        let mut nav = Navigator::new(&agent.profile, config);
        nav.strategy_mut().set_capture_debug(capture_debug);
        let path = nav.create_path(&world, &mut agent, &self.targets, self.accuracy);
        Ok(ScenarioRun {
            strategy: nav.strategy().name(),
            world,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRIDOR: &str = r######"{
        "layers": [
            ["#####", "#####", "#####"],
            ["#####", ".....", "#####"],
            ["#####", ".....", "#####"]
        ],
        "agent": { "profile": "walker", "position": { "x": 0.5, "y": 1.0, "z": 1.5 } },
        "targets": [{ "x": 4, "y": 1, "z": 1 }]
    }"######;

    #[test]
    fn corridor_scenario_reaches_the_end() {
        let scenario = Scenario::from_json(CORRIDOR).unwrap();
        assert_eq!(scenario.accuracy, 0);
        let run = scenario.run(&NavConfig::default(), false).unwrap();
        assert_eq!(run.strategy, "walk");
        let path = run.path.unwrap();
        assert!(path.can_reach());
        assert_eq!(path.node_count(), 5);
        assert!(path.debug().is_none());
    }

    #[test]
    fn inline_profiles_are_accepted() {
        let json = CORRIDOR.replace(
            r#""profile": "walker""#,
            r#""profile": { "width": 0.9, "height": 0.9, "locomotion": "Fly" }"#,
        );
        let scenario = Scenario::from_json(&json).unwrap();
        let profile = scenario.profile(&NavConfig::default()).unwrap();
        assert_eq!(profile.width, 0.9);
        let run = scenario.run(&NavConfig::default(), true).unwrap();
        assert_eq!(run.strategy, "fly");
        assert!(run.path.unwrap().debug().is_some());
    }

    #[test]
    fn errors_name_the_problem() {
        let json = CORRIDOR.replace("walker", "dragon");
        let err = Scenario::from_json(&json)
            .unwrap()
            .run(&NavConfig::default(), false)
            .unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownProfile(ref name) if name == "dragon"));

        let json = CORRIDOR.replacen(r#"".....""#, r#""..?..""#, 1);
        let err = Scenario::from_json(&json).unwrap().world().unwrap_err();
        assert!(err.to_string().contains("'?'"));

        assert!(matches!(Scenario::from_json("{"), Err(ScenarioError::Json(_))));
    }
}
