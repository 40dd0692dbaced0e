// The result of a search: an ordered route of nodes with a cursor.
//
// A `Path` owns detached copies of the nodes from the start to the chosen
// end node, the target it was planned for, how far its last node is from
// that target (Manhattan), and whether a target was actually reached. The
// only mutable state is the `next_node_index` cursor that controllers
// advance as the agent moves, plus `truncate_nodes` / `replace_node` for
// patching the tail of a route without searching again.
//
// `PathDebug` is an optional snapshot of the search that produced the
// path (open set, closed set, targets) for tooling. It serialises to flat
// position + cost records.
//
// See also: `pathfinder.rs` which builds paths, `navigator.rs` which keeps
// the current one for an agent.

use crate::node::Node;
use crate::path_type::PathType;
use crate::types::{BlockPos, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct Path {
    nodes: Vec<Node>,
    next_node_index: usize,
    target: BlockPos,
    dist_to_target: f32,
    reached: bool,
    debug: Option<PathDebug>,
}

impl Path {
    pub fn new(nodes: Vec<Node>, target: BlockPos, reached: bool) -> Self {
        let dist_to_target = nodes
            .last()
            .map_or(f32::MAX, |n| n.distance_manhattan(target) as f32);
        Self {
            nodes,
            next_node_index: 0,
            target,
            dist_to_target,
            reached,
            debug: None,
        }
    }

    pub(crate) fn with_debug(mut self, debug: PathDebug) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn advance(&mut self) {
        self.next_node_index += 1;
    }

    pub fn not_started(&self) -> bool {
        self.next_node_index == 0
    }

    pub fn is_done(&self) -> bool {
        self.next_node_index >= self.nodes.len()
    }

    pub fn end_node(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn node(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Drop every node from index `len` on.
    pub fn truncate_nodes(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    pub fn replace_node(&mut self, i: usize, node: Node) {
        self.nodes[i] = node;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn next_node_index(&self) -> usize {
        self.next_node_index
    }

    pub fn set_next_node_index(&mut self, i: usize) {
        self.next_node_index = i;
    }

    /// Where an agent of `width` should stand to occupy node `i`: the
    /// node's corner offset by half the agent's footprint.
    pub fn entity_pos_at_node(&self, width: f64, i: usize) -> Vec3 {
        let node = &self.nodes[i];
        let half = (width + 1.0).floor() * 0.5;
        Vec3::new(
            node.pos.x as f64 + half,
            node.pos.y as f64,
            node.pos.z as f64 + half,
        )
    }

    /// `None` once the route is done.
    pub fn next_entity_pos(&self, width: f64) -> Option<Vec3> {
        (!self.is_done()).then(|| self.entity_pos_at_node(width, self.next_node_index))
    }

    pub fn node_pos(&self, i: usize) -> BlockPos {
        self.nodes[i].pos
    }

    pub fn next_node_pos(&self) -> Option<BlockPos> {
        self.next_node().map(|n| n.pos)
    }

    pub fn next_node(&self) -> Option<&Node> {
        self.nodes.get(self.next_node_index)
    }

    pub fn previous_node(&self) -> Option<&Node> {
        self.next_node_index
            .checked_sub(1)
            .and_then(|i| self.nodes.get(i))
    }

    /// Same cell sequence as `other`. Costs and cursors are ignored.
    pub fn same_as(&self, other: &Path) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| a.pos == b.pos)
    }

    pub fn can_reach(&self) -> bool {
        self.reached
    }

    pub fn target(&self) -> BlockPos {
        self.target
    }

    /// Manhattan distance from the last node to the target, `f32::MAX` for
    /// an empty path.
    pub fn dist_to_target(&self) -> f32 {
        self.dist_to_target
    }

    pub fn debug(&self) -> Option<&PathDebug> {
        self.debug.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Debug snapshot
// ---------------------------------------------------------------------------

/// One node as recorded in a debug snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugNode {
    pub pos: BlockPos,
    pub g: f32,
    pub h: f32,
    pub f: f32,
    pub walked_distance: f32,
    pub cost_malus: f32,
    pub path_type: PathType,
    pub closed: bool,
}

impl From<&Node> for DebugNode {
    fn from(node: &Node) -> Self {
        Self {
            pos: node.pos,
            g: node.g,
            h: node.h,
            f: node.f,
            walked_distance: node.walked_distance,
            cost_malus: node.cost_malus,
            path_type: node.path_type,
            closed: node.closed,
        }
    }
}

/// State of the search when it finished.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathDebug {
    pub open_set: Vec<DebugNode>,
    pub closed_set: Vec<DebugNode>,
    pub targets: Vec<DebugNode>,
}

impl PathDebug {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(len: i32) -> Vec<Node> {
        (0..len).map(|x| Node::new(BlockPos::new(x, 0, 0))).collect()
    }

    #[test]
    fn cursor_walks_to_done() {
        let mut path = Path::new(line(3), BlockPos::new(2, 0, 0), true);
        assert!(path.not_started());
        assert!(path.previous_node().is_none());
        assert_eq!(path.next_node_pos(), Some(BlockPos::new(0, 0, 0)));
        path.advance();
        assert!(!path.not_started());
        assert_eq!(path.previous_node().map(|n| n.pos.x), Some(0));
        path.advance();
        path.advance();
        assert!(path.is_done());
    }

    #[test]
    fn finished_route_has_no_next_node() {
        let mut path = Path::new(line(2), BlockPos::new(1, 0, 0), true);
        path.set_next_node_index(2);
        assert!(path.is_done());
        assert!(path.next_node().is_none());
        assert!(path.next_node_pos().is_none());
        assert!(path.next_entity_pos(0.6).is_none());
        assert_eq!(path.previous_node().map(|n| n.pos.x), Some(1));
        path.set_next_node_index(1);
        assert_eq!(path.next_node().map(|n| n.pos.x), Some(1));
    }

    #[test]
    fn distance_to_target_uses_last_node() {
        let path = Path::new(line(3), BlockPos::new(5, 1, 0), false);
        assert_eq!(path.dist_to_target(), 4.0);
        assert!(!path.can_reach());
        let empty = Path::new(Vec::new(), BlockPos::ZERO, false);
        assert_eq!(empty.dist_to_target(), f32::MAX);
        assert!(empty.is_done());
        assert!(empty.end_node().is_none());
    }

    #[test]
    fn truncate_and_replace_patch_the_tail() {
        let mut path = Path::new(line(4), BlockPos::new(3, 0, 0), true);
        path.truncate_nodes(2);
        assert_eq!(path.node_count(), 2);
        path.replace_node(1, Node::new(BlockPos::new(1, 1, 0)));
        assert_eq!(path.end_node().map(|n| n.pos), Some(BlockPos::new(1, 1, 0)));
    }

    #[test]
    fn same_as_compares_positions_only() {
        let a = Path::new(line(3), BlockPos::new(2, 0, 0), true);
        let mut b = Path::new(line(3), BlockPos::new(9, 0, 0), false);
        b.advance();
        assert!(a.same_as(&b));
        let c = Path::new(line(2), BlockPos::new(2, 0, 0), true);
        assert!(!a.same_as(&c));
    }

    #[test]
    fn entity_position_centres_on_footprint() {
        let path = Path::new(line(2), BlockPos::new(1, 0, 0), true);
        assert_eq!(path.entity_pos_at_node(0.6, 1), Vec3::new(1.5, 0.0, 0.5));
        assert_eq!(path.entity_pos_at_node(1.4, 0), Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(path.next_entity_pos(0.6), Some(Vec3::new(0.5, 0.0, 0.5)));
    }

    #[test]
    fn debug_snapshot_serialises_flat_records() {
        let mut node = Node::new(BlockPos::new(1, 2, 3));
        node.cost_malus = 8.0;
        node.path_type = PathType::Water;
        let debug = PathDebug {
            open_set: vec![DebugNode::from(&node)],
            ..PathDebug::default()
        };
        let json = debug.to_json().unwrap();
        assert!(json.contains(r#""path_type":"Water""#));
        let restored: PathDebug = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, debug);
    }
}
