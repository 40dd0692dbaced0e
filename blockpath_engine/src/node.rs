// Search nodes, the per-search node arena, and goal targets.
//
// A `Node` is one cell as seen by one search: its position, the A*
// bookkeeping (`g`, `h`, `f`, walked distance, closed flag, predecessor)
// and what the evaluator decided about the cell (`path_type`,
// `cost_malus`). Nodes live in a `NodeArena` owned by the search session
// and refer to each other by `NodeId`, so the predecessor chain is a list
// of indices and the whole node set is dropped in one go when the search
// ends. The arena also owns the coordinate cache that makes sure each cell
// gets exactly one node per search.
//
// `heap_idx` is the node's slot in the open set (see `heap.rs`), or -1 when
// it is not enqueued. Only the heap writes it.
//
// A `Target` is a goal cell plus the best node the search has found for it
// so far, used to build a partial route when the goal is never reached.

use crate::path_type::PathType;
use crate::types::BlockPos;
use rustc_hash::FxHashMap;
use std::ops::{Index, IndexMut};

/// Index of a node in its search's `NodeArena`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub pos: BlockPos,
    pub(crate) heap_idx: i32,
    /// Cost from the start, including malus.
    pub g: f32,
    /// Weighted estimate of the remaining cost to the nearest target.
    pub h: f32,
    pub f: f32,
    pub came_from: Option<NodeId>,
    pub closed: bool,
    /// Distance actually travelled from the start, without malus.
    pub walked_distance: f32,
    /// Negative means the agent may not enter this node.
    pub cost_malus: f32,
    pub path_type: PathType,
}

impl Node {
    pub fn new(pos: BlockPos) -> Self {
        Self {
            pos,
            heap_idx: -1,
            g: 0.0,
            h: 0.0,
            f: 0.0,
            came_from: None,
            closed: false,
            walked_distance: 0.0,
            cost_malus: 0.0,
            path_type: PathType::Blocked,
        }
    }

    pub fn in_open_set(&self) -> bool {
        self.heap_idx >= 0
    }

    pub fn heap_idx(&self) -> i32 {
        self.heap_idx
    }

    pub fn distance_to(&self, pos: BlockPos) -> f32 {
        self.pos.distance_to(pos)
    }

    pub fn distance_manhattan(&self, pos: BlockPos) -> u32 {
        self.pos.manhattan_distance(pos)
    }

    /// Copy of this node with its search links cut, for keeping after the
    /// arena that owned it is gone.
    pub(crate) fn detached(&self) -> Self {
        Self {
            heap_idx: -1,
            came_from: None,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// All nodes of one search, with the coordinate cache that deduplicates
/// them.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    by_pos: FxHashMap<i64, NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node for `pos`, creating it the first time the cell is seen.
    pub fn get_or_create(&mut self, pos: BlockPos) -> NodeId {
        let nodes = &mut self.nodes;
        *self.by_pos.entry(pos.as_long()).or_insert_with(|| {
            let id = NodeId(nodes.len() as u32);
            nodes.push(Node::new(pos));
            id
        })
    }

    pub fn find(&self, pos: BlockPos) -> Option<NodeId> {
        self.by_pos.get(&pos.as_long()).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// The chain from the search start to `end`, start first.
    pub fn chain_to(&self, end: NodeId) -> Vec<Node> {
        let mut chain = vec![self[end].detached()];
        let mut cursor = self[end].came_from;
        while let Some(id) = cursor {
            chain.push(self[id].detached());
            cursor = self[id].came_from;
        }
        chain.reverse();
        chain
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.by_pos.clear();
    }
}

impl Index<NodeId> for NodeArena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }
}

impl IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// A goal cell and the search's progress towards it.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub pos: BlockPos,
    /// Smallest unweighted distance from any node for which this was the
    /// nearest target.
    pub best_heuristic: f32,
    pub best_node: Option<NodeId>,
    pub reached: bool,
}

impl Target {
    pub fn new(pos: BlockPos) -> Self {
        Self {
            pos,
            best_heuristic: f32::MAX,
            best_node: None,
            reached: false,
        }
    }

    /// Record `node` as the best so far if `h` beats the current best.
    pub fn update_best(&mut self, h: f32, node: NodeId) {
        if h < self.best_heuristic {
            self.best_heuristic = h;
            self.best_node = Some(node);
        }
    }

    pub fn set_reached(&mut self) {
        self.reached = true;
    }
}
