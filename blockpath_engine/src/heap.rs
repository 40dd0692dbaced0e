// Open set for the search: a binary min-heap of nodes ordered by `f`.
//
// Unlike `std::collections::BinaryHeap`, every node knows its own slot
// (`Node::heap_idx`), which lets the search lower the cost of a node that
// is already queued (`change_cost`) or pull an arbitrary node out
// (`remove`) in O(log n) without any external index table. The heap stores
// `NodeId`s; the `f` values and slot indices live on the nodes in the
// search's `NodeArena`, which every operation borrows.
//
// Ties on `f` are broken by heap shape only, so the pop order of equal-cost
// nodes is a deterministic function of the operation sequence.
//
// The heap does not deduplicate positions; that is the arena's job.

use crate::node::{NodeArena, NodeId};

const INITIAL_CAPACITY: usize = 128;

#[derive(Clone, Debug)]
pub struct OpenSet {
    heap: Vec<NodeId>,
}

impl Default for OpenSet {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenSet {
    pub fn new() -> Self {
        Self {
            heap: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Queued nodes in heap order.
    pub fn ids(&self) -> &[NodeId] {
        &self.heap
    }

    pub fn peek(&self) -> Option<NodeId> {
        self.heap.first().copied()
    }

    /// Forget all queued nodes. Keeps the backing storage.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Queue a node that is not already queued.
    pub fn insert(&mut self, nodes: &mut NodeArena, id: NodeId) {
        debug_assert!(
            !nodes[id].in_open_set(),
            "node {} is already in the open set",
            nodes[id].pos
        );
        if nodes[id].in_open_set() {
            log::warn!("ignoring insert of already queued node {}", nodes[id].pos);
            return;
        }
        let idx = self.heap.len();
        self.heap.push(id);
        nodes[id].heap_idx = idx as i32;
        self.up_heap(nodes, idx);
    }

    /// Remove and return the node with the smallest `f`.
    pub fn pop(&mut self, nodes: &mut NodeArena) -> Option<NodeId> {
        let last = self.heap.pop()?;
        let top = if self.heap.is_empty() {
            last
        } else {
            let top = self.heap[0];
            self.heap[0] = last;
            nodes[last].heap_idx = 0;
            self.down_heap(nodes, 0);
            top
        };
        nodes[top].heap_idx = -1;
        Some(top)
    }

    /// Take a queued node out of the heap, wherever it is.
    pub fn remove(&mut self, nodes: &mut NodeArena, id: NodeId) {
        let idx = nodes[id].heap_idx;
        if idx < 0 {
            return;
        }
        let idx = idx as usize;
        let removed_f = nodes[id].f;
        nodes[id].heap_idx = -1;
        let Some(last) = self.heap.pop() else {
            return;
        };
        if idx < self.heap.len() {
            self.heap[idx] = last;
            nodes[last].heap_idx = idx as i32;
            if nodes[last].f < removed_f {
                self.up_heap(nodes, idx);
            } else {
                self.down_heap(nodes, idx);
            }
        }
    }

    /// Set a queued node's `f` and restore the heap order.
    pub fn change_cost(&mut self, nodes: &mut NodeArena, id: NodeId, f: f32) {
        let old = nodes[id].f;
        nodes[id].f = f;
        let idx = nodes[id].heap_idx;
        debug_assert!(idx >= 0, "change_cost on node {} outside the open set", nodes[id].pos);
        if idx < 0 {
            return;
        }
        if f < old {
            self.up_heap(nodes, idx as usize);
        } else {
            self.down_heap(nodes, idx as usize);
        }
    }

    fn up_heap(&mut self, nodes: &mut NodeArena, mut idx: usize) {
        let id = self.heap[idx];
        let f = nodes[id].f;
        while idx > 0 {
            let parent_idx = (idx - 1) >> 1;
            let parent = self.heap[parent_idx];
            if f >= nodes[parent].f {
                break;
            }
            self.heap[idx] = parent;
            nodes[parent].heap_idx = idx as i32;
            idx = parent_idx;
        }
        self.heap[idx] = id;
        nodes[id].heap_idx = idx as i32;
    }

    fn down_heap(&mut self, nodes: &mut NodeArena, mut idx: usize) {
        let id = self.heap[idx];
        let f = nodes[id].f;
        let size = self.heap.len();
        loop {
            let left_idx = 1 + (idx << 1);
            let right_idx = left_idx + 1;
            if left_idx >= size {
                break;
            }
            let left = self.heap[left_idx];
            let left_f = nodes[left].f;
            let right_f = if right_idx < size {
                nodes[self.heap[right_idx]].f
            } else {
                f32::INFINITY
            };
            let (child_idx, child_f) = if left_f < right_f {
                (left_idx, left_f)
            } else {
                (right_idx, right_f)
            };
            if child_f >= f {
                break;
            }
            let child = self.heap[child_idx];
            self.heap[idx] = child;
            nodes[child].heap_idx = idx as i32;
            idx = child_idx;
        }
        self.heap[idx] = id;
        nodes[id].heap_idx = idx as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockPos;
    use proptest::prelude::*;

    fn arena_with(fs: &[f32]) -> (NodeArena, Vec<NodeId>) {
        let mut arena = NodeArena::new();
        let ids = fs
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let id = arena.get_or_create(BlockPos::new(i as i32, 0, 0));
                arena[id].f = f;
                id
            })
            .collect();
        (arena, ids)
    }

    fn assert_heap_ok(open: &OpenSet, arena: &NodeArena) {
        let heap = open.ids();
        for (i, &id) in heap.iter().enumerate() {
            assert_eq!(arena[id].heap_idx(), i as i32, "slot index of {id:?}");
            for child in [2 * i + 1, 2 * i + 2] {
                if child < heap.len() {
                    assert!(arena[id].f <= arena[heap[child]].f, "heap order at {i}");
                }
            }
        }
    }

    #[test]
    fn pops_in_cost_order() {
        let (mut arena, ids) = arena_with(&[5.0, 1.0, 4.0, 2.0, 3.0]);
        let mut open = OpenSet::new();
        for &id in &ids {
            open.insert(&mut arena, id);
        }
        let mut fs = Vec::new();
        while let Some(id) = open.pop(&mut arena) {
            assert!(!arena[id].in_open_set());
            fs.push(arena[id].f);
        }
        assert_eq!(fs, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(open.pop(&mut arena).is_none());
    }

    #[test]
    fn change_cost_moves_node_to_front() {
        let (mut arena, ids) = arena_with(&[5.0, 6.0, 7.0]);
        let mut open = OpenSet::new();
        for &id in &ids {
            open.insert(&mut arena, id);
        }
        open.change_cost(&mut arena, ids[2], 1.0);
        assert_heap_ok(&open, &arena);
        assert_eq!(open.peek(), Some(ids[2]));
    }

    #[test]
    fn remove_takes_arbitrary_node() {
        let (mut arena, ids) = arena_with(&[1.0, 2.0, 3.0, 4.0]);
        let mut open = OpenSet::new();
        for &id in &ids {
            open.insert(&mut arena, id);
        }
        open.remove(&mut arena, ids[1]);
        assert!(!arena[ids[1]].in_open_set());
        assert_eq!(open.len(), 3);
        assert_heap_ok(&open, &arena);
        open.remove(&mut arena, ids[3]);
        assert_eq!(open.len(), 2);
        assert_heap_ok(&open, &arena);
    }

    #[test]
    fn clear_keeps_capacity() {
        let (mut arena, ids) = arena_with(&[1.0; 200]);
        let mut open = OpenSet::new();
        for &id in &ids {
            open.insert(&mut arena, id);
        }
        let capacity = open.heap.capacity();
        open.clear();
        assert!(open.is_empty());
        assert_eq!(open.heap.capacity(), capacity);
    }

    #[test]
    #[should_panic(expected = "already in the open set")]
    fn double_insert_is_an_invariant_violation() {
        let (mut arena, ids) = arena_with(&[1.0]);
        let mut open = OpenSet::new();
        open.insert(&mut arena, ids[0]);
        open.insert(&mut arena, ids[0]);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(f32),
        Pop,
        Remove(usize),
        ChangeCost(usize, f32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..100.0).prop_map(Op::Insert),
            Just(Op::Pop),
            any::<usize>().prop_map(Op::Remove),
            (any::<usize>(), 0.0f32..100.0).prop_map(|(i, f)| Op::ChangeCost(i, f)),
        ]
    }

    proptest! {
        #[test]
        fn interleaved_ops_keep_heap_order(ops in prop::collection::vec(op(), 1..200)) {
            let mut arena = NodeArena::new();
            let mut open = OpenSet::new();
            let mut next_x = 0;
            for op in ops {
                match op {
                    Op::Insert(f) => {
                        let id = arena.get_or_create(BlockPos::new(next_x, 0, 0));
                        next_x += 1;
                        arena[id].f = f;
                        open.insert(&mut arena, id);
                    }
                    Op::Pop => {
                        let min = open.ids().iter().map(|&id| arena[id].f).fold(f32::INFINITY, f32::min);
                        if let Some(id) = open.pop(&mut arena) {
                            prop_assert_eq!(arena[id].f, min);
                            prop_assert!(!arena[id].in_open_set());
                        } else {
                            prop_assert!(open.is_empty());
                        }
                    }
                    Op::Remove(k) => {
                        if !open.is_empty() {
                            let id = open.ids()[k % open.len()];
                            open.remove(&mut arena, id);
                            prop_assert!(!arena[id].in_open_set());
                        }
                    }
                    Op::ChangeCost(k, f) => {
                        if !open.is_empty() {
                            let id = open.ids()[k % open.len()];
                            open.change_cost(&mut arena, id, f);
                        }
                    }
                }
                assert_heap_ok(&open, &arena);
            }
        }
    }
}
