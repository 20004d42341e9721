// Copyright 2024 Nathan Hoos
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! State-discovery queue disciplines (spec §4.4): shortest distance and
//! related traversal algorithms are parameterized by *how* the next
//! state to expand is chosen. `Auto` inspects an FST's properties and
//! picks the cheapest queue that remains correct.

use crate::containers::Heap;
use crate::label::StateId;
use crate::properties::FstProperties;

/// A queue of `StateId`s with insertion order controlled by the
/// discipline (spec §4.4 "Queue").
pub trait Queue {
    fn enqueue(&mut self, state: StateId);
    fn dequeue(&mut self) -> Option<StateId>;
    fn update(&mut self, _state: StateId) {}
    fn is_empty(&self) -> bool;
    fn clear(&mut self);
}

/// First-in-first-out; correct for any FST, optimal for acyclic or
/// already topologically-ordered ones.
#[derive(Debug, Default)]
pub struct FifoQueue {
    data: std::collections::VecDeque<StateId>,
}

impl Queue for FifoQueue {
    fn enqueue(&mut self, state: StateId) {
        self.data.push_back(state);
    }
    fn dequeue(&mut self) -> Option<StateId> {
        self.data.pop_front()
    }
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    fn clear(&mut self) {
        self.data.clear();
    }
}

/// Last-in-first-out (a stack); used by depth-first traversals.
#[derive(Debug, Default)]
pub struct LifoQueue {
    data: Vec<StateId>,
}

impl Queue for LifoQueue {
    fn enqueue(&mut self, state: StateId) {
        self.data.push(state);
    }
    fn dequeue(&mut self) -> Option<StateId> {
        self.data.pop()
    }
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    fn clear(&mut self) {
        self.data.clear();
    }
}

/// Orders strictly by the state id itself; correct when states are
/// already numbered in the traversal order the caller wants (spec §4.4
/// "StateOrderQueue").
#[derive(Debug, Default)]
pub struct StateOrderQueue {
    data: std::collections::BTreeSet<StateId>,
}

impl Queue for StateOrderQueue {
    fn enqueue(&mut self, state: StateId) {
        self.data.insert(state);
    }
    fn dequeue(&mut self) -> Option<StateId> {
        let first = *self.data.iter().next()?;
        self.data.remove(&first);
        Some(first)
    }
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    fn clear(&mut self) {
        self.data.clear();
    }
}

/// Orders by a precomputed topological rank; used when the FST is known
/// acyclic (spec §4.4 "TopOrderQueue").
#[derive(Debug)]
pub struct TopOrderQueue {
    rank: std::rc::Rc<Vec<i64>>,
    data: std::collections::BinaryHeap<std::cmp::Reverse<(i64, StateId)>>,
}

impl TopOrderQueue {
    pub fn new(rank: Vec<i64>) -> Self {
        TopOrderQueue {
            rank: std::rc::Rc::new(rank),
            data: std::collections::BinaryHeap::new(),
        }
    }
}

impl Queue for TopOrderQueue {
    fn enqueue(&mut self, state: StateId) {
        let r = self.rank.get(state as usize).copied().unwrap_or(i64::MAX);
        self.data.push(std::cmp::Reverse((r, state)));
    }
    fn dequeue(&mut self) -> Option<StateId> {
        self.data.pop().map(|std::cmp::Reverse((_, s))| s)
    }
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    fn clear(&mut self) {
        self.data.clear();
    }
}

/// Always dequeues the state with the least tentative distance (spec
/// §4.4 "ShortestFirstQueue"); the Dijkstra discipline used by shortest
/// distance/path whenever the semiring isn't a `path` semiring over a
/// DAG. Backed by [`Heap`] so `update` reorders in O(log n) instead of
/// a full rescan.
pub struct ShortestFirstQueue<'a> {
    heap: Heap<Box<dyn Fn(StateId, StateId) -> std::cmp::Ordering + 'a>>,
}

impl<'a> ShortestFirstQueue<'a> {
    pub fn new(less: impl Fn(StateId, StateId) -> std::cmp::Ordering + 'a) -> Self {
        ShortestFirstQueue {
            heap: Heap::new(Box::new(less)),
        }
    }
}

impl<'a> Queue for ShortestFirstQueue<'a> {
    fn enqueue(&mut self, state: StateId) {
        if !self.heap.contains(state) {
            self.heap.push(state);
        } else {
            self.heap.update(state);
        }
    }
    fn dequeue(&mut self) -> Option<StateId> {
        self.heap.pop()
    }
    fn update(&mut self, state: StateId) {
        if self.heap.contains(state) {
            self.heap.update(state);
        }
    }
    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
    fn clear(&mut self) {
        while self.heap.pop().is_some() {}
    }
}

/// Picks a correct-and-cheap discipline from an FST's known properties
/// (spec §4.4 "AutoQueue"): topological order when acyclic, state order
/// when already sorted and the semiring is idempotent, otherwise FIFO.
pub fn auto_queue_kind(properties: FstProperties) -> AutoQueueKind {
    use crate::properties as p;
    if properties.contains(p::ACYCLIC) {
        AutoQueueKind::TopOrder
    } else if properties.contains(p::TOP_SORTED) {
        AutoQueueKind::StateOrder
    } else {
        AutoQueueKind::Fifo
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoQueueKind {
    Fifo,
    TopOrder,
    StateOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_preserves_insertion_order() {
        let mut q = FifoQueue::default();
        q.enqueue(1);
        q.enqueue(2);
        q.enqueue(3);
        assert_eq!(q.dequeue(), Some(1));
        assert_eq!(q.dequeue(), Some(2));
    }

    #[test]
    fn lifo_reverses_insertion_order() {
        let mut q = LifoQueue::default();
        q.enqueue(1);
        q.enqueue(2);
        assert_eq!(q.dequeue(), Some(2));
        assert_eq!(q.dequeue(), Some(1));
    }

    #[test]
    fn shortest_first_dequeues_least_distance() {
        let dist = std::cell::RefCell::new(vec![3.0, 1.0, 2.0]);
        let mut q = ShortestFirstQueue::new(|a: StateId, b: StateId| {
            dist.borrow()[a as usize]
                .partial_cmp(&dist.borrow()[b as usize])
                .unwrap()
        });
        q.enqueue(0);
        q.enqueue(1);
        q.enqueue(2);
        assert_eq!(q.dequeue(), Some(1));
        assert_eq!(q.dequeue(), Some(2));
        assert_eq!(q.dequeue(), Some(0));
    }

    #[test]
    fn auto_queue_picks_top_order_for_acyclic() {
        let props = crate::properties::add_state(FstProperties::empty());
        let props = FstProperties(props.0 | crate::properties::ACYCLIC);
        assert_eq!(auto_queue_kind(props), AutoQueueKind::TopOrder);
    }
}
