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

//! A binary min-heap keyed by an externally supplied comparator, with
//! decrease-key support via a reverse index (grounded on OpenFst's
//! `heap.h`, used there by the Dijkstra shortest-distance/-path queue
//! discipline). Items are `StateId`s; the comparator closure compares by
//! current tentative distance so callers can mutate distances and call
//! [`Heap::update`] without a full rebuild.

use crate::label::StateId;

pub struct Heap<F>
where
    F: Fn(StateId, StateId) -> std::cmp::Ordering,
{
    data: Vec<StateId>,
    position: rustc_hash::FxHashMap<StateId, usize>,
    less: F,
}

impl<F> Heap<F>
where
    F: Fn(StateId, StateId) -> std::cmp::Ordering,
{
    pub fn new(less: F) -> Self {
        Heap {
            data: Vec::new(),
            position: rustc_hash::FxHashMap::default(),
            less,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.position.contains_key(&state)
    }

    pub fn push(&mut self, state: StateId) {
        self.data.push(state);
        let idx = self.data.len() - 1;
        self.position.insert(state, idx);
        self.sift_up(idx);
    }

    pub fn pop(&mut self) -> Option<StateId> {
        if self.data.is_empty() {
            return None;
        }
        let top = self.data[0];
        self.position.remove(&top);
        let last = self.data.pop().unwrap();
        if !self.data.is_empty() {
            self.data[0] = last;
            self.position.insert(last, 0);
            self.sift_down(0);
        }
        Some(top)
    }

    /// Re-establishes heap order for `state` after its priority changed.
    pub fn update(&mut self, state: StateId) {
        if let Some(&idx) = self.position.get(&state) {
            self.sift_up(idx);
            let idx = self.position[&state];
            self.sift_down(idx);
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.data.swap(i, j);
        self.position.insert(self.data[i], i);
        self.position.insert(self.data[j], j);
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if (self.less)(self.data[idx], self.data[parent]) == std::cmp::Ordering::Less {
                self.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let left = 2 * idx + 1;
            let right = 2 * idx + 2;
            let mut smallest = idx;
            if left < self.data.len()
                && (self.less)(self.data[left], self.data[smallest]) == std::cmp::Ordering::Less
            {
                smallest = left;
            }
            if right < self.data.len()
                && (self.less)(self.data[right], self.data[smallest]) == std::cmp::Ordering::Less
            {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.swap(idx, smallest);
            idx = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn pops_in_ascending_order_of_external_key() {
        let dist = RefCell::new(vec![5.0, 1.0, 3.0, 2.0]);
        let mut heap = Heap::new(|a: StateId, b: StateId| {
            dist.borrow()[a as usize]
                .partial_cmp(&dist.borrow()[b as usize])
                .unwrap()
        });
        for s in [0, 1, 2, 3] {
            heap.push(s);
        }
        let mut order = Vec::new();
        while let Some(s) = heap.pop() {
            order.push(s);
        }
        assert_eq!(order, vec![1, 3, 2, 0]);
    }

    #[test]
    fn update_reorders_after_decrease_key() {
        let dist = RefCell::new(vec![10.0, 10.0]);
        let mut heap = Heap::new(|a: StateId, b: StateId| {
            dist.borrow()[a as usize]
                .partial_cmp(&dist.borrow()[b as usize])
                .unwrap()
        });
        heap.push(0);
        heap.push(1);
        dist.borrow_mut()[1] = 1.0;
        heap.update(1);
        assert_eq!(heap.pop(), Some(1));
    }
}
