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

//! Bijection between parenthesis stacks and integer stack IDs, grounded
//! on `original_source/src/include/fst/extensions/pdt/pdt.h`'s
//! `PdtStack`.
//!
//! The stacks form a tree: every reachable configuration is either the
//! empty stack (ID `0`, the tree root) or some other configuration with
//! one more open paren pushed on top. [`StackId::find`] walks one arc
//! label's effect on the current configuration — push, pop, or pass
//! through unchanged for a non-paren label — and hash-conses newly
//! discovered push configurations so the same sequence of opens always
//! maps back to the same ID.

use rustc_hash::FxHashMap;

use crate::label::Label;

/// Identifies one stack configuration. `0` is always the empty stack.
pub type StackId = i64;

/// Returned by [`PdtStack::find`] for an unmatched close paren: the
/// traversal step is invalid and should be discarded.
pub const NO_STACK_ID: StackId = -1;

struct StackNode {
    parent_id: StackId,
    /// Index into `parens` of the paren pair pushed to reach this node.
    paren_id: usize,
}

/// Hash-consed bijection between stack configurations and [`StackId`]s,
/// parameterized by the set of open/close label pairs that act as
/// parentheses. Any label not named in a pair passes through
/// [`find`](PdtStack::find) without changing the stack.
pub struct PdtStack {
    parens: Vec<(Label, Label)>,
    nodes: Vec<StackNode>,
    /// Maps a paren label (open or close) to its pair's index in `parens`.
    paren_map: FxHashMap<Label, usize>,
    /// Hash-conses pushes: `(stack_id, open_label) -> child stack_id`.
    child_map: FxHashMap<(StackId, Label), StackId>,
    min_paren: Option<Label>,
    max_paren: Option<Label>,
}

impl PdtStack {
    pub fn new(parens: Vec<(Label, Label)>) -> Self {
        let mut paren_map = FxHashMap::default();
        let mut min_paren = None;
        let mut max_paren = None;
        for (i, &(open, close)) in parens.iter().enumerate() {
            paren_map.insert(open, i);
            paren_map.insert(close, i);
            for &label in &[open, close] {
                min_paren = Some(min_paren.map_or(label, |m: Label| m.min(label)));
                max_paren = Some(max_paren.map_or(label, |m: Label| m.max(label)));
            }
        }
        // The root represents the empty stack; it has no parent or paren.
        let nodes = vec![StackNode { parent_id: NO_STACK_ID, paren_id: usize::MAX }];
        PdtStack { parens, nodes, paren_map, child_map: FxHashMap::default(), min_paren, max_paren }
    }

    /// Index into the `parens` list this label belongs to, if any.
    pub fn paren_id(&self, label: Label) -> Option<usize> {
        self.paren_map.get(&label).copied()
    }

    /// Applies `label`'s effect to `stack_id`: pushes on an open paren,
    /// pops on a matching close paren, passes through unchanged for any
    /// non-paren label, and returns [`NO_STACK_ID`] for a close paren
    /// that doesn't match what's on top of the stack.
    pub fn find(&mut self, stack_id: StackId, label: Label) -> StackId {
        match (self.min_paren, self.max_paren) {
            (Some(min), Some(max)) if label >= min && label <= max => {}
            _ => return stack_id,
        }
        let Some(&paren_id) = self.paren_map.get(&label) else {
            return stack_id;
        };
        let (open, _close) = self.parens[paren_id];
        if label == open {
            let key = (stack_id, label);
            if let Some(&child) = self.child_map.get(&key) {
                return child;
            }
            let child_id = self.nodes.len() as StackId;
            self.nodes.push(StackNode { parent_id: stack_id, paren_id });
            self.child_map.insert(key, child_id);
            return child_id;
        }
        let node = &self.nodes[stack_id as usize];
        if node.paren_id == paren_id {
            node.parent_id
        } else {
            NO_STACK_ID
        }
    }

    /// The configuration obtained by popping whatever is on top of
    /// `stack_id`, regardless of which label would trigger that pop.
    pub fn pop(&self, stack_id: StackId) -> StackId {
        self.nodes[stack_id as usize].parent_id
    }

    /// The paren-pair index pushed last onto `stack_id`, or `None` for
    /// the empty stack.
    pub fn top(&self, stack_id: StackId) -> Option<usize> {
        let paren_id = self.nodes[stack_id as usize].paren_id;
        if paren_id == usize::MAX {
            None
        } else {
            Some(paren_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushes_and_pops_back_to_the_same_id() {
        let mut stack = PdtStack::new(vec![(1, 2)]);
        let pushed = stack.find(0, 1);
        assert_ne!(pushed, 0);
        let popped = stack.find(pushed, 2);
        assert_eq!(popped, 0);
    }

    #[test]
    fn identical_push_sequences_hash_cons_to_the_same_id() {
        let mut stack = PdtStack::new(vec![(1, 2), (3, 4)]);
        let a = stack.find(0, 1);
        let a2 = stack.find(0, 1);
        assert_eq!(a, a2);
        let ab = stack.find(a, 3);
        let ab2 = stack.find(a2, 3);
        assert_eq!(ab, ab2);
    }

    #[test]
    fn mismatched_close_paren_is_rejected() {
        let mut stack = PdtStack::new(vec![(1, 2), (3, 4)]);
        let a = stack.find(0, 1);
        assert_eq!(stack.find(a, 4), NO_STACK_ID);
    }

    #[test]
    fn non_paren_labels_pass_through_unchanged() {
        let mut stack = PdtStack::new(vec![(1, 2)]);
        let a = stack.find(0, 1);
        assert_eq!(stack.find(a, 99), a);
    }

    #[test]
    fn top_and_pop_reflect_the_most_recent_push() {
        let mut stack = PdtStack::new(vec![(1, 2), (3, 4)]);
        assert_eq!(stack.top(0), None);
        let a = stack.find(0, 1);
        assert_eq!(stack.top(a), Some(0));
        let ab = stack.find(a, 3);
        assert_eq!(stack.top(ab), Some(1));
        assert_eq!(stack.pop(ab), a);
    }
}
