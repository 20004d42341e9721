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

//! Lookahead matching (spec §4.12): before descending into a state
//! during composition-like traversal, ask "can anything reachable from
//! here possibly match anything reachable from the other side's
//! state?" and skip the descent entirely when the answer is no.
//! Grounded on `original_source/src/include/fst/lookahead-matcher.h`'s
//! `LookAheadLabel`/`LookAheadFst` interface, implemented here with
//! [`IntervalSet`] in place of OpenFst's `LabelReachable` bit-vector
//! (reachable label sets tend to be a handful of contiguous runs, so a
//! sorted-interval representation stays compact without a separate
//! reachability-closure FST).

use std::cell::RefCell;

use crate::containers::IntervalSet;
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, StateIterator};
use crate::label::{Label, StateId, EPS_LABEL};
use crate::semiring::Weight;
use rustc_hash::FxHashMap;

/// Caches, per state, the set of non-epsilon labels reachable by
/// following zero or more epsilon arcs and then one real arc. Label
/// reachability is recomputed lazily and memoized — composition
/// revisits the same states repeatedly, so the amortized cost is one
/// bounded epsilon-closure walk per state rather than one per visit.
pub struct LookaheadMatcher<'a, F: Fst> {
    fst: &'a F,
    cache: RefCell<FxHashMap<StateId, IntervalSet>>,
}

impl<'a, F, W> LookaheadMatcher<'a, F>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    pub fn new(fst: &'a F) -> Self {
        LookaheadMatcher {
            fst,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    fn reachable_labels(&self, state: StateId) -> IntervalSet {
        if let Some(set) = self.cache.borrow().get(&state) {
            return set.clone();
        }
        let mut set = IntervalSet::new();
        let mut seen_eps_states = std::collections::HashSet::new();
        let mut frontier = vec![state];
        while let Some(s) = frontier.pop() {
            if !seen_eps_states.insert(s) {
                continue;
            }
            if let Ok(arcs) = self.fst.arcs_iter(s) {
                for arc in arcs {
                    if arc.ilabel == EPS_LABEL {
                        frontier.push(arc.nextstate);
                    } else {
                        set.insert(arc.ilabel as i64, arc.ilabel as i64 + 1);
                    }
                }
            }
        }
        self.cache.borrow_mut().insert(state, set.clone());
        set
    }

    /// Can `label` be read from `state`, directly or after epsilons?
    pub fn look_ahead_label(&self, state: StateId, label: Label) -> bool {
        if label == EPS_LABEL {
            return true;
        }
        self.reachable_labels(state).contains(label as i64)
    }

    /// Could any path out of `state` (this matcher's FST) and `other_state`
    /// (some other FST) possibly agree on a first real label?
    pub fn look_ahead_fst<G, W2>(&self, state: StateId, other: &G, other_state: StateId) -> bool
    where
        G: Fst<W = W2> + ExpandedFst,
        W2: Weight,
    {
        let ours = self.reachable_labels(state);
        let mut theirs = IntervalSet::new();
        let mut seen = std::collections::HashSet::new();
        let mut frontier = vec![other_state];
        while let Some(s) = frontier.pop() {
            if !seen.insert(s) {
                continue;
            }
            if let Ok(arcs) = other.arcs_iter(s) {
                for arc in arcs {
                    if arc.ilabel == EPS_LABEL {
                        frontier.push(arc.nextstate);
                    } else {
                        theirs.insert(arc.ilabel as i64, arc.ilabel as i64 + 1);
                    }
                }
            }
        }
        ours.overlaps(&theirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc::Arc;
    use crate::fst_traits::MutableFst;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    fn with_epsilon_then_label(label: i32) -> VectorFst<TropicalWeight> {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let s2 = v.add_state();
        v.set_start(s0);
        v.set_final(s2, TropicalWeight::one());
        v.add_arc(s0, Arc::new(EPS_LABEL, EPS_LABEL, TropicalWeight::one(), s1));
        v.add_arc(s1, Arc::new(label, label, TropicalWeight::one(), s2));
        v
    }

    #[test]
    fn sees_through_epsilon_closure() {
        let v = with_epsilon_then_label(7);
        let m = LookaheadMatcher::new(&v);
        assert!(m.look_ahead_label(v.start().unwrap(), 7));
        assert!(!m.look_ahead_label(v.start().unwrap(), 8));
    }

    #[test]
    fn detects_no_possible_match_between_disjoint_fsts() {
        let a = with_epsilon_then_label(1);
        let b = with_epsilon_then_label(2);
        let m = LookaheadMatcher::new(&a);
        assert!(!m.look_ahead_fst(a.start().unwrap(), &b, b.start().unwrap()));
    }

    #[test]
    fn detects_possible_match_on_shared_label() {
        let a = with_epsilon_then_label(3);
        let b = with_epsilon_then_label(3);
        let m = LookaheadMatcher::new(&a);
        assert!(m.look_ahead_fst(a.start().unwrap(), &b, b.start().unwrap()));
    }
}
