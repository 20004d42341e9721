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

//! The mutable, fully-expanded FST representation (spec §4.2
//! "VectorFst"): each state owns a growable vector of its outgoing arcs.
//! This is the layout every algorithm that builds a new FST (union,
//! closure, minimize's output, relabel's in-place target, ...) writes
//! into, and the one users construct by hand via [`MutableFst`].
//!
//! Per-state arcs are kept in a [`smallvec::SmallVec`] sized for the
//! common low-arity case (most states in a lexicon or grammar FST have a
//! handful of outgoing arcs) so that small states never heap-allocate.

use smallvec::SmallVec;

use crate::arc::Arc;
use crate::error::{Result, WfstError};
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, MutableFst, StateIterator};
use crate::label::StateId;
use crate::properties;
use crate::properties::FstProperties;
use crate::semiring::Weight;
use rustc_hash::FxHashSet;

const INLINE_ARCS: usize = 4;

#[derive(Debug, Clone)]
struct VectorState<W: Weight> {
    final_weight: Option<W>,
    arcs: SmallVec<[Arc<W>; INLINE_ARCS]>,
}

impl<W: Weight> Default for VectorState<W> {
    fn default() -> Self {
        VectorState {
            final_weight: None,
            arcs: SmallVec::new(),
        }
    }
}

/// A fully mutable, fully expanded FST (spec §4.2).
#[derive(Debug, Clone)]
pub struct VectorFst<W: Weight> {
    states: Vec<VectorState<W>>,
    start: Option<StateId>,
    properties: FstProperties,
}

impl<W: Weight> VectorFst<W> {
    pub fn new() -> Self {
        VectorFst {
            states: Vec::new(),
            start: None,
            properties: FstProperties::empty(),
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        VectorFst {
            states: Vec::with_capacity(n),
            start: None,
            properties: FstProperties::empty(),
        }
    }

    fn state(&self, state: StateId) -> Result<&VectorState<W>> {
        self.states.get(state as usize).ok_or_else(|| {
            WfstError::StructuralViolation(format!("no such state: {}", state))
        })
    }

    fn state_mut(&mut self, state: StateId) -> &mut VectorState<W> {
        &mut self.states[state as usize]
    }
}

impl<W: Weight> Default for VectorFst<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Weight> PartialEq for VectorFst<W> {
    fn eq(&self, other: &Self) -> bool {
        crate::algorithms::equal::equal(self, other, 1e-6)
    }
}

impl<W: Weight> CoreFst for VectorFst<W> {
    type W = W;

    fn start(&self) -> Option<StateId> {
        self.start
    }

    fn final_weight(&self, state: StateId) -> Option<W> {
        self.states.get(state as usize)?.final_weight.clone()
    }

    fn num_arcs(&self, state: StateId) -> usize {
        self.states
            .get(state as usize)
            .map(|s| s.arcs.len())
            .unwrap_or(0)
    }

    fn properties(&self) -> FstProperties {
        self.properties
    }
}

impl<W: Weight> StateIterator for VectorFst<W> {
    fn states_iter(&self) -> Box<dyn Iterator<Item = StateId> + '_> {
        Box::new((0..self.states.len() as StateId).into_iter())
    }
}

impl<W: Weight> ArcIterator for VectorFst<W> {
    fn arcs_iter(&self, state: StateId) -> Result<Box<dyn Iterator<Item = Arc<W>> + '_>> {
        let s = self.state(state)?;
        Ok(Box::new(s.arcs.iter().cloned()))
    }
}

impl<W: Weight> ExpandedFst for VectorFst<W> {
    fn num_states(&self) -> usize {
        self.states.len()
    }
}

impl<W: Weight> MutableFst for VectorFst<W> {
    fn add_state(&mut self) -> StateId {
        self.states.push(VectorState::default());
        self.properties = properties::add_state(self.properties);
        (self.states.len() - 1) as StateId
    }

    fn set_start(&mut self, state: StateId) {
        self.start = Some(state);
        self.properties = properties::set_start(self.properties);
    }

    fn set_final(&mut self, state: StateId, weight: W) {
        self.state_mut(state).final_weight = Some(weight);
        self.properties = properties::set_final(self.properties);
    }

    fn add_arc(&mut self, state: StateId, arc: Arc<W>) {
        self.state_mut(state).arcs.push(arc);
        self.properties = properties::add_arc(self.properties);
    }

    fn reserve_states(&mut self, additional: usize) {
        self.states.reserve(additional);
    }

    fn reserve_arcs(&mut self, state: StateId, additional: usize) {
        self.state_mut(state).arcs.reserve(additional);
    }

    fn delete_states(&mut self, dead: &[StateId]) {
        if dead.is_empty() {
            return;
        }
        let dead_set: FxHashSet<StateId> = dead.iter().copied().collect();
        let mut remap = vec![crate::label::NO_STATE_ID; self.states.len()];
        let mut survivors = Vec::with_capacity(self.states.len() - dead_set.len());
        for (old, state) in std::mem::take(&mut self.states).into_iter().enumerate() {
            let old = old as StateId;
            if dead_set.contains(&old) {
                continue;
            }
            remap[old as usize] = survivors.len() as StateId;
            survivors.push(state);
        }
        for state in &mut survivors {
            state.arcs.retain(|a| !dead_set.contains(&a.nextstate));
            for arc in state.arcs.iter_mut() {
                arc.nextstate = remap[arc.nextstate as usize];
            }
        }
        self.states = survivors;
        self.start = self.start.and_then(|s| {
            if dead_set.contains(&s) {
                None
            } else {
                Some(remap[s as usize])
            }
        });
        self.properties = properties::delete_states(self.properties);
    }

    fn delete_arcs(&mut self, state: StateId, n: Option<usize>) {
        let arcs = &mut self.state_mut(state).arcs;
        match n {
            Some(n) => {
                let keep = arcs.len().saturating_sub(n);
                arcs.truncate(keep);
            }
            None => arcs.clear(),
        }
        self.properties = properties::delete_arcs(self.properties);
    }

    fn sort_arcs_by<F>(&mut self, state: StateId, cmp: F)
    where
        F: FnMut(&Arc<W>, &Arc<W>) -> std::cmp::Ordering,
    {
        self.state_mut(state).arcs.sort_by(cmp);
    }

    fn set_arc(&mut self, state: StateId, index: usize, arc: Arc<W>) {
        self.state_mut(state).arcs[index] = arc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    #[test]
    fn build_two_state_acceptor() {
        let mut fst: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.set_start(s0);
        fst.set_final(s1, TropicalWeight::one());
        fst.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(2.0), s1));

        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.start(), Some(s0));
        assert!(fst.is_final(s1));
        assert_eq!(fst.num_arcs(s0), 1);
    }

    #[test]
    fn arcs_iter_errors_on_missing_state() {
        let fst: VectorFst<TropicalWeight> = VectorFst::new();
        assert!(fst.arcs_iter(0).is_err());
    }

    #[test]
    fn delete_arcs_clears_but_keeps_state() {
        let mut fst: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        fst.delete_arcs(s0, None);
        assert_eq!(fst.num_arcs(s0), 0);
        assert_eq!(fst.num_states(), 2);
    }

    #[test]
    fn delete_arcs_n_pops_from_the_tail() {
        let mut fst: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        fst.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        fst.add_arc(s0, Arc::new(2, 2, TropicalWeight::one(), s1));
        fst.add_arc(s0, Arc::new(3, 3, TropicalWeight::one(), s1));
        fst.delete_arcs(s0, Some(1));
        let arcs: Vec<_> = fst.arcs_iter(s0).unwrap().collect();
        assert_eq!(arcs.iter().map(|a| a.ilabel).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn delete_states_compacts_ids_and_rewrites_arcs() {
        let mut fst: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = fst.add_state();
        let s1 = fst.add_state();
        let s2 = fst.add_state();
        fst.set_start(s0);
        fst.set_final(s2, TropicalWeight::one());
        fst.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        fst.add_arc(s0, Arc::new(2, 2, TropicalWeight::one(), s2));

        fst.delete_states(&[s1]);
        assert_eq!(fst.num_states(), 2);
        assert_eq!(fst.start(), Some(0));
        let arcs: Vec<_> = fst.arcs_iter(0).unwrap().collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].ilabel, 2);
        assert_eq!(arcs[0].nextstate, 1);
        assert!(fst.is_final(1));
    }
}
