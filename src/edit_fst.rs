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

//! A copy-on-write overlay over a read-only base FST (spec §4.2
//! "EditFst"): small, local mutations (relabeling a handful of arcs,
//! overriding one state's final weight) are recorded in an overlay
//! rather than forcing a full copy of a potentially large base.
//! Grounded on OpenFst's `edit-fst.h`; the overlay's two lookup maps
//! (arc overrides keyed by state, final-weight overrides keyed by
//! state) mirror the teacher's cache-lookup-plus-override-map shape in
//! `caching/caching.rs`.

use rustc_hash::FxHashMap;

use crate::arc::Arc;
use crate::error::Result;
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::StateId;
use crate::properties::FstProperties;
use crate::semiring::Weight;

/// Overlays arc and final-weight edits on top of a `Base: ExpandedFst`
/// without mutating or cloning it. New states added via [`MutableFst`]
/// live entirely in the overlay.
pub struct EditFst<Base: ExpandedFst> {
    base: Base,
    start_override: Option<Option<StateId>>,
    arc_overrides: FxHashMap<StateId, Vec<Arc<Base::W>>>,
    final_overrides: FxHashMap<StateId, Option<Base::W>>,
    extra_states: Vec<(Vec<Arc<Base::W>>, Option<Base::W>)>,
    properties: FstProperties,
}

impl<Base: ExpandedFst> EditFst<Base> {
    pub fn new(base: Base) -> Self {
        let properties = base.properties();
        EditFst {
            base,
            start_override: None,
            arc_overrides: FxHashMap::default(),
            final_overrides: FxHashMap::default(),
            extra_states: Vec::new(),
            properties,
        }
    }

    pub fn into_base(self) -> Base {
        self.base
    }

    fn is_extra(&self, state: StateId) -> bool {
        state as usize >= self.base.num_states()
    }

    fn extra_index(&self, state: StateId) -> usize {
        state as usize - self.base.num_states()
    }
}

impl<Base: ExpandedFst> CoreFst for EditFst<Base> {
    type W = Base::W;

    fn start(&self) -> Option<StateId> {
        self.start_override.unwrap_or_else(|| self.base.start())
    }

    fn final_weight(&self, state: StateId) -> Option<Base::W> {
        if self.is_extra(state) {
            return self.extra_states[self.extra_index(state)].1.clone();
        }
        if let Some(over) = self.final_overrides.get(&state) {
            return over.clone();
        }
        self.base.final_weight(state)
    }

    fn num_arcs(&self, state: StateId) -> usize {
        if self.is_extra(state) {
            return self.extra_states[self.extra_index(state)].0.len();
        }
        if let Some(over) = self.arc_overrides.get(&state) {
            return over.len();
        }
        self.base.num_arcs(state)
    }

    fn properties(&self) -> FstProperties {
        self.properties
    }
}

impl<Base: ExpandedFst> StateIterator for EditFst<Base> {
    fn states_iter(&self) -> Box<dyn Iterator<Item = StateId> + '_> {
        let total = self.base.num_states() + self.extra_states.len();
        Box::new((0..total as StateId).into_iter())
    }
}

impl<Base: ExpandedFst> ArcIterator for EditFst<Base> {
    fn arcs_iter(&self, state: StateId) -> Result<Box<dyn Iterator<Item = Arc<Base::W>> + '_>> {
        if self.is_extra(state) {
            let arcs = self.extra_states[self.extra_index(state)].0.clone();
            return Ok(Box::new(arcs.into_iter()));
        }
        if let Some(over) = self.arc_overrides.get(&state) {
            return Ok(Box::new(over.clone().into_iter()));
        }
        self.base.arcs_iter(state)
    }
}

impl<Base: ExpandedFst> ExpandedFst for EditFst<Base> {
    fn num_states(&self) -> usize {
        self.base.num_states() + self.extra_states.len()
    }
}

impl<Base: ExpandedFst> MutableFst for EditFst<Base> {
    fn add_state(&mut self) -> StateId {
        self.extra_states.push((Vec::new(), None));
        self.properties = crate::properties::add_state(self.properties);
        (self.base.num_states() + self.extra_states.len() - 1) as StateId
    }

    fn set_start(&mut self, state: StateId) {
        self.start_override = Some(Some(state));
        self.properties = crate::properties::set_start(self.properties);
    }

    fn set_final(&mut self, state: StateId, weight: Base::W) {
        if self.is_extra(state) {
            let idx = self.extra_index(state);
            self.extra_states[idx].1 = Some(weight);
        } else {
            self.final_overrides.insert(state, Some(weight));
        }
        self.properties = crate::properties::set_final(self.properties);
    }

    fn add_arc(&mut self, state: StateId, arc: Arc<Base::W>) {
        if self.is_extra(state) {
            let idx = self.extra_index(state);
            self.extra_states[idx].0.push(arc);
        } else {
            let existing = self
                .arc_overrides
                .entry(state)
                .or_insert_with(|| self.base.arcs_iter(state).map(|it| it.collect()).unwrap_or_default());
            existing.push(arc);
        }
        self.properties = crate::properties::add_arc(self.properties);
    }

    fn delete_states(&mut self, dead: &[StateId]) {
        if dead.is_empty() {
            return;
        }
        let total = self.num_states();
        if dead.len() == total {
            self.extra_states.clear();
            self.arc_overrides.clear();
            self.final_overrides.clear();
            self.start_override = Some(None);
            self.properties = crate::properties::delete_states(self.properties);
            return;
        }
        // Compacting a subset of the overlay's ids would require
        // renumbering the read-only `base` FST too, which this overlay
        // cannot do without copying it — the same limitation OpenFst's
        // own `EditFstImpl::DeleteStates(const std::vector<StateId>&)`
        // has (it logs and refuses rather than silently mis-renumbering).
        tracing::warn!(
            requested = dead.len(),
            "EditFst::delete_states(subset) is not supported over a borrowed base; \
             materialize into a VectorFst first"
        );
        self.properties = crate::properties::FstProperties::error();
    }

    fn delete_arcs(&mut self, state: StateId, n: Option<usize>) {
        let current = || -> Vec<Arc<Base::W>> {
            if self.is_extra(state) {
                self.extra_states[self.extra_index(state)].0.clone()
            } else {
                self.arc_overrides
                    .get(&state)
                    .cloned()
                    .unwrap_or_else(|| self.base.arcs_iter(state).map(|it| it.collect()).unwrap_or_default())
            }
        };
        let kept = match n {
            Some(n) => {
                let arcs = current();
                let keep = arcs.len().saturating_sub(n);
                arcs.into_iter().take(keep).collect()
            }
            None => Vec::new(),
        };
        if self.is_extra(state) {
            let idx = self.extra_index(state);
            self.extra_states[idx].0 = kept;
        } else {
            self.arc_overrides.insert(state, kept);
        }
        self.properties = crate::properties::delete_arcs(self.properties);
    }

    fn sort_arcs_by<F>(&mut self, state: StateId, cmp: F)
    where
        F: FnMut(&Arc<Base::W>, &Arc<Base::W>) -> std::cmp::Ordering,
    {
        if self.is_extra(state) {
            let idx = self.extra_index(state);
            self.extra_states[idx].0.sort_by(cmp);
        } else {
            let mut arcs: Vec<Arc<Base::W>> = self
                .arc_overrides
                .remove(&state)
                .unwrap_or_else(|| self.base.arcs_iter(state).map(|it| it.collect()).unwrap_or_default());
            arcs.sort_by(cmp);
            self.arc_overrides.insert(state, arcs);
        }
    }

    fn set_arc(&mut self, state: StateId, index: usize, arc: Arc<Base::W>) {
        if self.is_extra(state) {
            let idx = self.extra_index(state);
            self.extra_states[idx].0[index] = arc;
        } else {
            let mut arcs: Vec<Arc<Base::W>> = self
                .arc_overrides
                .remove(&state)
                .unwrap_or_else(|| self.base.arcs_iter(state).map(|it| it.collect()).unwrap_or_default());
            arcs[index] = arc;
            self.arc_overrides.insert(state, arcs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    fn base_fst() -> VectorFst<TropicalWeight> {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(1.0), s1));
        v
    }

    #[test]
    fn overlay_edit_does_not_touch_base() {
        let base = base_fst();
        let mut edit = EditFst::new(base);
        edit.set_final(1, TropicalWeight::new(5.0));
        assert_eq!(edit.final_weight(1), Some(TropicalWeight::new(5.0)));
        assert_eq!(edit.into_base().final_weight(1), Some(TropicalWeight::one()));
    }

    #[test]
    fn extra_states_extend_the_overlay() {
        let mut edit = EditFst::new(base_fst());
        let s2 = edit.add_state();
        assert_eq!(edit.num_states(), 3);
        edit.add_arc(1, Arc::new(2, 2, TropicalWeight::one(), s2));
        let arcs: Vec<_> = edit.arcs_iter(1).unwrap().collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].nextstate, s2);
    }
}
