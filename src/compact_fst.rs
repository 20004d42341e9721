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

//! The compact FST representation (spec §4.2 "CompactFst"): like
//! [`crate::const_fst::ConstFst`] but each arc is packed through a
//! pluggable [`Compactor`] that drops whichever fields are redundant for
//! a known-shaped FST (an acceptor doesn't need a separate output label;
//! an unweighted FST doesn't need a weight field at all). Grounded on
//! OpenFst's `compact-fst.h`.

use crate::arc::Arc;
use crate::error::{Result, WfstError};
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, StateIterator};
use crate::label::{Label, StateId};
use crate::properties::FstProperties;
use crate::semiring::Weight;

/// Converts between a full [`Arc`] and a compactor-specific packed
/// element. Implementations must satisfy `expand(compact(a)) == a` for
/// every arc the compactor claims to support.
pub trait Compactor<W: Weight>: Clone {
    type Element: Clone;

    fn compact(ilabel: Label, olabel: Label, weight: &W, nextstate: StateId) -> Self::Element;
    fn expand(elem: &Self::Element) -> (Label, Label, W, StateId);
}

/// No field dropped: a direct `(ilabel, olabel, weight, nextstate)`
/// tuple. The baseline every other compactor is checked against.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCompactor;

impl<W: Weight> Compactor<W> for IdentityCompactor {
    type Element = (Label, Label, W, StateId);

    fn compact(ilabel: Label, olabel: Label, weight: &W, nextstate: StateId) -> Self::Element {
        (ilabel, olabel, weight.clone(), nextstate)
    }

    fn expand(elem: &Self::Element) -> (Label, Label, W, StateId) {
        elem.clone()
    }
}

/// Drops the output label: valid only for acceptors (`ilabel == olabel`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptorCompactor;

impl<W: Weight> Compactor<W> for AcceptorCompactor {
    type Element = (Label, W, StateId);

    fn compact(ilabel: Label, _olabel: Label, weight: &W, nextstate: StateId) -> Self::Element {
        (ilabel, weight.clone(), nextstate)
    }

    fn expand(elem: &Self::Element) -> (Label, Label, W, StateId) {
        (elem.0, elem.0, elem.1.clone(), elem.2)
    }
}

/// Drops the weight field: valid only when every arc carries `W::one()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnweightedAcceptorCompactor;

impl<W: Weight> Compactor<W> for UnweightedAcceptorCompactor {
    type Element = (Label, StateId);

    fn compact(ilabel: Label, _olabel: Label, _weight: &W, nextstate: StateId) -> Self::Element {
        (ilabel, nextstate)
    }

    fn expand(elem: &Self::Element) -> (Label, Label, W, StateId) {
        (elem.0, elem.0, W::one(), elem.1)
    }
}

/// Drops the weight field but keeps distinct input/output labels: valid
/// for unweighted transducers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnweightedTransducerCompactor;

impl<W: Weight> Compactor<W> for UnweightedTransducerCompactor {
    type Element = (Label, Label, StateId);

    fn compact(ilabel: Label, olabel: Label, _weight: &W, nextstate: StateId) -> Self::Element {
        (ilabel, olabel, nextstate)
    }

    fn expand(elem: &Self::Element) -> (Label, Label, W, StateId) {
        (elem.0, elem.1, W::one(), elem.2)
    }
}

/// For FSTs known to be a single linear chain ("string", spec §3's
/// `STRING` property): every state but the last has exactly one arc, so
/// `nextstate` need not be stored — it is always `state + 1`. Keeps the
/// weight field (a "weighted string").
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedStringCompactor;

impl<W: Weight> Compactor<W> for WeightedStringCompactor {
    type Element = (Label, W);

    fn compact(ilabel: Label, _olabel: Label, weight: &W, _nextstate: StateId) -> Self::Element {
        (ilabel, weight.clone())
    }

    fn expand(elem: &Self::Element) -> (Label, Label, W, StateId) {
        // `nextstate` is synthesized by `CompactFst` itself (`state + 1`)
        // since this compactor never stores it.
        (elem.0, elem.0, elem.1.clone(), crate::label::NO_STATE_ID)
    }
}

/// As [`WeightedStringCompactor`] but additionally drops the weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnweightedStringCompactor;

impl<W: Weight> Compactor<W> for UnweightedStringCompactor {
    type Element = Label;

    fn compact(ilabel: Label, _olabel: Label, _weight: &W, _nextstate: StateId) -> Self::Element {
        ilabel
    }

    fn expand(elem: &Self::Element) -> (Label, Label, W, StateId) {
        (*elem, *elem, W::one(), crate::label::NO_STATE_ID)
    }
}

#[derive(Debug, Clone)]
struct StateRecord<W: Weight> {
    final_weight: Option<W>,
    arc_offset: usize,
    num_arcs: usize,
}

/// A read-only, densely packed FST parameterized by a [`Compactor`]
/// (spec §4.2 "CompactFst").
#[derive(Debug, Clone)]
pub struct CompactFst<W: Weight, C: Compactor<W>> {
    states: Vec<StateRecord<W>>,
    elements: Vec<C::Element>,
    start: Option<StateId>,
    properties: FstProperties,
    /// True for the string compactors, where `nextstate` is synthesized
    /// as `state + 1` rather than stored per arc.
    implicit_next_state: bool,
}

impl<W: Weight, C: Compactor<W>> CompactFst<W, C> {
    pub fn from_fst<F>(fst: &F, implicit_next_state: bool) -> Self
    where
        F: Fst<W = W> + ExpandedFst,
    {
        let mut states = Vec::with_capacity(fst.num_states());
        let mut elements = Vec::new();
        for s in fst.states_iter() {
            let offset = elements.len();
            let mut count = 0;
            if let Ok(it) = fst.arcs_iter(s) {
                for a in it {
                    elements.push(C::compact(a.ilabel, a.olabel, &a.weight, a.nextstate));
                    count += 1;
                }
            }
            states.push(StateRecord {
                final_weight: fst.final_weight(s),
                arc_offset: offset,
                num_arcs: count,
            });
        }
        CompactFst {
            states,
            elements,
            start: fst.start(),
            properties: fst.properties(),
            implicit_next_state,
        }
    }

    fn state(&self, state: StateId) -> Result<&StateRecord<W>> {
        self.states.get(state as usize).ok_or_else(|| {
            WfstError::StructuralViolation(format!("no such state: {}", state))
        })
    }

    fn arc_at(&self, state: StateId, offset_in_state: usize, global_idx: usize) -> Arc<W> {
        let (ilabel, olabel, weight, mut nextstate) = C::expand(&self.elements[global_idx]);
        if self.implicit_next_state {
            nextstate = state + offset_in_state as StateId + 1;
        }
        Arc::new(ilabel, olabel, weight, nextstate)
    }
}

impl<W: Weight, C: Compactor<W>> CoreFst for CompactFst<W, C> {
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
            .map(|s| s.num_arcs)
            .unwrap_or(0)
    }

    fn properties(&self) -> FstProperties {
        self.properties
    }
}

impl<W: Weight, C: Compactor<W>> StateIterator for CompactFst<W, C> {
    fn states_iter(&self) -> Box<dyn Iterator<Item = StateId> + '_> {
        Box::new((0..self.states.len() as StateId).into_iter())
    }
}

impl<W: Weight, C: Compactor<W>> ArcIterator for CompactFst<W, C> {
    fn arcs_iter(&self, state: StateId) -> Result<Box<dyn Iterator<Item = Arc<W>> + '_>> {
        let rec = self.state(state)?;
        let arcs: Vec<Arc<W>> = (0..rec.num_arcs)
            .map(|i| self.arc_at(state, i, rec.arc_offset + i))
            .collect();
        Ok(Box::new(arcs.into_iter()))
    }
}

impl<W: Weight, C: Compactor<W>> ExpandedFst for CompactFst<W, C> {
    fn num_states(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst_traits::MutableFst;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    #[test]
    fn acceptor_compactor_round_trips() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(5, 5, TropicalWeight::new(2.0), s1));

        let c: CompactFst<TropicalWeight, AcceptorCompactor> = CompactFst::from_fst(&v, false);
        let arcs: Vec<_> = c.arcs_iter(s0).unwrap().collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].ilabel, 5);
        assert_eq!(arcs[0].olabel, 5);
        assert_eq!(arcs[0].weight, TropicalWeight::new(2.0));
    }

    #[test]
    fn unweighted_string_compactor_synthesizes_next_state() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let s2 = v.add_state();
        v.set_start(s0);
        v.set_final(s2, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        v.add_arc(s1, Arc::new(2, 2, TropicalWeight::one(), s2));

        let c: CompactFst<TropicalWeight, UnweightedStringCompactor> =
            CompactFst::from_fst(&v, true);
        let arcs0: Vec<_> = c.arcs_iter(s0).unwrap().collect();
        assert_eq!(arcs0[0].nextstate, s1);
        let arcs1: Vec<_> = c.arcs_iter(s1).unwrap().collect();
        assert_eq!(arcs1[0].nextstate, s2);
    }
}
