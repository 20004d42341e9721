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

//! The generic FST trait hierarchy (spec §4.1). `CoreFst` is the minimal
//! read-only surface; `StateIterator`/`ArcIterator` add traversal;
//! `Fst` composes them; `ExpandedFst` promises `num_states()` is O(1) and
//! total (no delayed computation left); `MutableFst` adds construction.
//!
//! Arc and state iteration return boxed trait objects rather than an
//! associated iterator type: the storage layouts in this crate range from
//! a `Vec<Arc<W>>` slice iterator (vector FST) to an on-the-fly decoder
//! over a packed byte buffer (const/compact FST) to a cache lookup that
//! may itself trigger expansion (delayed FST), and unifying those behind
//! one non-generic `Fst` trait object (needed by `DynFst` and the script
//! layer) is worth the one allocation per `arcs_iter` call.

use crate::arc::Arc;
use crate::error::Result;
use crate::label::{StateId, EPS_LABEL};
use crate::properties::FstProperties;
use crate::semiring::Weight;

/// Minimal read access to an FST's start state, final weights, and arc
/// counts (spec §4.1 "CoreFst").
pub trait CoreFst {
    type W: Weight;

    fn start(&self) -> Option<StateId>;

    /// Returns an owned clone rather than a reference: layouts that
    /// compute a state on demand (`DelayedFst`'s cache, `CompactFst`'s
    /// packed elements) have nothing stable to borrow from, and a
    /// `Weight` is required to be cheaply `Clone` regardless.
    fn final_weight(&self, state: StateId) -> Option<Self::W>;
    fn num_arcs(&self, state: StateId) -> usize;

    /// A state with no final weight recorded at all is never final; one
    /// recorded as exactly `W::zero()` also counts as not final (the
    /// OpenFst convention this crate follows: `SetFinal(s, Zero())` is
    /// how callers clear a final marking, since no storage layout here
    /// exposes an "unset" operation distinct from "set to zero").
    fn is_final(&self, state: StateId) -> bool {
        match self.final_weight(state) {
            Some(w) => w != Self::W::zero(),
            None => false,
        }
    }

    fn is_start(&self, state: StateId) -> bool {
        Some(state) == self.start()
    }

    /// Best-effort snapshot of this FST's known properties (spec §3). For
    /// a delayed FST, only the properties provable without full expansion
    /// are set.
    fn properties(&self) -> FstProperties;
}

/// Iterates over every state id in the FST, in an implementation-defined
/// but stable order (spec §4.1 "StateIterator").
pub trait StateIterator: CoreFst {
    fn states_iter(&self) -> Box<dyn Iterator<Item = StateId> + '_>;
}

/// Iterates over the outgoing arcs of one state (spec §4.1
/// "ArcIterator"). Errors if `state` does not exist.
///
/// Yields owned `Arc<W>` values rather than references: storage layouts
/// that keep arcs directly (`VectorFst`, `ConstFst`) clone cheaply out of
/// their backing slice, while layouts that reconstruct arcs on demand
/// (`CompactFst`'s packed elements, `DelayedFst`'s cache) have nothing to
/// borrow from in the first place.
pub trait ArcIterator: CoreFst {
    fn arcs_iter(&self, state: StateId) -> Result<Box<dyn Iterator<Item = Arc<Self::W>> + '_>>;
}

/// The minimum interface for a usable FST: start/final access, state and
/// arc traversal (spec §4.1 "Fst").
pub trait Fst: CoreFst + StateIterator + ArcIterator {
    fn num_input_epsilons(&self, state: StateId) -> usize {
        self.arcs_iter(state)
            .map(|it| it.filter(|a| a.ilabel == EPS_LABEL).count())
            .unwrap_or(0)
    }

    fn num_output_epsilons(&self, state: StateId) -> usize {
        self.arcs_iter(state)
            .map(|it| it.filter(|a| a.olabel == EPS_LABEL).count())
            .unwrap_or(0)
    }
}

impl<T: CoreFst + StateIterator + ArcIterator> Fst for T {}

/// An `Fst` whose state count is known without further expansion (spec
/// §4.1 "ExpandedFst") — every storage layout in this crate except the
/// raw `DelayedFst` skeleton satisfies this once fully realized.
pub trait ExpandedFst: Fst {
    fn num_states(&self) -> usize;
}

/// Construction and in-place mutation (spec §4.1 "MutableFst"). Only the
/// `vector_fst`/`edit_fst` layouts implement this; `const_fst` and
/// `compact_fst` are write-once at construction and read-only afterward.
pub trait MutableFst: ExpandedFst {
    fn add_state(&mut self) -> StateId;
    fn set_start(&mut self, state: StateId);
    fn set_final(&mut self, state: StateId, weight: Self::W);
    fn add_arc(&mut self, state: StateId, arc: Arc<Self::W>);

    /// Best-effort capacity hint for the state table; layouts that don't
    /// pre-size anything (e.g. `EditFst`'s overlay maps) may ignore it.
    fn reserve_states(&mut self, additional: usize) {
        let _ = additional;
    }

    /// Best-effort capacity hint for one state's arc list.
    fn reserve_arcs(&mut self, state: StateId, additional: usize) {
        let _ = (state, additional);
    }

    /// Compacts state ids in place, dropping every state named in
    /// `dead` and retaining the relative order of survivors; every
    /// surviving arc whose `nextstate` was deleted is dropped, and every
    /// other arc's `nextstate` is remapped to its new, compacted id.
    fn delete_states(&mut self, dead: &[StateId]);

    /// Pops `n` arcs from the tail of `state`'s outgoing arc list, or
    /// every arc when `n` is `None`.
    fn delete_arcs(&mut self, state: StateId, n: Option<usize>);

    /// Sorts the outgoing arcs of `state` by the given comparator; used by
    /// `arcsort` and by algorithms (e.g. composition, lookahead matching)
    /// that require input- or output-label-sorted arcs.
    fn sort_arcs_by<F>(&mut self, state: StateId, cmp: F)
    where
        F: FnMut(&Arc<Self::W>, &Arc<Self::W>) -> std::cmp::Ordering;

    /// Overwrites the arc at position `index` in `state`'s outgoing arc
    /// list. The backing primitive for [`MutableArcIterator`].
    fn set_arc(&mut self, state: StateId, index: usize, arc: Arc<Self::W>);

    /// A cursor over `state`'s outgoing arcs that can overwrite the arc
    /// it is positioned on (spec §4.1 "mutable_arc_iterator") — used by
    /// in-place algorithms (e.g. weight pushing) that need to rewrite an
    /// arc's weight without rebuilding the whole arc list.
    fn mutable_arc_iterator(&mut self, state: StateId) -> MutableArcIterator<'_, Self>
    where
        Self: Sized,
    {
        MutableArcIterator::new(self, state)
    }
}

/// Cursor produced by [`MutableFst::mutable_arc_iterator`]; see there.
pub struct MutableArcIterator<'a, F: MutableFst + ?Sized> {
    fst: &'a mut F,
    state: StateId,
    pos: usize,
}

impl<'a, F: MutableFst> MutableArcIterator<'a, F> {
    fn new(fst: &'a mut F, state: StateId) -> Self {
        MutableArcIterator { fst, state, pos: 0 }
    }

    pub fn done(&self) -> bool {
        self.pos >= self.fst.num_arcs(self.state)
    }

    pub fn next(&mut self) {
        self.pos += 1;
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    pub fn value(&self) -> Arc<F::W> {
        self.fst
            .arcs_iter(self.state)
            .ok()
            .and_then(|mut it| it.nth(self.pos))
            .expect("cursor position in range")
    }

    pub fn set_value(&mut self, arc: Arc<F::W>) {
        self.fst.set_arc(self.state, self.pos, arc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    #[test]
    fn blanket_fst_impl_covers_vector_fst() {
        let mut fst: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = fst.add_state();
        fst.set_start(s0);
        fst.set_final(s0, TropicalWeight::one());
        assert!(fst.is_start(s0));
        assert!(fst.is_final(s0));
        assert_eq!(fst.num_input_epsilons(s0), 0);
    }
}
