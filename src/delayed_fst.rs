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

//! The lazy/delayed FST skeleton (spec §4.3 "DelayedFst"): a state's
//! arcs and final weight are computed by [`DelayedFstOps::expand`] only
//! on first access, then kept in a [`CacheStore`] until evicted.
//!
//! Grounded directly on the teacher's `lazy_index.rs`
//! (`LazyFSMIndex::get_state_map`/`get_next_state`, which compute a
//! state's transition map on first visit and memoize it) and
//! `caching/caching.rs`'s cache-or-compute shape. The teacher computes
//! its whole FSM ahead of time on a background thread and blocks readers
//! on a futex (`atomic_wait.rs`) until that finishes; this crate's
//! concurrency model is single-threaded and cooperative (spec §5), so
//! `expand` simply runs synchronously on the calling thread the first
//! time a state is touched — no thread, no notifier, no wait.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};

use crate::arc::Arc;
use crate::cache::{CacheEntry, CacheStore};
use crate::error::Result;
use crate::fst_traits::{ArcIterator, CoreFst, Fst, MutableFst, StateIterator};
use crate::label::StateId;
use crate::properties::FstProperties;
use crate::semiring::Weight;
use crate::vector_fst::VectorFst;

/// The operation a [`DelayedFst`] wraps: given a state id, produce its
/// final weight (if any) and outgoing arcs. Implemented by each
/// lazy algorithm (delayed union, delayed closure, delayed relabel, ...)
/// as a thin adapter over its eager counterpart.
pub trait DelayedFstOps {
    type W: Weight;

    fn start(&self) -> Option<StateId>;
    fn expand(&self, state: StateId) -> Result<(Option<Self::W>, Vec<Arc<Self::W>>)>;

    /// Properties provable without expanding any state (spec §4.3: a
    /// delayed FST's properties are necessarily partial until realized).
    fn known_properties(&self) -> FstProperties {
        FstProperties::empty()
    }
}

/// An `Fst` whose states are computed on demand and cached (spec §4.3).
pub struct DelayedFst<Ops: DelayedFstOps> {
    ops: Ops,
    cache: RefCell<CacheStore<Ops::W>>,
}

impl<Ops: DelayedFstOps> DelayedFst<Ops> {
    pub fn new(ops: Ops) -> Self {
        DelayedFst {
            ops,
            cache: RefCell::new(CacheStore::with_default_budget()),
        }
    }

    pub fn with_byte_budget(ops: Ops, byte_budget: usize) -> Self {
        DelayedFst {
            ops,
            cache: RefCell::new(CacheStore::new(byte_budget)),
        }
    }

    /// Forces `state`'s expansion if it isn't already cached; returns an
    /// error if the underlying operation fails (spec §7: delayed errors
    /// surface at the point a state is actually touched, not at
    /// construction).
    fn ensure_expanded(&self, state: StateId) -> Result<()> {
        if self.cache.borrow().contains(state) {
            return Ok(());
        }
        let (final_weight, arcs) = self.ops.expand(state)?;
        self.cache
            .borrow_mut()
            .insert(state, CacheEntry { final_weight, arcs });
        Ok(())
    }

    pub fn cache_bytes_used(&self) -> usize {
        self.cache.borrow().bytes_used()
    }

    /// Number of states expanded and still resident in the cache (not
    /// the total number of states in the underlying FST, which may be
    /// unknown or infinite for a delayed FST).
    pub fn cached_state_count(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Switches the cache to "last state only" mode (spec §4.2): the
    /// default just before a one-pass materialization, since
    /// [`materialize`] never revisits a state once it has copied its
    /// arcs out.
    pub fn prepare_for_materialization(&self) {
        let mut cache = self.cache.borrow_mut();
        cache.set_enable_gc(true);
        cache.set_gc_limit(0);
    }
}

impl<Ops: DelayedFstOps> CoreFst for DelayedFst<Ops> {
    type W = Ops::W;

    fn start(&self) -> Option<StateId> {
        self.ops.start()
    }

    fn final_weight(&self, state: StateId) -> Option<Ops::W> {
        self.ensure_expanded(state).ok()?;
        self.cache.borrow().peek(state)?.final_weight.clone()
    }

    fn num_arcs(&self, state: StateId) -> usize {
        if self.ensure_expanded(state).is_err() {
            return 0;
        }
        self.cache
            .borrow()
            .peek(state)
            .map(|e| e.arcs.len())
            .unwrap_or(0)
    }

    fn properties(&self) -> FstProperties {
        self.ops.known_properties()
    }
}

impl<Ops: DelayedFstOps> ArcIterator for DelayedFst<Ops> {
    fn arcs_iter(&self, state: StateId) -> Result<Box<dyn Iterator<Item = Arc<Ops::W>> + '_>> {
        self.ensure_expanded(state)?;
        let cache = self.cache.borrow();
        let entry = cache
            .peek(state)
            .expect("just expanded and inserted above");
        Ok(Box::new(entry.arcs.clone().into_iter()))
    }
}

impl<Ops: DelayedFstOps> StateIterator for DelayedFst<Ops> {
    /// Performs a full breadth-first expansion from `start()` to
    /// enumerate every reachable state, since a delayed FST has no
    /// a-priori state count. Forces complete materialization — callers
    /// that only need a handful of states (e.g. shortest-path search
    /// with early stopping) should prefer [`ArcIterator::arcs_iter`]
    /// directly instead of this.
    fn states_iter(&self) -> Box<dyn Iterator<Item = StateId> + '_> {
        let mut seen = std::collections::HashSet::new();
        let mut order = Vec::new();
        let mut frontier = std::collections::VecDeque::new();
        if let Some(s) = self.start() {
            seen.insert(s);
            frontier.push_back(s);
        }
        while let Some(s) = frontier.pop_front() {
            order.push(s);
            if let Ok(arcs) = self.arcs_iter(s) {
                for a in arcs {
                    if seen.insert(a.nextstate) {
                        frontier.push_back(a.nextstate);
                    }
                }
            }
        }
        Box::new(order.into_iter())
    }
}

/// Realizes a delayed FST into an ordinary [`VectorFst`] by one
/// breadth-first sweep from the start state — the "operation that
/// materializes a delayed FST into a vector form" spec §4.2 mentions as
/// the reason `gc_limit = 0` defaults on during serialization: each
/// state is visited exactly once, so keeping more than the current
/// state cached buys nothing.
pub fn materialize<Ops: DelayedFstOps>(fst: &DelayedFst<Ops>) -> VectorFst<Ops::W> {
    fst.prepare_for_materialization();
    let mut out: VectorFst<Ops::W> = VectorFst::new();
    let mut ids: rustc_hash::FxHashMap<StateId, StateId> = rustc_hash::FxHashMap::default();
    let mut frontier = VecDeque::new();
    let mut seen = HashSet::new();

    if let Some(start) = fst.start() {
        ids.insert(start, out.add_state());
        out.set_start(ids[&start]);
        seen.insert(start);
        frontier.push_back(start);
    }

    while let Some(s) = frontier.pop_front() {
        let here = ids[&s];
        if let Some(fw) = fst.final_weight(s) {
            out.set_final(here, fw);
        }
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                let dst = *ids.entry(arc.nextstate).or_insert_with(|| out.add_state());
                out.add_arc(here, Arc::new(arc.ilabel, arc.olabel, arc.weight, dst));
                if seen.insert(arc.nextstate) {
                    frontier.push_back(arc.nextstate);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    /// A tiny delayed op: an infinite chain `s -> s+1` on label 1, final
    /// only at state 3. Exercises that expansion really is lazy and that
    /// the cache remembers what it has already computed.
    struct Chain;

    impl DelayedFstOps for Chain {
        type W = TropicalWeight;

        fn start(&self) -> Option<StateId> {
            Some(0)
        }

        fn expand(&self, state: StateId) -> Result<(Option<TropicalWeight>, Vec<Arc<TropicalWeight>>)> {
            let final_weight = if state == 3 {
                Some(TropicalWeight::one())
            } else {
                None
            };
            let arcs = if state < 5 {
                vec![Arc::new(1, 1, TropicalWeight::new(1.0), state + 1)]
            } else {
                vec![]
            };
            Ok((final_weight, arcs))
        }
    }

    #[test]
    fn expands_lazily_and_caches() {
        let fst = DelayedFst::new(Chain);
        assert_eq!(fst.cached_state_count(), 0);
        assert!(fst.is_final(3));
        assert_eq!(fst.cached_state_count(), 1);
        // second access hits the cache rather than expanding again
        assert!(fst.is_final(3));
        assert_eq!(fst.cached_state_count(), 1);
    }

    #[test]
    fn states_iter_performs_full_bfs() {
        let fst = DelayedFst::new(Chain);
        let states: Vec<_> = fst.states_iter().collect();
        assert_eq!(states, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn materialize_copies_every_reachable_state_into_a_vector_fst() {
        use crate::fst_traits::ExpandedFst;

        let fst = DelayedFst::new(Chain);
        let vector = materialize(&fst);
        assert_eq!(vector.num_states(), 6);
        assert!(vector.is_final(3));
        assert_eq!(fst.cached_state_count(), 1);
    }
}
