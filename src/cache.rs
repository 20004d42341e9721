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

//! The byte-budgeted cache backing [`crate::delayed_fst::DelayedFst`]
//! (spec §4.3 "CacheStore"). Directly grounded on the cache pattern in
//! the original `caching/caching.rs` (`ModuleState`'s
//! `Mutex<LruCache<u64, Arc<CachedFSM>>>`, keyed there by a whole FSM's
//! hash and evicted by entry count): here the key is a single state id
//! within one FST, the value is that state's expanded arcs, and eviction
//! is driven by a byte budget rather than an entry count, since states
//! can carry wildly different numbers of arcs.

use lru::LruCache;
use rustc_hash::FxHashSet;

use crate::arc::Arc;
use crate::label::StateId;
use crate::semiring::Weight;

/// One state's expansion result, as produced by
/// [`crate::delayed_fst::DelayedFstOps::expand`].
#[derive(Debug, Clone)]
pub struct CacheEntry<W: Weight> {
    pub final_weight: Option<W>,
    pub arcs: Vec<Arc<W>>,
}

impl<W: Weight> CacheEntry<W> {
    /// Rough per-entry footprint used for budget accounting: a fixed
    /// per-arc cost plus a small constant for the entry itself. Not
    /// exact (arcs may box their weight, e.g. `GallicWeight`'s `Vec`),
    /// but consistent and monotonic, which is all the budget needs.
    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.arcs.len() * std::mem::size_of::<Arc<W>>()
    }
}

/// A bounded cache of per-state expansions, evicted least-recently-used
/// first once `byte_budget` is exceeded (spec §4.2 "Eviction": "two
/// configurable parameters: enable-GC and byte budget").
///
/// Two knobs beyond the plain byte budget: `enable_gc` (when `false`,
/// nothing is ever evicted — the cache grows without bound) and
/// `gc_limit` (when `0`, the cache keeps at most the single most
/// recently inserted state regardless of byte budget — the "cache only
/// last state" mode the spec calls out as the default while a delayed
/// FST is being serialized into a vector form, see
/// [`crate::delayed_fst::materialize`]).
pub struct CacheStore<W: Weight> {
    entries: LruCache<StateId, CacheEntry<W>>,
    byte_budget: usize,
    bytes_used: usize,
    enable_gc: bool,
    gc_limit: usize,
    /// States touched since the last GC pass; the first eviction pass
    /// skips these, so a state that was just looked up during the
    /// current round of work survives a GC triggered by some other
    /// state's insertion.
    touched: FxHashSet<StateId>,
}

impl<W: Weight> CacheStore<W> {
    pub fn new(byte_budget: usize) -> Self {
        CacheStore {
            entries: LruCache::unbounded(),
            byte_budget,
            bytes_used: 0,
            enable_gc: true,
            gc_limit: byte_budget,
            touched: FxHashSet::default(),
        }
    }

    /// Uses [`crate::environment::DEFAULT_CACHE_BYTE_SIZE`] as the budget.
    pub fn with_default_budget() -> Self {
        Self::new(*crate::environment::DEFAULT_CACHE_BYTE_SIZE)
    }

    /// The "cache only last state" mode (spec §4.2): `gc_limit = 0`.
    pub fn last_state_only() -> Self {
        let mut store = Self::new(0);
        store.gc_limit = 0;
        store
    }

    pub fn set_enable_gc(&mut self, enable: bool) {
        self.enable_gc = enable;
    }

    pub fn enable_gc(&self) -> bool {
        self.enable_gc
    }

    pub fn set_gc_limit(&mut self, gc_limit: usize) {
        self.gc_limit = gc_limit;
    }

    pub fn gc_limit(&self) -> usize {
        self.gc_limit
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.entries.contains(&state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }

    /// Marks `state`'s entry most-recently-used and returns it, if
    /// present.
    pub fn get(&mut self, state: StateId) -> Option<&CacheEntry<W>> {
        self.touched.insert(state);
        self.entries.get(&state)
    }

    /// Looks up `state`'s entry without disturbing LRU order.
    pub fn peek(&self, state: StateId) -> Option<&CacheEntry<W>> {
        self.entries.peek(&state)
    }

    /// Inserts a freshly computed expansion, then runs GC if enabled
    /// (always keeping at least the entry just inserted, even if it
    /// alone exceeds budget — a single oversized state must not thrash
    /// every other call).
    pub fn insert(&mut self, state: StateId, entry: CacheEntry<W>) {
        let size = entry.byte_size();
        if let Some(old) = self.entries.put(state, entry) {
            self.bytes_used -= old.byte_size();
        }
        self.bytes_used += size;
        self.touched.insert(state);

        if !self.enable_gc {
            return;
        }
        if self.gc_limit == 0 {
            while self.entries.len() > 1 {
                if let Some((evicted_id, evicted)) = self.entries.pop_lru() {
                    self.bytes_used -= evicted.byte_size();
                    self.touched.remove(&evicted_id);
                } else {
                    break;
                }
            }
            return;
        }
        if self.bytes_used <= self.byte_budget {
            return;
        }
        // Reduce toward two-thirds of budget: states untouched since the
        // last GC go first, then (if still over) recently touched ones.
        let target = self.byte_budget * 2 / 3;
        self.gc_pass(target, false);
        if self.bytes_used > self.byte_budget {
            self.gc_pass(target, true);
        }
        self.touched.clear();
    }

    fn gc_pass(&mut self, target: usize, include_touched: bool) {
        if self.bytes_used <= target {
            return;
        }
        let order: Vec<StateId> = self.entries.iter().map(|(&k, _)| k).collect();
        for key in order.into_iter().rev() {
            if self.bytes_used <= target || self.entries.len() <= 1 {
                break;
            }
            if !include_touched && self.touched.contains(&key) {
                continue;
            }
            if let Some(evicted) = self.entries.pop(&key) {
                self.bytes_used -= evicted.byte_size();
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.bytes_used = 0;
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    fn entry(n_arcs: usize) -> CacheEntry<TropicalWeight> {
        CacheEntry {
            final_weight: None,
            arcs: (0..n_arcs)
                .map(|i| Arc::new(i as i32, i as i32, TropicalWeight::one(), 0))
                .collect(),
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let mut cache: CacheStore<TropicalWeight> = CacheStore::new(1 << 20);
        cache.insert(0, entry(3));
        assert!(cache.contains(0));
        assert_eq!(cache.get(0).unwrap().arcs.len(), 3);
    }

    #[test]
    fn eviction_respects_byte_budget() {
        let one_entry_size = entry(100).byte_size();
        let mut cache: CacheStore<TropicalWeight> = CacheStore::new(one_entry_size + 1);
        cache.insert(0, entry(100));
        cache.insert(1, entry(100));
        assert!(cache.len() <= 1 || cache.bytes_used() <= one_entry_size * 2);
        // The most recently inserted state must survive eviction.
        assert!(cache.contains(1));
    }

    #[test]
    fn oversized_single_entry_is_not_evicted_by_itself() {
        let mut cache: CacheStore<TropicalWeight> = CacheStore::new(1);
        cache.insert(0, entry(1000));
        assert!(cache.contains(0));
    }

    #[test]
    fn disabling_gc_lets_the_cache_grow_past_budget() {
        let mut cache: CacheStore<TropicalWeight> = CacheStore::new(1);
        cache.set_enable_gc(false);
        cache.insert(0, entry(10));
        cache.insert(1, entry(10));
        cache.insert(2, entry(10));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn last_state_only_mode_keeps_a_single_entry() {
        let mut cache: CacheStore<TropicalWeight> = CacheStore::last_state_only();
        cache.insert(0, entry(1));
        cache.insert(1, entry(1));
        cache.insert(2, entry(1));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(2));
    }
}
