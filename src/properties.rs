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

//! The 64-bit property bitset described in spec §3, plus the property
//! algebra: a small table of pure functions, one per mutating operation,
//! mapping a prior mask to the mask that remains provable afterwards.
//!
//! Bits come in `(true, false)` pairs; at most one of a pair is set for a
//! given FST. `fixedbitset` backs the underlying storage even though a
//! plain `u64` would do, because the partition and interval-set containers
//! built on top of it (§4 "Partition", `containers::interval_set`) reuse
//! the same bitset type for larger, variable-length masks.

use fixedbitset::FixedBitSet;
use std::ops::{BitOr, BitOrAssign};

macro_rules! prop_bits {
    ($($name:ident = $bit:expr),* $(,)?) => {
        $(pub const $name: u64 = 1 << $bit;)*
    };
}

prop_bits! {
    EXPANDED = 0,
    MUTABLE = 1,

    ACCEPTOR = 2,
    NOT_ACCEPTOR = 3,
    I_DETERMINISTIC = 4,
    NON_I_DETERMINISTIC = 5,
    O_DETERMINISTIC = 6,
    NON_O_DETERMINISTIC = 7,
    EPSILONS = 8,
    NO_EPSILONS = 9,
    I_EPSILONS = 10,
    NO_I_EPSILONS = 11,
    O_EPSILONS = 12,
    NO_O_EPSILONS = 13,
    I_LABEL_SORTED = 14,
    NOT_I_LABEL_SORTED = 15,
    O_LABEL_SORTED = 16,
    NOT_O_LABEL_SORTED = 17,
    WEIGHTED = 18,
    UNWEIGHTED = 19,
    CYCLIC = 20,
    ACYCLIC = 21,
    INITIAL_CYCLIC = 22,
    INITIAL_ACYCLIC = 23,
    TOP_SORTED = 24,
    NOT_TOP_SORTED = 25,
    ACCESSIBLE = 26,
    NOT_ACCESSIBLE = 27,
    COACCESSIBLE = 28,
    NOT_COACCESSIBLE = 29,
    STRING = 30,
    NOT_STRING = 31,
    WEIGHTED_CYCLES = 32,
    UNWEIGHTED_CYCLES = 33,
    ERROR = 34,
}

/// Bits known-and-true are a subset of what must actually hold (spec §3,
/// testable invariant 3). `FstProperties` is the value type an FST carries
/// around; it is `Copy` and cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FstProperties(pub u64);

impl FstProperties {
    pub const fn empty() -> Self {
        FstProperties(0)
    }

    pub fn contains(self, mask: u64) -> bool {
        self.0 & mask == mask
    }

    pub fn any(self, mask: u64) -> bool {
        self.0 & mask != 0
    }

    pub fn set(&mut self, mask: u64) {
        self.0 |= mask;
    }

    pub fn clear(&mut self, mask: u64) {
        self.0 &= !mask;
    }

    pub fn is_error(self) -> bool {
        self.contains(ERROR)
    }

    /// An FST that has hit an unrecoverable condition: `error` set, no
    /// other bits trusted. Spec §7: "operation returns an FST in the error
    /// state".
    pub fn error() -> Self {
        FstProperties(ERROR)
    }

    /// Project `mask` out of the known-true set: used when a caller only
    /// wants to ask about specific bits ("properties(error, test=false)").
    pub fn masked(self, mask: u64) -> u64 {
        self.0 & mask
    }
}

impl BitOr for FstProperties {
    type Output = FstProperties;
    fn bitor(self, rhs: Self) -> Self {
        FstProperties(self.0 | rhs.0)
    }
}

impl BitOrAssign for FstProperties {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Property transform applied after adding a state: adding an isolated
/// state cannot by itself break any structural property already known,
/// except it may invalidate `EXPANDED`-dependent counts that the caller
/// tracks separately; the property bits representing graph shape survive.
pub fn add_state(prior: FstProperties) -> FstProperties {
    prior
}

/// Adding an arc can introduce non-determinism, epsilons, weightedness,
/// cycles, and can break label-sortedness; anything that isn't trivially
/// still guaranteed is downgraded to "unknown" (bit cleared on both sides
/// of the pair) rather than guessed at.
pub fn add_arc(prior: FstProperties) -> FstProperties {
    let mut p = prior;
    p.clear(
        I_DETERMINISTIC
            | NON_I_DETERMINISTIC
            | O_DETERMINISTIC
            | NON_O_DETERMINISTIC
            | I_LABEL_SORTED
            | NOT_I_LABEL_SORTED
            | O_LABEL_SORTED
            | NOT_O_LABEL_SORTED
            | ACYCLIC
            | CYCLIC
            | TOP_SORTED
            | NOT_TOP_SORTED
            | ACCESSIBLE
            | NOT_ACCESSIBLE
            | COACCESSIBLE
            | NOT_COACCESSIBLE
            | STRING
            | NOT_STRING,
    );
    p
}

/// `set_start` can change initial-cyclicity and accessibility; everything
/// else about the graph's shape is unaffected.
pub fn set_start(prior: FstProperties) -> FstProperties {
    let mut p = prior;
    p.clear(INITIAL_CYCLIC | INITIAL_ACYCLIC | ACCESSIBLE | NOT_ACCESSIBLE);
    p
}

/// `set_final` can change weightedness and whether the FST is a "string"
/// (single accepting linear path); coaccessibility may change too.
pub fn set_final(prior: FstProperties) -> FstProperties {
    let mut p = prior;
    p.clear(
        WEIGHTED | UNWEIGHTED | STRING | NOT_STRING | COACCESSIBLE | NOT_COACCESSIBLE,
    );
    p
}

/// Deleting states can only restrict what was previously provable:
/// anything about the graph's topology is no longer guaranteed to have
/// been checked over the resulting (smaller) state set.
pub fn delete_states(_prior: FstProperties) -> FstProperties {
    FstProperties::empty()
}

/// Deleting arcs from the tail of one state's arc vector invalidates the
/// same bits as adding an arc would, conservatively.
pub fn delete_arcs(prior: FstProperties) -> FstProperties {
    add_arc(prior)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_true_is_exclusive_per_pair() {
        let mut p = FstProperties::empty();
        p.set(ACYCLIC);
        assert!(p.contains(ACYCLIC));
        assert!(!p.contains(CYCLIC));
    }

    #[test]
    fn error_state_sets_only_error() {
        let p = FstProperties::error();
        assert!(p.is_error());
    }

    #[test]
    fn add_arc_clears_sortedness_but_keeps_unrelated_bits() {
        let mut prior = FstProperties::empty();
        prior.set(I_LABEL_SORTED | WEIGHTED);
        let after = add_arc(prior);
        assert!(!after.contains(I_LABEL_SORTED));
        assert!(after.contains(WEIGHTED));
    }

    #[test]
    fn fixedbitset_backs_larger_masks_elsewhere() {
        // Smoke test that the crate used for larger bitsets (interval_set,
        // partition) is wired up and behaves as expected.
        let mut bs = FixedBitSet::with_capacity(128);
        bs.insert(100);
        assert!(bs[100]);
        assert!(!bs[99]);
    }
}
