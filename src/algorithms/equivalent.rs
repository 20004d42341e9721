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

//! Language equivalence (spec §4.6 "equivalent"): unlike
//! [`crate::algorithms::equal`]'s structural check, this asks whether
//! two acceptors accept the same weighted language regardless of state
//! numbering or arc order. Grounded on
//! `original_source/fst/bin/equivalent-main.h` and the standard
//! paired-traversal equivalence test for deterministic automata: walk
//! both machines in lockstep, merging visited state-pairs into one
//! "already shown equivalent" set (a union-find would generalize this
//! to the non-deterministic case; since both operands are required to
//! be deterministic here, a plain visited-set is sufficient).
//!
//! **Precondition**: both inputs must be deterministic acceptors (at
//! most one outgoing arc per label per state, `ilabel == olabel`
//! everywhere). This isn't checked structurally beyond the acceptor
//! requirement — running this on a non-deterministic input can produce
//! a false negative if the two machines happen to realize the same
//! language through different nondeterministic choices.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::fst_traits::{ExpandedFst, Fst};
use crate::label::{Label, StateId};
use crate::semiring::Weight;

fn is_acceptor<F, W>(fst: &F) -> bool
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    fst.states_iter()
        .all(|s| fst.arcs_iter(s).map(|mut it| it.all(|a| a.ilabel == a.olabel)).unwrap_or(false))
}

/// True if `fst1` and `fst2` (deterministic acceptors) accept exactly
/// the same weighted language, weights compared up to `delta`.
pub fn equivalent<F1, F2, W>(fst1: &F1, fst2: &F2, delta: f64) -> bool
where
    F1: Fst<W = W> + ExpandedFst,
    F2: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    if !is_acceptor(fst1) || !is_acceptor(fst2) {
        return false;
    }

    let (s1, s2) = match (fst1.start(), fst2.start()) {
        (Some(a), Some(b)) => (a, b),
        (None, None) => return true,
        _ => return false,
    };

    let mut visited: FxHashSet<(StateId, StateId)> = FxHashSet::default();
    let mut stack = vec![(s1, s2)];

    while let Some((p, q)) = stack.pop() {
        if !visited.insert((p, q)) {
            continue;
        }
        match (fst1.final_weight(p), fst2.final_weight(q)) {
            (Some(a), Some(b)) => {
                if !a.approx_equal(&b, delta) {
                    return false;
                }
            }
            (None, None) => {}
            _ => return false,
        }

        let arcs1: FxHashMap<Label, (W, StateId)> = match fst1.arcs_iter(p) {
            Ok(it) => it.map(|a| (a.ilabel, (a.weight, a.nextstate))).collect(),
            Err(_) => return false,
        };
        let arcs2: FxHashMap<Label, (W, StateId)> = match fst2.arcs_iter(q) {
            Ok(it) => it.map(|a| (a.ilabel, (a.weight, a.nextstate))).collect(),
            Err(_) => return false,
        };
        if arcs1.len() != arcs2.len() {
            return false;
        }
        for (label, (w1, dst1)) in &arcs1 {
            match arcs2.get(label) {
                Some((w2, dst2)) => {
                    if !w1.approx_equal(w2, delta) {
                        return false;
                    }
                    stack.push((*dst1, *dst2));
                }
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc::Arc;
    use crate::fst_traits::MutableFst;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

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
    fn differently_numbered_but_same_language_is_equivalent() {
        let mut a: VectorFst<TropicalWeight> = VectorFst::new();
        let pad = a.add_state();
        let s0 = a.add_state();
        let s1 = a.add_state();
        a.set_start(s0);
        a.set_final(s1, TropicalWeight::one());
        a.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        let _ = pad; // extra unreachable state, shouldn't affect equivalence

        let b = chain(&[1]);
        assert!(equivalent(&a, &b, 1e-6));
    }

    #[test]
    fn different_languages_are_not_equivalent() {
        let a = chain(&[1]);
        let b = chain(&[2]);
        assert!(!equivalent(&a, &b, 1e-6));
    }
}
