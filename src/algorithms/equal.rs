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

//! Structural equality (spec §4.6 "equal"): same state ids, same start
//! state, same arcs in the same per-state order, weights equal up to
//! `delta`. This is a stricter, cheaper check than
//! [`crate::algorithms::equivalent`]'s language equivalence — two FSTs
//! can accept the same language while failing `equal` (different state
//! numbering, different arc order). Grounded on
//! `original_source/src/include/fst/equal.h`.

use crate::fst_traits::{ExpandedFst, Fst};
use crate::semiring::Weight;

pub fn equal<F1, F2, W>(fst1: &F1, fst2: &F2, delta: f64) -> bool
where
    F1: Fst<W = W> + ExpandedFst,
    F2: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    if fst1.start() != fst2.start() {
        return false;
    }
    if fst1.num_states() != fst2.num_states() {
        return false;
    }
    for s in fst1.states_iter() {
        match (fst1.final_weight(s), fst2.final_weight(s)) {
            (Some(a), Some(b)) => {
                if !a.approx_equal(&b, delta) {
                    return false;
                }
            }
            (None, None) => {}
            _ => return false,
        }
        let arcs1: Vec<_> = match fst1.arcs_iter(s) {
            Ok(it) => it.collect(),
            Err(_) => return false,
        };
        let arcs2: Vec<_> = match fst2.arcs_iter(s) {
            Ok(it) => it.collect(),
            Err(_) => return false,
        };
        if arcs1.len() != arcs2.len() {
            return false;
        }
        for (a, b) in arcs1.iter().zip(arcs2.iter()) {
            if a.ilabel != b.ilabel
                || a.olabel != b.olabel
                || a.nextstate != b.nextstate
                || !a.weight.approx_equal(&b.weight, delta)
            {
                return false;
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

    fn build(weight: f32) -> VectorFst<TropicalWeight> {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(weight), s1));
        v
    }

    #[test]
    fn identical_fsts_are_equal() {
        assert!(equal(&build(1.0), &build(1.0), 1e-6));
    }

    #[test]
    fn differing_weight_breaks_equality() {
        assert!(!equal(&build(1.0), &build(2.0), 1e-6));
    }

    #[test]
    fn within_delta_counts_as_equal() {
        assert!(equal(&build(1.0), &build(1.0 + 1e-8), 1e-6));
    }
}
