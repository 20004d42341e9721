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

//! The rational operations (spec §4.8): union, concatenation, and
//! closure. Each mutates its first argument in place, grounded on
//! `original_source/src/include/fst/union.h` and
//! `original_source/src/include/fst/closure.h`.

use crate::arc::Arc;
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::EPS_LABEL;
use crate::semiring::Weight;

/// Whether closure also accepts the empty string (spec §4.8 "closure
/// star" vs. "closure plus").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureType {
    Star,
    Plus,
}

/// Appends a copy of `other`'s states/arcs to `fst1` and adds an
/// epsilon arc from `fst1`'s existing final states (well, a fresh
/// start state reachable from both former starts) so that `fst1`
/// accepts every string either operand accepted.
pub fn union<F1, F2, W>(fst1: &mut F1, other: &F2)
where
    F1: Fst<W = W> + ExpandedFst + MutableFst,
    F2: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let offset = fst1.num_states() as i32;
    for s in other.states_iter() {
        let new_id = fst1.add_state();
        if let Some(w) = other.final_weight(s) {
            fst1.set_final(new_id, w);
        }
        if let Ok(arcs) = other.arcs_iter(s) {
            for arc in arcs {
                fst1.add_arc(
                    new_id,
                    Arc::new(arc.ilabel, arc.olabel, arc.weight, arc.nextstate + offset),
                );
            }
        }
    }
    let other_start = match other.start() {
        Some(s) => s + offset,
        None => return,
    };
    match fst1.start() {
        Some(start1) => {
            let new_start = fst1.add_state();
            fst1.set_start(new_start);
            fst1.add_arc(new_start, Arc::new(EPS_LABEL, EPS_LABEL, W::one(), start1));
            fst1.add_arc(new_start, Arc::new(EPS_LABEL, EPS_LABEL, W::one(), other_start));
        }
        None => fst1.set_start(other_start),
    }
}

/// Appends `other` after `fst1`: every former final state of `fst1`
/// gets an epsilon arc (weighted by its former final weight) into
/// `other`'s (shifted) start state, and `fst1`'s final states become
/// non-final unless `other` has no start state.
pub fn concat<F1, F2, W>(fst1: &mut F1, other: &F2)
where
    F1: Fst<W = W> + ExpandedFst + MutableFst,
    F2: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let offset = fst1.num_states() as i32;
    let former_finals: Vec<(crate::label::StateId, W)> = fst1
        .states_iter()
        .filter(|&s| fst1.is_final(s))
        .filter_map(|s| fst1.final_weight(s).map(|w| (s, w)))
        .collect();

    for s in other.states_iter() {
        let new_id = fst1.add_state();
        if let Some(w) = other.final_weight(s) {
            fst1.set_final(new_id, w);
        }
        if let Ok(arcs) = other.arcs_iter(s) {
            for arc in arcs {
                fst1.add_arc(
                    new_id,
                    Arc::new(arc.ilabel, arc.olabel, arc.weight, arc.nextstate + offset),
                );
            }
        }
    }

    let other_start = match other.start() {
        Some(s) => s + offset,
        None => return,
    };
    for (s, final_weight) in former_finals {
        fst1.add_arc(s, Arc::new(EPS_LABEL, EPS_LABEL, final_weight, other_start));
        fst1.set_final(s, W::zero());
    }
}

/// Computes the concatenative closure in place (spec §4.8): every
/// former final state gets an epsilon loop back to the (possibly new)
/// start state, weighted by its former final weight; [`ClosureType::Star`]
/// additionally adds a fresh start state that's immediately final so
/// the empty string is accepted too.
pub fn closure<F, W>(fst: &mut F, closure_type: ClosureType)
where
    F: Fst<W = W> + ExpandedFst + MutableFst,
    W: Weight,
{
    let start = match fst.start() {
        Some(s) => s,
        None => return,
    };
    let former_finals: Vec<(crate::label::StateId, W)> = fst
        .states_iter()
        .filter(|&s| fst.is_final(s))
        .filter_map(|s| fst.final_weight(s).map(|w| (s, w)))
        .collect();
    for (s, w) in &former_finals {
        fst.add_arc(*s, Arc::new(EPS_LABEL, EPS_LABEL, w.clone(), start));
    }
    if closure_type == ClosureType::Star {
        let new_start = fst.add_state();
        fst.set_final(new_start, W::one());
        fst.add_arc(new_start, Arc::new(EPS_LABEL, EPS_LABEL, W::one(), start));
        fst.set_start(new_start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    fn single_arc(label: i32) -> VectorFst<TropicalWeight> {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(label, label, TropicalWeight::one(), s1));
        v
    }

    #[test]
    fn union_accepts_either_operand() {
        let mut a = single_arc(1);
        let b = single_arc(2);
        union(&mut a, &b);
        let start = a.start().unwrap();
        let labels: Vec<_> = a.arcs_iter(start).unwrap().map(|arc| arc.ilabel).collect();
        // the new start reaches both branches through epsilon
        assert_eq!(labels, vec![EPS_LABEL, EPS_LABEL]);
    }

    #[test]
    fn concat_chains_the_two_languages() {
        let mut a = single_arc(1);
        let b = single_arc(2);
        concat(&mut a, &b);
        // former final of `a` is no longer final, but still reachable
        assert!(!a.is_final(1));
    }

    #[test]
    fn closure_star_accepts_empty_string() {
        let mut a = single_arc(1);
        closure(&mut a, ClosureType::Star);
        let new_start = a.start().unwrap();
        assert!(a.is_final(new_start));
    }

    #[test]
    fn closure_plus_does_not_add_a_fresh_start() {
        let mut a = single_arc(1);
        let original_start = a.start().unwrap();
        closure(&mut a, ClosureType::Plus);
        assert_eq!(a.start().unwrap(), original_start);
    }
}
