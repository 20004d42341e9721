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

//! Expands a PDT or MPDT into an ordinary FST over the product state
//! space `(original state, stack configuration)`, grounded on
//! `original_source/src/include/fst/extensions/mpdt/expand.h`'s
//! `MPdtExpandFstImpl::ExpandState` (the single-stack PDT case is the
//! same construction with `nlevels == 1`). Unlike the grounding source's
//! `ExpandFst`, which expands lazily behind a cache as states are
//! visited, this builds the whole reachable product eagerly into a
//! [`VectorFst`]: nothing here demands the lazy/delayed machinery the
//! caching expand classes exist for, and an eagerly built result is
//! simpler to hand to [`crate::algorithms::minimize::minimize`] or
//! other downstream algorithms that expect an [`ExpandedFst`].

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::mpdt::{MPdtRestrict, MPdtStack};
use super::stack::{PdtStack, StackId, NO_STACK_ID};
use crate::arc::Arc;
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::{Label, StateId, EPS_LABEL};
use crate::semiring::Weight;
use crate::vector_fst::VectorFst;

/// Whether an expanded paren arc keeps its original label or is
/// rewritten to epsilon, matching the grounding source's
/// `keep_parentheses` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenLabels {
    /// Replace a paren label with epsilon once the transition actually
    /// changes the stack (push or matching pop). This is the default
    /// in the grounding source.
    Erase,
    /// Leave paren labels on the expanded arcs untouched.
    Keep,
}

impl Default for ParenLabels {
    fn default() -> Self {
        ParenLabels::Erase
    }
}

/// Expands a single-stack PDT (spec §4.12 "Traversal") into an ordinary
/// FST: enumerates the product `(original state, stack id)`, copying
/// non-paren arcs through unchanged, pushing on an open paren, popping
/// (or dropping the arc, on mismatch) on a close paren. A product state
/// is final iff the original state is final and the stack is empty.
pub fn pdt_expand<F, W>(fst: &F, parens: Vec<(Label, Label)>, paren_labels: ParenLabels) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let mut stack = PdtStack::new(parens);
    let mut out: VectorFst<W> = VectorFst::new();
    let mut ids: FxHashMap<(StateId, StackId), StateId> = FxHashMap::default();
    let mut queue: VecDeque<(StateId, StackId)> = VecDeque::new();

    let Some(orig_start) = fst.start() else {
        return out;
    };
    let start_key = (orig_start, 0);
    let start_id = out.add_state();
    ids.insert(start_key, start_id);
    queue.push_back(start_key);
    out.set_start(start_id);

    while let Some((orig_state, stack_id)) = queue.pop_front() {
        let here = ids[&(orig_state, stack_id)];

        if let Some(fw) = fst.final_weight(orig_state) {
            if stack_id == 0 {
                out.set_final(here, fw);
            }
        }

        let Ok(arcs) = fst.arcs_iter(orig_state) else {
            continue;
        };
        for arc in arcs {
            let next_stack_id = stack.find(stack_id, arc.ilabel);
            if next_stack_id == NO_STACK_ID {
                continue;
            }
            let (ilabel, olabel) = if next_stack_id != stack_id && paren_labels == ParenLabels::Erase {
                (EPS_LABEL, EPS_LABEL)
            } else {
                (arc.ilabel, arc.olabel)
            };
            let dest_key = (arc.nextstate, next_stack_id);
            let dest = *ids.entry(dest_key).or_insert_with(|| {
                let id = out.add_state();
                queue.push_back(dest_key);
                id
            });
            out.add_arc(here, Arc::new(ilabel, olabel, arc.weight.clone(), dest));
        }
    }

    out
}

/// The MPDT analogue of [`pdt_expand`]: `parens[i]` is assigned to level
/// `assignments[i]`, and `restrict` governs cross-level read/write
/// ordering the same way [`MPdtStack::find`] does.
pub fn mpdt_expand<F, W>(
    fst: &F,
    parens: Vec<(Label, Label)>,
    assignments: &[usize],
    nlevels: usize,
    restrict: MPdtRestrict,
    paren_labels: ParenLabels,
) -> Option<VectorFst<W>>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let mut stack = MPdtStack::new(parens, assignments, nlevels, restrict)?;
    let mut out: VectorFst<W> = VectorFst::new();
    let mut ids: FxHashMap<(StateId, StackId), StateId> = FxHashMap::default();
    let mut queue: VecDeque<(StateId, StackId)> = VecDeque::new();

    let Some(orig_start) = fst.start() else {
        return Some(out);
    };
    let start_key = (orig_start, 0);
    let start_id = out.add_state();
    ids.insert(start_key, start_id);
    queue.push_back(start_key);
    out.set_start(start_id);

    while let Some((orig_state, stack_id)) = queue.pop_front() {
        let here = ids[&(orig_state, stack_id)];

        if let Some(fw) = fst.final_weight(orig_state) {
            if stack_id == 0 {
                out.set_final(here, fw);
            }
        }

        let Ok(arcs) = fst.arcs_iter(orig_state) else {
            continue;
        };
        for arc in arcs {
            let next_stack_id = stack.find(stack_id, arc.ilabel);
            if next_stack_id == NO_STACK_ID {
                continue;
            }
            let (ilabel, olabel) = if next_stack_id != stack_id && paren_labels == ParenLabels::Erase {
                (EPS_LABEL, EPS_LABEL)
            } else {
                (arc.ilabel, arc.olabel)
            };
            let dest_key = (arc.nextstate, next_stack_id);
            let dest = *ids.entry(dest_key).or_insert_with(|| {
                let id = out.add_state();
                queue.push_back(dest_key);
                id
            });
            out.add_arc(here, Arc::new(ilabel, olabel, arc.weight.clone(), dest));
        }
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    fn balanced_paren_pdt() -> VectorFst<TropicalWeight> {
        // 0 --(10)--> 1 --(5)--> 2 --(11)--> 3, final at 3.
        // Label 10/11 is the open/close paren pair; 5 is an ordinary
        // label nested inside the parens.
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let s2 = v.add_state();
        let s3 = v.add_state();
        v.set_start(s0);
        v.set_final(s3, TropicalWeight::one());
        v.add_arc(s0, Arc::new(10, 10, TropicalWeight::new(1.0), s1));
        v.add_arc(s1, Arc::new(5, 5, TropicalWeight::new(1.0), s2));
        v.add_arc(s2, Arc::new(11, 11, TropicalWeight::new(1.0), s3));
        v
    }

    #[test]
    fn expansion_accepts_the_balanced_path_and_erases_paren_labels() {
        let v = balanced_paren_pdt();
        let expanded = pdt_expand(&v, vec![(10, 11)], ParenLabels::default());

        assert!(expanded.states_iter().any(|s| expanded.is_final(s)));

        let all_ilabels: Vec<Label> = expanded
            .states_iter()
            .filter_map(|s| expanded.arcs_iter(s).ok())
            .flatten()
            .map(|a| a.ilabel)
            .collect();
        assert!(all_ilabels.contains(&5));
        assert!(!all_ilabels.contains(&10));
        assert!(!all_ilabels.contains(&11));
    }

    #[test]
    fn keep_labels_option_leaves_parens_on_the_expanded_arcs() {
        let v = balanced_paren_pdt();
        let expanded = pdt_expand(&v, vec![(10, 11)], ParenLabels::Keep);
        let all_ilabels: Vec<Label> = expanded
            .states_iter()
            .filter_map(|s| expanded.arcs_iter(s).ok())
            .flatten()
            .map(|a| a.ilabel)
            .collect();
        assert!(all_ilabels.contains(&10));
        assert!(all_ilabels.contains(&11));
    }

    #[test]
    fn an_unmatched_close_paren_drops_its_arc_and_the_path_is_unreachable() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        // 11 is a close paren with no matching open on the stack.
        v.add_arc(s0, Arc::new(11, 11, TropicalWeight::one(), s1));

        let expanded = pdt_expand(&v, vec![(10, 11)], ParenLabels::default());
        assert!(!expanded.states_iter().any(|s| expanded.is_final(s)));
    }

    #[test]
    fn a_final_original_state_with_an_unbalanced_stack_is_not_final() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(10, 10, TropicalWeight::one(), s1));

        let expanded = pdt_expand(&v, vec![(10, 11)], ParenLabels::default());
        // The only reachable product state at s1 has stack_id != 0
        // (one paren still open), so it must not be final.
        assert!(!expanded.states_iter().any(|s| expanded.is_final(s)));
    }

    #[test]
    fn mpdt_expansion_balances_two_independent_levels() {
        // Level 0 opens and closes (1, 2) before level 1 opens and
        // closes (3, 4); both stacks are empty only once every paren has
        // been matched, at s4.
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let s2 = v.add_state();
        let s3 = v.add_state();
        let s4 = v.add_state();
        v.set_start(s0);
        v.set_final(s4, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        v.add_arc(s1, Arc::new(2, 2, TropicalWeight::one(), s2));
        v.add_arc(s2, Arc::new(3, 3, TropicalWeight::one(), s3));
        v.add_arc(s3, Arc::new(4, 4, TropicalWeight::one(), s4));
        let expanded = mpdt_expand(
            &v,
            vec![(1, 2), (3, 4)],
            &[0, 1],
            2,
            MPdtRestrict::NoRestrict,
            ParenLabels::default(),
        )
        .unwrap();
        assert!(expanded.states_iter().any(|s| expanded.is_final(s)));
    }

    #[test]
    fn mismatched_level_count_returns_none() {
        let v = balanced_paren_pdt();
        assert!(mpdt_expand(&v, vec![(10, 11)], &[0, 1], 2, MPdtRestrict::NoRestrict, ParenLabels::default())
            .is_none());
    }
}
