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

//! Connect: trims every state that is not both accessible from the
//! start state and coaccessible (able to reach some final state).
//! Grounded on `original_source/src/include/fst/connect.h`, which
//! computes the same two reachability sets (forward from the start,
//! backward from the final states) and keeps their intersection.
//! [`minimize`](crate::algorithms::minimize::minimize) runs this as a
//! pre-pass, since unreachable/dead states otherwise inflate the
//! signature-refinement partition for no benefit.

use crate::arc::Arc;
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::{StateId, NO_STATE_ID};
use crate::semiring::Weight;
use crate::vector_fst::VectorFst;

/// Returns a copy of `fst` containing only states reachable from the
/// start state that can also reach a final state, with every surviving
/// state's id compacted and all arcs into dropped states removed.
pub fn connect<F, W>(fst: &F) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let n = fst.num_states();

    let mut accessible = vec![false; n];
    if let Some(start) = fst.start() {
        let mut stack = vec![start];
        accessible[start as usize] = true;
        while let Some(s) = stack.pop() {
            if let Ok(arcs) = fst.arcs_iter(s) {
                for arc in arcs {
                    let idx = arc.nextstate as usize;
                    if !accessible[idx] {
                        accessible[idx] = true;
                        stack.push(arc.nextstate);
                    }
                }
            }
        }
    }

    let mut preds: Vec<Vec<StateId>> = vec![Vec::new(); n];
    for s in fst.states_iter() {
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                preds[arc.nextstate as usize].push(s);
            }
        }
    }
    let mut coaccessible = vec![false; n];
    let mut stack = Vec::new();
    for s in fst.states_iter() {
        if fst.final_weight(s).is_some() {
            coaccessible[s as usize] = true;
            stack.push(s);
        }
    }
    while let Some(s) = stack.pop() {
        for &p in &preds[s as usize] {
            let idx = p as usize;
            if !coaccessible[idx] {
                coaccessible[idx] = true;
                stack.push(p);
            }
        }
    }

    let keep: Vec<bool> = (0..n).map(|i| accessible[i] && coaccessible[i]).collect();
    let mut remap = vec![NO_STATE_ID; n];
    let mut out: VectorFst<W> = VectorFst::new();
    for (i, &k) in keep.iter().enumerate() {
        if k {
            remap[i] = out.add_state();
        }
    }
    if let Some(start) = fst.start() {
        if keep[start as usize] {
            out.set_start(remap[start as usize]);
        }
    }
    for s in fst.states_iter() {
        if !keep[s as usize] {
            continue;
        }
        let here = remap[s as usize];
        if let Some(fw) = fst.final_weight(s) {
            out.set_final(here, fw);
        }
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                if keep[arc.nextstate as usize] {
                    out.add_arc(
                        here,
                        Arc::new(arc.ilabel, arc.olabel, arc.weight, remap[arc.nextstate as usize]),
                    );
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

    #[test]
    fn drops_unreachable_and_dead_end_states() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let unreachable = v.add_state();
        let dead_end = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        v.add_arc(s0, Arc::new(2, 2, TropicalWeight::one(), dead_end));
        let _ = unreachable;

        let c = connect(&v);
        assert_eq!(c.num_states(), 2);
        assert!(c.is_final(c.start().unwrap()) == false);
    }

    #[test]
    fn keeps_a_fully_connected_fst_untouched() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));

        let c = connect(&v);
        assert_eq!(c.num_states(), 2);
    }
}
