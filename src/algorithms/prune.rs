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

//! Distance-bounded pruning (spec §4.9): drops any state whose best
//! through-path weight (start-to-state times state-to-final) is worse
//! than `weight_threshold`, and optionally caps the result to the best
//! `state_threshold` surviving states. Grounded on
//! `original_source/src/include/fst/prune.h`'s `PruneCompare`/combined-
//! distance criterion.

use rustc_hash::FxHashMap;

use crate::arc::Arc;
use crate::fst_traits::{ExpandedFst, Fst, MutableFst};
use crate::label::StateId;
use crate::queues::{FifoQueue, Queue};
use crate::semiring::{natural_less, Weight};
use crate::vector_fst::VectorFst;

/// Shortest distance from every state to some final state, computed by
/// relaxing over the reverse adjacency built locally (there is no
/// standalone FST-reverse operation in this crate; pruning is the only
/// caller that needs a backward distance, so it's inlined here rather
/// than factored into a general algorithm).
fn backward_distance<F, W>(fst: &F, delta: f64) -> Vec<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let n = fst.num_states();
    let mut radj: Vec<Vec<(StateId, W)>> = vec![Vec::new(); n];
    for s in fst.states_iter() {
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                radj[arc.nextstate as usize].push((s, arc.weight));
            }
        }
    }

    let mut d = vec![W::zero(); n];
    let mut r = vec![W::zero(); n];
    let mut queue = FifoQueue::default();
    for s in fst.states_iter() {
        if fst.is_final(s) {
            let fw = fst.final_weight(s).unwrap();
            d[s as usize] = fw.clone();
            r[s as usize] = fw;
            queue.enqueue(s);
        }
    }
    while !queue.is_empty() {
        let s = match queue.dequeue() {
            Some(s) => s,
            None => break,
        };
        let rs = std::mem::replace(&mut r[s as usize], W::zero());
        for (u, w) in &radj[s as usize] {
            let candidate = w.times(&rs);
            let idx = *u as usize;
            let updated = d[idx].plus(&candidate);
            if !updated.approx_equal(&d[idx], delta) {
                d[idx] = updated;
                r[idx] = r[idx].plus(&candidate);
                queue.enqueue(*u);
            }
        }
    }
    d
}

/// Prunes `fst`, returning a copy containing only the states whose
/// combined through-weight is at least as good as `weight_threshold`
/// (per [`natural_less`]'s notion of "better"), further capped to the
/// best `state_threshold` states if given. The start state is always
/// kept, even if its own through-weight would otherwise fail the cut,
/// so the result is never a start-less FST when the input had a start.
pub fn prune<F, W>(
    fst: &F,
    weight_threshold: &W,
    state_threshold: Option<usize>,
    delta: f64,
) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let mut out = VectorFst::new();
    let start = match fst.start() {
        Some(s) => s,
        None => return out,
    };

    let forward =
        crate::algorithms::shortest_distance::shortest_distance(fst, FifoQueue::default(), delta);
    let backward = backward_distance(fst, delta);

    let mut combined: Vec<(StateId, W)> = fst
        .states_iter()
        .map(|s| (s, forward[s as usize].times(&backward[s as usize])))
        .collect();

    let mut keep: Vec<bool> = combined
        .iter()
        .map(|(s, w)| *s == start || !natural_less(weight_threshold, w))
        .collect();

    if let Some(limit) = state_threshold {
        combined.sort_by(|(_, a), (_, b)| {
            if natural_less(a, b) {
                std::cmp::Ordering::Less
            } else if natural_less(b, a) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });
        let mut kept_so_far = 0usize;
        let mut allowed = vec![false; keep.len()];
        for (s, _) in &combined {
            if *s == start || kept_so_far < limit {
                allowed[*s as usize] = true;
                if *s != start {
                    kept_so_far += 1;
                }
            }
        }
        for (i, k) in keep.iter_mut().enumerate() {
            *k = *k && allowed[i];
        }
    }

    let mut remap: FxHashMap<StateId, StateId> = FxHashMap::default();
    for s in fst.states_iter() {
        if keep[s as usize] {
            remap.insert(s, out.add_state());
        }
    }
    out.set_start(remap[&start]);
    for s in fst.states_iter() {
        let Some(&new_id) = remap.get(&s) else { continue };
        if let Some(w) = fst.final_weight(s) {
            out.set_final(new_id, w);
        }
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                if let Some(&dst) = remap.get(&arc.nextstate) {
                    out.add_arc(new_id, Arc::new(arc.ilabel, arc.olabel, arc.weight, dst));
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

    fn fan_out() -> VectorFst<TropicalWeight> {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let cheap = v.add_state();
        let expensive = v.add_state();
        v.set_start(s0);
        v.set_final(cheap, TropicalWeight::one());
        v.set_final(expensive, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(1.0), cheap));
        v.add_arc(s0, Arc::new(2, 2, TropicalWeight::new(100.0), expensive));
        v
    }

    #[test]
    fn drops_states_above_threshold() {
        let v = fan_out();
        let pruned = prune(&v, &TropicalWeight::new(10.0), None, 1e-6);
        assert_eq!(pruned.num_states(), 2);
    }

    #[test]
    fn state_threshold_caps_survivor_count() {
        let v = fan_out();
        let pruned = prune(&v, &TropicalWeight::new(1000.0), Some(1), 1e-6);
        // start + at most one non-start survivor
        assert_eq!(pruned.num_states(), 2);
    }
}
