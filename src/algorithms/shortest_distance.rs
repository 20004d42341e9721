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

//! Generic shortest distance (spec §4.7): the sum, over every path from
//! the start state to each state `s`, of the path weight — computed by
//! relaxation over a semiring rather than a semiring-specific
//! Dijkstra/Bellman-Ford. Grounded on
//! `original_source/src/include/fst/shortest-distance.h`'s
//! `r`/`d`-array relaxation loop; generalized here to accept any
//! [`Queue`] discipline (callers pick [`ShortestFirstQueue`] for a
//! tropical-like semiring on a general graph, [`FifoQueue`] for an
//! acyclic one).

use crate::fst_traits::{ExpandedFst, Fst};
use crate::label::StateId;
use crate::queues::Queue;
use crate::semiring::Weight;

/// Computes `d[s]` = the semiring-sum of every start-to-`s` path weight,
/// for every state reachable from the start. States unreached keep
/// `W::zero()`. `delta` bounds when two candidate distances are treated
/// as converged (needed for non-idempotent float semirings where exact
/// equality may never be reached due to rounding).
pub fn shortest_distance<F, W, Q>(fst: &F, mut queue: Q, delta: f64) -> Vec<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
    Q: Queue,
{
    let n = fst.num_states();
    let mut d = vec![W::zero(); n];
    let mut r = vec![W::zero(); n];

    let start = match fst.start() {
        Some(s) => s,
        None => return d,
    };
    d[start as usize] = W::one();
    r[start as usize] = W::one();
    queue.enqueue(start);

    while !queue.is_empty() {
        let s = match queue.dequeue() {
            Some(s) => s,
            None => break,
        };
        let rs = std::mem::replace(&mut r[s as usize], W::zero());
        let arcs: Vec<_> = match fst.arcs_iter(s) {
            Ok(it) => it.collect(),
            Err(_) => continue,
        };
        for arc in arcs {
            let next = arc.nextstate as usize;
            let candidate = rs.times(&arc.weight);
            let updated = d[next].plus(&candidate);
            if !updated.approx_equal(&d[next], delta) {
                d[next] = updated;
                r[next] = r[next].plus(&candidate);
                queue.enqueue(arc.nextstate as StateId);
            }
        }
    }
    d
}

/// Total distance from the start to every final state, combined with
/// `plus` (spec §4.7's "total weight of the FST"): `W::zero()` if no
/// final state is reachable.
pub fn total_weight<F, W, Q>(fst: &F, queue: Q, delta: f64) -> W
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
    Q: Queue,
{
    let d = shortest_distance(fst, queue, delta);
    let mut total = W::zero();
    for s in fst.states_iter() {
        if let Some(fw) = fst.final_weight(s) {
            total = total.plus(&d[s as usize].times(&fw));
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc::Arc;
    use crate::fst_traits::MutableFst;
    use crate::queues::FifoQueue;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    #[test]
    fn shortest_distance_picks_min_cost_path() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let s2 = v.add_state();
        v.set_start(s0);
        v.set_final(s2, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(5.0), s2));
        v.add_arc(s0, Arc::new(2, 2, TropicalWeight::new(1.0), s1));
        v.add_arc(s1, Arc::new(3, 3, TropicalWeight::new(1.0), s2));

        let d = shortest_distance(&v, FifoQueue::default(), 1e-6);
        assert_eq!(d[s2 as usize], TropicalWeight::new(2.0));
    }

    #[test]
    fn total_weight_combines_final_states() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        v.set_start(s0);
        v.set_final(s0, TropicalWeight::new(3.0));

        let w = total_weight(&v, FifoQueue::default(), 1e-6);
        assert_eq!(w, TropicalWeight::new(3.0));
    }
}
