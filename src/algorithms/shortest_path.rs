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

//! Shortest path / n-best (spec §4.7, "a `path` semiring is required").
//! A best-first search bounded to visiting each state at most `nbest`
//! times — the same termination bound Eppstein's algorithm (grounded on
//! `original_source/src/include/fst/shortest-path.h`) uses, though
//! without its reverse-distance admissible heuristic: this crate's
//! version re-expands from the frontier with a plain priority queue
//! rather than precomputing a backward shortest distance first. Correct
//! for any `path` semiring, just not asymptotically optimal for large
//! `nbest` on a densely connected FST.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::arc::Arc;
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::StateId;
use crate::semiring::{natural_less, Weight};
use crate::vector_fst::VectorFst;

struct Candidate<W: Weight> {
    weight: W,
    state: StateId,
    path: Vec<Arc<W>>,
    sequence: u64,
}

impl<W: Weight> PartialEq for Candidate<W> {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.sequence == other.sequence
    }
}
impl<W: Weight> Eq for Candidate<W> {}

impl<W: Weight> PartialOrd for Candidate<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W: Weight> Ord for Candidate<W> {
    /// Reversed so [`BinaryHeap`] (a max-heap) pops the *best* (lowest
    /// natural order) candidate first. Ties broken by insertion order
    /// for determinism when two paths are equally good.
    fn cmp(&self, other: &Self) -> Ordering {
        if natural_less(&self.weight, &other.weight) {
            Ordering::Greater
        } else if natural_less(&other.weight, &self.weight) {
            Ordering::Less
        } else {
            other.sequence.cmp(&self.sequence)
        }
    }
}

/// Knobs for the n-best search beyond the basic count (spec §4.4
/// "Shortest path, N > 1"): `unique` dedups the returned paths by their
/// input-label sequence, keeping only the best-weighted occurrence of
/// each distinct sequence (grounded on
/// `original_source/src/include/fst/shortest-path.h`'s `unique` option,
/// which exists because without it a non-functional transducer can
/// return the same input string `nbest` times over with different output
/// labels); `weight_threshold` discards any candidate whose weight is
/// worse than `best.times(threshold)` once at least one path has been
/// accepted, bounding the search to paths within a given factor of the
/// best found so far.
#[derive(Debug, Clone, Default)]
pub struct ShortestPathOptions<W: Weight> {
    pub unique: bool,
    pub weight_threshold: Option<W>,
}

/// Returns an FST containing the `nbest` globally best accepting paths
/// of `fst`, each as its own chain from a fresh start state. Requires
/// `W::PROPERTIES` to include `PATH` for "best" to be well defined;
/// callers violating that get *a* answer, just not necessarily a
/// meaningful one (spec §7 treats this as a semiring violation the
/// caller is responsible for checking before calling).
pub fn shortest_path<F, W>(fst: &F, nbest: usize, delta: f64) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    shortest_path_with_options(fst, nbest, delta, &ShortestPathOptions::default())
}

/// [`shortest_path`] with the `unique`/`weight_threshold` n-best knobs.
pub fn shortest_path_with_options<F, W>(
    fst: &F,
    nbest: usize,
    _delta: f64,
    options: &ShortestPathOptions<W>,
) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let mut out = VectorFst::new();
    if nbest == 0 {
        return out;
    }
    let start = match fst.start() {
        Some(s) => s,
        None => return out,
    };

    let mut visits = vec![0usize; fst.num_states()];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(Candidate {
        weight: W::one(),
        state: start,
        path: Vec::new(),
        sequence: seq,
    });

    // `accepted` holds `(final_weight, path)` as returned to the caller;
    // `accepted_total` is the parallel full path weight
    // (`path_weight.times(final_weight)`), kept only for comparisons.
    let mut accepted: Vec<(W, Vec<Arc<W>>)> = Vec::new();
    let mut accepted_total: Vec<W> = Vec::new();
    let mut best_weight: Option<W> = None;
    // Index into `accepted` of the best occurrence seen so far per
    // distinct input-label sequence, used by `unique` to keep only the
    // cheapest occurrence of each sequence.
    let mut seen_sequences: std::collections::HashMap<Vec<crate::label::Label>, usize> =
        std::collections::HashMap::new();

    while let Some(cand) = heap.pop() {
        if accepted.len() >= nbest && options.weight_threshold.is_none() {
            break;
        }
        if let Some(threshold) = &options.weight_threshold {
            if let Some(best) = &best_weight {
                if !natural_less(&cand.weight, &best.times(threshold))
                    && cand.weight != best.times(threshold)
                {
                    continue;
                }
            }
        }
        let idx = cand.state as usize;
        if visits[idx] >= nbest {
            continue;
        }
        visits[idx] += 1;

        if let Some(fw) = fst.final_weight(cand.state) {
            let total = cand.weight.times(&fw);
            if best_weight.is_none() || natural_less(&total, best_weight.as_ref().unwrap()) {
                best_weight = Some(total.clone());
            }
            if options.unique {
                let input_seq: Vec<_> = cand.path.iter().map(|a| a.ilabel).collect();
                if let Some(&existing) = seen_sequences.get(&input_seq) {
                    if !natural_less(&total, &accepted_total[existing]) {
                        continue;
                    }
                    accepted[existing] = (fw, cand.path.clone());
                    accepted_total[existing] = total;
                } else {
                    seen_sequences.insert(input_seq, accepted.len());
                    accepted.push((fw, cand.path.clone()));
                    accepted_total.push(total);
                }
            } else {
                accepted.push((fw, cand.path.clone()));
                accepted_total.push(total);
            }
        }

        if let Ok(arcs) = fst.arcs_iter(cand.state) {
            for arc in arcs {
                seq += 1;
                let mut path = cand.path.clone();
                path.push(arc.clone());
                heap.push(Candidate {
                    weight: cand.weight.times(&arc.weight),
                    state: arc.nextstate,
                    path,
                    sequence: seq,
                });
            }
        }
    }

    if options.unique {
        let mut indexed: Vec<usize> = (0..accepted.len()).collect();
        indexed.sort_by(|&i, &j| {
            if natural_less(&accepted_total[i], &accepted_total[j]) {
                Ordering::Less
            } else if natural_less(&accepted_total[j], &accepted_total[i]) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });
        indexed.truncate(nbest);
        accepted = indexed.into_iter().map(|i| accepted[i].clone()).collect();
    }

    let new_start = out.add_state();
    out.set_start(new_start);
    for (final_weight, arcs) in accepted {
        let mut cur = new_start;
        for arc in &arcs {
            let next = out.add_state();
            out.add_arc(cur, Arc::new(arc.ilabel, arc.olabel, arc.weight.clone(), next));
            cur = next;
        }
        out.set_final(cur, final_weight);
    }
    out
}
