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

//! Arc weight accumulation for lookahead matching (spec §4.12): summing
//! a contiguous run of an arc list's weights comes up whenever a
//! matcher needs "what's the combined weight of everything left to
//! try from here", and doing it by folding the whole run every time is
//! wasteful when the same state is visited repeatedly. Grounded on
//! `original_source/src/include/fst/accumulator.h`'s
//! `DefaultAccumulator`/`FastLogAccumulator` split.
//!
//! Because a semiring's `plus` has no inverse in general, a prefix-sum
//! table can't answer an arbitrary range `[begin, end)` in O(1) the way
//! it would over a group — only "sum everything up to position `end`"
//! is free. [`CheckpointAccumulator`] takes the same approach
//! `FastLogAccumulator` does: snapshot the cumulative sum every
//! `period` arcs, then for a query walk forward from the nearest
//! snapshot at or before `begin` instead of from zero.

use crate::arc::Arc;
use crate::semiring::Weight;

pub trait Accumulator<W: Weight> {
    /// Rebuilds any cached state for `arcs` (called once per state).
    fn init(&mut self, arcs: &[Arc<W>]);

    /// `initial` summed with the weights of `arcs[begin..end]`.
    fn sum_range(&self, initial: &W, arcs: &[Arc<W>], begin: usize, end: usize) -> W;
}

/// Recomputes every range from scratch; correct for any semiring and
/// the right choice when a state's outgoing arcs are rarely re-queried.
#[derive(Debug, Default)]
pub struct DefaultAccumulator;

impl<W: Weight> Accumulator<W> for DefaultAccumulator {
    fn init(&mut self, _arcs: &[Arc<W>]) {}

    fn sum_range(&self, initial: &W, arcs: &[Arc<W>], begin: usize, end: usize) -> W {
        arcs[begin..end].iter().fold(initial.clone(), |acc, a| acc.plus(&a.weight))
    }
}

/// Snapshots the running sum every `period` arcs so a query only has to
/// fold at most `period - 1` extra weights on top of the nearest
/// snapshot, instead of the full prefix every time.
pub struct CheckpointAccumulator<W: Weight> {
    period: usize,
    checkpoints: Vec<W>,
}

impl<W: Weight> CheckpointAccumulator<W> {
    pub fn new(period: usize) -> Self {
        CheckpointAccumulator {
            period: period.max(1),
            checkpoints: Vec::new(),
        }
    }
}

impl<W: Weight> Accumulator<W> for CheckpointAccumulator<W> {
    fn init(&mut self, arcs: &[Arc<W>]) {
        self.checkpoints.clear();
        let mut running = W::zero();
        self.checkpoints.push(running.clone());
        for (i, arc) in arcs.iter().enumerate() {
            running = running.plus(&arc.weight);
            if (i + 1) % self.period == 0 {
                self.checkpoints.push(running.clone());
            }
        }
    }

    fn sum_range(&self, initial: &W, arcs: &[Arc<W>], begin: usize, end: usize) -> W {
        // A prefix sum only helps for ranges starting at 0 — there's no
        // way to "subtract off" arcs[0..begin) in a semiring without an
        // inverse, so any other range just folds directly.
        if begin != 0 {
            return arcs[begin..end].iter().fold(initial.clone(), |acc, a| acc.plus(&a.weight));
        }
        let checkpoint_idx = end / self.period;
        let checkpoint_pos = checkpoint_idx * self.period;
        let base = self
            .checkpoints
            .get(checkpoint_idx)
            .cloned()
            .unwrap_or_else(W::zero);
        let mut sum = initial.plus(&base);
        for arc in &arcs[checkpoint_pos..end] {
            sum = sum.plus(&arc.weight);
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::EPS_LABEL;
    use crate::semiring::TropicalWeight;

    fn arcs(weights: &[f32]) -> Vec<Arc<TropicalWeight>> {
        weights
            .iter()
            .map(|&w| Arc::new(EPS_LABEL, EPS_LABEL, TropicalWeight::new(w), 0))
            .collect()
    }

    #[test]
    fn default_accumulator_sums_the_exact_range() {
        let a = arcs(&[1.0, 2.0, 3.0, 4.0]);
        let acc = DefaultAccumulator;
        let sum = acc.sum_range(&TropicalWeight::one(), &a, 1, 3);
        // tropical plus is min; one() = 0.0, so min(0, 2, 3) = 0
        assert_eq!(sum, TropicalWeight::new(0.0));
    }

    #[test]
    fn checkpoint_accumulator_matches_default_for_every_range() {
        let a = arcs(&[5.0, 1.0, 9.0, 2.0, 7.0, 0.5]);
        let mut fast = CheckpointAccumulator::new(2);
        fast.init(&a);
        let slow = DefaultAccumulator;
        for begin in 0..a.len() {
            for end in begin..=a.len() {
                let expected = slow.sum_range(&TropicalWeight::one(), &a, begin, end);
                let got = fast.sum_range(&TropicalWeight::one(), &a, begin, end);
                assert_eq!(got, expected, "range [{begin}, {end})");
            }
        }
    }
}
