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

//! The immutable, packed-array FST representation (spec §4.2
//! "ConstFst"): one flat `Vec<Arc<W>>` shared by all states plus a
//! per-state `(offset, num_arcs, final_weight)` table. Built once from
//! any `ExpandedFst` and read-only afterward — the natural target for
//! `io::binary::write`'s memory-mappable layout, since both the state
//! table and the arc array are plain contiguous records.

use crate::arc::Arc;
use crate::error::{Result, WfstError};
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, StateIterator};
use crate::label::StateId;
use crate::properties::FstProperties;
use crate::semiring::Weight;

#[derive(Debug, Clone)]
struct StateRecord<W: Weight> {
    final_weight: Option<W>,
    arc_offset: usize,
    num_arcs: usize,
}

/// A read-only FST over one contiguous arc array (spec §4.2).
#[derive(Debug, Clone)]
pub struct ConstFst<W: Weight> {
    states: Vec<StateRecord<W>>,
    arcs: Vec<Arc<W>>,
    start: Option<StateId>,
    properties: FstProperties,
}

impl<W: Weight> ConstFst<W> {
    /// Packs any expanded FST into the const layout.
    pub fn from_fst<F>(fst: &F) -> Self
    where
        F: Fst + ExpandedFst<W = W>,
    {
        let mut states = Vec::with_capacity(fst.num_states());
        let mut arcs = Vec::new();
        for s in fst.states_iter() {
            let offset = arcs.len();
            let mut count = 0;
            if let Ok(it) = fst.arcs_iter(s) {
                for a in it {
                    arcs.push(a.clone());
                    count += 1;
                }
            }
            states.push(StateRecord {
                final_weight: fst.final_weight(s),
                arc_offset: offset,
                num_arcs: count,
            });
        }
        ConstFst {
            states,
            arcs,
            start: fst.start(),
            properties: fst.properties(),
        }
    }

    fn state(&self, state: StateId) -> Result<&StateRecord<W>> {
        self.states.get(state as usize).ok_or_else(|| {
            WfstError::StructuralViolation(format!("no such state: {}", state))
        })
    }
}

impl<W: Weight> CoreFst for ConstFst<W> {
    type W = W;

    fn start(&self) -> Option<StateId> {
        self.start
    }

    fn final_weight(&self, state: StateId) -> Option<W> {
        self.states.get(state as usize)?.final_weight.clone()
    }

    fn num_arcs(&self, state: StateId) -> usize {
        self.states
            .get(state as usize)
            .map(|s| s.num_arcs)
            .unwrap_or(0)
    }

    fn properties(&self) -> FstProperties {
        self.properties
    }
}

impl<W: Weight> StateIterator for ConstFst<W> {
    fn states_iter(&self) -> Box<dyn Iterator<Item = StateId> + '_> {
        Box::new((0..self.states.len() as StateId).into_iter())
    }
}

impl<W: Weight> ArcIterator for ConstFst<W> {
    fn arcs_iter(&self, state: StateId) -> Result<Box<dyn Iterator<Item = Arc<W>> + '_>> {
        let rec = self.state(state)?;
        Ok(Box::new(
            self.arcs[rec.arc_offset..rec.arc_offset + rec.num_arcs]
                .iter()
                .cloned(),
        ))
    }
}

impl<W: Weight> ExpandedFst for ConstFst<W> {
    fn num_states(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst_traits::MutableFst;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    #[test]
    fn packs_a_vector_fst_faithfully() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 2, TropicalWeight::new(1.5), s1));

        let c = ConstFst::from_fst(&v);
        assert_eq!(c.num_states(), 2);
        assert_eq!(c.start(), Some(s0));
        assert!(c.is_final(s1));
        let arcs: Vec<_> = c.arcs_iter(s0).unwrap().collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].olabel, 2);
    }
}
