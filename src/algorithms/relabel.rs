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

//! Label remapping (spec §4.10): rewrites input and/or output labels
//! according to old-to-new pairs; labels with no pair keep their original
//! value. Grounded on `original_source/src/include/fst/relabel.h`.
//!
//! Two variants, both sharing [`remap_label`]: [`relabel`] rewrites in
//! place; [`delayed_relabel`] wraps a source FST in a
//! [`crate::delayed_fst::DelayedFst`] that applies the same remapping to
//! each state's arcs only as that state is first visited, per spec §4.8
//! "Delayed: cache-backed per-state expansion that applies the same
//! remapping lazily."

use rustc_hash::FxHashMap;

use crate::arc::Arc;
use crate::delayed_fst::{DelayedFst, DelayedFstOps};
use crate::error::{Result, WfstError};
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst};
use crate::label::{Label, StateId, NO_LABEL};
use crate::properties::FstProperties;
use crate::semiring::Weight;

fn remap_label(map: &FxHashMap<Label, Label>, label: Label, side: &str) -> Result<Label> {
    match map.get(&label) {
        Some(&NO_LABEL) => Err(WfstError::StructuralViolation(format!(
            "{} label {} has no relabel target",
            side, label
        ))),
        Some(&new) => Ok(new),
        None => Ok(label),
    }
}

/// Relabels `fst` in place. `ipairs`/`opairs` give old-to-new mappings
/// for input/output labels respectively; an empty slice leaves that
/// side untouched. Mapping a label to [`NO_LABEL`] is rejected — every
/// arc must end up with a valid label.
pub fn relabel<F, W>(fst: &mut F, ipairs: &[(Label, Label)], opairs: &[(Label, Label)]) -> Result<()>
where
    F: Fst<W = W> + ExpandedFst + MutableFst,
    W: Weight,
{
    let input_map: FxHashMap<Label, Label> = ipairs.iter().copied().collect();
    let output_map: FxHashMap<Label, Label> = opairs.iter().copied().collect();

    let states: Vec<StateId> = fst.states_iter().collect();
    for s in states {
        let arcs: Vec<_> = fst.arcs_iter(s)?.collect();
        if arcs.is_empty() {
            continue;
        }
        fst.delete_arcs(s, None);
        for arc in arcs {
            let ilabel = remap_label(&input_map, arc.ilabel, "input")?;
            let olabel = remap_label(&output_map, arc.olabel, "output")?;
            fst.add_arc(s, Arc::new(ilabel, olabel, arc.weight, arc.nextstate));
        }
    }
    Ok(())
}

/// The [`DelayedFstOps`] backing [`delayed_relabel`]: holds the source
/// FST and the two label maps, expanding (and remapping) one state at a
/// time on demand.
pub struct RelabelOps<F: Fst> {
    source: F,
    input_map: FxHashMap<Label, Label>,
    output_map: FxHashMap<Label, Label>,
}

impl<F: Fst> DelayedFstOps for RelabelOps<F> {
    type W = F::W;

    fn start(&self) -> Option<StateId> {
        self.source.start()
    }

    fn expand(&self, state: StateId) -> Result<(Option<Self::W>, Vec<Arc<Self::W>>)> {
        let final_weight = self.source.final_weight(state);
        let mut arcs = Vec::new();
        for arc in self.source.arcs_iter(state)? {
            let ilabel = remap_label(&self.input_map, arc.ilabel, "input")?;
            let olabel = remap_label(&self.output_map, arc.olabel, "output")?;
            arcs.push(Arc::new(ilabel, olabel, arc.weight, arc.nextstate));
        }
        Ok((final_weight, arcs))
    }

    fn known_properties(&self) -> FstProperties {
        FstProperties::empty()
    }
}

/// Lazy counterpart to [`relabel`]: returns a [`DelayedFst`] that applies
/// the same old-to-new label remapping to each state's arcs the first
/// time that state is visited, rather than rewriting the whole FST up
/// front (spec §4.8 "Delayed" variant).
pub fn delayed_relabel<F>(
    source: F,
    ipairs: &[(Label, Label)],
    opairs: &[(Label, Label)],
) -> DelayedFst<RelabelOps<F>>
where
    F: Fst,
{
    DelayedFst::new(RelabelOps {
        source,
        input_map: ipairs.iter().copied().collect(),
        output_map: opairs.iter().copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    #[test]
    fn remaps_listed_labels_and_keeps_others() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        v.add_arc(s0, Arc::new(2, 2, TropicalWeight::one(), s1));

        relabel(&mut v, &[(1, 10)], &[]).unwrap();
        let arcs: Vec<_> = v.arcs_iter(s0).unwrap().collect();
        let mut labels: Vec<_> = arcs.iter().map(|a| (a.ilabel, a.olabel)).collect();
        labels.sort();
        assert_eq!(labels, vec![(2, 2), (10, 1)]);
    }

    #[test]
    fn rejects_mapping_to_no_label() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));

        assert!(relabel(&mut v, &[(1, NO_LABEL)], &[]).is_err());
    }

    #[test]
    fn delayed_relabel_matches_the_in_place_result() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));

        let lazy = delayed_relabel(v.clone(), &[(1, 42)], &[(1, 42)]);
        assert_eq!(lazy.start(), Some(s0));
        let arcs: Vec<_> = lazy.arcs_iter(s0).unwrap().collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!((arcs[0].ilabel, arcs[0].olabel), (42, 42));

        relabel(&mut v, &[(1, 42)], &[(1, 42)]).unwrap();
        assert_eq!(arcs[0].nextstate, s1);
        assert!(v.is_final(s1));
    }
}
