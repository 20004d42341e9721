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

//! A type-erased `Fst` wrapper (spec §11 "DynFst") for the boundary
//! where a concrete storage layout or delayed operation is no longer
//! known at compile time — e.g. a CLI or script dispatching on a
//! `--fst_type` flag. Grounded on OpenFst's `script/fst-class.cc`
//! (`FstClass`), which does the same erase-the-concrete-template-type
//! trick for its own command-line tools (see
//! `original_source/fst/bin/*.h`).
//!
//! The weight type `W` is still fixed at the Rust type level (mixing
//! weight semirings at this boundary is a type mismatch per spec §7, not
//! something to paper over) — only the storage layout is erased.

use crate::arc::Arc;
use crate::error::Result;
use crate::fst_traits::{ArcIterator, CoreFst, Fst, StateIterator};
use crate::label::StateId;
use crate::properties::FstProperties;
use crate::semiring::Weight;

/// Object-safe subset of [`Fst`], implemented for any concrete layout.
trait ErasedFst<W: Weight> {
    fn start(&self) -> Option<StateId>;
    fn final_weight(&self, state: StateId) -> Option<W>;
    fn num_arcs(&self, state: StateId) -> usize;
    fn properties(&self) -> FstProperties;
    fn states(&self) -> Vec<StateId>;
    fn arcs(&self, state: StateId) -> Result<Vec<Arc<W>>>;
}

impl<W: Weight, F: Fst<W = W>> ErasedFst<W> for F {
    fn start(&self) -> Option<StateId> {
        CoreFst::start(self)
    }

    fn final_weight(&self, state: StateId) -> Option<W> {
        CoreFst::final_weight(self, state)
    }

    fn num_arcs(&self, state: StateId) -> usize {
        CoreFst::num_arcs(self, state)
    }

    fn properties(&self) -> FstProperties {
        CoreFst::properties(self)
    }

    fn states(&self) -> Vec<StateId> {
        self.states_iter().collect()
    }

    fn arcs(&self, state: StateId) -> Result<Vec<Arc<W>>> {
        Ok(self.arcs_iter(state)?.collect())
    }
}

/// A runtime-dispatched FST of fixed weight type `W` but unknown storage
/// layout (spec §11).
pub struct DynFst<W: Weight> {
    inner: Box<dyn ErasedFst<W>>,
    type_name: &'static str,
}

impl<W: Weight> DynFst<W> {
    pub fn new<F: Fst<W = W> + 'static>(fst: F, type_name: &'static str) -> Self {
        DynFst {
            inner: Box::new(fst),
            type_name,
        }
    }

    /// The erased layout's name, e.g. `"vector"`, `"const"`, `"compact"`
    /// — surfaced in error messages when a script-level operation
    /// expects a layout that supports mutation and gets a read-only one.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl<W: Weight> CoreFst for DynFst<W> {
    type W = W;

    fn start(&self) -> Option<StateId> {
        self.inner.start()
    }

    fn final_weight(&self, state: StateId) -> Option<W> {
        self.inner.final_weight(state)
    }

    fn num_arcs(&self, state: StateId) -> usize {
        self.inner.num_arcs(state)
    }

    fn properties(&self) -> FstProperties {
        self.inner.properties()
    }
}

impl<W: Weight> StateIterator for DynFst<W> {
    fn states_iter(&self) -> Box<dyn Iterator<Item = StateId> + '_> {
        Box::new(self.inner.states().into_iter())
    }
}

impl<W: Weight> ArcIterator for DynFst<W> {
    fn arcs_iter(&self, state: StateId) -> Result<Box<dyn Iterator<Item = Arc<W>> + '_>> {
        Ok(Box::new(self.inner.arcs(state)?.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst_traits::MutableFst;
    use crate::semiring::TropicalWeight;
    use crate::vector_fst::VectorFst;

    #[test]
    fn erases_a_vector_fst() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        v.set_start(s0);
        v.set_final(s0, TropicalWeight::one());

        let dyn_fst = DynFst::new(v, "vector");
        assert_eq!(dyn_fst.type_name(), "vector");
        assert_eq!(CoreFst::start(&dyn_fst), Some(s0));
        assert!(dyn_fst.is_final(s0));
    }
}
