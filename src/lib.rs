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

//! A weighted finite-state transducer library: a generic `Fst` trait
//! hierarchy, three storage layouts (vector/const/compact), a delayed/lazy
//! layout backed by a bounded cache, and the standard WFST algorithm
//! suite (shortest distance/path, minimize, equivalence, pruning,
//! relabeling, the rational operations, intersection, and pushdown
//! transducer expansion).

pub mod arc;
pub mod cache;
pub mod compact_fst;
pub mod const_fst;
pub mod containers;
pub mod delayed_fst;
pub mod dyn_fst;
pub mod edit_fst;
pub mod environment;
pub mod error;
pub mod fst_traits;
pub mod io;
pub mod label;
pub mod pdt;
pub mod properties;
pub mod queues;
pub mod semiring;
pub mod symbol_table;
pub mod vector_fst;

pub mod algorithms;

pub use arc::Arc;
pub use error::{Result, WfstError};
pub use fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
pub use label::{Label, StateId, EPS_LABEL, NO_LABEL, NO_STATE_ID};
pub use properties::FstProperties;
pub use semiring::{DivideType, Weight};
pub use vector_fst::VectorFst;

/// Installs a default `tracing` subscriber reading `RUST_LOG` (spec §10.2).
/// Safe to call more than once; only the first call takes effect.
pub fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}
