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

//! Pushdown transducer (PDT) support (spec §4.12 and §9 "PDT stack
//! configurations"): a PDT is an ordinary [`crate::fst_traits::Fst`]
//! whose arcs are additionally tagged, via a set of open/close
//! parenthesis label pairs, as pushing or popping an implicit stack.
//! Two traversal problems this crate addresses without materializing
//! that stack as part of the automaton's state space:
//!
//! - [`stack::PdtStack`]: a bijection between the stack's contents (a
//!   sequence of still-open parens) and a single integer `StackId`,
//!   hash-consed so that the (typically small) set of distinct stack
//!   configurations actually reached during a traversal is represented
//!   compactly — grounded on
//!   `original_source/src/include/fst/extensions/pdt/pdt.h`'s
//!   `PdtStack`.
//! - [`mpdt::MPdtStack`]: the same idea generalized to several
//!   independent stacks ("levels"), one per parenthesis pair, used by
//!   multi-pushdown transducers — grounded on
//!   `original_source/src/include/fst/extensions/mpdt/mpdt.h`'s
//!   `MPdtStack`.
//!
//! [`shortest_path::shortest_path`] builds on [`stack::PdtStack`] to
//! find the best balanced-parenthesis path directly, without first
//! expanding the PDT into an ordinary FST — grounded on
//! `original_source/src/include/fst/extensions/pdt/shortest-path.h`.
//!
//! [`expand::pdt_expand`] and [`expand::mpdt_expand`] take the other
//! route: they walk the full product `(original state, stack
//! configuration)` and materialize it as an ordinary FST, grounded on
//! `original_source/src/include/fst/extensions/mpdt/expand.h`'s
//! `MPdtExpandFstImpl::ExpandState` (single-stack PDT expansion is the
//! `nlevels == 1` case of the same construction). Use
//! [`shortest_path::shortest_path`] when only the best path is needed;
//! use expansion when the whole recognized language, or some other
//! algorithm that expects an ordinary FST, is needed instead.

pub mod expand;
pub mod mpdt;
pub mod shortest_path;
pub mod stack;

pub use expand::{mpdt_expand, pdt_expand, ParenLabels};
pub use mpdt::{MPdtRestrict, MPdtStack};
pub use stack::PdtStack;
