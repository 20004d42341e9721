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

//! Supporting data structures with no direct teacher analogue, built
//! fresh from OpenFst's `heap.h`/`interval-set.h`/`partition.h`: a
//! decrease-key binary heap for Dijkstra-style shortest distance, an
//! interval set for label-reachability pruning, and a refinable
//! partition for Hopcroft minimize.

pub mod heap;
pub mod interval_set;
pub mod partition;

pub use heap::Heap;
pub use interval_set::IntervalSet;
pub use partition::Partition;
