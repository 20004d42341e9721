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

//! The core WFST algorithm suite (spec §4.5-§4.12).

pub mod accumulator;
pub mod connect;
pub mod equal;
pub mod equivalent;
pub mod intersect;
pub mod lookahead_matcher;
pub mod minimize;
pub mod prune;
pub mod rational;
pub mod relabel;
pub mod shortest_distance;
pub mod shortest_path;
