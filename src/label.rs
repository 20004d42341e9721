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

/// Integer label on an arc. `0` is epsilon; negative values other than
/// `NO_LABEL` are permitted only when `WFST_ALLOW_NEGATIVE_LABELS` is set.
pub type Label = i32;

/// Identifier of a state within an FST.
pub type StateId = i32;

/// The empty-string label.
pub const EPS_LABEL: Label = 0;

/// Sentinel for "no label", used on super-final transitions and similar
/// bookkeeping arcs that do not carry a real symbol.
pub const NO_LABEL: Label = -1;

/// Sentinel for "no state", e.g. an FST with no start state.
pub const NO_STATE_ID: StateId = -1;
