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

//! A minimal label <-> string mapping (spec §11 "SymbolTable", grounded
//! on `original_source/src/lib/symbol-table-ops.cc` for the
//! add-if-absent and merge semantics OpenFst's own implementation
//! follows). Used by the AT&T text format reader/writer
//! ([`crate::io::att`]) to translate between human-readable labels and
//! the integer labels the core algorithms operate on.

use rustc_hash::FxHashMap;

use crate::error::{Result, WfstError};
use crate::label::Label;

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    name: String,
    symbol_to_label: FxHashMap<String, Label>,
    label_to_symbol: FxHashMap<Label, String>,
    next_label: Label,
}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        let mut table = SymbolTable {
            name: name.into(),
            symbol_to_label: FxHashMap::default(),
            label_to_symbol: FxHashMap::default(),
            next_label: 0,
        };
        table.add_symbol("<eps>", 0);
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.symbol_to_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_to_label.is_empty()
    }

    /// Inserts `symbol` bound to `label`, overwriting any prior binding
    /// for either side (matches OpenFst's `AddSymbol(symbol, key)`).
    pub fn add_symbol(&mut self, symbol: &str, label: Label) -> Label {
        self.symbol_to_label.insert(symbol.to_string(), label);
        self.label_to_symbol.insert(label, symbol.to_string());
        if label >= self.next_label {
            self.next_label = label + 1;
        }
        label
    }

    /// Inserts `symbol` at the next unused label, or returns its
    /// existing label if already present.
    pub fn find_or_add(&mut self, symbol: &str) -> Label {
        if let Some(&label) = self.symbol_to_label.get(symbol) {
            return label;
        }
        let label = self.next_label;
        self.add_symbol(symbol, label);
        label
    }

    pub fn find_label(&self, symbol: &str) -> Option<Label> {
        self.symbol_to_label.get(symbol).copied()
    }

    pub fn find_symbol(&self, label: Label) -> Option<&str> {
        self.label_to_symbol.get(&label).map(|s| s.as_str())
    }

    /// Looks up `symbol`, returning a typed error per spec §10.1 rather
    /// than `None` — used at I/O boundaries where an unknown symbol
    /// means the input was malformed, not that the caller should try a
    /// fallback.
    pub fn require_label(&self, symbol: &str) -> Result<Label> {
        self.find_label(symbol)
            .ok_or_else(|| WfstError::UnknownSymbol(symbol.to_string()))
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&str, Label)> {
        self.symbol_to_label.iter().map(|(s, &l)| (s.as_str(), l))
    }
}
