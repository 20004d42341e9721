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

//! Typed errors for the boundaries that have no FST to return an error
//! state in: file I/O, format parsing, and symbol table lookups. Algorithm
//! failures that *do* operate on an FST (a semiring lacking a required
//! property, a structural violation) are represented as values instead —
//! see [`crate::properties::Properties::ERROR`] — and never go through
//! this enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WfstError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad format: {0}")]
    BadFormat(String),

    #[error("symbol not found: {0}")]
    UnknownSymbol(String),

    #[error("semiring violation: {0}")]
    SemiringViolation(String),

    #[error("type mismatch at dynamic FST boundary: expected arc type `{expected}`, got `{actual}`")]
    TypeMismatch { expected: String, actual: String },

    #[error("structural violation: {0}")]
    StructuralViolation(String),
}

pub type Result<T> = std::result::Result<T, WfstError>;
