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

//! Environment-driven global configuration, read once and cached via
//! `once_cell::sync::Lazy`. These mirror the CLI flags named in spec §6;
//! there is no flag-parsing CLI in this crate, so they are read from the
//! environment directly wherever those flags would otherwise be threaded
//! through.

use once_cell::sync::Lazy;
use std::env;

/// Default byte budget for a newly constructed [`crate::cache::CacheStore`]
/// when the caller doesn't specify one explicitly.
///
/// Set via `WFST_CACHE_BYTE_SIZE`; defaults to 1 MiB.
pub static DEFAULT_CACHE_BYTE_SIZE: Lazy<usize> = Lazy::new(|| {
    env::var("WFST_CACHE_BYTE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1 << 20)
});

/// Character used to separate components of a composite weight's textual
/// form (pair, product, lexicographic, ...). Corresponds to
/// `FLAGS_fst_weight_separator`.
pub static WEIGHT_SEPARATOR: Lazy<char> = Lazy::new(|| {
    env::var("WFST_WEIGHT_SEPARATOR")
        .ok()
        .and_then(|s| s.chars().next())
        .unwrap_or(',')
});

/// Optional two-character wrap for nested composite weights. Empty string
/// disables wrapping. Corresponds to `FLAGS_fst_weight_parentheses`.
pub static WEIGHT_PARENTHESES: Lazy<String> =
    Lazy::new(|| env::var("WFST_WEIGHT_PARENTHESES").unwrap_or_default());

/// Column separator for AT&T text format. Corresponds to
/// `FLAGS_fst_field_separator`.
pub static FIELD_SEPARATOR: Lazy<char> = Lazy::new(|| {
    env::var("WFST_FIELD_SEPARATOR")
        .ok()
        .and_then(|s| s.chars().next())
        .unwrap_or('\t')
});

/// Spec §9 Open Question (a): the authoritative policy for negative labels
/// in label-pair parsing is the one gated behind an explicit flag,
/// defaulting to forbidding them.
pub static ALLOW_NEGATIVE_LABELS: Lazy<bool> = Lazy::new(|| {
    env::var("WFST_ALLOW_NEGATIVE_LABELS")
        .ok()
        .map(|v| {
            let v = v.to_lowercase();
            v == "1" || v == "true" || v == "yes"
        })
        .unwrap_or(false)
});
