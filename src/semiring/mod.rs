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

//! The semiring interface (spec §3 "Weight") and its concrete
//! instantiations. `Weight` is the trait every arc/final weight type must
//! implement; `tropical`/`log`/`boolean` give the semirings most of the
//! algorithms in this crate are tested against, and `product`/`gallic`
//! give the composite weights `minimize` and the accumulator need.

mod boolean;
mod gallic;
mod log;
mod product;
mod tropical;

pub use boolean::BooleanWeight;
pub use gallic::GallicWeight;
pub use log::LogWeight;
pub use product::ProductWeight;
pub use tropical::TropicalWeight;

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Declares which algebraic properties a semiring satisfies. Used by
/// algorithms to refuse to run rather than silently produce wrong answers
/// (spec §7 "semiring violation").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SemiringProperties(pub u8);

impl SemiringProperties {
    pub const LEFT_SEMIRING: u8 = 1 << 0;
    pub const RIGHT_SEMIRING: u8 = 1 << 1;
    pub const COMMUTATIVE: u8 = 1 << 2;
    pub const IDEMPOTENT: u8 = 1 << 3;
    pub const PATH: u8 = 1 << 4;

    pub fn contains(self, bit: u8) -> bool {
        self.0 & bit == bit
    }
}

/// The semiring interface every weight type implements (spec §3).
///
/// Implementors must satisfy: `plus(w, zero()) == w`, `times(w, one()) ==
/// w`, and distributivity on whichever side(s) [`Weight::PROPERTIES`]
/// declares.
pub trait Weight:
    Clone + Debug + Display + PartialEq + Default + Send + Sync + 'static
{
    /// Declares which of `{left-semiring, right-semiring, commutative,
    /// idempotent, path}` this semiring satisfies.
    const PROPERTIES: SemiringProperties;

    fn zero() -> Self;
    fn one() -> Self;

    /// Sentinel for "uninitialized / error" — distinct from `zero`.
    fn no_weight() -> Self;

    fn plus(&self, rhs: &Self) -> Self;
    fn times(&self, rhs: &Self) -> Self;

    /// `divide` is only meaningful on the side(s) the semiring supports;
    /// implementations that don't support a particular side return
    /// `no_weight()`. `DivideType::Any` picks left if supported, else
    /// right.
    fn divide(&self, rhs: &Self, side: DivideType) -> Self;

    /// The weight type obtained by transposing left/right roles; an
    /// involution (`w.reverse().reverse() == w`).
    fn reverse(&self) -> Self;

    /// Whether this value is a valid member of the semiring (not a NaN-like
    /// degenerate value produced by e.g. `0 * inf` in the log domain).
    fn member(&self) -> bool;

    /// Round to an δ-quantization grid, used by minimize/equal to compare
    /// weights up to tolerance.
    fn quantize(&self, delta: f64) -> Self;

    fn approx_equal(&self, rhs: &Self, delta: f64) -> bool {
        self.quantize(delta) == rhs.quantize(delta)
    }

    fn hash_value(&self) -> u64;

    fn type_name() -> &'static str;

    fn properties() -> SemiringProperties {
        Self::PROPERTIES
    }

    fn write_binary<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()>;
    fn read_binary<R: std::io::Read>(r: &mut R) -> std::io::Result<Self>
    where
        Self: Sized;

    /// Parses this weight's `Display` representation back into a value,
    /// used by [`crate::io::att`] to read weighted arcs from text.
    /// Returns `None` on malformed input.
    fn from_text(s: &str) -> Option<Self>
    where
        Self: Sized;
}

/// Side(s) to divide on, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivideType {
    Left,
    Right,
    Any,
}

/// Ordering used by shortest-first queues and pruning: for a `path`
/// semiring, `plus` selects one of its two arguments, so weights are
/// totally pre-ordered by "is `a` at least as good as `a + b`".
pub fn natural_less<W: Weight>(a: &W, b: &W) -> bool {
    &a.plus(b) == a && a != b
}

/// Marker trait for weights whose `hash_value` is stable enough to use as
/// an `std::hash::Hash` key (e.g. inside `rustc_hash::FxHashMap` during
/// minimize's state-class bucketing).
pub trait WeightHashKey: Weight + Hash + Eq {}
impl<W: Weight + Hash + Eq> WeightHashKey for W {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_less_orders_tropical_by_cost() {
        let a = TropicalWeight::new(1.0);
        let b = TropicalWeight::new(2.0);
        assert!(natural_less(&a, &b));
        assert!(!natural_less(&b, &a));
    }
}
