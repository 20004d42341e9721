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

use super::{DivideType, SemiringProperties, Weight};
use std::fmt;

/// The (min, +) semiring: `plus` is `min`, `times` is `+`, `zero` is
/// `+inf`, `one` is `0.0`. The classic weight for shortest-path over
/// costs. Idempotent, commutative, path, and a left-and-right semiring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TropicalWeight(f32);

impl TropicalWeight {
    pub fn new(value: f32) -> Self {
        TropicalWeight(value)
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for TropicalWeight {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for TropicalWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_infinite() && self.0 > 0.0 {
            write!(f, "Infinity")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Weight for TropicalWeight {
    const PROPERTIES: SemiringProperties = SemiringProperties(
        SemiringProperties::LEFT_SEMIRING
            | SemiringProperties::RIGHT_SEMIRING
            | SemiringProperties::COMMUTATIVE
            | SemiringProperties::IDEMPOTENT
            | SemiringProperties::PATH,
    );

    fn zero() -> Self {
        TropicalWeight(f32::INFINITY)
    }

    fn one() -> Self {
        TropicalWeight(0.0)
    }

    fn no_weight() -> Self {
        TropicalWeight(f32::NAN)
    }

    fn plus(&self, rhs: &Self) -> Self {
        if self.0 <= rhs.0 {
            *self
        } else {
            *rhs
        }
    }

    fn times(&self, rhs: &Self) -> Self {
        TropicalWeight(self.0 + rhs.0)
    }

    fn divide(&self, rhs: &Self, _side: DivideType) -> Self {
        if rhs.0.is_infinite() {
            if self.0.is_infinite() {
                Self::no_weight()
            } else {
                Self::zero()
            }
        } else {
            TropicalWeight(self.0 - rhs.0)
        }
    }

    fn reverse(&self) -> Self {
        *self
    }

    fn member(&self) -> bool {
        !self.0.is_nan()
    }

    fn quantize(&self, delta: f64) -> Self {
        if self.0.is_infinite() {
            return *self;
        }
        let d = delta.max(1e-9);
        TropicalWeight(((self.0 as f64 / d).round() * d) as f32)
    }

    fn hash_value(&self) -> u64 {
        self.0.to_bits() as u64
    }

    fn type_name() -> &'static str {
        "tropical"
    }

    fn write_binary<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.0.to_le_bytes())
    }

    fn read_binary<R: std::io::Read>(r: &mut R) -> std::io::Result<Self> {
        let mut buf = [0u8; 4];
        r.read_exact(&mut buf)?;
        Ok(TropicalWeight(f32::from_le_bytes(buf)))
    }

    fn from_text(s: &str) -> Option<Self> {
        if s == "Infinity" {
            Some(TropicalWeight(f32::INFINITY))
        } else {
            s.parse().ok().map(TropicalWeight)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_is_min_times_is_add() {
        let a = TropicalWeight::new(3.0);
        let b = TropicalWeight::new(5.0);
        assert_eq!(a.plus(&b), a);
        assert_eq!(a.times(&b), TropicalWeight::new(8.0));
    }

    #[test]
    fn zero_and_one_identities() {
        let a = TropicalWeight::new(4.0);
        assert_eq!(a.plus(&TropicalWeight::zero()), a);
        assert_eq!(a.times(&TropicalWeight::one()), a);
    }

    #[test]
    fn divide_undoes_times() {
        let a = TropicalWeight::new(4.0);
        let b = TropicalWeight::new(1.5);
        let c = a.times(&b);
        assert_eq!(c.divide(&b, DivideType::Any), a);
    }
}
