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

/// The log semiring: `plus` is `-ln(exp(-a) + exp(-b))`, `times` is `+`.
/// Used wherever probabilities summed in log-space are wanted instead of
/// the tropical (best-path-only) approximation. Not idempotent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogWeight(f32);

impl LogWeight {
    pub fn new(value: f32) -> Self {
        LogWeight(value)
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for LogWeight {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for LogWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_infinite() && self.0 > 0.0 {
            write!(f, "Infinity")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Weight for LogWeight {
    const PROPERTIES: SemiringProperties = SemiringProperties(
        SemiringProperties::LEFT_SEMIRING
            | SemiringProperties::RIGHT_SEMIRING
            | SemiringProperties::COMMUTATIVE,
    );

    fn zero() -> Self {
        LogWeight(f32::INFINITY)
    }

    fn one() -> Self {
        LogWeight(0.0)
    }

    fn no_weight() -> Self {
        LogWeight(f32::NAN)
    }

    fn plus(&self, rhs: &Self) -> Self {
        if self.0.is_infinite() {
            return *rhs;
        }
        if rhs.0.is_infinite() {
            return *self;
        }
        let (a, b) = (self.0.min(rhs.0), self.0.max(rhs.0));
        LogWeight(a - ((a - b).exp().ln_1p()))
    }

    fn times(&self, rhs: &Self) -> Self {
        LogWeight(self.0 + rhs.0)
    }

    fn divide(&self, rhs: &Self, _side: DivideType) -> Self {
        if rhs.0.is_infinite() {
            if self.0.is_infinite() {
                Self::no_weight()
            } else {
                Self::zero()
            }
        } else {
            LogWeight(self.0 - rhs.0)
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
        LogWeight(((self.0 as f64 / d).round() * d) as f32)
    }

    fn hash_value(&self) -> u64 {
        self.0.to_bits() as u64
    }

    fn type_name() -> &'static str {
        "log"
    }

    fn write_binary<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.0.to_le_bytes())
    }

    fn read_binary<R: std::io::Read>(r: &mut R) -> std::io::Result<Self> {
        let mut buf = [0u8; 4];
        r.read_exact(&mut buf)?;
        Ok(LogWeight(f32::from_le_bytes(buf)))
    }

    fn from_text(s: &str) -> Option<Self> {
        if s == "Infinity" {
            Some(LogWeight(f32::INFINITY))
        } else {
            s.parse().ok().map(LogWeight)
        }
    }
}
