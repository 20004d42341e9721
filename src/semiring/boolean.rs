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

/// The Boolean semiring: `plus` is `||`, `times` is `&&`. Used for plain
/// (unweighted) acceptors/transducers, e.g. during determinization or
/// minimize's unweighted-acceptor fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BooleanWeight(bool);

impl BooleanWeight {
    pub fn new(value: bool) -> Self {
        BooleanWeight(value)
    }

    pub fn value(&self) -> bool {
        self.0
    }
}

impl Default for BooleanWeight {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for BooleanWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.0 { "T" } else { "F" })
    }
}

impl Weight for BooleanWeight {
    const PROPERTIES: SemiringProperties = SemiringProperties(
        SemiringProperties::LEFT_SEMIRING
            | SemiringProperties::RIGHT_SEMIRING
            | SemiringProperties::COMMUTATIVE
            | SemiringProperties::IDEMPOTENT
            | SemiringProperties::PATH,
    );

    fn zero() -> Self {
        BooleanWeight(false)
    }

    fn one() -> Self {
        BooleanWeight(true)
    }

    fn no_weight() -> Self {
        // Boolean has no distinct "error" member; reuse `zero` per the
        // semiring's own convention (OpenFst does the same for this type).
        BooleanWeight(false)
    }

    fn plus(&self, rhs: &Self) -> Self {
        BooleanWeight(self.0 || rhs.0)
    }

    fn times(&self, rhs: &Self) -> Self {
        BooleanWeight(self.0 && rhs.0)
    }

    fn divide(&self, _rhs: &Self, _side: DivideType) -> Self {
        *self
    }

    fn reverse(&self) -> Self {
        *self
    }

    fn member(&self) -> bool {
        true
    }

    fn quantize(&self, _delta: f64) -> Self {
        *self
    }

    fn hash_value(&self) -> u64 {
        self.0 as u64
    }

    fn type_name() -> &'static str {
        "boolean"
    }

    fn write_binary<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&[self.0 as u8])
    }

    fn read_binary<R: std::io::Read>(r: &mut R) -> std::io::Result<Self> {
        let mut buf = [0u8; 1];
        r.read_exact(&mut buf)?;
        Ok(BooleanWeight(buf[0] != 0))
    }

    fn from_text(s: &str) -> Option<Self> {
        match s {
            "T" => Some(BooleanWeight(true)),
            "F" => Some(BooleanWeight(false)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_algebra() {
        let t = BooleanWeight::one();
        let f = BooleanWeight::zero();
        assert_eq!(t.plus(&f), t);
        assert_eq!(t.times(&f), f);
    }
}
