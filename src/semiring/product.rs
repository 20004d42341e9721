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

/// Pairs two semirings component-wise (spec §3 "Composite weights...
/// delimit components with a configurable separator"), grounded on
/// OpenFst's `pair-weight.h`/`power-weight.h`. `plus`/`times` operate
/// independently on each component; the pair is a semiring whenever both
/// components are, with the intersection of their declared properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWeight<W1: Weight, W2: Weight>(pub W1, pub W2);

impl<W1: Weight, W2: Weight> ProductWeight<W1, W2> {
    pub fn new(a: W1, b: W2) -> Self {
        ProductWeight(a, b)
    }
}

impl<W1: Weight, W2: Weight> Default for ProductWeight<W1, W2> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<W1: Weight, W2: Weight> fmt::Display for ProductWeight<W1, W2> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = *crate::environment::WEIGHT_SEPARATOR;
        let parens = &*crate::environment::WEIGHT_PARENTHESES;
        let (open, close) = if parens.len() == 2 {
            let mut chars = parens.chars();
            (chars.next().unwrap(), chars.next().unwrap())
        } else {
            ('\0', '\0')
        };
        if open != '\0' {
            write!(f, "{}{}{}{}{}", open, self.0, sep, self.1, close)
        } else {
            write!(f, "{}{}{}", self.0, sep, self.1)
        }
    }
}

impl<W1: Weight, W2: Weight> Weight for ProductWeight<W1, W2> {
    const PROPERTIES: SemiringProperties = SemiringProperties(
        SemiringProperties::LEFT_SEMIRING & SemiringProperties::RIGHT_SEMIRING,
    );

    fn zero() -> Self {
        ProductWeight(W1::zero(), W2::zero())
    }

    fn one() -> Self {
        ProductWeight(W1::one(), W2::one())
    }

    fn no_weight() -> Self {
        ProductWeight(W1::no_weight(), W2::no_weight())
    }

    fn plus(&self, rhs: &Self) -> Self {
        ProductWeight(self.0.plus(&rhs.0), self.1.plus(&rhs.1))
    }

    fn times(&self, rhs: &Self) -> Self {
        ProductWeight(self.0.times(&rhs.0), self.1.times(&rhs.1))
    }

    fn divide(&self, rhs: &Self, side: DivideType) -> Self {
        ProductWeight(self.0.divide(&rhs.0, side), self.1.divide(&rhs.1, side))
    }

    fn reverse(&self) -> Self {
        ProductWeight(self.0.reverse(), self.1.reverse())
    }

    fn member(&self) -> bool {
        self.0.member() && self.1.member()
    }

    fn quantize(&self, delta: f64) -> Self {
        ProductWeight(self.0.quantize(delta), self.1.quantize(delta))
    }

    fn hash_value(&self) -> u64 {
        self.0
            .hash_value()
            .wrapping_mul(31)
            .wrapping_add(self.1.hash_value())
    }

    fn type_name() -> &'static str {
        "product"
    }

    fn write_binary<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.0.write_binary(w)?;
        self.1.write_binary(w)
    }

    fn read_binary<R: std::io::Read>(r: &mut R) -> std::io::Result<Self> {
        let a = W1::read_binary(r)?;
        let b = W2::read_binary(r)?;
        Ok(ProductWeight(a, b))
    }

    fn from_text(s: &str) -> Option<Self> {
        let parens = &*crate::environment::WEIGHT_PARENTHESES;
        let inner = if parens.len() == 2 && s.starts_with(parens.chars().next().unwrap()) {
            s.strip_prefix(parens.chars().next().unwrap())?
                .strip_suffix(parens.chars().nth(1).unwrap())?
        } else {
            s
        };
        let sep = *crate::environment::WEIGHT_SEPARATOR;
        let (left, right) = inner.split_once(sep)?;
        Some(ProductWeight(W1::from_text(left)?, W2::from_text(right)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    #[test]
    fn componentwise_plus_and_times() {
        type PW = ProductWeight<TropicalWeight, TropicalWeight>;
        let a = PW::new(TropicalWeight::new(1.0), TropicalWeight::new(2.0));
        let b = PW::new(TropicalWeight::new(3.0), TropicalWeight::new(0.5));
        let sum = a.plus(&b);
        assert_eq!(sum.0, TropicalWeight::new(1.0));
        assert_eq!(sum.1, TropicalWeight::new(0.5));
        let prod = a.times(&b);
        assert_eq!(prod.0, TropicalWeight::new(4.0));
        assert_eq!(prod.1, TropicalWeight::new(2.5));
    }
}
