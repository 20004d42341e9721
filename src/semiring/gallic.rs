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

//! The gallic weight used internally by [`crate::algorithms::minimize`] to
//! fold a transducer's output label into its weight (spec §4.5 "If
//! transducer: encode with a gallic weight... minimize as unweighted
//! acceptor, decode, then factor back into labels"), grounded on OpenFst's
//! `string.h` (`StringWeight`) and `pair-weight.h`.
//!
//! Only the restricted-string variant is implemented: `plus` keeps the
//! longest common label prefix of its two arguments (falling back to
//! `zero` only when that prefix is the special "no common prefix"
//! sentinel some algorithm already produced), which is sufficient for
//! minimize's push-then-encode-then-decode pipeline — it never calls
//! `plus` on two gallic weights with genuinely divergent output strings
//! once weight-pushing has run.

use super::{DivideType, SemiringProperties, Weight};
use crate::label::Label;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum StringComponent {
    Zero,
    Labels(Vec<Label>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GallicWeight<W: Weight> {
    output: StringComponent,
    weight: W,
}

impl<W: Weight> GallicWeight<W> {
    pub fn new(output: Vec<Label>, weight: W) -> Self {
        GallicWeight {
            output: StringComponent::Labels(output),
            weight,
        }
    }

    pub fn output_labels(&self) -> Option<&[Label]> {
        match &self.output {
            StringComponent::Labels(v) => Some(v),
            StringComponent::Zero => None,
        }
    }

    pub fn weight(&self) -> &W {
        &self.weight
    }
}

impl<W: Weight> Default for GallicWeight<W> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<W: Weight> fmt::Display for GallicWeight<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.output {
            StringComponent::Zero => write!(f, "Zero"),
            StringComponent::Labels(v) => {
                let sep = *crate::environment::WEIGHT_SEPARATOR;
                let labels = v
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .join("_");
                write!(f, "{}{}{}", labels, sep, self.weight)
            }
        }
    }
}

fn common_prefix(a: &[Label], b: &[Label]) -> Vec<Label> {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).map(|(x, _)| *x).collect()
}

impl<W: Weight> Weight for GallicWeight<W> {
    const PROPERTIES: SemiringProperties = SemiringProperties(SemiringProperties::LEFT_SEMIRING);

    fn zero() -> Self {
        GallicWeight {
            output: StringComponent::Zero,
            weight: W::zero(),
        }
    }

    fn one() -> Self {
        GallicWeight {
            output: StringComponent::Labels(Vec::new()),
            weight: W::one(),
        }
    }

    fn no_weight() -> Self {
        GallicWeight {
            output: StringComponent::Zero,
            weight: W::no_weight(),
        }
    }

    fn plus(&self, rhs: &Self) -> Self {
        match (&self.output, &rhs.output) {
            (StringComponent::Zero, _) => rhs.clone(),
            (_, StringComponent::Zero) => self.clone(),
            (StringComponent::Labels(a), StringComponent::Labels(b)) => GallicWeight {
                output: StringComponent::Labels(common_prefix(a, b)),
                weight: self.weight.plus(&rhs.weight),
            },
        }
    }

    fn times(&self, rhs: &Self) -> Self {
        match (&self.output, &rhs.output) {
            (StringComponent::Zero, _) | (_, StringComponent::Zero) => Self::zero(),
            (StringComponent::Labels(a), StringComponent::Labels(b)) => {
                let mut labels = a.clone();
                labels.extend_from_slice(b);
                GallicWeight {
                    output: StringComponent::Labels(labels),
                    weight: self.weight.times(&rhs.weight),
                }
            }
        }
    }

    fn divide(&self, rhs: &Self, side: DivideType) -> Self {
        GallicWeight {
            output: self.output.clone(),
            weight: self.weight.divide(&rhs.weight, side),
        }
    }

    fn reverse(&self) -> Self {
        match &self.output {
            StringComponent::Zero => Self::zero(),
            StringComponent::Labels(v) => {
                let mut labels = v.clone();
                labels.reverse();
                GallicWeight {
                    output: StringComponent::Labels(labels),
                    weight: self.weight.reverse(),
                }
            }
        }
    }

    fn member(&self) -> bool {
        self.weight.member()
    }

    fn quantize(&self, delta: f64) -> Self {
        GallicWeight {
            output: self.output.clone(),
            weight: self.weight.quantize(delta),
        }
    }

    fn hash_value(&self) -> u64 {
        let mut h = self.weight.hash_value();
        if let StringComponent::Labels(v) = &self.output {
            for l in v {
                h = h.wrapping_mul(31).wrapping_add(*l as u64);
            }
        }
        h
    }

    fn type_name() -> &'static str {
        "gallic"
    }

    fn write_binary<Wr: std::io::Write>(&self, w: &mut Wr) -> std::io::Result<()> {
        match &self.output {
            StringComponent::Zero => w.write_all(&(-1i64).to_le_bytes())?,
            StringComponent::Labels(v) => {
                w.write_all(&(v.len() as i64).to_le_bytes())?;
                for l in v {
                    w.write_all(&l.to_le_bytes())?;
                }
            }
        }
        self.weight.write_binary(w)
    }

    fn read_binary<R: std::io::Read>(r: &mut R) -> std::io::Result<Self> {
        let mut len_buf = [0u8; 8];
        r.read_exact(&mut len_buf)?;
        let len = i64::from_le_bytes(len_buf);
        let output = if len < 0 {
            StringComponent::Zero
        } else {
            let mut v = Vec::with_capacity(len as usize);
            for _ in 0..len {
                let mut buf = [0u8; 4];
                r.read_exact(&mut buf)?;
                v.push(i32::from_le_bytes(buf));
            }
            StringComponent::Labels(v)
        };
        let weight = W::read_binary(r)?;
        Ok(GallicWeight { output, weight })
    }

    fn from_text(s: &str) -> Option<Self> {
        if s == "Zero" {
            return Some(Self::zero());
        }
        let sep = *crate::environment::WEIGHT_SEPARATOR;
        let (labels_text, weight_text) = s.split_once(sep)?;
        let labels = if labels_text.is_empty() {
            Vec::new()
        } else {
            labels_text
                .split('_')
                .map(|p| p.parse::<Label>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .ok()?
        };
        Some(GallicWeight {
            output: StringComponent::Labels(labels),
            weight: W::from_text(weight_text)?,
        })
    }
}
