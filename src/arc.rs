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

//! The arc quadruple (spec §3 "Arc"): an input label, an output label, a
//! weight, and a destination state. Acceptors are the special case
//! `ilabel == olabel`.

use crate::label::{Label, StateId, EPS_LABEL};
use crate::semiring::Weight;

#[derive(Debug, Clone, PartialEq)]
pub struct Arc<W: Weight> {
    pub ilabel: Label,
    pub olabel: Label,
    pub weight: W,
    pub nextstate: StateId,
}

impl<W: Weight> Arc<W> {
    pub fn new(ilabel: Label, olabel: Label, weight: W, nextstate: StateId) -> Self {
        Arc {
            ilabel,
            olabel,
            weight,
            nextstate,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        self.ilabel == EPS_LABEL && self.olabel == EPS_LABEL
    }

    pub fn is_input_epsilon(&self) -> bool {
        self.ilabel == EPS_LABEL
    }

    pub fn is_output_epsilon(&self) -> bool {
        self.olabel == EPS_LABEL
    }

    pub fn is_acceptor_arc(&self) -> bool {
        self.ilabel == self.olabel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    #[test]
    fn epsilon_detection() {
        let a = Arc::new(0, 0, TropicalWeight::one(), 1);
        assert!(a.is_epsilon());
        let b = Arc::new(3, 0, TropicalWeight::one(), 1);
        assert!(!b.is_epsilon());
        assert!(b.is_output_epsilon());
        assert!(!b.is_input_epsilon());
    }
}
