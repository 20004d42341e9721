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

//! Multi-pushdown stack hash-consing, grounded on
//! `original_source/src/include/fst/extensions/mpdt/mpdt.h`'s
//! `MPdtStack`. Each parenthesis pair is assigned to one of several
//! independent "levels"; [`MPdtStack`] tracks one [`PdtStack`] per
//! level and hash-conses the combined per-level configuration (a small
//! vector of per-level `StackId`s) into a single external `StackId`,
//! the same way the single-stack [`PdtStack`] hash-conses push
//! sequences.
//!
//! A [`MPdtRestrict`] policy can additionally forbid reading or writing
//! a level while any lower-numbered level is non-empty, matching the
//! `MPDT_READ_RESTRICT`/`MPDT_WRITE_RESTRICT` policies the grounding
//! source supports.

use rustc_hash::FxHashMap;

use super::stack::{PdtStack, StackId, NO_STACK_ID};
use crate::label::Label;

/// Which levels a paren transition is allowed to touch relative to the
/// other stacks' emptiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MPdtRestrict {
    /// A close paren at level `lev` is only valid while every stack at
    /// a lower level is empty.
    ReadRestrict,
    /// An open paren at level `lev` is only valid while every stack at
    /// a lower level is empty.
    WriteRestrict,
    /// No cross-level restriction.
    NoRestrict,
}

type Config = Vec<StackId>;

/// Hash-consed bijection between `nlevels`-tuples of per-level stack
/// configurations and a single external [`StackId`].
pub struct MPdtStack {
    nlevels: usize,
    restrict: MPdtRestrict,
    parens: Vec<(Label, Label)>,
    /// Paren label (open or close) -> its level.
    paren_levels: FxHashMap<Label, usize>,
    /// Paren label (open or close) -> its index into `parens`.
    paren_map: FxHashMap<Label, usize>,
    /// `(level, within-level paren index) -> external paren index`, the
    /// inverse of how `parens` was partitioned into per-level stacks.
    paren_id_map: FxHashMap<(usize, usize), usize>,
    stacks: Vec<PdtStack>,
    config_to_stack_id: FxHashMap<Config, StackId>,
    stack_id_to_config: FxHashMap<StackId, Config>,
    next_stack_id: StackId,
    min_paren: Option<Label>,
    max_paren: Option<Label>,
}

impl MPdtStack {
    /// `parens[i]` is assigned to level `assignments[i]` (0-based).
    /// Returns `None` if the two slices differ in length or an
    /// assignment names a level `>= nlevels`.
    pub fn new(
        parens: Vec<(Label, Label)>,
        assignments: &[usize],
        nlevels: usize,
        restrict: MPdtRestrict,
    ) -> Option<Self> {
        if parens.len() != assignments.len() {
            return None;
        }
        if assignments.iter().any(|&lev| lev >= nlevels) {
            return None;
        }

        let mut per_level_parens: Vec<Vec<(Label, Label)>> = vec![Vec::new(); nlevels];
        let mut paren_levels = FxHashMap::default();
        let mut paren_map = FxHashMap::default();
        let mut paren_id_map = FxHashMap::default();
        let mut min_paren = None;
        let mut max_paren = None;

        for (i, &(open, close)) in parens.iter().enumerate() {
            let lev = assignments[i];
            per_level_parens[lev].push((open, close));
            paren_levels.insert(open, lev);
            paren_levels.insert(close, lev);
            paren_map.insert(open, i);
            paren_map.insert(close, i);
            paren_id_map.insert((lev, per_level_parens[lev].len() - 1), i);
            for &label in &[open, close] {
                min_paren = Some(min_paren.map_or(label, |m: Label| m.min(label)));
                max_paren = Some(max_paren.map_or(label, |m: Label| m.max(label)));
            }
        }

        let stacks = per_level_parens.into_iter().map(PdtStack::new).collect();

        let mut config_to_stack_id = FxHashMap::default();
        let mut stack_id_to_config = FxHashMap::default();
        let neg_one: Config = vec![NO_STACK_ID; nlevels];
        let zero: Config = vec![0; nlevels];
        config_to_stack_id.insert(neg_one.clone(), NO_STACK_ID);
        config_to_stack_id.insert(zero.clone(), 0);
        stack_id_to_config.insert(NO_STACK_ID, neg_one);
        stack_id_to_config.insert(0, zero);

        Some(MPdtStack {
            nlevels,
            restrict,
            parens,
            paren_levels,
            paren_map,
            paren_id_map,
            stacks,
            config_to_stack_id,
            stack_id_to_config,
            next_stack_id: 1,
            min_paren,
            max_paren,
        })
    }

    fn is_empty_at(config: &[StackId], lev: usize) -> bool {
        config[lev] <= 0
    }

    fn external_stack_id(&mut self, config: Config) -> StackId {
        if let Some(&id) = self.config_to_stack_id.get(&config) {
            return id;
        }
        let id = self.next_stack_id;
        self.next_stack_id += 1;
        self.stack_id_to_config.insert(id, config.clone());
        self.config_to_stack_id.insert(config, id);
        id
    }

    fn internal_config(&self, stack_id: StackId) -> Config {
        self.stack_id_to_config
            .get(&stack_id)
            .or_else(|| self.stack_id_to_config.get(&NO_STACK_ID))
            .cloned()
            .unwrap_or_else(|| vec![NO_STACK_ID; self.nlevels])
    }

    /// Applies `label`'s effect to `stack_id`, honoring this stack's
    /// [`MPdtRestrict`] policy. Returns [`NO_STACK_ID`] if the
    /// transition is invalid: an unmatched close paren, or one that
    /// violates the cross-level restriction.
    pub fn find(&mut self, stack_id: StackId, label: Label) -> StackId {
        match (self.min_paren, self.max_paren) {
            (Some(min), Some(max)) if label >= min && label <= max => {}
            _ => return stack_id,
        }
        let Some(&paren_id) = self.paren_map.get(&label) else {
            return stack_id;
        };
        let config = self.internal_config(stack_id);
        let lev = self.paren_levels[&label];
        let (open, _close) = self.parens[paren_id];

        if label == open {
            if self.restrict == MPdtRestrict::WriteRestrict
                && (0..lev).any(|i| !Self::is_empty_at(&config, i))
            {
                return NO_STACK_ID;
            }
        } else if self.restrict == MPdtRestrict::ReadRestrict
            && (0..lev).any(|i| !Self::is_empty_at(&config, i))
        {
            return NO_STACK_ID;
        }

        let nid = self.stacks[lev].find(config[lev], label);
        if nid == NO_STACK_ID {
            return NO_STACK_ID;
        }
        let mut nconfig = config;
        nconfig[lev] = nid;
        self.external_stack_id(nconfig)
    }

    /// The external paren index at the top of the first non-empty
    /// level's stack, or `None` if every level is empty or `stack_id`
    /// is [`NO_STACK_ID`].
    pub fn top(&self, stack_id: StackId) -> Option<usize> {
        if stack_id == NO_STACK_ID {
            return None;
        }
        let config = self.internal_config(stack_id);
        for lev in 0..self.nlevels {
            if !Self::is_empty_at(&config, lev) {
                let underlying_id = self.stacks[lev].top(config[lev])?;
                return self.paren_id_map.get(&(lev, underlying_id)).copied();
            }
        }
        None
    }

    pub fn paren_id(&self, label: Label) -> Option<usize> {
        self.paren_map.get(&label).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_levels_push_and_pop_separately() {
        let mut mstack =
            MPdtStack::new(vec![(1, 2), (3, 4)], &[0, 1], 2, MPdtRestrict::NoRestrict).unwrap();
        let after_open0 = mstack.find(0, 1);
        let after_open1 = mstack.find(after_open0, 3);
        assert_ne!(after_open1, after_open0);
        let after_close1 = mstack.find(after_open1, 4);
        assert_eq!(after_close1, after_open0);
        let after_close0 = mstack.find(after_close1, 2);
        assert_eq!(after_close0, 0);
    }

    #[test]
    fn read_restrict_blocks_popping_a_higher_level_while_lower_is_open() {
        let mut mstack =
            MPdtStack::new(vec![(1, 2), (3, 4)], &[0, 1], 2, MPdtRestrict::ReadRestrict).unwrap();
        let after_open0 = mstack.find(0, 1);
        // Level 1 has never been opened, so popping it (close paren 4)
        // while level 0 is still open should be rejected.
        assert_eq!(mstack.find(after_open0, 4), NO_STACK_ID);
    }

    #[test]
    fn write_restrict_blocks_opening_a_higher_level_while_lower_is_open() {
        let mut mstack =
            MPdtStack::new(vec![(1, 2), (3, 4)], &[0, 1], 2, MPdtRestrict::WriteRestrict).unwrap();
        let after_open0 = mstack.find(0, 1);
        assert_eq!(mstack.find(after_open0, 3), NO_STACK_ID);
    }

    #[test]
    fn mismatched_level_count_is_rejected() {
        assert!(MPdtStack::new(vec![(1, 2)], &[0, 1], 2, MPdtRestrict::NoRestrict).is_none());
    }
}
