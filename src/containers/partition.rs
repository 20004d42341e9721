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

//! A refinable partition of state ids into numbered classes (grounded on
//! OpenFst's `partition.h`), the core data structure Hopcroft's and
//! Revuz's minimize algorithms (spec §4.5) repeatedly split until no
//! further split changes behavior.

use crate::label::StateId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct Partition {
    class_of: Vec<usize>,
    members: Vec<Vec<StateId>>,
}

impl Partition {
    /// Starts with every state in a single class `0`.
    pub fn singleton(num_states: usize) -> Self {
        Partition {
            class_of: vec![0; num_states],
            members: vec![(0..num_states as StateId).collect()],
        }
    }

    /// Starts with states distributed across classes per `initial`
    /// (e.g. final vs. non-final, as Hopcroft's algorithm requires).
    pub fn from_initial_classes(class_of: Vec<usize>) -> Self {
        let num_classes = class_of.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        let mut members = vec![Vec::new(); num_classes];
        for (state, &class) in class_of.iter().enumerate() {
            members[class].push(state as StateId);
        }
        Partition { class_of, members }
    }

    pub fn num_classes(&self) -> usize {
        self.members.len()
    }

    pub fn class_of(&self, state: StateId) -> usize {
        self.class_of[state as usize]
    }

    pub fn members(&self, class: usize) -> &[StateId] {
        &self.members[class]
    }

    /// Splits `class` into sub-groups according to `key(state)`; the
    /// first distinct key seen keeps the original class id, every
    /// subsequent distinct key gets a freshly appended class id. Returns
    /// the new class ids created (empty if the class didn't split).
    pub fn split_by<K, F>(&mut self, class: usize, mut key: F) -> Vec<usize>
    where
        K: Eq + std::hash::Hash,
        F: FnMut(StateId) -> K,
    {
        let members = std::mem::take(&mut self.members[class]);
        let mut groups: FxHashMap<K, Vec<StateId>> = FxHashMap::default();
        for &state in &members {
            groups.entry(key(state)).or_default().push(state);
        }
        if groups.len() <= 1 {
            self.members[class] = members;
            return Vec::new();
        }
        let mut new_classes = Vec::new();
        let mut first = true;
        for (_, states) in groups {
            if first {
                for &s in &states {
                    self.class_of[s as usize] = class;
                }
                self.members[class] = states;
                first = false;
            } else {
                let new_class = self.members.len();
                for &s in &states {
                    self.class_of[s as usize] = new_class;
                }
                self.members.push(states);
                new_classes.push(new_class);
            }
        }
        new_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_starts_with_one_class() {
        let p = Partition::singleton(4);
        assert_eq!(p.num_classes(), 1);
        assert_eq!(p.members(0).len(), 4);
    }

    #[test]
    fn split_by_separates_distinct_keys() {
        let mut p = Partition::singleton(4);
        let new_classes = p.split_by(0, |s| s % 2);
        assert_eq!(new_classes.len(), 1);
        assert_eq!(p.num_classes(), 2);
        assert_eq!(p.class_of(0), p.class_of(2));
        assert_ne!(p.class_of(0), p.class_of(1));
    }

    #[test]
    fn split_by_is_noop_when_all_keys_equal() {
        let mut p = Partition::singleton(3);
        let new_classes = p.split_by(0, |_| 0);
        assert!(new_classes.is_empty());
        assert_eq!(p.num_classes(), 1);
    }
}
