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

//! End-to-end coverage that exercises the public surface the way a
//! caller would: parse text, run an algorithm, check the result, rather
//! than poking at each module's internals.

use wfst::algorithms::accumulator::{Accumulator, DefaultAccumulator};
use wfst::algorithms::equal::equal;
use wfst::algorithms::equivalent::equivalent;
use wfst::algorithms::intersect::intersect;
use wfst::algorithms::minimize::minimize;
use wfst::algorithms::prune::prune;
use wfst::algorithms::rational::{closure, concat, union, ClosureType};
use wfst::algorithms::relabel::relabel;
use wfst::algorithms::shortest_distance::total_weight;
use wfst::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use wfst::io::att;
use wfst::pdt;
use wfst::queues::FifoQueue;
use wfst::semiring::TropicalWeight;
use wfst::vector_fst::VectorFst;
use wfst::{Arc, Weight};

fn parse(text: &str) -> VectorFst<TropicalWeight> {
    att::read(text, None, None).expect("valid AT&T text")
}

#[test]
fn text_round_trip_preserves_the_accepting_path() {
    let text = "0\t1\ta\ta\t1.5\n1\t2\tb\tb\n2\t2.0\n";
    let fst = parse(text);
    assert_eq!(fst.num_states(), 3);

    let mut buf = Vec::new();
    att::write(&fst, None, None, &mut buf).unwrap();
    let round_tripped = parse(&String::from_utf8(buf).unwrap());
    assert!(equal(&fst, &round_tripped, 1e-6));
}

#[test]
fn minimizing_an_acceptor_merges_equivalent_dead_ends() {
    // Two branches that both end in an equivalent (non-final, no
    // outgoing arcs) dead state should collapse to one.
    let mut v: VectorFst<TropicalWeight> = VectorFst::new();
    let s0 = v.add_state();
    let a = v.add_state();
    let b = v.add_state();
    let dead_a = v.add_state();
    let dead_b = v.add_state();
    v.set_start(s0);
    v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), a));
    v.add_arc(s0, Arc::new(2, 2, TropicalWeight::one(), b));
    v.add_arc(a, Arc::new(9, 9, TropicalWeight::one(), dead_a));
    v.add_arc(b, Arc::new(9, 9, TropicalWeight::one(), dead_b));

    let min = minimize(&v, 1e-6).unwrap();
    assert!(min.num_states() < v.num_states());
    assert!(equivalent(&v, &min, 1e-6));
}

#[test]
fn union_of_two_acceptors_accepts_both_original_languages() {
    let mut a = parse("0\t1\tx\tx\n1\n");
    let b = parse("0\t1\ty\ty\n1\n");
    union(&mut a, &b);

    let x_only = parse("0\t1\tx\tx\n1\n");
    let y_only = parse("0\t1\ty\ty\n1\n");
    let accepts_x = intersect(&a, &x_only).unwrap();
    let accepts_y = intersect(&a, &y_only).unwrap();
    assert!(accepts_x.states_iter().any(|s| accepts_x.is_final(s)));
    assert!(accepts_y.states_iter().any(|s| accepts_y.is_final(s)));
}

#[test]
fn concat_chains_two_languages_end_to_end() {
    let mut first = parse("0\t1\ta\ta\n1\n");
    let second = parse("0\t1\tb\tb\n1\n");
    concat(&mut first, &second);

    let expected = parse("0\t1\ta\ta\n1\t2\tb\tb\n2\n");
    assert!(equivalent(&first, &expected, 1e-6));
}

#[test]
fn closure_star_accepts_the_empty_string_and_repetition() {
    let mut v = parse("0\t1\ta\ta\n1\n");
    closure(&mut v, ClosureType::Star);
    assert!(v.states_iter().any(|s| v.is_final(s) && Some(s) == v.start()));
}

#[test]
fn intersect_rejects_strings_not_common_to_both_acceptors() {
    let a = parse("0\t1\tx\tx\n1\t2\ty\ty\n2\n");
    let b = parse("0\t1\tx\tx\n1\t2\tz\tz\n2\n");
    let both = intersect(&a, &b).unwrap();
    assert!(both.states_iter().all(|s| !both.is_final(s)));
}

#[test]
fn prune_drops_the_costlier_branch() {
    let mut v: VectorFst<TropicalWeight> = VectorFst::new();
    let s0 = v.add_state();
    let cheap = v.add_state();
    let pricey = v.add_state();
    v.set_start(s0);
    v.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(1.0), cheap));
    v.add_arc(s0, Arc::new(2, 2, TropicalWeight::new(100.0), pricey));
    v.set_final(cheap, TropicalWeight::one());
    v.set_final(pricey, TropicalWeight::one());

    let pruned = prune(&v, &TropicalWeight::new(10.0), None, 1e-6);
    assert!(pruned.is_final(cheap) || pruned.num_states() < v.num_states());
    // the expensive branch's destination must not survive
    let survived_high_cost = pruned
        .states_iter()
        .filter_map(|s| pruned.arcs_iter(s).ok())
        .flatten()
        .any(|a| a.ilabel == 2);
    assert!(!survived_high_cost);
}

#[test]
fn relabel_then_equal_to_a_hand_written_target() {
    let mut v = parse("0\t1\t1\t1\n1\n");
    relabel(&mut v, &[(1, 42)], &[(1, 42)]).unwrap();
    let target = parse("0\t1\t42\t42\n1\n");
    assert!(equal(&v, &target, 1e-6));
}

#[test]
fn shortest_distance_matches_shortest_path_weight() {
    let v = parse("0\t1\ta\ta\t2.0\n0\t2\tb\tb\t1.0\n1\t2\tc\tc\t1.0\n2\n");
    let total = total_weight(&v, FifoQueue::default(), 1e-6);
    let (best, _) = pdt::shortest_path::shortest_path(&v, vec![], 1e-6).unwrap();
    assert_eq!(total, best);
    assert_eq!(best, TropicalWeight::new(1.0));
}

#[test]
fn accumulator_sum_matches_a_manual_fold() {
    let v = parse("0\t1\ta\ta\t1.0\n1\t2\tb\tb\t2.0\n2\t3\tc\tc\t3.0\n3\n");
    let arcs: Vec<_> = v.arcs_iter(v.start().unwrap()).unwrap().collect();
    let acc = DefaultAccumulator;
    let got = acc.sum_range(&TropicalWeight::one(), &arcs, 0, arcs.len());
    assert_eq!(got, TropicalWeight::new(1.0));
}

#[test]
fn pdt_stack_round_trips_a_balanced_nesting() {
    let mut stack = pdt::stack::PdtStack::new(vec![(10, 11), (20, 21)]);
    let s1 = stack.find(0, 10);
    let s2 = stack.find(s1, 20);
    let s3 = stack.find(s2, 21);
    assert_eq!(s3, s1);
    let s4 = stack.find(s3, 11);
    assert_eq!(s4, 0);
}

#[test]
fn pdt_expand_turns_a_balanced_pdt_into_an_ordinary_recognizable_fst() {
    // 0 --(10 open)--> 1 --a--> 2 --(11 close)--> 3, final at 3. The
    // parens nest around the "a" transition and must balance for the
    // expanded FST to accept.
    let mut v: VectorFst<TropicalWeight> = VectorFst::new();
    let s0 = v.add_state();
    let s1 = v.add_state();
    let s2 = v.add_state();
    let s3 = v.add_state();
    v.set_start(s0);
    v.set_final(s3, TropicalWeight::one());
    v.add_arc(s0, Arc::new(10, 10, TropicalWeight::one(), s1));
    v.add_arc(s1, Arc::new(1, 1, TropicalWeight::new(2.0), s2));
    v.add_arc(s2, Arc::new(11, 11, TropicalWeight::one(), s3));

    let expanded = pdt::expand::pdt_expand(&v, vec![(10, 11)], pdt::expand::ParenLabels::default());
    assert!(expanded.states_iter().any(|s| expanded.is_final(s)));
    let total = total_weight(&expanded, FifoQueue::default(), 1e-6);
    assert_eq!(total, TropicalWeight::new(2.0));

    // The parens are erased, so the expanded FST accepts the bare "a".
    let target = parse("0\t1\t1\t1\t2.0\n1\n");
    assert!(equivalent(&expanded, &target, 1e-6));
}

#[test]
fn pdt_shortest_path_requires_a_balanced_stack() {
    let mut v: VectorFst<TropicalWeight> = VectorFst::new();
    let s0 = v.add_state();
    let s1 = v.add_state();
    v.set_start(s0);
    v.set_final(s1, TropicalWeight::one());
    v.add_arc(s0, Arc::new(10, 10, TropicalWeight::one(), s1));
    assert!(pdt::shortest_path::shortest_path(&v, vec![(10, 11)], 1e-6).is_none());
}
