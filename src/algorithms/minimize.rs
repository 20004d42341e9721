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

//! Minimization (spec §4.5): merges states with identical future
//! behavior. Transducers are first folded into an acceptor over
//! [`GallicWeight`] (each arc's output label rides along inside the
//! weight), minimized as an acceptor, then unfolded back into
//! `(ilabel, olabel, weight)` arcs — the same encode/minimize/decode
//! pipeline `original_source/src/include/fst/minimize.h` uses Gallic
//! weights for.
//!
//! [`minimize`] runs [`connect`](crate::algorithms::connect::connect)
//! first to drop dead weight, then pushes weight toward the initial
//! state (`push_weights_to_initial`) before quantizing and splitting, so
//! two states that differ only in *where* along a shared suffix their
//! weight sits still land in the same class — without this, minimize
//! would only ever merge states whose weights already happened to match
//! exactly. Acceptor splitting then dispatches on shape: deterministic,
//! acyclic input gets [`refine_revuz`], an exact one-pass bottom-up
//! signature assignment in reverse topological order (Revuz's
//! algorithm); anything else falls back to [`refine`], a fixed-point
//! worklist that keeps resplitting classes by one-step signature until
//! stable (correct for cyclic/nondeterministic input, just not
//! Hopcroft's O(n log n) bound). `minimize` itself refuses
//! nondeterministic input over a non-idempotent semiring, since the
//! partition-refinement equivalence this algorithm computes is only
//! sound for deterministic automata once weights stop being
//! idempotently comparable — `minimize_with_options` lets a caller
//! opt out of that guard.

use rustc_hash::FxHashMap;

use crate::algorithms::connect::connect;
use crate::arc::Arc;
use crate::containers::Partition;
use crate::error::{Result, WfstError};
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::{Label, StateId, EPS_LABEL};
use crate::semiring::{DivideType, GallicWeight, SemiringProperties, Weight};
use crate::vector_fst::VectorFst;

fn is_acceptor<F, W>(fst: &F) -> bool
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    fst.states_iter().all(|s| {
        fst.arcs_iter(s)
            .map(|mut it| it.all(|a| a.ilabel == a.olabel))
            .unwrap_or(false)
    })
}

/// At most one outgoing arc per input label at every state (the
/// determinism spec §4.5 requires for the exact, one-pass Revuz path).
fn is_deterministic<F, W>(fst: &F) -> bool
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    fst.states_iter().all(|s| {
        fst.arcs_iter(s)
            .map(|mut it| {
                let mut seen = std::collections::HashSet::new();
                it.all(|a| seen.insert(a.ilabel))
            })
            .unwrap_or(true)
    })
}

fn is_acyclic<F, W>(fst: &F) -> bool
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn visit<F, W>(fst: &F, s: StateId, color: &mut [Color]) -> bool
    where
        F: Fst<W = W> + ExpandedFst,
        W: Weight,
    {
        color[s as usize] = Color::Gray;
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                match color[arc.nextstate as usize] {
                    Color::Gray => return false,
                    Color::White => {
                        if !visit(fst, arc.nextstate, color) {
                            return false;
                        }
                    }
                    Color::Black => {}
                }
            }
        }
        color[s as usize] = Color::Black;
        true
    }

    let mut color = vec![Color::White; fst.num_states()];
    for s in fst.states_iter() {
        if color[s as usize] == Color::White && !visit(fst, s, &mut color) {
            return false;
        }
    }
    true
}

/// A topological order of `fst`'s states (edge `s -> t` implies `s`
/// appears before `t`); only meaningful when `fst` is acyclic.
fn topological_order<F, W>(fst: &F) -> Vec<StateId>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    fn visit<F, W>(fst: &F, s: StateId, visited: &mut [bool], order: &mut Vec<StateId>)
    where
        F: Fst<W = W> + ExpandedFst,
        W: Weight,
    {
        visited[s as usize] = true;
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                if !visited[arc.nextstate as usize] {
                    visit(fst, arc.nextstate, visited, order);
                }
            }
        }
        order.push(s);
    }

    let mut visited = vec![false; fst.num_states()];
    let mut order = Vec::with_capacity(fst.num_states());
    for s in fst.states_iter() {
        if !visited[s as usize] {
            visit(fst, s, &mut visited, &mut order);
        }
    }
    order.reverse();
    order
}

/// Pushes weight toward the initial state (spec §4.5's pre-pass before
/// quantize/split): computes, for each state, the shortest distance `d`
/// to any final state via backward relaxation, then reweights every arc
/// `p -> t` as `d[p]^-1 * w * d[t]` and every final weight `f(p)` as
/// `d[p]^-1 * f(p)`. Grounded on
/// `original_source/src/include/fst/push.h`'s potential-based
/// reweighting (`REWEIGHT_TO_INITIAL`).
fn push_weights_to_initial<F, W>(fst: &F, delta: f64) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let n = fst.num_states();
    let mut preds: Vec<Vec<(StateId, Arc<W>)>> = vec![Vec::new(); n];
    for s in fst.states_iter() {
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                preds[arc.nextstate as usize].push((s, arc));
            }
        }
    }

    let mut d = vec![W::zero(); n];
    let mut r = vec![W::zero(); n];
    let mut queue: std::collections::VecDeque<StateId> = std::collections::VecDeque::new();
    for s in fst.states_iter() {
        if let Some(fw) = fst.final_weight(s) {
            d[s as usize] = fw.clone();
            r[s as usize] = fw;
            queue.push_back(s);
        }
    }
    while let Some(t) = queue.pop_front() {
        let rt = std::mem::replace(&mut r[t as usize], W::zero());
        for (p, arc) in &preds[t as usize] {
            let idx = *p as usize;
            let candidate = arc.weight.times(&rt);
            let updated = d[idx].plus(&candidate);
            if !updated.approx_equal(&d[idx], delta) {
                d[idx] = updated;
                r[idx] = r[idx].plus(&candidate);
                queue.push_back(*p);
            }
        }
    }

    let mut out: VectorFst<W> = VectorFst::new();
    for _ in 0..n {
        out.add_state();
    }
    if let Some(start) = fst.start() {
        out.set_start(start);
    }
    for s in fst.states_iter() {
        let ds = &d[s as usize];
        if let Some(fw) = fst.final_weight(s) {
            let final_weight = if *ds == W::zero() { fw } else { fw.divide(ds, DivideType::Any) };
            out.set_final(s, final_weight);
        }
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                let dt = &d[arc.nextstate as usize];
                let mut w = arc.weight.times(dt);
                if *ds != W::zero() {
                    w = w.divide(ds, DivideType::Any);
                }
                out.add_arc(s, Arc::new(arc.ilabel, arc.olabel, w, arc.nextstate));
            }
        }
    }
    out
}

/// Signature refinement for general (possibly cyclic or
/// nondeterministic) input: repeatedly splits every class by `(is_final,
/// final weight signature, sorted (ilabel, weight signature, nextstate
/// class) multiset)` until a full pass produces no further split.
fn refine<F, W>(fst: &F, delta: f64) -> Partition
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let initial: Vec<Option<u64>> = fst
        .states_iter()
        .map(|s| fst.final_weight(s).map(|w| w.quantize(delta).hash_value()))
        .collect();
    let mut remap: FxHashMap<Option<u64>, usize> = FxHashMap::default();
    let dense: Vec<usize> = initial
        .into_iter()
        .map(|k| {
            let next = remap.len();
            *remap.entry(k).or_insert(next)
        })
        .collect();
    let mut partition = Partition::from_initial_classes(dense);

    loop {
        let mut changed = false;
        for class in 0..partition.num_classes() {
            if partition.members(class).len() <= 1 {
                continue;
            }
            let arcs_by_state: FxHashMap<StateId, Vec<(Label, u64, usize)>> = partition
                .members(class)
                .iter()
                .map(|&s| {
                    let mut sig: Vec<(Label, u64, usize)> = fst
                        .arcs_iter(s)
                        .map(|it| {
                            it.map(|a| {
                                (
                                    a.ilabel,
                                    a.weight.quantize(delta).hash_value(),
                                    partition.class_of(a.nextstate),
                                )
                            })
                            .collect()
                        })
                        .unwrap_or_default();
                    sig.sort_unstable();
                    (s, sig)
                })
                .collect();
            let new_classes = partition.split_by(class, |s| arcs_by_state[&s].clone());
            if !new_classes.is_empty() {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    partition
}

/// Revuz's algorithm: for deterministic, acyclic input, one pass in
/// reverse topological order assigns each state a signature keyed by
/// `(final weight, sorted (ilabel, weight, successor class))` —
/// successors are always already classified by the time a state is
/// visited, so (unlike [`refine`]) no fixed point is needed.
fn refine_revuz<F, W>(fst: &F, delta: f64) -> Partition
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let topo = topological_order(fst);
    let n = fst.num_states();
    let mut class_of: Vec<Option<usize>> = vec![None; n];
    let mut signature_to_class: FxHashMap<(Option<u64>, Vec<(Label, u64, usize)>), usize> =
        FxHashMap::default();

    for &s in topo.iter().rev() {
        let final_sig = fst.final_weight(s).map(|w| w.quantize(delta).hash_value());
        let mut arc_sig: Vec<(Label, u64, usize)> = fst
            .arcs_iter(s)
            .map(|it| {
                it.map(|a| {
                    let c = class_of[a.nextstate as usize]
                        .expect("successor already classified in reverse topological order");
                    (a.ilabel, a.weight.quantize(delta).hash_value(), c)
                })
                .collect()
            })
            .unwrap_or_default();
        arc_sig.sort_unstable();

        let key = (final_sig, arc_sig);
        let next_id = signature_to_class.len();
        let class = *signature_to_class.entry(key).or_insert(next_id);
        class_of[s as usize] = Some(class);
    }

    let dense: Vec<usize> = (0..n).map(|s| class_of[s as usize].unwrap()).collect();
    Partition::from_initial_classes(dense)
}

fn build_from_partition<F, W>(fst: &F, partition: &Partition) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let mut out: VectorFst<W> = VectorFst::new();
    for _ in 0..partition.num_classes() {
        out.add_state();
    }
    if let Some(start) = fst.start() {
        out.set_start(partition.class_of(start) as StateId);
    }
    let mut done = vec![false; partition.num_classes()];
    for s in fst.states_iter() {
        let class = partition.class_of(s);
        if done[class] {
            continue;
        }
        done[class] = true;
        if let Some(w) = fst.final_weight(s) {
            out.set_final(class as StateId, w);
        }
        if let Ok(arcs) = fst.arcs_iter(s) {
            let mut seen: Vec<(Label, Label, StateId)> = Vec::new();
            for arc in arcs {
                let dst = partition.class_of(arc.nextstate) as StateId;
                let key = (arc.ilabel, arc.olabel, dst);
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key);
                out.add_arc(class as StateId, Arc::new(arc.ilabel, arc.olabel, arc.weight, dst));
            }
        }
    }
    out
}

fn minimize_acceptor<F, W>(fst: &F, delta: f64) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let partition = if is_deterministic(fst) && is_acyclic(fst) {
        refine_revuz(fst, delta)
    } else {
        refine(fst, delta)
    };
    build_from_partition(fst, &partition)
}

fn minimize_transducer<F, W>(fst: &F, delta: f64) -> VectorFst<W>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    let mut gallic: VectorFst<GallicWeight<W>> = VectorFst::new();
    for _ in 0..fst.num_states() {
        gallic.add_state();
    }
    if let Some(start) = fst.start() {
        gallic.set_start(start);
    }
    for s in fst.states_iter() {
        if let Some(fw) = fst.final_weight(s) {
            gallic.set_final(s, GallicWeight::new(Vec::new(), fw));
        }
        if let Ok(arcs) = fst.arcs_iter(s) {
            for arc in arcs {
                let gw = GallicWeight::new(vec![arc.olabel], arc.weight);
                gallic.add_arc(s, Arc::new(arc.ilabel, arc.ilabel, gw, arc.nextstate));
            }
        }
    }

    let min_gallic = minimize_acceptor(&gallic, delta);

    let mut out: VectorFst<W> = VectorFst::new();
    for _ in 0..min_gallic.num_states() {
        out.add_state();
    }
    if let Some(start) = min_gallic.start() {
        out.set_start(start);
    }
    for s in min_gallic.states_iter() {
        if let Some(gw) = min_gallic.final_weight(s) {
            out.set_final(s, gw.weight().clone());
        }
        if let Ok(arcs) = min_gallic.arcs_iter(s) {
            for arc in arcs {
                let olabel = arc
                    .weight
                    .output_labels()
                    .and_then(|v| v.first().copied())
                    .unwrap_or(EPS_LABEL);
                out.add_arc(
                    s,
                    Arc::new(arc.ilabel, olabel, arc.weight.weight().clone(), arc.nextstate),
                );
            }
        }
    }
    out
}

/// Options governing [`minimize_with_options`]'s determinism guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimizeOptions {
    /// Run the refinement anyway even if `fst` is nondeterministic over
    /// a non-idempotent semiring, where the resulting partition is not
    /// guaranteed to be the coarsest congruence.
    pub allow_nondeterministic: bool,
}

/// Minimizes `fst`: runs [`connect`] to drop dead states, pushes weight
/// toward the initial state, then merges states with identical future
/// behavior (transducers via the Gallic-weight encode/decode pipeline,
/// acceptors directly). Returns [`WfstError::SemiringViolation`] if
/// `fst` is nondeterministic over a non-idempotent semiring, unless
/// `options.allow_nondeterministic` is set.
pub fn minimize_with_options<F, W>(fst: &F, delta: f64, options: &MinimizeOptions) -> Result<VectorFst<W>>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    if !options.allow_nondeterministic
        && !is_deterministic(fst)
        && !W::PROPERTIES.contains(SemiringProperties::IDEMPOTENT)
    {
        return Err(WfstError::SemiringViolation(format!(
            "minimize requires deterministic input over a non-idempotent semiring ({}); \
             pass MinimizeOptions{{allow_nondeterministic: true}} to override",
            W::type_name()
        )));
    }

    let connected = connect(fst);
    let pushed = push_weights_to_initial(&connected, delta);

    Ok(if is_acceptor(&pushed) {
        minimize_acceptor(&pushed, delta)
    } else {
        minimize_transducer(&pushed, delta)
    })
}

/// [`minimize_with_options`] with the determinism guard enforced.
pub fn minimize<F, W>(fst: &F, delta: f64) -> Result<VectorFst<W>>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
{
    minimize_with_options(fst, delta, &MinimizeOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    /// Two states that both accept `a` to a shared final state should
    /// collapse into one after minimization.
    fn redundant_acceptor() -> VectorFst<TropicalWeight> {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let s2 = v.add_state();
        let s3 = v.add_state();
        v.set_start(s0);
        v.set_final(s2, TropicalWeight::one());
        v.set_final(s3, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        v.add_arc(s1, Arc::new(2, 2, TropicalWeight::one(), s2));
        v.add_arc(s1, Arc::new(2, 2, TropicalWeight::one(), s3));
        v
    }

    #[test]
    fn merges_equivalent_final_states() {
        let v = redundant_acceptor();
        let min = minimize(&v, 1e-6).unwrap();
        assert_eq!(min.num_states(), 3);
    }

    #[test]
    fn transducer_path_preserves_output_labels() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 9, TropicalWeight::new(2.0), s1));

        let min = minimize(&v, 1e-6).unwrap();
        let arcs: Vec<_> = min.arcs_iter(min.start().unwrap()).unwrap().collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].olabel, 9);
        assert_eq!(arcs[0].weight, TropicalWeight::new(2.0));
    }

    #[test]
    fn drops_dead_states_via_connect_before_splitting() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        let dead = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::one(), s1));
        v.add_arc(s0, Arc::new(2, 2, TropicalWeight::one(), dead));

        let min = minimize(&v, 1e-6).unwrap();
        assert_eq!(min.num_states(), 2);
    }

    #[test]
    fn pushes_weight_so_differently_placed_equal_total_weights_merge() {
        // Two paths to the same final state carry the same total weight
        // (3.0) split differently between the arc and the final weight;
        // after pushing toward the initial state both branches should
        // look identical and collapse.
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let a = v.add_state();
        let b = v.add_state();
        let sink = v.add_state();
        v.set_start(s0);
        v.set_final(sink, TropicalWeight::one());
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(1.0), a));
        v.add_arc(s0, Arc::new(1, 1, TropicalWeight::new(2.0), b));
        v.add_arc(a, Arc::new(2, 2, TropicalWeight::new(2.0), sink));
        v.add_arc(b, Arc::new(2, 2, TropicalWeight::new(1.0), sink));

        let min = minimize(&v, 1e-6).unwrap();
        assert_eq!(min.num_states(), 3);
    }

    #[test]
    fn revuz_and_general_paths_agree_on_a_deterministic_acyclic_acceptor() {
        let v = redundant_acceptor();
        assert!(is_deterministic(&v));
        assert!(is_acyclic(&v));
        let via_revuz = refine_revuz(&v, 1e-6);
        let via_general = refine(&v, 1e-6);
        assert_eq!(via_revuz.num_classes(), via_general.num_classes());
    }

    #[test]
    fn rejects_nondeterministic_input_over_a_non_idempotent_semiring_by_default() {
        use crate::semiring::LogWeight;

        let mut v: VectorFst<LogWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, LogWeight::one());
        v.add_arc(s0, Arc::new(1, 1, LogWeight::new(1.0), s1));
        v.add_arc(s0, Arc::new(1, 1, LogWeight::new(2.0), s1));

        assert!(minimize(&v, 1e-6).is_err());
        let options = MinimizeOptions { allow_nondeterministic: true };
        assert!(minimize_with_options(&v, 1e-6, &options).is_ok());
    }
}
