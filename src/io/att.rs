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

//! The AT&T FSM text format (spec §6): one line per arc —
//! `src\tdst\tilabel\tolabel[\tweight]` — plus trailing lines of
//! `state[\tweight]` for final states. Symbols are resolved through a
//! [`SymbolTable`] when present, otherwise labels are read/written as
//! bare integers. Grounded on `original_source/fst/bin/text-io.h`
//! (`WriteFstTextInternal`/`ReadFstTextInternal`) for the column order
//! and "first line's source state is the start state" convention.

use std::fmt::Write as _;
use std::io::Write;

use crate::error::{Result, WfstError};
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::{Label, StateId};
use crate::semiring::Weight;
use crate::symbol_table::SymbolTable;
use crate::vector_fst::VectorFst;

/// Writes `fst` in AT&T format. If `isyms`/`osyms` are given, labels are
/// printed as symbols; otherwise as bare integers.
pub fn write<F, W, Wr>(
    fst: &F,
    isyms: Option<&SymbolTable>,
    osyms: Option<&SymbolTable>,
    writer: &mut Wr,
) -> Result<()>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
    Wr: Write,
{
    let label_str = |table: Option<&SymbolTable>, label: Label| -> String {
        match table.and_then(|t| t.find_symbol(label)) {
            Some(s) => s.to_string(),
            None => label.to_string(),
        }
    };

    let mut out = String::new();
    if let Some(start) = fst.start() {
        // AT&T format implies the start state is whichever source state
        // appears first; emit it first explicitly by visiting it before
        // any other state.
        emit_state_arcs(fst, start, isyms, osyms, &label_str, &mut out)?;
        for s in fst.states_iter() {
            if s != start {
                emit_state_arcs(fst, s, isyms, osyms, &label_str, &mut out)?;
            }
        }
    }
    for s in fst.states_iter() {
        if let Some(w) = fst.final_weight(s) {
            if w == W::one() {
                let _ = writeln!(out, "{}", s);
            } else {
                let _ = writeln!(out, "{}\t{}", s, w);
            }
        }
    }
    writer.write_all(out.as_bytes())?;
    Ok(())
}

fn emit_state_arcs<F, W>(
    fst: &F,
    state: StateId,
    isyms: Option<&SymbolTable>,
    osyms: Option<&SymbolTable>,
    label_str: &impl Fn(Option<&SymbolTable>, Label) -> String,
    out: &mut String,
) -> Result<()>
where
    F: Fst<W = W>,
    W: Weight,
{
    for arc in fst.arcs_iter(state)? {
        if arc.weight == W::one() {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}",
                state,
                arc.nextstate,
                label_str(isyms, arc.ilabel),
                label_str(osyms, arc.olabel),
            );
        } else {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                state,
                arc.nextstate,
                label_str(isyms, arc.ilabel),
                label_str(osyms, arc.olabel),
                arc.weight,
            );
        }
    }
    Ok(())
}

/// Parses AT&T format text into a [`VectorFst`]. The first line's source
/// state becomes the start state. Labels are resolved via `isyms`/`osyms`
/// when given, otherwise parsed as bare integers.
pub fn read<W: Weight>(
    text: &str,
    isyms: Option<&SymbolTable>,
    osyms: Option<&SymbolTable>,
) -> Result<VectorFst<W>> {
    let mut fst: VectorFst<W> = VectorFst::new();
    let mut state_ids = rustc_hash::FxHashMap::default();
    let mut ensure_state = |fst: &mut VectorFst<W>, id: StateId, map: &mut rustc_hash::FxHashMap<StateId, StateId>| -> StateId {
        *map.entry(id).or_insert_with(|| fst.add_state())
    };

    let mut start_set = false;
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let parse_label = |table: Option<&SymbolTable>, text: &str| -> Result<Label> {
            match table {
                Some(t) => t.require_label(text),
                None => text
                    .parse::<Label>()
                    .map_err(|_| WfstError::BadFormat(format!("line {}: bad label '{}'", lineno + 1, text))),
            }
        };

        match fields.len() {
            1 => {
                let state_text = fields[0];
                let state_id: StateId = state_text.parse().map_err(|_| {
                    WfstError::BadFormat(format!("line {}: bad state id", lineno + 1))
                })?;
                let s = ensure_state(&mut fst, state_id, &mut state_ids);
                fst.set_final(s, W::one());
            }
            2 => {
                let state_id: StateId = fields[0].parse().map_err(|_| {
                    WfstError::BadFormat(format!("line {}: bad state id", lineno + 1))
                })?;
                let s = ensure_state(&mut fst, state_id, &mut state_ids);
                let weight = W::from_text(fields[1]).ok_or_else(|| {
                    WfstError::BadFormat(format!("line {}: bad weight '{}'", lineno + 1, fields[1]))
                })?;
                fst.set_final(s, weight);
            }
            4 | 5 => {
                let src_id: StateId = fields[0].parse().map_err(|_| {
                    WfstError::BadFormat(format!("line {}: bad source state", lineno + 1))
                })?;
                let dst_id: StateId = fields[1].parse().map_err(|_| {
                    WfstError::BadFormat(format!("line {}: bad dest state", lineno + 1))
                })?;
                let ilabel = parse_label(isyms, fields[2])?;
                let olabel = parse_label(osyms, fields[3])?;
                let weight = if fields.len() == 5 {
                    W::from_text(fields[4]).ok_or_else(|| {
                        WfstError::BadFormat(format!(
                            "line {}: bad weight '{}'",
                            lineno + 1,
                            fields[4]
                        ))
                    })?
                } else {
                    W::one()
                };
                let src = ensure_state(&mut fst, src_id, &mut state_ids);
                if !start_set {
                    fst.set_start(src);
                    start_set = true;
                }
                let dst = ensure_state(&mut fst, dst_id, &mut state_ids);
                fst.add_arc(src, crate::arc::Arc::new(ilabel, olabel, weight, dst));
            }
            _ => {
                return Err(WfstError::BadFormat(format!(
                    "line {}: unexpected number of fields ({})",
                    lineno + 1,
                    fields.len()
                )));
            }
        }
    }
    Ok(fst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    #[test]
    fn writes_a_two_state_acceptor() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::one());
        v.add_arc(s0, crate::arc::Arc::new(1, 1, TropicalWeight::one(), s1));

        let mut buf = Vec::new();
        write(&v, None, None, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("0\t1\t1\t1"));
        assert!(text.contains("1\n") || text.contains("1\r\n"));
    }

    #[test]
    fn round_trips_through_text() {
        let text = "0\t1\t1\t1\n1\n";
        let fst: VectorFst<TropicalWeight> = read(text, None, None).unwrap();
        assert_eq!(fst.num_states(), 2);
        assert!(fst.is_final(1));
    }
}
