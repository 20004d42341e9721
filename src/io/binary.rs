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

//! The binary FST file format (spec §6): a fixed header followed by a
//! flat state table and arc array, readable in one pass without a
//! parser. No `byteorder`-style crate is pulled in for this — the
//! format is little-endian by definition, so every field is written via
//! a plain `to_le_bytes()`/`from_le_bytes()` pair.

use std::io::{Read, Write};

use crate::arc::Arc;
use crate::error::{Result, WfstError};
use crate::fst_traits::{ArcIterator, CoreFst, ExpandedFst, Fst, MutableFst, StateIterator};
use crate::label::StateId;
use crate::properties::FstProperties;
use crate::semiring::Weight;
use crate::vector_fst::VectorFst;

pub const MAGIC: u32 = 0x7EB2_B596;
pub const VERSION: u32 = 1;
pub const FLAG_ALIGNED: u32 = 1 << 0;

fn write_string<W: Write>(w: &mut W, s: &str) -> std::io::Result<()> {
    let bytes = s.as_bytes();
    w.write_all(&(bytes.len() as u32).to_le_bytes())?;
    w.write_all(bytes)
}

fn read_string<R: Read>(r: &mut R) -> std::io::Result<String> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Writes `fst` in the binary format (spec §6): magic, `fst_type`,
/// `arc_type` (= `W::type_name()`), version, flags, properties, start
/// state, state/arc counts, then each state's final weight and arcs in
/// id order.
pub fn write<F, W, Wr>(fst: &F, fst_type: &str, writer: &mut Wr) -> Result<()>
where
    F: Fst<W = W> + ExpandedFst,
    W: Weight,
    Wr: Write,
{
    writer.write_all(&MAGIC.to_le_bytes())?;
    write_string(writer, fst_type)?;
    write_string(writer, W::type_name())?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?; // flags
    writer.write_all(&fst.properties().0.to_le_bytes())?;
    writer.write_all(&fst.start().unwrap_or(crate::label::NO_STATE_ID).to_le_bytes())?;
    writer.write_all(&(fst.num_states() as u64).to_le_bytes())?;

    let total_arcs: u64 = fst.states_iter().map(|s| fst.num_arcs(s) as u64).sum();
    writer.write_all(&total_arcs.to_le_bytes())?;

    for s in fst.states_iter() {
        match fst.final_weight(s) {
            Some(w) => {
                writer.write_all(&[1u8])?;
                w.write_binary(writer)?;
            }
            None => writer.write_all(&[0u8])?,
        }
        let arcs: Vec<Arc<W>> = fst.arcs_iter(s)?.collect();
        writer.write_all(&(arcs.len() as u32).to_le_bytes())?;
        for arc in &arcs {
            writer.write_all(&arc.ilabel.to_le_bytes())?;
            writer.write_all(&arc.olabel.to_le_bytes())?;
            arc.weight.write_binary(writer)?;
            writer.write_all(&arc.nextstate.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Reads back what [`write`] produced, into a fresh [`VectorFst`].
/// Returns [`WfstError::BadFormat`] if the magic or weight type tag
/// doesn't match.
pub fn read<W, Rd>(reader: &mut Rd) -> Result<VectorFst<W>>
where
    W: Weight,
    Rd: Read,
{
    let mut buf4 = [0u8; 4];
    reader.read_exact(&mut buf4)?;
    let magic = u32::from_le_bytes(buf4);
    if magic != MAGIC {
        return Err(WfstError::BadFormat(format!(
            "bad magic: expected {:#x}, got {:#x}",
            MAGIC, magic
        )));
    }
    let _fst_type = read_string(reader)?;
    let arc_type = read_string(reader)?;
    if arc_type != W::type_name() {
        return Err(WfstError::TypeMismatch {
            expected: W::type_name().to_string(),
            actual: arc_type,
        });
    }
    reader.read_exact(&mut buf4)?;
    let _version = u32::from_le_bytes(buf4);
    reader.read_exact(&mut buf4)?;
    let _flags = u32::from_le_bytes(buf4);

    let mut buf8 = [0u8; 8];
    reader.read_exact(&mut buf8)?;
    let _properties = FstProperties(u64::from_le_bytes(buf8));

    reader.read_exact(&mut buf4)?;
    let start = i32::from_le_bytes(buf4);
    reader.read_exact(&mut buf8)?;
    let num_states = u64::from_le_bytes(buf8);
    reader.read_exact(&mut buf8)?;
    let _total_arcs = u64::from_le_bytes(buf8);

    let mut fst: VectorFst<W> = VectorFst::with_capacity(num_states as usize);
    for _ in 0..num_states {
        fst.add_state();
    }
    if start != crate::label::NO_STATE_ID {
        fst.set_start(start as StateId);
    }

    for s in 0..num_states as StateId {
        let mut has_final = [0u8; 1];
        reader.read_exact(&mut has_final)?;
        if has_final[0] != 0 {
            let w = W::read_binary(reader)?;
            fst.set_final(s, w);
        }
        reader.read_exact(&mut buf4)?;
        let num_arcs = u32::from_le_bytes(buf4);
        for _ in 0..num_arcs {
            let mut lbl = [0u8; 4];
            reader.read_exact(&mut lbl)?;
            let ilabel = i32::from_le_bytes(lbl);
            reader.read_exact(&mut lbl)?;
            let olabel = i32::from_le_bytes(lbl);
            let weight = W::read_binary(reader)?;
            reader.read_exact(&mut lbl)?;
            let nextstate = i32::from_le_bytes(lbl);
            fst.add_arc(s, Arc::new(ilabel, olabel, weight, nextstate));
        }
    }
    Ok(fst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::TropicalWeight;

    #[test]
    fn round_trips_a_small_fst() {
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        let s0 = v.add_state();
        let s1 = v.add_state();
        v.set_start(s0);
        v.set_final(s1, TropicalWeight::new(0.5));
        v.add_arc(s0, Arc::new(1, 2, TropicalWeight::new(1.5), s1));

        let mut buf = Vec::new();
        write(&v, "vector", &mut buf).unwrap();

        let back: VectorFst<TropicalWeight> = read(&mut &buf[..]).unwrap();
        assert_eq!(back.num_states(), 2);
        assert_eq!(back.start(), Some(s0));
        assert_eq!(back.final_weight(s1), Some(TropicalWeight::new(0.5)));
        let arcs: Vec<_> = back.arcs_iter(s0).unwrap().collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].olabel, 2);
    }

    #[test]
    fn rejects_wrong_weight_type() {
        use crate::semiring::LogWeight;
        let mut v: VectorFst<TropicalWeight> = VectorFst::new();
        v.add_state();
        let mut buf = Vec::new();
        write(&v, "vector", &mut buf).unwrap();
        let result: Result<VectorFst<LogWeight>> = read(&mut &buf[..]);
        assert!(result.is_err());
    }
}
