//! CFF assembly (spec §4.3 Stage 4): builds a bare CFF table from a set of
//! already-translated Type 2 charstrings.
//!
//! The Top DICT stores byte offsets to sections (`charset`, `Encoding`,
//! `CharStrings`, `Private`) that come after it in the file, but its own
//! serialized size depends on how many bytes those offset values take to
//! encode — a chicken-and-egg problem the CFF spec resolves by fixed-point
//! iteration: guess, measure, recompute, repeat until the Top DICT's size
//! stops changing (bounded here at 5 passes, which always suffices in
//! practice since our offsets only ever need the 2-byte or 5-byte DICT
//! integer form).

use crate::error::{Error, Result};

fn write_index(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    if entries.is_empty() {
        return out;
    }
    let total: usize = entries.iter().map(|e| e.len()).sum();
    let off_size: u8 = if total < 0xFF {
        1
    } else if total < 0xFFFF {
        2
    } else if total < 0xFF_FFFF {
        3
    } else {
        4
    };
    out.push(off_size);
    let write_offset = |out: &mut Vec<u8>, value: u32| {
        let bytes = value.to_be_bytes();
        out.extend_from_slice(&bytes[4 - off_size as usize..]);
    };
    let mut offset = 1u32;
    write_offset(&mut out, offset);
    for e in entries {
        offset += e.len() as u32;
        write_offset(&mut out, offset);
    }
    for e in entries {
        out.extend_from_slice(e);
    }
    out
}

fn dict_integer_len(value: i32) -> usize {
    if (-107..=107).contains(&value) {
        1
    } else if (-1131..=1131).contains(&value) {
        2
    } else {
        5
    }
}

fn write_dict_integer(out: &mut Vec<u8>, value: i32) {
    if (-107..=107).contains(&value) {
        out.push((value + 139) as u8);
    } else if (108..=1131).contains(&value) {
        let v = value - 108;
        out.push(247 + (v >> 8) as u8);
        out.push((v & 0xFF) as u8);
    } else if (-1131..=-108).contains(&value) {
        let v = -value - 108;
        out.push(251 + (v >> 8) as u8);
        out.push((v & 0xFF) as u8);
    } else {
        out.push(29);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

fn write_dict_operator(out: &mut Vec<u8>, op: u16) {
    if op >= 1200 {
        out.push(12);
        out.push((op - 1200) as u8);
    } else {
        out.push(op as u8);
    }
}

/// One Top DICT entry to serialize: operator plus its (already-ordered)
/// integer operands.
struct TopDictEntry {
    op: u16,
    operands: Vec<i32>,
}

fn top_dict_len(entries: &[TopDictEntry]) -> usize {
    entries
        .iter()
        .map(|e| {
            let operand_len: usize = e.operands.iter().map(|v| dict_integer_len(*v)).sum();
            let op_len = if e.op >= 1200 { 2 } else { 1 };
            operand_len + op_len
        })
        .sum()
}

fn write_top_dict(entries: &[TopDictEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for e in entries {
        for &v in &e.operands {
            write_dict_integer(&mut out, v);
        }
        write_dict_operator(&mut out, e.op);
    }
    out
}

fn build_charset(num_glyphs: usize) -> Vec<u8> {
    // Format 0: one SID per glyph after .notdef. SIDs are assigned
    // sequentially starting at 391 (the first non-standard SID) since the
    // String INDEX holds exactly one entry per non-.notdef glyph, in
    // charstring order.
    let mut out = vec![0u8];
    for gid in 1..num_glyphs {
        let sid = 390 + gid as u16;
        out.extend_from_slice(&sid.to_be_bytes());
    }
    out
}

fn build_encoding(codes: &[(u8, u16)]) -> Vec<u8> {
    // Format 0, gid order matches `codes`' iteration order.
    let mut out = vec![0u8, codes.len() as u8];
    for &(code, _gid) in codes {
        out.push(code);
    }
    out
}

/// Assembles a bare CFF font from its charstrings (spec §4.3 Stage 4).
///
/// - `font_name`: the `/FontName` to store in the Name INDEX.
/// - `glyph_names`: one name per glyph, GID-indexed, `glyph_names[0]`
///   conventionally `.notdef`; used only to size the String INDEX
///   (1:1 with glyphs after `.notdef`), not to look up standard SIDs.
/// - `charstrings`: one Type 2 charstring per glyph, same indexing.
/// - `encoding_codes`: `(code, gid)` pairs for the Encoding table.
pub fn build_cff(
    font_name: &str,
    glyph_names: &[String],
    charstrings: &[Vec<u8>],
    encoding_codes: &[(u8, u16)],
) -> Result<Vec<u8>> {
    if glyph_names.len() != charstrings.len() {
        return Err(Error::malformed("glyph_names and charstrings length mismatch"));
    }
    let header = vec![1u8, 0, 4, 4];
    let name_index = write_index(&[font_name.as_bytes().to_vec()]);
    let string_entries: Vec<Vec<u8>> = glyph_names[1..].iter().map(|n| n.as_bytes().to_vec()).collect();
    let string_index = write_index(&string_entries);
    let global_subr_index = write_index(&[]);
    let charstrings_index = write_index(charstrings);
    let charset_bytes = build_charset(charstrings.len());
    let encoding_bytes = build_encoding(encoding_codes);
    let private_dict_bytes: Vec<u8> = Vec::new();

    let prefix_len = header.len() + name_index.len() + string_index.len() + global_subr_index.len();

    // Start from an upper-bound guess (5-byte offsets) and converge.
    let mut top_dict_index_len = 64;
    for _ in 0..5 {
        let base = prefix_len + top_dict_index_len;
        let charset_offset = base;
        let encoding_offset = charset_offset + charset_bytes.len();
        let charstrings_offset = encoding_offset + encoding_bytes.len();
        let private_offset = charstrings_offset + charstrings_index.len();

        let entries = vec![
            TopDictEntry { op: 15, operands: vec![charset_offset as i32] },
            TopDictEntry { op: 16, operands: vec![encoding_offset as i32] },
            TopDictEntry { op: 17, operands: vec![charstrings_offset as i32] },
            TopDictEntry {
                op: 18,
                operands: vec![private_dict_bytes.len() as i32, private_offset as i32],
            },
        ];
        let new_len = write_index(&[write_top_dict(&entries)]).len();
        if new_len == top_dict_index_len {
            let top_dict_index = write_index(&[write_top_dict(&entries)]);
            let mut out = Vec::new();
            out.extend_from_slice(&header);
            out.extend_from_slice(&name_index);
            out.extend_from_slice(&top_dict_index);
            out.extend_from_slice(&string_index);
            out.extend_from_slice(&global_subr_index);
            out.extend_from_slice(&charset_bytes);
            out.extend_from_slice(&encoding_bytes);
            out.extend_from_slice(&charstrings_index);
            out.extend_from_slice(&private_dict_bytes);
            return Ok(out);
        }
        top_dict_index_len = new_len;
    }
    Err(Error::malformed("CFF Top DICT offset layout failed to converge"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::cff::{parse_cff, OP_CHARSTRINGS};

    #[test]
    fn round_trips_through_the_reader() {
        let glyph_names = vec![".notdef".to_string(), "A".to_string(), "B".to_string()];
        let charstrings = vec![vec![14], vec![100, 21, 14], vec![14]];
        let bytes = build_cff("TestFont", &glyph_names, &charstrings, &[(65, 1), (66, 2)]).unwrap();
        let parsed = parse_cff(&bytes).unwrap();
        assert_eq!(parsed.charstrings.len(), 3);
        assert_eq!(parsed.charstrings[1], vec![100, 21, 14]);
        assert_eq!(parsed.encoding.get(&65), Some(&1));
        assert_eq!(parsed.encoding.get(&66), Some(&2));
        assert!(!parsed.is_cid_keyed);
    }

    #[test]
    fn fixed_point_iteration_converges_for_many_glyphs() {
        let mut glyph_names = vec![".notdef".to_string()];
        let mut charstrings = vec![vec![14]];
        for i in 0..500 {
            glyph_names.push(format!("glyph{i}"));
            charstrings.push(vec![14]);
        }
        let bytes = build_cff("BigFont", &glyph_names, &charstrings, &[]).unwrap();
        let parsed = parse_cff(&bytes).unwrap();
        assert_eq!(parsed.charstrings.len(), 501);
        let _ = OP_CHARSTRINGS;
    }
}
