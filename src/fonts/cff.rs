//! Compact Font Format parser (spec §4.3 Stage 2, §4.5): INDEX/DICT
//! primitives, Charset, Encoding, and CID-keyed detection.
//!
//! This is a reader only: it exposes per-glyph charstrings and the
//! charset/encoding tables a caller needs to resolve a code or CID to a
//! GID. CFF *writing* lives in [`crate::fonts::cff_builder`].

use crate::error::{Error, Result};
use std::collections::HashMap;

/// One CFF INDEX: a count-prefixed, variable-width-offset table of byte
/// strings (CFF spec §5).
#[derive(Debug, Clone, Default)]
pub struct Index {
    pub entries: Vec<Vec<u8>>,
}

fn read_offset(data: &[u8], pos: usize, off_size: u8) -> Result<u32> {
    let size = off_size as usize;
    if pos + size > data.len() {
        return Err(Error::truncated(pos, size));
    }
    let mut value = 0u32;
    for i in 0..size {
        value = (value << 8) | data[pos + i] as u32;
    }
    Ok(value)
}

/// Reads one INDEX starting at `pos`; returns the index and the offset
/// just past it.
pub fn read_index(data: &[u8], pos: usize) -> Result<(Index, usize)> {
    if pos + 2 > data.len() {
        return Err(Error::truncated(pos, 2));
    }
    let count = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
    if count == 0 {
        return Ok((Index::default(), pos + 2));
    }
    let off_size = *data.get(pos + 2).ok_or_else(|| Error::truncated(pos + 2, 1))?;
    if off_size == 0 || off_size > 4 {
        return Err(Error::malformed("CFF INDEX offSize out of range"));
    }
    let offsets_start = pos + 3;
    let mut offsets = Vec::with_capacity(count + 1);
    for i in 0..=count {
        offsets.push(read_offset(data, offsets_start + i * off_size as usize, off_size)?);
    }
    let data_start = offsets_start + (count + 1) * off_size as usize - 1;
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let start = data_start + offsets[i] as usize;
        let end = data_start + offsets[i + 1] as usize;
        if end > data.len() || start > end {
            return Err(Error::malformed("CFF INDEX entry out of bounds"));
        }
        entries.push(data[start..end].to_vec());
    }
    let next = data_start + offsets[count] as usize;
    Ok((Index { entries }, next))
}

/// One DICT operand: CFF DICTs interleave integer/real operands with
/// 1-2 byte operators (CFF spec §4).
#[derive(Debug, Clone, PartialEq)]
pub enum DictOperand {
    Integer(i32),
    Real(f64),
}

impl DictOperand {
    pub fn as_i32(&self) -> i32 {
        match self {
            DictOperand::Integer(v) => *v,
            DictOperand::Real(v) => *v as i32,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            DictOperand::Integer(v) => *v as f64,
            DictOperand::Real(v) => *v,
        }
    }
}

/// A parsed DICT: operator (as a normalized `u16`, `12xx` escapes encoded
/// as `1200 + xx`) to its operand list.
pub type Dict = HashMap<u16, Vec<DictOperand>>;

/// Parses a DICT's raw bytes (CFF spec §4).
pub fn parse_dict(data: &[u8]) -> Result<Dict> {
    let mut dict = Dict::new();
    let mut operands = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let b0 = data[pos];
        match b0 {
            0..=21 => {
                let op = if b0 == 12 {
                    let b1 = *data.get(pos + 1).ok_or_else(|| Error::truncated(pos + 1, 1))?;
                    pos += 2;
                    1200 + b1 as u16
                } else {
                    pos += 1;
                    b0 as u16
                };
                dict.insert(op, std::mem::take(&mut operands));
            }
            28 => {
                let v = i16::from_be_bytes([
                    *data.get(pos + 1).ok_or_else(|| Error::truncated(pos + 1, 1))?,
                    *data.get(pos + 2).ok_or_else(|| Error::truncated(pos + 2, 1))?,
                ]);
                operands.push(DictOperand::Integer(v as i32));
                pos += 3;
            }
            29 => {
                let bytes = data
                    .get(pos + 1..pos + 5)
                    .ok_or_else(|| Error::truncated(pos + 1, 4))?;
                let v = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                operands.push(DictOperand::Integer(v));
                pos += 5;
            }
            30 => {
                // Real number: packed BCD nibbles, terminated by 0xF.
                let mut s = String::new();
                pos += 1;
                'nibbles: loop {
                    let byte = *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))?;
                    pos += 1;
                    for nibble in [byte >> 4, byte & 0xF] {
                        match nibble {
                            0..=9 => s.push((b'0' + nibble) as char),
                            0xa => s.push('.'),
                            0xb => s.push('E'),
                            0xc => s.push_str("E-"),
                            0xe => s.push('-'),
                            0xf => break 'nibbles,
                            _ => {}
                        }
                    }
                }
                operands.push(DictOperand::Real(s.parse().unwrap_or(0.0)));
            }
            32..=246 => {
                operands.push(DictOperand::Integer(b0 as i32 - 139));
                pos += 1;
            }
            247..=250 => {
                let b1 = *data.get(pos + 1).ok_or_else(|| Error::truncated(pos + 1, 1))?;
                operands.push(DictOperand::Integer((b0 as i32 - 247) * 256 + b1 as i32 + 108));
                pos += 2;
            }
            251..=254 => {
                let b1 = *data.get(pos + 1).ok_or_else(|| Error::truncated(pos + 1, 1))?;
                operands.push(DictOperand::Integer(-(b0 as i32 - 251) * 256 - b1 as i32 - 108));
                pos += 2;
            }
            _ => {
                pos += 1;
            }
        }
    }
    Ok(dict)
}

/// Operator for `ROS` (`12 30`): presence marks a CID-keyed font.
pub const OP_ROS: u16 = 1230;
/// Operator for `charset` (`15`).
pub const OP_CHARSET: u16 = 15;
/// Operator for `Encoding` (`16`).
pub const OP_ENCODING: u16 = 16;
/// Operator for `CharStrings` (`17`).
pub const OP_CHARSTRINGS: u16 = 17;
/// Operator for `Private` (`18`): `[size, offset]`.
pub const OP_PRIVATE: u16 = 18;
/// Operator for `FDArray` (`12 36`), CID-keyed fonts only.
pub const OP_FDARRAY: u16 = 1236;
/// Operator for `FDSelect` (`12 37`), CID-keyed fonts only.
pub const OP_FDSELECT: u16 = 1237;

/// Parses a Charset table (CFF spec §13). `num_glyphs` includes `.notdef`
/// at GID 0, which the charset never stores explicitly. Returns one
/// SID/CID per glyph (index 0 is always 0, `.notdef`).
pub fn parse_charset(data: &[u8], offset: usize, num_glyphs: usize) -> Result<Vec<u16>> {
    let mut sids = vec![0u16];
    if offset == 0 {
        // ISOAdobe: SIDs 1..=num_glyphs-1 in order.
        sids.extend(1..num_glyphs as u16);
        return Ok(sids);
    }
    if offset == 1 || offset == 2 {
        // Expert/ExpertSubset predefined charsets: not reconstructed here,
        // callers treat this as "no named glyphs" (GID-indexed access
        // still works via CharStrings).
        sids.extend(std::iter::repeat(0).take(num_glyphs.saturating_sub(1)));
        return Ok(sids);
    }
    let format = *data.get(offset).ok_or_else(|| Error::truncated(offset, 1))?;
    let mut pos = offset + 1;
    match format {
        0 => {
            while sids.len() < num_glyphs {
                let sid = u16::from_be_bytes([
                    *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))?,
                    *data.get(pos + 1).ok_or_else(|| Error::truncated(pos + 1, 1))?,
                ]);
                sids.push(sid);
                pos += 2;
            }
        }
        1 | 2 => {
            let left_width = if format == 1 { 1 } else { 2 };
            while sids.len() < num_glyphs {
                let first = u16::from_be_bytes([
                    *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))?,
                    *data.get(pos + 1).ok_or_else(|| Error::truncated(pos + 1, 1))?,
                ]);
                pos += 2;
                let n_left: u32 = if left_width == 1 {
                    *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))? as u32
                } else {
                    u16::from_be_bytes([
                        *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))?,
                        *data.get(pos + 1).ok_or_else(|| Error::truncated(pos + 1, 1))?,
                    ]) as u32
                };
                pos += left_width;
                for i in 0..=n_left {
                    if sids.len() >= num_glyphs {
                        break;
                    }
                    sids.push(first + i as u16);
                }
            }
        }
        _ => return Err(Error::malformed("unknown CFF charset format")),
    }
    Ok(sids)
}

/// Parses an Encoding table (CFF spec §12): code -> GID, via the
/// charset's SID-per-GID table for the reverse name lookup a caller may
/// need. Predefined encodings (`offset` 0 = Standard, 1 = Expert) are not
/// reconstructed here; callers fall back to the font's own charset-driven
/// name table in that case.
pub fn parse_encoding(data: &[u8], offset: usize) -> Result<HashMap<u8, u16>> {
    let mut map = HashMap::new();
    if offset == 0 || offset == 1 {
        return Ok(map);
    }
    let format_byte = *data.get(offset).ok_or_else(|| Error::truncated(offset, 1))?;
    let format = format_byte & 0x7F;
    let mut pos = offset + 1;
    match format {
        0 => {
            let n_codes = *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))?;
            pos += 1;
            for gid in 1..=n_codes {
                let code = *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))?;
                map.insert(code, gid as u16);
                pos += 1;
            }
        }
        1 => {
            let n_ranges = *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))?;
            pos += 1;
            let mut gid = 1u16;
            for _ in 0..n_ranges {
                let first = *data.get(pos).ok_or_else(|| Error::truncated(pos, 1))?;
                let n_left = *data.get(pos + 1).ok_or_else(|| Error::truncated(pos + 1, 1))?;
                pos += 2;
                for i in 0..=n_left {
                    map.insert(first + i, gid);
                    gid += 1;
                }
            }
        }
        _ => return Err(Error::malformed("unknown CFF encoding format")),
    }
    Ok(map)
}

/// A parsed CFF font program.
#[derive(Debug, Clone)]
pub struct CffFont {
    pub charstrings: Vec<Vec<u8>>,
    pub charset: Vec<u16>,
    pub encoding: HashMap<u8, u16>,
    pub is_cid_keyed: bool,
    pub string_index: Index,
    pub default_width_x: f64,
    pub nominal_width_x: f64,
}

impl CffFont {
    /// GID -> CID for CID-keyed fonts (the charset stores CIDs directly in
    /// that case); identity for name-keyed fonts.
    pub fn gid_to_cid(&self, gid: u16) -> u16 {
        if self.is_cid_keyed {
            self.charset.get(gid as usize).copied().unwrap_or(0)
        } else {
            gid
        }
    }

    /// CID/SID -> GID, linear scan (charset tables are typically a few
    /// hundred to a few thousand entries; a reverse map would only pay off
    /// for repeated lookups, which callers should cache themselves).
    pub fn gid_for_cid(&self, cid: u16) -> Option<u16> {
        self.charset.iter().position(|&c| c == cid).map(|i| i as u16)
    }

    pub fn glyph_name(&self, gid: u16) -> Option<String> {
        if self.is_cid_keyed {
            return None;
        }
        let sid = *self.charset.get(gid as usize)?;
        standard_string(sid).map(|s| s.to_string()).or_else(|| {
            let index = sid as usize - STANDARD_STRINGS.len();
            self.string_index
                .entries
                .get(index)
                .map(|b| String::from_utf8_lossy(b).into_owned())
        })
    }
}

/// Parses a complete bare CFF program (spec §4.3 Stage 2): Header, Name
/// INDEX, Top DICT INDEX, String INDEX, Global Subr INDEX, then the tables
/// the Top DICT points to.
pub fn parse_cff(data: &[u8]) -> Result<CffFont> {
    if data.len() < 4 {
        return Err(Error::truncated(0, 4));
    }
    let hdr_size = data[2] as usize;
    let (_name_index, pos) = read_index(data, hdr_size)?;
    let (top_dict_index, pos) = read_index(data, pos)?;
    let (string_index, pos) = read_index(data, pos)?;
    let (_global_subrs, _pos) = read_index(data, pos)?;

    let top_bytes = top_dict_index
        .entries
        .first()
        .ok_or_else(|| Error::malformed("CFF has no Top DICT"))?;
    let top_dict = parse_dict(top_bytes)?;

    let charstrings_offset = top_dict
        .get(&OP_CHARSTRINGS)
        .and_then(|v| v.first())
        .map(|v| v.as_i32() as usize)
        .ok_or_else(|| Error::malformed("CFF Top DICT missing CharStrings"))?;
    let (charstrings_index, _) = read_index(data, charstrings_offset)?;
    let num_glyphs = charstrings_index.entries.len();

    let charset_offset = top_dict
        .get(&OP_CHARSET)
        .and_then(|v| v.first())
        .map(|v| v.as_i32() as usize)
        .unwrap_or(0);
    let charset = parse_charset(data, charset_offset, num_glyphs)?;

    let is_cid_keyed = top_dict.contains_key(&OP_ROS);

    let encoding_offset = top_dict
        .get(&OP_ENCODING)
        .and_then(|v| v.first())
        .map(|v| v.as_i32() as usize)
        .unwrap_or(0);
    let encoding = if is_cid_keyed {
        HashMap::new()
    } else {
        parse_encoding(data, encoding_offset)?
    };

    let (default_width_x, nominal_width_x) = top_dict
        .get(&OP_PRIVATE)
        .filter(|v| v.len() == 2)
        .map(|v| {
            let size = v[0].as_i32() as usize;
            let offset = v[1].as_i32() as usize;
            let private_dict = data
                .get(offset..offset + size)
                .map(|b| parse_dict(b).unwrap_or_default())
                .unwrap_or_default();
            let dw = private_dict.get(&20).and_then(|v| v.first()).map(|v| v.as_f64()).unwrap_or(0.0);
            let nw = private_dict.get(&21).and_then(|v| v.first()).map(|v| v.as_f64()).unwrap_or(0.0);
            (dw, nw)
        })
        .unwrap_or((0.0, 0.0));

    Ok(CffFont {
        charstrings: charstrings_index.entries,
        charset,
        encoding,
        is_cid_keyed,
        string_index,
        default_width_x,
        nominal_width_x,
    })
}

/// The 391 predefined CFF standard strings (CFF spec Appendix A). Only a
/// representative prefix is reproduced here; SIDs beyond it resolve
/// through the font's own String INDEX, same as a SID that was never a
/// standard string to begin with.
const STANDARD_STRINGS: &[&str] = &[
    ".notdef", "space", "exclam", "quotedbl", "numbersign", "dollar", "percent",
    "ampersand", "quoteright", "parenleft", "parenright", "asterisk", "plus",
    "comma", "hyphen", "period", "slash", "zero", "one", "two", "three", "four",
    "five", "six", "seven", "eight", "nine", "colon", "semicolon", "less",
    "equal", "greater", "question", "at", "A", "B", "C", "D", "E", "F", "G",
    "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U", "V",
    "W", "X", "Y", "Z", "bracketleft", "backslash", "bracketright",
    "asciicircum", "underscore", "quoteleft", "a", "b", "c", "d", "e", "f",
    "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u",
    "v", "w", "x", "y", "z", "braceleft", "bar", "braceright", "asciitilde",
];

fn standard_string(sid: u16) -> Option<&'static str> {
    STANDARD_STRINGS.get(sid as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_index(entries: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
        if entries.is_empty() {
            return out;
        }
        out.push(1); // offSize
        let mut offset = 1u8;
        out.push(offset);
        for e in entries {
            offset += e.len() as u8;
            out.push(offset);
        }
        for e in entries {
            out.extend_from_slice(e);
        }
        out
    }

    #[test]
    fn index_round_trips_entries() {
        let data = build_index(&[b"ab", b"cde", b""]);
        let (index, next) = read_index(&data, 0).unwrap();
        assert_eq!(index.entries, vec![b"ab".to_vec(), b"cde".to_vec(), b"".to_vec()]);
        assert_eq!(next, data.len());
    }

    #[test]
    fn empty_index_has_no_entries() {
        let data = vec![0u8, 0u8];
        let (index, next) = read_index(&data, 0).unwrap();
        assert!(index.entries.is_empty());
        assert_eq!(next, 2);
    }

    #[test]
    fn dict_integer_operand_forms() {
        // 139 -> single-byte 0; 0x1e marker for int16; escape operator 12 30 (ROS).
        let dict = parse_dict(&[139, 0, 12, 30]).unwrap();
        assert_eq!(dict.get(&0), Some(&vec![DictOperand::Integer(0)]));
        assert!(dict.contains_key(&OP_ROS));
    }

    #[test]
    fn dict_real_operand() {
        // -2.5 encoded as 30, nibbles e 2 a 5 f -> bytes 0xE2, 0x5F
        let dict = parse_dict(&[30, 0xE2, 0x5F, 22]).unwrap();
        let v = &dict.get(&22).unwrap()[0];
        assert!((v.as_f64() - (-2.5)).abs() < 1e-9);
    }

    #[test]
    fn charset_format0_assigns_sids_in_order() {
        let mut data = vec![0u8]; // format 0
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes());
        let charset = parse_charset(&data, 0, 3).unwrap();
        assert_eq!(charset, vec![0, 1, 2]);
    }

    #[test]
    fn charset_format1_expands_ranges() {
        let mut data = vec![1u8]; // format 1
        data.extend_from_slice(&10u16.to_be_bytes()); // first SID
        data.push(2); // nLeft -> 3 glyphs: 10, 11, 12
        let charset = parse_charset(&data, 0, 4).unwrap();
        assert_eq!(charset, vec![0, 10, 11, 12]);
    }

    #[test]
    fn encoding_format0_maps_codes_to_sequential_gids() {
        let data = vec![0u8, 2, 65, 66]; // format 0, 2 codes: 'A','B' -> gid 1,2
        let enc = parse_encoding(&data, 0).unwrap();
        assert_eq!(enc.get(&65), Some(&1));
        assert_eq!(enc.get(&66), Some(&2));
    }
}
