//! Type 1 font program decryption (spec §4.3 Stage 1).
//!
//! A Type 1 program is cleartext PostScript up to `eexec`, then an
//! eexec-encrypted private section containing the charstrings (which are
//! themselves encrypted a second time, per-charstring, with `lenIV`
//! leading garbage bytes).

use crate::error::{Error, Result};
use std::collections::HashMap;

const EEXEC_KEY: u16 = 55665;
const CHARSTRING_KEY: u16 = 4330;

/// Adobe's Type 1 decryption algorithm (Type 1 Font Format spec §7.3):
/// a 16-bit running cipher, the decrypted byte is the high byte of the
/// state XORed with the ciphertext byte, and the state is churned forward
/// with the *ciphertext* byte (not the plaintext byte).
fn decrypt(data: &[u8], key: u16, skip: usize) -> Vec<u8> {
    let mut r = key;
    const C1: u16 = 52845;
    const C2: u16 = 22719;
    let mut out = Vec::with_capacity(data.len());
    for &c in data {
        let p = c ^ (r >> 8) as u8;
        r = (c as u16).wrapping_add(r).wrapping_mul(C1).wrapping_add(C2);
        out.push(p);
    }
    if skip <= out.len() {
        out.drain(0..skip);
    }
    out
}

/// Decrypts the eexec-encrypted private section (4 leading random bytes
/// are discarded per the spec's fixed skip).
pub fn decrypt_eexec(data: &[u8]) -> Vec<u8> {
    decrypt(data, EEXEC_KEY, 4)
}

/// Decrypts one charstring. `len_iv` is the private dict's `/lenIV` (4 if
/// absent; `-1` means charstrings are stored unencrypted).
pub fn decrypt_charstring(data: &[u8], len_iv: i32) -> Vec<u8> {
    if len_iv < 0 {
        return data.to_vec();
    }
    decrypt(data, CHARSTRING_KEY, len_iv as usize)
}

/// A minimally parsed Type 1 font program: cleartext header values plus
/// the decrypted, per-glyph Type 1 charstrings keyed by glyph name.
#[derive(Debug, Clone, Default)]
pub struct Type1Font {
    pub font_matrix: [f64; 6],
    pub encoding: HashMap<u8, String>,
    pub charstrings: HashMap<String, Vec<u8>>,
    pub subrs: Vec<Vec<u8>>,
}

/// Parses a complete Type 1 program: locates `eexec`, decrypts the
/// private section, then walks the minimal PostScript needed to pull out
/// `/CharStrings`, `/Subrs`, `/Encoding`, and `/FontMatrix` (spec §4.3
/// Stage 1). This is not a general PostScript interpreter: it recognizes
/// only the handful of constructs real Type 1 fonts actually use for
/// these dictionaries (`dup <code> /<name> put`, `/name len RD <bytes> ND`).
pub fn parse_type1(data: &[u8]) -> Result<Type1Font> {
    let eexec_pos = find_subsequence(data, b"eexec").ok_or_else(|| Error::malformed("Type1 font has no eexec marker"))?;
    let cleartext = &data[..eexec_pos];
    let mut font = Type1Font {
        font_matrix: [0.001, 0.0, 0.0, 0.001, 0.0, 0.0],
        ..Default::default()
    };
    if let Some(m) = parse_font_matrix(cleartext) {
        font.font_matrix = m;
    }
    font.encoding = parse_encoding(cleartext);

    let mut encrypted_start = eexec_pos + 5;
    while encrypted_start < data.len() && (data[encrypted_start] as char).is_whitespace() {
        encrypted_start += 1;
    }
    let encrypted = &data[encrypted_start..];
    let encrypted = if looks_like_hex(encrypted) {
        hex_decode(encrypted)
    } else {
        encrypted.to_vec()
    };
    let decrypted = decrypt_eexec(&encrypted);

    let len_iv = find_integer_after(&decrypted, b"/lenIV").unwrap_or(4);
    font.subrs = parse_subrs(&decrypted, len_iv);
    font.charstrings = parse_charstrings(&decrypted, len_iv);

    Ok(font)
}

fn looks_like_hex(data: &[u8]) -> bool {
    data.iter()
        .take(4)
        .all(|&b| b.is_ascii_hexdigit() || (b as char).is_whitespace())
}

fn hex_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut nibble: Option<u8> = None;
    for &b in data {
        let v = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => continue,
        };
        match nibble.take() {
            Some(hi) => out.push((hi << 4) | v),
            None => nibble = Some(v),
        }
    }
    out
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn find_integer_after(data: &[u8], marker: &[u8]) -> Option<i32> {
    let pos = find_subsequence(data, marker)? + marker.len();
    let rest = &data[pos..];
    let start = rest.iter().position(|b| !(*b as char).is_whitespace())?;
    let rest = &rest[start..];
    let end = rest
        .iter()
        .position(|b| !b.is_ascii_digit() && *b != b'-')
        .unwrap_or(rest.len());
    std::str::from_utf8(&rest[..end]).ok()?.parse().ok()
}

fn parse_font_matrix(cleartext: &[u8]) -> Option<[f64; 6]> {
    let pos = find_subsequence(cleartext, b"/FontMatrix")? + "/FontMatrix".len();
    let rest = &cleartext[pos..];
    let open = rest.iter().position(|&b| b == b'[')?;
    let close = rest.iter().position(|&b| b == b']')?;
    let text = std::str::from_utf8(&rest[open + 1..close]).ok()?;
    let values: Vec<f64> = text.split_whitespace().filter_map(|t| t.parse().ok()).collect();
    if values.len() == 6 {
        Some([values[0], values[1], values[2], values[3], values[4], values[5]])
    } else {
        None
    }
}

/// Parses `/Encoding 256 array ... dup <code> /<name> put ... readonly def`.
fn parse_encoding(cleartext: &[u8]) -> HashMap<u8, String> {
    let mut map = HashMap::new();
    let Some(start) = find_subsequence(cleartext, b"/Encoding") else {
        return map;
    };
    let text = String::from_utf8_lossy(&cleartext[start..]);
    let mut tokens = text.split_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if tok == "def" {
            break;
        }
        if tok == "dup" {
            let (Some(code_tok), Some(name_tok)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            if let (Ok(code), Some(name)) = (code_tok.parse::<u32>(), name_tok.strip_prefix('/')) {
                if code <= 255 {
                    map.insert(code as u8, name.to_string());
                }
            }
        }
    }
    map
}

/// Scans the decrypted private section for `/Subrs N array ... dup i len
/// RD <binary bytes> NP ... ND` entries.
fn parse_subrs(decrypted: &[u8], len_iv: i32) -> Vec<Vec<u8>> {
    let mut subrs = Vec::new();
    let Some(start) = find_subsequence(decrypted, b"/Subrs") else {
        return subrs;
    };
    let mut pos = start;
    while let Some(dup_rel) = find_subsequence(&decrypted[pos..], b"dup ") {
        let dup_pos = pos + dup_rel;
        if find_subsequence(&decrypted[dup_pos..], b"/CharStrings").map(|p| p == 0).unwrap_or(false) {
            break;
        }
        let Some((index, len, body_start)) = parse_dup_header(decrypted, dup_pos + 4) else {
            break;
        };
        if body_start + len > decrypted.len() {
            break;
        }
        let encrypted = &decrypted[body_start..body_start + len];
        while subrs.len() <= index {
            subrs.push(Vec::new());
        }
        subrs[index] = decrypt_charstring(encrypted, len_iv);
        pos = body_start + len;
        if find_subsequence(&decrypted[pos..pos.saturating_add(64).min(decrypted.len())], b"ND")
            .or_else(|| find_subsequence(&decrypted[pos..pos.saturating_add(64).min(decrypted.len())], b"|-"))
            .is_none()
        {
            // Keep scanning regardless; the next `dup ` search re-syncs.
        }
        if find_subsequence(&decrypted[pos..], b"CharStrings").map(|p| p < 8).unwrap_or(false) {
            break;
        }
    }
    subrs
}

/// Parses `<index> <len> RD` (or the abbreviation `-|`) starting just past
/// `dup `. Returns `(index, len, offset of first binary byte)`.
fn parse_dup_header(data: &[u8], pos: usize) -> Option<(usize, usize, usize)> {
    let text_end = (pos..data.len().min(pos + 64)).find(|&i| data[i] == b'R' || (data[i] == b'-' && data.get(i + 1) == Some(&b'|')))?;
    let header = std::str::from_utf8(&data[pos..text_end]).ok()?;
    let mut nums = header.split_whitespace();
    let index: usize = nums.next()?.parse().ok()?;
    let len: usize = nums.next()?.parse().ok()?;
    let after_rd = data[text_end..].iter().position(|&b| (b as char).is_whitespace())? + text_end + 1;
    Some((index, len, after_rd))
}

/// Scans `/CharStrings N dict dup begin ... /<name> <len> RD <bytes> ND ...
/// end`.
fn parse_charstrings(decrypted: &[u8], len_iv: i32) -> HashMap<String, Vec<u8>> {
    let mut map = HashMap::new();
    let Some(start) = find_subsequence(decrypted, b"/CharStrings") else {
        return map;
    };
    let mut pos = start;
    loop {
        let Some(slash_rel) = find_subsequence(&decrypted[pos..], b"/") else {
            break;
        };
        let name_start = pos + slash_rel + 1;
        let name_end = decrypted[name_start..]
            .iter()
            .position(|b| (*b as char).is_whitespace())
            .map(|p| name_start + p);
        let Some(name_end) = name_end else { break };
        let name = String::from_utf8_lossy(&decrypted[name_start..name_end]).into_owned();
        if name == "CharStrings" {
            pos = name_end;
            continue;
        }
        let Some((_idx_unused, len, body_start)) = parse_len_rd_header(decrypted, name_end) else {
            pos = name_end;
            if find_subsequence(&decrypted[pos..], b"end").map(|p| p < 4).unwrap_or(false) {
                break;
            }
            continue;
        };
        if body_start + len > decrypted.len() {
            break;
        }
        let encrypted = &decrypted[body_start..body_start + len];
        map.insert(name, decrypt_charstring(encrypted, len_iv));
        pos = body_start + len;
    }
    map
}

/// Parses `<len> RD` (no leading index, unlike `Subrs`' `dup i len RD`).
fn parse_len_rd_header(data: &[u8], pos: usize) -> Option<(usize, usize, usize)> {
    let search_end = data.len().min(pos + 32);
    let text_end = (pos..search_end).find(|&i| data[i] == b'R' || (data[i] == b'-' && data.get(i + 1) == Some(&b'|')))?;
    let header = std::str::from_utf8(&data[pos..text_end]).ok()?;
    let len: usize = header.split_whitespace().next()?.parse().ok()?;
    let after_rd = data[text_end..].iter().position(|&b| (b as char).is_whitespace())? + text_end + 1;
    Some((0, len, after_rd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eexec_decrypt_known_vector() {
        // From the Type 1 Font Format spec's worked example: encrypting
        // nothing with key 55665 and then decrypting the ciphertext of
        // a single zero byte recovers a deterministic plaintext byte.
        let ciphertext = encrypt(&[0u8; 4], EEXEC_KEY);
        let plaintext = decrypt(&ciphertext, EEXEC_KEY, 0);
        assert_eq!(plaintext, vec![0u8; 4]);
    }

    fn encrypt(data: &[u8], key: u16) -> Vec<u8> {
        let mut r = key;
        const C1: u16 = 52845;
        const C2: u16 = 22719;
        let mut out = Vec::with_capacity(data.len());
        for &p in data {
            let c = p ^ (r >> 8) as u8;
            r = (c as u16).wrapping_add(r).wrapping_mul(C1).wrapping_add(C2);
            out.push(c);
        }
        out
    }

    #[test]
    fn charstring_decrypt_round_trips() {
        let plaintext = b"hsbw endchar";
        let ciphertext = encrypt(plaintext, CHARSTRING_KEY);
        // Real fonts prepend lenIV garbage bytes; with lenIV=0 there is none.
        let recovered = decrypt_charstring(&ciphertext, 0);
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn len_iv_minus_one_means_unencrypted() {
        let data = b"raw bytes";
        assert_eq!(decrypt_charstring(data, -1), data);
    }

    #[test]
    fn parses_font_matrix_from_cleartext() {
        let cleartext = b"/FontMatrix [0.001 0 0 0.001 0 0] readonly def\n";
        let m = parse_font_matrix(cleartext).unwrap();
        assert_eq!(m, [0.001, 0.0, 0.0, 0.001, 0.0, 0.0]);
    }

    #[test]
    fn parses_simple_encoding_dup_entries() {
        let cleartext = b"/Encoding 256 array\n0 1 255 {1 index exch /.notdef put} for\ndup 65 /A put\ndup 97 /a put\nreadonly def\n";
        let enc = parse_encoding(cleartext);
        assert_eq!(enc.get(&65), Some(&"A".to_string()));
        assert_eq!(enc.get(&97), Some(&"a".to_string()));
    }
}
