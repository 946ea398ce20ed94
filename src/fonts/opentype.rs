//! OpenType/SFNT wrapper (spec §4.3 Stage 5): wraps an assembled CFF table
//! (see [`crate::fonts::cff_builder`]) in the minimal set of SFNT tables a
//! rasterizer needs to treat the result as an ordinary `OTTO`-flavored
//! OpenType font: `CFF `, `cmap`, `head`, `hhea`, `hmtx`, `maxp`, `name`,
//! `post`, `OS/2`.

/// One glyph's data for SFNT table synthesis.
#[derive(Debug, Clone)]
pub struct GlyphRecord {
    pub advance_width: u16,
    /// Unicode code point this glyph should be reachable by by via the
    /// synthesized `cmap`, if any (built from the font's encoding vector,
    /// spec §4.3 Stage 5).
    pub unicode: Option<u32>,
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

fn checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks(4);
    for chunk in &mut chunks {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(word));
    }
    sum
}

fn build_head(units_per_em: u16, num_glyphs: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(54);
    out.extend_from_slice(&0x00010000u32.to_be_bytes()); // version
    out.extend_from_slice(&0x00010000u32.to_be_bytes()); // fontRevision
    out.extend_from_slice(&0u32.to_be_bytes()); // checksumAdjustment, patched later
    out.extend_from_slice(&0x5F0F3CF5u32.to_be_bytes()); // magicNumber
    out.extend_from_slice(&0u16.to_be_bytes()); // flags
    out.extend_from_slice(&units_per_em.to_be_bytes());
    out.extend_from_slice(&0i64.to_be_bytes()); // created
    out.extend_from_slice(&0i64.to_be_bytes()); // modified
    out.extend_from_slice(&0i16.to_be_bytes()); // xMin
    out.extend_from_slice(&0i16.to_be_bytes()); // yMin
    out.extend_from_slice(&units_per_em.to_be_bytes()); // xMax (approximation)
    out.extend_from_slice(&units_per_em.to_be_bytes()); // yMax
    out.extend_from_slice(&0u16.to_be_bytes()); // macStyle
    out.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
    out.extend_from_slice(&2i16.to_be_bytes()); // fontDirectionHint
    out.extend_from_slice(&0i16.to_be_bytes()); // indexToLocFormat (unused, CFF outlines)
    out.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat
    let _ = num_glyphs;
    out
}

fn build_hhea(ascent: i16, descent: i16, num_h_metrics: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(36);
    out.extend_from_slice(&0x00010000u32.to_be_bytes());
    out.extend_from_slice(&ascent.to_be_bytes());
    out.extend_from_slice(&descent.to_be_bytes());
    out.extend_from_slice(&0i16.to_be_bytes()); // lineGap
    out.extend_from_slice(&(ascent as u16).to_be_bytes()); // advanceWidthMax (approximation)
    out.extend_from_slice(&0i16.to_be_bytes()); // minLSB
    out.extend_from_slice(&0i16.to_be_bytes()); // minRSB
    out.extend_from_slice(&0i16.to_be_bytes()); // xMaxExtent
    out.extend_from_slice(&1i16.to_be_bytes()); // caretSlopeRise
    out.extend_from_slice(&0i16.to_be_bytes()); // caretSlopeRun
    out.extend_from_slice(&0i16.to_be_bytes()); // caretOffset
    out.extend_from_slice(&[0u8; 8]); // reserved
    out.extend_from_slice(&0i16.to_be_bytes()); // metricDataFormat
    out.extend_from_slice(&num_h_metrics.to_be_bytes());
    out
}

fn build_hmtx(glyphs: &[GlyphRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(glyphs.len() * 4);
    for g in glyphs {
        out.extend_from_slice(&g.advance_width.to_be_bytes());
        out.extend_from_slice(&0i16.to_be_bytes()); // lsb
    }
    out
}

fn build_maxp(num_glyphs: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.extend_from_slice(&0x00005000u32.to_be_bytes()); // version 0.5, CFF outlines
    out.extend_from_slice(&(num_glyphs as u16).to_be_bytes());
    out
}

fn build_name(font_name: &str) -> Vec<u8> {
    let utf16: Vec<u8> = font_name
        .encode_utf16()
        .flat_map(|u| u.to_be_bytes())
        .collect();
    let records: [(u16, &[u8]); 6] = [
        (1, &utf16), // Family
        (2, b"\x00R\x00e\x00g\x00u\x00l\x00a\x00r"), // Subfamily: "Regular"
        (3, &utf16), // Unique identifier
        (4, &utf16), // Full name
        (5, b"\x001\x00.\x000"), // Version
        (6, &utf16), // PostScript name
    ];
    let mut header = Vec::new();
    header.extend_from_slice(&0u16.to_be_bytes()); // format
    header.extend_from_slice(&(records.len() as u16).to_be_bytes());
    let storage_offset = 6 + records.len() * 12;
    header.extend_from_slice(&(storage_offset as u16).to_be_bytes());

    let mut storage = Vec::new();
    for (name_id, value) in records {
        header.extend_from_slice(&3u16.to_be_bytes()); // platformID: Windows
        header.extend_from_slice(&1u16.to_be_bytes()); // encodingID: Unicode BMP
        header.extend_from_slice(&0x0409u16.to_be_bytes()); // languageID: en-US
        header.extend_from_slice(&name_id.to_be_bytes());
        header.extend_from_slice(&(value.len() as u16).to_be_bytes());
        header.extend_from_slice(&(storage.len() as u16).to_be_bytes());
        storage.extend_from_slice(value);
    }
    header.extend_from_slice(&storage);
    header
}

fn build_post() -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    out.extend_from_slice(&0x00030000u32.to_be_bytes()); // version 3.0: no glyph names
    out.extend_from_slice(&0i32.to_be_bytes()); // italicAngle
    out.extend_from_slice(&0i16.to_be_bytes()); // underlinePosition
    out.extend_from_slice(&0i16.to_be_bytes()); // underlineThickness
    out.extend_from_slice(&0u32.to_be_bytes()); // isFixedPitch
    out.extend_from_slice(&[0u8; 16]); // min/maxMemType42/1
    out
}

fn build_os2(ascent: i16, descent: i16) -> Vec<u8> {
    let mut out = Vec::with_capacity(96);
    out.extend_from_slice(&4u16.to_be_bytes()); // version
    out.extend_from_slice(&0i16.to_be_bytes()); // xAvgCharWidth
    out.extend_from_slice(&400u16.to_be_bytes()); // usWeightClass
    out.extend_from_slice(&5u16.to_be_bytes()); // usWidthClass
    out.extend_from_slice(&0u16.to_be_bytes()); // fsType
    for _ in 0..5 {
        out.extend_from_slice(&0i16.to_be_bytes()); // ySubscript/ySuperscript x/y size/offset (abridged)
    }
    out.extend_from_slice(&0i16.to_be_bytes()); // yStrikeoutSize
    out.extend_from_slice(&0i16.to_be_bytes()); // yStrikeoutPosition
    out.extend_from_slice(&0i16.to_be_bytes()); // sFamilyClass
    out.extend_from_slice(&[0u8; 10]); // panose
    out.extend_from_slice(&[0u8; 16]); // ulUnicodeRange 1-4
    out.extend_from_slice(b"NONE"); // achVendID
    out.extend_from_slice(&0u16.to_be_bytes()); // fsSelection
    out.extend_from_slice(&0u16.to_be_bytes()); // usFirstCharIndex
    out.extend_from_slice(&0xFFFFu16.to_be_bytes()); // usLastCharIndex
    out.extend_from_slice(&ascent.to_be_bytes()); // sTypoAscender
    out.extend_from_slice(&descent.to_be_bytes()); // sTypoDescender
    out.extend_from_slice(&0i16.to_be_bytes()); // sTypoLineGap
    out.extend_from_slice(&(ascent as u16).to_be_bytes()); // usWinAscent
    out.extend_from_slice(&(-descent as u16).to_be_bytes()); // usWinDescent
    out.extend_from_slice(&[0u8; 8]); // ulCodePageRange1/2
    out.extend_from_slice(&(ascent / 2).to_be_bytes()); // sxHeight
    out.extend_from_slice(&ascent.to_be_bytes()); // sCapHeight
    out.extend_from_slice(&0u16.to_be_bytes()); // usDefaultChar
    out.extend_from_slice(&32u16.to_be_bytes()); // usBreakChar
    out.extend_from_slice(&1u16.to_be_bytes()); // usMaxContext
    out
}

/// Builds a format-4 segment-mapping `cmap` subtable if any glyph has a
/// Unicode code point above 0xFF, otherwise a format 0 byte-encoding
/// table (spec §4.3 Stage 5: "synthesized from the encoding vector").
fn build_cmap(glyphs: &[GlyphRecord]) -> Vec<u8> {
    let pairs: Vec<(u32, u16)> = glyphs
        .iter()
        .enumerate()
        .filter_map(|(gid, g)| g.unicode.map(|u| (u, gid as u16)))
        .collect();

    let needs_format4 = pairs.iter().any(|&(cp, _)| cp > 0xFF);
    let subtable = if needs_format4 {
        build_cmap_format4(&pairs)
    } else {
        build_cmap_format0(&pairs)
    };

    let mut out = Vec::new();
    out.extend_from_slice(&0u16.to_be_bytes()); // version
    out.extend_from_slice(&1u16.to_be_bytes()); // numTables
    out.extend_from_slice(&3u16.to_be_bytes()); // platformID: Windows
    out.extend_from_slice(&1u16.to_be_bytes()); // encodingID: Unicode BMP
    out.extend_from_slice(&12u32.to_be_bytes()); // offset: right after this record
    out.extend_from_slice(&subtable);
    out
}

fn build_cmap_format0(pairs: &[(u32, u16)]) -> Vec<u8> {
    let mut glyph_ids = [0u8; 256];
    for &(cp, gid) in pairs {
        if cp < 256 {
            glyph_ids[cp as usize] = gid as u8;
        }
    }
    let mut out = Vec::with_capacity(262);
    out.extend_from_slice(&0u16.to_be_bytes()); // format
    out.extend_from_slice(&262u16.to_be_bytes()); // length
    out.extend_from_slice(&0u16.to_be_bytes()); // language
    out.extend_from_slice(&glyph_ids);
    out
}

fn build_cmap_format4(pairs: &[(u32, u16)]) -> Vec<u8> {
    let mut sorted = pairs.to_vec();
    sorted.sort_by_key(|&(cp, _)| cp);
    sorted.dedup_by_key(|&mut (cp, _)| cp);

    // One segment per contiguous run of (code point, gid) both
    // incrementing by 1 — the common case for a synthesized encoding
    // cmap is already small enough that per-code segments are fine.
    let mut segments: Vec<(u32, u32, u16)> = Vec::new(); // (start, end, start_gid)
    for &(cp, gid) in &sorted {
        if let Some(last) = segments.last_mut() {
            if last.1 + 1 == cp && last.2 as u32 + (last.1 - last.0) + 1 == gid as u32 {
                last.1 = cp;
                continue;
            }
        }
        segments.push((cp, cp, gid));
    }
    segments.push((0xFFFF, 0xFFFF, 0)); // required terminator segment

    let seg_count = segments.len();
    let mut end_codes = Vec::new();
    let mut start_codes = Vec::new();
    let mut id_deltas = Vec::new();
    let mut id_range_offsets = Vec::new();
    for &(start, end, start_gid) in &segments {
        end_codes.extend_from_slice(&(end as u16).to_be_bytes());
        start_codes.extend_from_slice(&(start as u16).to_be_bytes());
        let delta = if start == 0xFFFF { 1i16 } else { (start_gid as i32 - start as i32) as i16 };
        id_deltas.extend_from_slice(&delta.to_be_bytes());
        id_range_offsets.extend_from_slice(&0u16.to_be_bytes());
    }

    let mut out = Vec::new();
    let length_placeholder = out.len();
    out.extend_from_slice(&4u16.to_be_bytes()); // format
    out.extend_from_slice(&0u16.to_be_bytes()); // length, patched below
    out.extend_from_slice(&0u16.to_be_bytes()); // language
    let seg_count_x2 = (seg_count * 2) as u16;
    out.extend_from_slice(&seg_count_x2.to_be_bytes());
    let search_range = {
        let mut pow2 = 1u16;
        while (pow2 as usize) * 2 <= seg_count {
            pow2 *= 2;
        }
        pow2 * 2
    };
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&((search_range as f64).log2() as u16).to_be_bytes());
    out.extend_from_slice(&(seg_count_x2 - search_range).to_be_bytes());
    out.extend_from_slice(&end_codes);
    out.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    out.extend_from_slice(&start_codes);
    out.extend_from_slice(&id_deltas);
    out.extend_from_slice(&id_range_offsets);

    let len = out.len() as u16;
    out[length_placeholder + 2..length_placeholder + 4].copy_from_slice(&len.to_be_bytes());
    out
}

/// Builds a complete `OTTO`-flavored OpenType font wrapping `cff_data`
/// (spec §4.3 Stage 5).
pub fn build_opentype(cff_data: &[u8], glyphs: &[GlyphRecord], font_name: &str, ascent: i16, descent: i16) -> Vec<u8> {
    let tables: Vec<(&[u8; 4], Vec<u8>)> = vec![
        (b"CFF ", cff_data.to_vec()),
        (b"OS/2", build_os2(ascent, descent)),
        (b"cmap", build_cmap(glyphs)),
        (b"head", build_head(1000, glyphs.len())),
        (b"hhea", build_hhea(ascent, descent, glyphs.len() as u16)),
        (b"hmtx", build_hmtx(glyphs)),
        (b"maxp", build_maxp(glyphs.len())),
        (b"name", build_name(font_name)),
        (b"post", build_post()),
    ];
    build_sfnt(b"OTTO", tables)
}

fn build_sfnt(sfnt_tag: &[u8; 4], mut tables: Vec<(&[u8; 4], Vec<u8>)>) -> Vec<u8> {
    tables.sort_by_key(|(tag, _)| **tag);
    let num_tables = tables.len() as u16;
    let mut search_range = 1u16;
    let mut entry_selector = 0u16;
    while (search_range as u32) * 16 <= num_tables as u32 * 16 && (search_range * 2) as u32 <= num_tables as u32 {
        search_range *= 2;
        entry_selector += 1;
    }
    search_range *= 16;
    let range_shift = num_tables * 16 - search_range;

    let header_len = 12 + tables.len() * 16;
    let mut directory = Vec::with_capacity(header_len);
    directory.extend_from_slice(sfnt_tag);
    directory.extend_from_slice(&num_tables.to_be_bytes());
    directory.extend_from_slice(&search_range.to_be_bytes());
    directory.extend_from_slice(&entry_selector.to_be_bytes());
    directory.extend_from_slice(&range_shift.to_be_bytes());

    let mut body = Vec::new();
    let mut head_checksum_offset = None;
    let mut offset = header_len as u32;
    for (tag, data) in &tables {
        let table_checksum = checksum(data);
        directory.extend_from_slice(*tag);
        directory.extend_from_slice(&table_checksum.to_be_bytes());
        directory.extend_from_slice(&offset.to_be_bytes());
        directory.extend_from_slice(&(data.len() as u32).to_be_bytes());
        if tag == &b"head" {
            head_checksum_offset = Some(body.len() + 8);
        }
        body.extend_from_slice(data);
        pad4(&mut body);
        offset = (header_len + body.len()) as u32;
    }

    let mut font = directory;
    font.extend_from_slice(&body);

    if let Some(rel) = head_checksum_offset {
        let abs = header_len + rel;
        let whole_checksum = checksum(&font);
        let adjustment = 0xB1B0AFAFu32.wrapping_sub(whole_checksum);
        font[abs..abs + 4].copy_from_slice(&adjustment.to_be_bytes());
    }
    font
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sfnt_tag_and_table_count_are_correct() {
        let glyphs = vec![
            GlyphRecord { advance_width: 0, unicode: None },
            GlyphRecord { advance_width: 600, unicode: Some('A' as u32) },
        ];
        let font = build_opentype(&[0u8; 16], &glyphs, "Test", 800, -200);
        assert_eq!(&font[0..4], b"OTTO");
        let num_tables = u16::from_be_bytes([font[4], font[5]]);
        assert_eq!(num_tables, 9);
    }

    #[test]
    fn cmap_format0_used_for_ascii_only_glyphs() {
        let glyphs = vec![
            GlyphRecord { advance_width: 0, unicode: None },
            GlyphRecord { advance_width: 600, unicode: Some(0x41) },
        ];
        let cmap = build_cmap(&glyphs);
        // subtable starts at byte 12, format field is its first u16.
        let format = u16::from_be_bytes([cmap[12], cmap[13]]);
        assert_eq!(format, 0);
    }

    #[test]
    fn cmap_format4_used_when_above_latin1() {
        let glyphs = vec![
            GlyphRecord { advance_width: 0, unicode: None },
            GlyphRecord { advance_width: 600, unicode: Some(0x3042) },
        ];
        let cmap = build_cmap(&glyphs);
        let format = u16::from_be_bytes([cmap[12], cmap[13]]);
        assert_eq!(format, 4);
    }

    #[test]
    fn maxp_reports_version_point_five_for_cff_outlines() {
        let maxp = build_maxp(10);
        let version = u32::from_be_bytes([maxp[0], maxp[1], maxp[2], maxp[3]]);
        assert_eq!(version, 0x00005000);
    }
}
