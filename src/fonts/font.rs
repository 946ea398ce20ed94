//! Top-level font dispatch (spec §3 `Font`, §4.1): resolves a PDF font
//! dictionary into a `Simple`/`Type3`/`Composite` font and implements the
//! shared `FontBase` contract every caller actually needs: turn a
//! content-stream text string into codes, then each code into a GID, a
//! width, and (for extraction) a Unicode string.

use crate::config::EngineOptions;
use crate::error::{Error, Result};
use crate::external::{ObjectRef, PdfDict, PdfStream, PdfValue};
use crate::fonts::cff::CffFont;
use crate::fonts::cid_mappings;
use crate::fonts::cmap::{CMap, CharacterCode};
use crate::fonts::descriptor::FontDescriptor;
use crate::fonts::encoding::{BaseEncoding, EncodingState};
use crate::fonts::truetype::TrueTypeFont;
use crate::fonts::widths::{CidFontVerticalMetrics, CidFontWidths, SimpleFontWidths, W2ArrayEntry, WArrayEntry};
use std::collections::HashMap;
use std::sync::Mutex;

/// The contract every font variant implements (spec §3): code extraction,
/// glyph resolution, width, and Unicode lookup.
pub trait FontBase {
    /// Splits a content-stream text-showing operand into character codes.
    fn extract_codes(&self, bytes: &[u8]) -> Vec<CharacterCode>;
    /// Resolves a code to a glyph ID in the embedded font program, or
    /// `None` if there is no embedded program (caller substitutes) or the
    /// font has no numeric-GID concept (Type 3).
    fn get_gid(&self, code: &CharacterCode) -> Option<u16>;
    /// Advance width in text space (1 unit = 1 em).
    fn get_width(&self, code: &CharacterCode) -> f32;
    /// Best-effort Unicode string for text extraction (spec §4.1 priority
    /// chain: ToUnicode, then predefined CID collection, then glyph name).
    fn get_unicode(&self, code: &CharacterCode) -> Option<String>;
}

/// `/FontFile`, `/FontFile2`, or `/FontFile3` parsed into something the
/// engine can resolve codes/CIDs against.
pub enum EmbeddedProgram {
    TrueType(Vec<u8>),
    Cff(CffFont),
}

impl EmbeddedProgram {
    fn truetype(&self) -> Option<TrueTypeFont<'_>> {
        match self {
            EmbeddedProgram::TrueType(data) => TrueTypeFont::parse(data).ok(),
            EmbeddedProgram::Cff(_) => None,
        }
    }
}

/// A simple font (`/Subtype` one of `Type1`, `TrueType`, `MMType1`):
/// one byte per code, widths indexed `[FirstChar, LastChar]`.
pub struct SimpleFont {
    pub encoding: EncodingState,
    pub descriptor: FontDescriptor,
    pub widths: SimpleFontWidths,
    pub to_unicode: Option<CMap>,
    pub embedded: Option<EmbeddedProgram>,
}

impl FontBase for SimpleFont {
    fn extract_codes(&self, bytes: &[u8]) -> Vec<CharacterCode> {
        bytes.iter().map(|&b| vec![b]).collect()
    }

    fn get_gid(&self, code: &CharacterCode) -> Option<u16> {
        let &[byte] = code.as_slice() else { return None };
        match &self.embedded {
            Some(EmbeddedProgram::Cff(cff)) => {
                let name = self.encoding.glyph_name(byte);
                if name.is_empty() {
                    return None;
                }
                (0..cff.charstrings.len() as u16).find(|&gid| cff.glyph_name(gid).as_deref() == Some(name))
            }
            Some(EmbeddedProgram::TrueType(_)) => {
                let face = self.embedded.as_ref()?.truetype()?;
                if self.descriptor.is_symbolic() {
                    face.gid_for_symbolic_code(byte)
                } else {
                    let name = self.encoding.glyph_name(byte);
                    let unicode = crate::fonts::adobe_glyph_list::glyph_name_to_unicode(name)?;
                    face.gid_for_unicode(unicode as u32)
                }
            }
            None => None,
        }
    }

    fn get_width(&self, code: &CharacterCode) -> f32 {
        let &[byte] = code.as_slice() else { return 0.0 };
        self.widths.width_for_code(byte as u32)
    }

    fn get_unicode(&self, code: &CharacterCode) -> Option<String> {
        if let Some(cmap) = &self.to_unicode {
            if let Some(u) = cmap.unicode_for_code(code) {
                return Some(u);
            }
        }
        let &[byte] = code.as_slice() else { return None };
        let name = self.encoding.glyph_name(byte);
        if name.is_empty() {
            return None;
        }
        crate::fonts::adobe_glyph_list::glyph_name_to_unicode(name).map(|c| c.to_string())
    }
}

/// A Type 3 font: glyphs are content-stream procedures, not outlines —
/// `get_gid` always returns `None`; callers needing the glyph procedure
/// name use [`Type3Font::glyph_proc_name`] directly.
pub struct Type3Font {
    pub encoding: EncodingState,
    pub widths: SimpleFontWidths,
    /// `/FontMatrix`, glyph space -> text space.
    pub font_matrix: [f64; 6],
    pub to_unicode: Option<CMap>,
}

impl Type3Font {
    pub fn glyph_proc_name(&self, code: u8) -> Option<&str> {
        let name = self.encoding.glyph_name(code);
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

impl FontBase for Type3Font {
    fn extract_codes(&self, bytes: &[u8]) -> Vec<CharacterCode> {
        bytes.iter().map(|&b| vec![b]).collect()
    }

    fn get_gid(&self, _code: &CharacterCode) -> Option<u16> {
        None
    }

    fn get_width(&self, code: &CharacterCode) -> f32 {
        let &[byte] = code.as_slice() else { return 0.0 };
        self.widths.width_for_code(byte as u32)
    }

    fn get_unicode(&self, code: &CharacterCode) -> Option<String> {
        if let Some(cmap) = &self.to_unicode {
            if let Some(u) = cmap.unicode_for_code(code) {
                return Some(u);
            }
        }
        let &[byte] = code.as_slice() else { return None };
        let name = self.encoding.glyph_name(byte);
        crate::fonts::adobe_glyph_list::glyph_name_to_unicode(name).map(|c| c.to_string())
    }
}

/// `/CIDToGIDMap` for a `CIDFontType2` descendant (spec §3).
pub enum CIDToGIDMap {
    Identity,
    Explicit(Vec<u16>),
}

impl CIDToGIDMap {
    pub fn get_gid(&self, cid: u32) -> u16 {
        match self {
            CIDToGIDMap::Identity => cid as u16,
            CIDToGIDMap::Explicit(table) => table.get(cid as usize).copied().unwrap_or(0),
        }
    }
}

/// The descendant font program of a composite (`Type0`) font.
pub enum CidFontProgram {
    /// `CIDFontType0C`: CFF's own charset maps GID <-> CID directly.
    Cff(CffFont),
    /// `CIDFontType2`: TrueType, GID comes from `/CIDToGIDMap`.
    TrueType(Vec<u8>, CIDToGIDMap),
}

/// `/Registry`+`/Ordering` for predefined CID collections (spec §4.1
/// priority 2 of Unicode resolution).
#[derive(Debug, Clone, PartialEq)]
pub enum CidCollection {
    AdobeGB1,
    AdobeJapan1,
    AdobeCNS1,
    AdobeKorea1,
    Other,
}

impl CidCollection {
    pub fn from_registry_ordering(registry: &str, ordering: &str) -> Self {
        if registry != "Adobe" {
            return CidCollection::Other;
        }
        match ordering {
            "GB1" => CidCollection::AdobeGB1,
            "Japan1" => CidCollection::AdobeJapan1,
            "CNS1" => CidCollection::AdobeCNS1,
            "Korea1" => CidCollection::AdobeKorea1,
            _ => CidCollection::Other,
        }
    }

    fn lookup(&self, cid: u16) -> Option<u32> {
        match self {
            CidCollection::AdobeGB1 => cid_mappings::lookup_adobe_gb1(cid),
            CidCollection::AdobeJapan1 => cid_mappings::lookup_adobe_japan1(cid),
            CidCollection::AdobeCNS1 => cid_mappings::lookup_adobe_cns1(cid),
            CidCollection::AdobeKorea1 => cid_mappings::lookup_adobe_korea1(cid),
            CidCollection::Other => None,
        }
    }
}

/// A composite (`Type0`) font: an encoding CMap maps codes to CIDs, then
/// the descendant font program maps CIDs to GIDs.
pub struct CompositeFont {
    pub encoding_cmap: CMap,
    pub program: CidFontProgram,
    pub widths: CidFontWidths,
    pub vertical_metrics: Option<CidFontVerticalMetrics>,
    pub collection: CidCollection,
    pub to_unicode: Option<CMap>,
}

impl CompositeFont {
    fn cid_for_code(&self, code: &CharacterCode) -> u32 {
        self.encoding_cmap.cid_for_code(code).unwrap_or(0)
    }
}

impl FontBase for CompositeFont {
    fn extract_codes(&self, bytes: &[u8]) -> Vec<CharacterCode> {
        self.encoding_cmap.extract_codes(bytes)
    }

    fn get_gid(&self, code: &CharacterCode) -> Option<u16> {
        let cid = self.cid_for_code(code);
        match &self.program {
            CidFontProgram::Cff(cff) => cff.gid_for_cid(cid as u16),
            CidFontProgram::TrueType(_, map) => Some(map.get_gid(cid)),
        }
    }

    fn get_width(&self, code: &CharacterCode) -> f32 {
        self.widths.width_for_cid(self.cid_for_code(code))
    }

    fn get_unicode(&self, code: &CharacterCode) -> Option<String> {
        if let Some(cmap) = &self.to_unicode {
            if let Some(u) = cmap.unicode_for_code(code) {
                return Some(u);
            }
        }
        let cid = self.cid_for_code(code);
        self.collection
            .lookup(cid as u16)
            .and_then(char::from_u32)
            .map(|c| c.to_string())
    }
}

/// Vertical writing mode metrics for a composite font in `/WMode 1`
/// text (spec §8 scenario 2); not part of [`FontBase`] since only
/// vertical layout callers need it.
impl CompositeFont {
    pub fn vertical_metrics_for_code(&self, code: &CharacterCode) -> Option<(f32, f32, f32)> {
        self.vertical_metrics.as_ref().map(|vm| vm.metrics_for_cid(self.cid_for_code(code)))
    }
}

/// A resolved PDF font (spec §3 `Font`).
pub enum Font {
    Simple(SimpleFont),
    Type3(Type3Font),
    Composite(CompositeFont),
}

impl FontBase for Font {
    fn extract_codes(&self, bytes: &[u8]) -> Vec<CharacterCode> {
        match self {
            Font::Simple(f) => f.extract_codes(bytes),
            Font::Type3(f) => f.extract_codes(bytes),
            Font::Composite(f) => f.extract_codes(bytes),
        }
    }

    fn get_gid(&self, code: &CharacterCode) -> Option<u16> {
        match self {
            Font::Simple(f) => f.get_gid(code),
            Font::Type3(f) => f.get_gid(code),
            Font::Composite(f) => f.get_gid(code),
        }
    }

    fn get_width(&self, code: &CharacterCode) -> f32 {
        match self {
            Font::Simple(f) => f.get_width(code),
            Font::Type3(f) => f.get_width(code),
            Font::Composite(f) => f.get_width(code),
        }
    }

    fn get_unicode(&self, code: &CharacterCode) -> Option<String> {
        match self {
            Font::Simple(f) => f.get_unicode(code),
            Font::Type3(f) => f.get_unicode(code),
            Font::Composite(f) => f.get_unicode(code),
        }
    }
}

impl Font {
    /// Resolves a `Type0` font's `/Encoding` name to its CMap (spec §4.1):
    /// `Identity-H`/`Identity-V` are built in; any other predefined name
    /// (e.g. `UniGB-UCS2-H`) is out of scope for this engine without an
    /// external CMap resource and falls back to `Identity-H` rather than
    /// failing the whole font.
    fn resolve_predefined_cmap(name: &str) -> CMap {
        match name {
            "Identity-V" => CMap::identity(1),
            _ => CMap::identity(0),
        }
    }

    /// Builds a [`Font`] from a font dictionary (spec §6 external
    /// interface boundary). `opts` bounds `usecmap` chain depth.
    pub fn for_object(dict: &dyn PdfDict, opts: &EngineOptions) -> Result<Font> {
        let subtype = dict.get_name("Subtype").unwrap_or("");
        match subtype {
            "Type0" => Self::build_composite(dict, opts),
            "Type3" => Self::build_type3(dict),
            _ => Self::build_simple(dict),
        }
    }

    fn build_simple(dict: &dyn PdfDict) -> Result<Font> {
        let descriptor = read_descriptor(dict);
        let encoding = read_simple_encoding(dict, &descriptor);
        let first_char = dict.get_integer_or_default("FirstChar", 0) as u32;
        let widths_array = read_number_array(dict, "Widths");
        let missing_width = descriptor.missing_width;
        let widths = SimpleFontWidths::new(first_char, widths_array, missing_width);
        let to_unicode = read_tounicode(dict);
        let embedded = read_embedded_program(dict);

        Ok(Font::Simple(SimpleFont {
            encoding,
            descriptor,
            widths,
            to_unicode,
            embedded,
        }))
    }

    fn build_type3(dict: &dyn PdfDict) -> Result<Font> {
        let encoding = read_simple_encoding(dict, &FontDescriptor::default());
        let first_char = dict.get_integer_or_default("FirstChar", 0) as u32;
        let widths_array = read_number_array(dict, "Widths");
        let widths = SimpleFontWidths::new(first_char, widths_array, 0.0);
        let font_matrix = read_font_matrix(dict);
        let to_unicode = read_tounicode(dict);
        Ok(Font::Type3(Type3Font {
            encoding,
            widths,
            font_matrix,
            to_unicode,
        }))
    }

    fn build_composite(dict: &dyn PdfDict, opts: &EngineOptions) -> Result<Font> {
        let encoding_name = dict.get_name("Encoding").unwrap_or("Identity-H");
        let encoding_cmap = Self::resolve_predefined_cmap(encoding_name);
        let _ = opts; // embedded-stream CMaps go through parse_cmap with opts.max_cmap_chain_depth

        let descendant_dict = dict
            .get_array_dictionary("DescendantFonts", 0)
            .ok_or_else(|| Error::malformed("Type0 font has no DescendantFonts"))?;

        let cid_system_info = descendant_dict
            .get_dictionary("CIDSystemInfo")
            .map(|d| {
                let registry = d.get_string("Registry").map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
                let ordering = d.get_string("Ordering").map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
                (registry, ordering)
            })
            .unwrap_or_default();
        let collection = CidCollection::from_registry_ordering(&cid_system_info.0, &cid_system_info.1);

        let default_width = descendant_dict.get_float_or_default("DW", 1000.0);
        let mut widths = CidFontWidths::new(default_width);
        if let Some(w_array) = descendant_dict.get_array("W") {
            widths.parse_w_array(&parse_w_array(w_array));
        }

        let dw2 = descendant_dict
            .get_array("DW2")
            .map(|values| {
                let nums: Vec<f32> = values.iter().filter_map(number_value).map(|n| n as f32).collect();
                if nums.len() == 2 {
                    [nums[0], nums[1]]
                } else {
                    [880.0, -1000.0]
                }
            })
            .unwrap_or([880.0, -1000.0]);
        let mut vertical_metrics = CidFontVerticalMetrics::new(dw2);
        if let Some(w2_array) = descendant_dict.get_array("W2") {
            vertical_metrics.parse_w2_array(&parse_w2_array(w2_array));
        }

        let subtype = descendant_dict.get_name("Subtype").unwrap_or("CIDFontType2");
        let program = if subtype == "CIDFontType0" {
            let cff_bytes = descendant_dict
                .get_dictionary("FontDescriptor")
                .and_then(|fd| fd.get_stream("FontFile3"));
            let cff = cff_bytes
                .and_then(|b| crate::fonts::cff::parse_cff(&b).ok())
                .ok_or_else(|| Error::SubstitutionRequired("CIDFontType0C program missing or malformed".to_string()))?;
            CidFontProgram::Cff(cff)
        } else {
            let tt_bytes = descendant_dict
                .get_dictionary("FontDescriptor")
                .and_then(|fd| fd.get_stream("FontFile2"))
                .unwrap_or_default();
            let cid_to_gid = read_cid_to_gid_map(descendant_dict);
            CidFontProgram::TrueType(tt_bytes, cid_to_gid)
        };

        let to_unicode = read_tounicode(dict);

        Ok(Font::Composite(CompositeFont {
            encoding_cmap,
            program,
            widths,
            vertical_metrics: Some(vertical_metrics),
            collection,
            to_unicode,
        }))
    }
}

fn read_descriptor(dict: &dyn PdfDict) -> FontDescriptor {
    let mut d = FontDescriptor::default();
    if let Some(fd) = dict.get_dictionary("FontDescriptor") {
        d.flags = crate::fonts::descriptor::FontFlags::from_bits_truncate(fd.get_integer_or_default("Flags", 0) as u32);
        d.italic_angle = fd.get_float_or_default("ItalicAngle", 0.0);
        d.ascent = fd.get_float_or_default("Ascent", 0.0);
        d.descent = fd.get_float_or_default("Descent", 0.0);
        d.cap_height = fd.get_float_or_default("CapHeight", 0.0);
        d.stem_v = fd.get_float_or_default("StemV", 0.0);
        d.missing_width = fd.get_float_or_default("MissingWidth", 0.0);
    }
    d
}

fn read_simple_encoding(dict: &dyn PdfDict, descriptor: &FontDescriptor) -> EncodingState {
    let default_base = if descriptor.is_symbolic() {
        BaseEncoding::Unknown
    } else {
        BaseEncoding::Standard
    };
    if let Some(name) = dict.get_name("Encoding") {
        return EncodingState::new(BaseEncoding::from_name(name), Vec::new());
    }
    if let Some(encoding_dict) = dict.get_dictionary("Encoding") {
        let base = encoding_dict
            .get_name("BaseEncoding")
            .map(BaseEncoding::from_name)
            .unwrap_or(default_base);
        let differences = encoding_dict
            .get_array("Differences")
            .map(parse_differences)
            .unwrap_or_default();
        return EncodingState::new(base, differences);
    }
    EncodingState::new(default_base, Vec::new())
}

/// Parses a `/Differences` array (`[code name name ... code name ...]`,
/// spec §3 `Differences`): a number sets the running code, each following
/// name is assigned to that code and increments it.
fn parse_differences(values: &[crate::external::PdfValue]) -> Vec<(u8, String)> {
    let mut out = Vec::new();
    let mut code: i64 = 0;
    for value in values {
        match value {
            crate::external::PdfValue::Number(n) => code = *n as i64,
            crate::external::PdfValue::Name(name) => {
                if (0..=255).contains(&code) {
                    out.push((code as u8, name.clone()));
                }
                code += 1;
            }
            _ => {}
        }
    }
    out
}

fn read_number_array(dict: &dyn PdfDict, key: &str) -> Vec<f32> {
    dict.get_array(key)
        .map(|values| {
            values
                .iter()
                .map(|v| match v {
                    crate::external::PdfValue::Number(n) => *n as f32,
                    _ => 0.0,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn read_font_matrix(dict: &dyn PdfDict) -> [f64; 6] {
    let values = read_number_array(dict, "FontMatrix");
    if values.len() == 6 {
        let mut m = [0.0; 6];
        for (i, v) in values.iter().enumerate() {
            m[i] = *v as f64;
        }
        m
    } else {
        [0.001, 0.0, 0.0, 0.001, 0.0, 0.0]
    }
}

fn read_tounicode(dict: &dyn PdfDict) -> Option<CMap> {
    let bytes = dict.get_stream("ToUnicode")?;
    crate::fonts::cmap::parse_tounicode_cmap(&bytes).ok()
}

/// Reads a simple font's embedded program (spec §4.3 Stage 1/2): a
/// `/FontFile` (Type 1) is translated through the Type1->CFF pipeline, a
/// `/FontFile2` is used as-is, a `/FontFile3` is parsed as bare CFF.
fn read_embedded_program(dict: &dyn PdfDict) -> Option<EmbeddedProgram> {
    let descriptor = dict.get_dictionary("FontDescriptor")?;
    if let Some(bytes) = descriptor.get_stream("FontFile2") {
        return Some(EmbeddedProgram::TrueType(bytes));
    }
    if let Some(bytes) = descriptor.get_stream("FontFile3") {
        return crate::fonts::cff::parse_cff(&bytes).ok().map(EmbeddedProgram::Cff);
    }
    if let Some(bytes) = descriptor.get_stream("FontFile") {
        return translate_type1_to_cff(&bytes).ok();
    }
    None
}

/// Runs the Type 1 -> CFF pipeline end to end (spec §4.3 Stages 1-4): eexec
/// decryption and charstring extraction, per-glyph Type1->Type2 charstring
/// translation (seac composition resolved immediately against sibling
/// glyphs), then CFF reassembly.
fn translate_type1_to_cff(data: &[u8]) -> Result<EmbeddedProgram> {
    let font = crate::fonts::type1::parse_type1(data)?;
    let mut names: Vec<String> = vec![".notdef".to_string()];
    let mut raw_charstrings: Vec<(String, Vec<u8>)> = Vec::new();
    for (name, cs) in &font.charstrings {
        if name != ".notdef" {
            names.push(name.clone());
        }
        raw_charstrings.push((name.clone(), cs.clone()));
    }

    let mut translated: HashMap<String, crate::fonts::charstring::TranslationOutcome> = HashMap::new();
    for (name, cs) in &raw_charstrings {
        let outcome = crate::fonts::charstring::translate_charstring(cs, &font.subrs)?;
        translated.insert(name.clone(), outcome);
    }

    let mut final_charstrings = Vec::with_capacity(names.len());
    for name in &names {
        let outcome = translated
            .get(name)
            .ok_or_else(|| Error::malformed(format!("missing charstring for glyph {name}")))?;
        if let Some(seac) = &outcome.seac {
            let base_name = font.encoding.get(&seac.base_code);
            let accent_name = font.encoding.get(&seac.accent_code);
            let (base_cs, accent_cs) = match (base_name, accent_name) {
                (Some(b), Some(a)) => (
                    translated.get(b).map(|o| o.charstring.clone()).unwrap_or_default(),
                    translated.get(a).map(|o| o.charstring.clone()).unwrap_or_default(),
                ),
                _ => (Vec::new(), Vec::new()),
            };
            final_charstrings.push(crate::fonts::charstring::compose_seac(&base_cs, &accent_cs, seac.adx, seac.ady));
        } else {
            final_charstrings.push(outcome.charstring.clone());
        }
    }

    let encoding_codes: Vec<(u8, u16)> = font
        .encoding
        .iter()
        .filter_map(|(&code, name)| names.iter().position(|n| n == name).map(|gid| (code, gid as u16)))
        .collect();

    let cff_bytes = crate::fonts::cff_builder::build_cff("EmbeddedType1", &names, &final_charstrings, &encoding_codes)?;
    let cff = crate::fonts::cff::parse_cff(&cff_bytes)?;
    Ok(EmbeddedProgram::Cff(cff))
}

/// Reads `/CIDToGIDMap` (spec §4.1): `/Identity` or absence means the CID
/// is the GID; a stream is a big-endian `u16`-per-CID lookup table.
fn read_cid_to_gid_map(dict: &dyn PdfDict) -> CIDToGIDMap {
    if let Some(bytes) = dict.get_stream("CIDToGIDMap") {
        let table = bytes.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
        return CIDToGIDMap::Explicit(table);
    }
    CIDToGIDMap::Identity
}

fn number_value(value: &PdfValue) -> Option<f64> {
    match value {
        PdfValue::Number(n) => Some(*n),
        _ => None,
    }
}

/// Splits a `/W` array into `WArrayEntry`s (spec §3 `CidFontWidths`): each
/// entry starts with a CID, followed by either a nested array of individual
/// widths or a last-CID/width pair for a range.
fn parse_w_array(values: &[PdfValue]) -> Vec<WArrayEntry> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let start_cid = match number_value(&values[i]) {
            Some(n) => n as u32,
            None => {
                i += 1;
                continue;
            }
        };
        i += 1;
        if i >= values.len() {
            break;
        }
        match &values[i] {
            PdfValue::Array(inner) => {
                let widths: Vec<f32> = inner.iter().filter_map(number_value).map(|n| n as f32).collect();
                out.push(WArrayEntry::Individual { start_cid, widths });
                i += 1;
            }
            other => {
                let last_cid = match number_value(other) {
                    Some(n) => n as u32,
                    None => {
                        i += 1;
                        continue;
                    }
                };
                i += 1;
                if i >= values.len() {
                    break;
                }
                let width = number_value(&values[i]).unwrap_or(0.0) as f32;
                i += 1;
                out.push(WArrayEntry::Range { first_cid: start_cid, last_cid, width });
            }
        }
    }
    out
}

/// Splits a `/W2` array into `W2ArrayEntry`s (spec §3
/// `CidFontVerticalMetrics`), mirroring `/W`'s two forms but with a 3-tuple
/// per CID instead of a single width.
fn parse_w2_array(values: &[PdfValue]) -> Vec<W2ArrayEntry> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let start_cid = match number_value(&values[i]) {
            Some(n) => n as u32,
            None => {
                i += 1;
                continue;
            }
        };
        i += 1;
        if i >= values.len() {
            break;
        }
        match &values[i] {
            PdfValue::Array(inner) => {
                let nums: Vec<f32> = inner.iter().filter_map(number_value).map(|n| n as f32).collect();
                let metrics: Vec<(f32, f32, f32)> = nums.chunks_exact(3).map(|c| (c[0], c[1], c[2])).collect();
                out.push(W2ArrayEntry::Individual { start_cid, metrics });
                i += 1;
            }
            other => {
                let last_cid = match number_value(other) {
                    Some(n) => n as u32,
                    None => {
                        i += 1;
                        continue;
                    }
                };
                i += 1;
                if i + 2 >= values.len() {
                    break;
                }
                let w1y = number_value(&values[i]).unwrap_or(0.0) as f32;
                let vx = number_value(&values[i + 1]).unwrap_or(0.0) as f32;
                let vy = number_value(&values[i + 2]).unwrap_or(0.0) as f32;
                i += 3;
                out.push(W2ArrayEntry::Range { first_cid: start_cid, last_cid, w1y, vx, vy });
            }
        }
    }
    out
}

/// Document-scoped font cache keyed by indirect-reference identity (spec
/// §5): a font dictionary is parsed at most once per document.
#[derive(Default)]
pub struct FontCache {
    fonts: Mutex<HashMap<ObjectRef, std::sync::Arc<Font>>>,
}

impl FontCache {
    pub fn new() -> Self {
        FontCache::default()
    }

    /// Returns the cached font for `reference`, building it via `build`
    /// on first access.
    pub fn get_or_build(
        &self,
        reference: ObjectRef,
        build: impl FnOnce() -> Result<Font>,
    ) -> Result<std::sync::Arc<Font>> {
        let mut fonts = self.fonts.lock().unwrap();
        if let Some(existing) = fonts.get(&reference) {
            return Ok(existing.clone());
        }
        let font = std::sync::Arc::new(build()?);
        fonts.insert(reference, font.clone());
        Ok(font)
    }
}

/// Marker so external object-model implementors can identify a stream
/// value without constructing a full `PdfValue::Reference` round trip.
pub fn resolve_stream(stream: &dyn PdfStream) -> Result<Vec<u8>> {
    stream.decode_as_memory()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_font_resolves_cid_and_width() {
        let mut widths = CidFontWidths::new(1000.0);
        widths.parse_w_array(&[crate::fonts::widths::WArrayEntry::Range {
            first_cid: 0,
            last_cid: 1000,
            width: 600.0,
        }]);
        let font = CompositeFont {
            encoding_cmap: CMap::identity(0),
            program: CidFontProgram::TrueType(Vec::new(), CIDToGIDMap::Identity),
            widths,
            vertical_metrics: None,
            collection: CidCollection::Other,
            to_unicode: None,
        };
        let code = vec![0x00, 0x41];
        assert_eq!(font.get_gid(&code), Some(0x41));
        assert_eq!(font.get_width(&code), 0.6);
    }

    #[test]
    fn composite_font_unicode_falls_back_to_predefined_collection() {
        let font = CompositeFont {
            encoding_cmap: CMap::identity(0),
            program: CidFontProgram::TrueType(Vec::new(), CIDToGIDMap::Identity),
            widths: CidFontWidths::new(1000.0),
            vertical_metrics: None,
            collection: CidCollection::AdobeJapan1,
            to_unicode: None,
        };
        let code = 843u16.to_be_bytes().to_vec();
        assert_eq!(font.get_unicode(&code), Some("\u{3042}".to_string()));
    }

    #[test]
    fn cid_to_gid_explicit_table_maps_out_of_range_to_notdef() {
        let map = CIDToGIDMap::Explicit(vec![5, 6, 7]);
        assert_eq!(map.get_gid(1), 6);
        assert_eq!(map.get_gid(99), 0);
    }

    #[test]
    fn parse_w_array_handles_individual_and_range_forms() {
        let values = vec![
            PdfValue::Number(1.0),
            PdfValue::Array(vec![PdfValue::Number(500.0), PdfValue::Number(500.0)]),
            PdfValue::Number(100.0),
            PdfValue::Number(200.0),
            PdfValue::Number(300.0),
        ];
        let entries = parse_w_array(&values);
        let mut widths = CidFontWidths::new(1000.0);
        widths.parse_w_array(&entries);
        assert_eq!(widths.width_for_cid(1), 0.5);
        assert_eq!(widths.width_for_cid(2), 0.5);
        assert_eq!(widths.width_for_cid(150), 0.3);
        assert_eq!(widths.width_for_cid(9), 1.0);
    }

    #[test]
    fn parse_w2_array_handles_individual_form() {
        let values = vec![
            PdfValue::Number(5.0),
            PdfValue::Array(vec![PdfValue::Number(-900.0), PdfValue::Number(500.0), PdfValue::Number(700.0)]),
        ];
        let entries = parse_w2_array(&values);
        let mut vm = CidFontVerticalMetrics::new([880.0, -1000.0]);
        vm.parse_w2_array(&entries);
        assert_eq!(vm.metrics_for_cid(5), (-0.9, 0.5, 0.7));
    }

    #[test]
    fn simple_font_width_uses_first_char_offset() {
        let font = SimpleFont {
            encoding: EncodingState::new(BaseEncoding::WinAnsi, Vec::new()),
            descriptor: FontDescriptor::default(),
            widths: SimpleFontWidths::new(65, vec![600.0, 700.0], 250.0),
            to_unicode: None,
            embedded: None,
        };
        assert_eq!(font.get_width(&vec![65]), 0.6);
        assert_eq!(font.get_width(&vec![67]), 0.25);
    }
}
