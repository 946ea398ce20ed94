//! TrueType/OpenType font reader for embedded `FontFile2`/`FontFile3`
//! streams (spec §4.1): wraps `ttf-parser` to resolve `(Unicode or
//! platform code) -> GID` and `GID -> advance width`, the two operations
//! the font engine needs from an embedded TrueType program.

use crate::error::{Error, Result};
use ttf_parser::Face;

/// A parsed TrueType/OpenType font program.
pub struct TrueTypeFont<'a> {
    face: Face<'a>,
}

impl<'a> TrueTypeFont<'a> {
    /// Parses a font program from raw bytes (a `FontFile2` stream's
    /// decoded content, or a bare `FontFile3`/`OpenType` wrapper).
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let face = Face::parse(data, 0).map_err(|e| Error::malformed(format!("TrueType parse error: {e}")))?;
        Ok(TrueTypeFont { face })
    }

    /// Number of glyphs in the face.
    pub fn num_glyphs(&self) -> u16 {
        self.face.number_of_glyphs()
    }

    /// Units per em, for scaling advance widths and outlines to text
    /// space (spec §3: widths are always reported in 1000 units/em after
    /// this scale is applied).
    pub fn units_per_em(&self) -> u16 {
        self.face.units_per_em()
    }

    /// Looks up a GID by Unicode code point via the face's `cmap` table
    /// (spec §4.1 priority for non-symbolic TrueType simple fonts: (3,1)
    /// Windows Unicode BMP subtable, falling back to whatever `ttf-parser`
    /// resolves for this codepoint across all subtables).
    pub fn gid_for_unicode(&self, codepoint: u32) -> Option<u16> {
        char::from_u32(codepoint)
            .and_then(|c| self.face.glyph_index(c))
            .map(|g| g.0)
    }

    /// Looks up a GID through the (3,0) symbolic cmap subtable's
    /// convention: codes are looked up at `0xF000 + code` (spec §4.1
    /// priority for symbolic TrueType simple fonts with no `/Differences`
    /// match).
    pub fn gid_for_symbolic_code(&self, code: u8) -> Option<u16> {
        self.gid_for_unicode(0xF000 + code as u32).or_else(|| self.gid_for_unicode(code as u32))
    }

    /// Advance width of `gid` in font units (caller scales by
    /// `1000.0 / units_per_em` to reach the crate-wide 1000 units/em
    /// convention).
    pub fn advance_width(&self, gid: u16) -> Option<u16> {
        self.face.glyph_hor_advance(ttf_parser::GlyphId(gid))
    }

    /// Whether the face has a `glyf`/`CFF ` outline for `gid` at all
    /// (used to detect `.notdef` substitution candidates).
    pub fn has_outline(&self, gid: u16) -> bool {
        self.face.outline_glyph(ttf_parser::GlyphId(gid), &mut NullOutlineBuilder).is_some()
    }
}

struct NullOutlineBuilder;

impl ttf_parser::OutlineBuilder for NullOutlineBuilder {
    fn move_to(&mut self, _x: f32, _y: f32) {}
    fn line_to(&mut self, _x: f32, _y: f32) {}
    fn quad_to(&mut self, _x1: f32, _y1: f32, _x: f32, _y: f32) {}
    fn curve_to(&mut self, _x1: f32, _y1: f32, _x2: f32, _y2: f32, _x: f32, _y: f32) {}
    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_non_font_bytes() {
        let result = TrueTypeFont::parse(b"not a font");
        assert!(result.is_err());
    }
}
