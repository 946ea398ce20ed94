//! `FontDescriptor` (spec §3): the font-wide metrics and flags that drive
//! substitution and encoding fallbacks.

use bitflags::bitflags;

bitflags! {
    /// `/Flags` entry of a font descriptor (ISO 32000-1 Table 123).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FontFlags: u32 {
        const FIXED_PITCH  = 1 << 0;
        const SERIF        = 1 << 1;
        const SYMBOLIC     = 1 << 2;
        const SCRIPT       = 1 << 3;
        const NONSYMBOLIC  = 1 << 5;
        const ITALIC       = 1 << 6;
        const ALL_CAP      = 1 << 16;
        const SMALL_CAP    = 1 << 17;
        const FORCE_BOLD   = 1 << 18;
    }
}

/// Which font program format, if any, is embedded (`/FontFile`,
/// `/FontFile2`, `/FontFile3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedFontFormat {
    /// `/FontFile`: raw Type 1 program.
    Type1,
    /// `/FontFile2`: TrueType/OpenType-with-glyf program.
    TrueType,
    /// `/FontFile3` with `/Subtype /Type1C`: bare CFF program.
    Type1C,
    /// `/FontFile3` with `/Subtype /CIDFontType0C`: CID-keyed CFF program.
    CidFontType0C,
    /// `/FontFile3` with `/Subtype /OpenType`: a full OpenType wrapper.
    OpenType,
}

/// `/FontDescriptor` dictionary contents relevant to glyph resolution and
/// substitution (spec §3).
#[derive(Debug, Clone)]
pub struct FontDescriptor {
    pub flags: FontFlags,
    pub italic_angle: f32,
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub stem_v: f32,
    pub font_weight: f32,
    pub missing_width: f32,
    pub embedded_format: Option<EmbeddedFontFormat>,
}

impl FontDescriptor {
    /// Whether the descriptor marks this font symbolic (spec §4.1: a
    /// symbolic simple font's built-in encoding takes priority over
    /// Standard/WinAnsi/MacRoman defaults).
    pub fn is_symbolic(&self) -> bool {
        self.flags.contains(FontFlags::SYMBOLIC) && !self.flags.contains(FontFlags::NONSYMBOLIC)
    }
}

impl Default for FontDescriptor {
    fn default() -> Self {
        FontDescriptor {
            flags: FontFlags::empty(),
            italic_angle: 0.0,
            ascent: 0.0,
            descent: 0.0,
            cap_height: 0.0,
            stem_v: 0.0,
            font_weight: 400.0,
            missing_width: 0.0,
            embedded_format: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_flag_without_nonsymbolic_is_symbolic() {
        let mut d = FontDescriptor::default();
        d.flags = FontFlags::SYMBOLIC;
        assert!(d.is_symbolic());
    }

    #[test]
    fn nonsymbolic_flag_overrides_symbolic() {
        let mut d = FontDescriptor::default();
        d.flags = FontFlags::SYMBOLIC | FontFlags::NONSYMBOLIC;
        assert!(!d.is_symbolic());
    }

    #[test]
    fn default_descriptor_is_not_symbolic() {
        assert!(!FontDescriptor::default().is_symbolic());
    }
}
