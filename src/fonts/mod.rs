//! Font resolution (spec §3/§4): PDF font dictionary parsing, CMap and
//! encoding handling, and the Type 1 -> TrueType/CFF program pipelines that
//! feed glyph/width/Unicode resolution for simple, Type 3, and composite
//! fonts.

mod adobe_glyph_list;
/// CID to Unicode mappings for predefined Adobe CJK character collections.
pub mod cid_mappings;
pub mod cmap;
pub mod encoding;
pub mod widths;
/// `/FontDescriptor` flags and metrics.
pub mod descriptor;
/// CFF table parsing (charstrings, charset, encoding, CID keying).
pub mod cff;
/// CFF assembly from already-translated Type 2 charstrings.
pub mod cff_builder;
/// Type 2 charstring metric extraction.
pub mod metrics;
/// Type 1 font parsing (eexec/charstring decryption, PostScript subset).
pub mod type1;
/// Type 1 -> Type 2 charstring translation.
pub mod charstring;
/// Bare CFF/TrueType -> OpenType (SFNT) wrapping.
pub mod opentype;
/// TrueType/OpenType font reader for embedded programs.
pub mod truetype;
/// Top-level `Font` dispatch and the `FontBase` contract.
pub mod font;

pub use cmap::{parse_tounicode_cmap, CMap, CharacterCode};
pub use descriptor::{FontDescriptor, FontFlags};
pub use encoding::{BaseEncoding, EncodingState};
pub use font::{CIDToGIDMap, CidCollection, CidFontProgram, CompositeFont, EmbeddedProgram, Font, FontBase, FontCache, SimpleFont, Type3Font};
pub use widths::{CidFontVerticalMetrics, CidFontWidths, SimpleFontWidths};
