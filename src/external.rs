//! Trait shims for the collaborators the three engines consume but do not
//! implement (spec §6): the PDF object model, the filter chain, PDF
//! function objects, the canvas, and the typeface loader.
//!
//! None of these traits are implemented in this crate. A host PDF reader
//! implements them against its own object/xref parser, rasterizer, and
//! filter pipeline; the engines here are generic over them so they compile
//! and test standalone.

use crate::error::Result;

/// An indirect-reference identity: `(object number, generation)`.
///
/// Used as the cache key for document-scoped font/color-space/CMap caches
/// (spec §5). Two references are the same cache entry iff this pair is
/// equal.
pub type ObjectRef = (u32, u16);

/// Read-only access to a PDF dictionary, as exposed by the host's object
/// model (spec §6).
pub trait PdfDict {
    /// Looks up a nested dictionary value.
    fn get_dictionary(&self, key: &str) -> Option<&dyn PdfDict>;
    /// Looks up an array value.
    fn get_array(&self, key: &str) -> Option<&[PdfValue]>;
    /// Looks up a dictionary (or stream) nested inside an array value, such
    /// as `/DescendantFonts`' single entry. `PdfValue` has no dictionary
    /// variant of its own since array/dictionary values are only ever
    /// reachable through the host's own object graph; this gives composite
    /// font resolution a way to reach the descendant dictionary without one.
    fn get_array_dictionary(&self, key: &str, index: usize) -> Option<&dyn PdfDict>;
    /// Looks up a value and dereferences it if it is an indirect reference.
    fn get_object(&self, key: &str) -> Option<PdfValue>;
    /// Looks up a name value, without the leading `/`.
    fn get_name(&self, key: &str) -> Option<&str>;
    /// Looks up an integer value, or `default` if absent/wrong type.
    fn get_integer_or_default(&self, key: &str, default: i64) -> i64;
    /// Looks up a numeric value, or `default` if absent/wrong type.
    fn get_float_or_default(&self, key: &str, default: f32) -> f32;
    /// Looks up a boolean value, or `default` if absent/wrong type.
    fn get_boolean_or_default(&self, key: &str, default: bool) -> bool;
    /// Looks up a string (literal or hex) value.
    fn get_string(&self, key: &str) -> Option<Vec<u8>>;
    /// Looks up a stream value and runs its filter chain, returning the
    /// decoded bytes (e.g. `/FontFile2`, `/ToUnicode`).
    fn get_stream(&self, key: &str) -> Option<Vec<u8>>;
}

/// A resolved PDF value, as handed back by [`PdfDict::get_object`].
#[derive(Debug, Clone)]
pub enum PdfValue {
    /// `null`
    Null,
    /// `true`/`false`
    Boolean(bool),
    /// An integer or real number.
    Number(f64),
    /// A `/Name`.
    Name(String),
    /// A literal or hex string, already unescaped.
    StringBytes(Vec<u8>),
    /// An array of values.
    Array(Vec<PdfValue>),
    /// A reference to `(object number, generation)`; the caller dereferences
    /// via [`PdfDict::get_object`] on the owning document.
    Reference(ObjectRef),
}

/// A PDF stream object: dictionary plus filtered byte content.
pub trait PdfStream: PdfDict {
    /// Runs the filter chain (FlateDecode/LZWDecode/ASCII85/ASCIIHex/
    /// RunLength/CCITTFax/JBIG2/JPX as applicable; DCTDecode is the JPEG
    /// engine itself, see [`crate::jpeg`]) and returns the decoded bytes.
    fn decode_as_memory(&self) -> Result<Vec<u8>>;
    /// This stream's own indirect-reference identity, if any.
    fn reference(&self) -> Option<ObjectRef>;
}

/// A PDF function object (types 0/2/3/4), evaluated for Separation/DeviceN
/// tint transforms and shading functions.
pub trait PdfFunction {
    /// Evaluates the function at the given input tuple.
    fn evaluate(&self, inputs: &[f32]) -> Result<Vec<f32>>;
}

/// Write-only rasterizer sink the font/color engines hand finished
/// primitives to. Not implemented here; the core never calls these, it only
/// produces the arguments a real canvas would receive.
pub trait Canvas {
    /// Paints a single glyph.
    fn draw_glyph(&mut self, gid: u16, typeface: &dyn Typeface, transform: [f32; 6]);
    /// Paints a filled/stroked path (opaque to the core).
    fn draw_path(&mut self, path_data: &[u8], transform: [f32; 6]);
    /// Paints an interleaved RGB(A) image.
    fn draw_image(&mut self, rgba_rows: &[u8], width: u32, height: u32, transform: [f32; 6]);
    /// Pushes a transparency/clip layer.
    fn push_layer(&mut self, bbox: [f32; 4], alpha: f32);
    /// Pops the most recently pushed layer.
    fn pop_layer(&mut self);
}

/// A renderable typeface constructed from font bytes produced by the font
/// engine's OpenType wrapper (spec §4.3 Stage 5) or read directly from a
/// TrueType/OpenType `FontFile2`/`FontFile3` stream.
pub trait Typeface {
    /// Number of glyphs in the face.
    fn glyph_count(&self) -> u16;
}

/// Constructs a [`Typeface`] from raw OpenType/TrueType bytes.
pub trait TypefaceLoader {
    /// Parses `bytes` into a renderable face, or `None` if the bytes are not
    /// a recognizable font program.
    fn from_bytes(&self, bytes: &[u8]) -> Option<Box<dyn Typeface>>;
}
