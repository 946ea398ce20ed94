//! Engine-wide options (spec §5: cancellation & resource limits).
//!
//! The core has no internal parallelism and no timeout facility of its own;
//! a caller that wants to bound work either refuses to start it via these
//! flags or wraps the call in the target language's own cancellation
//! mechanism.

/// Opt-out flags and resource limits shared by the font, color, and JPEG
/// engines.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// When `false`, [`crate::color::ColorSpace`] resolution never
    /// materializes a sampling LUT (spec §4.8); callers instead evaluate
    /// `to_srgb` per-component, which is slower but bounded.
    pub build_color_luts: bool,
    /// Maximum `usecmap` chain depth before a CMap is rejected as malformed
    /// (spec §9, cyclic references).
    pub max_cmap_chain_depth: usize,
    /// Maximum number of decoded bytes a [`crate::jpeg::JpegDecoder`] will
    /// produce before it starts returning `None` rows, guarding against
    /// decompression-bomb-shaped JPEGs.
    pub max_decoded_jpeg_bytes: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            build_color_luts: true,
            max_cmap_chain_depth: 16,
            max_decoded_jpeg_bytes: 512 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let opts = EngineOptions::default();
        assert!(opts.build_color_luts);
        assert_eq!(opts.max_cmap_chain_depth, 16);
    }
}
