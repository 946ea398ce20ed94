//! Error types shared by the font, color, and JPEG engines.
//!
//! Every engine follows the same propagation policy (spec §7): the lowest
//! layers return `Option`/`Result` and never panic on malformed input; each
//! intermediate layer either recovers with a documented default or
//! classifies the failure into one of the kinds below so a caller can log a
//! warning and substitute.

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy a conformance test suite should exercise (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input buffer ended before a record could be fully read.
    #[error("truncated input at byte {offset}: expected {expected} more byte(s)")]
    Truncated {
        /// Byte offset where the read ran out of data.
        offset: usize,
        /// Number of bytes that were still needed.
        expected: usize,
    },

    /// Offsets out of bounds, count mismatches, or inconsistent headers.
    #[error("malformed structure: {0}")]
    MalformedStructure(String),

    /// A recognized-but-unsupported variant of a format (e.g. arithmetic
    /// coding, iccMAX, hierarchical JPEG).
    #[error("unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// A JPEG scan referenced a Huffman or quantization table that was
    /// never defined. Fatal to the scan that referenced it.
    #[error("missing table: {kind} id {id}")]
    MissingTable {
        /// Table kind, e.g. "DC Huffman", "quantization".
        kind: &'static str,
        /// Table identifier as encoded in the stream.
        id: u8,
    },

    /// A Huffman code did not match any canonical entry.
    #[error("huffman decode overrun at bit position {bit_position}")]
    HuffmanOverrun {
        /// Bit position within the entropy-coded segment.
        bit_position: u64,
    },

    /// Embedded font program failed to parse; caller should substitute a
    /// family-matched typeface.
    #[error("font substitution required: {0}")]
    SubstitutionRequired(String),

    /// IO error surfaced while reading an externally supplied byte slice
    /// through a `std::io::Read`/`Write` adapter.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convenience constructor for [`Error::Truncated`].
    pub fn truncated(offset: usize, expected: usize) -> Self {
        Error::Truncated { offset, expected }
    }

    /// Convenience constructor for [`Error::MalformedStructure`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedStructure(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_message_includes_offset_and_count() {
        let err = Error::truncated(128, 4);
        let msg = format!("{err}");
        assert!(msg.contains("128"));
        assert!(msg.contains("4"));
    }

    #[test]
    fn missing_table_message_includes_kind_and_id() {
        let err = Error::MissingTable {
            kind: "DC Huffman",
            id: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("DC Huffman"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
