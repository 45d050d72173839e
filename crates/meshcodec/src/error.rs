//! Error types for encoding and decoding.

use thiserror::Error;

/// Errors returned by the vertex codec, index codec and filters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A count, stride or bit budget is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The destination buffer does not have the size implied by the counts.
    #[error("destination holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The encoded data is not a well-formed blob of the expected kind.
    #[error("malformed encoded data: {0}")]
    Format(#[from] FormatError),

    /// The encoded data ends before its structure is complete.
    #[error("encoded data truncated: needed {needed} bytes at offset {offset}, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Index element size other than 2 or 4 bytes.
    #[error("unsupported index size {0}, expected 2 or 4")]
    UnsupportedIndexSize(usize),
}

/// Structural problems found in an encoded blob.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// The encoded data is empty.
    #[error("missing header byte")]
    MissingHeader,

    /// The header names another codec.
    #[error("header {found:#04x} does not belong to this codec (expected {expected:#04x})")]
    UnexpectedCodec { expected: u8, found: u8 },

    /// The header names a format version this decoder does not know.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// Payload did not end where the layout says it must.
    #[error("payload ends at offset {consumed}, expected {expected}")]
    LengthMismatch { consumed: usize, expected: usize },

    /// The trailing code table of a triangle blob is not the one the format
    /// defines.
    #[error("unexpected code table in index buffer")]
    UnexpectedCodeTable,

    /// A varint ran past the five groups a 32-bit value can use.
    #[error("overlong varint at offset {0}")]
    OverlongVarint(usize),
}

impl CodecError {
    /// Create an invalid argument error.
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a truncation error for a read of `needed` bytes at `offset`.
    pub(crate) fn truncated(offset: usize, needed: usize, len: usize) -> Self {
        Self::TruncatedInput {
            offset,
            needed,
            available: len.saturating_sub(offset),
        }
    }

    /// Whether the error reports a malformed header or payload.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Whether the error reports input that ended too early.
    #[must_use]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::TruncatedInput { .. })
    }
}

/// Result type for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = CodecError::SizeMismatch {
            expected: 96,
            actual: 95,
        };
        assert!(e.to_string().contains("96"));
        assert!(e.to_string().contains("95"));

        let e = CodecError::from(FormatError::UnexpectedCodec {
            expected: 0xa0,
            found: 0xe1,
        });
        assert!(e.to_string().contains("0xe1"));
        assert!(e.is_format_error());
        assert!(!e.is_truncation());
    }

    #[test]
    fn test_truncated_available_saturates() {
        let e = CodecError::truncated(12, 4, 10);
        assert_eq!(
            e,
            CodecError::TruncatedInput {
                offset: 12,
                needed: 4,
                available: 0
            }
        );
        assert!(e.is_truncation());
    }
}
