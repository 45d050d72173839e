//! Format versions and encoder configuration.
//!
//! Every encoded blob starts with one header byte: the high nibble names the
//! codec and the low nibble the format version. Decoders only look at that
//! byte, so blobs stay decodable whatever configuration later encodes use.
//! Encoders take their target versions from an [`EncoderConfig`] value owned
//! by the caller; there is no process-wide state.

use crate::error::{CodecError, CodecResult, FormatError};

/// Header nibble of vertex buffer blobs.
pub const VERTEX_HEADER: u8 = 0xa0;
/// Header nibble of triangle index buffer blobs.
pub const INDEX_HEADER: u8 = 0xe0;
/// Header nibble of index sequence blobs.
pub const SEQUENCE_HEADER: u8 = 0xd0;

/// Vertex buffer format version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexVersion {
    /// Byte groups with widths 0/2/4/8.
    V0,
    /// Adds per-block plane modes: zero planes, raw planes and a second
    /// width table.
    #[default]
    V1,
}

impl VertexVersion {
    /// All versions this crate can decode.
    pub const ALL: [Self; 2] = [Self::V0, Self::V1];

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::V0 => 0,
            Self::V1 => 1,
        }
    }
}

impl TryFrom<u8> for VertexVersion {
    type Error = CodecError;

    fn try_from(value: u8) -> CodecResult<Self> {
        match value {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            other => Err(FormatError::UnsupportedVersion(other).into()),
        }
    }
}

/// Index buffer and index sequence format version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexVersion {
    /// FIFO codes only.
    V0,
    /// Adds `last ± 1` codes and restart codes for strip-like and
    /// concatenated meshes.
    #[default]
    V1,
}

impl IndexVersion {
    /// All versions this crate can decode.
    pub const ALL: [Self; 2] = [Self::V0, Self::V1];

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::V0 => 0,
            Self::V1 => 1,
        }
    }
}

impl TryFrom<u8> for IndexVersion {
    type Error = CodecError;

    fn try_from(value: u8) -> CodecResult<Self> {
        match value {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            other => Err(FormatError::UnsupportedVersion(other).into()),
        }
    }
}

/// Target format versions for encoding.
///
/// The default targets the newest version of each codec. Configure once and
/// pass the value to every encode call that should use it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Version stamped into vertex buffer blobs.
    pub vertex_version: VertexVersion,
    /// Version stamped into index buffer and index sequence blobs.
    pub index_version: IndexVersion,
}

impl EncoderConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_vertex_version(mut self, version: VertexVersion) -> Self {
        self.vertex_version = version;
        self
    }

    #[must_use]
    pub fn with_index_version(mut self, version: IndexVersion) -> Self {
        self.index_version = version;
        self
    }
}

/// Split a header byte after checking its codec nibble.
pub(crate) fn split_header(encoded: &[u8], codec: u8) -> CodecResult<u8> {
    let &header = encoded.first().ok_or(FormatError::MissingHeader)?;
    if header & 0xf0 != codec {
        return Err(FormatError::UnexpectedCodec {
            expected: codec,
            found: header,
        }
        .into());
    }
    Ok(header & 0x0f)
}

/// Read the format version of an encoded vertex buffer without decoding it.
pub fn decode_vertex_version(encoded: &[u8]) -> CodecResult<VertexVersion> {
    VertexVersion::try_from(split_header(encoded, VERTEX_HEADER)?)
}

/// Read the format version of an encoded index buffer or index sequence
/// without decoding it.
pub fn decode_index_version(encoded: &[u8]) -> CodecResult<IndexVersion> {
    let version = match split_header(encoded, INDEX_HEADER) {
        Ok(version) => version,
        Err(CodecError::Format(FormatError::UnexpectedCodec { .. })) => {
            split_header(encoded, SEQUENCE_HEADER)?
        }
        Err(e) => return Err(e),
    };
    IndexVersion::try_from(version)
}
