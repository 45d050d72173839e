//! Compact binary encoding for mesh vertex and index buffers.
//!
//! This crate provides lossless codecs that shrink GPU-ready geometry before
//! it is stored or sent over the network, plus lossy filters that quantize
//! normals, rotations and floats into layouts the vertex codec compresses
//! well. Decoding writes straight into caller-provided buffers.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Caller-owned buffers**: Decoders write into slices the caller sizes
//! - **Explicit configuration**: Encoders read target format versions from
//!   an [`EncoderConfig`] value, never from global state
//! - **Stable formats**: Every version a decoder accepts stays decodable
//!
//! # Key functions
//!
//! - [`encode_vertex_buffer`] / [`decode_vertex_buffer`]: Byte-plane delta
//!   coding of fixed-size records
//! - [`encode_index_buffer`] / [`decode_index_buffer`]: Triangle lists with
//!   edge and vertex caches; triangle rotation may change
//! - [`encode_index_sequence`] / [`decode_index_sequence`]: Arbitrary index
//!   lists, order preserved
//! - [`decode_filter_oct`], [`decode_filter_quat`], [`decode_filter_exp`]:
//!   In-place reconstruction of filtered attributes
//! - [`encode_array`] / [`decode_array`]: Shaped arrays of plain records
//!
//! # Example
//!
//! ```
//! use meshcodec::{decode_index_buffer_as, decode_vertex_buffer, encode_index_buffer, encode_vertex_buffer};
//!
//! let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
//! let bytes: &[u8] = bytemuck::cast_slice(&positions);
//!
//! let encoded = encode_vertex_buffer(bytes, 3, 12)?;
//! let mut decoded = vec![0u8; bytes.len()];
//! decode_vertex_buffer(&mut decoded, 3, 12, &encoded)?;
//! assert_eq!(decoded, bytes);
//!
//! let encoded = encode_index_buffer(&[0u16, 1, 2], 3)?;
//! let mut indices = [0u16; 3];
//! decode_index_buffer_as(&mut indices, &encoded)?;
//! assert_eq!(indices, [0, 1, 2]);
//! # Ok::<(), meshcodec::CodecError>(())
//! ```

mod error;
mod varint;

pub mod array;
pub mod filter;
pub mod index;
pub mod version;
pub mod vertex;

pub use array::{EncodedArray, decode_array, encode_array};
pub use error::{CodecError, CodecResult, FormatError};
pub use filter::{
    ExpMode, FilterDescriptor, decode_filter_exp, decode_filter_oct, decode_filter_quat,
    encode_filter_exp, encode_filter_oct, encode_filter_quat, quantize_snorm, quantize_unorm,
};
pub use index::{
    IndexElement, decode_index_buffer, decode_index_buffer_as, decode_index_sequence,
    decode_index_sequence_as, encode_index_buffer, encode_index_buffer_bound,
    encode_index_buffer_into, encode_index_sequence, encode_index_sequence_bound,
    encode_index_sequence_into,
};
pub use varint::{read_varint, varint_len};
pub use version::{
    EncoderConfig, IndexVersion, VertexVersion, decode_index_version, decode_vertex_version,
};
pub use vertex::{
    MAX_VERTEX_SIZE, decode_vertex_buffer, encode_vertex_buffer, encode_vertex_buffer_bound,
    encode_vertex_buffer_into, vertex_block_size,
};
