//! Shaped arrays of plain records compressed with the vertex codec.
//!
//! An [`EncodedArray`] keeps the array's shape and record size next to the
//! vertex blob, so callers can round-trip typed arrays without tracking the
//! counts themselves. The record type must be 4..=256 bytes and a multiple
//! of 4, for example `[f32; 3]` or `[u16; 2]`.

use bytemuck::Pod;

use crate::error::{CodecError, CodecResult};
use crate::version::EncoderConfig;
use crate::vertex::decode_vertex_buffer;

/// A compressed array together with the metadata needed to decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArray {
    /// Vertex codec blob.
    pub data: Vec<u8>,
    /// Array dimensions; the record count is their product.
    pub shape: Vec<usize>,
    /// Size of one record in bytes.
    pub item_size: usize,
}

impl EncodedArray {
    /// Number of records in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode back into records of type `T`.
    pub fn decode<T: Pod>(&self) -> CodecResult<Vec<T>> {
        let item_size = std::mem::size_of::<T>();
        if item_size != self.item_size {
            return Err(CodecError::invalid(format!(
                "array records are {} bytes, requested type is {item_size}",
                self.item_size
            )));
        }

        let count = self.len();
        let mut values = vec![T::zeroed(); count];
        decode_vertex_buffer(
            bytemuck::cast_slice_mut(&mut values),
            count,
            item_size,
            &self.data,
        )?;
        Ok(values)
    }
}

fn element_count(values: usize, shape: &[usize]) -> CodecResult<usize> {
    let count = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| CodecError::invalid("array shape overflows"))?;
    if count != values {
        return Err(CodecError::invalid(format!(
            "shape {shape:?} describes {count} records, got {values}"
        )));
    }
    Ok(count)
}

impl EncoderConfig {
    /// Encode a shaped array with this configuration's vertex version.
    pub fn encode_array<T: Pod>(&self, values: &[T], shape: &[usize]) -> CodecResult<EncodedArray> {
        let count = element_count(values.len(), shape)?;
        let item_size = std::mem::size_of::<T>();
        let data = self.encode_vertex_buffer(bytemuck::cast_slice(values), count, item_size)?;

        Ok(EncodedArray {
            data,
            shape: shape.to_vec(),
            item_size,
        })
    }
}

/// Encode a shaped array with the default vertex version.
///
/// # Arguments
///
/// * `values` - Records in row-major order
/// * `shape` - Array dimensions; their product must equal `values.len()`
pub fn encode_array<T: Pod>(values: &[T], shape: &[usize]) -> CodecResult<EncodedArray> {
    EncoderConfig::default().encode_array(values, shape)
}

/// Decode an [`EncodedArray`] into records of type `T`.
pub fn decode_array<T: Pod>(encoded: &EncodedArray) -> CodecResult<Vec<T>> {
    encoded.decode()
}
