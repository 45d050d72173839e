//! Vertex buffer encoding.
//!
//! # Format
//!
//! ```text
//! header       u8        0xA0 | version
//! blocks       ...       one per run of `block_size` records
//! tail         max(32, vertex_size) bytes: zero padding, then record 0
//! ```
//!
//! Each block stores one byte plane per byte of the record. A plane holds
//! the zigzag-mapped wrapping deltas between consecutive records at that byte
//! offset; the predictor starts from the last record of the previous block,
//! or from record 0 (kept in the tail) for the first block.
//!
//! Planes are cut into groups of 16 deltas. A group header stores two bits
//! per group selecting a bit width; packed values equal to or above
//! `(1 << bits) - 1` are spilled verbatim after the group's packed bytes.
//! Version 1 prefixes each block with two control bits per plane that pick
//! the width table, mark an all-zero plane, or store the plane raw.

use crate::error::{CodecError, CodecResult};
use crate::varint::{ByteReader, ByteWriter, unzigzag8, zigzag8};
use crate::version::{EncoderConfig, VERTEX_HEADER, VertexVersion, split_header};

/// Largest supported record size in bytes.
pub const MAX_VERTEX_SIZE: usize = 256;

const BLOCK_SIZE_BYTES: usize = 8192;
const BLOCK_MAX_SIZE: usize = 256;
const GROUP_SIZE: usize = 16;
const TAIL_MIN_SIZE: usize = 32;

/// Group widths addressed by the two-bit group header in version 0.
const WIDTHS_V0: [u8; 4] = [0, 2, 4, 8];
/// Group widths for version 1 plane mode 0.
const WIDTHS_V1_LOW: [u8; 4] = [0, 1, 2, 4];
/// Group widths for version 1 plane mode 1.
const WIDTHS_V1_HIGH: [u8; 4] = [1, 2, 4, 8];

const PLANE_LOW: u8 = 0;
const PLANE_HIGH: u8 = 1;
const PLANE_ZERO: u8 = 2;
const PLANE_RAW: u8 = 3;

/// Number of records per block for a given record size.
#[must_use]
pub fn vertex_block_size(vertex_size: usize) -> usize {
    let size = (BLOCK_SIZE_BYTES / vertex_size) & !(GROUP_SIZE - 1);
    size.min(BLOCK_MAX_SIZE)
}

fn tail_size(vertex_size: usize) -> usize {
    vertex_size.max(TAIL_MIN_SIZE)
}

fn validate(vertex_count: usize, vertex_size: usize) -> CodecResult<()> {
    if vertex_count == 0 {
        return Err(CodecError::invalid("vertex count must be positive"));
    }
    if vertex_size == 0 || vertex_size > MAX_VERTEX_SIZE || vertex_size % 4 != 0 {
        return Err(CodecError::invalid(format!(
            "vertex size {vertex_size} must be a multiple of 4 in 4..={MAX_VERTEX_SIZE}"
        )));
    }
    if vertex_count.checked_mul(vertex_size).is_none() {
        return Err(CodecError::invalid("vertex buffer size overflows"));
    }
    Ok(())
}

/// Worst-case encoded size for `vertex_count` records of `vertex_size` bytes.
#[must_use]
pub fn encode_vertex_buffer_bound(vertex_count: usize, vertex_size: usize) -> usize {
    if vertex_size == 0 {
        return 0;
    }
    let block_size = vertex_block_size(vertex_size.min(MAX_VERTEX_SIZE));
    let block_count = vertex_count.div_ceil(block_size);
    let group_header_size = (block_size / GROUP_SIZE).div_ceil(4);
    let control_size = vertex_size.div_ceil(4);

    1 + block_count * (control_size + vertex_size * (group_header_size + block_size))
        + tail_size(vertex_size)
}

// ---------------------------------------------------------------------------
// Byte groups
// ---------------------------------------------------------------------------

/// Encoded size of one group at `bits`, or `None` if `bits` cannot hold it.
fn group_cost(group: &[u8], bits: u8) -> Option<usize> {
    match bits {
        0 => group.iter().all(|&v| v == 0).then_some(0),
        8 => Some(GROUP_SIZE),
        _ => {
            let sentinel = (1u8 << bits) - 1;
            let spilled = group.iter().filter(|&&v| v >= sentinel).count();
            Some(GROUP_SIZE * usize::from(bits) / 8 + spilled)
        }
    }
}

/// Cheapest entry of `widths` for a group, as (header code, cost).
fn best_width(group: &[u8], widths: &[u8; 4]) -> (u8, usize) {
    let mut best = (0u8, usize::MAX);
    for (code, &bits) in widths.iter().enumerate() {
        if let Some(cost) = group_cost(group, bits)
            && cost < best.1
        {
            best = (code as u8, cost);
        }
    }
    best
}

fn write_group(writer: &mut ByteWriter<'_>, group: &[u8], bits: u8) {
    match bits {
        0 => {}
        8 => writer.write_bytes(group),
        _ => {
            let sentinel = (1u8 << bits) - 1;
            let per_byte = usize::from(8 / bits);
            for chunk in group.chunks_exact(per_byte) {
                let packed = chunk
                    .iter()
                    .fold(0u8, |acc, &v| (acc << bits) | v.min(sentinel));
                writer.write_u8(packed);
            }
            for &v in group.iter().filter(|&&v| v >= sentinel) {
                writer.write_u8(v);
            }
        }
    }
}

fn read_group(reader: &mut ByteReader<'_>, bits: u8, out: &mut [u8]) -> CodecResult<()> {
    match bits {
        0 => out.fill(0),
        8 => out.copy_from_slice(reader.read_bytes(GROUP_SIZE)?),
        _ => {
            let sentinel = (1u8 << bits) - 1;
            let per_byte = usize::from(8 / bits);
            let packed = reader.read_bytes(GROUP_SIZE * usize::from(bits) / 8)?;
            for (i, slot) in out.iter_mut().enumerate() {
                let shift = 8 - bits * (i % per_byte + 1) as u8;
                let v = (packed[i / per_byte] >> shift) & sentinel;
                *slot = if v == sentinel { reader.read_u8()? } else { v };
            }
        }
    }
    Ok(())
}

/// Size of a plane written with [`write_groups`].
fn groups_cost(deltas: &[u8], widths: &[u8; 4]) -> usize {
    let groups = deltas.len() / GROUP_SIZE;
    let body: usize = deltas
        .chunks_exact(GROUP_SIZE)
        .map(|group| best_width(group, widths).1)
        .sum();
    groups.div_ceil(4) + body
}

fn write_groups(writer: &mut ByteWriter<'_>, deltas: &[u8], widths: &[u8; 4]) {
    let groups = deltas.len() / GROUP_SIZE;
    let header = writer.reserve(groups.div_ceil(4));

    for (g, group) in deltas.chunks_exact(GROUP_SIZE).enumerate() {
        let (code, _) = best_width(group, widths);
        writer.patch_or(header + g / 4, code << ((g % 4) * 2));
        write_group(writer, group, widths[usize::from(code)]);
    }
}

fn read_groups(reader: &mut ByteReader<'_>, deltas: &mut [u8], widths: &[u8; 4]) -> CodecResult<()> {
    let groups = deltas.len() / GROUP_SIZE;
    let header = reader.read_bytes(groups.div_ceil(4))?;

    for (g, group) in deltas.chunks_exact_mut(GROUP_SIZE).enumerate() {
        let code = (header[g / 4] >> ((g % 4) * 2)) & 3;
        read_group(reader, widths[usize::from(code)], group)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Fill `deltas` with the zigzag deltas of byte `k` across `block`.
fn delta_plane(deltas: &mut [u8], block: &[u8], vertex_size: usize, k: usize, mut prev: u8) {
    let count = block.len() / vertex_size;
    for (i, slot) in deltas.iter_mut().enumerate() {
        *slot = if i < count {
            let v = block[i * vertex_size + k];
            let d = zigzag8(v.wrapping_sub(prev));
            prev = v;
            d
        } else {
            0
        };
    }
}

/// Apply decoded deltas of byte `k` to `block`, starting from `prev`.
fn restore_plane(block: &mut [u8], deltas: &[u8], vertex_size: usize, k: usize, mut prev: u8) {
    let count = block.len() / vertex_size;
    for (i, &d) in deltas[..count].iter().enumerate() {
        prev = prev.wrapping_add(unzigzag8(d));
        block[i * vertex_size + k] = prev;
    }
}

fn encode_block_v0(writer: &mut ByteWriter<'_>, block: &[u8], vertex_size: usize, last: &[u8]) {
    let padded = (block.len() / vertex_size).next_multiple_of(GROUP_SIZE);
    let mut deltas = [0u8; BLOCK_MAX_SIZE];

    for k in 0..vertex_size {
        delta_plane(&mut deltas[..padded], block, vertex_size, k, last[k]);
        write_groups(writer, &deltas[..padded], &WIDTHS_V0);
    }
}

fn decode_block_v0(
    reader: &mut ByteReader<'_>,
    block: &mut [u8],
    vertex_size: usize,
    last: &[u8],
) -> CodecResult<()> {
    let padded = (block.len() / vertex_size).next_multiple_of(GROUP_SIZE);
    let mut deltas = [0u8; BLOCK_MAX_SIZE];

    for k in 0..vertex_size {
        read_groups(reader, &mut deltas[..padded], &WIDTHS_V0)?;
        restore_plane(block, &deltas[..padded], vertex_size, k, last[k]);
    }
    Ok(())
}

/// Pick the cheapest version 1 plane mode.
fn choose_plane_mode(deltas: &[u8], count: usize) -> u8 {
    if deltas.iter().all(|&d| d == 0) {
        return PLANE_ZERO;
    }
    let mut best = (PLANE_LOW, groups_cost(deltas, &WIDTHS_V1_LOW));
    let high = groups_cost(deltas, &WIDTHS_V1_HIGH);
    if high < best.1 {
        best = (PLANE_HIGH, high);
    }
    if count < best.1 {
        best = (PLANE_RAW, count);
    }
    best.0
}

fn encode_block_v1(writer: &mut ByteWriter<'_>, block: &[u8], vertex_size: usize, last: &[u8]) {
    let count = block.len() / vertex_size;
    let padded = count.next_multiple_of(GROUP_SIZE);
    let mut deltas = [0u8; BLOCK_MAX_SIZE];
    let control = writer.reserve(vertex_size.div_ceil(4));

    for k in 0..vertex_size {
        delta_plane(&mut deltas[..padded], block, vertex_size, k, last[k]);
        let mode = choose_plane_mode(&deltas[..padded], count);
        writer.patch_or(control + k / 4, mode << ((k % 4) * 2));

        match mode {
            PLANE_LOW => write_groups(writer, &deltas[..padded], &WIDTHS_V1_LOW),
            PLANE_HIGH => write_groups(writer, &deltas[..padded], &WIDTHS_V1_HIGH),
            PLANE_RAW => writer.write_bytes(&deltas[..count]),
            _ => {}
        }
    }
}

fn decode_block_v1(
    reader: &mut ByteReader<'_>,
    block: &mut [u8],
    vertex_size: usize,
    last: &[u8],
) -> CodecResult<()> {
    let count = block.len() / vertex_size;
    let padded = count.next_multiple_of(GROUP_SIZE);
    let mut deltas = [0u8; BLOCK_MAX_SIZE];
    let control = reader.read_bytes(vertex_size.div_ceil(4))?;

    for k in 0..vertex_size {
        match (control[k / 4] >> ((k % 4) * 2)) & 3 {
            PLANE_LOW => read_groups(reader, &mut deltas[..padded], &WIDTHS_V1_LOW)?,
            PLANE_HIGH => read_groups(reader, &mut deltas[..padded], &WIDTHS_V1_HIGH)?,
            PLANE_ZERO => deltas[..count].fill(0),
            _ => deltas[..count].copy_from_slice(reader.read_bytes(count)?),
        }
        restore_plane(block, &deltas[..padded], vertex_size, k, last[k]);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

/// Encode `vertex_count` records of `vertex_size` bytes into `destination`.
///
/// `destination` must hold at least [`encode_vertex_buffer_bound`] bytes.
/// Returns the number of bytes written.
pub fn encode_vertex_buffer_into(
    destination: &mut [u8],
    vertices: &[u8],
    vertex_count: usize,
    vertex_size: usize,
    version: VertexVersion,
) -> CodecResult<usize> {
    validate(vertex_count, vertex_size)?;
    if vertices.len() != vertex_count * vertex_size {
        return Err(CodecError::invalid(format!(
            "vertex data holds {} bytes, expected {vertex_count} x {vertex_size}",
            vertices.len()
        )));
    }
    let bound = encode_vertex_buffer_bound(vertex_count, vertex_size);
    if destination.len() < bound {
        return Err(CodecError::invalid(format!(
            "destination holds {} bytes, encoding may need {bound}",
            destination.len()
        )));
    }

    let mut writer = ByteWriter::new(destination);
    writer.write_u8(VERTEX_HEADER | version.as_u8());

    let first = &vertices[..vertex_size];
    let mut last = [0u8; MAX_VERTEX_SIZE];
    last[..vertex_size].copy_from_slice(first);

    let block_bytes = vertex_block_size(vertex_size) * vertex_size;
    for (index, block) in vertices.chunks(block_bytes).enumerate() {
        let start = writer.position();
        match version {
            VertexVersion::V0 => encode_block_v0(&mut writer, block, vertex_size, &last),
            VertexVersion::V1 => encode_block_v1(&mut writer, block, vertex_size, &last),
        }
        last[..vertex_size].copy_from_slice(&block[block.len() - vertex_size..]);
        tracing::trace!(
            block = index,
            records = block.len() / vertex_size,
            bytes = writer.position() - start,
            "encoded vertex block"
        );
    }

    writer.reserve(tail_size(vertex_size) - vertex_size);
    writer.write_bytes(first);

    let written = writer.position();
    tracing::debug!(
        vertex_count,
        vertex_size,
        version = version.as_u8(),
        raw = vertices.len(),
        encoded = written,
        "encoded vertex buffer"
    );
    Ok(written)
}

impl EncoderConfig {
    /// Encode a vertex buffer with this configuration's vertex version.
    pub fn encode_vertex_buffer(
        &self,
        vertices: &[u8],
        vertex_count: usize,
        vertex_size: usize,
    ) -> CodecResult<Vec<u8>> {
        let mut encoded = vec![0u8; encode_vertex_buffer_bound(vertex_count, vertex_size)];
        let len = encode_vertex_buffer_into(
            &mut encoded,
            vertices,
            vertex_count,
            vertex_size,
            self.vertex_version,
        )?;
        encoded.truncate(len);
        Ok(encoded)
    }
}

/// Encode a vertex buffer with the default format version.
///
/// `vertices` holds `vertex_count` records of `vertex_size` bytes each;
/// `vertex_size` must be a multiple of 4 no larger than 256.
pub fn encode_vertex_buffer(
    vertices: &[u8],
    vertex_count: usize,
    vertex_size: usize,
) -> CodecResult<Vec<u8>> {
    EncoderConfig::default().encode_vertex_buffer(vertices, vertex_count, vertex_size)
}

/// Decode a vertex buffer into `destination`.
///
/// `destination` must be exactly `vertex_count * vertex_size` bytes. On
/// error its contents are unspecified.
pub fn decode_vertex_buffer(
    destination: &mut [u8],
    vertex_count: usize,
    vertex_size: usize,
    encoded: &[u8],
) -> CodecResult<()> {
    validate(vertex_count, vertex_size)?;
    let expected = vertex_count * vertex_size;
    if destination.len() != expected {
        return Err(CodecError::SizeMismatch {
            expected,
            actual: destination.len(),
        });
    }

    let version = VertexVersion::try_from(split_header(encoded, VERTEX_HEADER)?)?;

    let tail = tail_size(vertex_size);
    if encoded.len() < 1 + tail {
        return Err(CodecError::truncated(1, tail, encoded.len()));
    }
    let payload_end = encoded.len() - tail;

    let mut last = [0u8; MAX_VERTEX_SIZE];
    last[..vertex_size].copy_from_slice(&encoded[encoded.len() - vertex_size..]);

    let mut reader = ByteReader::new(encoded, 1, payload_end);
    let block_bytes = vertex_block_size(vertex_size) * vertex_size;

    for block in destination.chunks_mut(block_bytes) {
        let result = match version {
            VertexVersion::V0 => decode_block_v0(&mut reader, block, vertex_size, &last),
            VertexVersion::V1 => decode_block_v1(&mut reader, block, vertex_size, &last),
        };
        result.inspect_err(|e| tracing::debug!(error = %e, "rejected vertex buffer"))?;
        last[..vertex_size].copy_from_slice(&block[block.len() - vertex_size..]);
    }
    reader.finish()?;

    tracing::debug!(
        vertex_count,
        vertex_size,
        version = version.as_u8(),
        encoded = encoded.len(),
        "decoded vertex buffer"
    );
    Ok(())
}
