//! Index buffer encoding.
//!
//! # Triangle format
//!
//! ```text
//! header       u8        0xE0 | version
//! codes        u8 x T    one code per triangle
//! data         ...       explicit aux bytes and varint free indices
//! aux table    16 bytes  lookup table for packed aux codes
//! ```
//!
//! Encoder and decoder keep identical state: a 16-entry FIFO of directed
//! edges, a 16-entry FIFO of vertices, `next` (the next vertex index under
//! sequential numbering) and `last` (the most recent free index, which the
//! varint deltas are relative to).
//!
//! A code below `0xF0` continues an edge from the edge FIFO: the high nibble
//! is the edge's FIFO distance and the low nibble codes the third vertex
//! (`0` = `next`, FIFO distance, `last ± 1` in version 1, or `15` for a free
//! index). Codes `0xF0..=0xFD` start a new triangle whose first vertex is
//! `next` and whose two other vertex codes come from the aux table; `0xFE`
//! and `0xFF` carry the aux byte explicitly, with the first vertex being
//! `next` or a free index respectively.
//!
//! Triangles keep their order; a triangle may come back rotated so that a
//! cached edge or `next` comes first. Winding is always preserved.
//!
//! # Sequence format
//!
//! ```text
//! header       u8        0xD0 | version
//! values       varint    (zigzag(delta) << 1) | baseline, one per index
//! tail         4 zero bytes
//! ```
//!
//! Two baselines are kept so that interleaved runs (for example the two
//! rows of a line strip ladder) both stay close to their predictor.

use crate::error::{CodecError, CodecResult, FormatError};
use crate::varint::{ByteReader, ByteWriter, unzigzag32, zigzag32};
use crate::version::{EncoderConfig, INDEX_HEADER, IndexVersion, SEQUENCE_HEADER, split_header};

const FIFO_SIZE: usize = 16;

/// Packed (vertex b, vertex c) codes for new triangles. The last two entries
/// are padding and never referenced by the encoder.
const CODE_AUX_TABLE: [u8; 16] = [
    0x00, 0x76, 0x87, 0x56, 0x67, 0x78, 0xa9, 0x86, 0x65, 0x89, 0x68, 0x98, 0x01, 0x69, 0x00, 0x00,
];

const TRIANGLE_ROTATIONS: [[usize; 3]; 3] = [[0, 1, 2], [1, 2, 0], [2, 0, 1]];

const SEQUENCE_TAIL: usize = 4;
/// Delta magnitude at which the sequence encoder swaps baselines.
const BASELINE_SWITCH: u32 = 30;

/// Integer types an index buffer can be made of.
pub trait IndexElement: bytemuck::Pod {
    /// Size in bytes.
    const SIZE: usize;

    fn to_u32(self) -> u32;
}

impl IndexElement for u16 {
    const SIZE: usize = 2;

    fn to_u32(self) -> u32 {
        u32::from(self)
    }
}

impl IndexElement for u32 {
    const SIZE: usize = 4;

    fn to_u32(self) -> u32 {
        self
    }
}

struct EdgeFifo {
    edges: [(u32, u32); FIFO_SIZE],
    offset: usize,
}

impl EdgeFifo {
    fn new() -> Self {
        Self {
            edges: [(u32::MAX, u32::MAX); FIFO_SIZE],
            offset: 0,
        }
    }

    /// Edge pushed `distance` pushes ago (0 = newest).
    fn get(&self, distance: usize) -> (u32, u32) {
        self.edges[(self.offset + 2 * FIFO_SIZE - 1 - distance) % FIFO_SIZE]
    }

    fn push(&mut self, a: u32, b: u32) {
        self.edges[self.offset] = (a, b);
        self.offset = (self.offset + 1) % FIFO_SIZE;
    }

    /// Newest cached edge of the triangle, as (distance, rotation) where the
    /// rotation moves the matched edge to the front.
    fn find(&self, [a, b, c]: [u32; 3]) -> Option<(usize, usize)> {
        (0..FIFO_SIZE).find_map(|distance| {
            let edge = self.get(distance);
            if edge == (a, b) {
                Some((distance, 0))
            } else if edge == (b, c) {
                Some((distance, 1))
            } else if edge == (c, a) {
                Some((distance, 2))
            } else {
                None
            }
        })
    }
}

struct VertexFifo {
    vertices: [u32; FIFO_SIZE],
    offset: usize,
}

impl VertexFifo {
    fn new() -> Self {
        Self {
            vertices: [u32::MAX; FIFO_SIZE],
            offset: 0,
        }
    }

    fn clear(&mut self) {
        self.vertices = [u32::MAX; FIFO_SIZE];
    }

    fn get(&self, distance: usize) -> u32 {
        self.vertices[(self.offset + 2 * FIFO_SIZE - 1 - distance) % FIFO_SIZE]
    }

    fn push(&mut self, v: u32) {
        self.vertices[self.offset] = v;
        self.offset = (self.offset + 1) % FIFO_SIZE;
    }

    fn push_if(&mut self, v: u32, cond: bool) {
        if cond {
            self.push(v);
        }
    }

    fn find(&self, v: u32) -> Option<usize> {
        (0..FIFO_SIZE).find(|&distance| self.get(distance) == v)
    }
}

fn rotate(tri: [u32; 3], rotation: usize) -> [u32; 3] {
    let order = TRIANGLE_ROTATIONS[rotation];
    [tri[order[0]], tri[order[1]], tri[order[2]]]
}

/// Bits needed for any index below `vertex_count`, at least 1.
fn vertex_bits(vertex_count: usize) -> usize {
    let mut bits = 1;
    while bits < 32 && vertex_count > 1usize << bits {
        bits += 1;
    }
    bits
}

fn check_indices<T: IndexElement>(indices: &[T], vertex_count: usize) -> CodecResult<()> {
    match indices
        .iter()
        .position(|&i| i.to_u32() as usize >= vertex_count)
    {
        Some(at) => Err(CodecError::invalid(format!(
            "index {} at position {at} is out of range for {vertex_count} vertices",
            indices[at].to_u32()
        ))),
        None => Ok(()),
    }
}

fn check_destination(
    destination: &[u8],
    index_count: usize,
    index_size: usize,
) -> CodecResult<()> {
    if index_size != 2 && index_size != 4 {
        return Err(CodecError::UnsupportedIndexSize(index_size));
    }
    let expected = index_count
        .checked_mul(index_size)
        .ok_or_else(|| CodecError::invalid("index buffer size overflows"))?;
    if destination.len() != expected {
        return Err(CodecError::SizeMismatch {
            expected,
            actual: destination.len(),
        });
    }
    Ok(())
}

fn write_index(destination: &mut [u8], position: usize, index_size: usize, value: u32) {
    let slot = &mut destination[position * index_size..(position + 1) * index_size];
    if index_size == 2 {
        slot.copy_from_slice(&(value as u16).to_ne_bytes());
    } else {
        slot.copy_from_slice(&value.to_ne_bytes());
    }
}

fn write_free_index(data: &mut ByteWriter<'_>, index: u32, last: &mut u32) {
    data.write_varint(u64::from(zigzag32(index.wrapping_sub(*last))));
    *last = index;
}

fn read_free_index(data: &mut ByteReader<'_>, last: &mut u32) -> CodecResult<u32> {
    let value = data.read_varint()? as u32;
    *last = last.wrapping_add(unzigzag32(value));
    Ok(*last)
}

// ---------------------------------------------------------------------------
// Triangles
// ---------------------------------------------------------------------------

/// Worst-case encoded size of a triangle index buffer.
#[must_use]
pub fn encode_index_buffer_bound(index_count: usize, vertex_count: usize) -> usize {
    // Code byte, aux byte and three free indices per triangle.
    let groups = (vertex_bits(vertex_count) + 1).div_ceil(7);
    1 + (index_count / 3) * (2 + 3 * groups) + CODE_AUX_TABLE.len()
}

/// Encode a triangle list into `destination`.
///
/// `indices.len()` must be a multiple of 3 and every index below
/// `vertex_count`; `destination` must hold at least
/// [`encode_index_buffer_bound`] bytes. Returns the number of bytes written.
pub fn encode_index_buffer_into<T: IndexElement>(
    destination: &mut [u8],
    indices: &[T],
    vertex_count: usize,
    version: IndexVersion,
) -> CodecResult<usize> {
    if indices.len() % 3 != 0 {
        return Err(CodecError::invalid(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }
    check_indices(indices, vertex_count)?;
    let bound = encode_index_buffer_bound(indices.len(), vertex_count);
    if destination.len() < bound {
        return Err(CodecError::invalid(format!(
            "destination holds {} bytes, encoding may need {bound}",
            destination.len()
        )));
    }

    let triangle_count = indices.len() / 3;
    let (head, rest) = destination.split_at_mut(1 + triangle_count);
    head[0] = INDEX_HEADER | version.as_u8();
    let codes = &mut head[1..];
    let mut data = ByteWriter::new(rest);

    let mut edges = EdgeFifo::new();
    let mut vertices = VertexFifo::new();
    let mut next = 0u32;
    let mut last = 0u32;

    let extended = version >= IndexVersion::V1;
    let fec_max: u8 = if extended { 13 } else { 15 };

    for (code, tri) in codes.iter_mut().zip(indices.chunks_exact(3)) {
        let tri = [tri[0].to_u32(), tri[1].to_u32(), tri[2].to_u32()];

        if let Some((fe, rotation)) = edges.find(tri).filter(|&(fe, _)| fe < 15) {
            let [a, b, c] = rotate(tri, rotation);

            let mut fec = match vertices.find(c) {
                Some(fc) if (1..usize::from(fec_max)).contains(&fc) => fc as u8,
                _ if c == next => {
                    next = next.wrapping_add(1);
                    0
                }
                _ => 15,
            };

            if fec == 15 && extended {
                if c.wrapping_add(1) == last {
                    fec = 13;
                    last = c;
                } else if c == last.wrapping_add(1) {
                    fec = 14;
                    last = c;
                }
            }

            *code = ((fe as u8) << 4) | fec;

            if fec == 15 {
                write_free_index(&mut data, c, &mut last);
            }
            // a and b are already cached from the triangle that made the edge.
            if fec == 0 || fec >= fec_max {
                vertices.push(c);
            }
            edges.push(c, b);
            edges.push(a, c);
        } else {
            let rotation = if tri[1] == next {
                1
            } else if tri[2] == next {
                2
            } else {
                0
            };
            let [a, b, c] = rotate(tri, rotation);

            // (0, 1, 2) after numbering has started restarts the numbering,
            // which keeps concatenated meshes cheap.
            let reset = extended && next > 0 && [a, b, c] == [0, 1, 2];
            if reset {
                next = 0;
                vertices.clear();
            }

            let fb = vertices.find(b);
            let fc = vertices.find(c);

            let fea: u8 = if a == next {
                next = next.wrapping_add(1);
                0
            } else {
                15
            };
            let feb: u8 = match fb {
                Some(f) if f < 14 => f as u8 + 1,
                _ if b == next => {
                    next = next.wrapping_add(1);
                    0
                }
                _ => 15,
            };
            let fec: u8 = match fc {
                Some(f) if f < 14 => f as u8 + 1,
                _ if c == next => {
                    next = next.wrapping_add(1);
                    0
                }
                _ => 15,
            };

            let aux = (feb << 4) | fec;
            match CODE_AUX_TABLE[..14].iter().position(|&entry| entry == aux) {
                Some(table_index) if fea == 0 && !reset => *code = 0xf0 | table_index as u8,
                _ => {
                    *code = 0xfe | u8::from(fea != 0);
                    data.write_u8(aux);
                }
            }

            if fea == 15 {
                write_free_index(&mut data, a, &mut last);
            }
            if feb == 15 {
                write_free_index(&mut data, b, &mut last);
            }
            if fec == 15 {
                write_free_index(&mut data, c, &mut last);
            }

            vertices.push(a);
            vertices.push_if(b, feb == 0 || feb == 15);
            vertices.push_if(c, fec == 0 || fec == 15);

            edges.push(b, a);
            edges.push(c, b);
            edges.push(a, c);
        }
    }

    // The table doubles as padding between the data and the end of the blob.
    data.write_bytes(&CODE_AUX_TABLE);

    let written = 1 + triangle_count + data.position();
    tracing::debug!(
        index_count = indices.len(),
        vertex_count,
        version = version.as_u8(),
        encoded = written,
        "encoded index buffer"
    );
    Ok(written)
}

/// Decode a triangle list into `destination`.
///
/// `destination` holds `index_count` indices of `index_size` bytes (2 or 4)
/// in native byte order. On error its contents are unspecified.
pub fn decode_index_buffer(
    destination: &mut [u8],
    index_count: usize,
    index_size: usize,
    encoded: &[u8],
) -> CodecResult<()> {
    if index_count % 3 != 0 {
        return Err(CodecError::invalid(format!(
            "index count {index_count} is not a multiple of 3"
        )));
    }
    check_destination(destination, index_count, index_size)?;
    let version = IndexVersion::try_from(split_header(encoded, INDEX_HEADER)?)?;

    let triangle_count = index_count / 3;
    let minimum = 1 + triangle_count + CODE_AUX_TABLE.len();
    if encoded.len() < minimum {
        return Err(CodecError::truncated(1, minimum - 1, encoded.len()));
    }

    let table_start = encoded.len() - CODE_AUX_TABLE.len();
    let codes = &encoded[1..=triangle_count];
    let table = &encoded[table_start..];
    if table != CODE_AUX_TABLE {
        return Err(FormatError::UnexpectedCodeTable.into());
    }
    let mut data = ByteReader::new(encoded, 1 + triangle_count, table_start);

    let mut edges = EdgeFifo::new();
    let mut vertices = VertexFifo::new();
    let mut next = 0u32;
    let mut last = 0u32;

    let fec_max: u8 = if version >= IndexVersion::V1 { 13 } else { 15 };

    for (triangle, &code) in codes.iter().enumerate() {
        let [a, b, c] = if code < 0xf0 {
            let (a, b) = edges.get(usize::from(code >> 4));
            let fec = code & 15;

            let c = if fec == 0 {
                let v = next;
                next = next.wrapping_add(1);
                vertices.push(v);
                v
            } else if fec < fec_max {
                vertices.get(usize::from(fec))
            } else {
                last = match fec {
                    13 => last.wrapping_sub(1),
                    14 => last.wrapping_add(1),
                    _ => read_free_index(&mut data, &mut last)?,
                };
                vertices.push(last);
                last
            };

            edges.push(c, b);
            edges.push(a, c);
            [a, b, c]
        } else {
            let (fea, aux) = if code < 0xfe {
                (0, table[usize::from(code & 15)])
            } else {
                let aux = data.read_u8()?;
                if aux == 0 {
                    next = 0;
                    vertices.clear();
                }
                (if code == 0xfe { 0 } else { 15 }, aux)
            };
            let feb = aux >> 4;
            let fec = aux & 15;

            // next advances for a, b and c in turn, matching the encoder.
            let mut take = |fe: u8, vertices: &VertexFifo| {
                if fe == 0 {
                    let v = next;
                    next = next.wrapping_add(1);
                    v
                } else {
                    vertices.get(usize::from(fe) - 1)
                }
            };
            let mut va = if fea == 0 { take(0, &vertices) } else { 0 };
            let mut vb = take(feb, &vertices);
            let mut vc = take(fec, &vertices);

            if fea == 15 {
                va = read_free_index(&mut data, &mut last)?;
            }
            if feb == 15 {
                vb = read_free_index(&mut data, &mut last)?;
            }
            if fec == 15 {
                vc = read_free_index(&mut data, &mut last)?;
            }

            vertices.push(va);
            vertices.push_if(vb, feb == 0 || feb == 15);
            vertices.push_if(vc, fec == 0 || fec == 15);

            edges.push(vb, va);
            edges.push(vc, vb);
            edges.push(va, vc);

            [va, vb, vc]
        };

        let base = triangle * 3;
        write_index(destination, base, index_size, a);
        write_index(destination, base + 1, index_size, b);
        write_index(destination, base + 2, index_size, c);
    }

    data.finish()
        .inspect_err(|e| tracing::debug!(error = %e, "rejected index buffer"))?;

    tracing::debug!(
        index_count,
        index_size,
        version = version.as_u8(),
        encoded = encoded.len(),
        "decoded index buffer"
    );
    Ok(())
}

/// Decode a triangle list into a typed index slice.
pub fn decode_index_buffer_as<T: IndexElement>(
    destination: &mut [T],
    encoded: &[u8],
) -> CodecResult<()> {
    let index_count = destination.len();
    decode_index_buffer(
        bytemuck::cast_slice_mut(destination),
        index_count,
        T::SIZE,
        encoded,
    )
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// Worst-case encoded size of an index sequence.
#[must_use]
pub fn encode_index_sequence_bound(index_count: usize, vertex_count: usize) -> usize {
    // Zigzag delta plus the baseline bit.
    let groups = (vertex_bits(vertex_count) + 2).div_ceil(7);
    1 + index_count * groups + SEQUENCE_TAIL
}

/// Encode an arbitrary index sequence into `destination`, preserving order.
///
/// `destination` must hold at least [`encode_index_sequence_bound`] bytes.
/// Returns the number of bytes written.
pub fn encode_index_sequence_into<T: IndexElement>(
    destination: &mut [u8],
    indices: &[T],
    vertex_count: usize,
    version: IndexVersion,
) -> CodecResult<usize> {
    check_indices(indices, vertex_count)?;
    let bound = encode_index_sequence_bound(indices.len(), vertex_count);
    if destination.len() < bound {
        return Err(CodecError::invalid(format!(
            "destination holds {} bytes, encoding may need {bound}",
            destination.len()
        )));
    }

    let mut writer = ByteWriter::new(destination);
    writer.write_u8(SEQUENCE_HEADER | version.as_u8());

    let mut last = [0u32; 2];
    let mut current = 0usize;

    for &index in indices {
        let index = index.to_u32();

        let distance = (index.wrapping_sub(last[current]) as i32).unsigned_abs();
        if distance >= BASELINE_SWITCH {
            current ^= 1;
        }

        let delta = index.wrapping_sub(last[current]);
        writer.write_varint((u64::from(zigzag32(delta)) << 1) | current as u64);
        last[current] = index;
    }

    writer.reserve(SEQUENCE_TAIL);

    let written = writer.position();
    tracing::debug!(
        index_count = indices.len(),
        vertex_count,
        version = version.as_u8(),
        encoded = written,
        "encoded index sequence"
    );
    Ok(written)
}

/// Decode an index sequence into `destination`.
///
/// `destination` holds `index_count` indices of `index_size` bytes (2 or 4)
/// in native byte order. On error its contents are unspecified.
pub fn decode_index_sequence(
    destination: &mut [u8],
    index_count: usize,
    index_size: usize,
    encoded: &[u8],
) -> CodecResult<()> {
    check_destination(destination, index_count, index_size)?;
    let version = IndexVersion::try_from(split_header(encoded, SEQUENCE_HEADER)?)?;

    let minimum = 1 + index_count + SEQUENCE_TAIL;
    if encoded.len() < minimum {
        return Err(CodecError::truncated(1, minimum - 1, encoded.len()));
    }

    let mut data = ByteReader::new(encoded, 1, encoded.len() - SEQUENCE_TAIL);
    let mut last = [0u32; 2];

    for position in 0..index_count {
        let value = data.read_varint()?;
        let current = (value & 1) as usize;
        let delta = unzigzag32((value >> 1) as u32);

        last[current] = last[current].wrapping_add(delta);
        write_index(destination, position, index_size, last[current]);
    }

    data.finish()
        .inspect_err(|e| tracing::debug!(error = %e, "rejected index sequence"))?;

    tracing::debug!(
        index_count,
        index_size,
        version = version.as_u8(),
        encoded = encoded.len(),
        "decoded index sequence"
    );
    Ok(())
}

/// Decode an index sequence into a typed index slice.
pub fn decode_index_sequence_as<T: IndexElement>(
    destination: &mut [T],
    encoded: &[u8],
) -> CodecResult<()> {
    let index_count = destination.len();
    decode_index_sequence(
        bytemuck::cast_slice_mut(destination),
        index_count,
        T::SIZE,
        encoded,
    )
}

impl EncoderConfig {
    /// Encode a triangle list with this configuration's index version.
    pub fn encode_index_buffer<T: IndexElement>(
        &self,
        indices: &[T],
        vertex_count: usize,
    ) -> CodecResult<Vec<u8>> {
        let mut encoded = vec![0u8; encode_index_buffer_bound(indices.len(), vertex_count)];
        let len = encode_index_buffer_into(&mut encoded, indices, vertex_count, self.index_version)?;
        encoded.truncate(len);
        Ok(encoded)
    }

    /// Encode an index sequence with this configuration's index version.
    pub fn encode_index_sequence<T: IndexElement>(
        &self,
        indices: &[T],
        vertex_count: usize,
    ) -> CodecResult<Vec<u8>> {
        let mut encoded = vec![0u8; encode_index_sequence_bound(indices.len(), vertex_count)];
        let len =
            encode_index_sequence_into(&mut encoded, indices, vertex_count, self.index_version)?;
        encoded.truncate(len);
        Ok(encoded)
    }
}

/// Encode a triangle list with the default format version.
pub fn encode_index_buffer<T: IndexElement>(
    indices: &[T],
    vertex_count: usize,
) -> CodecResult<Vec<u8>> {
    EncoderConfig::default().encode_index_buffer(indices, vertex_count)
}

/// Encode an index sequence with the default format version.
pub fn encode_index_sequence<T: IndexElement>(
    indices: &[T],
    vertex_count: usize,
) -> CodecResult<Vec<u8>> {
    EncoderConfig::default().encode_index_sequence(indices, vertex_count)
}
