//! Property tests: round trips, size bounds and truncation over random input.

use glam::{Vec3, Vec4};
use meshcodec::{
    EncoderConfig, ExpMode, FilterDescriptor, IndexVersion, VertexVersion, decode_filter_exp,
    decode_filter_oct, decode_filter_quat, decode_index_buffer_as, decode_index_sequence_as,
    decode_vertex_buffer, encode_filter_exp, encode_filter_oct, encode_filter_quat,
    encode_index_buffer_bound, encode_index_sequence_bound, encode_vertex_buffer_bound,
};
use proptest::prelude::*;

/// Random records, either noise or a slowly drifting ramp that compresses.
fn vertex_buffer() -> impl Strategy<Value = (usize, Vec<u8>)> {
    (1usize..=64, 1usize..=600, any::<bool>()).prop_flat_map(|(words, count, smooth)| {
        let size = words * 4;
        let len = size * count;
        let data = if smooth {
            (any::<u8>(), 0u8..4)
                .prop_map(move |(seed, step)| {
                    (0..len)
                        .map(|i| seed.wrapping_add(((i / size) as u8).wrapping_mul(step)))
                        .collect()
                })
                .boxed()
        } else {
            prop::collection::vec(any::<u8>(), len).boxed()
        };
        (Just(size), data)
    })
}

fn vertex_version() -> impl Strategy<Value = VertexVersion> {
    prop::sample::select(VertexVersion::ALL.to_vec())
}

fn index_version() -> impl Strategy<Value = IndexVersion> {
    prop::sample::select(IndexVersion::ALL.to_vec())
}

/// Triangle lists mixing strip-like runs with random triangles.
fn triangle_list() -> impl Strategy<Value = (usize, Vec<u32>)> {
    (3u32..2000).prop_flat_map(|vertex_count| {
        let triangle = prop_oneof![
            (0..vertex_count - 2).prop_map(|i| [i, i + 1, i + 2]),
            [0..vertex_count, 0..vertex_count, 0..vertex_count],
        ];
        (
            Just(vertex_count as usize),
            prop::collection::vec(triangle, 0..300)
                .prop_map(|tris| tris.into_iter().flatten().collect()),
        )
    })
}

fn rotations_match(got: &[u32], want: &[u32]) -> bool {
    (0..3).any(|r| (0..3).all(|k| got[(k + r) % 3] == want[k]))
}

fn unit_vector() -> impl Strategy<Value = Vec3> {
    [-1f32..1.0, -1f32..1.0, -1f32..1.0]
        .prop_map(Vec3::from_array)
        .prop_filter("degenerate direction", |v| v.length() > 0.1)
        .prop_map(Vec3::normalize)
}

fn unit_quaternion() -> impl Strategy<Value = Vec4> {
    [-1f32..1.0, -1f32..1.0, -1f32..1.0, -1f32..1.0]
        .prop_map(Vec4::from_array)
        .prop_filter("degenerate rotation", |q| q.length() > 0.1)
        .prop_map(Vec4::normalize)
}

/// Zero, values just below a power of two, and arbitrary finite floats
/// across a wide exponent range.
fn finite_float() -> impl Strategy<Value = f32> {
    let signed = |v: f32, negative: bool| if negative { -v } else { v };
    prop_oneof![
        1 => Just(0.0f32),
        2 => (-60i32..60, 1u32..8, any::<bool>()).prop_map(move |(e, ulps, negative)| {
            signed(f32::from_bits(2f32.powi(e).to_bits() - ulps), negative)
        }),
        4 => (-60i32..60, 1f32..2.0, any::<bool>())
            .prop_map(move |(e, m, negative)| signed(m * 2f32.powi(e), negative)),
    ]
}

fn exp_mode() -> impl Strategy<Value = ExpMode> {
    prop::sample::select(vec![
        ExpMode::Separate,
        ExpMode::SharedVector,
        ExpMode::SharedComponent,
        ExpMode::Clamped,
    ])
}

fn read_snorm(bytes: &[u8], stride: usize) -> Vec<f32> {
    if stride == 4 {
        bytes.iter().map(|&b| f32::from(b as i8) / 127.0).collect()
    } else {
        bytes
            .chunks_exact(2)
            .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / 32767.0)
            .collect()
    }
}

proptest! {
    #[test]
    fn vertex_roundtrip((size, data) in vertex_buffer(), version in vertex_version()) {
        let count = data.len() / size;
        let config = EncoderConfig::new().with_vertex_version(version);
        let encoded = config.encode_vertex_buffer(&data, count, size).unwrap();
        prop_assert!(encoded.len() <= encode_vertex_buffer_bound(count, size));
        prop_assert_eq!(encoded[0], 0xa0 | version.as_u8());

        let mut decoded = vec![0u8; data.len()];
        decode_vertex_buffer(&mut decoded, count, size, &encoded).unwrap();
        prop_assert_eq!(decoded, data);
    }

    #[test]
    fn vertex_truncation_fails(
        (size, data) in vertex_buffer(),
        version in vertex_version(),
        cut in 1usize..64,
    ) {
        let count = data.len() / size;
        let config = EncoderConfig::new().with_vertex_version(version);
        let encoded = config.encode_vertex_buffer(&data, count, size).unwrap();
        let len = encoded.len().saturating_sub(cut);

        let mut decoded = vec![0u8; data.len()];
        let err = decode_vertex_buffer(&mut decoded, count, size, &encoded[..len]).unwrap_err();
        prop_assert!(err.is_format_error() || err.is_truncation());
    }

    #[test]
    fn triangle_roundtrip((vertex_count, indices) in triangle_list(), version in index_version()) {
        let config = EncoderConfig::new().with_index_version(version);
        let encoded = config.encode_index_buffer(&indices, vertex_count).unwrap();
        prop_assert!(encoded.len() <= encode_index_buffer_bound(indices.len(), vertex_count));

        let mut decoded = vec![0u32; indices.len()];
        decode_index_buffer_as(&mut decoded, &encoded).unwrap();
        for (got, want) in decoded.chunks(3).zip(indices.chunks(3)) {
            prop_assert!(rotations_match(got, want), "{:?} vs {:?}", got, want);
        }
    }

    #[test]
    fn triangle_truncation_fails(
        (vertex_count, indices) in triangle_list(),
        cut in 1usize..32,
    ) {
        let encoded = EncoderConfig::new()
            .encode_index_buffer(&indices, vertex_count)
            .unwrap();
        let len = encoded.len().saturating_sub(cut);

        let mut decoded = vec![0u32; indices.len()];
        let err = decode_index_buffer_as(&mut decoded, &encoded[..len]).unwrap_err();
        prop_assert!(err.is_format_error() || err.is_truncation());
    }

    #[test]
    fn sequence_roundtrip(
        indices in prop::collection::vec(any::<u32>(), 0..500),
        version in index_version(),
    ) {
        let vertex_count = indices.iter().max().map_or(0, |&max| max as usize + 1);
        let config = EncoderConfig::new().with_index_version(version);
        let encoded = config.encode_index_sequence(&indices, vertex_count).unwrap();
        prop_assert!(encoded.len() <= encode_index_sequence_bound(indices.len(), vertex_count));

        let mut decoded = vec![0u32; indices.len()];
        decode_index_sequence_as(&mut decoded, &encoded).unwrap();
        prop_assert_eq!(decoded, indices);
    }

    #[test]
    fn sequence_truncation_fails(
        indices in prop::collection::vec(0u32..70_000, 1..200),
        cut in 1usize..16,
    ) {
        let encoded = EncoderConfig::new().encode_index_sequence(&indices, 70_000).unwrap();
        let len = encoded.len().saturating_sub(cut);

        let mut decoded = vec![0u32; indices.len()];
        let err = decode_index_sequence_as(&mut decoded, &encoded[..len]).unwrap_err();
        prop_assert!(err.is_format_error() || err.is_truncation());
    }

    #[test]
    fn oct_filter_roundtrip(
        normals in prop::collection::vec((unit_vector(), -1f32..1.0), 1..64),
        stride in prop::sample::select(vec![4usize, 8]),
    ) {
        let (bits, tolerance) = if stride == 4 { (8, 0.04) } else { (16, 1e-3) };
        let data: Vec<f32> = normals
            .iter()
            .flat_map(|(n, w)| [n.x, n.y, n.z, *w])
            .collect();

        let descriptor = FilterDescriptor::new(normals.len(), stride);
        let mut buffer = vec![0u8; descriptor.byte_len()];
        encode_filter_oct(&mut buffer, descriptor, bits, &data).unwrap();
        decode_filter_oct(&mut buffer, descriptor).unwrap();

        for (element, (n, w)) in buffer.chunks_exact(stride).zip(&normals) {
            let c = read_snorm(element, stride);
            let got = Vec3::new(c[0], c[1], c[2]);
            prop_assert!((got - *n).length() < tolerance, "{:?} decoded as {:?}", n, got);
            prop_assert!((c[3] - w).abs() <= 1.0 / 127.0);
        }
    }

    #[test]
    fn quat_filter_roundtrip(
        quats in prop::collection::vec(unit_quaternion(), 1..64),
        bits in 4u32..=16,
    ) {
        let data: Vec<f32> = quats.iter().flat_map(|q| q.to_array()).collect();
        let descriptor = FilterDescriptor::new(quats.len(), 8);
        let mut buffer = vec![0u8; descriptor.byte_len()];
        encode_filter_quat(&mut buffer, descriptor, bits, &data).unwrap();
        decode_filter_quat(&mut buffer, descriptor).unwrap();

        // One quantization step of the stored components, with headroom for
        // the reconstructed component.
        let tolerance = 2.0 / ((1 << (bits - 1)) - 1) as f32 + 1e-3;
        for (element, q) in buffer.chunks_exact(8).zip(&quats) {
            let c = read_snorm(element, 8);
            let got = Vec4::new(c[0], c[1], c[2], c[3]);
            // q and -q are the same rotation.
            let error = (got - *q).abs().max_element().min((got + *q).abs().max_element());
            prop_assert!(error <= tolerance, "{:?} decoded as {:?}", q, got);
        }
    }

    #[test]
    fn exp_filter_bounded_relative_error(
        (components, values) in (1usize..=4).prop_flat_map(|components| {
            (Just(components), prop::collection::vec(finite_float(), components..=components * 8))
        }),
        bits in 1u32..=24,
        mode in exp_mode(),
    ) {
        let count = values.len() / components;
        let values = &values[..count * components];
        let descriptor = FilterDescriptor::new(count, components * 4);
        let mut buffer = vec![0u8; descriptor.byte_len()];
        encode_filter_exp(&mut buffer, descriptor, bits, values, mode).unwrap();
        decode_filter_exp(&mut buffer, descriptor).unwrap();

        let column_max = |j: usize| {
            values.iter().skip(j).step_by(components).fold(0f32, |acc, v| acc.max(v.abs()))
        };
        let step = 2f64.powi(1 - bits as i32);
        for (i, (chunk, &want)) in buffer.chunks_exact(4).zip(values).enumerate() {
            let got = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let element = &values[i / components * components..][..components];
            let reference = match mode {
                ExpMode::Separate => want.abs(),
                ExpMode::SharedVector => element.iter().fold(0f32, |acc, v| acc.max(v.abs())),
                ExpMode::SharedComponent => column_max(i % components),
                ExpMode::Clamped => want.abs().max(1.0),
            };
            let error = (f64::from(got) - f64::from(want)).abs();
            prop_assert!(
                error <= f64::from(reference) * step,
                "{:?} at {} bits: {} decoded as {}", mode, bits, want, got
            );
        }
    }
}
