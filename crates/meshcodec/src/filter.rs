//! Numeric filters for decoded vertex data.
//!
//! Filters run in place over a decoded vertex buffer, or over the part of it
//! a [`FilterDescriptor`] describes. Encoding quantizes float input into the
//! filter's packed layout; decoding reconstructs normalized integers (octahedral,
//! quaternion) or floats (exponential). All components are little-endian.
//!
//! | filter      | stride      | element layout                                  |
//! |-------------|-------------|-------------------------------------------------|
//! | octahedral  | 4 or 8      | `[u, v, one, w]` as i8 or i16                   |
//! | quaternion  | 8           | three i16 components, then scale and index bits |
//! | exponential | 4k, k ≥ 1   | u32 per component: i24 mantissa, i8 exponent    |

use std::f32::consts::SQRT_2;

use glam::Vec4;

use crate::error::{CodecError, CodecResult};

/// Where a filter finds its elements: `count` elements of `stride` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDescriptor {
    pub count: usize,
    pub stride: usize,
}

impl FilterDescriptor {
    #[must_use]
    pub const fn new(count: usize, stride: usize) -> Self {
        Self { count, stride }
    }

    /// Bytes covered by the described elements.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.count * self.stride
    }

    fn check(&self, buffer: &[u8], strides: &[usize], filter: &str) -> CodecResult<()> {
        if !strides.contains(&self.stride) {
            return Err(CodecError::invalid(format!(
                "{filter} filter does not support stride {}",
                self.stride
            )));
        }
        let expected = self
            .count
            .checked_mul(self.stride)
            .ok_or_else(|| CodecError::invalid("filter buffer size overflows"))?;
        if buffer.len() != expected {
            return Err(CodecError::SizeMismatch {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(())
    }

    fn check_exp(&self, buffer: &[u8]) -> CodecResult<()> {
        if self.stride == 0 || self.stride % 4 != 0 || self.stride > MAX_EXP_STRIDE {
            return Err(CodecError::invalid(format!(
                "exponential filter stride {} must be a multiple of 4 in 4..={MAX_EXP_STRIDE}",
                self.stride
            )));
        }
        self.check(buffer, &[self.stride], "exponential")
    }
}

const MAX_EXP_STRIDE: usize = 256;
const MIN_EXP: i32 = -100;

/// How [`encode_filter_exp`] shares exponents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpMode {
    /// Every component gets its own exponent.
    Separate,
    /// Components of one element share the largest exponent among them.
    #[default]
    SharedVector,
    /// Each component position shares one exponent across all elements.
    SharedComponent,
    /// Like `Separate`, but exponents never drop below 0, which keeps an
    /// absolute precision floor for values close to zero.
    Clamped,
}

/// Quantize a float in `[-1, 1]` to a signed `bits`-bit integer.
///
/// `bits` must be in 1..=31; input outside the range is clamped.
#[must_use]
pub fn quantize_snorm(v: f32, bits: u32) -> i32 {
    let scale = ((1i32 << (bits - 1)) - 1) as f32;
    let round = if v >= 0.0 { 0.5 } else { -0.5 };
    let v = if v >= -1.0 { v } else { -1.0 };
    let v = if v <= 1.0 { v } else { 1.0 };
    (v * scale + round) as i32
}

/// Quantize a float in `[0, 1]` to an unsigned `bits`-bit integer (`bits`
/// in 1..=30).
#[must_use]
pub fn quantize_unorm(v: f32, bits: u32) -> i32 {
    let scale = ((1i32 << bits) - 1) as f32;
    let v = if v >= 0.0 { v } else { 0.0 };
    let v = if v <= 1.0 { v } else { 1.0 };
    (v * scale + 0.5) as i32
}

/// Round half away from zero, then truncate to an integer.
fn round_signed(v: f32) -> i32 {
    (v + if v >= 0.0 { 0.5 } else { -0.5 }) as i32
}

fn check_bits(bits: u32, range: std::ops::RangeInclusive<u32>, filter: &str) -> CodecResult<()> {
    if range.contains(&bits) {
        Ok(())
    } else {
        Err(CodecError::invalid(format!(
            "{filter} filter bits {bits} outside {}..={}",
            range.start(),
            range.end()
        )))
    }
}

fn check_input(data: &[f32], expected: usize) -> CodecResult<()> {
    if data.len() == expected {
        Ok(())
    } else {
        Err(CodecError::invalid(format!(
            "filter input holds {} floats, expected {expected}",
            data.len()
        )))
    }
}

fn read_i16(bytes: &[u8], at: usize) -> i32 {
    i32::from(i16::from_le_bytes([bytes[at], bytes[at + 1]]))
}

fn write_i16(bytes: &mut [u8], at: usize, value: i32) {
    bytes[at..at + 2].copy_from_slice(&(value as i16).to_le_bytes());
}

// ---------------------------------------------------------------------------
// Octahedral
// ---------------------------------------------------------------------------

/// Unfold one octahedral element into a unit vector scaled to `max`.
///
/// The fold runs on integers; `one` is the quantized 1.0 the encoder stored.
fn unfold_octahedral(x: i32, y: i32, one: i32, max: f32) -> [i32; 3] {
    let z = one - x.abs() - y.abs();

    // Points with z < 0 were mirrored across the octahedron's lower faces.
    let t = z.min(0);
    let x = if x >= 0 { x + t } else { x - t };
    let y = if y >= 0 { y + t } else { y - t };

    let (xf, yf, zf) = (x as f32, y as f32, z as f32);
    let length = (xf * xf + yf * yf + zf * zf).sqrt();
    let s = max / length;

    [round_signed(xf * s), round_signed(yf * s), round_signed(zf * s)]
}

/// Reconstruct unit vectors from octahedral elements in place.
///
/// Each element `[u, v, one, w]` becomes `[x, y, z, w]` with `x, y, z` a
/// signed normalized unit vector at the element's component width.
pub fn decode_filter_oct(buffer: &mut [u8], descriptor: FilterDescriptor) -> CodecResult<()> {
    descriptor.check(buffer, &[4, 8], "octahedral")?;

    if descriptor.stride == 4 {
        for element in buffer.chunks_exact_mut(4) {
            let [x, y, one] = [0, 1, 2].map(|k| i32::from(element[k] as i8));
            let n = unfold_octahedral(x, y, one, 127.0);
            for (slot, v) in element.iter_mut().zip(n) {
                *slot = v as i8 as u8;
            }
        }
    } else {
        for element in buffer.chunks_exact_mut(8) {
            let [x, y, one] = [0, 2, 4].map(|at| read_i16(element, at));
            let n = unfold_octahedral(x, y, one, 32767.0);
            for (k, v) in n.into_iter().enumerate() {
                write_i16(element, k * 2, v);
            }
        }
    }

    tracing::trace!(
        count = descriptor.count,
        stride = descriptor.stride,
        "decoded octahedral filter"
    );
    Ok(())
}

/// Encode float4 vectors (`xyz` direction, `w` passthrough in `[-1, 1]`)
/// into octahedral elements.
///
/// `bits` is the precision of `u`/`v`: 2..=8 for stride 4, 2..=16 for
/// stride 8. `data` holds `4 * count` floats.
pub fn encode_filter_oct(
    destination: &mut [u8],
    descriptor: FilterDescriptor,
    bits: u32,
    data: &[f32],
) -> CodecResult<()> {
    descriptor.check(destination, &[4, 8], "octahedral")?;
    let component_bits = descriptor.stride as u32 * 2;
    check_bits(bits, 2..=component_bits, "octahedral")?;
    check_input(data, descriptor.count * 4)?;

    for (element, n) in destination
        .chunks_exact_mut(descriptor.stride)
        .zip(data.chunks_exact(4))
    {
        let n = Vec4::from_slice(n);

        let l1 = n.x.abs() + n.y.abs() + n.z.abs();
        let ns = if l1 == 0.0 { 0.0 } else { 1.0 / l1 };
        let nx = n.x * ns;
        let ny = n.y * ns;

        let u = if n.z >= 0.0 {
            nx
        } else {
            (1.0 - ny.abs()) * if nx >= 0.0 { 1.0 } else { -1.0 }
        };
        let v = if n.z >= 0.0 {
            ny
        } else {
            (1.0 - nx.abs()) * if ny >= 0.0 { 1.0 } else { -1.0 }
        };

        let packed = [
            quantize_snorm(u, bits),
            quantize_snorm(v, bits),
            quantize_snorm(1.0, bits),
            quantize_snorm(n.w, component_bits),
        ];

        if descriptor.stride == 4 {
            for (slot, value) in element.iter_mut().zip(packed) {
                *slot = value as i8 as u8;
            }
        } else {
            for (k, value) in packed.into_iter().enumerate() {
                write_i16(element, k * 2, value);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Quaternion
// ---------------------------------------------------------------------------

/// Reconstruct unit quaternions in place.
///
/// Each element holds the three smallest components, cyclically ordered
/// after the omitted largest one, and a fourth field whose low two bits name
/// the omitted component and whose remaining bits carry the quantization
/// scale. The output is four i16 snorm components in `xyzw` order with the
/// reconstructed component non-negative.
pub fn decode_filter_quat(buffer: &mut [u8], descriptor: FilterDescriptor) -> CodecResult<()> {
    descriptor.check(buffer, &[8], "quaternion")?;

    let scale = 1.0 / SQRT_2;
    for element in buffer.chunks_exact_mut(8) {
        let [a, b, c, tag] = [0, 2, 4, 6].map(|at| read_i16(element, at));

        let sf = tag | 3;
        let ss = scale / sf as f32;

        let x = a as f32 * ss;
        let y = b as f32 * ss;
        let z = c as f32 * ss;

        // Clamp before sqrt: rounding can push the sum slightly past 1.
        let ww = 1.0 - x * x - y * y - z * z;
        let w = ww.max(0.0).sqrt();

        let xf = round_signed(x * 32767.0);
        let yf = round_signed(y * 32767.0);
        let zf = round_signed(z * 32767.0);
        let wf = (w * 32767.0 + 0.5) as i32;

        let qc = (tag & 3) as usize;
        write_i16(element, ((qc + 1) & 3) * 2, xf);
        write_i16(element, ((qc + 2) & 3) * 2, yf);
        write_i16(element, ((qc + 3) & 3) * 2, zf);
        write_i16(element, qc * 2, wf);
    }

    tracing::trace!(count = descriptor.count, "decoded quaternion filter");
    Ok(())
}

/// Encode unit quaternions (`xyzw` floats) into quaternion elements.
///
/// `bits` is the component precision, 4..=16. `data` holds `4 * count`
/// floats; the stride must be 8.
pub fn encode_filter_quat(
    destination: &mut [u8],
    descriptor: FilterDescriptor,
    bits: u32,
    data: &[f32],
) -> CodecResult<()> {
    descriptor.check(destination, &[8], "quaternion")?;
    check_bits(bits, 4..=16, "quaternion")?;
    check_input(data, descriptor.count * 4)?;

    for (element, q) in destination.chunks_exact_mut(8).zip(data.chunks_exact(4)) {
        let q = Vec4::from_slice(q).to_array();

        let mut qc = 0;
        for k in 1..4 {
            if q[k].abs() > q[qc].abs() {
                qc = k;
            }
        }

        // q and -q are the same rotation, so the omitted component is made
        // non-negative.
        let sign = if q[qc] < 0.0 { -1.0 } else { 1.0 };

        for k in 0..3 {
            let v = q[(qc + k + 1) & 3] * SQRT_2 * sign;
            write_i16(element, k * 2, quantize_snorm(v, bits));
        }
        write_i16(element, 6, (quantize_snorm(1.0, bits) & !3) | qc as i32);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Exponential
// ---------------------------------------------------------------------------

/// Binary exponent `e` such that `|v| < 2^e`. Zero maps to the minimum
/// exponent so it never widens a shared exponent.
fn exponent_of(v: f32) -> i32 {
    if v == 0.0 {
        MIN_EXP
    } else {
        ((v.to_bits() >> 23) & 0xff) as i32 - 127 + 1
    }
}

/// `2^e` for `e` in the normal float exponent range.
fn exp2i(e: i32) -> f32 {
    f32::from_bits(((e + 127) as u32) << 23)
}

/// Reconstruct floats from mantissa/exponent pairs in place.
///
/// Every 32-bit component holds a 24-bit signed mantissa in its low bits and
/// an 8-bit signed exponent in its high byte: `value = mantissa * 2^exponent`.
pub fn decode_filter_exp(buffer: &mut [u8], descriptor: FilterDescriptor) -> CodecResult<()> {
    descriptor.check_exp(buffer)?;

    for component in buffer.chunks_exact_mut(4) {
        let v = u32::from_le_bytes([component[0], component[1], component[2], component[3]]);
        let m = ((v << 8) as i32) >> 8;
        let e = (v as i32) >> 24;

        let value = f32::from_bits(((e + 127) as u32) << 23) * m as f32;
        component.copy_from_slice(&value.to_le_bytes());
    }

    tracing::trace!(
        count = descriptor.count,
        stride = descriptor.stride,
        "decoded exponential filter"
    );
    Ok(())
}

/// Encode floats as mantissa/exponent pairs.
///
/// `bits` (1..=24) is the signed mantissa width; exponents are chosen per
/// `mode` as the smallest that keeps every mantissa in range. `data` holds
/// `count * stride / 4` finite floats.
pub fn encode_filter_exp(
    destination: &mut [u8],
    descriptor: FilterDescriptor,
    bits: u32,
    data: &[f32],
    mode: ExpMode,
) -> CodecResult<()> {
    descriptor.check_exp(destination)?;
    check_bits(bits, 1..=24, "exponential")?;
    let components = descriptor.stride / 4;
    check_input(data, descriptor.count * components)?;

    let mut component_exp = [MIN_EXP; MAX_EXP_STRIDE / 4];

    if mode == ExpMode::SharedComponent {
        for element in data.chunks_exact(components) {
            for (shared, &v) in component_exp.iter_mut().zip(element) {
                *shared = (*shared).max(exponent_of(v));
            }
        }
    }

    for (out, element) in destination
        .chunks_exact_mut(descriptor.stride)
        .zip(data.chunks_exact(components))
    {
        let vector_exp = element
            .iter()
            .fold(MIN_EXP, |acc, &v| acc.max(exponent_of(v)));

        match mode {
            ExpMode::Separate => {
                for (e, &v) in component_exp.iter_mut().zip(element) {
                    *e = MIN_EXP.max(exponent_of(v));
                }
            }
            ExpMode::Clamped => {
                for (e, &v) in component_exp.iter_mut().zip(element) {
                    *e = exponent_of(v).max(0);
                }
            }
            ExpMode::SharedVector | ExpMode::SharedComponent => {}
        }

        for (j, (slot, &v)) in out.chunks_exact_mut(4).zip(element).enumerate() {
            let base = if mode == ExpMode::SharedVector {
                vector_exp
            } else {
                component_exp[j]
            };
            // Scale so the mantissa is a `bits`-bit signed integer.
            let mut exp = (base - (bits as i32 - 1)).min(126);
            let mut m = round_signed(v * exp2i(-exp));

            // Rounding up can reach 2^(bits-1), which the mantissa cannot hold.
            if m.unsigned_abs() >= 1 << (bits - 1) && exp < 126 {
                exp += 1;
                m = round_signed(v * exp2i(-exp));
            }
            let packed = (m as u32 & 0x00ff_ffff) | ((exp as u32) << 24);
            slot.copy_from_slice(&packed.to_le_bytes());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn read_snorm16(bytes: &[u8], count: usize) -> Vec<f32> {
        (0..count)
            .map(|k| read_i16(bytes, k * 2) as f32 / 32767.0)
            .collect()
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize_snorm(1.0, 8), 127);
        assert_eq!(quantize_snorm(-1.0, 8), -127);
        assert_eq!(quantize_snorm(2.0, 16), 32767);
        assert_eq!(quantize_snorm(-0.5, 8), -64);
        assert_eq!(quantize_unorm(0.5, 8), 128);
        assert_eq!(quantize_unorm(-3.0, 10), 0);
        assert_eq!(quantize_unorm(1.0, 10), 1023);
    }

    #[test]
    fn test_oct_roundtrip_16bit() {
        let dirs = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Z,
            Vec3::new(0.577, 0.577, 0.577),
            Vec3::new(-0.3, 0.2, -0.9),
            Vec3::new(0.1, -0.95, -0.2),
        ];
        let data: Vec<f32> = dirs
            .iter()
            .flat_map(|d| {
                let n = d.normalize();
                [n.x, n.y, n.z, 0.5]
            })
            .collect();

        let descriptor = FilterDescriptor::new(dirs.len(), 8);
        let mut buffer = vec![0u8; descriptor.byte_len()];
        encode_filter_oct(&mut buffer, descriptor, 16, &data).unwrap();
        decode_filter_oct(&mut buffer, descriptor).unwrap();

        for (i, dir) in dirs.iter().enumerate() {
            let got = read_snorm16(&buffer[i * 8..], 4);
            let decoded = Vec3::new(got[0], got[1], got[2]);
            assert!(
                (decoded - dir.normalize()).length() < 1e-3,
                "{dir:?} decoded as {decoded:?}"
            );
            assert!((got[3] - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_oct_roundtrip_8bit() {
        let n = Vec3::new(0.2, -0.7, 0.4).normalize();
        let descriptor = FilterDescriptor::new(1, 4);
        let mut buffer = [0u8; 4];
        encode_filter_oct(&mut buffer, descriptor, 8, &[n.x, n.y, n.z, 0.0]).unwrap();
        decode_filter_oct(&mut buffer, descriptor).unwrap();

        let decoded = Vec3::new(
            f32::from(buffer[0] as i8),
            f32::from(buffer[1] as i8),
            f32::from(buffer[2] as i8),
        ) / 127.0;
        assert!((decoded - n).length() < 0.03);
    }

    #[test]
    fn test_oct_decode_is_deterministic_on_fold() {
        // u = 100, v = -100, one = 127: z = -73 folds into the lower half.
        let mut buffer = [100u8, (-100i8) as u8, 127, 9];
        decode_filter_oct(&mut buffer, FilterDescriptor::new(1, 4)).unwrap();
        let [x, y, z] = [0, 1, 2].map(|k| buffer[k] as i8);
        assert!(x > 0 && y < 0 && z < 0);
        assert_eq!(buffer[3], 9);
        let length = Vec3::new(f32::from(x), f32::from(y), f32::from(z)).length();
        assert!((length - 127.0).abs() < 1.5);
    }

    #[test]
    fn test_quat_roundtrip() {
        let quats = [
            Quat::IDENTITY,
            Quat::from_rotation_y(2.5),
            Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5).normalize(), -1.2),
            Quat::from_xyzw(-0.5, 0.5, -0.5, -0.5),
        ];
        let data: Vec<f32> = quats.iter().flat_map(|q| q.to_array()).collect();
        let descriptor = FilterDescriptor::new(quats.len(), 8);
        let mut buffer = vec![0u8; descriptor.byte_len()];
        encode_filter_quat(&mut buffer, descriptor, 16, &data).unwrap();
        decode_filter_quat(&mut buffer, descriptor).unwrap();

        for (i, q) in quats.iter().enumerate() {
            let got = read_snorm16(&buffer[i * 8..], 4);
            let decoded = Quat::from_xyzw(got[0], got[1], got[2], got[3]);
            // q and -q are the same rotation.
            let error = (decoded.dot(*q).abs() - 1.0).abs();
            assert!(error < 1e-3, "{q:?} decoded as {decoded:?}");
        }
    }

    #[test]
    fn test_exp_shared_vector() {
        let data = [1.0f32, -0.25, 3.5, 1000.0];
        let descriptor = FilterDescriptor::new(1, 16);
        let mut buffer = [0u8; 16];
        encode_filter_exp(&mut buffer, descriptor, 15, &data, ExpMode::SharedVector).unwrap();

        // One shared exponent across the element.
        let exps: Vec<u8> = buffer.chunks_exact(4).map(|c| c[3]).collect();
        assert!(exps.iter().all(|&e| e == exps[0]));

        decode_filter_exp(&mut buffer, descriptor).unwrap();
        for (chunk, want) in buffer.chunks_exact(4).zip(data) {
            let got = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            // Error is bounded by half a step of the largest component.
            assert!((got - want).abs() <= 1024.0 / 16384.0 * 0.5 + f32::EPSILON);
        }
    }

    #[test]
    fn test_exp_modes_bound_relative_error() {
        let data = [0.001f32, 123.456, -7.0, 0.0, 2.5e-6, -98_765.0];
        let descriptor = FilterDescriptor::new(3, 8);
        for mode in [ExpMode::Separate, ExpMode::SharedComponent, ExpMode::Clamped] {
            let mut buffer = [0u8; 24];
            encode_filter_exp(&mut buffer, descriptor, 20, &data, mode).unwrap();
            decode_filter_exp(&mut buffer, descriptor).unwrap();
            for (i, (chunk, want)) in buffer.chunks_exact(4).zip(data).enumerate() {
                let got = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                let reference = match mode {
                    ExpMode::SharedComponent => data[i % 2..]
                        .iter()
                        .step_by(2)
                        .fold(0f32, |acc, v| acc.max(v.abs())),
                    ExpMode::Clamped => want.abs().max(1.0),
                    _ => want.abs(),
                };
                assert!(
                    (got - want).abs() <= reference * 2f32.powi(-18),
                    "{mode:?}: {want} decoded as {got}"
                );
            }
        }
    }

    #[test]
    fn test_exp_mantissa_rounding_up_keeps_sign() {
        // Just below a power of two the mantissa rounds up to 2^(bits-1).
        let data = [0x3f7f_ffff, 0x407f_ffff, 0xbf7f_ffff, 0xc07f_ffff].map(f32::from_bits);
        let descriptor = FilterDescriptor::new(1, 16);
        for mode in [
            ExpMode::Separate,
            ExpMode::SharedVector,
            ExpMode::SharedComponent,
            ExpMode::Clamped,
        ] {
            let mut buffer = [0u8; 16];
            encode_filter_exp(&mut buffer, descriptor, 24, &data, mode).unwrap();
            decode_filter_exp(&mut buffer, descriptor).unwrap();
            for (chunk, want) in buffer.chunks_exact(4).zip(data) {
                let got = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                assert_eq!(got.signum(), want.signum(), "{mode:?}: {want} decoded as {got}");
                assert!(
                    (got - want).abs() <= 4.0 * 2f32.powi(-23),
                    "{mode:?}: {want} decoded as {got}"
                );
            }
        }
    }

    #[test]
    fn test_exp_zero_does_not_widen_shared_exponent() {
        let data = [0.001f32, 0.0];
        let descriptor = FilterDescriptor::new(1, 8);
        let mut buffer = [0u8; 8];
        encode_filter_exp(&mut buffer, descriptor, 12, &data, ExpMode::SharedVector).unwrap();
        decode_filter_exp(&mut buffer, descriptor).unwrap();
        let got = f32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
        assert!((got - 0.001).abs() <= 0.001 * 2f32.powi(-11));
    }

    #[test]
    fn test_oct_rejects_one_bit() {
        let descriptor = FilterDescriptor::new(1, 8);
        let mut buffer = [0u8; 8];
        let err = encode_filter_oct(&mut buffer, descriptor, 1, &[0.0, 0.0, 1.0, 0.0]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));
        encode_filter_oct(&mut buffer, descriptor, 2, &[0.0, 0.0, 1.0, 0.0]).unwrap();
        decode_filter_oct(&mut buffer, descriptor).unwrap();
        assert_eq!(read_i16(&buffer, 4), 32767);
    }

    #[test]
    fn test_argument_checks() {
        let mut buffer = [0u8; 8];
        let err = decode_filter_quat(&mut buffer, FilterDescriptor::new(1, 4)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));

        let err = decode_filter_oct(&mut buffer, FilterDescriptor::new(3, 4)).unwrap_err();
        assert_eq!(
            err,
            CodecError::SizeMismatch {
                expected: 12,
                actual: 8
            }
        );

        let err = encode_filter_oct(&mut buffer[..4], FilterDescriptor::new(1, 4), 12, &[0.0; 4])
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));

        let err = decode_filter_exp(&mut buffer, FilterDescriptor::new(1, 6)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));

        let err = encode_filter_exp(
            &mut buffer,
            FilterDescriptor::new(1, 8),
            8,
            &[1.0],
            ExpMode::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CodecError::InvalidArgument(_)));
    }
}
