use crate::bits::BitReader;
use crate::error::FlacError;
use crate::prelude::Result;
use crate::residual::read_residual;
use std::io::Read;

pub const MAX_FIXED_ORDER: usize = 4;

/// Polynomial predictors of the fixed subframe, indexed by order.
const FIXED_COEFFICIENTS: [&[i64]; MAX_FIXED_ORDER + 1] =
    [&[], &[1], &[2, -1], &[3, -3, 1], &[4, -6, 4, -1]];

/// How one channel of a frame was encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subframe {
    pub kind: SubframeKind,
    /// Number of low zero bits factored out of every sample.
    pub wasted_bits: u32,
}

/// <6> Subframe type:
/// - `000000` : SUBFRAME_CONSTANT
/// - `000001` : SUBFRAME_VERBATIM
/// - `00001x` : reserved
/// - `0001xx` : reserved
/// - `001xxx` : if(xxx <= 4) SUBFRAME_FIXED, xxx=order ; else reserved
/// - `01xxxx` : reserved
/// - `1xxxxx` : SUBFRAME_LPC, xxxxx=order-1
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubframeKind {
    /// The stored value, before wasted bits are restored.
    Constant(i64),
    Verbatim,
    Fixed {
        order: usize,
    },
    Lpc {
        order: usize,
        /// Quantized linear predictor coefficients' precision in bits.
        precision: u32,
        /// Quantized linear predictor coefficient shift needed in bits.
        shift: u32,
        coefficients: Vec<i64>,
    },
}

/// Decodes one subframe into `out`, whose length is the frame's block size.
///
/// `bits_per_sample` already includes the extra bit of a side channel.
pub(crate) fn read_subframe<R: Read>(
    reader: &mut BitReader<R>,
    bits_per_sample: u32,
    out: &mut [i64],
) -> Result<Subframe> {
    if reader.read_bit()? {
        return Err(FlacError::MalformedSubframeHeader("padding bit is set"));
    }
    let type_code = reader.read_bits(6)?;

    // <1+k> 'Wasted bits-per-sample' flag, followed by k-1 in unary
    let wasted_bits = if reader.read_bit()? {
        let k = reader
            .read_unary(bits_per_sample)
            .map_err(|e| match e {
                FlacError::InvalidResidual(_) => {
                    FlacError::MalformedSubframeHeader("wasted bits exceed sample size")
                }
                e => e,
            })?;
        k + 1
    } else {
        0
    };
    if wasted_bits >= bits_per_sample {
        return Err(FlacError::MalformedSubframeHeader(
            "wasted bits exceed sample size",
        ));
    }
    let bits = bits_per_sample - wasted_bits;

    let kind = match type_code {
        0 => {
            let value = reader.read_signed(bits)?;
            out.fill(value);
            SubframeKind::Constant(value)
        }
        1 => {
            for sample in out.iter_mut() {
                *sample = reader.read_signed(bits)?;
            }
            SubframeKind::Verbatim
        }
        8..=12 => {
            let order = (type_code - 8) as usize;
            read_warm_up(reader, bits, order, out)?;
            read_residual(reader, order, out)?;
            predict(FIXED_COEFFICIENTS[order], 0, out);
            SubframeKind::Fixed { order }
        }
        32..=63 => {
            let order = (type_code - 31) as usize;
            read_warm_up(reader, bits, order, out)?;

            // <4> (Quantized linear predictor coefficients' precision in bits)-1 (NOTE: 1111 is invalid).
            let precision = match reader.read_bits(4)? {
                0b1111 => {
                    return Err(FlacError::MalformedSubframeHeader(
                        "invalid coefficient precision",
                    ))
                }
                p => p + 1,
            };
            // <5> Quantized linear predictor coefficient shift needed in bits (NOTE: this number is signed two's-complement).
            let shift = reader.read_signed(5)?;
            if shift < 0 {
                return Err(FlacError::MalformedSubframeHeader("negative LPC shift"));
            }
            let mut coefficients = Vec::with_capacity(order);
            for _ in 0..order {
                coefficients.push(reader.read_signed(precision)?);
            }

            read_residual(reader, order, out)?;
            predict(&coefficients, shift as u32, out);
            SubframeKind::Lpc {
                order,
                precision,
                shift: shift as u32,
                coefficients,
            }
        }
        _ => {
            return Err(FlacError::MalformedSubframeHeader(
                "reserved subframe type",
            ))
        }
    };

    if wasted_bits > 0 {
        for sample in out.iter_mut() {
            *sample <<= wasted_bits;
        }
    }

    Ok(Subframe { kind, wasted_bits })
}

fn read_warm_up<R: Read>(
    reader: &mut BitReader<R>,
    bits: u32,
    order: usize,
    out: &mut [i64],
) -> Result<()> {
    if order > out.len() {
        return Err(FlacError::MalformedSubframeHeader(
            "predictor order exceeds block size",
        ));
    }
    for sample in out[..order].iter_mut() {
        *sample = reader.read_signed(bits)?;
    }
    Ok(())
}

/// Adds `(Σ coefficients[j] * samples[i - 1 - j]) >> shift` to every residual in place.
///
/// Arithmetic wraps, corrupt input gives garbage samples instead of a panic.
fn predict(coefficients: &[i64], shift: u32, samples: &mut [i64]) {
    let order = coefficients.len();
    for i in order..samples.len() {
        let sum = coefficients
            .iter()
            .zip(samples[i - order..i].iter().rev())
            .fold(0i64, |acc, (c, s)| acc.wrapping_add(c.wrapping_mul(*s)));
        samples[i] = samples[i].wrapping_add(sum >> shift);
    }
}
