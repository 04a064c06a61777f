use crate::bits::BitReader;
use crate::error::FlacError;
use crate::prelude::Result;
use std::io::Read;

/// Largest folded Rice value accepted. Covers every residual of a 33-bit side channel.
const MAX_FOLDED: u64 = 1 << 34;

/// <2> Residual coding method:
/// - `00` : partitioned Rice coding with 4-bit Rice parameter
/// - `01` : partitioned Rice coding with 5-bit Rice parameter
/// - `10-11` : reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodingMethod {
    Rice,
    Rice2,
}

impl CodingMethod {
    fn parameter_bits(&self) -> u32 {
        match self {
            CodingMethod::Rice => 4,
            CodingMethod::Rice2 => 5,
        }
    }

    /// The all-ones parameter means the partition is stored as raw signed values.
    fn escape_code(&self) -> u32 {
        match self {
            CodingMethod::Rice => 0b1111,
            CodingMethod::Rice2 => 0b11111,
        }
    }
}

/// Decodes a residual section into `out[predictor_order..]`.
///
/// `out` holds the whole block; the first `predictor_order` entries are the warm-up
/// samples and are left untouched.
pub(crate) fn read_residual<R: Read>(
    reader: &mut BitReader<R>,
    predictor_order: usize,
    out: &mut [i64],
) -> Result<()> {
    let block_size = out.len();
    let method = match reader.read_bits(2)? {
        0 => CodingMethod::Rice,
        1 => CodingMethod::Rice2,
        _ => return Err(FlacError::InvalidResidual("reserved coding method")),
    };

    // <4> Partition order, there will be 2^order partitions.
    let order = reader.read_bits(4)?;
    let partitions = 1usize << order;
    let partition_samples = block_size >> order;
    if partition_samples << order != block_size || partition_samples < predictor_order {
        return Err(FlacError::InvalidPartitionOrder {
            order,
            block_size,
            predictor_order,
        });
    }

    let mut offset = predictor_order;
    for partition in 0..partitions {
        let end = (partition + 1) * partition_samples;
        let parameter = reader.read_bits(method.parameter_bits())?;
        if parameter == method.escape_code() {
            let width = reader.read_bits(5)?;
            for sample in out[offset..end].iter_mut() {
                *sample = reader.read_signed(width)?;
            }
        } else {
            let limit = (MAX_FOLDED >> parameter).min(u32::MAX as u64) as u32;
            for sample in out[offset..end].iter_mut() {
                *sample = read_rice(reader, parameter, limit)?;
            }
        }
        offset = end;
    }
    Ok(())
}

/// One Rice-coded value: unary quotient, `parameter` low bits, then zigzag folding.
#[inline]
fn read_rice<R: Read>(reader: &mut BitReader<R>, parameter: u32, limit: u32) -> Result<i64> {
    let quotient = reader.read_unary(limit)? as u64;
    let remainder = reader.read_bits(parameter)? as u64;
    let folded = (quotient << parameter) | remainder;
    Ok((folded >> 1) as i64 ^ -((folded & 1) as i64))
}
