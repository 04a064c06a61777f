#![allow(dead_code)]

//! Hand-built FLAC streams for the integration tests.

use anni_flac_decoder::blocks::BlockStreamInfo;
use anni_flac_decoder::crc::{crc16, crc8};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// MSB-first bit writer, the mirror of `BitReader`.
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Bits used in the last byte, 0 when aligned.
    used: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn write(&mut self, value: u64, n: u32) {
        for i in (0..n).rev() {
            if self.used == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                *self.bytes.last_mut().unwrap() |= 0x80 >> self.used;
            }
            self.used = (self.used + 1) % 8;
        }
    }

    pub fn write_signed(&mut self, value: i64, n: u32) {
        let mask = if n == 64 { u64::MAX } else { (1u64 << n) - 1 };
        self.write(value as u64 & mask, n);
    }

    pub fn write_unary(&mut self, zeros: u64) {
        for _ in 0..zeros {
            self.write(0, 1);
        }
        self.write(1, 1);
    }

    pub fn write_rice(&mut self, value: i64, parameter: u32) {
        let folded = ((value << 1) ^ (value >> 63)) as u64;
        self.write_unary(folded >> parameter);
        self.write(folded & ((1 << parameter) - 1), parameter);
    }

    pub fn align(&mut self) {
        self.used = 0;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Subframe header without wasted bits.
    pub fn subframe_header(&mut self, type_code: u64) {
        self.subframe_header_wasted(type_code, 0);
    }

    pub fn subframe_header_wasted(&mut self, type_code: u64, wasted_bits: u32) {
        self.write(0, 1);
        self.write(type_code, 6);
        if wasted_bits == 0 {
            self.write(0, 1);
        } else {
            self.write(1, 1);
            self.write_unary(wasted_bits as u64 - 1);
        }
    }

    /// Rice coded residual with 4-bit parameter `parameter` and a single partition.
    pub fn residual(&mut self, parameter: u32, residual: &[i64]) {
        self.write(0, 2);
        self.write(0, 4);
        self.write(parameter as u64, 4);
        for &r in residual {
            self.write_rice(r, parameter);
        }
    }

    pub fn constant(&mut self, bits: u32, value: i64) {
        self.subframe_header(0);
        self.write_signed(value, bits);
    }

    pub fn verbatim(&mut self, bits: u32, samples: &[i64]) {
        self.subframe_header(1);
        for &s in samples {
            self.write_signed(s, bits);
        }
    }

    /// Fixed predictor subframe; the residual is computed from `samples`.
    pub fn fixed(&mut self, bits: u32, order: usize, samples: &[i64]) {
        const COEFFICIENTS: [&[i64]; 5] = [&[], &[1], &[2, -1], &[3, -3, 1], &[4, -6, 4, -1]];
        self.subframe_header(8 + order as u64);
        for &s in &samples[..order] {
            self.write_signed(s, bits);
        }
        self.residual(4, &residual(COEFFICIENTS[order], 0, samples));
    }

    pub fn lpc(
        &mut self,
        bits: u32,
        precision: u32,
        shift: u32,
        coefficients: &[i64],
        samples: &[i64],
    ) {
        let order = coefficients.len();
        self.subframe_header(31 + order as u64);
        for &s in &samples[..order] {
            self.write_signed(s, bits);
        }
        self.write(precision as u64 - 1, 4);
        self.write(shift as u64, 5);
        for &c in coefficients {
            self.write_signed(c, precision);
        }
        self.residual(4, &residual(coefficients, shift, samples));
    }
}

/// What the encoder stores after prediction.
pub fn residual(coefficients: &[i64], shift: u32, samples: &[i64]) -> Vec<i64> {
    let order = coefficients.len();
    (order..samples.len())
        .map(|i| {
            let prediction: i64 = coefficients
                .iter()
                .zip(samples[i - order..i].iter().rev())
                .map(|(c, s)| c * s)
                .sum();
            samples[i] - (prediction >> shift)
        })
        .collect()
}

pub fn stream_info(channels: u8, bits_per_sample: u8, total_samples: u64) -> BlockStreamInfo {
    BlockStreamInfo {
        min_block_size: 16,
        max_block_size: 4096,
        min_frame_size: 0,
        max_frame_size: 0,
        sample_rate: 44100,
        channels,
        bits_per_sample,
        total_samples,
        md5_signature: [0; 16],
    }
}

pub fn encode_stream_info(info: &BlockStreamInfo) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write(info.min_block_size as u64, 16);
    w.write(info.max_block_size as u64, 16);
    w.write(info.min_frame_size as u64, 24);
    w.write(info.max_frame_size as u64, 24);
    w.write(info.sample_rate as u64, 20);
    w.write(info.channels as u64 - 1, 3);
    w.write(info.bits_per_sample as u64 - 1, 5);
    w.write(info.total_samples, 36);
    let mut data = w.into_bytes();
    data.extend_from_slice(&info.md5_signature);
    data
}

pub fn metadata_block(block_type: u8, is_last: bool, payload: &[u8]) -> Vec<u8> {
    let mut data = vec![if is_last { 0x80 } else { 0 } | block_type];
    data.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
    data.extend_from_slice(payload);
    data
}

/// `fLaC`, STREAMINFO and `blocks` as (type, payload) pairs.
pub fn stream_header(info: &BlockStreamInfo, blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    data.extend(metadata_block(0, blocks.is_empty(), &encode_stream_info(info)));
    for (i, (block_type, payload)) in blocks.iter().enumerate() {
        data.extend(metadata_block(*block_type, i + 1 == blocks.len(), payload));
    }
    data
}

/// A stream without optional metadata blocks.
pub fn stream(info: &BlockStreamInfo, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut data = stream_header(info, &[]);
    for frame in frames {
        data.extend_from_slice(frame);
    }
    data
}

/// Channel assignment codes of the frame header.
pub const LEFT_SIDE: u64 = 8;
pub const RIGHT_SIDE: u64 = 9;
pub const MID_SIDE: u64 = 10;

pub fn independent(channels: u64) -> u64 {
    channels - 1
}

/// A complete frame of a fixed-blocksize stream. Sample rate and sample size are
/// taken from STREAMINFO, the block size is stored in 16 bits after the frame number.
pub fn frame(
    number: u64,
    block_size: u16,
    channel_code: u64,
    subframes: impl FnOnce(&mut BitWriter),
) -> Vec<u8> {
    let mut w = BitWriter::new();
    w.write(0xfff8, 16);
    w.write(7, 4);
    w.write(0, 4);
    w.write(channel_code, 4);
    w.write(0, 3);
    w.write(0, 1);
    write_coded_number(&mut w, number);
    w.write(block_size as u64 - 1, 16);
    let crc = crc8(w.bytes());
    w.write(crc as u64, 8);

    subframes(&mut w);
    w.align();
    let crc = crc16(w.bytes());
    w.write(crc as u64, 16);
    w.into_bytes()
}

fn write_coded_number(w: &mut BitWriter, number: u64) {
    if number < 0x80 {
        w.write(number, 8);
    } else {
        assert!(number < 0x800);
        w.write(0b110, 3);
        w.write(number >> 6, 5);
        w.write(0b10, 2);
        w.write(number & 0x3f, 6);
    }
}

/// Size of the frame header written by [`frame`] for small frame numbers, including the CRC-8.
pub const FRAME_HEADER_LENGTH: usize = 8;

/// A stereo frame with a constant value on both channels.
pub fn constant_frame(number: u64, block_size: u16, left: i64, right: i64) -> Vec<u8> {
    frame(number, block_size, independent(2), |w| {
        w.constant(16, left);
        w.constant(16, right);
    })
}

/// Interleaved little-endian samples as hashed by FLAC encoders.
pub fn md5_of(samples: &[i32], bits_per_sample: u32) -> [u8; 16] {
    let width = ((bits_per_sample + 7) / 8) as usize;
    let mut data = Vec::new();
    for s in samples {
        data.extend_from_slice(&s.to_le_bytes()[..width]);
    }
    md5::compute(&data).0
}

/// Deterministic test signal within `amplitude + 1` of zero.
pub fn signal(len: usize, amplitude: i64, seed: i64) -> Vec<i64> {
    (0..len as i64)
        .map(|i| {
            let phase = (i * 7 + seed * 13) % 64;
            let triangle = if phase < 32 { phase } else { 64 - phase };
            (triangle - 16) * amplitude / 16 + (i * seed) % 3 - 1
        })
        .collect()
}
