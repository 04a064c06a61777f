//! Property-based tests for the bit reader and the sample reconstruction paths.

use anni_flac_decoder::bits::BitReader;
use anni_flac_decoder::channels::decorrelate;
use anni_flac_decoder::frames::ChannelAssignment;
use anni_flac_decoder::FlacDecoder;
use proptest::prelude::*;
use std::io::Cursor;

mod common;

use common::{frame, independent, BitWriter, MID_SIDE};

proptest! {
    /// Fields of any width up to 64 bits come back in order.
    #[test]
    fn roundtrip_fields(fields in prop::collection::vec((1u32..=64, any::<u64>()), 1..40)) {
        let mut writer = BitWriter::new();
        for &(width, value) in &fields {
            writer.write(value, width);
        }

        let mut reader = BitReader::new(Cursor::new(writer.into_bytes()));
        for &(width, value) in &fields {
            let masked = if width == 64 { value } else { value & ((1u64 << width) - 1) };
            prop_assert_eq!(reader.read_bits_u64(width).unwrap(), masked);
        }
    }

    /// Signed fields are sign-extended from their own width.
    #[test]
    fn roundtrip_signed(fields in prop::collection::vec((1u32..=64, any::<i64>()), 1..40)) {
        let mut writer = BitWriter::new();
        for &(width, value) in &fields {
            writer.write_signed(value, width);
        }

        let mut reader = BitReader::new(Cursor::new(writer.into_bytes()));
        for &(width, value) in &fields {
            let shift = 64 - width;
            prop_assert_eq!(reader.read_signed(width).unwrap(), (value << shift) >> shift);
        }
    }

    #[test]
    fn roundtrip_unary(counts in prop::collection::vec(0u64..100, 1..40)) {
        let mut writer = BitWriter::new();
        for &count in &counts {
            writer.write_unary(count);
        }

        let mut reader = BitReader::new(Cursor::new(writer.into_bytes()));
        for &count in &counts {
            prop_assert_eq!(reader.read_unary(100).unwrap() as u64, count);
        }
    }

    /// Rice coded residuals reproduce the signal for every fixed predictor.
    #[test]
    fn fixed_predictor_roundtrip(
        samples in prop::collection::vec(-2000i64..2000, 8..200),
        order in 0usize..=4,
    ) {
        let block_size = samples.len() as u16;
        let info = common::stream_info(1, 16, samples.len() as u64);
        let data = common::stream(&info, &[frame(0, block_size, independent(1), |w| {
            w.fixed(16, order, &samples)
        })]);

        let mut decoder = FlacDecoder::new(Cursor::new(data)).unwrap();
        let decoded: Vec<i64> = decoder
            .samples()
            .map(|s| s.map(i64::from))
            .collect::<Result<_, _>>()
            .unwrap();
        prop_assert_eq!(decoded, samples);
    }

    /// Escaped partitions hold raw values of the given width.
    #[test]
    fn escaped_residual_roundtrip(
        raw in prop::collection::vec(-(1i64 << 14)..(1i64 << 14), 16..64),
    ) {
        let block_size = raw.len() as u16;
        let info = common::stream_info(1, 16, raw.len() as u64);
        let data = common::stream(&info, &[frame(0, block_size, independent(1), |w| {
            // fixed order 0, 4-bit parameters, one escaped partition of 15-bit values
            w.subframe_header(8);
            w.write(0, 2);
            w.write(0, 4);
            w.write(0b1111, 4);
            w.write(15, 5);
            for &r in &raw {
                w.write_signed(r, 15);
            }
        })]);

        let mut decoder = FlacDecoder::new(Cursor::new(data)).unwrap();
        let block = decoder.next_frame().unwrap().unwrap();
        let decoded: Vec<i64> = block.channel(0).iter().map(|&s| s as i64).collect();
        prop_assert_eq!(decoded, raw);
    }

    #[test]
    fn mid_side_roundtrip(left in any::<i32>(), right in any::<i32>()) {
        let (left, right) = (left as i64, right as i64);
        let mut samples = [(left + right) >> 1, left - right];
        decorrelate(ChannelAssignment::MidSide, &mut samples, 1);
        prop_assert_eq!(samples, [left, right]);
    }

    #[test]
    fn mid_side_frame_roundtrip(
        pairs in prop::collection::vec((-32768i64..32768, -32768i64..32768), 16..64),
    ) {
        let (left, right): (Vec<i64>, Vec<i64>) = pairs.iter().copied().unzip();
        let mid: Vec<i64> = pairs.iter().map(|(l, r)| (l + r) >> 1).collect();
        let side: Vec<i64> = pairs.iter().map(|(l, r)| l - r).collect();

        let info = common::stream_info(2, 16, pairs.len() as u64);
        let data = common::stream(&info, &[frame(0, pairs.len() as u16, MID_SIDE, |w| {
            w.verbatim(16, &mid);
            w.verbatim(17, &side);
        })]);

        let mut decoder = FlacDecoder::new(Cursor::new(data)).unwrap();
        let block = decoder.next_frame().unwrap().unwrap();
        let decoded: Vec<(i32, i32)> = block.stereo_samples().unwrap().collect();
        let expected: Vec<(i32, i32)> = left
            .iter()
            .zip(&right)
            .map(|(&l, &r)| (l as i32, r as i32))
            .collect();
        prop_assert_eq!(decoded, expected);
    }
}
