use crate::bits::BitReader;
use crate::blocks::BlockStreamInfo;
use crate::error::FlacError;
use crate::prelude::Result;
use std::io::Read;

/// First byte of the 14-bit sync code `11111111111110`.
pub const SYNC_BYTE: u8 = 0xFF;

/// The second sync byte carries the last 6 sync bits, a reserved 0 bit and the
/// blocking strategy bit.
pub fn is_sync_second_byte(byte: u8) -> bool {
    byte & 0b1111_1110 == 0b1111_1000
}

/// Scans byte by byte for a frame sync code.
///
/// Returns the second sync byte, with the reader positioned right after it and both
/// checksums restarted at the sync code. `None` means the source ended first.
pub(crate) fn seek_sync<R: Read>(reader: &mut BitReader<R>) -> Result<Option<u8>> {
    reader.align_to_byte();
    let mut previous = match reader.try_read_byte()? {
        Some(byte) => byte,
        None => return Ok(None),
    };
    loop {
        let byte = match reader.try_read_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };
        if previous == SYNC_BYTE && is_sync_second_byte(byte) {
            reader.begin_crc(&[SYNC_BYTE, byte]);
            return Ok(Some(byte));
        }
        previous = byte;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// <1> Blocking strategy:
    /// - 0 : fixed-blocksize stream; frame header encodes the frame number
    /// - 1 : variable-blocksize stream; frame header encodes the sample number
    ///
    /// The "blocking strategy" bit must be the same throughout the entire stream.
    pub number: FrameNumber,
    /// <4> Block size in inter-channel samples:
    /// - `0000` : reserved
    /// - `0001` : 192 samples
    /// - `0010-0101` : 576 * (2^(n-2)) samples, i.e. 576/1152/2304/4608
    /// - `0110` : get 8 bit (blocksize-1) from end of header
    /// - `0111` : get 16 bit (blocksize-1) from end of header
    /// - `1000-1111` : 256 * (2^(n-8)) samples, i.e. 256/512/1024/2048/4096/8192/16384/32768
    pub block_size: u16,
    /// <4> Sample rate:
    /// - `0000` : get from STREAMINFO metadata block
    /// - `0001-1011` : 88.2kHz, 176.4kHz, 192kHz, 8kHz, 16kHz, 22.05kHz, 24kHz, 32kHz,
    ///   44.1kHz, 48kHz, 96kHz
    /// - `1100` : get 8 bit sample rate (in kHz) from end of header
    /// - `1101` : get 16 bit sample rate (in Hz) from end of header
    /// - `1110` : get 16 bit sample rate (in tens of Hz) from end of header
    /// - `1111` : invalid, to prevent sync-fooling string of 1s
    pub sample_rate: u32,
    /// <4> Channel assignment
    pub channel_assignment: ChannelAssignment,
    /// <3> Sample size in bits:
    /// `000` : get from STREAMINFO metadata block
    /// `001` : 8 bits per sample
    /// `010` : 12 bits per sample
    /// `011` : reserved
    /// `100` : 16 bits per sample
    /// `101` : 20 bits per sample
    /// `110` : 24 bits per sample
    /// `111` : 32 bits per sample
    pub bits_per_sample: u32,
    /// <8> CRC-8 (polynomial = x^8 + x^2 + x^1 + x^0, initialized with 0) of everything
    /// before the crc, including the sync code
    pub crc: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameNumber {
    /// <8-48>:"UTF-8" coded frame number (decoded number is 31 bits)
    Frame(u32),
    /// <8-56>:"UTF-8" coded sample number (decoded number is 36 bits)
    Sample(u64),
}

/// <4> Channel assignment
/// - `0000-0111` : (number of independent channels)-1
/// - `1000` : left/side stereo: channel 0 is the left channel, channel 1 is the
///   side(difference) channel
/// - `1001` : right/side stereo: channel 0 is the side(difference) channel, channel 1
///   is the right channel
/// - `1010` : mid/side stereo: channel 0 is the mid(average) channel, channel 1 is the
///   side(difference) channel
/// - `1011-1111` : reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAssignment {
    Independent(u8),
    LeftSide,
    RightSide,
    MidSide,
}

impl ChannelAssignment {
    fn from_code(code: u32) -> Option<ChannelAssignment> {
        match code {
            0..=7 => Some(ChannelAssignment::Independent(code as u8 + 1)),
            8 => Some(ChannelAssignment::LeftSide),
            9 => Some(ChannelAssignment::RightSide),
            10 => Some(ChannelAssignment::MidSide),
            _ => None,
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            ChannelAssignment::Independent(n) => *n as usize,
            _ => 2,
        }
    }

    /// Sample width of a channel's subframe. The side channel needs one extra bit.
    pub fn subframe_bits(&self, channel: usize, bits_per_sample: u32) -> u32 {
        match (self, channel) {
            (ChannelAssignment::LeftSide, 1)
            | (ChannelAssignment::RightSide, 0)
            | (ChannelAssignment::MidSide, 1) => bits_per_sample + 1,
            _ => bits_per_sample,
        }
    }
}

impl FrameHeader {
    /// Parses the header following a sync code found by [`seek_sync`].
    ///
    /// When the header is rejected, its bytes are handed back to the reader so the
    /// next [`seek_sync`] scans them again, starting right after the sync code.
    pub(crate) fn read_after_sync<R: Read>(
        reader: &mut BitReader<R>,
        sync_byte: u8,
        info: &BlockStreamInfo,
    ) -> Result<FrameHeader> {
        reader.mark();
        let result = FrameHeader::parse(reader, sync_byte, info);
        match &result {
            Err(FlacError::InvalidFrameHeader(_) | FlacError::HeaderChecksum { .. }) => {
                reader.rewind_to_mark()
            }
            _ => reader.unmark(),
        }
        result
    }

    fn parse<R: Read>(
        reader: &mut BitReader<R>,
        sync_byte: u8,
        info: &BlockStreamInfo,
    ) -> Result<FrameHeader> {
        let variable_block_size = sync_byte & 1 == 1;

        let block_size_code = reader.read_bits(4)?;
        let sample_rate_code = reader.read_bits(4)?;
        let channel_assignment = ChannelAssignment::from_code(reader.read_bits(4)?)
            .ok_or(FlacError::InvalidFrameHeader("reserved channel assignment"))?;
        let bits_per_sample = match reader.read_bits(3)? {
            0 => info.bits_per_sample as u32,
            1 => 8,
            2 => 12,
            4 => 16,
            5 => 20,
            6 => 24,
            7 => 32,
            _ => return Err(FlacError::InvalidFrameHeader("reserved sample size")),
        };
        if reader.read_bit()? {
            return Err(FlacError::InvalidFrameHeader("reserved bit is set"));
        }

        let number = if variable_block_size {
            FrameNumber::Sample(read_utf8_number(reader, 36)?)
        } else {
            FrameNumber::Frame(read_utf8_number(reader, 31)? as u32)
        };

        let block_size = match block_size_code {
            0 => return Err(FlacError::InvalidFrameHeader("reserved block size")),
            1 => 192,
            n @ 2..=5 => 576 << (n - 2),
            6 => reader.read_bits(8)? + 1,
            7 => reader.read_bits(16)? + 1,
            n => 256 << (n - 8),
        };
        if block_size > u16::MAX as u32 {
            return Err(FlacError::InvalidFrameHeader("block size exceeds 65535"));
        }

        let sample_rate = match sample_rate_code {
            0 => info.sample_rate,
            1 => 88200,
            2 => 176400,
            3 => 192000,
            4 => 8000,
            5 => 16000,
            6 => 22050,
            7 => 24000,
            8 => 32000,
            9 => 44100,
            10 => 48000,
            11 => 96000,
            12 => reader.read_bits(8)? * 1000,
            13 => reader.read_bits(16)?,
            14 => reader.read_bits(16)? * 10,
            _ => return Err(FlacError::InvalidFrameHeader("invalid sample rate")),
        };

        let actual = reader.crc8();
        let crc = reader.read_bits(8)? as u8;
        if crc != actual {
            return Err(FlacError::HeaderChecksum {
                expected: crc,
                actual,
            });
        }

        // only checked once the header is known not to be a false sync
        if info.max_block_size != 0 && block_size > info.max_block_size as u32 {
            return Err(FlacError::InvalidFrameHeader(
                "block size exceeds stream maximum",
            ));
        }
        if channel_assignment.channels() != info.channels as usize {
            return Err(FlacError::InvalidFrameHeader(
                "channel count differs from stream info",
            ));
        }

        Ok(FrameHeader {
            number,
            block_size: block_size as u16,
            sample_rate,
            channel_assignment,
            bits_per_sample,
            crc,
        })
    }

    pub fn channels(&self) -> usize {
        self.channel_assignment.channels()
    }

    /// Index of the first sample of this frame in the stream.
    ///
    /// For fixed-blocksize streams the frame number is multiplied by the stream block size.
    pub fn first_sample(&self, info: &BlockStreamInfo) -> u64 {
        match self.number {
            FrameNumber::Frame(n) => n as u64 * info.max_block_size as u64,
            FrameNumber::Sample(n) => n,
        }
    }
}

/// Reads a frame or sample number in the extended UTF-8 coding, which allows up to 7 bytes.
fn read_utf8_number<R: Read>(reader: &mut BitReader<R>, max_bits: u32) -> Result<u64> {
    let first = reader.read_bits(8)? as u8;
    let (extra, mut value) = match first.leading_ones() {
        0 => (0, first as u64),
        n @ 2..=7 => (n - 1, first as u64 & (0xFF >> (n + 1))),
        _ => return Err(FlacError::InvalidFrameHeader("invalid coded number")),
    };
    for _ in 0..extra {
        let byte = reader.read_bits(8)? as u8;
        if byte & 0b1100_0000 != 0b1000_0000 {
            return Err(FlacError::InvalidFrameHeader("invalid coded number"));
        }
        value = (value << 6) | (byte & 0b0011_1111) as u64;
    }
    if value >> max_bits != 0 {
        return Err(FlacError::InvalidFrameHeader("coded number out of range"));
    }
    Ok(value)
}
