use crate::bits::BitReader;
use crate::error::FlacError;
use crate::prelude::{Decode, Result};
use std::fmt;
use std::io::Read;

/// Size of the STREAMINFO payload in bytes.
pub const STREAM_INFO_LENGTH: usize = 34;

/// Notes:
/// FLAC specifies a minimum block size of 16 and a maximum block size of 65535,
/// meaning the bit patterns corresponding to the numbers 0-15 in the minimum blocksize and maximum blocksize fields are invalid.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockStreamInfo {
    /// <16> The minimum block size (in samples) used in the stream.
    pub min_block_size: u16,
    /// <16> The maximum block size (in samples) used in the stream.
    pub max_block_size: u16,
    /// <24> The minimum frame size (in bytes) used in the stream. May be 0 to imply the value is not known.
    pub min_frame_size: u32,
    /// <24> The maximum frame size (in bytes) used in the stream. May be 0 to imply the value is not known.
    pub max_frame_size: u32,
    /// <20> Sample rate in Hz.
    /// Though 20 bits are available, the maximum sample rate is limited by the structure of frame headers to 655350Hz.
    /// Also, a value of 0 is invalid.
    pub sample_rate: u32,
    /// <3> (number of channels)-1.
    /// FLAC supports from 1 to 8 channels
    pub channels: u8,
    /// <5> (bits per sample)-1.
    /// FLAC supports from 4 to 32 bits per sample.
    pub bits_per_sample: u8,
    /// <36> Total samples in stream.
    /// 'Samples' means inter-channel sample, i.e. one second of 44.1Khz audio will have 44100 samples regardless of the number of channels.
    /// A value of zero here means the number of total samples is unknown.
    pub total_samples: u64,
    /// <128> MD5 signature of the unencoded audio data.
    /// This allows the decoder to determine if an error exists in the audio data even when the error does not result in an invalid bitstream.
    pub md5_signature: [u8; 16],
}

impl BlockStreamInfo {
    /// (Minimum blocksize == maximum blocksize) implies a fixed-blocksize stream.
    pub fn is_fixed_blocksize_stream(&self) -> bool {
        self.min_block_size == self.max_block_size
    }

    /// An all-zero signature means the encoder did not compute one.
    pub fn has_md5_signature(&self) -> bool {
        self.md5_signature != [0u8; 16]
    }

    pub fn total_samples(&self) -> Option<u64> {
        match self.total_samples {
            0 => None,
            n => Some(n),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_block_size > self.max_block_size {
            return Err(FlacError::InvalidStreamInfo(
                "minimum block size exceeds maximum block size",
            ));
        }
        if self.min_frame_size != 0
            && self.max_frame_size != 0
            && self.min_frame_size > self.max_frame_size
        {
            return Err(FlacError::InvalidStreamInfo(
                "minimum frame size exceeds maximum frame size",
            ));
        }
        if self.sample_rate == 0 {
            return Err(FlacError::InvalidStreamInfo("sample rate is zero"));
        }
        if !(4..=32).contains(&self.bits_per_sample) {
            return Err(FlacError::InvalidStreamInfo(
                "bits per sample out of range 4-32",
            ));
        }
        Ok(())
    }
}

impl Decode for BlockStreamInfo {
    fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bits = BitReader::new(reader);
        let min_block_size = bits.read_bits(16)? as u16;
        let max_block_size = bits.read_bits(16)? as u16;
        let min_frame_size = bits.read_bits(24)?;
        let max_frame_size = bits.read_bits(24)?;
        let sample_rate = bits.read_bits(20)?;
        let channels = bits.read_bits(3)? as u8 + 1;
        let bits_per_sample = bits.read_bits(5)? as u8 + 1;
        let total_samples = bits.read_bits_u64(36)?;
        let mut md5_signature = [0u8; 16];
        bits.read_exact(&mut md5_signature)?;

        let info = BlockStreamInfo {
            min_block_size,
            max_block_size,
            min_frame_size,
            max_frame_size,
            sample_rate,
            channels,
            bits_per_sample,
            total_samples,
            md5_signature,
        };
        info.validate()?;
        Ok(info)
    }
}

impl fmt::Debug for BlockStreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockStreamInfo")
            .field("min_block_size", &self.min_block_size)
            .field("max_block_size", &self.max_block_size)
            .field("min_frame_size", &self.min_frame_size)
            .field("max_frame_size", &self.max_frame_size)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("bits_per_sample", &self.bits_per_sample)
            .field("total_samples", &self.total_samples)
            .field("md5_signature", &hex::encode(self.md5_signature))
            .finish()
    }
}
