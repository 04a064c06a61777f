use crate::bits::BitReader;
use crate::blocks::{BlockSeekTable, BlockStreamInfo};
use crate::channels::decorrelate;
use crate::error::FlacError;
use crate::frames::{seek_sync, FrameHeader};
use crate::header::{read_metadata, FlacHeader, MetadataBlock};
use crate::options::{ChecksumPolicy, DecoderOptions, Recovery};
use crate::prelude::Result;
use crate::subframe::{read_subframe, Subframe};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Metadata parsed, no frame decoded yet.
    StreamReady,
    /// A decoded block is available.
    FrameReady,
    /// The last frame was corrupt, the next call looks for a new sync code.
    Desynchronized,
    /// End of stream, or an error that stopped decoding.
    Exhausted,
}

/// Result of the CRC-16 check of a frame footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameChecksum {
    Valid,
    /// Only produced with [`ChecksumPolicy::Warn`].
    Mismatch { expected: u16, actual: u16 },
}

/// One decoded frame: `block_size` samples for every channel.
#[derive(Debug)]
pub struct Block {
    header: FrameHeader,
    offset: u64,
    /// Channel-major.
    samples: Vec<i32>,
    subframes: Vec<Subframe>,
    checksum: FrameChecksum,
}

impl Block {
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Byte offset of the frame sync code in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn block_size(&self) -> usize {
        self.header.block_size as usize
    }

    pub fn channels(&self) -> usize {
        self.header.channels()
    }

    /// Total number of samples over all channels.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn channel(&self, channel: usize) -> &[i32] {
        let size = self.block_size();
        &self.samples[channel * size..(channel + 1) * size]
    }

    /// The `index`-th sample in interleaved order.
    pub fn interleaved_sample(&self, index: usize) -> i32 {
        let channels = self.channels();
        let (frame, channel) = (index / channels, index % channels);
        self.samples[channel * self.block_size() + frame]
    }

    pub fn interleaved(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.len()).map(move |i| self.interleaved_sample(i))
    }

    /// Left and right pairs, or `None` unless the block has exactly two channels.
    pub fn stereo_samples(&self) -> Option<impl Iterator<Item = (i32, i32)> + '_> {
        if self.channels() != 2 {
            return None;
        }
        Some(self.channel(0).iter().copied().zip(self.channel(1).iter().copied()))
    }

    pub fn subframes(&self) -> &[Subframe] {
        &self.subframes
    }

    pub fn checksum(&self) -> FrameChecksum {
        self.checksum
    }
}

pub struct FlacDecoder<R> {
    inner: BitReader<BufReader<R>>,
    header: FlacHeader,
    options: DecoderOptions,
    state: DecoderState,

    block: Option<Block>,
    /// Decoding buffer, channel-major.
    work: Vec<i64>,
    /// Next interleaved sample of `block` returned by `next_sample`.
    cursor: usize,
    /// Byte offset of the frame being decoded.
    frame_offset: u64,

    frames_decoded: u64,
    frames_dropped: u64,
    samples_decoded: u64,
    checksum_failures: u64,

    md5: Option<md5::Context>,
    md5_buffer: Vec<u8>,
}

impl FlacDecoder<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FlacDecoder<File>> {
        FlacDecoder::new(File::open(path)?)
    }
}

impl<R: Read> FlacDecoder<R> {
    pub fn new(r: R) -> Result<FlacDecoder<R>> {
        FlacDecoder::with_options(r, DecoderOptions::default())
    }

    /// Reads the stream marker and metadata blocks, stopping before the first frame.
    pub fn with_options(r: R, options: DecoderOptions) -> Result<FlacDecoder<R>> {
        let mut inner = BitReader::new(BufReader::new(r));
        let header = read_metadata(&mut inner)?;

        let md5 = if options.verify_md5 {
            if header.stream_info.has_md5_signature() {
                Some(md5::Context::new())
            } else {
                log::debug!("stream has no md5 signature, skipping verification");
                None
            }
        } else {
            None
        };

        Ok(FlacDecoder {
            inner,
            header,
            options,
            state: DecoderState::StreamReady,
            block: None,
            work: Vec::new(),
            cursor: 0,
            frame_offset: 0,
            frames_decoded: 0,
            frames_dropped: 0,
            samples_decoded: 0,
            checksum_failures: 0,
            md5,
            md5_buffer: Vec::new(),
        })
    }

    pub fn stream_info(&self) -> &BlockStreamInfo {
        &self.header.stream_info
    }

    pub fn metadata_blocks(&self) -> &[MetadataBlock] {
        &self.header.blocks
    }

    pub fn seek_table(&self) -> Option<&BlockSeekTable> {
        self.header.seek_table()
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Inter-channel samples in all successfully decoded frames.
    pub fn samples_decoded(&self) -> u64 {
        self.samples_decoded
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Frames whose CRC-16 footer did not match, whether they were kept or not.
    pub fn checksum_failures(&self) -> u64 {
        self.checksum_failures
    }

    /// Decodes the next frame.
    ///
    /// Returns `Ok(None)` once the stream has ended. Errors of a single frame are
    /// wrapped in [`FlacError::Frame`]; whether decoding can go on afterwards
    /// depends on [`DecoderOptions::recovery`].
    pub fn next_frame(&mut self) -> Result<Option<&Block>> {
        if self.state == DecoderState::Exhausted {
            return Ok(None);
        }

        let index = self.frames_decoded + self.frames_dropped;
        match self.read_frame() {
            Ok(true) => {
                self.state = DecoderState::FrameReady;
                self.cursor = 0;
                Ok(self.block.as_ref())
            }
            Ok(false) => {
                self.state = DecoderState::Exhausted;
                self.block = None;
                self.finish()?;
                Ok(None)
            }
            Err(e) => {
                self.frames_dropped += 1;
                if self.md5.take().is_some() {
                    log::warn!("frame {} dropped, md5 verification disabled", index);
                }
                self.state = if e.is_recoverable() && self.options.recovery == Recovery::Resync {
                    log::warn!(
                        "frame {} at byte {} is corrupt, resynchronizing: {}",
                        index,
                        self.frame_offset,
                        e
                    );
                    DecoderState::Desynchronized
                } else {
                    DecoderState::Exhausted
                };
                Err(FlacError::Frame {
                    index,
                    offset: self.frame_offset,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Returns the next sample in interleaved channel order.
    pub fn next_sample(&mut self) -> Result<Option<i32>> {
        loop {
            if self.state == DecoderState::FrameReady {
                if let Some(block) = &self.block {
                    if self.cursor < block.len() {
                        let sample = block.interleaved_sample(self.cursor);
                        self.cursor += 1;
                        return Ok(Some(sample));
                    }
                }
            }
            if self.next_frame()?.is_none() {
                return Ok(None);
            }
        }
    }

    pub fn samples(&mut self) -> Samples<'_, R> {
        Samples { decoder: self }
    }

    /// Seeks the next frame and decodes it into `self.block`. `Ok(false)` at end of stream.
    fn read_frame(&mut self) -> Result<bool> {
        let start = self.inner.position();
        self.frame_offset = start;
        let sync = match seek_sync(&mut self.inner)? {
            Some(sync) => sync,
            None => return Ok(false),
        };
        self.frame_offset = self.inner.position() - 2;
        if self.frame_offset > start {
            if self.state == DecoderState::Desynchronized {
                log::warn!("resynchronized at byte {}", self.frame_offset);
            } else {
                log::debug!("skipped {} bytes before frame", self.frame_offset - start);
            }
        }

        let header = FrameHeader::read_after_sync(&mut self.inner, sync, &self.header.stream_info)?;
        log::trace!("frame at byte {}: {:?}", self.frame_offset, header);

        let block_size = header.block_size as usize;
        let channels = header.channels();
        self.work.clear();
        self.work.resize(block_size * channels, 0);

        let (mut samples, mut subframes) = match self.block.take() {
            Some(block) => (block.samples, block.subframes),
            None => (Vec::new(), Vec::new()),
        };
        subframes.clear();
        for (channel, out) in self.work.chunks_mut(block_size).enumerate() {
            let bits = header
                .channel_assignment
                .subframe_bits(channel, header.bits_per_sample);
            subframes.push(read_subframe(&mut self.inner, bits, out)?);
        }
        decorrelate(header.channel_assignment, &mut self.work, block_size);

        self.inner.align_to_byte();
        let actual = self.inner.crc16();
        let expected = self.inner.read_bits(16)? as u16;
        let checksum = if expected == actual {
            FrameChecksum::Valid
        } else {
            self.checksum_failures += 1;
            match self.options.checksum_policy {
                ChecksumPolicy::Reject => {
                    return Err(FlacError::FrameChecksum { expected, actual })
                }
                ChecksumPolicy::Warn => {
                    log::warn!(
                        "frame at byte {} checksum mismatch: expected {:#06x}, got {:#06x}",
                        self.frame_offset,
                        expected,
                        actual
                    );
                    FrameChecksum::Mismatch { expected, actual }
                }
            }
        };

        samples.clear();
        samples.extend(self.work.iter().map(|&s| s as i32));
        if let Some(md5) = &mut self.md5 {
            update_md5(
                md5,
                &mut self.md5_buffer,
                &self.work,
                block_size,
                channels,
                header.bits_per_sample,
            );
        }

        self.frames_decoded += 1;
        self.samples_decoded += block_size as u64;
        self.block = Some(Block {
            header,
            offset: self.frame_offset,
            samples,
            subframes,
            checksum,
        });
        Ok(true)
    }

    /// End of stream checks.
    fn finish(&mut self) -> Result<()> {
        let info = &self.header.stream_info;
        log::debug!(
            "end of stream after {} frames, {} samples",
            self.frames_decoded,
            self.samples_decoded
        );

        if self.frames_dropped == 0 {
            if let Some(expected) = info.total_samples() {
                if expected != self.samples_decoded {
                    return Err(FlacError::SampleCountMismatch {
                        expected,
                        actual: self.samples_decoded,
                    });
                }
            }
        }

        if let Some(md5) = self.md5.take() {
            let digest = md5.finalize();
            if digest.0 != info.md5_signature {
                return Err(FlacError::Md5Mismatch {
                    expected: hex::encode(info.md5_signature),
                    actual: hex::encode(digest.0),
                });
            }
            log::debug!("md5 signature verified");
        }
        Ok(())
    }
}

/// Feeds one block into the MD5 context the way the encoder does:
/// interleaved, little-endian, `ceil(bits_per_sample / 8)` bytes per sample.
fn update_md5(
    md5: &mut md5::Context,
    buffer: &mut Vec<u8>,
    samples: &[i64],
    block_size: usize,
    channels: usize,
    bits_per_sample: u32,
) {
    let width = ((bits_per_sample + 7) / 8) as usize;
    buffer.clear();
    for i in 0..block_size {
        for channel in 0..channels {
            let sample = samples[channel * block_size + i] as i32;
            buffer.extend_from_slice(&sample.to_le_bytes()[..width]);
        }
    }
    md5.consume(&buffer[..]);
}

/// Interleaved samples of a decoder, see [`FlacDecoder::next_sample`].
pub struct Samples<'a, R> {
    decoder: &'a mut FlacDecoder<R>,
}

impl<'a, R: Read> Iterator for Samples<'a, R> {
    type Item = Result<i32>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_sample().transpose()
    }
}
