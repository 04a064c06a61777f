use crate::blocks::*;
use crate::error::FlacError;
use crate::prelude::{Decode, DecodeSized, Result};
use crate::utils::skip;
use byteorder::{BigEndian, ReadBytesExt};
use num_traits::FromPrimitive;
use std::fmt;
use std::io::Read;

/// The stream marker, "fLaC".
pub const MAGIC_NUMBER: [u8; 4] = *b"fLaC";

/// <7> BLOCK_TYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum BlockType {
    StreamInfo = 0,
    Padding = 1,
    Application = 2,
    SeekTable = 3,
    VorbisComment = 4,
    CueSheet = 5,
    Picture = 6,
}

/// Block types `7-126` are reserved, `127` is invalid to avoid confusion with a frame sync code.
const INVALID_BLOCK_TYPE: u8 = 127;

#[derive(Debug)]
pub struct MetadataBlock {
    /// <1> Last-metadata-block flag
    pub is_last: bool,
    /// <24> Length (in bytes) of metadata to follow (does not include the size of the METADATA_BLOCK_HEADER)
    pub length: usize,
    pub data: MetadataBlockData,
}

/// Only STREAMINFO and SEEKTABLE are parsed.
/// Payloads of the other block types carry nothing the decoder needs and are skipped.
pub enum MetadataBlockData {
    StreamInfo(BlockStreamInfo),
    Padding,
    Application,
    SeekTable(BlockSeekTable),
    VorbisComment,
    CueSheet,
    Picture,
    Unknown(u8),
}

impl MetadataBlockData {
    pub fn block_type(&self) -> u8 {
        match self {
            MetadataBlockData::StreamInfo(_) => 0,
            MetadataBlockData::Padding => 1,
            MetadataBlockData::Application => 2,
            MetadataBlockData::SeekTable(_) => 3,
            MetadataBlockData::VorbisComment => 4,
            MetadataBlockData::CueSheet => 5,
            MetadataBlockData::Picture => 6,
            MetadataBlockData::Unknown(t) => *t,
        }
    }
}

impl fmt::Display for MetadataBlockData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataBlockData::StreamInfo(_) => write!(f, "STREAMINFO"),
            MetadataBlockData::Padding => write!(f, "PADDING"),
            MetadataBlockData::Application => write!(f, "APPLICATION"),
            MetadataBlockData::SeekTable(_) => write!(f, "SEEKTABLE"),
            MetadataBlockData::VorbisComment => write!(f, "VORBIS_COMMENT"),
            MetadataBlockData::CueSheet => write!(f, "CUESHEET"),
            MetadataBlockData::Picture => write!(f, "PICTURE"),
            MetadataBlockData::Unknown(t) => write!(f, "UNKNOWN({})", t),
        }
    }
}

impl fmt::Debug for MetadataBlockData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataBlockData::StreamInfo(info) => write!(f, "StreamInfo({:?})", info),
            MetadataBlockData::SeekTable(table) => {
                write!(f, "SeekTable({} points)", table.seek_points.len())
            }
            other => write!(f, "{}", other),
        }
    }
}

impl Decode for MetadataBlock {
    fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let first_byte = reader.read_u8()?;
        let block_type = first_byte & 0b01111111;
        let length = reader.read_u24::<BigEndian>()? as usize;

        let data = match FromPrimitive::from_u8(block_type) {
            Some(BlockType::StreamInfo) => {
                if length != STREAM_INFO_LENGTH {
                    return Err(FlacError::InvalidStreamInfo("block length is not 34"));
                }
                MetadataBlockData::StreamInfo(BlockStreamInfo::from_reader(reader)?)
            }
            Some(BlockType::SeekTable) => {
                MetadataBlockData::SeekTable(BlockSeekTable::from_reader_sized(reader, length)?)
            }
            Some(BlockType::Padding) => skipped(reader, length, MetadataBlockData::Padding)?,
            Some(BlockType::Application) => {
                skipped(reader, length, MetadataBlockData::Application)?
            }
            Some(BlockType::VorbisComment) => {
                skipped(reader, length, MetadataBlockData::VorbisComment)?
            }
            Some(BlockType::CueSheet) => skipped(reader, length, MetadataBlockData::CueSheet)?,
            Some(BlockType::Picture) => skipped(reader, length, MetadataBlockData::Picture)?,
            None if block_type == INVALID_BLOCK_TYPE => return Err(FlacError::InvalidBlockType),
            None => skipped(reader, length, MetadataBlockData::Unknown(block_type))?,
        };

        Ok(MetadataBlock {
            is_last: first_byte & 0b10000000 > 0,
            length,
            data,
        })
    }
}

fn skipped<R: Read>(
    reader: &mut R,
    length: usize,
    data: MetadataBlockData,
) -> Result<MetadataBlockData> {
    skip(reader, length)?;
    Ok(data)
}

/// Everything before the first frame.
#[derive(Debug)]
pub struct FlacHeader {
    pub stream_info: BlockStreamInfo,
    pub blocks: Vec<MetadataBlock>,
}

impl FlacHeader {
    pub fn seek_table(&self) -> Option<&BlockSeekTable> {
        self.blocks.iter().find_map(|b| match &b.data {
            MetadataBlockData::SeekTable(table) => Some(table),
            _ => None,
        })
    }
}

/// Reads the stream marker and all metadata blocks, leaving `reader` at the first frame.
pub fn read_metadata<R: Read>(reader: &mut R) -> Result<FlacHeader> {
    let mut marker = [0u8; 4];
    reader.read_exact(&mut marker)?;
    if marker != MAGIC_NUMBER {
        return Err(FlacError::InvalidMarker);
    }

    let first = MetadataBlock::from_reader(reader)?;
    let stream_info = match &first.data {
        MetadataBlockData::StreamInfo(info) => info.clone(),
        _ => return Err(FlacError::MissingStreamInfo),
    };
    log::debug!("stream info: {:?}", stream_info);

    let mut is_last = first.is_last;
    let mut blocks = vec![first];
    while !is_last {
        let block = MetadataBlock::from_reader(reader)?;
        log::trace!("metadata block {} ({} bytes)", block.data, block.length);
        is_last = block.is_last;
        blocks.push(block);
    }

    Ok(FlacHeader {
        stream_info,
        blocks,
    })
}
