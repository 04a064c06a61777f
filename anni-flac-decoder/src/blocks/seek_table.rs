use crate::error::FlacError;
use crate::prelude::{DecodeSized, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

const SEEK_POINT_LENGTH: usize = 18;

/// Seek points are only read, never used by the decoder itself.
/// A caller with a seekable source may position it at `first frame offset + stream_offset`
/// and start a new decoding pass from there.
#[derive(Debug, Clone, Default)]
pub struct BlockSeekTable {
    pub seek_points: Vec<SeekPoint>,
}

/// Notes:
/// - For placeholder points, the second and third field values are undefined.
/// - Seek points within a table must be sorted in ascending order by sample number.
/// - Seek points within a table must be unique by sample number, with the exception of placeholder points.
/// - The previous two notes imply that there may be any number of placeholder points, but they must all occur at the end of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekPoint {
    // Sample number of first sample in the target frame, or 0xFFFFFFFFFFFFFFFF for a placeholder point.
    pub sample_number: u64,
    // Offset (in bytes) from the first byte of the first frame header to the first byte of the target frame's header.
    pub stream_offset: u64,
    // Number of samples in the target frame.
    pub frame_samples: u16,
}

impl SeekPoint {
    pub fn is_placeholder(&self) -> bool {
        self.sample_number == 0xFFFFFFFFFFFFFFFF
    }
}

impl BlockSeekTable {
    /// The last non-placeholder point at or before `sample`.
    pub fn nearest_before(&self, sample: u64) -> Option<&SeekPoint> {
        self.seek_points
            .iter()
            .filter(|p| !p.is_placeholder())
            .take_while(|p| p.sample_number <= sample)
            .last()
    }
}

impl DecodeSized for BlockSeekTable {
    fn from_reader_sized<R: Read>(reader: &mut R, size: usize) -> Result<Self> {
        // The number of seek points is implied by the metadata header 'length' field, i.e. equal to length / 18.
        if size % SEEK_POINT_LENGTH != 0 {
            return Err(FlacError::InvalidSeekTableSize);
        }
        let points = size / SEEK_POINT_LENGTH;

        let mut seek_points = Vec::with_capacity(points);
        for _ in 0..points {
            let sample_number = reader.read_u64::<BigEndian>()?;
            let stream_offset = reader.read_u64::<BigEndian>()?;
            let frame_samples = reader.read_u16::<BigEndian>()?;
            seek_points.push(SeekPoint {
                sample_number,
                stream_offset,
                frame_samples,
            });
        }

        Ok(BlockSeekTable { seek_points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn point(sample_number: u64, stream_offset: u64) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&sample_number.to_be_bytes());
        data.extend_from_slice(&stream_offset.to_be_bytes());
        data.extend_from_slice(&4096u16.to_be_bytes());
        data
    }

    #[test]
    fn nearest_point_skips_placeholders() {
        let mut data = point(0, 0);
        data.extend(point(4096, 1200));
        data.extend(point(8192, 2500));
        data.extend(point(u64::MAX, 0));
        let table = BlockSeekTable::from_reader_sized(&mut Cursor::new(&data), data.len()).unwrap();
        assert_eq!(table.seek_points.len(), 4);
        assert!(table.seek_points[3].is_placeholder());
        assert_eq!(table.nearest_before(5000).unwrap().stream_offset, 1200);
        assert_eq!(table.nearest_before(u64::MAX - 1).unwrap().sample_number, 8192);
    }

    #[test]
    fn invalid_size() {
        let data = [0u8; 20];
        assert!(matches!(
            BlockSeekTable::from_reader_sized(&mut Cursor::new(&data), data.len()),
            Err(FlacError::InvalidSeekTableSize)
        ));
    }
}
