use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlacError {
    #[error("unexpected end of stream")]
    UnexpectedEnd,
    #[error("invalid magic number")]
    InvalidMarker,
    #[error("invalid first block, must be StreamInfo")]
    MissingStreamInfo,
    #[error("invalid stream info: {0}")]
    InvalidStreamInfo(&'static str),
    #[error("invalid block type 0x7f")]
    InvalidBlockType,
    #[error("invalid seek table size")]
    InvalidSeekTableSize,

    #[error("invalid frame header: {0}")]
    InvalidFrameHeader(&'static str),
    #[error("frame header checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    HeaderChecksum { expected: u8, actual: u8 },
    #[error("malformed subframe header: {0}")]
    MalformedSubframeHeader(&'static str),
    #[error("invalid partition order {order} for block size {block_size} and predictor order {predictor_order}")]
    InvalidPartitionOrder {
        order: u32,
        block_size: usize,
        predictor_order: usize,
    },
    #[error("invalid residual: {0}")]
    InvalidResidual(&'static str),
    #[error("frame checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    FrameChecksum { expected: u16, actual: u16 },

    /// A frame-level error, annotated with the position of the frame in the stream.
    #[error("frame {index} at byte {offset}: {source}")]
    Frame {
        index: u64,
        offset: u64,
        #[source]
        source: Box<FlacError>,
    },

    #[error("decoded {actual} samples, stream info declares {expected}")]
    SampleCountMismatch { expected: u64, actual: u64 },
    #[error("md5 signature mismatch: expected {expected}, got {actual}")]
    Md5Mismatch { expected: String, actual: String },

    #[error(transparent)]
    IO(std::io::Error),
}

impl From<std::io::Error> for FlacError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => FlacError::UnexpectedEnd,
            _ => FlacError::IO(err),
        }
    }
}

impl FlacError {
    /// The underlying error, without frame context.
    pub fn cause(&self) -> &FlacError {
        match self {
            FlacError::Frame { source, .. } => source.cause(),
            e => e,
        }
    }

    /// Whether decoding may continue at the next frame after this error.
    ///
    /// Only corrupt-frame errors qualify. Running out of input, I/O failures and
    /// stream-level errors are final.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.cause(),
            FlacError::InvalidFrameHeader(_)
                | FlacError::HeaderChecksum { .. }
                | FlacError::MalformedSubframeHeader(_)
                | FlacError::InvalidPartitionOrder { .. }
                | FlacError::InvalidResidual(_)
                | FlacError::FrameChecksum { .. }
        )
    }
}
