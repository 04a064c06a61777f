//! Streaming decoder for [FLAC](https://xiph.org/flac/format.html) audio.
//!
//! ```no_run
//! use anni_flac_decoder::FlacDecoder;
//!
//! let mut decoder = FlacDecoder::open("audio.flac")?;
//! let info = decoder.stream_info().clone();
//! while let Some(block) = decoder.next_frame()? {
//!     for (left, right) in block.stereo_samples().into_iter().flatten() {
//!         println!("{}Hz: {} {}", info.sample_rate, left, right);
//!     }
//! }
//! # Ok::<(), anni_flac_decoder::FlacError>(())
//! ```

#[macro_use]
extern crate num_derive;

mod decoder;
mod header;
mod residual;
mod utils;

pub use decoder::*;
pub use header::*;

pub mod bits;
pub mod blocks;
pub mod channels;
pub mod crc;
pub mod error;
pub mod frames;
pub mod options;
pub mod prelude;
pub mod subframe;

pub use error::FlacError;
pub use options::{ChecksumPolicy, DecoderOptions, Recovery};
