use std::io::Read;

pub use crate::error::FlacError;

pub type Result<I> = std::result::Result<I, FlacError>;

pub trait Decode: Sized {
    fn from_reader<R: Read>(reader: &mut R) -> Result<Self>;
}

pub trait DecodeSized: Sized {
    fn from_reader_sized<R: Read>(reader: &mut R, size: usize) -> Result<Self>;
}
