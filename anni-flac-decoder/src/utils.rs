use crate::prelude::Result;
use std::io::Read;

pub(crate) fn skip<R: Read>(reader: &mut R, len: usize) -> Result<()> {
    let skipped = std::io::copy(&mut reader.take(len as u64), &mut std::io::sink())?;
    if skipped < len as u64 {
        return Err(crate::error::FlacError::UnexpectedEnd);
    }
    Ok(())
}
