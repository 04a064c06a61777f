//! Bit-level reader over a forward-only byte source.
//!
//! Bits are consumed MSB first. Bytes are pulled from the source only when a
//! read needs them, and every pulled byte is fed into the running CRC-8 and
//! CRC-16, so a frame's checksums are available the moment its last byte has
//! been consumed.
//!
//! The bytes of a frame header can be handed back with
//! [`rewind_to_mark`](BitReader::rewind_to_mark), so a sync code hidden inside a
//! header that turned out to be false is still found by the next scan.

use crate::crc::{crc16_update, crc8_update};
use crate::error::FlacError;
use crate::prelude::Result;
use std::collections::VecDeque;
use std::io::{self, Read};

pub struct BitReader<R> {
    inner: R,
    /// Bytes handed back by `rewind_to_mark`, served before the source.
    pending: VecDeque<u8>,
    /// Bytes pulled since `mark`, while `marking` is set.
    marked: Vec<u8>,
    marking: bool,
    /// Last byte pulled from the source.
    current: u8,
    /// Number of low bits of `current` not consumed yet.
    remaining: u32,
    crc8: u8,
    crc16: u16,
    /// Bytes pulled from the source so far.
    position: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        BitReader {
            inner,
            pending: VecDeque::new(),
            marked: Vec::new(),
            marking: false,
            current: 0,
            remaining: 0,
            crc8: 0,
            crc16: 0,
            position: 0,
        }
    }

    /// Pulls the next byte, or `None` at the end of the source.
    fn pull(&mut self) -> Result<Option<u8>> {
        let byte = match self.pending.pop_front() {
            Some(byte) => byte,
            None => {
                let mut buf = [0u8; 1];
                loop {
                    match self.inner.read(&mut buf) {
                        Ok(0) => return Ok(None),
                        Ok(_) => break buf[0],
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        };
        self.feed(byte);
        Ok(Some(byte))
    }

    #[inline]
    fn feed(&mut self, byte: u8) {
        self.crc8 = crc8_update(self.crc8, byte);
        self.crc16 = crc16_update(self.crc16, byte);
        self.position += 1;
        if self.marking {
            self.marked.push(byte);
        }
    }

    fn pull_required(&mut self) -> Result<u8> {
        self.pull()?.ok_or(FlacError::UnexpectedEnd)
    }

    /// Reads the next whole byte if the source has one.
    ///
    /// The reader must be byte-aligned. Used while scanning for a frame sync code,
    /// where running out of input is not an error.
    pub fn try_read_byte(&mut self) -> Result<Option<u8>> {
        debug_assert!(self.is_aligned());
        self.pull()
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        if self.remaining == 0 {
            self.current = self.pull_required()?;
            self.remaining = 8;
        }
        self.remaining -= 1;
        Ok((self.current >> self.remaining) & 1 == 1)
    }

    /// Reads `n` (at most 32) bits as an unsigned integer.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n <= 32);
        self.read_bits_u64(n).map(|v| v as u32)
    }

    /// Reads `n` (at most 64) bits as an unsigned integer.
    pub fn read_bits_u64(&mut self, n: u32) -> Result<u64> {
        debug_assert!(n <= 64);
        let mut value = 0u64;
        let mut left = n;
        while left > 0 {
            if self.remaining == 0 {
                self.current = self.pull_required()?;
                self.remaining = 8;
            }
            let take = left.min(self.remaining);
            let shift = self.remaining - take;
            let bits = ((self.current as u32) >> shift) & ((1u32 << take) - 1);
            value = (value << take) | bits as u64;
            self.remaining -= take;
            left -= take;
        }
        Ok(value)
    }

    /// Reads an `n`-bit two's-complement integer. `n = 0` reads nothing and yields 0.
    pub fn read_signed(&mut self, n: u32) -> Result<i64> {
        if n == 0 {
            return Ok(0);
        }
        let value = self.read_bits_u64(n)?;
        let shift = 64 - n;
        Ok(((value << shift) as i64) >> shift)
    }

    /// Reads a unary code: a run of 0 bits terminated by a 1 bit.
    ///
    /// Returns the number of 0 bits. A run longer than `limit` is rejected.
    pub fn read_unary(&mut self, limit: u32) -> Result<u32> {
        let mut count = 0u64;
        loop {
            if self.remaining == 0 {
                self.current = self.pull_required()?;
                self.remaining = 8;
            }
            let bits = (self.current as u32) & ((1u32 << self.remaining) - 1);
            if bits == 0 {
                count += self.remaining as u64;
                self.remaining = 0;
            } else {
                let zeros = bits.leading_zeros() - (32 - self.remaining);
                count += zeros as u64;
                self.remaining -= zeros + 1;
                if count > limit as u64 {
                    break;
                }
                return Ok(count as u32);
            }
            if count > limit as u64 {
                break;
            }
        }
        Err(FlacError::InvalidResidual("unary code exceeds limit"))
    }

    /// Reads `n` bytes verbatim.
    pub fn read_u8_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(n);
        for _ in 0..n {
            let byte = if self.is_aligned() {
                self.pull_required()?
            } else {
                self.read_bits(8)? as u8
            };
            bytes.push(byte);
        }
        Ok(bytes)
    }

    /// Drops the unread bits of the current byte.
    pub fn align_to_byte(&mut self) {
        self.remaining = 0;
    }

    pub fn is_aligned(&self) -> bool {
        self.remaining == 0
    }

    /// Number of bytes pulled from the source so far.
    ///
    /// When the reader is aligned this is the offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Restarts both checksums, seeding them with bytes already consumed.
    pub fn begin_crc(&mut self, prefix: &[u8]) {
        self.crc8 = prefix.iter().fold(0, |crc, &b| crc8_update(crc, b));
        self.crc16 = prefix.iter().fold(0, |crc, &b| crc16_update(crc, b));
    }

    /// Starts keeping every pulled byte until [`unmark`](Self::unmark) or
    /// [`rewind_to_mark`](Self::rewind_to_mark).
    pub fn mark(&mut self) {
        self.marked.clear();
        self.marking = true;
    }

    pub fn unmark(&mut self) {
        self.marked.clear();
        self.marking = false;
    }

    /// Hands every byte pulled since [`mark`](Self::mark) back to the reader.
    ///
    /// The next read starts at the first marked byte, at a byte boundary.
    pub fn rewind_to_mark(&mut self) {
        for &byte in self.marked.iter().rev() {
            self.pending.push_front(byte);
        }
        self.position -= self.marked.len() as u64;
        self.remaining = 0;
        self.unmark();
    }

    /// CRC-8 of every byte pulled since the last [`begin_crc`](Self::begin_crc).
    pub fn crc8(&self) -> u8 {
        self.crc8
    }

    /// CRC-16 of every byte pulled since the last [`begin_crc`](Self::begin_crc).
    pub fn crc16(&self) -> u16 {
        self.crc16
    }
}

/// Byte-level access for metadata parsing, which shares the cursor with the
/// frame decoder. Only valid while the reader is byte-aligned.
impl<R: Read> Read for BitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.is_aligned() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "bit reader is not byte-aligned",
            ));
        }
        let n = if self.pending.is_empty() {
            self.inner.read(buf)?
        } else {
            let n = buf.len().min(self.pending.len());
            for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
                *slot = byte;
            }
            n
        };
        for &byte in buf[..n].iter() {
            self.feed(byte);
        }
        Ok(n)
    }
}

/// Packs a string of `0`/`1` characters into bytes, MSB first, zero padded.
/// Any other character is ignored, so fields can be separated by spaces.
#[cfg(test)]
pub(crate) fn pack_bits(bits: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut count = 0;
    for c in bits.chars().filter(|c| *c == '0' || *c == '1') {
        if count % 8 == 0 {
            bytes.push(0);
        }
        if c == '1' {
            *bytes.last_mut().unwrap() |= 0x80 >> (count % 8);
        }
        count += 1;
    }
    bytes
}
