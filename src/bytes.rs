//! Little-endian cursor used by every decoder in the crate.
//!
//! Wraps `std::io::Cursor` with `byteorder` and turns short reads into
//! [`PdbError::TruncatedData`] carrying the offset and the field being read.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{PdbError, Result};

pub(crate) struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(data) }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.position())
    }

    fn truncated(&self, context: &'static str, needed: u64) -> PdbError {
        PdbError::TruncatedData {
            context,
            offset: self.position(),
            needed,
            available: self.remaining(),
        }
    }

    fn fixed<T>(
        &mut self,
        context: &'static str,
        needed:  u64,
        read:    impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
    ) -> Result<T> {
        if self.remaining() < needed {
            return Err(self.truncated(context, needed));
        }
        Ok(read(&mut self.cursor)?)
    }

    pub fn read_u8(&mut self, context: &'static str) -> Result<u8> {
        self.fixed(context, 1, |c| c.read_u8())
    }

    pub fn read_u16(&mut self, context: &'static str) -> Result<u16> {
        self.fixed(context, 2, |c| c.read_u16::<LittleEndian>())
    }

    pub fn read_u32(&mut self, context: &'static str) -> Result<u32> {
        self.fixed(context, 4, |c| c.read_u32::<LittleEndian>())
    }

    pub fn read_i32(&mut self, context: &'static str) -> Result<i32> {
        self.fixed(context, 4, |c| c.read_i32::<LittleEndian>())
    }

    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        if self.remaining() < N as u64 {
            return Err(self.truncated(context, N as u64));
        }
        let mut buf = [0u8; N];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Borrow the next `n` bytes without copying.
    pub fn read_slice(&mut self, n: u64, context: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(self.truncated(context, n));
        }
        let start = self.position() as usize;
        let end = start + n as usize;
        self.cursor.set_position(end as u64);
        let data: &'a [u8] = *self.cursor.get_ref();
        Ok(&data[start..end])
    }

    pub fn read_u16_vec(&mut self, count: usize, context: &'static str) -> Result<Vec<u16>> {
        let needed = count as u64 * 2;
        if self.remaining() < needed {
            return Err(self.truncated(context, needed));
        }
        let mut out = vec![0u16; count];
        self.cursor.read_u16_into::<LittleEndian>(&mut out)?;
        Ok(out)
    }

    pub fn skip(&mut self, n: u64, context: &'static str) -> Result<()> {
        self.read_slice(n, context).map(|_| ())
    }

    /// Everything from the current position to the end.
    pub fn rest(&mut self) -> &'a [u8] {
        let start = (self.position() as usize).min(self.len() as usize);
        self.cursor.set_position(self.len());
        let data: &'a [u8] = *self.cursor.get_ref();
        &data[start..]
    }
}

/// Number of `unit`-sized chunks needed to hold `size` bytes.
/// Non-positive sizes need none.
#[inline]
pub fn ceil_div(size: i64, unit: usize) -> usize {
    if size <= 0 || unit == 0 {
        return 0;
    }
    let size = size as u64;
    let unit = unit as u64;
    ((size + unit - 1) / unit) as usize
}

/// Serializes raw byte blobs as lowercase hex strings.
pub(crate) fn serialize_hex<S: serde::Serializer>(bytes: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

pub(crate) fn serialize_display<T: std::fmt::Display, S: serde::Serializer>(
    value: &T,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(value)
}
