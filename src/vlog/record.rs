//! Record framing
//!
//! Encodes and decodes the length-prefixed key/value records stored in
//! segment files.

use std::io::Read;

use bytes::{BufMut, BytesMut};

use crate::error::Result;

/// One key/value pair as stored in a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The key bytes
    pub key: Vec<u8>,

    /// The value bytes
    pub value: Vec<u8>,
}

impl Record {
    /// Encode `[key_len][key][value_len][value]`, integers in native byte order
    pub fn encode(key: &[u8], value: &[u8]) -> BytesMut {
        let mut buf = BytesMut::with_capacity(16 + key.len() + value.len());
        buf.put_u64_ne(key.len() as u64);
        buf.put_slice(key);
        buf.put_u64_ne(value.len() as u64);
        buf.put_slice(value);
        buf
    }

    /// Encoded size of this record on disk
    pub fn encoded_size(&self) -> u64 {
        16 + self.key.len() as u64 + self.value.len() as u64
    }

    /// Decode one record from the reader's current position
    ///
    /// Returns `Ok(None)` at a clean end of input, and also when the input
    /// ends mid-record (a truncated tail from an interrupted write); the
    /// caller decides whether a missing record is an error.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Record>> {
        let key_len = match read_u64(reader)? {
            Some(len) => len as usize,
            None => return Ok(None),
        };

        let mut key = vec![0u8; key_len];
        if !fill(reader, &mut key)? {
            return Ok(None);
        }

        let value_len = match read_u64(reader)? {
            Some(len) => len as usize,
            None => return Ok(None),
        };

        let mut value = vec![0u8; value_len];
        if !fill(reader, &mut value)? {
            return Ok(None);
        }

        Ok(Some(Record { key, value }))
    }
}

/// Read a native-endian u64, or `None` if the input ends first
fn read_u64<R: Read>(reader: &mut R) -> Result<Option<u64>> {
    let mut buf = [0u8; 8];
    if !fill(reader, &mut buf)? {
        return Ok(None);
    }
    Ok(Some(u64::from_ne_bytes(buf)))
}

/// Fill the buffer completely, or return `false` if the input ends first
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(true)
}
