//! Binary encoding utilities.
//!
//! The Bitcoin variable-length integer, cursor-based binary reader/writer
//! types, and the byte/hex reversal helpers used wherever a value crosses
//! the natural-order/display-order boundary.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarInt
// ---------------------------------------------------------------------------

/// A Bitcoin protocol variable-length integer.
///
/// Encodes as 1, 3, 5, or 9 bytes depending on magnitude, prefixed with
/// 0xfd/0xfe/0xff for the wider classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Decode from the front of `data`, returning the value and the number
    /// of bytes consumed.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), PrimitivesError> {
        let mut reader = ByteReader::new(data);
        let v = reader.read_varint()?;
        Ok((v, data.len() - reader.remaining()))
    }

    /// Wire length for this value: 1, 3, 5, or 9 bytes.
    pub fn length(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }

    /// Encode into a fresh byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        match self.0 {
            v @ 0..=0xfc => out.push(v as u8),
            v @ 0xfd..=0xffff => {
                out.push(0xfd);
                out.extend_from_slice(&(v as u16).to_le_bytes());
            }
            v @ 0x1_0000..=0xffff_ffff => {
                out.push(0xfe);
                out.extend_from_slice(&(v as u32).to_le_bytes());
            }
            v => {
                out.push(0xff);
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    /// The underlying value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarInt {
    fn from(v: u64) -> Self {
        VarInt(v)
    }
}

impl From<usize> for VarInt {
    fn from(v: usize) -> Self {
        VarInt(v as u64)
    }
}

// ---------------------------------------------------------------------------
// ByteReader / ByteWriter
// ---------------------------------------------------------------------------

/// Cursor over a byte slice reading little-endian protocol values.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Position a reader at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        if self.pos + n > self.data.len() {
            return Err(PrimitivesError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a [`VarInt`].
    pub fn read_varint(&mut self) -> Result<VarInt, PrimitivesError> {
        match self.read_u8()? {
            0xff => Ok(VarInt(self.read_u64_le()?)),
            0xfe => Ok(VarInt(self.read_u32_le()? as u64)),
            0xfd => Ok(VarInt(self.read_u16_le()? as u64)),
            b => Ok(VarInt(b as u64)),
        }
    }

    /// Unread byte count.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// Growable buffer writing little-endian protocol values.
#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// An empty writer.
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    /// An empty writer with `capacity` bytes pre-allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        ByteWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append one byte.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a [`VarInt`].
    pub fn write_varint(&mut self, varint: VarInt) {
        self.buf.extend_from_slice(&varint.to_bytes());
    }

    /// Consume the writer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Byte and hex reversal
// ---------------------------------------------------------------------------

/// A reversed copy of `bytes`.
pub fn reverse_bytes(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

/// Reverse a hex string byte-pair-wise.
///
/// An odd-length input is padded with a leading zero nibble first, so the
/// dangling nibble ends up in the last byte of the output:
/// `"41039"` becomes `"391004"`.
pub fn reverse_hex_string(hex_str: &str) -> String {
    let padded = if hex_str.len() % 2 != 0 {
        format!("0{hex_str}")
    } else {
        hex_str.to_string()
    };
    let chars: Vec<char> = padded.chars().collect();
    let mut out = String::with_capacity(chars.len());
    for pair in chars.chunks(2).rev() {
        out.extend(pair);
    }
    out
}

/// Decode a reversed-hex (display order) string into natural-order bytes.
pub fn bytes_from_hex_reverse(hex_str: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let mut bytes = hex::decode(hex_str)?;
    bytes.reverse();
    Ok(bytes)
}

/// Encode natural-order bytes as a reversed-hex (display order) string.
pub fn hex_from_bytes_reverse(bytes: &[u8]) -> String {
    hex::encode(reverse_bytes(bytes))
}

/// A u32 as 4 little-endian bytes.
pub fn u32_to_le_bytes(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}
