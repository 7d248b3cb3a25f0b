//! Growable binary buffer with cursor-based typed codecs
//!
//! Every value is written in little-endian byte order, whatever the host,
//! so cache files move between machines unchanged. Sizes and length
//! prefixes are always stored as `u64`.

use crate::{ContentId, Result, TesseraError};
use std::fs;
use std::path::Path;

/// Starting capacity of a fresh or reset buffer, in bytes
pub const DEFAULT_CAPACITY: usize = 1024;

/// A value with a fixed binary encoding through [`ByteBuffer`]
pub trait BinaryCodec: Sized {
    /// Append the encoded value at the buffer's write cursor
    fn encode(&self, buffer: &mut ByteBuffer);

    /// Decode a value at the buffer's read cursor, advancing it
    fn decode(buffer: &mut ByteBuffer) -> Result<Self>;
}

/// A contiguous, growable block of bytes with independent read and write cursors.
///
/// Invariants: `read_position <= size <= capacity` and
/// `write_position <= capacity`. Capacity only ever doubles, and growing
/// never disturbs bytes that were already written.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    /// Backing storage; its length is the capacity
    data: Vec<u8>,
    size: usize,
    read_position: usize,
    write_position: usize,
}

impl ByteBuffer {
    /// Create an empty buffer with the default capacity
    pub fn new() -> Self {
        Self {
            data: vec![0; DEFAULT_CAPACITY],
            size: 0,
            read_position: 0,
            write_position: 0,
        }
    }

    /// Create a buffer holding a copy of `bytes`, with both cursors at the start
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buffer = Self::new();
        buffer.replace_contents(bytes.to_vec());
        buffer
    }

    /// Total bytes allocated
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes of valid content
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn read_position(&self) -> usize {
        self.read_position
    }

    pub fn write_position(&self) -> usize {
        self.write_position
    }

    /// Bytes left between the read cursor and the end of the content
    pub fn remaining(&self) -> usize {
        self.size - self.read_position
    }

    /// The valid content of the buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// Move the read cursor back to the start
    pub fn rewind(&mut self) {
        self.read_position = 0;
    }

    /// Write a value at the write cursor
    pub fn write<T: BinaryCodec>(&mut self, value: &T) {
        value.encode(self);
    }

    /// Read a value at the read cursor
    pub fn read<T: BinaryCodec>(&mut self) -> Result<T> {
        T::decode(self)
    }

    /// Write a length-prefixed string (no terminator)
    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Write a length-prefixed byte blob
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write(&(bytes.len() as u64));
        self.write_raw(bytes);
    }

    /// Read a length-prefixed byte blob
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read::<u64>()?;
        let len = usize::try_from(len).map_err(|_| {
            TesseraError::ParseError(format!("length prefix {} does not fit in memory", len))
        })?;
        Ok(self.read_raw(len)?.to_vec())
    }

    /// Append raw bytes, growing the buffer first when they would not fit
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        let end = self.write_position + bytes.len();
        self.data[self.write_position..end].copy_from_slice(bytes);
        self.write_position = end;
        self.size = self.size.max(end);
    }

    /// Borrow the next `len` bytes and advance the read cursor
    pub fn read_raw(&mut self, len: usize) -> Result<&[u8]> {
        let available = self.remaining();
        if len > available {
            return Err(TesseraError::BufferUnderrun {
                requested: len,
                available,
            });
        }
        let start = self.read_position;
        self.read_position += len;
        Ok(&self.data[start..start + len])
    }

    /// Replace the content with a file's bytes and rewind both cursors.
    ///
    /// On failure the buffer is left exactly as it was.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        log::debug!("Read {} byte(s) from {}", bytes.len(), path.display());
        self.replace_contents(bytes);
        Ok(())
    }

    /// Write the valid content to a file, replacing it
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.as_bytes())?;
        log::debug!("Wrote {} byte(s) to {}", self.size, path.display());
        Ok(())
    }

    /// Drop the content and return to the default capacity with zeroed cursors
    pub fn reset(&mut self) {
        self.data = vec![0; DEFAULT_CAPACITY];
        self.size = 0;
        self.read_position = 0;
        self.write_position = 0;
    }

    /// Double the capacity until `additional` more bytes fit at the write cursor
    fn reserve(&mut self, additional: usize) {
        let needed = self.write_position + additional;
        let mut capacity = self.data.len();
        if needed <= capacity {
            return;
        }
        while capacity < needed {
            capacity *= 2;
        }
        self.data.resize(capacity, 0);
    }

    fn replace_contents(&mut self, mut bytes: Vec<u8>) {
        let size = bytes.len();
        let mut capacity = DEFAULT_CAPACITY;
        while capacity < size {
            capacity *= 2;
        }
        bytes.resize(capacity, 0);

        self.data = bytes;
        self.size = size;
        self.read_position = 0;
        self.write_position = 0;
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_primitive_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BinaryCodec for $ty {
                fn encode(&self, buffer: &mut ByteBuffer) {
                    buffer.write_raw(&self.to_le_bytes());
                }

                fn decode(buffer: &mut ByteBuffer) -> Result<Self> {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(buffer.read_raw(std::mem::size_of::<$ty>())?);
                    Ok(<$ty>::from_le_bytes(bytes))
                }
            }
        )*
    };
}

impl_primitive_codec!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl BinaryCodec for bool {
    fn encode(&self, buffer: &mut ByteBuffer) {
        buffer.write(&(*self as u8));
    }

    fn decode(buffer: &mut ByteBuffer) -> Result<Self> {
        match buffer.read::<u8>()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(TesseraError::ParseError(format!(
                "invalid boolean byte {:#04x}",
                other
            ))),
        }
    }
}

impl BinaryCodec for usize {
    fn encode(&self, buffer: &mut ByteBuffer) {
        buffer.write(&(*self as u64));
    }

    fn decode(buffer: &mut ByteBuffer) -> Result<Self> {
        let value = buffer.read::<u64>()?;
        usize::try_from(value).map_err(|_| {
            TesseraError::ParseError(format!("size {} does not fit in usize", value))
        })
    }
}

impl BinaryCodec for String {
    fn encode(&self, buffer: &mut ByteBuffer) {
        buffer.write_str(self);
    }

    fn decode(buffer: &mut ByteBuffer) -> Result<Self> {
        let bytes = buffer.read_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| TesseraError::ParseError(format!("string is not valid UTF-8: {}", e)))
    }
}

impl BinaryCodec for ContentId {
    fn encode(&self, buffer: &mut ByteBuffer) {
        buffer.write_str(&self.to_canonical());
    }

    fn decode(buffer: &mut ByteBuffer) -> Result<Self> {
        let text = buffer.read::<String>()?;
        ContentId::from_string(&text)
    }
}
