//! Binary stream helpers shared by the archive and texture readers

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// Largest buffer reserved up front from a size a header declares; larger
/// buffers grow as the bytes arrive
pub(crate) const MAX_PREALLOC: usize = 1 << 20;

/// Trait for types that can Read and Seek
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Total length of a seekable stream, restoring the current position
pub fn stream_len<S: Seek + ?Sized>(stream: &mut S) -> Result<u64> {
    let pos = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if pos != len {
        stream.seek(SeekFrom::Start(pos))?;
    }
    Ok(len)
}

/// Read a `u32`-length-prefixed UTF-8 string
pub(crate) fn read_prefixed_string<B: ByteOrder, R: Read + ?Sized>(
    reader: &mut R,
    max_len: usize,
) -> Result<String> {
    let len = reader.read_u32::<B>()? as usize;
    if len > max_len {
        return Err(Error::malformed(format!(
            "string length {len} exceeds limit of {max_len}"
        )));
    }
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| Error::malformed(format!("string is not UTF-8: {e}")))
}

/// Write a `u32`-length-prefixed string
pub(crate) fn write_prefixed_string<B: ByteOrder, W: Write + ?Sized>(
    writer: &mut W,
    value: &str,
) -> Result<()> {
    let len = u32::try_from(value.len())
        .map_err(|_| Error::InvariantViolation(format!("string too long: {} bytes", value.len())))?;
    writer.write_u32::<B>(len)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

/// Read exactly `len` bytes, reporting a short stream as truncation
pub(crate) fn read_exact_vec<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let read = reader.take(len as u64).read_to_end(&mut data)?;
    if read < len {
        return Err(Error::TruncatedStream {
            expected: len as u64,
            actual: read as u64,
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, LittleEndian};
    use std::io::Cursor;

    #[test]
    fn test_prefixed_string_round_trip() {
        let mut buf = Vec::new();
        write_prefixed_string::<BigEndian, _>(&mut buf, "world/tex").unwrap();
        assert_eq!(&buf[..4], &[0, 0, 0, 9]);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_prefixed_string::<BigEndian, _>(&mut cursor, 256).unwrap(), "world/tex");
    }

    #[test]
    fn test_prefixed_string_limit() {
        let mut buf = Vec::new();
        write_prefixed_string::<LittleEndian, _>(&mut buf, "abcdef").unwrap();
        let err = read_prefixed_string::<LittleEndian, _>(&mut Cursor::new(buf), 3).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }

    #[test]
    fn test_read_exact_vec_truncated() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3]);
        let err = read_exact_vec(&mut cursor, 8).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { expected: 8, actual: 3 }));
    }

    #[test]
    fn test_stream_len_keeps_position() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        cursor.set_position(4);
        assert_eq!(stream_len(&mut cursor).unwrap(), 10);
        assert_eq!(cursor.position(), 4);
    }
}
