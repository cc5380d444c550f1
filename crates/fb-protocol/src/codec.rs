//! Codec utilities shared by the parameter-buffer encoders and the
//! info-response parsers.
//!
//! Parameter buffers are "clumplet" lists: a one-byte tag, optionally
//! followed by a one-byte length and that many bytes of value. Info
//! responses use a one-byte item followed by a two-byte little-endian
//! ("vax") length.

use bytes::{Buf, BufMut};

use crate::error::ProtocolError;

/// Largest value a one-byte length prefix can describe.
pub const MAX_CLUMPLET_LEN: usize = u8::MAX as usize;

/// Size on the wire of a tag + length + value clumplet.
#[must_use]
pub fn clumplet_len(value: &[u8]) -> usize {
    2 + value.len()
}

/// Write a `tag, len, value` clumplet.
///
/// Fails with [`ProtocolError::ValueTooLong`] when the value does not fit
/// a one-byte length.
pub fn write_clumplet(dst: &mut impl BufMut, tag: u8, value: &[u8]) -> Result<(), ProtocolError> {
    let len = u8::try_from(value.len()).map_err(|_| ProtocolError::ValueTooLong {
        tag,
        len: value.len(),
    })?;
    dst.put_u8(tag);
    dst.put_u8(len);
    dst.put_slice(value);
    Ok(())
}

/// Write a `tag, byte` pair with no length prefix.
pub fn write_tagged_byte(dst: &mut impl BufMut, tag: u8, value: u8) {
    dst.put_u8(tag);
    dst.put_u8(value);
}

/// Read a two-byte little-endian length.
pub fn read_vax_len(src: &mut impl Buf) -> Result<usize, ProtocolError> {
    if src.remaining() < 2 {
        return Err(ProtocolError::UnexpectedEof);
    }
    Ok(src.get_u16_le() as usize)
}

/// Read a little-endian integer of `len` bytes (at most 8).
///
/// Mirrors `isc_vax_integer`: the value is sign-extended from its
/// highest byte.
pub fn read_vax_integer(src: &mut impl Buf, len: usize) -> Result<i64, ProtocolError> {
    if len > 8 || src.remaining() < len {
        return Err(ProtocolError::UnexpectedEof);
    }
    if len == 0 {
        return Ok(0);
    }
    let mut value: i64 = 0;
    for shift in 0..len {
        value |= i64::from(src.get_u8()) << (shift * 8);
    }
    let bits = (len * 8) as u32;
    if bits < 64 {
        value = (value << (64 - bits)) >> (64 - bits);
    }
    Ok(value)
}

/// Read a vax-length-prefixed byte string.
pub fn read_vax_bytes(src: &mut impl Buf) -> Result<Vec<u8>, ProtocolError> {
    let len = read_vax_len(src)?;
    if src.remaining() < len {
        return Err(ProtocolError::UnexpectedEof);
    }
    let mut out = vec![0u8; len];
    src.copy_to_slice(&mut out);
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_write_clumplet() {
        let mut buf = BytesMut::new();
        write_clumplet(&mut buf, 28, b"SYSDBA").unwrap();
        assert_eq!(&buf[..], &[28, 6, b'S', b'Y', b'S', b'D', b'B', b'A']);
        assert_eq!(clumplet_len(b"SYSDBA"), buf.len());
    }

    #[test]
    fn test_write_clumplet_limit() {
        let mut buf = BytesMut::new();
        write_clumplet(&mut buf, 29, &[b'x'; 255]).unwrap();
        assert_eq!(buf.len(), 257);

        let err = write_clumplet(&mut buf, 29, &[b'x'; 256]).unwrap_err();
        assert_eq!(err, ProtocolError::ValueTooLong { tag: 29, len: 256 });
    }

    #[test]
    fn test_write_tagged_byte() {
        let mut buf = BytesMut::new();
        write_tagged_byte(&mut buf, 17, 1);
        assert_eq!(&buf[..], &[17, 1]);
    }

    #[test]
    fn test_read_vax_integer() {
        let mut src: &[u8] = &[0x10, 0x00];
        assert_eq!(read_vax_integer(&mut src, 2).unwrap(), 16);

        let mut src: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(read_vax_integer(&mut src, 4).unwrap(), -1);

        let mut src: &[u8] = &[0x01];
        assert!(read_vax_integer(&mut src, 2).is_err());
    }

    #[test]
    fn test_read_vax_bytes() {
        let mut src: &[u8] = &[3, 0, b'a', b'b', b'c', 9];
        assert_eq!(read_vax_bytes(&mut src).unwrap(), b"abc");
        assert_eq!(src, &[9]);

        let mut short: &[u8] = &[5, 0, b'a'];
        assert_eq!(
            read_vax_bytes(&mut short).unwrap_err(),
            ProtocolError::UnexpectedEof
        );
    }
}
