//! Big-endian wire primitives.
//!
//! Integers are fixed width and big-endian. Strings and mapping counts carry a
//! u16 prefix, so any single field is capped at 65535 bytes or entries. Reads
//! take `(data, pos)` and advance `pos` only on success.

use crate::error::TokenError;

// --- Encoding ---

pub fn encode_i32(value: i32, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&value.to_be_bytes());
}

pub fn encode_i64(value: i64, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&value.to_be_bytes());
}

/// Encode a u16 entry count. Rejects counts that do not fit.
pub fn encode_count(field: &'static str, count: usize, buf: &mut Vec<u8>) -> Result<(), TokenError> {
    let count16 =
        u16::try_from(count).map_err(|_| TokenError::TooManyEntries { field, count })?;
    buf.extend_from_slice(&count16.to_be_bytes());
    Ok(())
}

/// Encode a u16 byte length followed by the bytes themselves.
pub fn encode_bytes(field: &'static str, value: &[u8], buf: &mut Vec<u8>) -> Result<(), TokenError> {
    let len16 = u16::try_from(value.len()).map_err(|_| TokenError::FieldTooLong {
        field,
        len: value.len(),
    })?;
    buf.extend_from_slice(&len16.to_be_bytes());
    buf.extend_from_slice(value);
    Ok(())
}

/// Overwrite four bytes at `offset` with `value`.
pub fn patch_i32(buf: &mut [u8], offset: usize, value: i32) -> Result<(), TokenError> {
    let remaining = buf.len().saturating_sub(offset);
    let slot = offset
        .checked_add(4)
        .and_then(|end| buf.get_mut(offset..end))
        .ok_or(TokenError::Truncated {
            field: "total_length",
            needed: 4,
            remaining,
        })?;
    slot.copy_from_slice(&value.to_be_bytes());
    Ok(())
}

// --- Decoding ---

/// Take `len` bytes starting at `pos`.
pub fn take<'a>(
    data: &'a [u8],
    pos: &mut usize,
    len: usize,
    field: &'static str,
) -> Result<&'a [u8], TokenError> {
    let truncated = || TokenError::Truncated {
        field,
        needed: len,
        remaining: data.len().saturating_sub(*pos),
    };
    let end = pos.checked_add(len).ok_or_else(truncated)?;
    let bytes = data.get(*pos..end).ok_or_else(truncated)?;
    *pos = end;
    Ok(bytes)
}

pub fn read_array<const N: usize>(
    data: &[u8],
    pos: &mut usize,
    field: &'static str,
) -> Result<[u8; N], TokenError> {
    let bytes = take(data, pos, N, field)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

pub fn read_u16(data: &[u8], pos: &mut usize, field: &'static str) -> Result<u16, TokenError> {
    read_array(data, pos, field).map(u16::from_be_bytes)
}

pub fn read_i32(data: &[u8], pos: &mut usize, field: &'static str) -> Result<i32, TokenError> {
    read_array(data, pos, field).map(i32::from_be_bytes)
}

pub fn read_i64(data: &[u8], pos: &mut usize, field: &'static str) -> Result<i64, TokenError> {
    read_array(data, pos, field).map(i64::from_be_bytes)
}

/// Read a u16-prefixed byte string.
pub fn read_bytes<'a>(
    data: &'a [u8],
    pos: &mut usize,
    field: &'static str,
) -> Result<&'a [u8], TokenError> {
    let start = *pos;
    let len = read_u16(data, pos, field)?;
    take(data, pos, usize::from(len), field).inspect_err(|_| *pos = start)
}

/// Read a u16-prefixed UTF-8 string.
pub fn read_string(data: &[u8], pos: &mut usize, field: &'static str) -> Result<String, TokenError> {
    let bytes = read_bytes(data, pos, field)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| TokenError::InvalidUtf8 { field })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::MAX_PREFIXED_LEN;

    #[test]
    fn test_integers_are_big_endian() {
        let mut buf = Vec::new();
        encode_i32(0x0102_0304, &mut buf);
        encode_i64(-2, &mut buf);
        assert_eq!(
            buf,
            [0x01, 0x02, 0x03, 0x04, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]
        );

        let mut pos = 0;
        assert_eq!(read_i32(&buf, &mut pos, "a").unwrap(), 0x0102_0304);
        assert_eq!(read_i64(&buf, &mut pos, "b").unwrap(), -2);
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_bytes_field_encoding() {
        let mut buf = Vec::new();
        encode_bytes("user_id", b"13212", &mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x05, b'1', b'3', b'2', b'1', b'2']);
    }

    #[test]
    fn test_empty_bytes_field_is_just_a_prefix() {
        let mut buf = Vec::new();
        encode_bytes("user_id", b"", &mut buf).unwrap();
        assert_eq!(buf, [0x00, 0x00]);

        let mut pos = 0;
        assert_eq!(read_string(&buf, &mut pos, "user_id").unwrap(), "");
        assert_eq!(pos, 2);
    }

    #[test]
    fn test_bytes_field_length_limit() {
        let max = vec![b'a'; MAX_PREFIXED_LEN];
        let mut buf = Vec::new();
        encode_bytes("user_id", &max, &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0xff, 0xff]);

        let over = vec![b'a'; MAX_PREFIXED_LEN + 1];
        let err = encode_bytes("user_id", &over, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            TokenError::FieldTooLong { field: "user_id", len } if len == MAX_PREFIXED_LEN + 1
        ));
    }

    #[test]
    fn test_count_limit() {
        let mut buf = Vec::new();
        encode_count("parameters", MAX_PREFIXED_LEN, &mut buf).unwrap();
        assert_eq!(buf, [0xff, 0xff]);

        let err = encode_count("parameters", MAX_PREFIXED_LEN + 1, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, TokenError::TooManyEntries { field: "parameters", .. }));
    }

    #[test]
    fn test_patch_i32_in_place() {
        let mut buf = vec![0u8; 12];
        patch_i32(&mut buf, 4, 0x0000_006f).unwrap();
        assert_eq!(&buf[4..8], &[0x00, 0x00, 0x00, 0x6f]);
        assert!(buf[..4].iter().chain(&buf[8..]).all(|&b| b == 0));

        assert!(patch_i32(&mut buf, 10, 1).is_err());
        assert!(patch_i32(&mut buf, usize::MAX, 1).is_err());
    }

    #[test]
    fn test_short_fixed_read_is_truncated() {
        let data = [0x00, 0x01, 0x02];
        let mut pos = 0;
        let err = read_i32(&data, &mut pos, "app_id").unwrap_err();
        assert!(matches!(
            err,
            TokenError::Truncated { field: "app_id", needed: 4, remaining: 3 }
        ));
        assert_eq!(pos, 0);
    }

    #[test]
    fn test_length_prefix_past_end_is_truncated() {
        // Claims 10 bytes, carries 3.
        let data = [0x00, 0x0a, b'a', b'b', b'c'];
        let mut pos = 0;
        let err = read_bytes(&data, &mut pos, "parameter value").unwrap_err();
        assert!(matches!(
            err,
            TokenError::Truncated { field: "parameter value", needed: 10, remaining: 3 }
        ));
        assert_eq!(pos, 0);
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let data = [0x00, 0x02, 0xc3, 0x28];
        let mut pos = 0;
        let err = read_string(&data, &mut pos, "user_id").unwrap_err();
        assert!(matches!(err, TokenError::InvalidUtf8 { field: "user_id" }));
    }

    #[test]
    fn test_multibyte_length_counts_bytes() {
        let mut buf = Vec::new();
        encode_bytes("parameter key", "你".as_bytes(), &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x00, 0x03]);
        let mut pos = 0;
        assert_eq!(read_string(&buf, &mut pos, "parameter key").unwrap(), "你");
    }
}
