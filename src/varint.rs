//! Unsigned variable-length integers.
//!
//! Seven payload bits per byte, least significant group first; the high bit
//! of each byte flags that another byte follows. Values below 128 take a
//! single byte, which is the common case for affinity segment ids.

use std::io::{Read, Write};

use crate::common::{Result, RsDirError};

const PAYLOAD_MASK: u8 = 0x7F;
const CONTINUATION: u8 = 0x80;

/// Longest encoding of a `u64`.
const MAX_U64_LEN: usize = 10;

pub fn write_unsigned_int<W: Write>(out: &mut W, value: u32) -> Result<()> {
    write_unsigned_long(out, u64::from(value))
}

pub fn read_unsigned_int<R: Read>(input: &mut R) -> Result<u32> {
    let value = read_bounded(input, 32)?;
    // read_bounded already rejected anything wider than 32 bits
    Ok(value as u32)
}

pub fn write_unsigned_long<W: Write>(out: &mut W, value: u64) -> Result<()> {
    let len = encoded_len(value);
    let mut buf = [0u8; MAX_U64_LEN];
    for (i, byte) in buf[..len].iter_mut().enumerate() {
        *byte = (value >> (7 * i)) as u8 & PAYLOAD_MASK;
        if i + 1 < len {
            *byte |= CONTINUATION;
        }
    }
    out.write_all(&buf[..len])?;
    Ok(())
}

pub fn read_unsigned_long<R: Read>(input: &mut R) -> Result<u64> {
    read_bounded(input, 64)
}

/// Number of bytes `value` occupies once encoded.
pub(crate) fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

fn read_bounded<R: Read>(input: &mut R, width: u32) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let mut byte = [0u8; 1];
        input
            .read_exact(&mut byte)
            .map_err(|e| RsDirError::from_read(e, "unsigned varint"))?;
        let payload = u64::from(byte[0] & PAYLOAD_MASK);

        if shift >= width || (shift > 0 && payload >> (width - shift) != 0) {
            return Err(RsDirError::corruption(format!(
                "unsigned varint overflows {width} bits"
            )));
        }
        value |= payload << shift;

        if byte[0] & CONTINUATION == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_U32_LEN: usize = 5;

    fn encode(value: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_unsigned_int(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(7), vec![0x07]);
        assert_eq!(encode(127), vec![0x7F]);
        assert_eq!(encode(128), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xAC, 0x02]);
        assert_eq!(encode(u32::MAX), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_small_values_are_short() {
        for value in [0u64, 1, 127, 128, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
            let mut buf = Vec::new();
            write_unsigned_long(&mut buf, value).unwrap();
            assert_eq!(buf.len(), encoded_len(value), "value {value}");
            assert_eq!(read_unsigned_long(&mut buf.as_slice()).unwrap(), value);
        }
        assert_eq!(encoded_len(u64::from(u32::MAX)), MAX_U32_LEN);
        assert_eq!(encoded_len(u64::MAX), MAX_U64_LEN);
    }

    #[test]
    fn test_truncated_varint_is_corruption() {
        let err = read_unsigned_int(&mut [0x80u8, 0x80].as_slice()).unwrap_err();
        assert!(err.is_corruption());

        let err = read_unsigned_int(&mut [].as_slice()).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_overflow_is_corruption() {
        // sixth byte for a u32
        let bytes = [0xFFu8, 0xFF, 0xFF, 0xFF, 0x8F, 0x01];
        assert!(read_unsigned_int(&mut bytes.as_slice()).unwrap_err().is_corruption());

        // fifth byte carrying bits beyond 32
        let bytes = [0xFFu8, 0xFF, 0xFF, 0xFF, 0x1F];
        assert!(read_unsigned_int(&mut bytes.as_slice()).unwrap_err().is_corruption());

        // but the same bytes fit a u64
        assert_eq!(read_unsigned_long(&mut bytes.as_slice()).unwrap(), 0x1_FFFF_FFFF);
    }

    #[test]
    fn test_reads_only_what_it_needs() {
        let bytes = [0x05u8, 0xAA];
        let mut input = bytes.as_slice();
        assert_eq!(read_unsigned_int(&mut input).unwrap(), 5);
        assert_eq!(input, &[0xAA]);
    }
}
