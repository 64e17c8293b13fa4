//! Length-prefixed text fields.
//!
//! The layout is the one produced by `java.io.DataOutput::writeUTF`, so keys
//! written by older JVM nodes stay readable:
//!
//! ```text
//! +-----------------+------------------------------+
//! | u16 big endian  | modified UTF-8, `len` bytes  |
//! +-----------------+------------------------------+
//! ```
//!
//! Modified UTF-8 works on UTF-16 code units. U+0000 is written as the two
//! byte form `C0 80`, and characters outside the BMP are written as two
//! three-byte surrogates instead of one four-byte sequence.

use std::io::{Read, Write};

use crate::common::{Result, RsDirError};

/// Largest encoded body the 2-byte prefix can describe.
pub const MAX_UTF_LEN: usize = u16::MAX as usize;

/// Encoded body length of `s`, without the prefix.
pub fn utf_len(s: &str) -> usize {
    s.encode_utf16()
        .map(|unit| match unit {
            0x0001..=0x007F => 1,
            0x0000 | 0x0080..=0x07FF => 2,
            _ => 3,
        })
        .sum()
}

pub fn write_utf<W: Write>(out: &mut W, s: &str) -> Result<()> {
    let len = utf_len(s);
    if len > MAX_UTF_LEN {
        return Err(RsDirError::UtfDataFormat { length: len });
    }

    let mut buf = Vec::with_capacity(2 + len);
    buf.extend_from_slice(&(len as u16).to_be_bytes());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => buf.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                buf.push(0xC0 | (unit >> 6) as u8);
                buf.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                buf.push(0xE0 | (unit >> 12) as u8);
                buf.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                buf.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out.write_all(&buf)?;
    Ok(())
}

/// Reads one prefixed text field. `field` names it in error messages.
pub fn read_utf<R: Read>(input: &mut R, field: &str) -> Result<String> {
    let mut prefix = [0u8; 2];
    input
        .read_exact(&mut prefix)
        .map_err(|e| RsDirError::from_read(e, field))?;
    let len = u16::from_be_bytes(prefix) as usize;

    let mut body = vec![0u8; len];
    input.read_exact(&mut body).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            RsDirError::corruption(format!(
                "{field} declares {len} bytes but the stream ends early"
            ))
        } else {
            RsDirError::Io(e)
        }
    })?;

    decode_body(&body, field)
}

fn decode_body(body: &[u8], field: &str) -> Result<String> {
    // ASCII fast path. A single 0x00 byte is read as U+0000 even though the
    // writer always emits C0 80 for it.
    if body.is_ascii() {
        return String::from_utf8(body.to_vec()).map_err(|_| malformed(field, 0));
    }

    let mut units = Vec::with_capacity(body.len());
    let mut pos = 0;
    while pos < body.len() {
        let b0 = body[pos];
        match b0 >> 4 {
            0x0..=0x7 => {
                units.push(u16::from(b0));
                pos += 1;
            }
            0xC | 0xD => {
                let b1 = continuation(body, pos + 1, field)?;
                units.push((u16::from(b0 & 0x1F) << 6) | u16::from(b1 & 0x3F));
                pos += 2;
            }
            0xE => {
                let b1 = continuation(body, pos + 1, field)?;
                let b2 = continuation(body, pos + 2, field)?;
                units.push(
                    (u16::from(b0 & 0x0F) << 12)
                        | (u16::from(b1 & 0x3F) << 6)
                        | u16::from(b2 & 0x3F),
                );
                pos += 3;
            }
            _ => return Err(malformed(field, pos)),
        }
    }

    String::from_utf16(&units).map_err(|_| {
        RsDirError::corruption(format!("{field} contains an unpaired surrogate"))
    })
}

fn continuation(body: &[u8], pos: usize, field: &str) -> Result<u8> {
    match body.get(pos) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(b),
        Some(_) => Err(malformed(field, pos)),
        None => Err(RsDirError::corruption(format!(
            "{field} ends inside a multi-byte sequence"
        ))),
    }
}

fn malformed(field: &str, pos: usize) -> RsDirError {
    RsDirError::corruption(format!("{field} has malformed input around byte {pos}"))
}
