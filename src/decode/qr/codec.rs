//! QR data segment decoding
//!
//! Turns corrected data codewords into text. Numeric, alphanumeric, and
//! byte segments are supported; ECI and kanji report an unsupported
//! format rather than guessing at a character mapping.

use tracing::debug;

use crate::decode::DecodeError;

const ALPHANUMERIC: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() * 8 - self.pos
    }

    fn read(&mut self, count: usize) -> Option<u32> {
        if count > self.remaining() {
            return None;
        }
        let mut out = 0u32;
        for _ in 0..count {
            let byte = self.bytes[self.pos / 8];
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            out = (out << 1) | u32::from(bit);
            self.pos += 1;
        }
        Some(out)
    }
}

/// Character-count field width for a mode, by version
fn count_bits(mode: u32, version: usize) -> usize {
    // Versions through 9 share one tier; 10..=26 the next. Larger
    // versions are rejected before reaching here.
    let small = version <= 9;
    match mode {
        0b0001 => {
            if small {
                10
            } else {
                12
            }
        }
        0b0010 => {
            if small {
                9
            } else {
                11
            }
        }
        0b0100 => {
            if small {
                8
            } else {
                16
            }
        }
        _ => unreachable!("caller dispatches on supported modes"),
    }
}

/// Decode the data codeword stream of a symbol into its text payload
pub(super) fn decode_payload(data: &[u8], version: usize) -> Result<String, DecodeError> {
    let mut reader = BitReader::new(data);
    let mut out = String::new();

    loop {
        let Some(mode) = reader.read(4) else {
            break;
        };
        match mode {
            // Terminator
            0b0000 => break,
            0b0001 => decode_numeric(&mut reader, version, &mut out)?,
            0b0010 => decode_alphanumeric(&mut reader, version, &mut out)?,
            0b0100 => decode_bytes(&mut reader, version, &mut out)?,
            // ECI, kanji, FNC1, structured append
            0b0111 | 0b1000 | 0b0101 | 0b1001 | 0b0011 => {
                debug!("unsupported segment mode {mode:#06b}");
                return Err(DecodeError::UnsupportedFormat);
            }
            _ => return Err(DecodeError::ChecksumMismatch),
        }
    }

    if out.is_empty() {
        debug!("symbol decoded to an empty payload");
        return Err(DecodeError::ChecksumMismatch);
    }
    Ok(out)
}

fn decode_numeric(
    reader: &mut BitReader<'_>,
    version: usize,
    out: &mut String,
) -> Result<(), DecodeError> {
    let mut count = reader
        .read(count_bits(0b0001, version))
        .ok_or(DecodeError::ChecksumMismatch)? as usize;
    while count >= 3 {
        let group = reader.read(10).ok_or(DecodeError::ChecksumMismatch)?;
        if group >= 1000 {
            return Err(DecodeError::ChecksumMismatch);
        }
        out.push_str(&format!("{group:03}"));
        count -= 3;
    }
    if count == 2 {
        let group = reader.read(7).ok_or(DecodeError::ChecksumMismatch)?;
        if group >= 100 {
            return Err(DecodeError::ChecksumMismatch);
        }
        out.push_str(&format!("{group:02}"));
    } else if count == 1 {
        let digit = reader.read(4).ok_or(DecodeError::ChecksumMismatch)?;
        if digit >= 10 {
            return Err(DecodeError::ChecksumMismatch);
        }
        out.push(char::from(b'0' + digit as u8));
    }
    Ok(())
}

fn decode_alphanumeric(
    reader: &mut BitReader<'_>,
    version: usize,
    out: &mut String,
) -> Result<(), DecodeError> {
    let mut count = reader
        .read(count_bits(0b0010, version))
        .ok_or(DecodeError::ChecksumMismatch)? as usize;
    while count >= 2 {
        let pair = reader.read(11).ok_or(DecodeError::ChecksumMismatch)? as usize;
        let (a, b) = (pair / 45, pair % 45);
        if a >= 45 {
            return Err(DecodeError::ChecksumMismatch);
        }
        out.push(char::from(ALPHANUMERIC[a]));
        out.push(char::from(ALPHANUMERIC[b]));
        count -= 2;
    }
    if count == 1 {
        let single = reader.read(6).ok_or(DecodeError::ChecksumMismatch)? as usize;
        if single >= 45 {
            return Err(DecodeError::ChecksumMismatch);
        }
        out.push(char::from(ALPHANUMERIC[single]));
    }
    Ok(())
}

fn decode_bytes(
    reader: &mut BitReader<'_>,
    version: usize,
    out: &mut String,
) -> Result<(), DecodeError> {
    let count = reader
        .read(count_bits(0b0100, version))
        .ok_or(DecodeError::ChecksumMismatch)? as usize;
    let mut bytes = Vec::with_capacity(count);
    for _ in 0..count {
        bytes.push(reader.read(8).ok_or(DecodeError::ChecksumMismatch)? as u8);
    }
    match String::from_utf8(bytes) {
        Ok(text) => out.push_str(&text),
        // Fall back to Latin-1, the symbology's default byte interpretation
        Err(err) => out.extend(err.into_bytes().iter().map(|&b| char::from(b))),
    }
    Ok(())
}
