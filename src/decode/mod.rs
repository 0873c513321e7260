//! Symbol decoding
//!
//! Extracts a barcode or QR payload from a still image. The decoder is a
//! pure function of the input buffer: no retained state, no I/O, and
//! identical samples always produce the identical result, so callers may
//! invoke it from any number of threads or tasks without coordination.

mod binarize;
mod code128;
mod ean;
mod one_d;
mod qr;

use std::borrow::Cow;

use thiserror::Error;
use tracing::debug;

use crate::models::{DecodedSymbol, PixelBuffer};

/// Decode failure modes
///
/// Only `InvalidBuffer` is a caller mistake; the other variants are
/// ordinary outcomes of pointing a camera at the world and are safe to
/// retry with another frame or image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("pixel buffer of {width}x{height} expects {expected} or {expected_rgba} samples, got {actual}")]
    InvalidBuffer {
        width: u32,
        height: u32,
        expected: usize,
        expected_rgba: usize,
        actual: usize,
    },

    #[error("no symbol found")]
    NoSymbolFound,

    #[error("symbol checksum verification failed")]
    ChecksumMismatch,

    #[error("symbol format not supported")]
    UnsupportedFormat,
}

impl DecodeError {
    fn invalid(buffer: &PixelBuffer) -> Self {
        DecodeError::InvalidBuffer {
            width: buffer.width,
            height: buffer.height,
            expected: buffer.pixel_count(),
            expected_rgba: buffer.pixel_count() * 4,
            actual: buffer.samples.len(),
        }
    }

    /// How far an attempt got before failing. Used to keep the most
    /// informative failure when several passes all miss.
    fn progress(&self) -> u8 {
        match self {
            DecodeError::InvalidBuffer { .. } => 3,
            DecodeError::ChecksumMismatch => 2,
            DecodeError::UnsupportedFormat => 1,
            DecodeError::NoSymbolFound => 0,
        }
    }
}

/// Attempt to locate and decode one symbol in the buffer.
///
/// Matrix (QR) localization runs first, then a linear bar/space scan for
/// the 1D formats. A clean image with no symbol is an ordinary
/// [`DecodeError::NoSymbolFound`], never a panic.
pub fn decode(buffer: &PixelBuffer) -> Result<DecodedSymbol, DecodeError> {
    if buffer.width == 0 || buffer.height == 0 {
        return Err(DecodeError::invalid(buffer));
    }
    let luma: Cow<'_, [u8]> = if buffer.is_grayscale() {
        Cow::Borrowed(&buffer.samples)
    } else if buffer.is_rgba() {
        Cow::Owned(binarize::rgba_to_luminance(&buffer.samples))
    } else {
        return Err(DecodeError::invalid(buffer));
    };

    let matrix = binarize::threshold(buffer.width as usize, buffer.height as usize, &luma);

    let qr_miss = match qr::detect(&matrix) {
        Ok(symbol) => return Ok(symbol),
        Err(e) => {
            debug!("matrix pass found nothing: {e}");
            e
        }
    };

    match one_d::scan(&matrix) {
        Ok(symbol) => Ok(symbol),
        Err(linear_miss) => {
            debug!("linear pass found nothing: {linear_miss}");
            if qr_miss.progress() >= linear_miss.progress() {
                Err(qr_miss)
            } else {
                Err(linear_miss)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SymbolFormat;

    #[test]
    fn test_mismatched_sample_length_is_invalid_buffer() {
        for len in [0usize, 5, 99, 101, 399, 401] {
            let buffer = PixelBuffer::new(10, 10, vec![255; len]);
            match decode(&buffer) {
                Err(DecodeError::InvalidBuffer { actual, .. }) => assert_eq!(actual, len),
                other => panic!("expected InvalidBuffer, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_dimensions_are_invalid_buffer() {
        let buffer = PixelBuffer::new(0, 10, vec![]);
        assert!(matches!(
            decode(&buffer),
            Err(DecodeError::InvalidBuffer { .. })
        ));
    }

    #[test]
    fn test_uniform_image_is_no_symbol_found() {
        for shade in [0u8, 127, 255] {
            let buffer = PixelBuffer::new(120, 80, vec![shade; 120 * 80]);
            assert_eq!(decode(&buffer), Err(DecodeError::NoSymbolFound));
        }
    }

    #[test]
    fn test_uniform_rgba_image_is_no_symbol_found() {
        let buffer = PixelBuffer::new(60, 60, vec![200; 60 * 60 * 4]);
        assert_eq!(decode(&buffer), Err(DecodeError::NoSymbolFound));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let buffer = ean::synthesize_ean13("4006381333931", 2, 60);
        let first = decode(&buffer);
        for _ in 0..3 {
            assert_eq!(decode(&buffer), first);
        }
        let symbol = first.expect("synthetic EAN-13 must decode");
        assert_eq!(symbol.format, SymbolFormat::Ean13);
    }

    #[test]
    fn test_rgba_and_grayscale_agree() {
        let gray = ean::synthesize_ean13("9780201379624", 2, 50);
        let rgba_samples: Vec<u8> = gray
            .samples
            .iter()
            .flat_map(|&v| [v, v, v, 255])
            .collect();
        let rgba = PixelBuffer::new(gray.width, gray.height, rgba_samples);
        assert_eq!(decode(&gray), decode(&rgba));
    }
}
