//! Linear (1D) symbol scanning
//!
//! Drives the per-format decoders over a fan of image rows. Each row is
//! collapsed into bar/space run lengths; the format decoders work purely on
//! those runs so they are independent of image resolution.

use tracing::debug;

use super::binarize::BitMatrix;
use super::{code128, ean, DecodeError};
use crate::models::DecodedSymbol;

/// Outcome of one decode attempt within a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RowFailure {
    /// Nothing structurally resembling this symbology in the row
    NotFound,
    /// Structural match whose checksum did not verify
    Checksum,
}

pub(super) type RowResult = Result<DecodedSymbol, RowFailure>;

/// Scan the binarized image for a linear symbol.
///
/// Rows are visited center-out, each in both reading directions. A
/// checksum failure anywhere is remembered and reported in preference to
/// a plain miss, since it means a symbol was almost certainly present.
pub(super) fn scan(matrix: &BitMatrix) -> Result<DecodedSymbol, DecodeError> {
    let mut checksum_seen = false;
    for y in scan_rows(matrix.height()) {
        let row = matrix.row(y);
        for reversed in [false, true] {
            let flipped: Vec<bool>;
            let bits: &[bool] = if reversed {
                flipped = row.iter().rev().copied().collect();
                &flipped
            } else {
                row
            };
            match decode_row(bits) {
                Ok(symbol) => {
                    debug!(
                        "decoded {} at row {y}{}",
                        symbol.format.as_str(),
                        if reversed { " (reversed)" } else { "" }
                    );
                    return Ok(symbol);
                }
                Err(RowFailure::Checksum) => checksum_seen = true,
                Err(RowFailure::NotFound) => {}
            }
        }
    }
    if checksum_seen {
        Err(DecodeError::ChecksumMismatch)
    } else {
        Err(DecodeError::NoSymbolFound)
    }
}

/// Row indices to try, middle first, fanning outward
fn scan_rows(height: usize) -> Vec<usize> {
    let mid = height / 2;
    let step = (height / 16).max(1);
    let mut rows = vec![mid];
    for k in 1..=7 {
        if let Some(above) = mid.checked_sub(k * step) {
            rows.push(above);
        }
        let below = mid + k * step;
        if below < height {
            rows.push(below);
        }
    }
    rows.dedup();
    rows
}

/// Try every supported linear symbology against one row
fn decode_row(bits: &[bool]) -> RowResult {
    let (runs, first_dark) = row_runs(bits);
    if runs.len() < 4 {
        return Err(RowFailure::NotFound);
    }
    let mut checksum_seen = false;
    for attempt in [
        ean::decode_ean13(&runs, first_dark),
        ean::decode_ean8(&runs, first_dark),
        code128::decode(&runs, first_dark),
    ] {
        match attempt {
            Ok(symbol) => return Ok(symbol),
            Err(RowFailure::Checksum) => checksum_seen = true,
            Err(RowFailure::NotFound) => {}
        }
    }
    if checksum_seen {
        Err(RowFailure::Checksum)
    } else {
        Err(RowFailure::NotFound)
    }
}

/// Collapse a row of bits into run lengths.
///
/// Returns the lengths plus whether the first run is dark; run `i` is dark
/// iff `(i % 2 == 0) == first_dark`.
pub(super) fn row_runs(bits: &[bool]) -> (Vec<usize>, bool) {
    let mut runs = Vec::new();
    let first_dark = bits.first().copied().unwrap_or(false);
    let mut current = first_dark;
    let mut len = 0usize;
    for &bit in bits {
        if bit == current {
            len += 1;
        } else {
            runs.push(len);
            current = bit;
            len = 1;
        }
    }
    if len > 0 {
        runs.push(len);
    }
    (runs, first_dark)
}

/// Normalized mismatch between observed runs and an ideal width pattern.
///
/// Both sides are scaled to the same total, so the result is comparable
/// across module sizes; 0.0 is a perfect match.
pub(super) fn pattern_error(runs: &[usize], pattern: &[usize]) -> f64 {
    debug_assert_eq!(runs.len(), pattern.len());
    let run_total: usize = runs.iter().sum();
    let pattern_total: usize = pattern.iter().sum();
    if run_total == 0 || pattern_total == 0 {
        return f64::INFINITY;
    }
    let scale = run_total as f64 / pattern_total as f64;
    let mut err = 0.0;
    for (&run, &ideal) in runs.iter().zip(pattern) {
        err += (run as f64 - ideal as f64 * scale).abs();
    }
    err / run_total as f64
}

/// Largest `pattern_error` accepted for a guard or digit group
pub(super) const MAX_PATTERN_ERROR: f64 = 0.25;

/// Render a module pattern into a pixel buffer with quiet zones, for
/// synthetic round-trip fixtures.
#[cfg(test)]
pub(super) fn bars_to_buffer(
    modules: &[bool],
    unit_px: usize,
    height: usize,
    quiet_modules: usize,
) -> crate::models::PixelBuffer {
    let width = (modules.len() + 2 * quiet_modules) * unit_px;
    let mut samples = vec![255u8; width * height];
    for (i, &dark) in modules.iter().enumerate() {
        if !dark {
            continue;
        }
        let x0 = (quiet_modules + i) * unit_px;
        for y in 0..height {
            for x in x0..x0 + unit_px {
                samples[y * width + x] = 0;
            }
        }
    }
    crate::models::PixelBuffer::new(width as u32, height as u32, samples)
}
