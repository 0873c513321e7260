//! EAN/UPC decoding
//!
//! Run-length decoding of EAN-13, EAN-8, and UPC-A symbols. UPC-A is the
//! EAN-13 subset with a leading zero and is reported as its own format
//! with the zero stripped.

use super::one_d::{pattern_error, RowFailure, RowResult, MAX_PATTERN_ERROR};
use crate::models::{DecodedSymbol, SymbolFormat};

/// Bar/space widths of the odd-parity (L) digit codes. The even-parity (G)
/// widths are these reversed, and the right-half (R) widths are identical
/// to L with inverted colors.
const L_WIDTHS: [[usize; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// Left-half parity sequence per leading digit, `true` = G
const FIRST_DIGIT_PARITY: [[bool; 6]; 10] = [
    [false, false, false, false, false, false],
    [false, false, true, false, true, true],
    [false, false, true, true, false, true],
    [false, false, true, true, true, false],
    [false, true, false, false, true, true],
    [false, true, true, false, false, true],
    [false, true, true, true, false, false],
    [false, true, false, true, false, true],
    [false, true, false, true, true, false],
    [false, true, true, false, true, false],
];

const GUARD: [usize; 3] = [1, 1, 1];
const MIDDLE_GUARD: [usize; 5] = [1, 1, 1, 1, 1];

/// Run count of a full EAN-13: start guard, 6 left digits, middle guard,
/// 6 right digits, end guard.
const EAN13_RUNS: usize = 59;
/// Run count of a full EAN-8, 4 digits per half.
const EAN8_RUNS: usize = 43;

fn is_dark_run(index: usize, first_dark: bool) -> bool {
    (index % 2 == 0) == first_dark
}

pub(super) fn decode_ean13(runs: &[usize], first_dark: bool) -> RowResult {
    let mut checksum_seen = false;
    if runs.len() >= EAN13_RUNS {
        for i in 1..=runs.len() - EAN13_RUNS {
            if !is_dark_run(i, first_dark) {
                continue;
            }
            match try_ean13_at(runs, i) {
                Some(Ok(symbol)) => return Ok(symbol),
                Some(Err(())) => checksum_seen = true,
                None => {}
            }
        }
    }
    if checksum_seen {
        Err(RowFailure::Checksum)
    } else {
        Err(RowFailure::NotFound)
    }
}

pub(super) fn decode_ean8(runs: &[usize], first_dark: bool) -> RowResult {
    let mut checksum_seen = false;
    if runs.len() >= EAN8_RUNS {
        for i in 1..=runs.len() - EAN8_RUNS {
            if !is_dark_run(i, first_dark) {
                continue;
            }
            match try_ean8_at(runs, i) {
                Some(Ok(symbol)) => return Ok(symbol),
                Some(Err(())) => checksum_seen = true,
                None => {}
            }
        }
    }
    if checksum_seen {
        Err(RowFailure::Checksum)
    } else {
        Err(RowFailure::NotFound)
    }
}

/// `None` = no structural match at this offset, `Some(Err)` = structural
/// match whose check digit failed.
fn try_ean13_at(runs: &[usize], i: usize) -> Option<Result<DecodedSymbol, ()>> {
    let unit = guard_unit(runs, i)?;

    let mut digits = [0u8; 13];
    let mut parity = [false; 6];

    // Left half: L or G codes, space-first groups
    for pos in 0..6 {
        let group = &runs[i + 3 + pos * 4..i + 3 + pos * 4 + 4];
        let (digit, is_g) = decode_digit(group, unit, true)?;
        digits[1 + pos] = digit;
        parity[pos] = is_g;
    }
    digits[0] = FIRST_DIGIT_PARITY.iter().position(|p| *p == parity)? as u8;

    let middle = i + 27;
    if pattern_error(&runs[middle..middle + 5], &MIDDLE_GUARD) > MAX_PATTERN_ERROR {
        return None;
    }

    // Right half: R codes only, bar-first groups
    for pos in 0..6 {
        let group = &runs[middle + 5 + pos * 4..middle + 5 + pos * 4 + 4];
        let (digit, is_g) = decode_digit(group, unit, false)?;
        debug_assert!(!is_g);
        digits[7 + pos] = digit;
    }

    end_guard_matches(runs, i + EAN13_RUNS - 3, unit)?;

    if ean13_check_digit(&digits[..12]) != digits[12] {
        return Some(Err(()));
    }
    Some(Ok(assemble_ean13(&digits)))
}

fn try_ean8_at(runs: &[usize], i: usize) -> Option<Result<DecodedSymbol, ()>> {
    let unit = guard_unit(runs, i)?;

    let mut digits = [0u8; 8];
    for pos in 0..4 {
        let group = &runs[i + 3 + pos * 4..i + 3 + pos * 4 + 4];
        let (digit, _) = decode_digit(group, unit, false)?;
        digits[pos] = digit;
    }

    let middle = i + 19;
    if pattern_error(&runs[middle..middle + 5], &MIDDLE_GUARD) > MAX_PATTERN_ERROR {
        return None;
    }

    for pos in 0..4 {
        let group = &runs[middle + 5 + pos * 4..middle + 5 + pos * 4 + 4];
        let (digit, _) = decode_digit(group, unit, false)?;
        digits[4 + pos] = digit;
    }

    end_guard_matches(runs, i + EAN8_RUNS - 3, unit)?;

    if ean8_check_digit(&digits[..7]) != digits[7] {
        return Some(Err(()));
    }
    let text: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    Some(Ok(DecodedSymbol::new(text, SymbolFormat::Ean8)))
}

/// Validate the start guard at run `i` and return the module unit width
fn guard_unit(runs: &[usize], i: usize) -> Option<f64> {
    let guard = &runs[i..i + 3];
    if pattern_error(guard, &GUARD) > MAX_PATTERN_ERROR {
        return None;
    }
    let unit = guard.iter().sum::<usize>() as f64 / 3.0;
    if unit < 1.0 {
        return None;
    }
    // Quiet zone before the symbol
    if (runs[i - 1] as f64) < 3.0 * unit {
        return None;
    }
    Some(unit)
}

fn end_guard_matches(runs: &[usize], at: usize, unit: f64) -> Option<()> {
    if pattern_error(&runs[at..at + 3], &GUARD) > MAX_PATTERN_ERROR {
        return None;
    }
    // Quiet zone after, unless the symbol runs to the row edge
    if at + 3 < runs.len() && (runs[at + 3] as f64) < 3.0 * unit {
        return None;
    }
    Some(())
}

/// Match one 4-run digit group against the digit code tables.
///
/// Returns the digit and whether the even-parity (G) table matched.
fn decode_digit(group: &[usize], unit: f64, allow_g: bool) -> Option<(u8, bool)> {
    let total: usize = group.iter().sum();
    // A digit spans 7 modules; reject groups far off that scale
    if (total as f64) < 4.5 * unit || (total as f64) > 9.5 * unit {
        return None;
    }
    let mut best: Option<(f64, u8, bool)> = None;
    for (digit, widths) in L_WIDTHS.iter().enumerate() {
        let err = pattern_error(group, widths);
        if best.map_or(true, |(b, _, _)| err < b) {
            best = Some((err, digit as u8, false));
        }
        if allow_g {
            let reversed = [widths[3], widths[2], widths[1], widths[0]];
            let err = pattern_error(group, &reversed);
            if best.map_or(true, |(b, _, _)| err < b) {
                best = Some((err, digit as u8, true));
            }
        }
    }
    let (err, digit, is_g) = best?;
    if err > MAX_PATTERN_ERROR {
        return None;
    }
    Some((digit, is_g))
}

fn assemble_ean13(digits: &[u8; 13]) -> DecodedSymbol {
    if digits[0] == 0 {
        let text: String = digits[1..].iter().map(|d| char::from(b'0' + d)).collect();
        DecodedSymbol::new(text, SymbolFormat::UpcA)
    } else {
        let text: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
        DecodedSymbol::new(text, SymbolFormat::Ean13)
    }
}

pub(super) fn ean13_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * if i % 2 == 1 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

pub(super) fn ean8_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| u32::from(d) * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

// ============================================================================
// Synthetic fixtures
// ============================================================================

/// Bit patterns of the L digit codes, MSB-first over 7 modules
#[cfg(test)]
const L_BITS: [u8; 10] = [
    0b0001101, 0b0011001, 0b0010011, 0b0111101, 0b0100011, 0b0110001, 0b0101111, 0b0111011,
    0b0110111, 0b0001011,
];

#[cfg(test)]
fn r_bits(digit: u8) -> u8 {
    !L_BITS[digit as usize] & 0x7f
}

#[cfg(test)]
fn g_bits(digit: u8) -> u8 {
    // G is the mirror image of R
    let r = r_bits(digit);
    (0..7).fold(0, |acc, b| (acc << 1) | ((r >> b) & 1))
}

#[cfg(test)]
fn push_code(modules: &mut Vec<bool>, bits: u8) {
    for b in (0..7).rev() {
        modules.push((bits >> b) & 1 == 1);
    }
}

/// Render an EAN-13 module pattern from 13 digit characters.
///
/// The check digit is rendered as given, valid or not, so fixtures can
/// exercise the checksum-mismatch path.
#[cfg(test)]
pub(super) fn synthesize_ean13(
    code: &str,
    unit_px: usize,
    height: usize,
) -> crate::models::PixelBuffer {
    let digits: Vec<u8> = code.bytes().map(|b| b - b'0').collect();
    assert_eq!(digits.len(), 13);
    let mut modules = vec![true, false, true];
    for pos in 0..6 {
        let digit = digits[1 + pos];
        let bits = if FIRST_DIGIT_PARITY[digits[0] as usize][pos] {
            g_bits(digit)
        } else {
            L_BITS[digit as usize]
        };
        push_code(&mut modules, bits);
    }
    modules.extend([false, true, false, true, false]);
    for pos in 0..6 {
        push_code(&mut modules, r_bits(digits[7 + pos]));
    }
    modules.extend([true, false, true]);
    super::one_d::bars_to_buffer(&modules, unit_px, height, 10)
}

#[cfg(test)]
pub(super) fn synthesize_ean8(
    code: &str,
    unit_px: usize,
    height: usize,
) -> crate::models::PixelBuffer {
    let digits: Vec<u8> = code.bytes().map(|b| b - b'0').collect();
    assert_eq!(digits.len(), 8);
    let mut modules = vec![true, false, true];
    for pos in 0..4 {
        push_code(&mut modules, L_BITS[digits[pos] as usize]);
    }
    modules.extend([false, true, false, true, false]);
    for pos in 0..4 {
        push_code(&mut modules, r_bits(digits[4 + pos]));
    }
    modules.extend([true, false, true]);
    super::one_d::bars_to_buffer(&modules, unit_px, height, 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, DecodeError};

    #[test]
    fn test_check_digits() {
        assert_eq!(ean13_check_digit(&[5, 9, 0, 1, 2, 3, 4, 1, 2, 3, 4, 5]), 7);
        assert_eq!(ean13_check_digit(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3]), 1);
        assert_eq!(ean8_check_digit(&[9, 6, 3, 8, 5, 0, 7]), 4);
    }

    #[test]
    fn test_ean13_roundtrip() {
        for code in ["5901234123457", "4006381333931", "9780201379624"] {
            for unit_px in [2, 3] {
                let buffer = synthesize_ean13(code, unit_px, 50);
                let symbol = decode(&buffer).expect("synthetic EAN-13 must decode");
                assert_eq!(symbol.format, SymbolFormat::Ean13);
                assert_eq!(symbol.text, code);
            }
        }
    }

    #[test]
    fn test_upca_reported_with_leading_zero_stripped() {
        let buffer = synthesize_ean13("0036000291452", 2, 50);
        let symbol = decode(&buffer).expect("synthetic UPC-A must decode");
        assert_eq!(symbol.format, SymbolFormat::UpcA);
        assert_eq!(symbol.text, "036000291452");
    }

    #[test]
    fn test_ean8_roundtrip() {
        let buffer = synthesize_ean8("96385074", 2, 50);
        let symbol = decode(&buffer).expect("synthetic EAN-8 must decode");
        assert_eq!(symbol.format, SymbolFormat::Ean8);
        assert_eq!(symbol.text, "96385074");
    }

    #[test]
    fn test_bad_check_digit_is_checksum_mismatch() {
        // Valid structure, wrong final digit
        let buffer = synthesize_ean13("5901234123450", 2, 50);
        assert_eq!(decode(&buffer), Err(DecodeError::ChecksumMismatch));
    }

    #[test]
    fn test_upside_down_scan() {
        let original = synthesize_ean13("4006381333931", 2, 50);
        let w = original.width as usize;
        let h = original.height as usize;
        let mut flipped = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                flipped[(h - 1 - y) * w + (w - 1 - x)] = original.samples[y * w + x];
            }
        }
        let buffer = crate::models::PixelBuffer::new(original.width, original.height, flipped);
        let symbol = decode(&buffer).expect("flipped EAN-13 must decode");
        assert_eq!(symbol.text, "4006381333931");
    }
}
