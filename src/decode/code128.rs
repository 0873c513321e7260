//! Code 128 decoding
//!
//! Run-length decoding of Code 128 symbols across code sets A, B, and C,
//! including shifts and set switches, with mod-103 checksum verification.

use super::one_d::{pattern_error, RowFailure, RowResult, MAX_PATTERN_ERROR};
use crate::models::{DecodedSymbol, SymbolFormat};

/// Bar/space widths of symbol values 0..=105, 11 modules each
const PATTERNS: [[usize; 6]; 106] = [
    [2, 1, 2, 2, 2, 2],
    [2, 2, 2, 1, 2, 2],
    [2, 2, 2, 2, 2, 1],
    [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2],
    [1, 3, 1, 2, 2, 2],
    [1, 2, 2, 2, 1, 3],
    [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2],
    [2, 2, 1, 2, 1, 3],
    [2, 2, 1, 3, 1, 2],
    [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2],
    [1, 2, 2, 1, 3, 2],
    [1, 2, 2, 2, 3, 1],
    [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2],
    [1, 2, 3, 2, 2, 1],
    [2, 2, 3, 2, 1, 1],
    [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1],
    [2, 1, 3, 2, 1, 2],
    [2, 2, 3, 1, 1, 2],
    [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2],
    [3, 2, 1, 1, 2, 2],
    [3, 2, 1, 2, 2, 1],
    [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2],
    [3, 2, 2, 2, 1, 1],
    [2, 1, 2, 1, 2, 3],
    [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1],
    [1, 1, 1, 3, 2, 3],
    [1, 3, 1, 1, 2, 3],
    [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3],
    [1, 3, 2, 1, 1, 3],
    [1, 3, 2, 3, 1, 1],
    [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3],
    [2, 3, 1, 3, 1, 1],
    [1, 1, 2, 1, 3, 3],
    [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1],
    [1, 1, 3, 1, 2, 3],
    [1, 1, 3, 3, 2, 1],
    [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1],
    [2, 1, 1, 3, 3, 1],
    [2, 3, 1, 1, 3, 1],
    [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1],
    [2, 1, 3, 1, 3, 1],
    [3, 1, 1, 1, 2, 3],
    [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1],
    [3, 1, 2, 1, 1, 3],
    [3, 1, 2, 3, 1, 1],
    [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1],
    [2, 2, 1, 4, 1, 1],
    [4, 3, 1, 1, 1, 1],
    [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2],
    [1, 2, 1, 1, 2, 4],
    [1, 2, 1, 4, 2, 1],
    [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1],
    [1, 1, 2, 2, 1, 4],
    [1, 1, 2, 4, 1, 2],
    [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1],
    [1, 4, 2, 1, 1, 2],
    [1, 4, 2, 2, 1, 1],
    [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4],
    [4, 1, 3, 1, 1, 1],
    [2, 4, 1, 1, 1, 2],
    [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2],
    [1, 2, 1, 1, 4, 2],
    [1, 2, 1, 2, 4, 1],
    [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2],
    [1, 2, 4, 2, 1, 1],
    [4, 1, 1, 2, 1, 2],
    [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1],
    [2, 1, 2, 1, 4, 1],
    [2, 1, 4, 1, 2, 1],
    [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3],
    [1, 1, 1, 3, 4, 1],
    [1, 3, 1, 1, 4, 1],
    [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1],
    [4, 1, 1, 1, 1, 3],
    [4, 1, 1, 3, 1, 1],
    [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1],
    [3, 1, 1, 1, 4, 1],
    [4, 1, 1, 1, 3, 1],
    [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4],
    [2, 1, 1, 2, 3, 2],
];

/// Stop pattern, 13 modules over 7 runs
const STOP: [usize; 7] = [2, 3, 3, 1, 1, 1, 2];

const START_A: usize = 103;
const START_B: usize = 104;
const START_C: usize = 105;

fn is_dark_run(index: usize, first_dark: bool) -> bool {
    (index % 2 == 0) == first_dark
}

pub(super) fn decode(runs: &[usize], first_dark: bool) -> RowResult {
    // start + checksum + stop is the structural minimum
    if runs.len() < 19 {
        return Err(RowFailure::NotFound);
    }
    let mut checksum_seen = false;
    for i in 1..=runs.len() - 19 {
        if !is_dark_run(i, first_dark) {
            continue;
        }
        match try_at(runs, i) {
            Some(Ok(symbol)) => return Ok(symbol),
            Some(Err(())) => checksum_seen = true,
            None => {}
        }
    }
    if checksum_seen {
        Err(RowFailure::Checksum)
    } else {
        Err(RowFailure::NotFound)
    }
}

fn try_at(runs: &[usize], i: usize) -> Option<Result<DecodedSymbol, ()>> {
    let start_group = &runs[i..i + 6];
    let unit = start_group.iter().sum::<usize>() as f64 / 11.0;
    if unit < 1.0 || (runs[i - 1] as f64) < 3.0 * unit {
        return None;
    }
    let start = best_symbol(start_group, &[START_A, START_B, START_C])?;

    let mut values = vec![start];
    let mut pos = i + 6;
    loop {
        if pos + 7 <= runs.len() && pattern_error(&runs[pos..pos + 7], &STOP) <= MAX_PATTERN_ERROR {
            pos += 7;
            break;
        }
        if pos + 6 > runs.len() || values.len() > 90 {
            return None;
        }
        values.push(best_any_symbol(&runs[pos..pos + 6])?);
        pos += 6;
    }
    // Quiet zone after the stop, unless the symbol runs to the row edge
    if pos < runs.len() && (runs[pos] as f64) < 3.0 * unit {
        return None;
    }

    // Payload plus checksum at minimum
    if values.len() < 3 {
        return None;
    }
    let check = values.pop()?;
    let weighted: usize = values[0]
        + values
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, &v)| k * v)
            .sum::<usize>();
    if weighted % 103 != check {
        return Some(Err(()));
    }

    let text = translate(&values)?;
    if text.is_empty() {
        return None;
    }
    Some(Ok(DecodedSymbol::new(text, SymbolFormat::Code128)))
}

fn best_symbol(group: &[usize], allowed: &[usize]) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    for &value in allowed {
        let err = pattern_error(group, &PATTERNS[value]);
        if best.map_or(true, |(b, _)| err < b) {
            best = Some((err, value));
        }
    }
    let (err, value) = best?;
    (err <= MAX_PATTERN_ERROR).then_some(value)
}

fn best_any_symbol(group: &[usize]) -> Option<usize> {
    let all: Vec<usize> = (0..PATTERNS.len()).collect();
    best_symbol(group, &all)
}

#[derive(Clone, Copy, PartialEq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Expand symbol values (start code first, checksum already removed) into
/// text. Returns `None` for value sequences that are not well-formed.
fn translate(values: &[usize]) -> Option<String> {
    let mut set = match values[0] {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        START_C => CodeSet::C,
        _ => return None,
    };
    let mut out = String::new();
    let mut shift: Option<CodeSet> = None;
    for &v in &values[1..] {
        let effective = shift.take().unwrap_or(set);
        match effective {
            CodeSet::A | CodeSet::B => match v {
                0..=95 => {
                    let byte = if effective == CodeSet::A && v >= 64 {
                        (v - 64) as u8
                    } else {
                        (v + 32) as u8
                    };
                    out.push(char::from(byte));
                }
                // FNC2/FNC3 carry no payload
                96 | 97 => {}
                98 => {
                    shift = Some(if effective == CodeSet::A {
                        CodeSet::B
                    } else {
                        CodeSet::A
                    });
                }
                99 => set = CodeSet::C,
                100 => {
                    if effective == CodeSet::A {
                        set = CodeSet::B;
                    }
                    // in B this is FNC4, no payload
                }
                101 => {
                    if effective == CodeSet::B {
                        set = CodeSet::A;
                    }
                }
                // FNC1 (GS1 marker)
                102 => {}
                _ => return None,
            },
            CodeSet::C => match v {
                0..=99 => {
                    out.push(char::from(b'0' + (v / 10) as u8));
                    out.push(char::from(b'0' + (v % 10) as u8));
                }
                100 => set = CodeSet::B,
                101 => set = CodeSet::A,
                102 => {}
                _ => return None,
            },
        }
    }
    Some(out)
}

// ============================================================================
// Synthetic fixtures
// ============================================================================

/// Symbol values (start code first, checksum appended) for a text payload
#[cfg(test)]
pub(super) fn encode_values(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let all_digits = bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes.iter().all(u8::is_ascii_digit);
    let mut values = if all_digits {
        let mut v = vec![START_C];
        for pair in bytes.chunks(2) {
            v.push(usize::from(pair[0] - b'0') * 10 + usize::from(pair[1] - b'0'));
        }
        v
    } else {
        let mut v = vec![START_B];
        for &b in bytes {
            assert!((32..=127).contains(&b), "byte {b} not encodable in set B");
            v.push(usize::from(b - 32));
        }
        v
    };
    let weighted: usize = values[0]
        + values
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, &v)| k * v)
            .sum::<usize>();
    values.push(weighted % 103);
    values
}

/// Render symbol values (with checksum, without stop) into a pixel row
#[cfg(test)]
pub(super) fn render_values(
    values: &[usize],
    unit_px: usize,
    height: usize,
) -> crate::models::PixelBuffer {
    let mut modules = Vec::new();
    for &v in values {
        for (k, &w) in PATTERNS[v].iter().enumerate() {
            modules.extend(std::iter::repeat(k % 2 == 0).take(w));
        }
    }
    for (k, &w) in STOP.iter().enumerate() {
        modules.extend(std::iter::repeat(k % 2 == 0).take(w));
    }
    super::one_d::bars_to_buffer(&modules, unit_px, height, 10)
}

#[cfg(test)]
pub(super) fn synthesize(text: &str, unit_px: usize, height: usize) -> crate::models::PixelBuffer {
    render_values(&encode_values(text), unit_px, height)
}
