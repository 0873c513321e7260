//! QR symbol detection and decoding
//!
//! Pipeline: locate three finder patterns, fix the symbol's orientation
//! and dimension from their geometry, sample the module grid through an
//! affine map, then read format info, unmask, deinterleave codeword
//! blocks, correct each with Reed-Solomon, and decode the data segments.
//!
//! Flat, axis-affine symbols (any rotation, uniform scale, mild shear)
//! are handled; strong perspective distortion is not.

mod codec;
mod finder;
mod format;
mod galois;
mod layout;
#[cfg(test)]
pub(super) mod testgen;

use tracing::debug;

use super::binarize::BitMatrix;
use super::DecodeError;
use crate::models::{DecodedSymbol, SymbolFormat};
use finder::FinderPattern;

/// Attempt to find and decode one QR symbol in the binarized image
pub(super) fn detect(matrix: &BitMatrix) -> Result<DecodedSymbol, DecodeError> {
    let mut candidates = finder::find(matrix);
    // A real finder is crossed by several scan rows; one-off hits are noise
    candidates.retain(|c| c.hits >= 2);
    if candidates.len() < 3 {
        return Err(DecodeError::NoSymbolFound);
    }
    candidates.sort_by(|a, b| b.hits.cmp(&a.hits));
    candidates.truncate(3);

    let (tl, tr, bl) = order_corners(candidates[0], candidates[1], candidates[2]);
    let module = (tl.module + tr.module + bl.module) / 3.0;
    if module <= 0.0 {
        return Err(DecodeError::NoSymbolFound);
    }

    let top = distance(&tl, &tr) / module;
    let side = distance(&tl, &bl) / module;
    let mut dim = ((top + side) / 2.0).round() as i64 + 7;
    match dim % 4 {
        0 => dim += 1,
        2 => dim -= 1,
        3 => return Err(DecodeError::NoSymbolFound),
        _ => {}
    }
    if dim < 21 {
        return Err(DecodeError::NoSymbolFound);
    }
    let dim = dim as usize;
    let version = (dim - 17) / 4;
    if version > layout::MAX_VERSION {
        debug!("QR version {version} beyond supported range");
        return Err(DecodeError::UnsupportedFormat);
    }

    let grid = sample_grid(matrix, &tl, &tr, &bl, dim).ok_or(DecodeError::NoSymbolFound)?;
    decode_matrix(&grid, version)
}

fn distance(a: &FinderPattern, b: &FinderPattern) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Identify which candidate is which corner.
///
/// The top-right and bottom-left finders are the farthest-apart pair; the
/// cross product then disambiguates them so the grid axes come out
/// right-handed in image space.
fn order_corners(
    a: FinderPattern,
    b: FinderPattern,
    c: FinderPattern,
) -> (FinderPattern, FinderPattern, FinderPattern) {
    let ab = distance(&a, &b);
    let ac = distance(&a, &c);
    let bc = distance(&b, &c);
    let (tl, p, q) = if ab >= ac && ab >= bc {
        (c, a, b)
    } else if ac >= ab && ac >= bc {
        (b, a, c)
    } else {
        (a, b, c)
    };
    let cross = (p.x - tl.x) * (q.y - tl.y) - (p.y - tl.y) * (q.x - tl.x);
    if cross > 0.0 {
        (tl, p, q)
    } else {
        (tl, q, p)
    }
}

/// Sample the module grid by interpolating between the finder centers,
/// which sit at module coordinates (3, 3), (dim-4, 3), and (3, dim-4).
fn sample_grid(
    matrix: &BitMatrix,
    tl: &FinderPattern,
    tr: &FinderPattern,
    bl: &FinderPattern,
    dim: usize,
) -> Option<BitMatrix> {
    let span = (dim - 7) as f64;
    let ex = ((tr.x - tl.x) / span, (tr.y - tl.y) / span);
    let ey = ((bl.x - tl.x) / span, (bl.y - tl.y) / span);

    let mut grid = BitMatrix::new(dim, dim);
    for j in 0..dim {
        for i in 0..dim {
            let u = i as f64 - 3.0;
            let v = j as f64 - 3.0;
            let x = tl.x + u * ex.0 + v * ey.0;
            let y = tl.y + u * ex.1 + v * ey.1;
            let xi = x.round();
            let yi = y.round();
            if xi < 0.0
                || yi < 0.0
                || xi >= matrix.width() as f64
                || yi >= matrix.height() as f64
            {
                return None;
            }
            grid.set(i, j, matrix.get(xi as usize, yi as usize));
        }
    }
    Some(grid)
}

/// Decode a sampled module grid
fn decode_matrix(grid: &BitMatrix, version: usize) -> Result<DecodedSymbol, DecodeError> {
    let dim = layout::dimension(version);
    debug_assert_eq!(grid.width(), dim);

    let (main, second) = layout::format_positions(dim);
    let read_raw = |positions: &[(usize, usize); 15]| -> u32 {
        positions
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &(x, y))| {
                acc | (u32::from(grid.get(x, y)) << i)
            })
    };
    let info = format::decode_format(read_raw(&main))
        .or_else(|| format::decode_format(read_raw(&second)))
        .ok_or(DecodeError::ChecksumMismatch)?;

    // Unmask and collect codewords in placement order
    let coords = layout::data_coordinates(version);
    let total = layout::total_codewords(version);
    debug_assert!(coords.len() >= total * 8);
    let mut codewords = vec![0u8; total];
    for (bit_index, &(x, y)) in coords.iter().take(total * 8).enumerate() {
        let bit = grid.get(x, y) ^ format::mask_bit(info.mask, y, x);
        if bit {
            codewords[bit_index / 8] |= 0x80 >> (bit_index % 8);
        }
    }

    let blocks = layout::ec_blocks(version, info.ec);
    let data = correct_blocks(&codewords, &blocks)?;
    let text = codec::decode_payload(&data, version)?;
    Ok(DecodedSymbol::new(text, SymbolFormat::Qr))
}

/// Undo block interleaving and Reed-Solomon-correct each block,
/// returning the concatenated data codewords
fn correct_blocks(codewords: &[u8], blocks: &layout::EcBlocks) -> Result<Vec<u8>, DecodeError> {
    let sizes: Vec<usize> = blocks
        .groups
        .iter()
        .flat_map(|&(count, len)| std::iter::repeat(len).take(count))
        .collect();
    let max_len = sizes.iter().copied().max().unwrap_or(0);

    let mut data_blocks: Vec<Vec<u8>> = sizes.iter().map(|&n| Vec::with_capacity(n)).collect();
    let mut iter = codewords.iter().copied();
    for i in 0..max_len {
        for (bi, &len) in sizes.iter().enumerate() {
            if i < len {
                data_blocks[bi].push(iter.next().ok_or(DecodeError::ChecksumMismatch)?);
            }
        }
    }
    let mut ec_blocks: Vec<Vec<u8>> = sizes
        .iter()
        .map(|_| Vec::with_capacity(blocks.ec_per_block))
        .collect();
    for _ in 0..blocks.ec_per_block {
        for block in ec_blocks.iter_mut() {
            block.push(iter.next().ok_or(DecodeError::ChecksumMismatch)?);
        }
    }

    let mut out = Vec::with_capacity(blocks.data_codewords());
    for (data, ec) in data_blocks.into_iter().zip(ec_blocks) {
        let data_len = data.len();
        let mut block = data;
        block.extend(ec);
        match galois::rs_correct(&mut block, blocks.ec_per_block) {
            Ok(corrected) => {
                if corrected > 0 {
                    debug!("corrected {corrected} codeword errors in block");
                }
            }
            Err(()) => return Err(DecodeError::ChecksumMismatch),
        }
        out.extend_from_slice(&block[..data_len]);
    }
    Ok(out)
}
