//! Synthetic QR fixtures
//!
//! Builds complete byte-mode symbols for round-trip tests, sharing the
//! layout, format, and Galois primitives with the decoder so fixtures and
//! decoding can never drift apart.

use super::format::{self, EcLevel};
use super::galois;
use super::layout;
use crate::decode::binarize::BitMatrix;
use crate::models::PixelBuffer;

/// Encode `text` as a byte-mode symbol and render it with a 4-module
/// quiet zone.
pub(crate) fn make_qr(
    text: &str,
    version: usize,
    ec: EcLevel,
    mask: u8,
    module_px: usize,
) -> PixelBuffer {
    render(&encode_matrix(text, version, ec, mask), module_px, 4)
}

fn push_bits(bits: &mut Vec<bool>, value: u32, count: usize) {
    for i in (0..count).rev() {
        bits.push((value >> i) & 1 == 1);
    }
}

/// Build the module matrix for a byte-mode payload
pub(crate) fn encode_matrix(text: &str, version: usize, ec: EcLevel, mask: u8) -> BitMatrix {
    let dim = layout::dimension(version);
    let blocks = layout::ec_blocks(version, ec);
    let data_capacity = blocks.data_codewords();

    // Data bitstream: mode, length, payload, terminator, byte padding
    let bytes = text.as_bytes();
    let count_bits = if version <= 9 { 8 } else { 16 };
    let mut bits = Vec::new();
    push_bits(&mut bits, 0b0100, 4);
    push_bits(&mut bits, bytes.len() as u32, count_bits);
    for &b in bytes {
        push_bits(&mut bits, u32::from(b), 8);
    }
    assert!(
        bits.len() <= data_capacity * 8,
        "payload too long for version {version}"
    );
    let terminator = (data_capacity * 8 - bits.len()).min(4);
    push_bits(&mut bits, 0, terminator);
    while bits.len() % 8 != 0 {
        bits.push(false);
    }
    let mut data: Vec<u8> = bits
        .chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | u8::from(b)))
        .collect();
    let mut pad = [0xECu8, 0x11].iter().copied().cycle();
    while data.len() < data_capacity {
        data.push(pad.next().expect("cycle never ends"));
    }

    // Split into RS blocks, then interleave data and parity column-wise
    let sizes: Vec<usize> = blocks
        .groups
        .iter()
        .flat_map(|&(count, len)| std::iter::repeat(len).take(count))
        .collect();
    let mut block_data = Vec::new();
    let mut block_ec = Vec::new();
    let mut offset = 0;
    for &len in &sizes {
        let chunk = &data[offset..offset + len];
        offset += len;
        let full = galois::rs_encode(chunk, blocks.ec_per_block);
        block_data.push(chunk.to_vec());
        block_ec.push(full[len..].to_vec());
    }
    let max_len = sizes.iter().copied().max().unwrap_or(0);
    let mut codewords = Vec::with_capacity(layout::total_codewords(version));
    for i in 0..max_len {
        for block in &block_data {
            if i < block.len() {
                codewords.push(block[i]);
            }
        }
    }
    for i in 0..blocks.ec_per_block {
        for block in &block_ec {
            codewords.push(block[i]);
        }
    }
    debug_assert_eq!(codewords.len(), layout::total_codewords(version));

    // Function patterns
    let mut matrix = BitMatrix::new(dim, dim);
    paint_finder(&mut matrix, 0, 0);
    paint_finder(&mut matrix, dim - 7, 0);
    paint_finder(&mut matrix, 0, dim - 7);
    for k in 8..dim - 8 {
        matrix.set(k, 6, k % 2 == 0);
        matrix.set(6, k, k % 2 == 0);
    }
    let centers = layout::alignment_centers(version);
    for &cy in centers {
        for &cx in centers {
            if layout::in_finder_corner(cx, cy, dim) {
                continue;
            }
            paint_alignment(&mut matrix, cx, cy);
        }
    }
    matrix.set(8, dim - 8, true);

    // Format info, both copies
    let word = format::encode_format(ec, mask);
    let (main, second) = layout::format_positions(dim);
    for (i, &(x, y)) in main.iter().enumerate() {
        matrix.set(x, y, (word >> i) & 1 == 1);
    }
    for (i, &(x, y)) in second.iter().enumerate() {
        matrix.set(x, y, (word >> i) & 1 == 1);
    }

    // Data modules in placement order, masked; remainder bits are zero
    let coords = layout::data_coordinates(version);
    for (idx, &(x, y)) in coords.iter().enumerate() {
        let bit = if idx < codewords.len() * 8 {
            (codewords[idx / 8] >> (7 - idx % 8)) & 1 == 1
        } else {
            false
        };
        matrix.set(x, y, bit ^ format::mask_bit(mask, y, x));
    }

    matrix
}

fn paint_finder(matrix: &mut BitMatrix, x0: usize, y0: usize) {
    for my in 0..7 {
        for mx in 0..7 {
            let ring = (1..=5).contains(&mx) && (1..=5).contains(&my);
            let core = (2..=4).contains(&mx) && (2..=4).contains(&my);
            matrix.set(x0 + mx, y0 + my, !ring || core);
        }
    }
}

fn paint_alignment(matrix: &mut BitMatrix, cx: usize, cy: usize) {
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let dark = dx.abs() == 2 || dy.abs() == 2 || (dx == 0 && dy == 0);
            matrix.set(
                (cx as i32 + dx) as usize,
                (cy as i32 + dy) as usize,
                dark,
            );
        }
    }
}

/// Blow a module matrix up into a luminance pixel buffer
pub(crate) fn render(matrix: &BitMatrix, module_px: usize, quiet_modules: usize) -> PixelBuffer {
    let dim = matrix.width();
    let size = (dim + 2 * quiet_modules) * module_px;
    let mut samples = vec![255u8; size * size];
    for j in 0..dim {
        for i in 0..dim {
            if !matrix.get(i, j) {
                continue;
            }
            let x0 = (quiet_modules + i) * module_px;
            let y0 = (quiet_modules + j) * module_px;
            for y in y0..y0 + module_px {
                for x in x0..x0 + module_px {
                    samples[y * size + x] = 0;
                }
            }
        }
    }
    PixelBuffer::new(size as u32, size as u32, samples)
}
