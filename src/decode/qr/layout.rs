//! QR symbol layout
//!
//! Per-version geometry and codeword structure: function-module map,
//! alignment pattern placement, error-correction block shapes, and the
//! zigzag order in which data modules are laid out.

use super::format::EcLevel;

/// Highest symbol version this decoder handles
pub(super) const MAX_VERSION: usize = 10;

pub(super) fn dimension(version: usize) -> usize {
    17 + 4 * version
}

/// Alignment pattern center coordinates (versions 2+)
pub(super) fn alignment_centers(version: usize) -> &'static [usize] {
    const CENTERS: [&[usize]; 10] = [
        &[],
        &[6, 18],
        &[6, 22],
        &[6, 26],
        &[6, 30],
        &[6, 34],
        &[6, 22, 38],
        &[6, 24, 42],
        &[6, 26, 46],
        &[6, 28, 50],
    ];
    CENTERS[version - 1]
}

/// Codewords in the whole symbol, data plus parity
pub(super) fn total_codewords(version: usize) -> usize {
    const TOTALS: [usize; 10] = [26, 44, 70, 100, 134, 172, 196, 242, 292, 346];
    TOTALS[version - 1]
}

/// Error-correction block structure for one version/level pair
#[derive(Debug, Clone, Copy)]
pub(super) struct EcBlocks {
    /// Parity codewords in every block
    pub(super) ec_per_block: usize,
    /// (block count, data codewords per block) groups
    pub(super) groups: &'static [(usize, usize)],
}

impl EcBlocks {
    pub(super) fn data_codewords(&self) -> usize {
        self.groups.iter().map(|&(count, len)| count * len).sum()
    }

    pub(super) fn block_count(&self) -> usize {
        self.groups.iter().map(|&(count, _)| count).sum()
    }
}

pub(super) fn ec_blocks(version: usize, level: EcLevel) -> EcBlocks {
    let (ec_per_block, groups): (usize, &'static [(usize, usize)]) = match (version, level) {
        (1, EcLevel::L) => (7, &[(1, 19)]),
        (1, EcLevel::M) => (10, &[(1, 16)]),
        (1, EcLevel::Q) => (13, &[(1, 13)]),
        (1, EcLevel::H) => (17, &[(1, 9)]),
        (2, EcLevel::L) => (10, &[(1, 34)]),
        (2, EcLevel::M) => (16, &[(1, 28)]),
        (2, EcLevel::Q) => (22, &[(1, 22)]),
        (2, EcLevel::H) => (28, &[(1, 16)]),
        (3, EcLevel::L) => (15, &[(1, 55)]),
        (3, EcLevel::M) => (26, &[(1, 44)]),
        (3, EcLevel::Q) => (18, &[(2, 17)]),
        (3, EcLevel::H) => (22, &[(2, 13)]),
        (4, EcLevel::L) => (20, &[(1, 80)]),
        (4, EcLevel::M) => (18, &[(2, 32)]),
        (4, EcLevel::Q) => (26, &[(2, 24)]),
        (4, EcLevel::H) => (16, &[(4, 9)]),
        (5, EcLevel::L) => (26, &[(1, 108)]),
        (5, EcLevel::M) => (24, &[(2, 43)]),
        (5, EcLevel::Q) => (18, &[(2, 15), (2, 16)]),
        (5, EcLevel::H) => (22, &[(2, 11), (2, 12)]),
        (6, EcLevel::L) => (18, &[(2, 68)]),
        (6, EcLevel::M) => (16, &[(4, 27)]),
        (6, EcLevel::Q) => (24, &[(4, 19)]),
        (6, EcLevel::H) => (28, &[(4, 15)]),
        (7, EcLevel::L) => (20, &[(2, 78)]),
        (7, EcLevel::M) => (18, &[(4, 31)]),
        (7, EcLevel::Q) => (18, &[(2, 14), (4, 15)]),
        (7, EcLevel::H) => (26, &[(4, 13), (1, 14)]),
        (8, EcLevel::L) => (24, &[(2, 97)]),
        (8, EcLevel::M) => (22, &[(2, 38), (2, 39)]),
        (8, EcLevel::Q) => (22, &[(4, 18), (2, 19)]),
        (8, EcLevel::H) => (26, &[(4, 14), (2, 15)]),
        (9, EcLevel::L) => (30, &[(2, 116)]),
        (9, EcLevel::M) => (22, &[(3, 36), (2, 37)]),
        (9, EcLevel::Q) => (20, &[(4, 16), (4, 17)]),
        (9, EcLevel::H) => (24, &[(4, 12), (4, 13)]),
        (10, EcLevel::L) => (18, &[(2, 68), (2, 69)]),
        (10, EcLevel::M) => (26, &[(4, 43), (1, 44)]),
        (10, EcLevel::Q) => (24, &[(6, 19), (2, 20)]),
        (10, EcLevel::H) => (28, &[(6, 15), (2, 16)]),
        _ => unreachable!("version out of supported range"),
    };
    EcBlocks {
        ec_per_block,
        groups,
    }
}

/// Format info module positions as (col, row), bit index = list index.
///
/// The first copy wraps the top-left finder; the second is split between
/// the bottom-left column and top-right row. Both copies carry the same
/// word and either suffices.
pub(super) fn format_positions(dim: usize) -> ([(usize, usize); 15], [(usize, usize); 15]) {
    let mut main = [(0usize, 0usize); 15];
    for (i, slot) in main.iter_mut().enumerate() {
        *slot = match i {
            0..=5 => (i, 8),
            6 => (7, 8),
            7 => (8, 8),
            8 => (8, 7),
            _ => (8, 14 - i),
        };
    }
    let mut second = [(0usize, 0usize); 15];
    for (i, slot) in second.iter_mut().enumerate() {
        *slot = if i <= 6 {
            (8, dim - 1 - i)
        } else {
            (dim - 15 + i, 8)
        };
    }
    (main, second)
}

/// Map of reserved (non-data) modules, row-major `dim * dim`
pub(super) fn function_map(version: usize) -> Vec<bool> {
    let dim = dimension(version);
    let mut map = vec![false; dim * dim];
    let mut mark = |x: usize, y: usize| map[y * dim + x] = true;

    for y in 0..dim {
        for x in 0..dim {
            // Finder patterns with separators and adjacent format areas
            let corner =
                (x < 9 && y < 9) || (x >= dim - 8 && y < 9) || (x < 9 && y >= dim - 8);
            // Timing patterns
            let timing = x == 6 || y == 6;
            if corner || timing {
                mark(x, y);
            }
        }
    }

    let centers = alignment_centers(version);
    for &cy in centers {
        for &cx in centers {
            if in_finder_corner(cx, cy, dim) {
                continue;
            }
            for y in cy - 2..=cy + 2 {
                for x in cx - 2..=cx + 2 {
                    mark(x, y);
                }
            }
        }
    }

    // Version info blocks exist from version 7 up
    if version >= 7 {
        for a in 0..6 {
            for b in dim - 11..dim - 8 {
                mark(a, b);
                mark(b, a);
            }
        }
    }

    map
}

pub(super) fn in_finder_corner(cx: usize, cy: usize, dim: usize) -> bool {
    (cx < 9 && cy < 9) || (cx >= dim - 9 && cy < 9) || (cx < 9 && cy >= dim - 9)
}

/// All data module positions as (col, row) in placement order: column
/// pairs right to left, alternating upward and downward, skipping the
/// vertical timing column.
pub(super) fn data_coordinates(version: usize) -> Vec<(usize, usize)> {
    let dim = dimension(version);
    let map = function_map(version);
    let mut out = Vec::new();
    let mut col = dim as i32 - 1;
    let mut upward = true;
    while col > 0 {
        if col == 6 {
            col -= 1;
        }
        let rows: Vec<usize> = if upward {
            (0..dim).rev().collect()
        } else {
            (0..dim).collect()
        };
        for y in rows {
            for dx in 0..2 {
                let x = (col - dx) as usize;
                if !map[y * dim + x] {
                    out.push((x, y));
                }
            }
        }
        upward = !upward;
        col -= 2;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_totals_are_consistent() {
        for version in 1..=MAX_VERSION {
            for level in EcLevel::ALL {
                let blocks = ec_blocks(version, level);
                let total =
                    blocks.data_codewords() + blocks.block_count() * blocks.ec_per_block;
                assert_eq!(total, total_codewords(version), "v{version} {level:?}");
            }
        }
    }

    #[test]
    fn test_data_module_counts() {
        // Codeword bits plus the version's remainder bits
        assert_eq!(data_coordinates(1).len(), 26 * 8);
        assert_eq!(data_coordinates(2).len(), 44 * 8 + 7);
        assert_eq!(data_coordinates(3).len(), 70 * 8 + 7);
        assert_eq!(data_coordinates(7).len(), 196 * 8);
    }

    #[test]
    fn test_format_positions_are_reserved() {
        for version in [1, 2, 7] {
            let dim = dimension(version);
            let map = function_map(version);
            let (main, second) = format_positions(dim);
            for (x, y) in main.iter().chain(second.iter()) {
                assert!(map[y * dim + x], "({x},{y}) must be reserved in v{version}");
            }
        }
    }

    #[test]
    fn test_alignment_skips_finder_corners() {
        // Version 2 has exactly one alignment pattern, at (18, 18)
        let map = function_map(2);
        let dim = dimension(2);
        assert!(map[18 * dim + 18]);
        assert!(!map[18 * dim + 12]);
    }
}
