//! GF(256) arithmetic and Reed-Solomon error correction
//!
//! The field is GF(2^8) with reducing polynomial 0x11D and generator
//! alpha = 2, as used by QR codewords. Error magnitudes are recovered by
//! solving the syndrome equations directly, and every correction is
//! verified by re-computing the syndromes afterwards.

/// alpha^i for i in 0..510, doubled so products of logs need no modulo
const GF_EXP: [u8; 512] = build_exp();
/// log_alpha(v) for v in 1..=255; index 0 is unused
const GF_LOG: [u8; 256] = build_log();

const fn build_exp() -> [u8; 512] {
    let mut exp = [0u8; 512];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        exp[i + 255] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11D;
        }
        i += 1;
    }
    exp
}

const fn build_log() -> [u8; 256] {
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0u16;
    while i < 255 {
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11D;
        }
        i += 1;
    }
    log
}

pub(super) fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        0
    } else {
        GF_EXP[usize::from(GF_LOG[usize::from(a)]) + usize::from(GF_LOG[usize::from(b)])]
    }
}

/// Multiplicative inverse; `a` must be non-zero
pub(super) fn gf_inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0);
    GF_EXP[255 - usize::from(GF_LOG[usize::from(a)])]
}

pub(super) fn gf_div(a: u8, b: u8) -> u8 {
    gf_mul(a, gf_inv(b))
}

/// alpha^power
pub(super) fn alpha_pow(power: usize) -> u8 {
    GF_EXP[power % 255]
}

/// Evaluate a polynomial stored highest-degree-first at `x`
fn poly_eval(poly: &[u8], x: u8) -> u8 {
    poly.iter().fold(0, |acc, &c| gf_mul(acc, x) ^ c)
}

/// Evaluate a polynomial stored lowest-degree-first at `x`
fn poly_eval_low(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0, |acc, &c| gf_mul(acc, x) ^ c)
}

fn syndromes(msg: &[u8], nsym: usize) -> Vec<u8> {
    (0..nsym).map(|i| poly_eval(msg, alpha_pow(i))).collect()
}

/// Berlekamp-Massey: shortest LFSR (error locator, lowest-degree-first)
/// generating the syndrome sequence
fn error_locator(synd: &[u8]) -> Vec<u8> {
    let mut sigma = vec![1u8];
    let mut prev = vec![1u8];
    let mut l = 0usize;
    let mut shift = 1usize;
    let mut prev_delta = 1u8;
    for n in 0..synd.len() {
        let mut delta = synd[n];
        for i in 1..=l {
            if i < sigma.len() {
                delta ^= gf_mul(sigma[i], synd[n - i]);
            }
        }
        if delta == 0 {
            shift += 1;
        } else if 2 * l <= n {
            let kept = sigma.clone();
            sigma = poly_sub_scaled_shifted(&sigma, &prev, gf_div(delta, prev_delta), shift);
            l = n + 1 - l;
            prev = kept;
            prev_delta = delta;
            shift = 1;
        } else {
            sigma = poly_sub_scaled_shifted(&sigma, &prev, gf_div(delta, prev_delta), shift);
            shift += 1;
        }
    }
    while sigma.len() > 1 && sigma.last() == Some(&0) {
        sigma.pop();
    }
    sigma
}

/// `a(x) + coef * x^shift * b(x)`, lowest-degree-first (addition is XOR)
fn poly_sub_scaled_shifted(a: &[u8], b: &[u8], coef: u8, shift: usize) -> Vec<u8> {
    let mut out = vec![0u8; a.len().max(b.len() + shift)];
    out[..a.len()].copy_from_slice(a);
    for (i, &bc) in b.iter().enumerate() {
        out[i + shift] ^= gf_mul(coef, bc);
    }
    out
}

/// Correct up to `nsym / 2` byte errors in `msg` (data plus parity).
///
/// Returns the number of corrected errors, or `Err(())` when the block is
/// beyond repair.
pub(super) fn rs_correct(msg: &mut [u8], nsym: usize) -> Result<usize, ()> {
    let synd = syndromes(msg, nsym);
    if synd.iter().all(|&s| s == 0) {
        return Ok(0);
    }

    let sigma = error_locator(&synd);
    let errors = sigma.len() - 1;
    if errors == 0 || 2 * errors > nsym {
        return Err(());
    }

    // Chien search: positions whose inverse locations root the locator
    let n = msg.len();
    let mut powers = Vec::new();
    for p in 0..n {
        if poly_eval_low(&sigma, gf_inv(alpha_pow(p))) == 0 {
            powers.push(p);
        }
    }
    if powers.len() != errors {
        return Err(());
    }

    // Magnitudes from the syndrome equations: sum_j e_j * X_j^i = S_i
    let mut matrix = vec![vec![0u8; errors]; errors];
    let mut rhs = vec![0u8; errors];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, &p) in powers.iter().enumerate() {
            row[j] = alpha_pow(p * i % 255);
        }
        rhs[i] = synd[i];
    }
    let magnitudes = solve(&mut matrix, &mut rhs).ok_or(())?;

    for (&p, &e) in powers.iter().zip(&magnitudes) {
        msg[n - 1 - p] ^= e;
    }

    // A miscorrection leaves residual syndromes
    if syndromes(msg, nsym).iter().any(|&s| s != 0) {
        return Err(());
    }
    Ok(errors)
}

/// Gaussian elimination over GF(256); consumes its inputs
fn solve(matrix: &mut [Vec<u8>], rhs: &mut [u8]) -> Option<Vec<u8>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n).find(|&r| matrix[r][col] != 0)?;
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);
        let inv = gf_inv(matrix[col][col]);
        for c in col..n {
            let cell = matrix[col][c];
            matrix[col][c] = gf_mul(cell, inv);
        }
        rhs[col] = gf_mul(rhs[col], inv);
        let pivot_row = matrix[col].clone();
        let pivot_rhs = rhs[col];
        for r in 0..n {
            if r != col && matrix[r][col] != 0 {
                let factor = matrix[r][col];
                for c in col..n {
                    matrix[r][c] ^= gf_mul(factor, pivot_row[c]);
                }
                rhs[r] ^= gf_mul(factor, pivot_rhs);
            }
        }
    }
    Some(rhs.to_vec())
}

/// Append `nsym` Reed-Solomon parity bytes to a message, for synthetic
/// symbol fixtures.
#[cfg(test)]
pub(super) fn rs_encode(data: &[u8], nsym: usize) -> Vec<u8> {
    // Generator: product of (x - alpha^i) for i in 0..nsym, highest-first
    let mut gen = vec![1u8];
    for i in 0..nsym {
        let mut next = vec![0u8; gen.len() + 1];
        for (k, &g) in gen.iter().enumerate() {
            next[k] ^= g;
            next[k + 1] ^= gf_mul(g, alpha_pow(i));
        }
        gen = next;
    }

    // Long division of data * x^nsym by the generator
    let mut work = data.to_vec();
    work.extend(std::iter::repeat(0).take(nsym));
    for i in 0..data.len() {
        let factor = work[i];
        if factor != 0 {
            for (k, &g) in gen.iter().enumerate().skip(1) {
                work[i + k] ^= gf_mul(factor, g);
            }
        }
    }

    let mut out = data.to_vec();
    out.extend_from_slice(&work[data.len()..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_basics() {
        assert_eq!(gf_mul(0, 17), 0);
        assert_eq!(gf_mul(1, 17), 17);
        // alpha^8 = 0x11D truncated
        assert_eq!(alpha_pow(8), 0x1D);
        for a in 1..=255u8 {
            assert_eq!(gf_mul(a, gf_inv(a)), 1);
        }
    }

    #[test]
    fn test_encoded_block_has_zero_syndromes() {
        let data: Vec<u8> = (0..19).map(|i| (i * 7 + 3) as u8).collect();
        let block = rs_encode(&data, 7);
        assert_eq!(block.len(), 26);
        assert!(syndromes(&block, 7).iter().all(|&s| s == 0));
    }

    #[test]
    fn test_corrects_up_to_capacity() {
        let data: Vec<u8> = (0..16).map(|i| (i * 13 + 1) as u8).collect();
        let clean = rs_encode(&data, 10);
        for positions in [vec![0], vec![3, 20], vec![1, 9, 15], vec![0, 5, 12, 25]] {
            let mut block = clean.clone();
            for &p in &positions {
                block[p] ^= 0x5A;
            }
            let corrected = rs_correct(&mut block, 10).expect("within capacity");
            assert_eq!(corrected, positions.len());
            assert_eq!(block, clean);
        }
    }

    #[test]
    fn test_rejects_beyond_capacity() {
        let data: Vec<u8> = (0..16).map(|i| (i * 11) as u8).collect();
        let clean = rs_encode(&data, 10);
        let mut block = clean.clone();
        for p in 0..6 {
            block[p] ^= 0xA7;
        }
        assert!(rs_correct(&mut block, 10).is_err());
    }
}
