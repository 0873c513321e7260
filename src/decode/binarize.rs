//! Luminance conversion and binarization
//!
//! Separates symbol modules from background before localization. The
//! threshold is a local adaptive mean computed over an integral image,
//! which holds up under uneven lighting where a single global threshold
//! does not. All arithmetic is integer, so the pass is reproducible
//! bit-for-bit for identical input samples.

/// Binary image, `true` = dark module candidate
#[derive(Debug, Clone)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl BitMatrix {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, dark: bool) {
        self.bits[y * self.width + x] = dark;
    }

    /// One row of bits as a slice
    pub fn row(&self, y: usize) -> &[bool] {
        let start = y * self.width;
        &self.bits[start..start + self.width]
    }
}

/// Fixed-point RGB weights for luminance (sums to 1000)
const LUMA_R: u32 = 299;
const LUMA_G: u32 = 587;
const LUMA_B: u32 = 114;

/// Collapse interleaved RGBA samples to one luminance byte per pixel
pub fn rgba_to_luminance(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .map(|px| {
            let weighted = LUMA_R * u32::from(px[0])
                + LUMA_G * u32::from(px[1])
                + LUMA_B * u32::from(px[2]);
            ((weighted + 500) / 1000) as u8
        })
        .collect()
}

/// Margin below the local mean required to call a pixel dark.
///
/// Keeps flat regions (no symbol at all) classified as background instead
/// of flickering on sensor noise.
const DARK_MARGIN: u64 = 6;

/// Threshold a luminance image into a [`BitMatrix`].
///
/// A pixel is dark when it sits at least [`DARK_MARGIN`] below the mean of
/// a window roughly 1/4 of the smaller image dimension across. Uniform
/// input therefore produces an all-light matrix.
pub fn threshold(width: usize, height: usize, luma: &[u8]) -> BitMatrix {
    debug_assert_eq!(luma.len(), width * height);

    // Integral image with a one-row/one-column zero border
    let iw = width + 1;
    let mut integral = vec![0u64; iw * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += u64::from(luma[y * width + x]);
            integral[(y + 1) * iw + (x + 1)] = integral[y * iw + (x + 1)] + row_sum;
        }
    }

    let radius = (width.min(height) / 8).max(15);
    let mut out = BitMatrix::new(width, height);
    for y in 0..height {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(height);
        for x in 0..width {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(width);
            let count = ((x1 - x0) * (y1 - y0)) as u64;
            let sum = integral[y1 * iw + x1] + integral[y0 * iw + x0]
                - integral[y0 * iw + x1]
                - integral[y1 * iw + x0];
            let pixel = u64::from(luma[y * width + x]);
            // pixel <= mean - DARK_MARGIN, kept in integer form
            out.set(x, y, (pixel + DARK_MARGIN) * count <= sum);
        }
    }
    out
}
