//! Pixel buffer model
//!
//! Raw image samples handed to the symbol decoder. The buffer is a plain
//! value; validation of the sample length against the declared dimensions
//! happens at decode time.

use serde::{Deserialize, Serialize};

/// An immutable buffer of image samples.
///
/// `samples` holds either one luminance byte per pixel (`width * height`
/// bytes) or interleaved RGBA (`width * height * 4` bytes). Any other
/// length is rejected by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples without validating them
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Self {
        Self {
            width,
            height,
            samples,
        }
    }

    /// Build a luminance buffer from a decoded image file
    pub fn from_image(img: &image::DynamicImage) -> Self {
        let gray = img.to_luma8();
        let (width, height) = gray.dimensions();
        Self::new(width, height, gray.into_raw())
    }

    /// Number of pixels declared by the dimensions
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the sample length matches a single-channel layout
    pub fn is_grayscale(&self) -> bool {
        self.samples.len() == self.pixel_count()
    }

    /// True when the sample length matches an interleaved RGBA layout
    pub fn is_rgba(&self) -> bool {
        self.samples.len() == self.pixel_count() * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_detection() {
        let gray = PixelBuffer::new(4, 3, vec![0; 12]);
        assert!(gray.is_grayscale());
        assert!(!gray.is_rgba());

        let rgba = PixelBuffer::new(4, 3, vec![0; 48]);
        assert!(rgba.is_rgba());
        assert!(!rgba.is_grayscale());

        let bad = PixelBuffer::new(4, 3, vec![0; 13]);
        assert!(!bad.is_grayscale());
        assert!(!bad.is_rgba());
    }

    #[test]
    fn test_from_image_uses_luminance_layout() {
        let img = image::DynamicImage::new_rgb8(5, 4);
        let buffer = PixelBuffer::from_image(&img);
        assert_eq!(buffer.width, 5);
        assert_eq!(buffer.height, 4);
        assert!(buffer.is_grayscale());
    }
}
