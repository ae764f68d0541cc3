//! Image preprocessing into the network's input tensor.
//!
//! The transform chain must match the one used at training time:
//! RGB conversion, direct (non aspect-preserving) resize to a square,
//! scaling to `[0, 1]` in channel-first layout, then per-channel
//! normalization with the `ImageNet` statistics.

use crate::constants::normalization::{MEAN, STD};
use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

/// Number of color channels fed to the network.
pub const CHANNELS: usize = 3;

/// Normalized `[1, 3, size, size]` input tensor in channel-first order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
    size: u32,
}

impl ImageTensor {
    /// All-zero tensor, used for the warm-up pass at load time.
    pub fn zeros(size: u32) -> Self {
        let edge = size as usize;
        Self {
            data: vec![0.0; CHANNELS * edge * edge],
            size,
        }
    }

    /// Edge length of the square image plane.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Tensor shape with a leading batch dimension of one.
    pub fn shape(&self) -> [usize; 4] {
        let edge = self.size as usize;
        [1, CHANNELS, edge, edge]
    }

    /// Flat channel-first values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at `(channel, y, x)`.
    pub fn at(&self, channel: usize, y: usize, x: usize) -> Option<f32> {
        let edge = self.size as usize;
        if channel >= CHANNELS || y >= edge || x >= edge {
            return None;
        }
        self.data.get(channel * edge * edge + y * edge + x).copied()
    }
}

/// Deterministic image-to-tensor transform for a fixed input size.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    size: u32,
}

impl Preprocessor {
    /// Create a preprocessor producing `size` x `size` tensors.
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    /// Target edge length.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Decode uploaded bytes in any supported format.
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| Error::ImageDecode { source: e })
    }

    /// Transform a decoded image into a normalized tensor.
    pub fn process(&self, image: &DynamicImage) -> ImageTensor {
        let rgb = image.to_rgb8();
        let resized = self.resize(&rgb);
        to_normalized_chw(&resized, self.size)
    }

    fn resize(&self, rgb: &RgbImage) -> RgbImage {
        if rgb.width() == self.size && rgb.height() == self.size {
            return rgb.clone();
        }
        // Bilinear, stretching to the square without cropping
        imageops::resize(rgb, self.size, self.size, FilterType::Triangle)
    }
}

fn to_normalized_chw(rgb: &RgbImage, size: u32) -> ImageTensor {
    let edge = size as usize;
    let plane = edge * edge;
    let mut data = vec![0.0_f32; CHANNELS * plane];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let offset = y as usize * edge + x as usize;
        for channel in 0..CHANNELS {
            let scaled = f32::from(pixel[channel]) / 255.0;
            data[channel * plane + offset] = (scaled - MEAN[channel]) / STD[channel];
        }
    }

    ImageTensor { data, size }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma, Rgb, RgbaImage};
    use std::io::Cursor;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_stretches_non_square_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1000, 500));
        let tensor = Preprocessor::new(224).process(&image);

        assert_eq!(tensor.shape(), [1, 3, 224, 224]);
        assert_eq!(tensor.data().len(), 224 * 224 * 3);
    }

    #[test]
    fn test_custom_image_size() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(40, 90));
        let tensor = Preprocessor::new(32).process(&image);
        assert_eq!(tensor.shape(), [1, 3, 32, 32]);
    }

    #[test]
    fn test_normalization_uses_imagenet_statistics() {
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        let black = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])));
        let preprocessor = Preprocessor::new(8);

        let white = preprocessor.process(&white);
        let black = preprocessor.process(&black);

        let expected_white = [
            (1.0 - 0.485) / 0.229,
            (1.0 - 0.456) / 0.224,
            (1.0 - 0.406) / 0.225,
        ];
        let expected_black = [-0.485 / 0.229, -0.456 / 0.224, -0.406 / 0.225];

        for channel in 0..CHANNELS {
            assert!((white.at(channel, 3, 5).unwrap() - expected_white[channel]).abs() < EPSILON);
            assert!((black.at(channel, 0, 0).unwrap() - expected_black[channel]).abs() < EPSILON);
        }
    }

    #[test]
    fn test_channel_first_layout() {
        // Pure red: only the first plane is above its black level
        let red = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])));
        let tensor = Preprocessor::new(4).process(&red);

        let plane = 16;
        assert!(tensor.data()[..plane].iter().all(|v| *v > 2.0));
        assert!(tensor.data()[plane..].iter().all(|v| *v < 0.0));
    }

    #[test]
    fn test_grayscale_and_alpha_are_coerced_to_rgb() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 6, Luma([128])));
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            6,
            6,
            image::Rgba([128, 128, 128, 10]),
        ));
        let preprocessor = Preprocessor::new(6);

        assert_eq!(preprocessor.process(&gray), preprocessor.process(&rgba));
    }

    #[test]
    fn test_processing_is_deterministic() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(37, 19, |x, y| {
            Rgb([(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8])
        }));
        let preprocessor = Preprocessor::new(16);

        assert_eq!(preprocessor.process(&image), preprocessor.process(&image));
    }

    #[test]
    fn test_decode_png_then_process() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 20, Rgb([1, 2, 3])));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();

        let decoded = Preprocessor::decode(bytes.get_ref()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 20));

        let tensor = Preprocessor::new(12).process(&decoded);
        assert_eq!(tensor.size(), 12);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = Preprocessor::decode(b"definitely not an image");
        assert!(matches!(result, Err(Error::ImageDecode { .. })));
    }

    #[test]
    fn test_zeros_matches_shape() {
        let tensor = ImageTensor::zeros(5);
        assert_eq!(tensor.shape(), [1, 3, 5, 5]);
        assert!(tensor.data().iter().all(|v| *v == 0.0));
        assert_eq!(tensor.at(3, 0, 0), None);
    }
}
