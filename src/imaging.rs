//! Image normalization for picture and preview uploads.
//!
//! Input may be JPEG, PNG or WebP.  Output is always a baseline JPEG that
//! fits inside a `max_dimension` square with its aspect ratio preserved.
//! Images already inside the bound keep their size.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageError};

use crate::config::ImageConfig;

/// Decode, bound and re-encode `data`.
pub fn normalize(data: &[u8], config: &ImageConfig) -> Result<Bytes, ImageError> {
    let img = image::load_from_memory(data)?;
    let (width, height) = img.dimensions();

    let img = if width > config.max_dimension || height > config.max_dimension {
        img.resize(config.max_dimension, config.max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, config.jpeg_quality).encode_image(&rgb)?;
    Ok(Bytes::from(out))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 90]));
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 90)
            .encode_image(&img)
            .unwrap();
        out
    }

    fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn dimensions(data: &[u8]) -> (u32, u32) {
        image::load_from_memory(data).unwrap().dimensions()
    }

    fn config() -> ImageConfig {
        ImageConfig::default()
    }

    #[test]
    fn test_wide_image_scaled_proportionally() {
        let out = normalize(&jpeg(2000, 1000), &config()).unwrap();
        assert_eq!(dimensions(&out), (600, 300));
    }

    #[test]
    fn test_tall_image_scaled_proportionally() {
        let out = normalize(&jpeg(500, 1200), &config()).unwrap();
        assert_eq!(dimensions(&out), (250, 600));
    }

    #[test]
    fn test_small_image_not_upscaled() {
        let out = normalize(&jpeg(120, 80), &config()).unwrap();
        assert_eq!(dimensions(&out), (120, 80));
    }

    #[test]
    fn test_exact_bound_kept() {
        let out = normalize(&jpeg(600, 600), &config()).unwrap();
        assert_eq!(dimensions(&out), (600, 600));
    }

    #[test]
    fn test_png_reencoded_as_jpeg() {
        let out = normalize(&png_with_alpha(640, 480), &config()).unwrap();
        assert_eq!(
            image::guess_format(&out).unwrap(),
            ImageFormat::Jpeg
        );
        assert_eq!(dimensions(&out), (600, 450));
    }

    #[test]
    fn test_custom_bound() {
        let config = ImageConfig {
            max_dimension: 100,
            jpeg_quality: 50,
        };
        let out = normalize(&jpeg(400, 200), &config).unwrap();
        assert_eq!(dimensions(&out), (100, 50));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(normalize(b"%PDF-1.7 not an image", &config()).is_err());
        assert!(normalize(b"", &config()).is_err());
    }
}
