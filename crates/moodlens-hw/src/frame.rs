//! Raw camera buffers to RGB: YUYV conversion, MJPG decode, dark-frame check.

use image::{ImageFormat, Rgb, RgbImage};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid YUYV length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("MJPG decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Convert packed YUYV 4:2:2 to RGB using BT.601 limited-range coefficients.
///
/// Every 4 bytes `[Y0, U, Y1, V]` carry two horizontally adjacent pixels that
/// share one chroma pair.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for chunk in yuyv[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        rgb.extend_from_slice(&ycbcr_to_rgb(y0, u, v));
        rgb.extend_from_slice(&ycbcr_to_rgb(y1, u, v));
    }

    // Length is exactly width * height * 3 by construction.
    Ok(RgbImage::from_raw(width, height, rgb).unwrap_or_else(|| RgbImage::new(width, height)))
}

fn ycbcr_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let clamp = |x: i32| ((x + 128) >> 8).clamp(0, 255) as u8;
    [
        clamp(298 * c + 409 * e),
        clamp(298 * c - 100 * d - 208 * e),
        clamp(298 * c + 516 * d),
    ]
}

/// Decode one Motion-JPEG buffer.
pub fn mjpg_to_rgb(buf: &[u8]) -> Result<RgbImage, FrameError> {
    Ok(image::load_from_memory_with_format(buf, ImageFormat::Jpeg)?.to_rgb8())
}

/// Luma of one pixel (BT.601 weights, integer arithmetic).
fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

/// True if more than `threshold_pct` of pixels have luma below 32.
/// Empty frames count as dark.
pub fn is_dark_frame(image: &RgbImage, threshold_pct: f32) -> bool {
    let total = (image.width() * image.height()) as usize;
    if total == 0 {
        return true;
    }
    let dark = image.pixels().filter(|p| luma(p) < 32).count();
    (dark as f32 / total as f32) > threshold_pct
}

/// Average luma (0.0–255.0).
pub fn avg_brightness(image: &RgbImage) -> f32 {
    let total = (image.width() * image.height()) as usize;
    if total == 0 {
        return 0.0;
    }
    image.pixels().map(|p| luma(p) as f32).sum::<f32>() / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_yuyv_gray_pair() {
        // Neutral chroma: pure gray. Y=16 is black, Y=235 is white.
        let yuyv = vec![16, 128, 235, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_yuyv_red_dominant_chroma() {
        // Strong V pushes red up and green down.
        let yuyv = vec![81, 90, 81, 240];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        let [r, g, b] = rgb.get_pixel(0, 0).0;
        assert!(r > 200, "r={r}");
        assert!(g < 60, "g={g}");
        assert!(b < 60, "b={b}");
    }

    #[test]
    fn test_yuyv_dimensions() {
        let yuyv = vec![128u8; 4 * 2 * 2];
        let rgb = yuyv_to_rgb(&yuyv, 4, 2).unwrap();
        assert_eq!(rgb.dimensions(), (4, 2));
    }

    #[test]
    fn test_yuyv_invalid_length() {
        assert!(matches!(
            yuyv_to_rgb(&[16, 128], 2, 1),
            Err(FrameError::InvalidLength { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_mjpg_decode() {
        let source = RgbImage::from_pixel(8, 6, Rgb([40, 160, 220]));
        let mut jpeg = Cursor::new(Vec::new());
        source.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();

        let decoded = mjpg_to_rgb(jpeg.get_ref()).unwrap();
        assert_eq!(decoded.dimensions(), (8, 6));
        let [r, g, b] = decoded.get_pixel(3, 3).0;
        assert!((r as i32 - 40).abs() < 12 && (g as i32 - 160).abs() < 12 && (b as i32 - 220).abs() < 12);
    }

    #[test]
    fn test_mjpg_garbage() {
        assert!(matches!(mjpg_to_rgb(b"nope"), Err(FrameError::Decode(_))));
    }

    #[test]
    fn test_dark_frame_black() {
        assert!(is_dark_frame(&RgbImage::new(10, 10), 0.95));
    }

    #[test]
    fn test_dark_frame_normal() {
        let img = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
        assert!(!is_dark_frame(&img, 0.95));
        assert!((avg_brightness(&img) - 128.0).abs() < 2.0);
    }

    #[test]
    fn test_dark_frame_empty() {
        assert!(is_dark_frame(&RgbImage::new(0, 0), 0.95));
    }

    #[test]
    fn test_dark_frame_borderline() {
        // 94 dark pixels of 100 is not dark at a 95% threshold, 96 is.
        let mut img = RgbImage::from_pixel(10, 10, Rgb([5, 5, 5]));
        for i in 0..6 {
            img.put_pixel(i, 0, Rgb([200, 200, 200]));
        }
        assert!(!is_dark_frame(&img, 0.95));

        let mut img = RgbImage::from_pixel(10, 10, Rgb([5, 5, 5]));
        for i in 0..4 {
            img.put_pixel(i, 0, Rgb([200, 200, 200]));
        }
        assert!(is_dark_frame(&img, 0.95));
    }
}
