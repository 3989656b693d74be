use crate::resize::params::ResizeParams;
use image::{imageops::FilterType, DynamicImage};

/// Scales a decoded image according to the batch parameters.
///
/// With `preserve_aspect` unset the image is stretched to exactly the
/// requested dimensions, distorting if the ratios differ. With it set, the
/// image is shrunk to fit the requested bounding box while keeping its
/// aspect ratio, and is never enlarged.
pub fn resize(image: &DynamicImage, params: &ResizeParams) -> DynamicImage {
    if params.preserve_aspect {
        let (width, height) =
            contain_dimensions(image.width(), image.height(), params.width, params.height);
        if (width, height) == (image.width(), image.height()) {
            return image.clone();
        }
        image.resize_exact(width, height, FilterType::Lanczos3)
    } else {
        image.resize_exact(params.width, params.height, FilterType::Lanczos3)
    }
}

/// Largest dimensions that fit the target box while keeping the source
/// aspect ratio, capped at the source size. Each side rounds to the nearest
/// pixel with a floor of 1.
pub fn contain_dimensions(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> (u32, u32) {
    let scale = (target_w as f64 / src_w as f64)
        .min(target_h as f64 / src_h as f64)
        .min(1.0);
    let width = (src_w as f64 * scale).round() as u32;
    let height = (src_h as f64 * scale).round() as u32;
    (width.max(1), height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn params(width: u32, height: u32, preserve_aspect: bool) -> ResizeParams {
        ResizeParams {
            width,
            height,
            quality: 95,
            dpi: 300,
            preserve_aspect,
        }
    }

    #[test]
    fn test_contain_tall_image_in_square_box() {
        // The 100x200 / 50x50 case: height is the limiting side.
        assert_eq!(contain_dimensions(100, 200, 50, 50), (25, 50));
    }

    #[test]
    fn test_contain_square_image_in_square_box() {
        assert_eq!(contain_dimensions(300, 300, 50, 50), (50, 50));
    }

    #[test]
    fn test_contain_wide_image() {
        assert_eq!(contain_dimensions(1920, 1080, 800, 600), (800, 450));
    }

    #[test]
    fn test_contain_never_upscales() {
        assert_eq!(contain_dimensions(100, 100, 400, 400), (100, 100));
        assert_eq!(contain_dimensions(30, 60, 600, 50), (25, 50));
    }

    #[test]
    fn test_contain_floors_at_one_pixel() {
        assert_eq!(contain_dimensions(1000, 10, 50, 50), (50, 1));
    }

    #[test]
    fn test_stretch_ignores_aspect_ratio() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(100, 200));
        let resized = resize(&image, &params(50, 50, false));
        assert_eq!((resized.width(), resized.height()), (50, 50));
    }

    #[test]
    fn test_preserve_aspect_fits_the_box() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(100, 200));
        let resized = resize(&image, &params(50, 50, true));
        assert_eq!((resized.width(), resized.height()), (25, 50));
    }

    #[test]
    fn test_preserve_aspect_leaves_smaller_image_alone() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(20, 30));
        let resized = resize(&image, &params(100, 100, true));
        assert_eq!((resized.width(), resized.height()), (20, 30));
    }
}
