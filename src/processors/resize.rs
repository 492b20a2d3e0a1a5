//! Resizing to the model's fixed input shape.

use image::RgbImage;
use image::imageops::{self, FilterType};

/// Resizes an image to exactly `width` x `height`.
///
/// Uses Lanczos3, the same filter the training-side resize used; aspect
/// ratio is not preserved. Returns the input unchanged when it already has
/// the target dimensions.
pub fn resize_to_input(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resizes_to_exact_target_dimensions() {
        let img = RgbImage::new(640, 480);
        let resized = resize_to_input(&img, 224, 224);
        assert_eq!(resized.dimensions(), (224, 224));
    }

    #[test]
    fn upscales_small_inputs() {
        let img = RgbImage::new(32, 17);
        let resized = resize_to_input(&img, 224, 224);
        assert_eq!(resized.dimensions(), (224, 224));
    }

    #[test]
    fn matching_dimensions_pass_through() {
        let mut img = RgbImage::new(224, 224);
        img.put_pixel(3, 7, image::Rgb([9, 8, 7]));
        let resized = resize_to_input(&img, 224, 224);
        assert_eq!(resized.get_pixel(3, 7), &image::Rgb([9, 8, 7]));
    }
}
