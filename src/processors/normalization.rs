//! Per-channel image normalization.
//!
//! Converts an RGB image into the normalized NCHW `f32` tensor the model
//! was trained against. The scale/mean/std recipe comes from the artifact's
//! training contract and is validated at construction.

use crate::core::errors::{ScreenError, ScreenResult};
use image::RgbImage;
use ndarray::Array4;

/// Normalizes images with a fixed scale/mean/std recipe.
///
/// Per-channel coefficients are precomputed as `alpha = scale / std` and
/// `beta = -mean / std`, so each pixel becomes `value * alpha + beta`.
/// Output layout is NCHW with a batch dimension of 1.
#[derive(Debug, Clone)]
pub struct Normalize {
    /// Scaling factors for each channel (alpha = scale / std).
    alpha: Vec<f32>,
    /// Offset values for each channel (beta = -mean / std).
    beta: Vec<f32>,
}

impl Normalize {
    /// Creates a normalizer from the artifact's preprocessing constants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if scale is not positive, mean or std are not
    /// 3-channel, or any std value is not positive.
    pub fn new(scale: f32, mean: &[f32], std: &[f32]) -> ScreenResult<Self> {
        if scale <= 0.0 || !scale.is_finite() {
            return Err(ScreenError::config_error(format!(
                "scale must be a positive finite number, got {scale}"
            )));
        }

        if mean.len() != 3 {
            return Err(ScreenError::config_error(
                "mean must have exactly 3 elements for RGB",
            ));
        }

        if std.len() != 3 {
            return Err(ScreenError::config_error(
                "std must have exactly 3 elements for RGB",
            ));
        }

        for (i, &s) in std.iter().enumerate() {
            if s <= 0.0 || !s.is_finite() {
                return Err(ScreenError::config_error(format!(
                    "std at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        let alpha: Vec<f32> = std.iter().map(|s| scale / s).collect();
        let beta: Vec<f32> = mean.iter().zip(std).map(|(m, s)| -m / s).collect();

        Ok(Self { alpha, beta })
    }

    /// Normalizes a single image into a `(1, 3, height, width)` tensor.
    pub fn to_tensor(&self, img: &RgbImage) -> ScreenResult<Array4<f32>> {
        let (width, height) = img.dimensions();
        let channels = 3usize;
        let mut data = vec![0.0f32; channels * (height * width) as usize];

        for c in 0..channels {
            for y in 0..height {
                for x in 0..width {
                    let pixel = img.get_pixel(x, y);
                    let value = pixel[c] as f32;
                    let dst = c * (height * width) as usize + (y * width + x) as usize;
                    data[dst] = value * self.alpha[c] + self.beta[c];
                }
            }
        }

        Array4::from_shape_vec((1, channels, height as usize, width as usize), data).map_err(
            |e| {
                ScreenError::processing_error(
                    crate::core::errors::ProcessingStage::Normalization,
                    format!("failed to shape normalized tensor for {width}x{height} image"),
                    e,
                )
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Default recipe: scale 1/255, ImageNet mean/std.
    fn imagenet() -> Normalize {
        Normalize::new(1.0 / 255.0, &[0.485, 0.456, 0.406], &[0.229, 0.224, 0.225]).unwrap()
    }

    #[test]
    fn rejects_non_positive_scale() {
        assert!(Normalize::new(0.0, &[0.5; 3], &[0.5; 3]).is_err());
        assert!(Normalize::new(-1.0, &[0.5; 3], &[0.5; 3]).is_err());
    }

    #[test]
    fn rejects_wrong_channel_counts() {
        assert!(Normalize::new(1.0, &[0.5, 0.5], &[0.5; 3]).is_err());
        assert!(Normalize::new(1.0, &[0.5; 3], &[0.5; 4]).is_err());
    }

    #[test]
    fn rejects_zero_std() {
        assert!(Normalize::new(1.0, &[0.5; 3], &[0.5, 0.0, 0.5]).is_err());
    }

    #[test]
    fn output_is_nchw_with_unit_batch() {
        let img = RgbImage::new(8, 6);
        let tensor = imagenet().to_tensor(&img).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 6, 8]);
    }

    // Pins the numeric recipe: a uniform mid-gray pixel must come out at
    // (128/255 - mean) / std per channel, within float tolerance.
    #[test]
    fn pins_imagenet_recipe_on_uniform_input() {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([128, 128, 128]));
        let tensor = imagenet().to_tensor(&img).unwrap();

        let expected = [
            (128.0 / 255.0 - 0.485) / 0.229,
            (128.0 / 255.0 - 0.456) / 0.224,
            (128.0 / 255.0 - 0.406) / 0.225,
        ];
        for (c, &want) in expected.iter().enumerate() {
            let got: f32 = tensor[[0, c, 2, 1]];
            assert!(
                (got - want).abs() < 1e-5,
                "channel {c}: got {got}, want {want}"
            );
        }
    }

    #[test]
    fn channel_order_is_chw() {
        // Pure red: only channel 0 carries the high value.
        let img = RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]));
        let tensor = imagenet().to_tensor(&img).unwrap();

        let red = tensor[[0, 0, 0, 0]];
        let green = tensor[[0, 1, 0, 0]];
        let blue = tensor[[0, 2, 0, 0]];

        assert!((red - (1.0 - 0.485) / 0.229).abs() < 1e-5);
        assert!((green - (-0.456 / 0.224)).abs() < 1e-5);
        assert!((blue - (-0.406 / 0.225)).abs() < 1e-5);
    }

    #[test]
    fn normalization_is_deterministic() {
        let img = RgbImage::from_fn(5, 5, |x, y| image::Rgb([(x * 40) as u8, (y * 40) as u8, 77]));
        let norm = imagenet();
        assert_eq!(norm.to_tensor(&img).unwrap(), norm.to_tensor(&img).unwrap());
    }
}
