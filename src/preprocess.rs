use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use tracing::debug;

use crate::error::{DiagnosisError, Result};

#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

#[derive(Debug)]
pub struct Processor {
    pub config: PreprocessConfig,
}

impl Default for PreprocessConfig {
    /// ImageNet statistics at the 224x224 resolution the ResNet-18 head was trained on.
    fn default() -> Self {
        Self {
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            height: 224,
            width: 224,
            channels: 3,
        }
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(PreprocessConfig::default())
    }
}

impl Processor {
    /// Create a new instance of the Processor struct
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Preprocess one RGB image.
    /// Resizes to the configured size (aspect ratio is not kept) and applies
    /// per-channel mean/std normalization.
    /// Returns an NCHW tensor with a batch dimension of 1.
    pub fn preprocess(&self, image: &RgbImage) -> Result<Array4<f32>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DiagnosisError::Preprocess("image has no pixels".into()));
        }
        if self.config.channels != 3 {
            return Err(DiagnosisError::Preprocess(format!(
                "expected 3 channels, config asks for {}",
                self.config.channels
            )));
        }

        let (width, height) = (self.config.width, self.config.height);
        let resized = imageops::resize(image, width as u32, height as u32, FilterType::Triangle);

        let mut img_arr = Array4::<f32>::zeros((1, self.config.channels, height, width));
        for (x, y, rgb) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                img_arr[[0, c, y, x]] =
                    (rgb[c] as f32 / 255.0 - self.config.mean[c]) / self.config.std[c];
            }
        }

        debug!(
            from = format!("{}x{}", image.width(), image.height()),
            shape = ?img_arr.shape(),
            "preprocessed image"
        );
        Ok(img_arr)
    }
}
