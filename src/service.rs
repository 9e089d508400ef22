use std::time::{Duration, Instant};

use image::RgbImage;
use tracing::{debug, info};

use crate::error::Result;
use crate::ingest::{decode_upload, DecodedBy};
use crate::labels::ClassLabel;
use crate::model::Classifier;
use crate::postprocess::{rank, PredictionResult};
use crate::preprocess::Processor;

#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub decode: Duration,
    pub preprocess: Duration,
    pub inference: Duration,
}

/// Everything the result view needs for one upload.
#[derive(Debug)]
pub struct Diagnosis {
    pub image: RgbImage,
    pub decoded_by: DecodedBy,
    pub prediction: PredictionResult,
    pub timings: StageTimings,
}

impl Diagnosis {
    pub fn verdict(&self) -> ClassLabel {
        self.prediction.top().label
    }

    pub fn advisory(&self) -> &'static str {
        self.verdict().advisory()
    }
}

/// The classifier and preprocessing state, built once at startup and shared
/// read-only by every request.
#[derive(Debug)]
pub struct Diagnoser<C> {
    model: C,
    processor: Processor,
}

impl<C: Classifier> Diagnoser<C> {
    pub fn new(model: C, processor: Processor) -> Self {
        Self { model, processor }
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Runs one upload through decode, preprocess, inference and ranking.
    /// Any failure ends the request without a partial result.
    pub fn diagnose(&self, bytes: &[u8], name_hint: Option<&str>) -> Result<Diagnosis> {
        let t = Instant::now();
        let decoded = decode_upload(bytes, name_hint)?;
        let decode = t.elapsed();

        let t = Instant::now();
        let xs = self.processor.preprocess(&decoded.rgb)?;
        let preprocess = t.elapsed();

        let t = Instant::now();
        let logits = self.model.logits(&xs)?;
        let inference = t.elapsed();
        debug!(scores = logits.len(), "forward pass done");

        let prediction = rank(&logits)?;
        let top = prediction.top();
        info!(
            label = %top.label,
            confidence = format!("{:.4}", top.confidence),
            "diagnosis complete"
        );

        Ok(Diagnosis {
            image: decoded.rgb,
            decoded_by: decoded.decoded_by,
            prediction,
            timings: StageTimings {
                decode,
                preprocess,
                inference,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosisError;
    use crate::labels::NUM_CLASSES;
    use image::{DynamicImage, ImageFormat, Rgb};
    use ndarray::{Array4, Axis};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores each class from the mean of one channel so different images
    /// produce different rankings.
    #[derive(Default)]
    struct ChannelMeans {
        calls: AtomicUsize,
    }

    impl Classifier for ChannelMeans {
        fn logits(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let means: Vec<f32> = input
                .index_axis(Axis(0), 0)
                .axis_iter(Axis(0))
                .map(|plane| plane.mean().unwrap_or(0.0))
                .collect();
            Ok((0..NUM_CLASSES).map(|i| means[i % 3] * (i as f32 + 1.0) * 0.1).collect())
        }
    }

    fn png(color: [u8; 3]) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 24, Rgb(color)));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn same_bytes_give_identical_results() {
        let diagnoser = Diagnoser::new(ChannelMeans::default(), Processor::default());
        let bytes = png([40, 160, 60]);

        let first = diagnoser.diagnose(&bytes, Some("leaf.png")).unwrap();
        let second = diagnoser.diagnose(&bytes, Some("leaf.png")).unwrap();

        assert_eq!(first.prediction, second.prediction);
        assert_eq!(diagnoser.model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_upload_never_reaches_the_model() {
        let diagnoser = Diagnoser::new(ChannelMeans::default(), Processor::default());
        let err = diagnoser.diagnose(&[], None).unwrap_err();
        assert!(matches!(err, DiagnosisError::EmptyInput));
        assert_eq!(diagnoser.model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn advisory_follows_top_label() {
        let diagnoser = Diagnoser::new(ChannelMeans::default(), Processor::default());
        let diagnosis = diagnoser.diagnose(&png([250, 250, 250]), None).unwrap();
        assert_eq!(diagnosis.advisory(), diagnosis.verdict().advisory());
        assert_eq!(diagnosis.image.dimensions(), (32, 24));
    }
}
