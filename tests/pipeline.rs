use std::io::Cursor;

use agrivision::error::Result;
use agrivision::{
    argmax_and_max, softmax, ClassLabel, Classifier, DiagnosisError, Diagnoser, Processor,
    NUM_CLASSES,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::{Array1, Array4};

/// Deterministic stand-in for the ResNet-18: a fixed linear readout over a
/// handful of sampled pixels.
struct LinearReadout;

impl LinearReadout {
    fn scores(input: &Array4<f32>) -> Vec<f32> {
        let (_, channels, height, width) = input.dim();
        (0..NUM_CLASSES)
            .map(|k| {
                let c = k % channels;
                let y = (k * 13) % height;
                let x = (k * 29) % width;
                input[[0, c, y, x]] * (1.0 + k as f32 * 0.25) - k as f32 * 0.05
            })
            .collect()
    }
}

impl Classifier for LinearReadout {
    fn logits(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        Ok(Self::scores(input))
    }
}

fn leaf_image(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(120, 90, |x, y| {
        Rgb([(x * 2 % 256) as u8, (100 + y) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

fn diagnoser() -> Diagnoser<LinearReadout> {
    Diagnoser::new(LinearReadout, Processor::default())
}

#[test]
fn top_five_is_a_sorted_slice_of_a_distribution() {
    let diagnosis = diagnoser().diagnose(&leaf_image(ImageFormat::Png), Some("leaf.png")).unwrap();
    let ranked = diagnosis.prediction.ranked();

    assert_eq!(ranked.len(), 5);
    assert!(ranked.iter().all(|r| r.confidence >= 0.0));
    assert!(ranked.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    assert!(ranked.iter().map(|r| r.confidence).sum::<f32>() <= 1.0 + 1e-6);

    let full: f32 = diagnosis.prediction.probabilities().sum();
    assert!((full - 1.0).abs() < 1e-5);
}

#[test]
fn zero_byte_upload_is_empty_input() {
    let err = diagnoser().diagnose(&[], Some("leaf.jpg")).unwrap_err();
    assert!(matches!(err, DiagnosisError::EmptyInput));
    assert_eq!(err.to_string(), "uploaded file is empty");
}

#[test]
fn text_file_is_decode_failure() {
    let err = diagnoser()
        .diagnose(b"leaf.jpg: definitely a JPEG, trust me", Some("leaf.jpg"))
        .unwrap_err();
    assert!(matches!(err, DiagnosisError::DecodeFailure { .. }), "{err:?}");
    assert!(err.to_string().starts_with("invalid image"));
}

#[test]
fn warm_process_is_deterministic() {
    let diagnoser = diagnoser();
    let bytes = leaf_image(ImageFormat::Jpeg);

    let first = diagnoser.diagnose(&bytes, None).unwrap();
    let second = diagnoser.diagnose(&bytes, None).unwrap();

    let bits = |d: &agrivision::Diagnosis| {
        d.prediction
            .ranked()
            .iter()
            .map(|r| (r.label, r.confidence.to_bits()))
            .collect::<Vec<_>>()
    };
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn rank_zero_matches_independent_softmax_argmax() {
    let diagnoser = diagnoser();
    let bytes = leaf_image(ImageFormat::Png);
    let diagnosis = diagnoser.diagnose(&bytes, None).unwrap();

    let xs = diagnoser.processor().preprocess(&diagnosis.image).unwrap();
    let probs = softmax(&Array1::from(LinearReadout::scores(&xs)));
    let (argmax, _) = argmax_and_max(&probs);

    assert_eq!(diagnosis.verdict(), ClassLabel::from_index(argmax).unwrap());
}

#[test]
fn every_label_has_advisory_text() {
    for label in ClassLabel::ALL {
        assert!(!label.advisory().is_empty());
    }
}
