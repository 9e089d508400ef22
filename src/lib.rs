pub mod cli;
pub mod error;
pub mod ingest;
pub mod labels;
pub mod mapping;
pub mod model;
pub mod postprocess;
pub mod preprocess;
pub mod report;
pub mod service;

pub use crate::cli::Args;
pub use crate::error::DiagnosisError;
pub use crate::ingest::decode_upload;
pub use crate::labels::{ClassLabel, NUM_CLASSES};
pub use crate::mapping::load_class_mapping;
pub use crate::model::{Classifier, OnnxClassifier, OnnxModel};
pub use crate::postprocess::{argmax_and_max, rank, softmax, top_k, PredictionResult};
pub use crate::preprocess::{PreprocessConfig, Processor};
pub use crate::service::{Diagnoser, Diagnosis};
