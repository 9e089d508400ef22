use thiserror::Error;

/// Failures that halt a single diagnosis request.
///
/// Only `EmptyInput` and `DecodeFailure` are user-facing upload problems; the
/// remaining variants come from the model side and usually mean the
/// checkpoint does not match the 17-class head.
#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error("uploaded file is empty")]
    EmptyInput,

    #[error("invalid image: {primary} (fallback decoder: {fallback})")]
    DecodeFailure { primary: String, fallback: String },

    #[error("preprocessing failed: {0}")]
    Preprocess(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ort::Error> for DiagnosisError {
    fn from(err: ort::Error) -> Self {
        DiagnosisError::Inference(err.to_string())
    }
}

pub type Result<T, E = DiagnosisError> = std::result::Result<T, E>;
