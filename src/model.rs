use std::path::Path;

use ndarray::Array4;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::error::{DiagnosisError, Result};
use crate::labels::NUM_CLASSES;

/// Maps a normalized `[1, 3, H, W]` tensor to one raw score per class.
///
/// Implementations must be pure: the same tensor always yields the same
/// scores.
pub trait Classifier: Send + Sync {
    fn logits(&self, input: &Array4<f32>) -> Result<Vec<f32>>;
}

pub struct OnnxModel {
    provider: [ExecutionProviderDispatch; 1],
}

impl OnnxModel {
    pub fn new(cuda: bool) -> Self {
        let provider = if cuda {
            [CUDAExecutionProvider::default().build().error_on_failure()]
        } else {
            [CPUExecutionProvider::default().build()]
        };
        Self { provider }
    }

    pub fn load_model(&self, model_path: &Path) -> Result<Session> {
        let session = Session::builder()?
            .with_execution_providers(self.provider.clone())?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(session)
    }
}

/// ResNet-18 with a 17-way head, exported to ONNX.
///
/// The session is built once and only read afterwards; ONNX Runtime allows
/// concurrent `run` calls on a shared session.
pub struct OnnxClassifier {
    session: Session,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("inputs", &self.session.inputs.iter().map(|i| &i.name).collect::<Vec<_>>())
            .field("outputs", &self.session.outputs.iter().map(|o| &o.name).collect::<Vec<_>>())
            .finish()
    }
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, cuda: bool) -> Result<Self> {
        let session = OnnxModel::new(cuda).load_model(model_path)?;
        if session.outputs.is_empty() {
            return Err(DiagnosisError::Inference(format!(
                "{} declares no outputs",
                model_path.display()
            )));
        }
        info!(
            path = %model_path.display(),
            input = %session.inputs.first().map(|i| i.name.as_str()).unwrap_or("?"),
            output = %session.outputs[0].name,
            cuda,
            "loaded classifier checkpoint"
        );
        Ok(Self { session })
    }
}

impl Classifier for OnnxClassifier {
    fn logits(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let tensor = Tensor::from_array(input.clone())?;
        let ys = self.session.run(ort::inputs![tensor]?)?;
        let scores = ys[0].try_extract_tensor::<f32>()?;
        let scores: Vec<f32> = scores.iter().copied().collect();
        check_head(&scores)?;
        Ok(scores)
    }
}

/// Rejects outputs that cannot line up with the label table.
pub fn check_head(scores: &[f32]) -> Result<()> {
    if scores.len() != NUM_CLASSES {
        return Err(DiagnosisError::Inference(format!(
            "model produced {} scores, expected {}",
            scores.len(),
            NUM_CLASSES
        )));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(DiagnosisError::Inference("model produced non-finite scores".into()));
    }
    Ok(())
}
