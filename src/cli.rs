use std::path::PathBuf;

use clap::Parser;

const MODEL_FILE: &str = "best_model.onnx";

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Crop disease diagnosis from a single leaf photo", long_about = None)]
pub struct Args {
    /// ONNX checkpoint of the 17-class ResNet-18
    #[arg(long, env = "AGRIVISION_MODEL")]
    pub model: Option<PathBuf>,

    /// Leaf image to classify; image paths are read from stdin when omitted
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Where to write the HTML report (a directory when reading from stdin)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Label file exported with the checkpoint, checked against the built-in class order
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// ONNX Runtime shared library to load
    #[arg(long, env = "ORT_DYLIB_PATH")]
    pub ort_dylib: Option<PathBuf>,

    /// Run on the CUDA execution provider
    #[arg(long, default_value_t = false)]
    pub cuda: bool,

    /// Log per-stage timings
    #[arg(long, default_value_t = false)]
    pub profile: bool,
}

impl Args {
    /// `--model`, then `model/best_model.onnx`, then the per-user data directory.
    pub fn model_candidates(&self) -> Vec<PathBuf> {
        if let Some(model) = &self.model {
            return vec![model.clone()];
        }
        let mut candidates = vec![PathBuf::from("model").join(MODEL_FILE)];
        if let Some(data_dir) = dirs::data_dir() {
            candidates.push(data_dir.join("agrivision").join(MODEL_FILE));
        }
        candidates
    }

    pub fn resolve_model(&self) -> Option<PathBuf> {
        let candidates = self.model_candidates();
        if self.model.is_some() {
            return candidates.into_iter().next();
        }
        candidates.into_iter().find(|p| p.is_file())
    }
}
