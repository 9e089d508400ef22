use std::cmp::Reverse;

use ndarray::Array1;
use ordered_float::OrderedFloat;

use crate::error::Result;
use crate::labels::ClassLabel;
use crate::model::check_head;

/// How many ranked classes a prediction carries.
pub const TOP_K: usize = 5;

/// Applies softmax to a 1D array (slice) and returns a new Array1<f32>.
pub fn softmax(slice: &Array1<f32>) -> Array1<f32> {
    let max_val = slice.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_vals: Array1<f32> = slice.mapv(|x| (x - max_val).exp());
    let sum_exp: f32 = exp_vals.sum();
    exp_vals.mapv(|v| v / sum_exp)
}

pub fn argmax_and_max(softmaxed: &Array1<f32>) -> (usize, f32) {
    softmaxed
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(max_idx, max_val), (i, &val)| {
            if val > max_val { (i, val) } else { (max_idx, max_val) }
        })
}

/// The `k` largest probabilities with their indices, highest first.
/// Equal values keep ascending index order.
pub fn top_k(probs: &Array1<f32>, k: usize) -> Vec<(usize, f32)> {
    let mut indices: Vec<usize> = (0..probs.len()).collect();
    indices.sort_by_key(|&i| Reverse(OrderedFloat(probs[i])));
    indices.into_iter().take(k).map(|i| (i, probs[i])).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedClass {
    pub label: ClassLabel,
    pub confidence: f32,
}

/// Top-5 classes plus the full distribution they were drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    ranked: Vec<RankedClass>,
    probabilities: Array1<f32>,
}

impl PredictionResult {
    pub fn ranked(&self) -> &[RankedClass] {
        &self.ranked
    }

    pub fn top(&self) -> &RankedClass {
        &self.ranked[0]
    }

    pub fn runners_up(&self) -> &[RankedClass] {
        &self.ranked[1..]
    }

    /// Softmax over all 17 classes.
    pub fn probabilities(&self) -> &Array1<f32> {
        &self.probabilities
    }
}

/// Softmax the raw head scores and keep the five most likely classes.
pub fn rank(logits: &[f32]) -> Result<PredictionResult> {
    check_head(logits)?;
    let probabilities = softmax(&Array1::from(logits.to_vec()));

    let ranked = top_k(&probabilities, TOP_K)
        .into_iter()
        .filter_map(|(index, confidence)| {
            ClassLabel::from_index(index).map(|label| RankedClass { label, confidence })
        })
        .collect();

    Ok(PredictionResult { ranked, probabilities })
}
