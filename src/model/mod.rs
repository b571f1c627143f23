//! Chunk-0 classifier plumbing.
//!
//! The classifier itself is a black box behind the [`Predictor`] trait:
//! two normalized features in, one score per category out. A small linear
//! model loadable from JSON ships as the built-in implementation so the
//! `BTUNE_MODEL_*` environment works out of the box; hosts with a real
//! inference runtime inject their own through the configuration. The
//! adapter probes every block of the first chunk, lets the classifier vote
//! per block, and hands the winning codec/filter pair back to the tuner.

mod metadata;

pub use metadata::{normalize, Metadata, NormStats};

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::probe::probe_chunk;
use crate::tuner::params::{Codec, CompMode, Filter};

/// Width of the classifier output vector.
pub const NCODECS: usize = 15;

/// Everything that can go wrong while preparing or running inference.
/// All of it is soft: the tuner logs and falls back to its default
/// candidate sets.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0} is not set")]
    MissingEnv(&'static str),
    #[error("model shape mismatch: expected {expected} rows, got {got}")]
    Shape { expected: usize, got: usize },
    #[error("classifier chose unknown category {0}")]
    UnknownCategory(usize),
    #[error("empty chunk, nothing to probe")]
    EmptyChunk,
}

/// Narrow capability interface to the external classifier.
pub trait Predictor {
    /// Score every category for one block's normalized
    /// `[cratio, cspeed]` features.
    fn predict(&self, features: [f32; 2]) -> [f32; NCODECS];
}

/// Built-in linear classifier: `scores = W · features + b`.
#[derive(Clone, Debug, Deserialize)]
pub struct LinearModel {
    weights: Vec<[f32; 2]>,
    bias: Vec<f32>,
}

impl LinearModel {
    /// Load a model from a JSON file, validating its shape.
    pub fn load(path: impl AsRef<Path>) -> Result<LinearModel, ModelError> {
        let text = fs::read_to_string(path)?;
        let model: LinearModel = serde_json::from_str(&text)?;
        if model.weights.len() != NCODECS {
            return Err(ModelError::Shape {
                expected: NCODECS,
                got: model.weights.len(),
            });
        }
        if model.bias.len() != NCODECS {
            return Err(ModelError::Shape {
                expected: NCODECS,
                got: model.bias.len(),
            });
        }
        Ok(model)
    }

    /// Load the model selected for `comp_mode` from the environment.
    pub fn from_env(comp_mode: CompMode) -> Result<LinearModel, ModelError> {
        let var = match comp_mode {
            CompMode::Hsp => "BTUNE_MODEL_HSP",
            CompMode::Balanced => "BTUNE_MODEL_BALANCED",
            CompMode::Hcr => "BTUNE_MODEL_HCR",
        };
        let path = std::env::var_os(var).ok_or(ModelError::MissingEnv(var))?;
        LinearModel::load(path)
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: [f32; 2]) -> [f32; NCODECS] {
        let mut scores = [0.0f32; NCODECS];
        for (i, score) in scores.iter_mut().enumerate() {
            *score = self.weights[i][0] * features[0]
                + self.weights[i][1] * features[1]
                + self.bias[i];
        }
        scores
    }
}

#[inline]
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Run chunk-0 inference: probe every block of `src`, vote, and map the
/// winning category to a codec/filter pair.
///
/// `metadata`/`predictor` overrides take precedence over the environment.
pub(crate) fn select_category(
    src: &[u8],
    block_size: usize,
    comp_mode: CompMode,
    metadata: Option<&Metadata>,
    predictor: Option<&dyn Predictor>,
) -> Result<(Codec, Filter), ModelError> {
    let env_meta;
    let meta = match metadata {
        Some(meta) => meta,
        None => {
            env_meta = Metadata::from_env()?;
            &env_meta
        }
    };
    let env_model;
    let predictor: &dyn Predictor = match predictor {
        Some(p) => p,
        None => {
            env_model = LinearModel::from_env(comp_mode)?;
            &env_model
        }
    };

    if src.is_empty() {
        return Err(ModelError::EmptyChunk);
    }

    let mut votes = [0u32; NCODECS];
    for estimate in probe_chunk(src, block_size) {
        let features = [
            normalize(estimate.cratio, &meta.cratio),
            normalize(estimate.cspeed, &meta.speed),
        ];
        let scores = predictor.predict(features);
        votes[argmax(&scores)] += 1;
    }

    let winner = argmax(&votes.map(|v| v as f32));
    meta.category(winner).ok_or(ModelError::UnknownCategory(winner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn test_metadata() -> Metadata {
        serde_json::from_str(
            r#"{
                "cratio": {"mean": 0.0, "std": 1.0, "min": 0.0, "max": 1.0},
                "speed":  {"mean": 0.0, "std": 1.0, "min": 0.0, "max": 1.0},
                "categories": [[0, 0], [0, 1], [0, 2], [1, 0], [1, 1], [1, 2],
                               [5, 1], [5, 2], [4, 1]]
            }"#,
        )
        .unwrap()
    }

    /// Always votes for one fixed category.
    struct Fixed(usize);

    impl Predictor for Fixed {
        fn predict(&self, _features: [f32; 2]) -> [f32; NCODECS] {
            let mut scores = [0.0; NCODECS];
            scores[self.0] = 1.0;
            scores
        }
    }

    #[test]
    fn argmax_picks_first_maximum() {
        assert_eq!(argmax(&[0.0, 3.0, 3.0, 1.0]), 1);
        assert_eq!(argmax(&[-1.0]), 0);
    }

    #[test]
    fn fixed_predictor_selects_its_category() {
        let meta = test_metadata();
        let data = vec![0u8; 8 * 1024];
        let pair = select_category(&data, 1024, CompMode::Hsp, Some(&meta), Some(&Fixed(4)))
            .unwrap();
        assert_eq!(pair, (Codec::Lz4, Filter::Shuffle));
    }

    #[test]
    fn out_of_table_category_is_an_error() {
        let meta = test_metadata();
        let data = vec![0u8; 1024];
        let result =
            select_category(&data, 1024, CompMode::Hsp, Some(&meta), Some(&Fixed(12)));
        assert!(matches!(result, Err(ModelError::UnknownCategory(12))));
    }

    #[test]
    fn empty_chunk_is_an_error() {
        let meta = test_metadata();
        let result = select_category(&[], 1024, CompMode::Hsp, Some(&meta), Some(&Fixed(0)));
        assert!(matches!(result, Err(ModelError::EmptyChunk)));
    }

    #[test]
    fn linear_model_rejects_bad_shape() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"weights": [[1.0, 0.0]], "bias": [0.0]}"#)
            .unwrap();
        assert!(matches!(
            LinearModel::load(file.path()),
            Err(ModelError::Shape { expected: 15, got: 1 })
        ));
    }

    #[test]
    fn linear_model_predicts_affine_scores() {
        let model = LinearModel {
            weights: vec![[1.0, 0.0]; NCODECS],
            bias: (0..NCODECS).map(|i| i as f32 * 0.1).collect(),
        };
        let scores = model.predict([2.0, 9.9]);
        assert_eq!(scores[0], 2.0);
        assert!((scores[14] - 3.4).abs() < 1e-6);
    }

    #[test]
    fn linear_model_loads_from_file() {
        let model = LinearModel {
            weights: vec![[0.5, -0.5]; NCODECS],
            bias: vec![0.0; NCODECS],
        };
        let json = serde_json::json!({
            "weights": model.weights,
            "bias": model.bias,
        });
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.to_string().as_bytes()).unwrap();
        let loaded = LinearModel::load(file.path()).unwrap();
        assert_eq!(loaded.weights.len(), NCODECS);
    }

    #[test]
    fn missing_model_env_is_soft() {
        // The per-mode variable is unset in the test environment.
        std::env::remove_var("BTUNE_MODEL_HCR");
        assert!(matches!(
            LinearModel::from_env(CompMode::Hcr),
            Err(ModelError::MissingEnv("BTUNE_MODEL_HCR"))
        ));
    }
}
