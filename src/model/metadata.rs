//! Normalization statistics and the category table consumed by the
//! chunk-0 classifier, loaded from the `BTUNE_METADATA` JSON file.
//!
//! ```json
//! {
//!   "cratio": {"mean": 3.1, "std": 1.2, "min": -0.5, "max": 2.0},
//!   "speed":  {"mean": 4.0e9, "std": 1.0e9, "min": -1.0, "max": 3.0},
//!   "categories": [[1, 1], [5, 2], ...]
//! }
//! ```
//!
//! Each category index (the classifier's argmax output) maps to a
//! `[codec_id, filter_id]` pair.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::model::ModelError;
use crate::tuner::params::{Codec, Filter};

/// Per-feature normalization statistics.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct NormStats {
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
}

/// Everything the predictor adapter needs besides the model weights.
#[derive(Clone, Debug, Deserialize)]
pub struct Metadata {
    pub cratio: NormStats,
    pub speed: NormStats,
    /// `categories[i]` is the `[codec_id, filter_id]` pair for classifier
    /// output `i`.
    pub categories: Vec<[i32; 2]>,
}

impl Metadata {
    /// Load and parse a metadata JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Metadata, ModelError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load from the path in `BTUNE_METADATA`.
    pub fn from_env() -> Result<Metadata, ModelError> {
        let path =
            std::env::var_os("BTUNE_METADATA").ok_or(ModelError::MissingEnv("BTUNE_METADATA"))?;
        Metadata::load(path)
    }

    /// Resolve a category index to a codec/filter pair. `None` when the
    /// index is out of range or names an unknown id.
    pub fn category(&self, index: usize) -> Option<(Codec, Filter)> {
        let [codec_id, filter_id] = *self.categories.get(index)?;
        Some((Codec::from_id(codec_id)?, Filter::from_id(filter_id)?))
    }
}

/// Standardize then rescale one feature value. Degenerate statistics
/// (zero spread) collapse the feature to zero rather than dividing by it.
pub fn normalize(value: f32, stats: &NormStats) -> f32 {
    if stats.std == 0.0 || stats.max == 0.0 {
        return 0.0;
    }
    ((value - stats.mean) / stats.std - stats.min) / stats.max
}
