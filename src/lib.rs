// BTune — online auto-tuner for chunked-compression pipelines.

pub mod config;
pub mod context;
pub mod model;
pub mod probe;
pub mod timefn;
pub mod trace;
pub mod tuner;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports for the most common API entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// The tuner itself: one instance per host compression context.
pub use tuner::Btune;

/// Tuner configuration with chainable setters.
pub use tuner::params::TunerConfig;

/// One complete parameter set plus its measurements.
pub use tuner::params::Cparams;

/// Parameter vocabulary.
pub use tuner::params::{Behaviour, Codec, CompMode, Filter, PerfMode, RepeatMode, SplitMode};

/// Exploration phase, observable through [`Btune::state`].
pub use tuner::state::State as TunerState;

/// Host-facing context contract.
pub use context::{Cctx, Dctx, FILTER_PIPELINE_SLOTS};

/// Scoring primitives, usable stand-alone by host instrumentation.
pub use tuner::score::score;

/// Automatic blocksize derivation.
pub use tuner::blocksize::auto_blocksize;

/// Entropy probe: per-block compressibility estimates without compressing.
pub use probe::{estimate_block, probe_chunk, BlockEstimate};

/// Classifier plumbing for the chunk-0 bootstrap.
pub use model::{LinearModel, Metadata, ModelError, NormStats, Predictor, NCODECS};

// ─────────────────────────────────────────────────────────────────────────────
// Version API
// ─────────────────────────────────────────────────────────────────────────────

pub const BTUNE_VERSION_MAJOR: i32 = 0;
pub const BTUNE_VERSION_MINOR: i32 = 3;
pub const BTUNE_VERSION_RELEASE: i32 = 0;
pub const BTUNE_VERSION_NUMBER: i32 =
    BTUNE_VERSION_MAJOR * 100 * 100 + BTUNE_VERSION_MINOR * 100 + BTUNE_VERSION_RELEASE;
pub const BTUNE_VERSION_STRING: &str = "0.3.0";

/// Returns the library version number (e.g. 300 for v0.3.0).
pub fn version_number() -> i32 {
    BTUNE_VERSION_NUMBER
}

/// Returns the library version string (e.g. `"0.3.0"`).
pub fn version_string() -> &'static str {
    BTUNE_VERSION_STRING
}
