//! Parameter vocabulary: codec/filter/split identifiers, tuning modes,
//! schedule behaviour, the tuner configuration, and the `Cparams` trial
//! record that the whole tuner revolves around.

use crate::btune_debug;
use crate::config::{DEFAULT_BANDWIDTH, MIN_BITSHUFFLE, MIN_SHUFFLE};
use crate::model::{Metadata, Predictor};
use crate::tuner::direction::Direction;

// ─────────────────────────────────────────────────────────────────────────────
// Codec / filter / split identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Host codec identifiers. Numeric values follow the host compressor's
/// registry so that metadata category tables can name them directly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Codec {
    BloscLz = 0,
    Lz4 = 1,
    Lz4Hc = 2,
    Zlib = 4,
    Zstd = 5,
}

impl Codec {
    /// Resolve a registry id, e.g. from a metadata category table.
    pub fn from_id(id: i32) -> Option<Codec> {
        match id {
            0 => Some(Codec::BloscLz),
            1 => Some(Codec::Lz4),
            2 => Some(Codec::Lz4Hc),
            4 => Some(Codec::Zlib),
            5 => Some(Codec::Zstd),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::BloscLz => "blosclz",
            Codec::Lz4 => "lz4",
            Codec::Lz4Hc => "lz4hc",
            Codec::Zlib => "zlib",
            Codec::Zstd => "zstd",
        }
    }

    /// Ratio-oriented codecs get bigger auto-blocksizes and tighter clevel caps.
    pub fn is_ratio_oriented(self) -> bool {
        matches!(self, Codec::Lz4Hc | Codec::Zlib | Codec::Zstd)
    }
}

/// Filter identifiers, numeric values per the host registry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Filter {
    NoFilter = 0,
    Shuffle = 1,
    BitShuffle = 2,
    ByteDelta = 35,
}

impl Filter {
    pub fn from_id(id: i32) -> Option<Filter> {
        match id {
            0 => Some(Filter::NoFilter),
            1 => Some(Filter::Shuffle),
            2 => Some(Filter::BitShuffle),
            35 => Some(Filter::ByteDelta),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Filter::NoFilter => "nofilter",
            Filter::Shuffle => "shuffle",
            Filter::BitShuffle => "bitshuffle",
            Filter::ByteDelta => "bytedelta",
        }
    }

    /// Smallest shuffle unit the filter can operate on.
    pub fn min_shuffle(self) -> u32 {
        match self {
            Filter::BitShuffle => MIN_BITSHUFFLE,
            _ => MIN_SHUFFLE,
        }
    }
}

/// Whether the host splits blocks into streams before encoding.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum SplitMode {
    AlwaysSplit = 1,
    NeverSplit = 2,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tuning objectives
// ─────────────────────────────────────────────────────────────────────────────

/// Which time terms enter the score.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PerfMode {
    #[default]
    Comp,
    Decomp,
    Balanced,
}

impl PerfMode {
    /// Lenient constructor: unknown values warn and fall back to the default.
    pub fn from_id(id: i32) -> PerfMode {
        match id {
            0 => PerfMode::Comp,
            1 => PerfMode::Decomp,
            2 => PerfMode::Balanced,
            _ => {
                btune_debug!("unknown perf_mode {id}, using COMP");
                PerfMode::Comp
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PerfMode::Comp => "COMP",
            PerfMode::Decomp => "DECOMP",
            PerfMode::Balanced => "BALANCED",
        }
    }
}

/// Which improvement predicate and codec candidate set are active.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CompMode {
    #[default]
    Hsp,
    Balanced,
    Hcr,
}

impl CompMode {
    pub fn from_id(id: i32) -> CompMode {
        match id {
            0 => CompMode::Hsp,
            1 => CompMode::Balanced,
            2 => CompMode::Hcr,
            _ => {
                btune_debug!("unknown comp_mode {id}, using HSP");
                CompMode::Hsp
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompMode::Hsp => "HSP",
            CompMode::Balanced => "BALANCED",
            CompMode::Hcr => "HCR",
        }
    }

    /// Default codec candidates for the mode.
    pub fn codecs(self) -> Vec<Codec> {
        match self {
            CompMode::Hsp => vec![Codec::BloscLz, Codec::Lz4],
            CompMode::Balanced => vec![Codec::BloscLz, Codec::Lz4, Codec::Zstd],
            CompMode::Hcr => vec![Codec::Zstd, Codec::Zlib],
        }
    }

    /// Highest compression level the mode allows for `codec`.
    pub fn max_clevel(self, codec: Codec) -> i32 {
        match self {
            CompMode::Hcr => 6,
            CompMode::Balanced if matches!(codec, Codec::Zstd | Codec::Zlib) => 3,
            _ => crate::config::MAX_CLEVEL,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Schedule behaviour
// ─────────────────────────────────────────────────────────────────────────────

/// What happens once the initial readapt schedule has completed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RepeatMode {
    /// Freeze on the current best; no further exploration.
    #[default]
    Stop,
    /// Keep cycling soft readapts only.
    RepeatSoft,
    /// Keep cycling the full hard/soft/wait schedule.
    RepeatAll,
}

impl RepeatMode {
    pub fn from_id(id: i32) -> RepeatMode {
        match id {
            0 => RepeatMode::Stop,
            1 => RepeatMode::RepeatSoft,
            2 => RepeatMode::RepeatAll,
            _ => {
                btune_debug!("unknown repeat_mode {id}, using STOP");
                RepeatMode::Stop
            }
        }
    }
}

/// Readapt scheduling budgets.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Behaviour {
    /// Wait chunks interposed before each readapt decision (0 = none).
    pub nwaits_before_readapt: u32,
    /// Soft readapts run between consecutive hard readapts.
    pub nsofts_before_hard: u32,
    /// Hard readapts in the initial schedule (and per repeat-all cycle).
    pub nhards_before_stop: u32,
    pub repeat_mode: RepeatMode,
}

impl Default for Behaviour {
    fn default() -> Self {
        Behaviour {
            nwaits_before_readapt: 0,
            nsofts_before_hard: 5,
            nhards_before_stop: 10,
            repeat_mode: RepeatMode::Stop,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tuner configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable-after-attach tuner configuration. Setters chain, so hosts can
/// build a config in one expression.
pub struct TunerConfig {
    /// Transfer bandwidth in kilobytes per second; weights byte volume
    /// against time in the score. Must be positive.
    pub bandwidth: u32,
    pub perf_mode: PerfMode,
    pub comp_mode: CompMode,
    pub behaviour: Behaviour,
    /// Seed the initial best from host-provided parameters instead of the
    /// built-in default.
    pub cparams_hint: bool,
    /// Ceiling for both thread counts. Defaults to the machine's CPU count.
    pub max_threads: usize,
    /// Append the ByteDelta filter to the candidate list.
    pub use_bytedelta: bool,
    // Phase toggles. Shuffle-unit, blocksize and memcpy exploration default
    // to off; level and thread exploration default to on.
    pub tune_shufflesize: bool,
    pub tune_threads: bool,
    pub tune_clevel: bool,
    pub tune_blocksize: bool,
    pub tune_memcpy: bool,
    /// Host-injected classifier for the chunk-0 bootstrap. When absent the
    /// adapter consults the `BTUNE_MODEL_*` environment.
    pub predictor: Option<Box<dyn Predictor>>,
    /// Host-injected normalization stats and category table. When absent
    /// the adapter consults `BTUNE_METADATA`.
    pub metadata: Option<Metadata>,
}

impl Default for TunerConfig {
    fn default() -> Self {
        TunerConfig {
            bandwidth: DEFAULT_BANDWIDTH,
            perf_mode: PerfMode::default(),
            comp_mode: CompMode::default(),
            behaviour: Behaviour::default(),
            cparams_hint: false,
            max_threads: num_cpus::get().max(1),
            use_bytedelta: false,
            tune_shufflesize: false,
            tune_threads: true,
            tune_clevel: true,
            tune_blocksize: false,
            tune_memcpy: false,
            predictor: None,
            metadata: None,
        }
    }
}

impl TunerConfig {
    pub fn new() -> Self {
        TunerConfig::default()
    }

    pub fn set_bandwidth(&mut self, kbps: u32) -> &mut Self {
        if kbps == 0 {
            btune_debug!("bandwidth must be positive, keeping {}", self.bandwidth);
        } else {
            self.bandwidth = kbps;
        }
        self
    }

    pub fn set_perf_mode(&mut self, mode: PerfMode) -> &mut Self {
        self.perf_mode = mode;
        self
    }

    pub fn set_comp_mode(&mut self, mode: CompMode) -> &mut Self {
        self.comp_mode = mode;
        self
    }

    pub fn set_behaviour(&mut self, behaviour: Behaviour) -> &mut Self {
        self.behaviour = behaviour;
        self
    }

    pub fn set_cparams_hint(&mut self, hint: bool) -> &mut Self {
        self.cparams_hint = hint;
        self
    }

    pub fn set_max_threads(&mut self, n: usize) -> &mut Self {
        self.max_threads = n.max(1);
        self
    }

    pub fn set_use_bytedelta(&mut self, on: bool) -> &mut Self {
        self.use_bytedelta = on;
        self
    }

    pub fn set_tune_shufflesize(&mut self, on: bool) -> &mut Self {
        self.tune_shufflesize = on;
        self
    }

    pub fn set_tune_threads(&mut self, on: bool) -> &mut Self {
        self.tune_threads = on;
        self
    }

    pub fn set_tune_clevel(&mut self, on: bool) -> &mut Self {
        self.tune_clevel = on;
        self
    }

    pub fn set_tune_blocksize(&mut self, on: bool) -> &mut Self {
        self.tune_blocksize = on;
        self
    }

    pub fn set_tune_memcpy(&mut self, on: bool) -> &mut Self {
        self.tune_memcpy = on;
        self
    }

    pub fn set_predictor(&mut self, predictor: Box<dyn Predictor>) -> &mut Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn set_metadata(&mut self, metadata: Metadata) -> &mut Self {
        self.metadata = Some(metadata);
        self
    }

    /// Default filter candidates under this configuration.
    pub fn filters(&self) -> Vec<Filter> {
        let mut filters = vec![Filter::NoFilter, Filter::Shuffle, Filter::BitShuffle];
        if self.use_bytedelta {
            filters.push(Filter::ByteDelta);
        }
        filters
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trial parameter record
// ─────────────────────────────────────────────────────────────────────────────

/// One complete parameter set plus the measurements observed with it.
/// The tuner owns exactly two: the current best and the working trial.
#[derive(Clone, Debug)]
pub struct Cparams {
    pub codec: Codec,
    pub filter: Filter,
    pub splitmode: SplitMode,
    pub clevel: i32,
    /// 0 means "let the auto-blocksize rule decide".
    pub blocksize: usize,
    pub shufflesize: u32,
    pub nthreads_comp: usize,
    pub nthreads_decomp: usize,
    // Exploration directions, one per monotonic parameter.
    pub clevel_dir: Direction,
    pub blocksize_dir: Direction,
    pub shufflesize_dir: Direction,
    pub nthreads_dir: Direction,
    // Measurements from the chunk this parameter set compressed.
    pub score: f64,
    pub cratio: f64,
    pub ctime: f64,
    pub dtime: f64,
}

impl Cparams {
    /// Built-in starting point used when no hint is given: a fast,
    /// shuffle-friendly configuration the first hard sweep refines.
    pub fn default_params(nthreads_comp: usize, nthreads_decomp: usize) -> Self {
        Cparams {
            codec: Codec::Lz4,
            filter: Filter::Shuffle,
            splitmode: SplitMode::AlwaysSplit,
            clevel: 9,
            blocksize: 0,
            shufflesize: MIN_SHUFFLE,
            nthreads_comp,
            nthreads_decomp,
            clevel_dir: Direction::Down,
            blocksize_dir: Direction::Up,
            shufflesize_dir: Direction::Up,
            nthreads_dir: Direction::Up,
            score: f64::INFINITY,
            cratio: 0.0,
            ctime: 0.0,
            dtime: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_ids_round_trip() {
        for codec in [Codec::BloscLz, Codec::Lz4, Codec::Lz4Hc, Codec::Zlib, Codec::Zstd] {
            assert_eq!(Codec::from_id(codec as i32), Some(codec));
        }
        assert_eq!(Codec::from_id(99), None);
    }

    #[test]
    fn filter_min_shuffle_depends_on_kind() {
        assert_eq!(Filter::BitShuffle.min_shuffle(), MIN_BITSHUFFLE);
        assert_eq!(Filter::Shuffle.min_shuffle(), MIN_SHUFFLE);
        assert_eq!(Filter::NoFilter.min_shuffle(), MIN_SHUFFLE);
    }

    #[test]
    fn unknown_mode_ids_fall_back_to_defaults() {
        assert_eq!(PerfMode::from_id(42), PerfMode::Comp);
        assert_eq!(CompMode::from_id(-1), CompMode::Hsp);
        assert_eq!(RepeatMode::from_id(7), RepeatMode::Stop);
    }

    #[test]
    fn hcr_caps_clevel_at_six() {
        assert_eq!(CompMode::Hcr.max_clevel(Codec::Zstd), 6);
        assert_eq!(CompMode::Hcr.max_clevel(Codec::BloscLz), 6);
    }

    #[test]
    fn balanced_caps_ratio_codecs_at_three() {
        assert_eq!(CompMode::Balanced.max_clevel(Codec::Zstd), 3);
        assert_eq!(CompMode::Balanced.max_clevel(Codec::Zlib), 3);
        assert_eq!(CompMode::Balanced.max_clevel(Codec::Lz4), 9);
    }

    #[test]
    fn hcr_candidates_are_ratio_codecs() {
        assert_eq!(CompMode::Hcr.codecs(), vec![Codec::Zstd, Codec::Zlib]);
    }

    #[test]
    fn config_setters_chain() {
        let mut config = TunerConfig::new();
        config
            .set_bandwidth(1000)
            .set_perf_mode(PerfMode::Balanced)
            .set_max_threads(4);
        assert_eq!(config.bandwidth, 1000);
        assert_eq!(config.perf_mode, PerfMode::Balanced);
        assert_eq!(config.max_threads, 4);
    }

    #[test]
    fn zero_bandwidth_is_rejected() {
        let mut config = TunerConfig::new();
        config.set_bandwidth(0);
        assert_eq!(config.bandwidth, DEFAULT_BANDWIDTH);
    }

    #[test]
    fn bytedelta_extends_filter_candidates() {
        let mut config = TunerConfig::new();
        assert_eq!(config.filters().len(), 3);
        config.set_use_bytedelta(true);
        assert!(config.filters().contains(&Filter::ByteDelta));
    }
}
