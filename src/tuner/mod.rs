//! The tuner facade.
//!
//! A [`Btune`] instance rides along with one host compression context. The
//! host drives it with a strict per-chunk cadence: `next_cparams` writes the
//! trial parameters into the context, the host compresses the chunk, and
//! `update` feeds the outcome back so the tuner can score the trial and move
//! its exploration forward. Dropping the tuner releases everything it owns.

pub mod blocksize;
pub mod direction;
pub mod params;
mod proposer;
pub mod score;
pub mod state;

use crate::btune_debug;
use crate::config::{
    HARD_STEP_SIZE, MAX_CLEVEL, MAX_SHUFFLE, MIN_CLEVEL, MIN_THREADS, PROBE_BLOCK_SIZE,
    REPEATS_PER_CPARAMS, SOFT_STEP_SIZE,
};
use crate::context::{Cctx, Dctx, FILTER_PIPELINE_SLOTS};
use crate::trace;
use blocksize::auto_blocksize;
use params::{Codec, Cparams, Filter, PerfMode, TunerConfig};
use state::{ReadaptFrom, State};

/// Online auto-tuner for a chunked-compression pipeline.
///
/// All state lives in the instance; the only process-wide coupling is the
/// handful of `BTUNE_*` environment switches, each read once.
pub struct Btune {
    config: TunerConfig,
    /// Best parameter set observed so far, with its measurements.
    best: Box<Cparams>,
    /// Working copy the current trial runs with; cloned from `best` on each
    /// proposal.
    aux: Box<Cparams>,
    state: State,
    readapt_from: ReadaptFrom,
    step_size: u32,
    /// Trials proposed inside the current phase.
    aux_index: u32,
    // N-sample aggregation of trial measurements.
    rep_index: u32,
    rep_score: f64,
    rep_cratio: f64,
    rep_ctime: f64,
    rep_dtime: f64,
    nsofts: u32,
    nhards: u32,
    nwaitings: u32,
    is_repeating: bool,
    /// Whether the threads phase is varying the compression-side count.
    threads_for_comp: bool,
    /// Active candidate sets; chunk-0 inference may narrow them.
    codecs: Vec<Codec>,
    filters: Vec<Filter>,
    typesize: usize,
    sourcesize: usize,
    nchunk: u64,
    inference_done: bool,
    header_printed: bool,
}

impl Btune {
    /// Create a tuner attached to `cctx`. When the configuration asks for a
    /// parameter hint, the initial best is seeded from the context instead
    /// of the built-in default.
    pub fn new(config: TunerConfig, cctx: &Cctx<'_>) -> Btune {
        let nthreads = cctx.nthreads.clamp(MIN_THREADS, config.max_threads);
        let mut best = if config.cparams_hint {
            seed_from_hint(cctx, nthreads)
        } else {
            Cparams::default_params(nthreads, nthreads)
        };
        best.clevel = best
            .clevel
            .clamp(MIN_CLEVEL, config.comp_mode.max_clevel(best.codec));

        let (state, readapt_from, step_size) = if config.cparams_hint {
            // Emit the hint untouched first; the wait budget then hands over
            // to the soft schedule.
            (State::Waiting, ReadaptFrom::Wait, SOFT_STEP_SIZE)
        } else {
            // The seed hard sweep; a one-hard schedule explores finely.
            let step = if config.behaviour.nhards_before_stop == 1 {
                SOFT_STEP_SIZE
            } else {
                HARD_STEP_SIZE
            };
            (State::CodecFilter, ReadaptFrom::Hard, step)
        };

        let codecs = config.comp_mode.codecs();
        let filters = config.filters();
        let threads_for_comp = config.perf_mode != PerfMode::Decomp;
        let aux = best.clone();

        Btune {
            best: Box::new(best),
            aux: Box::new(aux),
            state,
            readapt_from,
            step_size,
            aux_index: 0,
            rep_index: 0,
            rep_score: 0.0,
            rep_cratio: 0.0,
            rep_ctime: 0.0,
            rep_dtime: 0.0,
            nsofts: 0,
            nhards: 0,
            nwaitings: 0,
            is_repeating: false,
            threads_for_comp,
            codecs,
            filters,
            typesize: cctx.typesize.max(1),
            sourcesize: cctx.sourcesize(),
            nchunk: 0,
            inference_done: false,
            header_printed: false,
            config,
        }
    }

    /// Refresh the context blocksize from the current best (resolving the
    /// automatic rule when the best leaves it open).
    pub fn next_blocksize(&self, cctx: &mut Cctx<'_>) {
        cctx.blocksize = if self.best.blocksize == 0 {
            auto_blocksize(
                cctx.sourcesize(),
                cctx.typesize.max(1),
                self.best.clevel,
                self.best.codec.is_ratio_oriented(),
            )
        } else {
            self.best.blocksize
        };
    }

    /// Propose the parameters for the next chunk and write them into the
    /// host contexts.
    pub fn next_cparams(&mut self, cctx: &mut Cctx<'_>, mut dctx: Option<&mut Dctx>) {
        self.typesize = cctx.typesize.max(1);
        self.sourcesize = cctx.sourcesize();

        // One-shot model-guided bootstrap over the first chunk.
        if !self.inference_done {
            self.inference_done = true;
            self.bootstrap_codec_filter(cctx);
        }

        if !self.header_printed {
            self.header_printed = true;
            trace::print_trial_header();
        }

        self.propose();
        self.write_cparams(cctx, dctx.as_deref_mut());
    }

    /// Record the outcome of the chunk just compressed with the proposed
    /// parameters and advance the exploration.
    pub fn update(&mut self, cctx: &Cctx<'_>, ctime: f64) {
        self.nchunk += 1;
        if self.state == State::Stop {
            return;
        }

        let cbytes = cctx.destsize.max(1);
        let cratio = cctx.sourcesize() as f64 / cbytes as f64;
        let score = score::score(
            ctime,
            cbytes,
            cctx.dtime,
            self.config.bandwidth,
            self.config.perf_mode,
        );
        debug_assert!(score > 0.0, "score must be positive, got {score}");

        // N-sample aggregation; with a single sample per decision the mean
        // is the sample itself.
        self.rep_score += score;
        self.rep_cratio += cratio;
        self.rep_ctime += ctime;
        self.rep_dtime += cctx.dtime;
        self.rep_index += 1;
        if self.rep_index < REPEATS_PER_CPARAMS {
            return;
        }
        let n = self.rep_index as f64;
        self.aux.score = self.rep_score / n;
        self.aux.cratio = self.rep_cratio / n;
        self.aux.ctime = self.rep_ctime / n;
        self.aux.dtime = self.rep_dtime / n;
        self.rep_index = 0;
        self.rep_score = 0.0;
        self.rep_cratio = 0.0;
        self.rep_ctime = 0.0;
        self.rep_dtime = 0.0;

        let special = score::is_special(cctx.destsize, cctx.typesize.max(1));
        let improved = !special && self.judge();
        let winner = if special {
            'S'
        } else if improved {
            'W'
        } else {
            '-'
        };
        self.log_trial(winner);

        if improved {
            *self.best = (*self.aux).clone();
        }
        self.advance(improved);
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Does the just-measured trial beat the best? The threads phase judges
    /// on raw times; everything else goes through the mode predicate.
    fn judge(&self) -> bool {
        if self.state == State::Threads {
            return if self.threads_for_comp {
                self.aux.ctime < self.best.ctime
            } else {
                self.aux.dtime < self.best.dtime
            };
        }
        // First real measurement: adopt unconditionally.
        if !self.best.score.is_finite() || self.best.cratio <= 0.0 {
            return true;
        }
        let score_coef = self.best.score / self.aux.score;
        let cratio_coef = self.aux.cratio / self.best.cratio;
        score::improved(self.config.comp_mode, score_coef, cratio_coef)
    }

    fn write_cparams(&self, cctx: &mut Cctx<'_>, dctx: Option<&mut Dctx>) {
        cctx.compcode = self.aux.codec;
        cctx.splitmode = self.aux.splitmode;
        cctx.clevel = self.aux.clevel;
        cctx.blocksize = self.aux.blocksize;
        cctx.set_filter(self.aux.filter, self.aux.shufflesize);
        cctx.new_nthreads = self.aux.nthreads_comp;
        if let Some(dctx) = dctx {
            dctx.new_nthreads = self.aux.nthreads_decomp;
        }
    }

    /// Chunk-0 inference: probe every block, let the classifier vote, and
    /// narrow the candidate sets to the winning pair. Every failure is soft.
    fn bootstrap_codec_filter(&mut self, cctx: &Cctx<'_>) {
        let block_size = if cctx.blocksize > 0 {
            cctx.blocksize
        } else {
            PROBE_BLOCK_SIZE
        };
        match crate::model::select_category(
            cctx.src,
            block_size,
            self.config.comp_mode,
            self.config.metadata.as_ref(),
            self.config.predictor.as_deref(),
        ) {
            Ok((codec, filter)) => {
                btune_debug!(
                    "inference selected codec={} filter={}",
                    codec.name(),
                    filter.name()
                );
                self.codecs = vec![codec];
                self.filters = vec![filter];
            }
            Err(err) => {
                btune_debug!("inference skipped: {err}");
            }
        }
    }

    fn log_trial(&self, winner: char) {
        trace::print_trial_row(
            self.aux.codec.name(),
            self.aux.filter.name(),
            self.aux.splitmode as u8,
            self.aux.clevel,
            self.aux.blocksize,
            self.aux.shufflesize,
            self.aux.nthreads_comp,
            self.aux.nthreads_decomp,
            self.aux.score,
            self.aux.cratio,
            self.state.name(),
            self.readapt_from.name(),
            winner,
        );
    }

    // ── Read-only views for hosts and tests ──────────────────────────────────

    pub fn state(&self) -> State {
        self.state
    }

    /// Snapshot of the current best parameter set.
    pub fn best_cparams(&self) -> Cparams {
        (*self.best).clone()
    }

    pub fn nhards(&self) -> u32 {
        self.nhards
    }

    pub fn nsofts(&self) -> u32 {
        self.nsofts
    }

    pub fn nwaitings(&self) -> u32 {
        self.nwaitings
    }

    pub fn is_repeating(&self) -> bool {
        self.is_repeating
    }

    /// Active codec candidates (possibly narrowed by inference).
    pub fn codecs(&self) -> &[Codec] {
        &self.codecs
    }

    /// Active filter candidates (possibly narrowed by inference).
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn chunks_seen(&self) -> u64 {
        self.nchunk
    }
}

/// Build the initial best from host-provided parameters.
fn seed_from_hint(cctx: &Cctx<'_>, nthreads: usize) -> Cparams {
    let mut params = Cparams::default_params(nthreads, nthreads);
    params.codec = cctx.compcode;
    params.filter = cctx.primary_filter();
    params.splitmode = cctx.splitmode;
    params.clevel = cctx.clevel.clamp(MIN_CLEVEL, MAX_CLEVEL);
    params.blocksize = cctx.blocksize;
    let meta = cctx.filters_meta[FILTER_PIPELINE_SLOTS - 1] as u32;
    if params.filter != Filter::ByteDelta
        && (1..=MAX_SHUFFLE).contains(&meta)
        && meta.is_power_of_two()
    {
        params.shufflesize = meta;
    }
    params
}
