//! Shared harness for the integration tests: a deterministic fake host
//! that "compresses" chunks with outcomes derived from the proposed
//! parameters, so schedules play out the same way on every machine.

// Not every test binary uses every helper.
#![allow(dead_code)]

use btune::{Btune, Cctx, Codec, Dctx, Filter, SplitMode, TunerState, FILTER_PIPELINE_SLOTS};

/// What one chunk was compressed with, captured before `update` ran.
#[derive(Clone, Debug)]
pub struct Trial {
    pub codec: Codec,
    pub filter: Filter,
    /// Filter in the slot right before the primary one.
    pub companion_filter: Filter,
    /// Meta byte of the primary filter slot.
    pub primary_meta: u8,
    pub splitmode: SplitMode,
    pub clevel: i32,
    pub blocksize: usize,
    pub nthreads_comp: usize,
    pub nthreads_decomp: usize,
    pub state: TunerState,
    pub destsize: usize,
}

/// Deterministic performance model of the fake host.
///
/// Ratio and speed react to codec, filter, split, level and thread count the
/// way a real stack roughly would: ratio codecs compress better but slower,
/// filters help ratio, levels trade speed for ratio, threads cut wall time.
pub fn mixed_outcome(cctx: &Cctx<'_>, dctx: &Dctx) -> (usize, f64, f64) {
    let n = cctx.sourcesize() as f64;

    // Level 0 is a plain copy: no size win, very fast.
    if cctx.clevel == 0 {
        let ctime = n / 2e9;
        let decomp_scale = (dctx.new_nthreads.max(1) as f64).powf(0.8);
        return (n as usize, ctime, n / (2e9 * decomp_scale));
    }

    let base_ratio = match cctx.compcode {
        Codec::BloscLz => 1.8,
        Codec::Lz4 => 2.2,
        Codec::Lz4Hc => 2.8,
        Codec::Zlib => 3.2,
        Codec::Zstd => 3.6,
    };
    let filter_gain = match cctx.primary_filter() {
        Filter::NoFilter => 1.0,
        Filter::Shuffle => 1.35,
        Filter::BitShuffle => 1.25,
        Filter::ByteDelta => 1.3,
    };
    // Wider shuffle units help a little on this data.
    let shuffle_unit_gain = match cctx.primary_filter() {
        Filter::Shuffle | Filter::BitShuffle => {
            1.0 + 0.015 * cctx.filters_meta[FILTER_PIPELINE_SLOTS - 1] as f64
        }
        _ => 1.0,
    };
    let split_gain = match cctx.splitmode {
        SplitMode::AlwaysSplit => 1.0,
        SplitMode::NeverSplit => 0.97,
    };
    let level_gain = 1.0 + 0.06 * cctx.clevel as f64;
    let ratio = base_ratio * filter_gain * shuffle_unit_gain * split_gain * level_gain;
    let destsize = (n / ratio).max(64.0) as usize;

    let base_speed = match cctx.compcode {
        Codec::BloscLz => 900e6,
        Codec::Lz4 => 800e6,
        Codec::Lz4Hc => 300e6,
        Codec::Zlib => 150e6,
        Codec::Zstd => 250e6,
    };
    let speed = base_speed / (1.0 + 0.25 * cctx.clevel as f64);
    let comp_scale = (cctx.new_nthreads.max(1) as f64).powf(0.8);
    let ctime = n / (speed * comp_scale);

    let decomp_scale = (dctx.new_nthreads.max(1) as f64).powf(0.8);
    let dtime = n / (1.2e9 * decomp_scale);

    (destsize, ctime, dtime)
}

/// A constant chunk compresses down to the container overhead: no signal.
pub fn constant_outcome(cctx: &Cctx<'_>, _dctx: &Dctx) -> (usize, f64, f64) {
    let _ = cctx;
    (34, 1e-5, 0.0)
}

/// Drive `tuner` for `nchunks` chunks of `chunk`, collecting every trial.
pub fn drive<F>(
    tuner: &mut Btune,
    chunk: &[u8],
    typesize: usize,
    nchunks: usize,
    mut outcome: F,
) -> Vec<Trial>
where
    F: FnMut(&Cctx<'_>, &Dctx) -> (usize, f64, f64),
{
    let mut dctx = Dctx::new(1);
    let mut comp_threads = 1;
    let mut trials = Vec::with_capacity(nchunks);
    for _ in 0..nchunks {
        let mut cctx = Cctx::new(chunk, typesize);
        cctx.nthreads = comp_threads;
        tuner.next_cparams(&mut cctx, Some(&mut dctx));
        let (destsize, ctime, dtime) = outcome(&cctx, &dctx);
        cctx.destsize = destsize;
        cctx.dtime = dtime;
        trials.push(Trial {
            codec: cctx.compcode,
            filter: cctx.primary_filter(),
            companion_filter: cctx.filters[FILTER_PIPELINE_SLOTS - 2],
            primary_meta: cctx.filters_meta[FILTER_PIPELINE_SLOTS - 1],
            splitmode: cctx.splitmode,
            clevel: cctx.clevel,
            blocksize: cctx.blocksize,
            nthreads_comp: cctx.new_nthreads,
            nthreads_decomp: dctx.new_nthreads,
            state: tuner.state(),
            destsize,
        });
        tuner.update(&cctx, ctime);
        // The host applies the emitted thread counts before the next chunk.
        comp_threads = cctx.new_nthreads;
        dctx.nthreads = dctx.new_nthreads;
    }
    trials
}
