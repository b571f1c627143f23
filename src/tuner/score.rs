//! Scoring and the improvement predicate.
//!
//! The score folds compression time, transfer time at the configured
//! bandwidth, and decompression time into one lower-is-better scalar. The
//! improvement predicate then compares a trial against the current best
//! through score and cratio ratios, with thresholds that depend on how
//! aggressively the active compression mode trades ratio for speed.

use crate::tuner::params::{CompMode, PerfMode};

/// Compute the figure of merit for one compressed chunk.
///
/// `ctime`/`dtime` are seconds, `cbytes` is the compressed size, `bandwidth`
/// is in kB/s. Strictly positive whenever the inputs are.
pub fn score(ctime: f64, cbytes: usize, dtime: f64, bandwidth: u32, perf_mode: PerfMode) -> f64 {
    let transfer = (cbytes as f64 / 1024.0) / bandwidth as f64;
    match perf_mode {
        PerfMode::Comp => ctime + transfer,
        PerfMode::Decomp => transfer + dtime,
        PerfMode::Balanced => ctime + transfer + dtime,
    }
}

// Threshold tables, evaluated as a disjunction in order: a trial improves
// when for any row `cratio_coef > row.0 && score_coef > row.1`. Rows trade
// the two coefficients off against each other; e.g. HSP accepts halving the
// ratio for a 2x score win.
const HSP_RULES: &[(f64, f64)] = &[(1.0, 1.0), (0.5, 2.0), (0.67, 1.3), (2.0, 0.7)];
const BALANCED_RULES: &[(f64, f64)] = &[(1.0, 1.0), (1.1, 0.8), (1.3, 0.5)];

/// Decide whether a trial beats the current best.
///
/// `score_coef = best.score / trial.score` and
/// `cratio_coef = trial.cratio / best.cratio`, so both are > 1 when the
/// trial is better on that axis.
pub fn improved(comp_mode: CompMode, score_coef: f64, cratio_coef: f64) -> bool {
    let rules = match comp_mode {
        CompMode::Hsp => HSP_RULES,
        CompMode::Balanced => BALANCED_RULES,
        CompMode::Hcr => return cratio_coef > 1.0,
    };
    rules
        .iter()
        .any(|&(cratio_th, score_th)| cratio_coef > cratio_th && score_coef > score_th)
}

/// A chunk whose compressed size does not exceed the container overhead plus
/// one element compressed to nothing; it carries no tuning signal.
pub fn is_special(cbytes: usize, typesize: usize) -> bool {
    cbytes <= crate::config::CHUNK_OVERHEAD + typesize
}
