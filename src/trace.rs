// trace.rs — Environment-driven diagnostics.
//
// Two switches, both read once per process:
//   BTUNE_LOG    — when present, every trial prints one table row on stdout.
//   BTUNE_DEBUG  — when present, `btune_debug!` diagnostics go to stderr.

use std::sync::OnceLock;

static LOG_ENABLED: OnceLock<bool> = OnceLock::new();
static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// `true` when the per-trial table was requested via `BTUNE_LOG`.
#[inline]
pub fn log_enabled() -> bool {
    *LOG_ENABLED.get_or_init(|| std::env::var_os("BTUNE_LOG").is_some())
}

/// `true` when stderr diagnostics were requested via `BTUNE_DEBUG`.
#[inline]
pub fn debug_enabled() -> bool {
    *DEBUG_ENABLED.get_or_init(|| std::env::var_os("BTUNE_DEBUG").is_some())
}

/// Print a diagnostic line to stderr when `BTUNE_DEBUG` is set.
#[macro_export]
macro_rules! btune_debug {
    ($($arg:tt)*) => {
        if $crate::trace::debug_enabled() {
            eprint!("btune: ");
            eprintln!($($arg)*);
        }
    };
}

/// Column header for the trial table. Printed once, before the first row.
pub fn print_trial_header() {
    if log_enabled() {
        println!(
            "|    Codec | Filter | Split | C.Level | Blocksize | Shufflesize | \
             C.Threads | D.Threads |      Score |  C.Ratio |        State | Readapt | Winner"
        );
    }
}

/// One row of the trial table. `winner` is `W` (new best), `-` (no change)
/// or `S` (special/constant chunk).
#[allow(clippy::too_many_arguments)]
pub fn print_trial_row(
    codec: &str,
    filter: &str,
    split: u8,
    clevel: i32,
    blocksize: usize,
    shufflesize: u32,
    cthreads: usize,
    dthreads: usize,
    score: f64,
    cratio: f64,
    state: &str,
    readapt: &str,
    winner: char,
) {
    if log_enabled() {
        println!(
            "| {codec:>8} | {filter:>6} | {split:>5} | {clevel:>7} | {blocksize:>9} | \
             {shufflesize:>11} | {cthreads:>9} | {dthreads:>9} | {score:>10.3e} | \
             {cratio:>7.2}x | {state:>12} | {readapt:>7} | {winner}"
        );
    }
}
