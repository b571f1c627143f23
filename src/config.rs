// config.rs — Compile-time tuning constants and limits.
//
// Runtime-tunable knobs (bandwidth, schedule budgets, phase toggles) live in
// `tuner::params::TunerConfig`; everything here is fixed at build time.

pub const KB: usize = 1 << 10;
pub const MB: usize = 1 << 20;

// Compression-level range accepted by the host codecs.
pub const MIN_CLEVEL: i32 = 1;
pub const MAX_CLEVEL: i32 = 9;

// Block-size range explored by the blocksize phase. The upper bound is
// additionally clamped to the chunk size at proposal time.
pub const MIN_BLOCK: usize = 16 * KB;
pub const MAX_BLOCK: usize = 2 * 1024 * KB;

// L1 data-cache size assumed by the auto-blocksize rule.
pub const L1_CACHE_SIZE: usize = 32 * KB;

// Shuffle-unit bounds. Bitshuffle operates down to single bytes; plain
// shuffle needs at least two.
pub const MIN_BITSHUFFLE: u32 = 1;
pub const MIN_SHUFFLE: u32 = 2;
pub const MAX_SHUFFLE: u32 = 16;

pub const MIN_THREADS: usize = 1;

// Exploration step sizes: soft readapts move one notch, hard readapts two.
pub const SOFT_STEP_SIZE: u32 = 1;
pub const HARD_STEP_SIZE: u32 = 2;

// Ceiling on trials spent inside the thread-tuning phase, large enough to
// never bind on realistic `max_threads` values.
pub const MAX_STATE_THREADS: u32 = 50;

// Samples aggregated per tuning decision. The update path supports N-sample
// means; the shipping policy decides after every sample.
pub const REPEATS_PER_CPARAMS: u32 = 1;

// Fixed per-chunk container overhead added by the host compressor. A chunk
// whose compressed size does not exceed `CHUNK_OVERHEAD + typesize` carries
// no usable signal and is treated as a special (constant) chunk.
pub const CHUNK_OVERHEAD: usize = 32;

// Default bandwidth figure (kB/s) used to weight byte volume against time
// in the score when the host does not provide one.
pub const DEFAULT_BANDWIDTH: u32 = 57_600;

// Block size used by the chunk-0 entropy-probing pass when the host has not
// fixed one in the context yet.
pub const PROBE_BLOCK_SIZE: usize = 64 * KB;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_sizes_are_ordered() {
        assert!(SOFT_STEP_SIZE < HARD_STEP_SIZE);
    }

    #[test]
    fn block_bounds_are_sane() {
        assert!(MIN_BLOCK < MAX_BLOCK);
        assert_eq!(MIN_BLOCK % KB, 0);
    }

    #[test]
    fn shuffle_bounds_are_powers_of_two() {
        assert!(MIN_BITSHUFFLE.is_power_of_two());
        assert!(MIN_SHUFFLE.is_power_of_two());
        assert!(MAX_SHUFFLE.is_power_of_two());
    }
}
