//! Host-facing compression and decompression context contract.
//!
//! The tuner never compresses anything itself; it reads chunk facts out of
//! these structs and writes parameter choices back into them. A context
//! borrows the chunk it is currently working on, so the tuner cannot retain
//! host buffers across calls.

use crate::tuner::params::{Codec, Filter, SplitMode};

/// Number of slots in the host filter pipeline.
pub const FILTER_PIPELINE_SLOTS: usize = 6;

/// Compression-side context. The host fills `src`, `typesize` and `nthreads`
/// before each chunk, runs the compressor with the parameters the tuner wrote,
/// then reports `destsize` (and optionally `dtime`) back through `update`.
pub struct Cctx<'a> {
    /// The chunk about to be (or just) compressed.
    pub src: &'a [u8],
    /// Element width in bytes; blocksizes are kept multiples of this.
    pub typesize: usize,
    pub compcode: Codec,
    /// Filter pipeline; the tuner writes the primary filter into the last slot.
    pub filters: [Filter; FILTER_PIPELINE_SLOTS],
    pub filters_meta: [u8; FILTER_PIPELINE_SLOTS],
    pub splitmode: SplitMode,
    pub clevel: i32,
    pub blocksize: usize,
    /// Worker count currently in use by the host pool.
    pub nthreads: usize,
    /// Worker count the host should switch to before the next chunk.
    pub new_nthreads: usize,
    /// Compressed size of the last chunk, set by the host after compressing.
    pub destsize: usize,
    /// Seconds the host spent decompressing the last chunk, when it times
    /// that at all. Left at 0.0 otherwise.
    pub dtime: f64,
}

impl<'a> Cctx<'a> {
    /// A context with host-neutral starting parameters for `src`.
    pub fn new(src: &'a [u8], typesize: usize) -> Self {
        Cctx {
            src,
            typesize: typesize.max(1),
            compcode: Codec::Lz4,
            filters: [Filter::NoFilter; FILTER_PIPELINE_SLOTS],
            filters_meta: [0; FILTER_PIPELINE_SLOTS],
            splitmode: SplitMode::AlwaysSplit,
            clevel: 5,
            blocksize: 0,
            nthreads: 1,
            new_nthreads: 1,
            destsize: 0,
            dtime: 0.0,
        }
    }

    /// Re-point the context at the next chunk.
    pub fn set_chunk(&mut self, src: &'a [u8]) {
        self.src = src;
        self.destsize = 0;
        self.dtime = 0.0;
    }

    pub fn sourcesize(&self) -> usize {
        self.src.len()
    }

    /// The filter in the primary (last) pipeline slot.
    pub fn primary_filter(&self) -> Filter {
        self.filters[FILTER_PIPELINE_SLOTS - 1]
    }

    /// Install `filter` according to the slot protocol: the primary filter
    /// goes in the last slot; ByteDelta additionally needs a Shuffle stage
    /// right before it and carries the typesize in its meta byte.
    pub fn set_filter(&mut self, filter: Filter, shufflesize: u32) {
        let last = FILTER_PIPELINE_SLOTS - 1;
        self.filters[last] = filter;
        if filter == Filter::ByteDelta {
            self.filters[last - 1] = Filter::Shuffle;
            self.filters_meta[last] = self.typesize.min(u8::MAX as usize) as u8;
            self.filters_meta[last - 1] = 0;
        } else {
            self.filters[last - 1] = Filter::NoFilter;
            self.filters_meta[last - 1] = 0;
            self.filters_meta[last] = match filter {
                Filter::Shuffle | Filter::BitShuffle => shufflesize.min(u8::MAX as u32) as u8,
                _ => 0,
            };
        }
    }
}

/// Decompression-side context; the tuner only steers its worker count.
#[derive(Debug, Clone, Copy)]
pub struct Dctx {
    pub nthreads: usize,
    pub new_nthreads: usize,
}

impl Dctx {
    pub fn new(nthreads: usize) -> Self {
        Dctx {
            nthreads,
            new_nthreads: nthreads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_filter_lands_in_last_slot() {
        let chunk = [0u8; 64];
        let mut cctx = Cctx::new(&chunk, 4);
        cctx.set_filter(Filter::BitShuffle, 8);
        assert_eq!(cctx.primary_filter(), Filter::BitShuffle);
        assert_eq!(cctx.filters_meta[FILTER_PIPELINE_SLOTS - 1], 8);
        assert_eq!(cctx.filters[FILTER_PIPELINE_SLOTS - 2], Filter::NoFilter);
    }

    #[test]
    fn bytedelta_installs_shuffle_companion() {
        let chunk = [0u8; 64];
        let mut cctx = Cctx::new(&chunk, 4);
        cctx.set_filter(Filter::ByteDelta, 2);
        let last = FILTER_PIPELINE_SLOTS - 1;
        assert_eq!(cctx.filters[last], Filter::ByteDelta);
        assert_eq!(cctx.filters[last - 1], Filter::Shuffle);
        assert_eq!(cctx.filters_meta[last], 4);
    }

    #[test]
    fn switching_back_from_bytedelta_clears_companion_slot() {
        let chunk = [0u8; 64];
        let mut cctx = Cctx::new(&chunk, 4);
        cctx.set_filter(Filter::ByteDelta, 2);
        cctx.set_filter(Filter::Shuffle, 4);
        assert_eq!(cctx.filters[FILTER_PIPELINE_SLOTS - 2], Filter::NoFilter);
        assert_eq!(cctx.filters_meta[FILTER_PIPELINE_SLOTS - 1], 4);
    }

    #[test]
    fn set_chunk_resets_last_chunk_facts() {
        let a = [1u8; 32];
        let b = [2u8; 48];
        let mut cctx = Cctx::new(&a, 1);
        cctx.destsize = 10;
        cctx.dtime = 0.5;
        cctx.set_chunk(&b);
        assert_eq!(cctx.sourcesize(), 48);
        assert_eq!(cctx.destsize, 0);
        assert_eq!(cctx.dtime, 0.0);
    }
}
