//! Trial proposal: each call clones the current best into the working copy
//! and lets the active phase modify it, then clamps the result to the
//! mode-specific caps and resolves an automatic blocksize if one is due.

use crate::config::{MAX_BLOCK, MAX_CLEVEL, MAX_SHUFFLE, MIN_BLOCK, MIN_CLEVEL, MIN_THREADS};
use crate::tuner::blocksize::auto_blocksize;
use crate::tuner::params::{Codec, PerfMode, SplitMode};
use crate::tuner::state::{ReadaptFrom, State};
use crate::tuner::Btune;

impl Btune {
    /// Produce the next trial parameter set in `self.aux`.
    pub(crate) fn propose(&mut self) {
        *self.aux = (*self.best).clone();
        match self.state {
            State::CodecFilter => {
                self.aux_index += 1;
                self.propose_codec_filter();
            }
            State::ShuffleSize => {
                self.aux_index += 1;
                self.propose_shufflesize();
            }
            State::Threads => {
                self.aux_index += 1;
                self.propose_threads();
            }
            State::Clevel => {
                self.aux_index += 1;
                self.propose_clevel();
            }
            State::Blocksize => {
                self.aux_index += 1;
                self.propose_blocksize();
            }
            State::Memcpy => {
                self.aux_index += 1;
                self.aux.clevel = 0;
            }
            // Holding states re-emit the best unchanged.
            State::Waiting | State::Stop => {}
        }
        self.apply_caps();
    }

    /// Enumerate the `codecs × filters × splits` product, one combination
    /// per trial.
    fn propose_codec_filter(&mut self) {
        let ncodecs = self.codecs.len();
        let nfilters = self.filters.len();
        let total = ncodecs * nfilters * 2;
        let index = ((self.aux_index - 1) as usize) % total;

        let split = if index / (ncodecs * nfilters) == 0 {
            SplitMode::AlwaysSplit
        } else {
            SplitMode::NeverSplit
        };
        let rem = index % (ncodecs * nfilters);
        let codec = self.codecs[rem / nfilters];
        let filter = self.filters[rem % nfilters];

        self.aux.codec = codec;
        self.aux.filter = filter;
        // BloscLZ only ships split streams.
        self.aux.splitmode = if codec == Codec::BloscLz {
            SplitMode::AlwaysSplit
        } else {
            split
        };

        // Ratio codecs are too slow at high levels to be comparable against
        // the fast candidates during the opening enumeration; pin them to a
        // mid level until the first hard sweep has completed.
        if matches!(codec, Codec::Zstd | Codec::Zlib)
            && self.config.perf_mode != PerfMode::Decomp
            && self.nhards == 0
        {
            self.aux.clevel = 3;
        }
    }

    /// Double or halve the shuffle unit within the filter's legal range.
    fn propose_shufflesize(&mut self) {
        let min = self.aux.filter.min_shuffle();
        if self.aux.shufflesize_dir.is_up() {
            if self.aux.shufflesize < MAX_SHUFFLE {
                self.aux.shufflesize *= 2;
            }
        } else if self.aux.shufflesize > min {
            self.aux.shufflesize /= 2;
        }
    }

    /// Step the worker count on the side the phase is currently tuning.
    fn propose_threads(&mut self) {
        let hi = self.config.max_threads;
        let dir = self.aux.nthreads_dir;
        let step = move |n: usize| {
            if dir.is_up() {
                if n < hi {
                    n + 1
                } else {
                    n
                }
            } else if n > MIN_THREADS {
                n - 1
            } else {
                n
            }
        };
        if self.threads_for_comp {
            self.aux.nthreads_comp = step(self.aux.nthreads_comp);
        } else {
            self.aux.nthreads_decomp = step(self.aux.nthreads_decomp);
        }
    }

    /// Step the compression level by the sweep's step size.
    fn propose_clevel(&mut self) {
        // A hard sweep re-derives the blocksize for every level it tries.
        if self.readapt_from == ReadaptFrom::Hard {
            self.aux.blocksize = 0;
        }
        let step = self.step_size as i32;
        self.aux.clevel = if self.aux.clevel_dir.is_up() {
            (self.aux.clevel + step).min(MAX_CLEVEL)
        } else {
            (self.aux.clevel - step).max(MIN_CLEVEL)
        };
        if self.aux.clevel == MAX_CLEVEL && self.aux.codec == Codec::Zstd {
            self.aux.clevel = MAX_CLEVEL - 1;
        }
    }

    /// Shift the blocksize within `[MIN_BLOCK, min(MAX_BLOCK, sourcesize)]`.
    fn propose_blocksize(&mut self) {
        let hi = MAX_BLOCK.min(self.sourcesize.max(MIN_BLOCK));
        let mut blocksize = self.aux.blocksize;
        if blocksize == 0 {
            blocksize = auto_blocksize(
                self.sourcesize,
                self.typesize,
                self.aux.clevel,
                self.aux.codec.is_ratio_oriented(),
            );
        }
        if self.aux.blocksize_dir.is_up() {
            let next = blocksize << self.step_size;
            if next <= hi {
                blocksize = next;
            }
        } else {
            let next = blocksize >> self.step_size;
            if next >= MIN_BLOCK {
                blocksize = next;
            }
        }
        if blocksize > self.typesize {
            blocksize -= blocksize % self.typesize;
        }
        self.aux.blocksize = blocksize.max(1);
    }

    /// Clamp the proposal to the mode caps and resolve an automatic
    /// blocksize. Runs after every phase mutation.
    fn apply_caps(&mut self) {
        let cap = self.config.comp_mode.max_clevel(self.aux.codec);
        // Memcpy trials carry clevel 0 on purpose; only cap from above.
        if self.aux.clevel > cap {
            self.aux.clevel = cap;
        }
        if self.aux.clevel == MAX_CLEVEL && self.aux.codec == Codec::Zstd {
            self.aux.clevel = MAX_CLEVEL - 1;
        }
        if self.aux.blocksize == 0 {
            self.aux.blocksize = auto_blocksize(
                self.sourcesize,
                self.typesize,
                self.aux.clevel,
                self.aux.codec.is_ratio_oriented(),
            );
        }
    }
}
