//! Phase sequencing and readapt scheduling.
//!
//! A tuning run is a sequence of sweeps. A hard sweep starts at codec/filter
//! enumeration and walks every enabled phase; a soft sweep only nudges the
//! compression level (and optionally the blocksize). Between sweeps the tuner
//! sits in `Waiting` until the schedule budgets decide what to run next, and
//! eventually it parks in `Stop`.

use crate::btune_debug;
use crate::config::{
    HARD_STEP_SIZE, MAX_BLOCK, MAX_CLEVEL, MAX_SHUFFLE, MAX_STATE_THREADS, MIN_BLOCK, MIN_CLEVEL,
    MIN_THREADS, SOFT_STEP_SIZE,
};
use crate::tuner::direction::{additive_ended, geometric_ended, shift_ended};
use crate::tuner::params::{Filter, PerfMode, RepeatMode};
use crate::tuner::Btune;

/// Exploration phase the tuner is currently in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    CodecFilter,
    ShuffleSize,
    Threads,
    Clevel,
    Blocksize,
    Memcpy,
    Waiting,
    Stop,
}

impl State {
    pub fn name(self) -> &'static str {
        match self {
            State::CodecFilter => "CODEC_FILTER",
            State::ShuffleSize => "SHUFFLE_SIZE",
            State::Threads => "THREADS",
            State::Clevel => "CLEVEL",
            State::Blocksize => "BLOCKSIZE",
            State::Memcpy => "MEMCPY",
            State::Waiting => "WAITING",
            State::Stop => "STOP",
        }
    }
}

/// Which kind of readapt the current sweep belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReadaptFrom {
    Hard,
    Soft,
    Wait,
}

impl ReadaptFrom {
    pub fn name(self) -> &'static str {
        match self {
            ReadaptFrom::Hard => "HARD",
            ReadaptFrom::Soft => "SOFT",
            ReadaptFrom::Wait => "WAIT",
        }
    }
}

/// The monotonic parameter a phase explores.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Param {
    Shuffle,
    Threads,
    Clevel,
    Blocksize,
}

impl Btune {
    // ── Per-trial state advance ──────────────────────────────────────────────

    /// Advance the state machine after one scored trial.
    pub(crate) fn advance(&mut self, improved: bool) {
        match self.state {
            State::CodecFilter => {
                let total = self.codecs.len() * self.filters.len() * 2;
                if self.aux_index as usize >= total {
                    self.exit_phase();
                }
            }
            State::ShuffleSize => self.advance_monotonic(improved, Param::Shuffle),
            State::Threads => self.advance_threads(improved),
            State::Clevel => self.advance_monotonic(improved, Param::Clevel),
            State::Blocksize => self.advance_monotonic(improved, Param::Blocksize),
            State::Memcpy => self.enter_waiting(),
            State::Waiting => {
                self.nwaitings += 1;
                let nwaits = self.config.behaviour.nwaits_before_readapt;
                if self.readapt_from == ReadaptFrom::Wait
                    && (nwaits == 0 || self.nwaitings % nwaits == 0)
                {
                    self.decide_soft_or_hard();
                }
            }
            State::Stop => {}
        }
    }

    /// Shared walk logic for the shuffle/clevel/blocksize phases: keep
    /// stepping while trials improve, flip once on a failed first step,
    /// leave the phase on any later failure or on hitting the wall.
    fn advance_monotonic(&mut self, improved: bool, param: Param) {
        let first = self.aux_index == 1;
        if improved {
            if self.param_ended(param) {
                self.exit_phase();
            }
        } else if first {
            self.flip_param(param);
            if self.param_ended(param) {
                self.exit_phase();
            }
        } else {
            self.exit_phase();
        }
    }

    /// Thread tuning walks one side (compression or decompression) at a
    /// time; under BALANCED perf it then switches sides and walks again.
    fn advance_threads(&mut self, improved: bool) {
        let first = self.aux_index == 1;
        let capped = self.aux_index >= MAX_STATE_THREADS;
        let done = if capped {
            true
        } else if improved {
            self.param_ended(Param::Threads)
        } else if first {
            self.flip_param(Param::Threads);
            self.param_ended(Param::Threads)
        } else {
            true
        };
        if done {
            if self.config.perf_mode == PerfMode::Balanced && self.threads_for_comp {
                self.threads_for_comp = false;
                self.set_state(State::Threads);
            } else {
                self.exit_phase();
            }
        }
    }

    // ── Phase plumbing ───────────────────────────────────────────────────────

    /// Move to the next enabled phase of the sweep, or close the sweep.
    fn exit_phase(&mut self) {
        match self.next_phase_after(self.state) {
            Some(phase) => self.set_state(phase),
            None => self.enter_waiting(),
        }
    }

    /// First enabled phase after `phase` in the sweep order.
    fn next_phase_after(&self, phase: State) -> Option<State> {
        const ORDER: [State; 5] = [
            State::ShuffleSize,
            State::Threads,
            State::Clevel,
            State::Blocksize,
            State::Memcpy,
        ];
        let from = match phase {
            State::CodecFilter => 0,
            State::ShuffleSize => 1,
            State::Threads => 2,
            State::Clevel => 3,
            State::Blocksize => 4,
            _ => return None,
        };
        ORDER[from..].iter().copied().find(|&p| self.phase_enabled(p))
    }

    fn phase_enabled(&self, phase: State) -> bool {
        match phase {
            State::ShuffleSize => {
                self.config.tune_shufflesize
                    && self.best.filter != Filter::NoFilter
                    && self.best.shufflesize.is_power_of_two()
            }
            State::Threads => self.config.tune_threads && self.config.max_threads > 1,
            State::Clevel => self.config.tune_clevel,
            State::Blocksize => self.config.tune_blocksize,
            State::Memcpy => self.config.tune_memcpy,
            _ => false,
        }
    }

    /// Enter `phase`, resetting the trial counter and making sure the
    /// phase's parameter is not already pinned against the wall.
    pub(crate) fn set_state(&mut self, phase: State) {
        self.state = phase;
        self.aux_index = 0;
        let param = match phase {
            // A fresh hard sweep re-enumerates codecs, then may explore the
            // shuffle unit; unpin it up front.
            State::CodecFilter | State::ShuffleSize => Some(Param::Shuffle),
            State::Threads => Some(Param::Threads),
            State::Clevel => Some(Param::Clevel),
            State::Blocksize => Some(Param::Blocksize),
            _ => None,
        };
        if let Some(param) = param {
            if self.param_ended(param) {
                self.flip_param(param);
            }
        }
    }

    // ── Wall tests ───────────────────────────────────────────────────────────

    fn param_ended(&self, param: Param) -> bool {
        let best = &self.best;
        match param {
            Param::Shuffle => geometric_ended(
                best.shufflesize,
                best.filter.min_shuffle(),
                MAX_SHUFFLE,
                best.shufflesize_dir,
            ),
            Param::Threads => {
                let value = if self.threads_for_comp {
                    best.nthreads_comp
                } else {
                    best.nthreads_decomp
                };
                additive_ended(
                    value as i64,
                    MIN_THREADS as i64,
                    self.config.max_threads as i64,
                    1,
                    best.nthreads_dir,
                )
            }
            Param::Clevel => additive_ended(
                best.clevel as i64,
                MIN_CLEVEL as i64,
                MAX_CLEVEL as i64,
                self.step_size as i64,
                best.clevel_dir,
            ),
            Param::Blocksize => {
                let hi = MAX_BLOCK.min(self.sourcesize.max(MIN_BLOCK));
                shift_ended(
                    best.blocksize.max(MIN_BLOCK),
                    MIN_BLOCK,
                    hi,
                    self.step_size,
                    best.blocksize_dir,
                )
            }
        }
    }

    fn flip_param(&mut self, param: Param) {
        let best = &mut self.best;
        match param {
            Param::Shuffle => best.shufflesize_dir = best.shufflesize_dir.flip(),
            Param::Threads => best.nthreads_dir = best.nthreads_dir.flip(),
            Param::Clevel => best.clevel_dir = best.clevel_dir.flip(),
            Param::Blocksize => best.blocksize_dir = best.blocksize_dir.flip(),
        }
    }

    // ── Readapt scheduling ───────────────────────────────────────────────────

    /// Close the current sweep and let the schedule decide what runs next.
    pub(crate) fn enter_waiting(&mut self) {
        self.state = State::Waiting;
        match self.readapt_from {
            ReadaptFrom::Hard => self.process_from_hard(),
            ReadaptFrom::Soft => self.process_from_soft(),
            // Already waiting; per-chunk ticks drive the decision.
            ReadaptFrom::Wait => {}
        }
    }

    /// A hard sweep just completed.
    fn process_from_hard(&mut self) {
        self.nhards += 1;
        debug_assert!(self.nhards > 0);
        let b = self.config.behaviour;
        let minimum_hards = if self.config.cparams_hint { 0 } else { 1 };
        let boundary = (b.nhards_before_stop > 0 && self.nhards % b.nhards_before_stop == 0)
            || self.nhards == minimum_hards;

        if boundary {
            let was_repeating = self.is_repeating;
            self.is_repeating = true;
            match b.repeat_mode {
                RepeatMode::RepeatAll => {
                    if b.nsofts_before_hard > 0 {
                        self.init_soft();
                    } else if b.nwaits_before_readapt > 0 {
                        self.readapt_from = ReadaptFrom::Wait;
                    } else if b.nhards_before_stop > 0 {
                        self.init_hard();
                    } else {
                        self.stop();
                    }
                }
                RepeatMode::RepeatSoft => {
                    if b.nsofts_before_hard > 0 {
                        self.init_soft();
                    } else {
                        self.stop();
                    }
                }
                RepeatMode::Stop => {
                    // The uncounted seed hard still hands over to the soft
                    // schedule; a boundary reached while already repeating
                    // freezes the tuner.
                    if !was_repeating && b.nsofts_before_hard > 0 {
                        self.init_soft();
                    } else {
                        self.stop();
                    }
                }
            }
        } else {
            // More initial hards remain.
            if b.nsofts_before_hard > 0 {
                self.init_soft();
            } else if b.nwaits_before_readapt > 0 {
                self.readapt_from = ReadaptFrom::Wait;
            } else {
                self.init_hard();
            }
        }
    }

    /// A soft sweep just completed.
    fn process_from_soft(&mut self) {
        self.nsofts += 1;
        debug_assert!(self.nsofts > 0);
        self.readapt_from = ReadaptFrom::Wait;
        if self.config.behaviour.nwaits_before_readapt == 0 {
            self.decide_soft_or_hard();
        }
        // Otherwise stay in Waiting; ticks consume the wait budget.
    }

    /// Wait budget spent (or absent): pick the next sweep.
    fn decide_soft_or_hard(&mut self) {
        let b = self.config.behaviour;
        let soft_exhausted = b.nsofts_before_hard == 0
            || (self.nsofts > 0 && self.nsofts % b.nsofts_before_hard == 0);
        if !soft_exhausted {
            self.init_soft();
            return;
        }
        let hards_remain = b.nhards_before_stop > 0
            && (!self.is_repeating || b.repeat_mode == RepeatMode::RepeatAll);
        if hards_remain {
            self.init_hard();
        } else if b.repeat_mode == RepeatMode::RepeatSoft && b.nsofts_before_hard > 0 {
            self.init_soft();
        } else {
            self.stop();
        }
    }

    /// Start a soft sweep: fine steps, level-only exploration.
    pub(crate) fn init_soft(&mut self) {
        self.readapt_from = ReadaptFrom::Soft;
        self.step_size = SOFT_STEP_SIZE;
        if self.phase_enabled(State::Clevel) {
            self.set_state(State::Clevel);
        } else if let Some(phase) = self.next_phase_after(State::Clevel) {
            self.set_state(phase);
        } else {
            btune_debug!("soft readapt requested with no tunable phase, stopping");
            self.stop();
        }
    }

    /// Start a hard sweep: coarse steps, full re-enumeration.
    pub(crate) fn init_hard(&mut self) {
        self.readapt_from = ReadaptFrom::Hard;
        let n = self.config.behaviour.nhards_before_stop;
        // The last hard of a schedule explores with fine steps.
        self.step_size = if n > 0 && (self.nhards + 1) % n == 0 {
            SOFT_STEP_SIZE
        } else {
            HARD_STEP_SIZE
        };
        self.threads_for_comp = self.config.perf_mode != PerfMode::Decomp;
        self.set_state(State::CodecFilter);
    }

    pub(crate) fn stop(&mut self) {
        self.state = State::Stop;
        btune_debug!(
            "tuning stopped after {} hards / {} softs / {} waits",
            self.nhards,
            self.nsofts,
            self.nwaitings
        );
    }
}
