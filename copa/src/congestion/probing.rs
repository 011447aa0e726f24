// Copyright (C) 2025, Cloudflare, Inc.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//
//     * Redistributions in binary form must reproduce the above copyright
//       notice, this list of conditions and the following disclaimer in the
//       documentation and/or other materials provided with the distribution.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS
// IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO,
// THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Throughput/delay probing cycle.
//!
//! Experimental extension: a probing interval is the stretch between
//! two `Down` to `Up` trend reversals. Most intervals run with the
//! target rate biased upward to probe the throughput end of the
//! trade-off curve; every `bounce_intervals`-th interval drops the
//! bias to take a clean sample. The controller treats this as an
//! optional strategy and works unchanged without it.

use super::mode::QUANTIZATION_BASE;

/// Target-rate multiplier applied on biased intervals, scale 1000.
const PROBING_RATE_BIAS: u64 = 1700;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbingConfig {
    /// Every `bounce_intervals`-th probing interval runs unbiased.
    pub bounce_intervals: u64,

    /// Divisor applied to the window step while the bias is active.
    pub change_damping: u64,
}

impl Default for ProbingConfig {
    fn default() -> Self {
        ProbingConfig {
            bounce_intervals: 20,
            change_damping: 2,
        }
    }
}

pub struct ProbingCycle {
    config: ProbingConfig,

    // Completed probing intervals (trend reversals seen so far).
    intervals: u64,
}

impl ProbingCycle {
    pub fn new(config: ProbingConfig) -> Self {
        ProbingCycle {
            config,
            intervals: 0,
        }
    }

    /// Closes the current probing interval. Called on every `Down` to
    /// `Up` trend reversal.
    pub fn on_reversal(&mut self) {
        self.intervals += 1;
    }

    pub fn intervals(&self) -> u64 {
        self.intervals
    }

    fn biased(&self) -> bool {
        self.config.bounce_intervals > 0 &&
            self.intervals % self.config.bounce_intervals != 0
    }

    /// Applies the throughput bias to `target_rate` on biased
    /// intervals; identity on bounce intervals.
    pub fn bias_target_rate(&self, target_rate: u64) -> u64 {
        if self.biased() {
            target_rate * PROBING_RATE_BIAS / QUANTIZATION_BASE
        } else {
            target_rate
        }
    }

    /// Divisor to damp the window step while the bias is active.
    pub fn change_damping(&self) -> u64 {
        if self.biased() {
            self.config.change_damping.max(1)
        } else {
            1
        }
    }
}
