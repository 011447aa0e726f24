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

//! Operating-mode selection and delta-parameter adaptation.
//!
//! `delta_param` trades delay-sensitivity for throughput: small values
//! chase throughput, large values chase low delay. Sharing a bottleneck
//! with a loss-based flow (which ignores delay signals) pulls the
//! parameter toward throughput; any loss backs it off toward the
//! configured ceiling.

use log::debug;

/// Fixed-point scale for `delta_param` and loss rates.
pub const QUANTIZATION_BASE: u64 = 1000;

// Repeated halving plus the ceiling clamp can drive the parameter to
// zero, which is later used as a divisor.
const DELTA_PARAM_FLOOR: u64 = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Default,
    CoexistTcp,
    Loss,
}

pub struct ModeClassifier {
    mode: Mode,

    delta_param: u64,

    default_param: u64,

    // Loss accumulator for the current 2*min_rtt classification cycle.
    cur_acked: u64,
    cur_lost: u64,

    // End of the last loss-tracking cycle.
    loss_cycle_start: u64,

    // Loss rate observed in the previous cycle, scale 1000.
    loss_rate: u64,

    loss_rate_threshold: u64,
}

impl ModeClassifier {
    pub fn new(default_param: u64, loss_rate_threshold: u64) -> Self {
        ModeClassifier {
            mode: Mode::Default,
            delta_param: default_param,
            default_param,
            cur_acked: 0,
            cur_lost: 0,
            loss_cycle_start: 0,
            loss_rate: 0,
            loss_rate_threshold,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn delta_param(&self) -> u64 {
        self.delta_param
    }

    pub fn loss_rate(&self) -> u64 {
        self.loss_rate
    }

    /// Accumulates delivery feedback and recomputes the trailing loss
    /// rate once per `2 * min_rtt` cycle. With no events in a cycle the
    /// previous rate stands.
    pub fn observe(&mut self, acked: u64, lost: u64, now: u64, min_rtt: u64) {
        self.cur_acked += acked;
        self.cur_lost += lost;

        if now > self.loss_cycle_start + 2 * min_rtt {
            if self.cur_acked + self.cur_lost > 0 {
                self.loss_rate = self.cur_lost * QUANTIZATION_BASE /
                    (self.cur_acked + self.cur_lost);
            }

            self.cur_acked = 0;
            self.cur_lost = 0;
            self.loss_cycle_start = now;
        }
    }

    /// Selects the operating mode. Loss dominates coexistence: a flow
    /// losing above the threshold is handled as loss-limited no matter
    /// what the RTT spread suggests.
    pub fn classify(&mut self, coexistence_detected: bool) -> Mode {
        let mode = if self.loss_rate >= self.loss_rate_threshold {
            Mode::Loss
        } else if coexistence_detected {
            Mode::CoexistTcp
        } else {
            Mode::Default
        };

        if mode != self.mode {
            debug!(
                "congestion mode {:?} -> {:?} (loss_rate={})",
                self.mode, mode, self.loss_rate
            );
        }

        self.mode = mode;
        mode
    }

    /// Adapts `delta_param` for the epoch that just closed.
    pub fn adapt(&mut self, lost_this_epoch: bool) {
        match self.mode {
            // No memory: the parameter snaps back to its default.
            Mode::Default => self.delta_param = self.default_param,

            Mode::CoexistTcp => {
                if lost_this_epoch {
                    self.delta_param *= 2;
                } else {
                    // delta = 1 / (1 + 1 / delta), asymptotically
                    // throughput-maximizing while no loss shows up.
                    self.delta_param = self.delta_param * QUANTIZATION_BASE /
                        (self.delta_param + QUANTIZATION_BASE);
                }

                self.clamp();
            },

            // Double on loss, no decay otherwise.
            Mode::Loss => {
                if lost_this_epoch {
                    self.delta_param *= 2;
                }

                self.clamp();
            },
        }
    }

    fn clamp(&mut self) {
        self.delta_param = self
            .delta_param
            .min(self.default_param)
            .max(DELTA_PARAM_FLOOR);
    }
}
