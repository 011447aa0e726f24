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

//! Bounded per-flow RTT history.
//!
//! Two logs share the ring structure: the RTT sample log, evicted by
//! age, and a smaller window-increase event log, evicted by count. The
//! sample log only feeds cross-traffic classification; losing it (or
//! skipping an update) degrades that heuristic but never the window
//! decision itself.

use crate::ring::Ring;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RttSample {
    pub rtt: u64,
    pub time: u64,
}

pub struct SampleHistory {
    samples: Ring<RttSample>,

    // Timestamps of window-increase events, spaced at least 2*min_rtt
    // apart. Only the count matters to callers.
    increases: Ring<u64>,

    num_increase: u64,

    retention_us: u64,

    increase_cap: usize,
}

impl SampleHistory {
    pub fn new(
        capacity: usize, retention_us: u64, increase_cap: usize,
    ) -> Self {
        SampleHistory {
            samples: Ring::with_capacity(capacity),
            increases: Ring::with_capacity(capacity.min(1024)),
            num_increase: 0,
            retention_us,
            increase_cap,
        }
    }

    pub fn num_increase(&self) -> u64 {
        self.num_increase
    }

    pub fn newest(&self) -> Option<&RttSample> {
        self.samples.back()
    }

    /// Records one RTT sample and runs both eviction policies.
    pub fn record(&mut self, rtt: u64, now: u64, min_rtt: u64) {
        self.samples.push(RttSample { rtt, time: now });

        let spaced_out = if self.increases.is_empty() {
            true
        } else {
            let last = self.increases.back().unwrap();
            *last < now.saturating_sub(2 * min_rtt)
        };

        if spaced_out {
            self.increases.push(now);
            self.num_increase += 1;
        }

        if now > self.retention_us {
            self.trim_older_than(now - self.retention_us);
        }

        if self.increases.len() > self.increase_cap {
            let excess = self.increases.len() - self.increase_cap;
            self.increases.advance(excess);
            self.num_increase = self.num_increase.saturating_sub(excess as u64);
        }
    }

    /// Evicts every sample with `time < cutoff` from the head.
    ///
    /// Samples arrive in time order, so the new head is located with a
    /// single binary search instead of a linear scan; the probe count
    /// is bounded by log2 of the ring capacity no matter how much
    /// history accumulated.
    pub fn trim_older_than(&mut self, cutoff: u64) {
        let first_kept = self.samples.partition_point(|s| s.time >= cutoff);
        self.samples.advance(first_kept);
    }

    /// Min and max RTT among samples with `time > earliest`, or `None`
    /// when no sample qualifies.
    pub fn minmax_since(&self, earliest: u64) -> Option<(u64, u64)> {
        let first = self.samples.partition_point(|s| s.time > earliest);

        let mut min_rtt = u64::MAX;
        let mut max_rtt = 0;

        for i in first..self.samples.len() {
            let s = self.samples.get(i).unwrap();
            min_rtt = min_rtt.min(s.rtt);
            max_rtt = max_rtt.max(s.rtt);
        }

        if min_rtt == u64::MAX {
            return None;
        }

        Some((min_rtt, max_rtt))
    }
}
