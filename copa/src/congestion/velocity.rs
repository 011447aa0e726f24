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

//! Window-trend tracking.
//!
//! Direction is sampled once per congestion window's worth of acked
//! bytes rather than per ACK, which keeps per-packet noise out of the
//! trend. Sustained movement in one direction doubles `velocity`,
//! turning the per-epoch additive step into near-multiplicative
//! growth; any reversal snaps it back to 1.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
}

pub struct Velocity {
    velocity: u64,

    direction: Direction,

    // Window size at the last direction evaluation.
    last_recorded_cwnd_bytes: u64,

    last_cwnd_record_time: u64,

    // When the current direction was last (re)confirmed.
    time_since_direction: u64,

    // Acked bytes accumulated toward the next direction evaluation.
    acked_since_eval: u64,
}

impl Default for Velocity {
    fn default() -> Self {
        Velocity {
            velocity: 1,
            direction: Direction::None,
            last_recorded_cwnd_bytes: 0,
            last_cwnd_record_time: 0,
            time_since_direction: 0,
            acked_since_eval: 0,
        }
    }
}

impl Velocity {
    pub fn new() -> Self {
        Velocity::default()
    }

    pub fn velocity(&self) -> u64 {
        self.velocity
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Feeds one report epoch into the trend. Direction is only
    /// re-evaluated once a full window of data has been acked since the
    /// previous evaluation; `velocity` doubles when the direction held
    /// for more than `3 * srtt`.
    pub fn on_epoch(
        &mut self, now: u64, srtt: u64, cwnd_bytes: u64, acked_bytes: u64,
    ) {
        if self.last_cwnd_record_time == 0 {
            self.last_cwnd_record_time = now;
            self.last_recorded_cwnd_bytes = cwnd_bytes;
            return;
        }

        self.acked_since_eval += acked_bytes;

        if self.acked_since_eval < cwnd_bytes {
            return;
        }

        let direction = if cwnd_bytes > self.last_recorded_cwnd_bytes {
            Direction::Up
        } else {
            Direction::Down
        };

        if direction == self.direction &&
            now.saturating_sub(self.time_since_direction) > 3 * srtt
        {
            self.velocity = self.velocity.saturating_mul(2);
        } else if direction != self.direction {
            self.velocity = 1;
            self.time_since_direction = now;
        }

        self.direction = direction;
        self.last_cwnd_record_time = now;
        self.last_recorded_cwnd_bytes = cwnd_bytes;
        self.acked_since_eval = 0;
    }

    /// Forces the trend into `direction`, restarting the accelerator.
    /// The controller uses this when it overrides an accelerating trend
    /// that disagrees with the decision it just took.
    pub fn force(&mut self, now: u64, direction: Direction, cwnd_bytes: u64) {
        if direction == self.direction {
            return;
        }

        self.direction = direction;
        self.velocity = 1;
        self.time_since_direction = now;
        self.last_recorded_cwnd_bytes = cwnd_bytes;
    }
}
