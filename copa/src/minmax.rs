// Copyright (C) 2025, Cloudflare, Inc.
// Copyright (C) 2017, Google, Inc.
//
// Use of this source code is governed by the following BSD-style license:
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
//    * Redistributions of source code must retain the above copyright
// notice, this list of conditions and the following disclaimer.
//    * Redistributions in binary form must reproduce the above
// copyright notice, this list of conditions and the following disclaimer
// in the documentation and/or other materials provided with the
// distribution.
//
//    * Neither the name of Google Inc. nor the names of its
// contributors may be used to endorse or promote products derived from
// this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT
// OWNER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT
// LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE,
// DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY
// THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Windowed min/max tracker.
//!
//! Kathleen Nichols' algorithm for tracking the minimum (or maximum)
//! value of a data stream over some fixed time interval. (E.g., the
//! minimum RTT over the past ten seconds.) It uses constant space and
//! constant time per update yet almost always delivers the same
//! minimum as an implementation that has to keep all the data in the
//! window.
//!
//! The algorithm keeps track of the best, 2nd best & 3rd best min
//! values, maintaining an invariant that the measurement time of the
//! n'th best >= n-1'th best. It also makes sure that the three values
//! are widely separated in the time window since that bounds the worse
//! case error when that data is monotonically increasing over the
//! window.
//!
//! Upon getting a new min, we can forget everything earlier because it
//! has no value - the new min is <= everything else in the window by
//! definition and it's the most recent. So we restart fresh on every
//! new min and overwrites 2nd & 3rd choices. The same property holds
//! for 2nd & 3rd best.
//!
//! Time is a caller-supplied `u64` tick count (microseconds in this
//! crate); the tracker itself never reads a clock, so it can be driven
//! entirely from timestamps carried on feedback events.

#[derive(Copy, Clone)]
struct MinmaxSample<T> {
    time: u64,
    value: T,
}

pub struct Minmax<T> {
    estimate: [MinmaxSample<T>; 3],
}

impl<T: PartialOrd + Copy> Minmax<T> {
    pub fn new(val: T) -> Self {
        Minmax {
            estimate: [MinmaxSample {
                time: 0,
                value: val,
            }; 3],
        }
    }

    /// Resets the estimates to the given value.
    pub fn reset(&mut self, time: u64, meas: T) -> T {
        let val = MinmaxSample { time, value: meas };

        for i in self.estimate.iter_mut() {
            *i = val;
        }

        self.estimate[0].value
    }

    /// Returns the current extreme without admitting a new sample.
    pub fn get(&self) -> T {
        self.estimate[0].value
    }

    /// Updates the min estimate based on the given measurement, and returns it.
    pub fn running_min(&mut self, win: u64, time: u64, meas: T) -> T {
        let val = MinmaxSample { time, value: meas };

        let delta_time = time.saturating_sub(self.estimate[2].time);

        // Reset if there's nothing in the window or a new min value is found.
        if val.value <= self.estimate[0].value || delta_time > win {
            return self.reset(time, meas);
        }

        if val.value <= self.estimate[1].value {
            self.estimate[2] = val;
            self.estimate[1] = val;
        } else if val.value <= self.estimate[2].value {
            self.estimate[2] = val;
        }

        self.subwin_update(win, time, meas)
    }

    /// Updates the max estimate based on the given measurement, and returns it.
    pub fn running_max(&mut self, win: u64, time: u64, meas: T) -> T {
        let val = MinmaxSample { time, value: meas };

        let delta_time = time.saturating_sub(self.estimate[2].time);

        // Reset if there's nothing in the window or a new max value is found.
        if val.value >= self.estimate[0].value || delta_time > win {
            return self.reset(time, meas);
        }

        if val.value >= self.estimate[1].value {
            self.estimate[2] = val;
            self.estimate[1] = val;
        } else if val.value >= self.estimate[2].value {
            self.estimate[2] = val
        }

        self.subwin_update(win, time, meas)
    }

    /// As time advances, update the 1st, 2nd and 3rd estimates.
    fn subwin_update(&mut self, win: u64, time: u64, meas: T) -> T {
        let val = MinmaxSample { time, value: meas };

        let delta_time = time.saturating_sub(self.estimate[0].time);

        if delta_time > win {
            // Passed entire window without a new val so make 2nd estimate the
            // new val & 3rd estimate the new 2nd choice. we may have to iterate
            // this since our 2nd estimate may also be outside the window (we
            // checked on entry that the third estimate was in the window).
            self.estimate[0] = self.estimate[1];
            self.estimate[1] = self.estimate[2];
            self.estimate[2] = val;

            if time.saturating_sub(self.estimate[0].time) > win {
                self.estimate[0] = self.estimate[1];
                self.estimate[1] = self.estimate[2];
                self.estimate[2] = val;
            }
        } else if self.estimate[1].time == self.estimate[0].time &&
            delta_time > win / 4
        {
            // We've passed a quarter of the window without a new val so take a
            // 2nd estimate from the 2nd quarter of the window.
            self.estimate[2] = val;
            self.estimate[1] = val;
        } else if self.estimate[2].time == self.estimate[1].time &&
            delta_time > win / 2
        {
            // We've passed half the window without finding a new val so take a
            // 3rd estimate from the last half of the window.
            self.estimate[2] = val;
        }

        self.estimate[0].value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_filter() {
        let mut f = Minmax::new(0u64);
        let now = 1_000_000;
        let rtt = 50_000;

        let rtt_min = f.reset(now, rtt);
        assert_eq!(rtt_min, rtt);
        assert_eq!(f.get(), rtt);

        for e in f.estimate.iter() {
            assert_eq!(e.time, now);
            assert_eq!(e.value, rtt);
        }
    }

    #[test]
    fn get_windowed_min() {
        let mut f = Minmax::new(0u64);
        let win = 500_000;
        let mut time = 1_000_000;

        let mut rtt_min = f.reset(time, 25_000);
        assert_eq!(rtt_min, 25_000);

        time += 250_000;
        rtt_min = f.running_min(win, time, 24_000);
        assert_eq!(rtt_min, 24_000);
        assert_eq!(f.estimate[1].value, 24_000);
        assert_eq!(f.estimate[2].value, 24_000);

        time += 600_000;
        rtt_min = f.running_min(win, time, 25_000);
        assert_eq!(rtt_min, 25_000);
        assert_eq!(f.estimate[1].value, 25_000);
        assert_eq!(f.estimate[2].value, 25_000);
    }

    #[test]
    fn get_windowed_max() {
        let mut f = Minmax::new(0u64);
        let win = 500_000;
        let mut time = 1_000_000;

        let mut rtt_max = f.reset(time, 24_000);
        assert_eq!(rtt_max, 24_000);

        time += 250_000;
        rtt_max = f.running_max(win, time, 25_000);
        assert_eq!(rtt_max, 25_000);
        assert_eq!(f.estimate[1].value, 25_000);
        assert_eq!(f.estimate[2].value, 25_000);

        time += 600_000;
        rtt_max = f.running_max(win, time, 24_000);
        assert_eq!(rtt_max, 24_000);
        assert_eq!(f.estimate[1].value, 24_000);
        assert_eq!(f.estimate[2].value, 24_000);
    }

    #[test]
    fn get_windowed_min_estimates() {
        let mut f = Minmax::new(0u64);
        let win = 1_000_000;
        let mut time = 1_000_000;

        let mut rtt_min = f.reset(time, 23_000);
        assert_eq!(rtt_min, 23_000);

        time += 300_000;
        rtt_min = f.running_min(win, time, 24_000);
        assert_eq!(rtt_min, 23_000);
        assert_eq!(f.estimate[1].value, 24_000);
        assert_eq!(f.estimate[2].value, 24_000);

        time += 300_000;
        rtt_min = f.running_min(win, time, 25_000);
        assert_eq!(rtt_min, 23_000);
        assert_eq!(f.estimate[1].value, 24_000);
        assert_eq!(f.estimate[2].value, 25_000);

        time += 300_000;
        rtt_min = f.running_min(win, time, 22_000);
        assert_eq!(rtt_min, 22_000);
        assert_eq!(f.estimate[1].value, 22_000);
        assert_eq!(f.estimate[2].value, 22_000);
    }

    #[test]
    fn get_windowed_max_estimates() {
        let mut f = Minmax::new(0u64);
        let win = 1_000_000;
        let mut time = 1_000_000;

        let mut rtt_max = f.reset(time, 25_000);
        assert_eq!(rtt_max, 25_000);

        time += 300_000;
        rtt_max = f.running_max(win, time, 24_000);
        assert_eq!(rtt_max, 25_000);
        assert_eq!(f.estimate[1].value, 24_000);
        assert_eq!(f.estimate[2].value, 24_000);

        time += 300_000;
        rtt_max = f.running_max(win, time, 23_000);
        assert_eq!(rtt_max, 25_000);
        assert_eq!(f.estimate[1].value, 24_000);
        assert_eq!(f.estimate[2].value, 23_000);

        time += 300_000;
        rtt_max = f.running_max(win, time, 26_000);
        assert_eq!(rtt_max, 26_000);
        assert_eq!(f.estimate[1].value, 26_000);
        assert_eq!(f.estimate[2].value, 26_000);
    }

    // The reported minimum is never older than the window: a sample that
    // dominates is adopted instantly, and once the window has fully
    // elapsed the old extreme is forgotten even if no better sample
    // arrived in between.
    #[test]
    fn min_expires_with_window() {
        let mut f = Minmax::new(0u64);
        let win = 100;

        f.reset(0, 100);

        assert_eq!(f.running_min(win, 5, 90), 90);

        // 90 is still within the window at time 50.
        assert_eq!(f.running_min(win, 50, 95), 90);

        // The window has fully elapsed; only samples newer than 100
        // remain eligible.
        assert_eq!(f.running_min(win, 200, 95), 95);
    }
}
