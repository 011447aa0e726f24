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

//! Cross-traffic classification.
//!
//! A loss-based competitor keeps the bottleneck queue standing, so even
//! the best RTT observed over a few smoothed RTTs stays well above the
//! long-horizon baseline. The classifier compares the recent minimum
//! against the midpoint between baseline and recent maximum; it is a
//! heuristic and mislabels at low sample counts.

use super::history::SampleHistory;

/// Returns true when a competing loss-based flow appears to share the
/// bottleneck.
///
/// The lookback covers samples newer than `lookback_srtt * srtt`
/// before the most recent sample (falling back to `now` when the
/// history is empty).
pub fn competing_flow_detected(
    history: &SampleHistory, min_rtt: u64, srtt: u64, now: u64,
    lookback_srtt: u64, epsilon_us: u64,
) -> bool {
    let latest = history.newest().map_or(now, |s| s.time);

    let earliest = latest.saturating_sub(lookback_srtt * srtt);

    let (recent_min, recent_max) = match history.minmax_since(earliest) {
        Some(v) => v,

        // Nothing to classify from.
        None => return false,
    };

    let thresh =
        min_rtt + recent_max.saturating_sub(min_rtt) / 2 + epsilon_us;

    recent_min > thresh
}
