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

//! Feedback-driving test harness.
//!
//! Drives a single flow with synthetic delivery reports on a virtual
//! clock, so controller behavior can be pinned down epoch by epoch
//! without a transport underneath.

use super::Copa;
use super::Decision;
use super::FeedbackEvent;

use crate::telemetry::NoopSink;
use crate::telemetry::TelemetrySink;
use crate::Config;

pub(crate) struct TestSender {
    pub(crate) flow: Copa,
    pub(crate) time: u64,
    pub(crate) mss: u64,
    pub(crate) srtt: u64,
}

impl TestSender {
    pub(crate) fn new(config: Config) -> Self {
        TestSender {
            flow: Copa::new(&config, 1),
            time: 1_000_000,
            mss: 1_000,
            srtt: 100_000,
        }
    }

    pub(crate) fn advance(&mut self, period_us: u64) {
        self.time += period_us;
    }

    pub(crate) fn set_time(&mut self, time_us: u64) {
        self.time = time_us;
    }

    fn event(
        &self, acked: u64, lost: u64, rtt_us: Option<u64>, in_slow_start: bool,
    ) -> FeedbackEvent {
        FeedbackEvent {
            acked_bytes: acked,
            lost_bytes: lost,
            rtt_us,
            srtt_us: self.srtt,
            now_us: self.time,
            mss: self.mss,
            max_pacing_rate: u64::MAX,
            in_slow_start,
        }
    }

    pub(crate) fn feedback(
        &mut self, acked: u64, lost: u64, rtt_us: Option<u64>,
    ) -> Decision {
        let event = self.event(acked, lost, rtt_us, false);

        self.flow.on_feedback(&event, &mut NoopSink)
    }

    pub(crate) fn feedback_with_sink(
        &mut self, acked: u64, lost: u64, rtt_us: Option<u64>,
        sink: &mut dyn TelemetrySink,
    ) -> Decision {
        let event = self.event(acked, lost, rtt_us, false);

        self.flow.on_feedback(&event, sink)
    }

    pub(crate) fn feedback_slow_start_signal(
        &mut self, acked: u64, lost: u64, rtt_us: Option<u64>,
    ) -> Decision {
        let event = self.event(acked, lost, rtt_us, true);

        self.flow.on_feedback(&event, &mut NoopSink)
    }
}
