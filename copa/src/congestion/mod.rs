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

//! Copa congestion control.
//!
//! The controller consumes one [`FeedbackEvent`] per delivery report
//! and emits a [`Decision`]. All time-based behavior is evaluated
//! against the timestamps carried on events; the engine has no clock,
//! no timers and never blocks, so a flow that stops producing feedback
//! simply stops being adjusted.
//!
//! Once per report epoch (half a smoothed RTT) the controller compares
//! the rate the current queueing delay justifies against the rate the
//! window currently sustains, and moves the window by an amount scaled
//! with the velocity of its recent trend.

use log::debug;
use log::trace;

use crate::minmax::Minmax;
use crate::telemetry::Reporter;
use crate::telemetry::TelemetrySink;
use crate::Config;

pub use mode::Mode;
pub use probing::ProbingConfig;
pub use velocity::Direction;

use coexistence::competing_flow_detected;
use history::SampleHistory;
use mode::ModeClassifier;
use mode::QUANTIZATION_BASE;
use probing::ProbingCycle;
use velocity::Velocity;

/* Scale factor for rate in pkt/uSec unit to avoid truncation in bandwidth
 * estimation. The rate unit ~= (1500 bytes / 1 usec / 2^24) ~= 715 bps.
 * This handles bandwidths from 0.06pps (715bps) to 256Mpps (3Tbps) in a u64.
 * Since the minimum window is >=4 packets, the lower bound isn't
 * an issue. The upper bound isn't an issue with existing technologies.
 */
const BW_SCALE: u32 = 24;
const BW_UNIT: u64 = 1 << BW_SCALE;

const RATE_GAIN_SCALE: u32 = 8;

const USEC_PER_SEC: u64 = 1_000_000;

// Pacing rate assumed before the first RTT sample, bytes per second.
const INITIAL_RATE_BYTES_PER_SEC: u64 = 125_000;

// Value the standing window is reseeded with after every report; large
// enough that the next genuine sample always displaces it.
const STANDING_RESET_US: u64 = USEC_PER_SEC;

/// One delivery report from the host transport.
///
/// The host-owned connection fields the engine needs (`mss`,
/// `max_pacing_rate`, `in_slow_start`) ride along on every event, so
/// the engine never reaches into host memory.
#[derive(Clone, Copy, Debug)]
pub struct FeedbackEvent {
    /// Bytes newly acknowledged by this report.
    pub acked_bytes: u64,

    /// Bytes newly marked lost by this report.
    pub lost_bytes: u64,

    /// RTT sample in microseconds, when this report carries one.
    pub rtt_us: Option<u64>,

    /// The host's smoothed RTT, microseconds.
    pub srtt_us: u64,

    /// Event timestamp, microseconds.
    pub now_us: u64,

    /// Maximum segment size, bytes.
    pub mss: u64,

    /// Hard cap for the pacing rate, bytes per second.
    pub max_pacing_rate: u64,

    /// Set by hosts that force a flow back into slow start, e.g. after
    /// a retransmission timeout.
    pub in_slow_start: bool,
}

/// The three numbers the host applies after every event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub cwnd_segments: u64,

    pub pacing_rate: u64,

    pub ssthresh_segments: u64,
}

/// Per-flow Copa state and decision logic.
pub struct Copa {
    config: Config,

    // Long-horizon baseline RTT.
    min_rtt_filter: Minmax<u64>,

    // Short "standing" window, reseeded every report epoch.
    standing_rtt_filter: Minmax<u64>,

    have_rtt_sample: bool,

    latest_rtt_us: u64,

    // None models a host that failed to provide history backing; the
    // flow keeps running, only cross-traffic classification degrades.
    history: Option<SampleHistory>,

    mode: ModeClassifier,

    velocity: Velocity,

    probing: Option<ProbingCycle>,

    reporter: Reporter,

    flow_id: u32,

    in_slow_start: bool,

    cwnd_segments: u64,

    ssthresh_segments: u64,

    pacing_rate: u64,

    // 0 until the first event arrives.
    last_report_time_us: u64,

    // Acked/lost bytes accumulated since the last report epoch.
    report_acked_bytes: u64,
    report_lost_bytes: u64,

    // Ack-silence guard.
    last_ack_time_us: u64,
    quiet: bool,
    next_valid_time_us: u64,
}

impl Copa {
    pub fn new(config: &Config, flow_id: u32) -> Self {
        let mut flow = Copa::new_without_history(config, flow_id);

        flow.history = Some(SampleHistory::new(
            config.history_capacity,
            config.history_retention_us,
            config.increase_log_cap,
        ));

        flow
    }

    /// Builds a flow with no RTT history backing, for hosts whose
    /// per-flow storage allocation failed. Coexistence detection is
    /// inert on such a flow; everything else behaves normally.
    pub fn new_without_history(config: &Config, flow_id: u32) -> Self {
        Copa {
            config: config.clone(),
            min_rtt_filter: Minmax::new(0),
            standing_rtt_filter: Minmax::new(0),
            have_rtt_sample: false,
            latest_rtt_us: 0,
            history: None,
            mode: ModeClassifier::new(
                config.default_param,
                config.loss_rate_threshold,
            ),
            velocity: Velocity::new(),
            probing: config.probing.map(ProbingCycle::new),
            reporter: Reporter::new(flow_id),
            flow_id,
            in_slow_start: true,
            cwnd_segments: config.initial_cwnd_segments,
            ssthresh_segments: u64::MAX,
            pacing_rate: pacing_rate_from_rtt(
                config.initial_cwnd_segments,
                0,
                0,
                u64::MAX,
                config.pacing_gain,
            ),
            last_report_time_us: 0,
            report_acked_bytes: 0,
            report_lost_bytes: 0,
            last_ack_time_us: 0,
            quiet: false,
            next_valid_time_us: 0,
        }
    }

    pub fn cwnd_segments(&self) -> u64 {
        self.cwnd_segments
    }

    pub fn pacing_rate(&self) -> u64 {
        self.pacing_rate
    }

    pub fn ssthresh_segments(&self) -> u64 {
        self.ssthresh_segments
    }

    pub fn in_slow_start(&self) -> bool {
        self.in_slow_start
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn delta_param(&self) -> u64 {
        self.mode.delta_param()
    }

    /// Trailing loss rate, scale 1000.
    pub fn loss_rate(&self) -> u64 {
        self.mode.loss_rate()
    }

    /// Window-increase events currently retained in the history log; a
    /// rough "has the window been growing recently" hint.
    pub fn recent_increase_events(&self) -> u64 {
        self.history.as_ref().map_or(0, |h| h.num_increase())
    }

    fn decision(&self) -> Decision {
        Decision {
            cwnd_segments: self.cwnd_segments,
            pacing_rate: self.pacing_rate,
            ssthresh_segments: self.ssthresh_segments,
        }
    }

    /// Processes one delivery report and returns the (possibly
    /// unchanged) window decision. Never fails: every abnormal
    /// condition degrades to "leave the window alone until the next
    /// epoch".
    pub fn on_feedback(
        &mut self, event: &FeedbackEvent, sink: &mut dyn TelemetrySink,
    ) -> Decision {
        let now = event.now_us;
        let srtt = event.srtt_us;
        let mss = event.mss.max(1);

        // Window size as of this event; the decision below works on
        // this snapshot even while slow start grows the live window.
        let cwnd_bytes = self.cwnd_segments * mss;

        self.report_acked_bytes += event.acked_bytes;
        self.report_lost_bytes += event.lost_bytes;

        if event.in_slow_start && !self.in_slow_start {
            debug!("flow={} host forced slow start restart", self.flow_id);
            self.in_slow_start = true;
        }

        self.reporter.record(
            event.rtt_us.unwrap_or(0),
            event.acked_bytes,
            event.lost_bytes,
            now,
            sink,
        );

        if let Some(rtt) = event.rtt_us {
            self.latest_rtt_us = rtt;

            let standing_win =
                srtt * self.config.standing_rtt_window_frac / QUANTIZATION_BASE;

            if !self.have_rtt_sample {
                // First RTT sample seeds both windows.
                self.min_rtt_filter.reset(now, rtt);
                self.standing_rtt_filter.reset(now, rtt);
                self.have_rtt_sample = true;
            } else {
                self.min_rtt_filter.running_min(
                    self.config.min_rtt_window_us,
                    now,
                    rtt,
                );
                self.standing_rtt_filter.running_min(standing_win, now, rtt);
            }
        }

        let min_rtt = self.min_rtt_filter.get();

        if let Some(rtt) = event.rtt_us {
            match self.history.as_mut() {
                Some(history) => history.record(rtt, now, min_rtt),

                // Storage miss: skip the history update, keep going.
                None => trace!(
                    "flow={} no history backing, sample dropped",
                    self.flow_id
                ),
            }
        }

        // Slow start bootstraps the window by raw acked bytes on every
        // event, unthrottled by the epoch schedule.
        if self.in_slow_start {
            let new_cwnd = cwnd_bytes + event.acked_bytes;

            self.cwnd_segments =
                (new_cwnd / mss).min(self.config.max_cwnd_segments);
        }

        if self.config.ack_silence_guard && self.have_rtt_sample {
            if self.last_ack_time_us == 0 {
                self.last_ack_time_us = now;
            }

            if !self.quiet &&
                self.last_ack_time_us +
                    self.config.ack_timeout_gain * min_rtt <
                    now
            {
                // The flow went idle; the standing window contents are
                // stale, so hold decisions for one baseline RTT.
                self.quiet = true;
                self.next_valid_time_us = now + min_rtt;

                trace!(
                    "flow={} ack silence, decisions resume at {}",
                    self.flow_id,
                    self.next_valid_time_us
                );
            }

            self.last_ack_time_us = now;

            if self.quiet {
                if now < self.next_valid_time_us {
                    return self.decision();
                }

                self.quiet = false;
            }
        }

        if self.last_report_time_us == 0 {
            self.last_report_time_us = now;
        }

        let report_interval =
            srtt * self.config.report_interval_frac / QUANTIZATION_BASE;

        if !(now > 0 && self.last_report_time_us + report_interval < now) {
            return self.decision();
        }

        if !self.have_rtt_sample {
            return self.decision();
        }

        let standing_rtt = self.standing_rtt_filter.get();

        // A standing window below the long-horizon minimum is a
        // sampling artifact of the reseeded window still settling;
        // deciding on it would mistake it for negative queueing delay.
        if standing_rtt < min_rtt {
            return self.decision();
        }

        self.mode.observe(
            self.report_acked_bytes,
            self.report_lost_bytes,
            now,
            min_rtt,
        );

        let coexistence = match self.history.as_ref() {
            Some(history) => competing_flow_detected(
                history,
                min_rtt,
                srtt,
                now,
                self.config.coexistence_lookback_srtt,
                self.config.coexistence_epsilon_us,
            ),
            None => false,
        };

        self.mode.classify(coexistence);
        self.mode.adapt(self.report_lost_bytes > 0);

        let delta_param = self.mode.delta_param().max(1);

        let delay_us = if self.config.use_standing_rtt {
            standing_rtt - min_rtt
        } else {
            self.latest_rtt_us.saturating_sub(min_rtt)
        };

        let probing_active = self.probing.is_some() && !self.in_slow_start;

        let increase_cwnd = if delay_us == 0 {
            // A zero-delay signal cannot be overshot.
            true
        } else {
            let mut target_rate = mss * USEC_PER_SEC * QUANTIZATION_BASE /
                (delay_us * delta_param);

            if probing_active {
                target_rate =
                    self.probing.as_ref().unwrap().bias_target_rate(target_rate);
            }

            let current_rate =
                cwnd_bytes * USEC_PER_SEC / standing_rtt.max(1);

            target_rate >= current_rate
        };

        let old_direction = self.velocity.direction();

        if !(increase_cwnd && self.in_slow_start) {
            self.velocity.on_epoch(
                now,
                srtt,
                cwnd_bytes,
                self.report_acked_bytes,
            );
        }

        let change_damping = if probing_active {
            self.probing.as_ref().unwrap().change_damping()
        } else {
            1
        };

        let acked_packets = (self.report_acked_bytes + mss - 1) / mss;

        // Intermediate products overflow u64 once velocity has
        // accelerated, so widen before dividing.
        let change = (acked_packets as u128 *
            mss as u128 *
            mss as u128 *
            self.velocity.velocity() as u128 *
            QUANTIZATION_BASE as u128 /
            (delta_param as u128 * cwnd_bytes as u128 * change_damping as u128))
            .min(cwnd_bytes as u128) as u64;

        if increase_cwnd {
            if !self.in_slow_start {
                if self.velocity.direction() != Direction::Up &&
                    self.velocity.velocity() > 1
                {
                    self.velocity.force(now, Direction::Up, cwnd_bytes);
                }

                self.cwnd_segments = ((cwnd_bytes + change) / mss)
                    .min(self.config.max_cwnd_segments);
            }
        } else {
            if self.velocity.direction() != Direction::Down &&
                self.velocity.velocity() > 1
            {
                self.velocity.force(now, Direction::Down, cwnd_bytes);
            }

            let mut new_cwnd = cwnd_bytes.saturating_sub(change);

            if self.in_slow_start {
                // The bootstrap overshot; cut at most half the window
                // on the way out.
                new_cwnd = new_cwnd.min(cwnd_bytes / 2);

                debug!("flow={} slow start exited", self.flow_id);
            }

            new_cwnd =
                new_cwnd.max(self.config.min_cwnd_segments * mss);

            self.cwnd_segments =
                (new_cwnd / mss).min(self.config.max_cwnd_segments);

            self.in_slow_start = false;
        }

        // A Down -> Up reversal closes one probing interval.
        if old_direction == Direction::Down &&
            self.velocity.direction() == Direction::Up
        {
            if let Some(probing) = self.probing.as_mut() {
                probing.on_reversal();

                trace!(
                    "flow={} probing interval {} closed",
                    self.flow_id,
                    probing.intervals()
                );
            }

            self.reporter.end_interval(now, sink);
        }

        self.pacing_rate = pacing_rate_from_rtt(
            self.cwnd_segments,
            mss,
            srtt,
            event.max_pacing_rate,
            self.config.pacing_gain,
        );

        trace!(
            "flow={} epoch done mode={:?} delta={} delay={} increase={} \
             change={} cwnd={} velocity={}",
            self.flow_id,
            self.mode.mode(),
            delta_param,
            delay_us,
            increase_cwnd,
            change,
            self.cwnd_segments,
            self.velocity.velocity(),
        );

        self.last_report_time_us = now;
        self.report_acked_bytes = 0;
        self.report_lost_bytes = 0;

        self.standing_rtt_filter.reset(now, STANDING_RESET_US);

        self.ssthresh_segments = self.cwnd_segments;

        self.decision()
    }
}

/// Pacing rate in bytes per second for the given window, with a gain,
/// capped by the host's maximum. Before the first RTT sample a fixed
/// bootstrap rate is assumed.
///
/// The order of operations here is chosen carefully to avoid overflow
/// of u64. This works for rates of up to a few Tbit/sec.
fn pacing_rate_from_rtt(
    cwnd_segments: u64, mss: u64, srtt_us: u64, max_pacing_rate: u64,
    gain: u64,
) -> u64 {
    let gain_scaled = gain << RATE_GAIN_SCALE;

    let mut rate = if srtt_us > 0 {
        let bw = cwnd_segments * BW_UNIT / srtt_us;

        let mut r = bw;
        r *= mss;
        r *= gain_scaled;
        r >>= RATE_GAIN_SCALE;
        r *= USEC_PER_SEC;
        r >>= BW_SCALE;
        r
    } else {
        (INITIAL_RATE_BYTES_PER_SEC * gain_scaled) >> RATE_GAIN_SCALE
    };

    rate = rate.min(max_pacing_rate);
    rate
}

mod coexistence;
mod history;
mod mode;
mod probing;
mod velocity;

#[cfg(test)]
mod test_sender;

#[cfg(test)]
mod tests {
    use super::test_sender::TestSender;
    use super::*;

    use crate::telemetry::MemorySink;
    use crate::telemetry::NoopSink;

    #[test]
    fn pacing_rate_math() {
        // 5 segments of 1000 bytes over a 100ms srtt with 2x gain is
        // ~100KB/s before fixed-point truncation.
        assert_eq!(
            pacing_rate_from_rtt(5, 1000, 100_000, u64::MAX, 2),
            99_897
        );

        // The host cap always wins.
        assert_eq!(pacing_rate_from_rtt(5, 1000, 100_000, 60_000, 2), 60_000);

        // Bootstrap rate before any RTT sample.
        assert_eq!(pacing_rate_from_rtt(10, 1000, 0, u64::MAX, 2), 250_000);
    }

    #[test]
    fn slow_start_grows_by_acked_bytes() {
        let mut sender = TestSender::new(crate::Config::default());

        // First event seeds filters, no decision yet.
        sender.feedback(0, 0, Some(50_000));
        assert_eq!(sender.flow.cwnd_segments(), 10);
        assert!(sender.flow.in_slow_start());

        // Before the epoch gate opens, acked bytes grow the window 1:1.
        sender.advance(20_000);
        sender.feedback(3_000, 0, Some(50_000));
        assert_eq!(sender.flow.cwnd_segments(), 13);
        assert!(sender.flow.in_slow_start());

        // Both samples landed within 2*min_rtt of each other, so the
        // increase log holds a single event.
        assert_eq!(sender.flow.recent_increase_events(), 1);
    }

    #[test]
    fn first_decrease_exits_slow_start() {
        let mut sender = TestSender::new(crate::Config::default());

        sender.feedback(0, 0, Some(50_000));

        // Queueing delay of 100ms over a 50ms baseline: the target
        // rate (20KB/s) is far below the current rate, so the window
        // is cut, capped at half on the way out of slow start.
        sender.advance(60_000);
        let decision = sender.feedback(10_000, 0, Some(150_000));

        assert!(!sender.flow.in_slow_start());
        assert_eq!(decision.cwnd_segments, 5);
        assert_eq!(decision.ssthresh_segments, 5);
        assert_eq!(decision.pacing_rate, 99_897);
    }

    #[test]
    fn zero_delay_increases_window() {
        let mut sender = TestSender::new(crate::Config::default());

        sender.feedback(0, 0, Some(50_000));
        sender.advance(60_000);
        sender.feedback(10_000, 0, Some(150_000));
        assert_eq!(sender.flow.cwnd_segments(), 5);

        // Standing RTT back at the baseline: zero queueing delay, so
        // the controller adds change = 5 pkts * mss / delta.
        sender.advance(60_000);
        let decision = sender.feedback(5_000, 0, Some(50_000));

        assert_eq!(decision.cwnd_segments, 7);
        assert_eq!(decision.ssthresh_segments, 7);
    }

    #[test]
    fn cwnd_never_below_minimum() {
        let mut sender = TestSender::new(crate::Config::default());

        sender.feedback(0, 0, Some(50_000));

        // Persistently huge queueing delay: every epoch decides to
        // decrease, but the floor holds.
        for _ in 0..14 {
            sender.advance(60_000);
            let decision = sender.feedback(2_000, 0, Some(300_000));

            assert!(decision.cwnd_segments >= 4);
        }

        assert!(!sender.flow.in_slow_start());
        assert_eq!(sender.flow.cwnd_segments(), 4);
    }

    #[test]
    fn host_restarts_slow_start() {
        let mut sender = TestSender::new(crate::Config::default());

        sender.feedback(0, 0, Some(50_000));
        sender.advance(60_000);
        sender.feedback(10_000, 0, Some(150_000));
        assert!(!sender.flow.in_slow_start());
        assert_eq!(sender.flow.cwnd_segments(), 5);

        // E.g. an RTO on the host side: back to slow start, additive
        // growth resumes immediately.
        sender.advance(10_000);
        sender.feedback_slow_start_signal(3_000, 0, Some(50_000));

        assert!(sender.flow.in_slow_start());
        assert_eq!(sender.flow.cwnd_segments(), 8);
    }

    #[test]
    fn ack_silence_suppresses_decisions() {
        let mut sender = TestSender::new(crate::Config::default());

        sender.feedback(0, 0, Some(50_000));
        sender.advance(60_000);
        sender.feedback(10_000, 0, Some(150_000));
        assert_eq!(sender.flow.cwnd_segments(), 5);

        // 880ms of silence, far beyond 2 * min_rtt: the next event
        // arms the quiet period instead of deciding.
        sender.set_time(2_000_000);
        sender.feedback(5_000, 0, Some(50_000));
        assert_eq!(sender.flow.cwnd_segments(), 5);

        // Still inside the quiet window (one min_rtt).
        sender.set_time(2_030_000);
        sender.feedback(5_000, 0, Some(50_000));
        assert_eq!(sender.flow.cwnd_segments(), 5);

        // Quiet window over: decisions resume.
        sender.set_time(2_060_000);
        let decision = sender.feedback(5_000, 0, Some(50_000));
        assert!(decision.cwnd_segments > 5);
    }

    #[test]
    fn missing_history_degrades_gracefully() {
        let config = crate::Config::default();
        let mut flow = Copa::new_without_history(&config, 9);
        let mut sink = NoopSink;

        let mut event = FeedbackEvent {
            acked_bytes: 0,
            lost_bytes: 0,
            rtt_us: Some(50_000),
            srtt_us: 100_000,
            now_us: 1_000_000,
            mss: 1_000,
            max_pacing_rate: u64::MAX,
            in_slow_start: false,
        };

        flow.on_feedback(&event, &mut sink);

        event.now_us = 1_060_000;
        event.acked_bytes = 10_000;
        event.rtt_us = Some(150_000);

        // Identical decision to the with-history flow; only the
        // coexistence heuristic is inert.
        let decision = flow.on_feedback(&event, &mut sink);
        assert_eq!(decision.cwnd_segments, 5);
        assert_eq!(flow.mode(), Mode::Default);
    }

    #[test]
    fn loss_heavy_flow_enters_loss_mode() {
        let mut sender = TestSender::new(crate::Config::default());

        sender.feedback(0, 0, Some(50_000));

        // Half the bytes lost, far above the 10% threshold.
        for _ in 0..5 {
            sender.advance(60_000);
            sender.feedback(5_000, 5_000, Some(60_000));
        }

        assert_eq!(sender.flow.mode(), Mode::Loss);
    }

    #[test]
    fn reversal_flushes_probing_interval() {
        let mut config = crate::Config::default();
        config.set_probing(Some(ProbingConfig {
            bounce_intervals: 4,
            change_damping: 2,
        }));

        let mut sender = TestSender::new(config);
        sender.srtt = 20_000;

        let mut sink = MemorySink::default();

        sender.feedback_with_sink(0, 0, Some(50_000), &mut sink);

        // Decrease first...
        sender.advance(12_000);
        sender.feedback_with_sink(10_000, 0, Some(150_000), &mut sink);

        // ...then drive sustained increases until the trend flips Up.
        let mut reversed = false;

        for _ in 0..10 {
            sender.advance(12_000);
            sender.feedback_with_sink(6_000, 0, Some(50_000), &mut sink);

            if sink.chunks.iter().any(|c| c.chunk_id < 0) {
                reversed = true;
                break;
            }
        }

        assert!(reversed, "no end-of-interval chunk was flushed");
    }
}
