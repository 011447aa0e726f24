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

//! Copa delay-based congestion control engine.
//!
//! This crate implements the decision engine of the Copa congestion
//! control algorithm as a host-independent library: the host transport
//! feeds it one [`FeedbackEvent`] per delivery report and applies the
//! returned [`Decision`] (congestion window, pacing rate, slow start
//! threshold). The engine is purely event-driven; it keeps no timers,
//! never blocks, and evaluates all time-based behavior against the
//! timestamps carried on events.
//!
//! Copa targets the rate `mss / (delta * queueing_delay)`: when the
//! standing RTT shows little queueing, the window grows; when the
//! queue builds, it shrinks, with a velocity term accelerating
//! sustained trends. A mode classifier detects competing loss-based
//! flows from the RTT spread and loosens the delay sensitivity so the
//! flow is not starved by them.
//!
//! ## Usage
//!
//! ```
//! use copa::Config;
//! use copa::Copa;
//! use copa::FeedbackEvent;
//! use copa::NoopSink;
//!
//! let config = Config::default();
//! let mut flow = Copa::new(&config, 1);
//!
//! let decision = flow.on_feedback(
//!     &FeedbackEvent {
//!         acked_bytes: 3_000,
//!         lost_bytes: 0,
//!         rtt_us: Some(30_000),
//!         srtt_us: 30_000,
//!         now_us: 1_000_000,
//!         mss: 1_500,
//!         max_pacing_rate: u64::MAX,
//!         in_slow_start: false,
//!     },
//!     &mut NoopSink,
//! );
//!
//! assert!(decision.cwnd_segments > 0);
//! ```
//!
//! Hosts that manage many flows keep one engine per flow in a
//! [`FlowTable`]; flows are independent and never block one another.

use std::str::FromStr;

/// A Copa-specific error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Error in congestion control configuration.
    CongestionControl,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for Error {}

/// A specialized [`Result`] type for Copa operations.
///
/// [`Result`]: https://doc.rust-lang.org/std/result/enum.Result.html
pub type Result<T> = std::result::Result<T, Error>;

/// Deployment profiles.
///
/// The two production deployments of this algorithm disagree on
/// several constants (default delta parameter, loss-mode threshold,
/// whether the ack-silence guard runs); neither set is canonical, so
/// both ship as named presets instead of one hardcoded choice.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Profile {
    /// Throughput-leaning preset: delta 500/1000, 10% loss threshold,
    /// ack-silence guard enabled.
    Aggressive,

    /// Delay-leaning preset: delta 40/1000, ~3.3% loss threshold, no
    /// ack-silence guard.
    LowLatency,
}

impl FromStr for Profile {
    type Err = Error;

    /// Converts a string to `Profile`.
    ///
    /// If `name` is not valid, `Error::CongestionControl` is returned.
    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name {
            "aggressive" => Ok(Profile::Aggressive),
            "low-latency" | "low_latency" => Ok(Profile::LowLatency),

            _ => Err(Error::CongestionControl),
        }
    }
}

/// Engine configuration.
///
/// Every constant of the algorithm is tunable; [`Profile`] presets
/// cover the two deployed parameter sets.
#[derive(Clone, Debug)]
pub struct Config {
    /// Window of the long-horizon minimum RTT filter, microseconds.
    pub(crate) min_rtt_window_us: u64,

    /// Standing RTT window as a fraction of srtt, scale 1000.
    pub(crate) standing_rtt_window_frac: u64,

    /// Default (and maximum) delta parameter, scale 1000.
    pub(crate) default_param: u64,

    /// Loss rate that forces `Loss` mode, scale 1000.
    pub(crate) loss_rate_threshold: u64,

    /// Report epoch length as a fraction of srtt, scale 1000.
    pub(crate) report_interval_frac: u64,

    pub(crate) min_cwnd_segments: u64,

    pub(crate) max_cwnd_segments: u64,

    pub(crate) initial_cwnd_segments: u64,

    /// Coexistence lookback, in multiples of srtt.
    pub(crate) coexistence_lookback_srtt: u64,

    pub(crate) coexistence_epsilon_us: u64,

    pub(crate) history_capacity: usize,

    /// Age horizon of the RTT history, microseconds.
    pub(crate) history_retention_us: u64,

    pub(crate) increase_log_cap: usize,

    pub(crate) pacing_gain: u64,

    /// Compute queueing delay from the standing window rather than the
    /// latest raw sample.
    pub(crate) use_standing_rtt: bool,

    /// Suppress decisions for one baseline RTT after an ack-silence
    /// gap longer than `ack_timeout_gain * min_rtt`.
    pub(crate) ack_silence_guard: bool,

    pub(crate) ack_timeout_gain: u64,

    pub(crate) probing: Option<ProbingConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config::with_profile(Profile::Aggressive)
    }
}

impl Config {
    pub fn with_profile(profile: Profile) -> Self {
        let mut config = Config {
            min_rtt_window_us: 10_000_000,
            standing_rtt_window_frac: 500,
            default_param: 500,
            loss_rate_threshold: 100,
            report_interval_frac: 500,
            min_cwnd_segments: 4,
            max_cwnd_segments: 1 << 24,
            initial_cwnd_segments: 10,
            coexistence_lookback_srtt: 10,
            coexistence_epsilon_us: 100,
            history_capacity: 100_000,
            history_retention_us: 10_000_000,
            increase_log_cap: 40,
            pacing_gain: 2,
            use_standing_rtt: true,
            ack_silence_guard: true,
            ack_timeout_gain: 2,
            probing: None,
        };

        if profile == Profile::LowLatency {
            config.default_param = 40;
            config.loss_rate_threshold = 33;
            config.ack_silence_guard = false;
        }

        config
    }

    /// Sets the delta parameter ceiling, scale 1000.
    pub fn set_default_param(&mut self, v: u64) -> Result<()> {
        if v == 0 || v > 1000 {
            return Err(Error::CongestionControl);
        }

        self.default_param = v;
        Ok(())
    }

    /// Sets the loss rate that forces `Loss` mode, scale 1000.
    pub fn set_loss_rate_threshold(&mut self, v: u64) -> Result<()> {
        if v == 0 || v > 1000 {
            return Err(Error::CongestionControl);
        }

        self.loss_rate_threshold = v;
        Ok(())
    }

    /// Sets the report epoch length as a fraction of srtt, scale 1000.
    pub fn set_report_interval_frac(&mut self, v: u64) -> Result<()> {
        if v == 0 || v > 1000 {
            return Err(Error::CongestionControl);
        }

        self.report_interval_frac = v;
        Ok(())
    }

    /// Sets the standing RTT window as a fraction of srtt, scale 1000.
    pub fn set_standing_rtt_window_frac(&mut self, v: u64) -> Result<()> {
        if v == 0 || v > 1000 {
            return Err(Error::CongestionControl);
        }

        self.standing_rtt_window_frac = v;
        Ok(())
    }

    /// Sets the window of the minimum RTT filter, microseconds.
    pub fn set_min_rtt_window(&mut self, v: u64) {
        self.min_rtt_window_us = v;
    }

    pub fn set_min_cwnd_segments(&mut self, v: u64) -> Result<()> {
        if v == 0 || v > self.max_cwnd_segments {
            return Err(Error::CongestionControl);
        }

        self.min_cwnd_segments = v;
        Ok(())
    }

    pub fn set_max_cwnd_segments(&mut self, v: u64) -> Result<()> {
        if v < self.min_cwnd_segments {
            return Err(Error::CongestionControl);
        }

        self.max_cwnd_segments = v;
        Ok(())
    }

    pub fn set_initial_cwnd_segments(&mut self, v: u64) -> Result<()> {
        if v < self.min_cwnd_segments || v > self.max_cwnd_segments {
            return Err(Error::CongestionControl);
        }

        self.initial_cwnd_segments = v;
        Ok(())
    }

    /// Sets the coexistence lookback, in multiples of srtt.
    pub fn set_coexistence_lookback_srtt(&mut self, v: u64) {
        self.coexistence_lookback_srtt = v;
    }

    pub fn set_coexistence_epsilon(&mut self, v: u64) {
        self.coexistence_epsilon_us = v;
    }

    pub fn set_history_capacity(&mut self, v: usize) -> Result<()> {
        if v == 0 {
            return Err(Error::CongestionControl);
        }

        self.history_capacity = v;
        Ok(())
    }

    /// Sets the age horizon of the RTT history, microseconds.
    pub fn set_history_retention(&mut self, v: u64) {
        self.history_retention_us = v;
    }

    pub fn set_pacing_gain(&mut self, v: u64) -> Result<()> {
        if v == 0 {
            return Err(Error::CongestionControl);
        }

        self.pacing_gain = v;
        Ok(())
    }

    pub fn set_use_standing_rtt(&mut self, v: bool) {
        self.use_standing_rtt = v;
    }

    pub fn set_ack_silence_guard(&mut self, v: bool) {
        self.ack_silence_guard = v;
    }

    /// Enables or disables the probing-cycle extension.
    pub fn set_probing(&mut self, v: Option<ProbingConfig>) {
        self.probing = v;
    }
}

pub use crate::congestion::Copa;
pub use crate::congestion::Decision;
pub use crate::congestion::Direction;
pub use crate::congestion::FeedbackEvent;
pub use crate::congestion::Mode;
pub use crate::congestion::ProbingConfig;
pub use crate::store::FlowTable;
pub use crate::telemetry::NoopSink;
pub use crate::telemetry::ReportChunk;
pub use crate::telemetry::ReportSample;
pub use crate::telemetry::TelemetrySink;

pub mod congestion;
mod minmax;
mod ring;
pub mod store;
pub mod telemetry;
