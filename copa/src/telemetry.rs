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

//! Per-flow telemetry.
//!
//! Feedback samples are batched into fixed-size chunks and handed to an
//! injected sink, so collectors see bounded records instead of a
//! per-ACK firehose. A negative chunk id marks the chunk that closes a
//! probing interval.

use smallvec::SmallVec;

/// Samples per chunk before a flush is forced.
pub const MAX_CHUNK_LEN: usize = 50;

/// A chunk is also flushed when this much time passed since the last
/// flush, microseconds.
pub const FLUSH_INTERVAL_US: u64 = 200_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportSample {
    pub rtt_us: u64,
    pub acked_bytes: u64,
    pub lost_bytes: u64,

    /// Offset from the flow's first feedback event.
    pub timestamp_offset_us: u64,
}

#[derive(Clone, Debug)]
pub struct ReportChunk {
    pub flow_id: u32,

    /// Sequential within a probing interval; negated on the chunk that
    /// ends the interval.
    pub chunk_id: i16,

    pub samples: SmallVec<[ReportSample; MAX_CHUNK_LEN]>,
}

/// Consumer of flushed telemetry chunks.
pub trait TelemetrySink {
    fn report(&mut self, chunk: ReportChunk);
}

/// Discards every chunk.
pub struct NoopSink;

impl TelemetrySink for NoopSink {
    fn report(&mut self, _chunk: ReportChunk) {}
}

/// Collects chunks in memory; test and debugging aid.
#[derive(Default)]
pub struct MemorySink {
    pub chunks: Vec<ReportChunk>,
}

impl TelemetrySink for MemorySink {
    fn report(&mut self, chunk: ReportChunk) {
        self.chunks.push(chunk);
    }
}

pub(crate) struct Reporter {
    flow_id: u32,

    chunk_id: i16,

    samples: SmallVec<[ReportSample; MAX_CHUNK_LEN]>,

    // 0 until the first event is seen.
    first_timestamp_us: u64,

    last_flush_us: u64,
}

impl Reporter {
    pub fn new(flow_id: u32) -> Self {
        Reporter {
            flow_id,
            chunk_id: 1,
            samples: SmallVec::new(),
            first_timestamp_us: 0,
            last_flush_us: 0,
        }
    }

    /// Buffers one feedback sample, flushing if the chunk filled up or
    /// went stale.
    pub fn record(
        &mut self, rtt_us: u64, acked_bytes: u64, lost_bytes: u64, now: u64,
        sink: &mut dyn TelemetrySink,
    ) {
        if self.first_timestamp_us == 0 {
            self.first_timestamp_us = now;
            self.last_flush_us = now;
        }

        if self.samples.len() < MAX_CHUNK_LEN {
            self.samples.push(ReportSample {
                rtt_us,
                acked_bytes,
                lost_bytes,
                timestamp_offset_us: now - self.first_timestamp_us,
            });
        }

        if self.samples.len() >= MAX_CHUNK_LEN ||
            now.saturating_sub(self.last_flush_us) > FLUSH_INTERVAL_US
        {
            self.flush(now, sink);
            self.chunk_id = self.chunk_id.saturating_add(1);
        }
    }

    /// Flushes the pending chunk with a negated id to mark the end of a
    /// probing interval, then restarts chunk numbering.
    pub fn end_interval(&mut self, now: u64, sink: &mut dyn TelemetrySink) {
        if !self.samples.is_empty() {
            self.chunk_id = -self.chunk_id;
            self.flush(now, sink);
        }

        self.chunk_id = 1;
    }

    fn flush(&mut self, now: u64, sink: &mut dyn TelemetrySink) {
        sink.report(ReportChunk {
            flow_id: self.flow_id,
            chunk_id: self.chunk_id,
            samples: std::mem::take(&mut self.samples),
        });

        self.last_flush_us = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(r: &mut Reporter, now: u64, sink: &mut MemorySink) {
        r.record(30_000, 1500, 0, now, sink);
    }

    #[test]
    fn flush_on_full_chunk() {
        let mut r = Reporter::new(7);
        let mut sink = MemorySink::default();

        for i in 0..MAX_CHUNK_LEN as u64 {
            sample(&mut r, 1_000 + i, &mut sink);
        }

        assert_eq!(sink.chunks.len(), 1);

        let chunk = &sink.chunks[0];
        assert_eq!(chunk.flow_id, 7);
        assert_eq!(chunk.chunk_id, 1);
        assert_eq!(chunk.samples.len(), MAX_CHUNK_LEN);
        assert_eq!(chunk.samples[0].timestamp_offset_us, 0);
        assert_eq!(chunk.samples[49].timestamp_offset_us, 49);
    }

    #[test]
    fn flush_on_stale_chunk() {
        let mut r = Reporter::new(1);
        let mut sink = MemorySink::default();

        sample(&mut r, 1_000, &mut sink);
        sample(&mut r, 2_000, &mut sink);
        assert!(sink.chunks.is_empty());

        // More than 200ms since the last flush.
        sample(&mut r, 250_000, &mut sink);

        assert_eq!(sink.chunks.len(), 1);
        assert_eq!(sink.chunks[0].samples.len(), 3);
    }

    #[test]
    fn interval_end_negates_and_restarts() {
        let mut r = Reporter::new(1);
        let mut sink = MemorySink::default();

        for i in 0..(MAX_CHUNK_LEN as u64 + 2) {
            sample(&mut r, 1_000 + i, &mut sink);
        }

        // One full chunk flushed as id 1; two samples pending on id 2.
        assert_eq!(sink.chunks.len(), 1);

        r.end_interval(2_000, &mut sink);

        assert_eq!(sink.chunks.len(), 2);
        assert_eq!(sink.chunks[1].chunk_id, -2);
        assert_eq!(sink.chunks[1].samples.len(), 2);

        // Numbering restarts for the next interval.
        for i in 0..MAX_CHUNK_LEN as u64 {
            sample(&mut r, 3_000 + i, &mut sink);
        }
        assert_eq!(sink.chunks[2].chunk_id, 1);
    }

    #[test]
    fn empty_interval_end_flushes_nothing() {
        let mut r = Reporter::new(1);
        let mut sink = MemorySink::default();

        r.end_interval(1_000, &mut sink);

        assert!(sink.chunks.is_empty());
    }
}
