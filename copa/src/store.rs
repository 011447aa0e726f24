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

//! Keyed per-flow state storage.
//!
//! Hosts that manage many flows keep one engine instance per flow in
//! this table. Flows are sharded so independent flows never contend;
//! events for the *same* flow must be serialized by the host, which
//! every transport stack already guarantees.

use std::hash::Hash;

use dashmap::DashMap;

use crate::congestion::Copa;
use crate::congestion::Decision;
use crate::congestion::FeedbackEvent;
use crate::telemetry::TelemetrySink;
use crate::Config;

pub struct FlowTable<K: Eq + Hash> {
    flows: DashMap<K, Copa>,
}

impl<K: Eq + Hash> Default for FlowTable<K> {
    fn default() -> Self {
        FlowTable::new()
    }
}

impl<K: Eq + Hash> FlowTable<K> {
    pub fn new() -> Self {
        FlowTable {
            flows: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Registers a new flow, replacing any previous state under the
    /// same key.
    pub fn insert(&self, key: K, config: &Config, flow_id: u32) {
        self.flows.insert(key, Copa::new(config, flow_id));
    }

    /// Feeds one feedback event to the flow's engine. Returns `None`
    /// when the flow is unknown (already evicted, or never registered).
    pub fn on_feedback(
        &self, key: &K, event: &FeedbackEvent, sink: &mut dyn TelemetrySink,
    ) -> Option<Decision> {
        let mut flow = self.flows.get_mut(key)?;

        Some(flow.on_feedback(event, sink))
    }

    /// Drops a finished flow's state.
    pub fn evict(&self, key: &K) -> bool {
        self.flows.remove(key).is_some()
    }
}
