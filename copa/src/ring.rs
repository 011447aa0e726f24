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

//! Fixed-capacity ring buffer.
//!
//! Entries are addressed by virtual index relative to the head, with
//! `head`, `tail` and `len` maintained modulo the capacity. Pushing
//! into a full ring silently drops the oldest entry; that is a
//! capacity-exhaustion fallback, not the primary eviction path, which
//! is [`Ring::advance`] driven by the owner's retention policy.

pub struct Ring<T> {
    buf: Vec<T>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T: Copy + Default> Ring<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0);

        Ring {
            buf: vec![T::default(); capacity],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends an entry at the tail. When the ring is full the oldest
    /// entry is dropped and `true` is returned.
    pub fn push(&mut self, val: T) -> bool {
        let capacity = self.capacity();

        self.buf[self.tail] = val;
        self.tail = (self.tail + 1) % capacity;

        if self.len < capacity {
            self.len += 1;
            false
        } else {
            self.head = (self.head + 1) % capacity;
            true
        }
    }

    /// Returns the entry at virtual index `idx` (0 is the oldest).
    pub fn get(&self, idx: usize) -> Option<&T> {
        if idx >= self.len {
            return None;
        }

        Some(&self.buf[(self.head + idx) % self.capacity()])
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.get(self.len.checked_sub(1)?)
    }

    /// Drops the `n` oldest entries in one step.
    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.len);

        self.head = (self.head + n) % self.capacity();
        self.len -= n;
    }

    /// Returns the first virtual index whose entry satisfies `pred`,
    /// assuming entries are partitioned (all non-matching entries
    /// precede all matching ones).
    ///
    /// This is a binary search over the virtual index range, so it
    /// probes at most ceil(log2(capacity)) entries regardless of how
    /// many are stored; the owner can trim an arbitrarily old head
    /// without ever scanning the ring linearly.
    pub fn partition_point(&self, pred: impl Fn(&T) -> bool) -> usize {
        let mut lo = 0;
        let mut hi = self.len;

        while lo < hi {
            let mid = (lo + hi) / 2;

            if pred(self.get(mid).unwrap()) {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        lo
    }
}
