//! Incremental NUL-delimited framing.
//!
//! The transport hands over bytes in whatever chunks the socket produced.
//! [`Framer::feed`] buffers partial frames across calls and returns every
//! packet completed by the new chunk. A frame that fails to parse is
//! dropped with a warning and framing carries on at the next NUL, so one
//! corrupt message never desynchronizes the stream.

use crate::Packet;

/// Default upper bound on a single buffered frame (1 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 1 << 20;

/// Splits a byte stream into NUL-terminated frames and parses each one.
#[derive(Debug)]
pub struct Framer {
    buffer: Vec<u8>,
    max_frame_len: usize,
    /// Set when the current frame overflowed; bytes are skipped until the
    /// next NUL.
    discarding: bool,
}

impl Framer {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Creates a framer that discards frames longer than `max_frame_len`.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_len,
            discarding: false,
        }
    }

    /// Feeds a chunk and returns the packets it completed, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Packet> {
        let mut ready = Vec::new();
        let mut rest = bytes;

        while let Some(pos) = rest.iter().position(|&b| b == 0) {
            let (head, tail) = rest.split_at(pos);
            rest = &tail[1..];

            if self.discarding {
                self.discarding = false;
                self.buffer.clear();
                continue;
            }

            self.buffer.extend_from_slice(head);
            let frame = std::mem::take(&mut self.buffer);
            if frame.len() > self.max_frame_len {
                tracing::warn!(len = frame.len(), "dropping oversized frame");
                continue;
            }
            if let Some(packet) = Self::decode(&frame) {
                ready.push(packet);
            }
        }

        if !self.discarding {
            self.buffer.extend_from_slice(rest);
            if self.buffer.len() > self.max_frame_len {
                tracing::warn!(
                    len = self.buffer.len(),
                    max = self.max_frame_len,
                    "frame exceeds limit, discarding until next terminator"
                );
                self.buffer.clear();
                self.discarding = true;
            }
        }

        ready
    }

    /// Drops any partial frame. Called when the connection goes away.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Number of bytes held for an incomplete frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn decode(frame: &[u8]) -> Option<Packet> {
        // Servers sometimes pad with a newline after the terminator.
        if frame.iter().all(|b| matches!(b, b'\n' | b'\r')) {
            return None;
        }
        match crate::parse(frame) {
            Ok(packet) => {
                tracing::debug!(%packet, "packet ready");
                Some(packet)
            }
            Err(e) => {
                tracing::warn!(error = %e, len = frame.len(), "dropping malformed frame");
                None
            }
        }
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}
