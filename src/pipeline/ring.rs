//! Bounded frame buffer between the capture thread and the pipeline worker.
//!
//! Single producer, single consumer. The capture side must never block, so
//! overflow is handled by dropping the oldest unconsumed frames and counting
//! them; the consumer side blocks with a timeout until a frame arrives or the
//! ring is closed.

use crate::pipeline::types::AudioFrame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

struct RingState {
    frames: VecDeque<AudioFrame>,
    queued_samples: usize,
    closed: bool,
}

/// Bounded drop-oldest frame queue.
///
/// Capacity is expressed in samples (a small multiple of one chunk's sample
/// count) rather than frames, since frame sizes vary with device timing.
pub struct FrameRing {
    state: Mutex<RingState>,
    not_empty: Condvar,
    capacity_samples: usize,
    dropped_frames: AtomicU64,
}

impl FrameRing {
    /// Creates a ring holding up to `capacity_samples` samples.
    pub fn new(capacity_samples: usize) -> Self {
        Self {
            state: Mutex::new(RingState {
                frames: VecDeque::new(),
                queued_samples: 0,
                closed: false,
            }),
            not_empty: Condvar::new(),
            capacity_samples: capacity_samples.max(1),
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Pushes a frame, evicting the oldest queued frames if the ring is full.
    ///
    /// Never blocks. Returns the number of frames dropped to make room.
    pub fn push(&self, frame: AudioFrame) -> u64 {
        let mut dropped = 0u64;
        {
            let mut state = match self.state.lock() {
                Ok(s) => s,
                Err(poisoned) => poisoned.into_inner(),
            };

            if state.closed {
                return 0;
            }

            while state.queued_samples + frame.samples.len() > self.capacity_samples
                && !state.frames.is_empty()
            {
                if let Some(old) = state.frames.pop_front() {
                    state.queued_samples -= old.samples.len();
                    dropped += 1;
                }
            }

            state.queued_samples += frame.samples.len();
            state.frames.push_back(frame);
        }

        if dropped > 0 {
            self.dropped_frames.fetch_add(dropped, Ordering::Relaxed);
        }
        self.not_empty.notify_one();
        dropped
    }

    /// Pops the oldest frame, waiting up to `timeout`.
    ///
    /// Returns `None` on timeout, or when the ring is closed and empty.
    pub fn pop(&self, timeout: Duration) -> Option<AudioFrame> {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };

        loop {
            if let Some(frame) = state.frames.pop_front() {
                state.queued_samples -= frame.samples.len();
                return Some(frame);
            }
            if state.closed {
                return None;
            }
            let (next, result) = match self.not_empty.wait_timeout(state, timeout) {
                Ok(pair) => pair,
                Err(poisoned) => poisoned.into_inner(),
            };
            state = next;
            // On timeout with nothing queued, return None; the caller
            // re-checks its stop flag and retries.
            if result.timed_out() && state.frames.is_empty() && !state.closed {
                return None;
            }
        }
    }

    /// Closes the ring: the producer stops enqueueing, the consumer drains
    /// what is left and then sees `None`.
    pub fn close(&self) {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.closed = true;
        drop(state);
        self.not_empty.notify_all();
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        match self.state.lock() {
            Ok(s) => s.closed,
            Err(poisoned) => poisoned.into_inner().closed,
        }
    }

    /// True when the ring is closed and fully drained.
    pub fn is_drained(&self) -> bool {
        match self.state.lock() {
            Ok(s) => s.closed && s.frames.is_empty(),
            Err(poisoned) => {
                let s = poisoned.into_inner();
                s.closed && s.frames.is_empty()
            }
        }
    }

    /// Number of frames currently queued.
    pub fn len(&self) -> usize {
        match self.state.lock() {
            Ok(s) => s.frames.len(),
            Err(poisoned) => poisoned.into_inner().frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total frames dropped to overflow since creation.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }
}
