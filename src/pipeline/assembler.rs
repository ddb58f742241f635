//! Chunk assembly: folds raw frames into fixed-duration chunks.
//!
//! The assembler is a plain state machine driven by the pipeline worker:
//! `Idle → Running → Draining → Stopped`. It assigns strictly increasing
//! sequence numbers starting at 0 and stamps each chunk with the wall-clock
//! time of its first sample.

use crate::defaults;
use crate::pipeline::types::{AudioChunk, AudioFrame};
use std::time::{Duration, SystemTime};

/// Assembler lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Created but not started; frames are rejected.
    Idle,
    /// Accepting frames and emitting full chunks.
    Running,
    /// Stop requested; the final partial chunk is being resolved.
    Draining,
    /// Terminal; no further chunks are emitted.
    Stopped,
}

/// Configuration for the chunk assembler.
#[derive(Debug, Clone)]
pub struct ChunkAssemblerConfig {
    /// Target chunk duration in milliseconds.
    pub chunk_duration_ms: u32,
    /// Trailing samples of the previous chunk prepended to the next one
    /// (0 = no overlap).
    pub overlap_ms: u32,
    /// Sample rate for duration calculations.
    pub sample_rate: u32,
    /// Whether the trailing partial chunk is flushed at stream end.
    pub flush_partial: bool,
    /// Minimum duration for a flushed partial chunk; shorter tails are
    /// discarded even when `flush_partial` is set.
    pub min_final_chunk_ms: u32,
}

impl Default for ChunkAssemblerConfig {
    fn default() -> Self {
        Self {
            chunk_duration_ms: defaults::CHUNK_DURATION_MS,
            overlap_ms: defaults::OVERLAP_MS,
            sample_rate: defaults::SAMPLE_RATE,
            flush_partial: true,
            min_final_chunk_ms: defaults::MIN_FINAL_CHUNK_MS,
        }
    }
}

/// Accumulates frames and emits fixed-duration chunks.
pub struct ChunkAssembler {
    config: ChunkAssemblerConfig,
    state: AssemblerState,
    /// Samples accumulated for the chunk currently being built.
    buffer: Vec<i16>,
    /// Samples carried over from the previous chunk when overlap is enabled.
    overlap_buffer: Vec<i16>,
    /// Sequence number for the next chunk.
    next_sequence: u64,
    /// Wall-clock time of the first buffered sample.
    chunk_start: Option<SystemTime>,
    /// Samples discarded by the end-of-stream policy.
    discarded_tail_samples: u64,
}

impl ChunkAssembler {
    pub fn new(config: ChunkAssemblerConfig) -> Self {
        Self {
            config,
            state: AssemblerState::Idle,
            buffer: Vec::new(),
            overlap_buffer: Vec::new(),
            next_sequence: 0,
            chunk_start: None,
            discarded_tail_samples: 0,
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Number of samples in one full chunk.
    pub fn chunk_samples(&self) -> usize {
        (self.config.chunk_duration_ms as u64 * self.config.sample_rate as u64 / 1000) as usize
    }

    fn overlap_samples(&self) -> usize {
        (self.config.overlap_ms as u64 * self.config.sample_rate as u64 / 1000) as usize
    }

    /// Duration of the currently buffered audio in milliseconds.
    pub fn buffered_ms(&self) -> u32 {
        (self.buffer.len() as u64 * 1000 / self.config.sample_rate as u64) as u32
    }

    /// Samples discarded by the final-partial policy.
    pub fn discarded_tail_samples(&self) -> u64 {
        self.discarded_tail_samples
    }

    /// Idle → Running. No-op in any other state.
    pub fn start(&mut self) {
        if self.state == AssemblerState::Idle {
            self.state = AssemblerState::Running;
        }
    }

    /// Feeds one frame, returning any chunks completed by it.
    ///
    /// A frame longer than the remaining chunk capacity can complete more
    /// than one chunk at once.
    pub fn push(&mut self, frame: AudioFrame) -> Vec<AudioChunk> {
        if self.state != AssemblerState::Running {
            return Vec::new();
        }

        if self.buffer.is_empty() && self.overlap_buffer.is_empty() {
            self.chunk_start = Some(frame.captured_at);
        }

        if !self.overlap_buffer.is_empty() {
            let overlap = std::mem::take(&mut self.overlap_buffer);
            // The overlap replays audio that started before this frame.
            if self.buffer.is_empty() {
                let overlap_duration =
                    Duration::from_secs_f64(overlap.len() as f64 / self.config.sample_rate as f64);
                self.chunk_start = Some(
                    frame
                        .captured_at
                        .checked_sub(overlap_duration)
                        .unwrap_or(frame.captured_at),
                );
            }
            self.buffer.extend_from_slice(&overlap);
        }

        self.buffer.extend_from_slice(&frame.samples);

        let chunk_samples = self.chunk_samples();
        let mut chunks = Vec::new();
        while self.buffer.len() >= chunk_samples {
            chunks.push(self.emit(chunk_samples));
        }
        chunks
    }

    /// Running → Draining → Stopped. Resolves the trailing partial chunk per
    /// the configured policy and returns it if it is flushed.
    pub fn drain(&mut self) -> Option<AudioChunk> {
        if self.state != AssemblerState::Running {
            self.state = AssemblerState::Stopped;
            return None;
        }
        self.state = AssemblerState::Draining;

        let flushed = if self.buffer.is_empty() {
            None
        } else if self.config.flush_partial && self.buffered_ms() >= self.config.min_final_chunk_ms
        {
            let len = self.buffer.len();
            Some(self.emit(len))
        } else {
            self.discarded_tail_samples += self.buffer.len() as u64;
            tracing::debug!(
                samples = self.buffer.len(),
                "discarding sub-threshold final partial chunk"
            );
            self.buffer.clear();
            None
        };

        self.state = AssemblerState::Stopped;
        flushed
    }

    /// Emits a chunk of exactly `take` samples from the front of the buffer.
    fn emit(&mut self, take: usize) -> AudioChunk {
        let remainder = self.buffer.split_off(take.min(self.buffer.len()));
        let samples = std::mem::replace(&mut self.buffer, remainder);

        let start_time = self.chunk_start.unwrap_or_else(SystemTime::now);
        let chunk = AudioChunk::new(
            self.next_sequence,
            start_time,
            samples,
            self.config.sample_rate,
        );
        self.next_sequence += 1;

        // The remainder's first sample starts exactly one chunk later.
        self.chunk_start = Some(start_time + chunk.duration);

        // Retain the tail of this chunk for the next one when configured.
        let overlap = self.overlap_samples();
        if overlap > 0 && chunk.samples.len() > overlap {
            self.overlap_buffer = chunk.samples[chunk.samples.len() - overlap..].to_vec();
        }

        chunk
    }
}
