//! Session orchestration: wires the capture thread, the frame ring, the
//! assemble/transcribe worker, and the hook dispatcher into one lifecycle.
//!
//! Lifecycle: `create → run → stop → drain → dispose`. A single stop signal
//! propagates cooperatively: the capture thread stops producing and closes
//! the ring, the worker drains queued frames and the assembler's tail, an
//! in-flight transcription completes and is dispatched, then the dispatcher
//! gets its bounded drain window.

use crate::audio::source::AudioSource;
use crate::error::Result;
use crate::hooks::dispatcher::{DispatchSummary, ResultDispatcher};
use crate::pipeline::assembler::{ChunkAssembler, ChunkAssemblerConfig};
use crate::pipeline::ring::FrameRing;
use crate::pipeline::types::AudioFrame;
use crate::stt::transcriber::Transcriber;
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for a capture session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Chunk assembly settings.
    pub assembler: ChunkAssemblerConfig,
    /// Frame ring capacity, in multiples of one chunk's sample count.
    pub buffer_chunks: usize,
    /// Capture polling interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Hook drain window applied at shutdown.
    pub drain_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            assembler: ChunkAssemblerConfig::default(),
            buffer_chunks: crate::defaults::BUFFER_CHUNKS,
            poll_interval_ms: crate::defaults::POLL_INTERVAL_MS,
            drain_timeout: Duration::from_millis(crate::defaults::DRAIN_TIMEOUT_MS),
        }
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub chunks_emitted: u64,
    pub chunks_transcribed: u64,
    /// Chunks skipped because transcription failed (recoverable).
    pub chunks_failed: u64,
    /// Frames dropped by ring overflow (recorded, non-fatal).
    pub frames_dropped: u64,
    /// Samples discarded by the final-partial-chunk policy.
    pub discarded_tail_samples: u64,
    pub dispatch: DispatchSummary,
}

/// A capture → transcribe → dispatch session.
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Starts the session.
    ///
    /// Fails fast if the audio source cannot start (fatal capture error).
    /// Afterwards, a capture error mid-stream records a fatal error on the
    /// handle and winds the session down; transcription failures only skip
    /// their chunk.
    pub fn start(
        self,
        mut audio_source: Box<dyn AudioSource>,
        transcriber: Arc<dyn Transcriber>,
        dispatcher: ResultDispatcher,
    ) -> Result<SessionHandle> {
        let sample_rate = self.config.assembler.sample_rate;
        let mut assembler = ChunkAssembler::new(self.config.assembler.clone());
        let ring_capacity = assembler.chunk_samples() * self.config.buffer_chunks.max(1);
        let ring = Arc::new(FrameRing::new(ring_capacity));

        audio_source.start()?;

        let running = Arc::new(AtomicBool::new(true));
        let fatal: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let (summary_tx, summary_rx) = bounded(1);

        // Capture thread: poll the source, push frames, never block downstream.
        let capture_ring = ring.clone();
        let capture_running = running.clone();
        let capture_fatal = fatal.clone();
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let source_is_finite = audio_source.is_finite();
        let capture_handle = thread::spawn(move || {
            while capture_running.load(Ordering::SeqCst) {
                match audio_source.read_samples() {
                    Ok(samples) if !samples.is_empty() => {
                        let dropped = capture_ring.push(AudioFrame::new(samples, sample_rate));
                        if dropped > 0 {
                            tracing::warn!(dropped, "frame buffer overflow, oldest frames dropped");
                        }
                    }
                    Ok(_) => {
                        if source_is_finite {
                            // File source exhausted
                            break;
                        }
                        // Live source: empty reads are normal while the
                        // device warms up
                    }
                    Err(e) => {
                        // Device loss is fatal to the session, not retried
                        tracing::error!("audio capture failed: {}", e);
                        if let Ok(mut slot) = capture_fatal.lock() {
                            *slot = Some(e.to_string());
                        }
                        capture_running.store(false, Ordering::SeqCst);
                        break;
                    }
                }
                thread::sleep(poll_interval);
            }

            capture_ring.close();
            if let Err(e) = audio_source.stop() {
                tracing::warn!("failed to stop audio capture: {}", e);
            }
        });

        // Worker thread: assemble chunks, transcribe serially, dispatch.
        // Owns the dispatcher and performs its drain at the end.
        let worker_ring = ring.clone();
        let worker_running = running.clone();
        let worker_handle = thread::spawn(move || {
            assembler.start();

            let mut chunks_emitted = 0u64;
            let mut chunks_transcribed = 0u64;
            let mut chunks_failed = 0u64;

            let process = |chunk: crate::pipeline::types::AudioChunk,
                           transcribed: &mut u64,
                           failed: &mut u64| {
                let start_time = chunk.start_time;
                match transcriber.transcribe(&chunk) {
                    Ok(mut result) => {
                        if !result.confidence.is_finite() {
                            tracing::warn!(
                                chunk = chunk.sequence,
                                "engine returned non-finite confidence, using 0"
                            );
                            result.confidence = 0.0;
                        } else if !(0.0..=1.0).contains(&result.confidence) {
                            tracing::warn!(
                                chunk = chunk.sequence,
                                confidence = result.confidence,
                                "engine confidence out of range, clamping"
                            );
                            result.confidence = result.confidence.clamp(0.0, 1.0);
                        }

                        *transcribed += 1;
                        if result.text.trim().is_empty() {
                            tracing::debug!(
                                chunk = chunk.sequence,
                                "empty transcription, nothing to dispatch"
                            );
                        } else {
                            dispatcher.dispatch(result, start_time);
                        }
                    }
                    Err(e) => {
                        *failed += 1;
                        tracing::warn!(chunk = chunk.sequence, "chunk skipped: {}", e);
                    }
                }
            };

            loop {
                match worker_ring.pop(Duration::from_millis(100)) {
                    Some(frame) => {
                        for chunk in assembler.push(frame) {
                            chunks_emitted += 1;
                            process(chunk, &mut chunks_transcribed, &mut chunks_failed);
                        }
                    }
                    None => {
                        if worker_ring.is_drained() {
                            break;
                        }
                        // Timeout; capture is still live or about to close
                    }
                }
            }

            // Drain: resolve the trailing partial chunk per policy
            if let Some(tail) = assembler.drain() {
                chunks_emitted += 1;
                process(tail, &mut chunks_transcribed, &mut chunks_failed);
            }

            let summary = SessionSummary {
                chunks_emitted,
                chunks_transcribed,
                chunks_failed,
                frames_dropped: worker_ring.dropped_frames(),
                discarded_tail_samples: assembler.discarded_tail_samples(),
                dispatch: dispatcher.shutdown(),
            };
            let _ = summary_tx.send(summary);

            // Mark the session finished for anyone watching the flag
            worker_running.store(false, Ordering::SeqCst);
        });

        let stop_wait = self.config.drain_timeout + Duration::from_secs(10);

        Ok(SessionHandle {
            running,
            fatal,
            threads: vec![capture_handle, worker_handle],
            summary_rx: Some(summary_rx),
            stop_wait,
        })
    }
}

/// Handle to a running session.
pub struct SessionHandle {
    running: Arc<AtomicBool>,
    fatal: Arc<Mutex<Option<String>>>,
    threads: Vec<JoinHandle<()>>,
    summary_rx: Option<crossbeam_channel::Receiver<SessionSummary>>,
    stop_wait: Duration,
}

impl SessionHandle {
    /// True while the session is producing; flips false on stop, fatal
    /// capture error, or a finite source draining.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The fatal capture error, if one ended the session.
    pub fn fatal_error(&self) -> Option<String> {
        self.fatal.lock().ok().and_then(|slot| slot.clone())
    }

    /// Stops the session and waits for the drain to finish.
    ///
    /// Allows the in-flight transcription to complete and its hooks to run
    /// within the drain window, then detaches anything still stuck.
    pub fn stop(mut self) -> Option<SessionSummary> {
        self.running.store(false, Ordering::SeqCst);

        let summary = self
            .summary_rx
            .take()
            .and_then(|rx| rx.recv_timeout(self.stop_wait).ok());

        // Give threads a bounded window to finish, joining completed ones to
        // surface panics; whatever is left detaches and dies with the process.
        let deadline = Instant::now() + Duration::from_secs(1);
        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        tracing::error!("session thread panicked: {}", msg);
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    stuck = self.threads.len(),
                    "shutdown timeout, detaching remaining session threads"
                );
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }

        summary
    }
}
