use crate::error::{HearsayError, Result};

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (live device, WAV file, mock).
/// Sources deliver 16-bit PCM mono samples at the configured rate. A source
/// must never block in `read_samples` for longer than one polling interval;
/// the capture thread is real-time sensitive.
pub trait AudioSource: Send + Sync {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Read whatever samples have accumulated since the previous read.
    ///
    /// An empty vector means no samples are available right now; for a finite
    /// source it means the stream is exhausted.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// True for sources that end on their own (files), false for live devices.
    fn is_finite(&self) -> bool;
}

/// One phase of a mock source's scripted output: `count` reads each returning
/// a copy of `samples`.
#[derive(Debug, Clone)]
pub struct FramePhase {
    pub samples: Vec<i16>,
    pub count: u32,
}

/// Mock audio source for testing.
///
/// By default behaves as a finite source that replays its frame sequence and
/// then returns empty reads forever.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    phases: Vec<FramePhase>,
    phase_index: usize,
    reads_in_phase: u32,
    live: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    pub fn new() -> Self {
        Self {
            is_started: false,
            phases: vec![FramePhase {
                samples: vec![0i16; 160],
                count: u32::MAX,
            }],
            phase_index: 0,
            reads_in_phase: 0,
            live: false,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Replace the scripted output with a single endless phase of `samples`.
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.phases = vec![FramePhase {
            samples,
            count: u32::MAX,
        }];
        self.phase_index = 0;
        self.reads_in_phase = 0;
        self
    }

    /// Script a finite sequence of phases; reads past the end return empty.
    pub fn with_frame_sequence(mut self, phases: Vec<FramePhase>) -> Self {
        self.phases = phases;
        self.phase_index = 0;
        self.reads_in_phase = 0;
        self
    }

    /// Report `is_finite() == false`, like a microphone.
    pub fn as_live_source(mut self) -> Self {
        self.live = true;
        self
    }

    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(HearsayError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(HearsayError::AudioCapture {
                message: self.error_message.clone(),
            });
        }

        while let Some(phase) = self.phases.get(self.phase_index) {
            if self.reads_in_phase < phase.count {
                self.reads_in_phase += 1;
                return Ok(phase.samples.clone());
            }
            self.phase_index += 1;
            self.reads_in_phase = 0;
        }

        // Sequence exhausted
        Ok(Vec::new())
    }

    fn is_finite(&self) -> bool {
        !self.live
    }
}
