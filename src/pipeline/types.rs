//! Data types flowing through the audio pipeline.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A block of raw audio samples with capture metadata.
///
/// Frames are ephemeral: the capture thread creates them and they are consumed
/// when the assembler folds them into a chunk.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// PCM samples (16-bit signed integers, mono).
    pub samples: Vec<i16>,
    /// Sample rate of this frame.
    pub sample_rate: u32,
    /// Channel count (always 1 after capture-side downmix).
    pub channels: u16,
    /// Wall-clock time the frame was delivered by the device.
    pub captured_at: SystemTime,
}

impl AudioFrame {
    /// Creates a new audio frame stamped with the current time.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
            captured_at: SystemTime::now(),
        }
    }

    /// Duration of this frame.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// A fixed-duration slice of captured audio, ready for transcription.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Strictly increasing sequence number, starting at 0.
    pub sequence: u64,
    /// Wall-clock time of the first sample in this chunk.
    pub start_time: SystemTime,
    /// Audio duration covered by `samples`.
    pub duration: Duration,
    /// PCM samples (16-bit signed integers, mono).
    pub samples: Vec<i16>,
    /// Sample rate of `samples`.
    pub sample_rate: u32,
}

impl AudioChunk {
    pub fn new(sequence: u64, start_time: SystemTime, samples: Vec<i16>, sample_rate: u32) -> Self {
        let duration = Duration::from_secs_f64(samples.len() as f64 / sample_rate as f64);
        Self {
            sequence,
            start_time,
            duration,
            samples,
            sample_rate,
        }
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        self.duration.as_millis() as u32
    }

    /// Chunk start as seconds since the unix epoch (webhook timestamp field).
    pub fn start_unix_secs(&self) -> f64 {
        self.start_time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_frame_duration() {
        let frame = AudioFrame::new(vec![0i16; 1600], 16000);
        assert_eq!(frame.duration(), Duration::from_millis(100));
        assert_eq!(frame.channels, 1);
    }

    #[test]
    fn test_audio_chunk_duration_derived_from_samples() {
        let chunk = AudioChunk::new(3, SystemTime::now(), vec![0i16; 80_000], 16000);
        assert_eq!(chunk.sequence, 3);
        assert_eq!(chunk.duration_ms(), 5000);
    }

    #[test]
    fn test_chunk_start_unix_secs_is_recent() {
        let chunk = AudioChunk::new(0, SystemTime::now(), vec![0i16; 16000], 16000);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        assert!(chunk.start_unix_secs() > 0.0);
        assert!((now - chunk.start_unix_secs()).abs() < 5.0);
    }

    #[test]
    fn test_empty_chunk_duration_is_zero() {
        let chunk = AudioChunk::new(0, SystemTime::now(), vec![], 16000);
        assert_eq!(chunk.duration_ms(), 0);
    }
}
