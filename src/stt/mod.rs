//! Speech-to-text: the `Transcriber` seam and its implementations.

pub mod transcriber;
pub mod whisper;

pub use transcriber::{MockTranscriber, SegmentSpan, Transcriber, TranscriptionResult};
pub use whisper::{WhisperConfig, WhisperTranscriber};
