use crate::error::{HearsayError, Result};
use crate::pipeline::types::AudioChunk;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Time span of one recognized segment, relative to the chunk start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpan {
    pub start_secs: f32,
    pub end_secs: f32,
}

/// Result of transcribing one chunk.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// Sequence number of the transcribed chunk.
    pub chunk_id: u64,
    pub text: String,
    /// Engine confidence in [0,1]. The pipeline clamps this before dispatch;
    /// engine output is not trusted to stay in range.
    pub confidence: f32,
    /// Detected or configured language code.
    pub language: String,
    /// Optional per-segment timings.
    pub segments: Vec<SegmentSpan>,
}

/// Trait for speech-to-text engines.
///
/// `transcribe` is blocking and is never called concurrently by the pipeline:
/// the engine is assumed not to support safe concurrent invocation, and chunk
/// order must be preserved for ordering-sensitive hooks.
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio chunk.
    fn transcribe(&self, chunk: &AudioChunk) -> Result<TranscriptionResult>;

    /// Name of the loaded model.
    fn model_name(&self) -> &str;

    /// Whether the engine is ready to transcribe.
    fn is_ready(&self) -> bool;
}

impl<T: Transcriber> Transcriber for Arc<T> {
    fn transcribe(&self, chunk: &AudioChunk) -> Result<TranscriptionResult> {
        (**self).transcribe(chunk)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing.
#[derive(Debug)]
pub struct MockTranscriber {
    model_name: String,
    response: String,
    confidence: f32,
    language: String,
    delay: Duration,
    should_fail: bool,
    fail_on_chunk: Option<u64>,
    calls: AtomicU64,
}

impl MockTranscriber {
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            confidence: 1.0,
            language: "en".to_string(),
            delay: Duration::ZERO,
            should_fail: false,
            fail_on_chunk: None,
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Note: deliberately not clamped, so tests can feed out-of-range values.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Fail only the chunk with the given sequence number.
    pub fn failing_on_chunk(mut self, sequence: u64) -> Self {
        self.fail_on_chunk = Some(sequence);
        self
    }

    /// Number of transcribe calls made.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, chunk: &AudioChunk) -> Result<TranscriptionResult> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if self.should_fail || self.fail_on_chunk == Some(chunk.sequence) {
            return Err(HearsayError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }

        Ok(TranscriptionResult {
            chunk_id: chunk.sequence,
            text: self.response.clone(),
            confidence: self.confidence,
            language: self.language.clone(),
            segments: vec![SegmentSpan {
                start_secs: 0.0,
                end_secs: chunk.duration.as_secs_f32(),
            }],
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn chunk(sequence: u64) -> AudioChunk {
        AudioChunk::new(sequence, SystemTime::now(), vec![0i16; 16000], 16000)
    }

    #[test]
    fn test_mock_returns_response_with_chunk_id() {
        let transcriber = MockTranscriber::new("test-model").with_response("hello there");

        let result = transcriber.transcribe(&chunk(7)).unwrap();
        assert_eq!(result.chunk_id, 7);
        assert_eq!(result.text, "hello there");
        assert_eq!(result.language, "en");
        assert_eq!(result.segments.len(), 1);
        assert!((result.segments[0].end_secs - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_mock_failure() {
        let transcriber = MockTranscriber::new("test-model").with_failure();

        match transcriber.transcribe(&chunk(0)) {
            Err(HearsayError::Transcription { message }) => {
                assert_eq!(message, "mock transcription failure");
            }
            _ => panic!("Expected Transcription error"),
        }
        assert!(!transcriber.is_ready());
    }

    #[test]
    fn test_mock_fails_only_on_selected_chunk() {
        let transcriber = MockTranscriber::new("test-model").failing_on_chunk(1);

        assert!(transcriber.transcribe(&chunk(0)).is_ok());
        assert!(transcriber.transcribe(&chunk(1)).is_err());
        assert!(transcriber.transcribe(&chunk(2)).is_ok());
        assert_eq!(transcriber.calls(), 3);
    }

    #[test]
    fn test_mock_out_of_range_confidence_passes_through() {
        // The pipeline is responsible for clamping, not the engine mock.
        let transcriber = MockTranscriber::new("test-model").with_confidence(1.7);
        let result = transcriber.transcribe(&chunk(0)).unwrap();
        assert_eq!(result.confidence, 1.7);
    }

    #[test]
    fn test_transcriber_trait_is_object_safe() {
        let transcriber: Box<dyn Transcriber> =
            Box::new(MockTranscriber::new("test-model").with_response("boxed"));

        assert_eq!(transcriber.model_name(), "test-model");
        assert_eq!(transcriber.transcribe(&chunk(0)).unwrap().text, "boxed");
    }

    #[test]
    fn test_arc_transcriber_delegates() {
        let inner = Arc::new(MockTranscriber::new("shared").with_response("via arc"));
        let result = inner.transcribe(&chunk(2)).unwrap();
        assert_eq!(result.text, "via arc");
        assert_eq!(inner.model_name(), "shared");
    }
}
