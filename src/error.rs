//! Error types for hearsay.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HearsayError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors (fatal: terminate the session)
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Transcription errors (recoverable per chunk)
    #[error("Transcription model not found at {path}")]
    TranscriptionModelNotFound { path: String },

    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    // Hook construction errors. Execution failures never surface as errors;
    // they are HookResult values recorded by the dispatcher.
    #[error("Hook '{hook}' misconfigured: {message}")]
    HookConfig { hook: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HearsayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = HearsayError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = HearsayError::ConfigInvalidValue {
            key: "audio.chunk_duration_ms".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for audio.chunk_duration_ms: must be positive"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = HearsayError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_capture_display() {
        let error = HearsayError::AudioCapture {
            message: "stream closed".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: stream closed");
    }

    #[test]
    fn test_transcription_display() {
        let error = HearsayError::Transcription {
            message: "inference failed".to_string(),
        };
        assert_eq!(error.to_string(), "Transcription failed: inference failed");
    }

    #[test]
    fn test_hook_config_display() {
        let error = HearsayError::HookConfig {
            hook: "webhook".to_string(),
            message: "missing required key 'url'".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Hook 'webhook' misconfigured: missing required key 'url'"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: HearsayError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: HearsayError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<HearsayError>();
        assert_sync::<HearsayError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
