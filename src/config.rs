use crate::defaults;
use crate::hooks::HookKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub hooks: HooksConfig,
}

/// Audio capture and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub chunk_duration_ms: u32,
    pub overlap_ms: u32,
    pub buffer_chunks: usize,
    pub flush_partial: bool,
    pub min_final_chunk_ms: u32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    /// Path to the model file.
    pub model: String,
    pub language: String,
}

/// Hook system configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HooksConfig {
    /// Master switch; when false no hooks are built at all.
    pub enabled: bool,
    /// How long to wait for in-flight hooks at shutdown before abandoning them.
    pub drain_timeout_ms: u64,
    pub hooks: Vec<HookEntry>,
}

/// One configured hook.
///
/// `config` holds the kind-specific keys; string values may embed `${VAR}`
/// placeholders that are resolved once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HookEntry {
    pub kind: HookKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub config: toml::Table,
}

fn default_true() -> bool {
    true
}

impl HookEntry {
    /// Display name: explicit `name` if set, otherwise the kind.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.kind.as_str().to_string())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            chunk_duration_ms: defaults::CHUNK_DURATION_MS,
            overlap_ms: defaults::OVERLAP_MS,
            buffer_chunks: defaults::BUFFER_CHUNKS,
            flush_partial: true,
            min_final_chunk_ms: defaults::MIN_FINAL_CHUNK_MS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            drain_timeout_ms: defaults::DRAIN_TIMEOUT_MS,
            hooks: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Panics on invalid TOML; a present-but-broken config should not be
    /// silently replaced with defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - HEARSAY_MODEL → stt.model
    /// - HEARSAY_LANGUAGE → stt.language
    /// - HEARSAY_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("HEARSAY_MODEL")
            && !model.is_empty()
        {
            self.stt.model = model;
        }

        if let Ok(language) = std::env::var("HEARSAY_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(device) = std::env::var("HEARSAY_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/hearsay/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("hearsay")
            .join("config.toml")
    }
}
