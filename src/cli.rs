//! Command-line interface for hearsay
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live audio captioning with post-transcription hooks
#[derive(Parser, Debug)]
#[command(
    name = "hearsay",
    version,
    about = "Live audio captioning with post-transcription hooks"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status messages (captions and hook output still print)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Audio input device name (see `hearsay devices`)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Path to the Whisper model file
    #[arg(long, value_name = "PATH")]
    pub model: Option<String>,

    /// Language code for transcription (default: auto-detect). Examples: auto, en, de
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Chunk duration. Examples: 5s, 2500ms, 1m
    #[arg(long, short = 'c', value_name = "DURATION", value_parser = parse_duration_ms)]
    pub chunk_duration: Option<u32>,

    /// Transcribe a WAV file instead of capturing live audio
    #[arg(long, value_name = "FILE")]
    pub wav: Option<PathBuf>,
}

/// Parse a duration string into milliseconds.
///
/// Accepts bare numbers (seconds) and any format `humantime` understands
/// (`5s`, `2500ms`, `1m30s`).
fn parse_duration_ms(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return u32::try_from(secs * 1000).map_err(|_| "duration too large".to_string());
    }
    humantime::parse_duration(s)
        .map_err(|e| e.to_string())
        .and_then(|d| u32::try_from(d.as_millis()).map_err(|_| "duration too large".to_string()))
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Validate the configured hooks and show each one's startup status
    Hooks,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_number_is_seconds() {
        assert_eq!(parse_duration_ms("5").unwrap(), 5000);
    }

    #[test]
    fn test_parse_humantime_formats() {
        assert_eq!(parse_duration_ms("5s").unwrap(), 5000);
        assert_eq!(parse_duration_ms("2500ms").unwrap(), 2500);
        assert_eq!(parse_duration_ms("1m30s").unwrap(), 90_000);
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_duration_ms("soon").is_err());
    }

    #[test]
    fn test_cli_parses_caption_flags() {
        let cli = Cli::parse_from([
            "hearsay",
            "--device",
            "pipewire",
            "--chunk-duration",
            "3s",
            "--language",
            "en",
        ]);
        assert!(cli.command.is_none());
        assert_eq!(cli.device.as_deref(), Some("pipewire"));
        assert_eq!(cli.chunk_duration, Some(3000));
        assert_eq!(cli.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["hearsay", "devices"]);
        assert!(matches!(cli.command, Some(Commands::Devices)));

        let cli = Cli::parse_from(["hearsay", "hooks", "--config", "/tmp/c.toml"]);
        assert!(matches!(cli.command, Some(Commands::Hooks)));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/c.toml")));
    }
}
