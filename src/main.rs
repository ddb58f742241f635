use anyhow::Result;
use clap::Parser;
use hearsay::app::{CaptionArgs, run_caption_command};
use hearsay::cli::{Cli, Commands};
use hearsay::config::Config;
use hearsay::hooks::factory::build_hooks;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    hearsay::logging::init();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            run_caption_command(
                config,
                CaptionArgs {
                    device: cli.device,
                    model: cli.model,
                    language: cli.language,
                    chunk_duration_ms: cli.chunk_duration,
                    wav: cli.wav,
                    quiet: cli.quiet,
                },
            )
            .await?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Hooks) => {
            let config = load_config(cli.config.as_deref())?;
            show_hooks(&config);
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/hearsay/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        let default_path = Config::default_path();
        Config::load_or_default(&default_path)
    };

    Ok(config.with_env_overrides())
}

#[cfg(feature = "cpal-audio")]
fn list_audio_devices() -> Result<()> {
    let devices = hearsay::audio::capture::list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn list_audio_devices() -> Result<()> {
    eprintln!("This build has no live capture support (cpal-audio feature disabled)");
    std::process::exit(1);
}

/// Validate and print the configured hook set.
fn show_hooks(config: &Config) {
    if !config.hooks.enabled {
        println!("Hook system disabled (hooks.enabled = false)");
        return;
    }

    let configured = config.hooks.hooks.len();
    if configured == 0 {
        println!("No hooks configured; captions will print to the terminal");
        return;
    }

    let set = build_hooks(&config.hooks);
    println!(
        "{} configured, {} active, {} disabled",
        configured,
        set.hooks.len(),
        set.disabled.len()
    );

    for hook in &set.hooks {
        println!(
            "  ok       {} ({}), timeout {}s",
            hook.name(),
            hook.kind(),
            hook.timeout().as_secs()
        );
    }
    for disabled in &set.disabled {
        println!(
            "  disabled {} ({}): {}",
            disabled.name, disabled.kind, disabled.reason
        );
    }
    for entry in config.hooks.hooks.iter().filter(|e| !e.enabled) {
        println!("  off      {} ({})", entry.display_name(), entry.kind);
    }
}
