//! Command hook: runs a shell command template per transcription.

use crate::hooks::template::render;
use crate::hooks::{Hook, HookContext, HookKind, HookResult};
use async_trait::async_trait;
use std::time::Duration;

/// Executes a configured shell command with `{text}` / `{confidence}`
/// substituted literally.
///
/// Exit status 0 is success; anything else is a failure carrying the exit
/// code and captured stderr. The dispatcher's timeout cancels the future,
/// and `kill_on_drop` takes the child process down with it.
pub struct CommandHook {
    name: String,
    command: String,
    timeout: Duration,
}

impl CommandHook {
    pub fn new(name: String, command: String, timeout: Duration) -> Self {
        Self {
            name,
            command,
            timeout,
        }
    }
}

/// Trim captured output for inclusion in a result message.
fn snippet(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    let mut out: String = trimmed.chars().take(200).collect();
    if out.len() < trimmed.len() {
        out.push('…');
    }
    out
}

#[async_trait]
impl Hook for CommandHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> HookKind {
        HookKind::Command
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(&self, ctx: &HookContext) -> HookResult {
        let command = render(&self.command, ctx);

        let output = match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&command)
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => return HookResult::failure(format!("failed to spawn command: {}", e)),
        };

        if output.status.success() {
            let stdout = snippet(&output.stdout);
            if stdout.is_empty() {
                HookResult::ok("command exited 0")
            } else {
                HookResult::ok(format!("command exited 0: {}", stdout))
            }
        } else {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = snippet(&output.stderr);
            HookResult::failure(format!("command exited {}: {}", code, stderr))
        }
    }
}
