//! Console hook: prints each transcription as a caption line.

use crate::defaults;
use crate::hooks::{Hook, HookContext, HookKind, HookResult};
use async_trait::async_trait;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

/// Writes one formatted line per transcription to stdout.
pub struct ConsoleLogHook {
    name: String,
    show_confidence: bool,
}

impl ConsoleLogHook {
    pub fn new(name: String, show_confidence: bool) -> Self {
        Self {
            name,
            show_confidence,
        }
    }

    fn format_line(&self, ctx: &HookContext) -> String {
        if self.show_confidence {
            let prefix = format!("[{:.2}]", ctx.confidence());
            if std::io::stdout().is_terminal() {
                format!("{} {}", prefix.dimmed(), ctx.text())
            } else {
                format!("{} {}", prefix, ctx.text())
            }
        } else {
            ctx.text().to_string()
        }
    }
}

#[async_trait]
impl Hook for ConsoleLogHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> HookKind {
        HookKind::ConsoleLog
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(defaults::LOCAL_HOOK_TIMEOUT_SECS)
    }

    async fn execute(&self, ctx: &HookContext) -> HookResult {
        let line = self.format_line(ctx);
        println!("{}", line);
        HookResult::ok(format!("logged {} chars", ctx.text().len()))
    }
}
