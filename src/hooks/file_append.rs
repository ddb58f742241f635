//! File hook: appends one templated line per transcription to a target file.

use crate::hooks::template::render;
use crate::hooks::{Hook, HookContext, HookKind, HookResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends a formatted line per transcription.
///
/// Dispatches for different chunks may overlap in time, so appends are
/// serialized through a mutex and each line goes out as a single write;
/// partial lines never interleave.
pub struct FileAppendHook {
    name: String,
    path: PathBuf,
    format: String,
    timeout: Duration,
    write_lock: Mutex<()>,
}

impl FileAppendHook {
    pub fn new(name: String, path: PathBuf, format: String, timeout: Duration) -> Self {
        Self {
            name,
            path,
            format,
            timeout,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Hook for FileAppendHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> HookKind {
        HookKind::FileAppend
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(&self, ctx: &HookContext) -> HookResult {
        let mut line = render(&self.format, ctx);
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        let mut file = match tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
        {
            Ok(file) => file,
            Err(e) => {
                return HookResult::failure(format!(
                    "failed to open {}: {}",
                    self.path.display(),
                    e
                ));
            }
        };

        // One write call per line keeps concurrent appends whole.
        if let Err(e) = file.write_all(line.as_bytes()).await {
            return HookResult::failure(format!("failed to append to {}: {}", self.path.display(), e));
        }
        if let Err(e) = file.flush().await {
            return HookResult::failure(format!("failed to flush {}: {}", self.path.display(), e));
        }

        HookResult::ok(format!("appended to {}", self.path.display()))
    }
}
