//! Hook construction from configuration.
//!
//! Every hook is built and parameter-checked once at startup. A hook with a
//! missing required key, a wrong-typed value, or an unresolved `${ENV_VAR}`
//! placeholder is disabled with a warning; the session runs on with the
//! hooks that validated.

use crate::config::{HookEntry, HooksConfig};
use crate::defaults;
use crate::hooks::template::expand_env;
use crate::hooks::translation::TranslationSettings;
use crate::hooks::{
    AiTranslationHook, CommandHook, ConsoleLogHook, FileAppendHook, Hook, HookKind, WebhookHook,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Result of building the configured hook set.
pub struct HookSet {
    /// Hooks that validated and will receive every dispatch.
    pub hooks: Vec<Arc<dyn Hook>>,
    /// Hooks disabled at startup, with the reason.
    pub disabled: Vec<DisabledHook>,
}

#[derive(Debug, Clone)]
pub struct DisabledHook {
    pub name: String,
    pub kind: HookKind,
    pub reason: String,
}

/// Build all enabled hooks from configuration.
///
/// Never fails: construction problems disable the affected hook and are
/// reported through `tracing::warn` and the returned `disabled` list.
pub fn build_hooks(config: &HooksConfig) -> HookSet {
    let mut set = HookSet {
        hooks: Vec::new(),
        disabled: Vec::new(),
    };

    if !config.enabled {
        tracing::info!("hook system disabled by configuration");
        return set;
    }

    for entry in &config.hooks {
        if !entry.enabled {
            continue;
        }
        let name = entry.display_name();
        match build_hook(&name, entry) {
            Ok(hook) => {
                tracing::debug!(hook = %name, kind = %entry.kind, "hook registered");
                set.hooks.push(hook);
            }
            Err(reason) => {
                tracing::warn!(hook = %name, kind = %entry.kind, %reason, "hook disabled at startup");
                set.disabled.push(DisabledHook {
                    name,
                    kind: entry.kind,
                    reason,
                });
            }
        }
    }

    set
}

fn build_hook(name: &str, entry: &HookEntry) -> Result<Arc<dyn Hook>, String> {
    let params = Params::resolve(&entry.config)?;

    match entry.kind {
        HookKind::ConsoleLog => Ok(Arc::new(ConsoleLogHook::new(
            name.to_string(),
            params.bool("show_confidence", false)?,
        ))),
        HookKind::FileAppend => {
            let path = PathBuf::from(params.required_str("path")?);
            let format = params.str("format", "{text}")?;
            let timeout = params.timeout_secs(defaults::LOCAL_HOOK_TIMEOUT_SECS)?;
            Ok(Arc::new(FileAppendHook::new(
                name.to_string(),
                path,
                format,
                timeout,
            )))
        }
        HookKind::Command => {
            let command = params.required_str("command")?;
            let timeout = params.timeout_secs(defaults::COMMAND_TIMEOUT_SECS)?;
            Ok(Arc::new(CommandHook::new(
                name.to_string(),
                command,
                timeout,
            )))
        }
        HookKind::Webhook => {
            let url = params.required_str("url")?;
            let headers = params.headers()?;
            let timeout = params.timeout_secs(defaults::WEBHOOK_TIMEOUT_SECS)?;
            WebhookHook::new(name.to_string(), url, headers, timeout)
                .map(|hook| Arc::new(hook) as Arc<dyn Hook>)
                .map_err(|e| e.to_string())
        }
        HookKind::AiTranslation => {
            let settings = TranslationSettings {
                api_key: params.required_str("api_key")?,
                base_url: params.str("base_url", defaults::TRANSLATION_BASE_URL)?,
                model: params.str("model", defaults::TRANSLATION_MODEL)?,
                target_language: params.str("target_language", "English")?,
                max_tokens: params.u32("max_tokens", 1000)?,
                temperature: params.f32("temperature", 0.3)?,
                output_prefix: params.opt_str("output_prefix")?,
                print_translation: params.bool("print_translation", true)?,
                timeout: params.timeout_secs(defaults::TRANSLATION_TIMEOUT_SECS)?,
            };
            AiTranslationHook::new(name.to_string(), settings)
                .map(|hook| Arc::new(hook) as Arc<dyn Hook>)
                .map_err(|e| e.to_string())
        }
    }
}

/// Kind-specific parameters with `${VAR}` placeholders already resolved.
struct Params(toml::Table);

impl Params {
    /// Resolve environment placeholders in every string value, recursively.
    fn resolve(table: &toml::Table) -> Result<Self, String> {
        let resolved = resolve_value(&toml::Value::Table(table.clone()), "")?;
        match resolved {
            toml::Value::Table(table) => Ok(Self(table)),
            _ => unreachable!("table input resolves to a table"),
        }
    }

    fn opt_str(&self, key: &str) -> Result<Option<String>, String> {
        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    fn required_str(&self, key: &str) -> Result<String, String> {
        self.opt_str(key)?
            .ok_or_else(|| format!("missing required key '{}'", key))
    }

    fn str(&self, key: &str, default: &str) -> Result<String, String> {
        Ok(self.opt_str(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn bool(&self, key: &str, default: bool) -> Result<bool, String> {
        match self.0.get(key) {
            None => Ok(default),
            Some(toml::Value::Boolean(b)) => Ok(*b),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    fn u32(&self, key: &str, default: u32) -> Result<u32, String> {
        match self.0.get(key) {
            None => Ok(default),
            Some(toml::Value::Integer(i)) if *i >= 0 && *i <= u32::MAX as i64 => Ok(*i as u32),
            Some(other) => Err(type_error(key, "a non-negative integer", other)),
        }
    }

    fn f32(&self, key: &str, default: f32) -> Result<f32, String> {
        match self.0.get(key) {
            None => Ok(default),
            Some(toml::Value::Float(f)) => Ok(*f as f32),
            Some(toml::Value::Integer(i)) => Ok(*i as f32),
            Some(other) => Err(type_error(key, "a number", other)),
        }
    }

    /// The `timeout` key in seconds (integer or float).
    fn timeout_secs(&self, default_secs: u64) -> Result<Duration, String> {
        match self.0.get("timeout") {
            None => Ok(Duration::from_secs(default_secs)),
            Some(toml::Value::Integer(i)) if *i > 0 => Ok(Duration::from_secs(*i as u64)),
            Some(toml::Value::Float(f)) if *f > 0.0 => Ok(Duration::from_secs_f64(*f)),
            Some(other) => Err(type_error("timeout", "a positive number of seconds", other)),
        }
    }

    /// The optional `headers` sub-table as (name, value) pairs.
    fn headers(&self) -> Result<Vec<(String, String)>, String> {
        match self.0.get("headers") {
            None => Ok(Vec::new()),
            Some(toml::Value::Table(table)) => {
                let mut headers = Vec::new();
                for (key, value) in table {
                    match value {
                        toml::Value::String(s) => headers.push((key.clone(), s.clone())),
                        other => return Err(type_error(key, "a string header value", other)),
                    }
                }
                Ok(headers)
            }
            Some(other) => Err(type_error("headers", "a table", other)),
        }
    }
}

fn type_error(key: &str, expected: &str, got: &toml::Value) -> String {
    format!("key '{}' must be {}, got {}", key, expected, got.type_str())
}

fn resolve_value(value: &toml::Value, key: &str) -> Result<toml::Value, String> {
    match value {
        toml::Value::String(s) => expand_env(s).map(toml::Value::String).map_err(|var| {
            format!("unresolved environment variable ${{{}}} in key '{}'", var, key)
        }),
        toml::Value::Table(table) => {
            let mut resolved = toml::Table::new();
            for (k, v) in table {
                resolved.insert(k.clone(), resolve_value(v, k)?);
            }
            Ok(toml::Value::Table(resolved))
        }
        toml::Value::Array(items) => {
            let resolved: Result<Vec<_>, _> =
                items.iter().map(|v| resolve_value(v, key)).collect();
            Ok(toml::Value::Array(resolved?))
        }
        other => Ok(other.clone()),
    }
}
