//! Placeholder handling for hook configuration.
//!
//! Two independent mechanisms:
//!
//! - `${VAR}` / `${VAR:-default}` environment placeholders inside config
//!   values, resolved exactly once at startup by the factory.
//! - `{text}` / `{confidence:.2f}` runtime placeholders inside format and
//!   command templates, rendered per dispatch.

use crate::hooks::HookContext;

/// Expand `${VAR}` and `${VAR:-default}` placeholders from the environment.
///
/// Returns `Err(var_name)` for the first placeholder with no value and no
/// default; the caller disables the hook with a warning.
pub fn expand_env(input: &str) -> Result<String, String> {
    expand_env_with(input, |name| std::env::var(name).ok())
}

/// Testable core of `expand_env` with a pluggable variable lookup.
pub(crate) fn expand_env_with(
    input: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder: keep it literally
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let expr = &after[..end];

        let (name, default) = match expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (expr, None),
        };

        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => match default {
                Some(default) => out.push_str(default),
                None => return Err(name.to_string()),
            },
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Render `{placeholder}` templates against a hook context.
///
/// Supported names: `text`, `confidence`, `chunk_index`, `timestamp`,
/// `language`. Floats accept a `:.Nf` precision suffix
/// (`{confidence:.2f}`). Unknown placeholders are kept literally, as are
/// unmatched braces.
pub fn render(template: &str, ctx: &HookContext) -> String {
    let mut out = String::with_capacity(template.len() + ctx.text().len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let expr = &after[..end];

        match render_placeholder(expr, ctx) {
            Some(value) => out.push_str(&value),
            None => {
                // Not a placeholder we know; keep the braces
                out.push('{');
                out.push_str(expr);
                out.push('}');
            }
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn render_placeholder(expr: &str, ctx: &HookContext) -> Option<String> {
    let (name, spec) = match expr.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (expr, None),
    };

    match name {
        "text" => Some(ctx.text().to_string()),
        "confidence" => Some(format_float(ctx.confidence() as f64, spec)),
        "timestamp" => Some(format_float(ctx.timestamp_secs, spec)),
        "chunk_index" => Some(ctx.chunk_index.to_string()),
        "language" => Some(ctx.result.language.clone()),
        _ => None,
    }
}

/// Apply a python-style `.Nf` precision spec, defaulting to shortest form.
fn format_float(value: f64, spec: Option<&str>) -> String {
    if let Some(spec) = spec
        && let Some(precision) = spec
            .strip_prefix('.')
            .and_then(|s| s.strip_suffix('f'))
            .and_then(|s| s.parse::<usize>().ok())
    {
        return format!("{:.*}", precision, value);
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_context;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "API_KEY" => Some("sk-12345".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_env_plain_text_unchanged() {
        assert_eq!(expand_env_with("no placeholders", lookup).unwrap(), "no placeholders");
    }

    #[test]
    fn test_expand_env_substitutes_variable() {
        assert_eq!(
            expand_env_with("Bearer ${API_KEY}", lookup).unwrap(),
            "Bearer sk-12345"
        );
    }

    #[test]
    fn test_expand_env_multiple_placeholders() {
        assert_eq!(
            expand_env_with("${API_KEY}:${API_KEY}", lookup).unwrap(),
            "sk-12345:sk-12345"
        );
    }

    #[test]
    fn test_expand_env_missing_variable_is_error() {
        assert_eq!(
            expand_env_with("${MISSING_KEY}", lookup).unwrap_err(),
            "MISSING_KEY"
        );
    }

    #[test]
    fn test_expand_env_default_used_for_missing() {
        assert_eq!(
            expand_env_with("${MISSING:-fallback}", lookup).unwrap(),
            "fallback"
        );
    }

    #[test]
    fn test_expand_env_default_ignored_when_set() {
        assert_eq!(
            expand_env_with("${API_KEY:-fallback}", lookup).unwrap(),
            "sk-12345"
        );
    }

    #[test]
    fn test_expand_env_empty_value_still_counts_as_set() {
        assert_eq!(expand_env_with("x${EMPTY}y", lookup).unwrap(), "xy");
    }

    #[test]
    fn test_expand_env_unterminated_kept_literal() {
        assert_eq!(expand_env_with("abc ${UNFINISHED", lookup).unwrap(), "abc ${UNFINISHED");
    }

    #[test]
    fn test_render_text_and_confidence() {
        let ctx = test_context("hello", 0.8765, 4);
        assert_eq!(render("{text}", &ctx), "hello");
        assert_eq!(render("[{confidence:.2f}] {text}", &ctx), "[0.88] hello");
    }

    #[test]
    fn test_render_chunk_index_and_timestamp() {
        let ctx = test_context("hi", 0.5, 42);
        assert_eq!(render("#{chunk_index}", &ctx), "#42");
        assert_eq!(render("{timestamp:.1f}", &ctx), "1700000000.5");
    }

    #[test]
    fn test_render_language() {
        let ctx = test_context("hi", 0.5, 0);
        assert_eq!(render("lang={language}", &ctx), "lang=en");
    }

    #[test]
    fn test_render_unknown_placeholder_kept() {
        let ctx = test_context("hi", 0.5, 0);
        assert_eq!(render("{nope} {text}", &ctx), "{nope} hi");
    }

    #[test]
    fn test_render_unmatched_brace_kept() {
        let ctx = test_context("hi", 0.5, 0);
        assert_eq!(render("open { brace", &ctx), "open { brace");
    }

    #[test]
    fn test_render_confidence_default_precision() {
        let ctx = test_context("hi", 0.5, 0);
        assert_eq!(render("{confidence}", &ctx), "0.5");
    }

    #[test]
    fn test_render_text_is_trimmed() {
        let ctx = test_context("  padded  ", 0.5, 0);
        assert_eq!(render(">{text}<", &ctx), ">padded<");
    }
}
