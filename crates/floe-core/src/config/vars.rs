//! Environment variable interpolation for config files.
//!
//! Credentials and bucket names are commonly injected through the
//! environment, so config text is expanded before it is parsed:
//! - `$VAR` or `${VAR}` - substitute with env var value, error if missing
//! - `${VAR:-default}` - use default if VAR is unset OR empty
//! - `${VAR-default}` - use default only if VAR is unset (empty is OK)
//! - `$$` - escape sequence for literal `$`

use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?P<escape>\$\$)
        |
        \$\{
            (?P<braced>[A-Za-z_][A-Za-z0-9_]*)
            (?:(?P<op>:?-)(?P<default>[^}]*))?
        \}
        |
        \$(?P<bare>[A-Za-z_][A-Za-z0-9_]*)
        ",
    )
    .expect("Invalid regex pattern")
});

/// Result of environment variable interpolation.
#[derive(Debug)]
pub struct InterpolationResult {
    /// The interpolated text.
    pub text: String,
    /// Any errors encountered during interpolation.
    pub errors: Vec<String>,
}

impl InterpolationResult {
    /// Returns true if there were no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Interpolate environment variables in the given text.
///
/// All errors are accumulated so every missing variable is reported at once.
pub fn interpolate(input: &str) -> InterpolationResult {
    let mut errors = Vec::new();
    let text = ENV_VAR_PATTERN
        .replace_all(input, |caps: &Captures| expand(caps, &mut errors))
        .into_owned();

    InterpolationResult { text, errors }
}

fn expand(caps: &Captures, errors: &mut Vec<String>) -> String {
    if caps.name("escape").is_some() {
        return "$".to_string();
    }

    let original = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
    let Some(name) = caps.name("braced").or_else(|| caps.name("bare")) else {
        return original.to_string();
    };
    let name = name.as_str();
    let op = caps.name("op").map(|m| m.as_str());
    let default = caps.name("default").map(|m| m.as_str());

    match env::var(name) {
        Ok(value) if value.contains(['\n', '\r']) => {
            errors.push(format!(
                "environment variable '{name}' contains newlines, which is not allowed"
            ));
            original.to_string()
        }
        Ok(value) if value.is_empty() && op == Some(":-") => {
            default.unwrap_or_default().to_string()
        }
        Ok(value) => value,
        Err(_) => match default {
            Some(default) => default.to_string(),
            None => {
                errors.push(format!("environment variable '{name}' is not set"));
                original.to_string()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env_vars<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let originals: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        // SAFETY: each test uses its own variable names and restores them afterwards
        for (key, value) in vars {
            match value {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        let result = f();

        // SAFETY: restoring original environment state
        for (key, original) in originals {
            match original {
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        result
    }

    #[test]
    fn test_bare_and_braced_substitution() {
        with_env_vars(&[("FLOE_TEST_BUCKET", Some("s3://exports"))], || {
            let result = interpolate(r#"{"bucket": "$FLOE_TEST_BUCKET", "b": "${FLOE_TEST_BUCKET}"}"#);
            assert!(result.is_ok());
            assert_eq!(
                result.text,
                r#"{"bucket": "s3://exports", "b": "s3://exports"}"#
            );
        });
    }

    #[test]
    fn test_missing_variables_are_all_reported() {
        with_env_vars(
            &[("FLOE_TEST_MISSING_A", None), ("FLOE_TEST_MISSING_B", None)],
            || {
                let result = interpolate("a: $FLOE_TEST_MISSING_A\nb: ${FLOE_TEST_MISSING_B}");
                assert!(!result.is_ok());
                assert_eq!(result.errors.len(), 2);
                assert!(result.errors[0].contains("FLOE_TEST_MISSING_A"));
                assert!(result.errors[1].contains("not set"));
            },
        );
    }

    #[test]
    fn test_default_operators() {
        with_env_vars(
            &[("FLOE_TEST_UNSET", None), ("FLOE_TEST_EMPTY", Some(""))],
            || {
                assert_eq!(interpolate("${FLOE_TEST_UNSET:-x}").text, "x");
                assert_eq!(interpolate("${FLOE_TEST_UNSET-x}").text, "x");
                assert_eq!(interpolate("${FLOE_TEST_EMPTY:-x}").text, "x");
                assert_eq!(interpolate("[${FLOE_TEST_EMPTY-x}]").text, "[]");
            },
        );
    }

    #[test]
    fn test_newline_injection_rejected() {
        with_env_vars(&[("FLOE_TEST_NEWLINE", Some("a\nb"))], || {
            let result = interpolate("value: $FLOE_TEST_NEWLINE");
            assert!(!result.is_ok());
            assert!(result.errors[0].contains("newlines"));
        });
    }

    #[test]
    fn test_escape_sequence() {
        let result = interpolate(r#"{"search_pattern": "\\.parquet$$"}"#);
        assert!(result.is_ok());
        assert_eq!(result.text, r#"{"search_pattern": "\\.parquet$"}"#);
    }
}
