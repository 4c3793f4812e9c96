//! Environment variable expansion for string settings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// Bare `$VAR` text is left as is; only braced references are handed to
/// `shellexpand`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let end = start + len + 1;
        out.push_str(&rest[..start]);
        let expanded = shellexpand::env(&rest[start..end]).map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })?;
        out.push_str(&expanded);
        rest = &rest[end..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_value_unchanged() {
        assert_eq!(expand_env("https://example.com", "site.url").unwrap(), "https://example.com");
    }

    #[test]
    fn test_bare_dollar_is_not_expanded() {
        assert_eq!(
            expand_env("https://example.com/$HOME/$PATH", "site.url").unwrap(),
            "https://example.com/$HOME/$PATH"
        );
        assert_eq!(
            expand_env("${KG_CONFIG_TEST_UNSET_VAR:-https://x.test}/$HOME", "site.url").unwrap(),
            "https://x.test/$HOME"
        );
    }

    #[test]
    fn test_unclosed_reference_is_kept() {
        assert_eq!(expand_env("https://x.test/${HOME", "site.url").unwrap(), "https://x.test/${HOME");
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = expand_env("${KG_CONFIG_TEST_UNSET_VAR:-https://fallback.test}", "site.url").unwrap();
        assert_eq!(value, "https://fallback.test");
    }

    #[test]
    fn test_missing_variable_is_error() {
        let err = expand_env("${KG_CONFIG_TEST_UNSET_VAR}", "site.url").unwrap_err();
        assert!(err.to_string().contains("site.url"));
        assert!(err.to_string().contains("KG_CONFIG_TEST_UNSET_VAR"));
    }
}
