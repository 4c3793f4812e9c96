//! Text helpers used by card templates.

use std::sync::LazyLock;

use regex::Regex;

use crate::escape::escape_html_quotes;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("invalid tag regex"));
static NON_WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("invalid non-word regex"));
static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Truncate plain text for email layouts.
///
/// Text up to `max_length_mobile` characters is returned escaped. Longer text
/// keeps the mobile-length prefix visible, wraps the remainder up to
/// `max_length` in a `desktop-only` span and appends an ellipsis (visible on
/// mobile only when the text still fits on desktop).
pub fn truncate_html(text: &str, max_length: usize, max_length_mobile: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_length_mobile {
        return escape_html_quotes(text).into_owned();
    }

    let ellipsis = if chars.len() <= max_length {
        r#"<span class="hide-desktop">…</span>"#
    } else {
        "…"
    };
    let mobile_end = max_length_mobile.saturating_sub(1);
    let desktop_end = max_length.saturating_sub(1).clamp(mobile_end, chars.len());
    let visible: String = chars[..mobile_end].iter().collect();
    let desktop: String = chars[mobile_end..desktop_end].iter().collect();

    format!(
        r#"{}<span class="desktop-only">{}</span>{ellipsis}"#,
        escape_html_quotes(&visible),
        escape_html_quotes(&desktop)
    )
}

/// Build an anchor-friendly id from heading markup.
///
/// Strips tags and non-word characters, joins words with `-` and lowercases.
pub fn slugify(text: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(text, "");
    let word_only = NON_WORD_PATTERN.replace_all(&without_tags, "");
    WHITESPACE_PATTERN
        .replace_all(&word_only, "-")
        .to_lowercase()
}
