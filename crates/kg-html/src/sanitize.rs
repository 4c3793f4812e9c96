//! Markup cleanup for imported and user-authored fragments.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{DomNode, Fragment};

/// Runs of two or more whitespace characters or `&nbsp;` entities.
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s|&nbsp;){2,}").expect("invalid whitespace regex"));

/// Inline tags kept by [`clean_inline`] for callout text.
pub const CALLOUT_ALLOWED_TAGS: &[&str] = &[
    "a", "strong", "em", "b", "i", "br", "code", "mark", "s", "del", "u", "sup", "sub",
];

/// Unwrap every element not in `allowed`, keeping its content.
///
/// Allowed elements are kept with their attributes and cleaned recursively.
pub fn clean_inline(html: &str, allowed: &[&str]) -> String {
    let fragment = Fragment::parse(html);
    unwrap_disallowed(fragment.root(), allowed);
    fragment.to_html()
}

fn unwrap_disallowed(node: &DomNode, allowed: &[&str]) {
    for child in node.children() {
        if !child.is_element() {
            continue;
        }
        // Children are cleaned first so unwrapped content is already filtered.
        unwrap_disallowed(&child, allowed);
        if !child.tag_name().is_some_and(|t| allowed.contains(&t.as_str())) {
            child.unwrap();
        }
    }
}

/// Options for [`clean_basic_html`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Keep `<br>` elements between content instead of dropping them.
    pub allow_br: bool,
}

/// Normalize a short piece of imported markup such as a caption.
///
/// Collapses whitespace runs, drops Google Docs wrapper elements and line
/// breaks (leading and trailing breaks are always dropped), and trims the
/// result. Returns `None` when nothing meaningful remains.
pub fn clean_basic_html(html: &str, options: CleanOptions) -> Option<String> {
    let collapsed = WHITESPACE_RUN.replace_all(html.trim(), " ");
    if collapsed.trim().is_empty() {
        return None;
    }

    let fragment = Fragment::parse(&collapsed);
    let root = fragment.root();

    for wrapper in root.query_selector_all(r#"b[id^="docs-internal-guid-"]"#) {
        wrapper.unwrap();
    }

    if options.allow_br {
        trim_edge_breaks(root);
    } else {
        for br in root.query_selector_all("br") {
            br.remove();
        }
    }

    let cleaned = fragment.to_html().replace("&nbsp;", " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_owned())
    }
}

fn trim_edge_breaks(root: &DomNode) {
    while let Some(first) = root.children().into_iter().find(|n| !is_blank_text(n)) {
        if !first.is_tag("br") {
            break;
        }
        first.remove();
    }
    while let Some(last) = root.children().into_iter().rev().find(|n| !is_blank_text(n)) {
        if !last.is_tag("br") {
            break;
        }
        last.remove();
    }
}

fn is_blank_text(node: &DomNode) -> bool {
    node.is_text() && node.text_content().trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_inline_unwraps_disallowed() {
        let html = r#"<p>Hello <span style="color:red"><b>bold</b></span> <a href="/x">link</a></p><div>more</div>"#;
        assert_eq!(
            clean_inline(html, CALLOUT_ALLOWED_TAGS),
            r#"Hello <b>bold</b> <a href="/x">link</a>more"#
        );
    }

    #[test]
    fn test_clean_inline_keeps_breaks() {
        assert_eq!(clean_inline("a<br>b", CALLOUT_ALLOWED_TAGS), "a<br>b");
    }

    #[test]
    fn test_clean_basic_html_collapses_whitespace() {
        assert_eq!(
            clean_basic_html("  A   caption&nbsp;&nbsp;with <em>style</em> ", CleanOptions::default()),
            Some("A caption with <em>style</em>".to_owned())
        );
    }

    #[test]
    fn test_clean_basic_html_empty() {
        assert_eq!(clean_basic_html("   ", CleanOptions::default()), None);
        assert_eq!(clean_basic_html("<br>", CleanOptions::default()), None);
    }

    #[test]
    fn test_clean_basic_html_breaks() {
        let allow = CleanOptions { allow_br: true };
        assert_eq!(
            clean_basic_html("<br>one<br>two<br>", allow),
            Some("one<br>two".to_owned())
        );
        assert_eq!(
            clean_basic_html("one<br>two", CleanOptions::default()),
            Some("onetwo".to_owned())
        );
    }

    #[test]
    fn test_clean_basic_html_google_docs_wrapper() {
        let html = r#"<b id="docs-internal-guid-abc" style="font-weight:normal;">Text</b>"#;
        assert_eq!(clean_basic_html(html, CleanOptions::default()), Some("Text".to_owned()));
    }
}
