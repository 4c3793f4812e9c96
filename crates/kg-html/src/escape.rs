//! Escaping helpers.
//!
//! Two families live here: the serializer escapes ([`escape_text`],
//! [`escape_attr`]) that match how a DOM serializes `outerHTML`, and the
//! template escapes ([`escape_html`], [`escape_html_quotes`]) used when
//! interpolating values into hand-written markup.

use std::borrow::Cow;

/// Escape text content the way a DOM serializer does.
///
/// Escapes `&`, `<`, `>` and the non-breaking space.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\u{a0}' => Some("&nbsp;"),
        _ => None,
    })
}

/// Escape an attribute value the way a DOM serializer does.
///
/// Escapes `&`, `"` and the non-breaking space.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| match c {
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\u{a0}' => Some("&nbsp;"),
        _ => None,
    })
}

/// Escape `&`, `<`, `>` and `"` for interpolation into templates.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        _ => None,
    })
}

/// Like [`escape_html`] but also escapes single quotes as `&#039;`.
pub fn escape_html_quotes(s: &str) -> Cow<'_, str> {
    escape_with(s, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#039;"),
        _ => None,
    })
}

fn escape_with(s: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<'_, str> {
    let Some(first) = s.char_indices().find(|&(_, c)| replacement(c).is_some()) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len() + 16);
    out.push_str(&s[..first.0]);
    for c in s[first.0..].chars() {
        match replacement(c) {
            Some(rep) => out.push_str(rep),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & \"c\""), "a &lt; b &amp; \"c\"");
        assert_eq!(escape_text("x\u{a0}y"), "x&nbsp;y");
    }

    #[test]
    fn test_escape_attr_leaves_angle_brackets() {
        assert_eq!(escape_attr(r#"<a href="x">"#), "<a href=&quot;x&quot;>");
    }

    #[test]
    fn test_escape_html_borrows_when_clean() {
        assert!(matches!(escape_html("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_escape_html_quotes() {
        assert_eq!(
            escape_html_quotes("Tom's <b>\"bar\"</b> & co"),
            "Tom&#039;s &lt;b&gt;&quot;bar&quot;&lt;/b&gt; &amp; co"
        );
    }
}
