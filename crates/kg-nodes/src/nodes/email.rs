//! Email-only content block.

use std::sync::LazyLock;

use kg_html::Fragment;
use regex::Regex;

use crate::node::{NodeVariant, card_node};
use crate::nodes::empty_output;
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));
static REPLACEMENT_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{(\w*?)(?:,? *"(.*?)")?\}"#).expect("invalid replacement string regex")
});
static HELPER_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{.*?\}").expect("invalid helper regex"));

card_node! {
    /// Markup sent only in newsletters, with `{name}` style personalization.
    pub struct EmailNode("email", 1) {
        html as "html": String = String::new() => url(UrlKind::Html),
    }
}

impl NodeVariant for EmailNode {
    fn render(&self, options: &RenderOptions) -> RenderOutput {
        if self.html.is_empty() || !options.is_email() {
            return empty_output(Self::NODE_TYPE);
        }
        RenderOutput::inner(clean_email_html(&self.html))
    }
}

/// Collapse whitespace runs, including newlines, into single spaces.
fn remove_spaces(html: &str) -> String {
    WHITESPACE.replace_all(html, " ").trim().to_owned()
}

/// Wrap `{helper}` and `{helper, "fallback"}` in `%%` markers.
fn wrap_replacement_strings(html: &str) -> String {
    REPLACEMENT_STRING.replace_all(html, "%%${0}%%").into_owned()
}

/// Unwrap `<code>` elements whose text is a replacement helper.
fn remove_code_wrappers(html: &str) -> String {
    let fragment = Fragment::parse(html);
    for code in fragment.root().query_selector_all("code") {
        if HELPER_TEXT.is_match(&code.text_content()) {
            code.unwrap();
        }
    }
    fragment.to_html()
}

/// Normalize authored email markup for the mail pipeline.
pub(crate) fn clean_email_html(html: &str) -> String {
    wrap_replacement_strings(&remove_code_wrappers(&remove_spaces(html)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderMode, RenderTarget};
    use pretty_assertions::assert_eq;

    fn email(html: &str) -> EmailNode {
        EmailNode {
            html: html.to_owned(),
            ..EmailNode::default()
        }
    }

    #[test]
    fn test_remove_spaces() {
        assert_eq!(remove_spaces("  <p>a\n\n   b</p>\t "), "<p>a b</p>");
    }

    #[test]
    fn test_wrap_replacement_strings() {
        assert_eq!(
            wrap_replacement_strings(r#"Hey {first_name, "there"}, {uuid}"#),
            r#"Hey %%{first_name, "there"}%%, %%{uuid}%%"#
        );
    }

    #[test]
    fn test_render_email_only() {
        let node = email("<p>Hey <code>{first_name}</code>,\n  welcome <code>x</code></p>");
        assert!(node.render(&RenderOptions::default()).is_empty());

        let output = node.render(&RenderOptions::new(RenderTarget::Email));
        assert_eq!(output.mode, RenderMode::Inner);
        assert_eq!(
            output.content,
            "<p>Hey %%{first_name}%%, welcome <code>x</code></p>"
        );
    }

    #[test]
    fn test_render_empty_html() {
        assert!(email("").render(&RenderOptions::new(RenderTarget::Email)).is_empty());
    }
}
