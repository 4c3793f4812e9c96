//! Markdown card.

use pulldown_cmark::{Options, Parser, html};

use crate::node::{NodeVariant, card_node};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

card_node! {
    /// A block of Markdown, rendered to HTML on export.
    pub struct MarkdownNode("markdown", 1) {
        markdown as "markdown": String = String::new() => url(UrlKind::Markdown) word_count(),
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

/// Render Markdown to HTML.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, parser_options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

impl NodeVariant for MarkdownNode {
    fn is_empty(&self) -> bool {
        self.markdown.is_empty()
    }

    fn render(&self, _options: &RenderOptions) -> RenderOutput {
        RenderOutput::inner(render_markdown(&self.markdown))
    }
}
