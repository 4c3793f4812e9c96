//! Code block card.

use std::sync::LazyLock;

use kg_html::{DomNode, Element};
use regex::Regex;

use crate::import::{ImportOutput, ImportRule};
use crate::node::{NodeVariant, card_node};
use crate::nodes::{empty_output, read_caption};
use crate::render::{RenderOptions, RenderOutput};
use crate::schema::UrlKind;

static LANGUAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)lang(?:uage)?-(.*?)(?:\s|$)").expect("invalid language regex"));

card_node! {
    /// Preformatted code with an optional language and caption.
    pub struct CodeBlockNode("codeblock", 1) {
        code as "code": String = String::new() => word_count(),
        language as "language": String = String::new(),
        caption as "caption": String = String::new() => url(UrlKind::Html) word_count(),
    }
}

impl NodeVariant for CodeBlockNode {
    fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    fn import_rules() -> Vec<ImportRule> {
        vec![
            // Without a caption the `pre` rule picks the block up.
            ImportRule::new("figure", Self::NODE_TYPE, 2, import_captioned_figure)
                .guard(|figure| figure.query_selector("pre").is_some()),
            ImportRule::new("pre", Self::NODE_TYPE, 1, import_pre),
        ]
    }

    fn render(&self, _options: &RenderOptions) -> RenderOutput {
        if self.code.trim().is_empty() {
            return empty_output(Self::NODE_TYPE);
        }
        let mut code = Element::new("code");
        if !self.language.is_empty() {
            code.set_attr("class", format!("language-{}", self.language));
        }
        let pre = Element::new("pre").child(code.text(&self.code));
        if self.caption.is_empty() {
            return RenderOutput::element(pre.outer_html());
        }
        let figure = Element::new("figure")
            .attr("class", "kg-card kg-code-card")
            .child(pre)
            .child(Element::new("figcaption").raw(&self.caption));
        RenderOutput::element(figure.outer_html())
    }
}

/// Language named by a `language-*` / `lang-*` class on `pre` or `code`.
fn detect_language(pre: &DomNode, code: &DomNode) -> String {
    let pre_class = pre.attr("class").unwrap_or_default();
    let code_class = code.attr("class").unwrap_or_default();
    LANGUAGE_CLASS
        .captures(&pre_class)
        .or_else(|| LANGUAGE_CLASS.captures(&code_class))
        .map(|caps| caps[1].to_lowercase())
        .unwrap_or_default()
}

fn import_captioned_figure(figure: &DomNode) -> Option<ImportOutput> {
    let pre = figure.query_selector("pre")?;
    let code = pre.query_selector("code")?;
    figure.query_selector("figcaption")?;
    Some(ImportOutput::card(CodeBlockNode {
        code: code.text_content(),
        language: detect_language(&pre, &code),
        caption: read_caption(figure, "figcaption"),
        ..CodeBlockNode::default()
    }))
}

fn import_pre(pre: &DomNode) -> Option<ImportOutput> {
    let code = pre.element_children().into_iter().next()?;
    if !code.is_tag("code") {
        return None;
    }
    Some(ImportOutput::card(CodeBlockNode {
        code: code.text_content(),
        language: detect_language(pre, &code),
        ..CodeBlockNode::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNode;
    use crate::import::ImportRegistry;
    use pretty_assertions::assert_eq;

    fn import_one(html: &str) -> CodeBlockNode {
        let nodes = ImportRegistry::with_default_nodes().import_fragment(html);
        match nodes.first().and_then(|n| n.as_card()) {
            Some(CardNode::CodeBlock(node)) => node.clone(),
            other => panic!("expected a code block, got {other:?}"),
        }
    }

    #[test]
    fn test_render_escapes_code() {
        let node = CodeBlockNode {
            code: "<b>&</b>".to_owned(),
            language: "html".to_owned(),
            ..CodeBlockNode::default()
        };
        assert_eq!(
            node.render(&RenderOptions::default()).content,
            r#"<pre><code class="language-html">&lt;b&gt;&amp;&lt;/b&gt;</code></pre>"#
        );
    }

    #[test]
    fn test_render_with_caption() {
        let node = CodeBlockNode {
            code: "x".to_owned(),
            caption: "A <em>c</em>".to_owned(),
            ..CodeBlockNode::default()
        };
        assert_eq!(
            node.render(&RenderOptions::default()).content,
            r#"<figure class="kg-card kg-code-card"><pre><code>x</code></pre><figcaption>A <em>c</em></figcaption></figure>"#
        );
    }

    #[test]
    fn test_render_blank_code_is_empty() {
        let node = CodeBlockNode {
            code: "  \n".to_owned(),
            ..CodeBlockNode::default()
        };
        assert_eq!(node.render(&RenderOptions::default()), RenderOutput::empty());
    }

    #[test]
    fn test_import_language_from_pre_or_code() {
        let node = import_one(r#"<pre class="line-numbers lang-JS"><code>let a;</code></pre>"#);
        assert_eq!(node.language, "js");
        let node = import_one(r#"<pre><code class="language-rust foo">fn x() {}</code></pre>"#);
        assert_eq!(node.language, "rust");
        assert_eq!(node.code, "fn x() {}");
    }

    #[test]
    fn test_captioned_figure_wins_over_pre() {
        let nodes = ImportRegistry::with_default_nodes()
            .import_fragment("<figure><pre><code>x</code></pre><figcaption>c</figcaption></figure>");
        assert_eq!(nodes.len(), 1, "{nodes:?}");
        let Some(CardNode::CodeBlock(node)) = nodes[0].as_card() else {
            panic!("expected a code block, got {nodes:?}");
        };
        assert_eq!(node.code, "x");
        assert_eq!(node.caption, "c");
    }

    #[test]
    fn test_pre_without_code_is_not_claimed() {
        let nodes = ImportRegistry::with_default_nodes().import_fragment("<pre>plain</pre>");
        assert!(nodes.iter().all(|n| n.as_card().is_none()));
    }
}
