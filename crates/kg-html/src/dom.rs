//! Parsed HTML fragments.
//!
//! [`Fragment::parse`] runs the HTML5 fragment algorithm (context `<body>`,
//! scripting disabled so `<noscript>` content stays parseable) into a
//! `scraper` document and exposes it as [`DomNode`] handles. Every handle
//! shares ownership of the document, so nodes stay walkable after the
//! fragment itself is dropped. Handles support the navigation, CSS querying
//! and the few mutations import rules need (removing consumed siblings,
//! unwrapping disallowed elements, rewriting attributes).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ego_tree::{NodeId, NodeRef};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{LocalName, Namespace, ParseOpts, QualName, parse_fragment};
use scraper::{ElementRef, Html, Node, Selector};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

type Document = Rc<RefCell<Html>>;

/// A parsed HTML fragment.
pub struct Fragment {
    root: DomNode,
}

impl Fragment {
    /// Parse an HTML fragment as if assigned to `body.innerHTML`.
    pub fn parse(html: &str) -> Self {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let context = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from("body"),
        );
        let document = parse_fragment(Html::new_fragment(), opts, context, Vec::new()).one(html);

        // The fragment algorithm wraps parsed content in a single <html> element.
        let tree_root = document.tree.root();
        let root = tree_root
            .children()
            .find(|node| node.value().is_element())
            .map_or_else(|| tree_root.id(), |node| node.id());
        Self {
            root: DomNode {
                doc: Rc::new(RefCell::new(document)),
                id: root,
            },
        }
    }

    /// The container element holding the parsed nodes.
    pub fn root(&self) -> &DomNode {
        &self.root
    }

    /// Top-level nodes of the fragment.
    pub fn nodes(&self) -> Vec<DomNode> {
        self.root.children()
    }

    /// Serialize the fragment contents back to HTML.
    pub fn to_html(&self) -> String {
        self.root.inner_html()
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fragment").field(&self.to_html()).finish()
    }
}

/// Handle to a node in a parsed fragment.
#[derive(Clone)]
pub struct DomNode {
    doc: Document,
    id: NodeId,
}

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.doc, &other.doc) && self.id == other.id
    }
}

impl Eq for DomNode {}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_element() {
            return f.write_str(&self.outer_html());
        }
        if let Some(comment) = self.comment_text() {
            return write!(f, "<!--{comment}-->");
        }
        match self.with_node(|node| node.value().as_text().map(|text| String::from(&**text))) {
            Some(Some(text)) => write!(f, "#text {text:?}"),
            _ => f.write_str("#node"),
        }
    }
}

impl DomNode {
    /// Run `f` against the underlying tree node.
    ///
    /// `None` when the node no longer exists in the document.
    fn with_node<R>(&self, f: impl FnOnce(NodeRef<'_, Node>) -> R) -> Option<R> {
        let doc = self.doc.borrow();
        doc.tree.get(self.id).map(f)
    }

    fn handle(&self, id: NodeId) -> DomNode {
        DomNode {
            doc: Rc::clone(&self.doc),
            id,
        }
    }

    fn handles(&self, ids: Vec<NodeId>) -> Vec<DomNode> {
        ids.into_iter().map(|id| self.handle(id)).collect()
    }

    /// Lowercase tag name for elements, `None` for other nodes.
    pub fn tag_name(&self) -> Option<String> {
        self.with_node(|node| node.value().as_element().map(|e| e.name().to_owned()))
            .flatten()
    }

    /// Whether this is an element with the given tag name.
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name().is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn is_element(&self) -> bool {
        self.with_node(|node| node.value().is_element())
            .unwrap_or(false)
    }

    pub fn is_text(&self) -> bool {
        self.with_node(|node| node.value().is_text()).unwrap_or(false)
    }

    /// Comment text, for comment nodes.
    pub fn comment_text(&self) -> Option<String> {
        self.with_node(|node| node.value().as_comment().map(|c| String::from(&**c)))
            .flatten()
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.with_node(|node| {
            node.value()
                .as_element()
                .and_then(|e| e.attr(name))
                .map(str::to_owned)
        })
        .flatten()
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.with_node(|node| {
            node.value()
                .as_element()
                .is_some_and(|e| e.attr(name).is_some())
        })
        .unwrap_or(false)
    }

    /// Value of the `class` attribute, empty when absent.
    pub fn class_name(&self) -> String {
        self.attr("class").unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_name().split_whitespace().any(|c| c == class)
    }

    /// Value of one declaration in the inline `style` attribute.
    ///
    /// Property names compare case-insensitively; the value is trimmed.
    pub fn style(&self, property: &str) -> Option<String> {
        let style = self.attr("style")?;
        style.split(';').find_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case(property)
                .then(|| value.trim().to_owned())
        })
    }

    /// The element's `data-*` attribute, named without the prefix.
    pub fn data(&self, key: &str) -> Option<String> {
        self.attr(&format!("data-{key}"))
    }

    pub fn children(&self) -> Vec<DomNode> {
        let ids = self
            .with_node(|node| node.children().map(|c| c.id()).collect())
            .unwrap_or_default();
        self.handles(ids)
    }

    pub fn element_children(&self) -> Vec<DomNode> {
        self.children().into_iter().filter(DomNode::is_element).collect()
    }

    pub fn first_child(&self) -> Option<DomNode> {
        let id = self.with_node(|node| node.first_child().map(|c| c.id()))??;
        Some(self.handle(id))
    }

    pub fn parent(&self) -> Option<DomNode> {
        let id = self.with_node(|node| node.parent().map(|p| p.id()))??;
        Some(self.handle(id))
    }

    /// Parent, but only when it is an element (not the fragment container).
    pub fn parent_element(&self) -> Option<DomNode> {
        self.parent()
            .filter(|p| p.is_element() && !p.parent().is_some_and(|gp| gp.is_document()))
    }

    fn is_document(&self) -> bool {
        self.with_node(|node| matches!(node.value(), Node::Document | Node::Fragment))
            .unwrap_or(false)
    }

    pub fn next_sibling(&self) -> Option<DomNode> {
        let id = self.with_node(|node| node.next_sibling().map(|s| s.id()))??;
        Some(self.handle(id))
    }

    pub fn previous_sibling(&self) -> Option<DomNode> {
        let id = self.with_node(|node| node.prev_sibling().map(|s| s.id()))??;
        Some(self.handle(id))
    }

    pub fn next_element_sibling(&self) -> Option<DomNode> {
        let id = self.with_node(|node| {
            node.next_siblings()
                .find(|s| s.value().is_element())
                .map(|s| s.id())
        })??;
        Some(self.handle(id))
    }

    pub fn previous_element_sibling(&self) -> Option<DomNode> {
        let id = self.with_node(|node| {
            node.prev_siblings()
                .find(|s| s.value().is_element())
                .map(|s| s.id())
        })??;
        Some(self.handle(id))
    }

    /// First descendant matching `selector` (the node itself is not considered).
    ///
    /// An unparsable selector matches nothing.
    pub fn query_selector(&self, selector: &str) -> Option<DomNode> {
        let selector = parse_selector(selector)?;
        let id = self.with_node(|node| {
            ElementRef::wrap(node)?
                .select(&selector)
                .next()
                .map(|e| e.id())
        })??;
        Some(self.handle(id))
    }

    /// Every descendant matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Vec<DomNode> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let ids = self
            .with_node(|node| {
                ElementRef::wrap(node)
                    .map(|e| e.select(&selector).map(|m| m.id()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default();
        self.handles(ids)
    }

    /// This node or its nearest ancestor element matching `selector`.
    pub fn closest(&self, selector: &str) -> Option<DomNode> {
        let selector = parse_selector(selector)?;
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.matches_selector(&selector) {
                return Some(node);
            }
            current = node.parent_element();
        }
        None
    }

    /// Whether this node itself matches `selector`.
    pub fn matches(&self, selector: &str) -> bool {
        parse_selector(selector).is_some_and(|s| self.matches_selector(&s))
    }

    fn matches_selector(&self, selector: &Selector) -> bool {
        self.with_node(|node| ElementRef::wrap(node).is_some_and(|e| selector.matches(&e)))
            .unwrap_or(false)
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        self.with_node(|node| {
            node.descendants()
                .filter_map(|d| d.value().as_text().map(|t| &**t))
                .collect()
        })
        .unwrap_or_default()
    }

    /// Serialized markup of the children.
    pub fn inner_html(&self) -> String {
        self.with_node(|node| ElementRef::wrap(node).map(|e| e.inner_html()))
            .flatten()
            .unwrap_or_default()
    }

    /// Serialized markup of the element itself; empty for non-element nodes.
    pub fn outer_html(&self) -> String {
        self.with_node(|node| ElementRef::wrap(node).map(|e| e.html()))
            .flatten()
            .unwrap_or_default()
    }

    /// Set an attribute, replacing any existing value in place.
    ///
    /// New attributes are appended after the existing ones.
    pub fn set_attr(&self, name: &str, value: &str) {
        let mut doc = self.doc.borrow_mut();
        let Some(mut node) = doc.tree.get_mut(self.id) else {
            return;
        };
        if let Node::Element(element) = node.value() {
            let name = QualName::new(None, Namespace::from(""), LocalName::from(name));
            element.attrs.insert(name, value.into());
        }
    }

    /// Detach this node from its parent.
    pub fn remove(&self) {
        let mut doc = self.doc.borrow_mut();
        if let Some(mut node) = doc.tree.get_mut(self.id) {
            node.detach();
        }
    }

    /// Replace this node with its own children.
    pub fn unwrap(&self) {
        let children: Vec<NodeId> = self
            .with_node(|node| node.children().map(|c| c.id()).collect())
            .unwrap_or_default();
        let mut doc = self.doc.borrow_mut();
        let Some(mut node) = doc.tree.get_mut(self.id) else {
            return;
        };
        if node.parent().is_none() {
            return;
        }
        for child in children {
            node.insert_id_before(child);
        }
        node.detach();
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!(selector, error = ?e, "Unparsable selector");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fragment_nodes() {
        let fragment = Fragment::parse("<p>one</p><!--note--><img src=\"a.jpg\">");
        let nodes = fragment.nodes();
        assert_eq!(nodes.len(), 3);
        assert!(nodes[0].is_tag("p"));
        assert_eq!(nodes[0].text_content(), "one");
        assert_eq!(nodes[1].comment_text().as_deref(), Some("note"));
        assert_eq!(nodes[2].attr("src").as_deref(), Some("a.jpg"));
        assert_eq!(fragment.to_html(), "<p>one</p><!--note--><img src=\"a.jpg\">");
    }

    #[test]
    fn test_nodes_outlive_fragment() {
        let nodes = Fragment::parse("<p>one</p><div><span>two</span></div>").nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].outer_html(), "<p>one</p>");
        let span = nodes[1].query_selector("span").unwrap();
        assert_eq!(span.text_content(), "two");
        assert_eq!(span.parent_element(), Some(nodes[1].clone()));
        assert_eq!(nodes[0].next_element_sibling(), Some(nodes[1].clone()));
    }

    #[test]
    fn test_outer_html_keeps_attribute_order() {
        let fragment = Fragment::parse(r#"<iframe width="200" src="https://x.test/e" frameborder="0"></iframe>"#);
        let iframe = &fragment.nodes()[0];
        assert_eq!(
            iframe.outer_html(),
            r#"<iframe width="200" src="https://x.test/e" frameborder="0"></iframe>"#
        );
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let fragment = Fragment::parse(r#"<iframe src="//x.test/e" width="1"></iframe>"#);
        let iframe = &fragment.nodes()[0];
        iframe.set_attr("src", "https://x.test/e");
        iframe.set_attr("title", "t");
        assert_eq!(
            iframe.outer_html(),
            r#"<iframe src="https://x.test/e" width="1" title="t"></iframe>"#
        );
    }

    #[test]
    fn test_query_selector_excludes_self() {
        let fragment = Fragment::parse("<div class=\"a\"><div class=\"a\" id=\"inner\"></div></div>");
        let outer = &fragment.nodes()[0];
        let found = outer.query_selector(".a").unwrap();
        assert_eq!(found.attr("id").as_deref(), Some("inner"));
    }

    #[test]
    fn test_query_selector_combinators() {
        let fragment = Fragment::parse(
            r#"<figure class="kg-card"><div><img src="a.jpg"></div><figcaption>c</figcaption></figure>"#,
        );
        let root = fragment.root();
        assert!(root.query_selector("figure > img").is_none());
        assert!(root.query_selector("figure img[src]").is_some());
        assert_eq!(root.query_selector_all("figure.kg-card, figcaption").len(), 2);
        assert!(root.query_selector("figure[").is_none());
    }

    #[test]
    fn test_text_content_and_inner_html() {
        let fragment = Fragment::parse("<p>Hello <strong>world</strong> &amp; co</p>");
        let p = &fragment.nodes()[0];
        assert_eq!(p.text_content(), "Hello world & co");
        assert_eq!(p.inner_html(), "Hello <strong>world</strong> &amp; co");
    }

    #[test]
    fn test_sibling_navigation() {
        let fragment = Fragment::parse("<p>a</p>\n<p>b</p>");
        let first = &fragment.nodes()[0];
        assert!(first.next_sibling().unwrap().is_text());
        assert_eq!(first.next_element_sibling().unwrap().text_content(), "b");
        let last = first.next_element_sibling().unwrap();
        assert_eq!(last.previous_element_sibling().as_ref(), Some(first));
    }

    #[test]
    fn test_remove_and_unwrap() {
        let fragment = Fragment::parse("<div><span>a</span><em>b</em><b>c</b></div>");
        let div = &fragment.nodes()[0];
        div.query_selector("em").unwrap().remove();
        div.query_selector("span").unwrap().unwrap();
        assert_eq!(div.inner_html(), "a<b>c</b>");
    }

    #[test]
    fn test_noscript_content_is_parsed() {
        let fragment = Fragment::parse("<noscript><img src=\"x.jpg\"></noscript>");
        let noscript = &fragment.nodes()[0];
        assert!(noscript.query_selector("img").is_some());
    }

    #[test]
    fn test_parent_element_stops_at_fragment_root() {
        let fragment = Fragment::parse("<a href=\"/x\"><img src=\"y.jpg\"></a>");
        let a = &fragment.nodes()[0];
        let img = a.query_selector("img").unwrap();
        assert!(img.parent_element().unwrap().is_tag("a"));
        assert!(a.parent_element().is_none());
    }

    #[test]
    fn test_closest_includes_self() {
        let fragment = Fragment::parse(r#"<b id="docs-internal-guid-1"><p><br></p></b>"#);
        let br = fragment.root().query_selector("br").unwrap();
        let wrapper = br.closest(r#"[id^="docs-internal-guid-"]"#).unwrap();
        assert!(wrapper.is_tag("b"));
        assert_eq!(wrapper.closest("b"), Some(wrapper.clone()));
        assert!(br.closest("table").is_none());
    }

    #[test]
    fn test_inline_style() {
        let fragment = Fragment::parse(r#"<span style="font-weight: bold; Font-Style:italic">x</span>"#);
        let span = &fragment.nodes()[0];
        assert_eq!(span.style("font-weight").as_deref(), Some("bold"));
        assert_eq!(span.style("font-style").as_deref(), Some("italic"));
        assert_eq!(span.style("text-decoration"), None);
    }
}
