//! Element builder for export.
//!
//! Renderers construct output as a small owned tree and serialize it with
//! the same rules a DOM uses for `outerHTML` / `innerHTML`, so markup built
//! here and markup produced by re-serializing a parsed fragment agree.

use std::fmt::Write;

use crate::escape::{escape_attr, escape_text};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are serialized unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub(crate) fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Pre-rendered markup, emitted verbatim.
    Raw(String),
    Comment(String),
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An HTML element under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Child>,
}

impl Element {
    /// Create an element with the given tag name.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Tag name of the element.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Set an attribute, replacing any previous value while keeping its position.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set an attribute only when `value` is `Some`.
    #[must_use]
    pub fn attr_opt(mut self, name: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.set_attr(name, value);
        }
        self
    }

    /// Set an attribute in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self.attrs.iter_mut().find(|(n, _)| n == name) {
            existing.1 = value;
        } else {
            self.attrs.push((name.to_owned(), value));
        }
    }

    /// Read an attribute value.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Append class names, skipping ones already present.
    #[must_use]
    pub fn class(mut self, classes: &str) -> Self {
        self.add_class(classes);
        self
    }

    /// Append class names in place.
    pub fn add_class(&mut self, classes: &str) {
        let mut current: Vec<String> = self
            .get_attr("class")
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();
        for class in classes.split_whitespace() {
            if !current.iter().any(|c| c == class) {
                current.push(class.to_owned());
            }
        }
        self.set_attr("class", current.join(" "));
    }

    /// Append a child element or node.
    #[must_use]
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a child in place.
    pub fn push(&mut self, child: impl Into<Child>) {
        self.children.push(child.into());
    }

    /// Append escaped text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    /// Append pre-rendered markup (the `innerHTML =` case).
    #[must_use]
    pub fn raw(mut self, html: impl Into<String>) -> Self {
        self.children.push(Child::Raw(html.into()));
        self
    }

    /// Children of this element.
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Serialize the whole element.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_outer(&mut out);
        out
    }

    /// Serialize the children only.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.write_inner(&mut out);
        out
    }

    fn write_outer(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            write!(out, r#" {name}="{}""#, escape_attr(value)).unwrap();
        }
        out.push('>');
        if is_void(&self.tag) {
            return;
        }
        self.write_inner(out);
        write!(out, "</{}>", self.tag).unwrap();
    }

    fn write_inner(&self, out: &mut String) {
        let raw_text = is_raw_text(&self.tag);
        for child in &self.children {
            match child {
                Child::Element(element) => element.write_outer(out),
                Child::Text(text) if raw_text => out.push_str(text),
                Child::Text(text) => out.push_str(&escape_text(text)),
                Child::Raw(html) => out.push_str(html),
                Child::Comment(text) => write!(out, "<!--{text}-->").unwrap(),
            }
        }
    }
}
