//! HTML plumbing for Koenig cards.
//!
//! Import rules read markup through a parsed [`Fragment`] and its [`DomNode`]
//! handles; export renderers build output with [`Element`] and the template
//! escapes in [`escape`]. Both sides share one serialization convention,
//! the one browsers use for `outerHTML`.
//!
//! # Example
//!
//! ```
//! use kg_html::{Element, Fragment};
//!
//! let fragment = Fragment::parse(r#"<figure class="kg-card"><img src="a.jpg"></figure>"#);
//! let figure = &fragment.nodes()[0];
//! assert!(figure.has_class("kg-card"));
//! assert_eq!(figure.query_selector("img").unwrap().attr("src").as_deref(), Some("a.jpg"));
//!
//! let img = Element::new("img").attr("src", "a.jpg").attr("alt", "");
//! assert_eq!(img.outer_html(), r#"<img src="a.jpg" alt="">"#);
//! ```

mod dom;
mod element;
pub mod escape;
mod sanitize;
mod text;

pub use dom::{DomNode, Fragment};
pub use element::{Child, Element};
pub use escape::{escape_attr, escape_html, escape_html_quotes, escape_text};
pub use sanitize::{CALLOUT_ALLOWED_TAGS, CleanOptions, clean_basic_html, clean_inline};
pub use text::{slugify, truncate_html};
