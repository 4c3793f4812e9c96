//! Inline text rendering for Koenig documents.
//!
//! Paragraph-level blocks hold a flat sequence of inline nodes: text runs
//! carrying a [`TextFormat`] bitset, line breaks and links. [`TextContent`]
//! turns such a sequence into HTML with the fewest format tags that still
//! nest correctly.
//!
//! # Architecture
//!
//! - [`format`]: the format bitset and its fixed format-to-tag table
//! - [`TextContent`]: the open/close state machine over inline runs
//!
//! Block-level cards are rendered by `kg-nodes`; this crate only handles the
//! inline layer between them.

pub mod format;
mod text_content;

pub use format::TextFormat;
pub use text_content::{InlineNode, Link, TextContent, TextRun};
