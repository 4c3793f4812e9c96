//! Text format bitset.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Inline formats applied to a text run, stored as the editor's bit flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFormat(u32);

impl TextFormat {
    pub const NONE: Self = Self(0);
    pub const BOLD: Self = Self(1);
    pub const ITALIC: Self = Self(1 << 1);
    pub const STRIKETHROUGH: Self = Self(1 << 2);
    pub const UNDERLINE: Self = Self(1 << 3);
    pub const CODE: Self = Self(1 << 4);
    pub const SUBSCRIPT: Self = Self(1 << 5);
    pub const SUPERSCRIPT: Self = Self(1 << 6);
    pub const HIGHLIGHT: Self = Self(1 << 7);

    /// Formats and their tags, in the order tags are considered for opening.
    pub const TAGS: [(Self, &'static str); 8] = [
        (Self::BOLD, "strong"),
        (Self::ITALIC, "em"),
        (Self::STRIKETHROUGH, "s"),
        (Self::UNDERLINE, "u"),
        (Self::CODE, "code"),
        (Self::SUBSCRIPT, "sub"),
        (Self::SUPERSCRIPT, "sup"),
        (Self::HIGHLIGHT, "mark"),
    ];

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn toggle(&mut self, other: Self) {
        self.0 ^= other.0;
    }

    /// Tag name for a single-flag format.
    pub fn tag(self) -> Option<&'static str> {
        Self::TAGS.iter().find(|(f, _)| *f == self).map(|(_, tag)| *tag)
    }
}

impl BitOr for TextFormat {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TextFormat {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for TextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::TAGS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, tag)| *tag)
            .collect();
        write!(f, "TextFormat({})", names.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_toggle() {
        let mut format = TextFormat::BOLD | TextFormat::ITALIC;
        assert!(format.contains(TextFormat::BOLD));
        assert!(!format.contains(TextFormat::CODE));
        format.toggle(TextFormat::BOLD);
        assert_eq!(format, TextFormat::ITALIC);
    }

    #[test]
    fn test_tag_lookup() {
        assert_eq!(TextFormat::HIGHLIGHT.tag(), Some("mark"));
        assert_eq!((TextFormat::BOLD | TextFormat::ITALIC).tag(), None);
    }

    #[test]
    fn test_serializes_as_bits() {
        let json = serde_json::to_string(&(TextFormat::BOLD | TextFormat::UNDERLINE)).unwrap();
        assert_eq!(json, "9");
    }
}
