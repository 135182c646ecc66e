//! Tree group tags and tree identity
//!
//! A tag binds a log or leaf block to one physical tree. Foliage tags may carry a
//! single leading digit (a sub-group/age marker) that is dropped before comparing
//! against a trunk tag. A candidate matches a root tag when it is equal to it or
//! ends with it.

use crate::core_types::position::BlockPos;
use std::fmt;

/// Drop one leading ASCII digit from a foliage tag, if present.
///
/// `"6oak"` → `"oak"`, `"12oak"` → `"2oak"`, `"oak"` → `"oak"`.
pub fn strip_leaf_prefix(tag: &str) -> &str {
    let mut chars = tag.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => chars.as_str(),
        _ => tag,
    }
}

/// Whether a log tag belongs to the tree identified by `root`
pub fn tag_matches(candidate: &str, root: &str) -> bool {
    !root.is_empty() && (candidate == root || candidate.ends_with(root))
}

/// Whether a foliage tag belongs to the tree identified by `root`
pub fn leaf_tag_matches(leaf_tag: &str, root: &str) -> bool {
    tag_matches(strip_leaf_prefix(leaf_tag), root)
}

/// One physical tree: its group tag plus its canonical base position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeIdentity {
    pub tag: String,
    pub base: BlockPos,
}

impl TreeIdentity {
    pub fn new(tag: impl Into<String>, base: BlockPos) -> Self {
        Self {
            tag: tag.into(),
            base,
        }
    }
}

impl fmt::Display for TreeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{},{}",
            self.tag, self.base.x, self.base.y, self.base.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_leaf_prefix() {
        assert_eq!(strip_leaf_prefix("6oak"), "oak");
        assert_eq!(strip_leaf_prefix("12oak"), "2oak");
        assert_eq!(strip_leaf_prefix("oak"), "oak");
        assert_eq!(strip_leaf_prefix(""), "");
    }

    #[test]
    fn test_tag_matching() {
        assert!(tag_matches("oak", "oak"));
        assert!(tag_matches("grownoak", "oak"));
        assert!(!tag_matches("oaken", "oak"));
        assert!(!tag_matches("oak", ""));
    }

    #[test]
    fn test_leaf_tag_matching() {
        assert!(leaf_tag_matches("6oak", "oak"));
        assert!(leaf_tag_matches("oak", "oak"));
        assert!(!leaf_tag_matches("6birch", "oak"));
    }

    #[test]
    fn test_identity_display() {
        let id = TreeIdentity::new("oak", BlockPos::new(1, 64, -2));
        assert_eq!(id.to_string(), "oak:1,64,-2");
    }
}
