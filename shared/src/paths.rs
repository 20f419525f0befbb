use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const MAIN_LIST_ID: &str = "main";
pub const MAX_SEGMENT_LENGTH: usize = 768;
pub const MAX_PATH_DEPTH: usize = 32;

const FORBIDDEN_CHARS: &[char] = &['.', '#', '$', '[', ']', '/'];
const ITEMS_SEGMENT: &str = "items";
const META_SEGMENT: &str = "meta";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path cannot be empty")]
    Empty,

    #[error("invalid path segment {segment:?}: {reason}")]
    InvalidSegment {
        segment: String,
        reason: &'static str,
    },

    #[error("path too deep: {depth} segments, max {max}")]
    TooDeep { depth: usize, max: usize },
}

/// Slash-separated location in the remote tree, validated segment by segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorePath(String);

impl StorePath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let depth = trimmed.split('/').count();
        if depth > MAX_PATH_DEPTH {
            return Err(PathError::TooDeep {
                depth,
                max: MAX_PATH_DEPTH,
            });
        }

        for segment in trimmed.split('/') {
            validate_segment(segment)?;
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn child(&self, segment: &str) -> Result<Self, PathError> {
        validate_segment(segment)?;

        let depth = self.depth() + 1;
        if depth > MAX_PATH_DEPTH {
            return Err(PathError::TooDeep {
                depth,
                max: MAX_PATH_DEPTH,
            });
        }

        Ok(Self(format!("{}/{segment}", self.0)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    pub fn last(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn is_ancestor_of(&self, other: &StorePath) -> bool {
        other
            .0
            .strip_prefix(&self.0)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::InvalidSegment {
            segment: segment.to_string(),
            reason: "segment cannot be empty",
        });
    }

    if segment.len() > MAX_SEGMENT_LENGTH {
        return Err(PathError::InvalidSegment {
            segment: segment.chars().take(50).collect::<String>() + "...",
            reason: "segment exceeds maximum length",
        });
    }

    if segment.trim().is_empty() {
        return Err(PathError::InvalidSegment {
            segment: segment.to_string(),
            reason: "segment cannot be only whitespace",
        });
    }

    if segment.contains(FORBIDDEN_CHARS) {
        return Err(PathError::InvalidSegment {
            segment: segment.to_string(),
            reason: "segment contains one of . # $ [ ] /",
        });
    }

    if segment.chars().any(char::is_control) {
        return Err(PathError::InvalidSegment {
            segment: segment.escape_debug().to_string(),
            reason: "segment contains control characters",
        });
    }

    Ok(())
}

/// Which shopping list a set of items belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum CollectionId {
    Main,
    Custom(String),
}

impl CollectionId {
    /// Interprets a persisted "last used list" value. Empty strings and the
    /// main list's id both map to the main list.
    pub fn from_persisted(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == MAIN_LIST_ID {
            Self::Main
        } else {
            Self::Custom(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Main => MAIN_LIST_ID,
            Self::Custom(id) => id,
        }
    }

    pub const fn is_main(&self) -> bool {
        matches!(self, Self::Main)
    }

    pub fn custom_id(&self) -> Option<&str> {
        match self {
            Self::Main => None,
            Self::Custom(id) => Some(id),
        }
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where collections live in the remote tree.
///
/// The main list sits at a fixed root (`shoppingList/{itemId}`); every other
/// list keeps its items and metadata side by side under
/// `lists/{listId}/items` and `lists/{listId}/meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathLayout {
    main: StorePath,
    lists_root: StorePath,
}

impl Default for PathLayout {
    fn default() -> Self {
        Self {
            main: StorePath(crate::config::DEFAULT_MAIN_LIST_PATH.to_string()),
            lists_root: StorePath(crate::config::DEFAULT_LISTS_ROOT.to_string()),
        }
    }
}

impl PathLayout {
    pub fn new(main: &str, lists_root: &str) -> Result<Self, PathError> {
        Ok(Self {
            main: StorePath::parse(main)?,
            lists_root: StorePath::parse(lists_root)?,
        })
    }

    pub fn main(&self) -> &StorePath {
        &self.main
    }

    pub fn lists_root(&self) -> &StorePath {
        &self.lists_root
    }

    pub fn list(&self, list_id: &str) -> Result<StorePath, PathError> {
        self.lists_root.child(list_id)
    }

    pub fn list_meta(&self, list_id: &str) -> Result<StorePath, PathError> {
        self.list(list_id)?.child(META_SEGMENT)
    }

    pub fn items(&self, collection: &CollectionId) -> Result<StorePath, PathError> {
        match collection {
            CollectionId::Main => Ok(self.main.clone()),
            CollectionId::Custom(id) => self.list(id)?.child(ITEMS_SEGMENT),
        }
    }

    pub fn item(&self, collection: &CollectionId, item_id: &str) -> Result<StorePath, PathError> {
        self.items(collection)?.child(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_slashes() {
        let path = StorePath::parse("/lists/abc/").unwrap();
        assert_eq!(path.as_str(), "lists/abc");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.last(), "abc");
    }

    #[test]
    fn parse_rejects_forbidden_segments() {
        assert_eq!(StorePath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            StorePath::parse("lists//x"),
            Err(PathError::InvalidSegment { .. })
        ));
        assert!(matches!(
            StorePath::parse("lists/a.b"),
            Err(PathError::InvalidSegment { .. })
        ));
        assert!(matches!(
            StorePath::parse("lists/$x"),
            Err(PathError::InvalidSegment { .. })
        ));
        assert!(matches!(
            StorePath::parse("lists/a\u{0}b"),
            Err(PathError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn child_rejects_nested_separator() {
        let root = StorePath::parse("lists").unwrap();
        assert!(root.child("a/b").is_err());
        assert_eq!(root.child("a").unwrap().as_str(), "lists/a");
    }

    #[test]
    fn depth_is_bounded() {
        let raw = vec!["x"; MAX_PATH_DEPTH + 1].join("/");
        assert!(matches!(
            StorePath::parse(&raw),
            Err(PathError::TooDeep { .. })
        ));
    }

    #[test]
    fn layout_matches_stored_data() {
        let layout = PathLayout::default();
        assert_eq!(layout.items(&CollectionId::Main).unwrap().as_str(), "shoppingList");
        assert_eq!(
            layout.item(&CollectionId::Main, "k1").unwrap().as_str(),
            "shoppingList/k1"
        );

        let custom = CollectionId::Custom("L1".into());
        assert_eq!(layout.items(&custom).unwrap().as_str(), "lists/L1/items");
        assert_eq!(layout.item(&custom, "k2").unwrap().as_str(), "lists/L1/items/k2");
        assert_eq!(layout.list_meta("L1").unwrap().as_str(), "lists/L1/meta");
        assert_eq!(layout.list("L1").unwrap().as_str(), "lists/L1");
    }

    #[test]
    fn list_subtree_contains_items_and_meta() {
        let layout = PathLayout::default();
        let list = layout.list("L1").unwrap();
        let custom = CollectionId::Custom("L1".into());

        assert!(list.is_ancestor_of(&layout.items(&custom).unwrap()));
        assert!(list.is_ancestor_of(&layout.list_meta("L1").unwrap()));
        assert!(!list.is_ancestor_of(&layout.list("L10").unwrap()));
        assert!(!list.is_ancestor_of(&list));
    }

    #[test]
    fn persisted_ids() {
        assert_eq!(CollectionId::from_persisted(""), CollectionId::Main);
        assert_eq!(CollectionId::from_persisted("main"), CollectionId::Main);
        assert_eq!(
            CollectionId::from_persisted(" L9 "),
            CollectionId::Custom("L9".into())
        );
        assert_eq!(CollectionId::Custom("L9".into()).custom_id(), Some("L9"));
        assert_eq!(CollectionId::Main.as_str(), MAIN_LIST_ID);
    }
}
