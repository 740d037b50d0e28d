//! Dotted field paths.
//!
//! A path such as `"B.C"` names field `C` inside the struct held by field
//! `B` (looking through pointers, slices and arrays). Paths are parsed once
//! at construction and grouped into a [`PathTree`] so transforms never split
//! strings.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::CodecError;

/// A parsed dotted field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a dotted path, rejecting empty segments.
    pub fn parse(path: &str) -> Result<Self, CodecError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty() || s.trim() != s) {
            return Err(CodecError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the final segment (the field being configured).
    pub fn name(&self) -> &str {
        // Parsing guarantees at least one segment.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Returns true if `self` is a strict prefix of `other`.
    pub fn is_parent_of(&self, other: &FieldPath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// Returns the path of a child field.
    pub fn join(&self, name: &str) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        FieldPath { segments }
    }

    /// The empty path, used as the prefix of top-level fields.
    pub(crate) fn root() -> FieldPath {
        FieldPath {
            segments: Vec::new(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Rejects a set of paths where one path is the parent of another.
pub fn reject_nested_paths<'a, I>(paths: I) -> Result<(), CodecError>
where
    I: IntoIterator<Item = &'a FieldPath>,
{
    let paths: Vec<&FieldPath> = paths.into_iter().collect();
    for parent in &paths {
        if let Some(child) = paths.iter().find(|p| parent.is_parent_of(p)) {
            return Err(CodecError::AmbiguousPath {
                path: child.to_string(),
                parent: parent.to_string(),
            });
        }
    }
    Ok(())
}

/// Configuration grouped by path segment, one level per struct nesting.
#[derive(Debug, Clone)]
pub(crate) struct PathTree<C> {
    nodes: BTreeMap<String, PathNode<C>>,
}

/// Configuration for one field: its own change, if any, and changes below it.
#[derive(Debug, Clone)]
pub(crate) struct PathNode<C> {
    pub change: Option<C>,
    pub nested: PathTree<C>,
}

impl<C> Default for PathTree<C> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }
}

impl<C> PathTree<C> {
    /// Builds a tree. A later entry for the same path replaces an earlier one.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (FieldPath, C)>,
    {
        let mut tree = PathTree::default();
        for (path, change) in entries {
            tree.insert(path.segments(), change);
        }
        tree
    }

    fn insert(&mut self, segments: &[String], change: C) {
        let Some((first, rest)) = segments.split_first() else {
            return;
        };
        let node = self.nodes.entry(first.clone()).or_insert_with(|| PathNode {
            change: None,
            nested: PathTree::default(),
        });
        if rest.is_empty() {
            node.change = Some(change);
        } else {
            node.nested.insert(rest, change);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for a field at this level.
    pub fn get(&self, name: &str) -> Option<&PathNode<C>> {
        self.nodes.get(name)
    }

    /// Iterates nodes in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PathNode<C>)> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse() {
        let path = FieldPath::parse("B.C").unwrap();
        assert_eq!(path.segments(), ["B".to_string(), "C".to_string()]);
        assert_eq!(path.name(), "C");
        assert_eq!(path.to_string(), "B.C");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        for bad in ["", ".A", "A.", "A..B", " A"] {
            let err = FieldPath::parse(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidConfig, "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_reject_nested_paths() {
        let a = FieldPath::parse("A").unwrap();
        let az = FieldPath::parse("A.Z").unwrap();
        let ab = FieldPath::parse("AB").unwrap();
        assert!(reject_nested_paths([&a, &ab]).is_ok());
        let err = reject_nested_paths([&az, &a]).unwrap_err();
        assert_eq!(
            err,
            CodecError::AmbiguousPath {
                path: "A.Z".into(),
                parent: "A".into()
            }
        );
    }

    #[test]
    fn test_tree_groups_by_segment() {
        let tree = PathTree::build([
            (FieldPath::parse("B.A").unwrap(), 1),
            (FieldPath::parse("B").unwrap(), 2),
            (FieldPath::parse("A").unwrap(), 3),
        ]);
        let names: Vec<&String> = tree.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["A", "B"]);
        let (_, b) = tree.iter().nth(1).unwrap();
        assert_eq!(b.change, Some(2));
        let (inner, node) = b.nested.iter().next().unwrap();
        assert_eq!(inner, "A");
        assert_eq!(node.change, Some(1));
    }
}
