//! Positional addressing of sections.
//!
//! A path is the sequence of zero-based sibling indices leading from the
//! forest root down through nested `subsections`. Paths are not stable
//! identifiers: any insertion or removal before a node in traversal order
//! invalidates paths that pass through the shifted siblings, so callers
//! recompute them against the tree they are about to mutate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used in expansion-state keys; never part of a decimal index.
pub const KEY_SEPARATOR: char = '-';

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
/// Location of a section within a forest.
///
/// The empty path denotes the forest root itself, which is a sequence rather
/// than a node: it is a valid parent for insertion but not a valid target for
/// reads, replacements or removals.
pub struct SectionPath(Vec<usize>);

impl SectionPath {
    #[must_use]
    /// The forest root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    /// Sibling indices from the root down.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    #[must_use]
    /// Whether this is the forest root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    /// Number of indices; top-level sections have depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    /// Path of the `index`-th child of this node.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }

    #[must_use]
    /// Path of the containing node, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.split_last()
            .map(|(parent, _)| Self(parent.to_vec()))
    }

    #[must_use]
    /// Parent indices and position within the parent.
    pub fn split_last(&self) -> Option<(&[usize], usize)> {
        self.0
            .split_last()
            .map(|(last, parent)| (parent, *last))
    }

    #[must_use]
    /// Stable key for per-node view state, e.g. `0-2-1`.
    ///
    /// Distinct paths always produce distinct keys. The root encodes as the
    /// empty string.
    pub fn key(&self) -> String {
        let mut key = String::new();
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(&index.to_string());
        }
        key
    }
}

impl From<Vec<usize>> for SectionPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for SectionPath {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for SectionPath {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.to_vec())
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
#[path = "tests/path.rs"]
mod tests;
