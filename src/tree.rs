//! Path-addressed reads and mutations over a section forest.
//!
//! Every function here is pure: the input forest is borrowed and never
//! touched, and mutating functions return a freshly owned forest. Nothing in
//! the returned value aliases the input, so later edits to one are invisible
//! through the other.

use crate::path::SectionPath;
use crate::section::Section;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Failure to resolve a path against a forest.
pub enum TreeError {
    /// The operation needs a node but was given the forest root.
    #[error("an empty path does not address a section")]
    EmptyPath,

    /// Some index along the path is out of bounds for the current tree.
    #[error("no section at path {path}")]
    PathNotFound {
        /// The path that failed to resolve.
        path: SectionPath,
    },
}

impl TreeError {
    fn not_found(path: &SectionPath) -> Self {
        Self::PathNotFound { path: path.clone() }
    }
}

/// Returns the section at `path`.
///
/// # Errors
///
/// [`TreeError::EmptyPath`] for the root, [`TreeError::PathNotFound`] if any
/// index is out of bounds.
pub fn get<'a>(sections: &'a [Section], path: &SectionPath) -> Result<&'a Section, TreeError> {
    let (first, rest) = path
        .indices()
        .split_first()
        .ok_or(TreeError::EmptyPath)?;
    let mut node = sections
        .get(*first)
        .ok_or_else(|| TreeError::not_found(path))?;
    for &index in rest {
        node = node
            .subsections
            .get(index)
            .ok_or_else(|| TreeError::not_found(path))?;
    }
    Ok(node)
}

/// Returns a new forest with the section at `path` replaced by `node`.
///
/// The replacement is taken as given, including its `subsections`; callers
/// that must keep the existing descendants copy them in first.
///
/// # Errors
///
/// Same as [`get`].
pub fn replace(
    sections: &[Section],
    path: &SectionPath,
    node: Section,
) -> Result<Vec<Section>, TreeError> {
    let (parent, index) = path.split_last().ok_or(TreeError::EmptyPath)?;
    let mut forest = sections.to_vec();
    let siblings = siblings_mut(&mut forest, parent, path)?;
    let slot = siblings
        .get_mut(index)
        .ok_or_else(|| TreeError::not_found(path))?;
    *slot = node;
    Ok(forest)
}

/// Returns a new forest with `node` appended as the last child of `parent`.
///
/// The root path appends a new top-level section.
///
/// # Errors
///
/// [`TreeError::PathNotFound`] if a non-root `parent` does not resolve.
pub fn insert_child(
    sections: &[Section],
    parent: &SectionPath,
    node: Section,
) -> Result<Vec<Section>, TreeError> {
    let mut forest = sections.to_vec();
    siblings_mut(&mut forest, parent.indices(), parent)?.push(node);
    Ok(forest)
}

/// Returns a new forest without the section at `path`.
///
/// Following siblings shift down by one position, and so do any paths
/// through them.
///
/// # Errors
///
/// Same as [`get`].
pub fn remove_at(sections: &[Section], path: &SectionPath) -> Result<Vec<Section>, TreeError> {
    let (parent, index) = path.split_last().ok_or(TreeError::EmptyPath)?;
    let mut forest = sections.to_vec();
    let siblings = siblings_mut(&mut forest, parent, path)?;
    if index >= siblings.len() {
        return Err(TreeError::not_found(path));
    }
    siblings.remove(index);
    Ok(forest)
}

#[must_use]
/// Path the next child appended under `parent` will receive.
///
/// Returns `None` if `parent` does not resolve.
pub fn next_child_path(sections: &[Section], parent: &SectionPath) -> Option<SectionPath> {
    let count = if parent.is_root() {
        sections.len()
    } else {
        get(sections, parent).ok()?.subsections.len()
    };
    Some(parent.child(count))
}

/// The sequence whose elements are the children of the node at `indices`.
///
/// `path` is only used for error reporting.
fn siblings_mut<'a>(
    forest: &'a mut Vec<Section>,
    indices: &[usize],
    path: &SectionPath,
) -> Result<&'a mut Vec<Section>, TreeError> {
    let mut siblings = forest;
    for &index in indices {
        siblings = &mut siblings
            .get_mut(index)
            .ok_or_else(|| TreeError::not_found(path))?
            .subsections;
    }
    Ok(siblings)
}

#[cfg(test)]
#[path = "tests/tree.rs"]
mod tests;
