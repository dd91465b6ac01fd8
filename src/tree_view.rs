//! Read-only projection of a section forest into displayable rows.
//!
//! Expansion is view state, not model state: it lives in [`ExpandState`],
//! keyed by [`SectionPath::key`], and survives edits only as far as the paths
//! do. While a search query is active every surviving node is shown expanded
//! regardless of the stored state.
//!
//! Rows always carry paths into the *unfiltered* forest, so a row picked from
//! search results can be handed straight to the editor.

use crate::markers::{self, Segment};
use crate::path::SectionPath;
use crate::search;
use crate::section::Section;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Per-node expanded/collapsed flags, keyed by path key.
pub struct ExpandState {
    open: HashMap<String, bool>,
}

impl ExpandState {
    #[must_use]
    /// Everything collapsed.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    /// Only the first top-level section expanded, as when a guide is opened.
    pub fn with_first_open() -> Self {
        let mut state = Self::new();
        state.set(&SectionPath::from([0]), true);
        state
    }

    #[must_use]
    /// Whether the node at `path` shows its children.
    pub fn is_expanded(&self, path: &SectionPath) -> bool {
        self.open.get(&path.key()).copied().unwrap_or(false)
    }

    /// Sets the flag for `path`.
    pub fn set(&mut self, path: &SectionPath, expanded: bool) {
        self.open.insert(path.key(), expanded);
    }

    /// Flips the flag for `path` and returns the new value.
    pub fn toggle(&mut self, path: &SectionPath) -> bool {
        let expanded = !self.is_expanded(path);
        self.set(path, expanded);
        expanded
    }

    /// Expands `path` and all its ancestors.
    pub fn reveal(&mut self, path: &SectionPath) {
        let mut current = path.parent();
        while let Some(ancestor) = current {
            if ancestor.is_root() {
                break;
            }
            self.set(&ancestor, true);
            current = ancestor.parent();
        }
    }

    /// Collapses everything.
    pub fn collapse_all(&mut self) {
        self.open.clear();
    }

    /// Drops the flags of the removed subtree at `removed` and moves the flags
    /// of its later siblings' subtrees up by one index.
    pub fn forget(&mut self, removed: &SectionPath) {
        let Some((parent, index)) = removed.split_last() else {
            return;
        };
        let depth = parent.len();
        self.open = std::mem::take(&mut self.open)
            .into_iter()
            .filter_map(|(key, open)| {
                let mut indices = key
                    .split('-')
                    .map(str::parse)
                    .collect::<Result<Vec<usize>, _>>()
                    .ok()?;
                if indices.len() > depth && indices.starts_with(parent) {
                    match indices[depth].cmp(&index) {
                        Ordering::Less => {}
                        Ordering::Equal => return None,
                        Ordering::Greater => indices[depth] -= 1,
                    }
                }
                Some((SectionPath::from(indices).key(), open))
            })
            .collect();
    }

    /// Expands every node that has children.
    pub fn expand_all(&mut self, sections: &[Section]) {
        fn visit(state: &mut ExpandState, sections: &[Section], parent: &SectionPath) {
            for (index, section) in sections.iter().enumerate() {
                if !section.subsections.is_empty() {
                    let path = parent.child(index);
                    state.set(&path, true);
                    visit(state, &section.subsections, &path);
                }
            }
        }
        visit(self, sections, &SectionPath::root());
    }
}

#[derive(Clone, Debug)]
/// One visible section.
pub struct Row<'a> {
    /// The section shown.
    pub section: &'a Section,
    /// Address in the unfiltered forest.
    pub path: SectionPath,
    /// Whether its (visible) children follow.
    pub expanded: bool,
    /// Whether it has any visible children to expand into.
    pub has_children: bool,
    /// Whether it is the last visible sibling.
    pub is_last: bool,
    /// For each ancestor level, whether that ancestor has a later visible sibling.
    pub rails: Vec<bool>,
}

impl Row<'_> {
    #[must_use]
    /// Nesting depth; top-level rows are 0.
    pub fn level(&self) -> usize {
        self.rails.len()
    }
}

struct Walk<'s> {
    expand: &'s ExpandState,
    survivors: Option<HashSet<SectionPath>>,
}

impl Walk<'_> {
    fn keeps(&self, path: &SectionPath) -> bool {
        self.survivors
            .as_ref()
            .is_none_or(|survivors| survivors.contains(path))
    }

    fn rows<'a>(
        &self,
        sections: &'a [Section],
        parent: &SectionPath,
        rails: &mut Vec<bool>,
        out: &mut Vec<Row<'a>>,
    ) {
        let visible: Vec<(SectionPath, &'a Section)> = sections
            .iter()
            .enumerate()
            .map(|(index, section)| (parent.child(index), section))
            .filter(|(path, _)| self.keeps(path))
            .collect();
        let count = visible.len();

        for (n, (path, section)) in visible.into_iter().enumerate() {
            let is_last = n + 1 == count;
            let has_children = (0..section.subsections.len()).any(|i| self.keeps(&path.child(i)));
            let expanded =
                has_children && (self.survivors.is_some() || self.expand.is_expanded(&path));
            out.push(Row {
                section,
                path: path.clone(),
                expanded,
                has_children,
                is_last,
                rails: rails.clone(),
            });
            if expanded {
                rails.push(!is_last);
                self.rows(&section.subsections, &path, rails, out);
                rails.pop();
            }
        }
    }
}

#[must_use]
/// Visible rows in display order.
///
/// With a non-blank `query` only search survivors are listed, all expanded.
pub fn visible_rows<'a>(
    sections: &'a [Section],
    expand: &ExpandState,
    query: &str,
) -> Vec<Row<'a>> {
    let walk = Walk {
        expand,
        survivors: search::surviving_paths(sections, query)
            .map(|paths| paths.into_iter().collect()),
    };
    let mut out = Vec::new();
    walk.rows(sections, &SectionPath::root(), &mut Vec::new(), &mut out);
    out
}

#[must_use]
/// Titles from the top-level section down to the one at `path`.
///
/// Stops early at the first index that does not resolve.
pub fn breadcrumb<'a>(sections: &'a [Section], path: &SectionPath) -> Vec<&'a str> {
    let mut titles = Vec::with_capacity(path.depth());
    let mut level = sections;
    for &index in path.indices() {
        let Some(section) = level.get(index) else {
            break;
        };
        titles.push(section.title.as_str());
        level = &section.subsections;
    }
    titles
}

#[must_use]
/// Body of a section as plain text with markers rendered inline.
///
/// Images become `[image: URL]`, callouts `[KIND: title] text`, and
/// unresolved markers disappear.
pub fn render_plain(section: &Section) -> String {
    let mut text = String::new();
    for segment in markers::resolve_section(section) {
        match segment {
            Segment::Plain(plain) => text.push_str(plain),
            Segment::Image(image) => {
                let _ = write!(text, "[image: {}]", image.url);
            }
            Segment::Callout(callout) => {
                let _ = write!(
                    text,
                    "[{}: {}] {}",
                    callout.kind.as_str().to_uppercase(),
                    callout.title,
                    callout.text
                );
            }
            Segment::Unresolved(_) => {}
        }
    }
    text
}

#[must_use]
/// Indented text outline of the whole forest, or of the search survivors.
pub fn outline(sections: &[Section], query: &str) -> String {
    let mut expand = ExpandState::new();
    expand.expand_all(sections);
    let mut out = String::new();
    for row in visible_rows(sections, &expand, query) {
        let indent = "  ".repeat(row.level());
        let _ = writeln!(out, "{indent}- {}", row.section.title);
        let body = render_plain(row.section);
        for line in body.lines().filter(|line| !line.trim().is_empty()) {
            let _ = writeln!(out, "{indent}  {line}");
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/tree_view.rs"]
mod tests;
