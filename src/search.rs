//! Full-text filtering of a section forest.
//!
//! A section survives a query when its title or body contains the query
//! (case-insensitively) or when any of its descendants survives. Survivors
//! keep their ancestor chain and their relative order; everything else is
//! pruned.

use crate::path::SectionPath;
use crate::section::Section;
use std::borrow::Cow;

/// Normalised needle, or `None` when the query is blank.
fn needle(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn matches_needle(section: &Section, needle: &str) -> bool {
    section.title.to_lowercase().contains(needle) || section.content.to_lowercase().contains(needle)
}

#[must_use]
/// Whether the section's own title or body contains `query`.
///
/// A blank query matches everything.
pub fn matches(section: &Section, query: &str) -> bool {
    needle(query).is_none_or(|needle| matches_needle(section, &needle))
}

#[must_use]
/// The pruned forest for `query`.
///
/// A blank query borrows the input unchanged.
pub fn filter<'a>(sections: &'a [Section], query: &str) -> Cow<'a, [Section]> {
    match needle(query) {
        None => Cow::Borrowed(sections),
        Some(needle) => Cow::Owned(prune(sections, &needle)),
    }
}

fn prune(sections: &[Section], needle: &str) -> Vec<Section> {
    sections
        .iter()
        .filter_map(|section| {
            let subsections = prune(&section.subsections, needle);
            if matches_needle(section, needle) || !subsections.is_empty() {
                Some(Section {
                    title: section.title.clone(),
                    content: section.content.clone(),
                    images: section.images.clone(),
                    callouts: section.callouts.clone(),
                    subsections,
                })
            } else {
                None
            }
        })
        .collect()
}

#[must_use]
/// Paths, in the unfiltered forest, of every section the filter keeps.
///
/// The result is in display (pre-)order and closed under ancestors. Returns
/// `None` for a blank query, where everything is kept.
pub fn surviving_paths(sections: &[Section], query: &str) -> Option<Vec<SectionPath>> {
    let needle = needle(query)?;
    let mut paths = Vec::new();
    collect_survivors(sections, &SectionPath::root(), &needle, &mut paths);
    Some(paths)
}

/// Appends survivors under `parent`; returns whether any were found.
fn collect_survivors(
    sections: &[Section],
    parent: &SectionPath,
    needle: &str,
    out: &mut Vec<SectionPath>,
) -> bool {
    let mut any = false;
    for (index, section) in sections.iter().enumerate() {
        let path = parent.child(index);
        let slot = out.len();
        out.push(path.clone());
        let below = collect_survivors(&section.subsections, &path, needle, out);
        if below || matches_needle(section, needle) {
            any = true;
        } else {
            out.truncate(slot);
        }
    }
    any
}

#[must_use]
/// Number of sections whose own title or body contains `query`.
pub fn count_matches(sections: &[Section], query: &str) -> usize {
    needle(query).map_or(0, |needle| count_needle(sections, &needle))
}

fn count_needle(sections: &[Section], needle: &str) -> usize {
    sections
        .iter()
        .map(|s| usize::from(matches_needle(s, needle)) + count_needle(&s.subsections, needle))
        .sum()
}

#[cfg(test)]
#[path = "tests/search.rs"]
mod tests;
