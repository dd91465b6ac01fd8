use super::{count_matches, filter, matches, surviving_paths};
use crate::path::SectionPath;
use crate::section::Section;
use std::borrow::Cow;

/// Bosses (Dragon "fire breath", Golem), Items (Potion "heals")
fn sample() -> Vec<Section> {
    vec![
        Section::new("Bosses", "overview").with_subsections(vec![
            Section::new("Dragon", "Beware the fire breath"),
            Section::new("Golem", "slow"),
        ]),
        Section::new("Items", "").with_subsections(vec![Section::new("Potion", "heals")]),
    ]
}

#[test]
fn test_blank_query_borrows_input() {
    let tree = sample();
    for query in ["", "   ", "\t"] {
        let filtered = filter(&tree, query);
        assert!(matches!(filtered, Cow::Borrowed(_)));
        assert_eq!(filtered.as_ref(), tree.as_slice());
    }
    assert_eq!(surviving_paths(&tree, " "), None);
}

#[test]
fn test_match_keeps_ancestors_only() {
    let tree = sample();
    let filtered = filter(&tree, "fire");

    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].title, "Bosses");
    assert_eq!(filtered[0].subsections.len(), 1);
    assert_eq!(filtered[0].subsections[0].title, "Dragon");
}

#[test]
fn test_matching_parent_drops_non_matching_children() {
    let tree = sample();
    let filtered = filter(&tree, "bosses");
    assert_eq!(filtered.len(), 1);
    assert!(filtered[0].subsections.is_empty());
}

#[test]
fn test_query_is_trimmed_and_case_insensitive() {
    let tree = sample();
    assert_eq!(filter(&tree, "  POTION ").len(), 1);
    assert!(matches(&tree[0].subsections[0], "FIRE BREATH"));
    assert!(!matches(&tree[0].subsections[1], "fire"));
}

#[test]
fn test_no_match_is_empty() {
    let tree = sample();
    assert!(filter(&tree, "nonexistent").is_empty());
    assert_eq!(surviving_paths(&tree, "nonexistent"), Some(Vec::new()));
}

#[test]
fn test_surviving_paths_point_into_unfiltered_tree() {
    let tree = sample();
    // Golem is the second child, even though it is the only survivor under Bosses
    assert_eq!(
        surviving_paths(&tree, "slow"),
        Some(vec![SectionPath::from([0]), SectionPath::from([0, 1])])
    );
    assert_eq!(
        surviving_paths(&tree, "heal"),
        Some(vec![SectionPath::from([1]), SectionPath::from([1, 0])])
    );
}

#[test]
fn test_filter_is_idempotent() {
    let tree = sample();
    let once = filter(&tree, "o").into_owned();
    let twice = filter(&once, "o").into_owned();
    assert_eq!(once, twice);
}

#[test]
fn test_count_matches_counts_own_hits() {
    let tree = sample();
    // Bosses, Dragon, Golem and Potion; Items has no "o"
    assert_eq!(count_matches(&tree, "o"), 4);
    assert_eq!(count_matches(&tree, ""), 0);
}

/// Titles of `sections` in pre-order.
fn preorder(sections: &[Section], out: &mut Vec<String>) {
    for section in sections {
        out.push(section.title.clone());
        preorder(&section.subsections, out);
    }
}

#[test]
fn test_surviving_paths_walk_the_filtered_tree() {
    let tree = sample();
    for query in ["fire", "o", "BOSSES", "heals", "slow", "items", "nothing here"] {
        let mut expected = Vec::new();
        preorder(&filter(&tree, query), &mut expected);

        let paths = surviving_paths(&tree, query).unwrap();
        let titles: Vec<String> = paths
            .iter()
            .map(|path| crate::tree::get(&tree, path).unwrap().title.clone())
            .collect();
        assert_eq!(titles, expected, "query {query:?}");
    }
}
