//! Section representation for game guide trees.
//!
//! A section is one node of a guide: a titled block of text that may point at
//! out-of-band images and callout boxes through inline markers, and that may
//! nest further sections beneath it. Sections carry no identifiers; their
//! position in the tree is their address (see [`crate::path`]).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Image attached to a section, referenced from content as `[resim:N]`.
pub struct SectionImage {
    /// Location returned by the blob store at upload time.
    pub url: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Visual flavour of a callout box.
pub enum CalloutKind {
    #[default]
    /// Neutral information.
    Info,
    /// Something the reader should be careful about.
    Warn,
    /// An aside.
    Note,
}

impl CalloutKind {
    /// All kinds in display order.
    pub const ALL: [Self; 3] = [Self::Info, Self::Warn, Self::Note];

    #[must_use]
    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Note => "note",
        }
    }

    #[must_use]
    /// Parses a wire name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for CalloutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Highlighted note block, referenced from content as `[kutu:N]`.
pub struct Callout {
    #[serde(rename = "type", default)]
    /// Styling of the box.
    pub kind: CalloutKind,
    #[serde(default)]
    /// Short heading shown in the box.
    pub title: String,
    #[serde(default)]
    /// Body text of the box.
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Hierarchical division of a guide with its attached assets.
pub struct Section {
    /// Heading text; never empty for sections created through the editor.
    pub title: String,
    #[serde(default)]
    /// Body text, possibly containing `[resim:N]` and `[kutu:N]` markers.
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    /// Images in upload order; markers address them 1-based.
    pub images: Vec<SectionImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    /// Callouts in creation order; markers address them 1-based.
    pub callouts: Vec<Callout>,
    #[serde(default)]
    /// Directly nested sections in display order.
    pub subsections: Vec<Section>,
}

impl Section {
    #[must_use]
    /// A leaf section with only a title and body.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    /// Replaces the nested sections.
    pub fn with_subsections(mut self, subsections: Vec<Section>) -> Self {
        self.subsections = subsections;
        self
    }

    #[must_use]
    /// Number of sections in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .subsections
            .iter()
            .map(Section::subtree_len)
            .sum::<usize>()
    }
}

/// Replaces empty bodies with a single space throughout a forest.
///
/// Stored sections always carry content; editors may submit an empty body.
pub fn normalize_empty_content(sections: &mut [Section]) {
    for section in sections {
        if section.content.is_empty() {
            section.content = " ".to_string();
        }
        normalize_empty_content(&mut section.subsections);
    }
}

#[cfg(test)]
#[path = "tests/section.rs"]
mod tests;
