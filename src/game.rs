//! Games are the root containers of the guide: metadata plus a forest of sections.

use crate::section::Section;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Glyph shown for a game that has no cover image.
pub const DEFAULT_ICON: &str = "🎮";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// One counted visit, kept for de-duplication.
pub struct ViewRecord {
    /// Client address the visit came from.
    pub ip: String,
    /// When the visit was counted.
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A guide entry and the section tree that documents it.
pub struct Game {
    /// Store-assigned identifier.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Short glyph used when there is no cover image.
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Cover image location; preferred over `icon` when present.
    pub image_url: Option<String>,
    /// Display name.
    pub name: String,
    #[serde(default)]
    /// One-line description.
    pub desc: String,
    #[serde(default)]
    /// Forest root of the guide.
    pub sections: Vec<Section>,
    #[serde(default)]
    /// Number of counted visits; only the view counter changes it.
    pub click_count: u64,
    #[serde(default, rename = "viewedIPs")]
    /// Recent visits used to avoid double counting.
    pub viewed_ips: Vec<ViewRecord>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time the record was written.
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What to show as the game's picture.
pub enum Glyph<'a> {
    /// Cover image URL.
    Image(&'a str),
    /// Text glyph.
    Icon(&'a str),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Editable metadata of a game.
pub struct GameDetails {
    /// Short glyph; blank falls back to [`DEFAULT_ICON`].
    pub icon: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub desc: String,
}

impl Game {
    #[must_use]
    /// A fresh game with no sections and no visits.
    pub fn new(details: GameDetails, image_url: Option<String>, now: DateTime<Utc>) -> Self {
        let icon = if details.icon.trim().is_empty() {
            DEFAULT_ICON.to_string()
        } else {
            details.icon
        };
        Self {
            id: Uuid::new_v4().to_string(),
            icon: Some(icon),
            image_url,
            name: details.name,
            desc: details.desc,
            sections: Vec::new(),
            click_count: 0,
            viewed_ips: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    /// Cover image if present, otherwise the icon (or the default icon).
    pub fn glyph(&self) -> Glyph<'_> {
        match (&self.image_url, &self.icon) {
            (Some(url), _) if !url.is_empty() => Glyph::Image(url),
            (_, Some(icon)) if !icon.is_empty() => Glyph::Icon(icon),
            _ => Glyph::Icon(DEFAULT_ICON),
        }
    }

    #[must_use]
    /// Current metadata as an editable value.
    pub fn details(&self) -> GameDetails {
        GameDetails {
            icon: self.icon.clone().unwrap_or_default(),
            name: self.name.clone(),
            desc: self.desc.clone(),
        }
    }
}
