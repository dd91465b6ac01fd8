//! Inline reference markers binding section text to its images and callouts.
//!
//! Content is free text in which `[resim:N]` stands for the section's N-th
//! image and `[kutu:N]` for its N-th callout, both counted from 1. These two
//! token shapes are the whole grammar: anything else, including malformed
//! tokens, is plain text. Resolution is total; a marker pointing past the end
//! of its array yields [`Segment::Unresolved`] rather than an error, since
//! authored text routinely drifts from the asset lists as they are edited.

use crate::section::{Callout, Section, SectionImage};

const IMAGE_PREFIX: &str = "[resim:";
const CALLOUT_PREFIX: &str = "[kutu:";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Which sidecar array a marker addresses.
pub enum MarkerKind {
    /// `[resim:N]`, addressing `images`.
    Image,
    /// `[kutu:N]`, addressing `callouts`.
    Callout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// One piece of rendered content, in source order.
pub enum Segment<'a> {
    /// Literal text between markers.
    Plain(&'a str),
    /// An image marker that resolved.
    Image(&'a SectionImage),
    /// A callout marker that resolved.
    Callout(&'a Callout),
    /// A marker with no matching asset; renderers drop it. Holds the raw token.
    Unresolved(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Token<'a> {
    kind: MarkerKind,
    digits: &'a str,
    raw: &'a str,
}

impl<'a> Token<'a> {
    /// Parses a token at the very start of `text`.
    fn parse(text: &'a str) -> Option<Self> {
        let (kind, after) = if let Some(after) = text.strip_prefix(IMAGE_PREFIX) {
            (MarkerKind::Image, after)
        } else if let Some(after) = text.strip_prefix(CALLOUT_PREFIX) {
            (MarkerKind::Callout, after)
        } else {
            return None;
        };
        let digit_len = after.bytes().take_while(u8::is_ascii_digit).count();
        if digit_len == 0 || !after[digit_len..].starts_with(']') {
            return None;
        }
        let raw_len = text.len() - after.len() + digit_len + 1;
        Some(Self {
            kind,
            digits: &after[..digit_len],
            raw: &text[..raw_len],
        })
    }

    /// Zero-based index, or `None` for `0` or numbers too large to address anything.
    fn index(&self) -> Option<usize> {
        self.digits.parse::<usize>().ok()?.checked_sub(1)
    }
}

/// Finds the leftmost token in `text` and its byte offset.
fn next_token(text: &str) -> Option<(usize, Token<'_>)> {
    text.match_indices('[')
        .find_map(|(at, _)| Token::parse(&text[at..]).map(|token| (at, token)))
}

#[derive(Clone, Debug)]
/// Lazy, single-pass segmentation of a section body. See [`resolve`].
pub struct Segments<'a> {
    rest: &'a str,
    images: &'a [SectionImage],
    callouts: &'a [Callout],
    queued: Option<Segment<'a>>,
}

impl<'a> Segments<'a> {
    fn lookup(&self, token: Token<'a>) -> Segment<'a> {
        let index = token.index();
        let resolved = match token.kind {
            MarkerKind::Image => index
                .and_then(|i| self.images.get(i))
                .map(Segment::Image),
            MarkerKind::Callout => index
                .and_then(|i| self.callouts.get(i))
                .map(Segment::Callout),
        };
        resolved.unwrap_or(Segment::Unresolved(token.raw))
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(segment) = self.queued.take() {
            return Some(segment);
        }
        if self.rest.is_empty() {
            return None;
        }
        let Some((at, token)) = next_token(self.rest) else {
            let plain = self.rest;
            self.rest = "";
            return Some(Segment::Plain(plain));
        };
        let plain = &self.rest[..at];
        self.rest = &self.rest[at + token.raw.len()..];
        let marker = self.lookup(token);
        if plain.is_empty() {
            Some(marker)
        } else {
            self.queued = Some(marker);
            Some(Segment::Plain(plain))
        }
    }
}

#[must_use]
/// Splits `content` into plain text and resolved marker segments.
///
/// Markers are matched left to right without overlap. Empty text between
/// adjacent markers produces no segment.
pub fn resolve<'a>(
    content: &'a str,
    images: &'a [SectionImage],
    callouts: &'a [Callout],
) -> Segments<'a> {
    Segments {
        rest: content,
        images,
        callouts,
        queued: None,
    }
}

#[must_use]
/// Segments of a section's own body against its own assets.
pub fn resolve_section(section: &Section) -> Segments<'_> {
    resolve(&section.content, &section.images, &section.callouts)
}

#[must_use]
/// Raw text of every marker in the section body that resolves to nothing.
pub fn unresolved(section: &Section) -> Vec<&str> {
    resolve_section(section)
        .filter_map(|segment| match segment {
            Segment::Unresolved(raw) => Some(raw),
            _ => None,
        })
        .collect()
}

#[must_use]
/// Marker text for the `number`-th (1-based) asset of `kind`.
pub fn marker(kind: MarkerKind, number: usize) -> String {
    match kind {
        MarkerKind::Image => format!("{IMAGE_PREFIX}{number}]"),
        MarkerKind::Callout => format!("{CALLOUT_PREFIX}{number}]"),
    }
}

#[cfg(test)]
#[path = "tests/markers.rs"]
mod tests;
