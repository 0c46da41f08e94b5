//! Public listing page source
//!
//! Fetches the raw HTML of a public business-listing page and pulls review
//! fragments out of whatever JSON the page embeds. The scanner works on plain
//! byte offsets with no DOM and no layout assumptions, so it keeps working on
//! partial or garbled markup; anything it cannot decode is skipped.
//!
//! Listing pages sit behind anti-automation defenses, so requests carry
//! realistic browser headers. A block (403/429) is reported as a rejection and
//! the chain moves on.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;

use crate::data::{normalize_rating, Provenance, Review};

use super::{ReviewSource, SourceError};

/// Browser identity sent with listing page requests
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

/// JSON keys that carry a review body
const BODY_KEYS: &[&str] = &["reviewBody", "review_text", "text"];

/// JSON keys that carry an author display name
const AUTHOR_KEYS: &[&str] = &["author_name", "name"];

/// JSON keys that carry a star rating
const RATING_KEYS: &[&str] = &["ratingValue", "rating", "starRating"];

/// JSON keys that carry a date label
const DATE_KEYS: &[&str] = &["relative_time_description", "datePublished", "relativeTime"];

/// JSON keys that carry an avatar URL
const AVATAR_KEYS: &[&str] = &["profile_photo_url", "image"];

/// Fallback context around a body hit when no enclosing object is found
const CONTEXT_WINDOW: usize = 600;

/// How far the brace scan walks before giving up
const SCAN_CAP: usize = 2000;

/// Review source that scrapes a public listing page
#[derive(Debug, Clone)]
pub struct ListingPageSource {
    client: Client,
    url: String,
    name: &'static str,
    provenance: Provenance,
}

impl ListingPageSource {
    /// Creates the primary listing page source
    pub fn primary(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            name: "listing_page",
            provenance: Provenance::ListingPage,
        }
    }

    /// Creates the alternate-URL variant, tried last in the chain
    pub fn alternate(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            name: "alternate_listing",
            provenance: Provenance::AlternateListing,
        }
    }
}

#[async_trait]
impl ReviewSource for ListingPageSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn provenance(&self) -> Provenance {
        self.provenance
    }

    async fn fetch(&self) -> Result<Vec<Review>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Rejected(status.as_u16()));
        }

        let html = response.text().await?;
        Ok(extract_reviews(&html, self.provenance))
    }
}

/// Pulls review candidates out of raw page markup
///
/// Scans for JSON string values under known body keys. For each hit the
/// enclosing JSON object (balanced braces around the key) bounds the search
/// for the review's other fields; when braces are missing or broken, a fixed
/// byte window around the hit is used instead. Hits with neither an author
/// nor a rating in scope are discarded as non-review strings, and duplicate
/// bodies (the same review embedded more than once) collapse to one
/// candidate.
///
/// Candidates are tagged with the calling source's provenance, so a direct
/// `fetch()` on the alternate-URL variant already carries the right tag.
pub(crate) fn extract_reviews(html: &str, provenance: Provenance) -> Vec<Review> {
    let now = Utc::now();
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for key in BODY_KEYS {
        for (pos, body) in scan_string_values(html, key) {
            let trimmed = body.trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_string()) {
                continue;
            }

            let region = match enclosing_object(html, pos) {
                Some((start, end)) => &html[start..end],
                None => {
                    let lo = clamp_floor(html, pos.saturating_sub(CONTEXT_WINDOW));
                    let hi = clamp_ceil(html, (pos + CONTEXT_WINDOW).min(html.len()));
                    &html[lo..hi]
                }
            };

            let author = find_string(region, AUTHOR_KEYS);
            let rating = find_number(region, RATING_KEYS);
            if author.is_none() && rating.is_none() {
                // A bare string under a generic key is not evidence of a review
                continue;
            }

            out.push(Review {
                id: format!("listing-{}", out.len() + 1),
                author: author.unwrap_or_else(|| "Anonymous".to_string()),
                rating: normalize_rating(rating),
                text: trimmed.to_string(),
                date_label: find_string(region, DATE_KEYS).unwrap_or_default(),
                avatar_url: find_string(region, AVATAR_KEYS),
                source: provenance,
                retrieved_at: now,
            });
        }
    }

    out
}

/// Finds every `"key": "<string>"` occurrence and decodes the value
///
/// Returns (byte position of the key, decoded value) pairs. Occurrences whose
/// value is not a decodable JSON string are skipped.
fn scan_string_values(hay: &str, key: &str) -> Vec<(usize, String)> {
    let needle = format!("\"{key}\"");
    let bytes = hay.as_bytes();
    let mut out = Vec::new();
    let mut at = 0;

    while let Some(rel) = hay[at..].find(&needle) {
        let key_pos = at + rel;
        at = key_pos + needle.len();

        let mut i = at;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b':' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'"' {
            if let Some(value) = decode_json_string(hay, i) {
                out.push((key_pos, value));
            }
        }
    }

    out
}

/// Decodes the JSON string literal starting at `open_quote`
///
/// Walks bytes honoring backslash escapes to find the closing quote, then
/// lets serde_json handle the unescaping. Unterminated or invalid literals
/// yield `None`.
fn decode_json_string(hay: &str, open_quote: usize) -> Option<String> {
    let bytes = hay.as_bytes();
    let mut i = open_quote + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => {
                let raw = &hay[open_quote..=i];
                return serde_json::from_str::<String>(raw).ok();
            }
            _ => i += 1,
        }
    }
    None
}

/// Bounds of the JSON object enclosing `pos`, if braces balance
///
/// The backward walk does not track string state, so a brace inside an
/// earlier string value can fool it; the scanner stays best-effort either
/// way, since a wrong region at worst drops or mislabels one candidate.
fn enclosing_object(hay: &str, pos: usize) -> Option<(usize, usize)> {
    let bytes = hay.as_bytes();
    let start = object_start(bytes, pos)?;
    let end = object_end(bytes, start)?;
    if pos < end {
        Some((start, end))
    } else {
        None
    }
}

/// Walks backward from `pos` to the opening brace of the enclosing object
fn object_start(bytes: &[u8], pos: usize) -> Option<usize> {
    let lo = pos.saturating_sub(SCAN_CAP);
    let mut depth = 0usize;
    let mut i = pos;

    while i > lo {
        i -= 1;
        match bytes[i] {
            b'}' => depth += 1,
            b'{' if depth == 0 => return Some(i),
            b'{' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Walks forward from an opening brace to its matching close, skipping strings
fn object_end(bytes: &[u8], start: usize) -> Option<usize> {
    let hi = (start + 2 * SCAN_CAP).min(bytes.len());
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = start;

    while i < hi {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// First non-empty string value under any of `keys`, in key priority order
fn find_string(region: &str, keys: &[&str]) -> Option<String> {
    for key in keys {
        for (_, value) in scan_string_values(region, key) {
            if !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

/// First numeric value under any of `keys`, in key priority order
///
/// Accepts bare numbers and quoted numbers (schema.org embeds often quote
/// `ratingValue`).
fn find_number(region: &str, keys: &[&str]) -> Option<f64> {
    let bytes = region.as_bytes();
    for key in keys {
        let needle = format!("\"{key}\"");
        let Some(pos) = region.find(&needle) else {
            continue;
        };

        let mut i = pos + needle.len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b':' {
            continue;
        }
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'"') {
            i += 1;
        }

        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
            i += 1;
        }
        if i > start {
            if let Ok(value) = region[start..i].parse::<f64>() {
                return Some(value);
            }
        }
    }
    None
}

/// Moves an index down to the nearest UTF-8 character boundary
fn clamp_floor(hay: &str, mut i: usize) -> usize {
    while i > 0 && !hay.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Moves an index up to the nearest UTF-8 character boundary
fn clamp_ceil(hay: &str, mut i: usize) -> usize {
    while i < hay.len() && !hay.is_char_boundary(i) {
        i += 1;
    }
    i
}
