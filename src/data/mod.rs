//! Core data models for reviewrelay
//!
//! This module contains the review data types shared across the retrieval
//! sources, the cache, the persisted store, and the resolver.

pub mod fallback;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default rating assigned when a source does not report one
pub const DEFAULT_RATING: f64 = 5.0;

/// Which retrieval path produced a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Official place-details API
    PlacesApi,
    /// HTML fetch of the public listing page
    ListingPage,
    /// HTML fetch of the alternate listing URL
    AlternateListing,
    /// Bundled static dataset (last-resort fallback)
    Static,
}

/// A single third-party review
///
/// Identifiers are unique within a batch but not guaranteed stable across
/// fetches; a batch wholesale-replaces the previous one, so callers must not
/// key long-lived state on `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Batch-unique identifier
    pub id: String,
    /// Author display name
    pub author: String,
    /// Star rating in the 1-5 range
    pub rating: f64,
    /// Free-text review body
    pub text: String,
    /// Relative or absolute date label as reported by the source
    pub date_label: String,
    /// Author avatar URL, when the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Which retrieval path produced this review
    pub source: Provenance,
    /// When the review was retrieved
    pub retrieved_at: DateTime<Utc>,
}

/// Response shape returned by the (external) HTTP route layer
///
/// Provided here so the route layer and the demo binary agree on the wire
/// format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewsResponse {
    pub success: bool,
    pub data: Vec<Review>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

impl ReviewsResponse {
    /// Wraps a review batch in the route-layer response envelope
    pub fn new(data: Vec<Review>) -> Self {
        Self {
            success: true,
            count: data.len(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Clamps a reported rating into the 1-5 range, defaulting when absent
pub fn normalize_rating(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) if r.is_finite() => r.clamp(1.0, 5.0),
        _ => DEFAULT_RATING,
    }
}

/// Drops review candidates whose trimmed body is shorter than `min_body_len`
///
/// A review with an empty body is never returned to callers; the minimum
/// length defaults to 1, so short-but-real bodies like "ok" survive.
pub fn filter_well_formed(reviews: Vec<Review>, min_body_len: usize) -> Vec<Review> {
    let floor = min_body_len.max(1);
    reviews
        .into_iter()
        .filter(|r| r.text.trim().len() >= floor)
        .collect()
}
