//! Static fallback review dataset
//!
//! Hand-curated reviews served when no live, cached, or persisted data is
//! available. The dataset is versioned so it can be refreshed without touching
//! resolver logic.

use chrono::Utc;

use super::{Provenance, Review};

/// Version of the bundled dataset, bumped whenever the entries change
pub const STATIC_DATASET_VERSION: u32 = 1;

/// Curated (author, rating, body, date label) entries
const STATIC_REVIEWS: &[(&str, f64, &str, &str)] = &[
    (
        "Marianne Dubois",
        5.0,
        "Outstanding service from start to finish. The team was responsive, \
         professional, and delivered exactly what was promised.",
        "2 months ago",
    ),
    (
        "Tom Verstraete",
        5.0,
        "Very happy with the result. Clear communication throughout and the \
         follow-up after delivery was a nice touch.",
        "3 months ago",
    ),
    (
        "Els Janssens",
        4.0,
        "Good experience overall. Scheduling took a little longer than \
         expected but the quality of the work made up for it.",
        "4 months ago",
    ),
    (
        "Peter De Smet",
        5.0,
        "Friendly, knowledgeable and fair pricing. Would not hesitate to \
         recommend them to friends and family.",
        "6 months ago",
    ),
    (
        "Sofie Lemmens",
        5.0,
        "They went out of their way to answer all our questions. Everything \
         was handled quickly and correctly.",
        "8 months ago",
    ),
];

/// Builds the bundled static review batch
///
/// Reviews are tagged with [`Provenance::Static`] and stamped with the current
/// time so callers can tell they are not live data.
pub fn static_reviews() -> Vec<Review> {
    let now = Utc::now();
    STATIC_REVIEWS
        .iter()
        .enumerate()
        .map(|(i, (author, rating, text, date_label))| Review {
            id: format!("static-{}", i + 1),
            author: (*author).to_string(),
            rating: *rating,
            text: (*text).to_string(),
            date_label: (*date_label).to_string(),
            avatar_url: None,
            source: Provenance::Static,
            retrieved_at: now,
        })
        .collect()
}
