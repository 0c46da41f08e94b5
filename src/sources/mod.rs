//! Review retrieval sources and the ordered fallback chain
//!
//! Each source is one concrete method of pulling reviews from an external
//! system. The executor runs the declared list in priority order (cheapest
//! and most reliable first) and stops at the first source that yields
//! well-formed reviews; individual source failures are logged and skipped,
//! never surfaced to callers.

pub mod listing;
pub mod places;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::data::{filter_well_formed, Provenance, Review};

pub use listing::ListingPageSource;
pub use places::PlacesApiSource;

/// Errors a single retrieval source can produce
///
/// All of these are transient from the chain's perspective: the executor logs
/// them and advances to the next source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream rejected the request (anti-bot block, auth failure, ...)
    #[error("upstream rejected the request with HTTP {0}")]
    Rejected(u16),

    /// Response could not be interpreted
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// One concrete method of retrieving reviews from an external source
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Provenance tag stamped onto reviews this source produces
    fn provenance(&self) -> Provenance;

    /// Attempts one retrieval; may return an empty batch
    async fn fetch(&self) -> Result<Vec<Review>, SourceError>;
}

/// Runs the source chain in order, returning the first non-empty batch
///
/// Each source runs under the given timeout. Errors, timeouts, and empty
/// results advance the chain; when every source is exhausted the result is an
/// empty batch, which callers interpret as "no live data" rather than an
/// error. Accepted reviews are stamped with the winning source's provenance
/// and the retrieval time.
pub async fn fetch_live(
    sources: &[Arc<dyn ReviewSource>],
    min_body_len: usize,
    timeout: Duration,
) -> Vec<Review> {
    for source in sources {
        let attempt = tokio::time::timeout(timeout, source.fetch()).await;

        let batch = match attempt {
            Err(_) => {
                tracing::warn!(source = source.name(), "source timed out");
                continue;
            }
            Ok(Err(e)) => {
                tracing::warn!(source = source.name(), error = %e, "source failed");
                continue;
            }
            Ok(Ok(batch)) => batch,
        };

        let mut accepted = filter_well_formed(batch, min_body_len);
        if accepted.is_empty() {
            tracing::debug!(source = source.name(), "source returned no usable reviews");
            continue;
        }

        let now = Utc::now();
        for review in &mut accepted {
            review.source = source.provenance();
            review.retrieved_at = now;
        }
        tracing::info!(
            source = source.name(),
            count = accepted.len(),
            "live fetch succeeded"
        );
        return accepted;
    }

    tracing::warn!("every retrieval source was exhausted without a result");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source for exercising the chain
    struct FakeSource {
        name: &'static str,
        provenance: Provenance,
        outcome: Outcome,
        calls: AtomicUsize,
    }

    enum Outcome {
        Reviews(Vec<Review>),
        Empty,
        Fails,
        Hangs,
    }

    impl FakeSource {
        fn new(name: &'static str, provenance: Provenance, outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                name,
                provenance,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReviewSource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn provenance(&self) -> Provenance {
            self.provenance
        }

        async fn fetch(&self) -> Result<Vec<Review>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Reviews(reviews) => Ok(reviews.clone()),
                Outcome::Empty => Ok(Vec::new()),
                Outcome::Fails => Err(SourceError::Rejected(403)),
                Outcome::Hangs => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn review(id: &str, text: &str) -> Review {
        Review {
            id: id.to_string(),
            author: "Author".to_string(),
            rating: 5.0,
            text: text.to_string(),
            date_label: "yesterday".to_string(),
            avatar_url: None,
            source: Provenance::Static,
            retrieved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let first = FakeSource::new(
            "first",
            Provenance::PlacesApi,
            Outcome::Reviews(vec![review("a", "Lovely people.")]),
        );
        let second = FakeSource::new("second", Provenance::ListingPage, Outcome::Fails);
        let sources: Vec<Arc<dyn ReviewSource>> = vec![first.clone(), second.clone()];

        let result = fetch_live(&sources, 1, Duration::from_millis(50)).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source, Provenance::PlacesApi);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0, "Chain must short-circuit");
    }

    #[tokio::test]
    async fn test_failures_advance_to_later_source() {
        // Scenario: source 1 errors, source 2 is empty, source 3 yields one review
        let failing = FakeSource::new("failing", Provenance::PlacesApi, Outcome::Fails);
        let empty = FakeSource::new("empty", Provenance::ListingPage, Outcome::Empty);
        let winning = FakeSource::new(
            "winning",
            Provenance::AlternateListing,
            Outcome::Reviews(vec![review("c", "Came through in the end.")]),
        );
        let sources: Vec<Arc<dyn ReviewSource>> = vec![failing, empty, winning];

        let result = fetch_live(&sources, 1, Duration::from_millis(50)).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "c");
        assert_eq!(result[0].source, Provenance::AlternateListing);
    }

    #[tokio::test]
    async fn test_all_exhausted_returns_empty() {
        let failing = FakeSource::new("failing", Provenance::PlacesApi, Outcome::Fails);
        let empty = FakeSource::new("empty", Provenance::ListingPage, Outcome::Empty);
        let sources: Vec<Arc<dyn ReviewSource>> = vec![failing, empty];

        let result = fetch_live(&sources, 1, Duration::from_millis(50)).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_hung_source_times_out_and_chain_continues() {
        let hanging = FakeSource::new("hanging", Provenance::PlacesApi, Outcome::Hangs);
        let winning = FakeSource::new(
            "winning",
            Provenance::ListingPage,
            Outcome::Reviews(vec![review("b", "Recovered after the hang.")]),
        );
        let sources: Vec<Arc<dyn ReviewSource>> = vec![hanging.clone(), winning];

        let result = fetch_live(&sources, 1, Duration::from_millis(50)).await;

        assert_eq!(hanging.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source, Provenance::ListingPage);
    }

    #[tokio::test]
    async fn test_empty_bodies_do_not_count_as_success() {
        let blank = FakeSource::new(
            "blank",
            Provenance::PlacesApi,
            Outcome::Reviews(vec![review("a", ""), review("b", "   ")]),
        );
        let winning = FakeSource::new(
            "winning",
            Provenance::ListingPage,
            Outcome::Reviews(vec![review("c", "ok")]),
        );
        let sources: Vec<Arc<dyn ReviewSource>> = vec![blank, winning];

        let result = fetch_live(&sources, 1, Duration::from_millis(50)).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "ok");
        assert_eq!(result[0].source, Provenance::ListingPage);
    }

    #[tokio::test]
    async fn test_partial_batch_survives_body_filter() {
        let mixed = FakeSource::new(
            "mixed",
            Provenance::PlacesApi,
            Outcome::Reviews(vec![review("a", ""), review("b", "Kept this one.")]),
        );
        let sources: Vec<Arc<dyn ReviewSource>> = vec![mixed];

        let result = fetch_live(&sources, 1, Duration::from_millis(50)).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "b");
    }
}
