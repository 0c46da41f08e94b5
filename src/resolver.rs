//! Top-level review resolution
//!
//! `ReviewService` owns the cache, the persisted store, the quota policy, and
//! the source chain, and wires them into the degradation ladder: fresh cache,
//! then a quota-gated live fetch, then stale data, then the bundled static
//! dataset. `resolve` is total — every failure path lands on some batch, and
//! no error escapes to the caller.

use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::cache::ReviewCache;
use crate::config::Config;
use crate::data::{fallback, Review};
use crate::quota::QuotaPolicy;
use crate::sources::{self, ListingPageSource, PlacesApiSource, ReviewSource};
use crate::store::{PersistedState, StateStore};

/// The shared in-flight live fetch, when one is running
type InFlightFetch = Shared<BoxFuture<'static, Vec<Review>>>;

/// Entry point for review retrieval
///
/// Cheap to clone; clones share the same cache, store, and in-flight state.
#[derive(Clone)]
pub struct ReviewService {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    quota: QuotaPolicy,
    store: StateStore,
    cache: Mutex<ReviewCache>,
    sources: Vec<Arc<dyn ReviewSource>>,
    /// Concurrent resolve calls coalesce onto this future instead of
    /// double-spending quota on duplicate fetches
    in_flight: Mutex<Option<InFlightFetch>>,
}

impl ReviewService {
    /// Creates a service with the source chain derived from configuration
    ///
    /// The official API source is registered only when both a key and a place
    /// id are configured; listing page sources only when their URLs are. The
    /// cache is hydrated from the persisted state document, so a restart
    /// inside the TTL window serves the previous batch without a fetch.
    pub fn new(config: Config, store: StateStore) -> Self {
        let client = Client::new();
        let mut sources: Vec<Arc<dyn ReviewSource>> = Vec::new();

        if let (Some(key), Some(place_id)) = (&config.api_key, &config.place_id) {
            sources.push(Arc::new(PlacesApiSource::new(
                client.clone(),
                key.as_str(),
                place_id.as_str(),
            )));
        }
        if let Some(url) = &config.listing_url {
            sources.push(Arc::new(ListingPageSource::primary(
                client.clone(),
                url.as_str(),
            )));
        }
        if let Some(url) = &config.alternate_listing_url {
            sources.push(Arc::new(ListingPageSource::alternate(client, url.as_str())));
        }

        Self::with_sources(config, store, sources)
    }

    /// Creates a service with an explicit source chain
    ///
    /// This is the seam tests use to inject scripted sources.
    pub fn with_sources(
        config: Config,
        store: StateStore,
        sources: Vec<Arc<dyn ReviewSource>>,
    ) -> Self {
        let mut cache = ReviewCache::new(config.cache_ttl);
        if let Some(state) = store.load() {
            if let Some(timestamp) = state.timestamp {
                if !state.reviews.is_empty() {
                    cache.set(state.reviews, timestamp);
                }
            }
        }

        let quota = QuotaPolicy {
            daily_limit: config.daily_limit,
            monthly_limit: config.monthly_limit,
        };

        Self {
            inner: Arc::new(Inner {
                config,
                quota,
                store,
                cache: Mutex::new(cache),
                sources,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Resolves the current review batch
    ///
    /// With `force_refresh` the cache check is skipped and a live fetch is
    /// attempted regardless of freshness (still subject to quota). The result
    /// is always some batch; callers can inspect each review's provenance to
    /// tell live data from degraded data.
    pub async fn resolve(&self, force_refresh: bool) -> Vec<Review> {
        let now = Utc::now();

        if !force_refresh {
            let cache = self.inner.cache.lock().await;
            if let Some(fresh) = cache.fresh(now) {
                tracing::debug!(count = fresh.len(), "serving fresh cached reviews");
                return fresh.to_vec();
            }
        }

        let state = self.inner.store.load();
        let (daily, monthly) = match &state {
            Some(s) => (s.daily_count.as_ref(), s.monthly_count.as_ref()),
            None => (None, None),
        };

        if self.inner.quota.can_fetch(daily, monthly, now) {
            let live = self.shared_live_fetch().await;
            if !live.is_empty() {
                return live;
            }
        } else {
            tracing::info!("live fetch quota exhausted, serving degraded data");
        }

        self.degraded().await
    }

    /// Runs (or joins) the single in-flight live fetch
    async fn shared_live_fetch(&self) -> Vec<Review> {
        let fetch = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.as_ref() {
                Some(existing) => {
                    tracing::debug!("joining in-flight live fetch");
                    existing.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let fetch = async move {
                        let result = Inner::fetch_and_persist(&inner).await;
                        *inner.in_flight.lock().await = None;
                        result
                    }
                    .boxed()
                    .shared();
                    *in_flight = Some(fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Returns the most recent known batch regardless of freshness
    async fn degraded(&self) -> Vec<Review> {
        {
            let cache = self.inner.cache.lock().await;
            if let Some(stale) = cache.any() {
                tracing::info!(count = stale.len(), "serving stale cached reviews");
                return stale.to_vec();
            }
        }

        if let Some(state) = self.inner.store.load() {
            if !state.reviews.is_empty() {
                tracing::info!(count = state.reviews.len(), "serving persisted reviews");
                return state.reviews;
            }
        }

        tracing::warn!("no cached or persisted reviews, serving static dataset");
        fallback::static_reviews()
    }
}

impl Inner {
    /// Runs the source chain; on success records quota, updates the cache,
    /// and rewrites the persisted state document
    ///
    /// Persistence failures are logged and swallowed — the fetched batch is
    /// still served from memory.
    async fn fetch_and_persist(inner: &Arc<Inner>) -> Vec<Review> {
        let reviews = sources::fetch_live(
            &inner.sources,
            inner.config.min_body_len,
            inner.config.source_timeout,
        )
        .await;
        if reviews.is_empty() {
            return reviews;
        }

        let now = Utc::now();
        inner.cache.lock().await.set(reviews.clone(), now);

        let previous = inner.store.load().unwrap_or_default();
        let (daily, monthly) = inner.quota.record(
            previous.daily_count.as_ref(),
            previous.monthly_count.as_ref(),
            now,
        );
        let state = PersistedState {
            timestamp: Some(now),
            reviews: reviews.clone(),
            daily_count: Some(daily),
            monthly_count: Some(monthly),
        };
        if let Err(e) = inner.store.save(&state) {
            tracing::warn!(error = %e, "failed to persist review state");
        }

        reviews
    }
}
