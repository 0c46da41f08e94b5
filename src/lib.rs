//! reviewrelay library
//!
//! Best-effort retrieval of third-party business reviews from unreliable,
//! rate-limited upstreams: an ordered chain of sources (official API, listing
//! page scrape, alternate-URL scrape) behind a fixed fetch quota, a time-boxed
//! cache, and degradation to stale or static data when everything else fails.
//!
//! The [`resolver::ReviewService`] is the entry point; the HTTP route layer
//! that exposes it is an external collaborator.

pub mod cache;
pub mod config;
pub mod data;
pub mod quota;
pub mod resolver;
pub mod sources;
pub mod store;
