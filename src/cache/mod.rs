//! In-memory review cache
//!
//! This module provides the time-boxed in-memory cache for the single logical
//! review resource. Expired entries are kept around and stay reachable through
//! [`ReviewCache::any`], allowing the resolver to serve stale data when every
//! live retrieval path is unavailable.

mod memory;

pub use memory::ReviewCache;
