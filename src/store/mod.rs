//! Persisted state for reviews and quota counters
//!
//! This module persists the single JSON state document that survives process
//! restarts: the last successful review batch plus the daily/monthly quota
//! counters. A corrupt or partially written file is treated as absent so the
//! service reinitializes from defaults instead of failing.

mod state;

pub use state::{PersistedState, StateStore};
