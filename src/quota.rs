//! Live-fetch quota tracking
//!
//! Enforces a fixed budget of live retrieval attempts per calendar day and
//! month. The counters are a hint shared across restarts via the persisted
//! state document, not a hard real-time rate limiter; nothing synchronizes
//! them against concurrent OS processes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DAILY_FETCH_LIMIT, MONTHLY_FETCH_LIMIT};

/// Live fetches counted against a single calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounter {
    /// Period key, `YYYY-MM-DD`
    pub date: String,
    pub count: u32,
}

/// Live fetches counted against a single calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCounter {
    /// Period key, `YYYY-MM`
    pub month: String,
    pub count: u32,
}

/// Formats the daily period key for an instant
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Formats the monthly period key for an instant
pub fn month_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// Fixed daily/monthly budgets for live fetches
///
/// The clock is always passed in, so tests can pin the period keys to fixed
/// instants instead of racing midnight.
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    pub daily_limit: u32,
    pub monthly_limit: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            daily_limit: DAILY_FETCH_LIMIT,
            monthly_limit: MONTHLY_FETCH_LIMIT,
        }
    }
}

impl QuotaPolicy {
    /// Returns how many fetches a counter has spent in the current period
    ///
    /// A counter whose period key no longer matches `now` is stale and counts
    /// as zero; so does an absent counter (fail-open on a fresh install).
    fn spent_daily(daily: Option<&DailyCounter>, now: DateTime<Utc>) -> u32 {
        match daily {
            Some(c) if c.date == day_key(now) => c.count,
            _ => 0,
        }
    }

    fn spent_monthly(monthly: Option<&MonthlyCounter>, now: DateTime<Utc>) -> u32 {
        match monthly {
            Some(c) if c.month == month_key(now) => c.count,
            _ => 0,
        }
    }

    /// Whether a live fetch is still within budget
    ///
    /// False iff either counter has reached its limit for the current period.
    /// Absent or unparseable counter data allows the fetch.
    pub fn can_fetch(
        &self,
        daily: Option<&DailyCounter>,
        monthly: Option<&MonthlyCounter>,
        now: DateTime<Utc>,
    ) -> bool {
        Self::spent_daily(daily, now) < self.daily_limit
            && Self::spent_monthly(monthly, now) < self.monthly_limit
    }

    /// Advances both counters for one successful live fetch
    ///
    /// A counter whose period key changed resets to 1; otherwise it
    /// increments. Called exactly once per successful fetch, never per
    /// attempt.
    pub fn record(
        &self,
        daily: Option<&DailyCounter>,
        monthly: Option<&MonthlyCounter>,
        now: DateTime<Utc>,
    ) -> (DailyCounter, MonthlyCounter) {
        let daily = DailyCounter {
            date: day_key(now),
            count: Self::spent_daily(daily, now) + 1,
        };
        let monthly = MonthlyCounter {
            month: month_key(now),
            count: Self::spent_monthly(monthly, now) + 1,
        };
        (daily, monthly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_can_fetch_with_no_counters() {
        let policy = QuotaPolicy::default();
        assert!(policy.can_fetch(None, None, at(2026, 8, 29)));
    }

    #[test]
    fn test_can_fetch_below_limits() {
        let policy = QuotaPolicy { daily_limit: 10, monthly_limit: 300 };
        let now = at(2026, 8, 29);
        let daily = DailyCounter { date: day_key(now), count: 9 };
        let monthly = MonthlyCounter { month: month_key(now), count: 299 };
        assert!(policy.can_fetch(Some(&daily), Some(&monthly), now));
    }

    #[test]
    fn test_daily_limit_blocks_fetch() {
        let policy = QuotaPolicy { daily_limit: 10, monthly_limit: 300 };
        let now = at(2026, 8, 29);
        let daily = DailyCounter { date: day_key(now), count: 10 };
        assert!(!policy.can_fetch(Some(&daily), None, now));
    }

    #[test]
    fn test_monthly_limit_blocks_fetch() {
        let policy = QuotaPolicy { daily_limit: 10, monthly_limit: 300 };
        let now = at(2026, 8, 29);
        let monthly = MonthlyCounter { month: month_key(now), count: 300 };
        assert!(!policy.can_fetch(None, Some(&monthly), now));
    }

    #[test]
    fn test_stale_daily_counter_counts_as_zero() {
        let policy = QuotaPolicy { daily_limit: 1, monthly_limit: 300 };
        let daily = DailyCounter { date: "2026-08-28".to_string(), count: 1 };
        assert!(policy.can_fetch(Some(&daily), None, at(2026, 8, 29)));
    }

    #[test]
    fn test_stale_monthly_counter_counts_as_zero() {
        let policy = QuotaPolicy { daily_limit: 10, monthly_limit: 1 };
        let monthly = MonthlyCounter { month: "2026-07".to_string(), count: 1 };
        assert!(policy.can_fetch(None, Some(&monthly), at(2026, 8, 29)));
    }

    #[test]
    fn test_record_increments_within_period() {
        let policy = QuotaPolicy::default();
        let now = at(2026, 8, 29);
        let daily = DailyCounter { date: day_key(now), count: 3 };
        let monthly = MonthlyCounter { month: month_key(now), count: 40 };
        let (d, m) = policy.record(Some(&daily), Some(&monthly), now);
        assert_eq!(d.count, 4);
        assert_eq!(m.count, 41);
    }

    #[test]
    fn test_record_resets_on_period_change() {
        let policy = QuotaPolicy::default();
        let daily = DailyCounter { date: "2026-08-28".to_string(), count: 7 };
        let monthly = MonthlyCounter { month: "2026-07".to_string(), count: 120 };
        let (d, m) = policy.record(Some(&daily), Some(&monthly), at(2026, 8, 29));
        assert_eq!(d, DailyCounter { date: "2026-08-29".to_string(), count: 1 });
        assert_eq!(m, MonthlyCounter { month: "2026-08".to_string(), count: 1 });
    }

    #[test]
    fn test_record_starts_fresh_counters() {
        let policy = QuotaPolicy::default();
        let now = at(2026, 1, 1);
        let (d, m) = policy.record(None, None, now);
        assert_eq!(d.count, 1);
        assert_eq!(m.count, 1);
        assert_eq!(d.date, "2026-01-01");
        assert_eq!(m.month, "2026-01");
    }

    #[test]
    fn test_counter_serialization_roundtrip() {
        let daily = DailyCounter { date: "2026-08-29".to_string(), count: 5 };
        let json = serde_json::to_string(&daily).expect("Failed to serialize counter");
        let back: DailyCounter = serde_json::from_str(&json).expect("Failed to deserialize counter");
        assert_eq!(back, daily);
    }
}
