//! TTL policy table.

use std::time::Duration;

pub const DAY_ENTRIES: Duration = Duration::from_secs(5 * 60);
pub const TAG_ENTRIES: Duration = Duration::from_secs(10 * 60);
pub const SEARCH_RESULT: Duration = Duration::from_secs(15 * 60);
pub const TAGS_LIST: Duration = Duration::from_secs(60 * 60);

pub const RANKING_YEARLY_CURRENT: Duration = Duration::from_secs(60 * 60);
pub const RANKING_YEARLY_PAST: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const RANKING_MONTHLY_CURRENT: Duration = Duration::from_secs(60 * 60);
pub const RANKING_MONTHLY_PAST: Duration = Duration::from_secs(24 * 60 * 60);
pub const RANKING_WEEKLY_CURRENT: Duration = Duration::from_secs(30 * 60);
pub const RANKING_WEEKLY_PAST: Duration = Duration::from_secs(24 * 60 * 60);

/// Max slab size per ranking period: 1000 for yearly, 100 for the shorter
/// periods. Preserve this asymmetry deliberately.
pub const RANKING_MAX_YEARLY: i64 = 1000;
pub const RANKING_MAX_MONTHLY: i64 = 100;
pub const RANKING_MAX_WEEKLY: i64 = 100;

/// Ceiling used by the day-slab store query: "all results" for a single
/// day, bounded to keep the slab finite.
pub const DAY_SLAB_MAX_RESULTS: i64 = 100_000;
