/// Application name
pub const APP_NAME: &str = "Referral Network";

/// Base path of every REST route
pub const API_BASE: &str = "/api";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Maximum request body size in bytes (1 MiB)
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Number of activities returned by the feed when no limit is given
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

/// Upper bound accepted for `?limit=` on the activity feed
pub const MAX_ACTIVITY_LIMIT: usize = 1000;

/// Maximum length of short text fields (names, titles, emails)
pub const MAX_SHORT_TEXT: usize = 255;

/// Maximum length of free-text fields (notes, claims, descriptions)
pub const MAX_LONG_TEXT: usize = 10_000;

/// Upper bound for the campaign `leads` and `conversions` counters
pub const MAX_COUNTER: i64 = 1_000_000_000;

/// Fractional digits kept on monetary amounts
pub const MONEY_SCALE: u32 = 2;
