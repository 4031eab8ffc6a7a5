use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::Instant;

/// Margin before the upstream expiry at which a token is already treated as expired
pub const TOKEN_EXPIRY_DELTA_SECONDS: i64 = 10;

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Absolute expiry for a relative `expires_in` reported by a token endpoint,
/// None when it falls outside the representable range
pub fn expires_at(expires_in_seconds: i64) -> Option<DateTime<Utc>> {
    ChronoDuration::try_seconds(expires_in_seconds).and_then(|delta| now_utc().checked_add_signed(delta))
}

pub fn get_instant() -> Instant {
    Instant::now()
}
