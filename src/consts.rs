pub const AK: &str = "ak";
pub const ACCESS_TS: &str = "accessTs";
pub const SECRET: &str = "secret";

pub const DEFAULT_LIVE_MINUTES: i64 = 2;
/// Malformed timestamps are treated as this old, so they always fail liveness.
pub const STALE_FALLBACK_SECS: i64 = 7 * 24 * 60 * 60;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
