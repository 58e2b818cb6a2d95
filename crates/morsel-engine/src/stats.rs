//! Pure derivation of aggregate cookie statistics.

use chrono::{DateTime, Utc};

use morsel_common::protocol::{
    CookieRecord, CookieStats, SAMESITE_LAX, SAMESITE_NONE, SAMESITE_STRICT,
};

/// Seconds between the cookie epoch (1601-01-01) and the Unix epoch.
const COOKIE_EPOCH_TO_UNIX_SECS: i64 = 11_644_473_600;

const SECS_PER_DAY: i64 = 86_400;

/// Signed whole-day distance between a cookie expiry and `now`, floored
/// toward negative infinity. `expires_utc` counts microseconds from the
/// cookie epoch.
pub fn expiration_days(expires_utc: i64, now: DateTime<Utc>) -> i64 {
    let expires_unix = expires_utc / 1_000_000 - COOKIE_EPOCH_TO_UNIX_SECS;
    (expires_unix - now.timestamp()).div_euclid(SECS_PER_DAY)
}

/// Compute the statistics for one site visit's cookie set.
pub fn cookie_stats(cookies: &[CookieRecord], url: &str) -> CookieStats {
    cookie_stats_at(cookies, url, Utc::now())
}

/// As [`cookie_stats`], with an explicit reference instant.
pub fn cookie_stats_at(cookies: &[CookieRecord], url: &str, now: DateTime<Utc>) -> CookieStats {
    let total = cookies.len() as u32;
    let session = cookies.iter().filter(|c| !c.persistent()).count() as u32;

    let horizons: Vec<i64> = cookies
        .iter()
        .filter(|c| c.persistent())
        .map(|c| expiration_days(c.expires_utc, now))
        .collect();
    let (max_exp_days, avg_exp_days) = if horizons.is_empty() {
        (0, 0)
    } else {
        let max = horizons.iter().copied().max().unwrap_or(0);
        let mean = horizons.iter().sum::<i64>() as f64 / horizons.len() as f64;
        // nearest integer, ties away from zero
        (max, mean.round() as i64)
    };

    let secure_flag = cookies.iter().filter(|c| c.secure()).count() as u32;
    let httponly_flag = cookies.iter().filter(|c| c.http_only()).count() as u32;

    CookieStats {
        url: url.to_string(),
        total,
        session,
        max_exp_days,
        avg_exp_days,
        secure_flag,
        httponly_flag,
        samesite_none_flag: count_samesite(cookies, SAMESITE_NONE),
        samesite_lax_flag: count_samesite(cookies, SAMESITE_LAX),
        samesite_strict_flag: count_samesite(cookies, SAMESITE_STRICT),
    }
}

fn count_samesite(cookies: &[CookieRecord], value: i64) -> u32 {
    // values outside {-1, 0, 1} land in no bucket
    cookies.iter().filter(|c| c.samesite == value).count() as u32
}
