//! Data types shared between the crawler engine and the relational store.

use serde::{Deserialize, Serialize};

/// SameSite attribute values as the browser profile stores them.
pub const SAMESITE_NONE: i64 = -1;
pub const SAMESITE_LAX: i64 = 0;
pub const SAMESITE_STRICT: i64 = 1;

/// Cookie CSV column order.
pub const COOKIE_CSV_HEADER: [&str; 12] = [
    "host_key",
    "name",
    "value",
    "path",
    "expires_utc",
    "is_secure",
    "is_httponly",
    "has_expires",
    "is_persistent",
    "priority",
    "samesite",
    "source_scheme",
];

/// Stats CSV column order.
pub const STATS_CSV_HEADER: [&str; 10] = [
    "url",
    "total",
    "session",
    "max_exp_days",
    "avg_exp_days",
    "secure_flag",
    "httponly_flag",
    "samesite_none_flag",
    "samesite_lax_flag",
    "samesite_strict_flag",
];

/// One row of the browser profile cookie database.
///
/// Values are kept exactly as the profile stores them: integer flags and a
/// microsecond expiry counted from 1601-01-01 UTC. Read-only to this
/// system. Every numeric field defaults to 0 so a row missing a column
/// still imports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    #[serde(default)]
    pub host_key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub expires_utc: i64,
    #[serde(default)]
    pub is_secure: i64,
    #[serde(default)]
    pub is_httponly: i64,
    #[serde(default)]
    pub has_expires: i64,
    #[serde(default)]
    pub is_persistent: i64,
    #[serde(default)]
    pub priority: i64,
    /// Tri-state: -1 none, 0 lax, 1 strict.
    #[serde(default)]
    pub samesite: i64,
    #[serde(default)]
    pub source_scheme: i64,
}

impl CookieRecord {
    /// Whether the cookie survives session end.
    pub fn persistent(&self) -> bool {
        self.is_persistent != 0
    }

    pub fn secure(&self) -> bool {
        self.is_secure != 0
    }

    pub fn http_only(&self) -> bool {
        self.is_httponly != 0
    }
}

/// Aggregate metrics over one site visit's cookie set.
///
/// Field order matches the stats CSV schema. No identity of its own beyond
/// (url, date, flow, block_third_party), which the export path and the
/// store supply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CookieStats {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub total: u32,
    /// Non-persistent cookie count.
    #[serde(default)]
    pub session: u32,
    #[serde(default)]
    pub max_exp_days: i64,
    #[serde(default)]
    pub avg_exp_days: i64,
    #[serde(default)]
    pub secure_flag: u32,
    #[serde(default)]
    pub httponly_flag: u32,
    #[serde(default)]
    pub samesite_none_flag: u32,
    #[serde(default)]
    pub samesite_lax_flag: u32,
    #[serde(default)]
    pub samesite_strict_flag: u32,
}
