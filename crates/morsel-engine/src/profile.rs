//! Browser profile lifecycle and cookie capture.
//!
//! The profile directory is exclusively owned by the currently executing
//! site's flow: it is deleted and recreated before each session, so one
//! site never sees another site's cookies.

use std::io;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;
use tracing::info;

use morsel_common::protocol::CookieRecord;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("cookie database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Delete and recreate the profile directory. Must run before the session
/// for the next site is created.
pub fn reset(profile_dir: &Path) -> io::Result<()> {
    if profile_dir.exists() {
        std::fs::remove_dir_all(profile_dir)?;
    }
    std::fs::create_dir_all(profile_dir)
}

/// Remove the profile directory entirely (end-of-run cleanup).
pub fn remove(profile_dir: &Path) -> io::Result<()> {
    if profile_dir.exists() {
        std::fs::remove_dir_all(profile_dir)?;
    }
    Ok(())
}

const COOKIE_QUERY: &str = "SELECT host_key, name, value, path, expires_utc, is_secure, \
     is_httponly, has_expires, is_persistent, priority, samesite, source_scheme \
     FROM cookies ORDER BY host_key, expires_utc DESC";

/// Read every cookie the visit left in the profile's cookie database.
pub fn read_cookies(profile_dir: &Path) -> Result<Vec<CookieRecord>, ProfileError> {
    let db = profile_dir.join("Default").join("Cookies");
    let conn = Connection::open_with_flags(&db, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut statement = conn.prepare(COOKIE_QUERY)?;
    let rows = statement.query_map([], |row| {
        Ok(CookieRecord {
            host_key: row.get(0)?,
            name: row.get(1)?,
            value: row.get(2)?,
            path: row.get(3)?,
            expires_utc: row.get(4)?,
            is_secure: row.get(5)?,
            is_httponly: row.get(6)?,
            has_expires: row.get(7)?,
            is_persistent: row.get(8)?,
            priority: row.get(9)?,
            samesite: row.get(10)?,
            source_scheme: row.get(11)?,
        })
    })?;
    let cookies = rows.collect::<Result<Vec<_>, _>>()?;
    info!("found {} cookies in the profile", cookies.len());
    Ok(cookies)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_profile(profile_dir: &Path) {
        let default_dir = profile_dir.join("Default");
        std::fs::create_dir_all(&default_dir).expect("profile dirs");
        let conn = Connection::open(default_dir.join("Cookies")).expect("cookie db");
        conn.execute_batch(
            "CREATE TABLE cookies (
                host_key TEXT, name TEXT, value TEXT, path TEXT,
                expires_utc INTEGER, is_secure INTEGER, is_httponly INTEGER,
                has_expires INTEGER, is_persistent INTEGER, priority INTEGER,
                samesite INTEGER, source_scheme INTEGER
            );
            INSERT INTO cookies VALUES
                ('.example.com', 'consent', 'granted', '/', 100, 1, 0, 1, 1, 1, 0, 2),
                ('.example.com', 'sid', 'abc', '/', 0, 0, 1, 0, 0, 1, -1, 2),
                ('.ads.example.net', 'track', 'x', '/', 900, 1, 0, 1, 1, 1, -1, 2);",
        )
        .expect("seed rows");
    }

    #[test]
    fn reads_cookies_ordered_by_host_then_expiry() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_profile(dir.path());
        let cookies = read_cookies(dir.path()).expect("cookies readable");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0].host_key, ".ads.example.net");
        assert_eq!(cookies[1].name, "consent"); // expires 100 before 0
        assert_eq!(cookies[2].name, "sid");
        assert!(cookies[0].persistent());
        assert!(!cookies[2].persistent());
    }

    #[test]
    fn reset_recreates_an_empty_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let profile = dir.path().join("profile");
        seed_profile(&profile);
        reset(&profile).expect("reset");
        assert!(profile.exists());
        assert!(std::fs::read_dir(&profile).expect("readable").next().is_none());
    }
}
