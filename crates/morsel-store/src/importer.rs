//! Walks an export tree and merges its CSV files into the store.
//!
//! Tree layout: `<root>/<site>/<date>/*.csv`, each file named
//! `{cookies|stats}_<flow>[_block_third_party]_<host>.csv`.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::{debug, error, info};

use morsel_common::protocol::{CookieRecord, CookieStats};

use crate::{Store, StoreError};

const INSERT_COOKIE: &str = "INSERT INTO cookies (url, date, flow, block_third_party, host, \
     name, value, path, expires_utc, is_secure, is_httponly, has_expires, is_persistent, \
     priority, samesite, source_scheme) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

const INSERT_STATS: &str = "INSERT INTO stats (url, date, flow, block_third_party, total, \
     session, max_exp_days, avg_exp_days, secure_flag, httponly_flag, samesite_none_flag, \
     samesite_lax_flag, samesite_strict_flag) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

/// Which table a data file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Cookies,
    Stats,
}

/// Classification of one CSV by its filename convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvClass {
    pub table: Table,
    pub flow: String,
    pub block_third_party: bool,
}

/// Classify a file name. Only the first three `_`-separated segments
/// matter: table, flow, and whether the third carries `block`.
pub fn classify(file_name: &str) -> Option<CsvClass> {
    let stem = file_name.strip_suffix(".csv")?;
    let mut segments = stem.split('_');
    let table = match segments.next()? {
        "cookies" => Table::Cookies,
        "stats" => Table::Stats,
        _ => return None,
    };
    let flow = segments.next()?.to_string();
    let block_third_party = segments.next().is_some_and(|s| s.contains("block"));
    Some(CsvClass {
        table,
        flow,
        block_third_party,
    })
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported_sites: usize,
    pub failed_sites: Vec<String>,
}

impl Store {
    /// Import every site under `data_root`. A failing site is logged and
    /// skipped; files committed before the failure stay committed.
    pub fn import_tree(&mut self, data_root: &Path) -> Result<ImportSummary, StoreError> {
        let mut summary = ImportSummary::default();
        info!("browsing data path {}", data_root.display());
        for site_dir in directories(data_root)? {
            let site = dir_name(&site_dir);
            match self.import_site(&site_dir, &site) {
                Ok(()) => {
                    info!("imported {site}");
                    summary.imported_sites += 1;
                }
                Err(e) => {
                    error!("import failed for {site}: {e}");
                    summary.failed_sites.push(site);
                }
            }
        }
        Ok(summary)
    }

    fn import_site(&mut self, site_dir: &Path, site: &str) -> Result<(), StoreError> {
        for date_dir in directories(site_dir)? {
            let date = dir_name(&date_dir);
            for (class, path) in classified_files(&date_dir)? {
                self.import_file(&class, &path, site, &date)?;
            }
        }
        Ok(())
    }

    /// All rows of one file go in under a single transaction.
    fn import_file(
        &mut self,
        class: &CsvClass,
        path: &Path,
        site: &str,
        date: &str,
    ) -> Result<(), StoreError> {
        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let tx = self.conn.transaction()?;
        match class.table {
            Table::Cookies => {
                for row in reader.deserialize() {
                    let cookie: CookieRecord = row?;
                    tx.execute(
                        INSERT_COOKIE,
                        rusqlite::params![
                            site,
                            date,
                            class.flow,
                            class.block_third_party,
                            cookie.host_key,
                            cookie.name,
                            cookie.value,
                            cookie.path,
                            cookie.expires_utc,
                            cookie.is_secure,
                            cookie.is_httponly,
                            cookie.has_expires,
                            cookie.is_persistent,
                            cookie.priority,
                            cookie.samesite,
                            cookie.source_scheme,
                        ],
                    )?;
                }
            }
            Table::Stats => {
                for row in reader.deserialize() {
                    // the row's own url column is dropped; the site
                    // directory supplies it
                    let stats: CookieStats = row?;
                    tx.execute(
                        INSERT_STATS,
                        rusqlite::params![
                            site,
                            date,
                            class.flow,
                            class.block_third_party,
                            stats.total,
                            stats.session,
                            stats.max_exp_days,
                            stats.avg_exp_days,
                            stats.secure_flag,
                            stats.httponly_flag,
                            stats.samesite_none_flag,
                            stats.samesite_lax_flag,
                            stats.samesite_strict_flag,
                        ],
                    )?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Cookie files first, stats second, matching export order.
fn classified_files(date_dir: &Path) -> Result<Vec<(CsvClass, PathBuf)>, StoreError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(date_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".csv") {
            continue;
        }
        match classify(&name) {
            Some(class) => files.push((class, entry.path())),
            None => debug!("skipping unrecognized file {name}"),
        }
    }
    files.sort_by_key(|(class, path)| (class.table == Table::Stats, path.clone()));
    Ok(files)
}

fn directories(path: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_a_blocking_cookie_file() {
        let class = classify("cookies_accept_block_third_party_example_com.csv")
            .expect("should classify");
        assert_eq!(class.table, Table::Cookies);
        assert_eq!(class.flow, "accept");
        assert!(class.block_third_party);
    }

    #[test]
    fn classifies_a_plain_stats_file() {
        let class = classify("stats_reject_example_com.csv").expect("should classify");
        assert_eq!(class.table, Table::Stats);
        assert_eq!(class.flow, "reject");
        assert!(!class.block_third_party);
    }

    #[test]
    fn rejects_foreign_files() {
        assert!(classify("notes_accept_example_com.csv").is_none());
        assert!(classify("cookies_accept_example_com.txt").is_none());
        assert!(classify("cookies.csv").is_none());
    }
}
