//! Per-site orchestration: one profile, one session, one flow, one export.

use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use morsel_common::protocol::CookieStats;

use crate::backend::{BackendError, Session, SessionPrefs, SessionProvider};
use crate::config::{SiteSpec, SitesConfig};
use crate::executor::{ExecutorError, FlowExecutor};
use crate::export::{self, ExportError};
use crate::profile::{self, ProfileError};
use crate::stats;

/// Browser language used when a site does not set one.
const DEFAULT_LANGUAGE: &str = "es, es-ES";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid site url: {0}")]
    InvalidUrl(String),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("flow failed: {0}")]
    Flow(#[from] ExecutorError),
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct RunPaths {
    pub data_root: PathBuf,
    pub profile_dir: PathBuf,
}

#[derive(Debug)]
pub struct SiteReport {
    pub cookies: usize,
    pub stats: CookieStats,
    pub cookies_csv: PathBuf,
    pub stats_csv: PathBuf,
}

#[derive(Debug)]
pub struct SiteOutcome {
    pub url: String,
    pub flow: String,
    pub result: Result<SiteReport, RunError>,
}

/// Run every configured site in order.
///
/// Failures stay scoped to their site: each outcome is an independent
/// result, and a failed site never stops the ones after it.
pub async fn run_sites<P: SessionProvider>(
    provider: &P,
    config: &SitesConfig,
    paths: &RunPaths,
) -> Vec<SiteOutcome> {
    let mut outcomes = Vec::with_capacity(config.sites.len());
    for site in &config.sites {
        let flow = site.effective_flow_type();
        info!("analysing {} with flow {}", site.url, flow);
        let result = run_site(provider, site, &flow, paths).await;
        if let Err(e) = &result {
            error!("error while processing {}: {e}", site.url);
        }
        outcomes.push(SiteOutcome {
            url: site.url.clone(),
            flow,
            result,
        });
    }
    if let Err(e) = profile::remove(&paths.profile_dir) {
        warn!("could not clean up the profile directory: {e}");
    }
    outcomes
}

async fn run_site<P: SessionProvider>(
    provider: &P,
    site: &SiteSpec,
    flow: &str,
    paths: &RunPaths,
) -> Result<SiteReport, RunError> {
    let hostname = site
        .hostname()
        .ok_or_else(|| RunError::InvalidUrl(site.url.clone()))?;

    // Fresh profile before the session exists; consecutive sites must not
    // see each other's cookies.
    profile::reset(&paths.profile_dir)?;

    let date = Utc::now().format("%Y%m%d").to_string();
    let site_dir = paths.data_root.join(&hostname).join(&date);
    std::fs::create_dir_all(&site_dir)?;

    let prefs = SessionPrefs {
        profile_dir: paths.profile_dir.clone(),
        language: site
            .language
            .clone()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        block_all_cookies: site.block_all_cookies,
        block_third_party_cookies: site.block_third_party_cookies,
        enable_do_not_track: site.enable_do_not_track,
    };
    let mut session = provider.open(&prefs).await?;

    let flow_result = FlowExecutor::new(site_dir.clone())
        .run(&mut session, &site.url, &site.flow)
        .await;
    // Torn down on success and failure alike.
    if let Err(e) = session.close().await {
        warn!("session teardown failed for {}: {e}", site.url);
    }
    flow_result?;

    let cookies = profile::read_cookies(&paths.profile_dir)?;
    let stats = stats::cookie_stats(&cookies, &site.url);

    let host_tag = hostname.replace('.', "_");
    let cookies_csv = site_dir.join(format!("cookies_{flow}_{host_tag}.csv"));
    let stats_csv = site_dir.join(format!("stats_{flow}_{host_tag}.csv"));
    export::export_cookies(&cookies, &cookies_csv)?;
    export::export_stats(&stats, &stats_csv)?;

    Ok(SiteReport {
        cookies: cookies.len(),
        stats,
        cookies_csv,
        stats_csv,
    })
}
