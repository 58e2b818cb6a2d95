use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use morsel_engine::clicks;
use morsel_engine::config::ConfigLoader;
use morsel_engine::runner::{self, RunPaths};
use morsel_store::Store;
use morsel_wd::session::WebDriverProvider;

#[derive(Parser)]
#[command(name = "morsel", version, about = "Cookie consent crawler and analysis toolkit")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Visit every configured site and export its cookies and statistics
    Run {
        #[arg(long, default_value = "config/sites.yaml")]
        config: PathBuf,
        /// WebDriver endpoint driving the browser
        #[arg(long, default_value = "http://localhost:9515")]
        webdriver: String,
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long, default_value = "profile")]
        profile_dir: PathBuf,
    },
    /// Merge an exported data tree into the relational store
    Import {
        /// Root of the exported data tree
        data_root: PathBuf,
        /// Keep the existing database, useful to only import new data
        #[arg(short, long)]
        keep_database: bool,
        #[arg(long, default_value = "db")]
        db_dir: PathBuf,
    },
    /// Report per-site click differences between accept and reject flows
    Clicks {
        #[arg(long, default_value = "config/sites.yaml")]
        config: PathBuf,
        #[arg(long, default_value = "click_stats.json")]
        out: PathBuf,
    },
}

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .with_env_var("MORSEL_LOG_LEVEL")
        .from_env_lossy();
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if std::env::var_os("MORSEL_NO_LOG_FILE").is_some() {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("morsel.log")
            .context("could not open morsel.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Arc::new(file));
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();
    match args.command {
        Command::Run {
            config,
            webdriver,
            data_dir,
            profile_dir,
        } => run(config, webdriver, data_dir, profile_dir).await,
        Command::Import {
            data_root,
            keep_database,
            db_dir,
        } => import(data_root, keep_database, db_dir),
        Command::Clicks { config, out } => clicks_report(config, out).await,
    }
}

async fn run(
    config: PathBuf,
    webdriver: String,
    data_dir: PathBuf,
    profile_dir: PathBuf,
) -> anyhow::Result<()> {
    let sites = ConfigLoader::load_from(&config)
        .await
        .context("could not load the sites configuration")?;
    std::fs::create_dir_all(&data_dir)?;
    let provider = WebDriverProvider::new(webdriver);
    let paths = RunPaths {
        data_root: data_dir,
        profile_dir,
    };

    tokio::select! {
        outcomes = runner::run_sites(&provider, &sites, &paths) => {
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            info!("run finished: {} sites, {} failed", outcomes.len(), failed);
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, aborting remaining sites");
        }
    }
    Ok(())
}

fn import(data_root: PathBuf, keep_database: bool, db_dir: PathBuf) -> anyhow::Result<()> {
    let mut store = Store::open(&db_dir, keep_database).context("could not open the store")?;
    let summary = store.import_tree(&data_root)?;
    info!(
        "site data imported: {} sites, {} failed",
        summary.imported_sites,
        summary.failed_sites.len()
    );
    Ok(())
}

async fn clicks_report(config: PathBuf, out: PathBuf) -> anyhow::Result<()> {
    let sites = ConfigLoader::load_from(&config)
        .await
        .context("could not load the sites configuration")?;
    let counts = clicks::click_counts(&sites);
    let deltas = clicks::click_deltas(&counts);
    std::fs::write(&out, serde_json::to_string_pretty(&deltas)?)?;
    for (delta, percent) in clicks::delta_frequencies(&deltas) {
        info!(
            "{percent}% of sites differ in {delta} clicks between accepting and rejecting cookies"
        );
    }
    info!("wrote {} deltas to {}", deltas.len(), out.display());
    Ok(())
}
