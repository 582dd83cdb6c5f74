//! dom-capture command line
//!
//! Opens a page in Chrome, records the user's interactions until Ctrl-C, then
//! writes the capture export and the reconstructed phase document.

use anyhow::{Context, Result};
use clap::Parser;
use dom_capture::browser::{BrowserSession, ConnectionOptions, LaunchOptions, normalize_url};
use dom_capture::host::{DirectoryExportSink, DirectoryReferenceSource, LocalCoordinator, Notifier};
use dom_capture::session::{CaptureEngine, JsonFileStore, MemoryStore, StateStore};
use dom_capture::{CaptureConfig, Page};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "dom-capture")]
#[command(version)]
#[command(about = "Record page interactions as placeholder-normalized instructions", long_about = None)]
struct Cli {
    /// Page to open before capturing
    #[arg(long, value_name = "URL")]
    url: String,

    /// Capture phase: signin, search or application
    #[arg(long, default_value = "signin")]
    phase: String,

    /// Directory holding the phase reference documents
    #[arg(long, value_name = "DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory the exports are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Persist session state to this JSON file (in memory when omitted)
    #[arg(long, value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// JSON file with capture tunables
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Page event polling interval in milliseconds
    #[arg(long, default_value = "100")]
    poll_ms: u64,

    /// Identifier registered as the capture tab (defaults to the CDP target id)
    #[arg(long)]
    tab_id: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CaptureConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CaptureConfig::default(),
    };

    let session = match &cli.ws_endpoint {
        Some(endpoint) => {
            log::info!("Connecting to {}", endpoint);
            BrowserSession::connect(ConnectionOptions::new(endpoint.clone()))?
        }
        None => {
            let mut options = LaunchOptions::new().headless(!cli.headed);
            if let Some(path) = &cli.chrome_path {
                options = options.chrome_path(path);
            }
            if let Some(dir) = &cli.user_data_dir {
                options = options.user_data_dir(dir);
            }
            log::info!("Launching browser ({})", if options.headless { "headless" } else { "headed" });
            BrowserSession::launch(options)?
        }
    };

    let url = normalize_url(&cli.url);
    session.navigate(&url).with_context(|| format!("Failed to open {}", url))?;

    let toast_container = config
        .ignored_subtree_ids
        .first()
        .cloned()
        .unwrap_or_else(|| "capture-toast-container".to_string());
    let page = Arc::new(
        session
            .capture_page(&toast_container)?
            .with_ignored_subtrees(&config.ignored_subtree_ids),
    );

    let store: Arc<dyn StateStore> = match &cli.state_file {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };
    let tab_id = cli
        .tab_id
        .clone()
        .unwrap_or_else(|| BrowserSession::tab_id(page.tab()));

    let mut engine = CaptureEngine::new(page.clone() as Arc<dyn Page>, Arc::clone(&store), config)
        .with_references(Arc::new(DirectoryReferenceSource::new(&cli.data_dir)))
        .with_exports(Arc::new(DirectoryExportSink::new(&cli.out_dir)))
        .with_notifier(page.clone() as Arc<dyn Notifier>)
        .with_control(Arc::new(LocalCoordinator::new(tab_id, Arc::clone(&store))));

    let started = Instant::now();
    let now = || started.elapsed().as_millis() as u64;

    engine.start(&cli.phase, now()).await.context("Failed to start capture")?;
    log::info!("Capturing {} (phase \"{}\"), press Ctrl-C to stop", url, cli.phase);

    let mut interval = tokio::time::interval(Duration::from_millis(cli.poll_ms.max(10)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = interval.tick() => {
                let events = match page.drain_events() {
                    Ok(events) => events,
                    Err(e) => {
                        log::debug!("Page events unavailable: {}", e);
                        continue;
                    }
                };
                for event in events {
                    if let Err(e) = engine.handle_event(event, now()).await {
                        log::warn!("Failed to handle page event: {}", e);
                    }
                }
                if let Err(e) = engine.tick(now()).await {
                    log::warn!("Failed to run scheduled capture work: {}", e);
                }
            }
        }
    }

    match engine.stop(now()).await.context("Failed to stop capture")? {
        Some(report) => {
            eprintln!("Captured {} pages -> {}", report.pages, report.capture_location);
            if let Some(location) = report.document_location {
                eprintln!("Reconstructed document -> {}", location);
            }
        }
        None => eprintln!("No capture was running"),
    }

    session.close()?;
    Ok(())
}
