mod app;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use knowledge_feed::api::{ApiClient, StaticToken};
use knowledge_feed::config::{DataLimits, PollingConfig, UiSettings, UiSize};
use knowledge_feed::nodes::{GraphSnapshot, NodesStore};
use knowledge_feed::profile::ProfileStore;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "KNOWLEDGE_FEED_API_URL", default_value = "http://localhost:8000")]
    api_base_url: String,

    #[arg(long, env = "KNOWLEDGE_FEED_TOKEN")]
    token: Option<String>,

    #[arg(long)]
    seed: Option<PathBuf>,

    #[arg(long)]
    no_auto_load: bool,

    #[arg(long)]
    no_background_refresh: bool,

    #[arg(long, default_value_t = 0.3)]
    elasticity: f32,

    #[arg(long, default_value = "medium")]
    ui_size: UiSize,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("knowledge_feed=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_seed(path: &Path) -> Result<GraphSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse seed file {}", path.display()))
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let seed = args.seed.as_deref().map(load_seed).transpose()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("knowledge-feed")
        .build()
        .context("failed to start the async runtime")?;
    let _guard = runtime.enter();

    let auth = Arc::new(StaticToken::new(args.token.clone()));
    let client = Arc::new(
        ApiClient::new(&args.api_base_url, auth.clone())
            .with_context(|| format!("invalid API base URL `{}`", args.api_base_url))?,
    );
    info!(base_url = %client.base_url(), "starting knowledge feed");

    let polling = PollingConfig {
        auto_load: !args.no_auto_load,
        background: !args.no_background_refresh,
        ..PollingConfig::default()
    };
    let nodes = NodesStore::new(Arc::clone(&client), DataLimits::default(), polling, seed);
    let profile = ProfileStore::new(Arc::clone(&client), None);
    nodes.mount();
    profile.mount();

    let settings = UiSettings::new(args.ui_size, args.elasticity);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let app_nodes = nodes.clone();
    let result = eframe::run_native(
        "knowledge feed",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::FeedApp::new(
                cc, client, auth, app_nodes, profile, settings,
            )))
        }),
    );

    nodes.unmount();
    result.map_err(|error| anyhow!("viewer failed: {error}"))
}
