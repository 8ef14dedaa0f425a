use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use eframe::egui::{self, Context};
use tracing::{info, warn};

use knowledge_feed::api::{ApiClient, StaticToken, SyncRequest};
use knowledge_feed::config::UiSettings;
use knowledge_feed::interaction::PanController;
use knowledge_feed::layout::{LayoutConfig, LayoutNode};
use knowledge_feed::nodes::{GraphSnapshot, HUB_NODE_ID, NodesStore};
use knowledge_feed::profile::ProfileStore;
use knowledge_feed::sync::{SyncOptions, SyncOutcome, run_sync};

mod graph;
mod render_utils;
mod ui;

type Nodes = NodesStore<Arc<ApiClient>>;
type Profile = ProfileStore<Arc<ApiClient>>;

pub struct FeedApp {
    client: Arc<ApiClient>,
    auth: Arc<StaticToken>,
    nodes: Nodes,
    profile: Profile,
    settings: UiSettings,
    sync_rx: Option<Receiver<Result<SyncOutcome, String>>>,
    sync_message: Option<String>,
    view: ViewModel,
}

struct ViewModel {
    selected: String,
    search: String,
    pan: PanController,
    layout_config: LayoutConfig,
    layout_cache: Option<LayoutCache>,
}

struct LayoutCache {
    snapshot: Arc<GraphSnapshot>,
    nodes: Vec<LayoutNode>,
    rings: Vec<f32>,
}

impl FeedApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        client: Arc<ApiClient>,
        auth: Arc<StaticToken>,
        nodes: Nodes,
        profile: Profile,
        settings: UiSettings,
    ) -> Self {
        Self::spawn_repaint_watchers(&cc.egui_ctx, &nodes, &profile);

        Self {
            client,
            auth,
            nodes,
            profile,
            settings,
            sync_rx: None,
            sync_message: None,
            view: ViewModel::new(),
        }
    }

    fn spawn_repaint_watchers(ctx: &Context, nodes: &Nodes, profile: &Profile) {
        let mut nodes_rx = nodes.subscribe();
        let nodes_ctx = ctx.clone();
        tokio::spawn(async move {
            while nodes_rx.changed().await.is_ok() {
                nodes_ctx.request_repaint();
            }
        });

        let mut profile_rx = profile.subscribe();
        let profile_ctx = ctx.clone();
        tokio::spawn(async move {
            while profile_rx.changed().await.is_ok() {
                profile_ctx.request_repaint();
            }
        });
    }

    fn spawn_sync(&self, ctx: &Context) -> Receiver<Result<SyncOutcome, String>> {
        let (tx, rx) = mpsc::channel();
        let client = Arc::clone(&self.client);
        let auth = Arc::clone(&self.auth);
        let nodes = self.nodes.clone();
        let profile = self.profile.clone();
        let ctx = ctx.clone();

        tokio::spawn(async move {
            let options = SyncOptions {
                request: SyncRequest {
                    force: Some(true),
                    ..SyncRequest::default()
                },
                ..SyncOptions::default()
            };
            let result = run_sync(client.as_ref(), auth.as_ref(), &nodes, &profile, &options)
                .await
                .map_err(|error| error.to_string());
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        rx
    }

    fn poll_sync(&mut self) {
        let Some(rx) = self.sync_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(Ok(outcome)) => {
                info!(?outcome, "sync finished");
                self.sync_message = Some(
                    match outcome {
                        SyncOutcome::AuthRequired { .. } => "account link required",
                        SyncOutcome::StillProcessing => "sync still processing",
                        SyncOutcome::Hydrated => "sync complete",
                        SyncOutcome::Incomplete => "sync finished without posts",
                    }
                    .to_owned(),
                );
            }
            Ok(Err(error)) => {
                warn!(%error, "sync failed");
                self.sync_message = Some(format!("sync failed: {error}"));
            }
            Err(TryRecvError::Empty) => self.sync_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                self.sync_message = Some("sync worker disconnected".to_owned());
            }
        }
    }
}

impl ViewModel {
    fn new() -> Self {
        Self {
            selected: HUB_NODE_ID.to_owned(),
            search: String::new(),
            pan: PanController::default(),
            layout_config: LayoutConfig::default(),
            layout_cache: None,
        }
    }
}

impl eframe::App for FeedApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_sync();
        self.apply_style(ctx);

        let state = self.nodes.state();
        self.view.sync_selection(state.data.as_deref());

        let mut sync_requested = false;
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui, &state, &mut sync_requested));

        if sync_requested && self.sync_rx.is_none() {
            self.sync_message = Some("syncing…".to_owned());
            self.sync_rx = Some(self.spawn_sync(ctx));
        }

        egui::SidePanel::left("topics")
            .resizable(true)
            .default_width(self.settings.spacing(260.0))
            .show(ctx, |ui| self.view.draw_topics(ui, state.data.as_deref()));

        egui::SidePanel::right("feed")
            .resizable(true)
            .default_width(self.settings.spacing(380.0))
            .show(ctx, |ui| {
                self.view
                    .draw_feed(ui, state.data.as_deref(), self.nodes.limits(), &self.settings)
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_center(ui, &state));
    }
}
