use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::config::{DataLimits, PollingConfig};

use super::limits::apply_limits;
use super::merge::{merge_graph, with_hub};
use super::model::GraphSnapshot;

pub trait NodesSource: Send + Sync + 'static {
    fn fetch_nodes(
        &self,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<GraphSnapshot, ApiError>> + Send;
}

impl<S: NodesSource> NodesSource for Arc<S> {
    fn fetch_nodes(
        &self,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<GraphSnapshot, ApiError>> + Send {
        S::fetch_nodes(self, limit)
    }
}

impl NodesSource for ApiClient {
    fn fetch_nodes(
        &self,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<GraphSnapshot, ApiError>> + Send {
        self.get_nodes_and_posts(limit)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodesStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Clone, Debug, Default)]
pub struct NodesState {
    pub data: Option<Arc<GraphSnapshot>>,
    pub status: NodesStatus,
    pub is_cleared: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodesView {
    Empty,
    Loading,
    Ready,
    Failed,
    Cleared,
}

impl NodesState {
    pub fn view(&self) -> NodesView {
        match (self.status, &self.data) {
            (NodesStatus::Loading, None) => NodesView::Loading,
            (_, Some(_)) => NodesView::Ready,
            (NodesStatus::Error, None) => NodesView::Failed,
            _ if self.is_cleared => NodesView::Cleared,
            _ => NodesView::Empty,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == NodesStatus::Loading
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    pub limit: Option<u32>,
    pub silent: bool,
}

impl RefreshOptions {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            silent: false,
        }
    }

    pub fn silent(self) -> Self {
        Self {
            silent: true,
            ..self
        }
    }
}

type PendingSnapshot = Shared<BoxFuture<'static, Option<Arc<GraphSnapshot>>>>;

struct InFlight {
    id: u64,
    limit: Option<u32>,
    pending: PendingSnapshot,
    abort: AbortHandle,
}

pub(super) struct Poller {
    pub(super) generation: u64,
    pub(super) abort: AbortHandle,
}

#[derive(Default)]
pub(super) struct Control {
    latest_request: u64,
    in_flight: Option<InFlight>,
    pub(super) poller_generation: u64,
    pub(super) poller: Option<Poller>,
}

pub(super) struct Inner<S> {
    source: S,
    pub(super) limits: DataLimits,
    pub(super) polling: PollingConfig,
    state: watch::Sender<NodesState>,
    control: Mutex<Control>,
}

/// Owner of the merged graph.
///
/// Every fetch result is merged into the cached snapshot and trimmed by the
/// configured limits. Readers get immutable snapshots through [`state`] or a
/// [`watch::Receiver`]. Failed fetches never erase data that is already
/// shown.
///
/// [`state`]: NodesStore::state
pub struct NodesStore<S> {
    pub(super) inner: Arc<Inner<S>>,
}

impl<S> Clone for NodesStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: NodesSource> NodesStore<S> {
    pub fn new(
        source: S,
        limits: DataLimits,
        polling: PollingConfig,
        seed: Option<GraphSnapshot>,
    ) -> Self {
        let seeded = seed
            .filter(|snapshot| !snapshot.nodes.is_empty())
            .map(|snapshot| {
                let snapshot = with_hub(snapshot, limits.max_posts_per_node);
                Arc::new(apply_limits(snapshot, &limits))
            });

        let state = match seeded {
            Some(data) => NodesState {
                data: Some(data),
                status: NodesStatus::Ready,
                is_cleared: false,
                last_updated: Some(Utc::now()),
            },
            None => NodesState::default(),
        };

        Self {
            inner: Arc::new(Inner {
                source,
                limits,
                polling,
                state: watch::Sender::new(state),
                control: Mutex::new(Control::default()),
            }),
        }
    }

    pub fn limits(&self) -> &DataLimits {
        &self.inner.limits
    }

    pub fn state(&self) -> NodesState {
        self.inner.state.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<GraphSnapshot>> {
        self.inner.state.borrow().data.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NodesState> {
        self.inner.state.subscribe()
    }

    /// Fetches and merges a snapshot.
    ///
    /// A call with the same limit as the request in flight joins it. A
    /// different limit aborts the request in flight. Resolves to the current
    /// data, or `None` when this request was superseded or nothing could be
    /// loaded.
    pub async fn refresh_nodes(&self, options: RefreshOptions) -> Option<Arc<GraphSnapshot>> {
        Inner::start_refresh(&self.inner, options).await
    }

    pub fn request_refresh(&self, options: RefreshOptions) {
        drop(Inner::start_refresh(&self.inner, options));
    }

    /// Drops all data, cancels the request in flight and stops polling.
    pub fn clear_nodes(&self) {
        let mut control = self.inner.control();
        control.latest_request += 1;
        if let Some(in_flight) = control.in_flight.take() {
            in_flight.abort.abort();
        }
        if let Some(poller) = control.poller.take() {
            poller.abort.abort();
        }

        self.inner.state.send_replace(NodesState {
            data: None,
            status: NodesStatus::Idle,
            is_cleared: true,
            last_updated: Some(Utc::now()),
        });
        debug!("nodes cleared");
    }

    /// Loads once when there is nothing to show and starts background
    /// polling. A cleared store stays cleared until the next explicit refresh.
    pub fn mount(&self) {
        let auto_load = {
            let state = self.inner.state.borrow();
            self.inner.polling.auto_load && state.data.is_none() && !state.is_cleared
        };
        if auto_load {
            self.request_refresh(RefreshOptions::default());
        }
        if self.inner.polling.background && !self.inner.state.borrow().is_cleared {
            self.start_background_refresh();
        }
    }

    pub fn unmount(&self) {
        self.stop_background_refresh();
        let mut control = self.inner.control();
        if let Some(in_flight) = control.in_flight.take() {
            control.latest_request += 1;
            in_flight.abort.abort();
            drop(control);
            self.inner.state.send_if_modified(|state| {
                let was_loading = state.status == NodesStatus::Loading;
                if was_loading {
                    state.status = settled_status(state);
                }
                was_loading
            });
        }
    }
}

impl<S> Inner<S> {
    pub(super) fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn current_data(&self) -> Option<Arc<GraphSnapshot>> {
        self.state.borrow().data.clone()
    }

    fn mark_loading(&self, silent: bool) {
        self.state.send_if_modified(|state| {
            if silent && state.data.is_some() {
                return false;
            }
            if state.status == NodesStatus::Loading {
                return false;
            }
            state.status = NodesStatus::Loading;
            true
        });
    }
}

impl<S: NodesSource> Inner<S> {
    fn start_refresh(this: &Arc<Self>, options: RefreshOptions) -> PendingSnapshot {
        let mut control = this.control();

        if let Some(in_flight) = &control.in_flight {
            if in_flight.limit == options.limit {
                debug!(limit = ?options.limit, request_id = in_flight.id, "joining request in flight");
                return in_flight.pending.clone();
            }
            debug!(
                limit = ?options.limit,
                superseded = in_flight.id,
                "superseding request in flight"
            );
            in_flight.abort.abort();
        }

        control.latest_request += 1;
        let id = control.latest_request;
        this.mark_loading(options.silent);

        let task = tokio::spawn({
            let inner = Arc::clone(this);
            async move { inner.run_request(id, options.limit).await }
        });
        let abort = task.abort_handle();
        let pending = async move { task.await.ok().flatten() }.boxed().shared();

        debug!(limit = ?options.limit, request_id = id, "requesting nodes");
        control.in_flight = Some(InFlight {
            id,
            limit: options.limit,
            pending: pending.clone(),
            abort,
        });
        pending
    }

    async fn run_request(&self, id: u64, limit: Option<u32>) -> Option<Arc<GraphSnapshot>> {
        let result = self.source.fetch_nodes(limit).await;
        self.apply_response(id, result)
    }

    fn apply_response(
        &self,
        id: u64,
        result: Result<GraphSnapshot, ApiError>,
    ) -> Option<Arc<GraphSnapshot>> {
        let mut control = self.control();
        if control.latest_request != id {
            debug!(request_id = id, latest = control.latest_request, "discarding stale response");
            return None;
        }
        if control.in_flight.as_ref().is_some_and(|in_flight| in_flight.id == id) {
            control.in_flight = None;
        }

        let previous = self.current_data();
        let merged = match result {
            Ok(incoming) => merge_graph(previous.as_deref(), &incoming, self.limits.max_posts_per_node)
                .map(|snapshot| apply_limits(snapshot, &self.limits))
                .filter(|snapshot| !snapshot.nodes.is_empty()),
            Err(error) => {
                warn!(request_id = id, %error, "nodes refresh failed");
                None
            }
        };

        let data = merged.map(Arc::new).or(previous);
        let fresh = data.is_some();
        self.state.send_modify(|state| {
            state.data = data.clone();
            state.status = if fresh {
                NodesStatus::Ready
            } else {
                NodesStatus::Error
            };
            if fresh {
                state.is_cleared = false;
            }
            state.last_updated = Some(Utc::now());
        });
        drop(control);
        data
    }
}

fn settled_status(state: &NodesState) -> NodesStatus {
    if state.data.is_some() {
        NodesStatus::Ready
    } else {
        NodesStatus::Idle
    }
}
