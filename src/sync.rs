//! Twitter sync bootstrap: start a sync, wait until the backend reports the
//! graph as ready, then hydrate the profile and the graph.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{
    ApiClient, ApiError, AuthProvider, SyncRequest, SyncResponse, SyncStatus, TwitterLink,
};
use crate::config::DataLimits;
use crate::nodes::{NodesSource, NodesStore, RefreshOptions};
use crate::profile::{ProfileSource, ProfileStore};

pub const DEFAULT_STATUS_BACKOFF: [Duration; 6] = [
    Duration::from_millis(1000),
    Duration::from_millis(1500),
    Duration::from_millis(2500),
    Duration::from_millis(4000),
    Duration::from_millis(6000),
    Duration::from_millis(9000),
];
pub const DEFAULT_MAX_STATUS_POLLS: usize = 8;

pub trait SyncBackend: Send + Sync {
    fn start_sync(
        &self,
        request: &SyncRequest,
    ) -> impl Future<Output = Result<SyncResponse, ApiError>> + Send;

    fn sync_status(&self) -> impl Future<Output = Result<SyncStatus, ApiError>> + Send;

    fn twitter_link(&self) -> impl Future<Output = Result<TwitterLink, ApiError>> + Send;
}

impl SyncBackend for ApiClient {
    fn start_sync(
        &self,
        request: &SyncRequest,
    ) -> impl Future<Output = Result<SyncResponse, ApiError>> + Send {
        self.sync_twitter(request)
    }

    fn sync_status(&self) -> impl Future<Output = Result<SyncStatus, ApiError>> + Send {
        self.get_twitter_sync_status(None)
    }

    fn twitter_link(&self) -> impl Future<Output = Result<TwitterLink, ApiError>> + Send {
        self.get_twitter_link(None)
    }
}

pub fn is_graph_ready(status: Option<&SyncStatus>) -> bool {
    let Some(status) = status else {
        return false;
    };
    let signal = status
        .graph_ready
        .or(status.graph_ready_camel)
        .or(status.ready);
    if signal == Some(true) {
        return true;
    }
    status.running == Some(false) && status.requires_auth != Some(true)
}

pub fn is_auth_required(status: Option<&SyncStatus>) -> bool {
    status.is_some_and(|status| {
        status.requires_auth == Some(true) || status.requires_auth_camel == Some(true)
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphReadyState {
    Ready,
    AuthRequired,
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphReadyResult {
    pub state: GraphReadyState,
    pub status: Option<SyncStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    pub max_polls: usize,
    pub backoff: Vec<Duration>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            max_polls: DEFAULT_MAX_STATUS_POLLS,
            backoff: DEFAULT_STATUS_BACKOFF.to_vec(),
        }
    }
}

/// Polls the sync status until the graph is ready, authorization is needed
/// or the polls run out. Failed polls count as "no status".
pub async fn wait_for_graph_ready<F, Fut>(mut get_status: F, options: &WaitOptions) -> GraphReadyResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SyncStatus, ApiError>>,
{
    let max_polls = options.max_polls.max(1);
    let backoff = if options.backoff.is_empty() {
        DEFAULT_STATUS_BACKOFF.as_slice()
    } else {
        options.backoff.as_slice()
    };

    let mut last_status = None;
    for attempt in 0..max_polls {
        let status = match get_status().await {
            Ok(status) => Some(status),
            Err(error) => {
                debug!(attempt, %error, "sync status poll failed");
                None
            }
        };

        if is_auth_required(status.as_ref()) {
            return GraphReadyResult {
                state: GraphReadyState::AuthRequired,
                status,
            };
        }
        if is_graph_ready(status.as_ref()) {
            return GraphReadyResult {
                state: GraphReadyState::Ready,
                status,
            };
        }
        last_status = status;

        if attempt + 1 < max_polls {
            let delay = backoff[attempt.min(backoff.len() - 1)];
            tokio::time::sleep(delay).await;
        }
    }

    GraphReadyResult {
        state: GraphReadyState::Timeout,
        status: last_status,
    }
}

pub fn sync_fetch_limit(attempt: usize, limits: &DataLimits) -> u32 {
    limits
        .sync_bootstrap_fetch_limits
        .get(attempt)
        .copied()
        .unwrap_or(limits.sync_steady_fetch_limit)
}

pub fn sync_requires_auth(response: &SyncResponse) -> bool {
    response.get("requires_auth").and_then(serde_json::Value::as_bool) == Some(true)
}

pub fn sync_auth_url(response: &SyncResponse) -> Option<&str> {
    response
        .get("auth_url")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncOptions {
    pub request: SyncRequest,
    pub readiness: WaitOptions,
    pub hydration_attempts: usize,
    pub hydration_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            request: SyncRequest::default(),
            readiness: WaitOptions {
                max_polls: 10,
                ..WaitOptions::default()
            },
            hydration_attempts: 4,
            hydration_interval: Duration::from_millis(2500),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    AuthRequired { auth_url: Option<String> },
    StillProcessing,
    Hydrated,
    Incomplete,
}

/// Starts a sync and hydrates the stores once the graph is ready.
///
/// Only a failure to start the sync is an error; later failures count as
/// "nothing yet".
pub async fn run_sync<B, S, P>(
    backend: &B,
    auth: &dyn AuthProvider,
    nodes: &NodesStore<S>,
    profile: &ProfileStore<P>,
    options: &SyncOptions,
) -> Result<SyncOutcome, ApiError>
where
    B: SyncBackend,
    S: NodesSource,
    P: ProfileSource,
{
    let response = backend.start_sync(&options.request).await?;
    if sync_requires_auth(&response) {
        let auth_url = match sync_auth_url(&response) {
            Some(url) => Some(url.to_owned()),
            None => backend
                .twitter_link()
                .await?
                .auth_url
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty()),
        };
        match &auth_url {
            Some(url) => auth.start_auth(url),
            None => warn!("authorization required but no auth URL was returned"),
        }
        return Ok(SyncOutcome::AuthRequired { auth_url });
    }

    let readiness = wait_for_graph_ready(|| backend.sync_status(), &options.readiness).await;
    info!(state = ?readiness.state, "twitter sync readiness");
    match readiness.state {
        GraphReadyState::Ready => {}
        GraphReadyState::AuthRequired => {
            let auth_url = readiness.status.and_then(|status| status.auth_url);
            return Ok(SyncOutcome::AuthRequired { auth_url });
        }
        GraphReadyState::Timeout => return Ok(SyncOutcome::StillProcessing),
    }

    for attempt in 0..options.hydration_attempts {
        let limit = sync_fetch_limit(attempt, nodes.limits());
        let user = profile.refresh_profile(None, false).await;
        let mut refresh = RefreshOptions::limit(limit);
        refresh.silent = attempt > 0;
        let graph = nodes.refresh_nodes(refresh).await;

        let has_posts = graph.as_deref().is_some_and(|graph| graph.has_posts());
        let has_identity = user.as_ref().is_some_and(|user| user.has_identity());
        debug!(attempt, limit, has_posts, has_identity, "sync hydration attempt");
        if has_posts && has_identity {
            return Ok(SyncOutcome::Hydrated);
        }

        if attempt + 1 < options.hydration_attempts {
            tokio::time::sleep(options.hydration_interval).await;
        }
    }

    profile.refresh_profile(None, false).await;
    Ok(SyncOutcome::Incomplete)
}
