mod common;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use knowledge_feed::api::{
    ApiError, ProfileRequest, StaticToken, SyncRequest, SyncResponse, SyncStatus, TwitterLink,
    UserProfile,
};
use knowledge_feed::config::{DataLimits, PollingConfig};
use knowledge_feed::nodes::NodesStore;
use knowledge_feed::profile::{ProfileSource, ProfileStore};
use knowledge_feed::sync::{SyncBackend, SyncOptions, SyncOutcome, WaitOptions, run_sync};

use common::{Reply, ScriptedSource, node, post, snapshot};

struct Backend {
    response: SyncResponse,
    statuses: Mutex<VecDeque<SyncStatus>>,
    link: Option<String>,
    link_calls: AtomicUsize,
}

impl Backend {
    fn new(response: serde_json::Value, statuses: Vec<SyncStatus>) -> Self {
        Self {
            response: response.as_object().cloned().unwrap_or_default(),
            statuses: Mutex::new(statuses.into()),
            link: None,
            link_calls: AtomicUsize::new(0),
        }
    }
}

impl SyncBackend for Backend {
    async fn start_sync(&self, _request: &SyncRequest) -> Result<SyncResponse, ApiError> {
        Ok(self.response.clone())
    }

    async fn sync_status(&self) -> Result<SyncStatus, ApiError> {
        let mut statuses = self.statuses.lock().unwrap();
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(status.unwrap_or_default())
    }

    async fn twitter_link(&self) -> Result<TwitterLink, ApiError> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TwitterLink {
            auth_url: self.link.clone(),
        })
    }
}

struct FixedProfile {
    profile: UserProfile,
    calls: AtomicUsize,
}

impl FixedProfile {
    fn new(profile: UserProfile) -> Arc<Self> {
        Arc::new(Self {
            profile,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProfileSource for FixedProfile {
    async fn fetch_profile(&self, _request: &ProfileRequest) -> Result<UserProfile, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.profile.clone())
    }
}

fn ada() -> UserProfile {
    UserProfile {
        name: Some("Ada".to_owned()),
        handle: Some("ada".to_owned()),
        ..UserProfile::default()
    }
}

fn ready() -> SyncStatus {
    SyncStatus {
        graph_ready: Some(true),
        ..SyncStatus::default()
    }
}

fn running() -> SyncStatus {
    SyncStatus {
        running: Some(true),
        ..SyncStatus::default()
    }
}

fn stores(
    source: &Arc<ScriptedSource>,
    profile: &Arc<FixedProfile>,
) -> (NodesStore<Arc<ScriptedSource>>, ProfileStore<Arc<FixedProfile>>) {
    let polling = PollingConfig {
        auto_load: false,
        background: false,
        ..PollingConfig::default()
    };
    (
        NodesStore::new(Arc::clone(source), DataLimits::default(), polling, None),
        ProfileStore::new(Arc::clone(profile), None),
    )
}

#[tokio::test(start_paused = true)]
async fn auth_link_is_fetched_when_the_response_has_none() {
    knowledge_feed::init_test_tracing();
    let mut backend = Backend::new(json!({ "requires_auth": true }), Vec::new());
    backend.link = Some(" https://x.example/oauth ".to_owned());
    let auth = StaticToken::new(None);
    let source = ScriptedSource::new();
    let profile = FixedProfile::new(ada());
    let (nodes, profiles) = stores(&source, &profile);

    let outcome = run_sync(&backend, &auth, &nodes, &profiles, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::AuthRequired {
            auth_url: Some("https://x.example/oauth".to_owned())
        }
    );
    assert_eq!(auth.pending_auth_url().as_deref(), Some("https://x.example/oauth"));
    assert_eq!(backend.link_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn auth_url_in_the_response_skips_the_link_call() {
    let backend = Backend::new(
        json!({ "requires_auth": true, "auth_url": "https://x.example/direct" }),
        Vec::new(),
    );
    let auth = StaticToken::new(None);
    let source = ScriptedSource::new();
    let profile = FixedProfile::new(ada());
    let (nodes, profiles) = stores(&source, &profile);

    let outcome = run_sync(&backend, &auth, &nodes, &profiles, &SyncOptions::default())
        .await
        .unwrap();

    assert!(matches!(outcome, SyncOutcome::AuthRequired { auth_url: Some(_) }));
    assert_eq!(backend.link_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn hydrates_with_growing_limits_once_ready() {
    let backend = Backend::new(json!({ "status": "started" }), vec![running(), ready()]);
    let auth = StaticToken::new(Some("token".to_owned()));
    let source = ScriptedSource::new();
    source.push(Duration::ZERO, Reply::Snapshot(snapshot(vec![node("ai", Vec::new())])));
    source.push(
        Duration::ZERO,
        Reply::Snapshot(snapshot(vec![node("ai", vec![post("p1", 1.0)])])),
    );
    let profile = FixedProfile::new(ada());
    let (nodes, profiles) = stores(&source, &profile);
    let started = tokio::time::Instant::now();

    let outcome = run_sync(&backend, &auth, &nodes, &profiles, &SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Hydrated);
    assert_eq!(source.limits(), vec![Some(5), Some(10)]);
    assert_eq!(profile.calls(), 2);
    assert!(started.elapsed() >= Duration::from_millis(3500));
    assert!(started.elapsed() < Duration::from_millis(5000));
    assert!(nodes.data().unwrap().has_posts());
    assert!(profiles.state().data.is_some_and(|user| user.has_identity()));
}

#[tokio::test(start_paused = true)]
async fn readiness_timeout_reports_still_processing() {
    let backend = Backend::new(json!({}), vec![running()]);
    let auth = StaticToken::new(None);
    let source = ScriptedSource::new();
    let profile = FixedProfile::new(ada());
    let (nodes, profiles) = stores(&source, &profile);
    let options = SyncOptions {
        readiness: WaitOptions {
            max_polls: 2,
            backoff: vec![Duration::from_millis(100)],
        },
        ..SyncOptions::default()
    };

    let outcome = run_sync(&backend, &auth, &nodes, &profiles, &options)
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::StillProcessing);
    assert_eq!(source.calls(), 0);
    assert_eq!(profile.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_identity_ends_incomplete_with_a_final_profile_refresh() {
    let backend = Backend::new(json!({}), vec![ready()]);
    let auth = StaticToken::new(None);
    let source = ScriptedSource::new();
    for _ in 0..2 {
        source.push(
            Duration::ZERO,
            Reply::Snapshot(snapshot(vec![node("ai", vec![post("p1", 1.0)])])),
        );
    }
    let profile = FixedProfile::new(UserProfile::default());
    let (nodes, profiles) = stores(&source, &profile);
    let options = SyncOptions {
        hydration_attempts: 2,
        ..SyncOptions::default()
    };

    let outcome = run_sync(&backend, &auth, &nodes, &profiles, &options)
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Incomplete);
    assert_eq!(source.calls(), 2);
    assert_eq!(profile.calls(), 3);
}
