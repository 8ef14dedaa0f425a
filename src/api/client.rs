use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::nodes::GraphSnapshot;

use super::error::ApiError;
use super::types::{ProfileRequest, SyncRequest, SyncResponse, SyncStatus, TwitterLink, UserProfile};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Session capability owned by whoever handles sign-in.
pub trait AuthProvider: Send + Sync {
    fn token(&self) -> Option<String>;

    fn on_unauthorized(&self) {}

    fn start_auth(&self, auth_url: &str) {
        let _ = auth_url;
    }
}

#[derive(Debug, Default)]
pub struct StaticToken {
    token: Mutex<Option<String>>,
    pending_auth_url: Mutex<Option<String>>,
}

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(token.filter(|token| !token.is_empty())),
            pending_auth_url: Mutex::new(None),
        }
    }

    pub fn pending_auth_url(&self) -> Option<String> {
        self.pending_auth_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuthProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn on_unauthorized(&self) {
        warn!("session rejected by the backend, dropping token");
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn start_auth(&self, auth_url: &str) {
        info!(auth_url, "account authorization required");
        *self
            .pending_auth_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(auth_url.to_owned());
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Arc<dyn AuthProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, auth: Arc<dyn AuthProvider>) -> Result<Self, ApiError> {
        let invalid = || ApiError::InvalidBaseUrl(base_url.to_owned());
        let parsed = Url::parse(base_url.trim()).map_err(|_| invalid())?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(invalid());
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("knowledge-feed/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: parsed,
            auth,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{prefix}{path}"));
        url.set_query(None);
        url
    }

    fn token(&self) -> Option<String> {
        self.auth.token().filter(|token| !token.is_empty())
    }

    fn user_id_param(&self, user_id: Option<&str>) -> Option<String> {
        user_id
            .filter(|user_id| !user_id.is_empty())
            .filter(|_| self.token().is_none())
            .map(str::to_owned)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
        requires_auth: bool,
    ) -> Result<T, ApiError> {
        if requires_auth && let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "api response");

        if status == StatusCode::UNAUTHORIZED && requires_auth {
            warn!(url = %response.url(), "unauthorized");
            self.auth.on_unauthorized();
            return Err(ApiError::Status { status });
        }
        if !status.is_success() {
            return Err(ApiError::Status { status });
        }

        let body = response.text().await?;
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }

    pub async fn get_nodes_and_posts(&self, limit: Option<u32>) -> Result<GraphSnapshot, ApiError> {
        let mut request = self.http.get(self.url("/get_nodes_and_posts"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.request_json(request, true).await
    }

    pub async fn get_twitter_sync_status(&self, user_id: Option<&str>) -> Result<SyncStatus, ApiError> {
        let mut request = self.http.get(self.url("/twitter/sync/status"));
        if let Some(user_id) = self.user_id_param(user_id) {
            request = request.query(&[("user_id", user_id)]);
        }
        self.request_json(request, true).await
    }

    pub async fn sync_twitter(&self, options: &SyncRequest) -> Result<SyncResponse, ApiError> {
        let body = SyncRequest {
            user_id: self.user_id_param(options.user_id.as_deref()),
            ..options.clone()
        };
        let request = self.http.post(self.url("/twitter/sync")).json(&body);
        self.request_json(request, true).await
    }

    pub async fn get_twitter_link(&self, user_id: Option<&str>) -> Result<TwitterLink, ApiError> {
        let mut request = self.http.get(self.url("/twitter/link"));
        if let Some(user_id) = self.user_id_param(user_id) {
            request = request.query(&[("user_id", user_id)]);
        }
        self.request_json(request, true).await
    }

    pub async fn get_user_profile(&self, options: &ProfileRequest) -> Result<UserProfile, ApiError> {
        let mut query = Vec::new();
        if let Some(user_id) = self.user_id_param(options.user_id.as_deref()) {
            query.push(("user_id", user_id));
        }
        if options.refresh {
            query.push(("refresh", "true".to_owned()));
        }

        let mut request = self.http.get(self.url("/user/profile"));
        if !query.is_empty() {
            request = request.query(&query);
        }
        self.request_json(request, true).await
    }

    pub async fn validate_session_token(&self, token: &str) -> Result<bool, ApiError> {
        let response = self
            .http
            .get(self.url("/user/profile"))
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(ApiError::Status { status });
        }
        Ok(true)
    }
}
