//! Profile of the signed-in user.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use crate::api::{ApiClient, ApiError, ProfileRequest, UserProfile};

pub trait ProfileSource: Send + Sync + 'static {
    fn fetch_profile(
        &self,
        request: &ProfileRequest,
    ) -> impl Future<Output = Result<UserProfile, ApiError>> + Send;
}

impl<P: ProfileSource> ProfileSource for Arc<P> {
    fn fetch_profile(
        &self,
        request: &ProfileRequest,
    ) -> impl Future<Output = Result<UserProfile, ApiError>> + Send {
        P::fetch_profile(self, request)
    }
}

impl ProfileSource for ApiClient {
    fn fetch_profile(
        &self,
        request: &ProfileRequest,
    ) -> impl Future<Output = Result<UserProfile, ApiError>> + Send {
        self.get_user_profile(request)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProfileStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileState {
    pub data: Option<UserProfile>,
    pub status: ProfileStatus,
    pub last_updated: Option<DateTime<Utc>>,
}

struct Inner<P> {
    source: P,
    state: watch::Sender<ProfileState>,
}

pub struct ProfileStore<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for ProfileStore<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: ProfileSource> ProfileStore<P> {
    pub fn new(source: P, seed: Option<UserProfile>) -> Self {
        let state = match seed {
            Some(profile) => ProfileState {
                data: Some(profile),
                status: ProfileStatus::Ready,
                last_updated: Some(Utc::now()),
            },
            None => ProfileState::default(),
        };

        Self {
            inner: Arc::new(Inner {
                source,
                state: watch::Sender::new(state),
            }),
        }
    }

    pub fn state(&self) -> ProfileState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.inner.state.subscribe()
    }

    pub async fn refresh_profile(&self, user_id: Option<&str>, refresh: bool) -> Option<UserProfile> {
        let request = ProfileRequest {
            user_id: user_id.map(str::to_owned),
            refresh,
        };
        self.inner.state.send_modify(|state| state.status = ProfileStatus::Loading);

        let result = self.inner.source.fetch_profile(&request).await;
        let profile = match result {
            Ok(profile) => Some(profile),
            Err(error) => {
                warn!(%error, "profile refresh failed");
                None
            }
        };

        self.inner.state.send_replace(ProfileState {
            data: profile.clone(),
            status: if profile.is_some() {
                ProfileStatus::Ready
            } else {
                ProfileStatus::Error
            },
            last_updated: Some(Utc::now()),
        });
        profile
    }

    pub fn mount(&self) {
        if self.inner.state.borrow().data.is_some() {
            return;
        }
        let store = self.clone();
        tokio::spawn(async move {
            store.refresh_profile(None, false).await;
        });
    }
}
