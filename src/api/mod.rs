//! HTTP access to the feed backend.

mod client;
mod error;
mod types;

pub use client::{ApiClient, AuthProvider, StaticToken};
pub use error::ApiError;
pub use types::{ProfileRequest, SyncRequest, SyncResponse, SyncStatus, TwitterLink, UserProfile};
