//! REST collaborator seam.
//!
//! The unified notification listing is the primary source. The two legacy
//! listings exist only as the fallback pair for when the unified endpoint
//! fails; they predate it and are narrower.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use beacon_core::config::ApiConfig;
use beacon_core::error::ErrorKind;
use beacon_core::{AppError, AppResult};
use beacon_protocol::frames::{IncidentPayload, WelfarePayload};
use beacon_protocol::rest::{
    AckResponse, IncidentListResponse, NotificationDto, NotificationListResponse,
    WelfareListResponse,
};

/// The notification-related REST surface the feed depends on.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch up to `limit` rows of the unified notification listing.
    async fn list_notifications(&self, limit: usize) -> AppResult<Vec<NotificationDto>>;

    /// Mark one notification read server-side.
    async fn mark_read(&self, id: &str) -> AppResult<()>;

    /// Mark every notification read server-side.
    async fn mark_all_read(&self) -> AppResult<()>;

    /// Legacy fallback: recent incidents.
    async fn recent_incidents(&self) -> AppResult<Vec<IncidentPayload>>;

    /// Legacy fallback: welfare reports still needing help.
    async fn welfare_needing_help(&self) -> AppResult<Vec<WelfarePayload>>;
}

/// reqwest-backed implementation against the platform backend.
pub struct HttpNotificationApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpNotificationApi {
    /// Creates a client for the configured backend, authenticated with the
    /// session token.
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Api, format!("Failed to build HTTP client: {e}"), e)
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Api, format!("GET {path} failed: {e}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api(format!("GET {path} returned {status}")));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::with_source(ErrorKind::Api, format!("GET {path} returned invalid JSON: {e}"), e)
        })
    }

    async fn post_ack(&self, path: &str) -> AppResult<()> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Api, format!("POST {path} failed: {e}"), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api(format!("POST {path} returned {status}")));
        }

        let ack: AckResponse = response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::Api, format!("POST {path} returned invalid JSON: {e}"), e)
        })?;

        if !ack.success {
            return Err(AppError::api(format!("POST {path} reported failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list_notifications(&self, limit: usize) -> AppResult<Vec<NotificationDto>> {
        let response: NotificationListResponse = self
            .get_json(&format!("/api/notifications?limit={limit}"))
            .await?;
        if !response.success {
            return Err(AppError::api("Unified notification listing reported failure"));
        }
        Ok(response.notifications)
    }

    async fn mark_read(&self, id: &str) -> AppResult<()> {
        self.post_ack(&format!("/api/notifications/{id}/read")).await
    }

    async fn mark_all_read(&self) -> AppResult<()> {
        self.post_ack("/api/notifications/read-all").await
    }

    async fn recent_incidents(&self) -> AppResult<Vec<IncidentPayload>> {
        let response: IncidentListResponse = self.get_json("/api/incidents/recent").await?;
        if !response.success {
            return Err(AppError::api("Incident listing reported failure"));
        }
        Ok(response.incidents)
    }

    async fn welfare_needing_help(&self) -> AppResult<Vec<WelfarePayload>> {
        let response: WelfareListResponse =
            self.get_json("/api/welfare-reports/needing-help").await?;
        if !response.success {
            return Err(AppError::api("Welfare listing reported failure"));
        }
        Ok(response.reports)
    }
}
