//! Reqwest-based HTTP client for the subscription backend.
//!
//! The coordinator talks to the backend through [`BackendApi`] so tests and
//! mock-API builds can substitute their own implementation.

use crate::config::{ApiSettings, PaywardenConfig};
use crate::protocol::models::{
    parse_subscription_status, BackendSubscriptionStatus, LinkRevenueCatRequest,
};
use crate::PaywardenError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Backend endpoints the coordinator depends on.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// `GET /users/subscription-status`.
    async fn subscription_status(&self, token: &str) -> Result<bool, PaywardenError>;

    /// `PUT /users/subscription-status`.
    async fn update_subscription_status(
        &self,
        token: &str,
        is_premium: bool,
    ) -> Result<(), PaywardenError>;

    /// `PUT /users/link-revenuecat`.
    async fn link_revenuecat(&self, token: &str, revenuecat_id: &str)
        -> Result<(), PaywardenError>;
}

/// Backend HTTP client.
pub struct BackendClient {
    client: Client,
    user_agent: String,
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    /// Create a client from config and resolved API settings.
    pub fn new(config: &PaywardenConfig, settings: &ApiSettings) -> Result<Self, PaywardenError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaywardenError::ConfigError(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            user_agent: build_user_agent(config),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
        })
    }

    /// The base URL all paths are joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The request timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_success(response: Response) -> Result<Vec<u8>, PaywardenError> {
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| PaywardenError::NetworkUnavailable(format!("Failed to read body: {}", e)))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn subscription_status(&self, token: &str) -> Result<bool, PaywardenError> {
        let response = self
            .client
            .get(self.url("/users/subscription-status"))
            .bearer_auth(token)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let body = Self::read_success(response).await?;
        Ok(parse_subscription_status(&body)?.is_premium)
    }

    async fn update_subscription_status(
        &self,
        token: &str,
        is_premium: bool,
    ) -> Result<(), PaywardenError> {
        let response = self
            .client
            .put(self.url("/users/subscription-status"))
            .bearer_auth(token)
            .header(USER_AGENT, &self.user_agent)
            .json(&BackendSubscriptionStatus { is_premium })
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_success(response).await.map(|_| ())
    }

    async fn link_revenuecat(
        &self,
        token: &str,
        revenuecat_id: &str,
    ) -> Result<(), PaywardenError> {
        let response = self
            .client
            .put(self.url("/users/link-revenuecat"))
            .bearer_auth(token)
            .header(USER_AGENT, &self.user_agent)
            .json(&LinkRevenueCatRequest {
                revenuecat_id: revenuecat_id.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_success(response).await.map(|_| ())
    }
}

fn status_error(status: StatusCode) -> PaywardenError {
    match status {
        StatusCode::UNAUTHORIZED => PaywardenError::NotAuthenticated,
        other => PaywardenError::BackendStatus {
            status: other.as_u16(),
        },
    }
}

fn transport_error(err: reqwest::Error) -> PaywardenError {
    if err.is_timeout() {
        PaywardenError::NetworkUnavailable("request timed out".to_string())
    } else {
        PaywardenError::NetworkUnavailable(format!("Request failed: {}", err))
    }
}

/// Build a User-Agent string from config.
///
/// Format: `<product> paywarden/<version>`
pub fn build_user_agent(config: &PaywardenConfig) -> String {
    format!(
        "{} paywarden/{}",
        config.user_agent_product,
        env!("CARGO_PKG_VERSION")
    )
}
