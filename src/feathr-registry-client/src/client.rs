//! HTTP client for the access-control endpoints

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{
    Envelope, LoginData, LoginRequest, OktaLoginRequest, OtpPurpose, ResetPasswordRequest,
    ServiceReply, SignupRequest,
};
use crate::{ClientError, DEFAULT_REGISTRY_URL, REGISTRY_URL_ENV_VAR, Result, USER_AGENT};

/// Client for the registry's access-control service
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// Create a new client for the given service root
    ///
    /// # Arguments
    /// * `base_url` - The root of the access-control API
    ///   (e.g., "http://localhost:8000/api/v1")
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .tcp_nodelay(true)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Create a client from `FEATHR_REGISTRY_URL`, falling back to the local default
    pub fn from_env() -> Self {
        let base_url = std::env::var(REGISTRY_URL_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_REGISTRY_URL.to_string());
        Self::new(base_url)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticate with email and password
    pub async fn login(&self, request: &LoginRequest) -> Result<ServiceReply<LoginData>> {
        self.post_json("/login", request).await
    }

    /// Register a new user; the captcha must have been issued for
    /// [`OtpPurpose::Register`]
    pub async fn signup(&self, request: &SignupRequest) -> Result<ServiceReply<serde_json::Value>> {
        self.post_json("/signup", request).await
    }

    /// Request a one-time passcode be mailed to `email`, tagged with the flow
    /// purpose
    pub async fn send_captcha(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<ServiceReply<bool>> {
        let url = self.endpoint("/captcha/send");
        let response = self
            .client
            .post(&url)
            .query(&[("email", email), ("type", purpose.as_str())])
            .send()
            .await?;
        Self::classify("/captcha/send", response).await
    }

    /// Replace a password; the captcha must have been issued for
    /// [`OtpPurpose::UpdatePassword`]
    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<ServiceReply<bool>> {
        self.post_json("/reset-password", request).await
    }

    /// Exchange an Okta authorization code for a session
    pub async fn login_okta(&self, request: &OktaLoginRequest) -> Result<ServiceReply<LoginData>> {
        self.post_json("/okta/login", request).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<ServiceReply<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self.client.post(&url).json(body).send().await?;
        Self::classify(path, response).await
    }

    /// Apply the reply-classification policy to a raw HTTP response.
    ///
    /// Non-2xx statuses are transport-class failures; the service reports
    /// business rejections only inside a 2xx envelope.
    async fn classify<T>(path: &str, response: reqwest::Response) -> Result<ServiceReply<T>>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, path, "access-control request failed");
            return Err(ClientError::Http { status, body });
        }

        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        let reply = envelope.into_reply()?;
        if let ServiceReply::Rejected { message } = &reply {
            tracing::debug!(path, %message, "access-control request rejected");
        }
        Ok(reply)
    }
}
