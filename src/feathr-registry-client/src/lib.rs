//! Registry access-control client for the Feathr console
//!
//! This crate talks to the IAM endpoints of the registry's access-control
//! service: password login, user signup, one-time-passcode issuance,
//! password reset and Okta authorization-code exchange.
//!
//! Every endpoint answers with the same JSON envelope
//! (`{"status": "SUCCESS", "message": ..., "data": ...}`). The client parses
//! that envelope exactly once and hands callers a [`ServiceReply`], so
//! business rejections and transport failures never blur together.

mod client;
mod models;

pub use client::RegistryClient;
pub use models::{
    LoginData, LoginRequest, OktaLoginRequest, OrganizationMembership, OtpPurpose,
    ResetPasswordRequest, ServiceReply, SignupRequest,
};

/// Default registry access-control endpoint for local development.
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:8000/api/v1";

/// Environment variable overriding the registry endpoint.
pub const REGISTRY_URL_ENV_VAR: &str = "FEATHR_REGISTRY_URL";

/// User-Agent string for HTTP requests
pub const USER_AGENT: &str = concat!("feathr-console/", env!("CARGO_PKG_VERSION"));

/// Error types for registry client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned error: {status} - {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid reply from service: {0}")]
    InvalidReply(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for registry client operations
pub type Result<T> = std::result::Result<T, ClientError>;
