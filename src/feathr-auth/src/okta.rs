//! Okta redirect flow: the authorize leg and the one-shot callback leg.

use std::sync::Arc;

use feathr_registry_client::{OktaLoginRequest, RegistryClient, ServiceReply};

use crate::constants::{
    OKTA_AUTHORIZE_URL_ENV_VAR, OKTA_CALLBACK_URI_ENV_VAR, OKTA_CLIENT_ID_ENV_VAR, OKTA_SCOPES,
    OKTA_STATE, RETRY_MESSAGE,
};
use crate::login::establish_session;
use crate::store::CredentialStore;
use crate::types::{FlowOutcome, Navigation};

/// Errors raised while resolving the Okta configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingValue(&'static str),
}

/// Errors raised while validating callback parameters.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CallbackError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("State parameter mismatch")]
    StateMismatch,
    #[error("Malformed callback URL")]
    MalformedUrl,
}

/// Configuration of the Okta authorize redirect.
#[derive(Debug, Clone)]
pub struct OktaConfig {
    /// Authorize endpoint of the Okta tenant.
    pub authorize_url: String,
    /// Client id registered with the tenant.
    pub client_id: String,
    /// Callback URI authorization codes are issued against.
    pub callback_uri: String,
}

impl OktaConfig {
    /// Resolve the configuration from the environment.
    ///
    /// Fails on the first absent value so the browser is never navigated
    /// into a half-configured redirect.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            std::env::var(OKTA_AUTHORIZE_URL_ENV_VAR).ok(),
            std::env::var(OKTA_CLIENT_ID_ENV_VAR).ok(),
            std::env::var(OKTA_CALLBACK_URI_ENV_VAR).ok(),
        )
    }

    /// Build a configuration from explicit values, rejecting absent or blank
    /// ones.
    pub fn from_values(
        authorize_url: Option<String>,
        client_id: Option<String>,
        callback_uri: Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            authorize_url: require(authorize_url, OKTA_AUTHORIZE_URL_ENV_VAR)?,
            client_id: require(client_id, OKTA_CLIENT_ID_ENV_VAR)?,
            callback_uri: require(callback_uri, OKTA_CALLBACK_URI_ENV_VAR)?,
        })
    }

    /// Full authorization URL the browser must navigate to.
    pub fn authorize_redirect_url(&self) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_uri),
            OKTA_SCOPES.join("+"),
            OKTA_STATE,
        )
    }
}

fn require(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingValue(name)),
    }
}

/// Parameters extracted from the callback URL after the Okta redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code to exchange.
    pub code: String,
    /// Echoed state value.
    pub state: String,
}

impl CallbackParams {
    /// Parse and validate the callback URL.
    ///
    /// The state check runs before anything else touches the code; a
    /// mismatch means the redirect did not originate here and no exchange
    /// may be attempted.
    pub fn from_url(current_url: &str) -> Result<Self, CallbackError> {
        let url = url::Url::parse(current_url).map_err(|_| CallbackError::MalformedUrl)?;
        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }
        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(CallbackError::MissingParameter("code"))?;
        let state = state
            .filter(|s| !s.is_empty())
            .ok_or(CallbackError::MissingParameter("state"))?;
        if !constant_time_compare(&state, OKTA_STATE) {
            return Err(CallbackError::StateMismatch);
        }
        Ok(Self { code, state })
    }
}

/// Constant-time string comparison for the state check.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// One-shot controller for the callback leg of the Okta flow.
///
/// `complete` consumes the flow, so a second exchange for the same page load
/// cannot be issued.
pub struct OktaCallbackFlow {
    client: RegistryClient,
    store: Arc<dyn CredentialStore>,
    config: OktaConfig,
}

impl OktaCallbackFlow {
    pub fn new(
        client: RegistryClient,
        store: Arc<dyn CredentialStore>,
        config: OktaConfig,
    ) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    /// Parse the callback URL, exchange the code and establish the session.
    ///
    /// Every failure resolves to [`FlowOutcome::Aborted`] back at the login
    /// screen; the callback screen has no form to retry from.
    pub async fn complete(self, current_url: &str) -> FlowOutcome {
        let params = match CallbackParams::from_url(current_url) {
            Ok(params) => params,
            Err(e) => {
                tracing::error!(error = %e, "Okta callback rejected");
                return abort_to_login(e.to_string());
            }
        };

        let request = OktaLoginRequest {
            code: params.code,
            redirect_uri: self.config.callback_uri.clone(),
        };
        match self.client.login_okta(&request).await {
            Ok(ServiceReply::Success(data)) => {
                let principal = data.name.clone().unwrap_or_default();
                match establish_session(self.store.as_ref(), &principal, &data) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to persist Okta session");
                        abort_to_login(RETRY_MESSAGE.to_string())
                    }
                }
            }
            Ok(ServiceReply::Rejected { message }) => {
                tracing::warn!(%message, "Okta code exchange rejected");
                abort_to_login(message)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Okta code exchange failed");
                abort_to_login(RETRY_MESSAGE.to_string())
            }
        }
    }
}

fn abort_to_login(message: String) -> FlowOutcome {
    FlowOutcome::Aborted {
        navigate: Navigation::Login,
        message,
    }
}
