//! Password login flow.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use feathr_registry_client::{LoginData, LoginRequest, RegistryClient, ServiceReply};

use crate::constants::{
    LOGIN_SUCCESS_NOTICE, NO_ORGANIZATION_NOTICE, RETRY_MESSAGE, TOKEN_TTL_DAYS,
};
use crate::error::{AuthError, FieldError};
use crate::store::CredentialStore;
use crate::types::{FlowOutcome, LoadingGuard, Navigation, Transition};

/// Form values collected by the login screen.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Drives the password login flow.
pub struct LoginFlow {
    client: RegistryClient,
    store: Arc<dyn CredentialStore>,
    loading: AtomicBool,
}

impl LoginFlow {
    pub fn new(client: RegistryClient, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            store,
            loading: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Validate and submit the form.
    ///
    /// On success the credential set is persisted against the first
    /// organization and the transition points at the protected root. A
    /// principal without organizations is routed to the
    /// awaiting-organization screen with nothing persisted.
    pub async fn submit(&self, form: &LoginForm) -> Result<FlowOutcome, AuthError> {
        validate(form)?;
        let _loading = LoadingGuard::acquire(&self.loading)?;

        let request = LoginRequest {
            email: form.email.clone(),
            password: form.password.clone(),
        };
        match self.client.login(&request).await {
            Ok(ServiceReply::Success(data)) => {
                establish_session(self.store.as_ref(), &form.email, &data)
                    .map_err(AuthError::Storage)
            }
            Ok(ServiceReply::Rejected { message }) => Ok(FlowOutcome::Rejected(message)),
            Err(e) => {
                tracing::warn!(error = %e, "Login request failed");
                Ok(FlowOutcome::Unavailable(RETRY_MESSAGE.to_string()))
            }
        }
    }
}

/// Apply the login success policy for an accepted credential set.
///
/// An empty organization list routes to the awaiting-organization screen
/// without touching the store; otherwise the token, principal and first
/// organization are persisted and the transition points at the root.
pub(crate) fn establish_session(
    store: &dyn CredentialStore,
    principal: &str,
    data: &LoginData,
) -> anyhow::Result<FlowOutcome> {
    let Some(first) = data.organizations.first() else {
        tracing::info!("Login succeeded without organization membership");
        return Ok(FlowOutcome::Completed(Transition::with_notice(
            Navigation::AwaitingOrganization,
            NO_ORGANIZATION_NOTICE,
        )));
    };
    store.write(
        &data.token,
        TOKEN_TTL_DAYS,
        principal,
        &first.organization_id,
    )?;
    Ok(FlowOutcome::Completed(Transition::with_notice(
        Navigation::Root,
        LOGIN_SUCCESS_NOTICE,
    )))
}

fn validate(form: &LoginForm) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    if form.email.trim().is_empty() {
        errors.push(FieldError::new("email", "Please input your Email!"));
    }
    if form.password.is_empty() {
        errors.push(FieldError::new("password", "Please input your Password!"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}
