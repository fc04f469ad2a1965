//! Signup flow with its registration passcode challenge.

use std::sync::atomic::{AtomicBool, Ordering};

use feathr_registry_client::{OtpPurpose, RegistryClient, ServiceReply, SignupRequest};

use crate::constants::{RETRY_MESSAGE, SIGNUP_SUCCESS_NOTICE};
use crate::error::{AuthError, FieldError};
use crate::otp::{OtpChallenge, OtpRequestOutcome};
use crate::types::{FlowOutcome, LoadingGuard, Navigation, Transition};

/// Form values collected by the signup screen.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub captcha: String,
}

/// Drives the signup flow. Owns the registration passcode challenge.
pub struct SignupFlow {
    client: RegistryClient,
    otp: OtpChallenge,
    loading: AtomicBool,
}

impl SignupFlow {
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            otp: OtpChallenge::new(OtpPurpose::Register),
            loading: AtomicBool::new(false),
        }
    }

    /// The flow's passcode challenge, for rendering its state.
    pub fn otp(&self) -> &OtpChallenge {
        &self.otp
    }

    /// Whether a submission is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Request a registration passcode for `email`.
    pub async fn request_code(&self, email: &str) -> OtpRequestOutcome {
        self.otp.request_code(&self.client, email).await
    }

    /// Validate and submit the form. A successful signup resets the
    /// challenge and routes to the login screen.
    pub async fn submit(&self, form: &SignupForm) -> Result<FlowOutcome, AuthError> {
        self.validate(form)?;
        let _loading = LoadingGuard::acquire(&self.loading)?;

        let request = SignupRequest {
            email: form.email.clone(),
            password: form.password.clone(),
            captcha: form.captcha.clone(),
        };
        match self.client.signup(&request).await {
            Ok(ServiceReply::Success(_)) => {
                self.otp.reset();
                Ok(FlowOutcome::Completed(Transition::with_notice(
                    Navigation::Login,
                    SIGNUP_SUCCESS_NOTICE,
                )))
            }
            Ok(ServiceReply::Rejected { message }) => Ok(FlowOutcome::Rejected(message)),
            Err(e) => {
                tracing::warn!(error = %e, "Signup request failed");
                Ok(FlowOutcome::Unavailable(RETRY_MESSAGE.to_string()))
            }
        }
    }

    fn validate(&self, form: &SignupForm) -> Result<(), AuthError> {
        let mut errors = Vec::new();
        if form.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Please input your Email!"));
        }
        if form.password.is_empty() {
            errors.push(FieldError::new("password", "Please input your Password!"));
        }
        // The required rule on the passcode field applies only until a code
        // has been issued for this challenge.
        if form.captcha.trim().is_empty() && !self.otp.code_requested() {
            errors.push(FieldError::new(
                "captcha",
                "Please input the captcha you got!",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(errors))
        }
    }
}
