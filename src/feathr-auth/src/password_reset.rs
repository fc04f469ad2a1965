//! Password reset flow with its update-password passcode challenge.

use std::sync::atomic::{AtomicBool, Ordering};

use feathr_registry_client::{OtpPurpose, RegistryClient, ResetPasswordRequest, ServiceReply};

use crate::constants::{RESET_SUCCESS_NOTICE, RETRY_MESSAGE};
use crate::error::{AuthError, FieldError};
use crate::otp::{OtpChallenge, OtpRequestOutcome};
use crate::types::{FlowOutcome, LoadingGuard, Navigation, Transition};

/// Form values collected by the forgot-password screen.
#[derive(Debug, Clone, Default)]
pub struct PasswordResetForm {
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
    pub captcha: String,
}

/// Drives the password reset flow. Owns the update-password passcode
/// challenge.
pub struct PasswordResetFlow {
    client: RegistryClient,
    otp: OtpChallenge,
    loading: AtomicBool,
}

impl PasswordResetFlow {
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            otp: OtpChallenge::new(OtpPurpose::UpdatePassword),
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

    /// Request an update-password passcode for `email`.
    pub async fn request_code(&self, email: &str) -> OtpRequestOutcome {
        self.otp.request_code(&self.client, email).await
    }

    /// Validate and submit the form. A successful reset resets the challenge
    /// and routes to the login screen for a fresh sign-in.
    pub async fn submit(&self, form: &PasswordResetForm) -> Result<FlowOutcome, AuthError> {
        self.validate(form)?;
        let _loading = LoadingGuard::acquire(&self.loading)?;

        let request = ResetPasswordRequest {
            email: form.email.clone(),
            new_password: form.new_password.clone(),
            captcha: form.captcha.clone(),
        };
        match self.client.reset_password(&request).await {
            Ok(ServiceReply::Success(_)) => {
                self.otp.reset();
                Ok(FlowOutcome::Completed(Transition::with_notice(
                    Navigation::Login,
                    RESET_SUCCESS_NOTICE,
                )))
            }
            Ok(ServiceReply::Rejected { message }) => Ok(FlowOutcome::Rejected(message)),
            Err(e) => {
                tracing::warn!(error = %e, "Password reset request failed");
                Ok(FlowOutcome::Unavailable(RETRY_MESSAGE.to_string()))
            }
        }
    }

    fn validate(&self, form: &PasswordResetForm) -> Result<(), AuthError> {
        let mut errors = Vec::new();
        if form.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Please input your email!"));
        }
        if form.new_password.is_empty() {
            errors.push(FieldError::new("new_password", "Please input your Password!"));
        } else if form.confirm_password != form.new_password {
            errors.push(FieldError::new(
                "confirm_password",
                "The two passwords do not match!",
            ));
        }
        // Same suppression as signup: the rule applies only until a code has
        // been issued for this challenge.
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
