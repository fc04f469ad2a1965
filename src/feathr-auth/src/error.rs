//! Errors surfaced by the flow controllers.

/// A single failed validation rule, addressed to its form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field the rule belongs to.
    pub field: &'static str,
    /// Message to surface inline next to the field.
    pub message: &'static str,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Errors a flow controller raises before any network work happens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The form failed one or more validation rules; nothing was submitted.
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// A submission for this flow is already in flight.
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    /// Persisting the credential set failed after the service accepted the
    /// submission.
    #[error("Failed to persist session state")]
    Storage(#[source] anyhow::Error),
}
