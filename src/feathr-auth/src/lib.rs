//! Authentication and session layer of the Feathr admin console.
//!
//! This crate drives every credential flow the console shell hosts:
//!
//! - password login, signup and password reset against the registry's
//!   access-control endpoints, including the shared one-time-passcode
//!   challenge with its sixty-second resend cooldown
//! - the Okta redirect flow and its one-shot authorization-code callback
//! - the persisted session state (token with expiry, principal identity,
//!   active organization) and its legacy-key migration
//! - the session gate deciding whether the protected shell renders, the
//!   RBAC toggle and the header identity/logout helpers
//!
//! Flow controllers resolve to typed outcomes and transitions; performing
//! the actual navigation and rendering is the hosting shell's job.

// Shared building blocks
pub mod constants;
mod error;
mod types;

// Persisted session state
mod store;

// Credential flows
mod login;
mod otp;
mod password_reset;
mod signup;

// External-redirect flow
mod okta;

// Shell policy
mod config;
mod gate;
mod identity;

pub use config::rbac_enabled;
pub use error::{AuthError, FieldError};
pub use gate::{GateDecision, evaluate_route};
pub use identity::{IdentityPlatform, PlatformAccount, display_identity, logout};
pub use login::{LoginFlow, LoginForm};
pub use okta::{CallbackError, CallbackParams, ConfigError, OktaCallbackFlow, OktaConfig};
pub use otp::{OtpChallenge, OtpPhase, OtpRequestOutcome, OtpSnapshot};
pub use password_reset::{PasswordResetFlow, PasswordResetForm};
pub use signup::{SignupFlow, SignupForm};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredentials};
pub use types::{FlowOutcome, Navigation, Transition};

// The passcode purpose travels with the flows, so callers should not need
// the client crate for it.
pub use feathr_registry_client::OtpPurpose;
