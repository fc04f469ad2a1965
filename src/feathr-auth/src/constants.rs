//! Constants for the feathr-auth crate.

/// Persisted key for the session token.
pub const TOKEN_KEY: &str = "token";

/// Persisted key for the principal's display identity.
pub const USER_NAME_KEY: &str = "user_name";

/// Persisted key for the active organization identifier.
pub const ORGANIZATION_ID_KEY: &str = "organization_id";

/// Superseded organization key, still accepted on read (for migration).
pub const LEGACY_ORGANIZATION_ID_KEY: &str = "temp_organization_id";

/// Days a session token stays valid.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Cooldown between one-time-passcode sends, in seconds.
pub const OTP_COOLDOWN_SECS: u32 = 60;

/// Fixed `state` value exchanged with the Okta authorize endpoint.
pub const OKTA_STATE: &str = "feathr";

/// Scopes requested from the Okta authorize endpoint.
pub const OKTA_SCOPES: [&str; 3] = ["openid", "profile", "email"];

/// Environment variable holding the Okta authorize endpoint.
pub const OKTA_AUTHORIZE_URL_ENV_VAR: &str = "FEATHR_OKTA_AUTHORIZE_URL";

/// Environment variable holding the Okta client id.
pub const OKTA_CLIENT_ID_ENV_VAR: &str = "FEATHR_OKTA_CLIENT_ID";

/// Environment variable holding the callback URI registered with Okta.
pub const OKTA_CALLBACK_URI_ENV_VAR: &str = "FEATHR_OKTA_CALLBACK_URI";

/// Environment variable overriding the console state directory.
pub const FEATHR_HOME_ENV_VAR: &str = "FEATHR_HOME";

/// Environment variable for the runtime-injected RBAC toggle.
pub const ENABLE_RBAC_ENV_VAR: &str = "FEATHR_ENABLE_RBAC";

/// Notice shown after a successful login.
pub const LOGIN_SUCCESS_NOTICE: &str = "Login Success";

/// Notice shown when a principal authenticates without any organization.
pub const NO_ORGANIZATION_NOTICE: &str =
    "No organizations exist. Please join an organization before logging in.";

/// Notice shown after a successful signup.
pub const SIGNUP_SUCCESS_NOTICE: &str = "Signup Success!";

/// Notice shown after a successful password reset.
pub const RESET_SUCCESS_NOTICE: &str = "Password Reset Success!";

/// Generic message shown when the service cannot be reached.
pub const RETRY_MESSAGE: &str = "Request failed. Please try again.";
