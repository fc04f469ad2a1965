//! Request and reply types for the access-control API

use serde::{Deserialize, Serialize};

use crate::{ClientError, Result};

/// Envelope status value that marks a successful operation.
pub(crate) const SUCCESS_STATUS: &str = "SUCCESS";

/// Purpose tag carried by a one-time-passcode issuance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    /// The code authorizes a new-user registration.
    Register,
    /// The code authorizes a password update.
    UpdatePassword,
}

impl OtpPurpose {
    /// Wire value of the `type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Register => "REGISTER",
            OtpPurpose::UpdatePassword => "UPDATE_PASSWORD",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw response envelope shared by every access-control endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Collapse the envelope into a typed reply.
    ///
    /// A `SUCCESS` status without a payload is a malformed reply, not a
    /// business rejection, and surfaces on the error channel.
    pub(crate) fn into_reply(self) -> Result<ServiceReply<T>> {
        if self.status == SUCCESS_STATUS {
            match self.data {
                Some(data) => Ok(ServiceReply::Success(data)),
                None => Err(ClientError::InvalidReply(
                    "SUCCESS envelope without data".to_string(),
                )),
            }
        } else {
            Ok(ServiceReply::Rejected {
                message: self
                    .message
                    .unwrap_or_else(|| format!("Request rejected with status {}", self.status)),
            })
        }
    }
}

/// A classified reply from the access-control service.
///
/// Transport and decoding failures never reach this type; they stay on the
/// [`crate::ClientError`] channel so callers can match exhaustively here.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceReply<T> {
    /// The service accepted the operation and returned its payload.
    Success(T),
    /// The service rejected the operation; `message` is its verbatim text.
    Rejected { message: String },
}

impl<T> ServiceReply<T> {
    /// Whether the service accepted the operation.
    pub fn is_success(&self) -> bool {
        matches!(self, ServiceReply::Success(_))
    }

    /// Extract the success payload, if any.
    pub fn success(self) -> Option<T> {
        match self {
            ServiceReply::Success(data) => Some(data),
            ServiceReply::Rejected { .. } => None,
        }
    }
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Principal email
    pub email: String,
    /// Plain password, hashed service-side
    pub password: String,
}

/// Body of `POST /signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    /// Email to register
    pub email: String,
    /// Chosen password
    pub password: String,
    /// One-time passcode previously sent to the email
    pub captcha: String,
}

/// Body of `POST /reset-password`.
#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    /// Email of the account being reset
    pub email: String,
    /// Replacement password
    pub new_password: String,
    /// One-time passcode previously sent to the email
    pub captcha: String,
}

/// Body of `POST /okta/login`.
#[derive(Debug, Clone, Serialize)]
pub struct OktaLoginRequest {
    /// Authorization code returned by the Okta redirect
    pub code: String,
    /// Callback URI the code was issued against
    pub redirect_uri: String,
}

/// One organization the principal belongs to, as reported at login time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    /// Organization identifier
    pub organization_id: String,
    /// Human-readable organization name
    #[serde(default)]
    pub organization_name: Option<String>,
    /// Role of the principal inside the organization
    #[serde(default)]
    pub role: Option<String>,
}

/// Payload of a successful `/login` or `/okta/login` exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    /// Session token to present on subsequent requests
    pub token: String,
    /// Organizations the principal belongs to; may be empty
    #[serde(default)]
    pub organizations: Vec<OrganizationMembership>,
    /// Display name of the principal, present on Okta exchanges
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_purpose_wire_values() {
        assert_eq!(OtpPurpose::Register.as_str(), "REGISTER");
        assert_eq!(OtpPurpose::UpdatePassword.as_str(), "UPDATE_PASSWORD");
        assert_eq!(OtpPurpose::UpdatePassword.to_string(), "UPDATE_PASSWORD");
    }

    #[test]
    fn test_envelope_success_with_data() {
        let envelope: Envelope<LoginData> = serde_json::from_str(
            r#"{"status": "SUCCESS", "message": "Success", "data": {"token": "T1"}}"#,
        )
        .expect("parse envelope");
        let reply = envelope.into_reply().expect("classify");
        match reply {
            ServiceReply::Success(data) => {
                assert_eq!(data.token, "T1");
                assert!(data.organizations.is_empty());
                assert_eq!(data.name, None);
            }
            ServiceReply::Rejected { message } => panic!("unexpected rejection: {message}"),
        }
    }

    #[test]
    fn test_envelope_success_without_data_is_invalid() {
        let envelope: Envelope<LoginData> =
            serde_json::from_str(r#"{"status": "SUCCESS"}"#).expect("parse envelope");
        let err = envelope.into_reply().expect_err("must be invalid");
        assert!(matches!(err, ClientError::InvalidReply(_)));
    }

    #[test]
    fn test_envelope_rejection_carries_message() {
        let envelope: Envelope<bool> =
            serde_json::from_str(r#"{"status": "FAIL", "message": "bad credentials"}"#)
                .expect("parse envelope");
        let reply = envelope.into_reply().expect("classify");
        assert_eq!(
            reply,
            ServiceReply::Rejected {
                message: "bad credentials".to_string()
            }
        );
    }

    #[test]
    fn test_envelope_rejection_without_message_gets_fallback() {
        let envelope: Envelope<bool> =
            serde_json::from_str(r#"{"status": "DENIED"}"#).expect("parse envelope");
        let reply = envelope.into_reply().expect("classify");
        match reply {
            ServiceReply::Rejected { message } => assert!(message.contains("DENIED")),
            ServiceReply::Success(_) => panic!("unexpected success"),
        }
    }

    #[test]
    fn test_login_data_parses_organizations() {
        let data: LoginData = serde_json::from_str(
            r#"{
                "token": "T1",
                "organizations": [
                    {"organization_id": "O1", "organization_name": "Alpha", "role": "MANAGER"},
                    {"organization_id": "O2"}
                ],
                "name": "Jane Doe"
            }"#,
        )
        .expect("parse login data");
        assert_eq!(data.organizations.len(), 2);
        assert_eq!(data.organizations[0].organization_id, "O1");
        assert_eq!(data.organizations[0].role.as_deref(), Some("MANAGER"));
        assert_eq!(data.organizations[1].organization_name, None);
        assert_eq!(data.name.as_deref(), Some("Jane Doe"));
    }
}
