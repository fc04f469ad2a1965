//! One-time-passcode challenge shared by the signup and password-reset
//! flows.
//!
//! The challenge moves through three phases: Idle until a code is requested,
//! Cooling-Down for the sixty seconds after an issuance succeeds, then Ready
//! until the flow completes or resets. The cooldown is driven by a
//! self-rescheduling one-second sleep, so at any instant at most one tick is
//! pending and a teardown can always cancel it.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use feathr_registry_client::{OtpPurpose, RegistryClient, ServiceReply};
use tokio::task::JoinHandle;

use crate::constants::{OTP_COOLDOWN_SECS, RETRY_MESSAGE};

/// Phase of the challenge state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPhase {
    /// No code has been issued.
    Idle,
    /// A code is out and the resend cooldown is running.
    CoolingDown,
    /// A code is out and another may be requested.
    Ready,
}

/// How a passcode request resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpRequestOutcome {
    /// The service accepted the request; the cooldown is running.
    Started,
    /// The service rejected the request; the challenge stays Idle.
    Rejected(String),
    /// The service could not be reached; the challenge stays Idle.
    Unavailable(String),
    /// A cooldown or an earlier request is still in progress; nothing was
    /// sent.
    Throttled,
    /// The challenge was reset while the request was in flight; the reply
    /// was discarded.
    Ignored,
}

/// Point-in-time view of the challenge, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpSnapshot {
    /// A code has been issued and awaits verification.
    pub code_requested: bool,
    /// Seconds left on the resend cooldown.
    pub seconds_remaining: u32,
    /// The send action must be disabled.
    pub send_disabled: bool,
}

#[derive(Default)]
struct OtpState {
    code_requested: AtomicBool,
    seconds_remaining: AtomicU32,
    sending: AtomicBool,
    generation: AtomicU64,
}

/// Controller for one flow's passcode challenge.
pub struct OtpChallenge {
    purpose: OtpPurpose,
    state: Arc<OtpState>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl OtpChallenge {
    /// Create an Idle challenge whose codes authorize `purpose`.
    pub fn new(purpose: OtpPurpose) -> Self {
        Self {
            purpose,
            state: Arc::new(OtpState::default()),
            ticker: Mutex::new(None),
        }
    }

    /// Purpose the issued codes authorize.
    pub fn purpose(&self) -> OtpPurpose {
        self.purpose
    }

    /// Whether a code has been issued and awaits verification.
    pub fn code_requested(&self) -> bool {
        self.state.code_requested.load(Ordering::SeqCst)
    }

    /// Seconds left on the resend cooldown.
    pub fn seconds_remaining(&self) -> u32 {
        self.state.seconds_remaining.load(Ordering::SeqCst)
    }

    /// The send action is disabled while the cooldown runs or an issuance
    /// request is in flight.
    pub fn send_disabled(&self) -> bool {
        self.seconds_remaining() > 0 || self.state.sending.load(Ordering::SeqCst)
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> OtpPhase {
        if !self.code_requested() {
            OtpPhase::Idle
        } else if self.seconds_remaining() > 0 {
            OtpPhase::CoolingDown
        } else {
            OtpPhase::Ready
        }
    }

    /// Point-in-time view for rendering.
    pub fn snapshot(&self) -> OtpSnapshot {
        OtpSnapshot {
            code_requested: self.code_requested(),
            seconds_remaining: self.seconds_remaining(),
            send_disabled: self.send_disabled(),
        }
    }

    /// Ask the service to mail a passcode to `email`.
    ///
    /// Refused without a request while the cooldown runs or another request
    /// is in flight. A failed request leaves the challenge Idle; failures
    /// resolve to an outcome, never an error.
    pub async fn request_code(&self, client: &RegistryClient, email: &str) -> OtpRequestOutcome {
        if email.trim().is_empty() {
            return OtpRequestOutcome::Rejected("Please input your email!".to_string());
        }
        if self.seconds_remaining() > 0 {
            return OtpRequestOutcome::Throttled;
        }
        if self.state.sending.swap(true, Ordering::SeqCst) {
            return OtpRequestOutcome::Throttled;
        }

        let generation = self.state.generation.load(Ordering::SeqCst);
        let reply = client.send_captcha(email, self.purpose).await;
        self.state.sending.store(false, Ordering::SeqCst);

        // A reset while the request was out invalidates whatever came back.
        if self.state.generation.load(Ordering::SeqCst) != generation {
            return OtpRequestOutcome::Ignored;
        }

        match reply {
            Ok(ServiceReply::Success(_)) => {
                self.begin_cooldown();
                OtpRequestOutcome::Started
            }
            Ok(ServiceReply::Rejected { message }) => OtpRequestOutcome::Rejected(message),
            Err(e) => {
                tracing::warn!(error = %e, purpose = %self.purpose, "Passcode request failed");
                OtpRequestOutcome::Unavailable(RETRY_MESSAGE.to_string())
            }
        }
    }

    /// Return to Idle, cancelling the pending tick and invalidating any
    /// in-flight request.
    pub fn reset(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state.code_requested.store(false, Ordering::SeqCst);
        self.state.seconds_remaining.store(0, Ordering::SeqCst);
        self.cancel_ticker();
    }

    fn begin_cooldown(&self) {
        self.state.code_requested.store(true, Ordering::SeqCst);
        self.state
            .seconds_remaining
            .store(OTP_COOLDOWN_SECS, Ordering::SeqCst);

        let state = Arc::clone(&self.state);
        let generation = state.generation.load(Ordering::SeqCst);
        let handle = tokio::spawn(async move {
            loop {
                // Single-shot tick; the next one is scheduled only after
                // this one has run.
                tokio::time::sleep(Duration::from_secs(1)).await;
                if state.generation.load(Ordering::SeqCst) != generation {
                    break;
                }
                let remaining = state.seconds_remaining.load(Ordering::SeqCst);
                if remaining == 0 {
                    break;
                }
                let next = remaining - 1;
                state.seconds_remaining.store(next, Ordering::SeqCst);
                if next == 0 {
                    break;
                }
            }
        });

        if let Some(previous) = self.swap_ticker(Some(handle)) {
            previous.abort();
        }
    }

    fn cancel_ticker(&self) {
        if let Some(handle) = self.swap_ticker(None) {
            handle.abort();
        }
    }

    fn swap_ticker(&self, handle: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        match self.ticker.lock() {
            Ok(mut ticker) => std::mem::replace(&mut *ticker, handle),
            Err(_) => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn begin_cooldown_for_test(&self) {
        self.begin_cooldown();
    }
}

impl Drop for OtpChallenge {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn mock_client(server: &wiremock::MockServer) -> RegistryClient {
        RegistryClient::new(server.uri())
    }

    fn captcha_success() -> wiremock::ResponseTemplate {
        wiremock::ResponseTemplate::new(200).set_body_raw(
            serde_json::json!({
                "data": true,
                "status": "SUCCESS",
                "message": "Success"
            })
            .to_string(),
            "application/json",
        )
    }

    #[test]
    fn new_challenge_is_idle() {
        let challenge = OtpChallenge::new(OtpPurpose::Register);
        assert_eq!(challenge.phase(), OtpPhase::Idle);
        assert_eq!(
            challenge.snapshot(),
            OtpSnapshot {
                code_requested: false,
                seconds_remaining: 0,
                send_disabled: false,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_counts_down_to_exactly_zero() {
        let challenge = OtpChallenge::new(OtpPurpose::Register);
        challenge.begin_cooldown_for_test();

        assert_eq!(challenge.seconds_remaining(), OTP_COOLDOWN_SECS);
        assert_eq!(challenge.phase(), OtpPhase::CoolingDown);
        assert!(challenge.send_disabled());

        for expected in (0..OTP_COOLDOWN_SECS).rev() {
            tokio::time::advance(Duration::from_secs(1)).await;
            settle().await;
            assert_eq!(challenge.seconds_remaining(), expected);
        }

        assert_eq!(challenge.phase(), OtpPhase::Ready);
        assert!(challenge.code_requested());
        assert!(!challenge.send_disabled());

        // The counter never goes below zero.
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(challenge.seconds_remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_a_running_cooldown() {
        let challenge = OtpChallenge::new(OtpPurpose::UpdatePassword);
        challenge.begin_cooldown_for_test();

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(challenge.seconds_remaining(), OTP_COOLDOWN_SECS - 3);

        challenge.reset();
        assert_eq!(challenge.phase(), OtpPhase::Idle);
        assert_eq!(challenge.seconds_remaining(), 0);
        assert!(!challenge.code_requested());

        // No stale tick fires after the reset.
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(challenge.seconds_remaining(), 0);
    }

    #[tokio::test]
    async fn successful_request_starts_the_cooldown() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/captcha/send"))
            .and(wiremock::matchers::query_param("email", "user@example.com"))
            .and(wiremock::matchers::query_param("type", "REGISTER"))
            .respond_with(captcha_success())
            .expect(1)
            .mount(&server)
            .await;

        let challenge = OtpChallenge::new(OtpPurpose::Register);
        let outcome = challenge
            .request_code(&mock_client(&server), "user@example.com")
            .await;

        assert_eq!(outcome, OtpRequestOutcome::Started);
        assert!(challenge.code_requested());
        assert_eq!(challenge.seconds_remaining(), OTP_COOLDOWN_SECS);
        assert!(challenge.send_disabled());
        assert_eq!(challenge.phase(), OtpPhase::CoolingDown);

        // The cooldown throttles the follow-up; the mock's expect(1) proves
        // nothing further was sent.
        let second = challenge
            .request_code(&mock_client(&server), "user@example.com")
            .await;
        assert_eq!(second, OtpRequestOutcome::Throttled);
    }

    #[tokio::test]
    async fn rejected_request_leaves_the_challenge_idle() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/captcha/send"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_raw(
                serde_json::json!({
                    "data": null,
                    "status": "FAIL",
                    "message": "email already registered"
                })
                .to_string(),
                "application/json",
            ))
            .mount(&server)
            .await;

        let challenge = OtpChallenge::new(OtpPurpose::Register);
        let outcome = challenge
            .request_code(&mock_client(&server), "user@example.com")
            .await;

        assert_eq!(
            outcome,
            OtpRequestOutcome::Rejected("email already registered".to_string())
        );
        assert_eq!(challenge.phase(), OtpPhase::Idle);
        assert!(!challenge.send_disabled());
    }

    #[tokio::test]
    async fn unreachable_service_leaves_the_challenge_idle() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/captcha/send"))
            .respond_with(wiremock::ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let challenge = OtpChallenge::new(OtpPurpose::UpdatePassword);
        let outcome = challenge
            .request_code(&mock_client(&server), "user@example.com")
            .await;

        assert_eq!(outcome, OtpRequestOutcome::Unavailable(RETRY_MESSAGE.to_string()));
        assert_eq!(challenge.phase(), OtpPhase::Idle);
        assert_eq!(challenge.seconds_remaining(), 0);
    }

    #[tokio::test]
    async fn empty_email_is_rejected_without_a_request() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/captcha/send"))
            .respond_with(captcha_success())
            .expect(0)
            .mount(&server)
            .await;

        let challenge = OtpChallenge::new(OtpPurpose::Register);
        let outcome = challenge.request_code(&mock_client(&server), "   ").await;

        assert_eq!(
            outcome,
            OtpRequestOutcome::Rejected("Please input your email!".to_string())
        );
    }

    #[tokio::test]
    async fn send_is_disabled_while_a_request_is_in_flight() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/captcha/send"))
            .respond_with(captcha_success().set_delay(Duration::from_millis(200)))
            .expect(1)
            .mount(&server)
            .await;

        let challenge = Arc::new(OtpChallenge::new(OtpPurpose::Register));
        let client = mock_client(&server);

        let background = {
            let challenge = Arc::clone(&challenge);
            let client = client.clone();
            tokio::spawn(async move { challenge.request_code(&client, "user@example.com").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(challenge.send_disabled());
        assert_eq!(challenge.seconds_remaining(), 0);

        let concurrent = challenge.request_code(&client, "user@example.com").await;
        assert_eq!(concurrent, OtpRequestOutcome::Throttled);

        let first = background.await.unwrap();
        assert_eq!(first, OtpRequestOutcome::Started);
    }

    #[tokio::test]
    async fn reset_during_flight_discards_the_reply() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/captcha/send"))
            .respond_with(captcha_success().set_delay(Duration::from_millis(200)))
            .mount(&server)
            .await;

        let challenge = Arc::new(OtpChallenge::new(OtpPurpose::Register));
        let client = mock_client(&server);

        let background = {
            let challenge = Arc::clone(&challenge);
            tokio::spawn(async move { challenge.request_code(&client, "user@example.com").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        challenge.reset();

        let outcome = background.await.unwrap();
        assert_eq!(outcome, OtpRequestOutcome::Ignored);
        assert_eq!(challenge.phase(), OtpPhase::Idle);
        assert_eq!(challenge.seconds_remaining(), 0);
    }
}
