//! Shared flow types: navigation targets, transitions and outcomes.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::AuthError;

/// Fixed navigation destination a flow can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The protected console root.
    Root,
    /// The login screen.
    Login,
    /// The screen shown to principals with no organization membership.
    AwaitingOrganization,
}

impl Navigation {
    /// Browser path of the destination.
    pub fn as_path(&self) -> &'static str {
        match self {
            Navigation::Root => "/",
            Navigation::Login => "/login",
            Navigation::AwaitingOrganization => "/guide",
        }
    }
}

impl std::fmt::Display for Navigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

/// A navigation the hosting shell must perform, with an optional notice to
/// show first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Where to go.
    pub navigate: Navigation,
    /// Success notice to show before navigating.
    pub notice: Option<String>,
}

impl Transition {
    pub(crate) fn to(navigate: Navigation) -> Self {
        Self {
            navigate,
            notice: None,
        }
    }

    pub(crate) fn with_notice(navigate: Navigation, notice: &str) -> Self {
        Self {
            navigate,
            notice: Some(notice.to_string()),
        }
    }
}

/// How a flow submission resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The flow finished; perform the transition.
    Completed(Transition),
    /// The service rejected the submission; stay on the screen and show the
    /// service's message.
    Rejected(String),
    /// The service could not be reached; stay on the screen and show a
    /// generic retry message.
    Unavailable(String),
    /// The flow cannot continue on this screen; navigate away and show the
    /// message.
    Aborted {
        navigate: Navigation,
        message: String,
    },
}

/// Scoped hold on a flow's in-flight flag, released on every exit path.
pub(crate) struct LoadingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadingGuard<'a> {
    /// Take the flag, refusing if a submission is already in flight.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, AuthError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(AuthError::SubmissionInFlight);
        }
        Ok(Self { flag })
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_paths() {
        assert_eq!(Navigation::Root.as_path(), "/");
        assert_eq!(Navigation::Login.as_path(), "/login");
        assert_eq!(Navigation::AwaitingOrganization.as_path(), "/guide");
        assert_eq!(Navigation::Login.to_string(), "/login");
    }

    #[test]
    fn loading_guard_refuses_second_acquire() {
        let flag = AtomicBool::new(false);

        let guard = LoadingGuard::acquire(&flag);
        assert!(guard.is_ok());
        assert!(flag.load(Ordering::SeqCst));

        let second = LoadingGuard::acquire(&flag);
        assert!(matches!(second, Err(AuthError::SubmissionInFlight)));
    }

    #[test]
    fn loading_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);

        {
            let _guard = LoadingGuard::acquire(&flag);
            assert!(flag.load(Ordering::SeqCst));
        }

        assert!(!flag.load(Ordering::SeqCst));
        assert!(LoadingGuard::acquire(&flag).is_ok());
    }
}
