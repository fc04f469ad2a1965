//! Identity-platform seam, header identity and logout.

use crate::store::CredentialStore;
use crate::types::{Navigation, Transition};

/// An account known to the enterprise identity platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAccount {
    /// Login name reported by the platform.
    pub username: String,
}

/// Boundary to the enterprise identity platform SDK.
///
/// Only the slivers the console relies on are modeled: the signed-in
/// accounts and the redirect logout.
pub trait IdentityPlatform: Send + Sync {
    /// Accounts currently signed in, most recent first.
    fn accounts(&self) -> Vec<PlatformAccount>;

    /// Begin the platform's redirect logout.
    fn begin_logout(&self) -> anyhow::Result<()>;
}

/// Resolve the identity shown in the header.
///
/// The first platform account wins when a platform is attached; the
/// persisted principal serves as the fallback source.
pub fn display_identity(
    platform: Option<&dyn IdentityPlatform>,
    store: &dyn CredentialStore,
) -> Option<String> {
    if let Some(platform) = platform {
        if let Some(account) = platform.accounts().into_iter().next() {
            return Some(account.username);
        }
    }
    store.read().principal().map(str::to_string)
}

/// Log out: best-effort platform redirect logout, then drop the session
/// token and land on the login screen.
///
/// Platform failures are logged and never block the local teardown. The
/// principal and organization stay persisted, matching the token-only
/// clear.
pub fn logout(store: &dyn CredentialStore, platform: Option<&dyn IdentityPlatform>) -> Transition {
    if let Some(platform) = platform {
        if let Err(e) = platform.begin_logout() {
            tracing::warn!(error = %e, "Platform logout failed");
        }
    }
    if let Err(e) = store.clear_token() {
        tracing::warn!(error = %e, "Failed to clear session token");
    }
    Transition::to(Navigation::Login)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TOKEN_TTL_DAYS;
    use crate::store::MemoryCredentialStore;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakePlatform {
        accounts: Vec<PlatformAccount>,
        logout_fails: bool,
        logged_out: AtomicBool,
    }

    impl FakePlatform {
        fn with_accounts(names: &[&str]) -> Self {
            Self {
                accounts: names
                    .iter()
                    .map(|name| PlatformAccount {
                        username: name.to_string(),
                    })
                    .collect(),
                logout_fails: false,
                logged_out: AtomicBool::new(false),
            }
        }

        fn failing() -> Self {
            Self {
                accounts: Vec::new(),
                logout_fails: true,
                logged_out: AtomicBool::new(false),
            }
        }
    }

    impl IdentityPlatform for FakePlatform {
        fn accounts(&self) -> Vec<PlatformAccount> {
            self.accounts.clone()
        }

        fn begin_logout(&self) -> anyhow::Result<()> {
            self.logged_out.store(true, Ordering::SeqCst);
            if self.logout_fails {
                anyhow::bail!("redirect logout failed")
            }
            Ok(())
        }
    }

    fn seeded_store() -> MemoryCredentialStore {
        let store = MemoryCredentialStore::new();
        store
            .write("tok", TOKEN_TTL_DAYS, "stored@example.com", "org-1")
            .unwrap();
        store
    }

    #[test]
    fn platform_account_wins_over_stored_principal() {
        let store = seeded_store();
        let platform = FakePlatform::with_accounts(&["okta-user", "older-user"]);

        let identity = display_identity(Some(&platform), &store);
        assert_eq!(identity, Some("okta-user".to_string()));
    }

    #[test]
    fn stored_principal_is_the_fallback() {
        let store = seeded_store();
        let platform = FakePlatform::with_accounts(&[]);

        assert_eq!(
            display_identity(Some(&platform), &store),
            Some("stored@example.com".to_string())
        );
        assert_eq!(
            display_identity(None, &store),
            Some("stored@example.com".to_string())
        );
    }

    #[test]
    fn no_identity_anywhere_resolves_to_none() {
        let store = MemoryCredentialStore::new();
        assert_eq!(display_identity(None, &store), None);
    }

    #[test]
    fn logout_clears_the_token_and_lands_on_login() {
        let store = seeded_store();
        let platform = FakePlatform::with_accounts(&["okta-user"]);

        let transition = logout(&store, Some(&platform));

        assert_eq!(transition, Transition::to(Navigation::Login));
        assert!(platform.logged_out.load(Ordering::SeqCst));
        let creds = store.read();
        assert!(!creds.has_token());
        // Token-only clear: the profile survives.
        assert_eq!(creds.principal(), Some("stored@example.com"));
        assert_eq!(creds.organization_id(), Some("org-1"));
    }

    #[test]
    fn platform_failure_never_blocks_the_local_teardown() {
        let store = seeded_store();
        let platform = FakePlatform::failing();

        let transition = logout(&store, Some(&platform));

        assert_eq!(transition.navigate, Navigation::Login);
        assert!(!store.has_token());
    }
}
