//! Persisted session state.
//!
//! Credentials live in two tiers under the console state directory
//! (`~/.feathr` unless `FEATHR_HOME` overrides it): a session document
//! holding the token with an explicit expiry, and a profile document holding
//! the principal's display identity and active organization with no managed
//! expiry. Reads never fail; missing, corrupt or expired state degrades to
//! empty fields so a cleared disk looks exactly like a signed-out console.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

use crate::constants::FEATHR_HOME_ENV_VAR;

/// Name of the expiring session document.
const SESSION_FILE: &str = "session.json";

/// Name of the non-expiring profile document.
const PROFILE_FILE: &str = "profile.json";

/// Seconds in a day, for expiry arithmetic.
const SECS_PER_DAY: i64 = 86_400;

/// In-memory snapshot of the persisted credentials.
///
/// The token is held as a [`SecretString`] so it stays redacted in debug
/// output and is wiped on drop.
#[derive(Debug, Clone, Default)]
pub struct StoredCredentials {
    token: Option<SecretString>,
    principal: Option<String>,
    organization_id: Option<String>,
}

impl StoredCredentials {
    pub(crate) fn new(
        token: Option<String>,
        principal: Option<String>,
        organization_id: Option<String>,
    ) -> Self {
        Self {
            token: token.map(SecretString::from),
            principal,
            organization_id,
        }
    }

    /// The session token, if present and unexpired. Exposes the secret, so
    /// call it only at the point of use.
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret())
    }

    /// Whether an unexpired session token is present.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Display identity of the principal, if one was persisted.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Active organization, if one was persisted.
    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }
}

/// Interface the flow controllers use to reach persisted session state.
///
/// Implementations must treat `read` as infallible: missing, corrupt or
/// expired state yields empty fields rather than an error.
pub trait CredentialStore: Send + Sync {
    /// Persist a full credential set: the token with `expiry_days` of
    /// validity, the principal identity and the organization without a
    /// managed expiry.
    fn write(
        &self,
        token: &str,
        expiry_days: i64,
        principal: &str,
        organization_id: &str,
    ) -> Result<()>;

    /// Read the current snapshot.
    fn read(&self) -> StoredCredentials;

    /// Remove the session token. The principal identity and organization are
    /// deliberately left in place.
    fn clear_token(&self) -> Result<()>;

    /// Whether an unexpired session token is currently persisted.
    fn has_token(&self) -> bool {
        self.read().has_token()
    }
}

/// Persisted format of the expiring session tier.
#[derive(serde::Serialize, serde::Deserialize)]
struct SessionDocument {
    token: String,
    expires_at: i64,
}

impl SessionDocument {
    fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at
    }
}

/// Persisted format of the non-expiring profile tier.
#[derive(Default, serde::Serialize, serde::Deserialize)]
struct ProfileDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    organization_id: Option<String>,
    /// Superseded key still found in documents written by older console
    /// builds. Honored on read, never written back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temp_organization_id: Option<String>,
}

impl ProfileDocument {
    /// Active organization, preferring the canonical key.
    fn organization(&self) -> Option<&str> {
        self.organization_id
            .as_deref()
            .or(self.temp_organization_id.as_deref())
    }
}

/// File-backed credential store rooted at the console state directory.
pub struct FileCredentialStore {
    home: PathBuf,
}

impl FileCredentialStore {
    /// Create a store rooted at the default state directory, honoring the
    /// `FEATHR_HOME` override.
    pub fn new() -> Result<Self> {
        let home = match std::env::var_os(FEATHR_HOME_ENV_VAR) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .context("Failed to resolve home directory")?
                .join(".feathr"),
        };
        Ok(Self { home })
    }

    /// Create a store rooted at an explicit directory.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Rewrite a profile document still using the superseded organization
    /// key. Returns whether a rewrite happened.
    pub fn migrate_legacy_profile(&self) -> Result<bool> {
        let profile = self.load_profile();
        if profile.temp_organization_id.is_none() {
            return Ok(false);
        }
        let migrated = ProfileDocument {
            user_name: profile.user_name,
            organization_id: profile.organization_id.or(profile.temp_organization_id),
            temp_organization_id: None,
        };
        self.write_document(&self.profile_path(), &migrated)?;
        tracing::info!("Migrated profile document to canonical organization key");
        Ok(true)
    }

    fn session_path(&self) -> PathBuf {
        self.home.join(SESSION_FILE)
    }

    fn profile_path(&self) -> PathBuf {
        self.home.join(PROFILE_FILE)
    }

    fn load_session(&self) -> Option<SessionDocument> {
        let path = self.session_path();
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to read session document");
                return None;
            }
        };
        match serde_json::from_str::<SessionDocument>(&content) {
            Ok(doc) if doc.is_expired() => {
                tracing::debug!("Stored session token has expired");
                None
            }
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse session document");
                None
            }
        }
    }

    fn load_profile(&self) -> ProfileDocument {
        let path = self.profile_path();
        if !path.exists() {
            return ProfileDocument::default();
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to read profile document");
                return ProfileDocument::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse profile document");
                ProfileDocument::default()
            }
        }
    }

    fn write_document<T: serde::Serialize>(&self, path: &Path, doc: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json =
            serde_json::to_string_pretty(doc).context("Failed to serialize credential document")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        set_file_permissions(path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn write(
        &self,
        token: &str,
        expiry_days: i64,
        principal: &str,
        organization_id: &str,
    ) -> Result<()> {
        let session = SessionDocument {
            token: token.to_string(),
            expires_at: chrono::Utc::now().timestamp() + expiry_days * SECS_PER_DAY,
        };
        self.write_document(&self.session_path(), &session)?;

        // Always re-persist under the canonical key, even when the previous
        // document used the superseded one.
        let profile = ProfileDocument {
            user_name: Some(principal.to_string()),
            organization_id: Some(organization_id.to_string()),
            temp_organization_id: None,
        };
        self.write_document(&self.profile_path(), &profile)?;
        Ok(())
    }

    fn read(&self) -> StoredCredentials {
        let token = self.load_session().map(|doc| doc.token);
        let profile = self.load_profile();
        let organization_id = profile.organization().map(str::to_string);
        StoredCredentials::new(token, profile.user_name, organization_id)
    }

    fn clear_token(&self) -> Result<()> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(());
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete file: {}", path.display()))?;
        Ok(())
    }
}

/// Restrict credential documents to owner read/write on Unix.
#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let permissions = std::fs::Permissions::from_mode(0o600);
    std::fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to set permissions on: {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// In-memory credential store for tests and embedding.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    session: Option<(String, i64)>,
    principal: Option<String>,
    organization_id: Option<String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn write(
        &self,
        token: &str,
        expiry_days: i64,
        principal: &str,
        organization_id: &str,
    ) -> Result<()> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential store lock poisoned"))?;
        let expires_at = chrono::Utc::now().timestamp() + expiry_days * SECS_PER_DAY;
        state.session = Some((token.to_string(), expires_at));
        state.principal = Some(principal.to_string());
        state.organization_id = Some(organization_id.to_string());
        Ok(())
    }

    fn read(&self) -> StoredCredentials {
        let Ok(state) = self.inner.lock() else {
            return StoredCredentials::default();
        };
        let now = chrono::Utc::now().timestamp();
        let token = state
            .session
            .as_ref()
            .filter(|(_, expires_at)| now < *expires_at)
            .map(|(token, _)| token.clone());
        StoredCredentials::new(token, state.principal.clone(), state.organization_id.clone())
    }

    fn clear_token(&self) -> Result<()> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential store lock poisoned"))?;
        state.session = None;
        Ok(())
    }
}
