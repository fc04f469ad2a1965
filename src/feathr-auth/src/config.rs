//! Runtime configuration of the route-authorization toggle.

use std::sync::OnceLock;

use crate::constants::ENABLE_RBAC_ENV_VAR;

/// Build-time default for the RBAC toggle, compiled in when the build sets
/// it.
const BUILD_TIME_ENABLE_RBAC: Option<&str> = option_env!("FEATHR_BUILD_ENABLE_RBAC");

static RBAC_ENABLED: OnceLock<bool> = OnceLock::new();

/// Whether role-based access control is enabled for this process.
///
/// The runtime-injected environment value wins over the build-time default;
/// only the literal `true` enables the toggle. Resolved once and cached for
/// the lifetime of the process.
pub fn rbac_enabled() -> bool {
    *RBAC_ENABLED.get_or_init(|| {
        resolve(
            std::env::var(ENABLE_RBAC_ENV_VAR).ok().as_deref(),
            BUILD_TIME_ENABLE_RBAC,
        )
    })
}

fn resolve(runtime: Option<&str>, build_time: Option<&str>) -> bool {
    runtime.filter(|v| !v.is_empty()).or(build_time) == Some("true")
}
