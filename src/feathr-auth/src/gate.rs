//! Session gate: decides what the root layout renders for a path.

use crate::types::Navigation;

/// Paths that belong to the unauthenticated flows and never carry the
/// protected shell.
const UNAUTHENTICATED_PATHS: [&str; 5] = [
    "/login",
    "/sign-up",
    "/forgot-password",
    "/login/callback",
    "/guide",
];

/// Decision for one render of the root layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    /// Render the protected chrome (header and side menu) around the page.
    pub render_shell: bool,
    /// Redirect the browser before rendering anything.
    pub redirect: Option<Navigation>,
}

/// Decide what to render for `path` given token presence.
///
/// Unauthenticated-flow paths always render bare. Every other path requires
/// a token; without one the decision is a redirect to the login screen
/// rather than a protected page rendered without credentials.
pub fn evaluate_route(has_token: bool, path: &str) -> GateDecision {
    if UNAUTHENTICATED_PATHS.contains(&path) {
        return GateDecision {
            render_shell: false,
            redirect: None,
        };
    }
    if !has_token {
        return GateDecision {
            render_shell: false,
            redirect: Some(Navigation::Login),
        };
    }
    GateDecision {
        render_shell: true,
        redirect: None,
    }
}
