mod anonymous;
pub mod oidc;
mod sessions;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::Uri;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::SignedCookieJar;
use std::sync::Arc;

use crate::config::{AuthMode, DashboardConfig};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub use anonymous::AnonymousGate;
pub use oidc::OidcGate;
pub use sessions::SessionStore;

pub const SESSION_COOKIE: &str = "velero_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Viewer,
    Operator,
    Admin,
}

impl Role {
    pub fn parse(role: &str) -> Option<Self> {
        match role.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "operator" | "control" => Some(Self::Operator),
            "view" | "viewer" | "readonly" | "read-only" | "read_only" => Some(Self::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Operator => "operator",
            Self::Admin => "admin",
        }
    }
}

/// The signed-in user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("anonymous")
    }
}

#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub location: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct LoginCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// `None` when the gate keeps no sessions.
    pub session_id: Option<String>,
    pub next: String,
}

/// Everything the routes need from the identity provider.
#[async_trait]
pub trait IdentityGate: Send + Sync {
    async fn current_identity(&self, session_id: Option<&str>) -> Option<Identity>;

    /// Starts a login and returns where to send the browser. `next` is the local path to
    /// come back to once the provider is done.
    async fn require_login(&self, next: &str) -> AppResult<LoginRedirect>;

    async fn complete_login(&self, callback: &LoginCallback) -> AppResult<LoginOutcome>;

    async fn logout(&self, session_id: Option<&str>);

    async fn prune_expired(&self) -> usize {
        0
    }
}

pub fn build_gate(config: &DashboardConfig) -> anyhow::Result<Arc<dyn IdentityGate>> {
    let gate: Arc<dyn IdentityGate> = match config.auth_mode {
        AuthMode::None => {
            tracing::warn!("authentication disabled; every request acts as an anonymous admin");
            Arc::new(AnonymousGate)
        }
        AuthMode::Oidc => Arc::new(OidcGate::from_config(config)?),
    };
    Ok(gate)
}

pub fn require_role(identity: &Identity, required: Role) -> AppResult<()> {
    if identity.role >= required {
        return Ok(());
    }
    Err(AppError::forbidden(format!(
        "Requires the {} role",
        required.as_str()
    )))
}

pub fn session_cookie(session_id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn session_id(jar: &SignedCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Only local absolute paths are followed after login; anything else goes home.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

fn login_redirect(uri: &Uri) -> Redirect {
    let next = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or("/");
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    Redirect::to(&format!("/login?next={encoded}"))
}

/// Route layer for every dashboard page: resolves the caller or sends them to `/login`.
pub async fn require_session(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session = session_id(&jar);
    match state.gate.current_identity(session.as_deref()).await {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        None => {
            tracing::debug!(path = %req.uri().path(), "no session; redirecting to login");
            login_redirect(req.uri()).into_response()
        }
    }
}
