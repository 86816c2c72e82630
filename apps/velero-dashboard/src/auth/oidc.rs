//! OpenID Connect authorization-code login against the provider named in the client
//! secrets file.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use url::Url;

use super::{
    safe_next, Identity, IdentityGate, LoginCallback, LoginOutcome, LoginRedirect, Role,
    SessionStore,
};
use crate::config::DashboardConfig;
use crate::error::{AppError, AppResult};

/// The `web` client registration, in the layout identity providers export for web apps.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub userinfo_uri: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    web: ClientRegistration,
}

impl ClientRegistration {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read OIDC client secrets {}", path.display()))?;
        let file: ClientSecretsFile = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse OIDC client secrets {}", path.display()))?;
        Ok(file.web)
    }
}

#[derive(Debug, Clone)]
pub struct RoleMapping {
    pub admin_groups: Vec<String>,
    pub operator_groups: Vec<String>,
    pub default_role: Role,
}

impl RoleMapping {
    pub fn role_for(&self, groups: &[String]) -> Role {
        let member_of = |wanted: &[String]| groups.iter().any(|group| wanted.contains(group));
        if member_of(&self.admin_groups) {
            Role::Admin
        } else if member_of(&self.operator_groups) {
            Role::Operator
        } else {
            self.default_role
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    groups: Vec<String>,
}

pub struct OidcGate {
    registration: ClientRegistration,
    auth_url: Url,
    redirect_uri: String,
    scopes: Vec<String>,
    roles: RoleMapping,
    sessions: SessionStore,
    http: reqwest::Client,
}

impl OidcGate {
    pub fn new(
        registration: ClientRegistration,
        redirect_uri: String,
        scopes: Vec<String>,
        roles: RoleMapping,
        sessions: SessionStore,
    ) -> anyhow::Result<Self> {
        let auth_url = Url::parse(&registration.auth_uri)
            .with_context(|| format!("invalid auth_uri {:?}", registration.auth_uri))?;
        Ok(Self {
            registration,
            auth_url,
            redirect_uri,
            scopes,
            roles,
            sessions,
            http: reqwest::Client::new(),
        })
    }

    pub fn from_config(config: &DashboardConfig) -> anyhow::Result<Self> {
        let registration = ClientRegistration::load(&config.oidc_client_secrets)?;
        let redirect_uri = config
            .oidc_redirect_uri
            .clone()
            .or_else(|| registration.redirect_uris.first().cloned())
            .context("no OIDC redirect URI: set DASHBOARD_OIDC_REDIRECT_URI or list one in web.redirect_uris")?;
        tracing::info!(
            client_id = %registration.client_id,
            issuer = ?registration.issuer,
            realm = %config.oidc_realm,
            redirect_uri = %redirect_uri,
            "OIDC login configured"
        );
        Self::new(
            registration,
            redirect_uri,
            config.oidc_scopes.clone(),
            RoleMapping {
                admin_groups: config.oidc_admin_groups.clone(),
                operator_groups: config.oidc_operator_groups.clone(),
                default_role: config.default_role,
            },
            SessionStore::new(config.session_lifetime_days),
        )
    }

    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.registration.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> AppResult<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.registration.client_id.as_str()),
            ("client_secret", self.registration.client_secret.as_str()),
        ];
        let response = self
            .http
            .post(&self.registration.token_uri)
            .form(&params)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(provider_error)?;
        response.json().await.map_err(provider_error)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> AppResult<UserInfo> {
        let response = self
            .http
            .get(&self.registration.userinfo_uri)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(provider_error)?;
        response.json().await.map_err(provider_error)
    }
}

fn provider_error(err: reqwest::Error) -> AppError {
    tracing::warn!(error = %err, "identity provider request failed");
    AppError::bad_gateway("Identity provider request failed")
}

#[async_trait]
impl IdentityGate for OidcGate {
    async fn current_identity(&self, session_id: Option<&str>) -> Option<Identity> {
        self.sessions.resolve(session_id?).await
    }

    async fn require_login(&self, next: &str) -> AppResult<LoginRedirect> {
        let state = self.sessions.begin_login(safe_next(Some(next))).await;
        Ok(LoginRedirect {
            location: self.authorization_url(&state),
        })
    }

    async fn complete_login(&self, callback: &LoginCallback) -> AppResult<LoginOutcome> {
        if let Some(error) = callback.error.as_deref() {
            tracing::warn!(
                error = %error,
                description = ?callback.error_description,
                "identity provider rejected login"
            );
            return Err(AppError::unauthorized(format!(
                "Login rejected by identity provider: {error}"
            )));
        }
        let state = callback
            .state
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("Missing login state"))?;
        let next = self
            .sessions
            .finish_login(state)
            .await
            .ok_or_else(|| AppError::unauthorized("Unknown or expired login state"))?;
        let code = callback
            .code
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::bad_request("Missing authorization code"))?;

        let token = self.exchange_code(code).await?;
        let info = self.fetch_userinfo(&token.access_token).await?;
        let identity = Identity {
            name: info.name.or(info.preferred_username),
            email: info.email,
            role: self.roles.role_for(&info.groups),
        };
        tracing::info!(
            user = %identity.display_name(),
            role = identity.role.as_str(),
            "login completed"
        );
        let session_id = self.sessions.issue(identity).await;
        Ok(LoginOutcome {
            session_id: Some(session_id),
            next,
        })
    }

    async fn logout(&self, session_id: Option<&str>) {
        if let Some(session_id) = session_id {
            self.sessions.revoke(session_id).await;
        }
    }

    async fn prune_expired(&self) -> usize {
        self.sessions.prune_expired().await
    }
}
