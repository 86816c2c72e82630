use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::auth::{
    Identity, IdentityGate, LoginCallback, LoginOutcome, LoginRedirect, Role,
};
use crate::config::{AuthMode, DashboardConfig};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::velero::{CommandError, VeleroClient};

pub fn test_config() -> DashboardConfig {
    DashboardConfig {
        velero_bin: PathBuf::from("/usr/local/bin/velero"),
        kubeconfig: PathBuf::from("/tmp/config"),
        session_secret: "test-session-secret".to_string(),
        session_lifetime_days: 365,
        auth_mode: AuthMode::Oidc,
        oidc_client_secrets: PathBuf::from("client_secrets.json"),
        oidc_scopes: vec!["openid".to_string(), "email".to_string()],
        oidc_realm: "master".to_string(),
        oidc_redirect_uri: None,
        oidc_admin_groups: Vec::new(),
        oidc_operator_groups: Vec::new(),
        default_role: Role::Admin,
        cookie_secure: false,
        mail_from: "backups@example.com".to_string(),
        static_root: None,
        debug: false,
    }
}

/// Scripted velero: answers only the subcommands it was given and records every call.
#[derive(Default)]
pub struct FakeVelero {
    structured: HashMap<String, JsonValue>,
    text: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeVelero {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structured(mut self, subcommand: &str, document: JsonValue) -> Self {
        self.structured.insert(subcommand.to_string(), document);
        self
    }

    pub fn with_text(mut self, subcommand: &str, output: &str) -> Self {
        self.text.insert(subcommand.to_string(), output.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, subcommand: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(subcommand.to_string());
        }
    }

    fn unscripted(subcommand: &str) -> CommandError {
        CommandError::Failed {
            command: format!("velero {subcommand}"),
            status: Some(1),
            stderr: "An error occurred: unscripted command".to_string(),
        }
    }
}

#[async_trait]
impl VeleroClient for FakeVelero {
    async fn structured(&self, subcommand: &str) -> Result<JsonValue, CommandError> {
        self.record(subcommand);
        self.structured
            .get(subcommand)
            .cloned()
            .ok_or_else(|| Self::unscripted(subcommand))
    }

    async fn text(&self, subcommand: &str) -> Result<String, CommandError> {
        self.record(subcommand);
        self.text
            .get(subcommand)
            .cloned()
            .ok_or_else(|| Self::unscripted(subcommand))
    }
}

pub const FAKE_SESSION: &str = "fake-session";

/// Identity gate with a fixed answer, independent of any identity provider.
pub struct FakeGate {
    identity: Option<Identity>,
}

impl FakeGate {
    pub fn signed_in(role: Role) -> Self {
        Self {
            identity: Some(Identity {
                name: Some("Ana".to_string()),
                email: Some("ana@example.com".to_string()),
                role,
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl IdentityGate for FakeGate {
    async fn current_identity(&self, _session_id: Option<&str>) -> Option<Identity> {
        self.identity.clone()
    }

    async fn require_login(&self, next: &str) -> AppResult<LoginRedirect> {
        let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
        Ok(LoginRedirect {
            location: format!("https://sso.example.com/auth?state={encoded}"),
        })
    }

    async fn complete_login(&self, callback: &LoginCallback) -> AppResult<LoginOutcome> {
        if callback.code.is_none() {
            return Err(AppError::bad_request("Missing authorization code"));
        }
        Ok(LoginOutcome {
            session_id: Some(FAKE_SESSION.to_string()),
            next: callback.state.clone().unwrap_or_else(|| "/".to_string()),
        })
    }

    async fn logout(&self, _session_id: Option<&str>) {}
}

pub fn test_state(velero: FakeVelero, gate: FakeGate) -> (AppState, Arc<FakeVelero>) {
    let velero = Arc::new(velero);
    let state = AppState::new(test_config(), velero.clone(), Arc::new(gate));
    (state, velero)
}

pub fn test_state_signed_in(role: Role) -> AppState {
    test_state(FakeVelero::new(), FakeGate::signed_in(role)).0
}
