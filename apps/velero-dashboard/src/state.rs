use crate::auth::IdentityGate;
use crate::config::DashboardConfig;
use crate::velero::VeleroClient;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: DashboardConfig,
    pub velero: Arc<dyn VeleroClient>,
    pub gate: Arc<dyn IdentityGate>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        velero: Arc<dyn VeleroClient>,
        gate: Arc<dyn IdentityGate>,
    ) -> Self {
        let cookie_key = cookie_key(&config.session_secret);
        Self {
            config,
            velero,
            gate,
            cookie_key,
        }
    }
}

/// Cookie signing needs 64 bytes of key material; any secret length is stretched to that.
fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}
