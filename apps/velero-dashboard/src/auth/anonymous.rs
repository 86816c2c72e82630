use async_trait::async_trait;

use super::{Identity, IdentityGate, LoginCallback, LoginOutcome, LoginRedirect, Role};
use crate::error::AppResult;

/// Used when authentication is turned off: every caller is an anonymous admin.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousGate;

#[async_trait]
impl IdentityGate for AnonymousGate {
    async fn current_identity(&self, _session_id: Option<&str>) -> Option<Identity> {
        Some(Identity {
            name: Some("anonymous".to_string()),
            email: None,
            role: Role::Admin,
        })
    }

    async fn require_login(&self, next: &str) -> AppResult<LoginRedirect> {
        Ok(LoginRedirect {
            location: next.to_string(),
        })
    }

    async fn complete_login(&self, _callback: &LoginCallback) -> AppResult<LoginOutcome> {
        Ok(LoginOutcome {
            session_id: None,
            next: "/".to_string(),
        })
    }

    async fn logout(&self, _session_id: Option<&str>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn everyone_is_an_admin() {
        let identity = AnonymousGate.current_identity(None).await.unwrap();
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.display_name(), "anonymous");
        let redirect = AnonymousGate.require_login("/backups").await.unwrap();
        assert_eq!(redirect.location, "/backups");
    }
}
