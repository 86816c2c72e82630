use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::Identity;

/// How long a login may sit at the identity provider before its state is forgotten.
const PENDING_LOGIN_TTL_MINUTES: i64 = 10;

/// Logins in flight kept at once; past this the oldest is forgotten.
const MAX_PENDING_LOGINS: usize = 1024;

#[derive(Debug)]
struct SessionEntry {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
struct PendingLogin {
    next: String,
    expires_at: DateTime<Utc>,
    seq: u64,
}

/// In-memory sessions plus the CSRF states of logins in flight.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    pending: RwLock<HashMap<String, PendingLogin>>,
    pending_seq: AtomicU64,
    ttl: ChronoDuration,
}

impl SessionStore {
    pub fn new(lifetime_days: u32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
            pending_seq: AtomicU64::new(0),
            ttl: ChronoDuration::days(i64::from(lifetime_days)),
        }
    }

    pub async fn issue(&self, identity: Identity) -> String {
        let token = random_token();
        let expires_at = Utc::now() + self.ttl;
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            token.clone(),
            SessionEntry {
                identity,
                expires_at,
            },
        );
        token
    }

    pub async fn resolve(&self, token: &str) -> Option<Identity> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get(token)?;
        if entry.expires_at <= Utc::now() {
            sessions.remove(token);
            return None;
        }
        Some(entry.identity.clone())
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Remembers where to go after login and returns the state to hand the provider.
    pub async fn begin_login(&self, next: String) -> String {
        let state = random_token();
        let now = Utc::now();
        let expires_at = now + ChronoDuration::minutes(PENDING_LOGIN_TTL_MINUTES);
        let mut pending = self.pending.write().await;
        if pending.len() >= MAX_PENDING_LOGINS {
            pending.retain(|_, entry| entry.expires_at > now);
        }
        while pending.len() >= MAX_PENDING_LOGINS {
            let Some(oldest) = pending
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            pending.remove(&oldest);
        }
        let seq = self.pending_seq.fetch_add(1, Ordering::Relaxed);
        pending.insert(
            state.clone(),
            PendingLogin {
                next,
                expires_at,
                seq,
            },
        );
        state
    }

    /// Consumes a login state. Each state is accepted at most once.
    pub async fn finish_login(&self, state: &str) -> Option<String> {
        let pending = self.pending.write().await.remove(state)?;
        if pending.expires_at <= Utc::now() {
            return None;
        }
        Some(pending.next)
    }

    pub async fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, entry| entry.expires_at > now);
            removed += before - sessions.len();
        }
        let mut pending = self.pending.write().await;
        let before = pending.len();
        pending.retain(|_, entry| entry.expires_at > now);
        removed + (before - pending.len())
    }
}

fn random_token() -> String {
    let mut buf = [0u8; 32];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
