use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::auth::IdentityGate;

/// Periodically drops expired sessions and abandoned logins from the identity gate.
pub struct SessionSweeper {
    gate: Arc<dyn IdentityGate>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(gate: Arc<dyn IdentityGate>, interval: Duration) -> Self {
        Self { gate, interval }
    }

    pub fn start(self, cancel: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let pruned = self.gate.prune_expired().await;
                        if pruned > 0 {
                            tracing::debug!(pruned, "pruned expired sessions");
                        }
                    }
                }
            }
        });
    }
}
