//! Periodic housekeeping tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use hearth_core::SessionRepository;

/// Sweep expired sessions on a fixed interval. Runs until the process
/// exits; failures are logged and the next tick retries.
pub async fn purge_sessions_periodically(
    sessions: Arc<dyn SessionRepository>,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately, which also cleans up after a
    // long downtime.
    loop {
        ticker.tick().await;
        match sessions.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => {
                info!(subsystem = "api", op = "purge_sessions", purged, "Expired sessions removed");
            }
            Err(e) => {
                warn!(subsystem = "api", op = "purge_sessions", error = %e, "Session sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hearth_core::{Session, User};
    use std::sync::atomic::{AtomicU64, Ordering};
    use uuid::Uuid;

    #[derive(Default)]
    struct CountingSessions {
        sweeps: AtomicU64,
    }

    #[async_trait]
    impl SessionRepository for CountingSessions {
        async fn create(&self, _user_id: Uuid, _ttl_secs: i64) -> hearth_core::Result<Session> {
            unreachable!("not exercised by the sweep")
        }

        async fn get_user(&self, _token: &str) -> hearth_core::Result<Option<User>> {
            unreachable!("not exercised by the sweep")
        }

        async fn delete(&self, _token: &str) -> hearth_core::Result<()> {
            unreachable!("not exercised by the sweep")
        }

        async fn purge_expired(&self) -> hearth_core::Result<u64> {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            Ok(3)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_immediately_and_on_each_tick() {
        let sessions = Arc::new(CountingSessions::default());
        let task = tokio::spawn(purge_sessions_periodically(
            sessions.clone(),
            Duration::from_secs(3600),
        ));

        // First tick is immediate.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(sessions.sweeps.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(sessions.sweeps.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(2 * 3600)).await;
        assert!(sessions.sweeps.load(Ordering::SeqCst) >= 3);

        task.abort();
    }
}
