//! Database reachability tracking.
//!
//! Request handlers never wait on a dead database: they read a flag that a
//! background task keeps current by pinging the pool.

use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use crate::storage::{Liveness, SessionStore};

#[derive(Clone, Default)]
pub struct DbHealth {
    available: Arc<AtomicBool>,
}

impl DbHealth {
    pub fn new() -> Self { Self::default() }

    /// Records a ping result; returns true when the state flipped.
    pub fn record(&self, available: bool) -> bool {
        self.available.swap(available, Ordering::Relaxed) != available
    }

    /// Pings the pool every `interval`, starting immediately.
    pub fn spawn_monitor(&self, pool: PgPool, interval: Duration) {
        let me = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let ok = matches!(
                    tokio::time::timeout(interval, sqlx::query("SELECT 1").execute(&pool)).await,
                    Ok(Ok(_))
                );
                if me.record(ok) {
                    if ok {
                        tracing::info!("database connection established");
                    } else {
                        tracing::warn!("database unreachable, serving offline pages");
                    }
                }
            }
        });
    }
}

impl Liveness for DbHealth {
    fn is_available(&self) -> bool { self.available.load(Ordering::Relaxed) }
}

/// Periodically drops expired sessions. Database-backed stores are skipped while
/// the database is unreachable.
pub fn spawn_session_purge(store: Arc<dyn SessionStore>, liveness: Arc<dyn Liveness>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if !store.is_local() && !liveness.is_available() { continue; }
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(purged = n, "expired sessions removed"),
                Err(e) => tracing::error!("session purge error: {e}"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;
    use crate::storage::memory::MemorySessionStore;

    #[test]
    fn test_starts_offline_and_reports_transitions() {
        let health = DbHealth::new();
        assert!(!health.is_available());
        assert!(health.record(true));
        assert!(!health.record(true));
        assert!(health.is_available());
        assert!(health.record(false));
        assert!(!health.clone().is_available());
    }

    #[tokio::test]
    async fn test_local_sessions_are_purged_while_database_is_down() {
        let store = Arc::new(MemorySessionStore::new(chrono::Duration::zero()));
        store.save(&SessionId::new("sess_gone"), &[]).await.unwrap();
        spawn_session_purge(store.clone(), Arc::new(DbHealth::new()), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.session_count().await, 0);
    }
}
