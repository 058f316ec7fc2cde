//! Background task that periodically evicts idle sessions

use super::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Handle to a running sweep loop
pub struct Sweeper {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Start sweeping `store` every `every`. The first sweep runs one full
    /// interval after start.
    pub fn spawn(store: Arc<SessionStore>, every: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!("Session sweeper running every {:?}", every);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = store.sweep().await;
                        tracing::debug!("Sweep pass done, {} evicted", evicted);
                    }
                }
            }
            tracing::info!("Session sweeper stopped");
        });

        Self { cancel, task }
    }

    /// Stop the loop and wait for it to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Session sweeper task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::RuleOracle;
    use crate::session::StoreSettings;
    use crate::types::SessionId;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_on_schedule() {
        let settings = StoreSettings {
            idle_timeout: Duration::from_secs(30),
            ..StoreSettings::default()
        };
        let store = Arc::new(SessionStore::new(Arc::new(RuleOracle::new()), settings));
        let id = SessionId::from("forgotten");
        drop(store.get_or_create(Some(id.clone()), "Lamp", 100).await.unwrap());

        let sweeper = Sweeper::spawn(store.clone(), Duration::from_secs(60));

        // First tick at 60s: idle for 60s > 30s
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!store.contains(&id).await);

        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_leaves_active_sessions() {
        let settings = StoreSettings {
            idle_timeout: Duration::from_secs(90),
            ..StoreSettings::default()
        };
        let store = Arc::new(SessionStore::new(Arc::new(RuleOracle::new()), settings));
        let id = SessionId::from("active");
        drop(store.get_or_create(Some(id.clone()), "Lamp", 100).await.unwrap());

        let sweeper = Sweeper::spawn(store.clone(), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.contains(&id).await);

        sweeper.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let store = Arc::new(SessionStore::new(
            Arc::new(RuleOracle::new()),
            StoreSettings::default(),
        ));
        let sweeper = Sweeper::spawn(store, Duration::from_secs(3600));
        let stopped = tokio::time::timeout(Duration::from_secs(1), sweeper.shutdown()).await;
        assert!(stopped.is_ok());
    }
}
