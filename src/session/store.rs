//! Session store: owns every live negotiation, keyed by session ID

use crate::error::{BrokerError, Result};
use crate::negotiation::{NegotiationEngine, NegotiationResult};
use crate::oracle::StrategyOracle;
use crate::types::SessionId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

/// Limits applied by a [`SessionStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSettings {
    /// Sessions untouched for longer than this are evicted by `sweep`
    pub idle_timeout: Duration,
    /// Bounded wait for each oracle call
    pub oracle_timeout: Duration,
    /// Upper bound on live sessions
    pub max_sessions: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(60 * 60),
            oracle_timeout: Duration::from_secs(30),
            max_sessions: 10_000,
        }
    }
}

struct Session {
    engine: Arc<Mutex<NegotiationEngine>>,
    last_active: Instant,
    in_flight: Arc<AtomicUsize>,
}

/// Marks a session as in use until dropped; the sweeper skips such sessions
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Access to one session's engine, handed out by [`SessionStore::get_or_create`]
pub struct SessionHandle {
    session_id: SessionId,
    created: bool,
    engine: Arc<Mutex<NegotiationEngine>>,
    _in_flight: InFlight,
}

impl SessionHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Whether this call created the session
    pub fn was_created(&self) -> bool {
        self.created
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> Arc<Mutex<NegotiationEngine>> {
        self.engine.clone()
    }

    /// Wait for exclusive access to the engine
    pub async fn lock(&self) -> OwnedMutexGuard<NegotiationEngine> {
        self.engine.clone().lock_owned().await
    }

    /// Play one round; concurrent calls on the same session queue up here
    pub async fn negotiate(&self, seller_offer: u64) -> Result<NegotiationResult> {
        self.lock().await.negotiate(seller_offer).await
    }
}

/// Session store manages all live negotiations
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
    oracle: Arc<dyn StrategyOracle>,
    settings: StoreSettings,
}

impl SessionStore {
    /// Create a new, empty session store
    pub fn new(oracle: Arc<dyn StrategyOracle>, settings: StoreSettings) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            oracle,
            settings,
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Look up a session, creating it if needed.
    ///
    /// Without an ID a fresh one is minted. An unknown ID gets a new engine
    /// under that ID and needs a non-blank `product`. A known ID returns the
    /// existing engine and refreshes its activity time; `product` and `budget`
    /// are then ignored. Creation happens under the map lock, so racing calls
    /// for one new ID share a single engine.
    pub async fn get_or_create(
        &self,
        session_id: Option<SessionId>,
        product: &str,
        budget: u64,
    ) -> Result<SessionHandle> {
        if budget == 0 {
            return Err(BrokerError::InvalidBudget);
        }

        let mut sessions = self.sessions.lock().await;

        let session_id = match session_id {
            Some(id) => id,
            None => loop {
                let id = SessionId::generate();
                if !sessions.contains_key(&id) {
                    break id;
                }
            },
        };

        if let Some(session) = sessions.get_mut(&session_id) {
            session.last_active = Instant::now();
            tracing::debug!("Resuming session {}", session_id);
            return Ok(SessionHandle {
                session_id,
                created: false,
                engine: session.engine.clone(),
                _in_flight: InFlight::enter(&session.in_flight),
            });
        }

        if product.trim().is_empty() {
            return Err(BrokerError::InvalidProduct);
        }

        if sessions.len() >= self.settings.max_sessions {
            tracing::warn!(
                "Refusing session {}: {} sessions already live",
                session_id,
                sessions.len()
            );
            return Err(BrokerError::SessionLimitReached(sessions.len()));
        }

        let engine = NegotiationEngine::new(
            session_id.clone(),
            product,
            budget,
            self.oracle.clone(),
            self.settings.oracle_timeout,
        )?;

        let session = Session {
            engine: Arc::new(Mutex::new(engine)),
            last_active: Instant::now(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        };
        let handle = SessionHandle {
            session_id: session_id.clone(),
            created: true,
            engine: session.engine.clone(),
            _in_flight: InFlight::enter(&session.in_flight),
        };
        sessions.insert(session_id.clone(), session);

        tracing::info!("Created session {} ({} live)", session_id, sessions.len());
        Ok(handle)
    }

    /// Drop a session. Unknown IDs are a no-op.
    ///
    /// Returns once any round already running on the session has finished.
    /// The old engine is retired, so handles obtained before the reset can no
    /// longer play rounds on it.
    pub async fn reset(&self, session_id: &SessionId) -> bool {
        let removed = self.sessions.lock().await.remove(session_id);

        match removed {
            Some(session) => {
                session.engine.lock().await.retire();
                tracing::info!("Reset session {}", session_id);
                true
            }
            None => {
                tracing::debug!("Reset of unknown session {} ignored", session_id);
                false
            }
        }
    }

    /// Evict sessions idle for longer than the configured threshold.
    ///
    /// Sessions with a request in progress are never evicted.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let idle_timeout = self.settings.idle_timeout;

        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|session_id, session| {
            let busy = session.in_flight.load(Ordering::SeqCst) > 0;
            let idle = now.saturating_duration_since(session.last_active) > idle_timeout;
            if idle && !busy {
                tracing::info!("Evicting idle session {}", session_id);
                false
            } else {
                true
            }
        });
        let evicted = before - sessions.len();

        if evicted > 0 {
            tracing::info!("Sweep evicted {} sessions, {} remain", evicted, sessions.len());
        }
        evicted
    }

    /// Drop every session, waiting for rounds in progress to finish
    pub async fn shutdown(&self) -> usize {
        let drained: Vec<Session> = self
            .sessions
            .lock()
            .await
            .drain()
            .map(|(_, session)| session)
            .collect();

        let count = drained.len();
        futures::future::join_all(drained.iter().map(|session| async move {
            session.engine.lock().await.retire();
        }))
        .await;

        tracing::info!("Session store shut down, dropped {} sessions", count);
        count
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    pub async fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.lock().await.contains_key(session_id)
    }
}
