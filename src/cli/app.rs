//! dealbroker application wiring the oracle, session store and API together

use crate::api::{self, RequestHandler};
use crate::config::{BrokerConfig, OracleKind};
use crate::error::Result;
use crate::negotiation::{NegotiationEngine, NegotiationResult};
use crate::oracle::{OllamaOracle, RuleOracle, StrategyOracle};
use crate::session::{SessionStore, Sweeper};
use crate::types::SessionId;
use std::future::Future;
use std::sync::Arc;

/// Main dealbroker application
#[derive(Clone)]
pub struct BrokerApp {
    config: BrokerConfig,
    oracle: Arc<dyn StrategyOracle>,
    store: Arc<SessionStore>,
}

impl BrokerApp {
    /// Create a new application from a validated configuration
    pub fn new(config: BrokerConfig) -> Result<Self> {
        config.validate()?;
        let oracle = build_oracle(&config);
        Ok(Self::with_oracle(config, oracle))
    }

    /// Create an application around an existing oracle
    pub fn with_oracle(config: BrokerConfig, oracle: Arc<dyn StrategyOracle>) -> Self {
        let store = Arc::new(SessionStore::new(oracle.clone(), config.store_settings()));
        Self {
            config,
            oracle,
            store,
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Get session store
    pub fn store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }

    /// Run the HTTP API and the idle sweeper until `shutdown` resolves
    pub async fn serve(&self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let sweeper = Sweeper::spawn(self.store.clone(), self.config.sweep_interval);
        let handler = RequestHandler::new(self.store.clone());

        tracing::info!(
            "Serving with the {} oracle, idle timeout {:?}",
            self.oracle.name(),
            self.config.idle_timeout
        );
        let served = api::serve(self.config.bind_addr, handler, shutdown).await;

        sweeper.shutdown().await;
        self.store.shutdown().await;
        served?;
        Ok(())
    }

    /// Negotiate against a fixed list of seller offers in a throwaway session.
    ///
    /// Stops early once the agent accepts.
    pub async fn simulate(
        &self,
        product: &str,
        budget: u64,
        offers: &[u64],
    ) -> Result<Vec<(u64, NegotiationResult)>> {
        let mut engine = NegotiationEngine::new(
            SessionId::generate(),
            product,
            budget,
            self.oracle.clone(),
            self.config.oracle_timeout,
        )?;

        let mut rounds = Vec::with_capacity(offers.len());
        for &offer in offers {
            let result = engine.negotiate(offer).await?;
            rounds.push((offer, result));
            if engine.is_concluded() {
                break;
            }
        }
        Ok(rounds)
    }
}

fn build_oracle(config: &BrokerConfig) -> Arc<dyn StrategyOracle> {
    match config.oracle {
        OracleKind::Ollama => Arc::new(OllamaOracle::new(config.ollama.clone())),
        OracleKind::Rules => Arc::new(RuleOracle::new()),
    }
}
