//! Strategy oracles: the black boxes that decide how the buyer bargains
//!
//! An oracle only proposes. Everything it returns is untrusted and goes
//! through the negotiation engine's validation before it is reported.

pub mod ollama;
pub mod rules;

use crate::error::OracleError;
use crate::negotiation::NegotiationContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use ollama::{OllamaConfig, OllamaOracle};
pub use rules::RuleOracle;

/// Raw proposal returned by an oracle, before validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleDecision {
    pub action: String,
    pub message: String,
    pub offer_price: Option<i64>,
}

impl OracleDecision {
    pub fn new(action: impl Into<String>, message: impl Into<String>, offer_price: Option<i64>) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
            offer_price,
        }
    }
}

/// Decision-making capability consulted once per round
#[async_trait]
pub trait StrategyOracle: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Propose an action for the given round
    async fn decide(&self, context: &NegotiationContext) -> Result<OracleDecision, OracleError>;
}
