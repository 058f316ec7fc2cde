//! Negotiation types and state machine

use crate::types::{Action, Speaker};
use serde::{Deserialize, Serialize};

/// Where a negotiation stands between rounds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationState {
    /// Waiting for the seller's next offer
    AwaitingSellerOffer,
    /// The agent accepted an offer
    Concluded,
    /// The session was reset; the engine is no longer reachable from the store
    Retired,
}

impl NegotiationState {
    /// Check if negotiation is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, NegotiationState::Concluded | NegotiationState::Retired)
    }

    /// Check if negotiation is active
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// One entry of a negotiation's history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationTurn {
    pub round: u32,
    pub speaker: Speaker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NegotiationTurn {
    pub fn seller(round: u32, offer: u64) -> Self {
        Self {
            round,
            speaker: Speaker::Seller,
            action: None,
            price: Some(offer),
            message: None,
        }
    }

    pub fn agent(round: u32, result: &NegotiationResult) -> Self {
        Self {
            round,
            speaker: Speaker::Agent,
            action: Some(result.action),
            price: result.offer_price.filter(|_| result.action.carries_price()),
            message: Some(result.message.clone()),
        }
    }
}

/// Validated outcome of one round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationResult {
    pub action: Action,
    pub message: String,
    pub offer_price: Option<u64>,
}

impl NegotiationResult {
    pub fn accept(price: u64, message: impl Into<String>) -> Self {
        Self {
            action: Action::Accept,
            message: message.into(),
            offer_price: Some(price),
        }
    }

    pub fn counter(price: u64, message: impl Into<String>) -> Self {
        Self {
            action: Action::Counter,
            message: message.into(),
            offer_price: Some(price),
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            action: Action::Reject,
            message: message.into(),
            offer_price: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            action: Action::Error,
            message: message.into(),
            offer_price: None,
        }
    }
}

/// Everything the strategy oracle is told about a round
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationContext {
    pub product: String,
    pub budget: u64,
    pub round: u32,
    pub seller_offer: u64,
    pub last_agent_offer: Option<u64>,
    pub history: Vec<NegotiationTurn>,
}

impl NegotiationContext {
    /// Human-readable form of the agent's standing offer
    pub fn last_agent_offer_label(&self) -> String {
        match self.last_agent_offer {
            Some(price) => price.to_string(),
            None => "none yet".to_string(),
        }
    }
}
