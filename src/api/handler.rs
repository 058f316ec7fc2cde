//! Transport-independent request handling

use crate::error::{BrokerError, Result};
use crate::negotiation::NegotiationResult;
use crate::session::SessionStore;
use crate::types::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Inbound negotiation request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiateRequest {
    pub product: String,
    pub budget: i64,
    /// The seller's offer, as a JSON number or numeric string
    pub seller_message: Value,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiateResponse {
    pub session_id: SessionId,
    pub response: NegotiationResult,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResetRequest {
    pub session_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
}

/// Turns requests into session store and engine calls
#[derive(Clone)]
pub struct RequestHandler {
    store: Arc<SessionStore>,
}

impl RequestHandler {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Validate the request and play one round on its session.
    ///
    /// Budget and offer are checked before any session is looked up. The round runs on
    /// its own task so an abandoned request still completes it.
    pub async fn negotiate(&self, request: NegotiateRequest) -> Result<NegotiateResponse> {
        if request.budget <= 0 {
            return Err(BrokerError::InvalidBudget);
        }
        let budget = request.budget as u64;
        let seller_offer = parse_seller_offer(&request.seller_message)?;
        let product = request.product.trim();

        let session_id = request
            .session_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .map(SessionId::from);

        let handle = self.store.get_or_create(session_id, product, budget).await?;
        let session_id = handle.session_id().clone();

        let response = tokio::spawn(async move { handle.negotiate(seller_offer).await })
            .await
            .map_err(|e| BrokerError::Internal(format!("negotiation task failed: {}", e)))??;

        Ok(NegotiateResponse {
            session_id,
            response,
        })
    }

    /// Forget a session; always succeeds
    pub async fn reset(&self, request: ResetRequest) -> ResetResponse {
        self.store.reset(&SessionId::from(request.session_id)).await;
        ResetResponse {
            status: "reset".to_string(),
        }
    }
}

/// Read a seller offer from a JSON number or numeric string; must be positive
pub fn parse_seller_offer(raw: &Value) -> Result<u64> {
    let offer = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match offer {
        Some(offer) if offer > 0 => Ok(offer as u64),
        _ => Err(BrokerError::InvalidOffer),
    }
}
