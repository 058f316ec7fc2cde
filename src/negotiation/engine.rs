//! Negotiation engine drives one buyer-side negotiation round by round

use crate::error::{BrokerError, OracleError, Result};
use crate::oracle::{OracleDecision, StrategyOracle};
use crate::types::{Action, SessionId, Speaker};
use std::sync::Arc;
use std::time::Duration;

use super::policy::{self, Verdict};
use super::types::{NegotiationContext, NegotiationResult, NegotiationState, NegotiationTurn};

/// Negotiation engine for a single session
pub struct NegotiationEngine {
    session_id: SessionId,
    product: String,
    budget: u64,
    history: Vec<NegotiationTurn>,
    state: NegotiationState,
    oracle: Arc<dyn StrategyOracle>,
    oracle_timeout: Duration,
}

impl NegotiationEngine {
    /// Create new negotiation engine
    pub fn new(
        session_id: SessionId,
        product: impl Into<String>,
        budget: u64,
        oracle: Arc<dyn StrategyOracle>,
        oracle_timeout: Duration,
    ) -> Result<Self> {
        if budget == 0 {
            return Err(BrokerError::InvalidBudget);
        }

        let product = product.into();
        tracing::info!(
            "New negotiation {} for {:?} with a budget of {}",
            session_id,
            product,
            budget
        );

        Ok(Self {
            session_id,
            product,
            budget,
            history: Vec::new(),
            state: NegotiationState::AwaitingSellerOffer,
            oracle,
            oracle_timeout,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Every turn so far, oldest first
    pub fn history(&self) -> &[NegotiationTurn] {
        &self.history
    }

    /// Current round: the number of seller offers received
    pub fn round(&self) -> u32 {
        self.history
            .iter()
            .filter(|t| t.speaker == Speaker::Seller)
            .count() as u32
    }

    /// Price of the most recent counter offer made by the agent
    pub fn last_agent_offer(&self) -> Option<u64> {
        self.history
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Agent && t.action == Some(Action::Counter))
            .and_then(|t| t.price)
    }

    pub fn is_concluded(&self) -> bool {
        self.state == NegotiationState::Concluded
    }

    /// Stop the engine from playing further rounds
    pub fn retire(&mut self) {
        self.state = NegotiationState::Retired;
    }

    /// Play one round against the seller's offer.
    ///
    /// Oracle failures and policy violations are reported through the
    /// returned result, never as an `Err`. History is only touched once the
    /// oracle has answered (or timed out), so dropping this future mid-call
    /// leaves the engine exactly as it was.
    pub async fn negotiate(&mut self, seller_offer: u64) -> Result<NegotiationResult> {
        if seller_offer == 0 {
            return Err(BrokerError::InvalidOffer);
        }
        match self.state {
            NegotiationState::AwaitingSellerOffer => {}
            NegotiationState::Concluded => {
                return Err(BrokerError::NegotiationConcluded(self.session_id.0.clone()))
            }
            NegotiationState::Retired => {
                return Err(BrokerError::SessionReset(self.session_id.0.clone()))
            }
        }

        let round = self.round() + 1;
        let seller_turn = NegotiationTurn::seller(round, seller_offer);
        let context = self.context(seller_turn.clone());

        let result = match self.consult(&context).await {
            Ok(decision) => self.validate(&decision, &context),
            Err(err) => Err(err),
        };

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    "Oracle {} failed in round {} of {}: {}",
                    self.oracle.name(),
                    round,
                    self.session_id,
                    err
                );
                NegotiationResult::error(format!("Sorry, I encountered a system error: {}", err))
            }
        };

        self.history.push(seller_turn);
        self.history.push(NegotiationTurn::agent(round, &result));
        if result.action == Action::Accept {
            self.state = NegotiationState::Concluded;
        }

        tracing::info!(
            "Round {} of {}: seller offered {}, agent answered {} {:?}",
            round,
            self.session_id,
            seller_offer,
            result.action,
            result.offer_price
        );

        Ok(result)
    }

    fn context(&self, seller_turn: NegotiationTurn) -> NegotiationContext {
        let round = seller_turn.round;
        let seller_offer = seller_turn.price.unwrap_or_default();
        let mut history = self.history.clone();
        history.push(seller_turn);

        NegotiationContext {
            product: self.product.clone(),
            budget: self.budget,
            round,
            seller_offer,
            last_agent_offer: self.last_agent_offer(),
            history,
        }
    }

    async fn consult(
        &self,
        context: &NegotiationContext,
    ) -> std::result::Result<OracleDecision, OracleError> {
        tracing::debug!(
            "Consulting oracle {} for round {} of {}",
            self.oracle.name(),
            context.round,
            self.session_id
        );

        match tokio::time::timeout(self.oracle_timeout, self.oracle.decide(context)).await {
            Ok(decision) => decision,
            Err(_) => Err(OracleError::Timeout(self.oracle_timeout)),
        }
    }

    fn validate(
        &self,
        decision: &OracleDecision,
        context: &NegotiationContext,
    ) -> std::result::Result<NegotiationResult, OracleError> {
        let verdict = policy::review(decision, context)?;
        if let Verdict::Downgraded(reason) = &verdict {
            tracing::warn!(
                "Downgraded oracle proposal {} {:?} to reject in {}: {:?}",
                decision.action,
                decision.offer_price,
                self.session_id,
                reason
            );
        }
        Ok(verdict.into_result())
    }
}
