//! Deterministic rule-based oracle, used offline and by `simulate`

use super::{OracleDecision, StrategyOracle};
use crate::error::OracleError;
use crate::negotiation::NegotiationContext;
use async_trait::async_trait;

/// Anchors low, then concedes half of the remaining room each round
#[derive(Debug, Clone)]
pub struct RuleOracle {
    /// Opening offer as a percentage of the seller's first ask
    opening_percent: u64,
}

impl RuleOracle {
    pub fn new() -> Self {
        Self { opening_percent: 85 }
    }

    fn plan(&self, ctx: &NegotiationContext) -> OracleDecision {
        let ask = ctx.seller_offer;
        let within_budget = ask <= ctx.budget;

        // Seller came down to (or below) what we already offered
        if let Some(last) = ctx.last_agent_offer {
            if within_budget && ask <= last {
                return accept(ask);
            }
        }

        // Highest price we could still counter with
        let ceiling = ctx.budget.min(ask.saturating_sub(1));
        let floor = ctx.last_agent_offer.unwrap_or(0);

        if ceiling <= floor {
            return if within_budget {
                accept(ask)
            } else {
                OracleDecision::new(
                    "reject",
                    format!(
                        "I'm sorry, {} is beyond what I can spend on the {}.",
                        ask, ctx.product
                    ),
                    None,
                )
            };
        }

        let target = match ctx.last_agent_offer {
            None => (ask.saturating_mul(self.opening_percent) / 100).clamp(1, ceiling),
            Some(last) => last + (ceiling - last).div_ceil(2),
        };

        let message = if ctx.last_agent_offer.is_none() {
            format!(
                "Thanks for the offer. That's more than I expected to pay for the {}. I can start at {}.",
                ctx.product, target
            )
        } else if target == ceiling {
            format!("{} is my best and final offer.", target)
        } else {
            format!("We're getting closer. I can raise my offer to {}.", target)
        };

        OracleDecision::new("counter", message, Some(target as i64))
    }
}

impl Default for RuleOracle {
    fn default() -> Self {
        Self::new()
    }
}

fn accept(ask: u64) -> OracleDecision {
    OracleDecision::new("accept", format!("Deal. I'll take it at {}.", ask), Some(ask as i64))
}

#[async_trait]
impl StrategyOracle for RuleOracle {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn decide(&self, context: &NegotiationContext) -> Result<OracleDecision, OracleError> {
        Ok(self.plan(context))
    }
}
