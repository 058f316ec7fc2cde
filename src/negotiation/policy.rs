//! Validation of oracle proposals against the buyer's hard limits
//!
//! Malformed proposals are oracle failures. Well-formed proposals that break
//! the budget ceiling or move the negotiation backward are downgraded to a
//! reject. No price is ever invented here.

use super::types::{NegotiationContext, NegotiationResult};
use crate::error::OracleError;
use crate::oracle::OracleDecision;
use crate::types::Action;

/// Why a proposal was downgraded to a reject
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Downgrade {
    OverBudget { price: u64, budget: u64 },
    NotAboveLastOffer { price: u64, last_offer: u64 },
    NotBelowSellerOffer { price: u64, seller_offer: u64 },
    AcceptMismatch { price: u64, seller_offer: u64 },
}

impl Downgrade {
    fn message(&self) -> String {
        match self {
            Downgrade::OverBudget { price, budget } => format!(
                "I have to decline: {} would exceed my budget of {}.",
                price, budget
            ),
            Downgrade::NotAboveLastOffer { price, last_offer } => format!(
                "I have to decline for now: {} would not improve on my previous offer of {}.",
                price, last_offer
            ),
            Downgrade::NotBelowSellerOffer {
                price,
                seller_offer,
            } => format!(
                "I have to decline for now: a counter of {} does not improve on your offer of {}.",
                price, seller_offer
            ),
            Downgrade::AcceptMismatch {
                price,
                seller_offer,
            } => format!(
                "I have to decline for now: I can only accept your offer of {}, not {}.",
                seller_offer, price
            ),
        }
    }
}

/// Outcome of reviewing one oracle proposal
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Approved(NegotiationResult),
    Downgraded(Downgrade),
}

impl Verdict {
    pub fn into_result(self) -> NegotiationResult {
        match self {
            Verdict::Approved(result) => result,
            Verdict::Downgraded(reason) => NegotiationResult::reject(reason.message()),
        }
    }
}

/// Check a raw proposal against the round's context
pub fn review(decision: &OracleDecision, ctx: &NegotiationContext) -> Result<Verdict, OracleError> {
    let action = Action::from_oracle(&decision.action).ok_or_else(|| {
        OracleError::Malformed(format!("unknown action {:?}", decision.action))
    })?;

    let price = match decision.offer_price {
        Some(p) if p <= 0 => {
            return Err(OracleError::Malformed(format!("non-positive price {}", p)));
        }
        Some(p) => Some(p as u64),
        None => None,
    };

    match action {
        Action::Reject => Ok(Verdict::Approved(NegotiationResult::reject(
            decision.message.clone(),
        ))),
        Action::Accept => {
            // Without a quoted price the agent is taking the seller's ask
            let price = price.unwrap_or(ctx.seller_offer);
            if price > ctx.budget {
                return Ok(Verdict::Downgraded(Downgrade::OverBudget {
                    price,
                    budget: ctx.budget,
                }));
            }
            if price != ctx.seller_offer {
                return Ok(Verdict::Downgraded(Downgrade::AcceptMismatch {
                    price,
                    seller_offer: ctx.seller_offer,
                }));
            }
            Ok(Verdict::Approved(NegotiationResult::accept(
                price,
                decision.message.clone(),
            )))
        }
        Action::Counter => {
            let price = price.ok_or_else(|| {
                OracleError::Malformed("counter offer without a price".to_string())
            })?;
            if price > ctx.budget {
                return Ok(Verdict::Downgraded(Downgrade::OverBudget {
                    price,
                    budget: ctx.budget,
                }));
            }
            if let Some(last_offer) = ctx.last_agent_offer {
                if price <= last_offer {
                    return Ok(Verdict::Downgraded(Downgrade::NotAboveLastOffer {
                        price,
                        last_offer,
                    }));
                }
            }
            if price >= ctx.seller_offer {
                return Ok(Verdict::Downgraded(Downgrade::NotBelowSellerOffer {
                    price,
                    seller_offer: ctx.seller_offer,
                }));
            }
            Ok(Verdict::Approved(NegotiationResult::counter(
                price,
                decision.message.clone(),
            )))
        }
        Action::Error => Err(OracleError::Malformed(
            "oracle may not propose an error action".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(last: Option<u64>) -> NegotiationContext {
        NegotiationContext {
            product: "Vintage Watch".to_string(),
            budget: 25000,
            round: 2,
            seller_offer: 27000,
            last_agent_offer: last,
            history: Vec::new(),
        }
    }

    fn decision(action: &str, price: Option<i64>) -> OracleDecision {
        OracleDecision::new(action, "note", price)
    }

    #[test]
    fn test_valid_counter_is_approved() {
        let verdict = review(&decision("counter", Some(24000)), &ctx(Some(23000))).unwrap();
        assert_eq!(
            verdict,
            Verdict::Approved(NegotiationResult::counter(24000, "note"))
        );
    }

    #[test]
    fn test_counter_over_budget_is_downgraded() {
        let verdict = review(&decision("counter", Some(26000)), &ctx(None)).unwrap();
        assert_eq!(
            verdict,
            Verdict::Downgraded(Downgrade::OverBudget {
                price: 26000,
                budget: 25000
            })
        );

        let result = verdict.into_result();
        assert_eq!(result.action, Action::Reject);
        assert_eq!(result.offer_price, None);
        assert!(result.message.contains("budget"));
    }

    #[test]
    fn test_counter_must_improve_on_last_offer() {
        let verdict = review(&decision("counter", Some(23000)), &ctx(Some(23000))).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Downgraded(Downgrade::NotAboveLastOffer { .. })
        ));
    }

    #[test]
    fn test_counter_must_stay_below_seller_offer() {
        let mut context = ctx(None);
        context.budget = 30000;
        let verdict = review(&decision("counter", Some(27000)), &context).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Downgraded(Downgrade::NotBelowSellerOffer { .. })
        ));
    }

    #[test]
    fn test_counter_without_price_is_malformed() {
        let err = review(&decision("counter", None), &ctx(None)).unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
    }

    #[test]
    fn test_unknown_action_is_malformed() {
        for action in ["maybe", "error", ""] {
            let err = review(&decision(action, Some(100)), &ctx(None)).unwrap_err();
            assert!(matches!(err, OracleError::Malformed(_)));
        }
    }

    #[test]
    fn test_non_positive_price_is_malformed() {
        let err = review(&decision("counter", Some(0)), &ctx(None)).unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
        let err = review(&decision("counter", Some(-5)), &ctx(None)).unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
    }

    #[test]
    fn test_reject_drops_price() {
        let verdict = review(&decision("REJECT", Some(20000)), &ctx(None)).unwrap();
        assert_eq!(verdict.into_result().offer_price, None);
    }

    #[test]
    fn test_accept_without_price_settles_at_seller_offer() {
        let mut context = ctx(None);
        context.seller_offer = 24000;

        let verdict = review(&decision("accept", None), &context).unwrap();
        assert_eq!(
            verdict,
            Verdict::Approved(NegotiationResult::accept(24000, "note"))
        );

        let verdict = review(&decision("accept", Some(24000)), &context).unwrap();
        assert_eq!(verdict.into_result().offer_price, Some(24000));
    }

    #[test]
    fn test_accept_quoted_over_budget_is_downgraded() {
        let mut context = ctx(None);
        context.seller_offer = 24000;

        let verdict = review(&decision("accept", Some(26000)), &context).unwrap();
        assert_eq!(
            verdict,
            Verdict::Downgraded(Downgrade::OverBudget {
                price: 26000,
                budget: 25000
            })
        );

        let result = verdict.into_result();
        assert_eq!(result.action, Action::Reject);
        assert_eq!(result.offer_price, None);
    }

    #[test]
    fn test_accept_at_other_price_is_downgraded() {
        let mut context = ctx(None);
        context.seller_offer = 24000;

        let verdict = review(&decision("accept", Some(22000)), &context).unwrap();
        assert_eq!(
            verdict,
            Verdict::Downgraded(Downgrade::AcceptMismatch {
                price: 22000,
                seller_offer: 24000
            })
        );
        assert_eq!(verdict.into_result().offer_price, None);
    }

    #[test]
    fn test_accept_over_budget_is_downgraded() {
        let verdict = review(&decision("accept", None), &ctx(None)).unwrap();
        assert_eq!(
            verdict,
            Verdict::Downgraded(Downgrade::OverBudget {
                price: 27000,
                budget: 25000
            })
        );
    }
}
