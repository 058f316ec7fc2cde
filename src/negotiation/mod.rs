//! Negotiation module: the buyer-side state machine

pub mod engine;
pub mod policy;
pub mod types;

pub use engine::NegotiationEngine;
pub use policy::{Downgrade, Verdict};
pub use types::{NegotiationContext, NegotiationResult, NegotiationState, NegotiationTurn};
