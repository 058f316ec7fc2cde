//! dealbroker
//!
//! Brokers multi-round price negotiations for an automated buyer. A strategy
//! oracle proposes each move; the negotiation engine validates it against the
//! buyer's hard limits:
//! - no accepted or offered price ever exceeds the budget
//! - counter offers only ever move toward the seller
//! - oracle failures are recorded, never retried or guessed around
//!
//! Sessions live in memory in a [`session::SessionStore`] and are evicted
//! after a period of inactivity.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod negotiation;
pub mod oracle;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::{BrokerConfig, OracleKind};
pub use error::{BrokerError, OracleError, Result};
pub use negotiation::{NegotiationEngine, NegotiationResult, NegotiationTurn};
pub use oracle::{OracleDecision, StrategyOracle};
pub use session::{SessionHandle, SessionStore, StoreSettings, Sweeper};
pub use types::{Action, SessionId, Speaker};
