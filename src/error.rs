//! Error types for dealbroker

use std::time::Duration;
use thiserror::Error;

/// Main error type for dealbroker
#[derive(Error, Debug)]
pub enum BrokerError {
    // Input validation errors
    #[error("Budget must be a positive number.")]
    InvalidBudget,

    #[error("Seller offer must be a positive number.")]
    InvalidOffer,

    #[error("Product description must not be empty.")]
    InvalidProduct,

    // Negotiation errors
    #[error("Negotiation already concluded for session {0}")]
    NegotiationConcluded(String),

    #[error("Session {0} was reset")]
    SessionReset(String),

    // Session errors
    #[error("Session limit reached: {0} active sessions")]
    SessionLimitReached(usize),

    // Configuration errors
    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrokerError {
    /// Whether the error was caused by the caller's input rather than broker state
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BrokerError::InvalidBudget | BrokerError::InvalidOffer | BrokerError::InvalidProduct
        )
    }
}

/// Failures of the strategy oracle. These never escape a negotiation round;
/// the engine records them as `error` turns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),

    #[error("oracle transport failure: {0}")]
    Transport(String),

    #[error("oracle returned malformed output: {0}")]
    Malformed(String),

    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for dealbroker operations
pub type Result<T> = std::result::Result<T, BrokerError>;
