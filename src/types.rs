//! Core types used throughout dealbroker

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier addressing one negotiation session
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Mint a new random session ID (128 bits, hex encoded)
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Seller,
    Agent,
}

/// Outcome of an agent turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Accept,
    Reject,
    Counter,
    /// The oracle failed; never proposed by an oracle itself
    Error,
}

impl Action {
    /// Parse an action proposed by an oracle. Only the three bargaining
    /// actions are accepted; `error` is reserved for the engine.
    pub fn from_oracle(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accept" => Some(Action::Accept),
            "reject" => Some(Action::Reject),
            "counter" => Some(Action::Counter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Accept => "accept",
            Action::Reject => "reject",
            Action::Counter => "counter",
            Action::Error => "error",
        }
    }

    /// Whether a price accompanies this action
    pub fn carries_price(&self) -> bool {
        matches!(self, Action::Accept | Action::Counter)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
