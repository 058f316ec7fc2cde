//! CLI module for dealbroker

pub mod app;
pub mod commands;

pub use app::BrokerApp;
pub use commands::{Cli, Commands, OracleArgs};
