//! CLI command definitions

use crate::config::{BrokerConfig, OracleKind};
use crate::error::{BrokerError, Result};
use crate::oracle::OllamaConfig;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "dealbroker")]
#[command(about = "dealbroker - budget-safe automated price negotiation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the negotiation API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "DEALBROKER_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,

        /// Seconds of inactivity before a session is evicted
        #[arg(long, env = "DEALBROKER_IDLE_SECS", default_value = "3600")]
        idle_secs: u64,

        /// Seconds between eviction sweeps
        #[arg(long, env = "DEALBROKER_SWEEP_SECS", default_value = "3600")]
        sweep_secs: u64,

        /// Maximum number of live sessions
        #[arg(long, env = "DEALBROKER_MAX_SESSIONS", default_value = "10000")]
        max_sessions: usize,

        #[command(flatten)]
        oracle: OracleArgs,
    },

    /// Play a scripted seller against the oracle and print each round
    Simulate {
        /// What is being bought
        #[arg(short, long)]
        product: String,

        /// Maximum the buyer will pay
        #[arg(short, long)]
        budget: u64,

        /// Seller offers, one per round
        #[arg(short, long, value_delimiter = ',', required = true)]
        offers: Vec<u64>,

        #[command(flatten)]
        oracle: OracleArgs,
    },
}

/// Oracle selection shared by every command
#[derive(Args, Debug, Clone)]
pub struct OracleArgs {
    /// Strategy oracle (ollama, rules)
    #[arg(long = "oracle", env = "DEALBROKER_ORACLE", default_value = "ollama")]
    pub kind: String,

    /// Ollama base URL
    #[arg(long, env = "DEALBROKER_OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Ollama model name
    #[arg(long, env = "DEALBROKER_OLLAMA_MODEL", default_value = "phi3")]
    pub model: String,

    /// Sampling temperature
    #[arg(long, env = "DEALBROKER_TEMPERATURE", default_value = "0.2")]
    pub temperature: f32,

    /// Seconds to wait for each oracle decision
    #[arg(long, env = "DEALBROKER_ORACLE_TIMEOUT_SECS", default_value = "30")]
    pub oracle_timeout_secs: u64,
}

impl OracleArgs {
    /// Fold these arguments into a configuration
    pub fn apply(&self, config: &mut BrokerConfig) -> Result<()> {
        config.oracle = self.kind.parse::<OracleKind>()?;
        config.ollama = OllamaConfig {
            base_url: self.ollama_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
        };
        config.oracle_timeout = Duration::from_secs(self.oracle_timeout_secs);
        Ok(())
    }
}

impl Commands {
    /// Build the validated configuration for this command
    pub fn config(&self) -> Result<BrokerConfig> {
        let mut config = BrokerConfig::default();

        match self {
            Commands::Serve {
                bind,
                idle_secs,
                sweep_secs,
                max_sessions,
                oracle,
            } => {
                config.bind_addr = *bind;
                config.idle_timeout = Duration::from_secs(*idle_secs);
                config.sweep_interval = Duration::from_secs(*sweep_secs);
                config.max_sessions = *max_sessions;
                oracle.apply(&mut config)?;
            }
            Commands::Simulate {
                budget, oracle, ..
            } => {
                if *budget == 0 {
                    return Err(BrokerError::InvalidBudget);
                }
                oracle.apply(&mut config)?;
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["dealbroker", "serve"]).unwrap();
        let config = cli.command.config().unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8000".parse().unwrap());
        assert_eq!(config.oracle, OracleKind::Ollama);
        assert_eq!(config.idle_timeout, Duration::from_secs(3600));
        assert_eq!(config.oracle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_simulate_parses_offer_list() {
        let cli = Cli::try_parse_from([
            "dealbroker",
            "simulate",
            "--product",
            "Vintage Watch",
            "--budget",
            "25000",
            "--offers",
            "28000,27000,26000",
            "--oracle",
            "rules",
        ])
        .unwrap();

        match &cli.command {
            Commands::Simulate { offers, budget, .. } => {
                assert_eq!(offers, &vec![28000, 27000, 26000]);
                assert_eq!(*budget, 25000);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.command.config().unwrap().oracle, OracleKind::Rules);
    }

    #[test]
    fn test_unknown_oracle_rejected() {
        let cli = Cli::try_parse_from(["dealbroker", "serve", "--oracle", "gpt"]).unwrap();
        assert!(matches!(
            cli.command.config(),
            Err(BrokerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let cli = Cli::try_parse_from(["dealbroker", "serve", "--sweep-secs", "0"]).unwrap();
        assert!(cli.command.config().is_err());
    }
}
