//! dealbroker CLI binary

use clap::Parser;
use dealbroker::cli::{BrokerApp, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.command.config()?;
    let app = BrokerApp::new(config)?;

    match cli.command {
        Commands::Serve { bind, .. } => {
            tracing::info!("Starting dealbroker on {}", bind);

            app.serve(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
                tracing::info!("Shutting down");
            })
            .await?;
        }

        Commands::Simulate {
            product,
            budget,
            offers,
            ..
        } => {
            println!("Negotiating for {} with a budget of {}", product, budget);

            let rounds = app.simulate(&product, budget, &offers).await?;
            for (round, (offer, result)) in rounds.iter().enumerate() {
                let price = result
                    .offer_price
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "Round {}: seller {} -> {} {} | {}",
                    round + 1,
                    offer,
                    result.action,
                    price,
                    result.message
                );
            }
        }
    }

    Ok(())
}
