//! Command-line entry point
//!
//! Sequences one `buy` or `check` run for a single account and prints the
//! typed result as JSON on stdout, where the notification layer picks it
//! up. Logging goes to stderr.
//!
//! # Usage
//!
//! ```bash
//! USERNAME=user PASSWORD=pass lotto buy --count 5
//! USERNAME=user PASSWORD=pass lotto check
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dhlottery_bot::{
    AuthManager, Credentials, Lotto645, Transport, config::ConfigLoader,
    types::TicketSelection,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "lotto")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Buy auto-pick tickets for the upcoming round
    Buy {
        /// Number of slots to buy (1-5); falls back to the COUNT
        /// environment variable, then 1
        #[arg(short = 'n', long, value_name = "COUNT")]
        count: Option<usize>,
    },
    /// Check the last week's purchases for winnings
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Arc::new(ConfigLoader::new().load(cli.config.as_deref())?);
    let credentials = credentials_from_env()?;

    let transport = Arc::new(Transport::new(settings.network.clone())?);
    let mut auth = AuthManager::new(Arc::clone(&transport), Arc::clone(&settings));
    auth.login(credentials).await?;

    let lotto = Lotto645::new(transport, settings);

    match cli.command {
        Command::Buy { count } => {
            let count = count.or_else(count_from_env).unwrap_or(1);
            let outcome = lotto.buy(&mut auth, &TicketSelection::auto(count)).await?;

            let balance = match lotto.get_balance(&auth).await {
                Ok(balance) => Some(balance),
                Err(e) => {
                    tracing::warn!("Balance lookup failed: {}", e);
                    None
                }
            };

            let output = serde_json::json!({
                "result": outcome,
                "balance": balance,
            });
            println!("{}", serde_json::to_string(&output)?);
        }
        Command::Check => {
            let check = lotto.check_winnings(&auth).await?;
            println!("{}", serde_json::to_string(&check)?);
        }
    }

    Ok(())
}

/// Read the account credentials from the environment
fn credentials_from_env() -> anyhow::Result<Credentials> {
    let user_id = std::env::var("USERNAME")
        .map_err(|_| anyhow::anyhow!("USERNAME environment variable is not set"))?;
    let password = std::env::var("PASSWORD")
        .map_err(|_| anyhow::anyhow!("PASSWORD environment variable is not set"))?;
    Ok(Credentials::new(user_id, password))
}

/// Slot count from the COUNT environment variable, if parseable
fn count_from_env() -> Option<usize> {
    std::env::var("COUNT").ok()?.parse().ok()
}
