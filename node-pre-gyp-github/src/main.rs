use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use node_pre_gyp_github::cli::{Cli, Command};
use node_pre_gyp_github::publish;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Publish) | None => {
            let options = cli.into_options()?;
            publish(options).await?;
        }
    }

    Ok(())
}
