use clap::Parser;

use ecotech::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    ecotech::log::init_logging(cli.verbose);

    if let Err(e) = cli::run(cli).await {
        tracing::debug!(error = ?e, "exiting with error");
        return Err(e);
    }
    Ok(())
}
