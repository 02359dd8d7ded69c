//! Binary entry point: loads the environment, sets up logging and runs the
//! bot.

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = crs_export_bot::run().await {
        tracing::error!("Fatal error: {err}");
        std::process::exit(1);
    }
}
