use clap::Parser;
use dotenvy::dotenv;
use qrschool::cli::{self, Cli};
use qrschool_observability::{LogSettings, init_logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Held until exit so the file writer flushes.
    let _log_guard = init_logging(&LogSettings::from_env())?;

    cli::run(Cli::parse()).await
}
