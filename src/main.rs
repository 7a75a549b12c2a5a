use std::env;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "taxdefer=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = taxdefer::api::run_http_server(port).await {
            error!("server error: {e}");
            std::process::exit(1);
        }
        return Ok(());
    }

    let cli = taxdefer::api::Cli::parse();
    taxdefer::api::run_cli(&cli)
}
