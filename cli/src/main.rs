use anyhow::{Context, Result};
use log::debug;
use transit_cli::storage::default_session_path;
use transit_cli::{App, Command, FileStorage, ReqwestTransport};
use transit_core::ApiConfig;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = ApiConfig::from_env();
    let session_path = default_session_path().context("no data directory for the session file")?;
    debug!("Session file: {}", session_path.display());
    let storage = FileStorage::open(session_path)?;

    let mut app = App::new(&config, ReqwestTransport::new(), storage);
    let output = app.execute(command).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
