use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};

use versus::config::Config;
use versus::server::VersusServer;
use versus::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // MCP clients may start the server from any CWD; prefer the .env next to the binary.
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.to_path_buf()));
    match exe_dir {
        Some(dir) if dir.join(".env").exists() => {
            dotenvy::from_path(dir.join(".env")).ok();
        }
        // Development builds: target/release/../..
        Some(dir) if dir.join("../../.env").exists() => {
            dotenvy::from_path(dir.join("../../.env")).ok();
        }
        _ => {
            dotenvy::dotenv().ok();
        }
    }

    tracing::info!("versus starting");

    let config = Config::load();
    let store = Arc::new(
        Store::open(&config.db_path)
            .inspect_err(|e| tracing::error!("cannot open store at {}: {e}", config.db_path.display()))?,
    );
    let server = VersusServer::new(config, store);

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {e:?}"))?;

    service.waiting().await?;

    tracing::info!("versus shutting down");
    Ok(())
}
