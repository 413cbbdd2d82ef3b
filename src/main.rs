use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use tokio::net::TcpListener;

use narrator::core::cache::spawn_cleanup_tasks;
use narrator::{ServerConfig, init, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Handle CLI arguments
    let mut config_path: Option<PathBuf> = None;
    let mut command: Option<String> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "init" if command.is_none() => command = Some(arg),
            other => {
                anyhow::bail!(
                    "Unknown argument '{other}'. Usage: narrator [--config <file.yaml>] [init]"
                );
            }
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => ServerConfig::from_file(path),
        None => ServerConfig::from_env(),
    }
    .map_err(|e| anyhow!(e.to_string()))?;

    if command.as_deref() == Some("init") {
        init::run(&config).await?;
        return Ok(());
    }

    init::prepare_storage(&config).await?;

    let address = config.address();
    tracing::info!("Starting server on {}", address);

    let cleanup = config.cleanup_enabled.then(|| config.cleanup_config());

    // Create application state
    let app_state = AppState::new(config)
        .await
        .map_err(|e| anyhow!("Failed to initialize application state: {e}"))?;

    if let Some(cleanup) = cleanup {
        let _tasks = spawn_cleanup_tasks(cleanup);
    }

    let app = routes::api::create_app(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;

    tracing::info!("Server listening on {}", address);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
