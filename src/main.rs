use anyhow::{Context, Result};
use memory_probe::binding;
use memory_probe::config::{validate_config, ConfigLoader};
use memory_probe::{MemoryOperations, NativePlatform};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let loader = ConfigLoader::from_env();
    let config = loader
        .load_or_default()
        .with_context(|| format!("failed to load {}", loader.path().display()))?;

    // Logs go to stderr, stdout carries the protocol
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    validate_config(&config).context("invalid configuration")?;

    info!("Starting memory-probe v{}", memory_probe::VERSION);
    info!("Platform: {} / {}", std::env::consts::OS, std::env::consts::ARCH);

    let ops = Arc::new(MemoryOperations::with_config(NativePlatform, &config));

    tokio::select! {
        served = serve(ops) => served?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Interrupted");
        }
    }

    info!("Shutting down memory-probe");
    Ok(())
}

/// Answers request lines from stdin until EOF
async fn serve(ops: Arc<MemoryOperations<NativePlatform>>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let ops = Arc::clone(&ops);
        let response = tokio::task::spawn_blocking(move || binding::handle_line(&ops, &line))
            .await
            .context("request task failed")?;

        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("Input closed");
    Ok(())
}
