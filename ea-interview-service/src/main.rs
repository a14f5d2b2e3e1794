use anyhow::Context;
use clap::Parser;
use ea_interview_service::{Config, RigCompletionService, create_app, init_tracing};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    // Required by answer validation and every generated report
    let service = match RigCompletionService::from_env(config.provider) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, provider = ?config.provider, "cannot start without an API key");
            std::process::exit(1);
        }
    };

    let app = create_app(&config, service);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    let addr = listener.local_addr()?;

    info!(
        %addr,
        catalogue_dir = %config.catalogue_dir.display(),
        provider = ?config.provider,
        "EA interview service listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
