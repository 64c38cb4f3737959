use chatframe_server::{build_router, config::ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatframe_server=debug".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting chatframe relay server");

    let config = ServerConfig::default();
    let app = build_router(config.ollama.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("chatframe relay listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
