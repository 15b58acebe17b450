use anyhow::Result;
use kinematics_engine::server::{router, AppState, ServerConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kinematics_engine=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState::new(config.solve_timeout));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    tracing::info!("kinematics engine listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
