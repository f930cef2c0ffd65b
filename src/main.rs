//! Service binary: load configuration, build the supervisor, serve HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use reportpdf_service::{AppState, BrowserSupervisor, ChromeBrowserFactory, router, shutdown_signal};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Arc::new(reportpdf_service::config::env::from_env()?);

    let supervisor = Arc::new(
        BrowserSupervisor::builder()
            .policy(config.policy)
            .idle_timeout(config.idle_timeout)
            .factory(Box::new(ChromeBrowserFactory::from_config(&config)))
            .build()?,
    );

    let state = AppState::new(Arc::clone(&supervisor), Arc::clone(&config));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    log::info!("🚀 PDF server running on http://{}", addr);
    log::info!(
        "   Mode: {} | Policy: {:?}",
        config.deployment_mode.environment_label().to_uppercase(),
        config.policy
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(supervisor))
        .await?;

    Ok(())
}
