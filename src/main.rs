use jobportal::{Config, db::PortalStorage, logging, router, service::JwtService};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logging::init(&cfg.loglevel);

    info!(
        database = %cfg.db_target(),
        ssl_mode = %cfg.db_ssl_mode,
        loglevel = %cfg.loglevel,
        jwt_expire = %cfg.jwt_expire
    );

    let jwt = JwtService::from_config(&cfg)?;
    let storage = PortalStorage::connect(&cfg).await?;
    let state = router::PortalState::new(storage, jwt);
    let app = router::portal_router(state);

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
