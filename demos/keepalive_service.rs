use ig_media_client::{
    application::services::instagram_service::InstagramService, config::Config,
    utils::logger::setup_logger,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger();

    let config = Config::new();
    let interval = config.keepalive.interval;
    let service = InstagramService::new(config)?;

    if !service.start().await {
        warn!("Starting without a session; keepalive pings are skipped until one is imported");
    }

    let keepalive = service.spawn_keepalive();
    info!("Keepalive running every {}s, press Ctrl+C to stop", interval);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    keepalive.shutdown().await;

    let status = service.session_status().await;
    info!(
        "Final session state: logged_in={}, last_keepalive={:?}",
        status.logged_in, status.last_keepalive
    );
    Ok(())
}
