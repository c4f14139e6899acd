use ig_media_client::{
    application::services::instagram_service::InstagramService,
    config::Config,
    presentation::response::ErrorBody,
    utils::logger::setup_logger,
};
use tracing::{error, info};

// Usage: fetch_media <username> [stories|posts] [count]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger();

    let mut args = std::env::args().skip(1);
    let username = args.next().ok_or("usage: fetch_media <username> [stories|posts] [count]")?;
    let kind = args.next().unwrap_or_else(|| "stories".to_string());
    let count = args.next().map(|c| c.parse::<usize>()).transpose()?;

    // Reads IG_* variables, see src/config.rs
    let config = Config::new();
    info!("Configuration loaded: {}", config);

    let service = InstagramService::new(config)?;
    if !service.start().await {
        error!("No session available, provision one in the session directory first");
        return Ok(());
    }

    let output = match kind.as_str() {
        "posts" => service
            .get_posts(&username, count)
            .await
            .map(|r| serde_json::to_string_pretty(&r)),
        _ => service
            .get_stories(&username)
            .await
            .map(|r| serde_json::to_string_pretty(&r)),
    };

    match output {
        Ok(json) => println!("{}", json?),
        Err(e) => {
            let body = ErrorBody::from(&e);
            error!("Request failed: {}", e);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
