use std::env;
use std::sync::Once;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

static INIT: Once = Once::new();

/// Installs the global fmt subscriber once.
///
/// The level comes from `LOGLEVEL` (`DEBUG`, `INFO`, ...) when set, otherwise
/// from `RUST_LOG` directives, defaulting to `info`.
pub fn setup_logger() {
    INIT.call_once(|| {
        let filter = match env::var("LOGLEVEL") {
            Ok(level) => EnvFilter::builder()
                .with_default_directive(parse_level(&level).into())
                .parse_lossy(""),
            Err(_) => EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        };

        // A subscriber may already be installed by the host application.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}

fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_uppercase().as_str() {
        "TRACE" => LevelFilter::TRACE,
        "DEBUG" => LevelFilter::DEBUG,
        "WARN" => LevelFilter::WARN,
        "ERROR" => LevelFilter::ERROR,
        "OFF" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}
