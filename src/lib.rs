pub mod aggregator;
pub mod config;
pub mod models;
pub mod providers;
mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use aggregator::{EventService, SearchReport, ServiceError};
pub use config::AppConfig;
pub use models::{CreateEventDto, Event, SearchParams};
pub use providers::{EventProvider, ProviderError, ProviderInfo, ProviderKind};

pub fn config_path() -> std::path::PathBuf {
    utils::config_path()
}

pub fn redact(secret: Option<&str>) -> String {
    utils::redact(secret)
}

/// Installs the fmt subscriber; `RUST_LOG` overrides the default `event_scanner=info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("event_scanner=info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
