use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Directives used when `RUST_LOG` is not set. sqlx logs every statement at
/// info, so it is held to warnings.
fn default_directives(level: &str) -> String {
    format!("teammatch_backend={level},actix_web={level},sqlx=warn")
}

pub fn init_telemetry(level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
}
