//! Tracing subscriber setup.
//!
//! Logs go to stderr so that CLI output on stdout stays machine-readable.
//! `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub fn init_logging(config: Option<&LoggingConfig>) {
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,agribot={}", level)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Already initialized (tests call this more than once).
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}
