use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            with_target: true,
        }
    }
}

/// init_tracing installs the global subscriber. `RUST_LOG` overrides the
/// configured level; a second call is a no-op.
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer()
        .with_target(config.with_target)
        .with_thread_names(true);

    if let Err(e) = Registry::default().with(env_filter).with(stdout_layer).try_init() {
        tracing::debug!("tracing subscriber already installed: {e}");
    }
}
