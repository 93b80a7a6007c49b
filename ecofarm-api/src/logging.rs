//! Logging bootstrap
//!
//! The subscriber is installed before the TOML file is read so that config
//! loading is logged. The TOML level is applied afterwards through a reload
//! handle, unless RUST_LOG already chose the filter.

use ecofarm_common::config::TomlConfig;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, reload, EnvFilter, Registry};

/// Level used until the TOML file has been read
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Handle for switching the active filter once configuration is known
pub struct LogLevel {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogLevel {
    /// Apply `[logging] level` from the TOML file; a RUST_LOG filter is kept
    pub fn apply_config(&self, config: &TomlConfig) {
        if self.from_env {
            return;
        }

        let level = &config.logging.level;
        if let Err(e) = self.handle.reload(EnvFilter::new(level)) {
            tracing::warn!("Failed to apply log level {}: {}", level, e);
        }
    }
}

/// Build the service subscriber writing to `writer`
///
/// `env_filter` is the filter parsed from RUST_LOG, if any.
pub fn subscriber<W>(
    env_filter: Option<EnvFilter>,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogLevel)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let from_env = env_filter.is_some();
    let (filter, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL)));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));

    (subscriber, LogLevel { handle, from_env })
}
