// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub redaction_enabled: bool,
    pub log_level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            redaction_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

/// Install a global `tracing` subscriber honoring `RUST_LOG` with the
/// configured level as fallback. Safe to call more than once; later calls
/// are no-ops.
pub fn init_tracing(config: &LoggerConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
