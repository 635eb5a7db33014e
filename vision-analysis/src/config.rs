use serde::{Deserialize, Serialize};

/// Provider-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisionProvider {
    /// No provider configured; extraction fails with AnalyzerUnavailable
    Disabled,
    /// Generic HTTP vision endpoint accepting a JSON body and returning JSON
    Http {
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    },
}

/// Vision analysis configuration, read once at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VisionConfig {
    pub provider: VisionProvider,
    /// Hard timeout on a single provider call
    pub timeout_s: u64,
    /// Additional attempts after the first (timeouts and 5xx only)
    pub retries: u32,
    /// Base backoff before a retry; jitter of the same magnitude is added
    pub retry_backoff_ms: u64,
    /// Upload size cap
    pub max_image_bytes: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            provider: VisionProvider::Disabled,
            timeout_s: 30,
            retries: 1,
            retry_backoff_ms: 250,
            max_image_bytes: 8 * 1024 * 1024,
        }
    }
}
