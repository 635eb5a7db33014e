use crate::error::{CoordinatorError, CoordinatorResult};
use broadcast_fabric::BroadcastConfig;
use feedback_analytics::AnalyzerConfig;
use serde::{Deserialize, Serialize};
use vision_analysis::{VisionConfig, VisionProvider};

/// Engine configuration; every option is read once at startup and nothing
/// is hot-reloadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TibbConfig {
    pub effectiveness_window_days: i64,
    pub min_confidence_samples: i64,
    pub trending_limit_max: usize,
    pub replay_queue_size: usize,
    pub replay_ttl_hours: i64,
    pub vision_timeout_s: u64,
    pub vision_retries: u32,
    pub inbox_capacity: usize,
    pub subscriber_send_timeout_s: u64,
    pub worker_pool_size: usize,
    pub max_image_bytes: usize,
    pub vision_provider: VisionProvider,
    pub database_url: Option<String>,
}

impl Default for TibbConfig {
    fn default() -> Self {
        Self {
            effectiveness_window_days: 90,
            min_confidence_samples: 5,
            trending_limit_max: 50,
            replay_queue_size: 100,
            replay_ttl_hours: 24,
            vision_timeout_s: 30,
            vision_retries: 1,
            inbox_capacity: 64,
            subscriber_send_timeout_s: 5,
            worker_pool_size: 4,
            max_image_bytes: 8 * 1024 * 1024,
            vision_provider: VisionProvider::Disabled,
            database_url: None,
        }
    }
}

impl TibbConfig {
    /// Load from an optional TOML file with `TIBB_`-prefixed environment
    /// overrides
    pub fn load(path: Option<&str>) -> CoordinatorResult<Self> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("TIBB"));

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoordinatorError::Config(e.to_string()))
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            window_days: self.effectiveness_window_days,
            min_samples: self.min_confidence_samples,
            trending_limit_max: self.trending_limit_max,
            ..AnalyzerConfig::default()
        }
    }

    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            replay_queue_size: self.replay_queue_size,
            replay_ttl_hours: self.replay_ttl_hours,
            inbox_capacity: self.inbox_capacity,
            subscriber_send_timeout_s: self.subscriber_send_timeout_s,
        }
    }

    pub fn vision_config(&self) -> VisionConfig {
        VisionConfig {
            provider: self.vision_provider.clone(),
            timeout_s: self.vision_timeout_s,
            retries: self.vision_retries,
            max_image_bytes: self.max_image_bytes,
            ..VisionConfig::default()
        }
    }
}
