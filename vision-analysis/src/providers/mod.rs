pub mod http;

use crate::config::{VisionConfig, VisionProvider};
use crate::error::{VisionError, VisionResult};
use async_trait::async_trait;
use clinical_common::AnalysisKind;

/// Narrow capability over an external vision model
///
/// One call per analysis: image bytes plus a prompt template in, a JSON
/// document out. Everything stricter than "parses as JSON" is enforced by
/// the schema validator, not the provider.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        kind: AnalysisKind,
        image: &[u8],
        prompt: &str,
    ) -> VisionResult<serde_json::Value>;
}

/// Create a provider instance based on configuration
pub fn create_provider(config: &VisionConfig) -> VisionResult<Box<dyn VisionAnalyzer>> {
    match &config.provider {
        VisionProvider::Disabled => Ok(Box::new(DisabledProvider)),
        VisionProvider::Http { .. } => Ok(Box::new(http::HttpVisionProvider::new(config)?)),
    }
}

/// Placeholder provider for deployments without a vision backend
pub struct DisabledProvider;

#[async_trait]
impl VisionAnalyzer for DisabledProvider {
    async fn analyze(
        &self,
        _kind: AnalysisKind,
        _image: &[u8],
        _prompt: &str,
    ) -> VisionResult<serde_json::Value> {
        Err(VisionError::Disabled)
    }
}
