use crate::config::{VisionConfig, VisionProvider};
use crate::error::{VisionError, VisionResult};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use clinical_common::AnalysisKind;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::VisionAnalyzer;

/// Generic HTTP vision endpoint
///
/// Sends the image base64-encoded in a JSON body and expects a JSON response
/// document. Status mapping: 4xx is a provider rejection, 5xx is retryable.
pub struct HttpVisionProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    kind: &'a str,
    prompt: &'a str,
    image_base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

impl HttpVisionProvider {
    pub fn new(config: &VisionConfig) -> VisionResult<Self> {
        let VisionProvider::Http {
            api_url,
            api_key,
            model,
        } = &config.provider
        else {
            return Err(VisionError::Provider(
                "http provider constructed with non-http configuration".to_string(),
            ));
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_s))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.clone(),
            api_key: api_key.clone(),
            model: model.clone(),
        })
    }
}

#[async_trait]
impl VisionAnalyzer for HttpVisionProvider {
    async fn analyze(
        &self,
        kind: AnalysisKind,
        image: &[u8],
        prompt: &str,
    ) -> VisionResult<serde_json::Value> {
        let body = AnalyzeRequest {
            kind: kind.as_str(),
            prompt,
            image_base64: general_purpose::STANDARD.encode(image),
            model: self.model.as_deref(),
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(kind = %kind, image_bytes = image.len(), "calling vision provider");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                VisionError::Timeout(e.to_string())
            } else {
                VisionError::Network(e)
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(VisionError::Network)?;

        if status.is_server_error() {
            return Err(VisionError::ServerError(format!("{}: {}", status, text)));
        }
        if !status.is_success() {
            return Err(VisionError::Provider(format!("{}: {}", status, text)));
        }

        serde_json::from_str(&text).map_err(|e| VisionError::Unparseable(e.to_string()))
    }
}
