use crate::config::VisionConfig;
use crate::error::{VisionError, VisionResult};
use crate::providers::{create_provider, VisionAnalyzer};
use crate::schema::validate_response;
use clinical_common::{AnalysisKind, FindingBag};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Feature extraction service over a vision provider
pub struct FeatureExtractor {
    config: VisionConfig,
    provider: Box<dyn VisionAnalyzer>,
}

impl FeatureExtractor {
    /// Create a new extractor with the provider named in configuration
    pub fn new(config: VisionConfig) -> VisionResult<Self> {
        let provider = create_provider(&config)?;
        Ok(Self { config, provider })
    }

    /// Create an extractor around an explicit provider (testing, custom hosts)
    pub fn with_provider(config: VisionConfig, provider: Box<dyn VisionAnalyzer>) -> Self {
        Self { config, provider }
    }

    /// Extract a typed finding bag from raw image bytes
    ///
    /// Validation failures are fatal to the call. Upstream timeouts and 5xx
    /// errors get one jittered retry; further failures surface as
    /// AnalyzerUnavailable through the error lowering. An unparseable
    /// provider response yields a degraded zero-confidence bag instead.
    pub async fn extract(&self, kind: AnalysisKind, image: &[u8]) -> VisionResult<FindingBag> {
        self.validate_image(image)?;

        let prompt = prompt_for(kind);
        let document = match self.call_with_retry(kind, image, prompt).await {
            Ok(document) => document,
            Err(VisionError::Unparseable(reason)) => {
                warn!(kind = %kind, reason = %reason, "unparseable vision output; returning degraded bag");
                return Ok(FindingBag::degraded(kind));
            }
            Err(other) => return Err(other),
        };

        let validated = validate_response(kind, &document);
        if validated.degraded {
            return Ok(FindingBag::degraded(kind).with_advisory_notes(validated.advisory_notes));
        }

        info!(
            kind = %kind,
            confidence = validated.confidence,
            attributes = validated.findings.attributes().len(),
            "vision extraction complete"
        );

        Ok(
            FindingBag::new(kind, validated.findings, validated.confidence)
                .with_advisory_notes(validated.advisory_notes),
        )
    }

    fn validate_image(&self, image: &[u8]) -> VisionResult<()> {
        if image.is_empty() {
            return Err(VisionError::InvalidInput("empty image upload".to_string()));
        }
        if image.len() > self.config.max_image_bytes {
            return Err(VisionError::InvalidInput(format!(
                "image exceeds {} byte limit",
                self.config.max_image_bytes
            )));
        }
        if image_format(image).is_none() {
            return Err(VisionError::InvalidInput(
                "unsupported image format; expected JPEG, PNG or WebP".to_string(),
            ));
        }
        Ok(())
    }

    async fn call_with_retry(
        &self,
        kind: AnalysisKind,
        image: &[u8],
        prompt: &str,
    ) -> VisionResult<serde_json::Value> {
        let timeout = Duration::from_secs(self.config.timeout_s);
        let mut last_error = None;

        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                let jitter = rand::thread_rng().gen_range(0..=self.config.retry_backoff_ms);
                let backoff = Duration::from_millis(self.config.retry_backoff_ms + jitter);
                debug!(kind = %kind, attempt = attempt, backoff_ms = backoff.as_millis() as u64, "retrying vision call");
                tokio::time::sleep(backoff).await;
            }

            let outcome = tokio::time::timeout(timeout, self.provider.analyze(kind, image, prompt))
                .await
                .unwrap_or_else(|_| {
                    Err(VisionError::Timeout(format!(
                        "no response within {}s",
                        self.config.timeout_s
                    )))
                });

            match outcome {
                Ok(document) => return Ok(document),
                Err(err) if err.is_retryable() => {
                    warn!(kind = %kind, attempt = attempt, error = %err, "vision call failed");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error
            .unwrap_or_else(|| VisionError::Provider("vision call never attempted".to_string())))
    }
}

/// Magic-byte sniffing for the supported upload formats
fn image_format(image: &[u8]) -> Option<&'static str> {
    if image.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if image.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("png")
    } else if image.len() >= 12 && &image[0..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

fn prompt_for(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Tongue => {
            "Describe the tongue in this photograph: body color, coating, \
             moisture, cracks and shape. Answer as JSON under \"findings\"."
        }
        AnalysisKind::Eye => {
            "Describe the eye in this photograph: sclera tint, moisture and \
             luster. Answer as JSON under \"findings\"."
        }
        AnalysisKind::Face => {
            "Describe the face in this photograph: complexion and luster. \
             Answer as JSON under \"findings\"."
        }
        AnalysisKind::Skin => {
            "Describe the skin in this photograph: texture, temperature \
             impression and moisture. Answer as JSON under \"findings\"."
        }
        AnalysisKind::Pulse => {
            "Interpret this pulse record: rate, depth and quality. Answer as \
             JSON under \"findings\"."
        }
        AnalysisKind::Urine => {
            "Interpret this urine record: color and clarity. Answer as JSON \
             under \"findings\"."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisionProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    struct StaticProvider(serde_json::Value);

    #[async_trait]
    impl VisionAnalyzer for StaticProvider {
        async fn analyze(
            &self,
            _kind: AnalysisKind,
            _image: &[u8],
            _prompt: &str,
        ) -> VisionResult<serde_json::Value> {
            Ok(self.0.clone())
        }
    }

    struct FlakyProvider {
        calls: Arc<AtomicU32>,
        fail_first: u32,
    }

    #[async_trait]
    impl VisionAnalyzer for FlakyProvider {
        async fn analyze(
            &self,
            _kind: AnalysisKind,
            _image: &[u8],
            _prompt: &str,
        ) -> VisionResult<serde_json::Value> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(VisionError::ServerError("502 upstream".to_string()))
            } else {
                Ok(serde_json::json!({
                    "findings": { "color": "pink" },
                    "confidence": 0.7
                }))
            }
        }
    }

    struct GarbageProvider;

    #[async_trait]
    impl VisionAnalyzer for GarbageProvider {
        async fn analyze(
            &self,
            _kind: AnalysisKind,
            _image: &[u8],
            _prompt: &str,
        ) -> VisionResult<serde_json::Value> {
            Err(VisionError::Unparseable("model emitted prose".to_string()))
        }
    }

    fn test_config() -> VisionConfig {
        VisionConfig {
            provider: VisionProvider::Disabled,
            timeout_s: 5,
            retries: 1,
            retry_backoff_ms: 1,
            max_image_bytes: 1024,
        }
    }

    #[tokio::test]
    async fn rejects_non_image_bytes() {
        let extractor = FeatureExtractor::with_provider(
            test_config(),
            Box::new(StaticProvider(serde_json::json!({}))),
        );

        let result = extractor.extract(AnalysisKind::Tongue, b"not an image").await;
        assert!(matches!(result, Err(VisionError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn rejects_oversized_image() {
        let extractor = FeatureExtractor::with_provider(
            test_config(),
            Box::new(StaticProvider(serde_json::json!({}))),
        );

        let mut big = JPEG.to_vec();
        big.resize(4096, 0);
        let result = extractor.extract(AnalysisKind::Tongue, &big).await;
        assert!(matches!(result, Err(VisionError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn extracts_typed_findings() {
        let extractor = FeatureExtractor::with_provider(
            test_config(),
            Box::new(StaticProvider(serde_json::json!({
                "findings": { "color": "red", "coating": "greasy" },
                "confidence": 0.85,
                "recommendations": ["rest"]
            }))),
        );

        let bag = extractor.extract(AnalysisKind::Tongue, JPEG).await.unwrap();
        assert_eq!(bag.kind, AnalysisKind::Tongue);
        assert_eq!(bag.confidence, 0.85);
        assert!(bag.findings.color.is_some());
        assert_eq!(bag.advisory_notes, vec!["rest"]);
    }

    #[tokio::test]
    async fn retries_once_on_server_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let extractor = FeatureExtractor::with_provider(
            test_config(),
            Box::new(FlakyProvider {
                calls: calls.clone(),
                fail_first: 1,
            }),
        );

        let bag = extractor.extract(AnalysisKind::Tongue, PNG).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(bag.confidence, 0.7);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let extractor = FeatureExtractor::with_provider(
            test_config(),
            Box::new(FlakyProvider {
                calls: calls.clone(),
                fail_first: 10,
            }),
        );

        let result = extractor.extract(AnalysisKind::Tongue, PNG).await;
        assert!(matches!(result, Err(VisionError::ServerError(_))));
        // One initial attempt plus the single configured retry
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unparseable_output_degrades_instead_of_failing() {
        let extractor =
            FeatureExtractor::with_provider(test_config(), Box::new(GarbageProvider));

        let bag = extractor.extract(AnalysisKind::Face, JPEG).await.unwrap();
        assert!(bag.is_degraded());
    }

    #[tokio::test]
    async fn disabled_provider_is_unavailable_not_degraded() {
        let extractor = FeatureExtractor::new(test_config()).unwrap();
        let result = extractor.extract(AnalysisKind::Tongue, JPEG).await;
        assert!(matches!(result, Err(VisionError::Disabled)));
    }
}
