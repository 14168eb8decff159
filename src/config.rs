use crate::error::AnalysisError;
use crate::pipeline::types::ImageFormat;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "VISION_FUSION";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub validation: ValidationConfig,
    pub cache: CacheConfig,
    pub providers: ProviderConfig,
    pub fusion: FusionConfig,
    pub enrichment: EnrichmentConfig,
    pub semantics: SemanticsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub supported_formats: Vec<ImageFormat>,
    pub max_image_size: usize,
    pub max_width: u32,
    pub max_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Per-adapter call timeout, zero disables the timeout layer
    pub timeout_ms: u64,
    /// Confidence assigned when a provider reports neither a score nor objects
    pub default_confidence: f32,
    /// Confidence carried by the local degraded analyzer
    pub fallback_confidence: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub max_objects: usize,
    pub dedup_bucket_width: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub max_colors: usize,
    pub sample_step: u32,
    pub brand_catalog: Vec<String>,
    pub landmark_catalog: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SemanticsConfig {
    pub default_domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub smoothing_alpha: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                ImageFormat::Jpeg,
                ImageFormat::Png,
                ImageFormat::Gif,
                ImageFormat::WebP,
                ImageFormat::Bmp,
            ],
            max_image_size: 10 * 1024 * 1024,
            max_width: 8192,
            max_height: 8192,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl_ms: 60 * 60 * 1000,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            default_confidence: 0.5,
            fallback_confidence: 0.1,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            max_objects: 20,
            dedup_bucket_width: 0.1,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_colors: 5,
            sample_step: 4,
            brand_catalog: Vec::new(),
            landmark_catalog: Vec::new(),
        }
    }
}

impl Default for SemanticsConfig {
    fn default() -> Self {
        Self {
            default_domain: None,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Configuration {
    /// Layers an optional config file under `VISION_FUSION__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AnalysisError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let configuration: Configuration = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.validation.supported_formats.is_empty() {
            return Err(AnalysisError::Configuration(
                "At least one image format must be supported".to_string(),
            ));
        }
        if self.validation.max_image_size == 0 {
            return Err(AnalysisError::Configuration(
                "Maximum image size must be greater than 0".to_string(),
            ));
        }
        if self.validation.max_width == 0 || self.validation.max_height == 0 {
            return Err(AnalysisError::Configuration(
                "Maximum image dimensions must be greater than 0".to_string(),
            ));
        }
        for (name, value) in [
            ("default_confidence", self.providers.default_confidence),
            ("fallback_confidence", self.providers.fallback_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::Configuration(format!(
                    "Provider {} must be between 0.0 and 1.0",
                    name
                )));
            }
        }
        if self.fusion.max_objects == 0 {
            return Err(AnalysisError::Configuration(
                "Fusion object cap must be greater than 0".to_string(),
            ));
        }
        if self.fusion.dedup_bucket_width <= 0.0 || self.fusion.dedup_bucket_width > 1.0 {
            return Err(AnalysisError::Configuration(
                "Deduplication bucket width must be in (0.0, 1.0]".to_string(),
            ));
        }
        if self.enrichment.sample_step == 0 {
            return Err(AnalysisError::Configuration(
                "Sample step must be greater than 0".to_string(),
            ));
        }
        if !(self.metrics.smoothing_alpha > 0.0 && self.metrics.smoothing_alpha <= 1.0) {
            return Err(AnalysisError::Configuration(
                "Metrics smoothing alpha must be in (0.0, 1.0]".to_string(),
            ));
        }
        Ok(())
    }

    // Sets the maximum payload size, this will override the default configuration.
    pub fn max_image_size(mut self, max_image_size: usize) -> Self {
        self.validation.max_image_size = max_image_size;
        self
    }

    // Sets the maximum width and height, this will override the default configuration.
    pub fn max_dimensions(mut self, max_width: u32, max_height: u32) -> Self {
        self.validation.max_width = max_width;
        self.validation.max_height = max_height;
        self
    }

    // Adjusts the cache bounds, this will override the default configuration.
    pub fn cache(mut self, max_entries: usize, ttl: Duration) -> Self {
        self.cache.max_entries = max_entries;
        self.cache.ttl_ms = ttl.as_millis() as u64;
        self
    }

    // Sets the per-provider timeout, zero disables it.
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.providers.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn max_fused_objects(mut self, max_objects: usize) -> Self {
        self.fusion.max_objects = max_objects;
        self
    }

    pub fn default_domain(mut self, domain: impl Into<String>) -> Self {
        self.semantics.default_domain = Some(domain.into());
        self
    }
}
