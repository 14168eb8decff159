use crate::error::ValidationError;
use crate::pipeline::types::ProviderStatus;
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle notices published to `ImageAnalysisService::subscribe` receivers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Initialized {
        providers: Vec<String>,
    },
    Rejected {
        reason: String,
    },
    CacheHit {
        result_id: Uuid,
        cache_key: String,
    },
    ProviderFailed {
        provider: String,
        status: ProviderStatus,
        error: Option<String>,
    },
    FallbackUsed {
        cache_key: String,
    },
    Completed {
        result_id: Uuid,
        processing_time_ms: f64,
        cache_hit: bool,
        fallback: bool,
        error: bool,
    },
    ShutDown,
}

impl PipelineEvent {
    pub(crate) fn rejected(reason: &ValidationError) -> Self {
        PipelineEvent::Rejected {
            reason: reason.to_string(),
        }
    }
}
