use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Succeeded,
    Failed,
    TimedOut,
}

/// What happened to one provider call, kept for observability only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider: String,
    pub status: ProviderStatus,
    pub confidence: Option<f32>,
    pub latency_ms: f64,
    pub error: Option<String>,
}

impl ProviderOutcome {
    pub fn succeeded(provider: impl Into<String>, confidence: f32, latency: Duration) -> Self {
        Self {
            provider: provider.into(),
            status: ProviderStatus::Succeeded,
            confidence: Some(confidence),
            latency_ms: latency.as_secs_f64() * 1000.0,
            error: None,
        }
    }

    pub fn failed(
        provider: impl Into<String>,
        status: ProviderStatus,
        error: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self {
            provider: provider.into(),
            status,
            confidence: None,
            latency_ms: latency.as_secs_f64() * 1000.0,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProviderStatus::Succeeded
    }
}
