mod adapter;
mod degraded_analyzer;
mod metrics_layer;
mod orchestrator;
mod provider_service;

pub use adapter::ProviderAdapter;
pub use degraded_analyzer::{DegradedAnalyzer, FALLBACK_PROVIDER};
pub use metrics_layer::{ProviderMetrics, ProviderMetricsLayer};
pub use orchestrator::{Orchestration, ProviderOrchestrator};
pub use provider_service::ProviderService;
