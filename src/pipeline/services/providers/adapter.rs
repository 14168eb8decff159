use crate::error::ProviderError;
use crate::pipeline::types::{AnalysisRequest, ProviderResult};
use async_trait::async_trait;

/// One external analysis backend. Supplied by the caller, one instance per backend.
///
/// Implementations should not block the executor; long calls are bounded by the
/// orchestrator's per-provider timeout and abandoned when it fires.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<ProviderResult, ProviderError>;

    async fn initialize(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn shutdown(&self) {}
}
