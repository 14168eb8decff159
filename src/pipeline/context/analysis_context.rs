use crate::pipeline::context::metrics::RequestTimings;
use crate::pipeline::context::state::{
    AnalyzedState, EnrichedState, FusedState, OrchestratedState, ProcessingState, ValidatedState,
};
use crate::pipeline::services::cache::CacheKey;
use crate::pipeline::services::providers::Orchestration;
use crate::pipeline::types::{
    AnalysisRequest, AnalysisResult, EnrichedAnalysis, FusedAnalysis, ProviderResult,
    SemanticAnalysis,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

// AnalysisContext with compile-time state tracking via the state marker
pub struct AnalysisContext<S> {
    request: Arc<AnalysisRequest>,
    cache_key: CacheKey,
    timings: RequestTimings,
    processing_start: Instant,
    state: S,
}

impl<S: ProcessingState> AnalysisContext<S> {
    pub fn request(&self) -> &Arc<AnalysisRequest> {
        &self.request
    }

    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }

    pub fn elapsed(&self) -> Duration {
        self.processing_start.elapsed()
    }

    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }

    fn advance<T>(mut self, stage: &str, transition: impl FnOnce(S) -> T) -> AnalysisContext<T> {
        self.timings.record_stage(stage);
        AnalysisContext {
            request: self.request,
            cache_key: self.cache_key,
            timings: self.timings,
            processing_start: self.processing_start,
            state: transition(self.state),
        }
    }
}

impl AnalysisContext<ValidatedState> {
    pub fn new(request: AnalysisRequest, cache_key: CacheKey, processing_start: Instant) -> Self {
        Self {
            request: Arc::new(request),
            cache_key,
            timings: RequestTimings::new(),
            processing_start,
            state: ValidatedState,
        }
    }

    pub fn into_orchestrated(
        self,
        orchestration: Orchestration,
    ) -> AnalysisContext<OrchestratedState> {
        self.advance("orchestration", |_| OrchestratedState { orchestration })
    }
}

impl AnalysisContext<OrchestratedState> {
    pub fn provider_results(&self) -> &[ProviderResult] {
        &self.state.orchestration.results
    }

    pub fn into_fused(self, fused: FusedAnalysis) -> AnalysisContext<FusedState> {
        self.advance("fusion", |state| FusedState {
            outcomes: state.orchestration.outcomes,
            fused,
        })
    }

    /// Terminates the request with an error-flagged result.
    pub fn into_failed(self, message: impl Into<String>) -> AnalysisResult {
        let elapsed = self.elapsed();
        AnalysisResult::failed(message, self.state.orchestration.outcomes, elapsed)
    }
}

impl AnalysisContext<FusedState> {
    pub fn fused(&self) -> &FusedAnalysis {
        &self.state.fused
    }

    pub fn into_enriched(self, enriched: EnrichedAnalysis) -> AnalysisContext<EnrichedState> {
        self.advance("enrichment", |state| EnrichedState {
            outcomes: state.outcomes,
            enriched,
        })
    }
}

impl AnalysisContext<EnrichedState> {
    pub fn enriched(&self) -> &EnrichedAnalysis {
        &self.state.enriched
    }

    pub fn into_analyzed(self, semantics: SemanticAnalysis) -> AnalysisContext<AnalyzedState> {
        self.advance("semantics", |state| AnalyzedState {
            outcomes: state.outcomes,
            enriched: state.enriched,
            semantics,
        })
    }
}

impl AnalysisContext<AnalyzedState> {
    pub fn semantics(&self) -> &SemanticAnalysis {
        &self.state.semantics
    }

    /// Assembles the caller-facing result and hands back the key to cache it under.
    pub fn into_result(self) -> (AnalysisResult, CacheKey) {
        let elapsed = self.elapsed();
        let detail = self.request.options().detail;
        let AnalyzedState {
            outcomes,
            enriched,
            semantics,
        } = self.state;
        let result = AnalysisResult::assemble(
            enriched,
            semantics,
            outcomes,
            self.timings.into_stages(),
            detail,
            elapsed,
        );
        (result, self.cache_key)
    }
}
