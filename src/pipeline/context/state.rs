use crate::pipeline::services::providers::Orchestration;
use crate::pipeline::types::{EnrichedAnalysis, FusedAnalysis, ProviderOutcome, SemanticAnalysis};

// Markers to track how far a request has travelled through the pipeline
pub struct ValidatedState;

pub struct OrchestratedState {
    pub(super) orchestration: Orchestration,
}

pub struct FusedState {
    pub(super) outcomes: Vec<ProviderOutcome>,
    pub(super) fused: FusedAnalysis,
}

pub struct EnrichedState {
    pub(super) outcomes: Vec<ProviderOutcome>,
    pub(super) enriched: EnrichedAnalysis,
}

pub struct AnalyzedState {
    pub(super) outcomes: Vec<ProviderOutcome>,
    pub(super) enriched: EnrichedAnalysis,
    pub(super) semantics: SemanticAnalysis,
}

pub trait ProcessingState: 'static {
    fn state_name() -> &'static str;
}

impl ProcessingState for ValidatedState {
    fn state_name() -> &'static str {
        "Validated"
    }
}

impl ProcessingState for OrchestratedState {
    fn state_name() -> &'static str {
        "Orchestrated"
    }
}

impl ProcessingState for FusedState {
    fn state_name() -> &'static str {
        "Fused"
    }
}

impl ProcessingState for EnrichedState {
    fn state_name() -> &'static str {
        "Enriched"
    }
}

impl ProcessingState for AnalyzedState {
    fn state_name() -> &'static str {
        "Analyzed"
    }
}
