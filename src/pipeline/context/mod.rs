pub mod analysis_context;
pub mod metrics;
pub mod state;

pub use analysis_context::AnalysisContext;
pub use metrics::RequestTimings;
pub use state::{
    AnalyzedState, EnrichedState, FusedState, OrchestratedState, ProcessingState, ValidatedState,
};
