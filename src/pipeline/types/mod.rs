pub mod analysis_result;
pub mod enriched_analysis;
pub mod fused_analysis;
pub mod image_request;
pub mod options;
pub mod provider_outcome;
pub mod provider_result;
pub mod semantics;

pub use analysis_result::{AnalysisResult, Details, Metadata, Summary};
pub use enriched_analysis::{Balance, Composition, EnrichedAnalysis, Orientation, TextLanguage};
pub use fused_analysis::FusedAnalysis;
pub use image_request::{AnalysisRequest, ImageFormat, ImageSubmission};
pub use options::{AnalysisMode, AnalysisOptions, DetailLevel};
pub use provider_outcome::{ProviderOutcome, ProviderStatus};
pub use provider_result::{
    BoundingBox, ColorSwatch, DetectedObject, ExtractedText, Face, ProviderResult,
};
pub use semantics::{EmotionSource, EmotionSummary, SceneContext, SemanticAnalysis, Setting};
