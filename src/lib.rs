pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::Configuration;
pub use error::{AnalysisError, ProviderError, ValidationError};
pub use logging::init_logging;
pub use pipeline::services::ProviderAdapter;
pub use pipeline::types::{
    AnalysisMode, AnalysisOptions, AnalysisRequest, AnalysisResult, DetailLevel, ImageSubmission,
    ProviderResult,
};
pub use pipeline::{ImageAnalysisService, ImageAnalysisServiceBuilder, PipelineEvent};
