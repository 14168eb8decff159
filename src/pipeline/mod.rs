pub mod context;
pub mod orchestration;
pub mod services;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use orchestration::{ImageAnalysisService, ImageAnalysisServiceBuilder, PipelineEvent};
pub use types::{AnalysisOptions, AnalysisResult, ImageSubmission};
