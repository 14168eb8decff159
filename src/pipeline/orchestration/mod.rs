pub mod analysis_service;
pub mod events;

pub use analysis_service::{ImageAnalysisService, ImageAnalysisServiceBuilder};
pub use events::PipelineEvent;
