mod color_analysis;
mod composition;
mod context_enricher;
mod language;

pub use color_analysis::dominant_colors;
pub use context_enricher::ContextEnricher;
pub use language::detect_language;
