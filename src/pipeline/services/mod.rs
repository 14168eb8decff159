pub mod cache;
pub mod enrichment;
pub mod fusion;
pub mod metrics;
pub mod providers;
pub mod semantics;
pub mod validation;

pub use cache::{CacheKey, CacheStore};
pub use enrichment::ContextEnricher;
pub use fusion::ResultFuser;
pub use metrics::{MetricsCollector, MetricsSnapshot, ProviderStats};
pub use providers::{ProviderAdapter, ProviderOrchestrator};
pub use semantics::{DomainProfile, SemanticAnalyzer};
pub use validation::ImageValidator;
