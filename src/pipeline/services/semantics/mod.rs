mod domain_profile;
mod semantic_analyzer;

pub use domain_profile::DomainProfile;
pub use semantic_analyzer::SemanticAnalyzer;
