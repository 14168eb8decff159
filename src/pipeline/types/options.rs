use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Quick,
    #[default]
    Comprehensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Low,
    #[default]
    High,
}

impl DetailLevel {
    /// Number of object names surfaced in the summary block
    pub fn summary_objects(&self) -> usize {
        match self {
            DetailLevel::Low => 3,
            DetailLevel::High => 5,
        }
    }

    /// Upper bound on detail objects, `None` keeps the fused cap
    pub fn detail_object_limit(&self) -> Option<usize> {
        match self {
            DetailLevel::Low => Some(10),
            DetailLevel::High => None,
        }
    }
}

/// Caller supplied options for a single analysis
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisOptions {
    pub mode: AnalysisMode,
    pub domain: Option<String>,
    pub force_refresh: bool,
    pub detail: DetailLevel,
    /// Free-form hints forwarded to providers, sorted for stable hashing
    pub hints: BTreeMap<String, String>,
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_detail(mut self, detail: DetailLevel) -> Self {
        self.detail = detail;
        self
    }

    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hints.insert(key.into(), value.into());
        self
    }

    /// Lowercases and trims the domain and hint keys; blank values become absent.
    pub fn normalized(mut self) -> Self {
        self.domain = self
            .domain
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty());
        self.hints = self
            .hints
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        self
    }

    /// Options that identify a cached result. `force_refresh` only affects lookup.
    pub fn cache_identity(&self) -> CacheIdentity<'_> {
        CacheIdentity {
            mode: self.mode,
            domain: self.domain.as_deref(),
            detail: self.detail,
            hints: &self.hints,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheIdentity<'a> {
    mode: AnalysisMode,
    domain: Option<&'a str>,
    detail: DetailLevel,
    hints: &'a BTreeMap<String, String>,
}
