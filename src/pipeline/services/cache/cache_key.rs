use crate::pipeline::types::AnalysisOptions;
use std::fmt;
use tracing::warn;

/// Content hash of the payload combined with the canonical form of its options
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(payload: &[u8], options: &AnalysisOptions) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(payload);
        hasher.update(&[0u8]);

        // serde_json maps are sorted, so field and hint order never leak into the key
        let identity = options.cache_identity();
        match serde_json::to_value(&identity).and_then(|value| serde_json::to_vec(&value)) {
            Ok(canonical) => {
                hasher.update(&canonical);
            }
            Err(e) => {
                warn!("Falling back to debug form for cache identity: {}", e);
                hasher.update(format!("{:?}", identity).as_bytes());
            }
        }

        CacheKey(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{AnalysisMode, DetailLevel};

    #[test]
    fn hint_insertion_order_does_not_matter() {
        let first = AnalysisOptions::new()
            .with_hint("locale", "en")
            .with_hint("camera", "front");
        let second = AnalysisOptions::new()
            .with_hint("camera", "front")
            .with_hint("locale", "en");

        assert_eq!(
            CacheKey::derive(b"payload", &first),
            CacheKey::derive(b"payload", &second)
        );
    }

    #[test]
    fn force_refresh_is_not_part_of_identity() {
        let options = AnalysisOptions::new().with_domain("social");
        assert_eq!(
            CacheKey::derive(b"payload", &options),
            CacheKey::derive(b"payload", &options.clone().force_refresh(true))
        );
    }

    #[test]
    fn payload_and_options_both_change_the_key() {
        let options = AnalysisOptions::new();
        let base = CacheKey::derive(b"payload", &options);

        assert_ne!(base, CacheKey::derive(b"payload2", &options));
        assert_ne!(
            base,
            CacheKey::derive(b"payload", &options.clone().with_mode(AnalysisMode::Quick))
        );
        assert_ne!(
            base,
            CacheKey::derive(b"payload", &options.clone().with_detail(DetailLevel::Low))
        );
        assert_ne!(
            base,
            CacheKey::derive(b"payload", &options.clone().with_domain("ecommerce"))
        );
        assert_eq!(base.as_str().len(), 64);
    }
}
