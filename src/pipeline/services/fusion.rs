use crate::config::FusionConfig;
use crate::error::AnalysisError;
use crate::pipeline::services::providers::FALLBACK_PROVIDER;
use crate::pipeline::types::{ColorSwatch, DetectedObject, FusedAnalysis, ProviderResult};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Merges ordered provider results into a single analysis
#[derive(Debug, Clone)]
pub struct ResultFuser {
    config: FusionConfig,
}

impl ResultFuser {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn fuse(&self, results: &[ProviderResult]) -> Result<FusedAnalysis, AnalysisError> {
        let fused = match results {
            [] => return Err(AnalysisError::FusionEmpty),
            [single] => self.passthrough(single),
            many => self.merge(many),
        };
        debug!(
            "Fused {} provider results into {} objects with confidence {:.3}",
            results.len(),
            fused.objects.len(),
            fused.confidence
        );
        Ok(fused)
    }

    fn passthrough(&self, result: &ProviderResult) -> FusedAnalysis {
        let confidence = result.effective_confidence(0.0);
        let mut objects = result.objects.clone();
        if objects.len() > self.config.max_objects {
            self.cap(&mut objects);
        }

        let mut breakdown = IndexMap::new();
        breakdown.insert(result.provider.clone(), confidence);

        FusedAnalysis {
            description: result.description.clone(),
            objects,
            faces: result.faces.clone(),
            text: result.text.clone(),
            colors: dedup_colors(result.colors.iter()),
            scene: result.scene.clone(),
            mood: result.mood.clone(),
            confidence,
            confidence_breakdown: breakdown,
            fallback: result.provider == FALLBACK_PROVIDER,
        }
    }

    fn merge(&self, results: &[ProviderResult]) -> FusedAnalysis {
        let description = results
            .iter()
            .map(|r| r.description.trim())
            .find(|d| !d.is_empty())
            .unwrap_or_default()
            .to_string();

        let mut objects = self.dedup_objects(results.iter().flat_map(|r| r.objects.iter()));
        self.cap(&mut objects);

        let mut breakdown = IndexMap::with_capacity(results.len());
        for result in results {
            breakdown.insert(result.provider.clone(), result.effective_confidence(0.0));
        }

        FusedAnalysis {
            description,
            objects,
            faces: results.iter().flat_map(|r| r.faces.iter().cloned()).collect(),
            text: results.iter().flat_map(|r| r.text.iter().cloned()).collect(),
            colors: dedup_colors(results.iter().flat_map(|r| r.colors.iter())),
            scene: first_label(results.iter().map(|r| r.scene.as_deref())),
            mood: first_label(results.iter().map(|r| r.mood.as_deref())),
            confidence: weighted_confidence(breakdown.values().copied()),
            confidence_breakdown: breakdown,
            fallback: false,
        }
    }

    /// Keeps the highest-confidence instance per (name, confidence bucket)
    fn dedup_objects<'a>(
        &self,
        objects: impl Iterator<Item = &'a DetectedObject>,
    ) -> Vec<DetectedObject> {
        let mut kept: IndexMap<(String, i64), DetectedObject> = IndexMap::new();
        for object in objects {
            let key = (object.normalized_name(), self.bucket(object.confidence));
            match kept.get_mut(&key) {
                Some(existing) if existing.confidence >= object.confidence => {}
                Some(existing) => *existing = object.clone(),
                None => {
                    kept.insert(key, object.clone());
                }
            }
        }
        kept.into_values().collect()
    }

    fn bucket(&self, confidence: f32) -> i64 {
        (confidence / self.config.dedup_bucket_width).round() as i64
    }

    fn cap(&self, objects: &mut Vec<DetectedObject>) {
        objects.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        objects.truncate(self.config.max_objects);
    }
}

/// Each provider weighted by its own confidence: sum(c^2) / sum(c)
fn weighted_confidence(confidences: impl Iterator<Item = f32>) -> f32 {
    let (weighted, total) = confidences.fold((0.0f32, 0.0f32), |(w, t), c| (w + c * c, t + c));
    if total > 0.0 { (weighted / total).clamp(0.0, 1.0) } else { 0.0 }
}

fn dedup_colors<'a>(colors: impl Iterator<Item = &'a ColorSwatch>) -> Vec<ColorSwatch> {
    let mut seen = HashSet::new();
    colors.filter(|c| seen.insert(c.hex())).cloned().collect()
}

fn first_label<'a>(mut labels: impl Iterator<Item = Option<&'a str>>) -> Option<String> {
    labels
        .find_map(|label| label.map(str::trim).filter(|l| !l.is_empty()))
        .map(str::to_string)
}
