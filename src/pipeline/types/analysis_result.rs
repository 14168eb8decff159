use super::enriched_analysis::{Composition, EnrichedAnalysis, Orientation, TextLanguage};
use super::options::DetailLevel;
use super::provider_outcome::ProviderOutcome;
use super::provider_result::{ColorSwatch, DetectedObject, ExtractedText, Face};
use super::semantics::SemanticAnalysis;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub description: String,
    pub top_objects: Vec<String>,
    pub confidence: f32,
    pub scene_type: String,
    pub mood: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Details {
    pub objects: Vec<DetectedObject>,
    pub faces: Vec<Face>,
    pub text: Vec<ExtractedText>,
    pub colors: Vec<ColorSwatch>,
    pub composition: Composition,
    pub languages: Vec<TextLanguage>,
    pub brands: Vec<String>,
    pub landmarks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub processing_time_ms: f64,
    pub providers_used: Vec<String>,
    pub confidence_breakdown: IndexMap<String, f32>,
    pub provider_outcomes: Vec<ProviderOutcome>,
    pub stage_timings_ms: IndexMap<String, f64>,
    pub cache_hit: bool,
    pub analyzed_at: DateTime<Utc>,
}

/// Unified answer handed back to callers. Always structurally complete;
/// `error` and `fallback` communicate reduced quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub error: bool,
    pub fallback: bool,
    pub error_message: Option<String>,
    pub summary: Summary,
    pub details: Details,
    pub semantics: SemanticAnalysis,
    pub metadata: Metadata,
}

impl AnalysisResult {
    pub(crate) fn assemble(
        enriched: EnrichedAnalysis,
        semantics: SemanticAnalysis,
        outcomes: Vec<ProviderOutcome>,
        stage_timings: IndexMap<String, Duration>,
        detail: DetailLevel,
        elapsed: Duration,
    ) -> Self {
        let EnrichedAnalysis {
            fused,
            colors,
            composition,
            languages,
            brands,
            landmarks,
        } = enriched;

        let mut ranked: Vec<&DetectedObject> = fused.objects.iter().collect();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let mut top_objects: Vec<String> = Vec::new();
        for object in ranked {
            if top_objects.len() == detail.summary_objects() {
                break;
            }
            if !top_objects.contains(&object.name) {
                top_objects.push(object.name.clone());
            }
        }

        let mut objects = fused.objects;
        if let Some(limit) = detail.detail_object_limit().filter(|l| objects.len() > *l) {
            objects.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            objects.truncate(limit);
        }

        let scene_type = fused
            .scene
            .clone()
            .unwrap_or_else(|| semantics.context.scene.clone());

        Self {
            id: Uuid::new_v4(),
            error: false,
            fallback: fused.fallback,
            error_message: None,
            summary: Summary {
                description: fused.description,
                top_objects,
                confidence: fused.confidence,
                scene_type,
                mood: semantics.emotions.dominant.clone(),
            },
            details: Details {
                objects,
                faces: fused.faces,
                text: fused.text,
                colors,
                composition,
                languages,
                brands,
                landmarks,
            },
            semantics,
            metadata: Metadata {
                processing_time_ms: millis(elapsed),
                providers_used: fused.confidence_breakdown.keys().cloned().collect(),
                confidence_breakdown: fused.confidence_breakdown,
                provider_outcomes: outcomes,
                stage_timings_ms: stage_timings
                    .into_iter()
                    .map(|(stage, duration)| (stage, millis(duration)))
                    .collect(),
                cache_hit: false,
                analyzed_at: Utc::now(),
            },
        }
    }

    /// Error-flagged result with neutral defaults
    pub(crate) fn failed(
        message: impl Into<String>,
        outcomes: Vec<ProviderOutcome>,
        elapsed: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            error: true,
            fallback: false,
            error_message: Some(message.into()),
            summary: Summary {
                description: String::new(),
                top_objects: Vec::new(),
                confidence: 0.0,
                scene_type: "unknown".to_string(),
                mood: "neutral".to_string(),
            },
            details: Details {
                objects: Vec::new(),
                faces: Vec::new(),
                text: Vec::new(),
                colors: Vec::new(),
                composition: Composition::empty(Orientation::Square),
                languages: Vec::new(),
                brands: Vec::new(),
                landmarks: Vec::new(),
            },
            semantics: SemanticAnalysis::empty(),
            metadata: Metadata {
                processing_time_ms: millis(elapsed),
                providers_used: Vec::new(),
                confidence_breakdown: IndexMap::new(),
                provider_outcomes: outcomes,
                stage_timings_ms: IndexMap::new(),
                cache_hit: false,
                analyzed_at: Utc::now(),
            },
        }
    }

    /// Copy of a cached result for a new caller. Summary and details are untouched.
    pub(crate) fn as_cache_hit(&self, elapsed: Duration) -> Self {
        let mut result = self.clone();
        result.id = Uuid::new_v4();
        result.metadata.cache_hit = true;
        result.metadata.processing_time_ms = millis(elapsed);
        result.metadata.stage_timings_ms = IndexMap::new();
        result
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
