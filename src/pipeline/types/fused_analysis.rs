use super::provider_result::{ColorSwatch, DetectedObject, ExtractedText, Face};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Merged view over every provider result of one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedAnalysis {
    pub description: String,
    pub objects: Vec<DetectedObject>,
    pub faces: Vec<Face>,
    pub text: Vec<ExtractedText>,
    pub colors: Vec<ColorSwatch>,
    pub scene: Option<String>,
    pub mood: Option<String>,
    pub confidence: f32,
    /// Provider name to its confidence, in configuration order
    pub confidence_breakdown: IndexMap<String, f32>,
    /// True when the degraded local analyzer produced the only input
    pub fallback: bool,
}

impl FusedAnalysis {
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.confidence_breakdown.keys().map(String::as_str)
    }

    pub fn full_text(&self) -> String {
        self.text
            .iter()
            .map(|t| t.content.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
