use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionSource {
    Faces,
    Scene,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSummary {
    pub dominant: String,
    pub source: EmotionSource,
    /// Emotion label to its share of the total weight
    pub distribution: IndexMap<String, f32>,
}

impl EmotionSummary {
    pub fn neutral() -> Self {
        Self {
            dominant: "neutral".to_string(),
            source: EmotionSource::None,
            distribution: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Setting {
    Indoor,
    Outdoor,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneContext {
    pub setting: Setting,
    pub scene: String,
    pub people_count: usize,
    pub has_text: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticAnalysis {
    pub concepts: Vec<String>,
    pub emotions: EmotionSummary,
    pub context: SceneContext,
    pub domain: String,
    pub insights: Vec<String>,
    /// How strongly the image matches the domain profile, in [0, 1]
    pub relevance: f32,
}

impl SemanticAnalysis {
    pub fn empty() -> Self {
        Self {
            concepts: Vec::new(),
            emotions: EmotionSummary::neutral(),
            context: SceneContext {
                setting: Setting::Unknown,
                scene: "unknown".to_string(),
                people_count: 0,
                has_text: false,
            },
            domain: "general".to_string(),
            insights: Vec::new(),
            relevance: 0.0,
        }
    }
}
