use super::domain_profile::{matches_keyword, DomainProfile};
use crate::config::SemanticsConfig;
use crate::pipeline::types::{
    EmotionSource, EmotionSummary, EnrichedAnalysis, SceneContext, SemanticAnalysis, Setting,
};
use indexmap::IndexMap;
use tracing::debug;

const INDOOR_KEYWORDS: &[&str] = &[
    "indoor", "interior", "room", "kitchen", "bedroom", "bathroom", "office", "sofa", "couch",
    "bed", "desk", "lamp", "ceiling", "shelf", "restaurant", "living room", "fireplace",
    "television", "carpet",
];

const OUTDOOR_KEYWORDS: &[&str] = &[
    "outdoor", "outdoors", "sky", "tree", "grass", "beach", "mountain", "street", "road", "car",
    "park", "garden", "sea", "ocean", "field", "forest", "river", "snow", "cloud", "sunset",
    "pool", "yard",
];

const PERSON_KEYWORDS: &[&str] = &["person", "people", "man", "woman", "child", "boy", "girl"];

/// Derives concepts, emotions, setting and domain insights. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct SemanticAnalyzer {
    default_domain: Option<String>,
}

impl SemanticAnalyzer {
    pub fn new(config: SemanticsConfig) -> Self {
        Self {
            default_domain: config.default_domain,
        }
    }

    pub fn analyze(&self, enriched: &EnrichedAnalysis, domain: Option<&str>) -> SemanticAnalysis {
        let profile = domain
            .or(self.default_domain.as_deref())
            .map(DomainProfile::from_name)
            .unwrap_or(DomainProfile::General);

        let concepts = concepts(enriched);
        let emotions = emotions(enriched);
        let context = scene_context(enriched, &concepts);
        let insights = profile.insights(enriched, &concepts, &context, &emotions.dominant);
        let relevance = profile.relevance(&concepts, enriched.fused.confidence);

        debug!(
            "Semantic analysis for '{}': {} concepts, setting {:?}, {} insights",
            profile,
            concepts.len(),
            context.setting,
            insights.len()
        );

        SemanticAnalysis {
            concepts,
            emotions,
            context,
            domain: profile.as_str().to_string(),
            insights,
            relevance,
        }
    }
}

/// Object names ordered by confidence, followed by the scene label
fn concepts(enriched: &EnrichedAnalysis) -> Vec<String> {
    let mut ranked: Vec<_> = enriched.fused.objects.iter().collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut concepts: Vec<String> = Vec::new();
    let names = ranked
        .into_iter()
        .map(|o| o.normalized_name())
        .chain(enriched.fused.scene.as_deref().map(|s| s.trim().to_lowercase()));
    for name in names {
        if !name.is_empty() && !concepts.contains(&name) {
            concepts.push(name);
        }
    }
    concepts
}

/// Face emotions weighted by face confidence, else the scene mood, else neutral
fn emotions(enriched: &EnrichedAnalysis) -> EmotionSummary {
    let mut weights: IndexMap<String, f32> = IndexMap::new();
    for face in &enriched.fused.faces {
        if let Some(emotion) = face.emotion.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            *weights.entry(emotion.to_lowercase()).or_insert(0.0) += face.confidence.max(0.0);
        }
    }

    let total: f32 = weights.values().sum();
    if total > 0.0 {
        let mut dominant: Option<(&String, f32)> = None;
        for (emotion, weight) in &weights {
            if dominant.map_or(true, |(_, best)| *weight > best) {
                dominant = Some((emotion, *weight));
            }
        }
        let dominant = dominant.map(|(e, _)| e.clone()).unwrap_or_else(|| "neutral".to_string());
        return EmotionSummary {
            dominant,
            source: EmotionSource::Faces,
            distribution: weights.into_iter().map(|(e, w)| (e, w / total)).collect(),
        };
    }

    match enriched.fused.mood.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(mood) => {
            let mood = mood.to_lowercase();
            let mut distribution = IndexMap::new();
            distribution.insert(mood.clone(), 1.0);
            EmotionSummary {
                dominant: mood,
                source: EmotionSource::Scene,
                distribution,
            }
        }
        None => EmotionSummary::neutral(),
    }
}

fn scene_context(enriched: &EnrichedAnalysis, concepts: &[String]) -> SceneContext {
    let fused = &enriched.fused;
    let description_words = fused.description.to_lowercase();

    let count_hits = |keywords: &[&str]| {
        keywords
            .iter()
            .filter(|k| {
                concepts.iter().any(|c| matches_keyword(c, k)) || matches_keyword(&description_words, k)
            })
            .count()
    };
    let indoor = count_hits(INDOOR_KEYWORDS);
    let outdoor = count_hits(OUTDOOR_KEYWORDS);
    let setting = match indoor.cmp(&outdoor) {
        std::cmp::Ordering::Greater => Setting::Indoor,
        std::cmp::Ordering::Less => Setting::Outdoor,
        std::cmp::Ordering::Equal => Setting::Unknown,
    };

    let scene = fused
        .scene
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| match setting {
            Setting::Indoor => "indoor".to_string(),
            Setting::Outdoor => "outdoor".to_string(),
            Setting::Unknown => "unknown".to_string(),
        });

    let people_objects = fused
        .objects
        .iter()
        .filter(|o| PERSON_KEYWORDS.iter().any(|k| matches_keyword(&o.normalized_name(), k)))
        .count();

    SceneContext {
        setting,
        scene,
        people_count: fused.faces.len().max(people_objects),
        has_text: !fused.full_text().is_empty(),
    }
}
