use crate::pipeline::types::{Balance, EnrichedAnalysis, SceneContext, Setting};
use std::fmt;

const POSITIVE_EMOTIONS: &[&str] = &["happy", "joy", "joyful", "excited", "calm", "cheerful", "surprised"];

/// Insight vocabulary and relevance keywords for a caller's stated domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainProfile {
    Ecommerce,
    Social,
    RealEstate,
    General,
}

impl DomainProfile {
    /// Unknown names map to the general profile
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "ecommerce" | "e_commerce" | "retail" => DomainProfile::Ecommerce,
            "social" | "social_media" => DomainProfile::Social,
            "real_estate" | "realestate" | "property" => DomainProfile::RealEstate,
            _ => DomainProfile::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainProfile::Ecommerce => "ecommerce",
            DomainProfile::Social => "social",
            DomainProfile::RealEstate => "real_estate",
            DomainProfile::General => "general",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            DomainProfile::Ecommerce => &[
                "product", "bottle", "shoe", "shoes", "bag", "handbag", "watch", "phone", "shirt",
                "dress", "jacket", "package", "box", "laptop", "headphones", "sneaker", "jewelry",
                "price tag", "label", "cosmetics",
            ],
            DomainProfile::Social => &[
                "person", "people", "face", "smile", "friends", "party", "selfie", "dog", "cat",
                "food", "beach", "concert", "wedding", "child", "baby", "pet",
            ],
            DomainProfile::RealEstate => &[
                "house", "building", "room", "kitchen", "bedroom", "bathroom", "window", "sofa",
                "couch", "bed", "garden", "pool", "door", "living room", "fireplace", "balcony",
                "floor", "ceiling", "yard",
            ],
            DomainProfile::General => &[],
        }
    }

    /// Share of concepts matching this profile's vocabulary. The general profile
    /// scores by overall analysis confidence.
    pub fn relevance(&self, concepts: &[String], confidence: f32) -> f32 {
        if *self == DomainProfile::General {
            return confidence.clamp(0.0, 1.0);
        }
        if concepts.is_empty() {
            return 0.0;
        }
        let matched = concepts
            .iter()
            .filter(|concept| self.keywords().iter().any(|k| matches_keyword(concept, k)))
            .count();
        matched as f32 / concepts.len() as f32
    }

    pub fn insights(
        &self,
        enriched: &EnrichedAnalysis,
        concepts: &[String],
        context: &SceneContext,
        dominant_emotion: &str,
    ) -> Vec<String> {
        let mut insights = Vec::new();
        let mut tag = |condition: bool, insight: &str| {
            if condition {
                insights.push(insight.to_string());
            }
        };
        let has_keyword = |keyword: &str| concepts.iter().any(|c| matches_keyword(c, keyword));
        let fused = &enriched.fused;

        match self {
            DomainProfile::Ecommerce => {
                tag(
                    concepts.iter().any(|c| self.keywords().iter().any(|k| matches_keyword(c, k))),
                    "product-detected",
                );
                tag(fused.objects.len() == 1, "single-product-focus");
                tag(!enriched.brands.is_empty(), "brand-visible");
                tag(has_pricing_text(&fused.full_text()), "pricing-text");
                tag(context.people_count > 0, "lifestyle-shot");
                tag(enriched.colors.len() <= 2 && !enriched.colors.is_empty(), "clean-background");
            }
            DomainProfile::Social => {
                tag(context.people_count > 0, "people-present");
                tag(context.people_count >= 3, "group-photo");
                tag(POSITIVE_EMOTIONS.iter().any(|e| *e == dominant_emotion), "positive-mood");
                tag(has_keyword("dog") || has_keyword("cat") || has_keyword("pet"), "pet-content");
                tag(has_keyword("food"), "food-content");
                tag(context.setting == Setting::Outdoor, "outdoor-moment");
                tag(context.has_text, "text-overlay");
            }
            DomainProfile::RealEstate => {
                tag(context.setting == Setting::Indoor, "interior");
                tag(context.setting == Setting::Outdoor, "exterior");
                for room in ["kitchen", "bedroom", "bathroom", "living room"] {
                    tag(has_keyword(room), &format!("room:{}", room.replace(' ', "-")));
                }
                tag(has_keyword("pool") || has_keyword("garden") || has_keyword("balcony"), "amenity-visible");
                tag(enriched.composition.balance == Balance::Balanced, "balanced-composition");
                tag(!enriched.landmarks.is_empty(), "landmark-nearby");
            }
            DomainProfile::General => {
                tag(context.people_count > 0, "people-present");
                tag(context.has_text, "text-present");
                tag(fused.objects.len() >= 5, "busy-scene");
                tag(!enriched.brands.is_empty(), "brand-visible");
                tag(!enriched.landmarks.is_empty(), "landmark-visible");
            }
        }
        tag(fused.fallback, "degraded-analysis");
        insights
    }
}

impl fmt::Display for DomainProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-word match, so "bedroom" does not count as "room"
pub(crate) fn matches_keyword(concept: &str, keyword: &str) -> bool {
    concept == keyword
        || concept
            .split(|c: char| !c.is_alphanumeric())
            .collect::<Vec<_>>()
            .windows(keyword.split(' ').count())
            .any(|window| window.join(" ") == keyword)
}

fn has_pricing_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    let has_currency = text.chars().any(|c| matches!(c, '$' | '€' | '£' | '¥'));
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    (has_currency && has_digit) || lower.contains('%') || lower.split_whitespace().any(|w| w == "sale")
}
