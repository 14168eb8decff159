use super::{color_analysis, composition, language};
use crate::config::EnrichmentConfig;
use crate::pipeline::types::{
    AnalysisMode, AnalysisRequest, ColorSwatch, EnrichedAnalysis, FusedAnalysis, Orientation,
    TextLanguage,
};
use image::RgbImage;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Derives secondary attributes from a fused analysis. Never fails: a sub-step that
/// cannot run leaves its field empty.
#[derive(Debug, Clone)]
pub struct ContextEnricher {
    config: EnrichmentConfig,
    brands: Vec<CatalogEntry>,
    landmarks: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    name: String,
    needle: String,
}

impl ContextEnricher {
    pub fn new(config: EnrichmentConfig) -> Self {
        let brands = catalog(&config.brand_catalog);
        let landmarks = catalog(&config.landmark_catalog);
        Self {
            config,
            brands,
            landmarks,
        }
    }

    #[instrument(skip_all, fields(mode = ?request.options().mode))]
    pub fn enrich(&self, fused: FusedAnalysis, request: &AnalysisRequest) -> EnrichedAnalysis {
        let orientation = Orientation::from_dimensions(request.width(), request.height());

        let pixels = match request.options().mode {
            AnalysisMode::Quick => None,
            AnalysisMode::Comprehensive => self.decode(request),
        };

        let (extracted, composition) = match &pixels {
            Some(image) => (
                color_analysis::dominant_colors(
                    image,
                    self.config.sample_step,
                    self.config.max_colors,
                ),
                composition::analyze(image, orientation, &fused.objects, self.config.sample_step),
            ),
            None => (
                Vec::new(),
                composition::from_objects(orientation, &fused.objects),
            ),
        };

        let colors = self.merge_colors(&fused.colors, extracted);
        let languages = self.detect_languages(&fused);
        let haystack = searchable_text(&fused);
        let brands = find_mentions(&self.brands, &haystack);
        let landmarks = find_mentions(&self.landmarks, &haystack);

        debug!(
            "Enriched with {} colors, {} text languages, {} brands, {} landmarks",
            colors.len(),
            languages.len(),
            brands.len(),
            landmarks.len()
        );

        EnrichedAnalysis {
            fused,
            colors,
            composition,
            languages,
            brands,
            landmarks,
        }
    }

    fn decode(&self, request: &AnalysisRequest) -> Option<RgbImage> {
        match image::load_from_memory_with_format(request.payload(), request.format().as_image_format())
        {
            Ok(image) => Some(image.to_rgb8()),
            Err(e) => {
                warn!("Skipping pixel enrichment, image could not be decoded: {}", e);
                None
            }
        }
    }

    /// Provider colors first, then extracted ones, unique by hex
    fn merge_colors(&self, provided: &[ColorSwatch], extracted: Vec<ColorSwatch>) -> Vec<ColorSwatch> {
        let mut seen = HashSet::new();
        provided
            .iter()
            .cloned()
            .chain(extracted)
            .filter(|c| seen.insert(c.hex()))
            .take(self.config.max_colors)
            .collect()
    }

    fn detect_languages(&self, fused: &FusedAnalysis) -> Vec<TextLanguage> {
        fused
            .text
            .iter()
            .map(|block| block.content.trim())
            .filter(|content| !content.is_empty())
            .map(|content| TextLanguage {
                text: content.to_string(),
                language: language::detect_language(content).to_string(),
            })
            .collect()
    }
}

fn catalog(names: &[String]) -> Vec<CatalogEntry> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| CatalogEntry {
            name: name.to_string(),
            needle: format!(" {} ", normalize(name)),
        })
        .collect()
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn searchable_text(fused: &FusedAnalysis) -> String {
    let mut parts: Vec<&str> = vec![fused.description.as_str()];
    parts.extend(fused.objects.iter().map(|o| o.name.as_str()));
    parts.extend(fused.text.iter().map(|t| t.content.as_str()));
    parts.extend(fused.scene.as_deref());
    format!(" {} ", normalize(&parts.join(" ")))
}

/// Catalog entries mentioned as whole words, in catalog order
fn find_mentions(entries: &[CatalogEntry], haystack: &str) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| haystack.contains(&entry.needle))
        .map(|entry| entry.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::pipeline::services::validation::ImageValidator;
    use crate::pipeline::test_support::{png_bytes, split_png_bytes};
    use crate::pipeline::types::{AnalysisOptions, Balance, DetectedObject, ExtractedText};
    use indexmap::IndexMap;

    fn request(payload: Vec<u8>, options: AnalysisOptions) -> AnalysisRequest {
        ImageValidator::new(ValidationConfig::default())
            .validate(payload.into(), options)
            .unwrap()
    }

    fn fused(description: &str) -> FusedAnalysis {
        FusedAnalysis {
            description: description.to_string(),
            objects: Vec::new(),
            faces: Vec::new(),
            text: Vec::new(),
            colors: Vec::new(),
            scene: None,
            mood: None,
            confidence: 0.8,
            confidence_breakdown: IndexMap::new(),
            fallback: false,
        }
    }

    #[test]
    fn comprehensive_mode_extracts_colors_and_balance() {
        let enricher = ContextEnricher::new(EnrichmentConfig::default());
        let request = request(
            split_png_bytes(32, 16, [250, 250, 250], [0, 0, 0]),
            AnalysisOptions::default(),
        );

        let enriched = enricher.enrich(fused("a sign"), &request);

        assert_eq!(enriched.colors.len(), 2);
        assert_eq!(enriched.composition.orientation, Orientation::Landscape);
        assert_eq!(enriched.composition.balance, Balance::LeftWeighted);
        assert_eq!(enriched.composition.focal_points.len(), 1);
    }

    #[test]
    fn quick_mode_skips_pixel_work() {
        let enricher = ContextEnricher::new(EnrichmentConfig::default());
        let request = request(
            png_bytes(8, 8, [10, 200, 10]),
            AnalysisOptions::default().with_mode(AnalysisMode::Quick),
        );

        let enriched = enricher.enrich(fused("grass"), &request);

        assert!(enriched.colors.is_empty());
        assert_eq!(enriched.composition.balance, Balance::Unknown);
        assert_eq!(enriched.composition.orientation, Orientation::Square);
    }

    #[test]
    fn provider_colors_come_first_and_are_not_duplicated() {
        let enricher = ContextEnricher::new(EnrichmentConfig::default());
        let request = request(png_bytes(8, 8, [0, 0, 240]), AnalysisOptions::default());
        let mut input = fused("blue");
        input.colors = vec![ColorSwatch::new([0, 0, 240], 0.9), ColorSwatch::new([1, 2, 3], 0.1)];

        let enriched = enricher.enrich(input, &request);

        let hexes: Vec<_> = enriched.colors.iter().map(|c| c.hex()).collect();
        assert_eq!(hexes, vec!["#0000f0", "#010203"]);
        assert_eq!(enriched.colors[0].coverage, 0.9);
    }

    #[test]
    fn detects_text_languages_per_block() {
        let enricher = ContextEnricher::new(EnrichmentConfig::default());
        let request = request(png_bytes(4, 4, [0, 0, 0]), AnalysisOptions::default());
        let mut input = fused("storefront");
        input.text = vec![
            ExtractedText::new("Open for the holidays", 0.9),
            ExtractedText::new("  ", 0.9),
            ExtractedText::new("Abierto para los clientes", 0.8),
        ];

        let enriched = enricher.enrich(input, &request);

        let languages: Vec<_> = enriched.languages.iter().map(|l| l.language.as_str()).collect();
        assert_eq!(languages, vec!["en", "es"]);
    }

    #[test]
    fn brands_and_landmarks_need_a_catalog() {
        let request = request(png_bytes(4, 4, [0, 0, 0]), AnalysisOptions::default());
        let mut input = fused("Tourists near the Eiffel Tower drinking Acme cola");
        input.objects.push(DetectedObject::new("acme bottle", 0.7));

        let bare = ContextEnricher::new(EnrichmentConfig::default()).enrich(input.clone(), &request);
        assert!(bare.brands.is_empty());
        assert!(bare.landmarks.is_empty());

        let configured = ContextEnricher::new(EnrichmentConfig {
            brand_catalog: vec!["Acme".to_string(), "Acm".to_string(), "Globex".to_string()],
            landmark_catalog: vec!["Eiffel Tower".to_string()],
            ..EnrichmentConfig::default()
        });
        let enriched = configured.enrich(input, &request);
        assert_eq!(enriched.brands, vec!["Acme"]);
        assert_eq!(enriched.landmarks, vec!["Eiffel Tower"]);
    }
}
