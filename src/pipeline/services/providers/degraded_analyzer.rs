use crate::pipeline::types::{AnalysisRequest, Orientation, ProviderResult};
use image::GenericImageView;
use tracing::{debug, warn};

pub const FALLBACK_PROVIDER: &str = "local-fallback";

const SAMPLE_STEP: usize = 4;

/// Local analyzer used when no provider answered. Never fails: when the pixels cannot
/// be decoded it still describes the image from its validated properties.
#[derive(Debug, Clone)]
pub struct DegradedAnalyzer {
    confidence: f32,
}

impl DegradedAnalyzer {
    pub fn new(confidence: f32) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> ProviderResult {
        let (width, height) = request.dimensions();
        let orientation = Orientation::from_dimensions(width, height);
        let tone = self.mean_luma(request).map(Self::tone);

        let mut description = format!(
            "{} {} image ({}x{})",
            orientation.as_str(),
            request.format().as_str().to_uppercase(),
            width,
            height
        );
        if let Some(tone) = tone {
            description = format!("{} {}", tone, description);
        }

        debug!("Degraded analysis produced: {}", description);

        let mut result = ProviderResult::new(FALLBACK_PROVIDER, capitalize(&description))
            .with_confidence(self.confidence);
        if let Some(tone) = tone {
            result = result.with_scene(format!("{} scene", tone));
        }
        result
    }

    fn mean_luma(&self, request: &AnalysisRequest) -> Option<f32> {
        let image =
            match image::load_from_memory_with_format(request.payload(), request.format().as_image_format()) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Degraded analyzer could not decode image: {}", e);
                    return None;
                }
            };
        if image.dimensions().0 == 0 || image.dimensions().1 == 0 {
            return None;
        }

        let luma = image.to_luma8();
        let (sum, count) = luma
            .pixels()
            .step_by(SAMPLE_STEP)
            .fold((0u64, 0u64), |(sum, count), px| (sum + px.0[0] as u64, count + 1));
        (count > 0).then(|| sum as f32 / count as f32)
    }

    fn tone(mean_luma: f32) -> &'static str {
        if mean_luma >= 170.0 {
            "bright"
        } else if mean_luma <= 85.0 {
            "dark"
        } else {
            "mid-tone"
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
