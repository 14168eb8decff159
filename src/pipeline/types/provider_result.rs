use serde::{Deserialize, Serialize};

/// Normalized bounding box, all fields in [0, 1] relative to the image size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub name: String,
    pub confidence: f32,
    pub bounding_box: Option<BoundingBox>,
}

impl DetectedObject {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
            bounding_box: None,
        }
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub bounding_box: Option<BoundingBox>,
    pub emotion: Option<String>,
    pub confidence: f32,
}

impl Face {
    pub fn new(confidence: f32) -> Self {
        Self {
            bounding_box: None,
            emotion: None,
            confidence,
        }
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = Some(emotion.into());
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub content: String,
    pub confidence: f32,
    pub bounding_box: Option<BoundingBox>,
}

impl ExtractedText {
    pub fn new(content: impl Into<String>, confidence: f32) -> Self {
        Self {
            content: content.into(),
            confidence,
            bounding_box: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub rgb: [u8; 3],
    /// Share of the image covered by this color, in [0, 1]
    pub coverage: f32,
}

impl ColorSwatch {
    pub fn new(rgb: [u8; 3], coverage: f32) -> Self {
        Self { rgb, coverage }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

/// Output of a single provider for a single request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderResult {
    pub provider: String,
    pub description: String,
    pub objects: Vec<DetectedObject>,
    pub faces: Vec<Face>,
    pub text: Vec<ExtractedText>,
    pub colors: Vec<ColorSwatch>,
    pub scene: Option<String>,
    pub mood: Option<String>,
    /// Provider-reported confidence. The orchestrator fills it in when absent.
    pub confidence: Option<f32>,
}

impl ProviderResult {
    pub fn new(provider: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_object(mut self, object: DetectedObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_face(mut self, face: Face) -> Self {
        self.faces.push(face);
        self
    }

    pub fn with_text(mut self, text: ExtractedText) -> Self {
        self.text.push(text);
        self
    }

    pub fn with_color(mut self, color: ColorSwatch) -> Self {
        self.colors.push(color);
        self
    }

    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Confidence used for weighting. Falls back to the mean object confidence,
    /// then to `default` when the provider gave no signal at all.
    pub fn effective_confidence(&self, default: f32) -> f32 {
        if let Some(confidence) = self.confidence.filter(|c| c.is_finite()) {
            return confidence.clamp(0.0, 1.0);
        }
        if self.objects.is_empty() {
            return default;
        }
        let sum: f32 = self.objects.iter().map(|o| o.confidence).sum();
        (sum / self.objects.len() as f32).clamp(0.0, 1.0)
    }
}
