use super::fused_analysis::FusedAnalysis;
use super::provider_result::ColorSwatch;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else if height > width {
            Orientation::Portrait
        } else {
            Orientation::Square
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Balance {
    Balanced,
    LeftWeighted,
    RightWeighted,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub orientation: Orientation,
    pub balance: Balance,
    /// 1.0 means equal visual weight on both halves
    pub balance_score: f32,
    /// Normalized (x, y) points of interest
    pub focal_points: Vec<(f32, f32)>,
}

impl Composition {
    pub fn empty(orientation: Orientation) -> Self {
        Self {
            orientation,
            balance: Balance::Unknown,
            balance_score: 0.0,
            focal_points: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLanguage {
    pub text: String,
    pub language: String,
}

/// Fused analysis plus derived secondary attributes
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedAnalysis {
    pub fused: FusedAnalysis,
    pub colors: Vec<ColorSwatch>,
    pub composition: Composition,
    pub languages: Vec<TextLanguage>,
    pub brands: Vec<String>,
    pub landmarks: Vec<String>,
}
