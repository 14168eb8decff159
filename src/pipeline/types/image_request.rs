use super::options::AnalysisOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
    Tiff,
}

impl ImageFormat {
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            image::ImageFormat::WebP => Some(ImageFormat::WebP),
            image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
            image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    pub fn as_image_format(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Gif => image::ImageFormat::Gif,
            ImageFormat::WebP => image::ImageFormat::WebP,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::WebP => "webp",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw payload plus options as submitted by a caller, before validation
#[derive(Debug, Clone)]
pub struct ImageSubmission {
    pub payload: Arc<[u8]>,
    pub options: AnalysisOptions,
}

impl ImageSubmission {
    pub fn new(payload: impl Into<Arc<[u8]>>, options: AnalysisOptions) -> Self {
        Self {
            payload: payload.into(),
            options,
        }
    }
}

/// A validated request. Only the validator constructs one, so every instance
/// has already passed the format, size and dimension checks.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    payload: Arc<[u8]>,
    format: ImageFormat,
    size: usize,
    dimensions: (u32, u32),
    options: AnalysisOptions,
}

impl AnalysisRequest {
    pub(crate) fn new(
        payload: Arc<[u8]>,
        format: ImageFormat,
        dimensions: (u32, u32),
        options: AnalysisOptions,
    ) -> Self {
        Self {
            size: payload.len(),
            payload,
            format,
            dimensions,
            options,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }
}
