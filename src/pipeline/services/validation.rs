use crate::config::ValidationConfig;
use crate::error::ValidationError;
use crate::pipeline::types::{AnalysisOptions, AnalysisRequest, ImageFormat};
use image::ImageReader;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Format, size and dimension gatekeeping. The first failing check is reported.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    config: ValidationConfig,
}

impl ImageValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        payload: Arc<[u8]>,
        options: AnalysisOptions,
    ) -> Result<AnalysisRequest, ValidationError> {
        let format = self.check_format(&payload)?;
        self.check_size(payload.len())?;
        let dimensions = self.check_dimensions(&payload, format)?;

        debug!(
            "Validated {} image: {} bytes, {}x{}",
            format,
            payload.len(),
            dimensions.0,
            dimensions.1
        );
        Ok(AnalysisRequest::new(payload, format, dimensions, options))
    }

    fn check_format(&self, payload: &[u8]) -> Result<ImageFormat, ValidationError> {
        let detected = image::guess_format(payload)
            .map_err(|_| ValidationError::UnsupportedFormat("unknown".to_string()))?;
        let format = ImageFormat::from_image_format(detected).ok_or_else(|| {
            ValidationError::UnsupportedFormat(format!("{:?}", detected).to_lowercase())
        })?;

        if !self.config.supported_formats.contains(&format) {
            return Err(ValidationError::UnsupportedFormat(format.to_string()));
        }
        Ok(format)
    }

    fn check_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.config.max_image_size {
            return Err(ValidationError::PayloadTooLarge {
                size,
                max: self.config.max_image_size,
            });
        }
        Ok(())
    }

    fn check_dimensions(
        &self,
        payload: &[u8],
        format: ImageFormat,
    ) -> Result<(u32, u32), ValidationError> {
        let (width, height) =
            ImageReader::with_format(Cursor::new(payload), format.as_image_format())
                .into_dimensions()
                .map_err(|e| ValidationError::UnreadableImage(e.to_string()))?;

        if width > self.config.max_width || height > self.config.max_height {
            return Err(ValidationError::DimensionsExceeded {
                width,
                height,
                max_width: self.config.max_width,
                max_height: self.config.max_height,
            });
        }
        Ok((width, height))
    }
}
