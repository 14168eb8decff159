use crate::error::ProviderError;
use crate::pipeline::services::providers::ProviderAdapter;
use crate::pipeline::types::{AnalysisRequest, ProviderResult};
use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode_png(ImageBuffer::from_pixel(width, height, Rgb(color)))
}

/// Left half `left`, right half `right`
pub fn split_png_bytes(width: u32, height: u32, left: [u8; 3], right: [u8; 3]) -> Vec<u8> {
    let image = ImageBuffer::from_fn(width, height, |x, _| {
        if x < width / 2 { Rgb(left) } else { Rgb(right) }
    });
    encode_png(image)
}

fn encode_png(image: RgbImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

pub enum Behavior {
    Succeed(ProviderResult),
    Fail(String),
    Sleep(Duration, ProviderResult),
    Panic,
}

/// Adapter that replays a fixed behavior and counts how often it was called
pub struct ScriptedAdapter {
    name: String,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAdapter {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeeding(name: &str, result: ProviderResult) -> Self {
        Self::new(name, Behavior::Succeed(result))
    }

    pub fn failing(name: &str) -> Self {
        Self::new(name, Behavior::Fail("backend unavailable".to_string()))
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<ProviderResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed(result) => Ok(result.clone()),
            Behavior::Fail(message) => Err(ProviderError::backend(&self.name, message.clone())),
            Behavior::Sleep(delay, result) => {
                tokio::time::sleep(*delay).await;
                Ok(result.clone())
            }
            Behavior::Panic => panic!("scripted adapter panic"),
        }
    }
}
