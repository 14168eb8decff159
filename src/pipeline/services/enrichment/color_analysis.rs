use crate::pipeline::types::ColorSwatch;
use image::{Rgb, RgbImage};
use std::cmp::Reverse;
use std::collections::HashMap;

const QUANTIZATION_LEVELS: usize = 16;

pub(crate) fn rgb_to_luma(px: &Rgb<u8>) -> f32 {
    // Rec. 709 luminance
    0.2126 * px[0] as f32 + 0.7152 * px[1] as f32 + 0.0722 * px[2] as f32
}

fn quantize_rgb(px: &Rgb<u8>) -> [u8; 3] {
    let step = 256 / QUANTIZATION_LEVELS;
    [
        ((px[0] as usize / step) * step) as u8,
        ((px[1] as usize / step) * step) as u8,
        ((px[2] as usize / step) * step) as u8,
    ]
}

/// Most frequent quantized colors over a sampled grid, with their share of the samples
pub fn dominant_colors(image: &RgbImage, sample_step: u32, max_colors: usize) -> Vec<ColorSwatch> {
    let step = sample_step.max(1) as usize;
    let mut color_counts: HashMap<[u8; 3], u32> = HashMap::new();

    for y in (0..image.height()).step_by(step) {
        for x in (0..image.width()).step_by(step) {
            // quantize to reduce noise / unique bins
            *color_counts.entry(quantize_rgb(image.get_pixel(x, y))).or_insert(0) += 1;
        }
    }

    let total: u32 = color_counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<_> = color_counts.into_iter().collect();
    // ties broken by color so the output is deterministic
    sorted.sort_by_key(|&(rgb, count)| (Reverse(count), rgb));

    sorted
        .into_iter()
        .take(max_colors)
        .map(|(rgb, count)| ColorSwatch::new(rgb, count as f32 / total as f32))
        .collect()
}
