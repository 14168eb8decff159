use super::color_analysis::rgb_to_luma;
use crate::pipeline::types::{Balance, Composition, DetectedObject, Orientation};
use image::RgbImage;

const BALANCED_THRESHOLD: f32 = 0.9;
const MAX_FOCAL_POINTS: usize = 3;
const GRID: u32 = 3;

/// Orientation and focal points from object boxes only, without touching pixels
pub fn from_objects(orientation: Orientation, objects: &[DetectedObject]) -> Composition {
    Composition {
        focal_points: object_focal_points(objects),
        ..Composition::empty(orientation)
    }
}

/// Full composition heuristics over decoded pixels
pub fn analyze(
    image: &RgbImage,
    orientation: Orientation,
    objects: &[DetectedObject],
    sample_step: u32,
) -> Composition {
    let (balance, balance_score) = left_right_balance(image, sample_step);
    let mut focal_points = object_focal_points(objects);
    if focal_points.is_empty() {
        focal_points.extend(brightest_tile(image));
    }

    Composition {
        orientation,
        balance,
        balance_score,
        focal_points,
    }
}

fn object_focal_points(objects: &[DetectedObject]) -> Vec<(f32, f32)> {
    let mut boxed: Vec<_> = objects
        .iter()
        .filter_map(|o| o.bounding_box.map(|b| (o.confidence, b)))
        .collect();
    boxed.sort_by(|a, b| b.0.total_cmp(&a.0));
    boxed
        .into_iter()
        .take(MAX_FOCAL_POINTS)
        .map(|(_, b)| {
            let (x, y) = b.center();
            (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0))
        })
        .collect()
}

/// Compares mean luminance of the left and right halves
fn left_right_balance(image: &RgbImage, sample_step: u32) -> (Balance, f32) {
    let (width, height) = image.dimensions();
    if width < 2 || height == 0 {
        return (Balance::Unknown, 0.0);
    }
    let step = sample_step.max(1) as usize;
    let mid = width / 2;

    let mut left = (0.0f32, 0u32);
    let mut right = (0.0f32, 0u32);
    for y in (0..height).step_by(step) {
        for x in (0..width).step_by(step) {
            let luma = rgb_to_luma(image.get_pixel(x, y));
            let side = if x < mid { &mut left } else { &mut right };
            side.0 += luma;
            side.1 += 1;
        }
    }
    if left.1 == 0 || right.1 == 0 {
        return (Balance::Unknown, 0.0);
    }

    let left_mean = left.0 / left.1 as f32;
    let right_mean = right.0 / right.1 as f32;
    let heavier = left_mean.max(right_mean);
    if heavier <= f32::EPSILON {
        return (Balance::Balanced, 1.0);
    }

    let score = left_mean.min(right_mean) / heavier;
    let balance = if score >= BALANCED_THRESHOLD {
        Balance::Balanced
    } else if left_mean > right_mean {
        Balance::LeftWeighted
    } else {
        Balance::RightWeighted
    };
    (balance, score)
}

/// Center of the brightest cell of a 3x3 grid
fn brightest_tile(image: &RgbImage) -> Option<(f32, f32)> {
    let (width, height) = image.dimensions();
    if width < GRID || height < GRID {
        return None;
    }
    let tile_w = width / GRID;
    let tile_h = height / GRID;

    let mut best: Option<(f32, u32, u32)> = None;
    for ty in 0..GRID {
        for tx in 0..GRID {
            let mut sum = 0.0f32;
            for y in ty * tile_h..(ty + 1) * tile_h {
                for x in tx * tile_w..(tx + 1) * tile_w {
                    sum += rgb_to_luma(image.get_pixel(x, y));
                }
            }
            if best.map_or(true, |(b, _, _)| sum > b) {
                best = Some((sum, tx, ty));
            }
        }
    }

    best.map(|(_, tx, ty)| {
        (
            (tx as f32 + 0.5) / GRID as f32,
            (ty as f32 + 0.5) / GRID as f32,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::BoundingBox;
    use image::{ImageBuffer, Rgb};

    fn split(left: [u8; 3], right: [u8; 3]) -> RgbImage {
        ImageBuffer::from_fn(12, 12, |x, _| if x < 6 { Rgb(left) } else { Rgb(right) })
    }

    #[test]
    fn bright_left_half_is_left_weighted() {
        let composition = analyze(&split([250, 250, 250], [10, 10, 10]), Orientation::Square, &[], 1);
        assert_eq!(composition.balance, Balance::LeftWeighted);
        assert!(composition.balance_score < 0.1);
    }

    #[test]
    fn uniform_image_is_balanced() {
        let composition = analyze(&split([90, 90, 90], [90, 90, 90]), Orientation::Square, &[], 2);
        assert_eq!(composition.balance, Balance::Balanced);
        assert_eq!(composition.balance_score, 1.0);
    }

    #[test]
    fn focal_points_prefer_object_boxes() {
        let objects = vec![
            DetectedObject::new("low", 0.2).with_bounding_box(BoundingBox::new(0.0, 0.0, 0.2, 0.2)),
            DetectedObject::new("high", 0.9).with_bounding_box(BoundingBox::new(0.5, 0.5, 0.5, 0.5)),
            DetectedObject::new("unboxed", 0.99),
        ];
        let composition = analyze(&split([0, 0, 0], [0, 0, 0]), Orientation::Square, &objects, 1);
        assert_eq!(composition.focal_points, vec![(0.75, 0.75), (0.1, 0.1)]);
    }

    #[test]
    fn falls_back_to_brightest_tile() {
        let image = ImageBuffer::from_fn(9, 9, |x, y| {
            if x >= 6 && y < 3 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let composition = analyze(&image, Orientation::Square, &[], 1);
        assert_eq!(composition.focal_points.len(), 1);
        let (x, y) = composition.focal_points[0];
        assert!((x - 5.0 / 6.0).abs() < 1e-6);
        assert!((y - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn object_only_composition_has_unknown_balance() {
        let composition = from_objects(Orientation::Portrait, &[]);
        assert_eq!(composition.balance, Balance::Unknown);
        assert_eq!(composition.orientation, Orientation::Portrait);
    }
}
