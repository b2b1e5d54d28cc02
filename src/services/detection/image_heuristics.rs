// Image Heuristics
// Pixel statistics on a downscaled RGBA copy of the image:
// brightness-histogram smoothness, edge density and repeated pixels.

use image::imageops::FilterType;
use image::RgbaImage;
use tracing::debug;

use crate::models::SignalResult;
use super::SignalOutput;

pub const PIXEL_SIGNAL: &str = "Pixel Analysis";

/// Reported when the payload cannot be decoded at all.
pub const DECODE_FALLBACK_SCORE: i32 = 60;

const MAX_SIDE: u32 = 256;
const BASE_SCORE: i32 = 70;
const SCORE_MIN: i32 = 10;
const SCORE_MAX: i32 = 95;

const SMOOTHNESS_THRESHOLD: f64 = 0.3;
const EDGE_GRADIENT: f64 = 50.0;
const EDGE_DENSITY_THRESHOLD: f64 = 0.05;
const REPEAT_SAMPLES: usize = 1000;
const REPEAT_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct PixelMetrics {
    /// Sum of |h[i] - h[i-1]| over the brightness histogram, divided by pixel count.
    pub histogram_roughness: f64,
    pub edge_density: f64,
    pub repeat_ratio: f64,
}

/// Decode and shrink so neither side exceeds 256px, keeping aspect ratio.
pub fn decode_downscaled(bytes: &[u8]) -> Option<RgbaImage> {
    let img = image::load_from_memory(bytes).ok()?;
    let img = if img.width() > MAX_SIDE || img.height() > MAX_SIDE {
        // Nearest keeps source sample values intact.
        img.resize(MAX_SIDE, MAX_SIDE, FilterType::Nearest)
    } else {
        img
    };
    Some(img.to_rgba8())
}

fn brightness(px: &image::Rgba<u8>) -> usize {
    (px[0] as usize + px[1] as usize + px[2] as usize) / 3
}

pub fn histogram_roughness(img: &RgbaImage) -> f64 {
    let total = img.width() as usize * img.height() as usize;
    if total == 0 {
        return 0.0;
    }
    let mut histogram = [0usize; 256];
    for px in img.pixels() {
        histogram[brightness(px)] += 1;
    }
    let diff_sum: usize = histogram
        .windows(2)
        .map(|w| w[0].abs_diff(w[1]))
        .sum();
    diff_sum as f64 / total as f64
}

/// Share of interior pixels whose red-channel 4-neighbour gradient exceeds 50.
pub fn edge_density(img: &RgbaImage) -> f64 {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }
    let red = |x: u32, y: u32| img.get_pixel(x, y)[0] as f64;

    let mut edges = 0usize;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = red(x + 1, y) - red(x - 1, y);
            let gy = red(x, y + 1) - red(x, y - 1);
            if (gx * gx + gy * gy).sqrt() > EDGE_GRADIENT {
                edges += 1;
            }
        }
    }
    let interior = (w - 2) as usize * (h - 2) as usize;
    edges as f64 / interior as f64
}

/// Compare up to 1000 evenly strided pixels with the pixel one stride further on.
pub fn repeat_ratio(img: &RgbaImage) -> f64 {
    let raw = img.as_raw();
    let total = raw.len() / 4;
    let stride = (total / REPEAT_SAMPLES).max(1);
    let rgb = |i: usize| &raw[i * 4..i * 4 + 3];

    let mut samples = 0usize;
    let mut repeats = 0usize;
    let mut i = 0usize;
    while i + stride < total && samples < REPEAT_SAMPLES {
        if rgb(i) == rgb(i + stride) {
            repeats += 1;
        }
        samples += 1;
        i += stride;
    }
    if samples == 0 {
        return 0.0;
    }
    repeats as f64 / samples as f64
}

pub fn pixel_metrics(img: &RgbaImage) -> PixelMetrics {
    PixelMetrics {
        histogram_roughness: histogram_roughness(img),
        edge_density: edge_density(img),
        repeat_ratio: repeat_ratio(img),
    }
}

pub fn score_pixels(img: &RgbaImage) -> SignalOutput {
    let metrics = pixel_metrics(img);
    debug!(?metrics, "pixel.metrics");

    let mut score = BASE_SCORE;
    let mut warnings = Vec::new();

    if metrics.histogram_roughness < SMOOTHNESS_THRESHOLD {
        score -= 10;
        warnings.push("Unusually smooth brightness distribution, common in AI-generated images".to_string());
    }
    if metrics.edge_density < EDGE_DENSITY_THRESHOLD {
        score -= 8;
        warnings.push("Very low edge detail suggests artificial smoothing".to_string());
    }
    if metrics.repeat_ratio > REPEAT_THRESHOLD {
        score -= 10;
        warnings.push("Repeating pixel patterns detected".to_string());
    }

    SignalOutput {
        results: vec![SignalResult::new(PIXEL_SIGNAL, score.clamp(SCORE_MIN, SCORE_MAX))],
        warnings,
    }
}

/// Score an encoded image; undecodable payloads get a fixed score and no warnings.
pub fn analyze_pixels(bytes: &[u8]) -> SignalOutput {
    match decode_downscaled(bytes) {
        Some(img) => score_pixels(&img),
        None => {
            debug!("pixel decode failed, using fallback score");
            SignalOutput {
                results: vec![SignalResult::new(PIXEL_SIGNAL, DECODE_FALLBACK_SCORE)],
                warnings: Vec::new(),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    pub fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    pub fn uniform_gray(width: u32, height: u32) -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(width, height, Rgb([128, 128, 128])))
    }

    /// Deterministic noise over eight levels per channel: spiky histogram, dense edges.
    pub fn textured(width: u32, height: u32) -> Vec<u8> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state >> 32) % 8) as u8 * 32
        };
        let img = RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]));
        encode_png(&img)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{textured, uniform_gray};
    use super::*;

    #[test]
    fn test_downscale_bounds_and_aspect() {
        let img = decode_downscaled(&textured(640, 480)).unwrap();
        assert_eq!(img.dimensions(), (256, 192));

        let small = decode_downscaled(&uniform_gray(40, 20)).unwrap();
        assert_eq!(small.dimensions(), (40, 20));
    }

    #[test]
    fn test_uniform_gray_metrics() {
        let img = decode_downscaled(&uniform_gray(512, 512)).unwrap();
        let m = pixel_metrics(&img);
        // One spike in the histogram: up then down. A flat image is therefore not
        // "smooth" under this metric; edge density and repetition penalize it instead.
        assert!((m.histogram_roughness - 2.0).abs() < 1e-9);
        assert_eq!(m.edge_density, 0.0);
        assert_eq!(m.repeat_ratio, 1.0);
    }

    #[test]
    fn test_uniform_gray_is_penalized() {
        let out = analyze_pixels(&uniform_gray(512, 512));
        assert_eq!(out.results[0].score, 70 - 8 - 10);
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_textured_image_keeps_base_score() {
        let out = analyze_pixels(&textured(640, 480));
        assert_eq!(out.results[0].score, 70);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_smooth_gradient_triggers_smoothness() {
        // Every brightness bucket filled evenly.
        let img = RgbaImage::from_fn(256, 64, |x, _| image::Rgba([x as u8, x as u8, x as u8, 255]));
        assert!(histogram_roughness(&img) < SMOOTHNESS_THRESHOLD);
        let out = score_pixels(&img);
        assert!(out.warnings[0].contains("smooth brightness"));
    }

    #[test]
    fn test_undecodable_payload_falls_back() {
        let out = analyze_pixels(b"definitely not an image");
        assert_eq!(out.results[0].score, DECODE_FALLBACK_SCORE);
        assert!(out.warnings.is_empty());
    }
}
